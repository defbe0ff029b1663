//! Uniform stride down-sampling of route polylines

use crate::ROUTE_SAMPLE_CAP;
use safety_grid::Coordinate;

/// Bounds the number of coordinates scored per route.
///
/// Routes longer than `cap` keep every k-th point, `k = len / cap`, starting
/// at the first point, and at most `cap` points are kept. The last point is
/// not guaranteed to survive.
#[derive(Debug, Clone, Copy)]
pub struct RouteSampler {
    cap: usize,
}

impl Default for RouteSampler {
    fn default() -> Self {
        Self {
            cap: ROUTE_SAMPLE_CAP,
        }
    }
}

impl RouteSampler {
    /// A cap of 0 is treated as 1
    pub fn new(cap: usize) -> Self {
        Self { cap: cap.max(1) }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn stride(&self, len: usize) -> usize {
        if len > self.cap {
            len / self.cap
        } else {
            1
        }
    }

    pub fn sample(&self, coords: &[Coordinate]) -> Vec<Coordinate> {
        if coords.len() <= self.cap {
            return coords.to_vec();
        }
        coords
            .iter()
            .step_by(self.stride(coords.len()))
            .take(self.cap)
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(n: usize) -> Vec<Coordinate> {
        (0..n)
            .map(|i| Coordinate::new(i as f64 * 0.0001, 77.0))
            .collect()
    }

    #[test]
    fn test_short_route_unchanged() {
        let r = route(1000);
        assert_eq!(RouteSampler::default().sample(&r), r);
    }

    #[test]
    fn test_long_route_stride() {
        let r = route(5000);
        let s = RouteSampler::default().sample(&r);
        assert_eq!(s.len(), 1000);
        assert_eq!(s[0], r[0]);
        assert_eq!(s[1], r[5]);
        assert_eq!(s[999], r[4995]);
    }

    #[test]
    fn test_stride_one_is_truncated_to_cap() {
        // 1200 / 1000 = 1; the cap still holds
        let r = route(1200);
        let s = RouteSampler::default().sample(&r);
        assert_eq!(s.len(), 1000);
        assert_eq!(&s[..], &r[..1000]);
    }

    #[test]
    fn test_zero_cap() {
        let sampler = RouteSampler::new(0);
        assert_eq!(sampler.cap(), 1);
        assert_eq!(sampler.sample(&route(3)).len(), 1);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        // Bounded, first point kept, input order preserved
        #[test]
        fn fuzz_sample_bounded_and_ordered(len in 1usize..6000, cap in 1usize..1500) {
            let coords: Vec<Coordinate> = (0..len)
                .map(|i| Coordinate::new(i as f64, 0.0))
                .collect();
            let sampled = RouteSampler::new(cap).sample(&coords);

            prop_assert!(sampled.len() <= cap);
            prop_assert_eq!(sampled[0], coords[0]);
            prop_assert!(sampled.windows(2).all(|w| w[0].lat < w[1].lat));
        }
    }
}
