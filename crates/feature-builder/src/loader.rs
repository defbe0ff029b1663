//! Raw dataset loading from CSV files

use crate::{BuildError, Result, INCIDENT_FILE, POLICE_FILE, SURVEILLANCE_FILE};
use csv::StringRecord;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Incident records (area level)
#[derive(Debug, Clone, Default)]
pub struct IncidentData {
    pub rows: usize,
    /// Sum of `total_incidents`, when the column exists
    pub total_incidents: Option<f64>,
}

/// Police-presence records; only the count is used
#[derive(Debug, Clone, Default)]
pub struct PoliceData {
    pub rows: usize,
}

/// One surveillance point
#[derive(Debug, Clone, PartialEq)]
pub struct SurveillanceRecord {
    pub lat: f64,
    pub lon: f64,
    pub cctv_count: f64,
    pub crime_reports: Option<f64>,
    pub police_near: Option<f64>,
}

/// Surveillance points plus which optional columns the file carried
#[derive(Debug, Clone, Default)]
pub struct SurveillanceData {
    pub records: Vec<SurveillanceRecord>,
    pub has_crime_reports: bool,
    pub has_police_near: bool,
    /// Rows dropped for empty lat/lon
    pub skipped: usize,
}

/// All three sources of one build
#[derive(Debug, Clone, Default)]
pub struct RawDatasets {
    pub incident: IncidentData,
    pub police: PoliceData,
    pub surveillance: SurveillanceData,
}

/// Open a CSV and return it with lower-cased, trimmed headers
fn open_csv(path: &Path) -> Result<(csv::Reader<File>, Vec<String>)> {
    if !path.exists() {
        return Err(BuildError::MissingSource(path.to_path_buf()));
    }
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;
    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.to_lowercase())
        .collect();
    Ok((reader, headers))
}

fn column(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn require_column(headers: &[String], name: &str, file: &Path) -> Result<usize> {
    column(headers, name).ok_or_else(|| BuildError::MissingColumn {
        file: file.to_path_buf(),
        column: name.to_string(),
    })
}

/// Empty → None; non-numeric → error naming file/row/column
fn parse_cell(
    record: &StringRecord,
    idx: usize,
    file: &Path,
    row: usize,
    name: &str,
) -> Result<Option<f64>> {
    match record.get(idx).map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| BuildError::InvalidValue {
                file: file.to_path_buf(),
                row,
                column: name.to_string(),
                value: raw.to_string(),
            }),
    }
}

pub fn load_incidents(path: impl AsRef<Path>) -> Result<IncidentData> {
    let path = path.as_ref();
    info!("Loading incident records from {:?}", path);

    let (mut reader, headers) = open_csv(path)?;
    let total_idx = column(&headers, "total_incidents");

    let mut data = IncidentData {
        rows: 0,
        total_incidents: total_idx.map(|_| 0.0),
    };
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        data.rows += 1;
        if let (Some(idx), Some(total)) = (total_idx, data.total_incidents.as_mut()) {
            *total += parse_cell(&record, idx, path, i + 2, "total_incidents")?.unwrap_or(0.0);
        }
    }

    info!("Loaded {} incident records", data.rows);
    Ok(data)
}

pub fn load_police(path: impl AsRef<Path>) -> Result<PoliceData> {
    let path = path.as_ref();
    info!("Loading police records from {:?}", path);

    let (mut reader, _) = open_csv(path)?;
    let mut rows = 0;
    for record in reader.records() {
        record?;
        rows += 1;
    }

    info!("Loaded {} police records", rows);
    Ok(PoliceData { rows })
}

pub fn load_surveillance(path: impl AsRef<Path>) -> Result<SurveillanceData> {
    let path = path.as_ref();
    info!("Loading surveillance records from {:?}", path);

    let (mut reader, headers) = open_csv(path)?;
    let lat_idx = require_column(&headers, "lat", path)?;
    let lon_idx = require_column(&headers, "lon", path)?;
    let cctv_idx = require_column(&headers, "cctv_count", path)?;
    let crime_idx = column(&headers, "crime_reports");
    let police_idx = column(&headers, "police_near");

    let mut data = SurveillanceData {
        has_crime_reports: crime_idx.is_some(),
        has_police_near: police_idx.is_some(),
        ..Default::default()
    };

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = i + 2;

        let lat = parse_cell(&record, lat_idx, path, row, "lat")?;
        let lon = parse_cell(&record, lon_idx, path, row, "lon")?;
        let (lat, lon) = match (lat, lon) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                data.skipped += 1;
                continue;
            }
        };

        let optional = |idx: Option<usize>, name: &str| -> Result<Option<f64>> {
            match idx {
                Some(idx) => parse_cell(&record, idx, path, row, name),
                None => Ok(None),
            }
        };

        data.records.push(SurveillanceRecord {
            lat,
            lon,
            cctv_count: parse_cell(&record, cctv_idx, path, row, "cctv_count")?.unwrap_or(0.0),
            crime_reports: optional(crime_idx, "crime_reports")?,
            police_near: optional(police_idx, "police_near")?,
        });
    }

    if data.skipped > 0 {
        warn!("Skipped {} surveillance rows with empty lat/lon", data.skipped);
    }
    info!(
        "Loaded {} surveillance records (crime_reports: {}, police_near: {})",
        data.records.len(),
        data.has_crime_reports,
        data.has_police_near
    );
    Ok(data)
}

/// Paths of the three sources under a data directory
pub fn dataset_paths(data_dir: impl AsRef<Path>) -> [PathBuf; 3] {
    let dir = data_dir.as_ref();
    [
        dir.join(INCIDENT_FILE),
        dir.join(POLICE_FILE),
        dir.join(SURVEILLANCE_FILE),
    ]
}

/// Load all three sources; the first failure aborts
pub fn load_datasets(data_dir: impl AsRef<Path>) -> Result<RawDatasets> {
    let [incident, police, surveillance] = dataset_paths(data_dir);
    Ok(RawDatasets {
        incident: load_incidents(incident)?,
        police: load_police(police)?,
        surveillance: load_surveillance(surveillance)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_surveillance_headers_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            SURVEILLANCE_FILE,
            "LAT,Lon,CCTV_Count,Crime_Reports\n12.97,77.59,3,2\n12.98,77.60,,\n",
        );

        let data = load_surveillance(&path).unwrap();
        assert!(data.has_crime_reports);
        assert!(!data.has_police_near);
        assert_eq!(data.records.len(), 2);
        assert_eq!(data.records[0].crime_reports, Some(2.0));
        assert_eq!(data.records[1].cctv_count, 0.0);
        assert_eq!(data.records[1].crime_reports, None);
    }

    #[test]
    fn test_surveillance_skips_missing_coords() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, SURVEILLANCE_FILE, "lat,lon,cctv_count\n,77.59,3\n12.9,77.5,1\n");

        let data = load_surveillance(&path).unwrap();
        assert_eq!(data.records.len(), 1);
        assert_eq!(data.skipped, 1);
    }

    #[test]
    fn test_surveillance_bad_number_aborts() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, SURVEILLANCE_FILE, "lat,lon,cctv_count\n12.9,77.5,many\n");

        let err = load_surveillance(&path).unwrap_err();
        match err {
            BuildError::InvalidValue { row, column, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "cctv_count");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_surveillance_requires_cctv_column() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, SURVEILLANCE_FILE, "lat,lon\n12.9,77.5\n");
        assert!(matches!(
            load_surveillance(&path),
            Err(BuildError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_incident_total() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, INCIDENT_FILE, "Area,Total_Incidents\nA,120\nB,80\n");

        let data = load_incidents(&path).unwrap();
        assert_eq!(data.rows, 2);
        assert_eq!(data.total_incidents, Some(200.0));
    }

    #[test]
    fn test_missing_source_aborts() {
        let dir = TempDir::new().unwrap();
        write(&dir, INCIDENT_FILE, "area\nA\n");
        write(&dir, SURVEILLANCE_FILE, "lat,lon,cctv_count\n1,1,1\n");

        match load_datasets(dir.path()) {
            Err(BuildError::MissingSource(path)) => assert!(path.ends_with(POLICE_FILE)),
            other => panic!("expected MissingSource, got {other:?}"),
        }
    }
}
