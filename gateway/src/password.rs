//! Salted PBKDF2-HMAC-SHA256 password hashes
//!
//! Stored form: `pbkdf2:sha256:<iterations>$<salt-hex>$<hash-hex>`

use rand::RngCore;
use sha2::Sha256;

const PREFIX: &str = "pbkdf2:sha256:";
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

pub fn hash_password(password: &str, iterations: u32) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let key = derive(password, &salt, iterations);
    format!("{}{}${}${}", PREFIX, iterations, hex::encode(salt), hex::encode(key))
}

/// False for a wrong password or an unparseable stored hash
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some(rest) = stored.strip_prefix(PREFIX) else {
        return false;
    };
    let mut parts = rest.splitn(3, '$');
    let (Some(iterations), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let (Ok(iterations), Ok(salt), Ok(expected)) =
        (iterations.parse::<u32>(), hex::decode(salt), hex::decode(expected))
    else {
        return false;
    };
    if iterations == 0 || expected.len() != KEY_LEN {
        return false;
    }

    let key = derive(password, &salt, iterations);
    constant_time_eq(&key, &expected)
}

/// Byte equality whose timing depends only on the lengths
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .fold(0u8, |diff, (x, y)| diff | (x ^ y))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_password("correct horse", 1_000);
        assert!(stored.starts_with("pbkdf2:sha256:1000$"));
        assert!(verify_password("correct horse", &stored));
        assert!(!verify_password("battery staple", &stored));
    }

    #[test]
    fn test_salt_differs_per_hash() {
        assert_ne!(hash_password("pw", 1_000), hash_password("pw", 1_000));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"s3cret", b"s3cret"));
        assert!(!constant_time_eq(b"s3cret", b"s3creT"));
        assert!(!constant_time_eq(b"s3cret", b"s3cre"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("pw", ""));
        assert!(!verify_password("pw", "plaintext"));
        assert!(!verify_password("pw", "pbkdf2:sha256:abc$00$00"));
        assert!(!verify_password("pw", "pbkdf2:sha256:0$00$00"));
        assert!(!verify_password("pw", "pbkdf2:sha256:1000$zz$00"));
    }
}
