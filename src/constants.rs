use rand::Rng;

/// Expected database schema version
/// All databases must use this version for compatibility
pub const EXPECTED_DB_VERSION: &str = "1";

/// Most images a listing carries, enforced by the form only
pub const MAX_IMAGES: usize = 4;

/// Multipart field carrying the uploaded file
pub const UPLOAD_FIELD: &str = "image";

/// Public path uploaded files are served under
pub const UPLOADS_ROUTE: &str = "/uploads";

pub const DEFAULT_PORT: u16 = 5050;

/// Length of a record id in hex characters
pub const RECORD_ID_LEN: usize = 24;

/// Generate a record id: 4-byte big-endian seconds timestamp followed by
/// 8 random bytes, as 24 lowercase hex characters
pub fn generate_record_id() -> String {
    let secs = chrono::Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
    let tail: u64 = rand::thread_rng().gen();
    format!("{:08x}{:016x}", secs, tail)
}

/// Whether a path segment has the shape of a record id
pub fn is_valid_record_id(id: &str) -> bool {
    id.len() == RECORD_ID_LEN && id.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_valid_and_distinct() {
        let a = generate_record_id();
        let b = generate_record_id();
        assert!(is_valid_record_id(&a), "bad id {}", a);
        assert_eq!(a.len(), RECORD_ID_LEN);
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_ids_rejected() {
        assert!(!is_valid_record_id("123"));
        assert!(!is_valid_record_id("zzzzzzzzzzzzzzzzzzzzzzzz"));
        assert!(!is_valid_record_id("65f0c1a2b3c4d5e6f7a8b9c0ff"));
        assert!(is_valid_record_id("65F0C1A2B3C4D5E6F7A8B9C0"));
    }
}
