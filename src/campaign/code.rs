use chrono::{DateTime, Utc};
use rand::Rng;

const CODE_PREFIX: &str = "BMS";
const CODE_SUFFIX_LEN: usize = 9;
const CODE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Builds an opaque QR lookup code like `BMS-1700000000-abc123xyz`.
pub fn generate_code(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..CODE_SUFFIX_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect();

    format!("{}-{}-{}", CODE_PREFIX, now.timestamp(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn code_has_prefix_timestamp_and_suffix() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        let code = generate_code(now);
        let parts: Vec<&str> = code.split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "BMS");
        assert_eq!(parts[1], "1700000000");
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2]
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
    }

    #[test]
    fn codes_differ_within_the_same_second() {
        let now = Utc::now();

        assert_ne!(generate_code(now), generate_code(now));
    }
}
