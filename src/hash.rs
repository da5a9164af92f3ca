//! Routing keys to buckets.
//!
//! Partitioning is by numeric key modulo the bucket count: the "hash" is the
//! identity on the key read as a decimal number (`int(key) % N`), so the bucket
//! of a key is stable across processes and versions. Keys have no width limit:
//! the residue is folded digit by digit and never overflows.

use crate::error::{Result, StoreError};

/// Validate a routing key: trimmed, non-empty, ASCII digits only.
/// Returns the trimmed key.
///
/// Signs, whitespace inside the number and anything non-decimal are rejected;
/// an invalid key never falls back to bucket 0.
pub fn check_key(key: &str) -> Result<&str> {
    let k = key.trim();
    if k.is_empty() || !k.bytes().all(|b| b.is_ascii_digit()) {
        return Err(StoreError::InvalidKey { key: key.to_string() });
    }
    Ok(k)
}

/// `digits mod buckets` без разбора в целое: acc = (acc*10 + d) % N.
#[inline]
pub fn bucket_of_digits(digits: &str, buckets: u32) -> u32 {
    debug_assert!(buckets > 0, "buckets must be > 0");
    let n = buckets as u64;
    digits
        .bytes()
        .fold(0u64, |acc, b| (acc * 10 + (b - b'0') as u64) % n) as u32
}

/// Key string -> bucket.
#[inline]
pub fn bucket_of_key(key: &str, buckets: u32) -> Result<u32> {
    Ok(bucket_of_digits(check_key(key)?, buckets))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_residue_same_bucket() {
        for n in [1u32, 3, 10, 64] {
            for k1 in 0u64..200 {
                let k2 = k1 + (n as u64) * 7;
                let b1 = bucket_of_key(&k1.to_string(), n).unwrap();
                assert_eq!(b1, bucket_of_key(&k2.to_string(), n).unwrap());
                assert_eq!(b1 as u64, k1 % n as u64);
                if n > 1 {
                    assert_ne!(b1, bucket_of_key(&(k1 + 1).to_string(), n).unwrap());
                }
            }
        }
    }

    #[test]
    fn check_key_accepts_trimmed_digits_only() {
        assert_eq!(check_key("42").unwrap(), "42");
        assert_eq!(check_key(" 7 ").unwrap(), "7");
        assert_eq!(check_key("007").unwrap(), "007");
        for bad in ["", "  ", "-1", "+5", "5a", "1 2", "0x10", "١٢"] {
            assert!(
                matches!(check_key(bad), Err(StoreError::InvalidKey { .. })),
                "key {:?} must be rejected",
                bad
            );
        }
    }

    #[test]
    fn bucket_of_key_is_modulo() {
        assert_eq!(bucket_of_key("5", 10).unwrap(), 5);
        assert_eq!(bucket_of_key("15", 10).unwrap(), 5);
        assert_eq!(bucket_of_key("123", 10).unwrap(), 3);
        assert_eq!(bucket_of_key("007", 10).unwrap(), 7);
        assert!(bucket_of_key("abc", 10).is_err());
    }

    #[test]
    fn keys_wider_than_u64_still_route() {
        // шире u64::MAX (~1.8e19)
        let big = "123456789012345678901234567890";
        assert_eq!(bucket_of_key(big, 7).unwrap(), 0);
        assert_eq!(bucket_of_key(big, 64).unwrap(), 18);
        assert_eq!(bucket_of_key(big, 10).unwrap(), 0);
        assert_eq!(bucket_of_key("18446744073709551616", 10).unwrap(), 6);
        assert_eq!(bucket_of_key(&"9".repeat(100), 9).unwrap(), 0);
    }
}
