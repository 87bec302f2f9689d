//! Random value generators.
//!
//! Everything here takes the random source as a parameter so handlers can use
//! the thread-local generator and tests can use a seeded one.

use rand::seq::SliceRandom;
use rand::Rng;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{RandomError, Result};

pub const DEFAULT_NANOID_SIZE: usize = 21;
pub const MAX_NANOID_SIZE: usize = 200;

/// Uniform integer in `[min, max)`. Negative bounds are allowed anywhere in
/// the `i64` range.
pub fn random_int<R: Rng + ?Sized>(rng: &mut R, min: i64, max: i64) -> Result<i64> {
    if min >= max {
        return Err(RandomError::IntRange { min, max });
    }
    Ok(rng.gen_range(min..max))
}

/// Uniform float in `[min, max)`.
pub fn random_float<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> Result<f64> {
    if !min.is_finite() || !max.is_finite() {
        return Err(RandomError::FloatBounds);
    }
    if min >= max {
        return Err(RandomError::FloatRange { min, max });
    }
    if !(max - min).is_finite() {
        return Err(RandomError::FloatBounds);
    }
    Ok(rng.gen_range(min..max))
}

/// `count` words drawn independently (with replacement) and joined.
pub fn random_words<R: Rng + ?Sized>(
    rng: &mut R,
    words: &[String],
    count: usize,
    separator: &str,
) -> String {
    (0..count)
        .filter_map(|_| words.choose(&mut *rng))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(separator)
}

pub fn ulid() -> String {
    ulid::Ulid::new().to_string()
}

pub fn nanoid(size: usize) -> Result<String> {
    if !(1..=MAX_NANOID_SIZE).contains(&size) {
        return Err(RandomError::InvalidSize);
    }
    Ok(nanoid::nanoid!(size))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UuidVersion {
    V4,
    V7,
}

impl FromStr for UuidVersion {
    type Err = RandomError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "4" => Ok(UuidVersion::V4),
            "7" => Ok(UuidVersion::V7),
            _ => Err(RandomError::InvalidUuidVersion),
        }
    }
}

/// Canonical lowercase hyphenated UUID of the requested version.
pub fn uuid(version: UuidVersion) -> String {
    let id = match version {
        UuidVersion::V4 => Uuid::new_v4(),
        UuidVersion::V7 => Uuid::now_v7(),
    };
    id.hyphenated().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_int_within_range() {
        let mut rng = rng();
        for (min, max) in [(0, 100), (-345, 921), (-500, -100), (10_000, 50_000), (7, 8)] {
            for _ in 0..200 {
                let value = random_int(&mut rng, min, max).unwrap();
                assert!(value >= min && value < max, "{value} not in [{min}, {max})");
            }
        }
    }

    #[test]
    fn test_int_full_range_does_not_overflow() {
        let mut rng = rng();
        let value = random_int(&mut rng, i64::MIN, i64::MAX).unwrap();
        assert!(value < i64::MAX);
    }

    #[test]
    fn test_int_rejects_inverted_range() {
        let mut rng = rng();
        let err = random_int(&mut rng, 20, 5).unwrap_err();
        assert!(err.to_string().contains("should be less than max"));
        assert!(random_int(&mut rng, 5, 5).is_err());
    }

    #[test]
    fn test_float_within_range() {
        let mut rng = rng();
        for (min, max) in [(0.0, 1.0), (-10.5, 10.5), (-4.2136, -3.2136)] {
            for _ in 0..200 {
                let value = random_float(&mut rng, min, max).unwrap();
                assert!(value >= min && value < max);
            }
        }
    }

    #[test]
    fn test_float_rejects_bad_bounds() {
        let mut rng = rng();
        let err = random_float(&mut rng, 100.0, -2.0).unwrap_err();
        assert!(err.to_string().contains("should be less than max"));
        assert!(matches!(
            random_float(&mut rng, f64::NAN, 1.0),
            Err(RandomError::FloatBounds)
        ));
        assert!(matches!(
            random_float(&mut rng, -f64::MAX, f64::MAX),
            Err(RandomError::FloatBounds)
        ));
    }

    #[test]
    fn test_words_count_and_membership() {
        let mut rng = rng();
        let words: Vec<String> = ["alpha", "beta", "gamma"].iter().map(|w| w.to_string()).collect();

        let output = random_words(&mut rng, &words, 5, ",");
        let parts: Vec<&str> = output.split(',').collect();
        assert_eq!(parts.len(), 5);
        assert!(parts.iter().all(|part| words.iter().any(|w| w == part)));
    }

    #[test]
    fn test_nanoid_sizes() {
        assert_eq!(nanoid(DEFAULT_NANOID_SIZE).unwrap().len(), 21);
        assert_eq!(nanoid(1).unwrap().len(), 1);
        assert_eq!(nanoid(200).unwrap().len(), 200);
        assert!(matches!(nanoid(0), Err(RandomError::InvalidSize)));
        assert!(matches!(nanoid(201), Err(RandomError::InvalidSize)));
    }

    #[test]
    fn test_ulid_shape() {
        let id = ulid();
        assert_eq!(id.len(), 26);
        assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_uuid_versions() {
        let v4 = Uuid::parse_str(&uuid(UuidVersion::V4)).unwrap();
        assert_eq!(v4.get_version_num(), 4);

        let v7 = Uuid::parse_str(&uuid(UuidVersion::V7)).unwrap();
        assert_eq!(v7.get_version_num(), 7);
    }

    #[test]
    fn test_uuid_version_parsing() {
        assert_eq!("4".parse::<UuidVersion>().unwrap(), UuidVersion::V4);
        assert_eq!("7".parse::<UuidVersion>().unwrap(), UuidVersion::V7);
        let err = "9".parse::<UuidVersion>().unwrap_err();
        assert!(err.to_string().contains("Invalid UUID version"));
    }
}
