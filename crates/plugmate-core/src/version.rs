//! Version comparison and dependency constraints
//!
//! Versions are dot-separated numeric strings ("1.2.3"). Comparison is
//! purely component-wise: the shorter sequence is padded with trailing
//! zeros, so "1.0" == "1.0.0". No pre-release or build metadata.

use std::cmp::Ordering;

use crate::error::{PlugmateError, Result};

/// Parse a version string into numeric components.
pub fn parse_version(version: &str) -> Result<Vec<u64>> {
    version
        .split('.')
        .map(|part| {
            part.parse::<u64>()
                .map_err(|_| PlugmateError::InvalidVersion {
                    version: version.to_string(),
                })
        })
        .collect()
}

/// Compare two version strings component-wise, zero-padding the shorter one.
pub fn compare_versions(a: &str, b: &str) -> Result<Ordering> {
    let mut pa = parse_version(a)?;
    let mut pb = parse_version(b)?;

    let len = pa.len().max(pb.len());
    pa.resize(len, 0);
    pb.resize(len, 0);

    Ok(pa.cmp(&pb))
}

/// Sort key for a version string. Unparsable versions sort as version 0
/// instead of aborting the ordering.
pub fn sort_key(version: &str) -> Vec<u64> {
    parse_version(version).unwrap_or_else(|_| vec![0])
}

/// Pick the maximum version from a list, by [`sort_key`] ordering.
pub fn latest<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    versions.into_iter().max_by_key(|v| sort_key(v))
}

/// Zero-fill a 1- or 2-component version to 3 components
/// ("0.1" -> "0.1.0", "1" -> "1.0.0"). Anything else passes through.
pub fn normalize_version(version: &str) -> String {
    let parts: Vec<&str> = version.split('.').collect();
    match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => version.to_string(),
    }
}

/// Evaluate a dependency constraint against an installed version.
///
/// Supported grammar:
/// - empty or `*`: always satisfied
/// - `==X.Y.Z`: literal string equality with the remainder
/// - `>=X.Y.Z`: installed version orders at or above the remainder
/// - anything else: literal string equality with the whole constraint
///
/// Known limitation: no upper bounds, no compound ranges. Unrecognized
/// constraint strings fall back to exact match.
pub fn satisfies(installed: &str, constraint: &str) -> Result<bool> {
    let c = constraint.trim();
    if c.is_empty() || c == "*" {
        return Ok(true);
    }
    if let Some(rest) = c.strip_prefix("==") {
        return Ok(installed == rest);
    }
    if let Some(rest) = c.strip_prefix(">=") {
        return Ok(compare_versions(installed, rest)? != Ordering::Less);
    }
    Ok(installed == c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_basic() {
        assert_eq!(compare_versions("1.0.0", "1.0.1").unwrap(), Ordering::Less);
        assert_eq!(
            compare_versions("2.0.0", "1.9.9").unwrap(),
            Ordering::Greater
        );
        assert_eq!(compare_versions("1.2.3", "1.2.3").unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_compare_zero_padding() {
        assert_eq!(compare_versions("1.0", "1.0.0").unwrap(), Ordering::Equal);
        assert_eq!(compare_versions("1", "1.0.0").unwrap(), Ordering::Equal);
        assert_eq!(compare_versions("1.0", "1.0.1").unwrap(), Ordering::Less);
    }

    #[test]
    fn test_compare_antisymmetry() {
        let pairs = [("1.0.0", "1.0.1"), ("0.9", "1"), ("2.1.0", "2.1")];
        for (a, b) in pairs {
            let fwd = compare_versions(a, b).unwrap();
            let rev = compare_versions(b, a).unwrap();
            assert_eq!(fwd, rev.reverse());
        }
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(parse_version("1.0.0-beta").is_err());
        assert!(parse_version("abc").is_err());
        assert!(parse_version("1..2").is_err());
    }

    #[test]
    fn test_sort_key_fallback() {
        assert_eq!(sort_key("not-a-version"), vec![0]);
        assert_eq!(sort_key("1.2.3"), vec![1, 2, 3]);
    }

    #[test]
    fn test_latest() {
        let versions = ["0.1.0", "0.10.0", "0.2.0"];
        assert_eq!(latest(versions.iter().copied()), Some("0.10.0"));
        assert_eq!(latest(std::iter::empty()), None);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_version("0.1"), "0.1.0");
        assert_eq!(normalize_version("1"), "1.0.0");
        assert_eq!(normalize_version("1.2.3"), "1.2.3");
        assert_eq!(normalize_version("1.2.3.4"), "1.2.3.4");
    }

    #[test]
    fn test_satisfies_wildcard() {
        assert!(satisfies("1.0.0", "").unwrap());
        assert!(satisfies("1.0.0", "*").unwrap());
    }

    #[test]
    fn test_satisfies_exact() {
        assert!(satisfies("1.2.3", "==1.2.3").unwrap());
        assert!(!satisfies("1.2.3", "==1.2.4").unwrap());
        // Exact match is literal, not numeric: "1.0" != "1.0.0"
        assert!(!satisfies("1.0", "==1.0.0").unwrap());
    }

    #[test]
    fn test_satisfies_lower_bound() {
        assert!(satisfies("1.2.0", ">=1.2.0").unwrap());
        assert!(satisfies("1.3.0", ">=1.2.0").unwrap());
        assert!(!satisfies("1.0.0", ">=1.2.0").unwrap());
    }

    #[test]
    fn test_satisfies_bare_constraint_is_exact() {
        assert!(satisfies("1.2.3", "1.2.3").unwrap());
        assert!(!satisfies("1.2.3", "1.2.4").unwrap());
        // Unrecognized operators fall back to exact match
        assert!(!satisfies("1.0.0", "<2.0.0").unwrap());
    }

    #[test]
    fn test_satisfies_lower_bound_propagates_parse_error() {
        assert!(satisfies("garbage", ">=1.0.0").is_err());
    }
}
