//! Dependency validation
//!
//! Checks a candidate manifest's declared dependencies against the
//! installed registry. All violations are collected before failing so
//! the caller sees every unmet requirement at once, not just the first.

use std::fmt;

use crate::error::{PlugmateError, Result};
use crate::manifest::PluginManifest;
use crate::store::Registry;
use crate::version;

/// A single unmet dependency requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Dependency is not installed at all.
    Missing { name: String, constraint: String },
    /// Dependency is installed but its version fails the constraint.
    Conflict {
        name: String,
        installed: String,
        constraint: String,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { name, constraint } => {
                write!(f, "Missing dependency: {} {}", name, constraint)
            }
            Self::Conflict {
                name,
                installed,
                constraint,
            } => write!(
                f,
                "Version conflict: {} installed {} does not satisfy {}",
                name, installed, constraint
            ),
        }
    }
}

/// Collect every violation of the manifest's dependency constraints
/// against the given registry.
pub fn validate(manifest: &PluginManifest, registry: &Registry) -> Result<Vec<Violation>> {
    let mut violations = Vec::new();

    for (dep_name, constraint) in &manifest.dependencies {
        match registry.get(dep_name) {
            None => violations.push(Violation::Missing {
                name: dep_name.clone(),
                constraint: constraint.clone(),
            }),
            Some(entry) => {
                if !version::satisfies(&entry.version, constraint)? {
                    violations.push(Violation::Conflict {
                        name: dep_name.clone(),
                        installed: entry.version.clone(),
                        constraint: constraint.clone(),
                    });
                }
            }
        }
    }

    Ok(violations)
}

/// Validate and fail with the aggregated violation list if any exist.
pub fn check(manifest: &PluginManifest, registry: &Registry) -> Result<()> {
    let violations = validate(manifest, registry)?;
    if violations.is_empty() {
        return Ok(());
    }

    Err(PlugmateError::DependencyViolations {
        violations: violations.iter().map(|v| v.to_string()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RegistryEntry;

    fn registry_with(entries: &[(&str, &str)]) -> Registry {
        entries
            .iter()
            .map(|(name, version)| {
                (
                    name.to_string(),
                    RegistryEntry {
                        version: version.to_string(),
                    },
                )
            })
            .collect()
    }

    fn manifest_with_deps(deps: &[(&str, &str)]) -> PluginManifest {
        let mut manifest = PluginManifest::generated("candidate", "1.0.0");
        for (name, constraint) in deps {
            manifest
                .dependencies
                .insert(name.to_string(), constraint.to_string());
        }
        manifest
    }

    #[test]
    fn test_no_dependencies_passes() {
        let manifest = manifest_with_deps(&[]);
        let registry = registry_with(&[]);
        assert!(validate(&manifest, &registry).unwrap().is_empty());
        assert!(check(&manifest, &registry).is_ok());
    }

    #[test]
    fn test_satisfied_dependency() {
        let manifest = manifest_with_deps(&[("base", ">=1.0.0")]);
        let registry = registry_with(&[("base", "1.2.0")]);
        assert!(validate(&manifest, &registry).unwrap().is_empty());
    }

    #[test]
    fn test_missing_dependency() {
        let manifest = manifest_with_deps(&[("base", ">=1.0.0")]);
        let registry = registry_with(&[]);

        let violations = validate(&manifest, &registry).unwrap();
        assert_eq!(violations.len(), 1);
        assert!(matches!(violations[0], Violation::Missing { .. }));
    }

    #[test]
    fn test_version_conflict() {
        let manifest = manifest_with_deps(&[("base", ">=2.0.0")]);
        let registry = registry_with(&[("base", "1.0.0")]);

        let violations = validate(&manifest, &registry).unwrap();
        assert_eq!(violations.len(), 1);
        assert!(matches!(violations[0], Violation::Conflict { .. }));
    }

    #[test]
    fn test_aggregates_all_violations() {
        let manifest = manifest_with_deps(&[("absent", "*"), ("old", ">=2.0.0")]);
        let registry = registry_with(&[("old", "1.0.0")]);

        let err = check(&manifest, &registry).unwrap_err();
        match err {
            PlugmateError::DependencyViolations { violations } => {
                assert_eq!(violations.len(), 2);
            }
            other => panic!("expected DependencyViolations, got {other}"),
        }

        let message = check(&manifest, &registry).unwrap_err().to_string();
        assert!(message.contains("absent"));
        assert!(message.contains("old"));
    }
}
