//! Rule configuration for refile.
//!
//! [`Config::load`] reads `~/.config/refile/rules.toml`, creating it with the
//! built-in defaults if it does not yet exist. [`Config::from_path`] layers an
//! explicit file over the defaults, and [`Config::defaults`] returns the
//! defaults without touching the filesystem (useful in tests).
//!
//! The `[rules]` table carries a `version`; a rule set written for a version
//! this build does not understand is rejected by [`Config::validate`].

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::types::Classification;

/// Highest `[rules] version` this build understands.
pub const SUPPORTED_RULES_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[rules]
version             = 1
candidate_threshold = 2
indicator_fields    = [
    "rating", "score", "scores", "feedback", "comment", "הערות", "notes",
    "instructorName", "folder", "exercise", "role", "name", "criteriaList",
    "commandText", "scenario", "settlement", "attendeesCount",
]
instructor_keywords     = ["מדריך", "מדריכים", "קורס מדריכים", "מיונים לקורס מדריכים"]
defense_keywords        = ["מטווחי ירי", "מעגל פתוח", "מעגל פרוץ", "סריקות רחוב", "הגנה"]
defense_department_code = "474"

[normalize]
course_type_markers    = ["מדריך", "קורס מדריכים"]
instructor_course_type = "מדריכים"
empty_department       = "absent"
unspecified_department = "לא מוגדר"

[normalize.course_type_defaults]
madrichim  = "מדריכים"
defense474 = "מחלקות הגנה"
general    = "כללי"

[[normalize.departments]]
canonical = "474"
variants  = ["474", "הגנה474", "הגנה 474"]

[targets]
layout = "nested"
"#;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A rule set that parsed but cannot drive a run.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unsupported rules version {found} (this build understands up to {SUPPORTED_RULES_VERSION})")]
    UnsupportedVersion { found: u32 },
    #[error("rules.candidate_threshold must be at least 1")]
    ZeroThreshold,
    #[error("rules.indicator_fields must not be empty")]
    EmptyVocabulary,
    #[error("rules.candidate_threshold {threshold} can never be met by {vocabulary} indicator fields")]
    UnreachableThreshold { threshold: usize, vocabulary: usize },
}

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level configuration, loaded from `~/.config/refile/rules.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub rules: RulesConfig,
    pub normalize: NormalizeConfig,
    pub targets: TargetsConfig,
}

/// `[rules]`: candidacy test and classifier keywords.
#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    pub version: u32,
    pub candidate_threshold: usize,
    pub indicator_fields: Vec<String>,
    pub instructor_keywords: Vec<String>,
    pub defense_keywords: Vec<String>,
    /// Canonical department code that marks a defense474 document.
    pub defense_department_code: String,
}

/// `[normalize]`: canonical spellings for `courseType` and `department`.
#[derive(Debug, Clone, Deserialize)]
pub struct NormalizeConfig {
    pub course_type_markers: Vec<String>,
    pub instructor_course_type: String,
    pub course_type_defaults: CourseTypeDefaults,
    pub empty_department: EmptyDepartment,
    pub unspecified_department: String,
    #[serde(default)]
    pub departments: Vec<DepartmentAliases>,
}

/// Course type written when a document has none.
#[derive(Debug, Clone, Deserialize)]
pub struct CourseTypeDefaults {
    pub madrichim: String,
    pub defense474: String,
    pub general: String,
}

impl CourseTypeDefaults {
    pub fn for_class(&self, classification: Classification) -> &str {
        match classification {
            Classification::Madrichim => &self.madrichim,
            Classification::Defense474 => &self.defense474,
            Classification::General | Classification::NotFeedback => &self.general,
        }
    }
}

/// What an empty `department` becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyDepartment {
    /// Written as `null`.
    Absent,
    /// Written as `normalize.unspecified_department`.
    Unspecified,
}

/// One `[[normalize.departments]]` entry: every spelling in `variants`
/// rewrites to `canonical`.
#[derive(Debug, Clone, Deserialize)]
pub struct DepartmentAliases {
    pub canonical: String,
    pub variants: Vec<String>,
}

/// `[targets]`: destination shape.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetsConfig {
    pub layout: TargetLayout,
}

/// Destination collection shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetLayout {
    /// `feedbacks/<bucket>/items/<id>`
    Nested,
    /// `feedback_<bucket>/<id>`
    Flat,
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load from `~/.config/refile/rules.toml`, layered on top of the
    /// built-in defaults. Creates the file with defaults if it does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, DEFAULT_CONFIG.trim_start())?;
        }

        Self::from_path(&path)
    }

    /// Layer `path` over the built-in defaults. The file must exist.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let cfg: Config = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path).required(true))
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        tracing::debug!(path = %path.display(), version = cfg.rules.version, "rules loaded");
        Ok(cfg)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }

    /// Reject rule sets that parse but cannot drive a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rules = &self.rules;
        if rules.version == 0 || rules.version > SUPPORTED_RULES_VERSION {
            return Err(ConfigError::UnsupportedVersion { found: rules.version });
        }
        if rules.indicator_fields.is_empty() {
            return Err(ConfigError::EmptyVocabulary);
        }
        if rules.candidate_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if rules.candidate_threshold > rules.indicator_fields.len() {
            return Err(ConfigError::UnreachableThreshold {
                threshold: rules.candidate_threshold,
                vocabulary: rules.indicator_fields.len(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("refile")
        .join("rules.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_load() {
        let cfg = Config::defaults();
        assert_eq!(cfg.rules.version, 1);
        assert_eq!(cfg.rules.candidate_threshold, 2);
        assert_eq!(cfg.rules.indicator_fields.len(), 17);
        assert!(cfg.rules.indicator_fields.iter().any(|f| f == "הערות"));
        assert_eq!(cfg.normalize.empty_department, EmptyDepartment::Absent);
        assert_eq!(cfg.normalize.departments[0].canonical, "474");
        assert_eq!(cfg.targets.layout, TargetLayout::Nested);
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn course_type_defaults_per_class() {
        let cfg = Config::defaults();
        let defaults = &cfg.normalize.course_type_defaults;
        assert_eq!(defaults.for_class(Classification::Madrichim), "מדריכים");
        assert_eq!(defaults.for_class(Classification::Defense474), "מחלקות הגנה");
        assert_eq!(defaults.for_class(Classification::General), "כללי");
    }

    #[test]
    fn user_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.toml");
        std::fs::write(
            &path,
            "[rules]\ncandidate_threshold = 3\n\n[normalize]\nempty_department = \"unspecified\"\n\n[targets]\nlayout = \"flat\"\n",
        )
        .unwrap();

        let cfg = Config::from_path(&path).unwrap();
        assert_eq!(cfg.rules.candidate_threshold, 3);
        assert_eq!(cfg.normalize.empty_department, EmptyDepartment::Unspecified);
        assert_eq!(cfg.targets.layout, TargetLayout::Flat);
        // untouched keys keep their defaults
        assert_eq!(cfg.rules.defense_department_code, "474");
    }

    #[test]
    fn newer_rules_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.toml");
        std::fs::write(&path, "[rules]\nversion = 2\n").unwrap();

        let err = Config::from_path(&path).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::UnsupportedVersion { found: 2 })
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::from_path(&dir.path().join("nope.toml")).is_err());
    }

    #[test]
    fn threshold_bounds_are_checked() {
        let mut cfg = Config::defaults();
        cfg.rules.candidate_threshold = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroThreshold));

        cfg.rules.candidate_threshold = 18;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::UnreachableThreshold { threshold: 18, vocabulary: 17 })
        );

        cfg.rules.indicator_fields.clear();
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyVocabulary));
    }
}
