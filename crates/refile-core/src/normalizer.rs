//! Normalizer — canonical spellings for `courseType` and `department`.
//!
//! Both operations are total: any input, including an absent value, yields a
//! [`Normalized`] result. When the output differs from the input the result
//! carries exactly one [`NormalizationRecord`] describing the rewrite.

use crate::classifier::{COURSE_TYPE, DEPARTMENT};
use crate::config::{Config, DepartmentAliases, EmptyDepartment, NormalizeConfig};
use crate::types::{
    field_text, holds_structure, Classification, Fields, NormalizationRecord, NormalizedField,
};

/// Output of one normalization. `value == None` means the field is written as
/// `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub value: Option<String>,
    pub record: Option<NormalizationRecord>,
}

impl Normalized {
    fn new(field: NormalizedField, original: Option<&str>, value: Option<String>) -> Self {
        let original = original.filter(|s| !s.is_empty());
        let record = (original != value.as_deref()).then(|| NormalizationRecord {
            field,
            original_value: original.map(str::to_string),
            normalized_value: value.clone(),
        });
        Self { value, record }
    }

    pub fn changed(&self) -> bool {
        self.record.is_some()
    }
}

/// Field normalizer built once per run from a [`Config`].
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: NormalizeConfig,
    markers: Vec<String>,
}

impl Normalizer {
    pub fn new(config: &Config) -> Self {
        let markers = config
            .normalize
            .course_type_markers
            .iter()
            .filter(|m| !m.is_empty())
            .map(|m| m.to_lowercase())
            .collect();
        Self {
            config: config.normalize.clone(),
            markers,
        }
    }

    /// Normalized `courseType` of `fields`, or `None` when the field holds a
    /// list or map and must be copied unchanged.
    pub fn course_type_of(
        &self,
        fields: &Fields,
        classification: Classification,
    ) -> Option<Normalized> {
        if holds_structure(fields, COURSE_TYPE) {
            return None;
        }
        Some(self.normalize_course_type(field_text(fields, COURSE_TYPE).as_deref(), classification))
    }

    /// Normalized `department` of `fields`, or `None` when the field holds a
    /// list or map and must be copied unchanged.
    pub fn department_of(&self, fields: &Fields) -> Option<Normalized> {
        if holds_structure(fields, DEPARTMENT) {
            return None;
        }
        Some(self.normalize_department(field_text(fields, DEPARTMENT).as_deref()))
    }

    /// Empty → the per-class default; anything mentioning an instructor
    /// course → the canonical instructor course label; otherwise unchanged.
    pub fn normalize_course_type(
        &self,
        value: Option<&str>,
        classification: Classification,
    ) -> Normalized {
        let field = NormalizedField::CourseType;
        let Some(raw) = value.filter(|v| !v.is_empty()) else {
            let fill = self.config.course_type_defaults.for_class(classification);
            return Normalized::new(field, None, Some(fill.to_string()));
        };

        let folded = raw.to_lowercase();
        if self.markers.iter().any(|m| folded.contains(m.as_str())) {
            return Normalized::new(
                field,
                Some(raw),
                Some(self.config.instructor_course_type.clone()),
            );
        }

        Normalized::new(field, Some(raw), Some(raw.to_string()))
    }

    /// Empty → `null` or the "unspecified" sentinel depending on policy;
    /// otherwise trimmed, and known spellings of a department code are
    /// rewritten to the canonical code.
    pub fn normalize_department(&self, value: Option<&str>) -> Normalized {
        let field = NormalizedField::Department;
        let trimmed = value.map(str::trim).filter(|v| !v.is_empty());

        let Some(trimmed) = trimmed else {
            let fill = match self.config.empty_department {
                EmptyDepartment::Absent => None,
                EmptyDepartment::Unspecified => Some(self.config.unspecified_department.clone()),
            };
            return Normalized::new(field, value, fill);
        };

        let canonical = canonical_department(&self.config.departments, trimmed)
            .unwrap_or(trimmed)
            .to_string();
        Normalized::new(field, value, Some(canonical))
    }
}

fn canonical_department<'a>(groups: &'a [DepartmentAliases], value: &str) -> Option<&'a str> {
    groups
        .iter()
        .find(|g| g.canonical == value || g.variants.iter().any(|v| v.trim() == value))
        .map(|g| g.canonical.as_str())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
