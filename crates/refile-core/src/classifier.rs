//! Classifier — decides whether a document is a feedback record and which
//! bucket it belongs to.
//!
//! Both decisions are pure functions of the document's fields and of the
//! `[rules]` table the [`Classifier`] was built from. Keyword matching is
//! substring-based on lowercased text; candidacy only looks at which keys are
//! present, never at their values.

use std::collections::BTreeSet;

use crate::config::Config;
use crate::types::{field_text, Classification, Fields};

/// Field names the classifier reads.
pub const FOLDER: &str = "folder";
pub const EXERCISE: &str = "exercise";
pub const COURSE_TYPE: &str = "courseType";
pub const DEPARTMENT: &str = "department";

/// Rule-driven classifier built once per run from a [`Config`].
#[derive(Debug, Clone)]
pub struct Classifier {
    threshold: usize,
    indicators: Vec<String>,
    instructor_keywords: Vec<String>,
    defense_keywords: Vec<String>,
    defense_departments: BTreeSet<String>,
}

impl Classifier {
    pub fn new(config: &Config) -> Self {
        let rules = &config.rules;
        let code = rules.defense_department_code.trim();

        // The code itself plus every configured spelling of it.
        let mut defense_departments = BTreeSet::from([code.to_string()]);
        for group in config.normalize.departments.iter().filter(|g| g.canonical.trim() == code) {
            defense_departments.extend(group.variants.iter().map(|v| v.trim().to_string()));
        }

        Self {
            threshold: rules.candidate_threshold,
            indicators: rules.indicator_fields.clone(),
            instructor_keywords: lowercase_all(&rules.instructor_keywords),
            defense_keywords: lowercase_all(&rules.defense_keywords),
            defense_departments,
        }
    }

    /// Number of indicator field names present as keys in `fields`.
    pub fn indicator_count(&self, fields: &Fields) -> usize {
        self.indicators
            .iter()
            .filter(|name| fields.contains_key(name.as_str()))
            .count()
    }

    /// True iff enough indicator keys are present to treat the document as
    /// feedback.
    pub fn is_candidate(&self, fields: &Fields) -> bool {
        self.indicator_count(fields) >= self.threshold
    }

    /// Assign a feedback bucket. Priority is fixed: madrichim, then
    /// defense474, then general. Never returns [`Classification::NotFeedback`].
    pub fn classify(&self, fields: &Fields) -> Classification {
        let folder = lowered(fields, FOLDER);
        let exercise = lowered(fields, EXERCISE);
        let course_type = lowered(fields, COURSE_TYPE);

        if contains_any(&folder, &self.instructor_keywords)
            || contains_any(&course_type, &self.instructor_keywords)
        {
            return Classification::Madrichim;
        }

        if contains_any(&folder, &self.defense_keywords)
            || contains_any(&exercise, &self.defense_keywords)
            || contains_any(&course_type, &self.defense_keywords)
            || self.is_defense_department(fields)
        {
            return Classification::Defense474;
        }

        Classification::General
    }

    /// [`Classification::NotFeedback`] for non-candidates, otherwise
    /// [`classify`](Self::classify).
    pub fn label(&self, fields: &Fields) -> Classification {
        if self.is_candidate(fields) {
            self.classify(fields)
        } else {
            Classification::NotFeedback
        }
    }

    fn is_defense_department(&self, fields: &Fields) -> bool {
        field_text(fields, DEPARTMENT)
            .map(|d| self.defense_departments.contains(d.trim()))
            .unwrap_or(false)
    }
}

fn lowered(fields: &Fields, key: &str) -> String {
    field_text(fields, key).unwrap_or_default().to_lowercase()
}

fn lowercase_all(words: &[String]) -> Vec<String> {
    words
        .iter()
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    !haystack.is_empty() && needles.iter().any(|n| haystack.contains(n.as_str()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
