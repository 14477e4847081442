//! Core types for refile-core.
//!
//! This module defines the data shared by every stage of a run: the
//! [`DocPath`] addressing scheme, the [`Document`] snapshot handed out by the
//! walker, the [`Classification`] buckets, and the [`NormalizationRecord`]
//! produced whenever a categorical field is rewritten.

use serde::{Serialize, Serializer};
use std::fmt;

/// Field map of a stored document. Values are heterogeneous JSON values;
/// timestamps are carried as RFC 3339 strings.
pub type Fields = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// DocPath
// ---------------------------------------------------------------------------

/// Slash-separated address inside the document tree.
///
/// Segments alternate `collection/document/collection/document/…`, so a path
/// with an odd number of segments names a collection and an even number names
/// a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DocPath(Vec<String>);

impl DocPath {
    /// A top-level collection.
    pub fn collection(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// Parse `a/b/c`. Empty segments (leading, trailing or doubled slashes)
    /// are dropped.
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Append one segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Path with the last segment removed, or `None` at the top level.
    pub fn parent(&self) -> Option<Self> {
        match self.0.len() {
            0 | 1 => None,
            n => Some(Self(self.0[..n - 1].to_vec())),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Last segment: the collection name or document id.
    pub fn id(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or("")
    }

    pub fn is_collection(&self) -> bool {
        self.0.len() % 2 == 1
    }

    pub fn is_document(&self) -> bool {
        !self.0.is_empty() && self.0.len() % 2 == 0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl Serialize for DocPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// One document as read from a collection snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Full path, ending in the document id.
    pub path: DocPath,
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(path: DocPath, fields: Fields) -> Self {
        let id = path.id().to_string();
        Self { path, id, fields }
    }

    /// Path of the collection holding this document.
    pub fn parent_collection(&self) -> DocPath {
        self.path.parent().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Semantic bucket of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Classification {
    /// Instructor-course selections.
    #[serde(rename = "madrichim")]
    Madrichim,
    /// Defense department 474 exercises.
    #[serde(rename = "defense474")]
    Defense474,
    #[serde(rename = "general")]
    General,
    #[serde(rename = "not-feedback")]
    NotFeedback,
}

impl Classification {
    /// The three buckets a feedback document can land in.
    pub const FEEDBACK: [Classification; 3] = [
        Classification::Madrichim,
        Classification::Defense474,
        Classification::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Madrichim => "madrichim",
            Classification::Defense474 => "defense474",
            Classification::General => "general",
            Classification::NotFeedback => "not-feedback",
        }
    }

    pub fn is_feedback(self) -> bool {
        self != Classification::NotFeedback
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ExecutionMode
// ---------------------------------------------------------------------------

/// Whether a run may write to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// Plan every write and record it, but never call the store's write path.
    #[default]
    ReportOnly,
    /// Perform the merge writes.
    Apply,
}

impl ExecutionMode {
    pub fn writes(self) -> bool {
        self == ExecutionMode::Apply
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::ReportOnly => f.write_str("report-only"),
            ExecutionMode::Apply => f.write_str("apply"),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization records
// ---------------------------------------------------------------------------

/// The two categorical fields the normalizer rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NormalizedField {
    #[serde(rename = "courseType")]
    CourseType,
    #[serde(rename = "department")]
    Department,
}

impl NormalizedField {
    /// Field name as stored in documents.
    pub fn key(self) -> &'static str {
        match self {
            NormalizedField::CourseType => "courseType",
            NormalizedField::Department => "department",
        }
    }
}

impl fmt::Display for NormalizedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One value rewrite. `None` stands for an absent or empty value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationRecord {
    pub field: NormalizedField,
    pub original_value: Option<String>,
    pub normalized_value: Option<String>,
}

impl fmt::Display for NormalizationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<String>| match v {
            Some(s) => format!("{s:?}"),
            None => "(empty)".to_string(),
        };
        write!(
            f,
            "{}: {} → {}",
            self.field,
            show(&self.original_value),
            show(&self.normalized_value)
        )
    }
}

// ---------------------------------------------------------------------------
// Value coercion
// ---------------------------------------------------------------------------

/// Read a field as text. Strings are returned as-is, numbers and booleans are
/// stringified; absent, null, empty, list and map values read as `None`.
pub fn field_text(fields: &Fields, key: &str) -> Option<String> {
    match fields.get(key)? {
        serde_json::Value::String(s) if s.is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// True when `key` holds a list or a map. Such values are not labels and are
/// copied through without normalization.
pub fn holds_structure(fields: &Fields, key: &str) -> bool {
    matches!(
        fields.get(key),
        Some(serde_json::Value::Array(_) | serde_json::Value::Object(_))
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
