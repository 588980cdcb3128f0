//! Field rules and sort rules.
//!
//! A field rule names a dotted path inside the document, the operation to
//! apply there and the transform definition that supplies the handle. A sort
//! rule optionally reorders a top-level array output after all field rules
//! have run.

use crate::{Error, TransformId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The cryptographic operation a field rule applies.
///
/// Wire form matches the config feed: `encrypt`, `decrypt`, `mask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Format-preserving encrypt.
    #[serde(rename = "encrypt")]
    Protect,
    /// Format-preserving decrypt.
    #[serde(rename = "decrypt")]
    Access,
    /// Decrypt and mask for display.
    #[serde(rename = "mask")]
    Mask,
}

impl Operation {
    /// Returns the wire name of the operation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Protect => "encrypt",
            Self::Access => "decrypt",
            Self::Mask => "mask",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "encrypt" => Ok(Self::Protect),
            "decrypt" => Ok(Self::Access),
            "mask" => Ok(Self::Mask),
            other => Err(Error::InvalidOperation(other.to_owned())),
        }
    }
}

/// A dotted path selecting fields inside a JSON document.
///
/// Segments are split on `.` with no escape syntax; a key containing a
/// literal dot is not addressable. Empty segments are legal and address the
/// empty string key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    /// Creates a path from any string-like value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw dotted form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates the path segments in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldPath {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for FieldPath {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One field rule of a profile: where, what and with which handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    /// Dotted path to the fields this rule covers.
    pub path: FieldPath,

    /// Operation applied at every resolved leaf.
    pub operation: Operation,

    /// Transform definition supplying the handle for this rule.
    pub transform_id: TransformId,
}

impl FieldRule {
    /// Creates a field rule.
    #[must_use]
    pub fn new(
        path: impl Into<FieldPath>,
        operation: Operation,
        transform_id: impl Into<TransformId>,
    ) -> Self {
        Self {
            path: path.into(),
            operation,
            transform_id: transform_id.into(),
        }
    }
}

/// Sort order for array outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "ASC")]
    Ascending,
    #[serde(rename = "DESC")]
    Descending,
}

impl SortDirection {
    /// Returns the wire name of the direction.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("ASC") {
            Ok(Self::Ascending)
        } else if s.eq_ignore_ascii_case("DESC") {
            Ok(Self::Descending)
        } else {
            Err(Error::InvalidSortDirection(s.to_owned()))
        }
    }
}

/// Optional ordering applied to a top-level array after all field rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortRule {
    /// Whether sorting is active for the profile.
    pub enabled: bool,

    /// Dotted path to the sort key inside each array element.
    pub field: String,

    /// Ascending or descending, lexicographic on the key text.
    pub direction: SortDirection,
}

impl SortRule {
    /// Creates an enabled sort rule.
    #[must_use]
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            enabled: true,
            field: field.into(),
            direction,
        }
    }

    /// Creates a disabled sort rule (present in config but inert).
    #[must_use]
    pub fn disabled(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            enabled: false,
            field: field.into(),
            direction,
        }
    }
}
