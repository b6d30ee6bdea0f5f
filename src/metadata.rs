//! The free-form metadata attached to a spectrum.
//!
//! MSP files carry no schema, so metadata is modeled as an ordered mapping
//! from lower-cased keys to loosely typed [`MetadataValue`] entries.

use std::fmt;

use indexmap::IndexMap;

/// An ordered mapping from lower-cased metadata keys to values. Insertion
/// order reflects the order keys were first seen in the source file.
pub type MetadataMap = IndexMap<String, MetadataValue>;

/// A single metadata value. Values read from a file are always [`MetadataValue::Str`];
/// the other variants are produced by harmonization filters or by user code.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MetadataValue {
    /// An explicit marker that a value was absent or could not be converted
    #[default]
    Missing,
    Str(String),
    Float(f64),
    /// Numeric array values compare element-wise
    FloatArray(Vec<f64>),
    /// The per-peak comments collected under the reserved `"peak_comments"` key
    Comments(PeakCommentMap),
}

impl MetadataValue {
    /// The borrowed string content, if this is a [`MetadataValue::Str`]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Coerce this value to a float where a sensible conversion exists.
    /// Strings are trimmed and parsed, a single-element array unwraps to
    /// its only element.
    pub fn to_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Str(value) => value.trim().parse().ok(),
            Self::FloatArray(values) if values.len() == 1 => Some(values[0]),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => Ok(()),
            Self::Str(value) => f.write_str(value),
            Self::Float(value) => write!(f, "{value}"),
            Self::FloatArray(values) => {
                let formatted: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", formatted.join(", "))
            }
            Self::Comments(comments) => write!(f, "<{} peak comments>", comments.len()),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<f64>> for MetadataValue {
    fn from(value: Vec<f64>) -> Self {
        Self::FloatArray(value)
    }
}

impl From<PeakCommentMap> for MetadataValue {
    fn from(value: PeakCommentMap) -> Self {
        Self::Comments(value)
    }
}

/// Comments attached to individual peaks, keyed by the m/z value of the peak
/// they annotate. The m/z key is approximate: it is whatever value the peak
/// had when the comment was recorded, so lookups against a replaced peak list
/// go through [`PeakCommentMap::closest_within`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakCommentMap {
    entries: Vec<(f64, String)>,
}

impl PeakCommentMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store `comment` under `mz`, replacing any comment already keyed by
    /// exactly that value.
    pub fn insert(&mut self, mz: f64, comment: impl Into<String>) {
        let comment = comment.into();
        if let Some(entry) = self.entries.iter_mut().find(|(key, _)| *key == mz) {
            entry.1 = comment;
        } else {
            self.entries.push((mz, comment));
        }
    }

    /// Look up the comment stored under exactly `mz`
    pub fn get(&self, mz: f64) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| *key == mz)
            .map(|(_, comment)| comment.as_str())
    }

    pub fn remove(&mut self, mz: f64) -> Option<String> {
        let i = self.entries.iter().position(|(key, _)| *key == mz)?;
        Some(self.entries.remove(i).1)
    }

    /// Find the candidate in `mz_values` closest to `mz` that lies within a
    /// relative tolerance of `rtol` scaled by the candidate value.
    pub fn closest_within(mz: f64, mz_values: &[f64], rtol: f64) -> Option<f64> {
        mz_values
            .iter()
            .copied()
            .filter(|candidate| (mz - candidate).abs() <= rtol * candidate.abs())
            .min_by(|a, b| {
                (mz - a)
                    .abs()
                    .partial_cmp(&(mz - b).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &str)> {
        self.entries.iter().map(|(mz, comment)| (*mz, comment.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|(mz, _)| *mz)
    }
}

impl FromIterator<(f64, String)> for PeakCommentMap {
    fn from_iter<T: IntoIterator<Item = (f64, String)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (mz, comment) in iter {
            map.insert(mz, comment);
        }
        map
    }
}
