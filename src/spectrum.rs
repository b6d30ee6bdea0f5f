//! The immutable spectrum entity: a sorted peak list plus metadata.

use log::warn;
use thiserror::Error;

use crate::metadata::{MetadataMap, MetadataValue, PeakCommentMap};
use crate::peaks::{PeakList, PeakListError};

/// The reserved metadata key under which per-peak comments are stored
pub const PEAK_COMMENTS_KEY: &str = "peak_comments";

/// Default relative tolerance used to migrate peak comments onto a
/// replacement peak list
pub const DEFAULT_PEAK_COMMENT_MZ_TOLERANCE: f64 = 1e-5;

#[derive(Debug, Error)]
pub enum SpectrumConstructionError {
    #[error("A spectrum must contain at least one peak")]
    EmptyPeakList,
    #[error("The m/z array must be non-decreasing")]
    UnsortedMz,
    #[error("Invalid peak arrays: {0}")]
    InvalidPeakList(
        #[from]
        #[source]
        PeakListError,
    ),
}

/// A container for one spectral record: an ordered peak list and its
/// free-form metadata.
///
/// Both halves are owned exclusively by the entity. The accessors return
/// independent copies, so mutating a returned [`MetadataMap`] or [`PeakList`]
/// never affects the spectrum it came from. State is only ever replaced
/// wholesale through [`Spectrum::set`] and [`Spectrum::set_peaks`].
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    peaks: PeakList,
    metadata: MetadataMap,
}

impl Spectrum {
    /// Build a spectrum from a sorted, non-empty peak list and a metadata map
    pub fn new(peaks: PeakList, metadata: MetadataMap) -> Result<Self, SpectrumConstructionError> {
        if peaks.is_empty() {
            return Err(SpectrumConstructionError::EmptyPeakList);
        }
        if !peaks.is_sorted() {
            return Err(SpectrumConstructionError::UnsortedMz);
        }
        Ok(Self { peaks, metadata })
    }

    /// An independent copy of the peak list
    pub fn peaks(&self) -> PeakList {
        self.peaks.clone()
    }

    /// An independent copy of the metadata map
    pub fn metadata(&self) -> MetadataMap {
        self.metadata.clone()
    }

    /// Retrieve a copy of the value stored under `key`, if any
    pub fn get(&self, key: &str) -> Option<MetadataValue> {
        self.metadata.get(key).cloned()
    }

    /// Retrieve the value stored under `key`, or `default` when absent
    pub fn get_or(&self, key: &str, default: MetadataValue) -> MetadataValue {
        self.get(key).unwrap_or(default)
    }

    /// Store `value` under `key`, returning `self` for chaining
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> &mut Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The per-peak comments, if any were recorded for this spectrum
    pub fn peak_comments(&self) -> Option<PeakCommentMap> {
        match self.metadata.get(PEAK_COMMENTS_KEY) {
            Some(MetadataValue::Comments(comments)) => Some(comments.clone()),
            _ => None,
        }
    }

    /// Replace the peak list wholesale, migrating any stored peak comments
    /// onto the new m/z values with the default tolerance
    pub fn set_peaks(&mut self, peaks: PeakList) -> Result<&mut Self, SpectrumConstructionError> {
        self.set_peaks_with_tolerance(peaks, DEFAULT_PEAK_COMMENT_MZ_TOLERANCE)
    }

    /// Replace the peak list wholesale. Any comment keyed by an m/z value no
    /// longer present migrates to the closest new m/z within a relative
    /// tolerance of `rtol`, merging with a comment already stored there.
    /// Comments with no in-tolerance match are dropped.
    pub fn set_peaks_with_tolerance(
        &mut self,
        peaks: PeakList,
        rtol: f64,
    ) -> Result<&mut Self, SpectrumConstructionError> {
        if peaks.is_empty() {
            return Err(SpectrumConstructionError::EmptyPeakList);
        }
        if !peaks.is_sorted() {
            return Err(SpectrumConstructionError::UnsortedMz);
        }
        if let Some(comments) = self.peak_comments() {
            let rekeyed = rekey_comments(comments, peaks.mz(), rtol);
            self.metadata
                .insert(PEAK_COMMENTS_KEY.to_string(), MetadataValue::Comments(rekeyed));
        }
        self.peaks = peaks;
        Ok(self)
    }
}

fn rekey_comments(comments: PeakCommentMap, mz_values: &[f64], rtol: f64) -> PeakCommentMap {
    let mut rekeyed = comments.clone();
    for (key, comment) in comments.iter() {
        if mz_values.contains(&key) {
            continue;
        }
        rekeyed.remove(key);
        match PeakCommentMap::closest_within(key, mz_values, rtol) {
            Some(new_key) => {
                let merged = match rekeyed.get(new_key) {
                    Some(existing) => format!("{existing}; {comment}"),
                    None => comment.to_string(),
                };
                rekeyed.insert(new_key, merged);
            }
            None => {
                warn!("Dropping the comment at m/z {key}: no peak within tolerance {rtol}");
            }
        }
    }
    rekeyed
}
