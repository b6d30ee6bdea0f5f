//! The peak list backing a spectrum: parallel m/z and intensity arrays.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PeakListError {
    #[error("m/z array has {0} entries but intensity array has {1}")]
    ArrayLengthMismatch(usize, usize),
    #[error("m/z values must be finite and non-negative")]
    InvalidMzValue,
}

/// An immutable collection of peaks stored as parallel arrays. The arrays are
/// always the same length; the m/z array is not necessarily sorted until
/// [`PeakList::sort_by_mz`] has been applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakList {
    mz: Vec<f64>,
    intensities: Vec<f64>,
}

impl PeakList {
    pub fn new(mz: Vec<f64>, intensities: Vec<f64>) -> Result<Self, PeakListError> {
        if mz.len() != intensities.len() {
            return Err(PeakListError::ArrayLengthMismatch(
                mz.len(),
                intensities.len(),
            ));
        }
        if mz.iter().any(|m| !m.is_finite() || *m < 0.0) {
            return Err(PeakListError::InvalidMzValue);
        }
        Ok(Self { mz, intensities })
    }

    pub fn len(&self) -> usize {
        self.mz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }

    pub fn mz(&self) -> &[f64] {
        &self.mz
    }

    pub fn intensities(&self) -> &[f64] {
        &self.intensities
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.mz
            .iter()
            .copied()
            .zip(self.intensities.iter().copied())
    }

    /// Whether the m/z array is already non-decreasing
    pub fn is_sorted(&self) -> bool {
        self.mz.windows(2).all(|pair| pair[0] <= pair[1])
    }

    /// Stable co-sort of both arrays by m/z. Applying this to an already
    /// sorted list leaves it unchanged.
    pub fn sort_by_mz(&mut self) {
        if self.is_sorted() {
            return;
        }
        let mut order: Vec<usize> = (0..self.mz.len()).collect();
        order.sort_by(|&i, &j| {
            self.mz[i]
                .partial_cmp(&self.mz[j])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let mz = order.iter().map(|&i| self.mz[i]).collect();
        let intensities = order.iter().map(|&i| self.intensities[i]).collect();
        self.mz = mz;
        self.intensities = intensities;
    }
}

impl fmt::Display for PeakList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeakList({} peaks)", self.len())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_new_validates_lengths() {
        let err = PeakList::new(vec![100.0, 200.0], vec![1.0]).unwrap_err();
        assert_eq!(err, PeakListError::ArrayLengthMismatch(2, 1));

        let peaks = PeakList::new(vec![100.0, 200.0], vec![1.0, 2.0]).unwrap();
        assert_eq!(peaks.len(), 2);
        assert!(!peaks.is_empty());
    }

    #[test]
    fn test_new_rejects_bad_mz() {
        let err = PeakList::new(vec![100.0, f64::NAN], vec![1.0, 2.0]).unwrap_err();
        assert_eq!(err, PeakListError::InvalidMzValue);
        let err = PeakList::new(vec![-5.0], vec![1.0]).unwrap_err();
        assert_eq!(err, PeakListError::InvalidMzValue);
    }

    #[test]
    fn test_sort_by_mz() {
        let mut peaks = PeakList::new(vec![300.0, 100.0, 200.0], vec![3.0, 1.0, 2.0]).unwrap();
        assert!(!peaks.is_sorted());
        peaks.sort_by_mz();
        assert!(peaks.is_sorted());
        assert_eq!(peaks.mz(), &[100.0, 200.0, 300.0]);
        assert_eq!(peaks.intensities(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let mut peaks = PeakList::new(vec![100.0, 200.0, 300.0], vec![1.0, 2.0, 3.0]).unwrap();
        let before = peaks.clone();
        peaks.sort_by_mz();
        assert_eq!(peaks, before);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let mut peaks = PeakList::new(vec![200.0, 100.0, 100.0], vec![9.0, 1.0, 2.0]).unwrap();
        peaks.sort_by_mz();
        assert_eq!(peaks.mz(), &[100.0, 100.0, 200.0]);
        assert_eq!(peaks.intensities(), &[1.0, 2.0, 9.0]);
    }
}
