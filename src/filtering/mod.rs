//! Metadata harmonization filters.
//!
//! Each filter takes an optional borrowed [`Spectrum`](crate::spectrum::Spectrum)
//! and returns a new one with normalized metadata, never mutating its input.
//! `None` passes straight through, so filters compose over the
//! `Option<Spectrum>` elements an MSP stream yields.

mod parent_mass;
mod precursor;
mod retention;

pub use parent_mass::add_parent_mass;
pub use precursor::add_precursor_mz;
pub use retention::{add_retention_index, add_retention_time};
