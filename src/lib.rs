//! `mspdata` reads MSP spectral library files and provides a data model for
//! the mass spectra they contain.
//!
//! The MSP format is line-oriented and loosely specified. Each record is a
//! run of metadata lines followed by peak lines; the record ends once the
//! number of accumulated peaks reaches its declared `Num Peaks` value. The
//! reader yields one element per record: `Ok(Some(_))` for a parsed
//! [`Spectrum`], `Ok(None)` for a record that completed but could not become
//! a valid spectrum, and `Err(_)` for a structural error that makes the rest
//! of the file unreadable.
//!
//! ```
//! use std::io;
//! use mspdata::{MSPError, MSPReaderType};
//!
//! # fn main() -> Result<(), MSPError> {
//! let text = "Name: caffeine\n\
//!             Num Peaks: 2\n\
//!             138.0662 1000.0\n\
//!             195.0877 2000.0\n";
//! let reader = MSPReaderType::new(io::Cursor::new(text));
//! let spectra = reader.collect::<Result<Vec<_>, _>>()?;
//! assert_eq!(spectra.len(), 1);
//! let spectrum = spectra[0].as_ref().unwrap();
//! assert_eq!(spectrum.peaks().len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod filtering;
pub mod io;
pub mod metadata;
pub mod peaks;
pub mod spectrum;
pub mod utils;

pub use crate::io::msp::{is_msp, MSPError, MSPParserState, MSPReader, MSPReaderType};
pub use crate::metadata::{MetadataMap, MetadataValue, PeakCommentMap};
pub use crate::peaks::{PeakList, PeakListError};
pub use crate::spectrum::{
    Spectrum, SpectrumConstructionError, DEFAULT_PEAK_COMMENT_MZ_TOLERANCE, PEAK_COMMENTS_KEY,
};
