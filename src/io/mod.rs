//! Reading mass spectrometry spectral library formats.

pub mod msp;

pub use crate::io::msp::{is_msp, MSPError, MSPParserState, MSPReader, MSPReaderType};
