//! Read MSP spectral library files.
//!
//! MSP is a loosely specified line-oriented text format with several
//! incompatible dialects: per-peak comments in quotes, nested `key=value`
//! pairs inside a "Comments" field, and the GOLM integer `mz:intensity`
//! encoding that collides with the metadata-line syntax. Records carry no
//! end marker; a record is complete when the number of accumulated peaks
//! reaches its declared `Num Peaks` value, which is why parsing is strictly
//! sequential within a file.

mod reader;

pub use reader::{is_metadata_line, MSPError, MSPParserState, MSPReader, MSPReaderType};

/// Check whether a buffer looks like the start of an MSP file
pub fn is_msp(buf: &[u8]) -> bool {
    let needle = b"num peaks";
    buf.windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::metadata::MetadataValue;
    use crate::spectrum::Spectrum;
    use std::{fs, path};

    #[test]
    fn test_is_msp() {
        assert!(is_msp(b"Name: caffeine\nNum Peaks: 2\n"));
        assert!(is_msp(b"NUM PEAKS: 2\n"));
        assert!(!is_msp(b"BEGIN IONS\nTITLE=scan 1\n"));
    }

    #[test]
    fn test_reader() {
        let path = path::Path::new("./test/data/small.msp");
        let file = fs::File::open(path).expect("Test file doesn't exist");
        let reader = MSPReaderType::new(file);
        let spectra: Vec<Option<Spectrum>> = reader
            .collect::<Result<_, MSPError>>()
            .expect("Test file parses without structural errors");

        // the trailing partial record is never emitted
        assert_eq!(spectra.len(), 3);
        assert!(spectra.iter().all(|entry| entry.is_some()));
    }

    #[test]
    fn test_reader_contents() {
        let reader = MSPReader::from_path("./test/data/small.msp").expect("Test file opens");
        let spectra: Vec<Option<Spectrum>> =
            reader.collect::<Result<_, MSPError>>().expect("Test file parses");

        let first = spectra[0].as_ref().unwrap();
        assert_eq!(first.get("name"), Some(MetadataValue::from("Benzene")));
        assert_eq!(
            first.get("precursormz"),
            Some(MetadataValue::from("79.0542"))
        );
        // nested Comments tokens land as their own entries
        assert_eq!(
            first.get("collision_energy"),
            Some(MetadataValue::from("35eV"))
        );
        assert_eq!(
            first.get("smiles"),
            Some(MetadataValue::from("C1=CC=CC=C1"))
        );
        assert_eq!(first.peaks().len(), 3);
        assert!(first.peaks().is_sorted());
        let comments = first.peak_comments().unwrap();
        assert_eq!(comments.get(77.0386), Some("loss of H2"));

        // GOLM-style record
        let second = spectra[1].as_ref().unwrap();
        assert_eq!(second.peaks().mz(), &[70.0, 81.0]);
        assert_eq!(second.peaks().intensities(), &[22.0, 190.0]);

        // declared counts hold for every emitted record
        for entry in &spectra {
            let spectrum = entry.as_ref().unwrap();
            let declared: usize = spectrum
                .get("num peaks")
                .and_then(|v| v.as_str().map(|s| s.parse().unwrap()))
                .unwrap();
            assert_eq!(spectrum.peaks().len(), declared);
        }
    }
}
