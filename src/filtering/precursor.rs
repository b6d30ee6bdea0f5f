use log::warn;

use crate::metadata::{MetadataMap, MetadataValue};
use crate::spectrum::Spectrum;

const PRECURSOR_MZ_KEYS: &[&str] = &["precursor_mz", "precursormz", "precursor_mass"];

/// Normalize the precursor m/z into a canonical `"precursor_mz"` float,
/// falling back to the first value of a `"pepmass"` entry.
pub fn add_precursor_mz(spectrum_in: Option<&Spectrum>) -> Option<Spectrum> {
    let mut spectrum = spectrum_in?.clone();
    let metadata = spectrum.metadata();
    let found = PRECURSOR_MZ_KEYS
        .iter()
        .filter_map(|key| metadata.get(*key))
        .find_map(|value| value.to_float());
    if let Some(mz) = found.or_else(|| pepmass_mz(&metadata)) {
        spectrum.set("precursor_mz", mz);
    } else {
        warn!("No precursor_mz found in metadata");
    }
    Some(spectrum)
}

/// The m/z half of a `pepmass` entry, which may also carry an intensity
pub(crate) fn pepmass_mz(metadata: &MetadataMap) -> Option<f64> {
    match metadata.get("pepmass")? {
        MetadataValue::FloatArray(values) => values.first().copied(),
        MetadataValue::Str(text) => text.split_ascii_whitespace().next()?.parse().ok(),
        other => other.to_float(),
    }
}
