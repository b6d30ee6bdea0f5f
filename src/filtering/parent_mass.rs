use log::warn;

use crate::filtering::precursor::pepmass_mz;
use crate::metadata::MetadataValue;
use crate::spectrum::Spectrum;
use crate::utils::neutral_mass;

/// Estimate the neutral parent mass from the precursor m/z and charge,
/// assuming an `[M+xH]` or `[M-xH]` adduct, when `"parent_mass"` is not
/// already present. An unparseable or absent charge defaults to 1.
pub fn add_parent_mass(spectrum_in: Option<&Spectrum>) -> Option<Spectrum> {
    let mut spectrum = spectrum_in?.clone();
    if spectrum
        .get("parent_mass")
        .is_some_and(|value| !value.is_missing())
    {
        return Some(spectrum);
    }

    let metadata = spectrum.metadata();
    let precursor_mz = metadata
        .get("precursor_mz")
        .and_then(|value| value.to_float())
        .or_else(|| pepmass_mz(&metadata));
    let Some(precursor_mz) = precursor_mz else {
        warn!("Not sufficient spectrum metadata to derive parent mass");
        return Some(spectrum);
    };

    let charge = metadata
        .get("charge")
        .and_then(charge_of)
        .filter(|z| *z != 0)
        .unwrap_or(1);
    spectrum.set("parent_mass", neutral_mass(precursor_mz, charge));
    Some(spectrum)
}

fn charge_of(value: &MetadataValue) -> Option<i32> {
    match value {
        MetadataValue::Str(text) => parse_charge(text),
        MetadataValue::Float(z) => Some(*z as i32),
        _ => None,
    }
}

/// Parse a charge, accepting both leading-sign (`-2`) and trailing-sign
/// (`2-`) spellings but rejecting a sign at both ends.
pub(crate) fn parse_charge(value: &str) -> Option<i32> {
    let value = value.trim();
    let (sign, value, tail_sign) = if let Some(stripped) = value.strip_suffix('+') {
        (1, stripped, true)
    } else if let Some(stripped) = value.strip_suffix('-') {
        (-1, stripped, true)
    } else {
        (1, value, false)
    };

    if tail_sign && (value.starts_with('-') || value.starts_with('+')) {
        return None;
    }

    value.parse::<i32>().ok().map(|z| sign * z)
}
