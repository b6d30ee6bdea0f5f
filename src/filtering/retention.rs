use std::sync::OnceLock;

use log::warn;
use regex::Regex;

use crate::metadata::MetadataValue;
use crate::spectrum::Spectrum;

const RETENTION_TIME_KEYS: &[&str] = &[
    "retention_time",
    "retentiontime",
    "rt",
    "scan_start_time",
    "rt_query",
    "rtinseconds",
];

const RETENTION_INDEX_KEYS: &[&str] = &["retention_index", "retentionindex", "ri"];

/// Consolidate the retention time variants into a canonical
/// `"retention_time"` float, in seconds. Values that cannot be converted or
/// are negative leave the target key explicitly missing.
pub fn add_retention_time(spectrum_in: Option<&Spectrum>) -> Option<Spectrum> {
    let mut spectrum = spectrum_in?.clone();
    add_retention(&mut spectrum, "retention_time", RETENTION_TIME_KEYS);
    Some(spectrum)
}

/// Consolidate the retention index variants into a canonical
/// `"retention_index"` float.
pub fn add_retention_index(spectrum_in: Option<&Spectrum>) -> Option<Spectrum> {
    let mut spectrum = spectrum_in?.clone();
    add_retention(&mut spectrum, "retention_index", RETENTION_INDEX_KEYS);
    Some(spectrum)
}

/// Store the first convertible value among `accepted_keys` under
/// `target_key`, or an explicit [`MetadataValue::Missing`] when none is.
fn add_retention(spectrum: &mut Spectrum, target_key: &str, accepted_keys: &[&str]) {
    let metadata = spectrum.metadata();
    let value = accepted_keys
        .iter()
        .filter_map(|key| metadata.get(*key))
        .find_map(safe_convert_to_float);
    match value {
        Some(seconds) => spectrum.set(target_key, seconds),
        None => spectrum.set(target_key, MetadataValue::Missing),
    };
}

/// Some MoNA files write retention values as strings with a unit suffix
fn unit_suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([+-]?\d*\.?\d+)\s*(min|ms|h|s)$").unwrap())
}

fn parse_unit_suffixed(text: &str) -> Option<f64> {
    let caps = unit_suffix_pattern().captures(text)?;
    let value: f64 = caps.get(1).unwrap().as_str().parse().ok()?;
    let factor = match caps.get(2).unwrap().as_str() {
        "min" => 60.0,
        "h" => 3600.0,
        "ms" => 1e-3,
        _ => 1.0,
    };
    Some(value * factor)
}

/// Convert a metadata value to a retention float, discarding negatives
fn safe_convert_to_float(value: &MetadataValue) -> Option<f64> {
    let converted = match value {
        MetadataValue::Str(text) => {
            let text = text.trim();
            let parsed = parse_unit_suffixed(text).or_else(|| text.parse().ok());
            if parsed.is_none() {
                warn!("{text:?} can't be converted to float");
            }
            parsed
        }
        other => other.to_float(),
    };
    converted.filter(|v| *v >= 0.0)
}
