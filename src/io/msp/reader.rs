use std::{
    fs,
    io::{self, prelude::*},
    path::Path,
    sync::OnceLock,
};

use log::warn;
use regex::Regex;
use thiserror::Error;

use crate::metadata::{MetadataMap, MetadataValue, PeakCommentMap};
use crate::peaks::PeakList;
use crate::spectrum::{Spectrum, PEAK_COMMENTS_KEY};

/// The metadata key that declares how many peaks a record contains. A record
/// is complete exactly when the number of accumulated peaks reaches this value.
pub(crate) const NUM_PEAKS_KEY: &str = "num peaks";

#[derive(PartialEq, Debug)]
pub enum MSPParserState {
    /// No lines consumed for the current record
    Empty,
    /// Metadata and/or peaks collected, the declared count not yet reached
    Accumulating,
    Done,
    Error,
}

#[derive(Debug, Error)]
pub enum MSPError {
    #[error("No error occurred")]
    NoError,
    #[error("Encountered a peak line with an odd number of values")]
    MalformedPeakLine,
    #[error("Encountered a peak line before a \"num peaks\" declaration")]
    MissingPeakCount,
    #[error("Could not parse the declared peak count {0:?}")]
    InvalidPeakCount(String),
    #[error("Accumulated {observed} peaks but the record declared {declared}")]
    PeakCountMismatch { declared: usize, observed: usize },
    #[error("Encountered an IO error: {0}")]
    IOError(
        #[from]
        #[source]
        io::Error,
    ),
}

fn golm_peak_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+:\d+$").unwrap())
}

fn peak_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?(?:[eE][-+]?\d+)?").unwrap())
}

fn peak_comment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"["'](.*)["']"#).unwrap())
}

/// The four shapes a `key=value` token inside a "Comments" field can take,
/// in match priority order. A span matched by an earlier pattern is masked
/// from the later ones.
fn comment_token_patterns() -> &'static [Regex; 4] {
    static PATTERNS: OnceLock<[Regex; 4]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // token="value"
            Regex::new(r#"(\S+)="([^"]*)""#).unwrap(),
            // "token=value"
            Regex::new(r#""(\w+)=([^"]*)""#).unwrap(),
            // "left=right" with an arbitrary left-hand side
            Regex::new(r#""([^"]*)=([^"]*)""#).unwrap(),
            // token=number, unquoted
            Regex::new(r"(\S+)=(\d+(?:\.\d*)?)").unwrap(),
        ]
    })
}

/// Decide whether a line carries metadata or peaks.
///
/// A line is metadata when it contains a colon, with one exception: the GOLM
/// dialect encodes an integer peak as `mz:intensity`, so a line that is
/// nothing but `<integer>:<integer>` is always a peak. A metadata value that
/// happens to look exactly like that is mis-classified; this is an accepted
/// limitation of the format.
pub fn is_metadata_line(line: &str) -> bool {
    line.contains(':') && !golm_peak_pattern().is_match(line)
}

/// The numeric pairs and optional comment extracted from one peak line
#[derive(Debug, Default, PartialEq)]
pub(crate) struct PeakLineTokens {
    pub mz: Vec<f64>,
    pub intensities: Vec<f64>,
    pub comment: Option<String>,
}

impl PeakLineTokens {
    fn pair_count(&self) -> usize {
        self.mz.len()
    }
}

/// Split the quoted comment, if any, off a peak line. Numeric parsing never
/// continues past the opening quote.
fn split_peak_comment(line: &str) -> (Option<String>, &str) {
    match peak_comment_pattern().captures(line) {
        Some(caps) => {
            let whole = caps.get(0).unwrap();
            let comment = caps.get(1).unwrap().as_str().to_string();
            (Some(comment), &line[..whole.start()])
        }
        None => (None, line),
    }
}

/// Extract every numeric value from a peak line, in order, and split them
/// into alternating (m/z, intensity) pairs. A single line may encode several
/// peaks. An odd number of values is a structural error.
pub(crate) fn parse_peak_line(line: &str) -> Result<PeakLineTokens, MSPError> {
    let (comment, numeric_part) = split_peak_comment(line);
    let values: Vec<f64> = peak_number_pattern()
        .find_iter(numeric_part)
        .map(|m| m.as_str().parse().unwrap())
        .collect();
    if values.len() % 2 != 0 {
        return Err(MSPError::MalformedPeakLine);
    }
    let mut tokens = PeakLineTokens {
        comment,
        ..Default::default()
    };
    for pair in values.chunks_exact(2) {
        tokens.mz.push(pair[0]);
        tokens.intensities.push(pair[1]);
    }
    Ok(tokens)
}

/// Scan a "Comments" field for nested `key=value` tokens, trying each token
/// shape in priority order and keeping the results in left-to-right order.
pub(crate) fn tokenize_comment_fields(text: &str) -> Vec<(String, String)> {
    let mut matched_spans: Vec<(usize, usize)> = Vec::new();
    let mut fields: Vec<(usize, String, String)> = Vec::new();
    for pattern in comment_token_patterns() {
        for caps in pattern.captures_iter(text) {
            let whole = caps.get(0).unwrap();
            let overlaps = matched_spans
                .iter()
                .any(|&(start, end)| whole.start() < end && start < whole.end());
            if overlaps {
                continue;
            }
            matched_spans.push((whole.start(), whole.end()));
            let key = caps.get(1).unwrap().as_str().trim().to_lowercase();
            let value = caps.get(2).unwrap().as_str().trim().to_string();
            fields.push((whole.start(), key, value));
        }
    }
    fields.sort_by_key(|(start, _, _)| *start);
    fields
        .into_iter()
        .map(|(_, key, value)| (key, value))
        .collect()
}

/// Tokenize one metadata line into `params`.
///
/// The line splits at the first colon. A "Comments" value containing `=` is
/// scanned for nested tokens; otherwise, or when the scan finds nothing, the
/// whole line becomes a single scalar entry under the lower-cased key.
pub(crate) fn parse_metadata(line: &str, params: &mut MetadataMap) {
    let Some((key_part, value_part)) = line.split_once(':') else {
        return;
    };
    let mut stored_any = false;
    if key_part.trim().eq_ignore_ascii_case("comments") && value_part.contains('=') {
        let normalized = value_part.replace('\'', "\"");
        for (key, value) in tokenize_comment_fields(&normalized) {
            store_comment_field(params, key, value);
            stored_any = true;
        }
    }
    if !stored_any {
        params.insert(
            key_part.to_lowercase(),
            MetadataValue::Str(value_part.trim().to_string()),
        );
    }
}

/// A repeated "smiles" token records an alternate structure under "smiles_2"
/// instead of overwriting the primary one.
fn store_comment_field(params: &mut MetadataMap, key: String, value: String) {
    if key == "smiles" && params.contains_key("smiles") {
        params.insert("smiles_2".to_string(), MetadataValue::Str(value));
    } else {
        params.insert(key, MetadataValue::Str(value));
    }
}

/// Accumulates classified lines for the record currently being assembled
#[derive(Debug, Default)]
struct SpectrumBuilder {
    params: MetadataMap,
    mz_array: Vec<f64>,
    intensity_array: Vec<f64>,
    peak_comments: PeakCommentMap,
    peak_count: usize,
}

impl SpectrumBuilder {
    fn is_empty(&self) -> bool {
        self.params.is_empty() && self.mz_array.is_empty()
    }

    fn handle_metadata_line(&mut self, line: &str) {
        parse_metadata(line, &mut self.params);
    }

    /// Append every pair from a peak line, attach a comment to the last
    /// accumulated m/z, and advance the running counter.
    fn handle_peak_line(&mut self, line: &str) -> Result<(), MSPError> {
        let tokens = parse_peak_line(line)?;
        self.peak_count += tokens.pair_count();
        self.mz_array.extend_from_slice(&tokens.mz);
        self.intensity_array.extend_from_slice(&tokens.intensities);
        if let Some(comment) = tokens.comment {
            if let Some(&mz) = self.mz_array.last() {
                self.peak_comments.insert(mz, comment);
            }
        }
        Ok(())
    }

    /// Compare the running counter against the declared peak count. The
    /// declaration must precede the first peak line, and the counter must
    /// never run past it.
    fn is_complete(&self) -> Result<bool, MSPError> {
        let declared = match self.params.get(NUM_PEAKS_KEY) {
            Some(value) => value,
            None => return Err(MSPError::MissingPeakCount),
        };
        let declared: usize = match declared.as_str().map(|s| s.trim().parse()) {
            Some(Ok(count)) => count,
            _ => return Err(MSPError::InvalidPeakCount(declared.to_string())),
        };
        if self.peak_count > declared {
            return Err(MSPError::PeakCountMismatch {
                declared,
                observed: self.peak_count,
            });
        }
        Ok(self.peak_count == declared)
    }

    /// Turn the completed record into a spectrum: merge peak comments into
    /// the metadata, sort by m/z when needed, and construct the entity.
    fn into_spectrum(self) -> Result<Spectrum, crate::spectrum::SpectrumConstructionError> {
        let mut params = self.params;
        if !self.peak_comments.is_empty() {
            params.insert(
                PEAK_COMMENTS_KEY.to_string(),
                MetadataValue::Comments(self.peak_comments),
            );
        }
        let mut peaks = PeakList::new(self.mz_array, self.intensity_array)?;
        if !peaks.is_sorted() {
            peaks.sort_by_mz();
        }
        Spectrum::new(peaks, params)
    }
}

/// An MSP spectral library parser that yields spectra in file order.
///
/// Record boundaries in MSP are not marked; a record ends when the number of
/// accumulated peaks reaches the value its `Num Peaks` line declared, so the
/// reader is strictly sequential. Iteration yields
/// `Result<Option<Spectrum>, MSPError>`: `Ok(Some(_))` for a parsed record,
/// `Ok(None)` for a record that completed but could not be turned into a
/// valid spectrum, and `Err(_)` for a structural error after which no
/// further records can be located.
pub struct MSPReaderType<R: io::Read> {
    pub handle: io::BufReader<R>,
    pub state: MSPParserState,
    pub error: Option<MSPError>,
}

impl<R: io::Read> MSPReaderType<R> {
    pub fn new(source: R) -> MSPReaderType<R> {
        MSPReaderType {
            handle: io::BufReader::with_capacity(500, source),
            state: MSPParserState::Empty,
            error: None,
        }
    }

    fn read_line(&mut self, buffer: &mut String) -> io::Result<usize> {
        self.handle.read_line(buffer)
    }

    /// Feed one classified line to the builder, reporting whether the
    /// current record is still open.
    fn handle_line(&mut self, line: &str, builder: &mut SpectrumBuilder) -> bool {
        if is_metadata_line(line) {
            builder.handle_metadata_line(line);
            return true;
        }
        let outcome = builder
            .handle_peak_line(line)
            .and_then(|_| builder.is_complete());
        match outcome {
            Ok(complete) => !complete,
            Err(err) => {
                self.state = MSPParserState::Error;
                self.error = Some(err);
                false
            }
        }
    }

    /// Accumulate lines into `builder` until the record completes or the
    /// input ends. `Ok(true)` means a record completed; `Ok(false)` means
    /// the stream was exhausted first.
    fn parse_into(&mut self, builder: &mut SpectrumBuilder) -> Result<bool, MSPError> {
        let mut buffer = String::new();
        loop {
            buffer.clear();
            let b = match self.read_line(&mut buffer) {
                Ok(b) => b,
                Err(err) => {
                    self.state = MSPParserState::Error;
                    return Err(MSPError::IOError(err));
                }
            };
            if b == 0 {
                self.state = MSPParserState::Done;
                return Ok(false);
            }

            let line = buffer.trim_end();

            // Blank lines carry no meaning in any dialect
            if line.is_empty() {
                continue;
            }

            if self.state == MSPParserState::Empty {
                self.state = MSPParserState::Accumulating;
            }

            if !self.handle_line(line, builder) {
                if self.state == MSPParserState::Error {
                    return Err(self.error.take().unwrap_or(MSPError::NoError));
                }
                self.state = MSPParserState::Empty;
                return Ok(true);
            }
        }
    }

    /// Read the next record from the file, if there is one. A record whose
    /// spectrum could not be constructed yields `Ok(None)` and the stream
    /// continues past it.
    pub fn read_next(&mut self) -> Option<Result<Option<Spectrum>, MSPError>> {
        if matches!(self.state, MSPParserState::Done | MSPParserState::Error) {
            return None;
        }
        let mut builder = SpectrumBuilder::default();
        match self.parse_into(&mut builder) {
            Ok(true) => match builder.into_spectrum() {
                Ok(spectrum) => Some(Ok(Some(spectrum))),
                Err(err) => {
                    warn!("Failed to build a spectrum from a completed record: {err}");
                    Some(Ok(None))
                }
            },
            Ok(false) => {
                if !builder.is_empty() {
                    warn!(
                        "Dropping a trailing partial record with {} of its declared peaks",
                        builder.peak_count
                    );
                }
                None
            }
            Err(err) => Some(Err(err)),
        }
    }
}

impl MSPReaderType<fs::File> {
    /// Open a file from a path. The handle is held for the lifetime of the
    /// reader and released when it is dropped.
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Self::new(fs::File::open(path)?))
    }
}

impl<R: io::Read> Iterator for MSPReaderType<R> {
    type Item = Result<Option<Spectrum>, MSPError>;

    /// Read the next record from the file. After a fatal structural error
    /// the iterator terminates.
    fn next(&mut self) -> Option<Self::Item> {
        self.read_next()
    }
}

pub type MSPReader = MSPReaderType<fs::File>;
