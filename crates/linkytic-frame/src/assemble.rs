use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::codec::{decode_dataset, Reading, TicMode, TicValue};
use crate::error::{AttributeError, DatasetError};
use crate::horodate::Horodate;
use crate::sync::RawFrame;

/// All validated attributes of one frame, keyed by name.
///
/// A name repeated within a frame keeps its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedFrame {
    readings: BTreeMap<String, TicValue>,
}

impl DecodedFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a reading, returning the value it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: TicValue) -> Option<TicValue> {
        self.readings.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&TicValue> {
        self.readings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.readings.contains_key(name)
    }

    /// Value of a scalar attribute.
    pub fn scalar(&self, name: &str) -> Result<&str, AttributeError> {
        match self.lookup(name)? {
            TicValue::Scalar(value) => Ok(value),
            TicValue::Dated { .. } => Err(AttributeError::WrongShape(name.to_string())),
        }
    }

    /// `(date, value)` of a dated attribute.
    pub fn dated(&self, name: &str) -> Result<(&str, &str), AttributeError> {
        match self.lookup(name)? {
            TicValue::Dated { date, value } => Ok((date, value)),
            TicValue::Scalar(_) => Err(AttributeError::WrongShape(name.to_string())),
        }
    }

    /// Value of an attribute parsed as an integer (`"01234"` → 1234).
    ///
    /// Works for both shapes; only the value part is parsed.
    pub fn integer(&self, name: &str) -> Result<i64, AttributeError> {
        let value = self.lookup(name)?.value();
        value
            .parse::<i64>()
            .map_err(|_| AttributeError::InvalidNumber {
                name: name.to_string(),
                value: value.to_string(),
            })
    }

    /// Date part of a dated attribute, parsed.
    pub fn horodate(&self, name: &str) -> Result<Horodate, AttributeError> {
        let (date, _) = self.dated(name)?;
        Horodate::parse(date).map_err(|source| AttributeError::InvalidHorodate {
            name: name.to_string(),
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TicValue)> {
        self.readings.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.readings.keys().map(String::as_str)
    }

    fn lookup(&self, name: &str) -> Result<&TicValue, AttributeError> {
        self.readings
            .get(name)
            .ok_or_else(|| AttributeError::Missing(name.to_string()))
    }
}

impl FromIterator<Reading> for DecodedFrame {
    fn from_iter<I: IntoIterator<Item = Reading>>(iter: I) -> Self {
        let mut frame = DecodedFrame::new();
        for reading in iter {
            frame.insert(reading.name, reading.value);
        }
        frame
    }
}

impl IntoIterator for DecodedFrame {
    type Item = (String, TicValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, TicValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.readings.into_iter()
    }
}

/// What happened to the datasets of one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    /// Datasets that decoded and passed their checksum.
    pub decoded: usize,
    /// Datasets with a structural problem.
    pub malformed: usize,
    /// Datasets whose checksum did not match.
    pub bad_checksum: usize,
    /// Decoded datasets that overwrote an earlier one of the same name.
    pub duplicates: usize,
}

impl AssemblyReport {
    pub fn rejected(&self) -> usize {
        self.malformed + self.bad_checksum
    }
}

/// Decode every record and collect the valid ones.
pub fn assemble<'a, I>(records: I, mode: TicMode) -> DecodedFrame
where
    I: IntoIterator<Item = &'a [u8]>,
{
    assemble_with_report(records, mode).0
}

/// Same as [`assemble`], also reporting how many records were skipped and why.
pub fn assemble_with_report<'a, I>(records: I, mode: TicMode) -> (DecodedFrame, AssemblyReport)
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut frame = DecodedFrame::new();
    let mut report = AssemblyReport::default();

    for record in records {
        match decode_dataset(record, mode) {
            Ok(Reading { name, value }) => {
                debug!(name = %name, value = %value, "dataset decoded");
                if frame.insert(name, value).is_some() {
                    report.duplicates += 1;
                }
                report.decoded += 1;
            }
            Err(err @ DatasetError::ChecksumMismatch { .. }) => {
                warn!(error = %err, "dropping dataset");
                report.bad_checksum += 1;
            }
            Err(err) => {
                warn!(
                    error = %err,
                    record = %String::from_utf8_lossy(record).escape_debug(),
                    "dropping dataset"
                );
                report.malformed += 1;
            }
        }
    }

    (frame, report)
}

/// Split and assemble a raw frame in one go.
pub fn decode_frame(raw: &RawFrame, mode: TicMode) -> DecodedFrame {
    assemble(raw.datasets(), mode)
}
