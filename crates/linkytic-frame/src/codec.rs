use std::fmt;
use std::str::FromStr;

use crate::error::DatasetError;
use crate::markers::{is_delimiter, CR, ETX, HT, LF, SP, STX};

/// TIC wire variant.
///
/// The two variants differ in field separator and in which bytes the
/// checksum covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TicMode {
    /// Legacy mode: space-separated, 1200 baud.
    #[default]
    Historique,
    /// Linky mode: tab-separated, 9600 baud, optional timestamp field.
    Standard,
}

impl TicMode {
    /// Field separator byte.
    pub fn separator(self) -> u8 {
        match self {
            TicMode::Historique => SP,
            TicMode::Standard => HT,
        }
    }

    /// Line speed the meter uses for this mode.
    pub fn default_baud_rate(self) -> u32 {
        match self {
            TicMode::Historique => 1200,
            TicMode::Standard => 9600,
        }
    }

    /// The bytes of `record` covered by its checksum.
    ///
    /// Historique excludes the last two bytes (separator and checksum),
    /// standard excludes only the checksum byte. Returns `None` when the
    /// record cannot hold a separator and a checksum.
    pub fn checksum_span(self, record: &[u8]) -> Option<&[u8]> {
        if record.len() < 2 {
            return None;
        }
        let excluded = match self {
            TicMode::Historique => 2,
            TicMode::Standard => 1,
        };
        Some(&record[..record.len() - excluded])
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TicMode::Historique => "historique",
            TicMode::Standard => "standard",
        }
    }
}

impl fmt::Display for TicMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "historique" | "historic" | "legacy" => Ok(TicMode::Historique),
            "standard" => Ok(TicMode::Standard),
            other => Err(format!(
                "unknown TIC mode {other:?} (expected historique or standard)"
            )),
        }
    }
}

/// TIC checksum of `span`: low 6 bits of the byte sum, offset into printable ASCII.
pub fn checksum(span: &[u8]) -> u8 {
    let sum = span
        .iter()
        .fold(0u32, |acc, &b| acc.wrapping_add(u32::from(b)));
    ((sum & 0x3F) as u8) + 0x20
}

/// Value of a decoded attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicValue {
    /// `name value`
    Scalar(String),
    /// `name date value` (standard mode timestamped attributes)
    Dated { date: String, value: String },
}

impl TicValue {
    /// The value part, whatever the shape.
    pub fn value(&self) -> &str {
        match self {
            TicValue::Scalar(value) | TicValue::Dated { value, .. } => value,
        }
    }

    /// The date part of a dated value.
    pub fn date(&self) -> Option<&str> {
        match self {
            TicValue::Scalar(_) => None,
            TicValue::Dated { date, .. } => Some(date),
        }
    }

    pub fn is_dated(&self) -> bool {
        matches!(self, TicValue::Dated { .. })
    }
}

impl fmt::Display for TicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicValue::Scalar(value) => f.write_str(value),
            TicValue::Dated { date, value } => write!(f, "{value} @ {date}"),
        }
    }
}

/// One checksum-validated attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub name: String,
    pub value: TicValue,
}

/// Decode one dataset record (without its LF/CR markers).
///
/// The record layout is `fields <sep> checksum`. The checksum byte and the
/// separator before it are stripped before the fields are split, because the
/// checksum may itself be a space. The field count reported in errors
/// includes the checksum field, so a scalar record has 3 fields and a dated
/// one 4.
pub fn decode_dataset(record: &[u8], mode: TicMode) -> std::result::Result<Reading, DatasetError> {
    let sep = mode.separator();
    let len = record.len();
    if len < 2 || record[len - 2] != sep {
        return Err(DatasetError::MissingChecksum);
    }

    let body = &record[..len - 2];
    let fields: Vec<&[u8]> = body.split(|&b| b == sep).collect();

    let (name, value) = match fields.as_slice() {
        [name, value] if !name.is_empty() => {
            (*name, TicValue::Scalar(text(value)?.trim().to_string()))
        }
        [name, date, value] if !name.is_empty() => (
            *name,
            TicValue::Dated {
                // A leading space is the "no season" marker.
                date: text(date)?.trim_end().to_string(),
                value: text(value)?.trim().to_string(),
            },
        ),
        _ => {
            return Err(DatasetError::Malformed {
                fields: fields.len() + 1,
            })
        }
    };
    let name = text(name)?.to_string();

    let span = mode
        .checksum_span(record)
        .ok_or(DatasetError::MissingChecksum)?;
    let expected = checksum(span);
    let found = record[len - 1];
    if expected != found {
        return Err(DatasetError::ChecksumMismatch {
            name,
            expected: char::from(expected),
            found: char::from(found),
        });
    }

    Ok(Reading { name, value })
}

fn text(bytes: &[u8]) -> std::result::Result<&str, DatasetError> {
    std::str::from_utf8(bytes).map_err(|_| DatasetError::Encoding)
}

/// Build a dataset record (without LF/CR) with a valid checksum.
pub fn encode_dataset(
    name: &str,
    date: Option<&str>,
    value: &str,
    mode: TicMode,
) -> std::result::Result<Vec<u8>, DatasetError> {
    let sep = mode.separator();
    let mut record = Vec::with_capacity(name.len() + value.len() + 24);

    let fields = [Some(name), date, Some(value)];
    for (i, field) in fields.into_iter().flatten().enumerate() {
        if let Some(&byte) = field
            .as_bytes()
            .iter()
            .find(|&&b| is_delimiter(b) || b == sep)
        {
            return Err(DatasetError::ReservedByte { byte });
        }
        if i > 0 {
            record.push(sep);
        }
        record.extend_from_slice(field.as_bytes());
    }
    record.push(sep);

    // Placeholder so checksum_span sees the final layout.
    record.push(0);
    let span = mode
        .checksum_span(&record)
        .ok_or(DatasetError::MissingChecksum)?;
    let sum = checksum(span);
    if let Some(last) = record.last_mut() {
        *last = sum;
    }
    Ok(record)
}

/// Wrap dataset records into one `STX ... ETX` frame.
pub fn encode_frame<I, R>(records: I) -> Vec<u8>
where
    I: IntoIterator<Item = R>,
    R: AsRef<[u8]>,
{
    let mut frame = vec![STX];
    for record in records {
        frame.push(LF);
        frame.extend_from_slice(record.as_ref());
        frame.push(CR);
    }
    frame.push(ETX);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_matches_known_historique_dataset() {
        // "SINSTS 01234" sums to 766; 766 & 0x3F = 62; 62 + 32 = 94 ('^').
        assert_eq!(checksum(b"SINSTS 01234"), b'^');
    }

    #[test]
    fn checksum_span_differs_by_mode() {
        let record = b"ABC 12 X";
        assert_eq!(TicMode::Historique.checksum_span(record), Some(&b"ABC 12"[..]));
        assert_eq!(TicMode::Standard.checksum_span(record), Some(&b"ABC 12 "[..]));
        assert_eq!(TicMode::Standard.checksum_span(b"X"), None);
        assert_eq!(TicMode::Historique.checksum_span(b""), None);
    }

    #[test]
    fn decodes_historique_scalar() {
        let record = encode_dataset("SINSTS", None, "01234", TicMode::Historique).unwrap();
        assert_eq!(record, b"SINSTS 01234 ^");

        let reading = decode_dataset(&record, TicMode::Historique).unwrap();
        assert_eq!(reading.name, "SINSTS");
        assert_eq!(reading.value, TicValue::Scalar("01234".to_string()));
    }

    #[test]
    fn decodes_standard_scalar_and_dated() {
        let scalar = encode_dataset("URMS1", None, "231", TicMode::Standard).unwrap();
        let reading = decode_dataset(&scalar, TicMode::Standard).unwrap();
        assert_eq!(reading.value, TicValue::Scalar("231".to_string()));

        let dated = encode_dataset("SMAXSN", Some("E240315143000"), "05120", TicMode::Standard)
            .unwrap();
        let reading = decode_dataset(&dated, TicMode::Standard).unwrap();
        assert_eq!(reading.name, "SMAXSN");
        assert_eq!(
            reading.value,
            TicValue::Dated {
                date: "E240315143000".to_string(),
                value: "05120".to_string(),
            }
        );
    }

    #[test]
    fn standard_checksum_covers_trailing_separator() {
        let mut record = b"IRMS1\t010\t".to_vec();
        record.push(checksum(&record));
        assert!(decode_dataset(&record, TicMode::Standard).is_ok());

        // Same bytes but the checksum computed without the tab must fail.
        let mut wrong = b"IRMS1\t010\t".to_vec();
        wrong.push(checksum(b"IRMS1\t010"));
        assert!(matches!(
            decode_dataset(&wrong, TicMode::Standard),
            Err(DatasetError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn value_is_trimmed() {
        let record = encode_dataset("NGTF", None, "  TEMPO  ", TicMode::Standard).unwrap();
        let reading = decode_dataset(&record, TicMode::Standard).unwrap();
        assert_eq!(reading.value.value(), "TEMPO");
    }

    #[test]
    fn date_keeps_leading_season_space() {
        let record =
            encode_dataset("DATE", Some(" 240101120000"), "", TicMode::Standard).unwrap();
        let reading = decode_dataset(&record, TicMode::Standard).unwrap();
        assert_eq!(
            reading.value,
            TicValue::Dated {
                date: " 240101120000".into(),
                value: String::new(),
            }
        );
    }

    #[test]
    fn rejects_corrupted_checksum() {
        let mut record = encode_dataset("PAPP", None, "00450", TicMode::Historique).unwrap();
        let last = record.len() - 1;
        record[last] = record[last].wrapping_add(1);

        let err = decode_dataset(&record, TicMode::Historique).unwrap_err();
        assert!(matches!(err, DatasetError::ChecksumMismatch { ref name, .. } if name == "PAPP"));
        assert!(!err.is_malformed());
    }

    #[test]
    fn rejects_wrong_field_counts() {
        let mut two = b"LONELY ".to_vec();
        two.push(checksum(b"LONELY"));
        assert_eq!(
            decode_dataset(&two, TicMode::Historique),
            Err(DatasetError::Malformed { fields: 2 })
        );

        let mut five = b"A B C D ".to_vec();
        five.push(checksum(b"A B C D"));
        assert_eq!(
            decode_dataset(&five, TicMode::Historique),
            Err(DatasetError::Malformed { fields: 5 })
        );
    }

    #[test]
    fn rejects_records_without_checksum_field() {
        assert_eq!(
            decode_dataset(b"", TicMode::Standard),
            Err(DatasetError::MissingChecksum)
        );
        assert_eq!(
            decode_dataset(b"ADCO123X", TicMode::Historique),
            Err(DatasetError::MissingChecksum)
        );
        // Space separator in standard mode is not a field separator.
        assert_eq!(
            decode_dataset(b"ADCO 123 X", TicMode::Standard),
            Err(DatasetError::MissingChecksum)
        );
    }

    #[test]
    fn rejects_empty_name() {
        let mut record = b" 123 ".to_vec();
        record.push(checksum(b" 123"));
        assert!(matches!(
            decode_dataset(&record, TicMode::Historique),
            Err(DatasetError::Malformed { .. })
        ));
    }

    #[test]
    fn historique_checksum_may_be_a_space() {
        // Find a value whose checksum lands on the separator itself.
        let value = (0..10_000u32)
            .map(|n| format!("{n:05}"))
            .find(|v| checksum(format!("BASE {v}").as_bytes()) == SP)
            .expect("some value has a space checksum");

        let record = encode_dataset("BASE", None, &value, TicMode::Historique).unwrap();
        assert_eq!(*record.last().unwrap(), SP);

        let reading = decode_dataset(&record, TicMode::Historique).unwrap();
        assert_eq!(reading.value, TicValue::Scalar(value));
    }

    #[test]
    fn rejects_invalid_utf8() {
        let mut record = vec![b'N', b' ', 0xFF, b' '];
        record.push(checksum(&record[..3]));
        assert_eq!(
            decode_dataset(&record, TicMode::Historique),
            Err(DatasetError::Encoding)
        );
    }

    #[test]
    fn encode_refuses_reserved_bytes() {
        assert_eq!(
            encode_dataset("A B", None, "1", TicMode::Historique),
            Err(DatasetError::ReservedByte { byte: SP })
        );
        assert_eq!(
            encode_dataset("A", None, "1\r", TicMode::Standard),
            Err(DatasetError::ReservedByte { byte: CR })
        );
        // Spaces are fine inside standard-mode values.
        assert!(encode_dataset("MSG1", None, "PAS DE MESSAGE", TicMode::Standard).is_ok());
    }

    #[test]
    fn encode_frame_wraps_records() {
        let frame = encode_frame([&b"A 1 Q"[..], &b"B 2 S"[..]]);
        assert_eq!(frame, b"\x02\nA 1 Q\r\nB 2 S\r\x03");
    }

    #[test]
    fn mode_parses_and_displays() {
        assert_eq!("standard".parse::<TicMode>().unwrap(), TicMode::Standard);
        assert_eq!("Historique".parse::<TicMode>().unwrap(), TicMode::Historique);
        assert!("bogus".parse::<TicMode>().is_err());
        assert_eq!(TicMode::Standard.to_string(), "standard");
        assert_eq!(TicMode::Historique.default_baud_rate(), 1200);
        assert_eq!(TicMode::Standard.default_baud_rate(), 9600);
    }
}
