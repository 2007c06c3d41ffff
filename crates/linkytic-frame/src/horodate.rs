use std::fmt;

use crate::error::HorodateError;

/// Season marker carried in front of every TIC timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    /// `E`: summer time.
    Summer,
    /// `H`: winter time.
    Winter,
    /// ` `: meter without season information.
    Unknown,
}

/// A timestamp from the date field of a standard-mode dataset.
///
/// Wire format is 13 characters, `SYYMMDDhhmmss`. A lowercase season letter
/// means the meter clock is running in degraded mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Horodate {
    pub season: Season,
    pub degraded: bool,
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Horodate {
    pub const LEN: usize = 13;

    pub fn parse(input: &str) -> Result<Self, HorodateError> {
        let chars: Vec<char> = input.chars().collect();
        if chars.len() != Self::LEN {
            return Err(HorodateError::Length(chars.len()));
        }

        let (season, degraded) = match chars[0] {
            'E' => (Season::Summer, false),
            'e' => (Season::Summer, true),
            'H' => (Season::Winter, false),
            'h' => (Season::Winter, true),
            ' ' => (Season::Unknown, false),
            other => return Err(HorodateError::Season(other)),
        };

        let digits = &chars[1..];
        let year = field(digits, 0, "year", 0, 99)?;
        let month = field(digits, 2, "month", 1, 12)?;
        let day = field(digits, 4, "day", 1, 31)?;
        let hour = field(digits, 6, "hour", 0, 23)?;
        let minute = field(digits, 8, "minute", 0, 59)?;
        let second = field(digits, 10, "second", 0, 59)?;

        Ok(Self {
            season,
            degraded,
            year: 2000 + year as u16,
            month: month as u8,
            day: day as u8,
            hour: hour as u8,
            minute: minute as u8,
            second: second as u8,
        })
    }

    fn season_char(&self) -> char {
        let c = match self.season {
            Season::Summer => 'E',
            Season::Winter => 'H',
            Season::Unknown => return ' ',
        };
        if self.degraded {
            c.to_ascii_lowercase()
        } else {
            c
        }
    }

    /// Format back to the 13-character wire form.
    pub fn to_wire(&self) -> String {
        format!(
            "{}{:02}{:02}{:02}{:02}{:02}{:02}",
            self.season_char(),
            self.year % 100,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second
        )
    }
}

impl std::str::FromStr for Horodate {
    type Err = HorodateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Horodate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let season = match self.season {
            Season::Summer => "summer",
            Season::Winter => "winter",
            Season::Unknown => "no season",
        };
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02} ({season}{})",
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            if self.degraded { ", degraded clock" } else { "" }
        )
    }
}

fn field(
    digits: &[char],
    at: usize,
    name: &'static str,
    min: u32,
    max: u32,
) -> Result<u32, HorodateError> {
    let text: String = digits[at..at + 2].iter().collect();
    let value = text
        .chars()
        .try_fold(0u32, |acc, c| c.to_digit(10).map(|d| acc * 10 + d))
        .ok_or_else(|| HorodateError::NotNumeric {
            field: name,
            value: text.clone(),
        })?;
    if !(min..=max).contains(&value) {
        return Err(HorodateError::OutOfRange { field: name, value });
    }
    Ok(value)
}
