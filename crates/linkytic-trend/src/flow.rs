use std::fmt;

use serde::Serialize;

/// Plausible power-flow interval, in watts.
///
/// Positive values are drawn from the grid, negative values injected into it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowEstimate {
    pub low: f64,
    pub high: f64,
    /// `[low;high]` with both ends rounded to whole watts.
    pub label: String,
}

impl fmt::Display for FlowEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Bracket the power flow from integer rms readings.
///
/// The meter rounds current to whole amps, so the true current lies within
/// half an amp of the reading.
pub fn estimate_flow(current_rms: i64, voltage_rms: i64, is_injecting: bool) -> FlowEstimate {
    let current = current_rms as f64;
    let voltage = voltage_rms as f64;

    let mut low = (current + 0.5) * voltage;
    let mut high = (current - 0.5) * voltage;
    if is_injecting {
        low = -low;
        high = -high;
    }
    if low > high {
        std::mem::swap(&mut low, &mut high);
    }

    let label = format!("[{};{}]", low.round() as i64, high.round() as i64);
    FlowEstimate { low, high, label }
}

/// Which way power is flowing, for colouring the flow estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowDirection {
    /// Current reads zero: neither drawing nor injecting measurably.
    Balanced,
    Injecting,
    Withdrawing,
}

impl FlowDirection {
    pub fn classify(current_rms: i64, is_injecting: bool) -> Self {
        if current_rms == 0 {
            FlowDirection::Balanced
        } else if is_injecting {
            FlowDirection::Injecting
        } else {
            FlowDirection::Withdrawing
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FlowDirection::Balanced => "balanced",
            FlowDirection::Injecting => "injecting",
            FlowDirection::Withdrawing => "withdrawing",
        }
    }
}

impl fmt::Display for FlowDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
