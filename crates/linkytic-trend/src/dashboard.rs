use linkytic_frame::DecodedFrame;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::HistoryError;
use crate::flow::{estimate_flow, FlowDirection};
use crate::history::{HistoryAggregator, HistoryConfig};
use crate::percent::scale_to_percent;

/// Instantaneous apparent power, watts.
pub const POWER: &str = "SINSTS";
/// Rms current on phase 1, amps.
pub const CURRENT: &str = "IRMS1";
/// Rms voltage on phase 1, volts.
pub const VOLTAGE: &str = "URMS1";

/// Dashboard behavior knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    #[serde(flatten)]
    pub history: HistoryConfig,
    /// Keep showing the last good power until this many reads in a row fail.
    pub hold_last_power_for: u32,
    /// A non-zero power after more than this many zero readings is reported
    /// as a switch back to drawing from the grid.
    pub withdrawn_switch_after: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            history: HistoryConfig::default(),
            hold_last_power_for: 3,
            withdrawn_switch_after: 10,
        }
    }
}

/// Everything a renderer needs for one screen update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayFrame {
    /// Power history as percentages of `bars_max`, oldest first.
    pub bars: Vec<Option<u8>>,
    /// Power, in watts, that 100% stands for.
    pub bars_max: i64,
    /// Power to show in large digits.
    pub displayed_power: Option<i64>,
    /// Power flow interval, e.g. `[2185;2415]`.
    pub flow: Option<String>,
    pub direction: Option<FlowDirection>,
    /// Set on the frame where power comes back after a long run of zeros.
    pub switched_to_withdrawn: bool,
    pub read_error: bool,
    /// Toggles on every good frame; a frozen beat means frames stopped.
    pub beat: bool,
}

/// Turns decoded frames into display frames.
#[derive(Debug)]
pub struct Dashboard {
    config: DashboardConfig,
    history: HistoryAggregator,
    beat: bool,
    error_streak: u32,
    zero_streak: u32,
    last_power: Option<i64>,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Result<Self, HistoryError> {
        Ok(Self {
            history: HistoryAggregator::from_config(&config.history)?,
            config,
            beat: true,
            error_streak: 0,
            zero_streak: 0,
            last_power: None,
        })
    }

    pub fn ingest(&mut self, frame: &DecodedFrame) -> DisplayFrame {
        let mut read_error = false;
        let mut switched_to_withdrawn = false;

        let power = match frame.integer(POWER) {
            Ok(watts) => {
                self.last_power = Some(watts);
                self.error_streak = 0;
                if watts == 0 {
                    self.zero_streak += 1;
                } else {
                    if self.zero_streak > self.config.withdrawn_switch_after {
                        switched_to_withdrawn = true;
                        info!(
                            zero_readings = self.zero_streak,
                            watts, "drawing from the grid again"
                        );
                    }
                    self.zero_streak = 0;
                }
                Some(watts)
            }
            Err(err) => {
                self.error_streak += 1;
                read_error = true;
                warn!(error = %err, streak = self.error_streak, "power reading unavailable");
                None
            }
        };

        self.history.push(power);
        let (bars, bars_max) = scale_to_percent(&self.history.to_fixed_width_list());

        let displayed_power = if self.error_streak < self.config.hold_last_power_for {
            self.last_power
        } else {
            None
        };

        let is_injecting = power == Some(0);
        let mut flow = None;
        let mut direction = None;
        if !read_error {
            match (frame.integer(CURRENT), frame.integer(VOLTAGE)) {
                (Ok(current), Ok(voltage)) => {
                    let estimate = estimate_flow(current, voltage, is_injecting);
                    let dir = FlowDirection::classify(current, is_injecting);
                    debug!(flow = %estimate, direction = %dir, "flow estimated");
                    flow = Some(estimate.label);
                    direction = Some(dir);
                }
                (Err(err), _) | (_, Err(err)) => {
                    warn!(error = %err, "flow estimate unavailable");
                    read_error = true;
                }
            }
        }

        let display = DisplayFrame {
            bars,
            bars_max,
            displayed_power,
            flow,
            direction,
            switched_to_withdrawn,
            read_error,
            beat: self.beat,
        };

        if self.error_streak == 0 {
            self.beat = !self.beat;
        }
        display
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn history(&self) -> &HistoryAggregator {
        &self.history
    }

    /// Consecutive frames without a usable power reading.
    pub fn error_streak(&self) -> u32 {
        self.error_streak
    }
}

#[cfg(test)]
mod tests {
    use linkytic_frame::{Reading, TicValue};

    use super::*;

    fn frame(pairs: &[(&str, &str)]) -> DecodedFrame {
        pairs
            .iter()
            .map(|(name, value)| Reading {
                name: name.to_string(),
                value: TicValue::Scalar(value.to_string()),
            })
            .collect()
    }

    fn small() -> Dashboard {
        Dashboard::new(DashboardConfig {
            history: HistoryConfig {
                width: 4,
                history_size: 4,
            },
            ..DashboardConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn full_frame_produces_power_and_flow() {
        let mut dashboard = small();
        let display = dashboard.ingest(&frame(&[
            ("SINSTS", "02300"),
            ("IRMS1", "010"),
            ("URMS1", "230"),
        ]));

        assert_eq!(display.displayed_power, Some(2300));
        assert_eq!(display.flow.as_deref(), Some("[2185;2415]"));
        assert_eq!(display.direction, Some(FlowDirection::Withdrawing));
        assert_eq!(display.bars, vec![Some(100)]);
        assert_eq!(display.bars_max, 2300);
        assert!(!display.read_error);
        assert!(display.beat);
    }

    #[test]
    fn zero_power_means_injecting() {
        let mut dashboard = small();
        let display = dashboard.ingest(&frame(&[
            ("SINSTS", "00000"),
            ("IRMS1", "004"),
            ("URMS1", "240"),
        ]));
        assert_eq!(display.flow.as_deref(), Some("[-1080;-840]"));
        assert_eq!(display.direction, Some(FlowDirection::Injecting));
        assert_eq!(display.bars, vec![Some(0)]);
        assert_eq!(display.bars_max, 0);
    }

    #[test]
    fn beat_toggles_only_on_good_frames() {
        let mut dashboard = small();
        let good = frame(&[("SINSTS", "100"), ("IRMS1", "1"), ("URMS1", "230")]);
        let bad = frame(&[("IRMS1", "1")]);

        assert!(dashboard.ingest(&good).beat);
        assert!(!dashboard.ingest(&good).beat);
        assert!(dashboard.ingest(&bad).beat);
        assert!(dashboard.ingest(&bad).beat);
        assert!(dashboard.ingest(&good).beat);
        assert!(!dashboard.ingest(&good).beat);
    }

    #[test]
    fn last_power_is_held_through_short_outages() {
        let mut dashboard = small();
        dashboard.ingest(&frame(&[("SINSTS", "750")]));

        let missing = frame(&[]);
        let first = dashboard.ingest(&missing);
        assert!(first.read_error);
        assert_eq!(first.displayed_power, Some(750));
        assert_eq!(first.flow, None);
        assert_eq!(dashboard.ingest(&missing).displayed_power, Some(750));
        assert_eq!(dashboard.ingest(&missing).displayed_power, None);
        assert_eq!(dashboard.error_streak(), 3);

        assert_eq!(
            dashboard.history().to_fixed_width_list(),
            vec![Some(750), None, None, None]
        );
    }

    #[test]
    fn nothing_displayed_before_first_reading() {
        let mut dashboard = small();
        let display = dashboard.ingest(&frame(&[("SINSTS", "n/a")]));
        assert!(display.read_error);
        assert_eq!(display.displayed_power, None);
        assert_eq!(display.bars, vec![None]);
    }

    #[test]
    fn missing_rms_is_a_read_error_but_keeps_power() {
        let mut dashboard = small();
        let display = dashboard.ingest(&frame(&[("SINSTS", "500"), ("IRMS1", "2")]));
        assert!(display.read_error);
        assert_eq!(display.displayed_power, Some(500));
        assert_eq!(display.flow, None);
        // Power itself was fine, so the heartbeat still advances.
        assert!(!dashboard.ingest(&frame(&[("SINSTS", "500")])).beat);
    }

    #[test]
    fn reports_switch_back_to_withdrawal_after_long_zero_run() {
        let mut dashboard = small();
        for _ in 0..11 {
            assert!(!dashboard.ingest(&frame(&[("SINSTS", "0")])).switched_to_withdrawn);
        }
        assert!(dashboard.ingest(&frame(&[("SINSTS", "120")])).switched_to_withdrawn);
        assert!(!dashboard.ingest(&frame(&[("SINSTS", "130")])).switched_to_withdrawn);
    }

    #[test]
    fn short_zero_run_is_not_a_switch() {
        let mut dashboard = small();
        for _ in 0..10 {
            dashboard.ingest(&frame(&[("SINSTS", "0")]));
        }
        assert!(!dashboard.ingest(&frame(&[("SINSTS", "120")])).switched_to_withdrawn);
    }

    #[test]
    fn bars_are_percent_of_window_maximum() {
        let mut dashboard = small();
        for watts in ["250", "500", "1000"] {
            dashboard.ingest(&frame(&[("SINSTS", watts)]));
        }
        let display = dashboard.ingest(&frame(&[("SINSTS", "0")]));
        assert_eq!(display.bars, vec![Some(25), Some(50), Some(100), Some(0)]);
        assert_eq!(display.bars_max, 1000);
    }

    #[test]
    fn rejects_bad_geometry() {
        let config = DashboardConfig {
            history: HistoryConfig {
                width: 0,
                history_size: 10,
            },
            ..DashboardConfig::default()
        };
        assert!(Dashboard::new(config).is_err());
    }

    #[test]
    fn display_frame_serializes() {
        let mut dashboard = small();
        let display = dashboard.ingest(&frame(&[("SINSTS", "0"), ("IRMS1", "0"), ("URMS1", "230")]));
        let json = serde_json::to_value(&display).unwrap();
        assert_eq!(json["direction"], "balanced");
        assert_eq!(json["flow"], "[-115;115]");
    }
}
