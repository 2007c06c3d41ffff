use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::HistoryError;

/// Columns of the reference 84-pixel LCD.
pub const DEFAULT_WIDTH: usize = 84;

/// Fifteen minutes of one-second frames.
pub const DEFAULT_HISTORY_SIZE: usize = 900;

/// Geometry of a history graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Number of columns available on the display.
    pub width: usize,
    /// Number of samples the graph should cover.
    pub history_size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            history_size: DEFAULT_HISTORY_SIZE,
        }
    }
}

/// How samples map to display columns. Chosen once, at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scaling {
    /// Fewer samples than columns: every sample is drawn `factor` columns wide.
    ScaleUp { factor: usize },
    /// More samples than columns: every `factor` samples are averaged into one
    /// column. Samples wait in `staging` until a group is complete.
    ScaleDown {
        factor: usize,
        staging: Vec<Option<i64>>,
    },
}

impl Scaling {
    pub fn factor(&self) -> usize {
        match self {
            Scaling::ScaleUp { factor } | Scaling::ScaleDown { factor, .. } => *factor,
        }
    }
}

/// Bounded history of one reading, shaped for a fixed-width graph.
///
/// `None` samples are missing readings. They are kept (so gaps show on the
/// graph) and skipped when averaging.
#[derive(Debug, Clone)]
pub struct HistoryAggregator {
    width: usize,
    capacity: usize,
    scaling: Scaling,
    series: VecDeque<Option<i64>>,
}

impl HistoryAggregator {
    pub fn new(width: usize, requested_size: usize) -> Result<Self, HistoryError> {
        if width == 0 || requested_size == 0 {
            return Err(HistoryError::InvalidGeometry {
                width,
                requested: requested_size,
            });
        }

        let scaling = if requested_size <= width {
            Scaling::ScaleUp {
                factor: width / requested_size,
            }
        } else {
            let factor = requested_size.div_ceil(width);
            Scaling::ScaleDown {
                factor,
                staging: Vec::with_capacity(factor),
            }
        };
        let capacity = width * scaling.factor();

        match &scaling {
            Scaling::ScaleUp { factor } => {
                info!(width, factor, "history scaled up, each sample spans several columns");
            }
            Scaling::ScaleDown { factor, .. } => {
                info!(width, factor, "history scaled down, each column averages several samples");
            }
        }

        Ok(Self {
            width,
            capacity,
            scaling,
            series: VecDeque::with_capacity(capacity),
        })
    }

    pub fn from_config(config: &HistoryConfig) -> Result<Self, HistoryError> {
        Self::new(config.width, config.history_size)
    }

    /// Record one sample (`None` for a failed reading).
    pub fn push(&mut self, sample: Option<i64>) {
        match &mut self.scaling {
            Scaling::ScaleUp { .. } => self.series.push_back(sample),
            Scaling::ScaleDown { factor, staging } => {
                staging.push(sample);
                if staging.len() < *factor {
                    return;
                }
                let reduced = average(staging);
                staging.clear();
                self.series.push_back(reduced);
            }
        }

        if self.series.len() > self.capacity {
            let excess = self.series.len() - self.capacity;
            self.series.drain(..excess);
        }
    }

    /// The graph columns, oldest first, at most `width` of them.
    ///
    /// Older stored samples beyond the last `width` columns are cropped here,
    /// so anything scaled from this list (the dashboard's `bars_max`) only
    /// sees the visible window.
    pub fn to_fixed_width_list(&self) -> Vec<Option<i64>> {
        let columns: Vec<Option<i64>> = match &self.scaling {
            Scaling::ScaleUp { factor } => self
                .series
                .iter()
                .flat_map(|&sample| std::iter::repeat_n(sample, *factor))
                .collect(),
            Scaling::ScaleDown { .. } => self.series.iter().copied().collect(),
        };
        let skip = columns.len().saturating_sub(self.width);
        columns[skip..].to_vec()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Maximum number of stored samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn scaling(&self) -> &Scaling {
        &self.scaling
    }

    /// Stored samples (after scale-down reduction).
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Samples waiting for their scale-down group to complete.
    pub fn staged(&self) -> &[Option<i64>] {
        match &self.scaling {
            Scaling::ScaleUp { .. } => &[],
            Scaling::ScaleDown { staging, .. } => staging,
        }
    }

    pub fn clear(&mut self) {
        self.series.clear();
        if let Scaling::ScaleDown { staging, .. } = &mut self.scaling {
            staging.clear();
        }
    }
}

/// Floor average of the present samples; `None` if there are none.
fn average(samples: &[Option<i64>]) -> Option<i64> {
    let (sum, count) = samples
        .iter()
        .flatten()
        .fold((0i128, 0i128), |(sum, count), &v| (sum + i128::from(v), count + 1));
    // The mean of i64 values is itself within i64 range.
    (count > 0).then(|| sum.div_euclid(count) as i64)
}
