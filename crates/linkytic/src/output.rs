use std::collections::BTreeMap;
use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use linkytic_frame::{AssemblyReport, DecodedFrame, RawFrame, TicMode, TicValue};
use linkytic_trend::DisplayFrame;
use serde::Serialize;

const BAR_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum ValueOutput<'a> {
    Scalar(&'a str),
    Dated { date: &'a str, value: &'a str },
}

impl<'a> From<&'a TicValue> for ValueOutput<'a> {
    fn from(value: &'a TicValue) -> Self {
        match value {
            TicValue::Scalar(value) => ValueOutput::Scalar(value),
            TicValue::Dated { date, value } => ValueOutput::Dated { date, value },
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    index: u64,
    mode: &'static str,
    readings: BTreeMap<&'a str, ValueOutput<'a>>,
    rejected: usize,
    timestamp: String,
}

/// One decoded frame, with the raw payload it came from.
pub struct FrameView<'a> {
    pub index: u64,
    pub mode: TicMode,
    pub raw: &'a RawFrame,
    pub frame: &'a DecodedFrame,
    pub report: AssemblyReport,
}

pub fn print_frame(view: &FrameView<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                index: view.index,
                mode: view.mode.as_str(),
                readings: view
                    .frame
                    .iter()
                    .map(|(name, value)| (name, ValueOutput::from(value)))
                    .collect(),
                rejected: view.report.rejected(),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["NAME", "DATE", "VALUE"]);
            for (name, value) in view.frame.iter() {
                table.add_row(vec![
                    name.to_string(),
                    value.date().unwrap_or("").to_string(),
                    value.value().to_string(),
                ]);
            }
            println!(
                "frame {} ({} readings, {} rejected)",
                view.index,
                view.frame.len(),
                view.report.rejected()
            );
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let readings: Vec<String> = view
                .frame
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            println!("frame={} {}", view.index, readings.join(" "));
        }
        OutputFormat::Raw => {
            print_raw(view.raw.as_bytes());
        }
    }
}

pub fn print_display(display: &DisplayFrame, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(display).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["POWER", "FLOW", "DIRECTION", "MAX", "STATUS"])
                .add_row(vec![
                    power_label(display.displayed_power),
                    display.flow.clone().unwrap_or_else(|| "-".to_string()),
                    display
                        .direction
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    format!("{}W", display.bars_max),
                    status_label(display).to_string(),
                ]);
            println!("{table}");
            println!("{}", sparkline(&display.bars));
        }
        OutputFormat::Pretty => {
            let flow = match (&display.flow, display.direction) {
                (Some(flow), Some(direction)) => format!(" flow={flow}W ({direction})"),
                (Some(flow), None) => format!(" flow={flow}W"),
                _ => String::new(),
            };
            println!(
                "{} power={}{flow} max={}W {} {}",
                if display.beat { '*' } else { ' ' },
                power_label(display.displayed_power),
                display.bars_max,
                status_label(display),
                sparkline(&display.bars)
            );
        }
        OutputFormat::Raw => {
            println!("{}", sparkline(&display.bars));
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// One character per column; blank for a missing sample.
pub fn sparkline(bars: &[Option<u8>]) -> String {
    bars.iter()
        .map(|bar| match bar {
            Some(percent) => {
                let level = usize::from((*percent).min(100)) * (BAR_LEVELS.len() - 1) / 100;
                BAR_LEVELS[level]
            }
            None => ' ',
        })
        .collect()
}

fn power_label(power: Option<i64>) -> String {
    match power {
        Some(watts) => format!("{watts}W"),
        None => "--".to_string(),
    }
}

fn status_label(display: &DisplayFrame) -> &'static str {
    if display.read_error {
        "read-error"
    } else if display.switched_to_withdrawn {
        "withdrawing-again"
    } else {
        "ok"
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
