use std::sync::atomic::Ordering;

use linkytic_frame::{assemble_with_report, FrameError, FrameReader};
use tracing::info;

use crate::cmd::{install_ctrlc_handler, open_source, DecodeArgs};
use crate::config::AppConfig;
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_frame, FrameView, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat, config: &AppConfig) -> CliResult<i32> {
    let (source, mode) = open_source(&args.source, config)?;
    let running = install_ctrlc_handler()?;
    let mut reader = FrameReader::with_config(source, config.reader_config(mode));

    let mut printed = 0u64;
    while running.load(Ordering::SeqCst) {
        let raw = match reader.next_raw_frame() {
            Ok(raw) => raw,
            Err(FrameError::SourceExhausted) => break,
            Err(err) => return Err(frame_error("read failed", err)),
        };
        let (frame, report) = assemble_with_report(raw.datasets(), mode);
        printed = printed.saturating_add(1);

        print_frame(
            &FrameView {
                index: printed,
                mode,
                raw: &raw,
                frame: &frame,
                report,
            },
            format,
        );

        if let Some(count) = args.count {
            if printed >= count {
                break;
            }
        }
    }

    let stats = reader.stats();
    info!(
        frames = stats.frames,
        resyncs = stats.resyncs,
        discarded_bytes = stats.discarded_bytes,
        "decode finished"
    );
    Ok(SUCCESS)
}
