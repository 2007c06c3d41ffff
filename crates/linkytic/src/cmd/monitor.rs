use std::sync::atomic::Ordering;
use std::thread;

use linkytic_frame::{FrameError, FrameReader};
use linkytic_trend::{display_mailbox, Dashboard, DisplayFrame};
use tracing::{debug, info};

use crate::cmd::{install_ctrlc_handler, open_source, MonitorArgs};
use crate::config::AppConfig;
use crate::exit::{
    frame_error, handoff_error, history_error, io_error, CliError, CliResult, INTERNAL, SUCCESS,
};
use crate::output::{print_display, OutputFormat};

pub fn run(args: MonitorArgs, format: OutputFormat, config: &AppConfig) -> CliResult<i32> {
    let mut dashboard_config = config.display;
    if let Some(width) = args.width {
        dashboard_config.history.width = width;
    }
    if let Some(history) = args.history {
        dashboard_config.history.history_size = history;
    }
    let mut dashboard =
        Dashboard::new(dashboard_config).map_err(|err| history_error("invalid graph", err))?;

    let (source, mode) = open_source(&args.source, config)?;
    let running = install_ctrlc_handler()?;
    let mut reader = FrameReader::with_config(source, config.reader_config(mode));

    let (tx, rx) = display_mailbox::<DisplayFrame>();
    let renderer = thread::Builder::new()
        .name("linkytic-render".into())
        .spawn(move || {
            while let Ok(display) = rx.recv() {
                print_display(&display, format);
            }
            debug!("renderer exiting");
        })
        .map_err(|err| io_error("failed to start renderer", err))?;

    let mut frames = 0u64;
    let result = loop {
        if !running.load(Ordering::SeqCst) {
            break Ok(());
        }
        let frame = match reader.next_frame() {
            Ok(frame) => frame,
            Err(FrameError::SourceExhausted) => break Ok(()),
            Err(err) => break Err(frame_error("read failed", err)),
        };
        let display = dashboard.ingest(&frame);
        if let Err(err) = tx.publish(display) {
            break Err(handoff_error("renderer stopped", err));
        }
        frames = frames.saturating_add(1);

        if let Some(count) = args.count {
            if frames >= count {
                break Ok(());
            }
        }
    };

    let dropped = tx.dropped();
    drop(tx);
    renderer
        .join()
        .map_err(|_| CliError::new(INTERNAL, "renderer thread panicked"))?;

    let stats = reader.stats();
    info!(
        frames,
        dropped_displays = dropped,
        resyncs = stats.resyncs,
        "monitor stopped"
    );
    result.map(|()| SUCCESS)
}
