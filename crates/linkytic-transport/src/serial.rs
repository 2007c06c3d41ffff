use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use serialport::{DataBits, FlowControl, Parity, StopBits};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::source::{ByteSource, DEFAULT_CHUNK_SIZE};

/// Baud rates a TIC output can be wired for.
pub const SUPPORTED_BAUD_RATES: [u32; 5] = [1200, 2400, 4800, 9600, 19200];

/// How long one read waits for the first byte before reporting "nothing yet".
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(10);

/// Line settings for a TIC serial link.
///
/// The TIC line format is fixed at 7 data bits, even parity, one stop bit;
/// only the speed varies (1200 baud historique, 9600 baud standard).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    pub baud_rate: u32,
    /// Maximum bytes returned by one `read_available` call.
    pub chunk_size: usize,
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 1200,
            chunk_size: DEFAULT_CHUNK_SIZE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// A serial device configured 7E1 for the TIC line.
pub struct SerialPort {
    port: Box<dyn serialport::SerialPort>,
    path: PathBuf,
    config: SerialConfig,
}

impl SerialPort {
    /// Open and configure the device at `path`.
    pub fn open(path: impl AsRef<Path>, config: SerialConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !SUPPORTED_BAUD_RATES.contains(&config.baud_rate) {
            return Err(TransportError::UnsupportedBaudRate(config.baud_rate));
        }

        let port = serialport::new(path.to_string_lossy(), config.baud_rate)
            .data_bits(DataBits::Seven)
            .parity(Parity::Even)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout)
            .open()
            .map_err(|err| open_error(&path, err))?;

        info!(path = %path.display(), baud = config.baud_rate, "serial port opened (7E1)");

        Ok(Self { port, path, config })
    }

    /// Device path this port was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }
}

impl ByteSource for SerialPort {
    fn read_available(&mut self) -> Result<Bytes> {
        let mut chunk = vec![0u8; self.config.chunk_size.max(1)];
        loop {
            match self.port.read(&mut chunk) {
                Ok(0) => return Ok(Bytes::new()),
                Ok(n) => {
                    chunk.truncate(n);
                    debug!(bytes = n, "serial read");
                    return Ok(Bytes::from(chunk));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if is_idle(err.kind()) => return Ok(Bytes::new()),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("path", &self.path)
            .field("baud_rate", &self.config.baud_rate)
            .finish()
    }
}

/// A quiet line surfaces as a timeout, never as end of stream.
fn is_idle(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::TimedOut | ErrorKind::WouldBlock)
}

/// Missing devices and OS-level failures are open errors; a device that
/// rejects the line settings is a configure error.
fn open_error(path: &Path, err: serialport::Error) -> TransportError {
    let path = path.to_path_buf();
    match err.kind() {
        serialport::ErrorKind::NoDevice | serialport::ErrorKind::Io(_) => TransportError::Open {
            path,
            source: err.into(),
        },
        _ => TransportError::Configure {
            path,
            source: err.into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsupported_baud_rate() {
        let err = SerialPort::open(
            "/dev/null",
            SerialConfig {
                baud_rate: 115_200,
                ..SerialConfig::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, TransportError::UnsupportedBaudRate(115_200)));
    }

    #[test]
    fn missing_device_reports_open_error() {
        let err = SerialPort::open("/dev/linkytic-does-not-exist", SerialConfig::default())
            .unwrap_err();
        assert!(matches!(err, TransportError::Open { .. }));
    }

    #[test]
    fn error_kinds_map_to_open_or_configure() {
        let path = Path::new("/dev/ttyUSB0");

        let missing = serialport::Error::new(serialport::ErrorKind::NoDevice, "gone");
        assert!(matches!(open_error(path, missing), TransportError::Open { .. }));

        let io = serialport::Error::new(
            serialport::ErrorKind::Io(ErrorKind::PermissionDenied),
            "denied",
        );
        match open_error(path, io) {
            TransportError::Open { source, .. } => {
                assert_eq!(source.kind(), ErrorKind::PermissionDenied)
            }
            other => panic!("expected open error, got {other:?}"),
        }

        let settings = serialport::Error::new(serialport::ErrorKind::InvalidInput, "7E1");
        assert!(matches!(
            open_error(path, settings),
            TransportError::Configure { .. }
        ));
    }

    #[test]
    fn quiet_line_reads_as_idle() {
        assert!(is_idle(ErrorKind::TimedOut));
        assert!(is_idle(ErrorKind::WouldBlock));
        assert!(!is_idle(ErrorKind::BrokenPipe));
    }
}
