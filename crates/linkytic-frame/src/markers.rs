//! Control bytes of the TIC wire format.

/// Start of frame.
pub const STX: u8 = 0x02;

/// End of frame.
pub const ETX: u8 = 0x03;

/// Start of dataset.
pub const LF: u8 = 0x0A;

/// End of dataset.
pub const CR: u8 = 0x0D;

/// Field separator in historique mode.
pub const SP: u8 = 0x20;

/// Field separator in standard mode.
pub const HT: u8 = 0x09;

/// Returns true for bytes that frame or delimit datasets.
pub fn is_delimiter(byte: u8) -> bool {
    matches!(byte, STX | ETX | LF | CR)
}
