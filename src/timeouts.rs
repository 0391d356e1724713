//! Per-command transmit timeouts.
//!
//! Each transmission hands the transmitter the maximum time it may wait
//! for the decoder's return pulses. Flash operations are slow, the
//! handshake stages are not.

use core::time::Duration;

/// Preamble framing bytes.
pub const PREAMBLE: Duration = Duration::from_millis(5);

/// ZPP CV read, including the trailing probe bytes.
pub const ZPP_CV_READ: Duration = Duration::from_millis(200);
/// ZPP CV write.
pub const ZPP_CV_WRITE: Duration = Duration::from_millis(500);
/// ZPP flash erase. The decoder erases the whole flash before pulsing.
pub const ZPP_FLASH_ERASE: Duration = Duration::from_secs(5);
/// ZPP flash block write.
pub const ZPP_FLASH_WRITE: Duration = Duration::from_millis(500);
/// ZPP decoder id read, including the trailing probe bytes.
pub const ZPP_DECODER_ID: Duration = Duration::from_millis(200);
/// ZPP CRC/XOR query, including the trailing probe bytes.
pub const ZPP_CRC_XOR: Duration = Duration::from_millis(200);

/// ZSU decoder id addressing.
pub const ZSU_DECODER_ID: Duration = Duration::from_millis(200);
/// ZSU block count byte.
pub const ZSU_BLOCK_COUNT: Duration = Duration::from_millis(200);
/// ZSU security bytes.
pub const ZSU_SECURITY: Duration = Duration::from_millis(200);
/// ZSU firmware block. The decoder programs a flash page before pulsing.
pub const ZSU_BLOCK: Duration = Duration::from_millis(500);
