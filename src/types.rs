//! This module defines the DECUP wire vocabulary: the logical response
//! codes sent back to the host, the pulse-count mapping, and the command
//! bytes recognized by the ZPP dispatch.

use core::convert::TryFrom;

use snafu::Snafu;

/// Error type for this module
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The byte isn't a DECUP command.
    #[snafu(display("Invalid command byte {:#04x}", byte))]
    InvalidCommand {
        /// The offending byte.
        byte: u8,
    },
}

/// Logical acknowledgment returned to the host once a transmission has a
/// definite outcome.
///
/// The discriminants are the literal response codes the host expects on
/// the wire.
#[derive(PartialEq, Eq, Debug, Copy, Clone, Hash)]
#[repr(u8)]
pub enum Response {
    /// The decoder accepted the byte or frame.
    Ack = 0x1C,
    /// The decoder rejected the byte or frame; the host should retry.
    Nak = 0xFC,
}

impl Response {
    /// The on-wire response code.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl From<Response> for u8 {
    fn from(response: Response) -> u8 {
        response.code()
    }
}

/// Map the pulse count observed by the transmitter to a logical response.
///
/// A single return pulse is a NAK, a double pulse an ACK. Any other count
/// means the handshake hasn't resolved yet and is indistinguishable from
/// "no response".
pub const fn pulse_count_to_response(pulse_count: usize) -> Option<Response> {
    match pulse_count {
        1 => Some(Response::Nak),
        2 => Some(Response::Ack),
        _ => None,
    }
}

/// Command bytes understood by the link.
///
/// The two preamble codes frame every session; the remaining commands
/// select the ZPP operations. ZSU sessions are not command-selected, they
/// start with the decoder id byte instead.
#[derive(PartialEq, Eq, Debug, Copy, Clone, Hash)]
#[repr(u8)]
pub enum Command {
    /// Read a configuration variable.
    CvRead = 0x01,
    /// Write a configuration variable.
    CvWrite = 0x02,
    /// Erase the decoder flash.
    FlashErase = 0x03,
    /// Read the decoder type id.
    ReadDecoderId = 0x04,
    /// Write one flash block.
    FlashWrite = 0x05,
    /// Write a configuration variable, long frame with a length byte.
    CvWriteExt = 0x06,
    /// Query the firmware CRC/XOR. Deprecated, kept for compatibility.
    CrcXorQuery = 0x07,
    /// First preamble code.
    Preamble0 = 0xEF,
    /// Second preamble code.
    Preamble1 = 0xBF,
}

impl Command {
    /// The on-wire command byte.
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Is this one of the two reserved preamble codes?
    pub fn is_preamble(self) -> bool {
        matches!(self, Command::Preamble0 | Command::Preamble1)
    }
}

impl TryFrom<u8> for Command {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self, Error> {
        use Command::*;
        Ok(match byte {
            0x01 => CvRead,
            0x02 => CvWrite,
            0x03 => FlashErase,
            0x04 => ReadDecoderId,
            0x05 => FlashWrite,
            0x06 => CvWriteExt,
            0x07 => CrcXorQuery,
            0xEF => Preamble0,
            0xBF => Preamble1,
            _ => return Err(Error::InvalidCommand { byte }),
        })
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> u8 {
        command.byte()
    }
}
