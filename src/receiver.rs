//! See [`Receiver`] for more details.

use core::convert::TryFrom;
use core::time::Duration;

use arrayvec::ArrayVec;
use log::{debug, trace};

use crate::checksum;
use crate::decoder;
use crate::timeouts;
use crate::types::{pulse_count_to_response, Command, Response};

/// The banner the host tool emits when it opens the link. Repeated banner
/// bytes are skipped before the first session starts.
pub const ENTRY_BANNER: &[u8; 10] = b"DECUP_EIN\r";

/// Capacity of the packet buffer: command byte, 16-bit flash address,
/// one 256 byte flash page, CRC-8 and XOR trailers. This is the largest
/// frame the link carries (the ZPP flash-write frame).
pub const MAX_FRAME_SIZE: usize = 261;

/// The ZSU security bytes authorizing a firmware write session.
const SECURITY_BYTE_1: u8 = 0x55;
const SECURITY_BYTE_2: u8 = 0xAA;

/// Trailing security bytes of the ZPP flash-erase frame.
const ERASE_SECURITY: [u8; 3] = [0x55, 0xFF, 0xFF];

/// Trailing probe bytes after a ZPP read command. The decoder clocks its
/// reply out one bit per transmission; the command byte fetches the first
/// bit, seven probe bytes fetch the rest.
const PROBE_RUN: u8 = 7;

/// One frame in flight at a time, never larger than the link allows.
type Packet = ArrayVec<u8, MAX_FRAME_SIZE>;

/// Physical transmitter driven by the [`Receiver`].
///
/// Implementors put bytes on the rails and count the pulses the decoder
/// answers with. `transmit` is the only blocking point of the engine; it
/// may wait up to `timeout` for the pulses to arrive.
pub trait Transmitter {
    /// Place `bytes` on the track and return the number of return pulses
    /// observed within `timeout`.
    fn transmit(&mut self, bytes: &[u8], timeout: Duration) -> usize;

    /// Called once when the last firmware block of a ZSU session has been
    /// acknowledged, right before the engine returns to idle.
    fn done(&mut self) {}
}

#[derive(PartialEq, Eq, Debug, Copy, Clone)]
enum State {
    Entry,
    Preamble,
    ZppDispatch,
    ZppReadCv { probes: u8 },
    ZppWriteCv,
    ZppFlashErase,
    ZppFlashWrite,
    ZppDecoderId { probes: u8 },
    ZppCrcOrXorQuery { probes: u8 },
    ZsuDecoderId,
    ZsuBlockCount,
    ZsuSecurityByte1,
    ZsuSecurityByte2,
    ZsuBlocks,
}

/// Receive side of the DECUP protocol.
///
/// The engine consumes the host byte stream one byte at a time, frames it
/// into packets, pushes each byte or frame through the [`Transmitter`] and
/// maps the observed pulse counts back to [`Response`] codes for the host.
/// Two sub-protocols share the entry and preamble phase: the CV-oriented
/// ZPP commands and the block-oriented ZSU firmware update.
///
/// One instance serves one physical link; `reset` returns it to the idle
/// entry state in place, so consecutive sessions reuse the instance.
///
/// # Example
///
/// ```
/// use core::time::Duration;
/// use decup_proto::{Receiver, Response, Transmitter};
///
/// struct Rails;
///
/// impl Transmitter for Rails {
///     fn transmit(&mut self, _bytes: &[u8], _timeout: Duration) -> usize {
///         // drive the track hardware here
///         2 // the decoder answered with a double pulse
///     }
/// }
///
/// let mut engine = Receiver::new(Rails);
/// // the connection banner is skipped without a response
/// for byte in b"DECUP_EIN\r".iter() {
///     assert_eq!(engine.receive(*byte), None);
/// }
/// // a decoder id byte starts a ZSU session once the preamble is over
/// assert_eq!(engine.receive(221), Some(Response::Ack));
/// ```
#[derive(Debug)]
pub struct Receiver<T: Transmitter> {
    link: T,
    state: State,
    packet: Packet,
    decoder_id: u8,
    block_count: usize,
}

impl<T: Transmitter> Receiver<T> {
    /// Create a new protocol engine driving the given transmitter.
    pub fn new(link: T) -> Self {
        Receiver {
            link,
            state: State::Entry,
            packet: Packet::new(),
            decoder_id: 0,
            block_count: 0,
        }
    }

    /// Consume one byte of the host stream.
    ///
    /// Returns `None` while more input is needed, or the logical response
    /// once the transmitter's pulse count resolves to a definite outcome
    /// for the byte or frame just completed.
    pub fn receive(&mut self, byte: u8) -> Option<Response> {
        loop {
            match self.state {
                State::Entry => {
                    if ENTRY_BANNER.contains(&byte) {
                        return None;
                    }
                    trace!("leaving entry on {:#04x}", byte);
                    self.state = State::Preamble;
                    // reprocess the byte
                }
                State::Preamble => {
                    if byte == Command::Preamble0.byte() || byte == Command::Preamble1.byte() {
                        return self.transmit_byte(byte, timeouts::PREAMBLE);
                    }
                    self.state = if byte < 0x80 {
                        debug!("ZPP session");
                        State::ZppDispatch
                    } else {
                        debug!("ZSU session");
                        State::ZsuDecoderId
                    };
                    // reprocess the byte
                }
                State::ZppDispatch => return self.zpp_dispatch(byte),
                State::ZppReadCv { probes } => return self.zpp_read_cv(byte, probes),
                State::ZppWriteCv => return self.zpp_write_cv(byte),
                State::ZppFlashErase => return self.zpp_flash_erase(byte),
                State::ZppFlashWrite => return self.zpp_flash_write(byte),
                State::ZppDecoderId { probes } => {
                    let response = self.transmit_byte(byte, timeouts::ZPP_DECODER_ID);
                    self.state = if probes + 1 == PROBE_RUN {
                        State::ZppDispatch
                    } else {
                        State::ZppDecoderId { probes: probes + 1 }
                    };
                    return response;
                }
                State::ZppCrcOrXorQuery { probes } => {
                    let response = self.transmit_byte(byte, timeouts::ZPP_CRC_XOR);
                    self.state = if probes + 1 == PROBE_RUN {
                        State::ZppDispatch
                    } else {
                        State::ZppCrcOrXorQuery { probes: probes + 1 }
                    };
                    return response;
                }
                State::ZsuDecoderId => return self.zsu_decoder_id(byte),
                State::ZsuBlockCount => return self.zsu_block_count(byte),
                State::ZsuSecurityByte1 => {
                    return self.zsu_security(byte, SECURITY_BYTE_1, State::ZsuSecurityByte2)
                }
                State::ZsuSecurityByte2 => {
                    return self.zsu_security(byte, SECURITY_BYTE_2, State::ZsuBlocks)
                }
                State::ZsuBlocks => return self.zsu_block(byte),
            }
        }
    }

    /// Abort whatever is in flight and return to the idle entry state.
    ///
    /// Clears the packet buffer and zeroes the session context. Safe to
    /// call at any time between byte deliveries, and idempotent.
    pub fn reset(&mut self) {
        trace!("reset");
        self.packet.clear();
        self.state = State::Entry;
        self.decoder_id = 0;
        self.block_count = 0;
    }

    /// Is the engine in the idle entry state, with no session in flight?
    pub fn is_idle(&self) -> bool {
        self.state == State::Entry
    }

    /// The decoder id addressed by the current ZSU session, or 0 when no
    /// session has confirmed an id yet.
    pub fn decoder_id(&self) -> crate::DecoderId {
        self.decoder_id
    }

    /// Shared reference to the transmitter.
    pub fn link(&self) -> &T {
        &self.link
    }

    /// Exclusive reference to the transmitter.
    pub fn link_mut(&mut self) -> &mut T {
        &mut self.link
    }

    /// Consume the engine and return the transmitter.
    pub fn into_inner(self) -> T {
        self.link
    }

    /// Select the ZPP operation for a command byte. Unknown command bytes
    /// stall in place until the host sends something recognizable.
    fn zpp_dispatch(&mut self, byte: u8) -> Option<Response> {
        debug_assert!(self.packet.is_empty());
        let command = Command::try_from(byte).ok()?;
        trace!("ZPP command {:?}", command);
        match command {
            Command::CvRead => {
                self.packet.push(byte);
                self.state = State::ZppReadCv { probes: 0 };
                None
            }
            Command::CvWrite | Command::CvWriteExt => {
                self.packet.push(byte);
                self.state = State::ZppWriteCv;
                None
            }
            Command::FlashErase => {
                self.packet.push(byte);
                self.state = State::ZppFlashErase;
                None
            }
            Command::FlashWrite => {
                self.packet.push(byte);
                self.state = State::ZppFlashWrite;
                None
            }
            Command::ReadDecoderId => {
                self.state = State::ZppDecoderId { probes: 0 };
                self.transmit_byte(byte, timeouts::ZPP_DECODER_ID)
            }
            Command::CrcXorQuery => {
                self.state = State::ZppCrcOrXorQuery { probes: 0 };
                self.transmit_byte(byte, timeouts::ZPP_CRC_XOR)
            }
            // The preamble codes select nothing in ZPP mode.
            Command::Preamble0 | Command::Preamble1 => None,
        }
    }

    /// Read CV: the 3 byte header frame goes out whole, then each probe
    /// byte goes out on its own.
    fn zpp_read_cv(&mut self, byte: u8, probes: u8) -> Option<Response> {
        if !self.packet.is_empty() {
            // Header phase, the command byte is still in the buffer.
            self.packet.push(byte);
            if self.packet.len() < 3 {
                return None;
            }
            let response = self.transmit_packet(timeouts::ZPP_CV_READ);
            self.packet.clear();
            return response;
        }
        let response = self.transmit_byte(byte, timeouts::ZPP_CV_READ);
        self.state = if probes + 1 == PROBE_RUN {
            State::ZppDispatch
        } else {
            State::ZppReadCv { probes: probes + 1 }
        };
        response
    }

    /// Write CV: five byte frame, or six for the long command carrying an
    /// extra length byte.
    fn zpp_write_cv(&mut self, byte: u8) -> Option<Response> {
        self.packet.push(byte);
        let frame_len = if self.packet[0] == Command::CvWriteExt.byte() {
            6
        } else {
            5
        };
        if self.packet.len() < frame_len {
            return None;
        }
        let response = self.transmit_packet(timeouts::ZPP_CV_WRITE);
        self.packet.clear();
        self.state = State::ZppDispatch;
        response
    }

    /// Flash erase only goes out if the three fixed security bytes match;
    /// a bad frame is dropped without touching the rails.
    fn zpp_flash_erase(&mut self, byte: u8) -> Option<Response> {
        self.packet.push(byte);
        if self.packet.len() < 4 {
            return None;
        }
        let response = if self.packet[1..] == ERASE_SECURITY[..] {
            self.transmit_packet(timeouts::ZPP_FLASH_ERASE)
        } else {
            debug!("flash erase with bad security bytes, frame dropped");
            None
        };
        self.packet.clear();
        self.state = State::ZppDispatch;
        response
    }

    fn zpp_flash_write(&mut self, byte: u8) -> Option<Response> {
        self.packet.push(byte);
        if self.packet.len() < MAX_FRAME_SIZE {
            return None;
        }
        let response = self.transmit_packet(timeouts::ZPP_FLASH_WRITE);
        self.packet.clear();
        self.state = State::ZppDispatch;
        response
    }

    /// A double pulse confirms that a decoder answers to this id.
    fn zsu_decoder_id(&mut self, byte: u8) -> Option<Response> {
        let response = self.transmit_byte(byte, timeouts::ZSU_DECODER_ID);
        if response == Some(Response::Ack) {
            debug!("addressing decoder id {}", byte);
            self.decoder_id = byte;
            self.state = State::ZsuBlockCount;
        }
        response
    }

    /// A single pulse confirms the block count byte. The byte counts
    /// 256 byte units of flash including the bootloader area.
    fn zsu_block_count(&mut self, byte: u8) -> Option<Response> {
        if self.link.transmit(&[byte], timeouts::ZSU_BLOCK_COUNT) != 1 {
            return None;
        }
        let data_size = decoder::data_size(self.decoder_id);
        let image_size = ((byte as usize + 1) * 256)
            .saturating_sub(decoder::bootloader_size(self.decoder_id));
        let mut block_count = image_size / data_size;
        if data_size == 32 {
            // Half-sized block units, the count byte still speaks in
            // 64 byte terms.
            block_count *= 2;
        }
        debug!("expecting {} firmware blocks", block_count);
        self.block_count = block_count;
        self.state = State::ZsuSecurityByte1;
        Some(Response::Ack)
    }

    /// The security bytes must match their literals exactly; a mismatch
    /// aborts the whole session without transmitting the bad byte. A
    /// single pulse confirms a transmitted security byte.
    fn zsu_security(&mut self, byte: u8, expected: u8, next: State) -> Option<Response> {
        if byte != expected {
            debug!("bad security byte {:#04x}, session aborted", byte);
            self.reset();
            return None;
        }
        if self.link.transmit(&[byte], timeouts::ZSU_SECURITY) == 1 {
            self.state = next;
            return Some(Response::Ack);
        }
        None
    }

    /// Firmware blocks: block index, payload, XOR trailer. A double pulse
    /// accepts the block, a single pulse asks the host to resend it. The
    /// buffer never carries bytes across transmit attempts.
    fn zsu_block(&mut self, byte: u8) -> Option<Response> {
        self.packet.push(byte);
        if self.packet.len() < decoder::data_size(self.decoder_id) + 2 {
            return None;
        }
        // Index, payload and trailer must fold to zero before anything
        // touches the rails.
        if checksum::exor(&self.packet) != 0 {
            debug!("block checksum mismatch, frame dropped");
            self.packet.clear();
            return None;
        }
        let response = self.transmit_packet(timeouts::ZSU_BLOCK);
        self.packet.clear();
        if response == Some(Response::Ack) {
            self.block_count = self.block_count.saturating_sub(1);
            if self.block_count == 0 {
                debug!("last block acknowledged, session complete");
                self.link.done();
                self.reset();
            }
        }
        response
    }

    fn transmit_byte(&mut self, byte: u8, timeout: Duration) -> Option<Response> {
        pulse_count_to_response(self.link.transmit(&[byte], timeout))
    }

    fn transmit_packet(&mut self, timeout: Duration) -> Option<Response> {
        trace!("transmitting {} byte frame", self.packet.len());
        let pulse_count = self.link.transmit(&self.packet, timeout);
        pulse_count_to_response(pulse_count)
    }
}
