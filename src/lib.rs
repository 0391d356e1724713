//! Sans-io implementation of the receive side of the DECUP protocol,
//! the firmware-flashing link used to reprogram rail-vehicle decoders.
//!
//! A host tool streams a firmware image byte by byte into a [`Receiver`].
//! The receiver frames the bytes into protocol packets, drives a physical
//! [`Transmitter`] that puts each byte or frame on the rails and counts
//! the decoder's return pulses, and maps each pulse count to a logical
//! [`Response`] the host can act on: continue, retry, or abort.
//!
//! Two sub-protocols share the entry and preamble phase:
//!
//! * **ZPP** — the legacy CV-oriented programming commands.
//! * **ZSU** — the block-oriented firmware update.
//!
//! The crate performs no I/O of its own. The only blocking point is the
//! `Transmitter` implementation supplied by the user, which may wait up to
//! a per-command timeout (see [`timeouts`]) for the return pulses.
//!
//! No logger is installed by this crate; enable one (e.g. `env_logger`)
//! to see the state machine's `trace`/`debug` output.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod checksum;
pub mod decoder;
mod receiver;
pub mod timeouts;
mod types;

pub use receiver::{Receiver, Transmitter, ENTRY_BANNER, MAX_FRAME_SIZE};
pub use types::{pulse_count_to_response, Command, Error, Response};

/// Identifies the decoder family addressed by a session.
pub type DecoderId = u8;
