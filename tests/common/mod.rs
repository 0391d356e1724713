#![allow(dead_code)]

use std::collections::VecDeque;
use std::time::Duration;

use decup_proto::{checksum, Transmitter};

/// Scripted stand-in for the physical transmitter.
///
/// Records every transmission together with the timeout it was given, and
/// answers with pulse counts from a script. An exhausted script means "no
/// pulses observed".
#[derive(Debug, Default)]
pub struct MockTransmitter {
    pub frames: Vec<(Vec<u8>, Duration)>,
    pub pulses: VecDeque<usize>,
    pub done_count: usize,
}

impl MockTransmitter {
    pub fn new() -> Self {
        Default::default()
    }

    /// Queue pulse counts for the next transmissions.
    pub fn script(&mut self, pulses: impl IntoIterator<Item = usize>) {
        self.pulses.extend(pulses);
    }

    /// The byte frames transmitted so far, without the timeouts.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.frames.iter().map(|(bytes, _)| bytes.clone()).collect()
    }

    /// The last transmitted frame and its timeout.
    pub fn last(&self) -> &(Vec<u8>, Duration) {
        self.frames.last().expect("nothing transmitted")
    }
}

impl Transmitter for MockTransmitter {
    fn transmit(&mut self, bytes: &[u8], timeout: Duration) -> usize {
        self.frames.push((bytes.to_vec(), timeout));
        self.pulses.pop_front().unwrap_or(0)
    }

    fn done(&mut self) {
        self.done_count += 1;
    }
}

/// Build one ZSU block frame: index, payload, XOR trailer. The trailer
/// makes the whole frame fold to zero.
pub fn zsu_block(index: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![index];
    frame.extend_from_slice(payload);
    frame.push(index ^ checksum::exor(payload));
    frame
}
