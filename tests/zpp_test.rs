mod common;

use common::MockTransmitter;
use decup_proto::{timeouts, Receiver, Response, MAX_FRAME_SIZE};

/// A fresh engine that has already consumed the connection banner. The
/// first non-preamble command byte it sees selects the ZPP branch.
fn engine() -> Receiver<MockTransmitter> {
    let mut engine = Receiver::new(MockTransmitter::new());
    for byte in b"DECUP_EIN\r".iter() {
        assert_eq!(engine.receive(*byte), None);
    }
    engine
}

#[test]
fn preamble_run() {
    let mut engine = engine();
    for _ in 0..100 {
        engine.link_mut().script([0, 0, 0]);
        engine.receive(0xEF);
        engine.receive(0xEF);
        engine.receive(0xBF);
    }
    let sent = engine.link().sent();
    assert_eq!(sent.len(), 300);
    assert_eq!(sent.iter().filter(|frame| **frame == [0xEF]).count(), 200);
    assert_eq!(sent.iter().filter(|frame| **frame == [0xBF]).count(), 100);
    for (_, timeout) in engine.link().frames.iter() {
        assert_eq!(*timeout, timeouts::PREAMBLE);
    }
}

#[test]
fn cv_read() {
    let mut engine = engine();
    let cv = 7u16; // CV 8, zero-based on the wire

    assert_eq!(engine.receive(0x01), None);
    assert_eq!(engine.receive(cv as u8), None);
    engine.link_mut().script([2]);
    assert_eq!(engine.receive((cv >> 8) as u8), Some(Response::Ack));
    assert_eq!(
        engine.link().last(),
        &(vec![0x01, 0x07, 0x00], timeouts::ZPP_CV_READ)
    );

    // seven probe bytes, each on its own
    for _ in 0..7 {
        engine.receive(0xFF);
        assert_eq!(engine.link().last().0, vec![0xFF]);
        assert_eq!(engine.link().last().1, timeouts::ZPP_CV_READ);
    }
    assert_eq!(engine.link().frames.len(), 8);

    // back in dispatch: a new command is accepted
    assert_eq!(engine.receive(0x01), None);
}

#[test]
fn cv_write_short_frame() {
    let mut engine = engine();
    engine.link_mut().script([2]);
    let frame = [0x02, 0xAA, 0x02, 0x00, 0x80];
    let mut response = None;
    for byte in frame.iter() {
        response = engine.receive(*byte);
    }
    assert_eq!(response, Some(Response::Ack));
    assert_eq!(
        engine.link().last(),
        &(frame.to_vec(), timeouts::ZPP_CV_WRITE)
    );
    assert_eq!(engine.link().frames.len(), 1);
}

#[test]
fn cv_write_long_frame_takes_six_bytes() {
    let mut engine = engine();
    engine.link_mut().script([2]);
    let frame = [0x06, 0xAA, 0x02, 0x00, 0x01, 0x80];
    for byte in &frame[..5] {
        assert_eq!(engine.receive(*byte), None);
    }
    assert_eq!(engine.receive(frame[5]), Some(Response::Ack));
    assert_eq!(
        engine.link().last(),
        &(frame.to_vec(), timeouts::ZPP_CV_WRITE)
    );
}

#[test]
fn flash_erase() {
    let mut engine = engine();
    engine.link_mut().script([2]);
    for byte in &[0x03, 0x55, 0xFF] {
        assert_eq!(engine.receive(*byte), None);
    }
    assert_eq!(engine.receive(0xFF), Some(Response::Ack));
    assert_eq!(
        engine.link().last(),
        &(vec![0x03, 0x55, 0xFF, 0xFF], timeouts::ZPP_FLASH_ERASE)
    );
    assert_eq!(engine.link().frames.len(), 1);
}

#[test]
fn flash_erase_with_bad_security_transmits_nothing() {
    let mut engine = engine();
    for byte in &[0x03, 0x55, 0xFF] {
        assert_eq!(engine.receive(*byte), None);
    }
    assert_eq!(engine.receive(0x00), None);
    assert!(engine.link().frames.is_empty());

    // still in dispatch, the next erase goes through
    engine.link_mut().script([2]);
    for byte in &[0x03, 0x55, 0xFF] {
        engine.receive(*byte);
    }
    assert_eq!(engine.receive(0xFF), Some(Response::Ack));
    assert_eq!(engine.link().frames.len(), 1);
}

#[test]
fn flash_write_fills_the_frame() {
    let mut engine = engine();
    engine.link_mut().script([2]);

    let mut response = engine.receive(0x05);
    for byte in 0..(MAX_FRAME_SIZE - 1) as u32 {
        assert_eq!(response, None);
        response = engine.receive(byte as u8);
    }
    assert_eq!(response, Some(Response::Ack));

    let (frame, timeout) = engine.link().last();
    assert_eq!(frame.len(), MAX_FRAME_SIZE);
    assert_eq!(frame[0], 0x05);
    assert_eq!(*timeout, timeouts::ZPP_FLASH_WRITE);
    assert_eq!(engine.link().frames.len(), 1);
}

#[test]
fn read_decoder_id() {
    let mut engine = engine();
    engine.link_mut().script([2]);
    assert_eq!(engine.receive(0x04), Some(Response::Ack));
    assert_eq!(
        engine.link().last(),
        &(vec![0x04], timeouts::ZPP_DECODER_ID)
    );

    for _ in 0..7 {
        engine.receive(0xFF);
        assert_eq!(engine.link().last().0, vec![0xFF]);
    }
    assert_eq!(engine.link().frames.len(), 8);

    // back in dispatch
    engine.link_mut().script([0]);
    engine.receive(0x04);
    assert_eq!(engine.link().frames.len(), 9);
}

#[test]
fn crc_xor_query() {
    let mut engine = engine();
    engine.receive(0x07);
    assert_eq!(engine.link().last(), &(vec![0x07], timeouts::ZPP_CRC_XOR));
    for _ in 0..7 {
        engine.receive(0xFF);
    }
    assert_eq!(engine.link().frames.len(), 8);
}

#[test]
fn unknown_command_byte_stalls() {
    let mut engine = engine();
    engine.receive(0x01); // select ZPP
    for _ in 0..9 {
        engine.receive(0xFF); // finish the CV read
    }
    let frames_before = engine.link().frames.len();
    for byte in &[0x00, 0x08, 0x40, 0x7F] {
        assert_eq!(engine.receive(*byte), None);
    }
    assert_eq!(engine.link().frames.len(), frames_before);

    // recoverable: a valid command still works
    engine.link_mut().script([2]);
    assert_eq!(engine.receive(0x04), Some(Response::Ack));
}

#[test]
fn nak_pulse_is_reported_to_the_host() {
    let mut engine = engine();
    engine.link_mut().script([1]);
    for byte in &[0x02, 0xAA, 0x02, 0x00] {
        assert_eq!(engine.receive(*byte), None);
    }
    assert_eq!(engine.receive(0x80), Some(Response::Nak));
}
