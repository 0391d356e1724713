//! Answers a DECUP flasher tool on a serial port, with a simulated decoder
//! standing in for the track hardware.
//!
//! Usage: `decoder_sim [port] [decoder-id]`

use std::io::{Read, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use decup_proto::{Receiver, Transmitter};

#[derive(Debug, Copy, Clone)]
enum Stage {
    Idle,
    BlockCount,
    Security1,
    Security2,
    Blocks,
}

/// A decoder that acknowledges everything sent to it.
struct SimulatedDecoder {
    id: u8,
    stage: Stage,
}

impl SimulatedDecoder {
    fn new(id: u8) -> Self {
        SimulatedDecoder {
            id,
            stage: Stage::Idle,
        }
    }
}

impl Transmitter for SimulatedDecoder {
    fn transmit(&mut self, bytes: &[u8], _timeout: Duration) -> usize {
        match self.stage {
            // Answer the addressing byte with a double pulse, ignore
            // preamble traffic and foreign ids.
            Stage::Idle => {
                if bytes == [self.id] {
                    self.stage = Stage::BlockCount;
                    2
                } else {
                    0
                }
            }
            Stage::BlockCount => {
                self.stage = Stage::Security1;
                1
            }
            Stage::Security1 => {
                self.stage = Stage::Security2;
                1
            }
            Stage::Security2 => {
                self.stage = Stage::Blocks;
                1
            }
            // Accept every block frame.
            Stage::Blocks => 2,
        }
    }

    fn done(&mut self) {
        log::info!("firmware update complete");
        self.stage = Stage::Idle;
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args();
    args.next(); // Skip program name
    let port = args.next().unwrap_or_else(|| "/dev/ttyACM0".to_string());
    let decoder_id = args
        .next()
        .map(|id| id.parse())
        .transpose()
        .context("decoder id must be a byte")?
        .unwrap_or(221);

    let mut serial = serialport::new(&port, 115_200)
        .timeout(Duration::from_millis(100))
        .open()
        .with_context(|| format!("Failed to open serial port {}", port))?;

    let mut engine = Receiver::new(SimulatedDecoder::new(decoder_id));

    loop {
        let mut buf = [0; 1];
        match serial.read(&mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if let Some(response) = engine.receive(buf[0]) {
                    serial.write_all(&[response.code()])?;
                }
            }
            Err(ref err) if err.kind() == std::io::ErrorKind::TimedOut => continue,
            Err(err) => return Err(err).context("serial read failed"),
        }
    }
    Ok(())
}
