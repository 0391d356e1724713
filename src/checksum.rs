//! Checksum primitives used on the link: the running XOR that guards ZSU
//! block frames, and the CRC-8 used by the firmware image side.

/// XOR of all bytes in `bytes`.
///
/// A well-formed ZSU block frame (index, payload, XOR trailer) folds to
/// zero.
pub fn exor(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |sum, byte| sum ^ byte)
}

/// One step of the running CRC-8 (polynomial 0x07, initial value 0).
pub const fn crc8(byte: u8, seed: u8) -> u8 {
    let mut crc = seed ^ byte;
    let mut bit = 0;
    while bit < 8 {
        crc = if crc & 0x80 != 0 {
            (crc << 1) ^ 0x07
        } else {
            crc << 1
        };
        bit += 1;
    }
    crc
}

/// CRC-8 over a whole slice.
pub fn crc8_slice(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |seed, byte| crc8(*byte, seed))
}
