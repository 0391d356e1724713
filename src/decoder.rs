//! Decoder-family lookup tables.
//!
//! The decoder id transmitted at the start of a ZSU session determines the
//! framing arithmetic for the rest of the session: how many payload bytes a
//! block carries and how much of the address space the bootloader occupies.

/// Decoder families whose blocks carry 32 bytes of payload.
const IDS_WHICH_USE_32B: [u8; 5] = [200, 202, 203, 204, 205];

/// Payload bytes per firmware block for the given decoder family.
pub fn data_size(decoder_id: u8) -> usize {
    if IDS_WHICH_USE_32B.contains(&decoder_id) {
        32
    } else {
        64
    }
}

/// Bootloader size in bytes for the given decoder family.
///
/// All known families reserve 8 blocks of 256 bytes at the start of the
/// flash; the firmware image is offset by this amount in the block-count
/// arithmetic.
pub fn bootloader_size(_decoder_id: u8) -> usize {
    8 * 256
}
