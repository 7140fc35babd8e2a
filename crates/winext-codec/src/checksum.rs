//! CRC-16 (Modbus) used as the trailer of multi-register write frames.

/// Reflected polynomial of CRC-16/MODBUS.
pub const POLYNOMIAL: u16 = 0xA001;

/// Initial accumulator value.
pub const INITIAL: u16 = 0xFFFF;

/// Calculate the CRC-16/MODBUS of `data`.
pub fn checksum(data: &[u8]) -> u16 {
    let mut crc = INITIAL;
    for byte in data {
        crc ^= *byte as u16;
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ POLYNOMIAL;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

/// Checksum as it appears on the wire: low byte first.
pub fn checksum_bytes(data: &[u8]) -> [u8; 2] {
    checksum(data).to_le_bytes()
}

/// Check a frame whose last two bytes are the little-endian checksum of the rest.
pub fn verify(frame: &[u8]) -> bool {
    match frame.len().checked_sub(2) {
        Some(split) => {
            let (body, trailer) = frame.split_at(split);
            checksum_bytes(body) == [trailer[0], trailer[1]]
        }
        None => false,
    }
}
