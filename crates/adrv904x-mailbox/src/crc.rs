/// CRC32 nibble table for polynomial 0x04C11DB7, not reflected.
const CRC32_LUT: [u32; 16] = [
    0x00000000, 0x04c11db7, 0x09823b6e, 0x0d4326d9, 0x130476dc, 0x17c56b6b, 0x1a864db2, 0x1e475005,
    0x2608edb8, 0x22c9f00f, 0x2f8ad6d6, 0x2b4bcb61, 0x350c9b64, 0x31cd86d3, 0x3c8ea00a, 0x384fbdbd,
];

fn shift_nibble(acc: u32, nibble: u8) -> u32 {
    let idx = ((acc >> 28) & 0xF) as usize;
    ((acc << 4) | (nibble & 0xF) as u32) ^ CRC32_LUT[idx]
}

/// CRC32 over `data`, continuing from `seed`.
///
/// A buffer may be processed in several chunks by passing the previous result
/// as the next seed. Set `final_chunk` on the last chunk: 32 zero bits are
/// then shifted in, which yields the finished checksum.
pub fn crc32_for_chunk(data: &[u8], seed: u32, final_chunk: bool) -> u32 {
    let mut acc = data.iter().fold(seed, |acc, &byte| {
        let acc = shift_nibble(acc, byte >> 4);
        shift_nibble(acc, byte & 0xF)
    });

    if final_chunk {
        for _ in 0..4 {
            acc = shift_nibble(acc, 0);
            acc = shift_nibble(acc, 0);
        }
    }
    acc
}
