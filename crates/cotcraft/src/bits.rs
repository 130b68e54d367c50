//! Low-level byte and bit helpers shared by the field converters.
//!
//! Multi-byte integers are big-endian. Bit streams are addressed MSB-first:
//! bit 0 is the high bit of the first byte.

/// Reads `data` as a big-endian unsigned integer (at most 8 bytes).
pub fn read_be(data: &[u8]) -> u64 {
    data.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64)
}

/// Writes the low `out.len()` bytes of `value` into `out`, big-endian.
pub fn write_be(out: &mut [u8], value: u64) {
    let width = out.len();
    for (i, byte) in out.iter_mut().enumerate() {
        let shift = 8 * (width - 1 - i);
        *byte = if shift >= 64 { 0 } else { (value >> shift) as u8 };
    }
}

/// Appends the low `width` bytes of `value` to `buf`, big-endian.
pub fn push_be(buf: &mut Vec<u8>, value: u64, width: usize) {
    let start = buf.len();
    buf.resize(start + width, 0);
    write_be(&mut buf[start..], value);
}

/// Sign-extends the low `bits` of `value` to a full `i64`.
pub fn sign_extend(value: u64, bits: usize) -> i64 {
    if bits == 0 || bits >= 64 {
        return value as i64;
    }

    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}

/// Number of bits needed to index `n` distinct values (`⌈log2 n⌉`, 0 for n <= 1).
pub fn ceil_log2(n: usize) -> u32 {
    if n <= 1 {
        return 0;
    }

    usize::BITS - (n - 1).leading_zeros()
}

/// Expands bytes into bits, MSB-first.
pub fn bytes_to_bits(data: &[u8]) -> Vec<bool> {
    let mut bits = Vec::with_capacity(data.len() * 8);
    for byte in data {
        for i in 0..8 {
            bits.push(byte & (0x80 >> i) != 0);
        }
    }

    bits
}

/// Packs bits into bytes, MSB-first. A partial final byte is zero-padded.
pub fn bits_to_bytes(bits: &[bool]) -> Vec<u8> {
    let mut out = vec![0u8; bits.len().div_ceil(8)];

    for (i, &bit) in bits.iter().enumerate() {
        if bit {
            out[i / 8] |= 0x80 >> (i % 8);
        }
    }

    out
}

/// XOR-folds `data` in chunks of `width` bytes. A partial final chunk is folded byte-wise
/// into the leading positions.
pub fn xor_fold(data: &[u8], width: usize) -> Vec<u8> {
    let mut fold = vec![0u8; width];
    if width == 0 {
        return fold;
    }

    for chunk in data.chunks(width) {
        for (acc, byte) in fold.iter_mut().zip(chunk) {
            *acc ^= byte;
        }
    }

    fold
}

/// 32-bit FNV-1a hash.
pub fn fnv1a32(data: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;

    data.iter().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ *byte as u32).wrapping_mul(PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_be() {
        assert_eq!(read_be(&[0x01, 0x02]), 0x0102);
        assert_eq!(read_be(&[0xFF]), 0xFF);
        assert_eq!(read_be(&[]), 0);
    }

    #[test]
    fn test_write_be_truncates_to_width() {
        let mut out = [0u8; 2];
        write_be(&mut out, 0x012345);
        assert_eq!(out, [0x23, 0x45]);
    }

    #[test]
    fn test_push_be() {
        let mut buf = vec![0xAA];
        push_be(&mut buf, 0x25, 2);
        assert_eq!(buf, vec![0xAA, 0x00, 0x25]);
    }

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(0b11111111, 8), -1);
        assert_eq!(sign_extend(0x7FFF, 16), 0x7FFF);
        assert_eq!(sign_extend(0x8000, 16), -32768);
    }

    #[test]
    fn test_ceil_log2() {
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(3), 2);
        assert_eq!(ceil_log2(4), 2);
        assert_eq!(ceil_log2(5), 3);
        assert_eq!(ceil_log2(256), 8);
    }

    #[test]
    fn test_bits_round_trip() {
        let bits = bytes_to_bits(&[0b1010_0001]);
        assert_eq!(
            bits,
            vec![true, false, true, false, false, false, false, true]
        );
        assert_eq!(bits_to_bytes(&bits), vec![0b1010_0001]);
    }

    #[test]
    fn test_bits_to_bytes_pads_partial_byte() {
        assert_eq!(bits_to_bytes(&[true, true, false, true]), vec![0b1101_0000]);
    }

    #[test]
    fn test_xor_fold_single_byte() {
        assert_eq!(xor_fold(&[0x01, 0x02, 0x03, 0x04], 1), vec![0x04]);
    }

    #[test]
    fn test_xor_fold_partial_chunk() {
        assert_eq!(xor_fold(&[0x01, 0x02, 0x03], 2), vec![0x02, 0x02]);
    }

    #[test]
    fn test_fnv1a32() {
        assert_eq!(fnv1a32(b""), 0x811c_9dc5);
        assert_eq!(fnv1a32(b"a"), 0xe40c_292c);
        assert_ne!(fnv1a32(b"ab"), fnv1a32(b"ba"));
    }
}
