// Armature - Guest CPU Front End
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Decoders for the compound immediate fields of ARM encodings.

use crate::bits::{fill_with_ones, highest_set_bit, replicate, rotate_right_u64};
use crate::DecodeError;

/// Result of decoding an A64 logical-immediate / bitfield `N:immr:imms` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BitMask {
    pub wmask: u64,
    pub tmask: u64,
    /// Raw `imms`.
    pub pos: u32,
    /// Raw `immr`.
    pub shift: u32,
}

/// Decodes the `N:immr:imms` field of `raw`.
///
/// `immediate` selects the logical-immediate rules, where an all-ones run is
/// reserved. Returns `None` for reserved encodings.
pub fn decode_bitmask(raw: u32, immediate: bool) -> Option<BitMask> {
    let imms = (raw >> 10) & 0x3f;
    let immr = (raw >> 16) & 0x3f;
    let n = (raw >> 22) & 1;
    let sf = (raw >> 31) & 1;

    let length = highest_set_bit(((!imms & 0x3f) | (n << 6)) as i32);
    if length < 1 || (sf == 0 && n != 0) {
        return None;
    }

    let size = 1u32 << length;
    let levels = size - 1;
    let s = imms & levels;
    let r = immr & levels;

    if immediate && s == levels {
        return None;
    }

    let mut wmask = fill_with_ones(s + 1);
    let tmask = fill_with_ones((s.wrapping_sub(r) & levels) + 1);

    if r > 0 {
        wmask = rotate_right_u64(wmask, r, size) & fill_with_ones(size);
    }

    Some(BitMask {
        wmask: replicate(wmask, size),
        tmask: replicate(tmask, size),
        pos: imms,
        shift: immr,
    })
}

/// Precision of an expanded 8-bit floating-point immediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FloatSize {
    Single,
    Double,
}

impl TryFrom<u32> for FloatSize {
    type Error = DecodeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FloatSize::Single),
            1 => Ok(FloatSize::Double),
            other => Err(DecodeError::UnsupportedFloatSize(other)),
        }
    }
}

/// Expands the `abcdefgh` immediate of FMOV/MOVI into IEEE-754 bits.
pub fn decode_imm8_float(imm: u64, size: FloatSize) -> u64 {
    let (e, f) = match size {
        FloatSize::Single => (8, 23),
        FloatSize::Double => (11, 52),
    };

    let e_bit = (imm >> 6) & 1;
    let s_bit = (imm >> 7) & 1;

    let mut value = (imm & 0x3f) << (f - 4);
    if e_bit != 0 {
        value |= ((1u64 << (e - 3)) - 1) << (f + 2);
    }
    value |= (e_bit ^ 1) << (f + e - 1);
    value |= s_bit << (f + e);
    value
}

/// `imm26:00`, sign-extended (B, BL).
#[inline]
pub fn decode_imm26_2(raw: u32) -> i64 {
    ((raw as i64) << 38) >> 36
}

/// `imm19:00` taken from bits 5..24, sign-extended (B.cond, CBZ, LDR literal).
#[inline]
pub fn decode_imm_s19_2(raw: u32) -> i64 {
    (((raw as i64) << 40) >> 43) & !3
}

/// `imm14:00` taken from bits 5..19, sign-extended (TBZ, TBNZ).
#[inline]
pub fn decode_imm_s14_2(raw: u32) -> i64 {
    (((raw as i64) << 45) >> 48) & !3
}

/// `imm24:00`, sign-extended (A32 B, BL, BLX).
#[inline]
pub fn decode_imm24_2(raw: u32) -> i64 {
    ((raw as i64) << 40) >> 38
}

/// `imm8:0`, sign-extended (T16 conditional branch).
#[inline]
pub fn decode_imm8_1(raw: u32) -> i64 {
    ((raw as i64) << 56) >> 55
}

/// `imm11:0`, sign-extended (T16 unconditional branch).
#[inline]
pub fn decode_imm11_1(raw: u32) -> i64 {
    ((raw as i64) << 53) >> 52
}

#[cfg(test)]
mod tests {
    use super::*;

    // sf | N | immr | imms packed the way AND/ORR (immediate) lay them out
    fn bitfield(sf: u32, n: u32, immr: u32, imms: u32) -> u32 {
        (sf << 31) | (n << 22) | (immr << 16) | (imms << 10)
    }

    #[test]
    fn test_bitmask_all_ones_only_for_bitfield_moves() {
        let raw = bitfield(1, 1, 0, 0b111111);

        let mask = decode_bitmask(raw, false).unwrap();
        assert_eq!(mask.wmask, u64::MAX);
        assert_eq!(mask.tmask, u64::MAX);

        // Reserved as a logical immediate (s == levels)
        assert_eq!(decode_bitmask(raw, true), None);
    }

    #[test]
    fn test_bitmask_reserved_lengths() {
        // N=0, imms=111111: no element size
        assert_eq!(decode_bitmask(bitfield(1, 0, 0, 0b111111), false), None);
        // N=1 in a 32-bit operation
        assert_eq!(decode_bitmask(bitfield(0, 1, 0, 0), false), None);
    }

    #[test]
    fn test_bitmask_32bit_single_bit() {
        // N=0, imms=0, sf=0: 32-bit element holding a single one
        let mask = decode_bitmask(bitfield(0, 0, 0, 0), true).unwrap();
        assert_eq!(mask.wmask, 0x0000_0001_0000_0001);
        assert_eq!(mask.tmask, 0x0000_0001_0000_0001);
    }

    #[test]
    fn test_bitmask_logical_immediates() {
        // AND X0, X1, #0xFF -> N=1, immr=0, imms=7
        let mask = decode_bitmask(0x9240_1C20, true).unwrap();
        assert_eq!(mask.wmask, 0xFF);
        assert_eq!(mask.pos, 7);
        assert_eq!(mask.shift, 0);

        // ORR W0, WZR, #0xAAAAAAAA -> 2-bit element 0b10: immr=1, imms=0b111100
        let mask = decode_bitmask(bitfield(0, 0, 1, 0b111100), true).unwrap();
        assert_eq!(mask.wmask, 0xAAAA_AAAA_AAAA_AAAA);

        // 0xFF00FF00... -> 16-bit element, eight ones rotated by 8: immr=8, imms=0b100111
        let mask = decode_bitmask(bitfield(1, 0, 8, 0b100111), true).unwrap();
        assert_eq!(mask.wmask, 0xFF00_FF00_FF00_FF00);
    }

    #[test]
    fn test_bitmask_ubfx_tmask() {
        // UBFX X0, X1, #4, #8 == UBFM immr=4, imms=11 -> tmask covers (s - r) + 1 = 8 bits
        let mask = decode_bitmask(bitfield(1, 1, 4, 11), false).unwrap();
        assert_eq!(mask.tmask, 0xFF);
        assert_eq!(mask.wmask, 0xF000_0000_0000_00FF);
    }

    #[test]
    fn test_float_size_domain() {
        assert_eq!(FloatSize::try_from(0).unwrap(), FloatSize::Single);
        assert_eq!(FloatSize::try_from(1).unwrap(), FloatSize::Double);
        assert!(matches!(
            FloatSize::try_from(3),
            Err(DecodeError::UnsupportedFloatSize(3))
        ));
    }

    #[test]
    fn test_imm8_float_expansion() {
        // 0x70 is 1.0
        assert_eq!(decode_imm8_float(0x70, FloatSize::Single), 0x3F80_0000);
        assert_eq!(
            decode_imm8_float(0x70, FloatSize::Double),
            0x3FF0_0000_0000_0000
        );
        // 0x00 is 2.0, 0x80 is -2.0
        assert_eq!(decode_imm8_float(0x00, FloatSize::Single), 0x4000_0000);
        assert_eq!(decode_imm8_float(0x80, FloatSize::Single), 0xC000_0000);
        // 0x60 is 0.5
        assert_eq!(
            f64::from_bits(decode_imm8_float(0x60, FloatSize::Double)),
            0.5
        );
    }

    #[test]
    fn test_branch_offsets() {
        // B . (imm26 = 0) and B .-4 (imm26 all ones)
        assert_eq!(decode_imm26_2(0x1400_0000), 0);
        assert_eq!(decode_imm26_2(0x17FF_FFFF), -4);
        assert_eq!(decode_imm26_2(0x1400_0010), 0x40);

        // B.EQ +8 -> imm19 = 2
        assert_eq!(decode_imm_s19_2(0x5400_0040), 8);
        // CBZ X0, .-8 -> imm19 = -2
        assert_eq!(decode_imm_s19_2(0xB4FF_FFC0), -8);

        // TBZ W0, #0, +12 -> imm14 = 3
        assert_eq!(decode_imm_s14_2(0x3600_0060), 12);
        // TBNZ with imm14 all ones
        assert_eq!(decode_imm_s14_2(0x3707_FFE0), -4);
    }

    #[test]
    fn test_aarch32_offsets() {
        // A32 B . is EAFFFFFE: imm24 = -2
        assert_eq!(decode_imm24_2(0xEAFF_FFFE), -8);
        assert_eq!(decode_imm24_2(0xEA00_0001), 4);

        // T16 B . is E7FE: imm11 = -2
        assert_eq!(decode_imm11_1(0xE7FE), -4);
        // BEQ +6: D003
        assert_eq!(decode_imm8_1(0xD003), 6);
        assert_eq!(decode_imm8_1(0xD0FE), -4);
    }
}
