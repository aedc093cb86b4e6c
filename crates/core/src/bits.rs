// Armature - Guest CPU Front End
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Integer bit-manipulation primitives shared by the field decoders.

const HBS_NIBBLE_LUT: [i8; 16] = [-1, 0, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 3, 3, 3, 3];

/// Index of the most significant set bit, or -1 when `value` is zero.
#[inline]
pub fn highest_set_bit(value: i32) -> i32 {
    31 - (value as u32).leading_zeros() as i32
}

/// Same as [`highest_set_bit`] restricted to the low nibble.
#[inline]
pub fn highest_set_bit_nibble(value: i32) -> i32 {
    HBS_NIBBLE_LUT[(value & 0b1111) as usize] as i32
}

/// Index of the least significant set bit, or -1 when `value` is zero.
#[inline]
pub fn lowest_set_bit(value: i32) -> i32 {
    if value == 0 {
        return -1;
    }
    (value as u32).trailing_zeros() as i32
}

/// Tiles the low `size` bits of `bits` across a 64-bit value.
///
/// `size` must be a non-zero divisor of 64.
pub fn replicate(bits: u64, size: u32) -> u64 {
    debug_assert!(
        size != 0 && 64 % size == 0,
        "replicate: size {} does not divide 64",
        size
    );

    let mut output = 0u64;
    let mut bit = 0;
    while bit < 64 {
        output |= bits << bit;
        bit += size;
    }
    output
}

/// Returns `2^count - 1`.
#[inline]
pub fn fill_with_ones(count: u32) -> u64 {
    if count >= 64 {
        u64::MAX
    } else {
        (1u64 << count) - 1
    }
}

#[inline]
pub fn rotate_right_u32(bits: u32, shift: u32, size: u32) -> u32 {
    if shift == 0 {
        return bits;
    }
    (bits >> shift) | bits.wrapping_shl(size.wrapping_sub(shift))
}

#[inline]
pub fn rotate_right_u64(bits: u64, shift: u32, size: u32) -> u64 {
    if shift == 0 {
        return bits;
    }
    (bits >> shift) | bits.wrapping_shl(size.wrapping_sub(shift))
}

/// Shifts `value` left by `shift` and fills the vacated low bits with ones.
#[inline]
pub fn shl_ones(value: u64, shift: u32) -> u64 {
    if shift == 0 {
        return value;
    }
    (value << shift) | (u64::MAX >> (64 - shift))
}
