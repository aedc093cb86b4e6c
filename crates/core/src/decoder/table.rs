// Armature - Guest CPU Front End
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Encoding-pattern table mapping raw words to instruction kinds.
//!
//! Patterns are written most-significant bit first with one character per
//! bit: `0` and `1` must match, `x` is ignored. The `<` and `>` bits of a
//! pattern jointly exclude one combination, every `<` set and every `>`
//! clear: a lone `<` run may take any value except all ones, a lone `>` run
//! any value except all zeros. They expand into one (mask, value) pair per
//! allowed combination.
//!
//! Lookups go through a 4096-entry index keyed on bits 10..14 and 22..32 of
//! the word. Each bucket keeps entries in declaration order and the first
//! match wins; a word matching nothing is `Und`.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::ExecutionMode;

const FAST_LOOKUP_SIZE: usize = 0x1000;

/// Kind tag of a decoded instruction.
#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstName {
    Und,
    Adc, Adcs, Add, AddV, Adds, Adr, Adrp, And, AndV, Ands, Asr, Asrv, B,
    BCond, Bfc, Bfi, Bfm, Bic, BicVi, Bics, Bl, Blr, Blx, Br, Brk, Bx, Cbnz,
    Cbz, Ccmn, Ccmp, Clrex, Cls, Clz, Cmn, Cmp, Crc32b, Crc32cb, Crc32ch,
    Crc32cw, Crc32cx, Crc32h, Crc32w, Crc32x, Csel, Csinc, Csinv, Csneg, Dmb,
    Dsb, DupGp, DupV, Eon, Eor, EorV, Extr, FaddS, FaddV, FmovFtoi, FmovItof,
    FmovS, FmovSi, FmovVi, FmulS, Hint, InsGp, Isb, Lda, Ldab, Ldaex, Ldaexb,
    Ldaexd, Ldaexh, Ldah, Ldar, Ldaxp, Ldaxr, Ldm, Ldp, Ldr, LdrLiteral, Ldrb,
    Ldrd, Ldrex, Ldrexb, Ldrexd, Ldrexh, Ldrh, Ldrs, Ldrsb, Ldrsh, Ldxp, Ldxr,
    Lsl, Lslv, Lsr, Lsrv, Madd, Mcr, Mla, Mls, Mov, MoviV, Movk, Movn, Movt,
    Movz, Mrc, Mrrc, Mrs, Msr, Msub, Mul, Mvn, MvniV, Nop, Orn, Orr, OrrV,
    OrrVi, Pfrm, Pkh, Pld, Pop, Push, Rbit, Ret, Rev, Rev16, Rev32, Rev64,
    Revsh, Ror, Rorv, Rsb, Rsc, Sbc, Sbcs, Sbfm, Sbfx, Sdiv, ShlS, ShlV, ShrnV,
    Smaddl, Smlab, Smlal, Smlalh, Smmla, Smmls, SmovS, Smsubl, Smulh, Smull,
    SshllV, SshrS, SshrV, SsraV, Stl, Stlb, Stlex, Stlexb, Stlexd, Stlexh,
    Stlh, Stlr, Stlxp, Stlxr, Stm, Stp, Str, Strb, Strd, Strex, Strexb, Strexd,
    Strexh, Strh, Stxp, Stxr, Sub, Subs, Svc, Sxtb, Sxtb16, Sxth, Sys, Tbnz,
    Tbz, Teq, Trap, Tst, Ubfm, Ubfx, Udiv, Umaddl, Umlal, UmovS, Umsubl, Umulh,
    Umull, UshllV, UshrS, UshrV, UsraV, Uxtb, Uxtb16, Uxth,
}

impl std::fmt::Display for InstName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Operand layout of an encoding, selecting the field extractor to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    Undefined,

    // AArch64
    Adr,
    Alu,
    AluBinary,
    AluImm,
    AluRs,
    AluRx,
    Bfm,
    BImmAl,
    BImmCmp,
    BImmCond,
    BImmTest,
    BReg,
    CcmpImm,
    CcmpReg,
    Csel,
    Exception,
    MemEx,
    MemImm,
    MemLit,
    MemPair,
    MemReg,
    Mov,
    Mul,
    Simd,
    SimdFmov,
    SimdImm,
    SimdIns,
    SimdMemImm,
    SimdMemLit,
    SimdReg,
    SimdShImm,
    System,

    // AArch32 (ARM)
    A32Plain,
    A32AluBf,
    A32AluImm,
    A32AluImm16,
    A32AluMla,
    A32AluReg,
    A32AluRsImm,
    A32AluRsReg,
    A32AluUmull,
    A32AluUx,
    A32BImm,
    A32BReg,
    A32Exception,
    A32MemImm,
    A32MemImm8,
    A32MemLdEx,
    A32MemMult,
    A32MemReg,
    A32MemRsImm,
    A32MemStEx,
    A32Mrs,
    A32MsrImm,
    A32MsrReg,
    A32System,

    // AArch32 (Thumb, 16-bit)
    T16AddSpImm8,
    T16AddSubImm3,
    T16AddSubReg,
    T16AdjustSp,
    T16Adr,
    T16AluImm8,
    T16AluReg,
    T16AluRegHigh,
    T16B,
    T16BCond,
    T16BReg,
    T16Exception,
    T16Hint,
    T16LdrLit,
    T16MemImm,
    T16MemReg,
    T16MemSp,
    T16Pop,
    T16Push,
    T16ShiftImm,
}

/// What a raw word decodes to: its kind and its operand layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstDescriptor {
    pub name: InstName,
    pub shape: Shape,
}

impl InstDescriptor {
    pub const UNDEFINED: InstDescriptor = InstDescriptor {
        name: InstName::Und,
        shape: Shape::Undefined,
    };

    pub const fn new(name: InstName, shape: Shape) -> Self {
        Self { name, shape }
    }
}

/// Maps a raw word to its instruction kind.
///
/// Implementations must be total and deterministic: every `(raw, mode)` pair
/// yields a descriptor, falling back to [`InstDescriptor::UNDEFINED`].
pub trait PatternTable: Send + Sync {
    fn lookup(&self, raw: u32, mode: ExecutionMode) -> InstDescriptor;
}

use InstName as N;
use Shape as S;

#[rustfmt::skip]
const A64_ENCODINGS: &[(&str, InstName, Shape)] = &[
    // Base
    ("x0011010000xxxxx000000xxxxxxxxxx", N::Adc,        S::AluRs),
    ("x0111010000xxxxx000000xxxxxxxxxx", N::Adcs,       S::AluRs),
    ("x00100010xxxxxxxxxxxxxxxxxxxxxxx", N::Add,        S::AluImm),
    ("00001011<<0xxxxx0xxxxxxxxxxxxxxx", N::Add,        S::AluRs),
    ("10001011<<0xxxxxxxxxxxxxxxxxxxxx", N::Add,        S::AluRs),
    ("x0001011001xxxxxxxx0xxxxxxxxxxxx", N::Add,        S::AluRx),
    ("x0001011001xxxxxxxx100xxxxxxxxxx", N::Add,        S::AluRx),
    ("x01100010xxxxxxxxxxxxxxxxxxxxxxx", N::Adds,       S::AluImm),
    ("00101011<<0xxxxx0xxxxxxxxxxxxxxx", N::Adds,       S::AluRs),
    ("10101011<<0xxxxxxxxxxxxxxxxxxxxx", N::Adds,       S::AluRs),
    ("x0101011001xxxxxxxx0xxxxxxxxxxxx", N::Adds,       S::AluRx),
    ("x0101011001xxxxxxxx100xxxxxxxxxx", N::Adds,       S::AluRx),
    ("0xx10000xxxxxxxxxxxxxxxxxxxxxxxx", N::Adr,        S::Adr),
    ("1xx10000xxxxxxxxxxxxxxxxxxxxxxxx", N::Adrp,       S::Adr),
    ("0001001000xxxxxxxxxxxxxxxxxxxxxx", N::And,        S::AluImm),
    ("100100100xxxxxxxxxxxxxxxxxxxxxxx", N::And,        S::AluImm),
    ("00001010xx0xxxxx0xxxxxxxxxxxxxxx", N::And,        S::AluRs),
    ("10001010xx0xxxxxxxxxxxxxxxxxxxxx", N::And,        S::AluRs),
    ("0111001000xxxxxxxxxxxxxxxxxxxxxx", N::Ands,       S::AluImm),
    ("111100100xxxxxxxxxxxxxxxxxxxxxxx", N::Ands,       S::AluImm),
    ("01101010xx0xxxxx0xxxxxxxxxxxxxxx", N::Ands,       S::AluRs),
    ("11101010xx0xxxxxxxxxxxxxxxxxxxxx", N::Ands,       S::AluRs),
    ("x0011010110xxxxx001010xxxxxxxxxx", N::Asrv,       S::AluRs),
    ("000101xxxxxxxxxxxxxxxxxxxxxxxxxx", N::B,          S::BImmAl),
    ("01010100xxxxxxxxxxxxxxxxxxx0xxxx", N::BCond,      S::BImmCond),
    ("00110011000xxxxx0xxxxxxxxxxxxxxx", N::Bfm,        S::Bfm),
    ("1011001101xxxxxxxxxxxxxxxxxxxxxx", N::Bfm,        S::Bfm),
    ("00001010xx1xxxxx0xxxxxxxxxxxxxxx", N::Bic,        S::AluRs),
    ("10001010xx1xxxxxxxxxxxxxxxxxxxxx", N::Bic,        S::AluRs),
    ("01101010xx1xxxxx0xxxxxxxxxxxxxxx", N::Bics,       S::AluRs),
    ("11101010xx1xxxxxxxxxxxxxxxxxxxxx", N::Bics,       S::AluRs),
    ("100101xxxxxxxxxxxxxxxxxxxxxxxxxx", N::Bl,         S::BImmAl),
    ("1101011000111111000000xxxxx00000", N::Blr,        S::BReg),
    ("1101011000011111000000xxxxx00000", N::Br,         S::BReg),
    ("11010100001xxxxxxxxxxxxxxxx00000", N::Brk,        S::Exception),
    ("x0110101xxxxxxxxxxxxxxxxxxxxxxxx", N::Cbnz,       S::BImmCmp),
    ("x0110100xxxxxxxxxxxxxxxxxxxxxxxx", N::Cbz,        S::BImmCmp),
    ("x0111010010xxxxxxxxx10xxxxx0xxxx", N::Ccmn,       S::CcmpImm),
    ("x0111010010xxxxxxxxx00xxxxx0xxxx", N::Ccmn,       S::CcmpReg),
    ("x1111010010xxxxxxxxx10xxxxx0xxxx", N::Ccmp,       S::CcmpImm),
    ("x1111010010xxxxxxxxx00xxxxx0xxxx", N::Ccmp,       S::CcmpReg),
    ("11010101000000110011xxxx01011111", N::Clrex,      S::System),
    ("x101101011000000000101xxxxxxxxxx", N::Cls,        S::Alu),
    ("x101101011000000000100xxxxxxxxxx", N::Clz,        S::Alu),
    ("00011010110xxxxx010000xxxxxxxxxx", N::Crc32b,     S::AluBinary),
    ("00011010110xxxxx010001xxxxxxxxxx", N::Crc32h,     S::AluBinary),
    ("00011010110xxxxx010010xxxxxxxxxx", N::Crc32w,     S::AluBinary),
    ("10011010110xxxxx010011xxxxxxxxxx", N::Crc32x,     S::AluBinary),
    ("00011010110xxxxx010100xxxxxxxxxx", N::Crc32cb,    S::AluBinary),
    ("00011010110xxxxx010101xxxxxxxxxx", N::Crc32ch,    S::AluBinary),
    ("00011010110xxxxx010110xxxxxxxxxx", N::Crc32cw,    S::AluBinary),
    ("10011010110xxxxx010111xxxxxxxxxx", N::Crc32cx,    S::AluBinary),
    ("x0011010100xxxxxxxxx00xxxxxxxxxx", N::Csel,       S::Csel),
    ("x0011010100xxxxxxxxx01xxxxxxxxxx", N::Csinc,      S::Csel),
    ("x1011010100xxxxxxxxx00xxxxxxxxxx", N::Csinv,      S::Csel),
    ("x1011010100xxxxxxxxx01xxxxxxxxxx", N::Csneg,      S::Csel),
    ("11010101000000110011xxxx10111111", N::Dmb,        S::System),
    ("11010101000000110011xxxx10011111", N::Dsb,        S::System),
    ("01001010xx1xxxxx0xxxxxxxxxxxxxxx", N::Eon,        S::AluRs),
    ("11001010xx1xxxxxxxxxxxxxxxxxxxxx", N::Eon,        S::AluRs),
    ("0101001000xxxxxxxxxxxxxxxxxxxxxx", N::Eor,        S::AluImm),
    ("110100100xxxxxxxxxxxxxxxxxxxxxxx", N::Eor,        S::AluImm),
    ("01001010xx0xxxxx0xxxxxxxxxxxxxxx", N::Eor,        S::AluRs),
    ("11001010xx0xxxxxxxxxxxxxxxxxxxxx", N::Eor,        S::AluRs),
    ("00010011100xxxxx0xxxxxxxxxxxxxxx", N::Extr,       S::AluRs),
    ("10010011110xxxxxxxxxxxxxxxxxxxxx", N::Extr,       S::AluRs),
    ("11010101000000110010xxxxxxx11111", N::Hint,       S::System),
    ("11010101000000110011xxxx11011111", N::Isb,        S::System),
    ("xx001000110xxxxx1xxxxxxxxxxxxxxx", N::Ldar,       S::MemEx),
    ("1x001000011xxxxx1xxxxxxxxxxxxxxx", N::Ldaxp,      S::MemEx),
    ("xx001000010xxxxx1xxxxxxxxxxxxxxx", N::Ldaxr,      S::MemEx),
    ("<<10100xx1xxxxxxxxxxxxxxxxxxxxxx", N::Ldp,        S::MemPair),
    ("xx111000010xxxxxxxxxxxxxxxxxxxxx", N::Ldr,        S::MemImm),
    ("xx11100101xxxxxxxxxxxxxxxxxxxxxx", N::Ldr,        S::MemImm),
    ("xx111000011xxxxxxxxx10xxxxxxxxxx", N::Ldr,        S::MemReg),
    ("xx011000xxxxxxxxxxxxxxxxxxxxxxxx", N::LdrLiteral, S::MemLit),
    ("0x1110001x0xxxxxxxxxxxxxxxxxxxxx", N::Ldrs,       S::MemImm),
    ("0x1110011xxxxxxxxxxxxxxxxxxxxxxx", N::Ldrs,       S::MemImm),
    ("10111000100xxxxxxxxxxxxxxxxxxxxx", N::Ldrs,       S::MemImm),
    ("1011100110xxxxxxxxxxxxxxxxxxxxxx", N::Ldrs,       S::MemImm),
    ("0x1110001x1xxxxxxxxx10xxxxxxxxxx", N::Ldrs,       S::MemReg),
    ("10111000101xxxxxxxxx10xxxxxxxxxx", N::Ldrs,       S::MemReg),
    ("xx001000010xxxxx0xxxxxxxxxxxxxxx", N::Ldxr,       S::MemEx),
    ("1x001000011xxxxx0xxxxxxxxxxxxxxx", N::Ldxp,       S::MemEx),
    ("x0011010110xxxxx001000xxxxxxxxxx", N::Lslv,       S::AluRs),
    ("x0011010110xxxxx001001xxxxxxxxxx", N::Lsrv,       S::AluRs),
    ("x0011011000xxxxx0xxxxxxxxxxxxxxx", N::Madd,       S::Mul),
    ("0111001010xxxxxxxxxxxxxxxxxxxxxx", N::Movk,       S::Mov),
    ("111100101xxxxxxxxxxxxxxxxxxxxxxx", N::Movk,       S::Mov),
    ("0001001010xxxxxxxxxxxxxxxxxxxxxx", N::Movn,       S::Mov),
    ("100100101xxxxxxxxxxxxxxxxxxxxxxx", N::Movn,       S::Mov),
    ("0101001010xxxxxxxxxxxxxxxxxxxxxx", N::Movz,       S::Mov),
    ("110100101xxxxxxxxxxxxxxxxxxxxxxx", N::Movz,       S::Mov),
    ("110101010011xxxxxxxxxxxxxxxxxxxx", N::Mrs,        S::System),
    ("110101010001xxxxxxxxxxxxxxxxxxxx", N::Msr,        S::System),
    ("x0011011000xxxxx1xxxxxxxxxxxxxxx", N::Msub,       S::Mul),
    ("11010101000000110010000000011111", N::Nop,        S::System),
    ("00101010xx1xxxxx0xxxxxxxxxxxxxxx", N::Orn,        S::AluRs),
    ("10101010xx1xxxxxxxxxxxxxxxxxxxxx", N::Orn,        S::AluRs),
    ("0011001000xxxxxxxxxxxxxxxxxxxxxx", N::Orr,        S::AluImm),
    ("101100100xxxxxxxxxxxxxxxxxxxxxxx", N::Orr,        S::AluImm),
    ("00101010xx0xxxxx0xxxxxxxxxxxxxxx", N::Orr,        S::AluRs),
    ("10101010xx0xxxxxxxxxxxxxxxxxxxxx", N::Orr,        S::AluRs),
    ("1111100110xxxxxxxxxxxxxxxxxxxxxx", N::Pfrm,       S::MemImm),
    ("11111000100xxxxxxxxx00xxxxxxxxxx", N::Pfrm,       S::MemImm),
    ("11011000xxxxxxxxxxxxxxxxxxxxxxxx", N::Pfrm,       S::MemLit),
    ("x101101011000000000000xxxxxxxxxx", N::Rbit,       S::Alu),
    ("1101011001011111000000xxxxx00000", N::Ret,        S::BReg),
    ("x101101011000000000001xxxxxxxxxx", N::Rev16,      S::Alu),
    ("x101101011000000000010xxxxxxxxxx", N::Rev32,      S::Alu),
    ("1101101011000000000011xxxxxxxxxx", N::Rev64,      S::Alu),
    ("x0011010110xxxxx001011xxxxxxxxxx", N::Rorv,       S::AluRs),
    ("x1011010000xxxxx000000xxxxxxxxxx", N::Sbc,        S::AluRs),
    ("x1111010000xxxxx000000xxxxxxxxxx", N::Sbcs,       S::AluRs),
    ("00010011000xxxxx0xxxxxxxxxxxxxxx", N::Sbfm,       S::Bfm),
    ("1001001101xxxxxxxxxxxxxxxxxxxxxx", N::Sbfm,       S::Bfm),
    ("x0011010110xxxxx000011xxxxxxxxxx", N::Sdiv,       S::AluBinary),
    ("10011011001xxxxx0xxxxxxxxxxxxxxx", N::Smaddl,     S::Mul),
    ("10011011001xxxxx1xxxxxxxxxxxxxxx", N::Smsubl,     S::Mul),
    ("10011011010xxxxx0xxxxxxxxxxxxxxx", N::Smulh,      S::Mul),
    ("xx001000100xxxxx1xxxxxxxxxxxxxxx", N::Stlr,       S::MemEx),
    ("1x001000001xxxxx1xxxxxxxxxxxxxxx", N::Stlxp,      S::MemEx),
    ("xx001000000xxxxx1xxxxxxxxxxxxxxx", N::Stlxr,      S::MemEx),
    ("x010100xx0xxxxxxxxxxxxxxxxxxxxxx", N::Stp,        S::MemPair),
    ("xx111000000xxxxxxxxxxxxxxxxxxxxx", N::Str,        S::MemImm),
    ("xx11100100xxxxxxxxxxxxxxxxxxxxxx", N::Str,        S::MemImm),
    ("xx111000001xxxxxxxxx10xxxxxxxxxx", N::Str,        S::MemReg),
    ("1x001000001xxxxx0xxxxxxxxxxxxxxx", N::Stxp,       S::MemEx),
    ("xx001000000xxxxx0xxxxxxxxxxxxxxx", N::Stxr,       S::MemEx),
    ("x10100010xxxxxxxxxxxxxxxxxxxxxxx", N::Sub,        S::AluImm),
    ("01001011<<0xxxxx0xxxxxxxxxxxxxxx", N::Sub,        S::AluRs),
    ("11001011<<0xxxxxxxxxxxxxxxxxxxxx", N::Sub,        S::AluRs),
    ("x1001011001xxxxxxxx0xxxxxxxxxxxx", N::Sub,        S::AluRx),
    ("x1001011001xxxxxxxx100xxxxxxxxxx", N::Sub,        S::AluRx),
    ("x11100010xxxxxxxxxxxxxxxxxxxxxxx", N::Subs,       S::AluImm),
    ("01101011<<0xxxxx0xxxxxxxxxxxxxxx", N::Subs,       S::AluRs),
    ("11101011<<0xxxxxxxxxxxxxxxxxxxxx", N::Subs,       S::AluRs),
    ("x1101011001xxxxxxxx0xxxxxxxxxxxx", N::Subs,       S::AluRx),
    ("x1101011001xxxxxxxx100xxxxxxxxxx", N::Subs,       S::AluRx),
    ("11010100000xxxxxxxxxxxxxxxx00001", N::Svc,        S::Exception),
    ("1101010100001xxxxxxxxxxxxxxxxxxx", N::Sys,        S::System),
    ("x0110111xxxxxxxxxxxxxxxxxxxxxxxx", N::Tbnz,       S::BImmTest),
    ("x0110110xxxxxxxxxxxxxxxxxxxxxxxx", N::Tbz,        S::BImmTest),
    ("01010011000xxxxx0xxxxxxxxxxxxxxx", N::Ubfm,       S::Bfm),
    ("1101001101xxxxxxxxxxxxxxxxxxxxxx", N::Ubfm,       S::Bfm),
    ("x0011010110xxxxx000010xxxxxxxxxx", N::Udiv,       S::AluBinary),
    ("10011011101xxxxx0xxxxxxxxxxxxxxx", N::Umaddl,     S::Mul),
    ("10011011101xxxxx1xxxxxxxxxxxxxxx", N::Umsubl,     S::Mul),
    ("10011011110xxxxx0xxxxxxxxxxxxxxx", N::Umulh,      S::Mul),

    // FP & SIMD
    ("0>001110<<1xxxxx100001xxxxxxxxxx", N::AddV,       S::SimdReg),
    ("0x001110001xxxxx000111xxxxxxxxxx", N::AndV,       S::SimdReg),
    ("0x10111100000xxx0xx101xxxxxxxxxx", N::BicVi,      S::SimdImm),
    ("0x10111100000xxx10x101xxxxxxxxxx", N::BicVi,      S::SimdImm),
    ("0>001110000x<>>>000011xxxxxxxxxx", N::DupGp,      S::SimdIns),
    ("0>001110000x<>>>000001xxxxxxxxxx", N::DupV,       S::SimdIns),
    ("0x101110001xxxxx000111xxxxxxxxxx", N::EorV,       S::SimdReg),
    ("000111100x1xxxxx001010xxxxxxxxxx", N::FaddS,      S::SimdReg),
    ("0>0011100<1xxxxx110101xxxxxxxxxx", N::FaddV,      S::SimdReg),
    ("000111100x100000010000xxxxxxxxxx", N::FmovS,      S::Simd),
    ("000111100x1xxxxxxxx10000000xxxxx", N::FmovSi,     S::SimdFmov),
    ("0x00111100000xxx111101xxxxxxxxxx", N::FmovVi,     S::SimdImm),
    ("0110111100000xxx111101xxxxxxxxxx", N::FmovVi,     S::SimdImm),
    ("0001111000100110000000xxxxxxxxxx", N::FmovFtoi,   S::Simd),
    ("1001111001100110000000xxxxxxxxxx", N::FmovFtoi,   S::Simd),
    ("0001111000100111000000xxxxxxxxxx", N::FmovItof,   S::Simd),
    ("1001111001100111000000xxxxxxxxxx", N::FmovItof,   S::Simd),
    ("000111100x1xxxxx000010xxxxxxxxxx", N::FmulS,      S::SimdReg),
    ("01001110000xxxxx000111xxxxxxxxxx", N::InsGp,      S::SimdIns),
    ("xx111100x10xxxxxxxxx00xxxxxxxxxx", N::Ldr,        S::SimdMemImm),
    ("xx111100x10xxxxxxxxx01xxxxxxxxxx", N::Ldr,        S::SimdMemImm),
    ("xx111100x10xxxxxxxxx11xxxxxxxxxx", N::Ldr,        S::SimdMemImm),
    ("xx111101x1xxxxxxxxxxxxxxxxxxxxxx", N::Ldr,        S::SimdMemImm),
    ("xx011100xxxxxxxxxxxxxxxxxxxxxxxx", N::LdrLiteral, S::SimdMemLit),
    ("0x00111100000xxx0xx001xxxxxxxxxx", N::MoviV,      S::SimdImm),
    ("0x00111100000xxx10x001xxxxxxxxxx", N::MoviV,      S::SimdImm),
    ("0x00111100000xxx110x01xxxxxxxxxx", N::MoviV,      S::SimdImm),
    ("0xx0111100000xxx111001xxxxxxxxxx", N::MoviV,      S::SimdImm),
    ("0x10111100000xxx0xx001xxxxxxxxxx", N::MvniV,      S::SimdImm),
    ("0x10111100000xxx10x001xxxxxxxxxx", N::MvniV,      S::SimdImm),
    ("0x10111100000xxx110x01xxxxxxxxxx", N::MvniV,      S::SimdImm),
    ("0x001110101xxxxx000111xxxxxxxxxx", N::OrrV,       S::SimdReg),
    ("0x00111100000xxx0xx101xxxxxxxxxx", N::OrrVi,      S::SimdImm),
    ("0x00111100000xxx10x101xxxxxxxxxx", N::OrrVi,      S::SimdImm),
    ("0101111101xxxxxx010101xxxxxxxxxx", N::ShlS,       S::SimdShImm),
    ("0x00111100>>>xxx010101xxxxxxxxxx", N::ShlV,       S::SimdShImm),
    ("0100111101xxxxxx010101xxxxxxxxxx", N::ShlV,       S::SimdShImm),
    ("0x00111100>>>xxx100001xxxxxxxxxx", N::ShrnV,      S::SimdShImm),
    ("0x001110000xxxxx001011xxxxxxxxxx", N::SmovS,      S::SimdIns),
    ("0x00111100>>>xxx101001xxxxxxxxxx", N::SshllV,     S::SimdShImm),
    ("0101111101xxxxxx000001xxxxxxxxxx", N::SshrS,      S::SimdShImm),
    ("0x00111100>>>xxx000001xxxxxxxxxx", N::SshrV,      S::SimdShImm),
    ("0100111101xxxxxx000001xxxxxxxxxx", N::SshrV,      S::SimdShImm),
    ("0x00111100>>>xxx000101xxxxxxxxxx", N::SsraV,      S::SimdShImm),
    ("0100111101xxxxxx000101xxxxxxxxxx", N::SsraV,      S::SimdShImm),
    ("xx111100x00xxxxxxxxx00xxxxxxxxxx", N::Str,        S::SimdMemImm),
    ("xx111100x00xxxxxxxxx01xxxxxxxxxx", N::Str,        S::SimdMemImm),
    ("xx111100x00xxxxxxxxx11xxxxxxxxxx", N::Str,        S::SimdMemImm),
    ("xx111101x0xxxxxxxxxxxxxxxxxxxxxx", N::Str,        S::SimdMemImm),
    ("0x001110000xxxxx001111xxxxxxxxxx", N::UmovS,      S::SimdIns),
    ("0x10111100>>>xxx101001xxxxxxxxxx", N::UshllV,     S::SimdShImm),
    ("0111111101xxxxxx000001xxxxxxxxxx", N::UshrS,      S::SimdShImm),
    ("0x10111100>>>xxx000001xxxxxxxxxx", N::UshrV,      S::SimdShImm),
    ("0110111101xxxxxx000001xxxxxxxxxx", N::UshrV,      S::SimdShImm),
    ("0x10111100>>>xxx000101xxxxxxxxxx", N::UsraV,      S::SimdShImm),
    ("0110111101xxxxxx000101xxxxxxxxxx", N::UsraV,      S::SimdShImm),
];

#[rustfmt::skip]
const A32_ENCODINGS: &[(&str, InstName, Shape)] = &[
    ("<<<<0010101xxxxxxxxxxxxxxxxxxxxx", N::Adc,        S::A32AluImm),
    ("<<<<0000101xxxxxxxxxxxxxxxx0xxxx", N::Adc,        S::A32AluRsImm),
    ("<<<<0000101xxxxxxxxxxxxx0xx1xxxx", N::Adc,        S::A32AluRsReg),
    ("<<<<0010100xxxxxxxxxxxxxxxxxxxxx", N::Add,        S::A32AluImm),
    ("<<<<0000100xxxxxxxxxxxxxxxx0xxxx", N::Add,        S::A32AluRsImm),
    ("<<<<0000100xxxxxxxxxxxxx0xx1xxxx", N::Add,        S::A32AluRsReg),
    ("<<<<0010000xxxxxxxxxxxxxxxxxxxxx", N::And,        S::A32AluImm),
    ("<<<<0000000xxxxxxxxxxxxxxxx0xxxx", N::And,        S::A32AluRsImm),
    ("<<<<0000000xxxxxxxxxxxxx0xx1xxxx", N::And,        S::A32AluRsReg),
    ("<<<<1010xxxxxxxxxxxxxxxxxxxxxxxx", N::B,          S::A32BImm),
    ("<<<<0111110xxxxxxxxxxxxxx0011111", N::Bfc,        S::A32AluBf),
    ("<<<<0111110xxxxxxxxxxxxxx001xxxx", N::Bfi,        S::A32AluBf),
    ("<<<<0011110xxxxxxxxxxxxxxxxxxxxx", N::Bic,        S::A32AluImm),
    ("<<<<0001110xxxxxxxxxxxxxxxx0xxxx", N::Bic,        S::A32AluRsImm),
    ("<<<<0001110xxxxxxxxxxxxx0xx1xxxx", N::Bic,        S::A32AluRsReg),
    ("<<<<1011xxxxxxxxxxxxxxxxxxxxxxxx", N::Bl,         S::A32BImm),
    ("1111101xxxxxxxxxxxxxxxxxxxxxxxxx", N::Blx,        S::A32BImm),
    ("<<<<000100101111111111110011xxxx", N::Blx,        S::A32BReg),
    ("<<<<000100101111111111110001xxxx", N::Bx,         S::A32BReg),
    ("11110101011111111111000000011111", N::Clrex,      S::A32Plain),
    ("<<<<000101101111xxxx11110001xxxx", N::Clz,        S::A32AluReg),
    ("<<<<00110111xxxx0000xxxxxxxxxxxx", N::Cmn,        S::A32AluImm),
    ("<<<<00010111xxxx0000xxxxxxx0xxxx", N::Cmn,        S::A32AluRsImm),
    ("<<<<00110101xxxx0000xxxxxxxxxxxx", N::Cmp,        S::A32AluImm),
    ("<<<<00010101xxxx0000xxxxxxx0xxxx", N::Cmp,        S::A32AluRsImm),
    ("<<<<00010101xxxx0000xxxx0xx1xxxx", N::Cmp,        S::A32AluRsReg),
    ("1111010101111111111100000101xxxx", N::Dmb,        S::A32Plain),
    ("1111010101111111111100000100xxxx", N::Dsb,        S::A32Plain),
    ("<<<<0010001xxxxxxxxxxxxxxxxxxxxx", N::Eor,        S::A32AluImm),
    ("<<<<0000001xxxxxxxxxxxxxxxx0xxxx", N::Eor,        S::A32AluRsImm),
    ("<<<<0000001xxxxxxxxxxxxx0xx1xxxx", N::Eor,        S::A32AluRsReg),
    ("<<<<0011001000001111000000000xxx", N::Hint,       S::A32Plain),
    ("1111010101111111111100000110xxxx", N::Isb,        S::A32Plain),
    ("<<<<00011001xxxxxxxx110010011111", N::Lda,        S::A32MemLdEx),
    ("<<<<00011101xxxxxxxx110010011111", N::Ldab,       S::A32MemLdEx),
    ("<<<<00011001xxxxxxxx111010011111", N::Ldaex,      S::A32MemLdEx),
    ("<<<<00011101xxxxxxxx111010011111", N::Ldaexb,     S::A32MemLdEx),
    ("<<<<00011011xxxxxxxx111010011111", N::Ldaexd,     S::A32MemLdEx),
    ("<<<<00011111xxxxxxxx111010011111", N::Ldaexh,     S::A32MemLdEx),
    ("<<<<00011111xxxxxxxx110010011111", N::Ldah,       S::A32MemLdEx),
    ("<<<<100xx0x1xxxxxxxxxxxxxxxxxxxx", N::Ldm,        S::A32MemMult),
    ("<<<<010xx0x1xxxxxxxxxxxxxxxxxxxx", N::Ldr,        S::A32MemImm),
    ("<<<<011xx0x1xxxxxxxxxxxxxxx0xxxx", N::Ldr,        S::A32MemRsImm),
    ("<<<<010xx1x1xxxxxxxxxxxxxxxxxxxx", N::Ldrb,       S::A32MemImm),
    ("<<<<011xx1x1xxxxxxxxxxxxxxx0xxxx", N::Ldrb,       S::A32MemRsImm),
    ("<<<<000xx1x0xxxxxxxxxxxx1101xxxx", N::Ldrd,       S::A32MemImm8),
    ("<<<<000xx0x0xxxxxxxx00001101xxxx", N::Ldrd,       S::A32MemReg),
    ("<<<<00011001xxxxxxxx111110011111", N::Ldrex,      S::A32MemLdEx),
    ("<<<<00011101xxxxxxxx111110011111", N::Ldrexb,     S::A32MemLdEx),
    ("<<<<00011011xxxxxxxx111110011111", N::Ldrexd,     S::A32MemLdEx),
    ("<<<<00011111xxxxxxxx111110011111", N::Ldrexh,     S::A32MemLdEx),
    ("<<<<000xx1x1xxxxxxxxxxxx1011xxxx", N::Ldrh,       S::A32MemImm8),
    ("<<<<000xx0x1xxxxxxxx00001011xxxx", N::Ldrh,       S::A32MemReg),
    ("<<<<000xx1x1xxxxxxxxxxxx1101xxxx", N::Ldrsb,      S::A32MemImm8),
    ("<<<<000xx0x1xxxxxxxx00001101xxxx", N::Ldrsb,      S::A32MemReg),
    ("<<<<000xx1x1xxxxxxxxxxxx1111xxxx", N::Ldrsh,      S::A32MemImm8),
    ("<<<<000xx0x1xxxxxxxx00001111xxxx", N::Ldrsh,      S::A32MemReg),
    ("<<<<1110xxx0xxxxxxxx111xxxx1xxxx", N::Mcr,        S::A32System),
    ("<<<<0000001xxxxxxxxxxxxx1001xxxx", N::Mla,        S::A32AluMla),
    ("<<<<00000110xxxxxxxxxxxx1001xxxx", N::Mls,        S::A32AluMla),
    ("<<<<0011101x0000xxxxxxxxxxxxxxxx", N::Mov,        S::A32AluImm),
    ("<<<<0001101x0000xxxxxxxxxxx0xxxx", N::Mov,        S::A32AluRsImm),
    ("<<<<0001101x0000xxxxxxxx0xx1xxxx", N::Mov,        S::A32AluRsReg),
    ("<<<<00110000xxxxxxxxxxxxxxxxxxxx", N::Mov,        S::A32AluImm16),
    ("<<<<00110100xxxxxxxxxxxxxxxxxxxx", N::Movt,       S::A32AluImm16),
    ("<<<<1110xxx1xxxxxxxx111xxxx1xxxx", N::Mrc,        S::A32System),
    ("<<<<11000101xxxxxxxx111xxxxxxxxx", N::Mrrc,       S::A32System),
    ("<<<<00010x001111xxxx000000000000", N::Mrs,        S::A32Mrs),
    ("<<<<00110x10xxxx1111xxxxxxxxxxxx", N::Msr,        S::A32MsrImm),
    ("<<<<00010x10xxxx111100000000xxxx", N::Msr,        S::A32MsrReg),
    ("<<<<0000000xxxxx0000xxxx1001xxxx", N::Mul,        S::A32AluMla),
    ("<<<<0011111x0000xxxxxxxxxxxxxxxx", N::Mvn,        S::A32AluImm),
    ("<<<<0001111x0000xxxxxxxxxxx0xxxx", N::Mvn,        S::A32AluRsImm),
    ("<<<<0001111x0000xxxxxxxx0xx1xxxx", N::Mvn,        S::A32AluRsReg),
    ("<<<<0011100xxxxxxxxxxxxxxxxxxxxx", N::Orr,        S::A32AluImm),
    ("<<<<0001100xxxxxxxxxxxxxxxx0xxxx", N::Orr,        S::A32AluRsImm),
    ("<<<<0001100xxxxxxxxxxxxx0xx1xxxx", N::Orr,        S::A32AluRsReg),
    ("<<<<01101000xxxxxxxxxxxxxx01xxxx", N::Pkh,        S::A32AluRsImm),
    ("11110101xx01xxxx1111xxxxxxxxxxxx", N::Pld,        S::A32Plain),
    ("11110111xx01xxxx1111xxxxxxx0xxxx", N::Pld,        S::A32Plain),
    ("<<<<011011111111xxxx11110011xxxx", N::Rbit,       S::A32AluReg),
    ("<<<<011010111111xxxx11110011xxxx", N::Rev,        S::A32AluReg),
    ("<<<<011010111111xxxx11111011xxxx", N::Rev16,      S::A32AluReg),
    ("<<<<011011111111xxxx11111011xxxx", N::Revsh,      S::A32AluReg),
    ("<<<<0010011xxxxxxxxxxxxxxxxxxxxx", N::Rsb,        S::A32AluImm),
    ("<<<<0000011xxxxxxxxxxxxxxxx0xxxx", N::Rsb,        S::A32AluRsImm),
    ("<<<<0000011xxxxxxxxxxxxx0xx1xxxx", N::Rsb,        S::A32AluRsReg),
    ("<<<<0010111xxxxxxxxxxxxxxxxxxxxx", N::Rsc,        S::A32AluImm),
    ("<<<<0000111xxxxxxxxxxxxxxxx0xxxx", N::Rsc,        S::A32AluRsImm),
    ("<<<<0000111xxxxxxxxxxxxx0xx1xxxx", N::Rsc,        S::A32AluRsReg),
    ("<<<<0010110xxxxxxxxxxxxxxxxxxxxx", N::Sbc,        S::A32AluImm),
    ("<<<<0000110xxxxxxxxxxxxxxxx0xxxx", N::Sbc,        S::A32AluRsImm),
    ("<<<<0000110xxxxxxxxxxxxx0xx1xxxx", N::Sbc,        S::A32AluRsReg),
    ("<<<<0111101xxxxxxxxxxxxxx101xxxx", N::Sbfx,       S::A32AluBf),
    ("<<<<01110001xxxx1111xxxx0001xxxx", N::Sdiv,       S::A32AluMla),
    ("<<<<00010000xxxxxxxxxxxx1xx0xxxx", N::Smlab,      S::A32AluMla),
    ("<<<<0000111xxxxxxxxxxxxx1001xxxx", N::Smlal,      S::A32AluUmull),
    ("<<<<00010100xxxxxxxxxxxx1xx0xxxx", N::Smlalh,     S::A32AluUmull),
    ("<<<<01110101xxxxxxxxxxxx00x1xxxx", N::Smmla,      S::A32AluMla),
    ("<<<<01110101xxxxxxxxxxxx11x1xxxx", N::Smmls,      S::A32AluMla),
    ("<<<<00010110xxxxxxxxxxxx1xx0xxxx", N::Smulh,      S::A32AluMla),
    ("<<<<0000110xxxxxxxxxxxxx1001xxxx", N::Smull,      S::A32AluUmull),
    ("<<<<00011000xxxx111111001001xxxx", N::Stl,        S::A32MemStEx),
    ("<<<<00011100xxxx111111001001xxxx", N::Stlb,       S::A32MemStEx),
    ("<<<<00011000xxxxxxxx11101001xxxx", N::Stlex,      S::A32MemStEx),
    ("<<<<00011100xxxxxxxx11101001xxxx", N::Stlexb,     S::A32MemStEx),
    ("<<<<00011010xxxxxxxx11101001xxxx", N::Stlexd,     S::A32MemStEx),
    ("<<<<00011110xxxxxxxx11101001xxxx", N::Stlexh,     S::A32MemStEx),
    ("<<<<00011110xxxx111111001001xxxx", N::Stlh,       S::A32MemStEx),
    ("<<<<100xx0x0xxxxxxxxxxxxxxxxxxxx", N::Stm,        S::A32MemMult),
    ("<<<<010xx0x0xxxxxxxxxxxxxxxxxxxx", N::Str,        S::A32MemImm),
    ("<<<<011xx0x0xxxxxxxxxxxxxxx0xxxx", N::Str,        S::A32MemRsImm),
    ("<<<<010xx1x0xxxxxxxxxxxxxxxxxxxx", N::Strb,       S::A32MemImm),
    ("<<<<011xx1x0xxxxxxxxxxxxxxx0xxxx", N::Strb,       S::A32MemRsImm),
    ("<<<<000xx1x0xxxxxxxxxxxx1111xxxx", N::Strd,       S::A32MemImm8),
    ("<<<<000xx0x0xxxxxxxx00001111xxxx", N::Strd,       S::A32MemReg),
    ("<<<<00011000xxxxxxxx11111001xxxx", N::Strex,      S::A32MemStEx),
    ("<<<<00011100xxxxxxxx11111001xxxx", N::Strexb,     S::A32MemStEx),
    ("<<<<00011010xxxxxxxx11111001xxxx", N::Strexd,     S::A32MemStEx),
    ("<<<<00011110xxxxxxxx11111001xxxx", N::Strexh,     S::A32MemStEx),
    ("<<<<000xx1x0xxxxxxxxxxxx1011xxxx", N::Strh,       S::A32MemImm8),
    ("<<<<000xx0x0xxxxxxxx00001011xxxx", N::Strh,       S::A32MemReg),
    ("<<<<0010010xxxxxxxxxxxxxxxxxxxxx", N::Sub,        S::A32AluImm),
    ("<<<<0000010xxxxxxxxxxxxxxxx0xxxx", N::Sub,        S::A32AluRsImm),
    ("<<<<0000010xxxxxxxxxxxxx0xx1xxxx", N::Sub,        S::A32AluRsReg),
    ("<<<<1111xxxxxxxxxxxxxxxxxxxxxxxx", N::Svc,        S::A32Exception),
    ("<<<<01101010xxxxxxxxxx000111xxxx", N::Sxtb,       S::A32AluUx),
    ("<<<<01101000xxxxxxxxxx000111xxxx", N::Sxtb16,     S::A32AluUx),
    ("<<<<01101011xxxxxxxxxx000111xxxx", N::Sxth,       S::A32AluUx),
    ("<<<<00110011xxxx0000xxxxxxxxxxxx", N::Teq,        S::A32AluImm),
    ("<<<<00010011xxxx0000xxxxxxx0xxxx", N::Teq,        S::A32AluRsImm),
    ("<<<<00010011xxxx0000xxxx0xx1xxxx", N::Teq,        S::A32AluRsReg),
    ("<<<<0111111111111101111011111110", N::Trap,       S::A32Exception),
    ("<<<<00110001xxxx0000xxxxxxxxxxxx", N::Tst,        S::A32AluImm),
    ("<<<<00010001xxxx0000xxxxxxx0xxxx", N::Tst,        S::A32AluRsImm),
    ("<<<<00010001xxxx0000xxxx0xx1xxxx", N::Tst,        S::A32AluRsReg),
    ("<<<<0111111xxxxxxxxxxxxxx101xxxx", N::Ubfx,       S::A32AluBf),
    ("<<<<01110011xxxx1111xxxx0001xxxx", N::Udiv,       S::A32AluMla),
    ("<<<<0000101xxxxxxxxxxxxx1001xxxx", N::Umlal,      S::A32AluUmull),
    ("<<<<0000100xxxxxxxxxxxxx1001xxxx", N::Umull,      S::A32AluUmull),
    ("<<<<01101110xxxxxxxxxx000111xxxx", N::Uxtb,       S::A32AluUx),
    ("<<<<01101100xxxxxxxxxx000111xxxx", N::Uxtb16,     S::A32AluUx),
    ("<<<<01101111xxxxxxxxxx000111xxxx", N::Uxth,       S::A32AluUx),
];

// The upper halfword is ignored: Thumb words are looked up as `raw & 0xFFFF`.
#[rustfmt::skip]
const T16_ENCODINGS: &[(&str, InstName, Shape)] = &[
    ("xxxxxxxxxxxxxxxx00000xxxxxxxxxxx", N::Lsl,        S::T16ShiftImm),
    ("xxxxxxxxxxxxxxxx00001xxxxxxxxxxx", N::Lsr,        S::T16ShiftImm),
    ("xxxxxxxxxxxxxxxx00010xxxxxxxxxxx", N::Asr,        S::T16ShiftImm),
    ("xxxxxxxxxxxxxxxx0001100xxxxxxxxx", N::Add,        S::T16AddSubReg),
    ("xxxxxxxxxxxxxxxx0001101xxxxxxxxx", N::Sub,        S::T16AddSubReg),
    ("xxxxxxxxxxxxxxxx0001110xxxxxxxxx", N::Add,        S::T16AddSubImm3),
    ("xxxxxxxxxxxxxxxx0001111xxxxxxxxx", N::Sub,        S::T16AddSubImm3),
    ("xxxxxxxxxxxxxxxx00100xxxxxxxxxxx", N::Mov,        S::T16AluImm8),
    ("xxxxxxxxxxxxxxxx00101xxxxxxxxxxx", N::Cmp,        S::T16AluImm8),
    ("xxxxxxxxxxxxxxxx00110xxxxxxxxxxx", N::Add,        S::T16AluImm8),
    ("xxxxxxxxxxxxxxxx00111xxxxxxxxxxx", N::Sub,        S::T16AluImm8),
    ("xxxxxxxxxxxxxxxx0100000000xxxxxx", N::And,        S::T16AluReg),
    ("xxxxxxxxxxxxxxxx0100000001xxxxxx", N::Eor,        S::T16AluReg),
    ("xxxxxxxxxxxxxxxx0100000010xxxxxx", N::Lsl,        S::T16AluReg),
    ("xxxxxxxxxxxxxxxx0100000011xxxxxx", N::Lsr,        S::T16AluReg),
    ("xxxxxxxxxxxxxxxx0100000100xxxxxx", N::Asr,        S::T16AluReg),
    ("xxxxxxxxxxxxxxxx0100000101xxxxxx", N::Adc,        S::T16AluReg),
    ("xxxxxxxxxxxxxxxx0100000110xxxxxx", N::Sbc,        S::T16AluReg),
    ("xxxxxxxxxxxxxxxx0100000111xxxxxx", N::Ror,        S::T16AluReg),
    ("xxxxxxxxxxxxxxxx0100001000xxxxxx", N::Tst,        S::T16AluReg),
    ("xxxxxxxxxxxxxxxx0100001001xxxxxx", N::Rsb,        S::T16AluReg),
    ("xxxxxxxxxxxxxxxx0100001010xxxxxx", N::Cmp,        S::T16AluReg),
    ("xxxxxxxxxxxxxxxx0100001011xxxxxx", N::Cmn,        S::T16AluReg),
    ("xxxxxxxxxxxxxxxx0100001100xxxxxx", N::Orr,        S::T16AluReg),
    ("xxxxxxxxxxxxxxxx0100001101xxxxxx", N::Mul,        S::T16AluReg),
    ("xxxxxxxxxxxxxxxx0100001110xxxxxx", N::Bic,        S::T16AluReg),
    ("xxxxxxxxxxxxxxxx0100001111xxxxxx", N::Mvn,        S::T16AluReg),
    ("xxxxxxxxxxxxxxxx01000100xxxxxxxx", N::Add,        S::T16AluRegHigh),
    ("xxxxxxxxxxxxxxxx01000110xxxxxxxx", N::Mov,        S::T16AluRegHigh),
    ("xxxxxxxxxxxxxxxx010001110xxxx000", N::Bx,         S::T16BReg),
    ("xxxxxxxxxxxxxxxx010001111xxxx000", N::Blx,        S::T16BReg),
    ("xxxxxxxxxxxxxxxx01001xxxxxxxxxxx", N::Ldr,        S::T16LdrLit),
    ("xxxxxxxxxxxxxxxx0101000xxxxxxxxx", N::Str,        S::T16MemReg),
    ("xxxxxxxxxxxxxxxx0101001xxxxxxxxx", N::Strh,       S::T16MemReg),
    ("xxxxxxxxxxxxxxxx0101010xxxxxxxxx", N::Strb,       S::T16MemReg),
    ("xxxxxxxxxxxxxxxx0101011xxxxxxxxx", N::Ldrsb,      S::T16MemReg),
    ("xxxxxxxxxxxxxxxx0101100xxxxxxxxx", N::Ldr,        S::T16MemReg),
    ("xxxxxxxxxxxxxxxx0101101xxxxxxxxx", N::Ldrh,       S::T16MemReg),
    ("xxxxxxxxxxxxxxxx0101110xxxxxxxxx", N::Ldrb,       S::T16MemReg),
    ("xxxxxxxxxxxxxxxx0101111xxxxxxxxx", N::Ldrsh,      S::T16MemReg),
    ("xxxxxxxxxxxxxxxx01100xxxxxxxxxxx", N::Str,        S::T16MemImm),
    ("xxxxxxxxxxxxxxxx01101xxxxxxxxxxx", N::Ldr,        S::T16MemImm),
    ("xxxxxxxxxxxxxxxx01110xxxxxxxxxxx", N::Strb,       S::T16MemImm),
    ("xxxxxxxxxxxxxxxx01111xxxxxxxxxxx", N::Ldrb,       S::T16MemImm),
    ("xxxxxxxxxxxxxxxx10000xxxxxxxxxxx", N::Strh,       S::T16MemImm),
    ("xxxxxxxxxxxxxxxx10001xxxxxxxxxxx", N::Ldrh,       S::T16MemImm),
    ("xxxxxxxxxxxxxxxx10010xxxxxxxxxxx", N::Str,        S::T16MemSp),
    ("xxxxxxxxxxxxxxxx10011xxxxxxxxxxx", N::Ldr,        S::T16MemSp),
    ("xxxxxxxxxxxxxxxx10100xxxxxxxxxxx", N::Adr,        S::T16Adr),
    ("xxxxxxxxxxxxxxxx10101xxxxxxxxxxx", N::Add,        S::T16AddSpImm8),
    ("xxxxxxxxxxxxxxxx101100000xxxxxxx", N::Add,        S::T16AdjustSp),
    ("xxxxxxxxxxxxxxxx101100001xxxxxxx", N::Sub,        S::T16AdjustSp),
    ("xxxxxxxxxxxxxxxx1011010xxxxxxxxx", N::Push,       S::T16Push),
    ("xxxxxxxxxxxxxxxx1011110xxxxxxxxx", N::Pop,        S::T16Pop),
    ("xxxxxxxxxxxxxxxx10111110xxxxxxxx", N::Brk,        S::T16Exception),
    ("xxxxxxxxxxxxxxxx10111111xxxx0000", N::Hint,       S::T16Hint),
    ("xxxxxxxxxxxxxxxx11011111xxxxxxxx", N::Svc,        S::T16Exception),
    ("xxxxxxxxxxxxxxxx1101<<<<xxxxxxxx", N::B,          S::T16BCond),
    ("xxxxxxxxxxxxxxxx11100xxxxxxxxxxx", N::B,          S::T16B),
];

#[derive(Debug, Clone, Copy)]
struct Entry {
    mask: u32,
    value: u32,
    inst: InstDescriptor,
}

struct ModeTable {
    buckets: Vec<Box<[Entry]>>,
    len: usize,
}

impl ModeTable {
    fn build(encodings: &[(&str, InstName, Shape)]) -> Self {
        let mut all = Vec::new();
        for &(encoding, name, shape) in encodings {
            expand_encoding(encoding, InstDescriptor::new(name, shape), &mut all);
        }

        let mut temp: Vec<Vec<Entry>> = vec![Vec::new(); FAST_LOOKUP_SIZE];
        for entry in &all {
            let mask = fast_lookup_index(entry.mask);
            let value = fast_lookup_index(entry.value);
            for (index, bucket) in temp.iter_mut().enumerate() {
                if index & mask == value {
                    bucket.push(*entry);
                }
            }
        }

        Self {
            buckets: temp.into_iter().map(Vec::into_boxed_slice).collect(),
            len: all.len(),
        }
    }

    fn lookup(&self, raw: u32) -> InstDescriptor {
        self.buckets[fast_lookup_index(raw)]
            .iter()
            .find(|entry| raw & entry.mask == entry.value)
            .map(|entry| entry.inst)
            .unwrap_or(InstDescriptor::UNDEFINED)
    }
}

#[inline]
fn fast_lookup_index(value: u32) -> usize {
    (((value >> 10) & 0x00F) | ((value >> 18) & 0xFF0)) as usize
}

fn expand_encoding(encoding: &str, inst: InstDescriptor, out: &mut Vec<Entry>) {
    debug_assert_eq!(encoding.len(), 32, "encoding {encoding} is not 32 bits wide");

    let mut value = 0u32;
    let mut x_mask = 0u32;
    let mut x_pos = Vec::new();
    let mut blacklisted = 0u32;

    for (index, chr) in encoding.bytes().enumerate() {
        let bit = 31 - index as u32;
        match chr {
            b'1' => value |= 1 << bit,
            b'0' => {}
            b'x' => x_mask |= 1 << bit,
            b'>' => x_pos.push(bit),
            b'<' => {
                x_pos.push(bit);
                blacklisted |= 1 << bit;
            }
            other => panic!(
                "invalid character {:?} in encoding {}",
                other as char, encoding
            ),
        }
    }

    let mask = !x_mask;

    if x_pos.is_empty() {
        out.push(Entry { mask, value, inst });
        return;
    }

    for combination in 0..(1u32 << x_pos.len()) {
        let bits = x_pos
            .iter()
            .enumerate()
            .fold(0u32, |acc, (i, &pos)| acc | (((combination >> i) & 1) << pos));

        if bits != blacklisted {
            out.push(Entry {
                mask,
                value: value | bits,
                inst,
            });
        }
    }
}

/// The built-in table covering the base A64, A32 and T16 sets plus the A64
/// FP/SIMD moves, immediates and shifts by immediate.
pub struct OpCodeTable {
    a64: ModeTable,
    a32: ModeTable,
    t16: ModeTable,
}

impl OpCodeTable {
    fn build() -> Self {
        let table = Self {
            a64: ModeTable::build(A64_ENCODINGS),
            a32: ModeTable::build(A32_ENCODINGS),
            t16: ModeTable::build(T16_ENCODINGS),
        };
        tracing::debug!(
            "Built opcode table: {} A64, {} A32, {} T16 patterns",
            table.a64.len,
            table.a32.len,
            table.t16.len
        );
        table
    }

    /// Shared instance, built on first use.
    pub fn global() -> &'static OpCodeTable {
        static TABLE: OnceLock<OpCodeTable> = OnceLock::new();
        TABLE.get_or_init(OpCodeTable::build)
    }

    fn for_mode(&self, mode: ExecutionMode) -> &ModeTable {
        match mode {
            ExecutionMode::Aarch64 => &self.a64,
            ExecutionMode::Aarch32Arm => &self.a32,
            ExecutionMode::Aarch32Thumb => &self.t16,
        }
    }
}

impl PatternTable for OpCodeTable {
    fn lookup(&self, raw: u32, mode: ExecutionMode) -> InstDescriptor {
        self.for_mode(mode).lookup(raw)
    }
}
