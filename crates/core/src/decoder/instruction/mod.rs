// Armature - Guest CPU Front End
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

mod a32;
mod a64;
mod t16;

use serde::{Deserialize, Serialize};

use super::table::{InstName, PatternTable, Shape};
use crate::decoder::fields::FloatSize;
use crate::ExecutionMode;

/// Marker returned by operand constructors when a field combination is
/// reserved. The instruction as a whole then becomes `Und`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Undefined;

type Built = Result<Operands, Undefined>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegisterWidth {
    Int32,
    Int64,
    Simd64,
    Simd128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Eq,
    Ne,
    Cs,
    Cc,
    Mi,
    Pl,
    Vs,
    Vc,
    Hi,
    Ls,
    Ge,
    Lt,
    Gt,
    Le,
    Al,
    Nv,
}

impl Condition {
    /// Decodes the low four bits of `bits`.
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0xf {
            0x0 => Condition::Eq,
            0x1 => Condition::Ne,
            0x2 => Condition::Cs,
            0x3 => Condition::Cc,
            0x4 => Condition::Mi,
            0x5 => Condition::Pl,
            0x6 => Condition::Vs,
            0x7 => Condition::Vc,
            0x8 => Condition::Hi,
            0x9 => Condition::Ls,
            0xA => Condition::Ge,
            0xB => Condition::Lt,
            0xC => Condition::Gt,
            0xD => Condition::Le,
            0xE => Condition::Al,
            _ => Condition::Nv,
        }
    }

    /// `AL` or `NV`: executes unconditionally.
    pub fn is_always(self) -> bool {
        matches!(self, Condition::Al | Condition::Nv)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftType {
    Lsl,
    Lsr,
    Asr,
    Ror,
}

impl ShiftType {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => ShiftType::Lsl,
            1 => ShiftType::Lsr,
            2 => ShiftType::Asr,
            _ => ShiftType::Ror,
        }
    }
}

/// Register extension applied by extended-register ALU and memory forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtendType {
    Uxtb,
    Uxth,
    Uxtw,
    Uxtx,
    Sxtb,
    Sxth,
    Sxtw,
    Sxtx,
}

impl ExtendType {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 7 {
            0 => ExtendType::Uxtb,
            1 => ExtendType::Uxth,
            2 => ExtendType::Uxtw,
            3 => ExtendType::Uxtx,
            4 => ExtendType::Sxtb,
            5 => ExtendType::Sxth,
            6 => ExtendType::Sxtw,
            _ => ExtendType::Sxtx,
        }
    }
}

/// A64 data-processing class, bits 24..26 of the word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataOp {
    Adr,
    Arithmetic,
    Logical,
    BitField,
}

impl DataOp {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => DataOp::Adr,
            1 => DataOp::Arithmetic,
            2 => DataOp::Logical,
            _ => DataOp::BitField,
        }
    }
}

/// Offset operand of an AArch32 single-register load/store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemOffset {
    Imm(u32),
    Reg { rm: u8 },
    ShiftedReg { rm: u8, imm: u8, shift_type: ShiftType },
}

/// Base-register view of an AArch32 load/store, used by branch detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemAccess {
    pub rt: u8,
    pub rn: u8,
    pub load: bool,
    pub wback: bool,
}

/// Fields extracted for each operand shape.
///
/// Thumb branches, memory transfers and `SVC` reuse the AArch32 variants
/// with an `AL` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operands {
    Undefined,

    // AArch64
    Adr { rd: u8, imm: i64 },
    Alu { rd: u8, rn: u8, data_op: DataOp },
    AluBinary { rd: u8, rn: u8, rm: u8 },
    AluImm { rd: u8, rn: u8, imm: u64, data_op: DataOp },
    AluRs { rd: u8, rn: u8, rm: u8, shift: u8, shift_type: ShiftType },
    AluRx { rd: u8, rn: u8, rm: u8, shift: u8, extend: ExtendType },
    Bfm { rd: u8, rn: u8, wmask: u64, tmask: u64, pos: u8, shift: u8 },
    BImm { target: u64 },
    BImmCond { target: u64, cond: Condition },
    BImmCmp { rt: u8, target: u64 },
    BImmTest { rt: u8, target: u64, bit: u8 },
    BReg { rn: u8 },
    CcmpImm { rn: u8, imm: u8, nzcv: u8, cond: Condition },
    CcmpReg { rn: u8, rm: u8, nzcv: u8, cond: Condition },
    Csel { rd: u8, rn: u8, rm: u8, cond: Condition },
    Exception { id: u32 },
    MemEx { rt: u8, rt2: u8, rn: u8, rs: u8, size: u8 },
    MemImm {
        rt: u8,
        rn: u8,
        size: u8,
        signed: bool,
        extend64: bool,
        imm: i64,
        wback: bool,
        post_idx: bool,
        unscaled: bool,
    },
    MemLit { rt: u8, target: u64, size: u8, signed: bool, prefetch: bool },
    MemPair {
        rt: u8,
        rt2: u8,
        rn: u8,
        size: u8,
        imm: i64,
        wback: bool,
        post_idx: bool,
        extend64: bool,
    },
    MemReg {
        rt: u8,
        rn: u8,
        rm: u8,
        size: u8,
        signed: bool,
        extend64: bool,
        shift: bool,
        extend: ExtendType,
    },
    Mov { rd: u8, imm: u64, shift: u8 },
    Mul { rd: u8, rn: u8, rm: u8, ra: u8 },
    Simd { rd: u8, rn: u8, size: u8 },
    SimdFmov { rd: u8, imm: u64, size: FloatSize },
    SimdImm { rd: u8, imm: u64, size: u8 },
    SimdIns { rd: u8, rn: u8, size: u8, src_index: u8, dst_index: u8 },
    SimdMemImm {
        rt: u8,
        rn: u8,
        size: u8,
        imm: i64,
        wback: bool,
        post_idx: bool,
        unscaled: bool,
    },
    SimdMemLit { rt: u8, target: u64, size: u8 },
    SimdReg { rd: u8, rn: u8, rm: u8, size: u8 },
    /// `shift` is the decoded amount; its direction comes from the name.
    SimdShImm { rd: u8, rn: u8, size: u8, shift: u8 },
    System { rt: u8, op0: u8, op1: u8, crn: u8, crm: u8, op2: u8 },

    // AArch32
    A32Plain { cond: Condition },
    A32AluBf { cond: Condition, rd: u8, rn: u8, msb: u8, lsb: u8 },
    A32AluImm { cond: Condition, rd: u8, rn: u8, set_flags: bool, imm: u32 },
    A32AluImm16 { cond: Condition, rd: u8, imm: u16 },
    A32AluMla {
        cond: Condition,
        rd: u8,
        rn: u8,
        rm: u8,
        ra: u8,
        set_flags: bool,
        n_high: bool,
        m_high: bool,
        round: bool,
    },
    A32AluReg { cond: Condition, rd: u8, rn: u8, rm: u8 },
    A32AluRsImm {
        cond: Condition,
        rd: u8,
        rn: u8,
        set_flags: bool,
        rm: u8,
        imm: u8,
        shift_type: ShiftType,
    },
    A32AluRsReg {
        cond: Condition,
        rd: u8,
        rn: u8,
        set_flags: bool,
        rm: u8,
        rs: u8,
        shift_type: ShiftType,
    },
    A32AluUmull {
        cond: Condition,
        rd_lo: u8,
        rd_hi: u8,
        rn: u8,
        rm: u8,
        set_flags: bool,
        n_high: bool,
        m_high: bool,
    },
    A32AluUx { cond: Condition, rd: u8, rn: u8, rm: u8, rotate: u8, add: bool },
    A32BImm { cond: Condition, target: u64 },
    A32BReg { cond: Condition, rm: u8 },
    A32Exception { cond: Condition, id: u32 },
    A32Mem {
        cond: Condition,
        rt: u8,
        rn: u8,
        load: bool,
        index: bool,
        add: bool,
        wback: bool,
        unprivileged: bool,
        offset: MemOffset,
    },
    A32MemLdEx { cond: Condition, rt: u8, rn: u8, wback: bool },
    A32MemMult {
        cond: Condition,
        rn: u8,
        register_mask: u16,
        offset: i32,
        post_offset: i32,
        load: bool,
    },
    A32MemStEx { cond: Condition, rd: u8, rt: u8, rn: u8, wback: bool },
    A32Mrs { cond: Condition, rd: u8, spsr: bool },
    A32MsrImm { cond: Condition, spsr: bool, mask: u8, imm: u32 },
    A32MsrReg { cond: Condition, spsr: bool, mask: u8, rn: u8 },
    A32System { cond: Condition, opc1: u8, crn: u8, rt: u8, coproc: u8, opc2: u8, crm: u8 },

    // Thumb (16-bit) data processing
    T16AddSub { rd: u8, rn: u8, rm: u8 },
    T16AddSubImm3 { rd: u8, rn: u8, imm: u8 },
    T16AluImm8 { rd: u8, imm: u8 },
    T16AluReg { rd: u8, rm: u8 },
    T16ShiftImm { rd: u8, rm: u8, imm: u8 },
}

/// One decoded guest instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub address: u64,
    pub raw: u32,
    pub size: u8,
    pub width: RegisterWidth,
    pub name: InstName,
    pub operands: Operands,
}

impl Instruction {
    /// Decodes the word fetched at `address`. Never fails: reserved or
    /// unknown encodings produce an `Und` instruction.
    ///
    /// In Thumb mode only the low halfword of `word` is used.
    pub fn decode(address: u64, word: u32, mode: ExecutionMode, table: &dyn PatternTable) -> Self {
        let raw = match mode {
            ExecutionMode::Aarch32Thumb => word & 0xFFFF,
            _ => word,
        };

        let inst = table.lookup(raw, mode);
        match build(inst.shape, inst.name, raw, address) {
            Ok(operands) => Self {
                address,
                raw,
                size: mode.instruction_size(),
                width: register_width(mode, raw, &operands),
                name: inst.name,
                operands,
            },
            Err(Undefined) => Self::undefined(address, raw, mode),
        }
    }

    pub fn undefined(address: u64, raw: u32, mode: ExecutionMode) -> Self {
        Self {
            address,
            raw,
            size: mode.instruction_size(),
            width: if mode.is_aarch32() {
                RegisterWidth::Int32
            } else {
                RegisterWidth::Int64
            },
            name: InstName::Und,
            operands: Operands::Undefined,
        }
    }

    pub fn is_undefined(&self) -> bool {
        self.name == InstName::Und
    }

    pub fn next_address(&self) -> u64 {
        self.address.wrapping_add(self.size as u64)
    }

    /// Absolute target of a direct (immediate) branch.
    pub fn branch_target(&self) -> Option<u64> {
        match self.operands {
            Operands::BImm { target }
            | Operands::BImmCond { target, .. }
            | Operands::BImmCmp { target, .. }
            | Operands::BImmTest { target, .. }
            | Operands::A32BImm { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Execution condition; `AL` for instructions without one.
    pub fn condition(&self) -> Condition {
        match self.operands {
            Operands::BImmCond { cond, .. }
            | Operands::A32Plain { cond }
            | Operands::A32AluBf { cond, .. }
            | Operands::A32AluImm { cond, .. }
            | Operands::A32AluImm16 { cond, .. }
            | Operands::A32AluMla { cond, .. }
            | Operands::A32AluReg { cond, .. }
            | Operands::A32AluRsImm { cond, .. }
            | Operands::A32AluRsReg { cond, .. }
            | Operands::A32AluUmull { cond, .. }
            | Operands::A32AluUx { cond, .. }
            | Operands::A32BImm { cond, .. }
            | Operands::A32BReg { cond, .. }
            | Operands::A32Exception { cond, .. }
            | Operands::A32Mem { cond, .. }
            | Operands::A32MemLdEx { cond, .. }
            | Operands::A32MemMult { cond, .. }
            | Operands::A32MemStEx { cond, .. }
            | Operands::A32Mrs { cond, .. }
            | Operands::A32MsrImm { cond, .. }
            | Operands::A32MsrReg { cond, .. }
            | Operands::A32System { cond, .. } => cond,
            _ => Condition::Al,
        }
    }

    /// Destination register of an AArch32 data-processing instruction.
    pub fn a32_alu_rd(&self) -> Option<u8> {
        match self.operands {
            Operands::A32AluBf { rd, .. }
            | Operands::A32AluImm { rd, .. }
            | Operands::A32AluImm16 { rd, .. }
            | Operands::A32AluMla { rd, .. }
            | Operands::A32AluReg { rd, .. }
            | Operands::A32AluRsImm { rd, .. }
            | Operands::A32AluRsReg { rd, .. }
            | Operands::A32AluUx { rd, .. }
            | Operands::A32Mrs { rd, .. }
            | Operands::T16AddSub { rd, .. }
            | Operands::T16AddSubImm3 { rd, .. }
            | Operands::T16AluImm8 { rd, .. }
            | Operands::T16AluReg { rd, .. }
            | Operands::T16ShiftImm { rd, .. } => Some(rd),
            _ => None,
        }
    }

    /// Transfer and base registers of an AArch32 single-register load/store.
    pub fn a32_mem_access(&self) -> Option<MemAccess> {
        match self.operands {
            Operands::A32Mem {
                rt, rn, load, wback, ..
            } => Some(MemAccess {
                rt,
                rn,
                load,
                wback,
            }),
            Operands::A32MemLdEx { rt, rn, wback, .. } => Some(MemAccess {
                rt,
                rn,
                load: true,
                wback,
            }),
            Operands::A32MemStEx { rt, rn, wback, .. } => Some(MemAccess {
                rt,
                rn,
                load: false,
                wback,
            }),
            _ => None,
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.size {
            2 => write!(f, "{:#010x}: {:04x}     {}", self.address, self.raw, self.name)?,
            _ => write!(f, "{:#010x}: {:08x} {}", self.address, self.raw, self.name)?,
        }
        if let Some(target) = self.branch_target() {
            write!(f, " -> {:#x}", target)?;
        }
        Ok(())
    }
}

fn build(shape: Shape, name: InstName, raw: u32, address: u64) -> Built {
    match shape {
        Shape::Undefined => Err(Undefined),

        Shape::Adr => a64::adr(raw),
        Shape::Alu => a64::alu(raw),
        Shape::AluBinary => a64::alu_binary(raw),
        Shape::AluImm => a64::alu_imm(raw),
        Shape::AluRs => a64::alu_rs(raw),
        Shape::AluRx => a64::alu_rx(raw),
        Shape::Bfm => a64::bfm(raw),
        Shape::BImmAl => a64::b_imm_al(raw, address),
        Shape::BImmCmp => a64::b_imm_cmp(raw, address),
        Shape::BImmCond => a64::b_imm_cond(raw, address),
        Shape::BImmTest => a64::b_imm_test(raw, address),
        Shape::BReg => a64::b_reg(raw),
        Shape::CcmpImm => a64::ccmp_imm(raw),
        Shape::CcmpReg => a64::ccmp_reg(raw),
        Shape::Csel => a64::csel(raw),
        Shape::Exception => a64::exception(raw),
        Shape::MemEx => a64::mem_ex(raw),
        Shape::MemImm => a64::mem_imm(raw),
        Shape::MemLit => a64::mem_lit(raw, address),
        Shape::MemPair => a64::mem_pair(raw),
        Shape::MemReg => a64::mem_reg(raw),
        Shape::Mov => a64::mov(raw),
        Shape::Mul => a64::mul(raw),
        Shape::Simd => a64::simd(raw),
        Shape::SimdFmov => a64::simd_fmov(raw),
        Shape::SimdImm => a64::simd_imm(raw),
        Shape::SimdIns => a64::simd_ins(raw),
        Shape::SimdMemImm => a64::simd_mem_imm(raw),
        Shape::SimdMemLit => a64::simd_mem_lit(raw, address),
        Shape::SimdReg => a64::simd_reg(raw),
        Shape::SimdShImm => a64::simd_sh_imm(raw, name),
        Shape::System => a64::system(raw),

        Shape::A32Plain => a32::plain(raw),
        Shape::A32AluBf => a32::alu_bf(raw),
        Shape::A32AluImm => a32::alu_imm(raw),
        Shape::A32AluImm16 => a32::alu_imm16(raw),
        Shape::A32AluMla => a32::alu_mla(raw),
        Shape::A32AluReg => a32::alu_reg(raw),
        Shape::A32AluRsImm => a32::alu_rs_imm(raw),
        Shape::A32AluRsReg => a32::alu_rs_reg(raw),
        Shape::A32AluUmull => a32::alu_umull(raw),
        Shape::A32AluUx => a32::alu_ux(raw),
        Shape::A32BImm => a32::b_imm(raw, address),
        Shape::A32BReg => a32::b_reg(raw),
        Shape::A32Exception => a32::exception(raw),
        Shape::A32MemImm => a32::mem_imm(raw, name),
        Shape::A32MemImm8 => a32::mem_imm8(raw, name),
        Shape::A32MemLdEx => a32::mem_ld_ex(raw),
        Shape::A32MemMult => a32::mem_mult(raw),
        Shape::A32MemReg => a32::mem_reg(raw, name),
        Shape::A32MemRsImm => a32::mem_rs_imm(raw, name),
        Shape::A32MemStEx => a32::mem_st_ex(raw),
        Shape::A32Mrs => a32::mrs(raw),
        Shape::A32MsrImm => a32::msr_imm(raw),
        Shape::A32MsrReg => a32::msr_reg(raw),
        Shape::A32System => a32::system(raw),

        Shape::T16AddSpImm8 => t16::add_sp_imm8(raw),
        Shape::T16AddSubImm3 => t16::add_sub_imm3(raw),
        Shape::T16AddSubReg => t16::add_sub_reg(raw),
        Shape::T16AdjustSp => t16::adjust_sp(raw),
        Shape::T16Adr => t16::adr(raw),
        Shape::T16AluImm8 => t16::alu_imm8(raw),
        Shape::T16AluReg => t16::alu_reg(raw),
        Shape::T16AluRegHigh => t16::alu_reg_high(raw),
        Shape::T16B => t16::b(raw, address),
        Shape::T16BCond => t16::b_cond(raw, address),
        Shape::T16BReg => t16::b_reg(raw),
        Shape::T16Exception => t16::exception(raw),
        Shape::T16Hint => t16::hint(),
        Shape::T16LdrLit => t16::ldr_lit(raw),
        Shape::T16MemImm => t16::mem_imm(raw, name),
        Shape::T16MemReg => t16::mem_reg(raw, name),
        Shape::T16MemSp => t16::mem_sp(raw, name),
        Shape::T16Pop => t16::pop(raw),
        Shape::T16Push => t16::push(raw),
        Shape::T16ShiftImm => t16::shift_imm(raw),
    }
}

fn register_width(mode: ExecutionMode, raw: u32, operands: &Operands) -> RegisterWidth {
    if mode.is_aarch32() {
        return RegisterWidth::Int32;
    }

    let sf = |raw: u32| {
        if raw >> 31 != 0 {
            RegisterWidth::Int64
        } else {
            RegisterWidth::Int32
        }
    };
    let q = |raw: u32| {
        if (raw >> 30) & 1 != 0 {
            RegisterWidth::Simd128
        } else {
            RegisterWidth::Simd64
        }
    };

    match operands {
        Operands::Alu { .. }
        | Operands::AluBinary { .. }
        | Operands::AluImm { .. }
        | Operands::AluRs { .. }
        | Operands::AluRx { .. }
        | Operands::Bfm { .. }
        | Operands::BImmCmp { .. }
        | Operands::CcmpImm { .. }
        | Operands::CcmpReg { .. }
        | Operands::Csel { .. }
        | Operands::Mov { .. }
        | Operands::Mul { .. } => sf(raw),
        Operands::Simd { .. }
        | Operands::SimdImm { .. }
        | Operands::SimdIns { .. }
        | Operands::SimdReg { .. }
        | Operands::SimdShImm { .. } => q(raw),
        Operands::SimdFmov { .. } => RegisterWidth::Simd64,
        Operands::SimdMemImm { size, .. } | Operands::SimdMemLit { size, .. } => {
            if *size == 4 {
                RegisterWidth::Simd128
            } else {
                RegisterWidth::Simd64
            }
        }
        _ => RegisterWidth::Int64,
    }
}
