// Armature - Guest CPU Front End
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod bits;
pub mod cfg;
pub mod decoder;
pub mod memory;
pub mod metrics;
pub mod report;

pub use cfg::{decode_basic_block, decode_function, Block, BlockId, Decoder};
pub use decoder::{InstName, Instruction, Operands, RegisterWidth};
pub use memory::{GuestMemory, MemoryFault};
pub use metrics::{DecodeMetrics, DecodeObserver};

/// Instruction set the guest is executing in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Aarch64,
    Aarch32Arm,
    Aarch32Thumb,
}

impl ExecutionMode {
    pub fn is_aarch32(self) -> bool {
        !matches!(self, ExecutionMode::Aarch64)
    }

    /// Bytes per instruction word.
    pub fn instruction_size(self) -> u8 {
        match self {
            ExecutionMode::Aarch32Thumb => 2,
            _ => 4,
        }
    }
}

impl From<armature_config::GuestMode> for ExecutionMode {
    fn from(mode: armature_config::GuestMode) -> Self {
        match mode {
            armature_config::GuestMode::A64 => ExecutionMode::Aarch64,
            armature_config::GuestMode::A32 => ExecutionMode::Aarch32Arm,
            armature_config::GuestMode::Thumb => ExecutionMode::Aarch32Thumb,
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Aarch64 => write!(f, "a64"),
            ExecutionMode::Aarch32Arm => write!(f, "a32"),
            ExecutionMode::Aarch32Thumb => write!(f, "thumb"),
        }
    }
}

/// Errors raised while building blocks.
///
/// Guest-controlled bit patterns never produce an error; they decode to
/// `Undefined`. Everything except `Memory` indicates a bug in the decoder or
/// in the pattern table.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Memory(#[from] MemoryFault),
    #[error("cannot split block {block:#x}..{end:#x} at {at:#x}: one side would be empty")]
    InvalidSplit { block: u64, end: u64, at: u64 },
    #[error("block at {0:#x} was discovered twice")]
    DuplicateBlock(u64),
    #[error("unsupported floating-point immediate size {0}")]
    UnsupportedFloatSize(u32),
}

pub type DecodeResult<T> = Result<T, DecodeError>;
