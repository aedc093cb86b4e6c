// Armature - Guest CPU Front End
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cfg::Block;
use crate::decoder::{Instruction, RegisterWidth};
use crate::ExecutionMode;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DecodeStrategy {
    Block,
    Function,
}

/// Serializable summary of one decode call.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CfgReport {
    pub entry: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    pub mode: ExecutionMode,
    pub strategy: DecodeStrategy,
    pub blocks: Vec<BlockReport>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BlockReport {
    pub address: u64,
    pub end_address: u64,
    /// Start address of the fall-through successor.
    pub next: Option<u64>,
    /// Start address of the taken-branch successor.
    pub branch: Option<u64>,
    pub instructions: Vec<InstructionReport>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct InstructionReport {
    pub address: u64,
    pub raw: u32,
    pub size: u8,
    pub name: String,
    pub width: RegisterWidth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u64>,
    pub operands: serde_json::Value,
}

impl CfgReport {
    pub fn new(
        entry: u64,
        mode: ExecutionMode,
        strategy: DecodeStrategy,
        blocks: &[Block],
    ) -> Self {
        let start_of = |id: Option<usize>| id.and_then(|id| blocks.get(id)).map(|b| b.address);

        let blocks = blocks
            .iter()
            .map(|block| BlockReport {
                address: block.address,
                end_address: block.end_address,
                next: start_of(block.next),
                branch: start_of(block.branch),
                instructions: block.instructions.iter().map(InstructionReport::from).collect(),
            })
            .collect();

        Self {
            entry,
            symbol: None,
            mode,
            strategy,
            blocks,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.instructions.len()).sum()
    }

    pub fn undefined_count(&self) -> usize {
        self.blocks
            .iter()
            .flat_map(|b| &b.instructions)
            .filter(|i| i.name == "Und")
            .count()
    }
}

impl From<&Instruction> for InstructionReport {
    fn from(inst: &Instruction) -> Self {
        Self {
            address: inst.address,
            raw: inst.raw,
            size: inst.size,
            name: inst.name.to_string(),
            width: inst.width,
            target: inst.branch_target(),
            operands: serde_json::to_value(inst.operands).unwrap_or(serde_json::Value::Null),
        }
    }
}

impl fmt::Display for CfgReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.symbol {
            Some(symbol) => writeln!(f, "{} @ {:#x} ({}, {:?})", symbol, self.entry, self.mode, self.strategy)?,
            None => writeln!(f, "{:#x} ({}, {:?})", self.entry, self.mode, self.strategy)?,
        }

        for block in &self.blocks {
            write!(f, "block {:#x}..{:#x}", block.address, block.end_address)?;
            if let Some(next) = block.next {
                write!(f, " next={:#x}", next)?;
            }
            if let Some(branch) = block.branch {
                write!(f, " branch={:#x}", branch)?;
            }
            writeln!(f)?;

            for inst in &block.instructions {
                match inst.size {
                    2 => write!(f, "  {:#010x}: {:04x}     {}", inst.address, inst.raw, inst.name)?,
                    _ => write!(f, "  {:#010x}: {:08x} {}", inst.address, inst.raw, inst.name)?,
                }
                if let Some(target) = inst.target {
                    write!(f, " -> {:#x}", target)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::LinearMemory;

    fn loop_report() -> CfgReport {
        // NOP; CBNZ X0, -4; RET
        let mem = LinearMemory::from_words(0x1000, &[0xD503_201F, 0xB5FF_FFE0, 0xD65F_03C0]);
        let blocks = crate::decode_function(&mem, 0x1000, ExecutionMode::Aarch64).unwrap();
        CfgReport::new(0x1000, ExecutionMode::Aarch64, DecodeStrategy::Function, &blocks)
    }

    #[test]
    fn test_edges_become_addresses() {
        let report = loop_report();

        // The loop body branches back to its own start
        assert_eq!(report.blocks.len(), 2);
        assert_eq!(report.blocks[0].branch, Some(0x1000));
        assert_eq!(report.blocks[0].next, Some(0x1008));
        assert_eq!(report.blocks[1].next, None);
        assert_eq!(report.instruction_count(), 3);
        assert_eq!(report.undefined_count(), 0);
    }

    #[test]
    fn test_json_shape() {
        let report = loop_report().with_symbol("spin");
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["symbol"], "spin");
        assert_eq!(json["mode"], "aarch64");
        assert_eq!(json["strategy"], "function");
        assert_eq!(json["blocks"][0]["instructions"][1]["name"], "Cbnz");
        assert_eq!(json["blocks"][0]["instructions"][1]["target"], 0x1000);
        assert!(json["blocks"][0]["instructions"][1]["operands"]["BImmCmp"].is_object());

        let back: CfgReport = serde_json::from_value(json).unwrap();
        assert_eq!(back.blocks.len(), 2);
    }

    #[test]
    fn test_text_listing() {
        let text = loop_report().to_string();
        assert!(text.starts_with("0x1000 (a64, Function)\n"));
        assert!(text.contains("block 0x1000..0x1008 next=0x1008 branch=0x1000\n"));
        assert!(text.contains("  0x00001004: b5ffffe0 Cbnz -> 0x1000\n"));
    }
}
