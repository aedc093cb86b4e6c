// Armature - Guest CPU Front End
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::decoder::Instruction;
use crate::{DecodeError, DecodeResult};

/// Index of a block in the slice returned by the decoder.
pub type BlockId = usize;

/// A run of instructions with one entry and one exit.
///
/// `next` is the fall-through successor and `branch` the taken target of the
/// terminal instruction. Either may point back at the block itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub address: u64,
    pub end_address: u64,
    pub next: Option<BlockId>,
    pub branch: Option<BlockId>,
    pub instructions: Vec<Instruction>,
}

impl Block {
    pub fn new(address: u64) -> Self {
        Self {
            address,
            end_address: address,
            next: None,
            branch: None,
            instructions: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.address && address < self.end_address
    }

    /// Terminal instruction.
    pub fn last(&self) -> Option<&Instruction> {
        self.instructions.last()
    }

    pub fn push(&mut self, inst: Instruction) {
        self.end_address = inst.next_address();
        self.instructions.push(inst);
    }

    /// Whether an instruction of this block starts exactly at `address`.
    pub fn starts_instruction(&self, address: u64) -> bool {
        self.instructions
            .binary_search_by_key(&address, |inst| inst.address)
            .is_ok()
    }

    /// Moves every instruction starting at or after `at` into a new block.
    ///
    /// The returned block begins at its first instruction and inherits this
    /// block's end and both edges; this block then ends where it begins and
    /// falls through to `right_id`. Fails if either half would be empty.
    pub fn split(&mut self, at: u64, right_id: BlockId) -> DecodeResult<Block> {
        let index = self.instructions.partition_point(|inst| inst.address < at);

        let Some(start) = self.instructions.get(index).map(|inst| inst.address) else {
            return Err(self.invalid_split(at));
        };
        if index == 0 {
            return Err(self.invalid_split(at));
        }

        let right = Block {
            address: start,
            end_address: self.end_address,
            next: self.next,
            branch: self.branch,
            instructions: self.instructions.split_off(index),
        };

        self.end_address = start;
        self.next = Some(right_id);
        self.branch = None;

        Ok(right)
    }

    fn invalid_split(&self, at: u64) -> DecodeError {
        DecodeError::InvalidSplit {
            block: self.address,
            end: self.end_address,
            at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::OpCodeTable;
    use crate::ExecutionMode;

    // NOP x3 then B back to the second NOP
    fn loop_block() -> Block {
        let words = [0xD503_201F, 0xD503_201F, 0xD503_201F, 0x17FF_FFFE];
        let mut block = Block::new(0x1000);
        for (i, &word) in words.iter().enumerate() {
            let address = 0x1000 + 4 * i as u64;
            block.push(Instruction::decode(
                address,
                word,
                ExecutionMode::Aarch64,
                OpCodeTable::global(),
            ));
        }
        block.branch = Some(7);
        block.next = Some(8);
        block
    }

    #[test]
    fn test_push_tracks_end_address() {
        let block = loop_block();
        assert_eq!(block.len(), 4);
        assert_eq!(block.end_address, 0x1010);
        assert!(block.contains(0x100C));
        assert!(!block.contains(0x1010));
    }

    #[test]
    fn test_split_moves_suffix_and_edges() {
        let mut left = loop_block();
        let original = left.clone();

        let right = left.split(0x1008, 3).unwrap();

        assert_eq!(left.address, 0x1000);
        assert_eq!(left.end_address, 0x1008);
        assert_eq!(left.len(), 2);
        assert_eq!(left.next, Some(3));
        assert_eq!(left.branch, None);

        assert_eq!(right.address, 0x1008);
        assert_eq!(right.end_address, 0x1010);
        assert_eq!(right.len(), 2);
        assert_eq!(right.next, Some(8));
        assert_eq!(right.branch, Some(7));

        // Concatenation restores the original sequence
        let mut joined = left.instructions.clone();
        joined.extend(right.instructions.iter().cloned());
        assert_eq!(joined, original.instructions);
    }

    #[test]
    fn test_split_rounds_up_to_next_instruction() {
        let mut left = loop_block();
        assert!(!left.starts_instruction(0x1006));

        let right = left.split(0x1006, 3).unwrap();

        assert_eq!(right.address, 0x1008);
        assert_eq!(right.len(), 2);
        assert_eq!(left.end_address, 0x1008);
        assert_eq!(left.len(), 2);
        assert!(right.starts_instruction(0x1008));
    }

    #[test]
    fn test_split_rejects_empty_halves() {
        let mut block = loop_block();

        // Block start, before it, the end, a gap that rounds to the end, beyond
        for at in [0x1000, 0x0FFC, 0x1010, 0x100E, 0x2000] {
            assert!(matches!(
                block.split(at, 1),
                Err(DecodeError::InvalidSplit { block: 0x1000, end: 0x1010, .. })
            ));
        }
        // Nothing moved
        assert_eq!(block.len(), 4);
        assert_eq!(block.next, Some(8));
    }
}
