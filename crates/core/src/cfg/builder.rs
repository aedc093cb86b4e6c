// Armature - Guest CPU Front End
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use super::block::{Block, BlockId};
use super::classify::{is_branch, is_call, is_terminal, is_unconditional_branch};
use crate::decoder::{Instruction, OpCodeTable, PatternTable};
use crate::memory::GuestMemory;
use crate::metrics::DecodeObserver;
use crate::{DecodeError, DecodeResult, ExecutionMode};

/// Turns guest code into basic blocks.
///
/// A decoder is bound to one instruction set and one pattern table. It holds
/// no per-call state, so one instance can serve any number of decode calls.
pub struct Decoder<'a> {
    mode: ExecutionMode,
    table: &'a dyn PatternTable,
    observers: Vec<Arc<dyn DecodeObserver>>,
}

impl Decoder<'static> {
    /// Decoder backed by the built-in opcode table.
    pub fn new(mode: ExecutionMode) -> Self {
        Self::with_table(mode, OpCodeTable::global())
    }
}

impl<'a> Decoder<'a> {
    pub fn with_table(mode: ExecutionMode, table: &'a dyn PatternTable) -> Self {
        Self {
            mode,
            table,
            observers: Vec::new(),
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn add_observer(&mut self, observer: Arc<dyn DecodeObserver>) {
        self.observers.push(observer);
    }

    /// Fetches and decodes the instruction at `address`.
    pub fn decode_instruction<M: GuestMemory + ?Sized>(
        &self,
        memory: &M,
        address: u64,
    ) -> DecodeResult<Instruction> {
        let word = memory.read_u32(address)?;
        let inst = Instruction::decode(address, word, self.mode, self.table);

        tracing::trace!("{}", inst);
        for observer in &self.observers {
            observer.on_instruction(&inst);
        }
        Ok(inst)
    }

    /// Appends instructions to `block` from its start address until a branch
    /// or exception-raising instruction, or until the next instruction would
    /// not end at or before `limit_address`.
    pub fn fill_block<M: GuestMemory + ?Sized>(
        &self,
        memory: &M,
        block: &mut Block,
        limit_address: u64,
    ) -> DecodeResult<()> {
        let size = u64::from(self.mode.instruction_size());
        let mut address = block.address;
        block.end_address = address;

        while limit_address
            .checked_sub(address)
            .is_some_and(|room| room >= size)
        {
            let inst = self.decode_instruction(memory, address)?;
            address = inst.next_address();

            let terminal = is_terminal(&inst, self.mode);
            if inst.is_undefined() {
                tracing::warn!(
                    "Undefined {} encoding {:#x} at {:#x} ends block {:#x}",
                    self.mode,
                    inst.raw,
                    inst.address,
                    block.address
                );
            }
            block.push(inst);

            if terminal {
                break;
            }
        }

        tracing::debug!(
            "Block {:#x}..{:#x}: {} instructions",
            block.address,
            block.end_address,
            block.len()
        );
        for observer in &self.observers {
            observer.on_block(block);
        }
        Ok(())
    }

    /// Decodes the single block starting at `address`.
    ///
    /// Returns one block, or two when the terminal branch lands on an
    /// instruction inside the block. On top of the edges a split hands out,
    /// the second block gets a branch edge to itself, marking the loop.
    /// Targets that fall between two instructions get no edge.
    pub fn decode_basic_block<M: GuestMemory + ?Sized>(
        &self,
        memory: &M,
        address: u64,
    ) -> DecodeResult<Vec<Block>> {
        let mut block = Block::new(address);
        self.fill_block(memory, &mut block, u64::MAX)?;

        let target = block
            .last()
            .filter(|last| is_branch(last, self.mode) && !is_call(last, self.mode))
            .and_then(Instruction::branch_target);

        match target {
            Some(target) if target == address => {
                block.branch = Some(0);
                Ok(vec![block])
            }
            Some(target) if block.starts_instruction(target) => {
                let mut right = block.split(target, 1)?;
                right.branch = Some(1);
                self.notify_split(&block, &right);
                Ok(vec![block, right])
            }
            _ => Ok(vec![block]),
        }
    }

    /// Discovers every block reachable from `address` without following calls.
    ///
    /// The result is sorted by address and its ranges do not overlap; edges
    /// index into it.
    pub fn decode_function<M: GuestMemory + ?Sized>(
        &self,
        memory: &M,
        address: u64,
    ) -> DecodeResult<Vec<Block>> {
        let mut cfg = CfgBuilder::default();
        cfg.block_at(address);
        cfg.build(self, memory)?;

        let blocks = cfg.into_sorted();
        tracing::debug!(
            "Function {:#x}: {} blocks, {} instructions",
            address,
            blocks.len(),
            blocks.iter().map(Block::len).sum::<usize>()
        );
        Ok(blocks)
    }

    fn notify_split(&self, left: &Block, right: &Block) {
        tracing::debug!(
            "Split block {:#x} at {:#x}",
            left.address,
            right.address
        );
        for observer in &self.observers {
            observer.on_split(left, right);
        }
    }
}

/// Work state of a whole-function decode. Blocks live in `arena` and are
/// referenced by id; `order` holds the ids of placed blocks sorted by
/// address. Ids that never get placed are dropped with their edges.
#[derive(Default)]
struct CfgBuilder {
    arena: Vec<Block>,
    order: Vec<BlockId>,
    queue: VecDeque<BlockId>,
    visited: HashMap<u64, BlockId>,
}

impl CfgBuilder {
    /// Id of the block starting at `address`, queueing it on first request.
    fn block_at(&mut self, address: u64) -> BlockId {
        if let Some(&id) = self.visited.get(&address) {
            return id;
        }
        let id = self.arena.len();
        self.arena.push(Block::new(address));
        self.visited.insert(address, id);
        self.queue.push_back(id);
        id
    }

    /// Drains the queue, placing each block or splitting the one that
    /// already covers its address.
    fn build<M: GuestMemory + ?Sized>(
        &mut self,
        decoder: &Decoder<'_>,
        memory: &M,
    ) -> DecodeResult<()> {
        while let Some(id) = self.queue.pop_front() {
            let current = self.arena[id].address;

            let pos = self
                .order
                .partition_point(|&other| self.arena[other].address <= current);

            if let Some(prev) = pos.checked_sub(1).map(|p| self.order[p]) {
                let existing = &mut self.arena[prev];
                if existing.address == current {
                    return Err(DecodeError::DuplicateBlock(current));
                }
                if existing.contains(current) {
                    if !existing.starts_instruction(current) {
                        tracing::warn!(
                            "Target {:#x} falls between instructions of block {:#x}",
                            current,
                            existing.address
                        );
                        continue;
                    }
                    let right = existing.split(current, id)?;
                    self.arena[id] = right;
                    decoder.notify_split(&self.arena[prev], &self.arena[id]);
                    self.order.insert(pos, id);
                    continue;
                }
            }

            let limit = self
                .order
                .get(pos)
                .map_or(u64::MAX, |&next| self.arena[next].address);

            let mut block = Block::new(current);
            decoder.fill_block(memory, &mut block, limit)?;
            if block.is_empty() {
                tracing::warn!(
                    "No instruction fits between {:#x} and block {:#x}",
                    current,
                    limit
                );
                continue;
            }

            let terminal = block.last().map(|last| {
                (
                    is_call(last, decoder.mode),
                    last.branch_target(),
                    is_unconditional_branch(last, decoder.mode),
                )
            });

            if let Some((call, target, unconditional)) = terminal {
                if let Some(target) = target.filter(|_| !call) {
                    block.branch = Some(self.block_at(target));
                }
                if !unconditional || call {
                    block.next = Some(self.block_at(block.end_address));
                }
            }

            self.arena[id] = block;
            self.order.insert(pos, id);
        }
        Ok(())
    }

    /// Reorders the placed blocks by address and rewrites the edges to match.
    fn into_sorted(self) -> Vec<Block> {
        let mut position = vec![None; self.arena.len()];
        for (index, &id) in self.order.iter().enumerate() {
            position[id] = Some(index);
        }

        let mut slots: Vec<Option<Block>> = self.arena.into_iter().map(Some).collect();
        self.order
            .iter()
            .filter_map(|&id| slots[id].take())
            .map(|mut block| {
                block.next = block.next.and_then(|id| position[id]);
                block.branch = block.branch.and_then(|id| position[id]);
                block
            })
            .collect()
    }
}

/// Decodes one block at `address` with the built-in table.
pub fn decode_basic_block<M: GuestMemory + ?Sized>(
    memory: &M,
    address: u64,
    mode: ExecutionMode,
) -> DecodeResult<Vec<Block>> {
    Decoder::new(mode).decode_basic_block(memory, address)
}

/// Decodes the subroutine at `address` with the built-in table.
pub fn decode_function<M: GuestMemory + ?Sized>(
    memory: &M,
    address: u64,
    mode: ExecutionMode,
) -> DecodeResult<Vec<Block>> {
    Decoder::new(mode).decode_function(memory, address)
}

/// Fills `block` using the built-in table.
pub fn fill_block<M: GuestMemory + ?Sized>(
    memory: &M,
    mode: ExecutionMode,
    block: &mut Block,
    limit_address: u64,
) -> DecodeResult<()> {
    Decoder::new(mode).fill_block(memory, block, limit_address)
}
