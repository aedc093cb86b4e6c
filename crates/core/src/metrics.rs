// Armature - Guest CPU Front End
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use crate::cfg::Block;
use crate::decoder::{InstName, Instruction};

/// Hooks called by a [`Decoder`](crate::Decoder) as it works.
pub trait DecodeObserver: std::fmt::Debug + Send + Sync {
    fn on_instruction(&self, _inst: &Instruction) {}
    fn on_block(&self, _block: &Block) {}
    fn on_split(&self, _left: &Block, _right: &Block) {}
}

#[derive(Debug)]
pub struct DecodeMetrics {
    instruction_count: AtomicU64,
    undefined_count: AtomicU64,
    block_count: AtomicU64,
    split_count: AtomicU64,
    instructions_by_name: Mutex<HashMap<InstName, u64>>,
    start_time: Instant,
}

impl Default for DecodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeMetrics {
    pub fn new() -> Self {
        Self {
            instruction_count: AtomicU64::new(0),
            undefined_count: AtomicU64::new(0),
            block_count: AtomicU64::new(0),
            split_count: AtomicU64::new(0),
            instructions_by_name: Mutex::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    pub fn reset(&self) {
        self.instruction_count.store(0, Ordering::SeqCst);
        self.undefined_count.store(0, Ordering::SeqCst);
        self.block_count.store(0, Ordering::SeqCst);
        self.split_count.store(0, Ordering::SeqCst);
        if let Ok(mut m) = self.instructions_by_name.lock() {
            m.clear();
        }
    }

    pub fn get_instructions(&self) -> u64 {
        self.instruction_count.load(Ordering::SeqCst)
    }

    pub fn get_undefined(&self) -> u64 {
        self.undefined_count.load(Ordering::SeqCst)
    }

    /// Blocks filled by decoding. Halves created by a split are not counted.
    pub fn get_blocks(&self) -> u64 {
        self.block_count.load(Ordering::SeqCst)
    }

    pub fn get_splits(&self) -> u64 {
        self.split_count.load(Ordering::SeqCst)
    }

    pub fn get_name_count(&self, name: InstName) -> u64 {
        self.instructions_by_name
            .lock()
            .ok()
            .and_then(|m| m.get(&name).copied())
            .unwrap_or(0)
    }

    /// Most frequent instruction kinds, highest count first.
    pub fn top_names(&self, limit: usize) -> Vec<(InstName, u64)> {
        let mut counts: Vec<(InstName, u64)> = self
            .instructions_by_name
            .lock()
            .map(|m| m.iter().map(|(&name, &count)| (name, count)).collect())
            .unwrap_or_default();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.to_string().cmp(&b.0.to_string())));
        counts.truncate(limit);
        counts
    }

    /// Decoded instructions per second since creation.
    pub fn get_ips(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.get_instructions() as f64 / elapsed
        } else {
            0.0
        }
    }
}

impl DecodeObserver for DecodeMetrics {
    fn on_instruction(&self, inst: &Instruction) {
        self.instruction_count.fetch_add(1, Ordering::SeqCst);
        if inst.is_undefined() {
            self.undefined_count.fetch_add(1, Ordering::SeqCst);
        }
        if let Ok(mut m) = self.instructions_by_name.lock() {
            *m.entry(inst.name).or_insert(0) += 1;
        }
    }

    fn on_block(&self, _block: &Block) {
        self.block_count.fetch_add(1, Ordering::SeqCst);
    }

    fn on_split(&self, _left: &Block, _right: &Block) {
        self.split_count.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::OpCodeTable;
    use crate::ExecutionMode;
    use std::sync::Arc;

    fn inst(raw: u32) -> Instruction {
        Instruction::decode(0, raw, ExecutionMode::Aarch64, OpCodeTable::global())
    }

    #[test]
    fn test_counts_instructions_by_kind() {
        let metrics = DecodeMetrics::new();
        metrics.on_instruction(&inst(0xD503_201F));
        metrics.on_instruction(&inst(0xD503_201F));
        metrics.on_instruction(&inst(0x0000_0000));
        metrics.on_block(&Block::new(0));

        assert_eq!(metrics.get_instructions(), 3);
        assert_eq!(metrics.get_undefined(), 1);
        assert_eq!(metrics.get_blocks(), 1);
        assert_eq!(metrics.get_name_count(InstName::Und), 1);
        assert_eq!(metrics.top_names(1), vec![(InstName::Hint, 2)]);

        metrics.reset();
        assert_eq!(metrics.get_instructions(), 0);
        assert_eq!(metrics.get_name_count(InstName::Hint), 0);
    }

    #[test]
    fn test_shared_between_threads() {
        let metrics = Arc::new(DecodeMetrics::new());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let metrics = metrics.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        metrics.on_instruction(&inst(0xD65F_03C0));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.get_instructions(), 400);
        assert_eq!(metrics.get_name_count(InstName::Ret), 400);
    }
}
