// Armature - Guest CPU Front End
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

use crate::ExecutionMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MemoryFault {
    #[error("unmapped address: 0x{0:016X}")]
    Unmapped(u64),
    #[error("fetch straddles the end of a mapped region at 0x{0:016X}")]
    Truncated(u64),
}

/// Read side of the guest address space, as seen by the decoder.
///
/// Words are little-endian. The decoder issues exactly one call per fetched
/// instruction and propagates any fault unchanged.
pub trait GuestMemory {
    fn read_u32(&self, address: u64) -> Result<u32, MemoryFault>;
}

impl<M: GuestMemory + ?Sized> GuestMemory for &M {
    fn read_u32(&self, address: u64) -> Result<u32, MemoryFault> {
        (**self).read_u32(address)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub start_addr: u64,
    pub data: Vec<u8>,
}

impl Segment {
    /// One past the last byte, clamped to the top of the address space.
    pub fn end_addr(&self) -> u64 {
        self.start_addr.saturating_add(self.data.len() as u64)
    }

    pub fn contains(&self, addr: u64) -> bool {
        offset_in(self.start_addr, self.data.len(), addr).is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramImage {
    pub entry_point: u64,
    pub segments: Vec<Segment>,
    pub mode: ExecutionMode,
}

impl ProgramImage {
    pub fn new(entry_point: u64, mode: ExecutionMode) -> Self {
        Self {
            entry_point,
            segments: Vec::new(),
            mode,
        }
    }

    pub fn add_segment(&mut self, start_addr: u64, data: Vec<u8>) {
        self.segments.push(Segment { start_addr, data });
    }

    pub fn total_size(&self) -> u64 {
        self.segments.iter().map(|s| s.data.len() as u64).sum()
    }
}

impl GuestMemory for ProgramImage {
    fn read_u32(&self, address: u64) -> Result<u32, MemoryFault> {
        let segment = self
            .segments
            .iter()
            .find(|s| s.contains(address))
            .ok_or(MemoryFault::Unmapped(address))?;

        let offset = (address - segment.start_addr) as usize;
        read_le_u32(&segment.data, offset).ok_or(MemoryFault::Truncated(address))
    }
}

/// A flat buffer mapped at `base_addr`.
pub struct LinearMemory {
    pub data: Vec<u8>,
    pub base_addr: u64,
}

impl LinearMemory {
    /// Builds a memory holding `words` back to back, starting at `base_addr`.
    pub fn from_words(base_addr: u64, words: &[u32]) -> Self {
        let data = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        Self { data, base_addr }
    }

    /// Builds a memory holding T16 halfwords back to back.
    pub fn from_halfwords(base_addr: u64, halfwords: &[u16]) -> Self {
        let data = halfwords.iter().flat_map(|h| h.to_le_bytes()).collect();
        Self { data, base_addr }
    }
}

impl GuestMemory for LinearMemory {
    fn read_u32(&self, address: u64) -> Result<u32, MemoryFault> {
        let offset = offset_in(self.base_addr, self.data.len(), address)
            .ok_or(MemoryFault::Unmapped(address))?;
        read_le_u32(&self.data, offset).ok_or(MemoryFault::Truncated(address))
    }
}

/// Offset of `addr` in a region of `len` bytes at `start`.
fn offset_in(start: u64, len: usize, addr: u64) -> Option<usize> {
    addr.checked_sub(start)
        .filter(|&offset| offset < len as u64)
        .map(|offset| offset as usize)
}

fn read_le_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
