// Armature - Guest CPU Front End
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{anyhow, bail, Context, Result};
use armature_core::memory::ProgramImage;
use armature_core::ExecutionMode;
use goblin::elf::header::{EM_AARCH64, EM_ARM};
use goblin::elf::program_header::PT_LOAD;
use goblin::elf::sym::STT_FUNC;
use goblin::elf::Elf;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// A function entry point taken from the symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSymbol {
    pub address: u64,
    /// ARM interworking bit was set on the symbol value.
    pub thumb: bool,
}

/// An image ready for decoding, plus what the container told us about it.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub image: ProgramImage,
    pub symbols: BTreeMap<String, FunctionSymbol>,
}

impl LoadedImage {
    pub fn mode(&self) -> ExecutionMode {
        self.image.mode
    }

    pub fn entry_point(&self) -> u64 {
        self.image.entry_point
    }

    pub fn resolve_symbol(&self, name: &str) -> Option<FunctionSymbol> {
        self.symbols.get(name).copied()
    }

    /// Mode to decode `symbol` in. Thumb symbols switch an A32 image to
    /// Thumb; everything else keeps the image mode.
    pub fn mode_for(&self, symbol: FunctionSymbol) -> ExecutionMode {
        if symbol.thumb {
            ExecutionMode::Aarch32Thumb
        } else {
            self.image.mode
        }
    }
}

pub fn load_elf(path: &Path) -> Result<LoadedImage> {
    let buffer = fs::read(path).with_context(|| format!("Failed to read ELF file: {:?}", path))?;
    load_elf_bytes(&buffer)
}

pub fn load_elf_bytes(buffer: &[u8]) -> Result<LoadedImage> {
    let elf = Elf::parse(buffer).context("Failed to parse ELF binary")?;

    info!("ELF Entry Point: {:#x}", elf.entry);

    let is_arm = match elf.header.e_machine {
        EM_AARCH64 => false,
        EM_ARM => true,
        other => bail!("Unsupported ELF machine type: {}", other),
    };

    let (entry, mode) = if is_arm {
        arm_entry(elf.entry)
    } else {
        (elf.entry, ExecutionMode::Aarch64)
    };

    let mut image = ProgramImage::new(entry, mode);

    for ph in &elf.program_headers {
        if ph.p_type != PT_LOAD {
            continue;
        }

        // Symbols and branch targets are virtual addresses
        let start_addr = ph.p_vaddr;
        let size = ph.p_filesz as usize;
        let offset = ph.p_offset as usize;

        if size == 0 {
            continue;
        }

        debug!(
            "Found Loadable Segment: Addr={:#x}, Size={} bytes, Offset={:#x}",
            start_addr, size, offset
        );

        if start_addr.checked_add(ph.p_filesz).is_none() {
            bail!(
                "Segment at {:#x} ({} bytes) wraps the address space",
                start_addr,
                size
            );
        }

        let segment_data = offset
            .checked_add(size)
            .and_then(|end| buffer.get(offset..end))
            .ok_or_else(|| anyhow!("Segment out of bounds in ELF file"))?;
        image.add_segment(start_addr, segment_data.to_vec());
    }

    if image.segments.is_empty() {
        warn!("No loadable segments found in ELF file");
    }

    let mut symbols = BTreeMap::new();
    for sym in elf.syms.iter() {
        if sym.st_type() != STT_FUNC || sym.st_value == 0 {
            continue;
        }
        let Some(name) = elf.strtab.get_at(sym.st_name).filter(|n| !n.is_empty()) else {
            continue;
        };

        let (address, thumb) = if is_arm {
            (sym.st_value & !1, sym.st_value & 1 != 0)
        } else {
            (sym.st_value, false)
        };

        if let Some(prev) = symbols.insert(name.to_string(), FunctionSymbol { address, thumb }) {
            warn!(
                "Duplicate function symbol '{}' ({:#x} and {:#x}), keeping the last",
                name, prev.address, address
            );
        }
    }

    debug!("Collected {} function symbols", symbols.len());

    Ok(LoadedImage { image, symbols })
}

fn arm_entry(entry: u64) -> (u64, ExecutionMode) {
    if entry & 1 != 0 {
        (entry & !1, ExecutionMode::Aarch32Thumb)
    } else {
        (entry, ExecutionMode::Aarch32Arm)
    }
}

/// Wraps a flat binary placed at `base`.
pub fn load_raw(path: &Path, base: u64, mode: ExecutionMode) -> Result<LoadedImage> {
    let data = fs::read(path).with_context(|| format!("Failed to read raw image: {:?}", path))?;
    Ok(load_raw_bytes(data, base, mode))
}

pub fn load_raw_bytes(data: Vec<u8>, base: u64, mode: ExecutionMode) -> LoadedImage {
    info!("Raw image: {} bytes at {:#x} ({})", data.len(), base, mode);

    let mut image = ProgramImage::new(base, mode);
    image.add_segment(base, data);

    LoadedImage {
        image,
        symbols: BTreeMap::new(),
    }
}

/// Refuses files larger than `max_size` bytes before anything is read.
pub fn check_size(path: &Path, max_size: Option<u64>) -> Result<()> {
    let Some(max_size) = max_size else {
        return Ok(());
    };
    let len = fs::metadata(path)
        .with_context(|| format!("Failed to stat image: {:?}", path))?
        .len();
    if len > max_size {
        bail!(
            "Image {:?} is {} bytes, above the configured limit of {} bytes",
            path,
            len,
            max_size
        );
    }
    Ok(())
}
