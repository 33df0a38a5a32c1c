//! Builds a `CartridgeSlot` from a raw ROM image. Mapper selection is by
//! image size for the common cases; callers with a non-standard dump (e.g.
//! a PlusROM-patched F6 image, or an explicit-mapper request from a
//! cartridge database) pass `Some(requested)` and get
//! `CartridgeMapperMismatch` back if the size doesn't fit.

use vcs_core::vcs::cartridge::bankswitch::{
    Atari2K, Atari4K, BANK_SIZE, Cv, E0, F4, F6, F8, Superchip, ThreeF, Ua,
};
use vcs_core::vcs::cartridge::plusrom::AddressInfo;
use vcs_core::vcs::cartridge::{CartridgeError, CartridgeSlot, Mapper};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapperKind {
    Atari2K,
    Atari4K,
    F8,
    F6,
    F4,
    E0,
    Ua,
    Cv,
    ThreeF,
    Superchip,
}

fn split_banks(rom: &[u8], count: usize) -> Vec<[u8; BANK_SIZE]> {
    (0..count)
        .map(|i| {
            let mut bank = [0u8; BANK_SIZE];
            let start = i * BANK_SIZE;
            bank.copy_from_slice(&rom[start..start + BANK_SIZE]);
            bank
        })
        .collect()
}

fn build_mapper(rom: &[u8], kind: MapperKind) -> Result<Mapper, CartridgeError> {
    match kind {
        MapperKind::Atari2K if rom.len() == 2048 => Ok(Mapper::Atari2K(Atari2K { rom: rom.to_vec() })),
        MapperKind::Atari4K if rom.len() == 4096 => Ok(Mapper::Atari4K(Atari4K { rom: rom.to_vec() })),
        MapperKind::F8 if rom.len() == 8192 => Ok(Mapper::F8(F8 { banks: split_banks(rom, 2), current: 1 })),
        MapperKind::F6 if rom.len() == 16384 => Ok(Mapper::F6(F6 { banks: split_banks(rom, 4), current: 0 })),
        MapperKind::F4 if rom.len() == 32768 => Ok(Mapper::F4(F4 { banks: split_banks(rom, 8), current: 0 })),
        MapperKind::E0 if rom.len() == 8192 => Ok(Mapper::E0(E0 {
            banks: (0..8)
                .map(|i| {
                    let mut b = [0u8; 1024];
                    b.copy_from_slice(&rom[i * 1024..(i + 1) * 1024]);
                    b
                })
                .collect(),
            slots: [0, 1, 2, 7],
        })),
        MapperKind::Ua if rom.len() == 8192 => Ok(Mapper::Ua(Ua { banks: split_banks(rom, 2), current: 0 })),
        MapperKind::Cv if rom.len() == 2048 => Ok(Mapper::Cv(Cv { rom: rom.to_vec(), ram: [0; 1024] })),
        MapperKind::ThreeF => Ok(Mapper::ThreeF(ThreeF {
            banks: split_banks(rom, rom.len() / BANK_SIZE),
            current: 0,
        })),
        MapperKind::Superchip if rom.len() == 8192 => Ok(Mapper::Superchip(Superchip {
            banks: split_banks(rom, 2),
            current: 1,
            ram: [0; 128],
        })),
        _ => Err(CartridgeError::CartridgeMapperMismatch),
    }
}

/// Guess a mapper from image size alone, the way a bare `.bin` dump with no
/// accompanying metadata has to be handled.
fn guess_kind(rom: &[u8]) -> Result<MapperKind, CartridgeError> {
    match rom.len() {
        2048 => Ok(MapperKind::Atari2K),
        4096 => Ok(MapperKind::Atari4K),
        8192 => Ok(MapperKind::F8),
        16384 => Ok(MapperKind::F6),
        32768 => Ok(MapperKind::F4),
        _ => Err(CartridgeError::CartridgeMapperMismatch),
    }
}

/// Look for a PlusROM host/path record: a pointer at the last bank's
/// `0x1FFA/0x1FFB` into a `path\0host\0` pair within that same bank.
fn detect_plus_rom(rom: &[u8]) -> Option<AddressInfo> {
    if rom.len() < BANK_SIZE {
        return None;
    }
    let last_bank = &rom[rom.len() - BANK_SIZE..];
    let ptr = u16::from_le_bytes([last_bank[0x0FFA], last_bank[0x0FFB]]);
    let offset = (ptr & 0x0FFF) as usize;
    if offset >= last_bank.len() {
        return None;
    }
    let path_nul = last_bank[offset..].iter().position(|&b| b == 0)?;
    let host_start = offset + path_nul + 1;
    if host_start >= last_bank.len() {
        return None;
    }
    let host_nul = last_bank[host_start..]
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(last_bank.len() - host_start);
    let record = &last_bank[offset..host_start + host_nul];
    AddressInfo::parse(record).ok()
}

pub fn load(rom: &[u8], requested: Option<MapperKind>) -> Result<CartridgeSlot, CartridgeError> {
    let kind = match requested {
        Some(k) => k,
        None => guess_kind(rom)?,
    };
    let mapper = build_mapper(rom, kind)?;
    match detect_plus_rom(rom) {
        Some(info) => Ok(CartridgeSlot::insert_plus_rom(mapper, info)),
        None => Ok(CartridgeSlot::insert(mapper)),
    }
}
