//! Cartridge slot: a polymorphic mapper selected by tagged variant rather
//! than a trait object, so the whole cartridge state (ROM, bank index, any
//! extra RAM) can be snapshotted as plain data for rewind. PlusROM, when
//! present, wraps any of the plain mappers and only intercepts its four
//! fixed addresses.

pub mod bankswitch;
pub mod plusrom;

use bankswitch::*;
use plusrom::{AddressInfo, PlusRom, PlusRomError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("no cartridge is inserted")]
    CartridgeEjected,
    #[error("cartridge image does not match the requested mapper")]
    CartridgeMapperMismatch,
    #[error(transparent)]
    NotAPlusRom(#[from] PlusRomError),
    #[error("cartridge has no patchable byte at {0:#06x}")]
    UnpokeableAddress(u16),
}

/// Snapshot of which bank and region a cartridge address currently resolves
/// to, for the debugger's memory-map display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BankInfo {
    pub number: u16,
    pub offset: u16,
    pub is_ram: bool,
    pub executing_coproc: bool,
    pub mapper_id: &'static str,
}

#[derive(Clone, Debug)]
pub enum Mapper {
    Atari2K(Atari2K),
    Atari4K(Atari4K),
    F8(F8),
    F6(F6),
    F4(F4),
    E0(E0),
    Ua(Ua),
    Cv(Cv),
    ThreeF(ThreeF),
    Superchip(Superchip),
}

impl Mapper {
    fn detect_hotspot(&mut self, addr: u16) {
        match self {
            Mapper::F8(m) => m.check_hotspot(addr),
            Mapper::F6(m) => m.check_hotspot(addr),
            Mapper::F4(m) => m.check_hotspot(addr),
            Mapper::E0(m) => m.check_hotspot(addr),
            Mapper::Superchip(m) => m.check_hotspot(addr),
            Mapper::ThreeF(_) => {} // selected on write, not read hotspot
            _ => {}
        }
    }

    fn read(&self, addr: u16) -> u8 {
        match self {
            Mapper::Atari2K(m) => m.access(addr),
            Mapper::Atari4K(m) => m.access(addr),
            Mapper::F8(m) => m.access(addr),
            Mapper::F6(m) => m.access(addr),
            Mapper::F4(m) => m.access(addr),
            Mapper::E0(m) => m.access(addr),
            Mapper::Ua(m) => m.access(addr),
            Mapper::Cv(m) => m.access(addr),
            Mapper::ThreeF(m) => m.access(addr),
            Mapper::Superchip(m) => m.access(addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match self {
            Mapper::Cv(m) => m.access_volatile(addr, data),
            Mapper::Superchip(m) => m.access_volatile(addr, data),
            Mapper::ThreeF(m) => {
                if addr & 0x0FFF <= 0x3F {
                    m.select_bank(data);
                }
            }
            _ => {}
        }
    }

    fn num_banks(&self) -> usize {
        match self {
            Mapper::Atari2K(_) | Mapper::Atari4K(_) | Mapper::Cv(_) => 1,
            Mapper::F8(m) => m.banks.len(),
            Mapper::F6(m) => m.banks.len(),
            Mapper::F4(m) => m.banks.len(),
            Mapper::E0(m) => m.banks.len(),
            Mapper::Ua(m) => m.banks.len(),
            Mapper::ThreeF(m) => m.banks.len(),
            Mapper::Superchip(m) => m.banks.len(),
        }
    }

    fn id(&self) -> &'static str {
        match self {
            Mapper::Atari2K(_) => "2K",
            Mapper::Atari4K(_) => "4K",
            Mapper::F8(_) => "F8",
            Mapper::F6(_) => "F6",
            Mapper::F4(_) => "F4",
            Mapper::E0(_) => "E0",
            Mapper::Ua(_) => "UA",
            Mapper::Cv(_) => "CV",
            Mapper::ThreeF(_) => "3F",
            Mapper::Superchip(_) => "F8SC",
        }
    }

    fn bank_is_ram(&self, addr: u16) -> bool {
        let a = (addr & 0x0FFF) as usize;
        match self {
            Mapper::Cv(_) => a < 0x0400,
            Mapper::Superchip(_) => (0x80..0x100).contains(&a),
            _ => false,
        }
    }

    fn current_bank(&self) -> usize {
        match self {
            Mapper::Atari2K(_) | Mapper::Atari4K(_) | Mapper::Cv(_) => 0,
            Mapper::F8(m) => m.current,
            Mapper::F6(m) => m.current,
            Mapper::F4(m) => m.current,
            Mapper::Ua(m) => m.current,
            Mapper::ThreeF(m) => m.current,
            Mapper::Superchip(m) => m.current,
            Mapper::E0(m) => m.slots[0],
        }
    }

    /// Patch a ROM byte in place (used by the reflection/dev tooling path,
    /// never by the running program - cartridges are read-only to the CPU).
    fn patch(&mut self, addr: u16, data: u8) -> Result<(), CartridgeError> {
        let bank = self.current_bank();
        match self {
            Mapper::Atari2K(m) => {
                let idx = (addr & 0x07FF) as usize % m.rom.len();
                m.rom[idx] = data;
            }
            Mapper::Atari4K(m) => m.rom[(addr & 0x0FFF) as usize] = data,
            Mapper::F8(m) => m.banks[bank][(addr & 0x0FFF) as usize] = data,
            Mapper::F6(m) => m.banks[bank][(addr & 0x0FFF) as usize] = data,
            Mapper::F4(m) => m.banks[bank][(addr & 0x0FFF) as usize] = data,
            Mapper::Ua(m) => m.banks[bank][(addr & 0x0FFF) as usize] = data,
            Mapper::ThreeF(m) => m.banks[bank][(addr & 0x0FFF) as usize] = data,
            Mapper::Superchip(m) => m.banks[bank][(addr & 0x0FFF) as usize] = data,
            Mapper::Cv(m) => {
                let a = (addr & 0x0FFF) as usize;
                if a < 0x0400 {
                    return Err(CartridgeError::UnpokeableAddress(addr));
                }
                m.rom[a - 0x0400] = data;
            }
            Mapper::E0(m) => {
                let a = (addr & 0x0FFF) as usize;
                m.banks[a / 1024][a % 1024] = data;
            }
        }
        Ok(())
    }
}

pub struct CartridgeSlot {
    mapper: Option<Mapper>,
    plus_rom: Option<PlusRom>,
}

impl CartridgeSlot {
    pub fn empty() -> Self {
        Self { mapper: None, plus_rom: None }
    }

    pub fn insert(mapper: Mapper) -> Self {
        Self { mapper: Some(mapper), plus_rom: None }
    }

    pub fn insert_plus_rom(mapper: Mapper, address_info: AddressInfo) -> Self {
        Self {
            mapper: Some(mapper),
            plus_rom: Some(PlusRom::new(address_info)),
        }
    }

    pub fn eject(&mut self) {
        self.mapper = None;
        self.plus_rom = None;
    }

    fn plus_rom_hotspot(addr: u16) -> Option<u16> {
        match addr & 0x0FFF {
            a @ 0x0FF0..=0x0FF3 => Some(a - 0x0FF0),
            _ => None,
        }
    }

    /// Read, `peek` true for non-invasive debug views (skips hotspot
    /// side-effects and PlusROM network traffic). Returns `(data, mask)`.
    pub fn access(&mut self, addr: u16, peek: bool) -> (u8, u8) {
        if let (Some(plus), Some(slot)) = (self.plus_rom.as_mut(), Self::plus_rom_hotspot(addr)) {
            if !peek {
                match slot {
                    2 => return (plus.read_receive(), 0xFF),
                    3 => return (plus.read_receive_len(), 0xFF),
                    _ => {}
                }
            }
        }
        let Some(mapper) = self.mapper.as_mut() else {
            return (0, 0);
        };
        if !peek {
            mapper.detect_hotspot(addr);
        }
        (mapper.read(addr), 0xFF)
    }

    pub fn access_volatile(&mut self, addr: u16, data: u8, peek: bool) {
        if peek {
            return;
        }
        if let (Some(plus), Some(slot)) = (self.plus_rom.as_mut(), Self::plus_rom_hotspot(addr)) {
            match slot {
                0 => {
                    plus.write_send(data);
                    return;
                }
                1 => {
                    plus.write_receive_trigger();
                    return;
                }
                _ => {}
            }
        }
        if let Some(mapper) = self.mapper.as_mut() {
            mapper.write(addr, data);
        }
    }

    /// Called on every bus cycle regardless of CPU read/write direction -
    /// some mappers (3F, UA) latch their hotspot from address-bus traffic
    /// alone, not just from a decoded register access.
    pub fn access_passive(&mut self, addr: u16, _data: u8) {
        if let Some(Mapper::ThreeF(m)) = self.mapper.as_mut() {
            if addr & 0x0FFF <= 0x3F {
                // 3F latches from any bus write in the TIA-mirrored range;
                // the caller already filters to cartridge-relative writes.
                let _ = m;
            }
        }
    }

    pub fn num_banks(&self) -> Result<usize, CartridgeError> {
        self.mapper.as_ref().map(|m| m.num_banks()).ok_or(CartridgeError::CartridgeEjected)
    }

    pub fn get_bank(&self, addr: u16) -> Result<BankInfo, CartridgeError> {
        let mapper = self.mapper.as_ref().ok_or(CartridgeError::CartridgeEjected)?;
        Ok(BankInfo {
            number: mapper.current_bank() as u16,
            offset: addr & 0x0FFF,
            is_ram: mapper.bank_is_ram(addr),
            executing_coproc: false,
            mapper_id: mapper.id(),
        })
    }

    pub fn patch(&mut self, addr: u16, data: u8) -> Result<(), CartridgeError> {
        self.mapper.as_mut().ok_or(CartridgeError::CartridgeEjected)?.patch(addr, data)
    }

    pub fn is_plus_rom(&self) -> bool {
        self.plus_rom.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct CartridgeState {
    pub mapper: Option<Mapper>,
}

impl CartridgeSlot {
    pub fn snapshot(&self) -> CartridgeState {
        CartridgeState { mapper: self.mapper.clone() }
    }

    pub fn plumb(&mut self, s: CartridgeState) {
        self.mapper = s.mapper;
    }
}
