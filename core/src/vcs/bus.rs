//! 13-bit VCS address bus: TIA/RIOT/cartridge decode, mirrors, and the
//! undriven-data-bus behavior real carts rely on (`$2A` reads back bits of
//! the previously driven address, not zero).

use crate::core::bus::{Bus as BusTrait, BusMaster, InterruptState};
use crate::vcs::cartridge::CartridgeSlot;
use crate::vcs::riot::Riot;
use crate::vcs::tia::Tia;

/// Bits OR'd into a chip register read's low byte, simulating pins that the
/// chip does not drive. Keyed by decoded region, not per-register - real
/// hardware behavior is bus-level, not per-chip (see `select`).
const TIA_UNDRIVEN_MASK: u8 = 0b1100_0000;
const RIOT_UNDRIVEN_MASK: u8 = 0b0000_0000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Region {
    Tia,
    RiotRam,
    RiotIo,
    Cartridge,
}

fn decode(addr: u16) -> Region {
    // 13-bit effective address; only A12 A7 A9 A8 matter for top-level decode
    // on stock 2600 wiring (no chip-select logic beyond this on the PCB).
    let a = addr & 0x1FFF;
    if a & 0x1000 != 0 {
        Region::Cartridge
    } else if a & 0x0080 == 0 {
        Region::Tia
    } else if a & 0x0200 != 0 {
        Region::RiotIo
    } else {
        Region::RiotRam
    }
}

pub struct VcsBus {
    pub riot: Riot,
    pub tia: Tia,
    pub cartridge: CartridgeSlot,

    pub last_access_address: u16,
    pub last_access_data: u8,
    pub last_cpu_write: bool,
    pub data_bus_driven_mask: u8,
}

impl VcsBus {
    pub fn new(riot: Riot, tia: Tia, cartridge: CartridgeSlot) -> Self {
        Self {
            riot,
            tia,
            cartridge,
            last_access_address: 0,
            last_access_data: 0,
            last_cpu_write: false,
            data_bus_driven_mask: 0xFF,
        }
    }

    fn undriven_fill(region: Region, addr: u16) -> u8 {
        let mask = match region {
            Region::Tia => TIA_UNDRIVEN_MASK,
            Region::RiotIo | Region::RiotRam => RIOT_UNDRIVEN_MASK,
            Region::Cartridge => 0,
        };
        (addr as u8) & mask
    }
}

impl BusTrait for VcsBus {
    type Address = u16;
    type Data = u8;

    fn read(&mut self, master: BusMaster, addr: u16) -> u8 {
        let region = decode(addr);
        let (data, driven_mask) = match region {
            Region::Tia => {
                let (d, m) = self.tia.read(addr & 0x3F);
                (d | Self::undriven_fill(region, addr), m)
            }
            Region::RiotRam => (self.riot.read_ram(addr & 0x7F), 0xFF),
            Region::RiotIo => (self.riot.read_io(addr & 0x1F), 0xFF),
            Region::Cartridge => {
                let (d, m) = self.cartridge.access(addr & 0x0FFF, false);
                (d, m)
            }
        };
        self.cartridge.access_passive(addr & 0x0FFF, data);
        self.last_access_address = addr;
        self.last_access_data = data;
        self.last_cpu_write = false;
        self.data_bus_driven_mask = driven_mask;
        data
    }

    fn write(&mut self, _master: BusMaster, addr: u16, data: u8) {
        match decode(addr) {
            Region::Tia => self.tia.write(addr & 0x3F, data),
            Region::RiotRam => self.riot.write_ram(addr & 0x7F, data),
            Region::RiotIo => self.riot.write_io(addr & 0x1F, data),
            Region::Cartridge => self.cartridge.access_volatile(addr & 0x0FFF, data, false),
        }
        self.cartridge.access_passive(addr & 0x0FFF, data);
        self.last_access_address = addr;
        self.last_access_data = data;
        self.last_cpu_write = true;
        self.data_bus_driven_mask = 0xFF;
    }

    fn is_halted_for(&self, _master: BusMaster) -> bool {
        self.tia.rdy_held_low()
    }

    fn check_interrupts(&self, _target: BusMaster) -> InterruptState {
        // The 2600's 6507 has no IRQ/NMI pins bonded out.
        InterruptState::default()
    }
}
