//! The common fixed-bank and hotspot-switched mappers. Each struct owns its
//! slice of the ROM image and the bank index the last hotspot access
//! selected; `access`/`access_volatile` decode hotspots before the generic
//! read/write, matching the order real hardware's address decoder imposes
//! (hotspot compare happens on every cycle, not just on instruction
//! boundaries - `access_passive` exists for exactly that).

pub const BANK_SIZE: usize = 4096;

#[derive(Clone, Debug)]
pub struct Atari2K {
    pub rom: Vec<u8>,
}

impl Atari2K {
    pub fn access(&self, addr: u16) -> u8 {
        self.rom[(addr & 0x07FF) as usize % self.rom.len()]
    }
}

#[derive(Clone, Debug)]
pub struct Atari4K {
    pub rom: Vec<u8>,
}

impl Atari4K {
    pub fn access(&self, addr: u16) -> u8 {
        self.rom[(addr & 0x0FFF) as usize]
    }
}

/// F8: two 4K banks, hotspots at $FF8/$FF9.
#[derive(Clone, Debug)]
pub struct F8 {
    pub banks: Vec<[u8; BANK_SIZE]>,
    pub current: usize,
}

impl F8 {
    pub fn check_hotspot(&mut self, addr: u16) {
        match addr & 0x0FFF {
            0x0FF8 => self.current = 0,
            0x0FF9 => self.current = 1,
            _ => {}
        }
    }
    pub fn access(&self, addr: u16) -> u8 {
        self.banks[self.current][(addr & 0x0FFF) as usize]
    }
}

/// F6: four 4K banks, hotspots at $FF6-$FF9.
#[derive(Clone, Debug)]
pub struct F6 {
    pub banks: Vec<[u8; BANK_SIZE]>,
    pub current: usize,
}

impl F6 {
    pub fn check_hotspot(&mut self, addr: u16) {
        if let 0x0FF6..=0x0FF9 = addr & 0x0FFF {
            self.current = ((addr & 0x0FFF) - 0x0FF6) as usize;
        }
    }
    pub fn access(&self, addr: u16) -> u8 {
        self.banks[self.current][(addr & 0x0FFF) as usize]
    }
}

/// F4: eight 4K banks, hotspots at $FF4-$FFB.
#[derive(Clone, Debug)]
pub struct F4 {
    pub banks: Vec<[u8; BANK_SIZE]>,
    pub current: usize,
}

impl F4 {
    pub fn check_hotspot(&mut self, addr: u16) {
        if let 0x0FF4..=0x0FFB = addr & 0x0FFF {
            self.current = ((addr & 0x0FFF) - 0x0FF4) as usize;
        }
    }
    pub fn access(&self, addr: u16) -> u8 {
        self.banks[self.current][(addr & 0x0FFF) as usize]
    }
}

/// E0: eight 1K segments individually selectable across four 1K windows,
/// hotspots at $FE0-$FF9.
#[derive(Clone, Debug)]
pub struct E0 {
    pub banks: Vec<[u8; 1024]>,
    pub slots: [usize; 4],
}

impl E0 {
    pub fn check_hotspot(&mut self, addr: u16) {
        let a = addr & 0x0FFF;
        if (0x0FE0..=0x0FE7).contains(&a) {
            self.slots[0] = (a - 0x0FE0) as usize;
        } else if (0x0FE8..=0x0FEF).contains(&a) {
            self.slots[1] = (a - 0x0FE8) as usize;
        } else if (0x0FF0..=0x0FF7).contains(&a) {
            self.slots[2] = (a - 0x0FF0) as usize;
        }
    }
    pub fn access(&self, addr: u16) -> u8 {
        let a = addr & 0x0FFF;
        let window = (a / 1024) as usize;
        let bank = if window == 3 { self.banks.len() - 1 } else { self.slots[window] };
        self.banks[bank][(a % 1024) as usize]
    }
}

/// UA: two 4K banks, hotspots on read of $220/$240 in the TIA-mirrored I/O
/// range rather than the cartridge page; kept here with cartridge-relative
/// addresses already translated by the caller.
#[derive(Clone, Debug)]
pub struct Ua {
    pub banks: Vec<[u8; BANK_SIZE]>,
    pub current: usize,
}

impl Ua {
    pub fn access(&self, addr: u16) -> u8 {
        self.banks[self.current][(addr & 0x0FFF) as usize]
    }
}

/// CV: 2K ROM plus 1K battery/extra-RAM at $F000-$F3FF (write) / mirrored
/// read at $F400-$F7FF.
#[derive(Clone, Debug)]
pub struct Cv {
    pub rom: Vec<u8>,
    pub ram: [u8; 1024],
}

impl Cv {
    pub fn access(&self, addr: u16) -> u8 {
        let a = addr & 0x0FFF;
        if a < 0x0400 {
            self.ram[a as usize]
        } else {
            self.rom[((a - 0x0400) as usize) % self.rom.len()]
        }
    }
    pub fn access_volatile(&mut self, addr: u16, data: u8) {
        let a = addr & 0x0FFF;
        if a < 0x0400 {
            self.ram[a as usize] = data;
        }
    }
}

/// 3F (Tigervision): bank-switched by writing the bank index to $3F itself
/// (any TIA-mirrored write in $00-$3F), last 4K bank fixed.
#[derive(Clone, Debug)]
pub struct ThreeF {
    pub banks: Vec<[u8; BANK_SIZE]>,
    pub current: usize,
}

impl ThreeF {
    pub fn access(&self, addr: u16) -> u8 {
        let a = addr & 0x0FFF;
        if a < 0x0800 {
            self.banks[self.current][a as usize]
        } else {
            let last = self.banks.len() - 1;
            self.banks[last][a as usize]
        }
    }
    pub fn select_bank(&mut self, data: u8) {
        self.current = data as usize % self.banks.len();
    }
}

/// Superchip: F8-style banking plus 128 bytes of extra RAM mapped at the
/// bottom of each bank (write $F000-$F07F, read $F080-$F0FF).
#[derive(Clone, Debug)]
pub struct Superchip {
    pub banks: Vec<[u8; BANK_SIZE]>,
    pub current: usize,
    pub ram: [u8; 128],
}

impl Superchip {
    pub fn check_hotspot(&mut self, addr: u16) {
        match addr & 0x0FFF {
            0x0FF8 => self.current = 0,
            0x0FF9 => self.current = 1,
            _ => {}
        }
    }
    pub fn access(&self, addr: u16) -> u8 {
        let a = (addr & 0x0FFF) as usize;
        if (0x80..0x100).contains(&a) {
            self.ram[a - 0x80]
        } else {
            self.banks[self.current][a]
        }
    }
    pub fn access_volatile(&mut self, addr: u16, data: u8) {
        let a = (addr & 0x0FFF) as usize;
        if a < 0x80 {
            self.ram[a] = data;
        }
    }
}
