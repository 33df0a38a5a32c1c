use vcs_core::core::{bus::InterruptState, Bus, BusMaster};

/// Minimal bus for testing: flat 64KB read/write memory, no peripherals.
/// `irq`/`nmi` are plain level lines the test sets directly - this bus
/// exists to exercise the 6507 core's generic interrupt handling, which the
/// VCS's own bus never drives (the 2600 bonds neither pin out).
pub struct TestBus {
    pub memory: [u8; 0x10000],
    pub irq: bool,
    pub nmi: bool,
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            memory: [0; 0x10000],
            irq: false,
            nmi: false,
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }
}

impl Bus for TestBus {
    type Address = u16;
    type Data = u8;

    fn read(&mut self, _master: BusMaster, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    fn write(&mut self, _master: BusMaster, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
    }

    fn is_halted_for(&self, _master: BusMaster) -> bool {
        false
    }
    fn check_interrupts(&self, _target: BusMaster) -> InterruptState {
        InterruptState {
            irq: self.irq,
            nmi: self.nmi,
            firq: false,
        }
    }
}
