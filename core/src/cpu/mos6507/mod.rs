mod alu;
mod branch;
mod load_store;

use crate::core::{
    Bus, BusMaster,
    bus::InterruptState,
    component::{BusMasterComponent, Component},
};
use crate::cpu::{
    Cpu,
    state::{CpuStateTrait, Mos6507State},
};

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum StatusFlag {
    C = 0x01, // Carry
    Z = 0x02, // Zero
    I = 0x04, // Interrupt Disable
    D = 0x08, // Decimal
    B = 0x10, // Break
    U = 0x20, // Unused (always 1)
    V = 0x40, // Overflow
    N = 0x80, // Negative
}

/// One of the documented NMOS 6502/6507 addressing-mode quirks, surfaced on
/// [`CpuResult`] for introspection and conformance testing. None of these
/// affect emulated behavior - the buggy address is what real silicon computes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CpuBug {
    #[default]
    None,
    /// `JMP (addr)` with `addr & 0xFF == 0xFF`: high byte is fetched from
    /// `addr & 0xFF00`, not `addr + 1`.
    JmpIndirect,
    /// `(zp,X)` whose zero-page pointer fetch wraps past `$FF` back to `$00`.
    IndexedIndirect,
    /// `zp,X` / `zp,Y` effective address wraps within page zero.
    ZeroPageIndex,
}

/// Static description of one opcode's shape, used for cycle/byte-count
/// conformance checks. Not consulted by the execution path itself.
#[derive(Copy, Clone, Debug)]
pub struct InstructionDef {
    pub mnemonic: &'static str,
    pub bytes: u8,
    pub cycles: u8,
    pub page_sensitive: bool,
}

const fn def(mnemonic: &'static str, bytes: u8, cycles: u8, page_sensitive: bool) -> InstructionDef {
    InstructionDef { mnemonic, bytes, cycles, page_sensitive }
}

const UNKNOWN: InstructionDef = def("???", 1, 2, false);

const fn build_table() -> [InstructionDef; 256] {
    let mut t = [UNKNOWN; 256];
    // LDA
    t[0xA9] = def("LDA", 2, 2, false);
    t[0xA5] = def("LDA", 2, 3, false);
    t[0xB5] = def("LDA", 2, 4, false);
    t[0xAD] = def("LDA", 3, 4, false);
    t[0xBD] = def("LDA", 3, 4, true);
    t[0xB9] = def("LDA", 3, 4, true);
    t[0xA1] = def("LDA", 2, 6, false);
    t[0xB1] = def("LDA", 2, 5, true);
    // LDX
    t[0xA2] = def("LDX", 2, 2, false);
    t[0xA6] = def("LDX", 2, 3, false);
    t[0xB6] = def("LDX", 2, 4, false);
    t[0xAE] = def("LDX", 3, 4, false);
    t[0xBE] = def("LDX", 3, 4, true);
    // LDY
    t[0xA0] = def("LDY", 2, 2, false);
    t[0xA4] = def("LDY", 2, 3, false);
    t[0xB4] = def("LDY", 2, 4, false);
    t[0xAC] = def("LDY", 3, 4, false);
    t[0xBC] = def("LDY", 3, 4, true);
    // STA
    t[0x85] = def("STA", 2, 3, false);
    t[0x95] = def("STA", 2, 4, false);
    t[0x8D] = def("STA", 3, 4, false);
    t[0x9D] = def("STA", 3, 5, false);
    t[0x99] = def("STA", 3, 5, false);
    t[0x81] = def("STA", 2, 6, false);
    t[0x91] = def("STA", 2, 6, false);
    // STX / STY
    t[0x86] = def("STX", 2, 3, false);
    t[0x96] = def("STX", 2, 4, false);
    t[0x8E] = def("STX", 3, 4, false);
    t[0x84] = def("STY", 2, 3, false);
    t[0x94] = def("STY", 2, 4, false);
    t[0x8C] = def("STY", 3, 4, false);
    // ADC
    t[0x69] = def("ADC", 2, 2, false);
    t[0x65] = def("ADC", 2, 3, false);
    t[0x75] = def("ADC", 2, 4, false);
    t[0x6D] = def("ADC", 3, 4, false);
    t[0x7D] = def("ADC", 3, 4, true);
    t[0x79] = def("ADC", 3, 4, true);
    t[0x61] = def("ADC", 2, 6, false);
    t[0x71] = def("ADC", 2, 5, true);
    // SBC
    t[0xE9] = def("SBC", 2, 2, false);
    t[0xE5] = def("SBC", 2, 3, false);
    t[0xF5] = def("SBC", 2, 4, false);
    t[0xED] = def("SBC", 3, 4, false);
    t[0xFD] = def("SBC", 3, 4, true);
    t[0xF9] = def("SBC", 3, 4, true);
    t[0xE1] = def("SBC", 2, 6, false);
    t[0xF1] = def("SBC", 2, 5, true);
    // CMP
    t[0xC9] = def("CMP", 2, 2, false);
    t[0xC5] = def("CMP", 2, 3, false);
    t[0xD5] = def("CMP", 2, 4, false);
    t[0xCD] = def("CMP", 3, 4, false);
    t[0xDD] = def("CMP", 3, 4, true);
    t[0xD9] = def("CMP", 3, 4, true);
    t[0xC1] = def("CMP", 2, 6, false);
    t[0xD1] = def("CMP", 2, 5, true);
    // AND
    t[0x29] = def("AND", 2, 2, false);
    t[0x25] = def("AND", 2, 3, false);
    t[0x35] = def("AND", 2, 4, false);
    t[0x2D] = def("AND", 3, 4, false);
    t[0x3D] = def("AND", 3, 4, true);
    t[0x39] = def("AND", 3, 4, true);
    t[0x21] = def("AND", 2, 6, false);
    t[0x31] = def("AND", 2, 5, true);
    // ORA
    t[0x09] = def("ORA", 2, 2, false);
    t[0x05] = def("ORA", 2, 3, false);
    t[0x15] = def("ORA", 2, 4, false);
    t[0x0D] = def("ORA", 3, 4, false);
    t[0x1D] = def("ORA", 3, 4, true);
    t[0x19] = def("ORA", 3, 4, true);
    t[0x01] = def("ORA", 2, 6, false);
    t[0x11] = def("ORA", 2, 5, true);
    // EOR
    t[0x49] = def("EOR", 2, 2, false);
    t[0x45] = def("EOR", 2, 3, false);
    t[0x55] = def("EOR", 2, 4, false);
    t[0x4D] = def("EOR", 3, 4, false);
    t[0x5D] = def("EOR", 3, 4, true);
    t[0x59] = def("EOR", 3, 4, true);
    t[0x41] = def("EOR", 2, 6, false);
    t[0x51] = def("EOR", 2, 5, true);
    // BIT
    t[0x24] = def("BIT", 2, 3, false);
    t[0x2C] = def("BIT", 3, 4, false);
    // CPX / CPY
    t[0xE0] = def("CPX", 2, 2, false);
    t[0xE4] = def("CPX", 2, 3, false);
    t[0xEC] = def("CPX", 3, 4, false);
    t[0xC0] = def("CPY", 2, 2, false);
    t[0xC4] = def("CPY", 2, 3, false);
    t[0xCC] = def("CPY", 3, 4, false);
    // ASL
    t[0x0A] = def("ASL", 1, 2, false);
    t[0x06] = def("ASL", 2, 5, false);
    t[0x16] = def("ASL", 2, 6, false);
    t[0x0E] = def("ASL", 3, 6, false);
    t[0x1E] = def("ASL", 3, 7, false);
    // LSR
    t[0x4A] = def("LSR", 1, 2, false);
    t[0x46] = def("LSR", 2, 5, false);
    t[0x56] = def("LSR", 2, 6, false);
    t[0x4E] = def("LSR", 3, 6, false);
    t[0x5E] = def("LSR", 3, 7, false);
    // ROL
    t[0x2A] = def("ROL", 1, 2, false);
    t[0x26] = def("ROL", 2, 5, false);
    t[0x36] = def("ROL", 2, 6, false);
    t[0x2E] = def("ROL", 3, 6, false);
    t[0x3E] = def("ROL", 3, 7, false);
    // ROR
    t[0x6A] = def("ROR", 1, 2, false);
    t[0x66] = def("ROR", 2, 5, false);
    t[0x76] = def("ROR", 2, 6, false);
    t[0x6E] = def("ROR", 3, 6, false);
    t[0x7E] = def("ROR", 3, 7, false);
    // INC / DEC
    t[0xE6] = def("INC", 2, 5, false);
    t[0xF6] = def("INC", 2, 6, false);
    t[0xEE] = def("INC", 3, 6, false);
    t[0xFE] = def("INC", 3, 7, false);
    t[0xC6] = def("DEC", 2, 5, false);
    t[0xD6] = def("DEC", 2, 6, false);
    t[0xCE] = def("DEC", 3, 6, false);
    t[0xDE] = def("DEC", 3, 7, false);
    // Flags
    t[0x18] = def("CLC", 1, 2, false);
    t[0x38] = def("SEC", 1, 2, false);
    t[0x58] = def("CLI", 1, 2, false);
    t[0x78] = def("SEI", 1, 2, false);
    t[0xB8] = def("CLV", 1, 2, false);
    t[0xD8] = def("CLD", 1, 2, false);
    t[0xF8] = def("SED", 1, 2, false);
    // Transfers
    t[0xAA] = def("TAX", 1, 2, false);
    t[0xA8] = def("TAY", 1, 2, false);
    t[0x8A] = def("TXA", 1, 2, false);
    t[0x98] = def("TYA", 1, 2, false);
    t[0xBA] = def("TSX", 1, 2, false);
    t[0x9A] = def("TXS", 1, 2, false);
    // Register inc/dec
    t[0xE8] = def("INX", 1, 2, false);
    t[0xC8] = def("INY", 1, 2, false);
    t[0xCA] = def("DEX", 1, 2, false);
    t[0x88] = def("DEY", 1, 2, false);
    // NOP
    t[0xEA] = def("NOP", 1, 2, false);
    // Branches (base=not-taken; +1 taken, +2 taken across page)
    t[0x10] = def("BPL", 2, 2, false);
    t[0x30] = def("BMI", 2, 2, false);
    t[0x50] = def("BVC", 2, 2, false);
    t[0x70] = def("BVS", 2, 2, false);
    t[0x90] = def("BCC", 2, 2, false);
    t[0xB0] = def("BCS", 2, 2, false);
    t[0xD0] = def("BNE", 2, 2, false);
    t[0xF0] = def("BEQ", 2, 2, false);
    // Jumps
    t[0x4C] = def("JMP", 3, 3, false);
    t[0x6C] = def("JMP", 3, 5, false);
    t[0x20] = def("JSR", 3, 6, false);
    t[0x60] = def("RTS", 1, 6, false);
    t[0x40] = def("RTI", 1, 6, false);
    // Stack
    t[0x48] = def("PHA", 1, 3, false);
    t[0x68] = def("PLA", 1, 4, false);
    t[0x08] = def("PHP", 1, 3, false);
    t[0x28] = def("PLP", 1, 4, false);
    // BRK
    t[0x00] = def("BRK", 2, 7, false);
    t
}

static OPCODE_TABLE: [InstructionDef; 256] = build_table();

pub fn opcode_def(opcode: u8) -> &'static InstructionDef {
    &OPCODE_TABLE[opcode as usize]
}

/// Cycle-by-cycle execution record for the instruction in flight. Lets the
/// conformance suite check timing and addressing-mode bug flags without
/// re-deriving them from the opcode table.
#[derive(Copy, Clone, Debug)]
pub struct CpuResult {
    pub defn: &'static InstructionDef,
    pub pc: u16,
    pub byte_count: u8,
    pub instruction_data: u16,
    pub cycles: u8,
    pub page_fault: bool,
    pub branch_success: bool,
    pub cpu_bug: CpuBug,
    pub is_final: bool,
}

impl CpuResult {
    /// Checks the invariants used by the conformance suite: `final &&
    /// byte_count == defn.bytes && (page_fault ⇒ defn.page_sensitive) &&
    /// cycles ∈ allowed_set`. Not consulted on the hot path - test-only.
    pub fn is_valid(&self) -> Result<(), CpuError> {
        if !self.is_final {
            return Err(CpuError::ExecutionNotFinalised);
        }
        if self.byte_count != self.defn.bytes {
            return Err(CpuError::ByteCountMismatch);
        }
        if self.page_fault && !self.defn.page_sensitive {
            return Err(CpuError::UnexpectedPageFault);
        }
        let base = self.defn.cycles;
        let allowed = self.cycles == base
            || (self.defn.page_sensitive && self.cycles == base + 1)
            || (self.branch_success && (self.cycles == base + 1 || self.cycles == base + 2));
        if !allowed {
            return Err(CpuError::CycleCountMismatch);
        }
        Ok(())
    }
}

/// Failure modes from [`CpuResult::is_valid`]. Test/debug-only - the
/// emulation path never constructs or checks them at runtime.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CpuError {
    #[error("CpuResult read before the instruction finished accumulating cycles")]
    ExecutionNotFinalised,
    #[error("page_fault set on an opcode whose InstructionDef is not page_sensitive")]
    UnexpectedPageFault,
    #[error("byte_count does not match the opcode's InstructionDef")]
    ByteCountMismatch,
    #[error("cycles fell outside every count the opcode's InstructionDef allows")]
    CycleCountMismatch,
}

pub struct Mos6507 {
    // Registers
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub pc: u16,
    pub sp: u8,
    pub p: u8,

    // Internal pipeline state
    pub(crate) state: ExecState,
    pub(crate) opcode: u8,
    pub(crate) temp_addr: u16,
    /// Temporary data storage for multi-cycle operations (RMW operand, address bytes)
    pub(crate) temp_data: u8,
    /// Interrupt type being processed: 0=none, 1=NMI, 2=IRQ
    pub(crate) interrupt_type: u8,
    /// Previous NMI line state for edge detection
    pub(crate) nmi_previous: bool,

    // CpuResult bookkeeping for the instruction currently in flight.
    pub(crate) instr_pc: u16,
    pub(crate) elapsed_cycles: u8,
    pub(crate) page_fault: bool,
    pub(crate) branch_success: bool,
    pub(crate) bug: CpuBug,
    pub(crate) raw0: u8,
    pub(crate) raw1: u8,
}

#[derive(Clone, Debug)]
pub(crate) enum ExecState {
    Fetch,
    Execute(u8, u8), // (opcode, cycle)
    /// Hardware interrupt response sequence. Unused by the VCS (the 6507 has
    /// no IRQ/NMI pins bonded out) but kept so the bus-level
    /// `check_interrupts` plumbing stays generic across machines.
    Interrupt(u8),
}

impl Default for Mos6507 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mos6507 {
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            pc: 0,
            sp: 0xFD,
            p: 0x24, // I=1, U=1
            state: ExecState::Fetch,
            opcode: 0,
            temp_addr: 0,
            temp_data: 0,
            interrupt_type: 0,
            nmi_previous: false,
            instr_pc: 0,
            elapsed_cycles: 0,
            page_fault: false,
            branch_success: false,
            bug: CpuBug::None,
            raw0: 0,
            raw1: 0,
        }
    }

    /// Snapshot of the instruction currently in flight (or just completed, if
    /// `is_final` is true). Safe to call after every `execute_cycle`.
    pub fn result(&self) -> CpuResult {
        let defn = opcode_def(self.opcode);
        let instruction_data = match defn.bytes {
            3 => self.raw0 as u16 | ((self.raw1 as u16) << 8),
            2 => self.raw0 as u16,
            _ => 0,
        };
        CpuResult {
            defn,
            pc: self.instr_pc,
            byte_count: defn.bytes,
            instruction_data,
            cycles: self.elapsed_cycles,
            page_fault: self.page_fault,
            branch_success: self.branch_success,
            cpu_bug: self.bug,
            is_final: matches!(self.state, ExecState::Fetch),
        }
    }

    #[inline]
    pub(crate) fn set_flag(&mut self, flag: StatusFlag, set: bool) {
        if set {
            self.p |= flag as u8;
        } else {
            self.p &= !(flag as u8);
        }
    }

    /// Advance the CPU by exactly one bus cycle. Callers that want
    /// instruction-at-a-time semantics call this in a loop until
    /// `result().is_final`.
    pub fn execute_cycle<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        master: BusMaster,
    ) {
        match self.state {
            ExecState::Fetch => {
                let ints = bus.check_interrupts(master);
                if self.handle_interrupts(ints) {
                    return;
                }
                self.instr_pc = self.pc;
                self.elapsed_cycles = 1;
                self.page_fault = false;
                self.branch_success = false;
                self.bug = CpuBug::None;
                self.raw0 = 0;
                self.raw1 = 0;
                self.opcode = bus.read(master, self.pc);
                self.pc = self.pc.wrapping_add(1);
                self.state = ExecState::Execute(self.opcode, 0);
            }
            ExecState::Execute(op, cyc) => {
                self.elapsed_cycles += 1;
                self.execute_instruction(op, cyc, bus, master);
            }
            ExecState::Interrupt(cycle) => {
                self.execute_interrupt(cycle, bus, master);
            }
        }
    }

    fn execute_instruction<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        match opcode {
            // --- LDA ---
            0xA9 => self.op_lda_imm(cycle, bus, master),
            0xA5 => self.op_lda_zp(cycle, bus, master),
            0xB5 => self.op_lda_zp_x(cycle, bus, master),
            0xAD => self.op_lda_abs(cycle, bus, master),
            0xBD => self.op_lda_abs_x(cycle, bus, master),
            0xB9 => self.op_lda_abs_y(cycle, bus, master),
            0xA1 => self.op_lda_ind_x(cycle, bus, master),
            0xB1 => self.op_lda_ind_y(cycle, bus, master),

            // --- LDX ---
            0xA2 => self.op_ldx_imm(cycle, bus, master),
            0xA6 => self.op_ldx_zp(cycle, bus, master),
            0xB6 => self.op_ldx_zp_y(cycle, bus, master),
            0xAE => self.op_ldx_abs(cycle, bus, master),
            0xBE => self.op_ldx_abs_y(cycle, bus, master),

            // --- LDY ---
            0xA0 => self.op_ldy_imm(cycle, bus, master),
            0xA4 => self.op_ldy_zp(cycle, bus, master),
            0xB4 => self.op_ldy_zp_x(cycle, bus, master),
            0xAC => self.op_ldy_abs(cycle, bus, master),
            0xBC => self.op_ldy_abs_x(cycle, bus, master),

            // --- STA ---
            0x85 => self.op_sta_zp(cycle, bus, master),
            0x95 => self.op_sta_zp_x(cycle, bus, master),
            0x8D => self.op_sta_abs(cycle, bus, master),
            0x9D => self.op_sta_abs_x(cycle, bus, master),
            0x99 => self.op_sta_abs_y(cycle, bus, master),
            0x81 => self.op_sta_ind_x(cycle, bus, master),
            0x91 => self.op_sta_ind_y(cycle, bus, master),

            // --- STX ---
            0x86 => self.op_stx_zp(cycle, bus, master),
            0x96 => self.op_stx_zp_y(cycle, bus, master),
            0x8E => self.op_stx_abs(cycle, bus, master),

            // --- STY ---
            0x84 => self.op_sty_zp(cycle, bus, master),
            0x94 => self.op_sty_zp_x(cycle, bus, master),
            0x8C => self.op_sty_abs(cycle, bus, master),

            // --- ADC ---
            0x69 => self.op_adc_imm(cycle, bus, master),
            0x65 => self.op_adc_zp(cycle, bus, master),
            0x75 => self.op_adc_zp_x(cycle, bus, master),
            0x6D => self.op_adc_abs(cycle, bus, master),
            0x7D => self.op_adc_abs_x(cycle, bus, master),
            0x79 => self.op_adc_abs_y(cycle, bus, master),
            0x61 => self.op_adc_ind_x(cycle, bus, master),
            0x71 => self.op_adc_ind_y(cycle, bus, master),

            // --- SBC ---
            0xE9 => self.op_sbc_imm(cycle, bus, master),
            0xE5 => self.op_sbc_zp(cycle, bus, master),
            0xF5 => self.op_sbc_zp_x(cycle, bus, master),
            0xED => self.op_sbc_abs(cycle, bus, master),
            0xFD => self.op_sbc_abs_x(cycle, bus, master),
            0xF9 => self.op_sbc_abs_y(cycle, bus, master),
            0xE1 => self.op_sbc_ind_x(cycle, bus, master),
            0xF1 => self.op_sbc_ind_y(cycle, bus, master),

            // --- CMP ---
            0xC9 => self.op_cmp_imm(cycle, bus, master),
            0xC5 => self.op_cmp_zp(cycle, bus, master),
            0xD5 => self.op_cmp_zp_x(cycle, bus, master),
            0xCD => self.op_cmp_abs(cycle, bus, master),
            0xDD => self.op_cmp_abs_x(cycle, bus, master),
            0xD9 => self.op_cmp_abs_y(cycle, bus, master),
            0xC1 => self.op_cmp_ind_x(cycle, bus, master),
            0xD1 => self.op_cmp_ind_y(cycle, bus, master),

            // --- AND ---
            0x29 => self.op_and_imm(cycle, bus, master),
            0x25 => self.op_and_zp(cycle, bus, master),
            0x35 => self.op_and_zp_x(cycle, bus, master),
            0x2D => self.op_and_abs(cycle, bus, master),
            0x3D => self.op_and_abs_x(cycle, bus, master),
            0x39 => self.op_and_abs_y(cycle, bus, master),
            0x21 => self.op_and_ind_x(cycle, bus, master),
            0x31 => self.op_and_ind_y(cycle, bus, master),

            // --- ORA ---
            0x09 => self.op_ora_imm(cycle, bus, master),
            0x05 => self.op_ora_zp(cycle, bus, master),
            0x15 => self.op_ora_zp_x(cycle, bus, master),
            0x0D => self.op_ora_abs(cycle, bus, master),
            0x1D => self.op_ora_abs_x(cycle, bus, master),
            0x19 => self.op_ora_abs_y(cycle, bus, master),
            0x01 => self.op_ora_ind_x(cycle, bus, master),
            0x11 => self.op_ora_ind_y(cycle, bus, master),

            // --- EOR ---
            0x49 => self.op_eor_imm(cycle, bus, master),
            0x45 => self.op_eor_zp(cycle, bus, master),
            0x55 => self.op_eor_zp_x(cycle, bus, master),
            0x4D => self.op_eor_abs(cycle, bus, master),
            0x5D => self.op_eor_abs_x(cycle, bus, master),
            0x59 => self.op_eor_abs_y(cycle, bus, master),
            0x41 => self.op_eor_ind_x(cycle, bus, master),
            0x51 => self.op_eor_ind_y(cycle, bus, master),

            // --- BIT ---
            0x24 => self.op_bit_zp(cycle, bus, master),
            0x2C => self.op_bit_abs(cycle, bus, master),

            // --- CPX ---
            0xE0 => self.op_cpx_imm(cycle, bus, master),
            0xE4 => self.op_cpx_zp(cycle, bus, master),
            0xEC => self.op_cpx_abs(cycle, bus, master),

            // --- CPY ---
            0xC0 => self.op_cpy_imm(cycle, bus, master),
            0xC4 => self.op_cpy_zp(cycle, bus, master),
            0xCC => self.op_cpy_abs(cycle, bus, master),

            // --- ASL ---
            0x0A => {
                if cycle == 0 {
                    self.a = self.perform_asl(self.a);
                    self.state = ExecState::Fetch;
                }
            }
            0x06 => self.op_asl_zp(cycle, bus, master),
            0x16 => self.op_asl_zp_x(cycle, bus, master),
            0x0E => self.op_asl_abs(cycle, bus, master),
            0x1E => self.op_asl_abs_x(cycle, bus, master),

            // --- LSR ---
            0x4A => {
                if cycle == 0 {
                    self.a = self.perform_lsr(self.a);
                    self.state = ExecState::Fetch;
                }
            }
            0x46 => self.op_lsr_zp(cycle, bus, master),
            0x56 => self.op_lsr_zp_x(cycle, bus, master),
            0x4E => self.op_lsr_abs(cycle, bus, master),
            0x5E => self.op_lsr_abs_x(cycle, bus, master),

            // --- ROL ---
            0x2A => {
                if cycle == 0 {
                    self.a = self.perform_rol(self.a);
                    self.state = ExecState::Fetch;
                }
            }
            0x26 => self.op_rol_zp(cycle, bus, master),
            0x36 => self.op_rol_zp_x(cycle, bus, master),
            0x2E => self.op_rol_abs(cycle, bus, master),
            0x3E => self.op_rol_abs_x(cycle, bus, master),

            // --- ROR ---
            0x6A => {
                if cycle == 0 {
                    self.a = self.perform_ror(self.a);
                    self.state = ExecState::Fetch;
                }
            }
            0x66 => self.op_ror_zp(cycle, bus, master),
            0x76 => self.op_ror_zp_x(cycle, bus, master),
            0x6E => self.op_ror_abs(cycle, bus, master),
            0x7E => self.op_ror_abs_x(cycle, bus, master),

            // --- INC ---
            0xE6 => self.op_inc_zp(cycle, bus, master),
            0xF6 => self.op_inc_zp_x(cycle, bus, master),
            0xEE => self.op_inc_abs(cycle, bus, master),
            0xFE => self.op_inc_abs_x(cycle, bus, master),

            // --- DEC ---
            0xC6 => self.op_dec_zp(cycle, bus, master),
            0xD6 => self.op_dec_zp_x(cycle, bus, master),
            0xCE => self.op_dec_abs(cycle, bus, master),
            0xDE => self.op_dec_abs_x(cycle, bus, master),

            // --- Flag instructions (all 2-cycle implied) ---
            0x18 => {
                if cycle == 0 {
                    self.set_flag(StatusFlag::C, false);
                    self.state = ExecState::Fetch;
                }
            }
            0x38 => {
                if cycle == 0 {
                    self.set_flag(StatusFlag::C, true);
                    self.state = ExecState::Fetch;
                }
            }
            0x58 => {
                if cycle == 0 {
                    self.set_flag(StatusFlag::I, false);
                    self.state = ExecState::Fetch;
                }
            }
            0x78 => {
                if cycle == 0 {
                    self.set_flag(StatusFlag::I, true);
                    self.state = ExecState::Fetch;
                }
            }
            0xB8 => {
                if cycle == 0 {
                    self.set_flag(StatusFlag::V, false);
                    self.state = ExecState::Fetch;
                }
            }
            0xD8 => {
                if cycle == 0 {
                    self.set_flag(StatusFlag::D, false);
                    self.state = ExecState::Fetch;
                }
            }
            0xF8 => {
                if cycle == 0 {
                    self.set_flag(StatusFlag::D, true);
                    self.state = ExecState::Fetch;
                }
            }

            // --- Transfer instructions (all 2-cycle implied) ---
            0xAA => {
                if cycle == 0 {
                    self.x = self.a;
                    self.set_nz(self.x);
                    self.state = ExecState::Fetch;
                }
            }
            0xA8 => {
                if cycle == 0 {
                    self.y = self.a;
                    self.set_nz(self.y);
                    self.state = ExecState::Fetch;
                }
            }
            0x8A => {
                if cycle == 0 {
                    self.a = self.x;
                    self.set_nz(self.a);
                    self.state = ExecState::Fetch;
                }
            }
            0x98 => {
                if cycle == 0 {
                    self.a = self.y;
                    self.set_nz(self.a);
                    self.state = ExecState::Fetch;
                }
            }
            0xBA => {
                if cycle == 0 {
                    self.x = self.sp;
                    self.set_nz(self.x);
                    self.state = ExecState::Fetch;
                }
            }
            0x9A => {
                // TXS does NOT set flags
                if cycle == 0 {
                    self.sp = self.x;
                    self.state = ExecState::Fetch;
                }
            }

            // --- Register increment/decrement (all 2-cycle implied) ---
            0xE8 => {
                if cycle == 0 {
                    self.x = self.x.wrapping_add(1);
                    self.set_nz(self.x);
                    self.state = ExecState::Fetch;
                }
            }
            0xC8 => {
                if cycle == 0 {
                    self.y = self.y.wrapping_add(1);
                    self.set_nz(self.y);
                    self.state = ExecState::Fetch;
                }
            }
            0xCA => {
                if cycle == 0 {
                    self.x = self.x.wrapping_sub(1);
                    self.set_nz(self.x);
                    self.state = ExecState::Fetch;
                }
            }
            0x88 => {
                if cycle == 0 {
                    self.y = self.y.wrapping_sub(1);
                    self.set_nz(self.y);
                    self.state = ExecState::Fetch;
                }
            }

            // --- NOP (2-cycle implied) ---
            0xEA => {
                if cycle == 0 {
                    self.state = ExecState::Fetch;
                }
            }

            // --- Branches ---
            0x10 => self.op_bpl(cycle, bus, master),
            0x30 => self.op_bmi(cycle, bus, master),
            0x50 => self.op_bvc(cycle, bus, master),
            0x70 => self.op_bvs(cycle, bus, master),
            0x90 => self.op_bcc(cycle, bus, master),
            0xB0 => self.op_bcs(cycle, bus, master),
            0xD0 => self.op_bne(cycle, bus, master),
            0xF0 => self.op_beq(cycle, bus, master),

            // --- Jumps ---
            0x4C => self.op_jmp_abs(cycle, bus, master),
            0x6C => self.op_jmp_ind(cycle, bus, master),
            0x20 => self.op_jsr(cycle, bus, master),
            0x60 => self.op_rts(cycle, bus, master),
            0x40 => self.op_rti(cycle, bus, master),

            // --- Stack ---
            0x48 => self.op_pha(cycle, bus, master),
            0x68 => self.op_pla(cycle, bus, master),
            0x08 => self.op_php(cycle, bus, master),
            0x28 => self.op_plp(cycle, bus, master),

            // --- BRK ---
            0x00 => self.op_brk(cycle, bus, master),

            // Unknown opcode: just fetch next (matches the table's 1-byte/
            // 2-cycle placeholder entry).
            _ => {
                self.state = ExecState::Fetch;
            }
        }
    }

    /// Check for pending interrupts during Fetch state. Returns true if an
    /// interrupt was taken (state transitions to the Interrupt sequence).
    fn handle_interrupts(&mut self, ints: InterruptState) -> bool {
        let nmi_edge = ints.nmi && !self.nmi_previous;
        self.nmi_previous = ints.nmi;

        if nmi_edge {
            self.interrupt_type = 1; // NMI
            self.state = ExecState::Interrupt(0);
            return true;
        }

        if ints.irq && (self.p & StatusFlag::I as u8) == 0 {
            self.interrupt_type = 2; // IRQ
            self.state = ExecState::Interrupt(0);
            return true;
        }

        false
    }

    /// Hardware interrupt sequence (NMI/IRQ). Dead weight on a real VCS
    /// (neither line is bonded out on the 6507 package) but kept so the core
    /// stays usable as a plain 6502 target by the bus-generic machinery.
    fn execute_interrupt<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        match cycle {
            0 => {
                self.state = ExecState::Interrupt(1);
            }
            1 => {
                bus.write(master, 0x0100 | self.sp as u16, (self.pc >> 8) as u8);
                self.sp = self.sp.wrapping_sub(1);
                self.state = ExecState::Interrupt(2);
            }
            2 => {
                bus.write(master, 0x0100 | self.sp as u16, self.pc as u8);
                self.sp = self.sp.wrapping_sub(1);
                self.state = ExecState::Interrupt(3);
            }
            3 => {
                let p_push = (self.p | StatusFlag::U as u8) & !(StatusFlag::B as u8);
                bus.write(master, 0x0100 | self.sp as u16, p_push);
                self.sp = self.sp.wrapping_sub(1);
                self.state = ExecState::Interrupt(4);
            }
            4 => {
                self.set_flag(StatusFlag::I, true);
                let vector_addr = if self.interrupt_type == 1 { 0xFFFA } else { 0xFFFE };
                self.pc = bus.read(master, vector_addr) as u16;
                self.state = ExecState::Interrupt(5);
            }
            5 => {
                let vector_addr = if self.interrupt_type == 1 { 0xFFFB } else { 0xFFFF };
                self.pc |= (bus.read(master, vector_addr) as u16) << 8;
                self.interrupt_type = 0;
                self.state = ExecState::Fetch;
            }
            _ => self.state = ExecState::Fetch,
        }
    }
}

impl Component for Mos6507 {
    fn tick(&mut self) -> bool {
        false
    }
}

impl BusMasterComponent for Mos6507 {
    type Bus = dyn Bus<Address = u16, Data = u8>;

    fn tick_with_bus(&mut self, bus: &mut Self::Bus, master: BusMaster) -> bool {
        self.execute_cycle(bus, master);
        matches!(self.state, ExecState::Fetch)
    }
}

impl Cpu for Mos6507 {
    fn reset(&mut self) {
        self.sp = 0xFD;
        self.p = 0x24;
        self.state = ExecState::Fetch;
        // PC is loaded from the reset vector by the orchestrator's bus read
        // (0xFFFC/0xFFFD), not hardcoded here - the vector lives in
        // cartridge ROM, not CPU state.
    }

    fn signal_interrupt(&mut self, _int: InterruptState) {}

    fn is_sleeping(&self) -> bool {
        false
    }
}

impl CpuStateTrait for Mos6507 {
    type Snapshot = Mos6507State;

    fn snapshot(&self) -> Mos6507State {
        Mos6507State {
            a: self.a,
            x: self.x,
            y: self.y,
            pc: self.pc,
            sp: self.sp,
            p: self.p,
        }
    }

    fn plumb(&mut self, snapshot: Mos6507State) {
        self.a = snapshot.a;
        self.x = snapshot.x;
        self.y = snapshot.y;
        self.pc = snapshot.pc;
        self.sp = snapshot.sp;
        self.p = snapshot.p;
        self.state = ExecState::Fetch;
    }
}

// ---- ALU dispatch table: ADC/SBC/CMP/AND/ORA/EOR/BIT/CPX/CPY across every
// addressing mode this opcode set uses. Each just selects an addressing-mode
// helper from alu.rs (which tracks raw0/raw1/cpu_bug) and a closure for the
// operation itself.
impl Mos6507 {
    // ---- ADC (Add with Carry) ----

    /// ADC Immediate (0x69) - 2 cycles
    pub(crate) fn op_adc_imm<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_imm(cycle, bus, master, |cpu, op| cpu.perform_adc(op));
    }

    /// ADC Zero Page (0x65) - 3 cycles
    pub(crate) fn op_adc_zp<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_zp(cycle, bus, master, |cpu, op| cpu.perform_adc(op));
    }

    /// ADC Zero Page,X (0x75) - 4 cycles
    pub(crate) fn op_adc_zp_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_zp_x(cycle, bus, master, |cpu, op| cpu.perform_adc(op));
    }

    /// ADC Absolute (0x6D) - 4 cycles
    pub(crate) fn op_adc_abs<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_abs(cycle, bus, master, |cpu, op| cpu.perform_adc(op));
    }

    /// ADC Absolute,X (0x7D) - 4 or 5 cycles
    pub(crate) fn op_adc_abs_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_abs_x(cycle, bus, master, |cpu, op| cpu.perform_adc(op));
    }

    /// ADC Absolute,Y (0x79) - 4 or 5 cycles
    pub(crate) fn op_adc_abs_y<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_abs_y(cycle, bus, master, |cpu, op| cpu.perform_adc(op));
    }

    /// ADC (Indirect,X) (0x61) - 6 cycles
    pub(crate) fn op_adc_ind_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_ind_x(cycle, bus, master, |cpu, op| cpu.perform_adc(op));
    }

    /// ADC (Indirect),Y (0x71) - 5 or 6 cycles
    pub(crate) fn op_adc_ind_y<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_ind_y(cycle, bus, master, |cpu, op| cpu.perform_adc(op));
    }

    // ---- SBC (Subtract with Carry) ----

    /// SBC Immediate (0xE9) - 2 cycles
    pub(crate) fn op_sbc_imm<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_imm(cycle, bus, master, |cpu, op| cpu.perform_sbc(op));
    }

    /// SBC Zero Page (0xE5) - 3 cycles
    pub(crate) fn op_sbc_zp<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_zp(cycle, bus, master, |cpu, op| cpu.perform_sbc(op));
    }

    /// SBC Zero Page,X (0xF5) - 4 cycles
    pub(crate) fn op_sbc_zp_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_zp_x(cycle, bus, master, |cpu, op| cpu.perform_sbc(op));
    }

    /// SBC Absolute (0xED) - 4 cycles
    pub(crate) fn op_sbc_abs<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_abs(cycle, bus, master, |cpu, op| cpu.perform_sbc(op));
    }

    /// SBC Absolute,X (0xFD) - 4 or 5 cycles
    pub(crate) fn op_sbc_abs_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_abs_x(cycle, bus, master, |cpu, op| cpu.perform_sbc(op));
    }

    /// SBC Absolute,Y (0xF9) - 4 or 5 cycles
    pub(crate) fn op_sbc_abs_y<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_abs_y(cycle, bus, master, |cpu, op| cpu.perform_sbc(op));
    }

    /// SBC (Indirect,X) (0xE1) - 6 cycles
    pub(crate) fn op_sbc_ind_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_ind_x(cycle, bus, master, |cpu, op| cpu.perform_sbc(op));
    }

    /// SBC (Indirect),Y (0xF1) - 5 or 6 cycles
    pub(crate) fn op_sbc_ind_y<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_ind_y(cycle, bus, master, |cpu, op| cpu.perform_sbc(op));
    }

    // ---- CMP (Compare Accumulator) ----

    /// CMP Immediate (0xC9) - 2 cycles
    pub(crate) fn op_cmp_imm<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_imm(cycle, bus, master, |cpu, op| {
            let a = cpu.a;
            cpu.perform_compare(a, op);
        });
    }

    /// CMP Zero Page (0xC5) - 3 cycles
    pub(crate) fn op_cmp_zp<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_zp(cycle, bus, master, |cpu, op| {
            let a = cpu.a;
            cpu.perform_compare(a, op);
        });
    }

    /// CMP Zero Page,X (0xD5) - 4 cycles
    pub(crate) fn op_cmp_zp_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_zp_x(cycle, bus, master, |cpu, op| {
            let a = cpu.a;
            cpu.perform_compare(a, op);
        });
    }

    /// CMP Absolute (0xCD) - 4 cycles
    pub(crate) fn op_cmp_abs<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_abs(cycle, bus, master, |cpu, op| {
            let a = cpu.a;
            cpu.perform_compare(a, op);
        });
    }

    /// CMP Absolute,X (0xDD) - 4 or 5 cycles
    pub(crate) fn op_cmp_abs_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_abs_x(cycle, bus, master, |cpu, op| {
            let a = cpu.a;
            cpu.perform_compare(a, op);
        });
    }

    /// CMP Absolute,Y (0xD9) - 4 or 5 cycles
    pub(crate) fn op_cmp_abs_y<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_abs_y(cycle, bus, master, |cpu, op| {
            let a = cpu.a;
            cpu.perform_compare(a, op);
        });
    }

    /// CMP (Indirect,X) (0xC1) - 6 cycles
    pub(crate) fn op_cmp_ind_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_ind_x(cycle, bus, master, |cpu, op| {
            let a = cpu.a;
            cpu.perform_compare(a, op);
        });
    }

    /// CMP (Indirect),Y (0xD1) - 5 or 6 cycles
    pub(crate) fn op_cmp_ind_y<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_ind_y(cycle, bus, master, |cpu, op| {
            let a = cpu.a;
            cpu.perform_compare(a, op);
        });
    }

    // ---- AND (Logical AND) ----

    /// AND Immediate (0x29) - 2 cycles
    pub(crate) fn op_and_imm<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_imm(cycle, bus, master, |cpu, op| cpu.perform_and(op));
    }

    /// AND Zero Page (0x25) - 3 cycles
    pub(crate) fn op_and_zp<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_zp(cycle, bus, master, |cpu, op| cpu.perform_and(op));
    }

    /// AND Zero Page,X (0x35) - 4 cycles
    pub(crate) fn op_and_zp_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_zp_x(cycle, bus, master, |cpu, op| cpu.perform_and(op));
    }

    /// AND Absolute (0x2D) - 4 cycles
    pub(crate) fn op_and_abs<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_abs(cycle, bus, master, |cpu, op| cpu.perform_and(op));
    }

    /// AND Absolute,X (0x3D) - 4 or 5 cycles
    pub(crate) fn op_and_abs_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_abs_x(cycle, bus, master, |cpu, op| cpu.perform_and(op));
    }

    /// AND Absolute,Y (0x39) - 4 or 5 cycles
    pub(crate) fn op_and_abs_y<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_abs_y(cycle, bus, master, |cpu, op| cpu.perform_and(op));
    }

    /// AND (Indirect,X) (0x21) - 6 cycles
    pub(crate) fn op_and_ind_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_ind_x(cycle, bus, master, |cpu, op| cpu.perform_and(op));
    }

    /// AND (Indirect),Y (0x31) - 5 or 6 cycles
    pub(crate) fn op_and_ind_y<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_ind_y(cycle, bus, master, |cpu, op| cpu.perform_and(op));
    }

    // ---- ORA (Logical Inclusive OR) ----

    /// ORA Immediate (0x09) - 2 cycles
    pub(crate) fn op_ora_imm<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_imm(cycle, bus, master, |cpu, op| cpu.perform_ora(op));
    }

    /// ORA Zero Page (0x05) - 3 cycles
    pub(crate) fn op_ora_zp<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_zp(cycle, bus, master, |cpu, op| cpu.perform_ora(op));
    }

    /// ORA Zero Page,X (0x15) - 4 cycles
    pub(crate) fn op_ora_zp_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_zp_x(cycle, bus, master, |cpu, op| cpu.perform_ora(op));
    }

    /// ORA Absolute (0x0D) - 4 cycles
    pub(crate) fn op_ora_abs<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_abs(cycle, bus, master, |cpu, op| cpu.perform_ora(op));
    }

    /// ORA Absolute,X (0x1D) - 4 or 5 cycles
    pub(crate) fn op_ora_abs_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_abs_x(cycle, bus, master, |cpu, op| cpu.perform_ora(op));
    }

    /// ORA Absolute,Y (0x19) - 4 or 5 cycles
    pub(crate) fn op_ora_abs_y<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_abs_y(cycle, bus, master, |cpu, op| cpu.perform_ora(op));
    }

    /// ORA (Indirect,X) (0x01) - 6 cycles
    pub(crate) fn op_ora_ind_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_ind_x(cycle, bus, master, |cpu, op| cpu.perform_ora(op));
    }

    /// ORA (Indirect),Y (0x11) - 5 or 6 cycles
    pub(crate) fn op_ora_ind_y<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_ind_y(cycle, bus, master, |cpu, op| cpu.perform_ora(op));
    }

    // ---- EOR (Exclusive OR) ----

    /// EOR Immediate (0x49) - 2 cycles
    pub(crate) fn op_eor_imm<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_imm(cycle, bus, master, |cpu, op| cpu.perform_eor(op));
    }

    /// EOR Zero Page (0x45) - 3 cycles
    pub(crate) fn op_eor_zp<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_zp(cycle, bus, master, |cpu, op| cpu.perform_eor(op));
    }

    /// EOR Zero Page,X (0x55) - 4 cycles
    pub(crate) fn op_eor_zp_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_zp_x(cycle, bus, master, |cpu, op| cpu.perform_eor(op));
    }

    /// EOR Absolute (0x4D) - 4 cycles
    pub(crate) fn op_eor_abs<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_abs(cycle, bus, master, |cpu, op| cpu.perform_eor(op));
    }

    /// EOR Absolute,X (0x5D) - 4 or 5 cycles
    pub(crate) fn op_eor_abs_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_abs_x(cycle, bus, master, |cpu, op| cpu.perform_eor(op));
    }

    /// EOR Absolute,Y (0x59) - 4 or 5 cycles
    pub(crate) fn op_eor_abs_y<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_abs_y(cycle, bus, master, |cpu, op| cpu.perform_eor(op));
    }

    /// EOR (Indirect,X) (0x41) - 6 cycles
    pub(crate) fn op_eor_ind_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_ind_x(cycle, bus, master, |cpu, op| cpu.perform_eor(op));
    }

    /// EOR (Indirect),Y (0x51) - 5 or 6 cycles
    pub(crate) fn op_eor_ind_y<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_ind_y(cycle, bus, master, |cpu, op| cpu.perform_eor(op));
    }

    // ---- BIT (Bit Test) ----

    /// BIT Zero Page (0x24) - 3 cycles
    pub(crate) fn op_bit_zp<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_zp(cycle, bus, master, |cpu, op| cpu.perform_bit(op));
    }

    /// BIT Absolute (0x2C) - 4 cycles
    pub(crate) fn op_bit_abs<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_abs(cycle, bus, master, |cpu, op| cpu.perform_bit(op));
    }

    // ---- CPX (Compare X Register) ----

    /// CPX Immediate (0xE0) - 2 cycles
    pub(crate) fn op_cpx_imm<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_imm(cycle, bus, master, |cpu, op| {
            let x = cpu.x;
            cpu.perform_compare(x, op);
        });
    }

    /// CPX Zero Page (0xE4) - 3 cycles
    pub(crate) fn op_cpx_zp<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_zp(cycle, bus, master, |cpu, op| {
            let x = cpu.x;
            cpu.perform_compare(x, op);
        });
    }

    /// CPX Absolute (0xEC) - 4 cycles
    pub(crate) fn op_cpx_abs<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_abs(cycle, bus, master, |cpu, op| {
            let x = cpu.x;
            cpu.perform_compare(x, op);
        });
    }

    // ---- CPY (Compare Y Register) ----

    /// CPY Immediate (0xC0) - 2 cycles
    pub(crate) fn op_cpy_imm<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_imm(cycle, bus, master, |cpu, op| {
            let y = cpu.y;
            cpu.perform_compare(y, op);
        });
    }

    /// CPY Zero Page (0xC4) - 3 cycles
    pub(crate) fn op_cpy_zp<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_zp(cycle, bus, master, |cpu, op| {
            let y = cpu.y;
            cpu.perform_compare(y, op);
        });
    }

    /// CPY Absolute (0xCC) - 4 cycles
    pub(crate) fn op_cpy_abs<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.alu_abs(cycle, bus, master, |cpu, op| {
            let y = cpu.y;
            cpu.perform_compare(y, op);
        });
    }
}

// ---- Read-modify-write dispatch table: ASL/LSR/ROL/ROR across their memory
// addressing modes, via the rmw_* helpers in alu.rs.
impl Mos6507 {
    // ---- ASL (Arithmetic Shift Left) - Memory modes ----

    /// ASL Zero Page (0x06) - 5 cycles. N, Z, C affected. C = old bit 7.
    pub(crate) fn op_asl_zp<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_zp(cycle, bus, master, |cpu, val| cpu.perform_asl(val));
    }

    /// ASL Zero Page,X (0x16) - 6 cycles. N, Z, C affected. C = old bit 7.
    pub(crate) fn op_asl_zp_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_zp_x(cycle, bus, master, |cpu, val| cpu.perform_asl(val));
    }

    /// ASL Absolute (0x0E) - 6 cycles. N, Z, C affected. C = old bit 7.
    pub(crate) fn op_asl_abs<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_abs(cycle, bus, master, |cpu, val| cpu.perform_asl(val));
    }

    /// ASL Absolute,X (0x1E) - 7 cycles. N, Z, C affected. C = old bit 7.
    pub(crate) fn op_asl_abs_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_abs_x(cycle, bus, master, |cpu, val| cpu.perform_asl(val));
    }

    // ---- LSR (Logical Shift Right) - Memory modes ----

    /// LSR Zero Page (0x46) - 5 cycles. N cleared, Z, C affected. C = old bit 0.
    pub(crate) fn op_lsr_zp<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_zp(cycle, bus, master, |cpu, val| cpu.perform_lsr(val));
    }

    /// LSR Zero Page,X (0x56) - 6 cycles. N cleared, Z, C affected. C = old bit 0.
    pub(crate) fn op_lsr_zp_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_zp_x(cycle, bus, master, |cpu, val| cpu.perform_lsr(val));
    }

    /// LSR Absolute (0x4E) - 6 cycles. N cleared, Z, C affected. C = old bit 0.
    pub(crate) fn op_lsr_abs<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_abs(cycle, bus, master, |cpu, val| cpu.perform_lsr(val));
    }

    /// LSR Absolute,X (0x5E) - 7 cycles. N cleared, Z, C affected. C = old bit 0.
    pub(crate) fn op_lsr_abs_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_abs_x(cycle, bus, master, |cpu, val| cpu.perform_lsr(val));
    }

    // ---- ROL (Rotate Left) - Memory modes ----

    /// ROL Zero Page (0x26) - 5 cycles. N, Z, C affected. C = old bit 7.
    pub(crate) fn op_rol_zp<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_zp(cycle, bus, master, |cpu, val| cpu.perform_rol(val));
    }

    /// ROL Zero Page,X (0x36) - 6 cycles. N, Z, C affected. C = old bit 7.
    pub(crate) fn op_rol_zp_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_zp_x(cycle, bus, master, |cpu, val| cpu.perform_rol(val));
    }

    /// ROL Absolute (0x2E) - 6 cycles. N, Z, C affected. C = old bit 7.
    pub(crate) fn op_rol_abs<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_abs(cycle, bus, master, |cpu, val| cpu.perform_rol(val));
    }

    /// ROL Absolute,X (0x3E) - 7 cycles. N, Z, C affected. C = old bit 7.
    pub(crate) fn op_rol_abs_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_abs_x(cycle, bus, master, |cpu, val| cpu.perform_rol(val));
    }

    // ---- ROR (Rotate Right) - Memory modes ----

    /// ROR Zero Page (0x66) - 5 cycles. N, Z, C affected. C = old bit 0.
    pub(crate) fn op_ror_zp<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_zp(cycle, bus, master, |cpu, val| cpu.perform_ror(val));
    }

    /// ROR Zero Page,X (0x76) - 6 cycles. N, Z, C affected. C = old bit 0.
    pub(crate) fn op_ror_zp_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_zp_x(cycle, bus, master, |cpu, val| cpu.perform_ror(val));
    }

    /// ROR Absolute (0x6E) - 6 cycles. N, Z, C affected. C = old bit 0.
    pub(crate) fn op_ror_abs<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_abs(cycle, bus, master, |cpu, val| cpu.perform_ror(val));
    }

    /// ROR Absolute,X (0x7E) - 7 cycles. N, Z, C affected. C = old bit 0.
    pub(crate) fn op_ror_abs_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_abs_x(cycle, bus, master, |cpu, val| cpu.perform_ror(val));
    }
}

// ---- INC/DEC dispatch table, also via the rmw_* helpers in alu.rs.
impl Mos6507 {
    // ---- INC (Increment Memory) ----

    /// INC Zero Page (0xE6) - 5 cycles. N, Z affected.
    pub(crate) fn op_inc_zp<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_zp(cycle, bus, master, |cpu, val| {
            let result = val.wrapping_add(1);
            cpu.set_nz(result);
            result
        });
    }

    /// INC Zero Page,X (0xF6) - 6 cycles. N, Z affected.
    pub(crate) fn op_inc_zp_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_zp_x(cycle, bus, master, |cpu, val| {
            let result = val.wrapping_add(1);
            cpu.set_nz(result);
            result
        });
    }

    /// INC Absolute (0xEE) - 6 cycles. N, Z affected.
    pub(crate) fn op_inc_abs<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_abs(cycle, bus, master, |cpu, val| {
            let result = val.wrapping_add(1);
            cpu.set_nz(result);
            result
        });
    }

    /// INC Absolute,X (0xFE) - 7 cycles. N, Z affected.
    pub(crate) fn op_inc_abs_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_abs_x(cycle, bus, master, |cpu, val| {
            let result = val.wrapping_add(1);
            cpu.set_nz(result);
            result
        });
    }

    // ---- DEC (Decrement Memory) ----

    /// DEC Zero Page (0xC6) - 5 cycles. N, Z affected.
    pub(crate) fn op_dec_zp<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_zp(cycle, bus, master, |cpu, val| {
            let result = val.wrapping_sub(1);
            cpu.set_nz(result);
            result
        });
    }

    /// DEC Zero Page,X (0xD6) - 6 cycles. N, Z affected.
    pub(crate) fn op_dec_zp_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_zp_x(cycle, bus, master, |cpu, val| {
            let result = val.wrapping_sub(1);
            cpu.set_nz(result);
            result
        });
    }

    /// DEC Absolute (0xCE) - 6 cycles. N, Z affected.
    pub(crate) fn op_dec_abs<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_abs(cycle, bus, master, |cpu, val| {
            let result = val.wrapping_sub(1);
            cpu.set_nz(result);
            result
        });
    }

    /// DEC Absolute,X (0xDE) - 7 cycles. N, Z affected.
    pub(crate) fn op_dec_abs_x<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        self.rmw_abs_x(cycle, bus, master, |cpu, val| {
            let result = val.wrapping_sub(1);
            cpu.set_nz(result);
            result
        });
    }
}

// ---- Stack and software-interrupt instructions: PHA/PLA/PHP/PLP/BRK. No
// operand fetch, so no raw0/raw1/cpu_bug bookkeeping applies here.
impl Mos6507 {
    // ---- Stack instructions ----

    /// PHA (0x48) - 3 cycles. Push A to stack.
    pub(crate) fn op_pha<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        match cycle {
            0 => {
                // Dummy read from PC (next byte, discarded)
                let _ = bus.read(master, self.pc);
                self.state = ExecState::Execute(self.opcode, 1);
            }
            1 => {
                bus.write(master, 0x0100 | self.sp as u16, self.a);
                self.sp = self.sp.wrapping_sub(1);
                self.state = ExecState::Fetch;
            }
            _ => self.state = ExecState::Fetch,
        }
    }

    /// PLA (0x68) - 4 cycles. Pull A from stack. Sets N, Z.
    pub(crate) fn op_pla<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        match cycle {
            0 => {
                // Dummy read from PC
                let _ = bus.read(master, self.pc);
                self.state = ExecState::Execute(self.opcode, 1);
            }
            1 => {
                // Dummy read from stack[SP], then increment SP
                let _ = bus.read(master, 0x0100 | self.sp as u16);
                self.sp = self.sp.wrapping_add(1);
                self.state = ExecState::Execute(self.opcode, 2);
            }
            2 => {
                // Pull A from stack, set N/Z
                self.a = bus.read(master, 0x0100 | self.sp as u16);
                self.set_nz(self.a);
                self.state = ExecState::Fetch;
            }
            _ => self.state = ExecState::Fetch,
        }
    }

    /// PHP (0x08) - 3 cycles. Push P with B=1 and U=1 to stack.
    pub(crate) fn op_php<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        match cycle {
            0 => {
                // Dummy read from PC
                let _ = bus.read(master, self.pc);
                self.state = ExecState::Execute(self.opcode, 1);
            }
            1 => {
                // Push P with B and U bits always set
                let p_push = self.p | StatusFlag::B as u8 | StatusFlag::U as u8;
                bus.write(master, 0x0100 | self.sp as u16, p_push);
                self.sp = self.sp.wrapping_sub(1);
                self.state = ExecState::Fetch;
            }
            _ => self.state = ExecState::Fetch,
        }
    }

    /// PLP (0x28) - 4 cycles. Pull P from stack. B is always clear, U is always set.
    pub(crate) fn op_plp<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        match cycle {
            0 => {
                // Dummy read from PC
                let _ = bus.read(master, self.pc);
                self.state = ExecState::Execute(self.opcode, 1);
            }
            1 => {
                // Dummy read from stack[SP], then increment SP
                let _ = bus.read(master, 0x0100 | self.sp as u16);
                self.sp = self.sp.wrapping_add(1);
                self.state = ExecState::Execute(self.opcode, 2);
            }
            2 => {
                // Pull P from stack (B always clear, U always set)
                let pulled = bus.read(master, 0x0100 | self.sp as u16);
                self.p = (pulled | StatusFlag::U as u8) & !(StatusFlag::B as u8);
                self.state = ExecState::Fetch;
            }
            _ => self.state = ExecState::Fetch,
        }
    }

    // ---- BRK ----

    /// BRK (0x00) - 7 cycles. Software interrupt.
    /// 2-byte instruction: pushes PC+2 (past opcode + padding byte).
    /// Pushes P with B=1. Vectors through $FFFE/$FFFF. Sets I flag.
    pub(crate) fn op_brk<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        cycle: u8,
        bus: &mut B,
        master: BusMaster,
    ) {
        match cycle {
            0 => {
                // Read padding byte, increment PC
                let _ = bus.read(master, self.pc);
                self.pc = self.pc.wrapping_add(1);
                self.state = ExecState::Execute(self.opcode, 1);
            }
            1 => {
                // Push PCH
                bus.write(master, 0x0100 | self.sp as u16, (self.pc >> 8) as u8);
                self.sp = self.sp.wrapping_sub(1);
                self.state = ExecState::Execute(self.opcode, 2);
            }
            2 => {
                // Push PCL
                bus.write(master, 0x0100 | self.sp as u16, self.pc as u8);
                self.sp = self.sp.wrapping_sub(1);
                self.state = ExecState::Execute(self.opcode, 3);
            }
            3 => {
                // Push P with B=1, U=1
                let p_push = self.p | StatusFlag::B as u8 | StatusFlag::U as u8;
                bus.write(master, 0x0100 | self.sp as u16, p_push);
                self.sp = self.sp.wrapping_sub(1);
                self.state = ExecState::Execute(self.opcode, 4);
            }
            4 => {
                // Read vector low from $FFFE
                self.pc = bus.read(master, 0xFFFE) as u16;
                self.state = ExecState::Execute(self.opcode, 5);
            }
            5 => {
                // Read vector high from $FFFF, set I flag
                self.pc |= (bus.read(master, 0xFFFF) as u16) << 8;
                self.set_flag(StatusFlag::I, true);
                self.state = ExecState::Fetch;
            }
            _ => self.state = ExecState::Fetch,
        }
    }
}
