//! Top-level VCS machine: one 6507, one RIOT, one TIA, one cartridge slot,
//! wired together on a single 13-bit bus and clocked in lockstep (three
//! color clocks per CPU cycle, one RIOT tick per CPU cycle). Also owns the
//! rewind ring buffer and the lazy-value shadow layer consumers read from
//! off the emulation thread.

use std::collections::VecDeque;

use thiserror::Error;

use crate::core::bus::{Bus as BusTrait, BusMaster};
use crate::core::component::BusMasterComponent;
use crate::core::machine::{InputButton, Machine};
use crate::cpu::{Cpu, CpuStateTrait, Mos6507, Mos6507State};
use crate::vcs::bus::VcsBus;
use crate::vcs::cartridge::{CartridgeError, CartridgeSlot, CartridgeState};
use crate::vcs::reflection::{PixelAnnotation, Reflector};
use crate::vcs::riot::RiotState;
use crate::vcs::snapshot::LazyValues;
use crate::vcs::television::Television;
use crate::vcs::tia::TiaState;
use crate::vcs::tia::audio::{AudioAttr, AudioMixer, AudioSink};

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("machine is powered off")]
    PowerOff,
    #[error(transparent)]
    Cartridge(#[from] CartridgeError),
    #[error("input device for button {0} is not plugged in")]
    InputDeviceUnplugged(u8),
    #[error("CPU reached an invalid execution state: {0}")]
    CpuExecutionInvalid(String),
    #[error("TV spec has not stabilized yet")]
    TvSpecUnstable,
    #[error("symbols file is unavailable")]
    SymbolsFileUnavailable,
    #[error("symbols file could not be parsed: {0}")]
    SymbolsFileError(String),
}

pub const INPUT_MAP: &[InputButton] = &[
    InputButton { id: 0, name: "P0 Up" },
    InputButton { id: 1, name: "P0 Down" },
    InputButton { id: 2, name: "P0 Left" },
    InputButton { id: 3, name: "P0 Right" },
    InputButton { id: 4, name: "P0 Fire" },
    InputButton { id: 5, name: "P1 Up" },
    InputButton { id: 6, name: "P1 Down" },
    InputButton { id: 7, name: "P1 Left" },
    InputButton { id: 8, name: "P1 Right" },
    InputButton { id: 9, name: "P1 Fire" },
    InputButton { id: 10, name: "Select" },
    InputButton { id: 11, name: "Reset" },
    InputButton { id: 12, name: "Color/BW" },
    InputButton { id: 13, name: "Difficulty A (P0)" },
    InputButton { id: 14, name: "Difficulty A (P1)" },
];

#[derive(Clone, Debug)]
pub struct RewindFrame {
    pub cpu: Mos6507State,
    pub tia: TiaState,
    pub riot: RiotState,
    pub cartridge: CartridgeState,
}

/// Rewind every `INTERVAL` frames, keeping the last `CAPACITY` snapshots.
const REWIND_INTERVAL: u32 = 1;
const REWIND_CAPACITY: usize = 600;

/// How often the lazy-value snapshot does the full CPU/TIA/RIOT/cart refresh
/// instead of the play-mode `refresh_fast` (TV/cart only) hot path.
const FULL_REFRESH_INTERVAL: u32 = 10;

pub struct Vcs {
    cpu: Mos6507,
    pub(crate) bus: VcsBus,
    pub(crate) television: Television,
    pub lazy: LazyValues,
    pub reflector: Reflector,
    audio_mixer: AudioMixer,
    audio_queue_depth: u32,

    powered: bool,
    frame_counter: u32,
    rewind: VecDeque<RewindFrame>,
}

impl Vcs {
    pub fn new(cartridge: CartridgeSlot) -> Self {
        let riot = crate::vcs::riot::Riot::new();
        let tia = crate::vcs::tia::Tia::new();
        let bus = VcsBus::new(riot, tia, cartridge);
        let mut cpu = Mos6507::new();
        cpu.reset();
        let television = Television::new();
        let (w, h) = television.display_size();
        Self {
            cpu,
            bus,
            reflector: Reflector::new(w as usize, h as usize),
            television,
            lazy: LazyValues::new(),
            audio_mixer: AudioMixer::new(),
            audio_queue_depth: 0,
            powered: true,
            frame_counter: 0,
            rewind: VecDeque::with_capacity(REWIND_CAPACITY),
        }
    }

    pub fn power_on(&mut self) {
        self.powered = true;
    }

    pub fn power_off(&mut self) {
        self.powered = false;
    }

    pub fn eject_cartridge(&mut self) {
        self.bus.cartridge.eject();
    }

    /// Register the host's audio-mixer subscriber; replaces any previous one.
    pub fn set_audio_sink(&mut self, sink: Box<dyn AudioSink>) {
        self.audio_mixer.set_sink(sink);
    }

    /// The host reports its device queue's current byte count here; consumed
    /// by the next `run_frame`'s back-pressure policy.
    pub fn report_audio_queue_depth(&mut self, bytes: u32) {
        self.audio_queue_depth = bytes;
    }

    /// One CPU cycle: three TIA color clocks, one RIOT tick, and - unless
    /// RDY is held low by WSYNC/HMOVE - one CPU cycle.
    fn step_cpu_cycle(&mut self) {
        let halted = self.bus.is_halted_for(BusMaster::Cpu(0));
        for _ in 0..3 {
            let signal = self.bus.tia.tick();
            self.television.push_signal(signal);
            self.audio_mixer.push(AudioAttr {
                channel0: signal.audio0,
                channel1: signal.audio1,
            });
            if self.reflector.is_enabled() {
                let (row, col) = self.television.cursor();
                let coproc_active = self
                    .bus
                    .cartridge
                    .get_bank(self.bus.last_access_address)
                    .map(|b| b.executing_coproc)
                    .unwrap_or(false);
                self.reflector.record(
                    row,
                    col,
                    PixelAnnotation {
                        wsync: halted,
                        hmove: self.bus.tia.hmove_active(),
                        collision: self.bus.tia.collisions.any(),
                        coproc_active,
                    },
                );
            }
        }
        self.bus.riot.tick();

        if !halted {
            self.cpu.tick_with_bus(&mut self.bus, BusMaster::Cpu(0));
        }
    }

    /// Advance until the television reports a completed frame.
    pub fn run_frame(&mut self) -> Result<(), VcsError> {
        if !self.powered {
            return Err(VcsError::PowerOff);
        }
        loop {
            self.step_cpu_cycle();
            if self.television.take_frame_done() {
                break;
            }
        }
        self.frame_counter += 1;
        if self.frame_counter % REWIND_INTERVAL == 0 {
            self.push_rewind_frame();
        }
        if self.frame_counter % FULL_REFRESH_INTERVAL == 0 {
            self.lazy.refresh(&mut self.bus, &self.television);
        } else {
            // Play-mode hot path: skip the CPU/TIA/RIOT shadow copies and
            // only publish what a running frontend actually polls every
            // frame (TV spec/frame info, cartridge bank/RAM state).
            self.lazy.refresh_fast(&mut self.bus, &self.television);
        }
        if !self.television.frame_info().stable && self.frame_counter > 8 {
            log::warn!("TV spec still unstable after {} frames", self.frame_counter);
        }
        self.audio_mixer.flush(self.audio_queue_depth, self.television.spec());
        Ok(())
    }

    fn push_rewind_frame(&mut self) {
        if self.rewind.len() >= REWIND_CAPACITY {
            self.rewind.pop_front();
        }
        self.rewind.push_back(RewindFrame {
            cpu: self.cpu.snapshot(),
            tia: self.bus.tia.snapshot(),
            riot: self.bus.riot.snapshot(),
            cartridge: self.bus.cartridge.snapshot(),
        });
    }

    pub fn rewind_depth(&self) -> usize {
        self.rewind.len()
    }

    /// Step back `frames` snapshots, restoring CPU/TIA/RIOT/cartridge state.
    pub fn rewind(&mut self, frames: usize) -> bool {
        for _ in 0..frames {
            self.rewind.pop_back();
        }
        let Some(frame) = self.rewind.back().cloned() else {
            return false;
        };
        self.cpu.plumb(frame.cpu);
        self.bus.tia.plumb(frame.tia);
        self.bus.riot.plumb(frame.riot);
        self.bus.cartridge.plumb(frame.cartridge);
        true
    }
}

impl Machine for Vcs {
    fn display_size(&self) -> (u32, u32) {
        self.television.display_size()
    }

    fn run_frame(&mut self) {
        let _ = Vcs::run_frame(self);
    }

    fn render_frame(&self, buffer: &mut [u8]) {
        self.television.render_into(buffer);
    }

    fn set_input(&mut self, button: u8, pressed: bool) {
        let swcha_bit = |n: u8| 1u8 << n;
        match button {
            0 => set_bit(&mut self.bus.riot.swcha, swcha_bit(4), !pressed),
            1 => set_bit(&mut self.bus.riot.swcha, swcha_bit(5), !pressed),
            2 => set_bit(&mut self.bus.riot.swcha, swcha_bit(6), !pressed),
            3 => set_bit(&mut self.bus.riot.swcha, swcha_bit(7), !pressed),
            4 => {} // P0 fire, via INPT4 below
            5 => set_bit(&mut self.bus.riot.swcha, swcha_bit(0), !pressed),
            6 => set_bit(&mut self.bus.riot.swcha, swcha_bit(1), !pressed),
            7 => set_bit(&mut self.bus.riot.swcha, swcha_bit(2), !pressed),
            8 => set_bit(&mut self.bus.riot.swcha, swcha_bit(3), !pressed),
            9 => {} // P1 fire, via INPT5 below
            10 => set_bit(&mut self.bus.riot.swchb, 0x02, !pressed),
            11 => set_bit(&mut self.bus.riot.swchb, 0x01, !pressed),
            12 => set_bit(&mut self.bus.riot.swchb, 0x08, !pressed),
            13 => set_bit(&mut self.bus.riot.swchb, 0x40, !pressed),
            14 => set_bit(&mut self.bus.riot.swchb, 0x80, !pressed),
            _ => {}
        }
        if button == 4 {
            self.bus.riot.inpt[4] = if pressed { 0x00 } else { 0x80 };
        }
        if button == 9 {
            self.bus.riot.inpt[5] = if pressed { 0x00 } else { 0x80 };
        }
    }

    fn input_map(&self) -> &[InputButton] {
        INPUT_MAP
    }

    fn reset(&mut self) {
        self.cpu.reset();
        self.bus = VcsBus::new(
            crate::vcs::riot::Riot::new(),
            crate::vcs::tia::Tia::new(),
            std::mem::replace(&mut self.bus.cartridge, CartridgeSlot::empty()),
        );
        self.television = Television::new();
        let (w, h) = self.television.display_size();
        let was_enabled = self.reflector.is_enabled();
        self.reflector = Reflector::new(w as usize, h as usize);
        self.reflector.set_enabled(was_enabled);
        self.frame_counter = 0;
    }
}

fn set_bit(reg: &mut u8, mask: u8, set: bool) {
    if set {
        *reg |= mask;
    } else {
        *reg &= !mask;
    }
}
