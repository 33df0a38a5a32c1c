//! Atari VCS (2600) machine: bus decode, the two support chips (RIOT, TIA),
//! cartridge mapper polymorphism, the television/spec detector, the rewind
//! and cross-thread snapshot layers, and the orchestrator tying them to the
//! 6507 core in `crate::cpu`.

pub mod bus;
pub mod cartridge;
pub mod orchestrator;
pub mod reflection;
pub mod riot;
pub mod snapshot;
pub mod television;
pub mod tia;

pub use bus::VcsBus;
pub use cartridge::{BankInfo, CartridgeError, CartridgeSlot, Mapper};
pub use orchestrator::{RewindFrame, Vcs, VcsError};
pub use reflection::{PixelAnnotation, Reflector};
pub use riot::Riot;
pub use television::{FrameInfo, Television, TvSpec};
pub use tia::Tia;
pub use tia::audio::{AudioAttr, AudioConfig, AudioMixer, AudioSink};
