//! Cross-thread "lazy values": one shadow copy per observable subsystem,
//! refreshed on request from the emulation thread and read without locking
//! by a consumer thread (debugger, frontend). `refresh_scheduled` and
//! `refresh_done` are never both true at once - the consumer flips the
//! former, the emulation thread's `refresh()` copies the live state into the
//! shadow and flips the latter, and the consumer clears it again once it has
//! read the shadow.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::vcs::bus::VcsBus;
use crate::vcs::cartridge::CartridgeState;
use crate::vcs::riot::RiotState;
use crate::vcs::television::{FrameInfo, Television, TvSpec};
use crate::vcs::tia::TiaState;

#[derive(Clone, Debug, Default)]
pub struct TelevisionShadow {
    pub frame_info: FrameInfo,
    pub spec: Option<TvSpec>,
}

#[derive(Default)]
pub struct LazyValues {
    refresh_scheduled: AtomicBool,
    refresh_done: AtomicBool,

    television: Mutex<TelevisionShadow>,
    tia: Mutex<Option<TiaState>>,
    riot: Mutex<Option<RiotState>>,
    cart: Mutex<Option<CartridgeState>>,

    /// Deferred calls queued by a consumer thread (e.g. "patch this ROM
    /// byte"), drained by the emulation thread between frames.
    push_queue: Mutex<Vec<Box<dyn FnOnce(&mut VcsBus) + Send>>>,
}

impl LazyValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumer-side: ask for a fresh copy on the next opportunity.
    pub fn request_refresh(&self) {
        self.refresh_scheduled.store(true, Ordering::Release);
    }

    pub fn is_refresh_pending(&self) -> bool {
        self.refresh_scheduled.load(Ordering::Acquire)
    }

    /// Consumer-side: true once the emulation thread has published a new
    /// copy since the last `request_refresh`.
    pub fn take_refresh_done(&self) -> bool {
        self.refresh_done.swap(false, Ordering::AcqRel)
    }

    pub fn read_television(&self) -> TelevisionShadow {
        self.television.lock().unwrap().clone()
    }

    pub fn read_tia(&self) -> Option<TiaState> {
        *self.tia.lock().unwrap()
    }

    pub fn read_riot(&self) -> Option<RiotState> {
        *self.riot.lock().unwrap()
    }

    pub fn read_cart(&self) -> Option<CartridgeState> {
        self.cart.lock().unwrap().clone()
    }

    pub fn push_function(&self, f: impl FnOnce(&mut VcsBus) + Send + 'static) {
        self.push_queue.lock().unwrap().push(Box::new(f));
    }

    /// Emulation-thread side: publish fresh shadows if a refresh was
    /// requested, and drain the deferred-call queue. Called once per frame.
    pub(super) fn refresh(&self, bus: &mut VcsBus, television: &Television) {
        let pending: Vec<_> = std::mem::take(&mut *self.push_queue.lock().unwrap());
        for f in pending {
            f(bus);
        }

        if self.refresh_scheduled.swap(false, Ordering::AcqRel) {
            *self.television.lock().unwrap() = TelevisionShadow {
                frame_info: television.frame_info(),
                spec: Some(television.spec()),
            };
            *self.tia.lock().unwrap() = Some(bus.tia.snapshot());
            *self.riot.lock().unwrap() = Some(bus.riot.snapshot());
            *self.cart.lock().unwrap() = Some(bus.cartridge.snapshot());
            self.refresh_done.store(true, Ordering::Release);
        }
    }

    /// Fast-refresh path for the television/cartridge/audio-tracker shadows
    /// only, skipped the cheaper full `refresh` would otherwise also do.
    pub(super) fn refresh_fast(&self, bus: &mut VcsBus, television: &Television) {
        *self.television.lock().unwrap() = TelevisionShadow {
            frame_info: television.frame_info(),
            spec: Some(television.spec()),
        };
        *self.cart.lock().unwrap() = Some(bus.cartridge.snapshot());
    }
}
