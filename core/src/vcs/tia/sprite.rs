//! One player/missile/ball object: the enclockifier (pixel-tick sub-state
//! machine), the scan counter that latches NUSIZ at activation, and the
//! graphics double-buffer (GRPx_old/new, ENABL_old/new) used by the
//! vertical-delay latches. Register layout mirrors the `Sprites` counter
//! array in the reference pack (plain fields advanced by explicit `tick`
//! calls) rather than a closure-driven pipeline.

#[derive(Clone, Copy, Debug, Default)]
pub struct Enclockifier {
    pub active: bool,
    pub second_half: bool,
    pub copy_index: u8,
    pub ticks: u8,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ScanCounter {
    pub pixel: u8,
    pub copy_index: u8,
    pub latched_nusiz: u8,
    pub active: bool,
    pub latching: bool,
}

/// Copy-start offsets for NUSIZ bits 0-2 (close/medium/wide multi-copy modes).
const COPY_OFFSETS: [&[u8]; 8] = [
    &[0],
    &[0, 16],
    &[0, 32],
    &[0, 16, 32],
    &[0, 64],
    &[0], // double-size single copy, handled via width below
    &[0, 32, 64],
    &[0], // quad-size single copy
];

fn width_for_nusiz(nusiz: u8) -> u8 {
    match nusiz & 0x07 {
        5 => 2,
        7 => 4,
        _ => 1,
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Sprite {
    pub reset_pixel: u8,
    pub hmoved_pixel: u8,
    pub color: u8,
    pub nusiz: u8,
    pub size_and_copies: u8,
    pub reflected: bool,
    pub vertical_delay: bool,
    pub hmove_nibble: i8,
    pub more_hmove: bool,
    pub enclockifier: Enclockifier,
    pub scan_counter: ScanCounter,

    /// Graphics latch. Players use GRPx_old/new; ball uses only `new` as
    /// ENABL_old/new but the same double-buffer shape serves both.
    pub graphic_new: u8,
    pub graphic_old: u8,
}

impl Sprite {
    pub fn new() -> Self {
        Self::default()
    }

    /// RESPx / RESBL / RESMx: latch the sprite's start position from the
    /// current TIA horizontal counter.
    pub fn reset_position(&mut self, hcounter: u8) {
        self.reset_pixel = hcounter;
        self.hmoved_pixel = hcounter;
    }

    /// HMOVE nibble write (HMP0/HMP1/HMM0/HMM1/HMBL): signed 4-bit motion,
    /// -8..+7, stored in the high nibble of the register per hardware.
    pub fn write_hmove(&mut self, value: u8) {
        let nibble = (value >> 4) as i8;
        self.hmove_nibble = if nibble >= 8 { nibble - 16 } else { nibble };
    }

    /// One bucket (4 color clocks) of the HMOVE ripple. `bucket` counts down
    /// 15..0; each sprite consumes one extra clock while `bucket` is still
    /// within |hmove_nibble| of the ripple start.
    pub fn ripple_bucket(&mut self, bucket: i8) {
        let threshold = 15 - (self.hmove_nibble.unsigned_abs() as i8) * 2;
        self.more_hmove = bucket >= threshold.max(0) && self.hmove_nibble != 0;
        if self.more_hmove {
            self.hmoved_pixel = self.hmoved_pixel.wrapping_add(1);
        }
    }

    /// Written when GRPx/ENABL partner register is written (VDELP/VDELBL
    /// chain): swaps the double buffer.
    pub fn latch_graphic(&mut self, new_value: u8) {
        self.graphic_old = self.graphic_new;
        self.graphic_new = new_value;
    }

    fn active_graphic(&self) -> u8 {
        if self.vertical_delay { self.graphic_old } else { self.graphic_new }
    }

    /// Start (or re-trigger) the enclockifier at the given hardware clock,
    /// latching NUSIZ at this instant (NUSIZ changes mid-line do not affect
    /// an already-active copy).
    pub fn start_enclockifier(&mut self) {
        self.enclockifier.active = true;
        self.enclockifier.second_half = false;
        self.enclockifier.copy_index = 0;
        self.enclockifier.ticks = 0;
        self.scan_counter.latched_nusiz = self.nusiz;
        self.scan_counter.active = true;
        self.scan_counter.pixel = 0;
    }

    /// Advance by one color clock; returns true if this sprite is drawing a
    /// non-transparent pixel on this clock. Also drives `enclockifier` and
    /// `scan_counter`, which a debugger reads to show which copy and bit
    /// this object is on right now.
    pub fn tick(&mut self, hcounter: u8) -> bool {
        let width = width_for_nusiz(self.scan_counter.latched_nusiz);
        let offsets = COPY_OFFSETS[(self.scan_counter.latched_nusiz & 0x07) as usize];

        let mut drawing = false;
        let mut active_copy: Option<(u8, u8, bool)> = None;
        for (idx, &offset) in offsets.iter().enumerate() {
            let start = self.hmoved_pixel.wrapping_add(offset);
            let span = 8u16 * width as u16;
            let delta = hcounter.wrapping_sub(start) as u16;
            if delta < span {
                let bit_index = (delta / width as u16) as u8;
                let bit = if self.reflected { bit_index } else { 7 - bit_index };
                let second_half = width > 1 && delta % width as u16 >= width as u16 / 2;
                active_copy = Some((idx as u8, bit_index, second_half));
                if self.active_graphic() & (1 << bit) != 0 {
                    drawing = true;
                }
            }
        }

        self.enclockifier.ticks = self.enclockifier.ticks.wrapping_add(1);
        match active_copy {
            Some((idx, bit_index, second_half)) => {
                self.enclockifier.active = true;
                self.enclockifier.copy_index = idx;
                self.enclockifier.second_half = second_half;
                self.scan_counter.active = true;
                self.scan_counter.copy_index = idx;
                self.scan_counter.pixel = bit_index;
            }
            None => {
                self.enclockifier.active = false;
                self.scan_counter.active = false;
            }
        }

        drawing
    }

    pub fn snapshot(&self) -> Self {
        *self
    }

    pub fn plumb(&mut self, s: Self) {
        *self = s;
    }
}
