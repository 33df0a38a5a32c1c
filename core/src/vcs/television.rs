//! Framebuffer and timing-spec auto-detector. The television has no idea
//! what game is running; it only watches the VSYNC/VBLANK edges TIA hands it
//! clock by clock and infers NTSC/PAL/SECAM from the scanline count between
//! VSYNC pulses, the way a real CRT's flyback oscillator would lock onto
//! whatever rate the chip is actually driving.

use crate::vcs::tia::{SCANLINE_CLOCKS, VideoSignal};

pub const VISIBLE_WIDTH: usize = 160;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TvSpec {
    #[default]
    Ntsc,
    Pal,
    Secam,
}

impl TvSpec {
    fn scanlines_for(total: u32) -> Self {
        if total <= 270 {
            TvSpec::Ntsc
        } else if total <= 320 {
            TvSpec::Pal
        } else {
            TvSpec::Secam
        }
    }

    pub fn total_scanlines(&self) -> u32 {
        match self {
            TvSpec::Ntsc => 262,
            TvSpec::Pal => 312,
            TvSpec::Secam => 312,
        }
    }

    pub fn refresh_hz(&self) -> f32 {
        match self {
            TvSpec::Ntsc => 59.94,
            TvSpec::Pal | TvSpec::Secam => 50.0,
        }
    }

    pub fn visible_scanlines(&self) -> u16 {
        match self {
            TvSpec::Ntsc => 192,
            TvSpec::Pal | TvSpec::Secam => 242,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInfo {
    pub spec: TvSpec,
    pub scanlines: u32,
    pub scanlines_visible: u16,
    pub refresh_hz: f32,
    pub frame_num: u64,
    /// True once the spec detector has seen several consecutive frames with
    /// matching scanline counts.
    pub stable: bool,
}

/// Consecutive matching frames required before `FrameInfo::stable` is set.
const DEBOUNCE_FRAMES: u8 = 3;

pub struct Television {
    framebuffer: Vec<u8>,
    scanline: u32,
    column: u16,
    in_vsync: bool,
    frame_done: bool,
    last_frame_scanlines: u32,
    spec: TvSpec,
    debounce_count: u8,
    frame_num: u64,
    last_info: FrameInfo,
}

impl Television {
    pub fn new() -> Self {
        Self {
            framebuffer: vec![0; 320 * VISIBLE_WIDTH * 3],
            scanline: 0,
            column: 0,
            in_vsync: false,
            frame_done: false,
            last_frame_scanlines: 0,
            spec: TvSpec::Ntsc,
            debounce_count: 0,
            frame_num: 0,
            last_info: FrameInfo::default(),
        }
    }

    pub fn spec(&self) -> TvSpec {
        self.spec
    }

    /// Position of the *next* color clock to be pushed - valid to read the
    /// cycle a reflection annotation is recorded, just after `push_signal`.
    pub fn cursor(&self) -> (usize, usize) {
        (self.scanline as usize, self.column as usize)
    }

    pub fn display_size(&self) -> (u32, u32) {
        (VISIBLE_WIDTH as u32, self.spec.total_scanlines())
    }

    /// Feed one color clock's worth of signal. Called 228 times per
    /// scanline by the orchestrator.
    pub fn push_signal(&mut self, signal: VideoSignal) {
        if !signal.hblank {
            let x = (self.column as usize).saturating_sub(0);
            if x < VISIBLE_WIDTH {
                let row = self.scanline as usize;
                let stride = VISIBLE_WIDTH * 3;
                if (row + 1) * stride <= self.framebuffer.len() {
                    let (r, g, b) = ntsc_color(signal.color);
                    let idx = row * stride + x * 3;
                    self.framebuffer[idx] = r;
                    self.framebuffer[idx + 1] = g;
                    self.framebuffer[idx + 2] = b;
                }
            }
        }

        let rising_vsync = signal.vsync && !self.in_vsync;
        self.in_vsync = signal.vsync;

        self.column += 1;
        if self.column >= SCANLINE_CLOCKS {
            self.column = 0;
            if rising_vsync {
                self.on_frame_boundary();
            } else {
                self.scanline += 1;
            }
        }
    }

    fn on_frame_boundary(&mut self) {
        self.frame_done = true;
        let total = self.scanline + 1;
        let detected = TvSpec::scanlines_for(total);
        if total == self.last_frame_scanlines {
            if self.debounce_count < DEBOUNCE_FRAMES {
                self.debounce_count += 1;
            }
        } else {
            self.debounce_count = 0;
        }
        self.last_frame_scanlines = total;
        self.spec = detected;
        self.frame_num += 1;
        self.last_info = FrameInfo {
            spec: detected,
            scanlines: total,
            scanlines_visible: detected.visible_scanlines(),
            refresh_hz: detected.refresh_hz(),
            frame_num: self.frame_num,
            stable: self.debounce_count >= DEBOUNCE_FRAMES,
        };
        self.scanline = 0;
        if self.framebuffer.len() < total as usize * VISIBLE_WIDTH * 3 {
            self.framebuffer.resize(total as usize * VISIBLE_WIDTH * 3, 0);
        }
    }

    pub fn take_frame_done(&mut self) -> bool {
        let d = self.frame_done;
        self.frame_done = false;
        d
    }

    pub fn frame_info(&self) -> FrameInfo {
        self.last_info
    }

    pub fn render_into(&self, buffer: &mut [u8]) {
        let (w, h) = self.display_size();
        let need = (w * h * 3) as usize;
        let copy_len = need.min(self.framebuffer.len()).min(buffer.len());
        buffer[..copy_len].copy_from_slice(&self.framebuffer[..copy_len]);
    }
}

impl Default for Television {
    fn default() -> Self {
        Self::new()
    }
}

/// Approximate NTSC hue/luma -> RGB for the standard 128-entry palette index
/// (TIA color is a 7-bit value: 4 bits hue, 3 bits luma, bit0 unused).
fn ntsc_color(color: u8) -> (u8, u8, u8) {
    let hue = (color >> 4) & 0x0F;
    let luma = (color >> 1) & 0x07;
    let brightness = 40 + luma as u32 * 28;
    if hue == 0 {
        let v = brightness.min(255) as u8;
        return (v, v, v);
    }
    let angle = (hue as f32 - 1.0) * (360.0 / 15.0);
    let rad = angle.to_radians();
    let y = brightness as f32;
    let r = (y + 110.0 * rad.cos()).clamp(0.0, 255.0) as u8;
    let g = (y - 60.0 * rad.cos() - 40.0 * rad.sin()).clamp(0.0, 255.0) as u8;
    let b = (y + 110.0 * rad.sin()).clamp(0.0, 255.0) as u8;
    (r, g, b)
}
