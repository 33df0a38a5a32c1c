//! TIA: the video/audio chip driving the CPU's WSYNC stalls. One scanline is
//! 228 color clocks (68 HBLANK + 160 visible); this module advances one
//! clock per `tick`, producing a `VideoSignal` for the television and
//! holding the CPU's RDY line low across WSYNC/HMOVE/RESMP stalls the way
//! hardware does.

pub mod audio;
pub mod playfield;
pub mod sprite;

use audio::AudioChannel;
use playfield::Playfield;
use sprite::Sprite;

pub const SCANLINE_CLOCKS: u16 = 228;
pub const HBLANK_CLOCKS: u16 = 68;

/// One color clock's output: the index into the host's NTSC/PAL/SECAM
/// palette plus the sync/blank state the television needs to find vertical
/// sync and detect the running spec.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VideoSignal {
    pub color: u8,
    pub vsync: bool,
    pub vblank: bool,
    pub hblank: bool,
    pub hsync: bool,
    pub cburst: bool,
    pub audio0: u8,
    pub audio1: u8,
    pub clock_index: u32,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Collisions {
    pub m0p: u8,
    pub m1p: u8,
    pub p0fb: u8,
    pub p1fb: u8,
    pub m0fb: u8,
    pub m1fb: u8,
    pub blpf: bool,
    pub ppmm: bool,
}

impl Collisions {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn any(&self) -> bool {
        self.m0p != 0
            || self.m1p != 0
            || self.p0fb != 0
            || self.p1fb != 0
            || self.m0fb != 0
            || self.m1fb != 0
            || self.blpf
            || self.ppmm
    }
}

pub struct Tia {
    hcounter: u16,
    vsync: bool,
    vblank_reg: u8,
    rdy: bool,
    rsync_pending: bool,

    pub player0: Sprite,
    pub player1: Sprite,
    pub missile0: Sprite,
    pub missile1: Sprite,
    pub ball: Sprite,
    pub playfield: Playfield,
    pub audio: [AudioChannel; 2],
    pub collisions: Collisions,

    colup0: u8,
    colup1: u8,
    colupf: u8,
    colubk: u8,

    hmove_active: bool,
    hmove_delay: u8,
    hmove_phase: u8,
    hmove_bucket: i8,

    resmp0_locked: bool,
    resmp1_locked: bool,

    clock_index: u32,
    last_video: VideoSignal,
}

impl Tia {
    pub fn new() -> Self {
        Self {
            hcounter: 0,
            vsync: false,
            vblank_reg: 0,
            rdy: false,
            rsync_pending: false,
            player0: Sprite::new(),
            player1: Sprite::new(),
            missile0: Sprite::new(),
            missile1: Sprite::new(),
            ball: Sprite::new(),
            playfield: Playfield::new(),
            audio: [AudioChannel::new(), AudioChannel::new()],
            collisions: Collisions::default(),
            colup0: 0,
            colup1: 0,
            colupf: 0,
            colubk: 0,
            hmove_active: false,
            hmove_delay: 0,
            hmove_phase: 0,
            hmove_bucket: 0,
            resmp0_locked: false,
            resmp1_locked: false,
            clock_index: 0,
            last_video: VideoSignal::default(),
        }
    }

    pub fn hmove_active(&self) -> bool {
        self.hmove_active
    }

    pub fn rdy_held_low(&self) -> bool {
        self.rdy
    }

    fn hblank(&self) -> bool {
        self.hcounter < HBLANK_CLOCKS
    }

    fn visible_x(&self) -> Option<u8> {
        if self.hblank() {
            None
        } else {
            Some((self.hcounter - HBLANK_CLOCKS) as u8)
        }
    }

    /// The horizontal sync pulse sits 4-15 clocks into HBLANK; colorburst
    /// follows it after a short breezeway, at clocks 18-25.
    fn hsync(&self) -> bool {
        (4..16).contains(&self.hcounter)
    }

    fn cburst(&self) -> bool {
        (18..26).contains(&self.hcounter)
    }

    fn record_collision(&mut self, p0: bool, p1: bool, m0: bool, m1: bool, bl: bool, pf: bool) {
        if m0 && p0 {
            self.collisions.m0p |= 0x80;
        }
        if m0 && p1 {
            self.collisions.m0p |= 0x40;
        }
        if m1 && p1 {
            self.collisions.m1p |= 0x80;
        }
        if m1 && p0 {
            self.collisions.m1p |= 0x40;
        }
        if p0 && bl {
            self.collisions.p0fb |= 0x80;
        }
        if p0 && pf {
            self.collisions.p0fb |= 0x40;
        }
        if p1 && bl {
            self.collisions.p1fb |= 0x80;
        }
        if p1 && pf {
            self.collisions.p1fb |= 0x40;
        }
        if m0 && bl {
            self.collisions.m0fb |= 0x80;
        }
        if m0 && pf {
            self.collisions.m0fb |= 0x40;
        }
        if m1 && bl {
            self.collisions.m1fb |= 0x80;
        }
        if m1 && pf {
            self.collisions.m1fb |= 0x40;
        }
        if bl && pf {
            self.collisions.blpf = true;
        }
        if (p0 && p1) || (m0 && m1) {
            self.collisions.ppmm = true;
        }
    }

    /// Advance the chip by one color clock; returns the pixel's signal.
    pub fn tick(&mut self) -> VideoSignal {
        if self.hmove_active {
            if self.hmove_delay > 0 {
                self.hmove_delay -= 1;
            } else {
                if self.hmove_phase == 0 {
                    self.player0.ripple_bucket(self.hmove_bucket);
                    self.player1.ripple_bucket(self.hmove_bucket);
                    self.missile0.ripple_bucket(self.hmove_bucket);
                    self.missile1.ripple_bucket(self.hmove_bucket);
                    self.ball.ripple_bucket(self.hmove_bucket);
                }
                self.hmove_phase += 1;
                if self.hmove_phase >= 4 {
                    self.hmove_phase = 0;
                    if self.hmove_bucket <= 0 {
                        self.hmove_active = false;
                    } else {
                        self.hmove_bucket -= 1;
                    }
                }
            }
        }

        for ch in self.audio.iter_mut() {
            ch.tick();
        }
        let audio0 = self.audio[0].sample();
        let audio1 = self.audio[1].sample();

        let x8 = self.hcounter as u8;
        let p0 = self.player0.tick(x8);
        let p1 = self.player1.tick(x8);
        let m0 = !self.resmp0_locked && self.missile0.tick(x8);
        let m1 = !self.resmp1_locked && self.missile1.tick(x8);
        let bl = self.ball.tick(x8);

        let visible = self.visible_x();
        let pf = visible.map(|x| self.playfield.pixel(x)).unwrap_or(false);

        self.record_collision(p0, p1, m0, m1, bl, pf);

        let pf_bl_color = if pf && self.playfield.score_mode && !self.playfield.priority {
            if visible.unwrap_or(0) < 80 { self.colup0 } else { self.colup1 }
        } else {
            self.colupf
        };
        let players_color = if p0 || m0 {
            Some(self.colup0)
        } else if p1 || m1 {
            Some(self.colup1)
        } else {
            None
        };

        let color = if self.vblank_reg & 0x02 != 0 {
            0
        } else if self.playfield.priority && (pf || bl) {
            pf_bl_color
        } else if let Some(c) = players_color {
            c
        } else if pf || bl {
            pf_bl_color
        } else {
            self.colubk
        };

        let signal = VideoSignal {
            color,
            vsync: self.vsync,
            vblank: self.vblank_reg & 0x02 != 0,
            hblank: self.hblank(),
            hsync: self.hsync(),
            cburst: self.cburst(),
            audio0,
            audio1,
            clock_index: self.clock_index,
        };
        self.last_video = signal;

        self.clock_index = self.clock_index.wrapping_add(1);
        self.hcounter += 1;
        if self.hcounter >= SCANLINE_CLOCKS {
            self.hcounter = 0;
            self.rsync_pending = false;
            self.rdy = false;
        }

        signal
    }

    pub fn last_signal(&self) -> VideoSignal {
        self.last_video
    }

    /// Read, page-decoded to the low 6 bits. Returns `(data, driven_mask)`:
    /// only the low 4 bits carry collision/input state, the rest float.
    pub fn read(&mut self, addr: u16) -> (u8, u8) {
        let bit = |b: bool| if b { 0x80 } else { 0x00 };
        match addr & 0x0F {
            0x00 => (self.collisions.m0p, 0xC0),
            0x01 => (self.collisions.m1p, 0xC0),
            0x02 => (self.collisions.p0fb, 0xC0),
            0x03 => (self.collisions.p1fb, 0xC0),
            0x04 => (self.collisions.m0fb, 0xC0),
            0x05 => (self.collisions.m1fb, 0xC0),
            0x06 => (bit(self.collisions.blpf), 0x80),
            0x07 => (bit(self.collisions.ppmm), 0x80),
            0x08..=0x0D => (0x80, 0x80), // INPT0-5: no paddle/trigger wired by default
            _ => (0, 0),
        }
    }

    pub fn write(&mut self, addr: u16, data: u8) {
        match addr & 0x3F {
            0x00 => self.vsync = data & 0x02 != 0,
            0x01 => self.vblank_reg = data,
            0x02 => self.rdy = true, // WSYNC: RDY stays low until hcounter wraps
            0x03 => self.rsync_pending = true,
            0x04 => self.missile0.nusiz = data,
            0x05 => self.missile1.nusiz = data,
            0x06 => self.colup0 = data & 0xFE,
            0x07 => self.colup1 = data & 0xFE,
            0x08 => self.colupf = data & 0xFE,
            0x09 => self.colubk = data & 0xFE,
            0x0A => self.playfield.write_ctrlpf(data),
            0x0B => self.player0.reflected = data & 0x08 != 0,
            0x0C => self.player1.reflected = data & 0x08 != 0,
            0x0D => self.playfield.write_pf0(data),
            0x0E => self.playfield.write_pf1(data),
            0x0F => self.playfield.write_pf2(data),
            0x10 => self.player0.reset_position(self.hcounter as u8),
            0x11 => self.player1.reset_position(self.hcounter as u8),
            0x12 => self.missile0.reset_position(self.hcounter as u8),
            0x13 => self.missile1.reset_position(self.hcounter as u8),
            0x14 => self.ball.reset_position(self.hcounter as u8),
            0x15 => self.audio[0].write_audc(data),
            0x16 => self.audio[1].write_audc(data),
            0x17 => self.audio[0].write_audf(data),
            0x18 => self.audio[1].write_audf(data),
            0x19 => self.audio[0].write_audv(data),
            0x1A => self.audio[1].write_audv(data),
            0x1B => {
                self.player0.latch_graphic(data);
                self.player0.start_enclockifier();
            }
            0x1C => {
                self.player1.latch_graphic(data);
                self.player1.start_enclockifier();
            }
            0x1D => self.missile0.graphic_new = if data & 0x02 != 0 { 0xFF } else { 0 },
            0x1E => self.missile1.graphic_new = if data & 0x02 != 0 { 0xFF } else { 0 },
            0x1F => self.ball.latch_graphic(if data & 0x02 != 0 { 0xFF } else { 0 }),
            0x20 => self.player0.write_hmove(data),
            0x21 => self.player1.write_hmove(data),
            0x22 => self.missile0.write_hmove(data),
            0x23 => self.missile1.write_hmove(data),
            0x24 => self.ball.write_hmove(data),
            0x25 => self.player0.vertical_delay = data & 0x01 != 0,
            0x26 => self.player1.vertical_delay = data & 0x01 != 0,
            0x27 => self.ball.vertical_delay = data & 0x01 != 0,
            0x28 => self.resmp0_locked = data & 0x02 != 0,
            0x29 => self.resmp1_locked = data & 0x02 != 0,
            0x2A => {
                // HMOVE itself latches 6 color clocks before the ripple
                // that actually shifts sprite counters begins.
                self.hmove_active = true;
                self.hmove_delay = 6;
                self.hmove_phase = 0;
                self.hmove_bucket = 15;
            }
            0x2B => {
                self.player0.hmove_nibble = 0;
                self.player1.hmove_nibble = 0;
                self.missile0.hmove_nibble = 0;
                self.missile1.hmove_nibble = 0;
                self.ball.hmove_nibble = 0;
            }
            0x2C => self.collisions.clear(),
            _ => {}
        }
    }

    /// Called once per scanline boundary by the orchestrator to clear WSYNC.
    pub fn end_of_line(&mut self) {
        self.rdy = false;
    }
}

impl Default for Tia {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TiaState {
    pub hcounter: u16,
    pub vsync: bool,
    pub vblank_reg: u8,
    pub rdy: bool,
    pub player0: Sprite,
    pub player1: Sprite,
    pub missile0: Sprite,
    pub missile1: Sprite,
    pub ball: Sprite,
    pub playfield: Playfield,
    pub collisions: Collisions,
    pub colup0: u8,
    pub colup1: u8,
    pub colupf: u8,
    pub colubk: u8,
}

impl Tia {
    pub fn snapshot(&self) -> TiaState {
        TiaState {
            hcounter: self.hcounter,
            vsync: self.vsync,
            vblank_reg: self.vblank_reg,
            rdy: self.rdy,
            player0: self.player0.snapshot(),
            player1: self.player1.snapshot(),
            missile0: self.missile0.snapshot(),
            missile1: self.missile1.snapshot(),
            ball: self.ball.snapshot(),
            playfield: self.playfield,
            collisions: self.collisions,
            colup0: self.colup0,
            colup1: self.colup1,
            colupf: self.colupf,
            colubk: self.colubk,
        }
    }

    pub fn plumb(&mut self, s: TiaState) {
        self.hcounter = s.hcounter;
        self.vsync = s.vsync;
        self.vblank_reg = s.vblank_reg;
        self.rdy = s.rdy;
        self.player0.plumb(s.player0);
        self.player1.plumb(s.player1);
        self.missile0.plumb(s.missile0);
        self.missile1.plumb(s.missile1);
        self.ball.plumb(s.ball);
        self.playfield = s.playfield;
        self.collisions = s.collisions;
        self.colup0 = s.colup0;
        self.colup1 = s.colup1;
        self.colupf = s.colupf;
        self.colubk = s.colubk;
    }
}
