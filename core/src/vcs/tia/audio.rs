//! Two independent audio channels: 5-bit polynomial/divide-down tone
//! generators feeding a volume latch. Samples are produced once per color
//! clock and decimated by the orchestrator into whatever sample rate the
//! host audio sink wants.

#[derive(Clone, Copy, Debug, Default)]
pub struct AudioChannel {
    pub control: u8,
    pub divider: u8,
    pub volume: u8,

    clock_counter: u8,
    poly4: u8,
    poly5: u8,
    poly9: u16,
    output_bit: bool,
}

impl AudioChannel {
    pub fn new() -> Self {
        Self {
            poly4: 0x0F,
            poly5: 0x1F,
            poly9: 0x1FF,
            ..Default::default()
        }
    }

    pub fn write_audc(&mut self, v: u8) {
        self.control = v & 0x0F;
    }
    pub fn write_audf(&mut self, v: u8) {
        self.divider = v & 0x1F;
    }
    pub fn write_audv(&mut self, v: u8) {
        self.volume = v & 0x0F;
    }

    fn step_poly(&mut self) {
        let fb4 = ((self.poly4 >> 0) ^ (self.poly4 >> 1)) & 1;
        self.poly4 = (self.poly4 >> 1) | (fb4 << 3);
        let fb5 = ((self.poly5 >> 0) ^ (self.poly5 >> 2)) & 1;
        self.poly5 = (self.poly5 >> 1) | (fb5 << 4);
        let fb9 = ((self.poly9 >> 0) ^ (self.poly9 >> 4)) & 1;
        self.poly9 = (self.poly9 >> 1) | (fb9 << 8);

        self.output_bit = match self.control {
            0x00 | 0x0B => true,
            0x01 => self.poly4 & 1 != 0,
            0x02 => self.poly5 & 1 != 0 && self.poly4 & 1 != 0,
            0x03 => self.poly5 & 1 != 0,
            0x04 | 0x05 => self.poly4 & 0b0010 != 0,
            0x06 | 0x0A => self.poly4 & 1 != 0,
            0x07 | 0x09 => self.poly5 & 1 != 0,
            0x08 => (self.poly9 & 1) != 0,
            0x0C | 0x0D => self.poly4 & 0b0010 != 0,
            0x0E => self.poly4 & 1 != 0,
            0x0F => self.poly5 & 1 != 0,
            _ => false,
        };
    }

    /// Advance by one color clock (called at 1/114 of the 3.58MHz rate by
    /// the orchestrator, i.e. once per CPU cycle).
    pub fn tick(&mut self) {
        self.clock_counter += 1;
        if self.clock_counter > self.divider {
            self.clock_counter = 0;
            self.step_poly();
        }
    }

    pub fn sample(&self) -> u8 {
        if self.output_bit { self.volume } else { 0 }
    }
}

/// One mixed sample pair handed to an audio-mixer subscriber.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AudioAttr {
    pub channel0: u8,
    pub channel1: u8,
}

/// Device-buffer-byte thresholds the mixer's back-pressure policy reacts to.
/// Values are the empirically observed defaults; an embedder whose device
/// queue is sized differently can override them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioConfig {
    pub rate_repeat: u32,
    pub rate_stretch: u32,
    pub rate_drop: u32,
    pub rate_reset: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            rate_repeat: 1000,
            rate_stretch: 2000,
            rate_drop: 10_000,
            rate_reset: 20_000,
        }
    }
}

/// Fan-out target for one emulated frame's worth of mixed audio, and for TV
/// spec changes. An embedder's device-callback thread implements this and
/// registers it with `AudioMixer::set_sink` - the mixer never touches a
/// device itself.
pub trait AudioSink: Send {
    fn set_audio(&mut self, samples: &[AudioAttr]);
    fn set_spec(&mut self, spec: crate::vcs::television::TvSpec);
}

/// Batches one frame's `AudioAttr` samples and applies the
/// repeat/stretch/drop/reset back-pressure policy against the device's
/// reported queue depth before handing them to the registered sink.
pub struct AudioMixer {
    config: AudioConfig,
    buffer: Vec<AudioAttr>,
    last_buffer: Vec<AudioAttr>,
    sink: Option<Box<dyn AudioSink>>,
    last_spec: Option<crate::vcs::television::TvSpec>,
}

impl AudioMixer {
    pub fn new() -> Self {
        Self::with_config(AudioConfig::default())
    }

    pub fn with_config(config: AudioConfig) -> Self {
        Self {
            config,
            buffer: Vec::new(),
            last_buffer: Vec::new(),
            sink: None,
            last_spec: None,
        }
    }

    pub fn set_sink(&mut self, sink: Box<dyn AudioSink>) {
        self.sink = Some(sink);
    }

    pub fn push(&mut self, sample: AudioAttr) {
        self.buffer.push(sample);
    }

    /// Called once per emulated frame with the device's current queued byte
    /// count. `spec` changes are forwarded to the sink once, on transition.
    pub fn flush(&mut self, queued_bytes: u32, spec: crate::vcs::television::TvSpec) {
        if self.last_spec != Some(spec) {
            self.last_spec = Some(spec);
            if let Some(sink) = &mut self.sink {
                sink.set_spec(spec);
            }
        }

        if queued_bytes > self.config.rate_reset || queued_bytes > self.config.rate_drop {
            self.buffer.clear();
            return;
        }

        let samples = if queued_bytes < self.config.rate_repeat {
            self.last_buffer.clone()
        } else if queued_bytes < self.config.rate_stretch {
            self.buffer.iter().flat_map(|&s| [s, s]).collect()
        } else {
            std::mem::take(&mut self.buffer)
        };

        if !samples.is_empty() {
            self.last_buffer = samples.clone();
        }
        if let Some(sink) = &mut self.sink {
            sink.set_audio(&samples);
        }
        self.buffer.clear();
    }
}

impl Default for AudioMixer {
    fn default() -> Self {
        Self::new()
    }
}
