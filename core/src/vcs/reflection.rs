//! Per-pixel annotation recorder: optional, off by default, used by
//! development tooling (not the emulation itself) to explain *why* a pixel
//! looks the way it does - which sprite copy drew it, whether WSYNC or
//! HMOVE was active on that clock, whether the cartridge's coprocessor (if
//! any) touched the bus that cycle.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PixelAnnotation {
    pub wsync: bool,
    pub hmove: bool,
    pub collision: bool,
    pub coproc_active: bool,
}

pub struct Reflector {
    enabled: bool,
    annotations: Vec<PixelAnnotation>,
    width: usize,
}

impl Reflector {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            enabled: false,
            annotations: vec![PixelAnnotation::default(); width * height],
            width,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record(&mut self, row: usize, col: usize, annotation: PixelAnnotation) {
        if !self.enabled {
            return;
        }
        let idx = row * self.width + col;
        if idx < self.annotations.len() {
            self.annotations[idx] = annotation;
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<PixelAnnotation> {
        self.annotations.get(row * self.width + col).copied()
    }

    pub fn clear(&mut self) {
        self.annotations.iter_mut().for_each(|a| *a = PixelAnnotation::default());
    }
}
