//! Frame generation for the fan lighting animations.
//!
//! Every animation produces frames of exactly [`LED_COUNT`] colors. Static
//! presets are a single frame; Breathe and GradientSweep are [`Renderer`]s
//! that advance one step per tick and are driven by the [`engine`].
//!
//! # Timing
//!
//! | Animation     | Tick   | Step per tick                          |
//! |---------------|--------|----------------------------------------|
//! | Breathe       | 60 ms  | phase += 0.05 (one cycle = 1.2 s)      |
//! | GradientSweep | 120 ms | offset += max(0.25, palette / LED_COUNT) |

pub mod engine;

use std::f64::consts::TAU;
use std::time::Duration;

use crosec_transport::Rgb;

use crate::color;

pub use engine::{AnimationEngine, AnimationError};

/// Addressable LEDs on the Framework Desktop fan.
pub const LED_COUNT: usize = 8;

/// First LED index written by every frame.
pub const START_KEY: u8 = 0;

/// One complete lighting state.
pub type Frame = [Rgb; LED_COUNT];

pub const BREATHE_TICK: Duration = Duration::from_millis(60);
pub const BREATHE_PHASE_STEP: f64 = 0.05;

pub const GRADIENT_TICK: Duration = Duration::from_millis(120);
pub const GRADIENT_MIN_STEP: f64 = 0.25;

/// A looping animation's frame source.
pub trait Renderer: Send + 'static {
    /// Frame for the current position.
    fn frame(&self) -> Frame;

    /// Move one tick forward.
    fn advance(&mut self);

    /// Delay between the end of one tick and the start of the next.
    fn tick(&self) -> Duration;

    fn name(&self) -> &'static str;
}

/// A validated animation ready to be started.
pub enum Animation {
    Static(Frame),
    Looping(Box<dyn Renderer>),
}

impl Animation {
    pub fn name(&self) -> &'static str {
        match self {
            Animation::Static(_) => "Static",
            Animation::Looping(renderer) => renderer.name(),
        }
    }
}

/// Breathe palette: the non-black colors, in preset order.
pub fn breathe_palette(colors: &[Rgb]) -> Vec<Rgb> {
    colors.iter().copied().filter(|&c| !color::is_black(c)).collect()
}

/// GradientSweep palette: the non-black colors when there are at least two,
/// otherwise every color including black.
pub fn gradient_palette(colors: &[Rgb]) -> Vec<Rgb> {
    let lit = breathe_palette(colors);
    if lit.len() >= 2 {
        lit
    } else {
        colors.to_vec()
    }
}

/// Smooth 0 → 1 → 0 brightness over one phase cycle.
pub fn breathe_intensity(phase: f64) -> f64 {
    0.5 - 0.5 * (TAU * phase).cos()
}

/// Cyclic palette scaled to the current breathing intensity.
///
/// An empty palette renders all LEDs off.
pub fn breathe_frame(palette: &[Rgb], phase: f64) -> Frame {
    if palette.is_empty() {
        return [Rgb::BLACK; LED_COUNT];
    }
    let intensity = breathe_intensity(phase);
    std::array::from_fn(|i| color::scale(palette[i % palette.len()], intensity))
}

/// Offset advance per GradientSweep tick.
pub fn gradient_step(palette_len: usize) -> f64 {
    GRADIENT_MIN_STEP.max(palette_len as f64 / LED_COUNT as f64)
}

/// Palette spread over the LEDs and rotated by `offset` palette positions.
///
/// An empty palette renders all LEDs off.
pub fn gradient_frame(palette: &[Rgb], offset: f64) -> Frame {
    let len = palette.len();
    if len == 0 {
        return [Rgb::BLACK; LED_COUNT];
    }
    std::array::from_fn(|i| {
        let position = (i as f64 * len as f64 / LED_COUNT as f64 + offset).rem_euclid(len as f64);
        let lower = position.floor();
        let from = lower as usize % len;
        let to = (from + 1) % len;
        color::lerp(palette[from], palette[to], position - lower)
    })
}

/// Breathing renderer over a non-empty palette.
#[derive(Debug, Clone)]
pub struct Breathe {
    palette: Vec<Rgb>,
    phase: f64,
}

impl Breathe {
    /// `None` if the palette is empty.
    pub fn new(palette: Vec<Rgb>) -> Option<Self> {
        if palette.is_empty() {
            return None;
        }
        Some(Self {
            palette,
            phase: 0.0,
        })
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }
}

impl Renderer for Breathe {
    fn frame(&self) -> Frame {
        breathe_frame(&self.palette, self.phase)
    }

    fn advance(&mut self) {
        self.phase = (self.phase + BREATHE_PHASE_STEP) % 1.0;
    }

    fn tick(&self) -> Duration {
        BREATHE_TICK
    }

    fn name(&self) -> &'static str {
        "Breathe"
    }
}

/// Rotating gradient renderer over a palette of at least two colors.
#[derive(Debug, Clone)]
pub struct GradientSweep {
    palette: Vec<Rgb>,
    offset: f64,
}

impl GradientSweep {
    /// `None` if the palette has fewer than two colors.
    pub fn new(palette: Vec<Rgb>) -> Option<Self> {
        if palette.len() < 2 {
            return None;
        }
        Some(Self {
            palette,
            offset: 0.0,
        })
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }
}

impl Renderer for GradientSweep {
    fn frame(&self) -> Frame {
        gradient_frame(&self.palette, self.offset)
    }

    fn advance(&mut self) {
        let len = self.palette.len() as f64;
        self.offset = (self.offset + gradient_step(self.palette.len())) % len;
    }

    fn tick(&self) -> Duration {
        GRADIENT_TICK
    }

    fn name(&self) -> &'static str {
        "GradientSweep"
    }
}
