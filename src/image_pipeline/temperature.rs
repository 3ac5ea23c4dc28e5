//! Temperature encodings and the segmentation band.
//!
//! The camera reports temperatures in two fixed-point Kelvin encodings:
//! per-point lookups on the temperature plane use 1/64 K, while the
//! whole-frame max/min query uses 1/16 K. Each has its own newtype so the
//! two cannot be mixed up.

use crate::image_pipeline::common::error::{PipelineError, Result};

const KELVIN_OFFSET: f32 = 273.15;

/// Raw temperature in 1/64 Kelvin, as stored in the temperature plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TempCode64(pub u16);

impl TempCode64 {
    pub fn celsius(self) -> f32 {
        self.0 as f32 / 64.0 - KELVIN_OFFSET
    }

    /// Nearest code for a Celsius value, saturating at the encodable range.
    pub fn from_celsius(celsius: f32) -> Self {
        Self(((celsius + KELVIN_OFFSET) * 64.0).round().clamp(0.0, u16::MAX as f32) as u16)
    }
}

/// Raw temperature in 1/16 Kelvin, as returned by the whole-frame query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TempCode16(pub u16);

impl TempCode16 {
    pub fn celsius(self) -> f32 {
        self.0 as f32 / 16.0 - KELVIN_OFFSET
    }
}

/// Inclusive Celsius range a pixel must fall in to be rendered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureBand {
    min_celsius: f32,
    max_celsius: f32,
}

impl TemperatureBand {
    /// Skin-to-fever range used for human silhouettes.
    pub const HUMAN: TemperatureBand = TemperatureBand {
        min_celsius: 28.0,
        max_celsius: 40.0,
    };

    pub fn new(min_celsius: f32, max_celsius: f32) -> Result<Self> {
        if !min_celsius.is_finite() || !max_celsius.is_finite() || min_celsius > max_celsius {
            return Err(PipelineError::InvalidBand {
                min: min_celsius,
                max: max_celsius,
            });
        }
        Ok(Self {
            min_celsius,
            max_celsius,
        })
    }

    pub fn min_celsius(&self) -> f32 {
        self.min_celsius
    }

    pub fn max_celsius(&self) -> f32 {
        self.max_celsius
    }

    pub fn contains(&self, celsius: f32) -> bool {
        self.min_celsius <= celsius && celsius <= self.max_celsius
    }
}

impl Default for TemperatureBand {
    fn default() -> Self {
        Self::HUMAN
    }
}
