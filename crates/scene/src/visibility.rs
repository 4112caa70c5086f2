use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-category visibility switches.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerToggles {
    pub buildings: bool,
    pub wireframe: bool,
    pub roads: bool,
    pub pois: bool,
    pub landmarks: bool,
}

impl Default for LayerToggles {
    fn default() -> Self {
        Self {
            buildings: true,
            wireframe: false,
            roads: true,
            pois: true,
            landmarks: true,
        }
    }
}

impl LayerToggles {
    pub const fn none() -> Self {
        Self {
            buildings: false,
            wireframe: false,
            roads: false,
            pois: false,
            landmarks: false,
        }
    }

    pub fn get(&self, toggle: LayerToggle) -> bool {
        match toggle {
            LayerToggle::Buildings => self.buildings,
            LayerToggle::Wireframe => self.wireframe,
            LayerToggle::Roads => self.roads,
            LayerToggle::Pois => self.pois,
            LayerToggle::Landmarks => self.landmarks,
        }
    }

    /// Copy with one switch replaced.
    pub fn with(mut self, toggle: LayerToggle, on: bool) -> Self {
        let slot = match toggle {
            LayerToggle::Buildings => &mut self.buildings,
            LayerToggle::Wireframe => &mut self.wireframe,
            LayerToggle::Roads => &mut self.roads,
            LayerToggle::Pois => &mut self.pois,
            LayerToggle::Landmarks => &mut self.landmarks,
        };
        *slot = on;
        self
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerToggle {
    Buildings,
    Wireframe,
    Roads,
    Pois,
    Landmarks,
}

impl LayerToggle {
    pub const ALL: [LayerToggle; 5] = [
        LayerToggle::Buildings,
        LayerToggle::Wireframe,
        LayerToggle::Roads,
        LayerToggle::Pois,
        LayerToggle::Landmarks,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LayerToggle::Buildings => "buildings",
            LayerToggle::Wireframe => "wireframe",
            LayerToggle::Roads => "roads",
            LayerToggle::Pois => "pois",
            LayerToggle::Landmarks => "landmarks",
        }
    }
}

impl fmt::Display for LayerToggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How solid buildings are coloured.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColourMode {
    #[default]
    Height,
    Type,
}

impl fmt::Display for ColourMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColourMode::Height => "height",
            ColourMode::Type => "type",
        })
    }
}

/// Inclusive building-height filter in metres.
///
/// `HeightRange::FULL` (`[0, 300]`) means "no filtering".
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct HeightRange {
    min: f64,
    max: f64,
}

impl HeightRange {
    pub const FULL: HeightRange = HeightRange {
        min: 0.0,
        max: 300.0,
    };

    /// Builds a range with `min <= max`. Reversed bounds are swapped and a NaN
    /// bound falls back to the matching bound of [`HeightRange::FULL`].
    pub fn new(a: f64, b: f64) -> Self {
        let a = if a.is_nan() { Self::FULL.min } else { a };
        let b = if b.is_nan() { Self::FULL.max } else { b };
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn is_full(&self) -> bool {
        *self == Self::FULL
    }

    pub fn contains(&self, height: f64) -> bool {
        height >= self.min && height <= self.max
    }

    /// Bit-exact key for hashing; `-0.0` is folded into `0.0`.
    pub fn key(&self) -> (u64, u64) {
        ((self.min + 0.0).to_bits(), (self.max + 0.0).to_bits())
    }
}

impl Default for HeightRange {
    fn default() -> Self {
        Self::FULL
    }
}

impl From<[f64; 2]> for HeightRange {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<HeightRange> for [f64; 2] {
    fn from(value: HeightRange) -> Self {
        [value.min, value.max]
    }
}

impl fmt::Display for HeightRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}
