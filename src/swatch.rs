use crate::{config::ColorMode, hex::rgb_to_hex};
use std::fmt;

/// A dominant color of an image together with the number of pixels it represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Swatch {
    red: u8,
    green: u8,
    blue: u8,
    population: u32,
}

/// A rendered color, either as its channels or as a `#RRGGBB` string.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorValue {
    Rgb(u8, u8, u8),
    Hex(String),
}

impl Swatch {
    pub fn new((red, green, blue): (u8, u8, u8), population: u32) -> Swatch {
        Self {
            red,
            green,
            blue,
            population,
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        (self.red, self.green, self.blue)
    }

    pub fn hex(self) -> String {
        rgb_to_hex(self.rgb())
    }

    pub fn population(self) -> u32 {
        self.population
    }

    pub fn render(self, mode: ColorMode) -> ColorValue {
        match mode {
            ColorMode::Rgb => ColorValue::Rgb(self.red, self.green, self.blue),
            ColorMode::Hex => ColorValue::Hex(self.hex()),
        }
    }
}

impl fmt::Display for ColorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorValue::Rgb(r, g, b) => write!(f, "({}, {}, {})", r, g, b),
            ColorValue::Hex(hex) => f.write_str(hex),
        }
    }
}
