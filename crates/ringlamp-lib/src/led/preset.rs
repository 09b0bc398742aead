//! Named full-ring patterns.
//!
//! A preset is sent to the lamp as a short mode string instead of an
//! envelope; the table it maps to is what the client shows locally.

use std::fmt;

use super::color::hsl_to_hex;
use super::element::{ElementState, ElementTable, LED_COUNT};

/// Message prefix for [`Preset::FillToEmpty`]. The receiving firmware
/// expects `full_to_empty`, not the preset's own name.
pub const FILL_TO_EMPTY_MESSAGE: &str = "full_to_empty";

const FULL: &str = "255";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    Default,
    Rainbow,
    HappyFace,
    SpanishFlag,
    AndalusianFlag,
    ItalianFlag,
    FillToEmpty,
}

impl Preset {
    pub const ALL: [Preset; 7] = [
        Preset::Default,
        Preset::Rainbow,
        Preset::HappyFace,
        Preset::SpanishFlag,
        Preset::AndalusianFlag,
        Preset::ItalianFlag,
        Preset::FillToEmpty,
    ];

    /// Look up a preset by its mode name. Unknown names return `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Preset::Default => "default",
            Preset::Rainbow => "rainbow",
            Preset::HappyFace => "happy_face",
            Preset::SpanishFlag => "spanish_flag",
            Preset::AndalusianFlag => "andalusian_flag",
            Preset::ItalianFlag => "italian_flag",
            Preset::FillToEmpty => "fill_to_empty",
        }
    }

    /// The short-form message published on the preset channel.
    ///
    /// `fill_to_empty_color` is only used by [`Preset::FillToEmpty`].
    pub fn message(self, fill_to_empty_color: &str) -> String {
        match self {
            Preset::FillToEmpty => format!("{FILL_TO_EMPTY_MESSAGE}/color={fill_to_empty_color}"),
            other => other.name().to_string(),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn pattern(f: impl Fn(usize) -> ElementState) -> ElementTable {
    ElementTable::from_array(std::array::from_fn(f))
}

/// The table a preset shows on the ring.
///
/// `fill_to_empty` supplies the color for [`Preset::FillToEmpty`].
pub fn apply_preset(preset: Preset, fill_to_empty: &ElementState) -> ElementTable {
    match preset {
        Preset::Default => ElementTable::filled(ElementState::new("#FFFFFF", FULL)),
        Preset::Rainbow => {
            let step = 360.0 / LED_COUNT as f64;
            pattern(|i| ElementState::new(hsl_to_hex((i as f64 * step) % 360.0, 100.0, 50.0), FULL))
        }
        Preset::HappyFace => pattern(|i| match i {
            4 | 19 => ElementState::new("#00FFFF", FULL),
            7..=12 => ElementState::new("#FFFF00", FULL),
            _ => ElementState::new("#000000", "0"),
        }),
        Preset::SpanishFlag => pattern(|i| match i {
            0..=5 | 18..=23 => ElementState::new("#FF0000", FULL),
            _ => ElementState::new("#FFFF00", FULL),
        }),
        Preset::AndalusianFlag => pattern(|i| match i {
            0..=3 | 12..=15 => ElementState::new("#009900", FULL),
            _ => ElementState::new("#FFFFFF", FULL),
        }),
        Preset::ItalianFlag => pattern(|i| match i {
            0..=3 | 20..=23 => ElementState::new("#009900", FULL),
            4..=7 | 16..=19 => ElementState::new("#FFFFFF", FULL),
            _ => ElementState::new("#FF0000", FULL),
        }),
        Preset::FillToEmpty => ElementTable::filled(fill_to_empty.clone()),
    }
}
