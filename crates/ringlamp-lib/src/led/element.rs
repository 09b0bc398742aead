//! Per-position element state and the fixed 24-entry element table.
//!
//! Color and brightness travel as strings on the wire. The value `"-1"` in
//! either field is the sentinel: "no explicit value here", either because a
//! run covers the position or because the device should keep what it shows.

use std::collections::HashMap;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Sentinel value for color or brightness.
pub const SENTINEL: &str = "-1";

/// Number of addressable positions on the ring.
pub const LED_COUNT: usize = 24;

/// Color of every element when a session starts.
pub const MOUNT_COLOR: &str = "#FFFFFF";

/// Color/brightness value for one ring position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementState {
    /// `#RRGGBB` or [`SENTINEL`].
    #[serde(rename = "c")]
    pub color: String,
    /// Decimal `0`-`255` or [`SENTINEL`].
    #[serde(rename = "b")]
    pub brightness: String,
}

impl ElementState {
    pub fn new(color: impl Into<String>, brightness: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            brightness: brightness.into(),
        }
    }

    /// The `("-1", "-1")` pair.
    pub fn sentinel() -> Self {
        Self::new(SENTINEL, SENTINEL)
    }

    pub fn is_sentinel_color(&self) -> bool {
        self.color == SENTINEL
    }

    pub fn is_sentinel_brightness(&self) -> bool {
        self.brightness == SENTINEL
    }

    /// Both fields carry a concrete value.
    pub fn is_explicit(&self) -> bool {
        !self.is_sentinel_color() && !self.is_sentinel_brightness()
    }

    /// Both fields are the sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.is_sentinel_color() && self.is_sentinel_brightness()
    }
}

impl Default for ElementState {
    fn default() -> Self {
        Self::new(MOUNT_COLOR, SENTINEL)
    }
}

impl fmt::Display for ElementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.color, self.brightness)
    }
}

/// The full ring: exactly [`LED_COUNT`] entries, index = physical position.
///
/// Serializes as the wire `leds` mapping (`{"0": {..}, .., "23": {..}}`),
/// keys in numeric order. Deserializing fills any missing key with the
/// sentinel pair; unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementTable {
    elements: [ElementState; LED_COUNT],
}

impl ElementTable {
    pub fn from_array(elements: [ElementState; LED_COUNT]) -> Self {
        Self { elements }
    }

    /// Every position set to the same state.
    pub fn filled(state: ElementState) -> Self {
        Self {
            elements: std::array::from_fn(|_| state.clone()),
        }
    }

    /// Every position set to the sentinel pair.
    pub fn sentinel() -> Self {
        Self::filled(ElementState::sentinel())
    }

    /// Build a table from a list of exactly [`LED_COUNT`] states.
    pub fn from_vec(states: Vec<ElementState>) -> crate::error::Result<Self> {
        let len = states.len();
        let elements: [ElementState; LED_COUNT] = states.try_into().map_err(|_| {
            crate::RinglampError::Table(format!("expected {LED_COUNT} elements, got {len}"))
        })?;
        Ok(Self { elements })
    }

    pub fn get(&self, index: usize) -> Option<&ElementState> {
        self.elements.get(index)
    }

    pub fn set(&mut self, index: usize, state: ElementState) -> crate::error::Result<()> {
        let slot = self.elements.get_mut(index).ok_or_else(|| {
            crate::RinglampError::Table(format!(
                "element index {index} out of range (0-{})",
                LED_COUNT - 1
            ))
        })?;
        *slot = state;
        Ok(())
    }

    /// `(index, state)` pairs in ascending index order.
    pub fn iter_indexed(&self) -> impl Iterator<Item = (usize, &ElementState)> {
        self.elements.iter().enumerate()
    }

}

impl Default for ElementTable {
    fn default() -> Self {
        Self::filled(ElementState::default())
    }
}

impl std::ops::Index<usize> for ElementTable {
    type Output = ElementState;

    fn index(&self, index: usize) -> &ElementState {
        &self.elements[index]
    }
}

impl std::ops::IndexMut<usize> for ElementTable {
    fn index_mut(&mut self, index: usize) -> &mut ElementState {
        &mut self.elements[index]
    }
}

impl Serialize for ElementTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(LED_COUNT))?;
        for (i, state) in self.iter_indexed() {
            map.serialize_entry(&i.to_string(), state)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ElementTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<String, ElementState>::deserialize(deserializer)?;
        let mut table = ElementTable::sentinel();
        for (key, state) in raw {
            let index: usize = key
                .parse()
                .map_err(|_| de::Error::custom(format!("element key is not an index: {key:?}")))?;
            if index >= LED_COUNT {
                return Err(de::Error::custom(format!(
                    "element index {index} out of range (0-{})",
                    LED_COUNT - 1
                )));
            }
            table.elements[index] = state;
        }
        Ok(table)
    }
}
