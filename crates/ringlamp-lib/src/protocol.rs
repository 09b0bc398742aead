//! Wire contract for the lamp firmware.
//!
//! Two channels hang off a base topic:
//! - `default_functions/` carries preset mode strings
//!   (`"rainbow"`, `"full_to_empty/color=#RRGGBB"`, ...)
//! - `json_function/` carries a full [`Envelope`] as JSON
//!
//! Every numeric field in the envelope is a decimal string. The firmware's
//! parser depends on it; do not switch these to JSON numbers.

use std::collections::HashMap;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::led::{self, ElementTable, LED_COUNT, Run};

/// Default base topic.
pub const BASE_TOPIC: &str = "topic/lamp/";

/// Channel segment for preset mode strings.
pub const PRESET_CHANNEL: &str = "default_functions/";

/// Channel segment for JSON envelopes.
pub const ENVELOPE_CHANNEL: &str = "json_function/";

/// Global brightness when nothing else is configured.
pub const DEFAULT_GLOBAL_BRIGHTNESS: u8 = 255;

fn join_topic(base: &str, channel: &str) -> String {
    if base.is_empty() || base.ends_with('/') {
        format!("{base}{channel}")
    } else {
        format!("{base}/{channel}")
    }
}

pub fn preset_topic(base: &str) -> String {
    join_topic(base, PRESET_CHANNEL)
}

pub fn envelope_topic(base: &str) -> String {
    join_topic(base, ENVELOPE_CHANNEL)
}

/// Convert a `0.0..=1.0` slider position to a 0-255 global brightness.
pub fn global_brightness_from_fraction(fraction: f64) -> u8 {
    if fraction.is_nan() {
        return 0;
    }
    (fraction.clamp(0.0, 1.0) * 255.0).round() as u8
}

// ── Wire types ──

/// A run as it appears in the `fills` mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireFill {
    pub c: String,
    pub start: String,
    pub count: String,
    pub brightness: String,
}

impl From<&Run> for WireFill {
    fn from(run: &Run) -> Self {
        WireFill {
            c: run.color.clone(),
            start: run.start.to_string(),
            count: run.count.to_string(),
            brightness: run.brightness.clone(),
        }
    }
}

impl TryFrom<&WireFill> for Run {
    type Error = crate::RinglampError;

    fn try_from(fill: &WireFill) -> crate::error::Result<Run> {
        let number = |field: &str, value: &str| {
            value.parse::<usize>().map_err(|_| {
                crate::RinglampError::Table(format!("fill {field} is not a number: {value:?}"))
            })
        };
        let start = number("start", &fill.start)?;
        let count = number("count", &fill.count)?;
        if start >= LED_COUNT {
            return Err(crate::RinglampError::Table(format!(
                "fill start {start} out of range (0-{})",
                LED_COUNT - 1
            )));
        }
        if count == 0 {
            return Err(crate::RinglampError::Table("fill count is zero".into()));
        }
        Ok(Run::new(fill.c.clone(), start, count, fill.brightness.clone()))
    }
}

/// Runs keyed by detection order: `{"0": {..}, "1": {..}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fills(pub Vec<WireFill>);

impl Fills {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WireFill> {
        self.0.iter()
    }
}

impl Serialize for Fills {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (i, fill) in self.0.iter().enumerate() {
            map.serialize_entry(&i.to_string(), fill)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Fills {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<String, WireFill>::deserialize(deserializer)?;
        let mut indexed = Vec::with_capacity(raw.len());
        for (key, fill) in raw {
            let i: usize = key
                .parse()
                .map_err(|_| de::Error::custom(format!("fill key is not an index: {key:?}")))?;
            indexed.push((i, fill));
        }
        indexed.sort_by_key(|(i, _)| *i);
        if indexed.iter().enumerate().any(|(pos, (i, _))| pos != *i) {
            return Err(de::Error::custom("fill keys must be 0..k-1"));
        }
        Ok(Fills(indexed.into_iter().map(|(_, f)| f).collect()))
    }
}

/// Scalar flags sent with every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeFlags {
    pub is_flush: bool,
    pub is_intermitent: bool,
    pub global_b: u8,
}

impl Default for EnvelopeFlags {
    fn default() -> Self {
        Self {
            is_flush: false,
            is_intermitent: false,
            global_b: DEFAULT_GLOBAL_BRIGHTNESS,
        }
    }
}

/// The complete payload for one update.
///
/// Field order is the serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub leds: ElementTable,
    pub has_fill: bool,
    pub fills: Fills,
    pub is_flush: bool,
    pub is_intermitent: bool,
    pub global_b: String,
}

impl Envelope {
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(s: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Decode the `fills` mapping back into runs.
    pub fn runs(&self) -> crate::error::Result<Vec<Run>> {
        self.fills.iter().map(Run::try_from).collect()
    }

    /// Reconstruct the full table the envelope describes: explicit `leds`
    /// entries plus every run expanded over its positions.
    pub fn expanded_table(&self) -> crate::error::Result<ElementTable> {
        Ok(led::expand_runs(&self.leds, &self.runs()?))
    }
}

/// Assemble an envelope from an already run-applied table.
///
/// The table always has 24 entries, so the output carries every index. Runs are keyed `0..k-1` in the order
/// given, independent of their `start`.
pub fn encode_envelope(table: &ElementTable, runs: &[Run], flags: &EnvelopeFlags) -> Envelope {
    Envelope {
        leds: table.clone(),
        has_fill: !runs.is_empty(),
        fills: Fills(runs.iter().map(WireFill::from).collect()),
        is_flush: flags.is_flush,
        is_intermitent: flags.is_intermitent,
        global_b: flags.global_b.to_string(),
    }
}

/// Detect runs, defer the positions they cover and build the envelope.
pub fn compact_and_encode(table: &ElementTable, flags: &EnvelopeFlags) -> Envelope {
    let runs = led::detect_runs(table);
    let applied = led::apply_runs(table, &runs);
    let envelope = encode_envelope(&applied, &runs, flags);
    log::debug!(
        "encoded envelope: {} run(s), {} explicit element(s)",
        runs.len(),
        envelope
            .leds
            .iter_indexed()
            .filter(|(_, e)| !e.is_sentinel())
            .count()
    );
    envelope
}
