//! Ring element model — element table, run compaction, presets, colors.

mod color;
mod element;
mod preset;
mod runs;

pub use color::{
    format_color, hsl_to_hex, hsv_to_hex, normalize_color, parse_brightness, parse_color,
};
pub use element::{ElementState, ElementTable, LED_COUNT, MOUNT_COLOR, SENTINEL};
pub use preset::{FILL_TO_EMPTY_MESSAGE, Preset, apply_preset};
pub use runs::{MIN_RUN_LEN, Run, apply_runs, detect_runs, expand_runs};
