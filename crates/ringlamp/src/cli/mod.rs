//! CLI subcommands — encode tables, presets, publishing, configuration.

mod config_cmd;
mod encode;
mod preset;
mod send;

use std::io::Read;
use std::path::Path;

use clap::{Args, Subcommand};
use serde::Serialize;

pub(super) use ringlamp_lib::config::Config;
pub(super) use ringlamp_lib::editor::RingEditor;
pub(super) use ringlamp_lib::error::Result;
pub(super) use ringlamp_lib::led::{self, ElementState, ElementTable};
pub(super) use ringlamp_lib::protocol::{self, Envelope};
pub(super) use ringlamp_lib::RinglampError;

const PADDING: usize = 2;

/// Compute alignment width for a command's key-value output.
/// Ensures at least PADDING spaces after the longest key in either level,
/// with top-level and indent values aligned to the same column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_max = top.iter().map(|k| k.len()).max().unwrap_or(0);
    let indent_max = indent.iter().map(|k| k.len()).max().unwrap_or(0);
    let top_need = if top.is_empty() { 0 } else { top_max + PADDING };
    // Indent keys lose 2 chars of inner width to the "  " prefix
    let indent_need = if indent.is_empty() {
        0
    } else {
        indent_max + PADDING + 2
    };
    top_need.max(indent_need)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<width$}{value}", width = w)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv(key, value, w));
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {key:<width$}{value}", width = w - 2);
}

/// Load config from `custom_path` if given, else the platform default.
/// Parse warnings are logged.
pub(super) fn load_config(custom_path: Option<&Path>) -> Config {
    match custom_path {
        Some(path) => {
            let (config, warnings) = Config::load_from(path);
            for w in &warnings {
                log::warn!("{w}");
            }
            config
        }
        None => Config::load(),
    }
}

/// Read an element table from a file, or stdin when `path` is `None` or `-`.
///
/// Accepts a JSON array of 24 `{c, b}` objects, a `leds`-style mapping, or a
/// full envelope (runs are expanded back over their positions).
pub(super) fn read_table(path: Option<&Path>) -> Result<ElementTable> {
    let contents = match path {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p)?,
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    parse_table(&contents)
}

pub(super) fn parse_table(contents: &str) -> Result<ElementTable> {
    let value: serde_json::Value = serde_json::from_str(contents)?;
    let table = if value.is_array() {
        let states: Vec<ElementState> = serde_json::from_value(value)?;
        ElementTable::from_vec(states)?
    } else if value.get("leds").is_some() {
        let envelope: Envelope = serde_json::from_value(value)?;
        envelope.expanded_table()?
    } else {
        serde_json::from_value(value)?
    };
    check_table(&table)?;
    Ok(table)
}

/// Every non-sentinel field must be a valid color or 0-255 brightness.
fn check_table(table: &ElementTable) -> Result<()> {
    for (i, state) in table.iter_indexed() {
        let at = |e: RinglampError| RinglampError::Table(format!("element {i}: {e}"));
        if !state.is_sentinel_color() {
            led::parse_color(&state.color).map_err(at)?;
        }
        if !state.is_sentinel_brightness() {
            led::parse_brightness(&state.brightness).map_err(at)?;
        }
    }
    Ok(())
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub settings: Config,
    pub errors: Vec<String>,
}

/// Envelope flags shared by `encode`, `fill` and `send`.
#[derive(Args, Debug, Clone, Default)]
pub struct FlagArgs {
    /// Set the flush flag
    #[arg(long)]
    flush: bool,
    /// Set the intermittent flag
    #[arg(long)]
    intermittent: bool,
    /// Global brightness 0-255 (default: from config)
    #[arg(long, value_name = "0-255")]
    global_b: Option<u8>,
}

impl FlagArgs {
    pub(super) fn apply(&self, editor: &mut RingEditor) {
        editor.set_flush(self.flush);
        editor.set_intermittent(self.intermittent);
        if let Some(b) = self.global_b {
            editor.set_global_brightness(b);
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Compact a table into an envelope and print it
    Encode {
        /// Table JSON file (default: stdin)
        file: Option<String>,
        #[command(flatten)]
        flags: FlagArgs,
    },

    /// Fill all (or a span of) elements with one color and print the envelope
    Fill {
        /// Color as #RRGGBB or a name (default: fill_all_color from config)
        #[arg(long, conflicts_with = "hue")]
        color: Option<String>,
        /// Fully saturated color by hue in degrees, as picked on a color wheel
        #[arg(long, value_name = "0-360")]
        hue: Option<f64>,
        /// Element brightness 0-255
        #[arg(long, default_value_t = 255)]
        brightness: u8,
        /// First element of the span
        #[arg(long)]
        start: Option<usize>,
        /// Number of elements in the span (default: to the end of the ring)
        #[arg(long)]
        count: Option<usize>,
        #[command(flatten)]
        flags: FlagArgs,
    },

    /// Show the message a preset sends
    Preset {
        /// Preset name (see `presets`)
        name: String,
        /// Color for fill_to_empty (default: from config)
        #[arg(long)]
        color: Option<String>,
        /// Also print the table the preset shows
        #[arg(long)]
        table: bool,
    },

    /// List preset names
    Presets,

    /// Publish a table or preset through the configured publish command
    Send {
        /// Table JSON file (default: stdin unless --preset is given)
        file: Option<String>,
        /// Send a preset instead of a table
        #[arg(long, conflicts_with = "file")]
        preset: Option<String>,
        /// Print the message instead of publishing it
        #[arg(long)]
        dry_run: bool,
        #[command(flatten)]
        flags: FlagArgs,
    },

    /// Show current configuration and validation results
    Config,
}

/// Warn if `--json` was passed to a command that doesn't support it.
fn warn_json_unsupported(cmd_name: &str) {
    log::warn!("--json is not supported for `{cmd_name}` (ignored)");
}

pub fn run(cmd: Command, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    match cmd {
        Command::Encode { file, flags } => {
            encode::cmd_encode(&config, file.as_deref().map(Path::new), &flags, json)
        }
        Command::Fill {
            color,
            hue,
            brightness,
            start,
            count,
            flags,
        } => {
            let color =
                color.or_else(|| hue.map(|h| led::hsv_to_hex(h.rem_euclid(360.0) / 360.0, 1.0, 1.0)));
            encode::cmd_fill(&config, color, brightness, start, count, &flags, json)
        }
        Command::Preset { name, color, table } => {
            preset::cmd_preset(&config, &name, color, table, json)
        }
        Command::Presets => preset::cmd_presets(&config, json),
        Command::Send {
            file,
            preset,
            dry_run,
            flags,
        } => {
            if json {
                warn_json_unsupported("send");
            }
            send::cmd_send(
                &config,
                file.as_deref().map(Path::new),
                preset.as_deref(),
                dry_run,
                &flags,
            )
        }
        Command::Config => config_cmd::cmd_config(&config, config_path, json),
    }
}


#[cfg(test)]
mod table_input_tests {
    use super::*;

    #[test]
    fn parse_array_form() {
        let items: Vec<String> = (0..24)
            .map(|_| r##"{"c": "#FF0000", "b": "255"}"##.to_string())
            .collect();
        let table = parse_table(&format!("[{}]", items.join(","))).unwrap();
        assert_eq!(table, ElementTable::filled(ElementState::new("#FF0000", "255")));
    }

    #[test]
    fn parse_array_wrong_length() {
        let err = parse_table(r##"[{"c": "#FF0000", "b": "255"}]"##).unwrap_err();
        assert!(err.to_string().contains("expected 24"), "got: {err}");
    }

    #[test]
    fn parse_mapping_form_fills_missing() {
        let table = parse_table(r##"{"5": {"c": "#00FF00", "b": "9"}}"##).unwrap();
        assert_eq!(table[5], ElementState::new("#00FF00", "9"));
        assert!(table[0].is_sentinel());
    }

    #[test]
    fn parse_envelope_form_expands_runs() {
        let original = ElementTable::filled(ElementState::new("#FFFFFF", "255"));
        let json = protocol::compact_and_encode(&original, &Default::default())
            .to_json()
            .unwrap();
        assert_eq!(parse_table(&json).unwrap(), original);
    }

    #[test]
    fn parse_rejects_bad_brightness() {
        let err = parse_table(r##"{"2": {"c": "#00FF00", "b": "300"}}"##).unwrap_err();
        assert!(err.to_string().contains("element 2"), "got: {err}");
    }

    #[test]
    fn parse_rejects_bad_color() {
        assert!(matches!(
            parse_table(r##"{"0": {"c": "mauve-ish", "b": "10"}}"##),
            Err(RinglampError::Table(_))
        ));
    }

    #[test]
    fn parse_accepts_half_sentinel_elements() {
        let json = r##"{"0": {"c": "#FF0000", "b": "-1"}, "1": {"c": "-1", "b": "7"}}"##;
        let table = parse_table(json).unwrap();
        assert!(!table[0].is_explicit());
        assert!(!table[1].is_explicit());
    }

    #[test]
    fn parse_envelope_with_fill_outside_ring_is_error() {
        let json = r##"{"leds": {}, "has_fill": true,
            "fills": {"0": {"c": "#FF0000", "start": "18446744073709551615", "count": "2", "brightness": "9"}},
            "is_flush": false, "is_intermitent": false, "global_b": "255"}"##;
        assert!(parse_table(json).is_err());
    }

    #[test]
    fn parse_garbage_is_json_error() {
        assert!(matches!(
            parse_table("not json"),
            Err(RinglampError::Json(_))
        ));
    }
}
