//! `preset` and `presets` subcommands.

use serde::Serialize;

use super::{Config, ElementTable, Result, RingEditor, kv, kv_indent, kv_width, led};

/// `preset`, `topic` and `payload` are `null` for an unknown name.
#[derive(Serialize)]
struct PresetOutput {
    preset: Option<String>,
    topic: Option<String>,
    payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    table: Option<ElementTable>,
}

#[derive(Serialize)]
struct PresetListEntry {
    name: &'static str,
    message: String,
}

pub(super) fn cmd_preset(
    config: &Config,
    name: &str,
    color: Option<String>,
    show_table: bool,
    json: bool,
) -> Result<()> {
    let mut editor = RingEditor::from_config(config)?;
    if let Some(color) = color {
        editor.set_fill_to_empty_color(&color, 255)?;
    }

    if !editor.select_preset_by_name(name) {
        // Unknown modes are ignored rather than rejected.
        if json {
            let output = PresetOutput {
                preset: None,
                topic: None,
                payload: None,
                table: None,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Unknown preset '{name}', nothing to send.");
        }
        return Ok(());
    }

    let message = editor.outgoing(&config.base_topic)?;
    let preset = editor.preset().map(|p| p.name()).unwrap_or(name);

    if json {
        let output = PresetOutput {
            preset: Some(preset.to_string()),
            topic: Some(message.topic),
            payload: Some(message.payload),
            table: show_table.then(|| editor.table().clone()),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let w = kv_width(&["Preset:", "Payload:"], &["23:"]);
    kv("Preset:", preset, w);
    kv("Topic:", &message.topic, w);
    kv("Payload:", &message.payload, w);
    if show_table {
        println!();
        println!("Table:");
        for (i, state) in editor.table().iter_indexed() {
            kv_indent(&format!("{i}:"), state, w);
        }
    }
    Ok(())
}

pub(super) fn cmd_presets(config: &Config, json: bool) -> Result<()> {
    if json {
        let entries: Vec<PresetListEntry> = led::Preset::ALL
            .iter()
            .map(|p| PresetListEntry {
                name: p.name(),
                message: p.message(&config.fill_to_empty_color),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for preset in led::Preset::ALL {
        println!("{preset}");
    }
    Ok(())
}
