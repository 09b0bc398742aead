//! `encode` and `fill` subcommands — compact a table and print the envelope.

use std::path::Path;

use serde::Serialize;

use super::{
    Config, Envelope, FlagArgs, Result, RingEditor, RinglampError, kv, kv_indent, kv_width, led,
    protocol, read_table,
};

#[derive(Serialize)]
struct EncodeOutput {
    topic: String,
    envelope: Envelope,
}

pub(super) fn cmd_encode(
    config: &Config,
    file: Option<&Path>,
    flags: &FlagArgs,
    json: bool,
) -> Result<()> {
    let table = read_table(file)?;
    let mut editor = RingEditor::from_config(config)?;
    flags.apply(&mut editor);
    let envelope = protocol::compact_and_encode(&table, &editor.flags());
    print_envelope(config, envelope, json)
}

pub(super) fn cmd_fill(
    config: &Config,
    color: Option<String>,
    brightness: u8,
    start: Option<usize>,
    count: Option<usize>,
    flags: &FlagArgs,
    json: bool,
) -> Result<()> {
    let mut editor = RingEditor::from_config(config)?;
    flags.apply(&mut editor);

    if start.is_none() && count.is_none() {
        let color = color.unwrap_or_else(|| config.fill_all_color.clone());
        editor.fill_all(&color, brightness)?;
    } else {
        let start = start.unwrap_or(0);
        if start >= led::LED_COUNT {
            return Err(RinglampError::Table(format!(
                "fill start {start} out of range (0-{})",
                led::LED_COUNT - 1
            )));
        }
        let end = match count {
            Some(n) => start.saturating_add(n).min(led::LED_COUNT),
            None => led::LED_COUNT,
        };
        let color = color.unwrap_or_else(|| config.fill_color.clone());
        editor.toggle_edit_mode()?;
        for index in start..end {
            editor.toggle_selection(index)?;
        }
        let run = editor.apply_fill(&color, brightness)?;
        log::debug!(
            "filled {} from {} with {}/{}",
            run.count,
            run.start,
            run.color,
            run.brightness
        );
    }

    print_envelope(config, editor.envelope(), json)
}

fn print_envelope(config: &Config, envelope: Envelope, json: bool) -> Result<()> {
    let topic = protocol::envelope_topic(&config.base_topic);

    if json {
        let output = EncodeOutput { topic, envelope };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let runs = envelope.runs()?;
    let explicit = envelope
        .leds
        .iter_indexed()
        .filter(|(_, e)| !e.is_sentinel())
        .count();

    let w = kv_width(&["Topic:", "Explicit:", "Payload:"], &["Run:"]);
    kv("Topic:", &topic, w);
    kv("Runs:", runs.len(), w);
    for run in &runs {
        kv_indent(
            "Run:",
            format_args!(
                "{}-{} {}/{}",
                run.start,
                run.end() - 1,
                run.color,
                run.brightness
            ),
            w,
        );
    }
    kv("Explicit:", explicit, w);
    kv("Payload:", envelope.to_json()?, w);
    Ok(())
}
