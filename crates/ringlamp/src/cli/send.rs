//! `send` subcommand — publish a table or preset.

use std::path::Path;

use ringlamp_lib::publish::PublishError;

use super::{Config, FlagArgs, Result, RingEditor, kv, kv_width, read_table};

pub(super) fn cmd_send(
    config: &Config,
    file: Option<&Path>,
    preset: Option<&str>,
    dry_run: bool,
    flags: &FlagArgs,
) -> Result<()> {
    let mut editor = RingEditor::from_config(config)?;
    flags.apply(&mut editor);

    match preset {
        Some(name) => {
            if !editor.select_preset_by_name(name) {
                println!("Unknown preset '{name}', nothing to send.");
                return Ok(());
            }
        }
        None => editor.load_table(read_table(file)?)?,
    }

    if dry_run {
        let message = editor.outgoing(&config.base_topic)?;
        let w = kv_width(&["Topic:", "Payload:"], &[]);
        kv("Topic:", &message.topic, w);
        kv("Payload:", &message.payload, w);
        return Ok(());
    }

    let publisher = config.publisher()?;

    if editor.send(&publisher, &config.base_topic, &config.publish_options()) {
        println!("Data sent successfully!");
        Ok(())
    } else {
        Err(PublishError::Failed("data was not sent".into()).into())
    }
}
