//! `config` subcommand — show current configuration and validation results.

use std::path::Path;

use super::{Config, ConfigOutput, Result, kv, kv_indent, kv_width, led, protocol};

/// Password shown in place of a non-empty secret.
const MASK: &str = "********";

fn color_display(value: &str) -> String {
    match led::parse_color(value) {
        Ok(val) => format!("{value} -> {}", led::format_color(val)),
        Err(_) => format!("{value} (invalid)"),
    }
}

pub(super) fn cmd_config(config: &Config, custom_path: Option<&Path>, json: bool) -> Result<()> {
    let config_path = custom_path.map(|p| p.to_path_buf()).or_else(Config::path);
    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());

    let errors: Vec<String> = match config.validate() {
        Ok(()) => Vec::new(),
        Err(errs) => errs.iter().map(|e| e.to_string()).collect(),
    };

    let mut settings = config.clone();
    if !settings.password.is_empty() {
        settings.password = MASK.into();
    }

    if json {
        let output = ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            settings,
            errors,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let w = kv_width(
        &["Config file:"],
        &[
            "broker_address:",
            "requires_auth:",
            "publish_command:",
            "global_brightness:",
            "fill_to_empty_color:",
        ],
    );

    match &config_path {
        Some(p) => {
            if config_exists {
                kv("Config file:", format_args!("{} (loaded)", p.display()), w);
            } else {
                kv(
                    "Config file:",
                    format_args!("{} (not found, using defaults)", p.display()),
                    w,
                );
            }
        }
        None => kv("Config file:", "(no config directory)", w),
    }
    println!();

    let or_unset = |s: &str| {
        if s.trim().is_empty() {
            "(not set)".to_string()
        } else {
            s.to_string()
        }
    };

    println!("Broker:");
    let broker = match config.broker_address.trim() {
        "" => "(not set)".to_string(),
        addr => match ringlamp_lib::config::normalize_broker_address(addr) {
            Ok(normalized) if normalized != addr => format!("{addr} -> {normalized}"),
            Ok(_) => addr.to_string(),
            Err(_) => format!("{addr} (invalid)"),
        },
    };
    kv_indent("broker_address:", broker, w);
    kv_indent("requires_auth:", settings.requires_auth, w);
    if settings.requires_auth {
        kv_indent("username:", or_unset(&settings.username), w);
        kv_indent("password:", or_unset(&settings.password), w);
    }
    kv_indent("publish_command:", or_unset(&settings.publish_command), w);
    kv_indent("qos:", settings.qos, w);
    kv_indent("retain:", settings.retain, w);
    println!();

    println!("Topics:");
    kv_indent("presets:", protocol::preset_topic(&settings.base_topic), w);
    kv_indent("envelope:", protocol::envelope_topic(&settings.base_topic), w);
    println!();

    println!("Lamp:");
    kv_indent("global_brightness:", settings.global_brightness, w);
    kv_indent(
        "fill_to_empty_color:",
        color_display(&settings.fill_to_empty_color),
        w,
    );
    kv_indent("fill_all_color:", color_display(&settings.fill_all_color), w);
    kv_indent("fill_color:", color_display(&settings.fill_color), w);

    if !errors.is_empty() {
        println!();
        println!("Problems:");
        for e in &errors {
            println!("  {e}");
        }
    }
    Ok(())
}
