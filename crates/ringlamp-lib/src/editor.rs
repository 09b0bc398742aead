//! Editing session — the state a client mutates between sends.
//!
//! [`RingEditor`] owns the element table and the scalar flags. Every send
//! snapshots the table into the state-free pipeline in [`crate::protocol`],
//! so nothing computed for one send leaks into the next. Runs are always
//! recomputed from the table; fills recorded by [`RingEditor::apply_fill`]
//! are kept for display only.

use crate::config::Config;
use crate::led::{self, ElementState, ElementTable, LED_COUNT, Preset, Run};
use crate::protocol::{self, Envelope, EnvelopeFlags};
use crate::publish::{self, MessageKind, OutgoingMessage, PublishOptions, Publisher};
use crate::RinglampError;

/// Brightness used by "clear all" and the fill-to-empty default.
const FULL_BRIGHTNESS: u8 = 255;

#[derive(Debug, Clone)]
struct Saved {
    table: ElementTable,
    fills: Vec<Run>,
}

/// Mutable session state for one ring.
#[derive(Debug, Clone)]
pub struct RingEditor {
    table: ElementTable,
    fills: Vec<Run>,
    flags: EnvelopeFlags,
    preset: Option<Preset>,
    saved: Option<Saved>,
    fill_to_empty: ElementState,
    edit_mode: bool,
    selection: Vec<usize>,
}

impl Default for RingEditor {
    fn default() -> Self {
        Self::new()
    }
}

fn element(color: &str, brightness: u8) -> crate::error::Result<ElementState> {
    Ok(ElementState::new(
        led::normalize_color(color)?,
        brightness.to_string(),
    ))
}

fn check_index(index: usize) -> crate::error::Result<()> {
    if index >= LED_COUNT {
        return Err(RinglampError::Table(format!(
            "element index {index} out of range (0-{})",
            LED_COUNT - 1
        )));
    }
    Ok(())
}

impl RingEditor {
    /// Fresh session: all-white table, no preset, full global brightness.
    pub fn new() -> Self {
        Self {
            table: ElementTable::default(),
            fills: Vec::new(),
            flags: EnvelopeFlags::default(),
            preset: None,
            saved: None,
            fill_to_empty: ElementState::new("#FF0000", FULL_BRIGHTNESS.to_string()),
            edit_mode: false,
            selection: Vec::new(),
        }
    }

    /// Fresh session seeded with the configured global brightness and
    /// fill-to-empty color.
    pub fn from_config(config: &Config) -> crate::error::Result<Self> {
        let mut editor = Self::new();
        editor.flags.global_b = config.global_brightness;
        editor.fill_to_empty = element(&config.fill_to_empty_color, FULL_BRIGHTNESS)?;
        Ok(editor)
    }

    // ── Accessors ──

    pub fn table(&self) -> &ElementTable {
        &self.table
    }

    /// Fills recorded by manual edits, in the order they were made.
    pub fn fills(&self) -> &[Run] {
        &self.fills
    }

    pub fn flags(&self) -> EnvelopeFlags {
        self.flags
    }

    pub fn preset(&self) -> Option<Preset> {
        self.preset
    }

    pub fn fill_to_empty(&self) -> &ElementState {
        &self.fill_to_empty
    }

    pub fn is_edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn selection(&self) -> &[usize] {
        &self.selection
    }

    fn ensure_no_preset(&self, action: &str) -> crate::error::Result<()> {
        match self.preset {
            Some(p) => Err(RinglampError::Editor(format!(
                "cannot {action} while preset {p} is selected"
            ))),
            None => Ok(()),
        }
    }

    // ── Element edits ──

    /// Set one element's color and brightness.
    pub fn set_element(
        &mut self,
        index: usize,
        color: &str,
        brightness: u8,
    ) -> crate::error::Result<()> {
        self.ensure_no_preset("edit elements")?;
        check_index(index)?;
        self.table.set(index, element(color, brightness)?)
    }

    /// Replace the whole table, e.g. with one loaded from a file.
    /// Recorded fills are dropped.
    pub fn load_table(&mut self, table: ElementTable) -> crate::error::Result<()> {
        self.ensure_no_preset("load a table")?;
        self.table = table;
        self.fills.clear();
        Ok(())
    }

    /// Set every element to one color and replace the fills with a single
    /// full-ring run.
    pub fn fill_all(&mut self, color: &str, brightness: u8) -> crate::error::Result<()> {
        self.ensure_no_preset("fill all")?;
        let state = element(color, brightness)?;
        self.table = ElementTable::filled(state.clone());
        self.fills = vec![Run::new(state.color, 0, LED_COUNT, state.brightness)];
        log::debug!("filled all elements with {color}");
        Ok(())
    }

    /// Reset every element to full white.
    pub fn clear_all(&mut self) -> crate::error::Result<()> {
        self.fill_all(led::MOUNT_COLOR, FULL_BRIGHTNESS)
    }

    // ── Edit mode (multi-element fill) ──

    /// Enter or leave edit mode. Leaving clears the selection.
    pub fn toggle_edit_mode(&mut self) -> crate::error::Result<bool> {
        self.ensure_no_preset("enter edit mode")?;
        self.edit_mode = !self.edit_mode;
        if !self.edit_mode {
            self.selection.clear();
        }
        Ok(self.edit_mode)
    }

    /// Select or deselect an element. Returns whether it is now selected.
    pub fn toggle_selection(&mut self, index: usize) -> crate::error::Result<bool> {
        if !self.edit_mode {
            return Err(RinglampError::Editor("not in edit mode".into()));
        }
        check_index(index)?;
        if let Some(pos) = self.selection.iter().position(|&i| i == index) {
            self.selection.remove(pos);
            Ok(false)
        } else {
            self.selection.push(index);
            Ok(true)
        }
    }

    /// Paint every selected element, record the fill and leave edit mode.
    pub fn apply_fill(&mut self, color: &str, brightness: u8) -> crate::error::Result<Run> {
        self.ensure_no_preset("apply a fill")?;
        let Some(&start) = self.selection.iter().min() else {
            return Err(RinglampError::Editor(
                "select at least one element for the fill".into(),
            ));
        };
        let state = element(color, brightness)?;
        for &index in &self.selection {
            self.table.set(index, state.clone())?;
        }
        let run = Run::new(state.color, start, self.selection.len(), state.brightness);
        self.fills.push(run.clone());
        self.edit_mode = false;
        self.selection.clear();
        Ok(run)
    }

    // ── Presets ──

    /// Select a preset, or deselect it if it is already active.
    ///
    /// The first selection saves the current table; deselecting restores it.
    /// Switching between presets keeps the original saved table.
    pub fn select_preset(&mut self, preset: Preset) {
        if self.preset == Some(preset) {
            self.preset = None;
            if let Some(saved) = self.saved.take() {
                self.table = saved.table;
                self.fills = saved.fills;
            }
            log::debug!("deselected preset {preset}");
            return;
        }

        if self.preset.is_none() {
            self.saved = Some(Saved {
                table: self.table.clone(),
                fills: self.fills.clone(),
            });
        }
        self.preset = Some(preset);
        self.table = led::apply_preset(preset, &self.fill_to_empty);
        self.edit_mode = false;
        self.selection.clear();
        log::debug!("selected preset {preset}");
    }

    /// Select a preset by mode name. Unknown names change nothing and
    /// return `false`.
    pub fn select_preset_by_name(&mut self, name: &str) -> bool {
        match Preset::from_name(name) {
            Some(p) => {
                self.select_preset(p);
                true
            }
            None => {
                log::debug!("ignoring unknown preset {name:?}");
                false
            }
        }
    }

    /// Set the fill-to-empty color. Refreshes the table if that preset is shown.
    pub fn set_fill_to_empty_color(
        &mut self,
        color: &str,
        brightness: u8,
    ) -> crate::error::Result<()> {
        self.fill_to_empty = element(color, brightness)?;
        if self.preset == Some(Preset::FillToEmpty) {
            self.table = led::apply_preset(Preset::FillToEmpty, &self.fill_to_empty);
        }
        Ok(())
    }

    // ── Flags ──

    pub fn set_flush(&mut self, on: bool) {
        self.flags.is_flush = on;
    }

    pub fn set_intermittent(&mut self, on: bool) {
        self.flags.is_intermitent = on;
    }

    pub fn set_global_brightness(&mut self, value: u8) {
        self.flags.global_b = value;
    }

    /// Set global brightness from a `0.0..=1.0` slider position.
    pub fn set_global_brightness_fraction(&mut self, fraction: f64) {
        self.flags.global_b = protocol::global_brightness_from_fraction(fraction);
    }

    // ── Sending ──

    /// Envelope for the current table and flags.
    pub fn envelope(&self) -> Envelope {
        protocol::compact_and_encode(&self.table, &self.flags)
    }

    /// The message a send would publish right now.
    ///
    /// With a preset active this is the short mode string on the preset
    /// channel; otherwise the compacted envelope on the envelope channel.
    pub fn outgoing(&self, base_topic: &str) -> crate::error::Result<OutgoingMessage> {
        Ok(match self.preset {
            Some(preset) => OutgoingMessage {
                kind: MessageKind::Preset,
                topic: protocol::preset_topic(base_topic),
                payload: preset.message(&self.fill_to_empty.color),
            },
            None => OutgoingMessage {
                kind: MessageKind::Envelope,
                topic: protocol::envelope_topic(base_topic),
                payload: self.envelope().to_json()?,
            },
        })
    }

    /// Build the outgoing message and publish it. Returns whether it was sent.
    pub fn send(
        &self,
        publisher: &impl Publisher,
        base_topic: &str,
        options: &PublishOptions,
    ) -> bool {
        match self.outgoing(base_topic) {
            Ok(message) => publish::send(publisher, &message, options),
            Err(e) => {
                log::warn!("cannot build message: {e}");
                false
            }
        }
    }
}
