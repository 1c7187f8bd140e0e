//! Message Tree Rendering
//!
//! Walks a message and its message-typed fields depth first, emitting one
//! [`DisplayLine`] per message header, field and oneof group, plus a
//! [`PanelHint`] for every collapsible section. The output is consumed
//! verbatim by a display layer; nothing here knows about styling.
//!
//! A message already rendered in the current call is skipped, so cyclic
//! schemas terminate and a message appears at most once per render.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::types::{field_label, FieldLabel};
use super::{matches_pattern, SearchPattern};
use crate::config::RenderConfig;
use crate::descriptor::{DescriptorPool, FieldDescriptor, MessageDescriptor};

const DEFAULT_REPEATED_MARKER: &str = "[repeated]";

/// What a display line describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Message,
    Field,
    Oneof,
}

/// One line of rendered output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayLine {
    pub depth: usize,
    pub text: String,
    pub is_match: bool,
    pub kind: LineKind,
    /// Panel opened by this line (message and oneof headers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel_id: Option<String>,
}

/// Expansion hint for a collapsible section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelHint {
    pub panel_id: String,
    pub label: String,
    pub depth: usize,
    pub expanded: bool,
}

/// Ordered display lines and panel hints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOutput {
    pub lines: Vec<DisplayLine>,
    pub panels: Vec<PanelHint>,
}

impl RenderOutput {
    pub fn panel(&self, panel_id: &str) -> Option<&PanelHint> {
        self.panels.iter().find(|p| p.panel_id == panel_id)
    }

    /// Full names of every rendered message, in order
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(|line| line.kind == LineKind::Message)
            .map(|line| line.text.as_str())
    }

    pub fn contains_text(&self, text: &str) -> bool {
        self.lines.iter().any(|line| line.text == text)
    }
}

/// A field that survived filtering, with its resolved label
struct PreparedField<'a> {
    text: String,
    is_match: bool,
    /// Message to descend into (message-typed, not a map, present in the pool)
    child: Option<&'a MessageDescriptor>,
    /// Label match, or a match somewhere below the referenced message
    contains_match: bool,
}

/// Renders message trees from a descriptor pool
pub struct Renderer<'a> {
    pool: &'a DescriptorPool,
    pattern: Option<&'a SearchPattern>,
    filter_mode: bool,
    repeated_marker: &'a str,
}

impl<'a> Renderer<'a> {
    pub fn new(pool: &'a DescriptorPool) -> Self {
        Self {
            pool,
            pattern: None,
            filter_mode: false,
            repeated_marker: DEFAULT_REPEATED_MARKER,
        }
    }

    pub fn with_pattern(mut self, pattern: Option<&'a SearchPattern>) -> Self {
        self.pattern = pattern;
        self
    }

    /// Drop message-typed fields with no match in their label or subtree
    pub fn with_filter(mut self, filter_mode: bool) -> Self {
        self.filter_mode = filter_mode;
        self
    }

    pub fn with_repeated_marker(mut self, marker: &'a str) -> Self {
        self.repeated_marker = marker;
        self
    }

    /// Render a message tree; each call starts with an empty visited set
    pub fn render(&self, message: &'a MessageDescriptor) -> RenderOutput {
        let mut output = RenderOutput::default();
        let mut visited = HashSet::new();
        self.render_message(message, 0, &mut visited, &mut output);
        output
    }

    fn render_message(
        &self,
        message: &'a MessageDescriptor,
        depth: usize,
        visited: &mut HashSet<&'a str>,
        output: &mut RenderOutput,
    ) {
        if !visited.insert(message.full_name.as_str()) {
            return;
        }

        let expanded = depth == 0 || matches_pattern(self.pool, message, self.pattern);
        let panel_id = message.full_name.clone();
        output.panels.push(PanelHint {
            panel_id: panel_id.clone(),
            label: message.full_name.clone(),
            depth,
            expanded,
        });
        output.lines.push(DisplayLine {
            depth,
            text: message.full_name.clone(),
            is_match: self.is_match(&message.full_name),
            kind: LineKind::Message,
            panel_id: Some(panel_id),
        });

        let (regular, groups) = partition_fields(message);

        for field in regular {
            if let Some(prepared) = self.prepare_field(field) {
                self.emit_field(prepared, depth, visited, output);
            }
        }

        for (group, alternatives) in groups {
            let prepared: Vec<PreparedField<'a>> = alternatives
                .into_iter()
                .filter_map(|field| self.prepare_field(field))
                .collect();
            if prepared.is_empty() && self.filtering() {
                continue;
            }

            let label = format!("(oneof) {}", group);
            let panel_id = format!("{}#oneof:{}", message.full_name, group);
            output.panels.push(PanelHint {
                panel_id: panel_id.clone(),
                label: label.clone(),
                depth: depth + 1,
                expanded: self.pattern.is_some() && prepared.iter().any(|p| p.contains_match),
            });
            output.lines.push(DisplayLine {
                depth,
                text: label,
                is_match: self.is_match(group),
                kind: LineKind::Oneof,
                panel_id: Some(panel_id),
            });

            for field in prepared {
                self.emit_field(field, depth + 1, visited, output);
            }
        }
    }

    fn emit_field(
        &self,
        field: PreparedField<'a>,
        depth: usize,
        visited: &mut HashSet<&'a str>,
        output: &mut RenderOutput,
    ) {
        output.lines.push(DisplayLine {
            depth,
            text: field.text,
            is_match: field.is_match,
            kind: LineKind::Field,
            panel_id: None,
        });
        if let Some(child) = field.child {
            self.render_message(child, depth + 1, visited, output);
        }
    }

    /// Resolve a field's label and apply the filter policy
    fn prepare_field(&self, field: &'a FieldDescriptor) -> Option<PreparedField<'a>> {
        let label: FieldLabel = field_label(self.pool, field);
        let is_match = self.is_match(&label.match_text());
        let referenced = field.message_type().and_then(|target| self.pool.message(target));

        let contains_match = is_match
            || referenced
                .map(|message| matches_pattern(self.pool, message, self.pattern))
                .unwrap_or(false);
        if self.filtering() && field.message_type().is_some() && !contains_match {
            return None;
        }

        Some(PreparedField {
            text: label.text(self.repeated_marker),
            is_match,
            child: referenced.filter(|_| !label.is_map),
            contains_match,
        })
    }

    fn filtering(&self) -> bool {
        self.filter_mode && self.pattern.is_some()
    }

    fn is_match(&self, text: &str) -> bool {
        self.pattern.map(|p| p.is_match(text)).unwrap_or(false)
    }
}

/// Regular fields in declaration order, and oneof groups in order of first
/// appearance
fn partition_fields(
    message: &MessageDescriptor,
) -> (Vec<&FieldDescriptor>, Vec<(&str, Vec<&FieldDescriptor>)>) {
    let mut regular = Vec::new();
    let mut groups: Vec<(&str, Vec<&FieldDescriptor>)> = Vec::new();

    for field in &message.fields {
        match field.oneof_group.as_deref() {
            None => regular.push(field),
            Some(group) => match groups.iter_mut().find(|(name, _)| *name == group) {
                Some((_, fields)) => fields.push(field),
                None => groups.push((group, vec![field])),
            },
        }
    }

    (regular, groups)
}

/// Render `message` with default settings
pub fn render(
    pool: &DescriptorPool,
    message: &MessageDescriptor,
    pattern: Option<&SearchPattern>,
    filter_mode: bool,
) -> RenderOutput {
    Renderer::new(pool)
        .with_pattern(pattern)
        .with_filter(filter_mode)
        .render(message)
}

/// Plain-text sink: indents by depth, marks panels open/closed, and wraps
/// matches in the configured highlight markers
pub struct TextFormatter<'a> {
    config: &'a RenderConfig,
    pattern: Option<&'a SearchPattern>,
}

impl<'a> TextFormatter<'a> {
    pub fn new(config: &'a RenderConfig, pattern: Option<&'a SearchPattern>) -> Self {
        Self { config, pattern }
    }

    pub fn format(&self, output: &RenderOutput) -> String {
        let expanded: HashMap<&str, bool> = output
            .panels
            .iter()
            .map(|p| (p.panel_id.as_str(), p.expanded))
            .collect();

        let mut text = String::new();
        for line in &output.lines {
            text.push_str(&" ".repeat(line.depth * self.config.indent_width));
            if let Some(panel) = &line.panel_id {
                let open = expanded.get(panel.as_str()).copied().unwrap_or(false);
                text.push_str(if open { "▾ " } else { "▸ " });
            } else {
                text.push_str("- ");
            }
            match self.pattern {
                Some(pattern) if line.is_match => text.push_str(&pattern.highlight(
                    &line.text,
                    &self.config.highlight_open,
                    &self.config.highlight_close,
                )),
                _ => text.push_str(&line.text),
            }
            text.push('\n');
        }
        text
    }
}
