//! Descriptor Search
//!
//! Regex search over a descriptor graph. [`matches_pattern`] answers whether
//! a message, or anything reachable from it, matches; [`render`] walks a
//! message tree and produces display lines and panel hints for a rendering
//! layer.
//!
//! Both walks key their visited set on full names, so cyclic schemas
//! terminate and every message is evaluated at most once per call.

pub mod render;
pub mod types;

pub use render::{
    render, DisplayLine, LineKind, PanelHint, RenderOutput, Renderer, TextFormatter,
};
pub use types::{field_label, resolve_type_name, FieldLabel};

use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;

use crate::descriptor::{DescriptorPool, MessageDescriptor};
use crate::error::Result;

/// A compiled, unanchored search pattern
#[derive(Debug, Clone)]
pub struct SearchPattern {
    regex: Regex,
}

impl SearchPattern {
    /// Compile a pattern; malformed syntax is a `Pattern` error
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// Compile user input, treating an empty string as "no pattern"
    pub fn compile(input: &str) -> Result<Option<Self>> {
        if input.is_empty() {
            Ok(None)
        } else {
            Self::new(input).map(Some)
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Byte ranges of every non-overlapping match
    pub fn match_ranges(&self, text: &str) -> Vec<Range<usize>> {
        self.regex.find_iter(text).map(|m| m.range()).collect()
    }

    /// Wrap every match in `open`/`close` markers
    pub fn highlight(&self, text: &str, open: &str, close: &str) -> String {
        let mut result = String::with_capacity(text.len());
        let mut last = 0;
        for range in self.match_ranges(text) {
            if range.is_empty() {
                continue;
            }
            result.push_str(&text[last..range.start]);
            result.push_str(open);
            result.push_str(&text[range.clone()]);
            result.push_str(close);
            last = range.end;
        }
        result.push_str(&text[last..]);
        result
    }
}

/// Whether `pattern` matches the message's full name, one of its field
/// names, a directly referenced message or enum name, or (recursively) a
/// referenced message. Always false without a pattern.
pub fn matches_pattern(
    pool: &DescriptorPool,
    message: &MessageDescriptor,
    pattern: Option<&SearchPattern>,
) -> bool {
    matches_pattern_with(pool, message, pattern, &mut |_| {})
}

/// [`matches_pattern`], reporting each message as it is evaluated
pub(crate) fn matches_pattern_with(
    pool: &DescriptorPool,
    message: &MessageDescriptor,
    pattern: Option<&SearchPattern>,
    on_visit: &mut dyn FnMut(&str),
) -> bool {
    let Some(pattern) = pattern else {
        return false;
    };
    let mut seen = HashSet::new();
    matches_inner(pool, message, pattern, &mut seen, on_visit)
}

fn matches_inner<'a>(
    pool: &'a DescriptorPool,
    message: &'a MessageDescriptor,
    pattern: &SearchPattern,
    seen: &mut HashSet<&'a str>,
    on_visit: &mut dyn FnMut(&str),
) -> bool {
    if !seen.insert(message.full_name.as_str()) {
        return false;
    }
    on_visit(&message.full_name);
    if pattern.is_match(&message.full_name) {
        return true;
    }

    for field in &message.fields {
        if pattern.is_match(&field.name) {
            return true;
        }
        if let Some(target) = field.message_type() {
            if pattern.is_match(target) {
                return true;
            }
            if let Some(referenced) = pool.message(target) {
                if matches_inner(pool, referenced, pattern, seen, on_visit) {
                    return true;
                }
            }
        }
        if let Some(target) = field.enum_type() {
            if pattern.is_match(target) {
                return true;
            }
        }
    }

    false
}
