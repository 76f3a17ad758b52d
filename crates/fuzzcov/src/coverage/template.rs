//! Report templates
//!
//! A template is document text with `{{ slot }}` placeholders. Parsing checks
//! every placeholder against the slots the document provides, so a broken
//! template is rejected before anything touches the filesystem.
//!
//! ```text
//! "<h1>{{ title }}</h1>"  ──parse──►  [Text("<h1>"), Slot("title"), Text("</h1>")]
//!                                      │
//!                         render(values)
//!                                      ▼
//!                          "<h1>Coverage Report</h1>"
//! ```

use crate::result::{FuzzcovError, FuzzcovResult};
use std::collections::HashMap;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Slot(String),
}

/// A parsed template, ready to render
#[derive(Debug, Clone)]
pub struct ReportTemplate {
    name: String,
    segments: Vec<Segment>,
}

impl ReportTemplate {
    /// Parse a template, accepting only the given slot names
    ///
    /// # Errors
    ///
    /// Returns [`FuzzcovError::Template`] on an unterminated placeholder, an
    /// empty placeholder, or a slot the document does not provide.
    pub fn parse(name: &str, source: &str, allowed_slots: &[&str]) -> FuzzcovResult<Self> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find(OPEN) {
            if start > 0 {
                segments.push(Segment::Text(rest[..start].to_string()));
            }
            let after_open = &rest[start + OPEN.len()..];
            let Some(end) = after_open.find(CLOSE) else {
                return Err(FuzzcovError::template(
                    name,
                    format!("unclosed placeholder at byte {}", offset + start),
                ));
            };

            let slot = after_open[..end].trim();
            if slot.is_empty() {
                return Err(FuzzcovError::template(
                    name,
                    format!("empty placeholder at byte {}", offset + start),
                ));
            }
            if !allowed_slots.contains(&slot) {
                return Err(FuzzcovError::template(
                    name,
                    format!("unknown placeholder '{slot}'"),
                ));
            }
            segments.push(Segment::Slot(slot.to_string()));

            let consumed = start + OPEN.len() + end + CLOSE.len();
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            segments,
        })
    }

    /// Template name, used in error messages
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Slot names used by this template, in order of appearance
    pub fn slots(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Slot(name) => Some(name.as_str()),
            Segment::Text(_) => None,
        })
    }

    /// Substitute every slot. Slots missing from `values` render empty.
    #[must_use]
    pub fn render(&self, values: &HashMap<&str, String>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Slot(slot) => {
                    if let Some(value) = values.get(slot.as_str()) {
                        out.push_str(value);
                    }
                }
            }
        }
        out
    }
}
