//! Tagged line format shared by stage, chain and join settings files.
//!
//! Every line is one of:
//!
//! - `KEY\tVALUE`: a plain entry,
//! - `<TAG>\tVALUE\t</TAG>`: an inline tagged entry (same meaning as a
//!   plain entry),
//! - `<TAG>` ... `</TAG>`: a block of entries, possibly nested.
//!
//! Blank lines are skipped. Anything else is skipped with a warning so a
//! hand-edited file still loads. This module is purely textual; it knows
//! nothing about which keys a stage or chain expects.

use std::fmt::Write;

/// One parsed line or block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// A key/value pair, written either plain or as an inline tag.
    Value {
        /// Entry key (tag name for inline entries).
        key: String,
        /// Entry value, verbatim.
        value: String,
    },
    /// A bracketed block holding its own entries.
    Block {
        /// Block tag name.
        tag: String,
        /// Entries between the opening and closing tag.
        body: Document,
    },
}

/// How [`Document::to_text`] writes value entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// `KEY\tVALUE` lines (stage settings files).
    Plain,
    /// `<KEY>\tVALUE\t</KEY>` lines (chain and join files).
    Tagged,
}

/// An ordered sequence of entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    entries: Vec<Entry>,
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// All entries in file order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Returns `true` if the document holds no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a value entry.
    pub fn push_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push(Entry::Value {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Append a block entry.
    pub fn push_block(&mut self, tag: impl Into<String>, body: Self) {
        self.entries.push(Entry::Block {
            tag: tag.into(),
            body,
        });
    }

    /// The last top-level value stored under `key`.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values(key).last()
    }

    /// Every top-level value stored under `key`, in file order.
    pub fn values<'a, 'k>(
        &'a self,
        key: &'k str,
    ) -> impl Iterator<Item = &'a str> + use<'a, 'k> {
        self.entries.iter().filter_map(move |entry| match entry {
            Entry::Value { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Every top-level block tagged `tag`, in file order.
    pub fn blocks<'a, 't>(
        &'a self,
        tag: &'t str,
    ) -> impl Iterator<Item = &'a Self> + use<'a, 't> {
        self.entries.iter().filter_map(move |entry| match entry {
            Entry::Block { tag: t, body } if t == tag => Some(body),
            _ => None,
        })
    }

    /// Parse a document, skipping malformed lines.
    ///
    /// A closing tag that does not match the innermost open block is
    /// ignored. Blocks still open at end of input are closed implicitly.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        // Stack of open blocks; the bottom element is the document root.
        let mut stack: Vec<(String, Self)> = vec![(String::new(), Self::new())];

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            if let Some((key, value)) = inline_tag(line) {
                push_value(&mut stack, key, value);
                continue;
            }

            let token = line.trim();
            if let Some(tag) = closing_tag(token) {
                if stack.len() > 1 && stack.last().is_some_and(|(open, _)| open == tag) {
                    close_block(&mut stack);
                } else {
                    tracing::warn!(line = line_no, tag, "ignoring unmatched closing tag");
                }
                continue;
            }
            if let Some(tag) = opening_tag(token) {
                stack.push((tag.to_owned(), Self::new()));
                continue;
            }

            match line.split_once('\t') {
                Some((key, value)) if !key.trim().is_empty() && !key.starts_with('<') => {
                    push_value(&mut stack, key.trim(), value);
                }
                _ => {
                    tracing::warn!(line = line_no, content = line, "skipping malformed line");
                }
            }
        }

        while stack.len() > 1 {
            if let Some((tag, _)) = stack.last() {
                tracing::warn!(tag = tag.as_str(), "closing unterminated block at end of input");
            }
            close_block(&mut stack);
        }

        stack.pop().map(|(_, root)| root).unwrap_or_default()
    }

    /// Serialize the document, one entry per line.
    #[must_use]
    pub fn to_text(&self, style: Style) -> String {
        let mut out = String::new();
        write_entries(&mut out, &self.entries, style);
        out
    }
}

fn write_entries(out: &mut String, entries: &[Entry], style: Style) {
    for entry in entries {
        match entry {
            Entry::Value { key, value } => match style {
                Style::Plain => {
                    let _ = writeln!(out, "{key}\t{value}");
                }
                Style::Tagged => {
                    let _ = writeln!(out, "<{key}>\t{value}\t</{key}>");
                }
            },
            Entry::Block { tag, body } => {
                let _ = writeln!(out, "<{tag}>");
                write_entries(out, &body.entries, style);
                let _ = writeln!(out, "</{tag}>");
            }
        }
    }
}

fn push_value(stack: &mut [(String, Document)], key: &str, value: &str) {
    if let Some((_, current)) = stack.last_mut() {
        current.push_value(key, value);
    }
}

/// Pop the innermost block and attach it to its parent.
fn close_block(stack: &mut Vec<(String, Document)>) {
    if let Some((tag, body)) = stack.pop()
        && let Some(parent) = stack.last_mut()
    {
        parent.1.push_block(tag, body);
    }
}

/// Match `<TAG>\tVALUE\t</TAG>`.
fn inline_tag(line: &str) -> Option<(&str, &str)> {
    let (open, rest) = line.split_once('\t')?;
    let (value, close) = rest.rsplit_once('\t')?;
    let tag = opening_tag(open.trim())?;
    (closing_tag(close.trim())? == tag).then_some((tag, value))
}

fn opening_tag(token: &str) -> Option<&str> {
    let name = token.strip_prefix('<')?.strip_suffix('>')?;
    is_tag_name(name).then_some(name)
}

fn closing_tag(token: &str) -> Option<&str> {
    let name = token.strip_prefix("</")?.strip_suffix('>')?;
    is_tag_name(name).then_some(name)
}

fn is_tag_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
