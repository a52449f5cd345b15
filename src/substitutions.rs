//! Punctuation substitution table applied before rendering.
//!
//! The output font is a built-in Type1 font with WinAnsi encoding, and LLMs
//! love typographic punctuation. [`PunctuationTable`] maps those characters to
//! plain-ASCII stand-ins. It is plain data: callers extend or replace it
//! through [`crate::config::TranslationConfigBuilder::punctuation`] without
//! touching the renderer.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// An ordered list of `char → replacement` rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunctuationTable {
    rules: Vec<(char, String)>,
}

impl Default for PunctuationTable {
    /// Curly quotes, em-dash and ellipsis.
    fn default() -> Self {
        Self::empty()
            .with('\u{2018}', "'")
            .with('\u{2019}', "'")
            .with('\u{201C}', "\"")
            .with('\u{201D}', "\"")
            .with('\u{2014}', "-")
            .with('\u{2026}', "...")
    }
}

impl PunctuationTable {
    /// A table with no rules; [`apply`](Self::apply) returns its input.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a rule, replacing any existing rule for `from`.
    pub fn with(mut self, from: char, to: impl Into<String>) -> Self {
        let to = to.into();
        match self.rules.iter_mut().find(|(c, _)| *c == from) {
            Some(rule) => rule.1 = to,
            None => self.rules.push((from, to)),
        }
        self
    }

    /// Remove the rule for `from`, if any.
    pub fn without(mut self, from: char) -> Self {
        self.rules.retain(|(c, _)| *c != from);
        self
    }

    pub fn rules(&self) -> &[(char, String)] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn lookup(&self, ch: char) -> Option<&str> {
        self.rules
            .iter()
            .find(|(c, _)| *c == ch)
            .map(|(_, to)| to.as_str())
    }

    /// Apply every rule to `text`. Borrows when nothing matches.
    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !text.chars().any(|c| self.lookup(c).is_some()) {
            return Cow::Borrowed(text);
        }

        let mut out = String::with_capacity(text.len() + 8);
        for c in text.chars() {
            match self.lookup(c) {
                Some(replacement) => out.push_str(replacement),
                None => out.push(c),
            }
        }
        Cow::Owned(out)
    }
}
