// File: matcher.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use log::debug;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::borrow::Cow;

// ASCII whitespace only; U+00A0 and other Unicode spaces are kept.
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\n\x0B\x0C\r]+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    Literal,
    Normalized,
    Regex,
}

impl std::fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStrategy::Literal => write!(f, "Literal"),
            MatchStrategy::Normalized => write!(f, "Normalized"),
            MatchStrategy::Regex => write!(f, "Regex"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OccurrenceMatch {
    pub strategy: MatchStrategy,
    pub value: String,
    pub count: usize,
}

/// Non-overlapping, left-to-right occurrences of `needle` in `haystack`.
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    (haystack.len() - haystack.replace(needle, "").len()) / needle.len()
}

pub fn strip_whitespace(input: &str) -> Cow<'_, str> {
    WHITESPACE.replace_all(input, "")
}

/// Counts how often the user supplied match input shows up in a body.
///
/// Strategies are tried in a fixed order and the first one that hits wins:
/// the literal text, the text with all whitespace removed on both sides, and
/// finally the input interpreted as a regular expression. The regex is
/// compiled once so the same counter can be reused for the pre- and
/// post-burst probes.
#[derive(Debug, Clone)]
pub struct OccurrenceCounter {
    input: String,
    normalized_input: String,
    pattern: Option<Regex>,
}

impl OccurrenceCounter {
    pub fn new(input: &str) -> Self {
        let pattern = if input.is_empty() {
            None
        } else {
            match RegexBuilder::new(input)
                .dot_matches_new_line(true)
                .multi_line(true)
                .build()
            {
                Ok(re) => Some(re),
                Err(e) => {
                    debug!("Match input is not a valid regex, regex strategy disabled: {}", e);
                    None
                }
            }
        };

        Self {
            input: input.to_string(),
            normalized_input: strip_whitespace(input).into_owned(),
            pattern,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn find(&self, body: &str) -> Option<OccurrenceMatch> {
        if self.input.is_empty() {
            return None;
        }

        if body.contains(&self.input) {
            return Some(OccurrenceMatch {
                strategy: MatchStrategy::Literal,
                value: self.input.clone(),
                count: count_occurrences(body, &self.input),
            });
        }

        let normalized_body = strip_whitespace(body);
        if normalized_body.contains(self.normalized_input.as_str()) {
            return Some(OccurrenceMatch {
                strategy: MatchStrategy::Normalized,
                value: format!("{} (Normalized)", self.input),
                count: count_occurrences(&normalized_body, &self.normalized_input),
            });
        }

        let pattern = self.pattern.as_ref()?;
        let mut count = 0;
        let mut value = String::new();
        for caps in pattern.captures_iter(body) {
            count += 1;
            if count == 1 {
                let matched = if caps.len() > 1 {
                    caps.get(1).map_or("", |m| m.as_str())
                } else {
                    caps.get(0).map_or("", |m| m.as_str())
                };
                value = matched.trim().to_string();
            }
        }

        if count > 0 {
            Some(OccurrenceMatch {
                strategy: MatchStrategy::Regex,
                value,
                count,
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
#[path = "matcher_tests.rs"]
mod tests;
