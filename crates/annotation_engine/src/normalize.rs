//! Text folding with offset maps
//!
//! Every folding step produces a `Folded` text: the folded characters plus,
//! for each of them, the index of the source character it came from. Matches
//! found in folded text are mapped back to source ranges through that table.

use std::ops::Range;

/// Folded text and its map back to source char offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folded {
    pub chars: Vec<char>,
    /// Source char index of each folded char
    pub origins: Vec<usize>,
    /// Set on collapsed whitespace that contained a line break
    breaks: Vec<bool>,
}

fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}'
    )
}

fn fold_char(c: char) -> char {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => '"',
        '\u{2010}'..='\u{2015}' | '\u{2212}' => '-',
        other => other,
    }
}

impl Folded {
    /// The text unchanged
    pub fn identity(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        Self {
            chars,
            origins: (0..len).collect(),
            breaks: vec![false; len],
        }
    }

    /// Collapse whitespace runs to one space, fold quotes and dashes to
    /// ASCII and drop invisible characters
    pub fn normalize(text: &str) -> Self {
        let mut folded = Self {
            chars: Vec::new(),
            origins: Vec::new(),
            breaks: Vec::new(),
        };
        let mut in_space = false;
        for (index, c) in text.chars().enumerate() {
            if is_invisible(c) {
                continue;
            }
            if c.is_whitespace() {
                let is_break = matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}');
                if in_space {
                    if let Some(last) = folded.breaks.last_mut() {
                        *last |= is_break;
                    }
                } else {
                    folded.push(' ', index, is_break);
                    in_space = true;
                }
                continue;
            }
            in_space = false;
            folded.push(fold_char(c), index, false);
        }
        folded
    }

    /// Normalized form of a search needle, without surrounding whitespace
    pub fn needle(text: &str) -> Self {
        let mut folded = Self::normalize(text);
        while folded.chars.last() == Some(&' ') {
            folded.pop();
        }
        let lead = folded.chars.iter().take_while(|c| **c == ' ').count();
        folded.chars.drain(..lead);
        folded.origins.drain(..lead);
        folded.breaks.drain(..lead);
        folded
    }

    /// Remove line-wrap hyphens: a hyphen between two lowercase letters, or a
    /// hyphen followed by a line break and a lowercase letter (the break goes too)
    pub fn dehyphenate(&self) -> Self {
        let mut out = Self {
            chars: Vec::with_capacity(self.chars.len()),
            origins: Vec::with_capacity(self.chars.len()),
            breaks: Vec::with_capacity(self.chars.len()),
        };
        let mut i = 0;
        while i < self.chars.len() {
            if self.chars[i] == '-' && i > 0 && self.chars[i - 1].is_lowercase() {
                let next = self.chars.get(i + 1).copied();
                if next.map(char::is_lowercase).unwrap_or(false) {
                    i += 1;
                    continue;
                }
                let wrapped = next == Some(' ')
                    && self.breaks[i + 1]
                    && self
                        .chars
                        .get(i + 2)
                        .map(|c| c.is_lowercase())
                        .unwrap_or(false);
                if wrapped {
                    i += 2;
                    continue;
                }
            }
            out.push(self.chars[i], self.origins[i], self.breaks[i]);
            i += 1;
        }
        out
    }

    /// Lowercase every char; expansions share the origin of their source char
    pub fn lowercase(&self) -> Self {
        let mut out = Self {
            chars: Vec::with_capacity(self.chars.len()),
            origins: Vec::with_capacity(self.chars.len()),
            breaks: Vec::with_capacity(self.chars.len()),
        };
        for (i, c) in self.chars.iter().enumerate() {
            for lower in c.to_lowercase() {
                out.push(lower, self.origins[i], self.breaks[i]);
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Source char range covered by the folded range `[start, end)`
    pub fn source_range(&self, start: usize, end: usize) -> Range<usize> {
        if start >= end || end > self.origins.len() {
            let at = self.origins.get(start).copied().unwrap_or(0);
            return at..at;
        }
        self.origins[start]..self.origins[end - 1] + 1
    }

    fn push(&mut self, c: char, origin: usize, is_break: bool) {
        self.chars.push(c);
        self.origins.push(origin);
        self.breaks.push(is_break);
    }

    fn pop(&mut self) {
        self.chars.pop();
        self.origins.pop();
        self.breaks.pop();
    }
}

/// Start indices of non-overlapping occurrences of `needle`, left to right
pub fn find_all(haystack: &[char], needle: &[char]) -> Vec<usize> {
    let mut found = Vec::new();
    if needle.is_empty() || needle.len() > haystack.len() {
        return found;
    }
    let mut i = 0;
    while i + needle.len() <= haystack.len() {
        if haystack[i..i + needle.len()] == *needle {
            found.push(i);
            i += needle.len();
        } else {
            i += 1;
        }
    }
    found
}
