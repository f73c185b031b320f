//! pattern.rs - Rule patterns and replacement templates.
//!
//! Stored rules are written for the settings editor: their patterns may use
//! look-around, and their replacements use `$&`, `$1`..`$99`, `$<name>`,
//! `` $` ``, `$'` and `$$` tokens. Patterns the `regex` crate accepts are
//! compiled with it; everything else is retried with `fancy_regex`, which
//! adds look-around and backreferences on top of it.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, warn};
use std::ops::Range;

/// Compiled size limit for either backend (10 MB).
const REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);
/// Backtracking budget per match attempt for look-around patterns.
const BACKTRACK_LIMIT: usize = 1_000_000;

/// Byte spans of one match. Index 0 is the whole match, then each group.
pub type MatchSpans = Vec<Option<Range<usize>>>;

/// A compiled pattern, on whichever backend could parse it.
#[derive(Debug)]
pub enum Pattern {
    Plain(regex::Regex),
    Fancy(fancy_regex::Regex),
}

impl Pattern {
    /// Compiles `source`, falling back to the backtracking engine when the
    /// pattern needs look-around or backreferences.
    pub fn new(source: &str) -> Result<Self, fancy_regex::Error> {
        match regex::RegexBuilder::new(source).size_limit(REGEX_SIZE_LIMIT).build() {
            Ok(re) => Ok(Pattern::Plain(re)),
            Err(plain_err) => {
                debug!("Retrying pattern with look-around support: {}", plain_err);
                fancy_regex::RegexBuilder::new(source)
                    .backtrack_limit(BACKTRACK_LIMIT)
                    .delegate_size_limit(REGEX_SIZE_LIMIT)
                    .build()
                    .map(Pattern::Fancy)
            }
        }
    }

    /// Compiles `text` as an exact substring match.
    pub fn literal(text: &str) -> Result<Self, fancy_regex::Error> {
        Self::new(&regex::escape(text))
    }

    /// True when the pattern runs on the backtracking engine.
    pub fn is_fancy(&self) -> bool {
        matches!(self, Pattern::Fancy(_))
    }

    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Pattern::Plain(re) => re.is_match(text),
            Pattern::Fancy(re) => re.is_match(text).unwrap_or_else(|e| {
                warn!("Pattern matching aborted: {}", e);
                false
            }),
        }
    }

    /// Number of capture groups, not counting the whole match.
    pub fn group_count(&self) -> usize {
        match self {
            Pattern::Plain(re) => re.captures_len() - 1,
            Pattern::Fancy(re) => re.captures_len() - 1,
        }
    }

    /// Index of the group called `name`.
    pub fn group_index(&self, name: &str) -> Option<usize> {
        match self {
            Pattern::Plain(re) => re.capture_names().position(|n| n == Some(name)),
            Pattern::Fancy(re) => re.capture_names().position(|n| n == Some(name)),
        }
    }

    pub fn has_named_groups(&self) -> bool {
        match self {
            Pattern::Plain(re) => re.capture_names().any(|n| n.is_some()),
            Pattern::Fancy(re) => re.capture_names().any(|n| n.is_some()),
        }
    }

    /// Every non-overlapping match in `text`, left to right.
    ///
    /// If the backtracking engine gives up part way, the matches found so far
    /// are returned.
    pub fn match_spans(&self, text: &str) -> Vec<MatchSpans> {
        match self {
            Pattern::Plain(re) => re
                .captures_iter(text)
                .map(|caps| (0..caps.len()).map(|i| caps.get(i).map(|m| m.start()..m.end())).collect())
                .collect(),
            Pattern::Fancy(re) => {
                let mut all = Vec::new();
                for caps in re.captures_iter(text) {
                    match caps {
                        Ok(caps) => {
                            all.push((0..caps.len()).map(|i| caps.get(i).map(|m| m.start()..m.end())).collect())
                        }
                        Err(e) => {
                            warn!("Pattern matching aborted after {} match(es): {}", all.len(), e);
                            break;
                        }
                    }
                }
                all
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Text(String),
    /// `$&`
    Whole,
    /// `$n`, `$nn` or `$<name>`
    Group(usize),
    /// `` $` ``
    Before,
    /// `$'`
    After,
}

/// A replacement string split into literal text and match references.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Replacement {
    pieces: Vec<Piece>,
}

impl Replacement {
    /// A replacement inserted exactly as written.
    pub fn verbatim(text: &str) -> Self {
        let mut replacement = Self::default();
        replacement.push_text(text);
        replacement
    }

    /// Parses the `$` tokens of `template` against the groups of `pattern`.
    ///
    /// Tokens that do not refer to an existing group stay literal, except a
    /// `$<name>` for an unknown name in a pattern that has named groups,
    /// which expands to nothing.
    pub fn parse(template: &str, pattern: &Pattern) -> Self {
        let groups = pattern.group_count();
        let named = pattern.has_named_groups();
        let mut replacement = Self::default();
        let mut rest = template;

        while let Some(pos) = rest.find('$') {
            replacement.push_text(&rest[..pos]);
            rest = &rest[pos..];
            let bytes = rest.as_bytes();

            let consumed = match bytes.get(1) {
                Some(b'$') => {
                    replacement.push_text("$");
                    2
                }
                Some(b'&') => replacement.push(Piece::Whole, 2),
                Some(b'`') => replacement.push(Piece::Before, 2),
                Some(b'\'') => replacement.push(Piece::After, 2),
                Some(d @ b'0'..=b'9') => {
                    let first = usize::from(d - b'0');
                    let two_digit = match bytes.get(2) {
                        Some(e @ b'0'..=b'9') => Some(first * 10 + usize::from(e - b'0')),
                        _ => None,
                    };
                    match two_digit {
                        Some(n) if (1..=groups).contains(&n) => replacement.push(Piece::Group(n), 3),
                        _ if (1..=groups).contains(&first) => replacement.push(Piece::Group(first), 2),
                        _ => {
                            replacement.push_text("$");
                            1
                        }
                    }
                }
                Some(b'<') if named => match rest[2..].find('>') {
                    Some(end) => {
                        let name = &rest[2..2 + end];
                        if let Some(index) = pattern.group_index(name) {
                            replacement.pieces.push(Piece::Group(index));
                        }
                        2 + end + 1
                    }
                    None => {
                        replacement.push_text("$");
                        1
                    }
                },
                _ => {
                    replacement.push_text("$");
                    1
                }
            };
            rest = &rest[consumed..];
        }
        replacement.push_text(rest);
        replacement
    }

    fn push(&mut self, piece: Piece, consumed: usize) -> usize {
        self.pieces.push(piece);
        consumed
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Piece::Text(last)) = self.pieces.last_mut() {
            last.push_str(text);
        } else {
            self.pieces.push(Piece::Text(text.to_string()));
        }
    }

    /// True when the replacement contains no match references.
    pub fn is_verbatim(&self) -> bool {
        self.pieces.iter().all(|p| matches!(p, Piece::Text(_)))
    }

    /// Writes the expansion for one match of `line` into `out`.
    pub fn expand(&self, line: &str, spans: &MatchSpans, out: &mut String) {
        let whole = spans.first().cloned().flatten().unwrap_or(0..0);
        for piece in &self.pieces {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Whole => out.push_str(&line[whole.clone()]),
                Piece::Group(i) => {
                    if let Some(Some(range)) = spans.get(*i) {
                        out.push_str(&line[range.clone()]);
                    }
                }
                Piece::Before => out.push_str(&line[..whole.start]),
                Piece::After => out.push_str(&line[whole.end..]),
            }
        }
    }

    /// Replaces every match in `line`.
    pub fn apply(&self, line: &str, matches: &[MatchSpans]) -> String {
        let mut out = String::with_capacity(line.len());
        let mut last = 0;
        for spans in matches {
            let Some(Some(whole)) = spans.first() else { continue };
            out.push_str(&line[last..whole.start]);
            self.expand(line, spans, &mut out);
            last = whole.end;
        }
        out.push_str(&line[last..]);
        out
    }
}
