use std::borrow::Cow;

mod scanner;

use scanner::{
    State, is_block_comment_end, is_block_comment_start, is_identifier_byte,
    is_line_comment_start, matches_tag, scan_digits, try_start_dollar_quote,
};

/// How to resolve translation for a call relative to the dialect default.
///
/// # Examples
/// ```rust
/// use d1_middleware::prelude::*;
///
/// let options = QueryOptions::default()
///     .with_translation(TranslationMode::ForceOn);
/// # let _ = options;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationMode {
    /// Follow the compiler's default setting.
    Default,
    /// Force translation on, regardless of the default.
    ForceOn,
    /// Force translation off, regardless of the default.
    ForceOff,
}

impl TranslationMode {
    #[must_use]
    pub fn resolve(self, default: bool) -> bool {
        match self {
            TranslationMode::Default => default,
            TranslationMode::ForceOn => true,
            TranslationMode::ForceOff => false,
        }
    }
}

/// Per-call options for compiling a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub translation: TranslationMode,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            translation: TranslationMode::Default,
        }
    }
}

impl QueryOptions {
    #[must_use]
    pub fn with_translation(mut self, translation: TranslationMode) -> Self {
        self.translation = translation;
        self
    }
}

/// Rewrite Postgres-style `$N` placeholders into the `?N` form D1 binds positionally.
///
/// Placeholders inside quoted strings, bracketed identifiers, comments and dollar-quoted
/// blocks are left alone. Returns a borrowed `Cow` when nothing changed.
#[must_use]
pub fn translate_placeholders(sql: &str, enabled: bool) -> Cow<'_, str> {
    if !enabled {
        return Cow::Borrowed(sql);
    }

    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut state = State::Normal;
    let mut idx = 0;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        let b = bytes[idx];
        let start = idx;
        let mut replacement: Option<&str> = None;
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'[' => state = State::Bracketed,
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                // `$` inside a bare identifier such as `price$1` is part of the name.
                b'$' if idx > 0 && is_identifier_byte(bytes[idx - 1]) => {}
                b'$' => {
                    if let Some((tag, close)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = close;
                    } else if let Some((digits_end, digits)) = scan_digits(bytes, idx + 1) {
                        replacement = Some(digits);
                        idx = digits_end - 1;
                    }
                }
                _ => {}
            },
            State::SingleQuoted | State::DoubleQuoted => {
                let quote = if matches!(state, State::SingleQuoted) {
                    b'\''
                } else {
                    b'"'
                };
                if b == quote {
                    if bytes.get(idx + 1) == Some(&quote) {
                        idx += 1; // escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::Bracketed => {
                if b == b']' {
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    idx += tag.len() + 1;
                    state = State::Normal;
                }
            }
        }

        if let Some(digits) = replacement {
            let buf = out.get_or_insert_with(|| String::with_capacity(sql.len()));
            buf.push_str(&sql[copied..start]);
            buf.push('?');
            buf.push_str(digits);
            copied = idx + 1;
        }

        idx += 1;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    }
}
