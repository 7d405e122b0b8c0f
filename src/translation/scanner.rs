/// Lexical context of the byte currently being scanned.
#[derive(Clone)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    Bracketed,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

fn pair_at(bytes: &[u8], idx: usize, first: u8, second: u8) -> bool {
    bytes.get(idx) == Some(&first) && bytes.get(idx + 1) == Some(&second)
}

/// Bytes that can continue a bare SQLite identifier; non-ASCII bytes belong to identifier
/// characters.
pub(super) fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || !b.is_ascii()
}

pub(super) fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    pair_at(bytes, idx, b'-', b'-')
}

pub(super) fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    pair_at(bytes, idx, b'/', b'*')
}

pub(super) fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    pair_at(bytes, idx, b'*', b'/')
}

/// Returns the tag and the index of the closing `$` when `start` opens a `$tag$` quote.
pub(super) fn try_start_dollar_quote(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    let rest = bytes.get(start + 1..)?;
    let len = rest
        .iter()
        .position(|b| !(b.is_ascii_alphanumeric() || *b == b'_'))?;
    if rest[len] != b'$' || rest.first().is_some_and(u8::is_ascii_digit) {
        return None;
    }
    let tag = std::str::from_utf8(&rest[..len]).ok()?.to_string();
    Some((tag, start + 1 + len))
}

pub(super) fn matches_tag(bytes: &[u8], idx: usize, tag: &str) -> bool {
    let end = idx + 1 + tag.len();
    end < bytes.len()
        && bytes[idx + 1..end] == *tag.as_bytes()
        && bytes.get(end) == Some(&b'$')
}

/// Returns the end index and the digits when a run of ASCII digits starts at `start`.
pub(super) fn scan_digits(bytes: &[u8], start: usize) -> Option<(usize, &str)> {
    let len = bytes
        .get(start..)?
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if len == 0 {
        return None;
    }
    std::str::from_utf8(&bytes[start..start + len])
        .ok()
        .map(|digits| (start + len, digits))
}
