//! Minimal Rust lexer: finds comments and `#[oa::...]` attributes while
//! stepping over string and char literals.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// `//`
    Line,
    /// `///` or `//!`
    DocLine,
    /// `/* */`
    Block,
    /// `/** */` or `/*! */`
    DocBlock,
}

impl CommentKind {
    pub fn is_doc(self) -> bool {
        matches!(self, CommentKind::DocLine | CommentKind::DocBlock)
    }
}

/// A comment with its markers stripped. Consecutive line comments of the
/// same kind are merged into one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub kind: CommentKind,
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Scan {
    pub comments: Vec<Comment>,
    /// Byte offset just past `oa::` and the line it sits on.
    pub attributes: Vec<(usize, usize)>,
}

pub fn scan(src: &str) -> Scan {
    let bytes = src.as_bytes();
    let mut out = Scan::default();
    let mut i = 0;
    let mut line = 1;
    // Kind and line of the previous line comment.
    let mut last_line_comment: Option<(CommentKind, usize)> = None;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'\n' => {
                line += 1;
                i += 1;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                let end = src[i..].find('\n').map_or(src.len(), |n| i + n);
                let body = &src[i + 2..end];
                let (kind, text) = match body.as_bytes().first().copied() {
                    Some(b'/') if !body.starts_with("//") => (CommentKind::DocLine, &body[1..]),
                    Some(b'!') => (CommentKind::DocLine, &body[1..]),
                    _ => (CommentKind::Line, body),
                };
                let text = text.strip_prefix(' ').unwrap_or(text);
                let adjacent =
                    matches!(last_line_comment, Some((k, l)) if k == kind && l + 1 == line);
                match out.comments.last_mut() {
                    Some(prev) if adjacent => {
                        prev.text.push('\n');
                        prev.text.push_str(text);
                    }
                    _ => out.comments.push(Comment {
                        kind,
                        line,
                        text: text.to_string(),
                    }),
                }
                last_line_comment = Some((kind, line));
                i = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let start_line = line;
                let body_start = i + 2;
                let mut depth = 1;
                let mut j = body_start;
                while j < bytes.len() && depth > 0 {
                    if bytes[j] == b'\n' {
                        line += 1;
                        j += 1;
                    } else if bytes[j..].starts_with(b"/*") {
                        depth += 1;
                        j += 2;
                    } else if bytes[j..].starts_with(b"*/") {
                        depth -= 1;
                        j += 2;
                    } else {
                        j += 1;
                    }
                }
                let body_end = if depth == 0 { j - 2 } else { j };
                let body = &src[body_start..body_end.max(body_start)];
                let doc = (body.starts_with('*') && !body.starts_with("**") && body != "*")
                    || body.starts_with('!');
                let kind = if doc {
                    CommentKind::DocBlock
                } else {
                    CommentKind::Block
                };
                let body = if doc { &body[1..] } else { body };
                out.comments.push(Comment {
                    kind,
                    line: start_line,
                    text: strip_stars(body),
                });
                last_line_comment = None;
                i = j;
            }
            b'"' => {
                i = skip_string(bytes, i + 1, &mut line);
            }
            b'r' if is_raw_string_start(bytes, i) => {
                i = skip_raw_string(bytes, i + 1, &mut line);
            }
            b'\'' => {
                i = skip_char(bytes, i);
            }
            b'#' => {
                let mut j = i + 1;
                if bytes.get(j) == Some(&b'!') {
                    j += 1;
                }
                if bytes.get(j) == Some(&b'[') {
                    j += 1;
                    while bytes.get(j).is_some_and(|c| c.is_ascii_whitespace() && *c != b'\n') {
                        j += 1;
                    }
                    if bytes[j..].starts_with(b"oa::") {
                        out.attributes.push((j + 4, line));
                    }
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    out
}

/// Removes the leading ` * ` gutter of block comment lines.
fn strip_stars(body: &str) -> String {
    body.lines()
        .map(|l| {
            let t = l.trim_start();
            match t.strip_prefix('*') {
                Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
                None => t,
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn skip_string(bytes: &[u8], mut i: usize, line: &mut usize) -> usize {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            b'\n' => {
                *line += 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    i
}

fn is_raw_string_start(bytes: &[u8], i: usize) -> bool {
    let prev_ident = i > 0 && (bytes[i - 1].is_ascii_alphanumeric() || bytes[i - 1] == b'_');
    if prev_ident {
        return false;
    }
    let mut j = i + 1;
    while bytes.get(j) == Some(&b'#') {
        j += 1;
    }
    bytes.get(j) == Some(&b'"')
}

fn skip_raw_string(bytes: &[u8], mut i: usize, line: &mut usize) -> usize {
    let mut hashes = 0;
    while bytes.get(i) == Some(&b'#') {
        hashes += 1;
        i += 1;
    }
    i += 1;
    while i < bytes.len() {
        if bytes[i] == b'\n' {
            *line += 1;
        }
        if bytes[i] == b'"' && bytes[i + 1..].iter().take_while(|c| **c == b'#').count() >= hashes {
            return i + 1 + hashes;
        }
        i += 1;
    }
    i
}

/// Skips a char literal; a lifetime is left alone.
fn skip_char(bytes: &[u8], i: usize) -> usize {
    match (bytes.get(i + 1).copied(), bytes.get(i + 2).copied()) {
        (Some(b'\\'), _) => {
            let mut j = i + 3;
            while j < bytes.len() && bytes[j] != b'\'' && bytes[j] != b'\n' {
                j += 1;
            }
            j + 1
        }
        (Some(_), Some(b'\'')) => i + 3,
        _ => {
            // Multi-byte char literal such as '→'.
            let rest = &bytes[i + 1..];
            match rest.iter().take(5).position(|c| *c == b'\'') {
                Some(n) if n > 1 && !rest[0].is_ascii() => i + 2 + n,
                _ => i + 1,
            }
        }
    }
}
