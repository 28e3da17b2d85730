//! `{token}` scanning shared by filename templates and watermark text.

/// A piece of scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text copied through unchanged.
    Literal(&'a str),
    /// The name between a pair of braces, without the braces.
    Token(&'a str),
}

/// Malformed token syntax.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("unterminated placeholder starting at byte {offset}")]
    Unterminated { offset: usize },

    #[error("empty placeholder `{{}}` at byte {offset}")]
    Empty { offset: usize },
}

/// Split `text` into literals and tokens, rejecting malformed braces.
///
/// A `{` must be closed by a `}` before the next `{`. A lone `}` is literal text.
pub fn scan_tokens(text: &str) -> Result<Vec<Segment<'_>>, TokenError> {
    scan(text, true)
}

/// Split `text` like [`scan_tokens`], but keep malformed braces as literal text.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    // Lenient scanning never produces an error.
    scan(text, false).unwrap_or_else(|_| vec![Segment::Literal(text)])
}

/// Rebuild `text`, replacing each token for which `lookup` returns a value.
///
/// Tokens without a value are written back verbatim, braces included.
pub fn render_tokens<F>(text: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    for segment in segments(text) {
        match segment {
            Segment::Literal(literal) => out.push_str(literal),
            Segment::Token(name) => match lookup(name) {
                Some(value) => out.push_str(&value),
                None => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
            },
        }
    }
    out
}

/// Whether `text` contains `{name}` as a well-formed token.
pub fn contains_token(text: &str, name: &str) -> bool {
    segments(text)
        .iter()
        .any(|segment| matches!(segment, Segment::Token(found) if *found == name))
}

fn scan(text: &str, strict: bool) -> Result<Vec<Segment<'_>>, TokenError> {
    let mut out = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(found) = text[cursor..].find('{') {
        let open = cursor + found;
        let body_start = open + 1;
        let close = text[body_start..].find('}').map(|i| body_start + i);
        let nested = text[body_start..].find('{').map(|i| body_start + i);

        let close = match (close, nested) {
            (Some(close), Some(nested)) if nested < close => None,
            (close, _) => close,
        };

        let Some(close) = close else {
            if strict {
                return Err(TokenError::Unterminated { offset: open });
            }
            cursor = body_start;
            continue;
        };

        if close == body_start {
            if strict {
                return Err(TokenError::Empty { offset: open });
            }
            cursor = close + 1;
            continue;
        }

        if literal_start < open {
            out.push(Segment::Literal(&text[literal_start..open]));
        }
        out.push(Segment::Token(&text[body_start..close]));
        cursor = close + 1;
        literal_start = cursor;
    }

    if literal_start < text.len() {
        out.push(Segment::Literal(&text[literal_start..]));
    }
    Ok(out)
}
