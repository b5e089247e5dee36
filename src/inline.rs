//! Inline span tokenizer for a single logical markdown line.
//!
//! Recognized markers are toggles (`**`/`__` bold, `~~` strike, `++`
//! underline) plus `[label](url)` links. Toggles are not auto-closed: an
//! unmatched marker keeps its style active until the end of the line.

/// Active inline style flags while scanning a line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InlineStyle {
    pub bold: bool,
    pub strike: bool,
    pub underline: bool,
}

/// Style-annotated run of text produced by [`parse_inline`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineToken {
    /// Run content with markers removed.
    pub text: String,
    pub bold: bool,
    pub strike: bool,
    pub underline: bool,
    /// Destination when this run is a link label.
    pub link_url: Option<String>,
}

impl InlineToken {
    /// Plain run carrying `style`.
    pub fn styled(text: impl Into<String>, style: InlineStyle) -> Self {
        Self {
            text: text.into(),
            bold: style.bold,
            strike: style.strike,
            underline: style.underline,
            link_url: None,
        }
    }

    /// Link run carrying `style`.
    pub fn link(text: impl Into<String>, url: impl Into<String>, style: InlineStyle) -> Self {
        Self {
            link_url: Some(url.into()),
            ..Self::styled(text, style)
        }
    }

    pub fn style(&self) -> InlineStyle {
        InlineStyle {
            bold: self.bold,
            strike: self.strike,
            underline: self.underline,
        }
    }

    pub fn is_link(&self) -> bool {
        self.link_url.is_some()
    }
}

/// Tokenize one line into style-annotated runs.
pub fn parse_inline(line: &str) -> Vec<InlineToken> {
    let mut tokens = Vec::new();
    let mut buf = String::new();
    let mut style = InlineStyle::default();
    let mut i = 0usize;

    while i < line.len() {
        let rest = &line[i..];
        if rest.starts_with("**") || rest.starts_with("__") {
            flush(&mut tokens, &mut buf, style);
            style.bold = !style.bold;
            i += 2;
            continue;
        }
        if rest.starts_with("~~") {
            flush(&mut tokens, &mut buf, style);
            style.strike = !style.strike;
            i += 2;
            continue;
        }
        if rest.starts_with("++") {
            flush(&mut tokens, &mut buf, style);
            style.underline = !style.underline;
            i += 2;
            continue;
        }
        if rest.starts_with('[') {
            if let Some(link) = scan_link(line, i) {
                flush(&mut tokens, &mut buf, style);
                tokens.push(InlineToken::link(link.label, link.url, style));
                i = link.end;
                continue;
            }
        }
        let Some(ch) = rest.chars().next() else {
            break;
        };
        buf.push(ch);
        i += ch.len_utf8();
    }
    flush(&mut tokens, &mut buf, style);
    tokens
}

fn flush(tokens: &mut Vec<InlineToken>, buf: &mut String, style: InlineStyle) {
    if buf.is_empty() {
        return;
    }
    tokens.push(InlineToken::styled(core::mem::take(buf), style));
}

struct ScannedLink<'a> {
    label: &'a str,
    url: &'a str,
    /// Byte offset just past the closing parenthesis.
    end: usize,
}

/// Match `[label](url)` starting at byte `open` (which holds `[`).
fn scan_link(line: &str, open: usize) -> Option<ScannedLink<'_>> {
    let close = open + 1 + line[open + 1..].find(']')?;
    let open_paren = close + 1;
    if !line[open_paren..].starts_with('(') {
        return None;
    }
    let close_paren = open_paren + 1 + line[open_paren + 1..].find(')')?;
    if close_paren == open_paren + 1 {
        return None;
    }
    let raw = line[open_paren + 1..close_paren].trim();
    let raw = raw.strip_prefix('<').unwrap_or(raw);
    let url = raw.strip_suffix('>').unwrap_or(raw);
    Some(ScannedLink {
        label: &line[open + 1..close],
        url,
        end: close_paren + 1,
    })
}
