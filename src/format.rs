//! Segment formatter
//!
//! Splits model output into alternating prose and fenced-code segments.
//! A fence is three backticks; an opening fence may carry a language tag
//! ended by a newline. The same marker opens and closes a block. An unclosed fence
//! turns the rest of the text into one code segment.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:([A-Za-z0-9_+#.\-]*)\r?\n)?").expect("fence pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Text,
    Code,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub content: String,
    /// Language tag of the opening fence, code segments only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Segment {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Text,
            content: content.into(),
            language: None,
        }
    }

    pub fn code(content: impl Into<String>, language: Option<String>) -> Self {
        Self {
            kind: SegmentKind::Code,
            content: content.into(),
            language,
        }
    }

    pub fn is_code(&self) -> bool {
        self.kind == SegmentKind::Code
    }

    /// Non-empty trimmed lines of a text segment; a code segment is one block
    pub fn paragraphs(&self) -> Vec<&str> {
        match self.kind {
            SegmentKind::Text => self
                .content
                .split('\n')
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect(),
            SegmentKind::Code => vec![self.content.as_str()],
        }
    }
}

/// Split `text` into text and code segments, dropping blank parts
pub fn format(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;
    let mut inside = false;
    let mut language: Option<String> = None;

    for caps in FENCE.captures_iter(text) {
        let Some(fence) = caps.get(0) else {
            continue;
        };

        push_part(&mut segments, &text[cursor..fence.start()], inside, language.take());

        inside = !inside;
        if inside {
            language = caps
                .get(1)
                .map(|m| m.as_str())
                .filter(|tag| !tag.is_empty())
                .map(str::to_string);
            cursor = fence.end();
        } else {
            // A closing fence is only the backticks; what follows is prose
            cursor = fence.start() + 3;
        }
    }

    push_part(&mut segments, &text[cursor..], inside, language);
    segments
}

fn push_part(segments: &mut Vec<Segment>, part: &str, is_code: bool, language: Option<String>) {
    if part.trim().is_empty() {
        return;
    }

    if is_code {
        segments.push(Segment::code(strip_leading_blank_lines(part.trim_end()), language));
    } else {
        segments.push(Segment::text(part.trim()));
    }
}

/// Drop whole blank lines at the start, keep the first line's indentation
fn strip_leading_blank_lines(s: &str) -> &str {
    match s.find(|c: char| !c.is_whitespace()) {
        Some(first) => {
            let line_start = s[..first].rfind('\n').map(|i| i + 1).unwrap_or(0);
            &s[line_start..]
        }
        None => "",
    }
}
