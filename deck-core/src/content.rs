//! Normalizes free-form slide body text into uniform content items.
//!
//! Body text arrives as loosely formatted markdown: bullet glyphs, `**bold**`
//! lead-ins, continuation lines. [`parse_content`] turns it into a list of
//! [`ContentItem`]s so every renderer and the exporter see the same shape.

use serde::{Deserialize, Serialize};

/// Glyphs accepted as a leading bullet marker.
const BULLET_GLYPHS: [char; 10] = ['-', '*', '•', '▪', '▫', '▸', '▹', '◦', '‣', '⁃'];

/// One logical entry of a slide's body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    /// Bold lead-in, empty when the item has none.
    pub title: String,
    /// Body text.
    pub description: String,
    /// Whether the item was introduced by a bold lead-in.
    pub has_title: bool,
}

/// Length of `text` in UTF-16 code units.
///
/// Density thresholds are tuned against browser string lengths, where a
/// character outside the Basic Multilingual Plane counts twice.
#[must_use]
pub fn text_length(text: &str) -> usize {
    text.encode_utf16().count()
}

impl ContentItem {
    /// Text length of title plus description, see [`text_length`].
    #[must_use]
    pub fn char_count(&self) -> usize {
        text_length(&self.title) + text_length(&self.description)
    }

    /// The text to show when only one field is rendered.
    #[must_use]
    pub fn display_text(&self) -> &str {
        if self.has_title {
            &self.title
        } else {
            &self.description
        }
    }
}

/// Parsed body of one slide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedContent {
    /// Items in source order.
    pub items: Vec<ContentItem>,
}

impl ParsedContent {
    /// Number of items.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    /// Sum of item character counts.
    #[must_use]
    pub fn total_chars(&self) -> usize {
        self.items.iter().map(ContentItem::char_count).sum()
    }

    /// Whether there are no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Parse raw body text into content items.
///
/// A line of the form `[bullet] **Title**[: description]` opens a titled
/// item. Any other line is stripped of its bullet and markdown emphasis and
/// either appended to the open item or, if none is open, opens an untitled
/// item. Absent or blank input yields no items.
#[must_use]
pub fn parse_content(raw: Option<&str>) -> ParsedContent {
    let Some(raw) = raw else {
        return ParsedContent::default();
    };

    let mut items: Vec<ContentItem> = Vec::new();

    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some((title, description)) = match_bold_title(line) {
            items.push(ContentItem {
                title: clean_markdown(title),
                description: description.map(clean_markdown).unwrap_or_default(),
                has_title: true,
            });
            continue;
        }

        let cleaned = clean_markdown(strip_bullet(line));
        if cleaned.is_empty() {
            continue;
        }

        match items.last_mut() {
            Some(item) => {
                if !item.description.is_empty() {
                    item.description.push(' ');
                }
                item.description.push_str(&cleaned);
            }
            None => items.push(ContentItem {
                title: String::new(),
                description: cleaned,
                has_title: false,
            }),
        }
    }

    ParsedContent { items }
}

/// Remove `**bold**` and `*emphasis*` markers, collapse runs of whitespace
/// and trim.
#[must_use]
pub fn clean_markdown(text: &str) -> String {
    let stripped = strip_emphasis(text);
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Plain-text rendition of body text for the canvas editor: bold markers
/// dropped and leading `- ` bullets shown as `• `.
#[must_use]
pub fn editor_plain_text(content: Option<&str>) -> String {
    let Some(content) = content else {
        return String::new();
    };
    let lines: Vec<String> = content
        .split('\n')
        .map(|line| {
            let line = strip_bold_pairs(line);
            if line.starts_with("- ") {
                format!("• {}", &line[2..])
            } else {
                line
            }
        })
        .collect();
    lines.join("\n").trim().to_string()
}

fn strip_bullet(line: &str) -> &str {
    match line.strip_prefix(|c: char| BULLET_GLYPHS.contains(&c)) {
        Some(rest) => rest.trim_start(),
        None => line,
    }
}

/// Match `[bullet ws] ** title ** [ ":" ws description ]` against a whole
/// trimmed line. The title is the shortest span whose closing `**` is
/// followed by either the end of the line or a colon.
fn match_bold_title(line: &str) -> Option<(&str, Option<&str>)> {
    let bulleted = strip_bullet(line);
    if bulleted.len() != line.len() {
        if let Some(found) = match_bold_body(bulleted) {
            return Some(found);
        }
    }
    match_bold_body(line)
}

fn match_bold_body(text: &str) -> Option<(&str, Option<&str>)> {
    let body = text.strip_prefix("**")?;
    let mut search_from = 0;
    while let Some(offset) = body[search_from..].find("**") {
        let close = search_from + offset;
        let title = &body[..close];
        let rest = &body[close + 2..];
        if rest.is_empty() {
            return Some((title, None));
        }
        if let Some(description) = rest.strip_prefix(':') {
            return Some((title, Some(description.trim_start())));
        }
        search_from = close + 1;
    }
    None
}

/// Replace `**x**` with `x`, then any remaining `*x*` with `x`, scanning left
/// to right without re-examining replaced text.
fn strip_emphasis(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('*') {
        out.push_str(&rest[..start]);
        let after = &rest[start..];

        if let Some(inner) = after.strip_prefix("**") {
            if let Some(end) = inner.find("**") {
                out.push_str(&inner[..end]);
                rest = &inner[end + 2..];
                continue;
            }
        }

        let inner = &after[1..];
        if let Some(end) = inner.find('*') {
            out.push_str(&inner[..end]);
            rest = &inner[end + 1..];
        } else {
            out.push_str(after);
            rest = "";
        }
    }

    out.push_str(rest);
    out
}

fn strip_bold_pairs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("**") {
        let inner = &rest[start + 2..];
        let Some(end) = inner.find("**") else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str(&inner[..end]);
        rest = &inner[end + 2..];
    }
    out.push_str(rest);
    out
}
