// ABOUTME: Outline parser for generated presentation text
// ABOUTME: Classifies outline lines and extracts topic titles, numbered points and code

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Titles extracted from a point's leading segment are capped at this many characters.
pub const MAX_SEGMENT_TITLE_CHARS: usize = 50;

static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());

// `**Topic:** text` and `**Topic: text**`
static TOPIC_AFTER_BOLD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*\s*Topic\s*:\s*\*\*[ \t]*([^*\n]*)").unwrap());
static TOPIC_INSIDE_BOLD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*\s*Topic\s*:[ \t]*([^*\n]+?)\s*\*\*").unwrap());

static POINT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+\.)\s+(.*)$").unwrap());
// Only at line start, after an optional bullet marker
static IMAGE_SUGGESTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[*-]\s*)?Image Suggestion\s*:\s*(.+)$").unwrap());
// Trailing marker on a numbered line, bold or parenthesised
static INLINE_IMAGE_SUGGESTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[(\[]?\s*(?:\*\*)?\s*Image Suggestion\s*:\s*(?:\*\*)?").unwrap());
static SLIDE_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:#+\s*)?Slide\s*\d+\s*:\s*(.*)$").unwrap());
static DOCUMENT_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:#+\s*)?Title\s*:\s*(.*)$").unwrap());

static BOLD_BEFORE_DELIMITER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\*\*(?:([^*]+?)\*\*\s*[:|\-]|([^*]+?)\s*[:|\-]\s*\*\*)").unwrap()
});
static BOLD_ONLY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\*\*([^*]+)\*\*").unwrap());

/// Classification of a single outline line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    /// `**Topic:** text`
    Topic(String),
    /// `Title: text`, used by delimiter-grouped outlines
    DocumentTitle(String),
    /// A numbered point header such as `3. **Title**: text`, with any
    /// trailing `Image Suggestion:` split off into `image`
    Point {
        marker: String,
        rest: String,
        image: Option<String>,
    },
    ImageSuggestion(String),
    /// `---`
    SlideDelimiter,
    /// `Slide N: title`
    SlideHeader(String),
    /// An opening or closing code fence
    Fence,
    /// A raw line inside a fenced region
    Code(String),
    Text,
}

/// A classified outline line together with its display text (trimmed, bold removed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub kind: LineKind,
}

/// One numbered unit of an outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentPoint {
    /// 1-based position in encounter order
    pub ordinal: usize,
    /// The numeral token as written, e.g. `"3."`
    pub marker: String,
    pub title: String,
    pub body_lines: Vec<String>,
}

/// Code sample shown on a deck's code slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBlock {
    pub raw_text: String,
}

impl CodeBlock {
    /// Returns `None` when the text is blank.
    pub fn new(raw_text: &str) -> Option<Self> {
        let trimmed = raw_text.trim_start_matches(&['\n', '\r'][..]).trim_end();
        if trimmed.trim().is_empty() {
            None
        } else {
            Some(Self {
                raw_text: trimmed.to_string(),
            })
        }
    }
}

/// Result of parsing a numbered outline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOutline {
    pub title: String,
    pub points: Vec<ContentPoint>,
    /// Distinct image suggestions in encounter order
    pub image_suggestions: Vec<String>,
    /// First fenced region found inside the outline itself
    pub code: Option<CodeBlock>,
}

/// Rules for deriving a slide title from a numbered point, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleRule {
    /// `**Title**: text`, `**Title:** text` or `**Title** - text`
    BoldBeforeDelimiter,
    /// `**Title** text`
    BoldOnly,
    /// Text up to the first colon or comma, capped at 50 characters
    LeadingSegment,
    /// `Point N.`
    Synthetic,
}

impl TitleRule {
    pub const PRECEDENCE: [TitleRule; 4] = [
        TitleRule::BoldBeforeDelimiter,
        TitleRule::BoldOnly,
        TitleRule::LeadingSegment,
        TitleRule::Synthetic,
    ];

    /// Apply this rule to the text following a point's numeral.
    pub fn apply(self, marker: &str, rest: &str) -> Option<String> {
        let title = match self {
            TitleRule::BoldBeforeDelimiter => BOLD_BEFORE_DELIMITER_RE
                .captures(rest)
                .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
                .map(|m| m.as_str().trim().to_string()),
            TitleRule::BoldOnly => BOLD_ONLY_RE
                .captures(rest)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string()),
            TitleRule::LeadingSegment => {
                let cleaned = strip_bold(rest);
                let segment = cleaned
                    .split(|c: char| c == ':' || c == ',')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                Some(truncate_title(&segment))
            }
            TitleRule::Synthetic => Some(format!("Point {}", marker)),
        };

        title.filter(|t| !t.is_empty())
    }
}

/// Derive a point's title, returning the rule that produced it.
pub fn point_title(marker: &str, rest: &str) -> (TitleRule, String) {
    for rule in TitleRule::PRECEDENCE {
        if let Some(title) = rule.apply(marker, rest) {
            return (rule, title);
        }
    }
    // Synthetic always yields a title
    (TitleRule::Synthetic, format!("Point {}", marker))
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() > MAX_SEGMENT_TITLE_CHARS {
        let head: String = title.chars().take(MAX_SEGMENT_TITLE_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}

/// Remove `**bold**` markers, keeping the inner text.
pub fn strip_bold(text: &str) -> String {
    BOLD_RE.replace_all(text, "$1").into_owned()
}

/// Find the topic title marked as `**Topic:** text`. Returns an empty string when absent.
pub fn extract_topic_title(text: &str) -> String {
    text.lines()
        .find_map(topic_on_line)
        .unwrap_or_default()
}

fn topic_on_line(line: &str) -> Option<String> {
    TOPIC_AFTER_BOLD_RE
        .captures(line)
        .or_else(|| TOPIC_INSIDE_BOLD_RE.captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().trim_end_matches(',').trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Classify a single line outside of any fenced region.
pub fn classify_line(line: &str) -> LineKind {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if trimmed.starts_with("```") {
        return LineKind::Fence;
    }
    if trimmed.len() >= 3 && trimmed.chars().all(|c| c == '-') {
        return LineKind::SlideDelimiter;
    }
    if let Some(topic) = topic_on_line(trimmed) {
        return LineKind::Topic(topic);
    }

    if let Some(caps) = POINT_RE.captures(trimmed) {
        let (rest, image) = split_inline_suggestion(&caps[2]);
        return LineKind::Point {
            marker: caps[1].to_string(),
            rest,
            image,
        };
    }

    let cleaned = strip_bold(trimmed);

    if let Some(caps) = IMAGE_SUGGESTION_RE.captures(&cleaned) {
        if let Some(suggestion) = clean_suggestion(&caps[1]) {
            return LineKind::ImageSuggestion(suggestion);
        }
    }
    if let Some(caps) = SLIDE_HEADER_RE.captures(&cleaned) {
        return LineKind::SlideHeader(caps[1].trim().to_string());
    }
    if let Some(caps) = DOCUMENT_TITLE_RE.captures(&cleaned) {
        return LineKind::DocumentTitle(caps[1].trim().to_string());
    }

    LineKind::Text
}

/// Split a numbered line's text at an `Image Suggestion:` marker.
fn split_inline_suggestion(rest: &str) -> (String, Option<String>) {
    match INLINE_IMAGE_SUGGESTION_RE.find(rest) {
        Some(marker) => (
            rest[..marker.start()].trim().to_string(),
            clean_suggestion(&rest[marker.end()..]),
        ),
        None => (rest.trim().to_string(), None),
    }
}

fn clean_suggestion(raw: &str) -> Option<String> {
    let suggestion = strip_bold(raw);
    let suggestion = suggestion
        .trim()
        .trim_matches('*')
        .trim_end_matches(&['.', ')', ']', ',', ';'][..])
        .trim();
    if suggestion.is_empty() {
        None
    } else {
        Some(suggestion.to_string())
    }
}

/// Split and classify outline text. Lines inside fenced regions are kept raw.
pub fn tokenize<'a, I>(lines: I) -> Vec<Line>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut in_fence = false;
    let mut tokens = Vec::new();

    for raw in lines {
        if in_fence {
            if raw.trim_start().starts_with("```") {
                in_fence = false;
                tokens.push(Line {
                    text: String::new(),
                    kind: LineKind::Fence,
                });
            } else {
                tokens.push(Line {
                    text: raw.to_string(),
                    kind: LineKind::Code(raw.to_string()),
                });
            }
            continue;
        }

        let kind = classify_line(raw);
        let text = match &kind {
            LineKind::Fence => {
                in_fence = true;
                strip_bold(raw.trim()).trim().to_string()
            }
            LineKind::Point { marker, rest, .. } => {
                strip_bold(&format!("{} {}", marker, rest)).trim().to_string()
            }
            _ => strip_bold(raw.trim()).trim().to_string(),
        };
        tokens.push(Line { text, kind });
    }

    tokens
}

/// Collect the first fenced region from a token stream.
pub(crate) fn first_fenced_code(tokens: &[Line]) -> Option<CodeBlock> {
    let start = tokens.iter().position(|t| t.kind == LineKind::Fence)?;
    let code: Vec<&str> = tokens[start + 1..]
        .iter()
        .map_while(|t| match &t.kind {
            LineKind::Code(raw) => Some(raw.as_str()),
            _ => None,
        })
        .collect();
    CodeBlock::new(&code.join("\n"))
}

pub(crate) fn push_distinct(suggestions: &mut Vec<String>, suggestion: &str) {
    if !suggestions.iter().any(|s| s == suggestion) {
        suggestions.push(suggestion.to_string());
    }
}

/// Parse a numbered outline.
///
/// Never fails: input without a topic marker yields an empty title, and input
/// without numbered lines yields no points.
pub fn parse(raw_outline: &str) -> ParsedOutline {
    parse_lines(raw_outline.lines())
}

/// Parse a numbered outline that has already been split into lines.
pub fn parse_lines<'a, I>(lines: I) -> ParsedOutline
where
    I: IntoIterator<Item = &'a str>,
{
    let tokens = tokenize(lines);
    let mut outline = ParsedOutline {
        code: first_fenced_code(&tokens),
        ..ParsedOutline::default()
    };

    for token in &tokens {
        match &token.kind {
            LineKind::Topic(topic) => {
                if outline.title.is_empty() {
                    outline.title = topic.clone();
                }
            }
            LineKind::Point {
                marker,
                rest,
                image,
            } => {
                let (_, title) = point_title(marker, rest);
                let first_line = strip_bold(rest).trim().to_string();
                let mut body_lines = Vec::new();
                if !first_line.is_empty() {
                    body_lines.push(first_line);
                }
                outline.points.push(ContentPoint {
                    ordinal: outline.points.len() + 1,
                    marker: marker.clone(),
                    title,
                    body_lines,
                });
                if let Some(suggestion) = image {
                    push_distinct(&mut outline.image_suggestions, suggestion);
                }
            }
            LineKind::ImageSuggestion(suggestion) => {
                push_distinct(&mut outline.image_suggestions, suggestion);
            }
            LineKind::Text | LineKind::SlideHeader(_) | LineKind::DocumentTitle(_) => {
                // Lines before the first point are discarded
                if let Some(point) = outline.points.last_mut() {
                    point.body_lines.push(token.text.clone());
                }
            }
            LineKind::Blank
            | LineKind::SlideDelimiter
            | LineKind::Fence
            | LineKind::Code(_) => {}
        }
    }

    outline
}

/// Extract the code sample from a code-generation response.
///
/// Takes the first fenced region (skipping any language tag); when the
/// response has no fence the whole response is used.
pub fn extract_code_block(response: &str) -> Option<CodeBlock> {
    let code = match response.find("```") {
        Some(start) => {
            let after = &response[start + 3..];
            let body = match after.find('\n') {
                Some(nl) if !after[..nl].contains("```") => &after[nl + 1..],
                _ => after,
            };
            match body.find("```") {
                Some(end) => &body[..end],
                None => body,
            }
        }
        None => response,
    };
    CodeBlock::new(code)
}
