// ABOUTME: Slide assembly for the auto-slides application
// ABOUTME: Groups parsed outline content into ordered, renderer-agnostic slide records

use crate::outline::{self, CodeBlock, ContentPoint, LineKind};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const TITLE_SLIDE_SUBTITLE: &str = "Overview";
pub const CODE_SLIDE_TITLE: &str = "Code Example";
pub const DEFAULT_FLAT_SLIDE_TITLE: &str = "Slide";

const POINT_INSTRUCTION: &str = "I am giving you a topic. return a topic and information \
(elaborate and in depth. make it lengthy) in ten points. strictly follow the syntax \
'**Topic:** topic goes here' followed by a numbered list '1. **Point title**: summary sentence' \
up to '10. **Point title**: summary sentence'. Sub-points go on their own lines starting with '*'. \
After each point you may add one line 'Image Suggestion: <short photo search phrase>'. \
the points should give complete in-depth knowledge of the topic.";

const FLAT_INSTRUCTION: &str = "I am giving you a topic. create a slide presentation for it. \
strictly follow the syntax 'Title: presentation title', then for every slide a block starting \
with 'Slide N: slide title' followed by bullet lines starting with '-' and one line \
'Image Suggestion: <short photo search phrase>'. separate slides with a line containing only '---'.";

/// One bullet paragraph on a slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bullet {
    pub text: String,
    /// 0 for top-level bullets, 1 for nested ones
    pub level: u8,
}

impl Bullet {
    /// Build a bullet from a body line. A leading `*` marks a nested bullet.
    pub fn from_line(line: &str) -> Self {
        let trimmed = line.trim();
        match trimmed.strip_prefix('*') {
            Some(rest) => Self {
                text: rest.trim().to_string(),
                level: 1,
            },
            None => Self {
                text: trimmed.to_string(),
                level: 0,
            },
        }
    }
}

/// A renderer-agnostic slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlideRecord {
    Title {
        title: String,
        subtitle: Option<String>,
    },
    Content {
        title: String,
        bullets: Vec<Bullet>,
    },
    Code {
        title: String,
        code: String,
    },
    ImageAnnotated {
        title: String,
        bullets: Vec<Bullet>,
        image: PathBuf,
    },
}

impl SlideRecord {
    pub fn title(&self) -> &str {
        match self {
            SlideRecord::Title { title, .. }
            | SlideRecord::Content { title, .. }
            | SlideRecord::Code { title, .. }
            | SlideRecord::ImageAnnotated { title, .. } => title,
        }
    }

    pub fn bullets(&self) -> &[Bullet] {
        match self {
            SlideRecord::Content { bullets, .. } | SlideRecord::ImageAnnotated { bullets, .. } => {
                bullets
            }
            _ => &[],
        }
    }

    /// Content and code slides with nothing to show are skipped by the renderer.
    /// Title slides are never empty, an empty title renders as a blank title.
    pub fn is_empty(&self) -> bool {
        match self {
            SlideRecord::Title { .. } => false,
            SlideRecord::Content { title, bullets } => {
                title.trim().is_empty() && bullets.is_empty()
            }
            SlideRecord::ImageAnnotated { .. } => false,
            SlideRecord::Code { code, .. } => code.trim().is_empty(),
        }
    }
}

/// Images resolved for a topic, keyed by the suggestion text, in encounter order.
#[derive(Debug, Clone, Default)]
pub struct ResolvedImages {
    entries: Vec<(String, PathBuf)>,
}

impl ResolvedImages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an image for a suggestion. Later images for the same suggestion are ignored.
    pub fn insert(&mut self, suggestion: &str, path: PathBuf) {
        if self.get(suggestion).is_none() {
            self.entries.push((suggestion.to_string(), path));
        }
    }

    pub fn get(&self, suggestion: &str) -> Option<&Path> {
        self.entries
            .iter()
            .find(|(s, _)| s == suggestion)
            .map(|(_, p)| p.as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Image paths in suggestion order
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|(_, p)| p.as_path())
    }
}

/// A slide's title and raw body lines before bullets and images are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideDraft {
    pub title: String,
    pub lines: Vec<String>,
}

impl From<&ContentPoint> for SlideDraft {
    fn from(point: &ContentPoint) -> Self {
        Self {
            title: point.title.clone(),
            lines: point.body_lines.clone(),
        }
    }
}

/// Outline content grouped into slide drafts by a [`GroupingPolicy`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedOutline {
    pub title: String,
    pub slides: Vec<SlideDraft>,
    pub code: Option<CodeBlock>,
    pub image_suggestions: Vec<String>,
}

/// How outline lines are partitioned into slides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingPolicy {
    /// One slide per numbered point
    #[default]
    Point,
    /// Slides split on `---` lines and `Slide N:` headers
    Flat,
}

impl GroupingPolicy {
    /// Instruction asking the text service for an outline in this policy's shape.
    pub fn outline_instruction(&self) -> &'static str {
        match self {
            GroupingPolicy::Point => POINT_INSTRUCTION,
            GroupingPolicy::Flat => FLAT_INSTRUCTION,
        }
    }

    pub fn group(&self, text: &str) -> GroupedOutline {
        self.group_lines(text.lines())
    }

    pub fn group_lines<'a, I>(&self, lines: I) -> GroupedOutline
    where
        I: IntoIterator<Item = &'a str>,
    {
        match self {
            GroupingPolicy::Point => {
                let parsed = outline::parse_lines(lines);
                GroupedOutline {
                    title: parsed.title,
                    slides: parsed.points.iter().map(SlideDraft::from).collect(),
                    code: parsed.code,
                    image_suggestions: parsed.image_suggestions,
                }
            }
            GroupingPolicy::Flat => group_flat(lines),
        }
    }
}

fn group_flat<'a, I>(lines: I) -> GroupedOutline
where
    I: IntoIterator<Item = &'a str>,
{
    let tokens = outline::tokenize(lines);
    let mut grouped = GroupedOutline {
        code: outline::first_fenced_code(&tokens),
        ..GroupedOutline::default()
    };
    let mut document_title = String::new();
    let mut header: Option<String> = None;
    let mut body: Vec<String> = Vec::new();

    let flush = |header: &mut Option<String>,
                 body: &mut Vec<String>,
                 slides: &mut Vec<SlideDraft>| {
        if header.is_some() || !body.is_empty() {
            slides.push(SlideDraft {
                title: header
                    .take()
                    .filter(|h| !h.is_empty())
                    .unwrap_or_else(|| DEFAULT_FLAT_SLIDE_TITLE.to_string()),
                lines: std::mem::take(body),
            });
        }
    };

    for token in &tokens {
        match &token.kind {
            LineKind::SlideDelimiter => flush(&mut header, &mut body, &mut grouped.slides),
            LineKind::SlideHeader(title) => {
                flush(&mut header, &mut body, &mut grouped.slides);
                header = Some(title.clone());
            }
            LineKind::Topic(topic) => {
                if grouped.title.is_empty() {
                    grouped.title = topic.clone();
                }
            }
            LineKind::DocumentTitle(title) => {
                if document_title.is_empty() {
                    document_title = title.clone();
                }
            }
            LineKind::ImageSuggestion(suggestion) => {
                outline::push_distinct(&mut grouped.image_suggestions, suggestion);
            }
            LineKind::Point { .. } | LineKind::Text => {
                if let LineKind::Point {
                    image: Some(suggestion),
                    ..
                } = &token.kind
                {
                    outline::push_distinct(&mut grouped.image_suggestions, suggestion);
                }
                let line = match token.text.strip_prefix('-') {
                    Some(rest) => rest.trim().to_string(),
                    None => token.text.clone(),
                };
                if !line.is_empty() {
                    body.push(line);
                }
            }
            LineKind::Blank | LineKind::Fence | LineKind::Code(_) => {}
        }
    }
    flush(&mut header, &mut body, &mut grouped.slides);

    if grouped.title.is_empty() {
        grouped.title = document_title;
    }
    grouped
}

/// Assemble slide records for one topic from numbered points.
pub fn assemble(
    topic_title: &str,
    code_block: Option<&CodeBlock>,
    points: &[ContentPoint],
    resolved_images: &ResolvedImages,
) -> Vec<SlideRecord> {
    let drafts: Vec<SlideDraft> = points.iter().map(SlideDraft::from).collect();
    assemble_drafts(topic_title, code_block, &drafts, resolved_images)
}

/// Assemble slide records for one topic from any grouping policy's output.
///
/// The title slide comes first and the code slide, if any, comes last. Resolved
/// images attach to content slides in suggestion order, one per slide.
pub fn assemble_drafts(
    topic_title: &str,
    code_block: Option<&CodeBlock>,
    drafts: &[SlideDraft],
    resolved_images: &ResolvedImages,
) -> Vec<SlideRecord> {
    let mut slides = Vec::with_capacity(drafts.len() + 2);
    slides.push(SlideRecord::Title {
        title: topic_title.to_string(),
        subtitle: Some(TITLE_SLIDE_SUBTITLE.to_string()),
    });

    let mut images = resolved_images.paths();
    for draft in drafts {
        let bullets: Vec<Bullet> = draft
            .lines
            .iter()
            .map(|line| Bullet::from_line(line))
            .filter(|bullet| !bullet.text.is_empty())
            .collect();

        let record = match images.next() {
            Some(image) => SlideRecord::ImageAnnotated {
                title: draft.title.clone(),
                bullets,
                image: image.to_path_buf(),
            },
            None => SlideRecord::Content {
                title: draft.title.clone(),
                bullets,
            },
        };
        slides.push(record);
    }

    if let Some(code) = code_block.filter(|c| !c.raw_text.trim().is_empty()) {
        slides.push(SlideRecord::Code {
            title: CODE_SLIDE_TITLE.to_string(),
            code: code.raw_text.clone(),
        });
    }

    slides
}
