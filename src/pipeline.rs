// ABOUTME: Deck generation pipeline for the auto-slides application
// ABOUTME: Runs fetch, parse, code, images and assemble per topic, then renders one deck

use crate::assemble::{assemble_drafts, Bullet, GroupingPolicy, ResolvedImages, SlideRecord};
use crate::errors::{Result, SlidesError};
use crate::image_service::ImageSearch;
use crate::outline::{self, CodeBlock};
use crate::pacing::CancelToken;
use crate::pptx::{self, RenderReport};
use crate::template::TemplateChoice;
use crate::text_service::{TextGenerator, CODE_INSTRUCTION};
use crate::utils::ScratchDir;
use log::{info, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const ERROR_SLIDE_TITLE: &str = "Error Processing Data";
const DEFAULT_RECORD_TOPIC: &str = "Presentation Topic";

/// What to generate and where to write it.
#[derive(Debug, Clone)]
pub struct DeckRequest {
    pub topics: Vec<String>,
    pub include_code: bool,
    pub include_images: bool,
    pub grouping: GroupingPolicy,
    pub template: TemplateChoice,
    pub output: PathBuf,
}

impl DeckRequest {
    pub fn new<P: Into<PathBuf>>(topics: Vec<String>, output: P) -> Self {
        Self {
            topics,
            include_code: false,
            include_images: true,
            grouping: GroupingPolicy::default(),
            template: TemplateChoice::default(),
            output: output.into(),
        }
    }
}

/// Summary of a finished generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub output: PathBuf,
    pub render: RenderReport,
    pub topics: usize,
}

/// Drives the services for a deck request.
pub struct Generator<'a> {
    text: &'a dyn TextGenerator,
    images: &'a dyn ImageSearch,
    templates_dir: PathBuf,
    cancel: CancelToken,
}

impl<'a> Generator<'a> {
    pub fn new<P: Into<PathBuf>>(
        text: &'a dyn TextGenerator,
        images: &'a dyn ImageSearch,
        templates_dir: P,
    ) -> Self {
        Self {
            text,
            images,
            templates_dir: templates_dir.into(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Generate a deck holding every requested topic, in order.
    ///
    /// Downloads go to a scratch directory that is removed before this returns,
    /// on success and on error alike.
    pub fn generate(&self, request: &DeckRequest) -> Result<GenerationReport> {
        let topics: Vec<&str> = request
            .topics
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if topics.is_empty() {
            return Err(SlidesError::ValidationError(
                "At least one topic is required".to_string(),
            ));
        }

        let scratch = ScratchDir::new()?;
        let mut slides = Vec::new();
        for topic in &topics {
            self.cancel.check()?;
            info!("Generating slides for topic '{}'", topic);
            slides.extend(self.topic_slides(topic, request, scratch.path())?);
        }
        self.cancel.check()?;

        let render = pptx::render(
            &slides,
            request.template,
            &self.templates_dir,
            &request.output,
        )?;
        scratch.close();

        Ok(GenerationReport {
            output: request.output.clone(),
            render,
            topics: topics.len(),
        })
    }

    /// Slide records for one topic: title first, content in outline order, code last.
    pub fn topic_slides(
        &self,
        topic: &str,
        request: &DeckRequest,
        scratch: &Path,
    ) -> Result<Vec<SlideRecord>> {
        let raw_outline =
            self.fetch_text(request.grouping.outline_instruction(), topic, "outline")?;
        let grouped = request.grouping.group(&raw_outline);

        let title = if grouped.title.trim().is_empty() {
            topic.to_string()
        } else {
            grouped.title.clone()
        };

        let fetched_code = if request.include_code {
            let response = self.fetch_text(CODE_INSTRUCTION, topic, "code sample")?;
            outline::extract_code_block(&response)
        } else {
            None
        };
        let code = fetched_code.or(grouped.code);

        let images = if request.include_images {
            self.resolve_images(&grouped.image_suggestions, scratch)?
        } else {
            ResolvedImages::new()
        };

        Ok(assemble_drafts(&title, code.as_ref(), &grouped.slides, &images))
    }

    /// Ask the text service, treating an unavailable service as empty text.
    fn fetch_text(&self, instruction: &str, topic: &str, what: &str) -> Result<String> {
        self.cancel.check()?;
        match self.text.summarize(instruction, topic) {
            Ok(text) => Ok(text),
            Err(SlidesError::Cancelled) => Err(SlidesError::Cancelled),
            Err(e) => {
                warn!("Could not fetch {} for '{}': {}", what, topic, e);
                Ok(String::new())
            }
        }
    }

    fn resolve_images(&self, suggestions: &[String], scratch: &Path) -> Result<ResolvedImages> {
        let mut resolved = ResolvedImages::new();
        for suggestion in suggestions {
            self.cancel.check()?;
            match self.images.search_images(suggestion, 1, scratch) {
                Ok(paths) => match paths.into_iter().next() {
                    Some(path) => resolved.insert(suggestion, path),
                    None => info!("No image for suggestion '{}'", suggestion),
                },
                Err(SlidesError::Cancelled) => return Err(SlidesError::Cancelled),
                Err(e) => warn!("Image search failed for '{}': {}", suggestion, e),
            }
        }
        Ok(resolved)
    }
}

/// A pre-generated topic: the summary lines and optional code for one title slide.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicRecord {
    #[serde(rename = "Topic", default = "default_record_topic")]
    pub topic: String,
    #[serde(rename = "Summary", default)]
    pub summary: SummaryLines,
    #[serde(rename = "Code", default)]
    pub code: String,
}

fn default_record_topic() -> String {
    DEFAULT_RECORD_TOPIC.to_string()
}

/// A summary given either as a list of lines or as one block of text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SummaryLines {
    Lines(Vec<String>),
    Text(String),
}

impl Default for SummaryLines {
    fn default() -> Self {
        SummaryLines::Lines(Vec::new())
    }
}

impl SummaryLines {
    pub fn lines(&self) -> Vec<&str> {
        match self {
            SummaryLines::Lines(lines) => lines.iter().map(String::as_str).collect(),
            SummaryLines::Text(text) => text.lines().collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordInput {
    Many(Vec<TopicRecord>),
    One(TopicRecord),
}

/// Parse topic records from JSON: a list of records or a single record.
pub fn parse_records(json: &str) -> Result<Vec<TopicRecord>> {
    let input: RecordInput = serde_json::from_str(json).map_err(|e| {
        SlidesError::ValidationError(format!("Unable to parse input data: {}", e))
    })?;
    Ok(match input {
        RecordInput::Many(records) => records,
        RecordInput::One(record) => vec![record],
    })
}

/// Slide records for pre-generated topics, without calling any service.
pub fn records_to_slides(records: &[TopicRecord]) -> Vec<SlideRecord> {
    let mut slides = Vec::new();
    for record in records {
        let grouped = GroupingPolicy::Point.group_lines(record.summary.lines());
        let code = CodeBlock::new(&record.code);
        slides.extend(assemble_drafts(
            &record.topic,
            code.as_ref(),
            &grouped.slides,
            &ResolvedImages::new(),
        ));
    }
    slides
}

/// The single slide written when input data cannot be used.
pub fn error_slide(message: &str) -> SlideRecord {
    SlideRecord::Content {
        title: ERROR_SLIDE_TITLE.to_string(),
        bullets: vec![Bullet {
            text: format!("An error occurred while processing the data: {}", message),
            level: 0,
        }],
    }
}

/// Build a deck offline from JSON topic records.
///
/// Unusable data still produces a deck, holding one error slide.
pub fn build_from_records(
    json: &str,
    template: TemplateChoice,
    templates_dir: &Path,
    output: &Path,
) -> Result<RenderReport> {
    let slides = match parse_records(json) {
        Ok(records) => {
            info!("Building deck from {} topic records", records.len());
            records_to_slides(&records)
        }
        Err(e) => {
            warn!("{}", e);
            vec![error_slide(&e.to_string())]
        }
    };
    pptx::render(&slides, template, templates_dir, output)
}
