// ABOUTME: Library module for the auto-slides program.
// ABOUTME: Turns generated topic outlines into slide records and renders them as PPTX decks.

pub mod assemble;
pub mod config;
pub mod errors;
pub mod http;
pub mod image_service;
pub mod outline;
pub mod pacing;
pub mod pipeline;
pub mod pptx;
pub mod template;
pub mod text_service;
pub mod utils;

// Reexport common types and functions
pub use assemble::{assemble, assemble_drafts, Bullet, GroupingPolicy, ResolvedImages, SlideRecord};
pub use config::Config;
pub use errors::{Result, SlidesError};
pub use image_service::{ImageSearch, NoImages, PexelsClient};
pub use outline::{parse, CodeBlock, ContentPoint, ParsedOutline, TitleRule};
pub use pacing::{CancelToken, RateLimiter};
pub use pipeline::{build_from_records, DeckRequest, GenerationReport, Generator};
pub use pptx::{read_slide_texts, render, RenderReport};
pub use template::{Template, TemplateChoice};
pub use text_service::{GeminiClient, Paced, TextGenerator};
