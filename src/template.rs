// ABOUTME: Template selection for generated decks
// ABOUTME: Resolves named visual themes to template files, falling back to a blank theme

use crate::errors::{Result, SlidesError};
use log::{debug, info, warn};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

const THEME_PART: &str = "ppt/theme/theme1.xml";
const MASTER_PART: &str = "ppt/slideMasters/slideMaster1.xml";

/// Named visual themes. Each maps to an optional `.pptx` file in the template directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TemplateChoice {
    #[default]
    Minimalistic,
    Colourful,
    Professional,
    Dark,
    /// Built-in blank theme, no template file
    Blank,
}

impl TemplateChoice {
    pub fn file_name(&self) -> Option<&'static str> {
        match self {
            TemplateChoice::Minimalistic => Some("minimalistic.pptx"),
            TemplateChoice::Colourful => Some("colourful.pptx"),
            TemplateChoice::Professional => Some("professional.pptx"),
            TemplateChoice::Dark => Some("dark.pptx"),
            TemplateChoice::Blank => None,
        }
    }

    /// Resolve to a concrete template. A missing or unreadable file yields the blank theme.
    pub fn resolve(&self, templates_dir: &Path) -> Template {
        let Some(file_name) = self.file_name() else {
            return Template::blank();
        };

        let path = templates_dir.join(file_name);
        if !path.is_file() {
            warn!(
                "Template {:?} not found, falling back to a blank theme",
                path
            );
            return Template::blank();
        }

        match Template::from_file(&path) {
            Ok(template) => {
                info!("Using template theme '{}' from {:?}", template.name, path);
                template
            }
            Err(e) => {
                warn!(
                    "Failed to load template {:?}: {}. Falling back to a blank theme",
                    path, e
                );
                Template::blank()
            }
        }
    }
}

/// Theme data embedded into generated decks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    /// Raw `theme1.xml` taken from a template file; `None` means the built-in blank theme
    pub theme_xml: Option<String>,
    /// The master's `<p:clrMap/>` element, mapping background and text to theme colours
    pub clr_map_xml: Option<String>,
    /// The master's `<p:bg>` element
    pub background_xml: Option<String>,
    pub source: Option<PathBuf>,
}

impl Template {
    pub fn blank() -> Self {
        Self {
            name: "Blank".to_string(),
            theme_xml: None,
            clr_map_xml: None,
            background_xml: None,
            source: None,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.theme_xml.is_none()
    }

    /// Load the theme part from a `.pptx`/`.potx` file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = fs::File::open(path).map_err(SlidesError::FileReadError)?;
        let mut archive = ZipArchive::new(file)
            .map_err(|e| SlidesError::TemplateError(format!("Not a zip archive: {}", e)))?;

        let mut theme_xml = String::new();
        archive
            .by_name(THEME_PART)
            .map_err(|_| SlidesError::TemplateError(format!("Missing {}", THEME_PART)))?
            .read_to_string(&mut theme_xml)
            .map_err(SlidesError::FileReadError)?;

        let name = theme_name(&theme_xml)?;

        let mut master_xml = String::new();
        let (clr_map_xml, background_xml) = match archive.by_name(MASTER_PART) {
            Ok(mut part) => {
                part.read_to_string(&mut master_xml)
                    .map_err(SlidesError::FileReadError)?;
                master_fragments(&master_xml)?
            }
            Err(_) => {
                debug!("Template {:?} has no slide master, using default colour map", path);
                (None, None)
            }
        };

        Ok(Self {
            name,
            theme_xml: Some(theme_xml),
            clr_map_xml,
            background_xml,
            source: Some(path.to_path_buf()),
        })
    }
}

/// Raw `<p:clrMap/>` and `<p:bg>` elements of a slide master.
///
/// Backgrounds that reference pictures are dropped since their relationships
/// are not carried over.
fn master_fragments(master_xml: &str) -> Result<(Option<String>, Option<String>)> {
    let mut reader = Reader::from_str(master_xml);
    let mut clr_map = None;
    let mut background = None;
    let mut background_start = None;

    loop {
        let position = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"clrMap" => {
                let end = reader.buffer_position();
                clr_map = Some(master_xml[position..end].trim().to_string());
            }
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"bg" => {
                background_start.get_or_insert(position);
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"bg" => {
                if let Some(start) = background_start.take() {
                    background =
                        Some(master_xml[start..reader.buffer_position()].trim().to_string());
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(SlidesError::TemplateError(format!(
                    "Invalid slide master XML: {}",
                    e
                )));
            }
        }
    }

    let clr_map = clr_map.filter(|xml| xml.starts_with("<p:clrMap"));
    let background =
        background.filter(|xml| xml.starts_with("<p:bg") && !xml.contains("r:embed"));
    Ok((clr_map, background))
}

/// Read the `name` attribute of the root `<a:theme>` element.
fn theme_name(theme_xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(theme_xml);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() != b"theme" {
                    return Err(SlidesError::TemplateError(
                        "Theme part does not start with a theme element".to_string(),
                    ));
                }
                let name = e
                    .try_get_attribute("name")
                    .map_err(|e| SlidesError::TemplateError(e.to_string()))?
                    .map(|attr| {
                        attr.unescape_value()
                            .map(|v| v.into_owned())
                            .map_err(|e| SlidesError::TemplateError(e.to_string()))
                    })
                    .transpose()?
                    .unwrap_or_else(|| "Template".to_string());
                return Ok(name);
            }
            Ok(Event::Eof) => {
                return Err(SlidesError::TemplateError("Empty theme part".to_string()));
            }
            Ok(_) => {}
            Err(e) => {
                return Err(SlidesError::TemplateError(format!(
                    "Invalid theme XML: {}",
                    e
                )));
            }
        }
    }
}
