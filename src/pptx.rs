// ABOUTME: PPTX generation module for the auto-slides application
// ABOUTME: Renders slide records into a PowerPoint file and reads slide text back

use crate::assemble::{Bullet, SlideRecord};
use crate::errors::{Result, SlidesError};
use crate::template::{Template, TemplateChoice};
use crate::utils::ensure_parent_directory_exists;
use image::{GenericImageView, ImageFormat};
use log::{debug, info, warn};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::{write::FileOptions, ZipArchive, ZipWriter};

const EMU_PER_INCH: i64 = 914_400;
// 4:3, 10in x 7.5in
const SLIDE_CX: i64 = 9_144_000;
const SLIDE_CY: i64 = 6_858_000;

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

const SLIDE_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";

const DEFAULT_BACKGROUND: &str =
    r#"<p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>"#;
const DEFAULT_CLR_MAP: &str = concat!(
    r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" "#,
    r#"accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" "#,
    r#"accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#
);

const fn inches(tenths: i64) -> i64 {
    tenths * EMU_PER_INCH / 10
}

/// Outcome of a render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    pub slide_count: usize,
    pub images_placed: usize,
    /// Records skipped because they had nothing to show
    pub skipped: usize,
}

/// A picture ready to embed.
struct Picture {
    data: Vec<u8>,
    extension: &'static str,
    width: u32,
    height: u32,
}

/// A slide serialized to XML together with its optional picture.
struct RenderedSlide {
    xml: String,
    picture: Option<Picture>,
}

/// Resolve the template choice and render the slides to `output_file`.
pub fn render(
    slides: &[SlideRecord],
    template_choice: TemplateChoice,
    templates_dir: &Path,
    output_file: &Path,
) -> Result<RenderReport> {
    let template = template_choice.resolve(templates_dir);
    render_with_template(slides, &template, output_file)
}

/// Render slides with an already resolved template.
///
/// Failing to write the output file is the only error; empty records and
/// unusable images are skipped with a warning.
pub fn render_with_template(
    slides: &[SlideRecord],
    template: &Template,
    output_file: &Path,
) -> Result<RenderReport> {
    info!("Generating PPTX with {} slide records", slides.len());

    let mut report = RenderReport::default();
    let mut rendered = Vec::with_capacity(slides.len());

    for (i, record) in slides.iter().enumerate() {
        if record.is_empty() {
            warn!("Skipping empty slide record {}: {:?}", i + 1, record);
            report.skipped += 1;
            continue;
        }
        let slide = render_slide(record);
        if slide.picture.is_some() {
            report.images_placed += 1;
        }
        rendered.push(slide);
    }
    report.slide_count = rendered.len();

    let deck_title = slides
        .iter()
        .find_map(|s| match s {
            SlideRecord::Title { title, .. } if !title.is_empty() => Some(title.as_str()),
            _ => None,
        })
        .unwrap_or("Presentation");

    ensure_parent_directory_exists(output_file)?;
    let file = fs::File::create(output_file).map_err(SlidesError::FileReadError)?;
    write_package(file, &rendered, template, deck_title)?;

    info!(
        "PPTX file created at {:?} ({} slides, {} images)",
        output_file, report.slide_count, report.images_placed
    );
    Ok(report)
}

fn render_slide(record: &SlideRecord) -> RenderedSlide {
    match record {
        SlideRecord::Title { title, subtitle } => RenderedSlide {
            xml: slide_xml(&title_slide_shapes(title, subtitle.as_deref())),
            picture: None,
        },
        SlideRecord::Content { title, bullets } => RenderedSlide {
            xml: slide_xml(&content_shapes(title, bullets, false)),
            picture: None,
        },
        SlideRecord::Code { title, code } => RenderedSlide {
            xml: slide_xml(&code_shapes(title, code)),
            picture: None,
        },
        SlideRecord::ImageAnnotated {
            title,
            bullets,
            image,
        } => match load_picture(image) {
            Ok(picture) => {
                let mut shapes = content_shapes(title, bullets, true);
                shapes.push_str(&picture_shape(&picture));
                RenderedSlide {
                    xml: slide_xml(&shapes),
                    picture: Some(picture),
                }
            }
            Err(e) => {
                warn!(
                    "Failed to add image {:?} to slide '{}': {}",
                    image, title, e
                );
                RenderedSlide {
                    xml: slide_xml(&content_shapes(title, bullets, false)),
                    picture: None,
                }
            }
        },
    }
}

/// Read and validate an image. Formats other than PNG and JPEG are re-encoded as PNG.
fn load_picture(path: &Path) -> Result<Picture> {
    let data = fs::read(path).map_err(SlidesError::FileReadError)?;
    let format = image::guess_format(&data)?;
    let decoded = image::load_from_memory_with_format(&data, format)?;
    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return Err(SlidesError::ImageError(format!(
            "Image {:?} has no pixels",
            path
        )));
    }

    match format {
        ImageFormat::Png => Ok(Picture {
            data,
            extension: "png",
            width,
            height,
        }),
        ImageFormat::Jpeg => Ok(Picture {
            data,
            extension: "jpeg",
            width,
            height,
        }),
        other => {
            debug!("Re-encoding {:?} image {:?} as PNG", other, path);
            let mut buffer = Cursor::new(Vec::new());
            decoded.write_to(&mut buffer, image::ImageOutputFormat::Png)?;
            Ok(Picture {
                data: buffer.into_inner(),
                extension: "png",
                width,
                height,
            })
        }
    }
}

/// Escape text for XML, dropping control characters XML cannot carry.
fn xml_text(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_control() || *c == '\t')
        .collect();
    quick_xml::escape::escape(cleaned.as_str()).into_owned()
}

fn slide_xml(shapes: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}">
  <p:cSld>
    <p:spTree>
      <p:nvGrpSpPr>
        <p:cNvPr id="1" name=""/>
        <p:cNvGrpSpPr/>
        <p:nvPr/>
      </p:nvGrpSpPr>
      <p:grpSpPr>
        <a:xfrm>
          <a:off x="0" y="0"/>
          <a:ext cx="0" cy="0"/>
          <a:chOff x="0" y="0"/>
          <a:chExt cx="0" cy="0"/>
        </a:xfrm>
      </p:grpSpPr>
{shapes}    </p:spTree>
  </p:cSld>
  <p:clrMapOvr>
    <a:masterClrMapping/>
  </p:clrMapOvr>
</p:sld>"#
    )
}

struct Frame {
    x: i64,
    y: i64,
    cx: i64,
    cy: i64,
}

fn text_box(id: u32, name: &str, frame: &Frame, fill: Option<&str>, paragraphs: &str) -> String {
    let fill_xml = match fill {
        Some(rgb) => format!("<a:solidFill><a:srgbClr val=\"{}\"/></a:solidFill>", rgb),
        None => "<a:noFill/>".to_string(),
    };
    format!(
        r#"      <p:sp>
        <p:nvSpPr>
          <p:cNvPr id="{id}" name="{name}"/>
          <p:cNvSpPr txBox="1"/>
          <p:nvPr/>
        </p:nvSpPr>
        <p:spPr>
          <a:xfrm>
            <a:off x="{x}" y="{y}"/>
            <a:ext cx="{cx}" cy="{cy}"/>
          </a:xfrm>
          <a:prstGeom prst="rect"><a:avLst/></a:prstGeom>
          {fill_xml}
        </p:spPr>
        <p:txBody>
          <a:bodyPr wrap="square" rtlCol="0"><a:normAutofit/></a:bodyPr>
          <a:lstStyle/>
{paragraphs}        </p:txBody>
      </p:sp>
"#,
        x = frame.x,
        y = frame.y,
        cx = frame.cx,
        cy = frame.cy,
    )
}

fn plain_paragraph(
    text: &str,
    size: u32,
    bold: bool,
    align: Option<&str>,
    font: Option<&str>,
    color: Option<&str>,
) -> String {
    let align_attr = align.map(|a| format!(" algn=\"{}\"", a)).unwrap_or_default();
    let bold_attr = if bold { " b=\"1\"" } else { "" };
    let color_xml = color
        .map(|rgb| format!("<a:solidFill><a:srgbClr val=\"{}\"/></a:solidFill>", rgb))
        .unwrap_or_default();
    let font_xml = font
        .map(|f| format!("<a:latin typeface=\"{}\"/>", f))
        .unwrap_or_default();
    format!(
        "          <a:p><a:pPr{align_attr}><a:buNone/></a:pPr><a:r><a:rPr lang=\"en-US\" sz=\"{size}\"{bold_attr} dirty=\"0\">{color_xml}{font_xml}</a:rPr><a:t>{}</a:t></a:r></a:p>\n",
        xml_text(text)
    )
}

fn bullet_paragraph(bullet: &Bullet) -> String {
    let level = i64::from(bullet.level.min(1));
    let (glyph, size) = if level == 0 { ("•", 2000) } else { ("–", 1800) };
    let margin = 342_900 * (level + 1);
    format!(
        "          <a:p><a:pPr marL=\"{margin}\" lvl=\"{level}\" indent=\"-342900\"><a:buFont typeface=\"Arial\"/><a:buChar char=\"{glyph}\"/></a:pPr><a:r><a:rPr lang=\"en-US\" sz=\"{size}\" dirty=\"0\"/><a:t>{}</a:t></a:r></a:p>\n",
        xml_text(&bullet.text)
    )
}

fn slide_title_box(title: &str) -> String {
    let frame = Frame {
        x: inches(10),
        y: inches(3),
        cx: inches(80),
        cy: inches(10),
    };
    text_box(
        2,
        "Title",
        &frame,
        None,
        &plain_paragraph(title, 3200, true, Some("ctr"), None, None),
    )
}

fn title_slide_shapes(title: &str, subtitle: Option<&str>) -> String {
    let title_frame = Frame {
        x: inches(5),
        y: inches(25),
        cx: inches(90),
        cy: inches(15),
    };
    let mut shapes = text_box(
        2,
        "Title",
        &title_frame,
        None,
        &plain_paragraph(title, 4400, true, Some("ctr"), None, None),
    );

    if let Some(subtitle) = subtitle {
        let subtitle_frame = Frame {
            x: inches(15),
            y: inches(42),
            cx: inches(70),
            cy: inches(10),
        };
        shapes.push_str(&text_box(
            3,
            "Subtitle",
            &subtitle_frame,
            None,
            &plain_paragraph(subtitle, 2800, false, Some("ctr"), None, None),
        ));
    }
    shapes
}

fn content_shapes(title: &str, bullets: &[Bullet], leave_room_for_picture: bool) -> String {
    let mut shapes = slide_title_box(title);

    let frame = Frame {
        x: inches(5),
        y: inches(12),
        cx: if leave_room_for_picture { inches(58) } else { inches(90) },
        cy: inches(55),
    };
    let paragraphs = if bullets.is_empty() {
        "          <a:p><a:endParaRPr lang=\"en-US\"/></a:p>\n".to_string()
    } else {
        bullets.iter().map(bullet_paragraph).collect::<String>()
    };
    shapes.push_str(&text_box(3, "Content", &frame, None, &paragraphs));
    shapes
}

fn code_shapes(title: &str, code: &str) -> String {
    let mut shapes = slide_title_box(title);

    let frame = Frame {
        x: inches(10),
        y: inches(15),
        cx: inches(80),
        cy: inches(50),
    };
    let paragraphs = code
        .lines()
        .map(|line| plain_paragraph(line, 1200, false, None, Some("Courier New"), Some("FFFFFF")))
        .collect::<String>();
    shapes.push_str(&text_box(3, "Code", &frame, Some("282828"), &paragraphs));
    shapes
}

/// Picture shape fitted into the right-hand 3in x 5in box, keeping its aspect ratio.
fn picture_shape(picture: &Picture) -> String {
    let box_x = inches(65);
    let box_y = inches(10);
    let box_cx = inches(30);
    let box_cy = inches(50);

    let scale = f64::min(
        box_cx as f64 / f64::from(picture.width),
        box_cy as f64 / f64::from(picture.height),
    );
    let cx = (f64::from(picture.width) * scale) as i64;
    let cy = (f64::from(picture.height) * scale) as i64;
    let x = box_x + (box_cx - cx) / 2;
    let y = box_y + (box_cy - cy) / 2;

    format!(
        r#"      <p:pic>
        <p:nvPicPr>
          <p:cNvPr id="4" name="Picture"/>
          <p:cNvPicPr>
            <a:picLocks noChangeAspect="1"/>
          </p:cNvPicPr>
          <p:nvPr/>
        </p:nvPicPr>
        <p:blipFill>
          <a:blip r:embed="rId2"/>
          <a:stretch>
            <a:fillRect/>
          </a:stretch>
        </p:blipFill>
        <p:spPr>
          <a:xfrm>
            <a:off x="{x}" y="{y}"/>
            <a:ext cx="{cx}" cy="{cy}"/>
          </a:xfrm>
          <a:prstGeom prst="rect">
            <a:avLst/>
          </a:prstGeom>
        </p:spPr>
      </p:pic>
"#
    )
}

fn write_package<W: Write + Seek>(
    writer: W,
    slides: &[RenderedSlide],
    template: &Template,
    deck_title: &str,
) -> Result<()> {
    let mut zip = ZipWriter::new(writer);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    debug!("Creating PPTX structure: [Content_Types].xml");
    zip.start_file("[Content_Types].xml", options)?;
    let slide_overrides = (1..=slides.len())
        .map(|i| {
            format!(
                r#"  <Override PartName="/ppt/slides/slide{}.xml" ContentType="{}"/>"#,
                i, SLIDE_CONTENT_TYPE
            )
        })
        .collect::<Vec<String>>()
        .join("\n");
    let content_types = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Default Extension="png" ContentType="image/png"/>
  <Default Extension="jpeg" ContentType="image/jpeg"/>
  <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
  <Override PartName="/ppt/presProps.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presProps+xml"/>
  <Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>
  <Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>
  <Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>
  <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
  <Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
{slide_overrides}
</Types>"#
    );
    zip.write_all(content_types.as_bytes())?;

    debug!("Creating PPTX structure: _rels/.rels");
    zip.start_file("_rels/.rels", options)?;
    let rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;
    zip.write_all(rels.as_bytes())?;

    debug!("Creating PPTX structure: docProps");
    zip.start_file("docProps/app.xml", options)?;
    let app_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
  <Application>auto-slides</Application>
  <PresentationFormat>On-screen Show (4:3)</PresentationFormat>
  <Slides>{}</Slides>
</Properties>"#,
        slides.len()
    );
    zip.write_all(app_xml.as_bytes())?;

    zip.start_file("docProps/core.xml", options)?;
    let core_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <dc:title>{}</dc:title>
  <dc:creator>auto-slides</dc:creator>
  <dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>
  <cp:revision>1</cp:revision>
</cp:coreProperties>"#,
        xml_text(deck_title),
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    );
    zip.write_all(core_xml.as_bytes())?;

    debug!("Creating PPTX structure: ppt/presentation.xml");
    zip.start_file("ppt/_rels/presentation.xml.rels", options)?;
    // rId1 = master, rId2 = theme, rId3 = presProps, slides from rId4
    let mut pres_rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="theme/theme1.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps" Target="presProps.xml"/>
"#,
    );
    for i in 1..=slides.len() {
        pres_rels.push_str(&format!(
            r#"  <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{}.xml"/>"#,
            i + 3,
            i
        ));
        pres_rels.push('\n');
    }
    pres_rels.push_str("</Relationships>");
    zip.write_all(pres_rels.as_bytes())?;

    zip.start_file("ppt/presentation.xml", options)?;
    let slide_ids = (1..=slides.len())
        .map(|i| format!(r#"    <p:sldId id="{}" r:id="rId{}"/>"#, 255 + i, i + 3))
        .collect::<Vec<String>>()
        .join("\n");
    let presentation_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" saveSubsetFonts="1">
  <p:sldMasterIdLst>
    <p:sldMasterId id="2147483648" r:id="rId1"/>
  </p:sldMasterIdLst>
  <p:sldIdLst>
{slide_ids}
  </p:sldIdLst>
  <p:sldSz cx="{SLIDE_CX}" cy="{SLIDE_CY}" type="screen4x3"/>
  <p:notesSz cx="{SLIDE_CY}" cy="{SLIDE_CX}"/>
</p:presentation>"#
    );
    zip.write_all(presentation_xml.as_bytes())?;

    zip.start_file("ppt/presProps.xml", options)?;
    let pres_props = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentationPr xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"/>"#
    );
    zip.write_all(pres_props.as_bytes())?;

    debug!("Creating PPTX structure: theme '{}'", template.name);
    zip.start_file("ppt/theme/theme1.xml", options)?;
    match &template.theme_xml {
        Some(theme_xml) => zip.write_all(theme_xml.as_bytes())?,
        None => zip.write_all(blank_theme_xml().as_bytes())?,
    }

    write_master_and_layout(&mut zip, options, template)?;

    for (i, slide) in slides.iter().enumerate() {
        let slide_num = i + 1;
        debug!("Creating slide XML: ppt/slides/slide{}.xml", slide_num);
        zip.start_file(format!("ppt/slides/slide{}.xml", slide_num), options)?;
        zip.write_all(slide.xml.as_bytes())?;

        let mut slide_rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="{REL_SLIDE_LAYOUT}" Target="../slideLayouts/slideLayout1.xml"/>
"#
        );

        if let Some(picture) = &slide.picture {
            let image_name = format!("image{}.{}", slide_num, picture.extension);
            debug!("Adding image to PPTX: ppt/media/{}", image_name);
            zip.start_file(format!("ppt/media/{}", image_name), options)?;
            zip.write_all(&picture.data)?;
            slide_rels.push_str(&format!(
                "  <Relationship Id=\"rId2\" Type=\"{}\" Target=\"../media/{}\"/>\n",
                REL_IMAGE, image_name
            ));
        }
        slide_rels.push_str("</Relationships>");

        zip.start_file(
            format!("ppt/slides/_rels/slide{}.xml.rels", slide_num),
            options,
        )?;
        zip.write_all(slide_rels.as_bytes())?;
    }

    debug!("Finalizing PPTX file");
    let mut writer = zip.finish()?;
    writer.flush().map_err(SlidesError::FileReadError)?;
    Ok(())
}

fn write_master_and_layout<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    options: FileOptions,
    template: &Template,
) -> Result<()> {
    let empty_tree = r#"    <p:spTree>
      <p:nvGrpSpPr>
        <p:cNvPr id="1" name=""/>
        <p:cNvGrpSpPr/>
        <p:nvPr/>
      </p:nvGrpSpPr>
      <p:grpSpPr/>
    </p:spTree>"#;

    let background = template
        .background_xml
        .as_deref()
        .unwrap_or(DEFAULT_BACKGROUND);
    let clr_map = template.clr_map_xml.as_deref().unwrap_or(DEFAULT_CLR_MAP);

    zip.start_file("ppt/slideMasters/slideMaster1.xml", options)?;
    let master = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}">
  <p:cSld>
    {background}
{empty_tree}
  </p:cSld>
  {clr_map}
  <p:sldLayoutIdLst>
    <p:sldLayoutId id="2147483649" r:id="rId1"/>
  </p:sldLayoutIdLst>
</p:sldMaster>"#
    );
    zip.write_all(master.as_bytes())?;

    zip.start_file("ppt/slideMasters/_rels/slideMaster1.xml.rels", options)?;
    let master_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="{REL_SLIDE_LAYOUT}" Target="../slideLayouts/slideLayout1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="../theme/theme1.xml"/>
</Relationships>"#
    );
    zip.write_all(master_rels.as_bytes())?;

    zip.start_file("ppt/slideLayouts/slideLayout1.xml", options)?;
    let layout = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" type="blank" preserve="1">
  <p:cSld name="Blank">
{empty_tree}
  </p:cSld>
  <p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sldLayout>"#
    );
    zip.write_all(layout.as_bytes())?;

    zip.start_file("ppt/slideLayouts/_rels/slideLayout1.xml.rels", options)?;
    let layout_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="../slideMasters/slideMaster1.xml"/>
</Relationships>"#;
    zip.write_all(layout_rels.as_bytes())?;

    Ok(())
}

fn blank_theme_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="{NS_A}" name="Blank">
  <a:themeElements>
    <a:clrScheme name="Blank">
      <a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>
      <a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>
      <a:dk2><a:srgbClr val="1F2937"/></a:dk2>
      <a:lt2><a:srgbClr val="F3F4F6"/></a:lt2>
      <a:accent1><a:srgbClr val="2563EB"/></a:accent1>
      <a:accent2><a:srgbClr val="EA580C"/></a:accent2>
      <a:accent3><a:srgbClr val="6B7280"/></a:accent3>
      <a:accent4><a:srgbClr val="CA8A04"/></a:accent4>
      <a:accent5><a:srgbClr val="0891B2"/></a:accent5>
      <a:accent6><a:srgbClr val="16A34A"/></a:accent6>
      <a:hlink><a:srgbClr val="1D4ED8"/></a:hlink>
      <a:folHlink><a:srgbClr val="7C3AED"/></a:folHlink>
    </a:clrScheme>
    <a:fontScheme name="Blank">
      <a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>
      <a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>
    </a:fontScheme>
    <a:fmtScheme name="Blank">
      <a:fillStyleLst>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
      </a:fillStyleLst>
      <a:lnStyleLst>
        <a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>
        <a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>
        <a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>
      </a:lnStyleLst>
      <a:effectStyleLst>
        <a:effectStyle><a:effectLst/></a:effectStyle>
        <a:effectStyle><a:effectLst/></a:effectStyle>
        <a:effectStyle><a:effectLst/></a:effectStyle>
      </a:effectStyleLst>
      <a:bgFillStyleLst>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
      </a:bgFillStyleLst>
    </a:fmtScheme>
  </a:themeElements>
</a:theme>"#
    )
}

/// Read the text runs of every slide in a `.pptx`, in slide order.
pub fn read_slide_texts(path: &Path) -> Result<Vec<Vec<String>>> {
    let file = fs::File::open(path).map_err(SlidesError::FileReadError)?;
    let mut archive = ZipArchive::new(file)?;

    let mut slide_numbers: Vec<usize> = archive
        .file_names()
        .filter_map(|name| {
            name.strip_prefix("ppt/slides/slide")?
                .strip_suffix(".xml")?
                .parse::<usize>()
                .ok()
        })
        .collect();
    slide_numbers.sort_unstable();

    let mut slides = Vec::with_capacity(slide_numbers.len());
    for number in slide_numbers {
        let mut xml = String::new();
        archive
            .by_name(&format!("ppt/slides/slide{}.xml", number))?
            .read_to_string(&mut xml)
            .map_err(SlidesError::FileReadError)?;
        slides.push(text_runs(&xml)?);
    }
    Ok(slides)
}

fn text_runs(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut runs = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"a:t" => current = Some(String::new()),
            Ok(Event::Text(t)) => {
                if let Some(text) = current.as_mut() {
                    let unescaped = t
                        .unescape()
                        .map_err(|e| SlidesError::PptxError(format!("Invalid slide text: {}", e)))?;
                    text.push_str(&unescaped);
                }
            }
            Ok(Event::Empty(e)) if e.name().as_ref() == b"a:t" => runs.push(String::new()),
            Ok(Event::End(e)) if e.name().as_ref() == b"a:t" => {
                if let Some(text) = current.take() {
                    runs.push(text);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(SlidesError::PptxError(format!("Invalid slide XML: {}", e)));
            }
        }
    }
    Ok(runs)
}
