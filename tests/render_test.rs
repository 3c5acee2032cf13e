use auto_slides::{read_slide_texts, render, Bullet, SlideRecord, TemplateChoice};
use image::{ImageBuffer, Rgb};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn bullet(text: &str, level: u8) -> Bullet {
    Bullet {
        text: text.to_string(),
        level,
    }
}

fn sample_deck() -> Vec<SlideRecord> {
    vec![
        SlideRecord::Title {
            title: "Recursion".to_string(),
            subtitle: Some("Overview".to_string()),
        },
        SlideRecord::Content {
            title: "Base case".to_string(),
            bullets: vec![
                bullet("Base case: stopping condition", 0),
                bullet("Every recursive function needs one", 1),
            ],
        },
        SlideRecord::Code {
            title: "Code Example".to_string(),
            code: "def fact(n):\n    return 1 if n == 0 else n * fact(n - 1)".to_string(),
        },
    ]
}

fn archive_names(path: &Path) -> Vec<String> {
    let file = fs::File::open(path).expect("Failed to open PPTX file");
    let archive = ZipArchive::new(file).expect("Failed to read PPTX as ZIP");
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

fn read_part(path: &Path, part: &str) -> String {
    let file = fs::File::open(path).expect("Failed to open PPTX file");
    let mut archive = ZipArchive::new(file).expect("Failed to read PPTX as ZIP");
    let mut content = String::new();
    archive
        .by_name(part)
        .expect("Missing part")
        .read_to_string(&mut content)
        .expect("Failed to read part");
    content
}

#[test]
fn test_render_writes_one_slide_per_record() {
    init_logging();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = temp_dir.path().join("nested").join("deck.pptx");

    let report = render(&sample_deck(), TemplateChoice::Blank, temp_dir.path(), &output)
        .expect("Render failed");

    assert_eq!(report.slide_count, 3);
    assert_eq!(report.images_placed, 0);
    assert_eq!(report.skipped, 0);
    assert!(output.exists(), "PPTX file was not created");

    let texts = read_slide_texts(&output).expect("Failed to read slides back");
    assert_eq!(texts.len(), 3);
    assert_eq!(texts[0], vec!["Recursion".to_string(), "Overview".to_string()]);
    assert_eq!(
        texts[1],
        vec![
            "Base case".to_string(),
            "Base case: stopping condition".to_string(),
            "Every recursive function needs one".to_string()
        ]
    );
    assert_eq!(texts[2][0], "Code Example");
    assert_eq!(texts[2][1], "def fact(n):");

    let code_xml = read_part(&output, "ppt/slides/slide3.xml");
    assert!(code_xml.contains("Courier New"));
    assert!(code_xml.contains("282828"));
}

#[test]
fn test_render_is_idempotent_across_output_paths() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let first = temp_dir.path().join("first.pptx");
    let second = temp_dir.path().join("second.pptx");

    render(&sample_deck(), TemplateChoice::Blank, temp_dir.path(), &first).expect("Render failed");
    render(&sample_deck(), TemplateChoice::Blank, temp_dir.path(), &second).expect("Render failed");

    assert_eq!(archive_names(&first), archive_names(&second));
    assert_eq!(
        read_slide_texts(&first).unwrap(),
        read_slide_texts(&second).unwrap()
    );
    for i in 1..=3 {
        let part = format!("ppt/slides/slide{}.xml", i);
        assert_eq!(read_part(&first, &part), read_part(&second, &part));
    }
}

#[test]
fn test_empty_records_are_skipped() {
    init_logging();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = temp_dir.path().join("deck.pptx");
    let mut slides = sample_deck();
    slides.push(SlideRecord::Content {
        title: String::new(),
        bullets: vec![],
    });
    slides.push(SlideRecord::Code {
        title: "Code Example".to_string(),
        code: "   ".to_string(),
    });

    let report =
        render(&slides, TemplateChoice::Blank, temp_dir.path(), &output).expect("Render failed");

    assert_eq!(report.slide_count, 3);
    assert_eq!(report.skipped, 2);
    assert_eq!(read_slide_texts(&output).unwrap().len(), 3);
}

#[test]
fn test_image_slide_embeds_picture() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let image_path = temp_dir.path().join("wide.png");
    let img = ImageBuffer::from_fn(200, 100, |_, _| Rgb([0u8, 128u8, 255u8]));
    img.save(&image_path).expect("Failed to save image");

    let slides = vec![SlideRecord::ImageAnnotated {
        title: "With picture".to_string(),
        bullets: vec![bullet("A point", 0)],
        image: image_path,
    }];
    let output = temp_dir.path().join("deck.pptx");
    let report =
        render(&slides, TemplateChoice::Blank, temp_dir.path(), &output).expect("Render failed");

    assert_eq!(report.images_placed, 1);
    assert!(archive_names(&output).contains(&"ppt/media/image1.png".to_string()));
    let rels = read_part(&output, "ppt/slides/_rels/slide1.xml.rels");
    assert!(rels.contains("../media/image1.png"));

    // 200x100 fitted into a 3in wide box: full width, half height
    let slide = read_part(&output, "ppt/slides/slide1.xml");
    assert!(slide.contains("<a:ext cx=\"2743200\" cy=\"1371600\"/>"));
}

#[test]
fn test_non_png_image_is_reencoded() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let image_path = temp_dir.path().join("picture.bmp");
    let img = ImageBuffer::from_fn(40, 40, |x, _| Rgb([x as u8, 0u8, 0u8]));
    img.save(&image_path).expect("Failed to save image");

    let slides = vec![SlideRecord::ImageAnnotated {
        title: "Bitmap".to_string(),
        bullets: vec![],
        image: image_path,
    }];
    let output = temp_dir.path().join("deck.pptx");
    render(&slides, TemplateChoice::Blank, temp_dir.path(), &output).expect("Render failed");

    assert!(archive_names(&output).contains(&"ppt/media/image1.png".to_string()));
}

#[test]
fn test_unreadable_image_yields_slide_without_picture() {
    init_logging();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let broken = temp_dir.path().join("broken.jpg");
    fs::write(&broken, b"definitely not an image").expect("Failed to write file");

    let slides = vec![
        SlideRecord::ImageAnnotated {
            title: "Broken".to_string(),
            bullets: vec![bullet("Still shown", 0)],
            image: broken,
        },
        SlideRecord::ImageAnnotated {
            title: "Missing".to_string(),
            bullets: vec![bullet("Also shown", 0)],
            image: temp_dir.path().join("missing.png"),
        },
    ];
    let output = temp_dir.path().join("deck.pptx");
    let report =
        render(&slides, TemplateChoice::Blank, temp_dir.path(), &output).expect("Render failed");

    assert_eq!(report.slide_count, 2);
    assert_eq!(report.images_placed, 0);
    assert!(!archive_names(&output).iter().any(|n| n.starts_with("ppt/media/")));
    let texts = read_slide_texts(&output).unwrap();
    assert_eq!(texts[0], vec!["Broken".to_string(), "Still shown".to_string()]);
}

#[test]
fn test_template_theme_is_embedded() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let template_path = temp_dir.path().join("professional.pptx");
    {
        let file = fs::File::create(&template_path).expect("Failed to create template");
        let mut zip = ZipWriter::new(file);
        zip.start_file("ppt/theme/theme1.xml", FileOptions::default())
            .expect("Failed to start theme part");
        zip.write_all(
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Crafted Theme"><a:themeElements/></a:theme>"#,
        )
        .expect("Failed to write theme part");
        zip.finish().expect("Failed to finish template");
    }

    let output = temp_dir.path().join("deck.pptx");
    render(&sample_deck(), TemplateChoice::Professional, temp_dir.path(), &output)
        .expect("Render failed");

    let theme = read_part(&output, "ppt/theme/theme1.xml");
    assert!(theme.contains("name=\"Crafted Theme\""));

    let master = read_part(&output, "ppt/slideMasters/slideMaster1.xml");
    assert!(master.contains("bg1=\"lt1\""));
    assert!(master.contains("<a:schemeClr val=\"bg1\"/>"));
}

#[test]
fn test_template_master_colours_are_carried() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let template_path = temp_dir.path().join("colourful.pptx");
    {
        let file = fs::File::create(&template_path).expect("Failed to create template");
        let mut zip = ZipWriter::new(file);
        zip.start_file("ppt/theme/theme1.xml", FileOptions::default())
            .expect("Failed to start theme part");
        zip.write_all(
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Dark"><a:themeElements/></a:theme>"#,
        )
        .expect("Failed to write theme part");
        zip.start_file("ppt/slideMasters/slideMaster1.xml", FileOptions::default())
            .expect("Failed to start master part");
        zip.write_all(
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
<p:cSld><p:bg><p:bgPr><a:solidFill><a:srgbClr val="101010"/></a:solidFill><a:effectLst/></p:bgPr></p:bg><p:spTree/></p:cSld>
<p:clrMap bg1="dk1" tx1="lt1" bg2="dk2" tx2="lt2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>
</p:sldMaster>"#,
        )
        .expect("Failed to write master part");
        zip.finish().expect("Failed to finish template");
    }

    let output = temp_dir.path().join("deck.pptx");
    render(&sample_deck(), TemplateChoice::Colourful, temp_dir.path(), &output)
        .expect("Render failed");

    let master = read_part(&output, "ppt/slideMasters/slideMaster1.xml");
    assert!(master.contains("bg1=\"dk1\""));
    assert!(!master.contains("bg1=\"lt1\""));
    assert!(master.contains("<a:srgbClr val=\"101010\"/>"));
    assert_eq!(master.matches("<p:bg>").count(), 1);
}

#[test]
fn test_missing_template_uses_blank_theme() {
    init_logging();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = temp_dir.path().join("deck.pptx");

    render(&sample_deck(), TemplateChoice::Colourful, temp_dir.path(), &output)
        .expect("Render failed");

    let theme = read_part(&output, "ppt/theme/theme1.xml");
    assert!(theme.contains("name=\"Blank\""));
}
