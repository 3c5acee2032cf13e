// ABOUTME: Main entry point for the auto-slides program.
// ABOUTME: Provides the CLI interface and executes commands from the library.

use anyhow::Context;
use auto_slides::{Config, DeckRequest, Generator, GroupingPolicy, TemplateChoice};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a deck for one or more topics using the text and image services
    Generate(GenerateArgs),

    /// Build a deck offline from JSON topic records
    Build(BuildArgs),

    /// Parse an outline file and print the slide records as JSON
    Parse(ParseArgs),

    /// Print the text of each slide in a PPTX file
    Inspect(InspectArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Topics to present, one title slide each
    #[arg(required = true)]
    topics: Vec<String>,

    /// Path to the output PPTX file
    #[arg(short, long, default_value = "presentation.pptx")]
    output: PathBuf,

    /// Visual theme
    #[arg(long, value_enum, default_value_t = TemplateChoice::Minimalistic)]
    template: TemplateChoice,

    /// How outline lines are grouped into slides
    #[arg(long, value_enum, default_value_t = GroupingPolicy::Point)]
    grouping: GroupingPolicy,

    /// Request a code sample for each topic
    #[arg(long)]
    code: bool,

    /// Skip the image search
    #[arg(long)]
    no_images: bool,

    /// Directory holding template files (overrides TEMPLATE_DIR)
    #[arg(long)]
    template_dir: Option<PathBuf>,
}

#[derive(Args)]
struct BuildArgs {
    /// JSON file with topic records
    #[arg(short, long)]
    input: PathBuf,

    /// Path to the output PPTX file
    #[arg(short, long, default_value = "presentation.pptx")]
    output: PathBuf,

    /// Visual theme
    #[arg(long, value_enum, default_value_t = TemplateChoice::Minimalistic)]
    template: TemplateChoice,

    /// Directory holding template files (overrides TEMPLATE_DIR)
    #[arg(long)]
    template_dir: Option<PathBuf>,
}

#[derive(Args)]
struct ParseArgs {
    /// Outline text file
    #[arg(short, long)]
    input: PathBuf,

    /// How outline lines are grouped into slides
    #[arg(long, value_enum, default_value_t = GroupingPolicy::Point)]
    grouping: GroupingPolicy,
}

#[derive(Args)]
struct InspectArgs {
    /// PPTX file to read
    #[arg(short, long)]
    input: PathBuf,
}

fn run_generate(args: &GenerateArgs, config: &Config) -> anyhow::Result<()> {
    let cancel = auto_slides::CancelToken::new();
    let text = config
        .text_client(&cancel)
        .context("Cannot generate without a text service")?;
    let images: Box<dyn auto_slides::ImageSearch> = if args.no_images {
        Box::new(auto_slides::NoImages)
    } else {
        config.image_search(&cancel)?
    };
    let templates_dir = args
        .template_dir
        .clone()
        .unwrap_or_else(|| config.template_dir.clone());

    let request = DeckRequest {
        topics: args.topics.clone(),
        include_code: args.code,
        include_images: !args.no_images,
        grouping: args.grouping,
        template: args.template,
        output: args.output.clone(),
    };

    let report = Generator::new(&text, images.as_ref(), templates_dir)
        .with_cancel(cancel)
        .generate(&request)?;
    println!(
        "Presentation saved as {:?} ({} slides, {} images)",
        report.output, report.render.slide_count, report.render.images_placed
    );
    Ok(())
}

fn run_build(args: &BuildArgs, config: &Config) -> anyhow::Result<()> {
    let json = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {:?}", args.input))?;
    let templates_dir = args
        .template_dir
        .clone()
        .unwrap_or_else(|| config.template_dir.clone());
    let report =
        auto_slides::build_from_records(&json, args.template, &templates_dir, &args.output)?;
    println!(
        "Presentation saved as {:?} ({} slides)",
        args.output, report.slide_count
    );
    Ok(())
}

fn run_parse(args: &ParseArgs) -> anyhow::Result<()> {
    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {:?}", args.input))?;
    let grouped = args.grouping.group(&text);
    let slides = auto_slides::assemble_drafts(
        &grouped.title,
        grouped.code.as_ref(),
        &grouped.slides,
        &auto_slides::ResolvedImages::new(),
    );
    println!("{}", serde_json::to_string_pretty(&slides)?);
    Ok(())
}

fn run_inspect(args: &InspectArgs) -> anyhow::Result<()> {
    let slides = auto_slides::read_slide_texts(&args.input)?;
    for (i, texts) in slides.iter().enumerate() {
        println!("Slide {}:", i + 1);
        for text in texts {
            println!("  {}", text);
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let result = match &cli.command {
        Some(Commands::Generate(args)) => run_generate(args, &config),
        Some(Commands::Build(args)) => run_build(args, &config),
        Some(Commands::Parse(args)) => run_parse(args),
        Some(Commands::Inspect(args)) => run_inspect(args),
        None => {
            println!("No command specified. Use --help for usage information.");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
