use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_command(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_auto-slides"))
        .args(args)
        .env("RUST_LOG", "warn")
        .env_remove("GEMINI_API_KEY")
        .env_remove("PEXELS_API_KEY")
        .output()
        .expect("Failed to execute command")
}

#[test]
fn test_build_command_creates_deck() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let input = temp_dir.path().join("records.json");
    fs::write(
        &input,
        r#"[{"Topic": "Queues", "Summary": ["1. **Enqueue**: add at the back", "2. **Dequeue**: take from the front"]}]"#,
    )
    .expect("Failed to write records");
    let output_path = temp_dir.path().join("out").join("queues.pptx");

    let output = run_command(&[
        "build",
        "-i",
        input.to_str().unwrap(),
        "-o",
        output_path.to_str().unwrap(),
        "--template",
        "blank",
    ]);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(output_path.exists(), "PPTX file was not created");

    let inspect = run_command(&["inspect", "-i", output_path.to_str().unwrap()]);
    assert!(inspect.status.success(), "Command failed: {:?}", inspect);
    let stdout = String::from_utf8_lossy(&inspect.stdout);
    assert!(stdout.contains("Slide 1:"));
    assert!(stdout.contains("Queues"));
    assert!(stdout.contains("Dequeue: take from the front"));
}

#[test]
fn test_parse_command_prints_slide_records() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let input = temp_dir.path().join("outline.txt");
    fs::write(
        &input,
        "**Topic:** Recursion\n1. **Base case**: stopping condition\n   * nested detail\n",
    )
    .expect("Failed to write outline");

    let output = run_command(&["parse", "-i", input.to_str().unwrap()]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let slides: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Output is not JSON");
    assert_eq!(slides[0]["kind"], "title");
    assert_eq!(slides[0]["title"], "Recursion");
    assert_eq!(slides[1]["kind"], "content");
    assert_eq!(slides[1]["title"], "Base case");
    assert_eq!(slides[1]["bullets"][1]["text"], "nested detail");
    assert_eq!(slides[1]["bullets"][1]["level"], 1);
}

#[test]
fn test_generate_without_text_key_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output_path = temp_dir.path().join("deck.pptx");

    let output = run_command(&["generate", "recursion", "-o", output_path.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("GEMINI_API_KEY"), "Unexpected stderr: {}", stderr);
    assert!(!output_path.exists());
}
