//! The `examscore init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("examscore.toml").exists() {
        println!("examscore.toml already exists, skipping.");
    } else {
        std::fs::write("examscore.toml", SAMPLE_CONFIG)?;
        println!("Created examscore.toml");
    }

    std::fs::create_dir_all("data")?;
    let sample_path = std::path::Path::new("data/sample-questions.toml");
    if sample_path.exists() {
        println!("data/sample-questions.toml already exists, skipping.");
    } else {
        std::fs::write(sample_path, SAMPLE_QUESTIONS)?;
        println!("Created data/sample-questions.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: examscore validate --questions data/sample-questions.toml");
    println!("  2. Export a session's response log as JSON");
    println!(
        "  3. Run: examscore score --questions data/sample-questions.toml --responses <log.json> --participant <id>"
    );

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examscore configuration

# Tolerance for numerical questions that don't set their own.
default_numerical_tolerance = 0.01

# Chapter accuracy bands: >= strength is a strength, < weakness is a weakness.
strength_threshold = 0.70
weakness_threshold = 0.40

# Bucket name for questions missing a subject, chapter, topic, etc.
unclassified_label = "unclassified"
"#;

const SAMPLE_QUESTIONS: &str = r#"[exam]
id = "sample"
name = "Sample Paper"
description = "A small paper covering every question type"

[[questions]]
id = "phy-1"
type = "single_choice"
correct_option_labels = ["B"]
positive_marks = 4.0
negative_marks = 1.0
subject = "Physics"
chapter = "Kinematics"
topic = "Projectile motion"
difficulty = "easy"
section_id = "A"

[[questions]]
id = "chem-1"
type = "multi_choice"
correct_option_labels = ["A", "C"]
positive_marks = 4.0
negative_marks = 2.0
subject = "Chemistry"
chapter = "Chemical bonding"
difficulty = "medium"
section_id = "A"

[[questions]]
id = "math-1"
type = "numerical"
numerical_answer = 2.5
numerical_tolerance = 0.01
positive_marks = 4.0
negative_marks = 0.0
subject = "Mathematics"
chapter = "Definite integrals"
difficulty = "hard"
section_id = "B"
"#;
