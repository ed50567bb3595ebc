// Bedtime - iterative children's story generator
// Main entry point

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::style::Stylize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::IsTerminal;

use bedtime::config::constants::DEFAULT_AGE;
use bedtime::config::{load_config, ProviderSelection};
use bedtime::logging;
use bedtime::providers::create_provider;
use bedtime::story::{normalize_age, word_count, RunOutcome, RunRequest, StoryEngine};

/// Preset tweaks offered after each story.
const FEEDBACK_PRESETS: &[(&str, &str)] = &[
    (
        "Cozy bedtime vibe",
        "Add more bedtime imagery: warm blankets, hushed voices and sleepy yawns.",
    ),
    (
        "More sensory detail",
        "Describe gentle sounds, smells and textures so the world feels vivid but calm.",
    ),
    (
        "Friendly dialogue",
        "Add a few short lines of dialogue between the characters to show their friendship.",
    ),
    (
        "Clearer lesson",
        "Make the gentle feeling or lesson the characters take home at the end clearer.",
    ),
];

#[derive(Parser, Debug)]
#[command(name = "bedtime", version, about = "Generate safe, age-appropriate bedtime stories")]
struct Cli {
    /// Story idea (prompted for when omitted)
    idea: Vec<String>,

    /// Reader age, 5-10 (anything else falls back to 7)
    #[arg(long)]
    age: Option<i64>,

    /// Preferred tone, e.g. "cozy bedtime" or "gentle humor"
    #[arg(long)]
    tone: Option<String>,

    /// Judge/revise iteration cap
    #[arg(long)]
    max_iterations: Option<u32>,

    /// Text-generation backend: auto, openai or gemini
    #[arg(long)]
    provider: Option<ProviderSelection>,

    /// Print the final session state as JSON
    #[arg(long)]
    json: bool,

    /// Skip the interactive feedback loop
    #[arg(long)]
    no_feedback: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

struct StoryInputs {
    idea: String,
    age: u8,
    tone: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = load_config()?;
    if let Some(provider) = cli.provider {
        config.provider = provider;
    }
    if let Some(max) = cli.max_iterations {
        config.max_iterations = max;
    }
    config.validate()?;

    let provider = create_provider(&config)?;
    let engine = StoryEngine::new(provider, config);

    let interactive = std::io::stdin().is_terminal();
    let mut editor = if interactive {
        Some(DefaultEditor::new().context("Failed to initialise line editor")?)
    } else {
        None
    };

    let inputs = collect_inputs(&cli, editor.as_mut())?;

    let mut request = RunRequest::new(inputs.idea.clone(), inputs.age);
    if let Some(tone) = &inputs.tone {
        request = request.with_tone(tone.clone());
    }

    eprintln!("\n{}", "Generating your story...".dark_grey());
    let mut outcome = engine.run(request).await?;
    render(&outcome, cli.json, &engine)?;

    if cli.json || cli.no_feedback {
        return Ok(());
    }
    let Some(editor) = editor.as_mut() else {
        return Ok(());
    };

    while let Some(feedback) = ask_feedback(editor)? {
        let mut request = RunRequest::new(inputs.idea.clone(), inputs.age)
            .continuing(outcome.state.clone(), Some(feedback));
        if let Some(tone) = &inputs.tone {
            request = request.with_tone(tone.clone());
        }

        eprintln!("\n{}", "Revising your story...".dark_grey());
        outcome = engine.run(request).await?;
        render(&outcome, false, &engine)?;
    }

    Ok(())
}

/// Read a line; `None` on Ctrl-C / Ctrl-D.
fn read_line(editor: &mut DefaultEditor, prompt: &str) -> Result<Option<String>> {
    match editor.readline(prompt) {
        Ok(line) => {
            let line = line.trim().to_string();
            if !line.is_empty() {
                let _ = editor.add_history_entry(line.as_str());
            }
            Ok(Some(line))
        }
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(e) => Err(e).context("Failed to read input"),
    }
}

fn collect_inputs(cli: &Cli, editor: Option<&mut DefaultEditor>) -> Result<StoryInputs> {
    let mut idea = cli.idea.join(" ").trim().to_string();
    let mut age_input = cli.age;
    let mut tone = cli.tone.clone().filter(|t| !t.trim().is_empty());

    if idea.is_empty() {
        let editor = editor.context("No story idea given and stdin is not interactive")?;

        idea = read_line(editor, "What kind of story do you want to hear? ")?
            .filter(|s| !s.is_empty())
            .context("A story idea is required")?;

        if age_input.is_none() {
            let raw = read_line(editor, "What age is this story for? (5-10, default 7): ")?
                .unwrap_or_default();
            if !raw.is_empty() {
                match raw.parse::<i64>() {
                    Ok(age) => age_input = Some(age),
                    Err(_) => {
                        eprintln!("{}", format!("Invalid age, using default: {}", DEFAULT_AGE).yellow());
                    }
                }
            }
        }

        if tone.is_none() {
            tone = read_line(
                editor,
                "Preferred tone (optional, e.g. 'cozy bedtime', 'gentle humor'): ",
            )?
            .filter(|t| !t.is_empty());
        }
    }

    let age = match age_input {
        Some(requested) => {
            let age = normalize_age(requested);
            if i64::from(age) != requested {
                eprintln!(
                    "{}",
                    format!("Age out of range, using default: {}", DEFAULT_AGE).yellow()
                );
            }
            age
        }
        None => DEFAULT_AGE,
    };

    Ok(StoryInputs { idea, age, tone })
}

fn ask_feedback(editor: &mut DefaultEditor) -> Result<Option<String>> {
    println!("\n{}", "Want to tweak the story?".cyan().bold());
    for (i, (label, _)) in FEEDBACK_PRESETS.iter().enumerate() {
        println!("  {} {}", format!("{}.", i + 1).cyan(), label);
    }
    println!(
        "  {} Something else (describe it)",
        format!("{}.", FEEDBACK_PRESETS.len() + 1).cyan()
    );
    println!("  {}", "Press Enter to finish.".dark_grey());

    let Some(choice) = read_line(editor, "> ")? else {
        return Ok(None);
    };
    if choice.is_empty() {
        return Ok(None);
    }

    match choice.parse::<usize>() {
        Ok(n) if (1..=FEEDBACK_PRESETS.len()).contains(&n) => {
            Ok(Some(FEEDBACK_PRESETS[n - 1].1.to_string()))
        }
        Ok(n) if n == FEEDBACK_PRESETS.len() + 1 => {
            Ok(read_line(editor, "What should change? ")?.filter(|s| !s.is_empty()))
        }
        // Free text typed straight at the menu counts as a custom request
        _ => Ok(Some(choice)),
    }
}

fn render(outcome: &RunOutcome, json: bool, engine: &StoryEngine) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(outcome).context("Failed to serialize session")?;
        println!("{}", text);
        return Ok(());
    }

    let Some(story) = outcome.final_story.as_deref() else {
        eprintln!("{}", "Error: no story was generated.".red().bold());
        return Ok(());
    };

    let rule = "═".repeat(60);
    println!("\n{}", rule.as_str().dark_grey());
    println!("{}", "YOUR BEDTIME STORY".bold());
    println!("{}", rule.as_str().dark_grey());
    println!("{}", story);
    println!("{}", rule.as_str().dark_grey());

    print_summary(outcome, story, engine.config().thresholds.dimension);
    Ok(())
}

fn print_summary(outcome: &RunOutcome, story: &str, dimension_threshold: f32) {
    let state = &outcome.state;
    println!(
        "\n{} {} iteration(s), {} words",
        "▸".cyan().bold(),
        state.iteration_count(),
        word_count(story)
    );

    if let Some(result) = &state.judge_result {
        println!("  Overall: {}", format!("{:.1}", result.overall).bold());
        for dim in &result.dimensions {
            let score = format!("{:.1}", dim.score);
            let score = if dim.score >= dimension_threshold { score.green() } else { score.yellow() };
            println!("  {:<18} {}", dim.name.label(), score);
        }
    }

    match state.safety_violation() {
        Some(notes) => println!("  {} {}", "⚠".yellow().bold(), notes),
        None => println!("  {} Safety checks passed", "✓".green()),
    }
}
