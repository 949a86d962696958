use image_editor_core::{config::Config, init, ImageEditor};
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Edit images with natural-language prompts using Gemini", long_about = None)]
struct Args {
    /// Editing instruction, e.g. "add a retro filter"
    #[arg(trailing_var_arg = true)]
    prompt: Vec<String>,

    /// Image to edit. Without it the editor window opens.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Where to write the edited image (default: edited.<ext>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the model defined in .env
    #[arg(short, long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup
    init();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    // Load config and override model if specified via CLI
    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(m) = args.model {
        config.model_name = m;
    }
    if config.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; edits will fail until it is configured");
    }

    let editor = ImageEditor::with_config(config);

    let Some(input) = args.input else {
        tracing::info!(model = %editor.config().model_id(), "opening editor window");
        editor.run_interactive().context("Editor window failed")?;
        return Ok(());
    };

    // If prompt was empty, ask now
    let mut prompt_text = args.prompt.join(" ");
    if prompt_text.trim().is_empty() {
        print!("Describe your edit: ");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        prompt_text = line.trim().to_string();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.green} {msg}")?,
    );
    spinner.set_message(format!("Editing with {}...", editor.config().model_id()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = editor.edit_file(&input, &prompt_text).await;
    spinner.finish_and_clear();

    match result {
        Ok(edited) => {
            let output = args
                .output
                .unwrap_or_else(|| PathBuf::from(format!("edited.{}", edited.extension())));
            let bytes = edited.to_bytes().context("Returned image could not be decoded")?;
            std::fs::write(&output, &bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Edited image saved to {} ({} bytes)", output.display(), bytes.len());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
