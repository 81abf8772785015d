use check_ai_rust::{api, cli, config, error, export, pipeline, scanner};

use api::BackendClient;
use chrono::Local;
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use error::{classify_as_setup_issue, CheckAiError, ProcessingError, Result};
use pipeline::{BatchOptions, Phase, Session};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load()?;
    if let Some(url) = &cli.ollama_url {
        config.ollama_url = url.clone();
    }

    match cli.command {
        Commands::Models => {
            println!("📋 check-ai - available models\n");
            let client = BackendClient::new(&config)?;
            let models = client.fetch_models().await.unwrap_or_else(|e| fail(&e));

            for model in &models {
                match model.size {
                    Some(size) => println!("  {} ({:.1} GB)", model.name, size as f64 / 1e9),
                    None => println!("  {}", model.name),
                }
            }
            println!("\n✔ {} model(s) available", models.len());
        }

        Commands::Analyze {
            inputs,
            models,
            output,
            concurrency,
            recursive,
        } => {
            let session = analyze(&config, &inputs, models, concurrency, recursive, cli.verbose)
                .await
                .unwrap_or_else(|e| fail(&e));

            let output = output.unwrap_or_else(|| PathBuf::from("check_session.json"));
            let json = serde_json::to_string_pretty(&session)?;
            std::fs::write(&output, json)?;
            println!("✔ Session saved: {}", output.display());
            print_summary(&session);
        }

        Commands::Report {
            input,
            output,
            title,
            pdf_quality,
        } => {
            println!("📄 check-ai - report\n");
            let content = std::fs::read_to_string(&input)?;
            let session: Session = serde_json::from_str(&content)?;

            let output = output.unwrap_or_else(|| PathBuf::from("."));
            println!("- Generating PDF... (quality: {})", pdf_quality);
            let path = export::export_report(&session, &output, &title, pdf_quality)
                .unwrap_or_else(|e| fail(&e));
            println!("✔ PDF report: {}", path.display());
        }

        Commands::Run {
            inputs,
            models,
            output,
            concurrency,
            recursive,
            title,
            pdf_quality,
        } => {
            let session = analyze(&config, &inputs, models, concurrency, recursive, cli.verbose)
                .await
                .unwrap_or_else(|e| fail(&e));
            print_summary(&session);

            let output = output.unwrap_or_else(|| PathBuf::from("."));
            println!("- Generating PDF... (quality: {})", pdf_quality);
            let path = export::export_report(&session, &output, &title, pdf_quality)
                .unwrap_or_else(|e| fail(&e));
            println!("✔ PDF report: {}", path.display());
        }

        Commands::Config {
            set_ollama_url,
            set_backend_url,
            show,
        } => {
            let mut config = config;

            if let Some(url) = set_ollama_url {
                config.set_ollama_url(url)?;
                println!("✔ Ollama URL saved");
            }
            if let Some(url) = set_backend_url {
                config.set_backend_url(url)?;
                println!("✔ Backend URL saved");
            }

            if show {
                println!("Configuration:");
                println!("  Backend URL: {}", config.backend_url);
                println!("  Ollama URL:  {}", config.ollama_url);
                println!("  Timeout:     {}s", config.timeout_seconds);
            }
        }
    }

    Ok(())
}

async fn analyze(
    config: &Config,
    inputs: &[PathBuf],
    models: Vec<String>,
    concurrency: usize,
    recursive: bool,
    verbose: bool,
) -> Result<Session> {
    println!("🏦 check-ai - check analysis\n");

    println!("[1/3] Scanning inputs...");
    let images = scanner::collect_images(inputs, recursive)?;
    if images.is_empty() {
        return Err(CheckAiError::NoImagesFound(
            inputs
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        ));
    }
    println!("✔ {} image(s) found\n", images.len());

    let client = BackendClient::new(config)?;
    let mut session = Session::default();

    println!("[2/3] Selecting models...");
    let selected = if models.is_empty() {
        // No explicit choice: the first available model becomes the default.
        let fetch_start = Local::now();
        let list = client.fetch_models().await?;
        session
            .times
            .record(Phase::ModelFetch, fetch_start, Local::now());

        let first = list
            .first()
            .map(|m| m.name.clone())
            .ok_or_else(|| CheckAiError::ModelFetch("no models available on the backend".into()))?;
        println!("✔ Default model: {}\n", first);
        vec![first]
    } else {
        println!("✔ {} model(s) selected\n", models.len());
        models
    };

    if concurrency > 1 {
        println!("[3/3] Processing checks... (concurrency {})", concurrency);
    } else {
        println!("[3/3] Processing checks...");
    }
    let options = BatchOptions {
        concurrency,
        verbose,
        progress: true,
    };
    pipeline::process_batch(&client, &images, &selected, &mut session, &options).await?;

    match &session.error {
        Some(error) => print_failure(&error.step, &error.message),
        None => println!("✔ Batch complete\n"),
    }

    Ok(session)
}

fn print_summary(session: &Session) {
    println!(
        "\n✅ {} check(s) analyzed{}",
        session.results.len(),
        match &session.error {
            Some(error) => format!(" (last error: [{}] {})", error.step, error.message),
            None => String::new(),
        }
    );
}

/// Generic alert line, or the dedicated setup-instructions panel when the
/// message points at missing OCR tooling on the backend host.
fn print_failure(step: &str, message: &str) {
    if classify_as_setup_issue(message) {
        println!("\n⚠ OCR setup incomplete");
        println!("  The backend could not run its OCR tooling. On the backend host:");
        println!("  1. Install the Tesseract engine (e.g. apt install tesseract-ocr)");
        println!("  2. Install the Python bindings: pip install pytesseract easyocr");
        println!("  3. Restart the backend, then try again");
        println!("\n  Backend said: {}", message);
    } else {
        println!("\n❌ [{}] {}", step, message);
    }
}

fn fail(err: &CheckAiError) -> ! {
    let surfaced = ProcessingError::from(err);
    print_failure(&surfaced.step, &surfaced.message);
    std::process::exit(1);
}
