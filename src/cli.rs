use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "check-ai")]
#[command(about = "Check image OCR + local LLM analysis client with PDF reporting", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the Ollama URL for this invocation (without persisting it)
    #[arg(long, global = true)]
    pub ollama_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List Ollama models available through the backend
    Models,

    /// Analyze check images and save the session JSON
    Analyze {
        /// Image files or folders containing check images
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Model to run (repeatable); defaults to the first available model
        #[arg(short, long = "model")]
        models: Vec<String>,

        /// Output session file (default: check_session.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// In-flight upload limit (1 = strictly sequential)
        #[arg(long, default_value = "1")]
        concurrency: usize,

        /// Scan subfolders recursively
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// Render a session JSON into a PDF report
    Report {
        /// Input session file
        #[arg(required = true)]
        input: PathBuf,

        /// Output file or directory (default: timestamped name in the
        /// current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Document title
        #[arg(short, long, default_value = "Check Analysis Report")]
        title: String,

        /// Embedded image quality (high/medium/low)
        #[arg(long, default_value = "medium")]
        pdf_quality: PdfQuality,
    },

    /// Analyze and render the report in one step
    Run {
        /// Image files or folders containing check images
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Model to run (repeatable); defaults to the first available model
        #[arg(short, long = "model")]
        models: Vec<String>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// In-flight upload limit (1 = strictly sequential)
        #[arg(long, default_value = "1")]
        concurrency: usize,

        /// Scan subfolders recursively
        #[arg(short = 'r', long)]
        recursive: bool,

        /// Document title
        #[arg(short, long, default_value = "Check Analysis Report")]
        title: String,

        /// Embedded image quality (high/medium/low)
        #[arg(long, default_value = "medium")]
        pdf_quality: PdfQuality,
    },

    /// Show or edit configuration
    Config {
        /// Persist a new Ollama URL
        #[arg(long)]
        set_ollama_url: Option<String>,

        /// Persist a new backend URL
        #[arg(long)]
        set_backend_url: Option<String>,

        /// Show the current configuration
        #[arg(long)]
        show: bool,
    },
}

/// Embedded-image quality presets for the report.
#[derive(Clone, Copy, Debug, Default)]
pub enum PdfQuality {
    /// 1400px, 85%
    High,
    /// 800px, 75%
    #[default]
    Medium,
    /// 500px, 60%
    Low,
}

impl PdfQuality {
    /// Max pixel width before downscaling
    pub fn max_width(&self) -> u32 {
        match self {
            PdfQuality::High => 1400,
            PdfQuality::Medium => 800,
            PdfQuality::Low => 500,
        }
    }

    /// JPEG quality (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            PdfQuality::High => 85,
            PdfQuality::Medium => 75,
            PdfQuality::Low => 60,
        }
    }
}

impl std::str::FromStr for PdfQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" | "h" => Ok(PdfQuality::High),
            "medium" | "med" | "m" => Ok(PdfQuality::Medium),
            "low" | "l" => Ok(PdfQuality::Low),
            _ => Err(format!("Unknown quality: {}. Use high, medium, or low", s)),
        }
    }
}

impl std::fmt::Display for PdfQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PdfQuality::High => write!(f, "high"),
            PdfQuality::Medium => write!(f, "medium"),
            PdfQuality::Low => write!(f, "low"),
        }
    }
}
