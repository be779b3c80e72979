// All core functionality is in docoutline-core
// This CLI acts as a thin wrapper around the core library

use clap::Parser;
use std::path::Path;

// Re-export core types for convenience
pub use docoutline_core::*;

#[derive(Parser, Debug)]
#[command(name = "docoutline")]
#[command(about = "Rebuild a document outline from extracted page blocks")]
pub struct Args {
    /// Path to the extracted document (JSON pages)
    #[arg(short, long)]
    pub input: Option<String>,

    /// Path to custom rule file (YAML format)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output file path (if not specified, auto-generated based on input)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Output format: outline, toc, or flat
    #[arg(short = 'f', long, default_value = "outline")]
    pub output_format: String,

    /// Header band as a fraction of page height
    #[arg(long)]
    pub header_size: Option<f64>,

    /// Footer band as a fraction of page height
    #[arg(long)]
    pub footer_size: Option<f64>,

    /// Jitter allowance when testing block/image/table overlap
    #[arg(long)]
    pub overlap_tolerance: Option<f64>,

    /// Pages fed to section reconstruction, e.g. "3-" (default: all)
    #[arg(long)]
    pub main_pages: Option<String>,

    /// Pages classified but kept out of the outline, e.g. "1,40-42"
    #[arg(long)]
    pub exclude_pages: Option<String>,

    /// Pages holding the document's own table of contents
    #[arg(long)]
    pub toc_pages: Option<String>,

    /// Division active at the start of the document
    #[arg(long)]
    pub division: Option<String>,

    /// Enable detailed profiling of all pipeline steps
    #[arg(long)]
    pub profile: bool,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Args {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            initial_division: self.division.clone(),
            header_size: self.header_size,
            footer_size: self.footer_size,
            overlap_tolerance: self.overlap_tolerance,
            main_pages: self.main_pages.clone(),
            exclude_pages: self.exclude_pages.clone(),
            toc_pages: self.toc_pages.clone(),
        }
    }

    /// Rule file (or built-in rules) with command-line values applied on top
    pub fn effective_config(&self) -> Result<OutlineConfig, ConfigError> {
        Ok(OutlineConfig::load(self.config.as_deref())?.merged(&self.overrides()))
    }

    pub fn output_path(&self, input: &str) -> String {
        if let Some(output) = &self.output {
            return output.clone();
        }
        let input_name = Path::new(input)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        let config_suffix = self
            .config
            .as_ref()
            .and_then(|p| Path::new(p).file_stem())
            .and_then(|s| s.to_str())
            .map(|s| format!("_{s}"))
            .unwrap_or_default();
        format!("{input_name}{config_suffix}_outline.json")
    }
}
