use anyhow::Result;
use clap::Parser;
use std::collections::BTreeSet;
use std::path::Path;

use docoutline::{Args, Diagnostic, Outline, OutlineProcessor};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    println!("🦀 Docoutline Outline Builder");

    let config = match args.effective_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Could not load configuration: {e}");
            std::process::exit(1);
        }
    };

    if args.show_config {
        print!("{}", config.to_yaml_string()?);
        return Ok(());
    }

    if let Some(config_path) = &args.config {
        println!("📋 Loaded rules from: {}", config_path);
    } else {
        println!("📋 Using built-in rules");
    }

    // Rules are resolved before the document is read
    let processor = match OutlineProcessor::new(config) {
        Ok(processor) => processor,
        Err(e) => {
            eprintln!("❌ Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let Some(input) = args.input.as_deref() else {
        eprintln!("❌ No input given. Use --input <document.json>");
        std::process::exit(2);
    };
    if !Path::new(input).exists() {
        eprintln!("⚠️  Input document not found at: {}", input);
        std::process::exit(1);
    }

    println!("📄 Processing: {}", input);
    match processor.process_file(input, args.profile) {
        Ok(outline) => {
            println!("✅ Successfully processed document");
            println!("📊 Outline metrics:");
            println!("   - Pages: {}", outline.metadata.page_count);
            println!("   - Sections: {}", outline.sections.len());
            println!("   - TOC entries: {}", outline.toc_entries.len());
            let flagged: BTreeSet<u32> = outline.diagnostics.iter().map(Diagnostic::page).collect();
            println!(
                "   - Diagnostics: {} (on {} pages)",
                outline.diagnostics.len(),
                flagged.len()
            );

            let output_path = args.output_path(input);
            save_outline(&outline, &output_path, &args.output_format)?;
        }
        Err(e) => {
            eprintln!("❌ Processing failed: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn save_outline(outline: &Outline, output_path: &str, format: &str) -> Result<()> {
    outline.save_with_format(output_path, format)?;

    match format {
        "toc" => println!("💾 Table of contents saved to: {}", output_path),
        "flat" => println!("💾 Flat format results saved to: {}", output_path),
        _ => println!("💾 Outline saved to: {}", output_path),
    }

    Ok(())
}
