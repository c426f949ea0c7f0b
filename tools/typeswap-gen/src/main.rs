// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! typeswap-gen - structure header and endian swap generator
//!
//! # Usage
//!
//! ```bash
//! # Write <system>_types.h and <system>_types.c into ./generated
//! typeswap-gen generate telemetry.yaml -o generated
//!
//! # Inspect computed offsets and bit-field groups
//! typeswap-gen layout telemetry.yaml --json
//!
//! # Round-trip every structure through its swap plans
//! typeswap-gen verify telemetry.yaml
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use typeswap::swap::image::byte_swap;
use typeswap::{Direction, Generator, GeneratorOptions, ProjectConfig, Provenance};

/// Packed structure header and endian swap generator
#[derive(Parser, Debug)]
#[command(name = "typeswap-gen")]
#[command(author = "naskel.com")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate packed C structure headers and endian swap functions")]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the types header and the swap source
    Generate {
        /// Project file (YAML, or JSON by extension)
        file: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Override the <system>_types base name
        #[arg(long)]
        base_name: Option<String>,

        /// User recorded in the banner (default: $USER)
        #[arg(long)]
        user: Option<String>,

        /// Script name recorded in the banner
        #[arg(long, default_value = "typeswap-gen")]
        script: String,
    },

    /// Print computed structure layouts
    Layout {
        /// Project file
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Round-trip a patterned image through every structure's swap plans
    Verify {
        /// Project file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("typeswap=debug,typeswap_gen=debug")
    } else {
        EnvFilter::new("typeswap=info,typeswap_gen=info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Generate {
            file,
            output,
            base_name,
            user,
            script,
        } => cmd_generate(&file, output, base_name, user, script),
        Commands::Layout { file, json } => cmd_layout(&file, json),
        Commands::Verify { file } => cmd_verify(&file),
    };

    if let Err(e) = result {
        eprintln!("[ERROR] {:#}", e);
        std::process::exit(1);
    }
}

fn load(file: &Path, mut options: GeneratorOptions) -> Result<Generator> {
    let config = ProjectConfig::from_file(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;

    if options.banner_template.is_none() {
        options.banner_template = config.banner_template.clone();
    }
    if let Some(provenance) = options.provenance.as_mut() {
        if provenance.project.is_empty() {
            provenance.project = config.project.clone();
        }
    }

    let project = config
        .into_project()
        .context("Failed to build project")?;
    Ok(Generator::new(project, options)?)
}

fn cmd_generate(
    file: &Path,
    output: PathBuf,
    base_name: Option<String>,
    user: Option<String>,
    script: String,
) -> Result<()> {
    let user = user
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_default();
    let options = GeneratorOptions {
        output_dir: output,
        base_name,
        provenance: Some(
            Provenance::new(String::new())
                .with_user(user)
                .with_script(script),
        ),
        banner_template: None,
    };

    tracing::info!("Generating from {}", file.display());
    let generator = load(file, options)?;
    let report = generator.write()?;
    report.summary();

    if !report.is_success() {
        bail!("{} artifact(s) could not be written", report.failures.len());
    }
    Ok(())
}

fn cmd_layout(file: &Path, json: bool) -> Result<()> {
    let generator = load(file, GeneratorOptions::default())?;

    if json {
        println!("{}", serde_json::to_string_pretty(generator.layouts())?);
        return Ok(());
    }

    for layout in generator.layouts() {
        println!("{} ({} bytes)", layout.name, layout.total_size);
        for field in &layout.fields {
            let bits = field
                .bit_length
                .map(|b| format!(" bits {}+{}", field.shift, b))
                .unwrap_or_default();
            println!(
                "  [{:>5}] {:<24} {:>6} bytes{}",
                field.offset, field.name, field.size, bits
            );
        }
        for (i, group) in layout.groups.iter().enumerate() {
            println!(
                "  group {}: {} @{} ({}/{} bits)",
                i, group.data_type, group.offset, group.filled_bits, group.capacity
            );
        }
        println!();
    }
    Ok(())
}

fn cmd_verify(file: &Path) -> Result<()> {
    let generator = load(file, GeneratorOptions::default())?;
    let plans = generator.plans();
    let mut failed = 0usize;

    for (index, layout) in generator.layouts().iter().enumerate() {
        let original: Vec<u8> = (0..layout.total_size)
            .map(|i| (i as u8).wrapping_mul(37).wrapping_add(11))
            .collect();
        let mut image = original.clone();

        byte_swap(plans, index, &mut image, Direction::LocalToForeign);
        byte_swap(plans, index, &mut image, Direction::ForeignToLocal);

        if image == original {
            println!("  [OK]   {} ({} bytes)", layout.name, layout.total_size);
        } else {
            failed += 1;
            println!("  [FAIL] {} ({} bytes)", layout.name, layout.total_size);
        }
    }

    for diagnostic in generator.diagnostics() {
        println!("  [WARN] {diagnostic}");
    }

    if failed > 0 {
        bail!("{failed} structure(s) failed the round trip");
    }
    Ok(())
}
