use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use plotdiff_rs::raster::{gerbv_installed, GerbvRasterizer};
use plotdiff_rs::tile::DEFAULT_MAX_PIXELS;
use plotdiff_rs::{gerbers_equivalent, images_match, svgs_equivalent, text_files_match};

/// plotdiff: compare plotted CAD documents against golden references
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rasterize two SVG documents and compare the renders
    Svg {
        /// Path to the generated SVG
        generated: PathBuf,
        /// Path to the golden reference SVG
        source: PathBuf,
        /// Comparison resolution in dots per inch
        #[clap(long, default_value_t = 96)]
        dpi: u32,
    },
    /// Rasterize two gerber documents tile by tile with gerbv and compare
    Gerber {
        /// Path to the generated gerber
        generated: PathBuf,
        /// Path to the golden reference gerber
        source: PathBuf,
        /// Comparison resolution in dots per inch
        #[clap(long)]
        dpi: u32,
        /// Render window origin in inches, formatted as <x>x<y>
        #[clap(long)]
        origin: Pair,
        /// Render window size in inches, formatted as <w>x<h>
        #[clap(long)]
        window: Pair,
        /// Decoded-pixel budget for a single tile pass
        #[clap(long, default_value_t = DEFAULT_MAX_PIXELS)]
        max_pixels: u64,
    },
    /// Compare two PNG images directly
    Image {
        a: PathBuf,
        b: PathBuf,
    },
    /// Diff two text files, optionally skipping leading header lines
    Text {
        golden: PathBuf,
        new: PathBuf,
        /// Number of leading lines to drop from both files
        #[clap(long, default_value_t = 0)]
        skip: usize,
    },
    /// Report whether the external rasterization tools are available
    CheckTools,
}

/// An `<x>x<y>` pair of inches, e.g. `-1.00x0.50`.
#[derive(Debug, Clone, Copy)]
struct Pair {
    x: f64,
    y: f64,
}

impl FromStr for Pair {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once('x')
            .ok_or_else(|| format!("expected <x>x<y>, got \"{s}\""))?;
        Ok(Pair {
            x: x.parse().map_err(|_| format!("invalid number \"{x}\""))?,
            y: y.parse().map_err(|_| format!("invalid number \"{y}\""))?,
        })
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(err) => {
            eprintln!("Error: {err:#}");
            process::exit(2);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<bool> {
    match cli.command {
        Command::Svg {
            generated,
            source,
            dpi,
        } => {
            let equal = svgs_equivalent(&generated, &source, dpi)
                .with_context(|| format!("Failed to compare {}", generated.display()))?;
            report(equal);
            Ok(equal)
        }
        Command::Gerber {
            generated,
            source,
            dpi,
            origin,
            window,
            max_pixels,
        } => {
            let rasterizer = GerbvRasterizer::new();
            let equal = gerbers_equivalent(
                &rasterizer,
                &generated,
                &source,
                dpi,
                (origin.x, origin.y),
                (window.x, window.y),
                max_pixels,
            )
            .with_context(|| format!("Failed to compare {}", generated.display()))?;
            report(equal);
            Ok(equal)
        }
        Command::Image { a, b } => {
            let equal = images_match(&a, &b)
                .with_context(|| format!("Failed to compare {}", a.display()))?;
            report(equal);
            Ok(equal)
        }
        Command::Text { golden, new, skip } => {
            let equal = text_files_match(&golden, &new, skip)
                .with_context(|| format!("Failed to diff {}", golden.display()))?;
            report(equal);
            Ok(equal)
        }
        Command::CheckTools => {
            let found = gerbv_installed();
            println!("gerbv: {}", if found { "found" } else { "not found" });
            Ok(found)
        }
    }
}

fn report(equal: bool) {
    println!("{}", if equal { "equivalent" } else { "not equivalent" });
}
