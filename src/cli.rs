// ============================================================================
// glitchlab CLI — headless batch rendering via command-line arguments
// ============================================================================
//
// Usage examples:
//   glitchlab --input photo.png --settings glitch.json --output result.png
//   glitchlab -i photo.jpg -o out.png                  (no settings = plain convert)
//   glitchlab -i "shots/*.jpg" --settings glitch.json --output-dir processed/ --format png
//   glitchlab -i photo.png -s glitch.json -o out.png --save-settings normalized.json
//
// All processing runs synchronously on the current thread; each input is
// loaded, rendered through the full filter pipeline, and encoded.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::compositor;
use crate::io::{encode_and_write, load_image, SaveFormat};
use crate::settings;
use crate::state::EffectStates;
use crate::{log_err, log_info};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// glitchlab headless renderer.
///
/// Apply a saved glitch-filter configuration to image files — no GUI required.
#[derive(Parser, Debug)]
#[command(
    name = "glitchlab",
    about = "glitchlab headless batch renderer",
    long_about = "Render images through a saved glitch-filter configuration and convert\n\
                  between formats without opening a front-end. Supports PNG, JPEG, WEBP,\n\
                  BMP and TGA output.\n\n\
                  Example:\n  \
                  glitchlab --input photo.png --settings glitch.json --output result.png\n  \
                  glitchlab -i \"*.jpg\" -s glitch.json --output-dir out/ --format png"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Settings document (JSON) describing the enabled filters.
    /// If omitted, images are only loaded and re-saved (useful for format
    /// conversion).
    #[arg(short, long, value_name = "SETTINGS.json")]
    pub settings: Option<PathBuf>,

    /// Output file path. Only valid for single-file input.
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    /// Files are written here with the original stem and the target format's
    /// extension.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: png, jpeg, webp, bmp, tga.
    /// When omitted, the format is inferred from --output's extension,
    /// defaulting to png.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// JPEG quality (1–100, default 90).
    #[arg(short, long, default_value_t = 90, value_name = "1-100")]
    pub quality: u8,

    /// Re-emit the normalized settings document (enabled filters only, every
    /// declared key present) to this path after loading.
    #[arg(long, value_name = "FILE")]
    pub save_settings: Option<PathBuf>,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    // Resolve glob patterns / literal paths → concrete PathBufs
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    // Multiple inputs require --output-dir, not --output
    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let save_format = resolve_format(args.format.as_deref(), args.output.as_deref());

    // Load the settings document up front: a malformed document aborts the
    // whole run before any file is touched.
    let states = match &args.settings {
        Some(path) => match settings::load_settings(path) {
            Ok(states) => {
                log_info!("settings loaded from {}", path.display());
                states
            }
            Err(e) => {
                eprintln!("error: could not load settings '{}': {}", path.display(), e);
                log_err!("settings load failed: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => EffectStates::defaults(),
    };

    // Optionally re-emit the normalized document.
    if let Some(path) = &args.save_settings {
        if let Err(e) = settings::save_settings(&states, path) {
            eprintln!("error: could not write settings '{}': {}", path.display(), e);
            return ExitCode::FAILURE;
        }
        if args.verbose {
            println!("settings → {}", path.display());
        }
    }

    // Create output directory if specified
    if let Some(dir) = &args.output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("error: could not create output directory '{}': {}", dir.display(), e);
            return ExitCode::FAILURE;
        }
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }

        let file_start = Instant::now();

        let output_path = match build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            save_format,
        ) {
            Some(p) => p,
            None => {
                eprintln!("  error: cannot determine output path for '{}'.", input_path.display());
                any_failure = true;
                continue;
            }
        };

        match run_one(input_path, &output_path, &states, save_format, args.quality) {
            Ok(()) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                log_err!("{}: {}", input_path.display(), e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(
    input: &Path,
    output: &Path,
    states: &EffectStates,
    format: SaveFormat,
    quality: u8,
) -> Result<(), String> {
    // -- Step 1: Load ----------------------------------------------------
    let base = load_image(input).map_err(|e| format!("load failed: {}", e))?;
    log_info!("loaded {} ({}x{})", input.display(), base.width(), base.height());

    // -- Step 2: Render --------------------------------------------------
    let frame = compositor::render(&base, states);

    // -- Step 3: Save ----------------------------------------------------
    encode_and_write(&frame, output, format, quality).map_err(|e| format!("save failed: {}", e))?;
    log_info!("wrote {}", output.display());

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            // Literal path — use directly
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        // Treat as glob pattern
        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Choose the [`SaveFormat`] from the `--format` string or infer it from the
/// output file extension. Defaults to PNG when neither is known.
fn resolve_format(format_arg: Option<&str>, output: Option<&Path>) -> SaveFormat {
    if let Some(f) = format_arg {
        return SaveFormat::from_name(f);
    }
    if let Some(out) = output {
        return SaveFormat::from_path(out);
    }
    SaveFormat::Png
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: same directory as input, same stem, new extension
///    (appends `_out` to stem if it would collide with the input path)
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: SaveFormat,
) -> Option<PathBuf> {
    // Explicit output path
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let ext = format.extension();
    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.{}", stem, ext)));
    }

    // Write next to the input file
    let parent = input.parent().unwrap_or(Path::new("."));
    let candidate = parent.join(format!("{}.{}", stem, ext));

    // Avoid silent overwrite of the input
    if candidate == input {
        Some(parent.join(format!("{}_out.{}", stem, ext)))
    } else {
        Some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_prefers_explicit_output() {
        let p = build_output_path(
            Path::new("a/in.png"),
            Some(Path::new("b/out.png")),
            Some(Path::new("dir")),
            SaveFormat::Png,
        );
        assert_eq!(p, Some(PathBuf::from("b/out.png")));
    }

    #[test]
    fn output_path_uses_output_dir_with_format_extension() {
        let p = build_output_path(Path::new("a/in.png"), None, Some(Path::new("dir")), SaveFormat::Jpeg);
        assert_eq!(p, Some(PathBuf::from("dir/in.jpg")));
    }

    #[test]
    fn output_path_never_overwrites_the_input() {
        let p = build_output_path(Path::new("a/in.png"), None, None, SaveFormat::Png);
        assert_eq!(p, Some(PathBuf::from("a/in_out.png")));

        let q = build_output_path(Path::new("a/in.jpg"), None, None, SaveFormat::Png);
        assert_eq!(q, Some(PathBuf::from("a/in.png")));
    }

    #[test]
    fn format_resolution_precedence() {
        assert_eq!(resolve_format(Some("webp"), Some(Path::new("x.png"))), SaveFormat::Webp);
        assert_eq!(resolve_format(None, Some(Path::new("x.tga"))), SaveFormat::Tga);
        assert_eq!(resolve_format(None, None), SaveFormat::Png);
    }
}
