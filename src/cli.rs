// ============================================================================
// EditFE CLI — headless batch editing via command-line arguments
// ============================================================================
//
// Usage examples:
//   editfe --input photo.png --plan edits.json --output result.png
//   editfe -i photo.jpg -o out.png                    (format inferred from output ext)
//   editfe -i *.jpg --plan adjust.json --output-dir processed/ --format png
//   editfe -i a.png b.png c.png --output-dir out/
//
// An edit plan is a JSON array of operations, the same records the editor
// keeps in its operation log. Each input is loaded, the plan replayed against
// it, and the result encoded to the target format.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::io::{self, SaveFormat};
use crate::ops::{EditOp, WatermarkSource};
use crate::pipeline::Pipeline;
use crate::session::SessionStore;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// EditFE headless image editor.
///
/// Replay edit plans on image files and convert between formats.
#[derive(Parser, Debug)]
#[command(
    name = "editfe",
    about = "EditFE headless batch image editor",
    long_about = "Replay JSON edit plans on image files and convert between formats.\n\
                  Supports PNG, JPEG, WEBP and multi-page GIF documents as input,\n\
                  and PNG, JPEG, WEBP, BMP as output.\n\n\
                  Example:\n  \
                  editfe --input photo.png --plan edits.json --output result.png\n  \
                  editfe -i *.jpg --plan adjust.json --output-dir out/ --format png"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    /// Multi-page GIF documents are expanded to one output per page.
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// JSON edit plan to replay on each input image.
    /// If omitted, images are only loaded and re-saved (useful for format conversion).
    #[arg(short, long, value_name = "PLAN.json")]
    pub plan: Option<PathBuf>,

    /// Output file path. Only valid for single-file input.
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    /// Files are written here with the original stem and the target format's extension.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: png, jpeg, webp, bmp.
    /// When omitted, the format is inferred from --output's extension, defaulting to png.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// JPEG quality (1-100, default 90).
    #[arg(short, long, default_value_t = 90, value_name = "1-100")]
    pub quality: u8,

    /// Font family for text watermarks (default: first available sans-serif).
    #[arg(long, value_name = "FAMILY")]
    pub font: Option<String>,

    /// Print per-operation and per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    // Resolve glob patterns / literal paths into concrete PathBufs
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

    let save_format = parse_format(args.format.as_deref(), args.output.as_deref());

    // Parse and validate the edit plan up front; a bad plan fails the whole
    // run before any file is touched.
    let plan: Vec<EditOp> = match &args.plan {
        Some(path) => match load_plan(path) {
            Ok(ops) => ops,
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => Vec::new(),
    };

    // Only go font hunting when the plan actually renders text.
    let pipeline = if plan_needs_font(&plan) {
        let font = match &args.font {
            Some(family) => crate::ops::watermark::load_system_font(family),
            None => crate::ops::watermark::load_default_font(),
        };
        match font {
            Some(f) => Pipeline::with_font(f),
            None => {
                eprintln!("error: no usable font found for text watermarks.");
                return ExitCode::FAILURE;
            }
        }
    } else {
        Pipeline::new()
    };

    // Create output directory if specified
    if let Some(dir) = &args.output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "error: could not create output directory '{}': {}",
                dir.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;
    log_info!(
        "cli: {} input file(s), format {}, quality {}",
        total,
        save_format.extension(),
        args.quality
    );

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
                eprintln!(
                    "  error: cannot determine output path for '{}'.",
                    input_path.display()
                );
                any_failure = true;
                continue;
            }
        };

        match run_one(
            input_path,
            &output_path,
            &plan,
            &pipeline,
            save_format,
            args.quality,
            args.verbose,
        ) {
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
                log_err!("cli: {}: {}", input_path.display(), e);
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
    plan: &[EditOp],
    pipeline: &Pipeline,
    format: SaveFormat,
    quality: u8,
    verbose: bool,
) -> Result<(), String> {
    // -- Step 1: Load ----------------------------------------------------
    let mut session = SessionStore::new();
    let ids = session
        .add_file(input)
        .map_err(|e| format!("load failed: {}", e))?;
    let multi_page = ids.len() > 1;

    // -- Step 2: Replay the plan on every asset (one per document page) --
    // The plan goes straight through the pipeline. Batch replay is not an
    // interactive editing session; the undo log and its capacity bound are
    // never involved, so plans of any length apply in full.
    for (page_idx, id) in ids.iter().enumerate() {
        let original = session
            .get(*id)
            .ok_or_else(|| "asset missing after ingest".to_string())?
            .decode()
            .map_err(|e| format!("decode failed: {}", e))?;

        if verbose {
            for op in plan {
                println!("  [plan] {}", op.describe());
            }
        }
        let edited = pipeline
            .replay(&original, plan)
            .map_err(|e| format!("replay failed: {}", e))?;

        // -- Step 3: Save ------------------------------------------------
        let page_output = if multi_page {
            page_output_path(output, page_idx + 1)
        } else {
            output.to_path_buf()
        };
        io::encode_and_write(&edited, &page_output, format, quality)
            .map_err(|e| format!("save failed: {}", e))?;
    }

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Read and parse a JSON edit plan, validating every operation.
fn load_plan(path: &Path) -> Result<Vec<EditOp>, String> {
    let src = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read plan '{}': {}", path.display(), e))?;
    let ops: Vec<EditOp> = serde_json::from_str(&src)
        .map_err(|e| format!("invalid plan '{}': {}", path.display(), e))?;
    for op in &ops {
        op.validate()
            .map_err(|e| format!("invalid plan '{}': {}", path.display(), e))?;
    }
    Ok(ops)
}

fn plan_needs_font(plan: &[EditOp]) -> bool {
    plan.iter().any(|op| {
        matches!(
            op,
            EditOp::Watermark(wm) if matches!(wm.source, WatermarkSource::Text { .. })
        )
    })
}

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            // Literal path
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
                    log_warn!("cli: pattern '{}' matched no files", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
                log_warn!("cli: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Choose the [`SaveFormat`] from the `--format` string or infer it from the
/// output file extension. Defaults to PNG when neither is known.
fn parse_format(format_arg: Option<&str>, output: Option<&Path>) -> SaveFormat {
    if let Some(f) = format_arg {
        return SaveFormat::parse(f).unwrap_or(SaveFormat::Png);
    }

    if let Some(out) = output {
        let ext = out.extension().and_then(|e| e.to_str()).unwrap_or("");
        return SaveFormat::parse(ext).unwrap_or(SaveFormat::Png);
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

/// Insert a page number before the extension: `out.png` → `out_p2.png`.
fn page_output_path(output: &Path, page: usize) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());
    let ext = output
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = if ext.is_empty() {
        format!("{}_p{}", stem, page)
    } else {
        format!("{}_p{}.{}", stem, page, ext)
    };
    output.with_file_name(name)
}
