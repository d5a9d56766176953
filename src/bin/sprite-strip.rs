use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use tracing::{info, warn, Level};

use sprite_strip::{
    default_output_path, parse_hex_color, row_output_path, Alignment, AlignmentStrategy,
    MattingStrategy, PipelineOptions, ProcessResult, ScaleMode, SpritePipeline,
    DEFAULT_FRAME_COUNT,
};

/// Name fragments that mark an asset as stationary.
const STATIONARY_KEYWORDS: &[&str] = &[
    "trap", "wall", "decor", "effect", "static", "item", "bush", "tree", "rock",
];

#[derive(Parser)]
#[command(
    name = "sprite-strip",
    about = "Turn AI-generated animation strips into clean sprite sheets",
    version,
    after_help = "Simple usage: sprite-strip <strip.png>  (writes <strip>_4f.png next to it)\n\n\
                  Stationary assets (trap, wall, decor, effect, static, item, bush, tree, rock)\n\
                  are bottom-aligned with unified geometry; everything else is treated as mobile."
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input strip image or directory of strips
    input: PathBuf,

    /// Output file, or output directory for batch and multi-row runs
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Asset name used for auto-configuration (default: input file stem)
    #[arg(short, long)]
    name: Option<String>,

    /// Frames per row
    #[arg(short, long, default_value_t = DEFAULT_FRAME_COUNT)]
    frames: u32,

    /// Rows of frames stacked in the image
    #[arg(short, long, default_value_t = 1)]
    rows: u32,

    /// Comma-separated names for each row (e.g. "walk_down,walk_up")
    #[arg(long)]
    row_names: Option<String>,

    /// Hex colour of the guide lines between frames (e.g. "#FF00FF")
    #[arg(short, long)]
    guide_color: Option<String>,

    /// Scaling: "content" or "canvas"
    #[arg(long)]
    scale_mode: Option<ScaleMode>,

    /// Entity type (default: inferred from the name)
    #[arg(short = 't', long = "type", value_enum)]
    entity_type: Option<EntityType>,

    /// Vertical alignment: "center", "bottom" or "top" (default: from entity type).
    /// Independent frames are always centred.
    #[arg(short, long)]
    align: Option<Alignment>,

    /// Cross-frame geometry: "independent" or "unified" (default: from entity type)
    #[arg(long)]
    strategy: Option<AlignmentStrategy>,

    /// Output cell size in pixels
    #[arg(short = 's', long, default_value_t = 64)]
    output_size: u32,

    /// Pixel-art stylization, with an optional factor (default: 4)
    #[arg(short, long, num_args = 0..=1, default_missing_value = "4")]
    pixelate: Option<u32>,

    /// Opaque islands smaller than this are removed
    #[arg(long, default_value_t = 20)]
    min_island_size: usize,

    /// Brightness below which edge pixels count as dark fringing (0 disables)
    #[arg(long, default_value_t = 50)]
    gray_threshold: u8,

    /// Rows cleared at the top and bottom of each frame
    #[arg(long, default_value_t = 0)]
    edge_strip: u32,

    /// Background removal: "flood" or "sampled"
    #[arg(long, default_value = "flood")]
    matting: MattingStrategy,

    /// Keep dark separator columns instead of clearing them
    #[arg(long)]
    keep_grid_lines: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EntityType {
    /// Props, traps and effects that stay in place
    Stationary,
    /// Characters and enemies whose silhouette moves
    Mobile,
}

/// Layout settings resolved from explicit flags and the asset name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AutoConfig {
    entity: EntityType,
    alignment: Alignment,
    strategy: AlignmentStrategy,
    mode: ScaleMode,
}

/// Fill in unset layout flags from the asset name. Explicit flags always win.
fn auto_config(
    name: &str,
    entity: Option<EntityType>,
    alignment: Option<Alignment>,
    strategy: Option<AlignmentStrategy>,
    mode: Option<ScaleMode>,
) -> AutoConfig {
    let lower = name.to_lowercase();
    let entity = entity.unwrap_or_else(|| {
        if STATIONARY_KEYWORDS.iter().any(|k| lower.contains(k)) {
            EntityType::Stationary
        } else {
            EntityType::Mobile
        }
    });

    let (default_alignment, default_strategy) = match entity {
        EntityType::Stationary => (Alignment::Bottom, AlignmentStrategy::Unified),
        EntityType::Mobile => (Alignment::Center, AlignmentStrategy::Independent),
    };

    AutoConfig {
        entity,
        alignment: alignment.unwrap_or(default_alignment),
        strategy: strategy.unwrap_or(default_strategy),
        mode: mode.unwrap_or_default(),
    }
}

/// Row suffixes: the given names first, then `row{i}` for any left over.
fn row_suffixes(names: Option<&str>, rows: u32) -> Vec<String> {
    let given: Vec<String> = names
        .map(|n| n.split(',').map(|s| s.trim().to_string()).collect())
        .unwrap_or_default();
    (0..rows as usize)
        .map(|i| {
            given
                .get(i)
                .filter(|s| !s.is_empty())
                .cloned()
                .unwrap_or_else(|| format!("row{i}"))
        })
        .collect()
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        Level::WARN
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// A single-row strip should be roughly `frames` times wider than tall.
fn warn_if_grid_like(input: &Path, frames: u32) {
    let Ok((width, height)) = image::image_dimensions(input) else {
        return;
    };
    if height == 0 {
        return;
    }
    let aspect = f64::from(width) / f64::from(height);
    if aspect < f64::from(frames) * 0.75 {
        warn!(
            aspect = format_args!("{aspect:.2}"),
            expected = frames,
            "image looks like a multi-row grid; pass --rows to split it"
        );
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let guide_color = match cli.guide_color.as_deref().map(parse_hex_color).transpose() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    if !cli.input.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input.display());
        process::exit(1);
    }

    let name = cli.name.clone().unwrap_or_else(|| {
        cli.input
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned()
    });
    let layout = auto_config(
        &name,
        cli.entity_type,
        cli.align,
        cli.strategy,
        cli.scale_mode,
    );
    info!(
        entity = ?layout.entity,
        alignment = ?layout.alignment,
        strategy = ?layout.strategy,
        mode = ?layout.mode,
        "auto-config"
    );

    let mut opts = PipelineOptions {
        guide_color,
        frame_count: cli.frames,
        target_size: cli.output_size,
        mode: layout.mode,
        alignment: layout.alignment,
        strategy: layout.strategy,
        min_island_size: cli.min_island_size,
        clear_grid_lines: !cli.keep_grid_lines,
        pixelate: cli.pixelate,
        ..PipelineOptions::default()
    };
    opts.matting.strategy = cli.matting;
    opts.artifacts.gray_threshold = cli.gray_threshold;
    opts.artifacts.edge_strip = cli.edge_strip;

    let pipeline = match SpritePipeline::new(opts) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let results = if cli.input.is_dir() {
        let Some(output_dir) = &cli.output else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: sprite-strip <input_dir> -o <output_dir>");
            process::exit(1);
        };
        pipeline.process_directory(&cli.input, output_dir)
    } else if cli.rows > 1 {
        let outputs: Vec<PathBuf> = row_suffixes(cli.row_names.as_deref(), cli.rows)
            .iter()
            .map(|suffix| {
                let path = row_output_path(&cli.input, suffix, cli.frames);
                match &cli.output {
                    Some(dir) => dir.join(path.file_name().unwrap_or_default()),
                    None => path,
                }
            })
            .collect();
        pipeline.process_grid_file(&cli.input, &outputs)
    } else {
        warn_if_grid_like(&cli.input, cli.frames);
        let output_path = cli
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(&cli.input, cli.frames));
        vec![pipeline.process_file(&cli.input, &output_path)]
    };

    let mut success_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &cli);
        if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !cli.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, cli: &Cli) {
    if cli.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.success {
        match result.sheet_size {
            Some((w, h)) => eprintln!(
                "[OK] {filename} -> {} ({w}x{h})",
                result.output.display()
            ),
            None => eprintln!("[OK] {filename} -> {}", result.output.display()),
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if cli.verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}
