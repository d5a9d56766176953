//! Strip-to-sheet pipeline and file-level processing.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, Rgb, RgbaImage};
use tracing::{debug, info, warn};

use crate::artifacts::{clean_artifacts, ArtifactOptions};
use crate::color::{is_marker_color, GUIDE_COLOR_TOLERANCE};
use crate::error::{Error, Result};
use crate::guides::{clear_dark_grid_lines, detect_guide_lines, GuideLines};
use crate::inpaint::{inpaint_guide_lines, MAX_INPAINT_PASSES};
use crate::matting::{remove_background, MattingOptions};
use crate::sheet::assemble_sheet;
use crate::speckle::{remove_small_islands, MIN_ISLAND_SIZE};
use crate::split::{split_rows, split_strip};
use crate::standardize::{
    content_coverage, pixelate, standardize_frames, Alignment, AlignmentStrategy, ScaleMode,
    StandardizeOptions, CONTENT_MARGIN, DEFAULT_TARGET_SIZE,
};

/// Frames per strip when nothing else is configured.
pub const DEFAULT_FRAME_COUNT: u32 = 4;

/// Options controlling the whole strip pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Guide-line colour used to find frame boundaries; `None` splits evenly.
    ///
    /// Setting it also turns on inpainting, which only recognises magenta
    /// markers (see [`crate::color::GuideBand`]). Lines in other colours
    /// still drive the split but are left in the frames.
    pub guide_color: Option<Rgb<u8>>,
    /// Per-channel tolerance for guide-line detection.
    pub guide_tolerance: u8,
    /// Number of frames in the strip.
    pub frame_count: u32,
    /// Output cell size in pixels.
    pub target_size: u32,
    /// Content or whole-frame scaling.
    pub mode: ScaleMode,
    /// Vertical placement within each cell.
    pub alignment: Alignment,
    /// Cross-frame geometry strategy.
    pub strategy: AlignmentStrategy,
    /// Share of the cell content may fill in content mode.
    pub margin: f32,
    /// Opaque islands smaller than this are removed.
    pub min_island_size: usize,
    /// Background removal settings.
    pub matting: MattingOptions,
    /// Final cleanup settings.
    pub artifacts: ArtifactOptions,
    /// Clear dark separator columns before splitting.
    pub clear_grid_lines: bool,
    /// Pass limit for guide-line inpainting.
    pub inpaint_passes: u32,
    /// Optional pixel-art factor applied after standardizing.
    pub pixelate: Option<u32>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            guide_color: None,
            guide_tolerance: GUIDE_COLOR_TOLERANCE,
            frame_count: DEFAULT_FRAME_COUNT,
            target_size: DEFAULT_TARGET_SIZE,
            mode: ScaleMode::default(),
            alignment: Alignment::default(),
            strategy: AlignmentStrategy::default(),
            margin: CONTENT_MARGIN,
            min_island_size: MIN_ISLAND_SIZE,
            matting: MattingOptions::default(),
            artifacts: ArtifactOptions::default(),
            clear_grid_lines: true,
            inpaint_passes: MAX_INPAINT_PASSES,
            pixelate: None,
        }
    }
}

impl PipelineOptions {
    /// Reject configurations that cannot produce a sheet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFrameCount`], [`Error::InvalidTargetSize`],
    /// [`Error::InvalidMargin`] or [`Error::InvalidPixelateFactor`].
    pub fn validate(&self) -> Result<()> {
        if self.frame_count == 0 {
            return Err(Error::InvalidFrameCount(self.frame_count));
        }
        self.standardize_options().validate()?;
        if self.pixelate == Some(0) {
            return Err(Error::InvalidPixelateFactor(0));
        }
        Ok(())
    }

    /// The subset of options consumed by [`standardize_frames`].
    #[must_use]
    pub fn standardize_options(&self) -> StandardizeOptions {
        StandardizeOptions {
            target_size: self.target_size,
            mode: self.mode,
            alignment: self.alignment,
            strategy: self.strategy,
            margin: self.margin,
        }
    }
}

/// Result of processing a single file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Input file.
    pub path: PathBuf,
    /// Where the sheet was (or would have been) written.
    pub output: PathBuf,
    /// Whether the sheet was written.
    pub success: bool,
    /// Sheet dimensions on success.
    pub sheet_size: Option<(u32, u32)>,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn failed(path: &Path, output: &Path, message: String) -> Self {
        Self {
            path: path.to_path_buf(),
            output: output.to_path_buf(),
            success: false,
            sheet_size: None,
            message,
        }
    }
}

/// Turns generated animation strips into sprite sheets.
///
/// Create once with [`SpritePipeline::new()`] and reuse for many strips;
/// the options are validated up front so per-strip calls only fail on
/// input-dependent problems.
#[derive(Debug, Clone)]
pub struct SpritePipeline {
    opts: PipelineOptions,
}

impl SpritePipeline {
    /// Create a pipeline from validated options.
    ///
    /// # Errors
    ///
    /// Returns the first problem found by [`PipelineOptions::validate`].
    pub fn new(opts: PipelineOptions) -> Result<Self> {
        opts.validate()?;
        if let Some(colour) = opts.guide_color.filter(|&c| !is_marker_color(c)) {
            warn!(
                colour = ?colour,
                "guide colour is not magenta; lines will split frames but will not be inpainted"
            );
        }
        Ok(Self { opts })
    }

    /// The options this pipeline runs with.
    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.opts
    }

    /// Process one strip into a `(frames * target) x target` sheet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StripTooNarrow`] when the strip has fewer columns
    /// than frames.
    pub fn process_strip(&self, strip: &RgbaImage) -> Result<RgbaImage> {
        let frames = self.extract_frames(strip)?;
        let cleaned = self.clean_frames(&frames);
        let standardized = standardize_frames(&cleaned, &self.opts.standardize_options())?;

        for (i, frame) in standardized.iter().enumerate() {
            debug!(
                frame = i,
                coverage = format_args!("{:.1}%", content_coverage(frame) * 100.0),
                "standardized frame"
            );
        }

        let finished = match self.opts.pixelate {
            Some(factor) if factor > 1 => standardized
                .iter()
                .map(|f| pixelate(f, factor))
                .collect::<Result<Vec<_>>>()?,
            _ => standardized,
        };

        Ok(assemble_sheet(&finished, self.opts.target_size))
    }

    /// Split a grid of stacked strips into `rows` and process each one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRowCount`] for an impossible row count, or any
    /// error from [`SpritePipeline::process_strip`].
    pub fn process_rows(&self, grid: &RgbaImage, rows: u32) -> Result<Vec<RgbaImage>> {
        let strips = split_rows(grid, rows)?;
        strips
            .iter()
            .enumerate()
            .map(|(i, strip)| {
                info!(row = i, "processing row");
                self.process_strip(strip)
            })
            .collect()
    }

    /// Guide detection, grid clearing and splitting.
    fn extract_frames(&self, strip: &RgbaImage) -> Result<Vec<RgbaImage>> {
        let guides = match self.opts.guide_color {
            Some(colour) => detect_guide_lines(strip, colour, self.opts.guide_tolerance),
            None => GuideLines::default(),
        };
        if self.opts.guide_color.is_some() {
            info!(lines = guides.len(), positions = ?guides.positions(), "detected guide lines");
        }

        let frames = if self.opts.clear_grid_lines {
            let (cleared, columns) = clear_dark_grid_lines(strip);
            if columns > 0 {
                info!(columns, "cleared dark grid lines");
            }
            split_strip(&cleared, &guides, self.opts.frame_count)?
        } else {
            split_strip(strip, &guides, self.opts.frame_count)?
        };

        info!(
            frames = frames.len(),
            width = strip.width(),
            height = strip.height(),
            "split strip"
        );
        Ok(frames)
    }

    /// Per-frame cleanup, in parallel when the `cli` feature is enabled.
    fn clean_frames(&self, frames: &[RgbaImage]) -> Vec<RgbaImage> {
        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            frames.par_iter().map(|f| self.clean_frame(f)).collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            frames.iter().map(|f| self.clean_frame(f)).collect()
        }
    }

    /// Matting, inpainting, speckle removal and artifact cleanup for one frame.
    #[must_use]
    pub fn clean_frame(&self, frame: &RgbaImage) -> RgbaImage {
        let (matted, background) = remove_background(frame, &self.opts.matting);
        debug!(pixels = background, "removed background");

        let inpainted = if self.opts.guide_color.is_some() {
            inpaint_guide_lines(&matted, self.opts.inpaint_passes).0
        } else {
            matted
        };

        let (despeckled, _) = remove_small_islands(&inpainted, self.opts.min_island_size);
        clean_artifacts(&despeckled, &self.opts.artifacts).0
    }

    /// Load a strip, process it and save the sheet.
    ///
    /// Failures are reported in the returned [`ProcessResult`], never panicked.
    #[must_use]
    pub fn process_file(&self, input: &Path, output: &Path) -> ProcessResult {
        let strip = match load_rgba(input) {
            Ok(img) => img,
            Err(e) => return ProcessResult::failed(input, output, format!("Failed to load: {e}")),
        };

        let sheet = match self.process_strip(&strip) {
            Ok(sheet) => sheet,
            Err(e) => return ProcessResult::failed(input, output, e.to_string()),
        };

        match write_sheet(&sheet, output) {
            Ok(()) => ProcessResult {
                path: input.to_path_buf(),
                output: output.to_path_buf(),
                success: true,
                sheet_size: Some(sheet.dimensions()),
                message: format!(
                    "{} frames at {}px",
                    self.opts.frame_count, self.opts.target_size
                ),
            },
            Err(e) => ProcessResult::failed(input, output, format!("Failed to save: {e}")),
        }
    }

    /// Load a grid of stacked strips and save one sheet per row.
    ///
    /// The row count is `outputs.len()`. A load or split failure yields a
    /// single failed result; per-row failures are reported per row.
    #[must_use]
    pub fn process_grid_file(&self, input: &Path, outputs: &[PathBuf]) -> Vec<ProcessResult> {
        let first_output = outputs.first().map_or(input, PathBuf::as_path);

        let grid = match load_rgba(input) {
            Ok(img) => img,
            Err(e) => {
                return vec![ProcessResult::failed(
                    input,
                    first_output,
                    format!("Failed to load: {e}"),
                )]
            }
        };

        #[allow(clippy::cast_possible_truncation)]
        let rows = match split_rows(&grid, outputs.len() as u32) {
            Ok(rows) => rows,
            Err(e) => return vec![ProcessResult::failed(input, first_output, e.to_string())],
        };

        rows.iter()
            .zip(outputs)
            .enumerate()
            .map(|(i, (strip, output))| {
                info!(row = i, output = %output.display(), "processing row");
                match self.process_strip(strip) {
                    Ok(sheet) => match write_sheet(&sheet, output) {
                        Ok(()) => ProcessResult {
                            path: input.to_path_buf(),
                            output: output.clone(),
                            success: true,
                            sheet_size: Some(sheet.dimensions()),
                            message: format!("row {i}"),
                        },
                        Err(e) => {
                            ProcessResult::failed(input, output, format!("Failed to save: {e}"))
                        }
                    },
                    Err(e) => ProcessResult::failed(input, output, e.to_string()),
                }
            })
            .collect()
    }

    /// Process every supported image in a directory.
    ///
    /// Outputs are named with [`default_output_path`] inside `output_dir`.
    /// Uses parallel iteration when the `cli` feature is enabled (via rayon).
    /// Results come back in file-name order.
    #[must_use]
    pub fn process_directory(&self, input_dir: &Path, output_dir: &Path) -> Vec<ProcessResult> {
        let mut inputs: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .filter(|p| is_supported_image(p))
                .collect(),
            Err(e) => {
                return vec![ProcessResult::failed(
                    input_dir,
                    output_dir,
                    format!("Failed to read directory: {e}"),
                )];
            }
        };
        inputs.sort();

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                return vec![ProcessResult::failed(
                    input_dir,
                    output_dir,
                    format!("Failed to create output directory: {e}"),
                )];
            }
        }

        let job = |input: &PathBuf| {
            let output = sheet_path_in(output_dir, input, self.opts.frame_count);
            self.process_file(input, &output)
        };

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            inputs.par_iter().map(job).collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            inputs.iter().map(job).collect()
        }
    }
}

fn load_rgba(path: &Path) -> Result<RgbaImage> {
    Ok(image::open(path)?.to_rgba8())
}

fn write_sheet(sheet: &RgbaImage, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    save_image(sheet, output)
}

fn sheet_path_in(dir: &Path, input: &Path, frames: u32) -> PathBuf {
    let name = default_output_path(input, frames);
    dir.join(name.file_name().unwrap_or_default())
}

/// Check if a file has a supported input extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "png" | "webp" | "jpg" | "jpeg" | "bmp"
        ),
        None => false,
    }
}

/// Save a sheet losslessly, keeping its alpha channel.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for anything but PNG or WebP, or an
/// error if writing fails.
pub fn save_image(img: &RgbaImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    match format {
        ImageFormat::Png | ImageFormat::WebP => {
            DynamicImage::ImageRgba8(img.clone()).save_with_format(path, format)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Generate a default output path from an input path.
///
/// Example: `"walk.png"` with 4 frames becomes `"walk_4f.png"`. The sheet is
/// always PNG regardless of the input format.
#[must_use]
pub fn default_output_path(input: &Path, frames: u32) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_{frames}f.png"))
}

/// Output path for one row of a grid: `"{stem}_{row}_{frames}f.png"`.
#[must_use]
pub fn row_output_path(input: &Path, row: &str, frames: u32) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_{row}_{frames}f.png"))
}
