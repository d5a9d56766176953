//! Turn noisy AI-generated animation strips into clean sprite sheets.
//!
//! A strip is one image holding several frames side by side, usually on a
//! flat or checkerboard background and sometimes separated by coloured guide
//! lines. The pipeline splits it into frames, removes the background, paints
//! out the guide lines, drops speckle and dark fringing, then scales every
//! frame onto a fixed-size transparent canvas and lays them out as a sheet.
//!
//! # Quick Start
//!
//! ```no_run
//! use sprite_strip::{PipelineOptions, SpritePipeline};
//!
//! let pipeline = SpritePipeline::new(PipelineOptions::default()).expect("valid options");
//! let strip = image::open("walk.png").unwrap().to_rgba8();
//! let sheet = pipeline.process_strip(&strip).unwrap();
//! sheet.save("walk_4f.png").unwrap();
//! ```
//!
//! # Guide lines
//!
//! When the generator was asked to draw marker lines between frames, pass
//! the marker colour so the lines drive the split and get inpainted away.
//!
//! ```no_run
//! use sprite_strip::{parse_hex_color, Alignment, AlignmentStrategy, PipelineOptions, SpritePipeline};
//!
//! let opts = PipelineOptions {
//!     guide_color: Some(parse_hex_color("#FF00FF").unwrap()),
//!     alignment: Alignment::Bottom,
//!     strategy: AlignmentStrategy::Unified,
//!     ..PipelineOptions::default()
//! };
//! let pipeline = SpritePipeline::new(opts).unwrap();
//! let result = pipeline.process_file("trap.png".as_ref(), "trap_4f.png".as_ref());
//! println!("{}: {}", result.output.display(), result.message);
//! ```
//!
//! Every stage is also exposed on its own as a pure function of its input
//! image, see the module docs.

#![deny(missing_docs)]

pub mod artifacts;
pub mod color;
pub mod error;
pub mod guides;
pub mod inpaint;
pub mod matting;
mod pipeline;
pub mod sheet;
pub mod speckle;
pub mod split;
pub mod standardize;

pub use color::parse_hex_color;
pub use error::{Error, Result};
pub use matting::MattingStrategy;
pub use pipeline::{
    default_output_path, is_supported_image, row_output_path, save_image, PipelineOptions,
    ProcessResult, SpritePipeline, DEFAULT_FRAME_COUNT,
};
pub use standardize::{Alignment, AlignmentStrategy, ScaleMode};
