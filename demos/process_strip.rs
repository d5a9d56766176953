//! Turn a single strip into a sprite sheet.
//!
//! Usage:
//! ```sh
//! cargo run --example process_strip -- walk.png walk_4f.png [frames]
//! ```

use std::env;
use std::process;

use sprite_strip::{PipelineOptions, SpritePipeline};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <input> <output> [frames]", args[0]);
        process::exit(1);
    }

    let input = &args[1];
    let output = &args[2];
    let frame_count = match args.get(3).map(|s| s.parse::<u32>()) {
        Some(Ok(n)) => n,
        Some(Err(e)) => {
            eprintln!("Error: invalid frame count: {e}");
            process::exit(1);
        }
        None => 4,
    };

    let opts = PipelineOptions {
        frame_count,
        ..PipelineOptions::default()
    };
    let pipeline = SpritePipeline::new(opts).expect("invalid pipeline options");
    let result = pipeline.process_file(input.as_ref(), output.as_ref());

    if result.success {
        println!("Done: {} ({})", result.output.display(), result.message);
    } else {
        eprintln!("Error: {}", result.message);
        process::exit(1);
    }
}
