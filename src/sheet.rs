//! Sprite-sheet assembly.

use image::{imageops, RgbaImage};

/// Lay standardized frames left to right on a `(n * target_size) x target_size` sheet.
///
/// Frames larger than the cell are clipped to it; smaller ones sit at the
/// cell's top-left corner. An empty frame list yields a zero-width sheet.
#[must_use]
pub fn assemble_sheet(frames: &[RgbaImage], target_size: u32) -> RgbaImage {
    #[allow(clippy::cast_possible_truncation)]
    let count = frames.len() as u32;
    let mut sheet = RgbaImage::new(count * target_size, target_size);

    for (i, frame) in (0u32..).zip(frames) {
        let cell = if frame.dimensions() == (target_size, target_size) {
            frame.clone()
        } else {
            let mut cell = RgbaImage::new(target_size, target_size);
            imageops::replace(&mut cell, frame, 0, 0);
            cell
        };
        imageops::replace(&mut sheet, &cell, i64::from(i * target_size), 0);
    }
    sheet
}
