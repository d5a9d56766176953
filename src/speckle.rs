//! Speckle removal via connected-component labelling.
//!
//! Opaque pixels (alpha > 0) are grouped into 8-connected components with an
//! explicit-stack flood fill over the flat pixel index, so very large blobs
//! cannot overflow the call stack. Every component is labelled and measured
//! before anything is cleared, so removal never splits a large component.

use image::RgbaImage;
use tracing::debug;

/// Default minimum island size kept by [`remove_small_islands`].
pub const MIN_ISLAND_SIZE: usize = 20;

/// Result of labelling the opaque pixels of a frame.
#[derive(Debug, Clone)]
pub struct ComponentLabels {
    width: u32,
    height: u32,
    /// Per-pixel label; 0 marks a transparent pixel, components start at 1.
    labels: Vec<u32>,
    /// Pixel count of component `i + 1`.
    sizes: Vec<usize>,
}

impl ComponentLabels {
    /// Label the opaque pixels of `frame` under 8-neighbourhood adjacency.
    #[must_use]
    pub fn new(frame: &RgbaImage) -> Self {
        let (width, height) = frame.dimensions();
        let (w, h) = (width as usize, height as usize);
        let opaque: Vec<bool> = frame.pixels().map(|p| p[3] > 0).collect();

        let mut labels = vec![0u32; w * h];
        let mut sizes = Vec::new();
        let mut stack = Vec::new();

        for start in 0..w * h {
            if !opaque[start] || labels[start] != 0 {
                continue;
            }

            #[allow(clippy::cast_possible_truncation)]
            let label = (sizes.len() + 1) as u32;
            labels[start] = label;
            stack.push(start);
            let mut count = 0usize;

            while let Some(idx) = stack.pop() {
                count += 1;
                let (x, y) = (idx % w, idx / w);
                for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                    for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                        let n = ny * w + nx;
                        if opaque[n] && labels[n] == 0 {
                            labels[n] = label;
                            stack.push(n);
                        }
                    }
                }
            }
            sizes.push(count);
        }

        Self {
            width,
            height,
            labels,
            sizes,
        }
    }

    /// Number of components found.
    #[must_use]
    pub fn count(&self) -> usize {
        self.sizes.len()
    }

    /// Component sizes, indexed by `label - 1`.
    #[must_use]
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Label at `(x, y)`, or `None` for a transparent pixel.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the labelled frame.
    #[must_use]
    pub fn label(&self, x: u32, y: u32) -> Option<u32> {
        assert!(x < self.width && y < self.height, "label index out of bounds");
        match self.labels[(y * self.width + x) as usize] {
            0 => None,
            l => Some(l),
        }
    }

    /// Size of the component with the given label.
    #[must_use]
    pub fn size_of(&self, label: u32) -> usize {
        label
            .checked_sub(1)
            .and_then(|i| self.sizes.get(i as usize))
            .copied()
            .unwrap_or(0)
    }
}

/// Clear every opaque component smaller than `min_size` pixels.
///
/// Returns the cleaned frame and the number of pixels cleared. Components of
/// exactly `min_size` pixels survive. Only alpha is touched.
#[must_use]
pub fn remove_small_islands(frame: &RgbaImage, min_size: usize) -> (RgbaImage, usize) {
    let components = ComponentLabels::new(frame);
    let mut out = frame.clone();
    let mut removed = 0;

    for (px, &label) in out.pixels_mut().zip(&components.labels) {
        if label != 0 && components.size_of(label) < min_size {
            px[3] = 0;
            removed += 1;
        }
    }

    if removed > 0 {
        let islands = components.sizes.iter().filter(|&&s| s < min_size).count();
        debug!(islands, pixels = removed, min_size, "removed speckle islands");
    }
    (out, removed)
}
