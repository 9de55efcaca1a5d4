//! Terminal renderings of images and output tensors.

use std::fmt;

/// Ten-step intensity ramp, darkest first.
const RAMP: &[u8; 10] = b" .:-=+*#%@";

/// Render an 8-bit grayscale image, one ramp character per pixel.
pub fn render_digit(pixels: &[u8], width: usize) -> String {
    let width = width.max(1);
    let mut out = String::with_capacity(pixels.len() + pixels.len() / width);
    for (i, &v) in pixels.iter().enumerate() {
        out.push(RAMP[usize::from(v / 26)] as char);
        if (i + 1) % width == 0 {
            out.push('\n');
        }
    }
    out
}

/// One `i: ****` line per class, ten stars for a probability of 1.
pub fn render_probabilities(probs: &[f32]) -> String {
    probs
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            let stars = (p.clamp(0.0, 1.0) * 10.0 + 0.5).floor() as usize;
            format!("{i}: {}\n", "*".repeat(stars))
        })
        .collect()
}

/// Index of the first strictly largest positive value, `0` if none is positive.
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0.0f32;
    let mut idx = 0;
    for (i, &v) in values.iter().enumerate() {
        if best < v {
            best = v;
            idx = i;
        }
    }
    idx
}

pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Render an `h x w` plane as a min-max normalized ASCII heatmap.
///
/// Planes wider than `max_cols` are averaged over square blocks; every other
/// block row is dropped since terminal cells are about twice as tall as wide.
pub fn render_heatmap(plane: &[f32], height: usize, width: usize, max_cols: usize) -> String {
    if width == 0 || height == 0 {
        return String::new();
    }
    let height = height.min(plane.len() / width);
    let Some(summary) = TensorSummary::of(&plane[..height * width]) else {
        return String::new();
    };
    let range = summary.max - summary.min;

    let step = width.div_ceil(max_cols.max(1));
    let mut out = String::new();
    for by in (0..height).step_by(step * 2) {
        for bx in (0..width).step_by(step) {
            let mut sum = 0.0;
            let mut n = 0;
            for y in by..(by + step).min(height) {
                for x in bx..(bx + step).min(width) {
                    sum += plane[y * width + x];
                    n += 1;
                }
            }
            let norm = if range > 0.0 {
                (sum / n as f32 - summary.min) / range
            } else {
                0.0
            };
            let level = (norm * (RAMP.len() - 1) as f32).round() as usize;
            out.push(RAMP[level.min(RAMP.len() - 1)] as char);
        }
        out.push('\n');
    }
    out
}

/// Summary statistics of a tensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TensorSummary {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub count: usize,
}

impl TensorSummary {
    /// `None` for an empty slice.
    pub fn of(values: &[f32]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0f64;
        for &v in values {
            min = min.min(v);
            max = max.max(v);
            sum += f64::from(v);
        }
        Some(Self {
            min,
            max,
            mean: (sum / values.len() as f64) as f32,
            count: values.len(),
        })
    }
}

impl fmt::Display for TensorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} values, min {:.4}, max {:.4}, mean {:.4}",
            self.count, self.min, self.max, self.mean
        )
    }
}
