//! Cheap image forensics on the decoded grayscale plane.
//!
//! Two measurements drive everything:
//! - blockiness: mean gradient across 8px block seams relative to the mean
//!   gradient everywhere; JPEG re-encoding pushes it above 1.
//! - edge density: mean absolute gradient scaled to [0, 1]; screenshots of
//!   text sit high, blurred or flat images sit low.

use image::GrayImage;
use serde_json::json;
use tracing::warn;
use trustbot_core::{PipelineResult, ReasonCode};

use crate::error::AnalyzerError;

pub const PIPELINE: &str = "image_forensics";

const BLOCK: u32 = 8;
pub const BLOCKINESS_LIMIT: f64 = 1.35;
pub const TEXTLIKE_EDGE_DENSITY: f64 = 0.08;
pub const LOW_EDGE_DENSITY: f64 = 0.02;
pub const LOW_SIGNAL_PENALTY: f64 = 0.4;

fn px(img: &GrayImage, x: u32, y: u32) -> f64 {
    img.get_pixel(x, y).0[0] as f64
}

/// Mean absolute step at every `step_x`-th column and every `step_y`-th row.
fn mean_steps(img: &GrayImage, step_x: u32, step_y: u32) -> (f64, f64) {
    let (w, h) = img.dimensions();

    let (mut sum, mut n) = (0.0, 0u64);
    let mut x = step_x.max(1);
    while x < w {
        for y in 0..h {
            sum += (px(img, x, y) - px(img, x - 1, y)).abs();
            n += 1;
        }
        x += step_x.max(1);
    }
    let horizontal = if n == 0 { 0.0 } else { sum / n as f64 };

    let (mut sum, mut n) = (0.0, 0u64);
    let mut y = step_y.max(1);
    while y < h {
        for x in 0..w {
            sum += (px(img, x, y) - px(img, x, y - 1)).abs();
            n += 1;
        }
        y += step_y.max(1);
    }
    let vertical = if n == 0 { 0.0 } else { sum / n as f64 };

    (horizontal, vertical)
}

/// Ratio of seam gradients to overall gradients. Zero for images too small
/// to hold two blocks in each direction.
pub fn blockiness(img: &GrayImage) -> f64 {
    let (w, h) = img.dimensions();
    if w < BLOCK * 2 || h < BLOCK * 2 {
        return 0.0;
    }
    let (seam_x, seam_y) = mean_steps(img, BLOCK, BLOCK);
    let (all_x, all_y) = mean_steps(img, 1, 1);
    ((seam_x + seam_y) / 2.0) / (all_x + all_y + 1e-6)
}

pub fn edge_density(img: &GrayImage) -> f64 {
    let (gx, gy) = mean_steps(img, 1, 1);
    0.5 * (gx + gy) / 255.0
}

pub fn decode_gray(bytes: &[u8]) -> Result<GrayImage, AnalyzerError> {
    Ok(image::load_from_memory(bytes)?.to_luma8())
}

/// Blocking: decodes the image. Run on the blocking pool.
pub fn analyze_image(bytes: Option<&[u8]>) -> PipelineResult {
    let bytes = match bytes {
        Some(b) if !b.is_empty() => b,
        _ => return PipelineResult::missing(PIPELINE, "image"),
    };

    let gray = match decode_gray(bytes) {
        Ok(g) => g,
        Err(e) => {
            warn!("Image decode failed: {}", e);
            let mut out = PipelineResult::degraded(
                PIPELINE,
                "decode_error",
                "Could not decode the image.",
                ReasonCode::ImgDecodeFailed,
                1.0,
            );
            out.note("error", e.to_string());
            return out;
        }
    };

    let blk = blockiness(&gray);
    let ed = edge_density(&gray);
    let mut out = PipelineResult::new(PIPELINE);

    if blk > BLOCKINESS_LIMIT {
        out.flag(
            "heavy_compression",
            0.6,
            "Image shows strong compression artifacts; authenticity signals may be degraded.",
            ReasonCode::ImgHeavyCompression,
        );
        out.raise_penalty((blk - BLOCKINESS_LIMIT).min(1.0));
    }

    if ed > TEXTLIKE_EDGE_DENSITY {
        out.flag(
            "textlike_edges",
            0.55,
            "Image has dense edges consistent with text-heavy screenshots (common for scam forwards).",
            ReasonCode::ImgTextlikeEdges,
        );
    }

    if ed < LOW_EDGE_DENSITY {
        out.flag(
            "low_signal",
            0.5,
            "Image has low detail; analysis may be uncertain.",
            ReasonCode::ImgLowSignal,
        );
        out.raise_penalty(LOW_SIGNAL_PENALTY);
    }

    if out.signals.is_empty() {
        out.push_signal("no_strong_image_indicators", 0.45);
    }

    out.note("blockiness", blk);
    out.note("edge_density", ed);
    out.note("size", json!([gray.width(), gray.height()]));
    out
}
