//! # rt-render-image
//!
//! `image`-based implementation of `OverlayRenderer`.
//! Draws the submitted box as a hollow rectangle and re-encodes the frame as
//! base64 JPEG, ready to be inlined into a vision request.

use std::io::Cursor;

use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageReader, Rgb, RgbImage};
use rt_core::error::RenderError;
use rt_core::traits::OverlayRenderer;
use tracing::trace;

pub struct JpegBoxRenderer {
    color: Rgb<u8>,
    /// Outline width in pixels, centred on the box edge
    thickness: u32,
    quality: u8,
}

impl Default for JpegBoxRenderer {
    fn default() -> Self {
        Self {
            color: Rgb([0, 255, 0]),
            thickness: 3,
            quality: 90,
        }
    }
}

impl JpegBoxRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Splits `[x, y, width, height]` into truncated corner coordinates.
///
/// Each component is truncated toward zero before the opposite corner is
/// computed, so `[10.9, 0, 5.9, 1]` spans x 10..15.
fn corners(bbox: &[f64]) -> Result<(i64, i64, i64, i64), RenderError> {
    let &[x, y, w, h] = bbox else {
        return Err(RenderError::InvalidBox);
    };
    if !bbox.iter().all(|v| v.is_finite()) {
        return Err(RenderError::InvalidBox);
    }
    let (x, y, w, h) = (x as i64, y as i64, w as i64, h as i64);
    Ok((x, y, x.saturating_add(w), y.saturating_add(h)))
}

/// Fills the inclusive rectangle, silently dropping pixels outside the frame.
fn fill(canvas: &mut RgbImage, color: Rgb<u8>, x0: i64, y0: i64, x1: i64, y1: i64) {
    let (w, h) = (canvas.width() as i64, canvas.height() as i64);
    let (x0, x1) = (x0.max(0), x1.min(w - 1));
    let (y0, y1) = (y0.max(0), y1.min(h - 1));
    if x0 > x1 || y0 > y1 {
        return;
    }
    for y in y0..=y1 {
        for x in x0..=x1 {
            canvas.put_pixel(x as u32, y as u32, color);
        }
    }
}

impl JpegBoxRenderer {
    fn draw_outline(&self, canvas: &mut RgbImage, (x1, y1, x2, y2): (i64, i64, i64, i64)) {
        // Past one stroke beyond the frame every edge is invisible, and the
        // offsets below must not overflow for saturated far-away corners.
        let margin = self.thickness as i64;
        let clamp_x = |v: i64| v.clamp(-margin, canvas.width() as i64 + margin);
        let clamp_y = |v: i64| v.clamp(-margin, canvas.height() as i64 + margin);
        let (x1, x2, y1, y2) = (clamp_x(x1), clamp_x(x2), clamp_y(y1), clamp_y(y2));

        let (left, right) = (x1.min(x2), x1.max(x2));
        let (top, bottom) = (y1.min(y2), y1.max(y2));
        let half = (self.thickness / 2) as i64;
        let extra = (self.thickness as i64 - 1) - half;

        // top, bottom, left, right
        fill(canvas, self.color, left - half, top - half, right + extra, top + extra);
        fill(canvas, self.color, left - half, bottom - half, right + extra, bottom + extra);
        fill(canvas, self.color, left - half, top - half, left + extra, bottom + extra);
        fill(canvas, self.color, right - half, top - half, right + extra, bottom + extra);
    }
}

impl OverlayRenderer for JpegBoxRenderer {
    fn render_box(&self, image: &[u8], bbox: &[f64]) -> Result<String, RenderError> {
        let decoded = ImageReader::new(Cursor::new(image))
            .with_guessed_format()
            .map_err(|_| RenderError::Unreadable)?
            .decode()
            .map_err(|_| RenderError::Unreadable)?;

        let rect = corners(bbox)?;

        // Working copy; JPEG has no alpha channel anyway.
        let mut canvas = decoded.to_rgb8();
        self.draw_outline(&mut canvas, rect);
        trace!(?rect, width = canvas.width(), height = canvas.height(), "outline drawn");

        let mut jpeg = Vec::new();
        canvas
            .write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, self.quality))
            .map_err(|e| RenderError::Encode(e.to_string()))?;

        Ok(base64::engine::general_purpose::STANDARD.encode(jpeg))
    }
}
