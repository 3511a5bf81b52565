// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster encoding for exported pages.

use docmorph_core::ImageFormat;
use docmorph_core::error::{DocMorphError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{Rgb, RgbImage, RgbaImage};

/// Encode `image` as `format`. JPEG uses `quality` (clamped to `[1, 100]`)
/// and has any transparency composited onto white; PNG is lossless and
/// keeps alpha.
pub fn encode_image(image: &RgbaImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            let rgb = flatten_on_white(image);
            let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
            rgb.write_with_encoder(encoder)
                .map_err(|err| DocMorphError::render(format!("JPEG encoding failed: {err}")))?;
        }
        ImageFormat::Png => {
            let encoder = PngEncoder::new(&mut buffer);
            image
                .write_with_encoder(encoder)
                .map_err(|err| DocMorphError::render(format!("PNG encoding failed: {err}")))?;
        }
    }
    Ok(buffer)
}

/// Composite an RGBA image over an opaque white background.
pub fn flatten_on_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}
