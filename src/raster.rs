// ============================================================================
// RASTER HELPERS — pixel blending and buffer-to-buffer draws
// ============================================================================
//
// The filter functions treat an RgbaImage the way a 2D drawing surface is
// used: copy a region, draw it somewhere else at a global alpha, composite
// an overlay with a blend mode. These helpers centralize that math.
//
// All color math runs in straight (non-premultiplied) RGBA, normalized to
// [0, 1] per channel, and clamps back to u8 on the way out.
// ============================================================================

use image::{Rgba, RgbaImage};

/// Composite operations used by the filter pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Blend {
    /// Plain source-over alpha compositing.
    Normal,
    /// Multiplies or screens depending on base brightness.
    Overlay,
    /// Additive ("lighter") compositing, clamped at white.
    Additive,
    /// Destination-out: erases base alpha where the top layer covers.
    Erase,
}

/// Blend a single top pixel onto a base pixel. `opacity` scales the top
/// layer's alpha, matching a global-alpha draw.
pub fn blend_pixel(base: Rgba<u8>, top: Rgba<u8>, mode: Blend, opacity: f32) -> Rgba<u8> {
    // Fast path: fully transparent top pixel — nothing to composite.
    if top[3] == 0 || opacity <= 0.0 {
        return base;
    }

    // Fast path: Normal blend, full opacity, fully opaque top pixel.
    if matches!(mode, Blend::Normal) && opacity >= 1.0 && top[3] == 255 {
        return top;
    }

    let opacity = opacity.clamp(0.0, 1.0);

    let base_r = base[0] as f32 / 255.0;
    let base_g = base[1] as f32 / 255.0;
    let base_b = base[2] as f32 / 255.0;
    let base_a = base[3] as f32 / 255.0;

    let top_r = top[0] as f32 / 255.0;
    let top_g = top[1] as f32 / 255.0;
    let top_b = top[2] as f32 / 255.0;
    let top_a = (top[3] as f32 / 255.0) * opacity;

    if matches!(mode, Blend::Erase) {
        // Keep base color, knock out alpha under the top layer's coverage.
        let out_a = base_a * (1.0 - top_a);
        return Rgba([base[0], base[1], base[2], (out_a * 255.0).round().clamp(0.0, 255.0) as u8]);
    }

    let (r, g, b) = match mode {
        Blend::Normal => (top_r, top_g, top_b),
        Blend::Additive => (
            (base_r + top_r).min(1.0),
            (base_g + top_g).min(1.0),
            (base_b + top_b).min(1.0),
        ),
        Blend::Overlay => (
            overlay_channel(base_r, top_r),
            overlay_channel(base_g, top_g),
            overlay_channel(base_b, top_b),
        ),
        Blend::Erase => unreachable!(),
    };

    let out_a = top_a + base_a * (1.0 - top_a);
    if out_a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let out_r = (r * top_a + base_r * base_a * (1.0 - top_a)) / out_a;
    let out_g = (g * top_a + base_g * base_a * (1.0 - top_a)) / out_a;
    let out_b = (b * top_a + base_b * base_a * (1.0 - top_a)) / out_a;

    Rgba([
        (out_r * 255.0).round().clamp(0.0, 255.0) as u8,
        (out_g * 255.0).round().clamp(0.0, 255.0) as u8,
        (out_b * 255.0).round().clamp(0.0, 255.0) as u8,
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

fn overlay_channel(base: f32, top: f32) -> f32 {
    if base < 0.5 {
        2.0 * base * top
    } else {
        1.0 - 2.0 * (1.0 - base) * (1.0 - top)
    }
}

/// Clamp-sample a pixel. Out-of-range coordinates read the nearest edge
/// pixel; an empty image reads transparent black.
#[inline]
pub fn sample_clamped(img: &RgbaImage, x: i32, y: i32) -> Rgba<u8> {
    if img.width() == 0 || img.height() == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    let cx = x.clamp(0, img.width() as i32 - 1) as u32;
    let cy = y.clamp(0, img.height() as i32 - 1) as u32;
    *img.get_pixel(cx, cy)
}

/// Draw the whole of `src` onto `dst` at an integer offset, source-over,
/// scaled by a global alpha. Regions falling outside `dst` are clipped.
pub fn draw_image(dst: &mut RgbaImage, src: &RgbaImage, dx: i32, dy: i32, alpha: f32) {
    draw_region(dst, src, 0, 0, src.width(), src.height(), dx, dy, alpha);
}

/// Draw a rectangular region of `src` onto `dst` at (dx, dy), source-over,
/// scaled by a global alpha. The source rectangle and the destination are
/// both clipped to their buffers.
#[allow(clippy::too_many_arguments)]
pub fn draw_region(
    dst: &mut RgbaImage,
    src: &RgbaImage,
    sx: i32,
    sy: i32,
    sw: u32,
    sh: u32,
    dx: i32,
    dy: i32,
    alpha: f32,
) {
    if alpha <= 0.0 || sw == 0 || sh == 0 {
        return;
    }
    let (dw, dh) = dst.dimensions();
    let (src_w, src_h) = src.dimensions();
    if dw == 0 || dh == 0 || src_w == 0 || src_h == 0 {
        return;
    }

    for row in 0..sh as i32 {
        let src_y = sy + row;
        let dst_y = dy + row;
        if src_y < 0 || src_y >= src_h as i32 || dst_y < 0 || dst_y >= dh as i32 {
            continue;
        }
        for col in 0..sw as i32 {
            let src_x = sx + col;
            let dst_x = dx + col;
            if src_x < 0 || src_x >= src_w as i32 || dst_x < 0 || dst_x >= dw as i32 {
                continue;
            }
            let top = *src.get_pixel(src_x as u32, src_y as u32);
            let base = *dst.get_pixel(dst_x as u32, dst_y as u32);
            dst.put_pixel(dst_x as u32, dst_y as u32, blend_pixel(base, top, Blend::Normal, alpha));
        }
    }
}

/// Draw a source region into a destination rectangle of different size,
/// nearest-neighbor resampled, source-over at a global alpha.
#[allow(clippy::too_many_arguments)]
pub fn draw_region_scaled(
    dst: &mut RgbaImage,
    src: &RgbaImage,
    sx: i32,
    sy: i32,
    sw: u32,
    sh: u32,
    dx: i32,
    dy: i32,
    dw: u32,
    dh: u32,
    alpha: f32,
) {
    if alpha <= 0.0 || sw == 0 || sh == 0 || dw == 0 || dh == 0 {
        return;
    }
    let (dst_w, dst_h) = dst.dimensions();
    if dst_w == 0 || dst_h == 0 || src.width() == 0 || src.height() == 0 {
        return;
    }

    let x_ratio = sw as f32 / dw as f32;
    let y_ratio = sh as f32 / dh as f32;

    for row in 0..dh as i32 {
        let dst_y = dy + row;
        if dst_y < 0 || dst_y >= dst_h as i32 {
            continue;
        }
        let src_y = sy + (row as f32 * y_ratio) as i32;
        for col in 0..dw as i32 {
            let dst_x = dx + col;
            if dst_x < 0 || dst_x >= dst_w as i32 {
                continue;
            }
            let src_x = sx + (col as f32 * x_ratio) as i32;
            let top = sample_clamped(src, src_x, src_y);
            let base = *dst.get_pixel(dst_x as u32, dst_y as u32);
            dst.put_pixel(dst_x as u32, dst_y as u32, blend_pixel(base, top, Blend::Normal, alpha));
        }
    }
}
