// ============================================================================
// GLITCH TEXT — procedural text overlays
// ============================================================================
//
// Builds the active string pool from the enabled text categories and the
// color pool from the enabled color categories, then scatters `ceil(amount)`
// text instances at random positions with a jittered rotation.
//
// An empty pool — or no loadable system font — makes the filter a no-op:
// a missing drawing resource must never fail a render.
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

use ab_glyph::{point, Font, FontArc, GlyphId, ScaleFont};
use image::{Rgba, RgbaImage};
use rand::Rng;

use crate::raster::{self, Blend};
use crate::state::EffectState;

static OVERLAY_FONT: OnceLock<Option<FontArc>> = OnceLock::new();

/// The bold sans-serif used for every overlay, loaded once per process.
fn overlay_font() -> Option<&'static FontArc> {
    OVERLAY_FONT.get_or_init(load_system_font).as_ref()
}

/// Load a bold sans-serif from the system via font-kit. Prefers Arial to
/// match the classic look, falls back to the platform sans-serif.
fn load_system_font() -> Option<FontArc> {
    use font_kit::family_name::FamilyName;
    use font_kit::properties::{Properties, Weight};
    use font_kit::source::SystemSource;

    let mut props = Properties::new();
    props.weight = Weight::BOLD;

    let source = SystemSource::new();
    let handle = source
        .select_best_match(
            &[FamilyName::Title("Arial".to_string()), FamilyName::SansSerif],
            &props,
        )
        .ok()?;
    let font_data = handle.load().ok()?;
    let bytes = font_data.copy_font_data()?;
    FontArc::try_from_vec((*bytes).clone()).ok()
}

/// A rasterized line of text: a single-channel coverage buffer plus the
/// offset of its top-left corner relative to the baseline origin.
struct TextSprite {
    coverage: Vec<f32>,
    w: u32,
    h: u32,
    off_x: f32,
    off_y: f32,
}

/// Lay out and rasterize one line at the given pixel size. Returns `None`
/// for strings with no drawable outline.
fn rasterize_line(font: &FontArc, text: &str, size: f32) -> Option<TextSprite> {
    let scaled = font.as_scaled(size);

    // Position glyphs along the baseline, kerning included.
    let mut glyphs: Vec<(GlyphId, f32)> = Vec::new();
    let mut cursor = 0.0f32;
    let mut last: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = last {
            cursor += scaled.kern(prev, id);
        }
        glyphs.push((id, cursor));
        cursor += scaled.h_advance(id);
        last = Some(id);
    }

    // Outline everything first so the sprite bounds are exact.
    let mut outlined = Vec::new();
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    for (id, gx) in glyphs {
        let glyph = id.with_scale_and_position(size, point(gx, 0.0));
        if let Some(out) = font.outline_glyph(glyph) {
            let b = out.px_bounds();
            min_x = min_x.min(b.min.x);
            min_y = min_y.min(b.min.y);
            max_x = max_x.max(b.max.x);
            max_y = max_y.max(b.max.y);
            outlined.push(out);
        }
    }
    if outlined.is_empty() || min_x >= max_x || min_y >= max_y {
        return None;
    }

    let w = (max_x - min_x).ceil() as u32;
    let h = (max_y - min_y).ceil() as u32;
    let mut coverage = vec![0f32; w as usize * h as usize];
    for out in &outlined {
        let b = out.px_bounds();
        out.draw(|px, py, cov| {
            let x = (b.min.x - min_x) as i32 + px as i32;
            let y = (b.min.y - min_y) as i32 + py as i32;
            if x >= 0 && y >= 0 && (x as u32) < w && (y as u32) < h {
                let idx = y as usize * w as usize + x as usize;
                coverage[idx] = coverage[idx].max(cov);
            }
        });
    }

    Some(TextSprite { coverage, w, h, off_x: min_x, off_y: min_y })
}

/// Draw a sprite rotated about its baseline origin, inverse-mapped with
/// nearest sampling.
fn draw_sprite_rotated(
    dst: &mut RgbaImage,
    sprite: &TextSprite,
    origin_x: f32,
    origin_y: f32,
    angle: f32,
    rgb: [u8; 3],
    opacity: f32,
) {
    let (dw, dh) = dst.dimensions();
    if dw == 0 || dh == 0 || sprite.w == 0 || sprite.h == 0 {
        return;
    }

    let (sin_a, cos_a) = angle.sin_cos();
    let forward = |lx: f32, ly: f32| -> (f32, f32) {
        (
            origin_x + lx * cos_a - ly * sin_a,
            origin_y + lx * sin_a + ly * cos_a,
        )
    };
    let x0 = sprite.off_x;
    let y0 = sprite.off_y;
    let x1 = sprite.off_x + sprite.w as f32;
    let y1 = sprite.off_y + sprite.h as f32;
    let corners = [forward(x0, y0), forward(x1, y0), forward(x0, y1), forward(x1, y1)];

    let min_x = corners.iter().map(|c| c.0).fold(f32::MAX, f32::min).floor().max(0.0) as u32;
    let min_y = corners.iter().map(|c| c.1).fold(f32::MAX, f32::min).floor().max(0.0) as u32;
    let max_x = (corners.iter().map(|c| c.0).fold(f32::MIN, f32::max).ceil() as i64).clamp(0, dw as i64) as u32;
    let max_y = (corners.iter().map(|c| c.1).fold(f32::MIN, f32::max).ceil() as i64).clamp(0, dh as i64) as u32;

    for y in min_y..max_y {
        for x in min_x..max_x {
            // Inverse-rotate back into sprite space.
            let px = x as f32 + 0.5 - origin_x;
            let py = y as f32 + 0.5 - origin_y;
            let lx = px * cos_a + py * sin_a - sprite.off_x;
            let ly = -px * sin_a + py * cos_a - sprite.off_y;
            if lx < 0.0 || ly < 0.0 || lx >= sprite.w as f32 || ly >= sprite.h as f32 {
                continue;
            }
            let cov = sprite.coverage[ly as usize * sprite.w as usize + lx as usize];
            if cov <= 0.001 {
                continue;
            }
            let top = Rgba([rgb[0], rgb[1], rgb[2], (cov * 255.0).round() as u8]);
            let base = *dst.get_pixel(x, y);
            dst.put_pixel(x, y, raster::blend_pixel(base, top, Blend::Normal, opacity));
        }
    }
}

/// Scatter random text instances from the enabled category pools across the
/// frame. Empty pools and missing fonts are strict no-ops.
pub fn glitch_text(src: &RgbaImage, fx: &EffectState) -> RgbaImage {
    let w = src.width();
    let h = src.height();
    if w == 0 || h == 0 {
        return src.clone();
    }

    let texts = fx.active_texts();
    let colors = fx.active_colors();
    if texts.is_empty() || colors.is_empty() {
        return src.clone();
    }
    let Some(font) = overlay_font() else {
        return src.clone();
    };

    let amount = fx.scalar("amount");
    let size = fx.scalar("size").max(1.0);
    let opacity = fx.scalar("opacity").clamp(0.0, 1.0);
    let rotation = fx.scalar("rotation");
    let count = amount.ceil() as i32;
    if count <= 0 || opacity <= 0.0 {
        return src.clone();
    }

    // Each distinct string rasterizes once per call; placement varies.
    let mut sprites: HashMap<&str, Option<TextSprite>> = HashMap::new();
    let mut rng = rand::rng();
    let mut out = src.clone();

    for _ in 0..count {
        let text = texts[rng.random_range(0..texts.len())];
        let rgb = colors[rng.random_range(0..colors.len())];
        let x = rng.random::<f32>() * w as f32;
        let y = rng.random::<f32>() * h as f32;
        let jitter = rng.random::<f32>() * 20.0 - 10.0;
        let angle = (rotation + jitter).to_radians();

        let sprite = sprites.entry(text).or_insert_with(|| rasterize_line(font, text, size));
        if let Some(sprite) = sprite {
            draw_sprite_rotated(&mut out, sprite, x, y, angle, rgb, opacity);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FilterId;
    use crate::state::EffectStates;

    fn text_state() -> crate::state::EffectState {
        EffectStates::defaults().get(FilterId::GlitchText).clone()
    }

    #[test]
    fn empty_pools_are_a_strict_no_op() {
        let src = RgbaImage::from_pixel(20, 20, Rgba([1, 2, 3, 255]));
        // No text categories, no color categories selected.
        assert_eq!(glitch_text(&src, &text_state()), src);

        // Texts without colors is still empty-pool.
        let mut fx = text_state();
        fx.set_text_type("404", true);
        assert_eq!(glitch_text(&src, &fx), src);

        // Colors without texts likewise.
        let mut fx = text_state();
        fx.set_color_type("white", true);
        assert_eq!(glitch_text(&src, &fx), src);
    }

    #[test]
    fn active_pools_preserve_dimensions() {
        let mut fx = text_state();
        fx.set_text_type("error", true);
        fx.set_color_type("blue", true);
        fx.set_scalar("amount", 3.0);
        let src = RgbaImage::from_pixel(64, 48, Rgba([10, 10, 10, 255]));
        let out = glitch_text(&src, &fx);
        assert_eq!(out.dimensions(), (64, 48));
    }

    #[test]
    fn degenerate_buffers_pass_through() {
        let mut fx = text_state();
        fx.set_text_type("sad", true);
        fx.set_color_type("black", true);
        let empty = RgbaImage::new(0, 0);
        assert_eq!(glitch_text(&empty, &fx).dimensions(), (0, 0));
    }

    #[test]
    fn zero_amount_draws_nothing() {
        let mut fx = text_state();
        fx.set_text_type("404", true);
        fx.set_color_type("white", true);
        fx.set_scalar("amount", 0.0);
        let src = RgbaImage::from_pixel(32, 32, Rgba([5, 5, 5, 255]));
        assert_eq!(glitch_text(&src, &fx), src);
    }
}
