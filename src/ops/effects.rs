// ============================================================================
// GLITCH EFFECTS — buffer-manipulation filters
// ============================================================================
//
// Every function here is a pure transform: it reads a source buffer and its
// filter state, and returns a new buffer of identical dimensions. Stochastic
// filters draw from the thread's uniform RNG; a probability gate of zero is
// an exact no-op.
//
// Effects are grouped into categories:
//   - Channel:  RGB Shift, TV Static
//   - Geometry: Wave, VHS Distortion, Stretch/Smear, Echo Trails
//   - Texture:  Noise, Scanlines, Pixelate, Burned Edge
//   - Chaos:    Corrupt Edges, Circuit Bend, Fractal Distortion
// ============================================================================

use std::f32::consts::PI;

use image::{Rgba, RgbaImage};
use rand::Rng;
use rayon::prelude::*;

use crate::raster::{self, Blend};
use crate::state::EffectState;

/// Clamp a coordinate into [0, max-1]. Callers guarantee `max > 0`.
#[inline]
fn clamp_coord(v: i32, max: u32) -> u32 {
    v.clamp(0, max as i32 - 1) as u32
}

// ============================================================================
// CHANNEL EFFECTS
// ============================================================================

/// Chromatic misregistration: each output channel samples the corresponding
/// source channel at `x + offset`, clamped to the row. All-zero offsets are
/// the identity transform.
pub fn rgb_shift(src: &RgbaImage, fx: &EffectState) -> RgbaImage {
    let w = src.width();
    let h = src.height();
    if w == 0 || h == 0 {
        return src.clone();
    }

    let offsets = [
        fx.scalar("redOffset").round() as i32,
        fx.scalar("greenOffset").round() as i32,
        fx.scalar("blueOffset").round() as i32,
    ];

    let src_raw = src.as_raw();
    let stride = w as usize * 4;
    let mut dst_raw = vec![0u8; stride * h as usize];

    dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let row_in = &src_raw[y * stride..(y + 1) * stride];
        for x in 0..w as i32 {
            let pi = x as usize * 4;
            for (c, &off) in offsets.iter().enumerate() {
                let sx = clamp_coord(x + off, w) as usize;
                row_out[pi + c] = row_in[sx * 4 + c];
            }
            row_out[pi + 3] = row_in[pi + 3];
        }
    });

    RgbaImage::from_raw(w, h, dst_raw).unwrap()
}

/// Per-pixel probability gate replaces the RGB triplet with one shared
/// random gray value.
pub fn tv_static(src: &RgbaImage, fx: &EffectState) -> RgbaImage {
    let w = src.width();
    let h = src.height();
    let amount = fx.scalar("amount");
    if w == 0 || h == 0 || amount <= 0.0 {
        return src.clone();
    }

    let mut out = src.clone();
    let stride = w as usize * 4;
    out.as_mut().par_chunks_mut(stride).for_each(|row| {
        let mut rng = rand::rng();
        for x in 0..w as usize {
            if rng.random::<f32>() < amount {
                let gray = (rng.random::<f32>() * 255.0) as u8;
                let pi = x * 4;
                row[pi] = gray;
                row[pi + 1] = gray;
                row[pi + 2] = gray;
            }
        }
    });
    out
}

// ============================================================================
// GEOMETRY EFFECTS
// ============================================================================

/// Column-by-column sinusoidal displacement under a shear about the canvas
/// center. Displaced-out rows leave transparency behind.
pub fn wave(src: &RgbaImage, fx: &EffectState) -> RgbaImage {
    let w = src.width();
    let h = src.height();
    if w == 0 || h == 0 {
        return src.clone();
    }

    let pattern = fx.scalar("pattern");
    let skew = fx.scalar("skew");
    let frequency = 0.01 + pattern * 0.03;
    let amplitude = h as f32 * (0.02 + pattern * 0.08);
    let shear = (skew * 30.0).to_radians().tan();
    let center_x = w as f32 / 2.0;

    let mut out = RgbaImage::new(w, h);
    for x in 0..w {
        let offset = ((x as f32 * frequency).sin() * amplitude + shear * (x as f32 - center_x))
            .round() as i32;
        for y in 0..h {
            let dy = y as i32 + offset;
            if dy >= 0 && dy < h as i32 {
                out.put_pixel(x, dy as u32, *src.get_pixel(x, y));
            }
        }
    }
    out
}

/// Horizontal band tearing: the frame is partitioned into bands, each
/// redrawn with an independent random offset and slightly jittered height.
pub fn vhs_distortion(src: &RgbaImage, fx: &EffectState) -> RgbaImage {
    let w = src.width();
    let h = src.height();
    if w == 0 || h == 0 {
        return src.clone();
    }

    let strength = fx.scalar("strength");
    let bands = (10.0 + strength * 20.0).floor() as u32;
    let band_h = h / bands;
    if band_h == 0 {
        // Frame shorter than the band count — nothing sensible to tear.
        return src.clone();
    }

    let mut rng = rand::rng();
    let mut out = RgbaImage::new(w, h);
    for i in 0..bands {
        let y = (i * band_h) as i32;
        let offset = (rng.random::<f32>() * strength * w as f32 * 0.1) as i32;
        let bh = (band_h as f32 + rng.random::<f32>() * band_h as f32 * 0.2) as u32;
        raster::draw_region(&mut out, src, 0, y, w, bh, offset, y, 1.0);
    }
    out
}

/// Random horizontal strips resampled to a stretched width and composited
/// back at reduced opacity.
pub fn stretch_smear(src: &RgbaImage, fx: &EffectState) -> RgbaImage {
    let w = src.width();
    let h = src.height();
    let amount = fx.scalar("amount");
    let strips = (20.0 * amount).floor() as i32;
    if w == 0 || h == 0 || strips <= 0 {
        return src.clone();
    }

    let max_strip_h = ((h as f32 * 0.1).floor() as u32).max(1);
    let max_stretch = ((w as f32 * 0.2).floor() as u32).max(10);

    let mut rng = rand::rng();
    let mut out = src.clone();
    for _ in 0..strips {
        let y = rng.random_range(0..h) as i32;
        let strip_h = rng.random_range(1..=max_strip_h);
        let stretch = rng.random_range(10..=max_stretch);
        let grow_left = rng.random::<f32>() > 0.5;

        // The stretched strip overhangs one edge so the visible part smears.
        let dx = if grow_left { -(stretch as i32) } else { 0 };
        raster::draw_region_scaled(&mut out, src, 0, y, w, strip_h, dx, y, w + stretch, strip_h, 0.7);
    }
    out
}

/// One translated, half-opacity copy of the frame. Magnitude scales with
/// `amount`, angle sweeps the full circle with `direction`.
pub fn echo_trails(src: &RgbaImage, fx: &EffectState) -> RgbaImage {
    let w = src.width();
    let h = src.height();
    if w == 0 || h == 0 {
        return src.clone();
    }

    let amount = fx.scalar("amount");
    let direction = fx.scalar("direction");
    let max_offset = w as f32 * 0.1 * amount;
    let angle = direction * PI * 2.0;
    let dx = (angle.cos() * max_offset).round() as i32;
    let dy = (angle.sin() * max_offset).round() as i32;

    let mut out = src.clone();
    raster::draw_image(&mut out, src, dx, dy, 0.5);
    out
}

// ============================================================================
// TEXTURE EFFECTS
// ============================================================================

/// Block-based stochastic noise: each block rolls a probability gate and,
/// if triggered, perturbs its pixels by an independent random delta.
pub fn noise(src: &RgbaImage, fx: &EffectState) -> RgbaImage {
    let w = src.width();
    let h = src.height();
    let amount = fx.scalar("amount");
    if w == 0 || h == 0 || amount <= 0.0 {
        return src.clone();
    }

    let block = (fx.scalar("size").floor() as u32).max(1);
    let intensity = amount * 255.0;

    let mut rng = rand::rng();
    let mut out = src.clone();
    for by in (0..h).step_by(block as usize) {
        for bx in (0..w).step_by(block as usize) {
            if rng.random::<f32>() >= amount * 0.3 {
                continue;
            }
            let delta = (rng.random::<f32>() - 0.5) * intensity;
            for y in by..(by + block).min(h) {
                for x in bx..(bx + block).min(w) {
                    let px = out.get_pixel_mut(x, y);
                    for c in 0..3 {
                        px[c] = (px[c] as f32 + delta * rng.random::<f32>()).clamp(0.0, 255.0) as u8;
                    }
                }
            }
        }
    }
    out
}

/// Periodic darkening bands drawn onto an overlay surface, composited with
/// an overlay blend. Radial mode replaces the horizontal bands with
/// 2°-stepped radiating spokes.
pub fn scanlines(src: &RgbaImage, fx: &EffectState) -> RgbaImage {
    let w = src.width();
    let h = src.height();
    let spacing = (fx.scalar("spacing").floor() as i32).max(1);
    let thickness = (fx.scalar("thickness").floor() as i32).max(1);
    let opacity = fx.scalar("opacity").clamp(0.0, 1.0);
    if w == 0 || h == 0 || opacity <= 0.0 {
        return src.clone();
    }

    // Accumulate band coverage first; overlapping fills compound alpha the
    // way repeated draws on a shared overlay surface do.
    let mut coverage = vec![0f32; w as usize * h as usize];
    let cover = |c: &mut f32| *c += opacity * (1.0 - *c);

    if fx.toggle("radial") {
        // Spokes every 2°, dashed along the ray with a 1px gap per period.
        // Spacing of 1 leaves a zero-width dash — nothing to draw.
        if spacing <= 1 {
            return src.clone();
        }
        let cx = w as f32 / 2.0;
        let cy = h as f32 / 2.0;
        let phase = (w as f32 * w as f32 + h as f32 * h as f32).sqrt() * 1.5;
        let step_rad = 2.0f32.to_radians();
        for y in 0..h {
            for x in 0..w {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                let r = (dx * dx + dy * dy).sqrt();
                if r < 0.5 {
                    continue;
                }
                let ang = dy.atan2(dx).rem_euclid(step_rad);
                let delta = ang.min(step_rad - ang);
                let perp = r * delta.sin();
                let along = (r + phase).rem_euclid(spacing as f32);
                if perp <= thickness as f32 / 2.0 && along < (spacing - 1) as f32 {
                    cover(&mut coverage[(y * w + x) as usize]);
                }
            }
        }
    } else {
        let mut y = 0i32;
        while y < h as i32 {
            for t in 0..thickness {
                let yy = y + t;
                if yy >= h as i32 {
                    break;
                }
                for x in 0..w {
                    cover(&mut coverage[(yy as u32 * w + x) as usize]);
                }
            }
            y += spacing;
        }
    }

    let mut out = src.clone();
    for y in 0..h {
        for x in 0..w {
            let a = coverage[(y * w + x) as usize];
            if a <= 0.0 {
                continue;
            }
            let band = Rgba([0, 0, 0, (a * 255.0).round() as u8]);
            let base = *out.get_pixel(x, y);
            out.put_pixel(x, y, raster::blend_pixel(base, band, Blend::Overlay, 1.0));
        }
    }
    out
}

/// Block-average pixelation with an opacity blend against the unpixelated
/// original and optional per-block random gating.
pub fn pixelate(src: &RgbaImage, fx: &EffectState) -> RgbaImage {
    let w = src.width();
    let h = src.height();
    if w == 0 || h == 0 {
        return src.clone();
    }

    let block = (fx.scalar("size").floor() as u32).max(2);
    let intensity = fx.scalar("intensity").clamp(0.0, 1.0);
    let random = fx.scalar("random").clamp(0.0, 1.0);
    if intensity <= 0.0 {
        return src.clone();
    }

    // Build the fully pixelated copy: every block collapses to its average.
    let mut pixelated = src.clone();
    let cols = w.div_ceil(block);
    let rows = h.div_ceil(block);
    for by in 0..rows {
        for bx in 0..cols {
            let x0 = bx * block;
            let y0 = by * block;
            let x1 = (x0 + block).min(w);
            let y1 = (y0 + block).min(h);

            let mut sum = [0u32; 4];
            let mut count = 0u32;
            for y in y0..y1 {
                for x in x0..x1 {
                    let px = src.get_pixel(x, y);
                    for c in 0..4 {
                        sum[c] += px[c] as u32;
                    }
                    count += 1;
                }
            }
            let avg = Rgba([
                (sum[0] / count) as u8,
                (sum[1] / count) as u8,
                (sum[2] / count) as u8,
                (sum[3] / count) as u8,
            ]);
            for y in y0..y1 {
                for x in x0..x1 {
                    pixelated.put_pixel(x, y, avg);
                }
            }
        }
    }

    if intensity >= 1.0 && random <= 0.0 {
        return pixelated;
    }

    // Blend pixelated blocks over the original, gated per block when the
    // random fraction is active.
    let mut rng = rand::rng();
    let mut out = src.clone();
    for by in 0..rows {
        for bx in 0..cols {
            if random > 0.0 && rng.random::<f32>() >= random {
                continue;
            }
            let x0 = (bx * block) as i32;
            let y0 = (by * block) as i32;
            raster::draw_region(&mut out, &pixelated, x0, y0, block, block, x0, y0, intensity);
        }
    }
    out
}

/// Radial gradient mask fading the frame toward its edges: white mode adds
/// light, black mode erases alpha. Polarity flips with `invertEdge`.
pub fn burned_edge(src: &RgbaImage, fx: &EffectState) -> RgbaImage {
    let w = src.width();
    let h = src.height();
    if w == 0 || h == 0 {
        return src.clone();
    }

    let amount = fx.scalar("amount");
    let feather = fx.scalar("feather").clamp(0.0, 1.0);
    let white = fx.toggle("white");
    let invert_edge = fx.toggle("invertEdge");
    let is_white = if invert_edge { !white } else { white };

    let cx = w as f32 / 2.0;
    let cy = h as f32 / 2.0;
    let outer = (cx * cx + cy * cy).sqrt();
    let inner = outer * (1.0 - amount).max(0.0);
    let ramp_start = (1.0 - feather).max(0.0);

    let mut out = src.clone();
    let stride = w as usize * 4;
    out.as_mut().par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
        for x in 0..w as usize {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let r = (dx * dx + dy * dy).sqrt();

            let t = if outer - inner <= f32::EPSILON {
                if r >= outer { 1.0 } else { 0.0 }
            } else {
                ((r - inner) / (outer - inner)).clamp(0.0, 1.0)
            };
            let alpha = if ramp_start >= 1.0 {
                if t >= 1.0 { 1.0 } else { 0.0 }
            } else if t <= ramp_start {
                0.0
            } else {
                (t - ramp_start) / (1.0 - ramp_start)
            };
            if alpha <= 0.0 {
                continue;
            }

            let pi = x * 4;
            let base = Rgba([row[pi], row[pi + 1], row[pi + 2], row[pi + 3]]);
            let blended = if is_white {
                raster::blend_pixel(base, Rgba([255, 255, 255, 255]), Blend::Additive, alpha)
            } else {
                raster::blend_pixel(base, Rgba([0, 0, 0, 255]), Blend::Erase, alpha)
            };
            row[pi] = blended[0];
            row[pi + 1] = blended[1];
            row[pi + 2] = blended[2];
            row[pi + 3] = blended[3];
        }
    });
    out
}

// ============================================================================
// CHAOS EFFECTS
// ============================================================================

/// The most elaborate filter: a density-controlled number of corruption
/// regions near random edges, each hit with one of five operators (block
/// shift, color corruption, pixelation, sliced line displacement, bit-level
/// corruption). High chaos additionally injects full-width tear lines.
pub fn corrupt_edges(src: &RgbaImage, fx: &EffectState) -> RgbaImage {
    let w = src.width() as i32;
    let h = src.height() as i32;
    if w == 0 || h == 0 {
        return src.clone();
    }

    let amount = fx.scalar("amount");
    let density = fx.scalar("density");
    let thickness = fx.scalar("thickness");
    let intensity = fx.scalar("intensity");
    let chaos = fx.scalar("chaos");
    let invert_color = fx.toggle("invertColor");
    let do_pixelate = fx.toggle("pixelate");
    let rgb_split = fx.toggle("rgbSplit");

    let pristine = src.clone();
    let mut out = src.clone();
    let mut rng = rand::rng();

    let edge_width = (w as f32 * 0.15 * amount).floor() as i32;
    let corruptions = (10.0 + density * 50.0).floor() as i32;

    for _ in 0..corruptions {
        let edge = rng.random_range(0..4);
        let kind = rng.random_range(0..5);

        // Region near the chosen edge, sized by margin / thickness / chaos.
        let along_edge = (edge_width as f32 * (0.5 + rng.random::<f32>() * 0.5)).floor() as i32;
        let across_edge = (thickness * (1.0 + chaos * 5.0)).floor() as i32;
        let (x1, y1, cw, ch) = match edge {
            0 => (0, rng.random_range(0..h), along_edge, across_edge),
            1 => (w - along_edge, rng.random_range(0..h), along_edge, across_edge),
            2 => (rng.random_range(0..w), 0, across_edge, along_edge),
            _ => (rng.random_range(0..w), h - along_edge, across_edge, along_edge),
        };
        let x2 = (x1 + cw).min(w);
        let y2 = (y1 + ch).min(h);

        match kind {
            // Block shift: redraw the region horizontally displaced.
            0 => {
                if cw > 0 && ch > 0 {
                    let shift = (cw as f32 * chaos * 2.0).floor() as i32 - cw;
                    raster::draw_region(
                        &mut out, &pristine, x1, y1, cw as u32, ch as u32,
                        x1 + shift, y1, 0.7 + intensity * 0.3,
                    );
                }
            }
            // Color corruption: channel split, inversion, or random B/W.
            1 => {
                for y in y1.max(0)..y2 {
                    for x in x1.max(0)..x2 {
                        if rgb_split && rng.random::<f32>() < 0.5 {
                            let offset = (chaos * 10.0).floor() as i32;
                            let r = out.get_pixel(clamp_coord(x + offset, w as u32), y as u32)[0];
                            let g = out.get_pixel(clamp_coord(x - offset, w as u32), y as u32)[1];
                            let px = out.get_pixel_mut(x as u32, y as u32);
                            px[0] = r;
                            px[1] = g;
                        } else if invert_color {
                            let px = out.get_pixel_mut(x as u32, y as u32);
                            for c in 0..3 {
                                px[c] = 255 - px[c];
                            }
                        } else if rng.random::<f32>() < intensity {
                            let px = out.get_pixel_mut(x as u32, y as u32);
                            for c in 0..3 {
                                px[c] = if rng.random::<f32>() < 0.5 { 0 } else { 255 };
                            }
                        }
                    }
                }
            }
            // Pixelation, only when the sub-toggle allows it.
            2 => {
                if do_pixelate {
                    let ps = ((thickness / 2.0).floor() as i32).max(2);
                    let mut py = (y1.max(0) / ps) * ps;
                    while py < y2 {
                        let mut px = (x1.max(0) / ps) * ps;
                        while px < x2 {
                            let sample = *out.get_pixel(
                                clamp_coord(px, w as u32),
                                clamp_coord(py, h as u32),
                            );
                            for oy in 0..ps {
                                for ox in 0..ps {
                                    let tx = px + ox;
                                    let ty = py + oy;
                                    if tx >= 0 && ty >= 0 && tx < w && ty < h {
                                        let p = out.get_pixel_mut(tx as u32, ty as u32);
                                        p[0] = sample[0];
                                        p[1] = sample[1];
                                        p[2] = sample[2];
                                    }
                                }
                            }
                            px += ps;
                        }
                        py += ps;
                    }
                }
            }
            // Sliced line displacement: split the region into lines, shift
            // each one independently.
            3 => {
                let lines = (3.0 + chaos * 7.0).floor() as i32;
                let line_h = (ch / lines).max(1);
                for line in 0..lines {
                    let ly = y1 + line * line_h;
                    let lh = line_h.min(y2 - ly);
                    if lh > 0 && cw > 0 {
                        let shift = ((rng.random::<f32>() - 0.5) * cw as f32 * 2.0 * chaos) as i32;
                        raster::draw_region(
                            &mut out, &pristine, x1, ly, cw as u32, lh as u32,
                            x1 + shift, ly, 0.8 + intensity * 0.2,
                        );
                    }
                }
            }
            // Bit-level corruption: full randomization or single bit flips.
            _ => {
                for y in y1.max(0)..y2 {
                    for x in x1.max(0)..x2 {
                        if rng.random::<f32>() < intensity * 0.7 {
                            let px = out.get_pixel_mut(x as u32, y as u32);
                            if rng.random::<f32>() < 0.3 {
                                for c in 0..3 {
                                    px[c] = rng.random::<u8>();
                                }
                            } else {
                                for c in 0..3 {
                                    px[c] ^= 1u8 << rng.random_range(0..8);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    // Occasional full-width horizontal tear lines.
    if chaos > 0.3 {
        let tears = (chaos * 5.0).floor() as i32;
        for _ in 0..tears {
            let y = rng.random_range(0..h);
            let th = ((thickness * (0.5 + rng.random::<f32>())).floor() as u32).max(1);
            let offset = ((rng.random::<f32>() - 0.5) * w as f32 * 0.2 * chaos) as i32;
            raster::draw_region(&mut out, &pristine, 0, y, w as u32, th, offset, y, 0.7 + intensity * 0.3);
        }
    }

    out
}

/// Buffer-internal transposition: swaps a chaos-proportional number of
/// random rectangular blocks with a horizontally offset counterpart.
pub fn circuit_bend(src: &RgbaImage, fx: &EffectState) -> RgbaImage {
    let w = src.width();
    let h = src.height();
    if w == 0 || h == 0 {
        return src.clone();
    }

    let chaos = fx.scalar("chaos");
    let count = (w as f32 * h as f32 * chaos * 0.001).floor() as u32;
    if count == 0 {
        return src.clone();
    }
    let max_offset = ((w as f32 * 0.1).floor() as u32).max(10);

    let mut out = src.clone();
    let mut rng = rand::rng();
    let len = out.as_raw().len();
    let row = w as usize;

    for _ in 0..count {
        let x = rng.random_range(0..w) as usize;
        let y = rng.random_range(0..h) as usize;
        let bw = rng.random_range(10..=max_offset) as usize;
        let bh = rng.random_range(1..=10usize);

        let src_off = (y * row + x) * 4;
        let tgt_off = (y * row + ((x + bw) % row)) * 4;

        let data = out.as_mut();
        for dy in 0..bh {
            if y + dy >= h as usize {
                break;
            }
            for dx in 0..bw {
                if x + dx >= w as usize {
                    break;
                }
                let s = src_off + (dy * row + dx) * 4;
                let t = tgt_off + (dy * row + dx) * 4;
                if s + 2 < len && t + 2 < len {
                    for c in 0..3 {
                        data.swap(s + c, t + c);
                    }
                }
            }
        }
    }
    out
}

/// Iterative recursive subdivision: each pass redraws a complexity-driven
/// grid of cells with random jitter, optional rotation and mirroring; the
/// pristine original is blended back in for cohesion.
pub fn fractal_distortion(src: &RgbaImage, fx: &EffectState) -> RgbaImage {
    let w = src.width();
    let h = src.height();
    if w == 0 || h == 0 {
        return src.clone();
    }

    let complexity = fx.scalar("complexity");
    let intensity = fx.scalar("intensity");
    let iterations = (fx.scalar("iterations").floor() as u32).max(1);
    let mirror = fx.toggle("mirror");
    let rotate = fx.toggle("rotate");

    let scale_factor = 1.0 - complexity * 0.2;
    let divisions = ((2.0 + complexity * 4.0).floor() as u32).max(2);

    let original = src.clone();
    let mut work = src.clone();
    let mut rng = rand::rng();

    for i in 0..iterations {
        let temp = work.clone();
        let mut next = RgbaImage::new(w, h);
        let cell_w = w as f32 / divisions as f32;
        let cell_h = h as f32 / divisions as f32;

        for gy in 0..divisions {
            for gx in 0..divisions {
                let sx = gx as f32 * cell_w;
                let sy = gy as f32 * cell_h;
                let off_x = (rng.random::<f32>() - 0.5) * cell_w * 0.2 * intensity;
                let off_y = (rng.random::<f32>() - 0.5) * cell_h * 0.2 * intensity;
                let scale_x = scale_factor * (1.0 + (rng.random::<f32>() - 0.5) * 0.2 * intensity);
                let scale_y = scale_factor * (1.0 + (rng.random::<f32>() - 0.5) * 0.2 * intensity);
                let angle = if rotate {
                    (rng.random::<f32>() - 0.5) * PI * 0.1 * intensity
                } else {
                    0.0
                };
                let mirrored = mirror && rng.random::<f32>() < 0.3 * intensity;

                draw_cell_transformed(
                    &mut next, &temp,
                    sx, sy, cell_w, cell_h,
                    sx + cell_w / 2.0, sy + cell_h / 2.0,
                    scale_x, scale_y, angle, mirrored, off_x, off_y,
                );
            }
        }

        if i == iterations - 1 {
            raster::draw_image(&mut next, &original, 0, 0, 0.3);
        }
        work = next;
    }

    // Final cohesion pass: overlay-blend the original at 20%.
    for y in 0..h {
        for x in 0..w {
            let base = *work.get_pixel(x, y);
            let top = *original.get_pixel(x, y);
            work.put_pixel(x, y, raster::blend_pixel(base, top, Blend::Overlay, 0.2));
        }
    }
    work
}

/// Draw one source cell into `dst` under scale/rotate/mirror about `(cx, cy)`
/// plus a positional jitter, inverse-mapped with nearest sampling.
#[allow(clippy::too_many_arguments)]
fn draw_cell_transformed(
    dst: &mut RgbaImage,
    src: &RgbaImage,
    sx: f32,
    sy: f32,
    sw: f32,
    sh: f32,
    cx: f32,
    cy: f32,
    scale_x: f32,
    scale_y: f32,
    angle: f32,
    mirrored: bool,
    off_x: f32,
    off_y: f32,
) {
    if sw <= 0.0 || sh <= 0.0 || scale_x.abs() < 1e-4 || scale_y.abs() < 1e-4 {
        return;
    }
    let (w, h) = dst.dimensions();

    // Forward-map the cell corners to bound the destination scan area.
    let (sin_a, cos_a) = angle.sin_cos();
    let forward = |u: f32, v: f32| -> (f32, f32) {
        let mut lx = (-sw / 2.0 + off_x + u) * scale_x;
        let ly = (-sh / 2.0 + off_y + v) * scale_y;
        if mirrored {
            lx = -lx;
        }
        (cx + lx * cos_a - ly * sin_a, cy + lx * sin_a + ly * cos_a)
    };
    let corners = [forward(0.0, 0.0), forward(sw, 0.0), forward(0.0, sh), forward(sw, sh)];
    let min_x = corners.iter().map(|c| c.0).fold(f32::MAX, f32::min).floor().max(0.0) as u32;
    let min_y = corners.iter().map(|c| c.1).fold(f32::MAX, f32::min).floor().max(0.0) as u32;
    let max_x = (corners.iter().map(|c| c.0).fold(f32::MIN, f32::max).ceil() as i64).clamp(0, w as i64) as u32;
    let max_y = (corners.iter().map(|c| c.1).fold(f32::MIN, f32::max).ceil() as i64).clamp(0, h as i64) as u32;

    for y in min_y..max_y {
        for x in min_x..max_x {
            // Inverse map back into cell-local coordinates.
            let px = x as f32 + 0.5 - cx;
            let py = y as f32 + 0.5 - cy;
            let mut lx = px * cos_a + py * sin_a;
            let ly = -px * sin_a + py * cos_a;
            if mirrored {
                lx = -lx;
            }
            let u = lx / scale_x + sw / 2.0 - off_x;
            let v = ly / scale_y + sh / 2.0 - off_y;
            if u < 0.0 || u >= sw || v < 0.0 || v >= sh {
                continue;
            }
            let top = raster::sample_clamped(src, (sx + u) as i32, (sy + v) as i32);
            let base = *dst.get_pixel(x, y);
            dst.put_pixel(x, y, raster::blend_pixel(base, top, Blend::Normal, 1.0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FilterId;
    use crate::state::{EffectState, EffectStates};

    fn state_for(id: FilterId) -> EffectState {
        EffectStates::defaults().get(id).clone()
    }

    fn gradient(w: u32, h: u32) -> RgbaImage {
        let mut img = RgbaImage::new(w, h);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = Rgba([(x * 13 % 256) as u8, (y * 29 % 256) as u8, ((x + y) * 7 % 256) as u8, 255]);
        }
        img
    }

    #[test]
    fn rgb_shift_zero_offsets_is_identity() {
        let src = gradient(24, 16);
        let out = rgb_shift(&src, &state_for(FilterId::RgbShift));
        assert_eq!(src, out);
    }

    #[test]
    fn rgb_shift_moves_only_the_shifted_channel() {
        let mut fx = state_for(FilterId::RgbShift);
        fx.set_scalar("redOffset", 3.0);
        let src = gradient(24, 16);
        let out = rgb_shift(&src, &fx);
        assert_eq!(out.dimensions(), src.dimensions());
        // Red comes from x+3; green and blue are untouched.
        assert_eq!(out.get_pixel(5, 4)[0], src.get_pixel(8, 4)[0]);
        assert_eq!(out.get_pixel(5, 4)[1], src.get_pixel(5, 4)[1]);
        assert_eq!(out.get_pixel(5, 4)[2], src.get_pixel(5, 4)[2]);
        // Clamped at the right edge.
        assert_eq!(out.get_pixel(23, 4)[0], src.get_pixel(23, 4)[0]);
    }

    #[test]
    fn tv_static_closed_gate_is_identity() {
        let mut fx = state_for(FilterId::TvStatic);
        fx.set_scalar("amount", 0.0);
        let src = gradient(16, 16);
        assert_eq!(tv_static(&src, &fx), src);
    }

    #[test]
    fn tv_static_full_gate_grays_every_pixel() {
        let mut fx = state_for(FilterId::TvStatic);
        fx.set_scalar("amount", 1.0);
        let out = tv_static(&gradient(16, 16), &fx);
        for px in out.pixels() {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
        }
    }

    #[test]
    fn noise_closed_gate_is_identity() {
        let mut fx = state_for(FilterId::Noise);
        fx.set_scalar("amount", 0.0);
        let src = gradient(16, 16);
        assert_eq!(noise(&src, &fx), src);
    }

    #[test]
    fn wave_preserves_dimensions_and_columns() {
        let src = gradient(32, 32);
        let out = wave(&src, &state_for(FilterId::Wave));
        assert_eq!(out.dimensions(), src.dimensions());
    }

    #[test]
    fn vhs_distortion_preserves_dimensions() {
        let fx = state_for(FilterId::VhsDistortion);
        let out = vhs_distortion(&gradient(40, 60), &fx);
        assert_eq!(out.dimensions(), (40, 60));
        // A frame shorter than the band count passes through untouched.
        let tiny = gradient(8, 4);
        assert_eq!(vhs_distortion(&tiny, &fx), tiny);
    }

    #[test]
    fn scanlines_darken_band_rows_only() {
        let mut fx = state_for(FilterId::Scanlines);
        fx.set_scalar("spacing", 10.0);
        fx.set_scalar("thickness", 2.0);
        fx.set_scalar("opacity", 1.0);
        let src = RgbaImage::from_pixel(8, 20, Rgba([100, 100, 100, 255]));
        let out = scanlines(&src, &fx);
        assert!(out.get_pixel(0, 0)[0] < 100);
        assert!(out.get_pixel(0, 1)[0] < 100);
        assert_eq!(out.get_pixel(0, 5)[0], 100);

        // Radial mode with spacing 1 has a zero-width dash — exact no-op.
        let mut narrow = state_for(FilterId::Scanlines);
        narrow.set_scalar("spacing", 1.0);
        narrow.set_toggle("radial", true);
        assert_eq!(scanlines(&src, &narrow), src);
    }

    #[test]
    fn radial_scanlines_preserve_dimensions() {
        let mut fx = state_for(FilterId::Scanlines);
        fx.set_toggle("radial", true);
        let out = scanlines(&gradient(31, 17), &fx);
        assert_eq!(out.dimensions(), (31, 17));
    }

    #[test]
    fn stretch_smear_zero_amount_is_identity() {
        let mut fx = state_for(FilterId::StretchSmear);
        fx.set_scalar("amount", 0.0);
        let src = gradient(32, 32);
        assert_eq!(stretch_smear(&src, &fx), src);
    }

    #[test]
    fn echo_trails_preserves_dimensions() {
        let out = echo_trails(&gradient(30, 20), &state_for(FilterId::EchoTrails));
        assert_eq!(out.dimensions(), (30, 20));
    }

    #[test]
    fn circuit_bend_zero_chaos_is_identity() {
        let mut fx = state_for(FilterId::CircuitBend);
        fx.set_scalar("chaos", 0.0);
        let src = gradient(32, 32);
        assert_eq!(circuit_bend(&src, &fx), src);
    }

    #[test]
    fn circuit_bend_extreme_chaos_is_total() {
        let mut fx = state_for(FilterId::CircuitBend);
        fx.set_scalar("chaos", 1.0);
        let out = circuit_bend(&gradient(64, 64), &fx);
        assert_eq!(out.dimensions(), (64, 64));
    }

    #[test]
    fn pixelate_uniform_image_is_unchanged() {
        let fx = state_for(FilterId::Pixelate);
        let src = RgbaImage::from_pixel(20, 20, Rgba([42, 43, 44, 255]));
        assert_eq!(pixelate(&src, &fx), src);
    }

    #[test]
    fn pixelate_full_intensity_averages_blocks() {
        let mut fx = state_for(FilterId::Pixelate);
        fx.set_scalar("size", 2.0);
        fx.set_scalar("intensity", 1.0);
        fx.set_scalar("random", 0.0);
        let mut src = RgbaImage::new(2, 2);
        src.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        src.put_pixel(1, 0, Rgba([255, 255, 255, 255]));
        src.put_pixel(0, 1, Rgba([0, 0, 0, 255]));
        src.put_pixel(1, 1, Rgba([255, 255, 255, 255]));
        let out = pixelate(&src, &fx);
        for px in out.pixels() {
            assert_eq!(px[0], 127);
        }
    }

    #[test]
    fn burned_edge_black_mode_erases_corner_alpha() {
        let mut fx = state_for(FilterId::BurnedEdge);
        fx.set_scalar("amount", 1.0);
        fx.set_scalar("feather", 1.0);
        let src = RgbaImage::from_pixel(21, 21, Rgba([50, 60, 70, 255]));
        let out = burned_edge(&src, &fx);
        assert!(out.get_pixel(0, 0)[3] < 255, "corner alpha survived the burn");
        assert_eq!(out.get_pixel(10, 10)[3], 255, "center must stay opaque");
    }

    #[test]
    fn burned_edge_white_mode_brightens_corners() {
        let mut fx = state_for(FilterId::BurnedEdge);
        fx.set_scalar("amount", 1.0);
        fx.set_scalar("feather", 1.0);
        fx.set_toggle("white", true);
        let src = RgbaImage::from_pixel(21, 21, Rgba([50, 60, 70, 255]));
        let out = burned_edge(&src, &fx);
        assert!(out.get_pixel(0, 0)[0] > 50);
        assert_eq!(*out.get_pixel(10, 10), Rgba([50, 60, 70, 255]));
    }

    #[test]
    fn burned_edge_invert_flips_polarity() {
        let mut fx = state_for(FilterId::BurnedEdge);
        fx.set_scalar("amount", 1.0);
        fx.set_scalar("feather", 1.0);
        fx.set_toggle("white", true);
        fx.set_toggle("invertEdge", true);
        let src = RgbaImage::from_pixel(21, 21, Rgba([50, 60, 70, 255]));
        let out = burned_edge(&src, &fx);
        // white XOR invertEdge — behaves like the black (erase) mode.
        assert!(out.get_pixel(0, 0)[3] < 255);
    }

    #[test]
    fn corrupt_edges_preserves_dimensions_at_extremes() {
        let mut fx = state_for(FilterId::CorruptEdges);
        fx.set_scalar("amount", 1.0);
        fx.set_scalar("density", 1.0);
        fx.set_scalar("thickness", 20.0);
        fx.set_scalar("intensity", 1.0);
        fx.set_scalar("chaos", 1.0);
        fx.set_toggle("invertColor", true);
        fx.set_toggle("pixelate", true);
        fx.set_toggle("rgbSplit", true);
        let out = corrupt_edges(&gradient(48, 48), &fx);
        assert_eq!(out.dimensions(), (48, 48));
    }

    #[test]
    fn fractal_distortion_preserves_dimensions_at_extremes() {
        let mut fx = state_for(FilterId::FractalDistortion);
        fx.set_scalar("complexity", 1.0);
        fx.set_scalar("intensity", 1.0);
        fx.set_scalar("iterations", 10.0);
        fx.set_toggle("mirror", true);
        fx.set_toggle("rotate", true);
        let out = fractal_distortion(&gradient(40, 30), &fx);
        assert_eq!(out.dimensions(), (40, 30));
    }

    #[test]
    fn every_effect_survives_degenerate_buffers() {
        let empty = RgbaImage::new(0, 0);
        let dot = gradient(1, 1);
        for (name, f) in [
            ("rgbShift", rgb_shift as fn(&RgbaImage, &EffectState) -> RgbaImage),
            ("noise", noise),
            ("wave", wave),
            ("scanlines", scanlines),
            ("tvStatic", tv_static),
            ("vhsDistortion", vhs_distortion),
            ("corruptEdges", corrupt_edges),
            ("circuitBend", circuit_bend),
            ("stretchSmear", stretch_smear),
            ("echoTrails", echo_trails),
            ("fractalDistortion", fractal_distortion),
            ("pixelate", pixelate),
            ("burnedEdge", burned_edge),
        ] {
            let id = FilterId::from_str(name).unwrap();
            let fx = state_for(id);
            assert_eq!(f(&empty, &fx).dimensions(), (0, 0), "{} on empty", name);
            assert_eq!(f(&dot, &fx).dimensions(), (1, 1), "{} on 1x1", name);
        }
    }
}
