// ============================================================================
// ADJUSTMENT FILTERS — uniform per-pixel color transforms
// ============================================================================
//
// These filters touch every pixel independently, so they share one
// rayon-parallelized helper. Alpha is preserved unless a transform says
// otherwise.
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

use crate::state::EffectState;

/// Apply a per-pixel transform to the whole buffer, parallel by row.
/// `transform` receives (r, g, b, a) as f32 and returns the same.
fn apply_per_pixel<F>(src: &RgbaImage, transform: F) -> RgbaImage
where
    F: Fn(f32, f32, f32, f32) -> (f32, f32, f32, f32) + Sync,
{
    let w = src.width() as usize;
    let h = src.height() as usize;
    if w == 0 || h == 0 {
        return src.clone();
    }

    let src_raw = src.as_raw();
    let mut dst_raw = vec![0u8; w * h * 4];
    let stride = w * 4;

    dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let row_in = &src_raw[y * stride..(y + 1) * stride];
        for x in 0..w {
            let pi = x * 4;
            let r = row_in[pi] as f32;
            let g = row_in[pi + 1] as f32;
            let b = row_in[pi + 2] as f32;
            let a = row_in[pi + 3] as f32;
            let (nr, ng, nb, na) = transform(r, g, b, a);
            row_out[pi] = nr.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 1] = ng.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 2] = nb.round().clamp(0.0, 255.0) as u8;
            row_out[pi + 3] = na.round().clamp(0.0, 255.0) as u8;
        }
    });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap()
}

/// Replace each pixel's color channels with their arithmetic mean.
pub fn monochrome(src: &RgbaImage, _fx: &EffectState) -> RgbaImage {
    apply_per_pixel(src, |r, g, b, a| {
        let avg = (r + g + b) / 3.0;
        (avg, avg, avg, a)
    })
}

/// Invert all color channels. Alpha is preserved.
pub fn invert_colors(src: &RgbaImage, _fx: &EffectState) -> RgbaImage {
    apply_per_pixel(src, |r, g, b, a| (255.0 - r, 255.0 - g, 255.0 - b, a))
}

/// Quantize each channel to `floor(intensity)` levels via uniform step
/// rounding. Two levels collapses every channel to 0 or 255.
pub fn posterize(src: &RgbaImage, fx: &EffectState) -> RgbaImage {
    let levels = (fx.scalar("intensity").floor() as i32).max(2);
    let step = 255.0 / (levels - 1) as f32;
    apply_per_pixel(src, |r, g, b, a| {
        (
            ((r / step).round() * step).round(),
            ((g / step).round() * step).round(),
            ((b / step).round() * step).round(),
            a,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FilterId;
    use crate::state::EffectStates;
    use image::Rgba;

    fn state_for(id: FilterId) -> EffectState {
        EffectStates::defaults().get(id).clone()
    }

    #[test]
    fn monochrome_averages_channels() {
        let src = RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 77]));
        let out = monochrome(&src, &state_for(FilterId::Monochrome));
        assert_eq!(*out.get_pixel(0, 0), Rgba([20, 20, 20, 77]));
    }

    #[test]
    fn invert_is_involutive() {
        let fx = state_for(FilterId::InvertColors);
        let mut src = RgbaImage::new(3, 2);
        for (i, px) in src.pixels_mut().enumerate() {
            *px = Rgba([i as u8 * 40, 255 - i as u8 * 30, i as u8, 200]);
        }
        let twice = invert_colors(&invert_colors(&src, &fx), &fx);
        assert_eq!(src, twice);
    }

    #[test]
    fn posterize_two_levels_is_black_or_white_per_channel() {
        let mut states = EffectStates::defaults();
        states.get_mut(FilterId::Posterize).set_scalar("intensity", 2.0);
        let fx = states.get(FilterId::Posterize).clone();

        let mut src = RgbaImage::new(16, 1);
        for (x, px) in src.pixels_mut().enumerate() {
            *px = Rgba([x as u8 * 16, 255 - x as u8 * 16, 127, 255]);
        }
        let out = posterize(&src, &fx);
        for px in out.pixels() {
            for c in 0..3 {
                assert!(px[c] == 0 || px[c] == 255, "channel {} not quantized", px[c]);
            }
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn zero_size_buffers_pass_through() {
        let empty = RgbaImage::new(0, 0);
        assert_eq!(monochrome(&empty, &state_for(FilterId::Monochrome)).dimensions(), (0, 0));
        assert_eq!(invert_colors(&empty, &state_for(FilterId::InvertColors)).dimensions(), (0, 0));
        assert_eq!(posterize(&empty, &state_for(FilterId::Posterize)).dimensions(), (0, 0));
    }
}
