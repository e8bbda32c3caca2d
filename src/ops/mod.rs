// ============================================================================
// FILTER FUNCTION REGISTRY — one pure transform per catalog filter
// ============================================================================

pub mod adjustments;
pub mod effects;
pub mod text;

use image::RgbaImage;

use crate::catalog::FilterId;
use crate::state::EffectState;

/// Dispatch a filter by identifier. The exhaustive match keeps the registry
/// in lockstep with the catalog: adding a FilterId without a transform is a
/// compile error.
pub fn apply(id: FilterId, src: &RgbaImage, fx: &EffectState) -> RgbaImage {
    match id {
        FilterId::RgbShift => effects::rgb_shift(src, fx),
        FilterId::Noise => effects::noise(src, fx),
        FilterId::Monochrome => adjustments::monochrome(src, fx),
        FilterId::GlitchText => text::glitch_text(src, fx),
        FilterId::Wave => effects::wave(src, fx),
        FilterId::Scanlines => effects::scanlines(src, fx),
        FilterId::TvStatic => effects::tv_static(src, fx),
        FilterId::VhsDistortion => effects::vhs_distortion(src, fx),
        FilterId::CorruptEdges => effects::corrupt_edges(src, fx),
        FilterId::CircuitBend => effects::circuit_bend(src, fx),
        FilterId::StretchSmear => effects::stretch_smear(src, fx),
        FilterId::EchoTrails => effects::echo_trails(src, fx),
        FilterId::FractalDistortion => effects::fractal_distortion(src, fx),
        FilterId::InvertColors => adjustments::invert_colors(src, fx),
        FilterId::Posterize => adjustments::posterize(src, fx),
        FilterId::Pixelate => effects::pixelate(src, fx),
        FilterId::BurnedEdge => effects::burned_edge(src, fx),
    }
}
