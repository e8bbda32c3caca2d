// ============================================================================
// COMPOSITOR — two-pass filter pipeline over a working buffer
// ============================================================================
//
// Direct filters mutate the shared working buffer in place and feed forward
// into everything after them. Layered filters render onto an isolated copy
// of the *current* working buffer and are drawn back on top: they see the
// accumulated direct edits, but their own artifacts are never re-processed
// by later filters in the same pass.
//
// Both passes run in catalog declaration order. Displacement-heavy effects
// sample a stable base this way instead of compounding into unrecognizable
// noise when many filters stack.
// ============================================================================

use image::RgbaImage;

use crate::catalog::FilterId;
use crate::ops;
use crate::raster;
use crate::state::EffectStates;

/// Identifiers rendered on an isolated layer instead of the shared working
/// buffer. "static", "stretch" and "smear" match no catalog id — they are
/// kept for compatibility with existing settings documents, and tvStatic
/// and stretchSmear therefore composite directly.
const LAYERED_FILTERS: &[&str] = &[
    "noise",
    "static",
    "wave",
    "stretch",
    "smear",
    "fractalDistortion",
    "circuitBend",
];

/// Whether a filter renders on an isolated layer.
pub fn is_layered(id: FilterId) -> bool {
    LAYERED_FILTERS.contains(&id.as_str())
}

/// Run the full pipeline: apply every enabled filter to a copy of `base`
/// and return the composited frame. The input buffer and the state snapshot
/// are never mutated; nothing is retained across calls.
pub fn render(base: &RgbaImage, states: &EffectStates) -> RgbaImage {
    let mut work = base.clone();

    // Pass 1: direct filters, catalog order, feeding forward.
    for id in FilterId::ALL {
        if states.is_enabled(id) && !is_layered(id) {
            work = ops::apply(id, &work, states.get(id));
        }
    }

    // Pass 2: layered filters, catalog order, each on an isolated copy of
    // the current working buffer, drawn back on top.
    for id in FilterId::ALL {
        if states.is_enabled(id) && is_layered(id) {
            let layer = ops::apply(id, &work, states.get(id));
            raster::draw_image(&mut work, &layer, 0, 0, 1.0);
        }
    }

    work
}
