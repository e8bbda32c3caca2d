// ============================================================================
// FILTER CATALOG — static definitions for every available glitch filter
// ============================================================================
//
// The catalog is fixed at compile time. Declaration order is significant:
// it is the application order for both compositor passes and the default
// on-screen grouping for front-ends.
//
// Each definition declares its parameter schema:
//   - scalar parameters (named, with min/max range)
//   - boolean sub-toggles
//   - text categories (each bound to a fixed pool of overlay strings)
//   - color categories (each bound to a fixed display color)
// ============================================================================

/// Identifier for every filter in the catalog, in declaration order.
///
/// The discriminants double as indices into [`CATALOG`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterId {
    RgbShift,
    Noise,
    Monochrome,
    GlitchText,
    Wave,
    Scanlines,
    TvStatic,
    VhsDistortion,
    CorruptEdges,
    CircuitBend,
    StretchSmear,
    EchoTrails,
    FractalDistortion,
    InvertColors,
    Posterize,
    Pixelate,
    BurnedEdge,
}

impl FilterId {
    /// All filters in catalog declaration order.
    pub const ALL: [FilterId; 17] = [
        FilterId::RgbShift,
        FilterId::Noise,
        FilterId::Monochrome,
        FilterId::GlitchText,
        FilterId::Wave,
        FilterId::Scanlines,
        FilterId::TvStatic,
        FilterId::VhsDistortion,
        FilterId::CorruptEdges,
        FilterId::CircuitBend,
        FilterId::StretchSmear,
        FilterId::EchoTrails,
        FilterId::FractalDistortion,
        FilterId::InvertColors,
        FilterId::Posterize,
        FilterId::Pixelate,
        FilterId::BurnedEdge,
    ];

    /// The wire identifier used in settings documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterId::RgbShift => "rgbShift",
            FilterId::Noise => "noise",
            FilterId::Monochrome => "monochrome",
            FilterId::GlitchText => "glitchText",
            FilterId::Wave => "wave",
            FilterId::Scanlines => "scanlines",
            FilterId::TvStatic => "tvStatic",
            FilterId::VhsDistortion => "vhsDistortion",
            FilterId::CorruptEdges => "corruptEdges",
            FilterId::CircuitBend => "circuitBend",
            FilterId::StretchSmear => "stretchSmear",
            FilterId::EchoTrails => "echoTrails",
            FilterId::FractalDistortion => "fractalDistortion",
            FilterId::InvertColors => "invertColors",
            FilterId::Posterize => "posterize",
            FilterId::Pixelate => "pixelate",
            FilterId::BurnedEdge => "burnedEdge",
        }
    }

    /// Reverse lookup from a wire identifier. Unknown identifiers yield `None`.
    pub fn from_str(s: &str) -> Option<FilterId> {
        FilterId::ALL.iter().copied().find(|id| id.as_str() == s)
    }

    /// The catalog entry for this filter.
    pub fn definition(&self) -> &'static FilterDefinition {
        &CATALOG[*self as usize]
    }
}

/// A named scalar parameter with an inclusive range. Invariant: `min < max`.
#[derive(Debug, PartialEq)]
pub struct ParamSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub min: f32,
    pub max: f32,
}

impl ParamSpec {
    /// Default value: midpoint of the declared range.
    pub const fn midpoint(&self) -> f32 {
        (self.min + self.max) / 2.0
    }
}

/// A named boolean sub-toggle. Defaults to `false`.
#[derive(Debug, PartialEq)]
pub struct ToggleSpec {
    pub id: &'static str,
    pub label: &'static str,
}

/// A selectable text category with its fixed pool of overlay strings.
#[derive(Debug, PartialEq)]
pub struct TextCategory {
    pub id: &'static str,
    pub label: &'static str,
    pub strings: &'static [&'static str],
}

/// A selectable color category bound to a fixed RGB display color.
#[derive(Debug, PartialEq)]
pub struct ColorCategory {
    pub id: &'static str,
    pub label: &'static str,
    pub rgb: [u8; 3],
}

/// One catalog entry: identifier, display label, and parameter schema.
#[derive(Debug, PartialEq)]
pub struct FilterDefinition {
    pub id: FilterId,
    pub label: &'static str,
    pub params: &'static [ParamSpec],
    pub toggles: &'static [ToggleSpec],
    pub text_types: &'static [TextCategory],
    pub color_types: &'static [ColorCategory],
}

/// The full catalog, one entry per [`FilterId`], in declaration order.
pub static CATALOG: [FilterDefinition; 17] = [
    FilterDefinition {
        id: FilterId::RgbShift,
        label: "RGB Shift",
        params: &[
            ParamSpec { id: "redOffset", label: "Red Offset", min: -50.0, max: 50.0 },
            ParamSpec { id: "greenOffset", label: "Green Offset", min: -50.0, max: 50.0 },
            ParamSpec { id: "blueOffset", label: "Blue Offset", min: -50.0, max: 50.0 },
        ],
        toggles: &[],
        text_types: &[],
        color_types: &[],
    },
    FilterDefinition {
        id: FilterId::Noise,
        label: "Noise",
        params: &[
            ParamSpec { id: "amount", label: "Amount", min: 0.0, max: 1.0 },
            ParamSpec { id: "size", label: "Size", min: 1.0, max: 10.0 },
        ],
        toggles: &[],
        text_types: &[],
        color_types: &[],
    },
    FilterDefinition {
        id: FilterId::Monochrome,
        label: "Monochrome",
        params: &[],
        toggles: &[],
        text_types: &[],
        color_types: &[],
    },
    FilterDefinition {
        id: FilterId::GlitchText,
        label: "Glitch Text",
        params: &[
            ParamSpec { id: "amount", label: "Amount", min: 0.0, max: 100.0 },
            ParamSpec { id: "size", label: "Size", min: 10.0, max: 50.0 },
            ParamSpec { id: "opacity", label: "Opacity", min: 0.0, max: 1.0 },
            ParamSpec { id: "rotation", label: "Rotation", min: -180.0, max: 180.0 },
        ],
        toggles: &[],
        text_types: &[
            TextCategory { id: "404", label: "404/500/503", strings: &["404", "500", "503"] },
            TextCategory { id: "error", label: "ERROR/FAIL", strings: &["ERROR", "FAIL"] },
            TextCategory { id: "sad", label: ":/ :( !?", strings: &[":(", ":/", "!?"] },
        ],
        color_types: &[
            ColorCategory { id: "white", label: "White", rgb: [0xFF, 0xFF, 0xFF] },
            ColorCategory { id: "black", label: "Black", rgb: [0x00, 0x00, 0x00] },
            ColorCategory { id: "blue", label: "Blue", rgb: [0x00, 0x66, 0xFF] },
        ],
    },
    FilterDefinition {
        id: FilterId::Wave,
        label: "Wave",
        params: &[
            ParamSpec { id: "pattern", label: "Pattern", min: 0.0, max: 1.0 },
            ParamSpec { id: "skew", label: "Skew", min: 0.0, max: 1.0 },
        ],
        toggles: &[],
        text_types: &[],
        color_types: &[],
    },
    FilterDefinition {
        id: FilterId::Scanlines,
        label: "Scanlines",
        params: &[
            ParamSpec { id: "spacing", label: "Spacing", min: 1.0, max: 50.0 },
            ParamSpec { id: "thickness", label: "Thickness", min: 1.0, max: 10.0 },
            ParamSpec { id: "opacity", label: "Opacity", min: 0.0, max: 1.0 },
        ],
        toggles: &[ToggleSpec { id: "radial", label: "Radial Mode" }],
        text_types: &[],
        color_types: &[],
    },
    FilterDefinition {
        id: FilterId::TvStatic,
        label: "TV Static",
        params: &[ParamSpec { id: "amount", label: "Amount", min: 0.0, max: 1.0 }],
        toggles: &[],
        text_types: &[],
        color_types: &[],
    },
    FilterDefinition {
        id: FilterId::VhsDistortion,
        label: "VHS Distortion",
        params: &[ParamSpec { id: "strength", label: "Strength", min: 0.0, max: 1.0 }],
        toggles: &[],
        text_types: &[],
        color_types: &[],
    },
    FilterDefinition {
        id: FilterId::CorruptEdges,
        label: "Corrupt Edges",
        params: &[
            ParamSpec { id: "amount", label: "Amount", min: 0.0, max: 1.0 },
            ParamSpec { id: "density", label: "Density", min: 0.0, max: 1.0 },
            ParamSpec { id: "thickness", label: "Thickness", min: 1.0, max: 20.0 },
            ParamSpec { id: "intensity", label: "Intensity", min: 0.0, max: 1.0 },
            ParamSpec { id: "chaos", label: "Chaos", min: 0.0, max: 1.0 },
        ],
        toggles: &[
            ToggleSpec { id: "invertColor", label: "Invert Color" },
            ToggleSpec { id: "pixelate", label: "Pixelate Edges" },
            ToggleSpec { id: "rgbSplit", label: "RGB Split" },
        ],
        text_types: &[],
        color_types: &[],
    },
    FilterDefinition {
        id: FilterId::CircuitBend,
        label: "Circuit Bend",
        params: &[ParamSpec { id: "chaos", label: "Chaos", min: 0.0, max: 1.0 }],
        toggles: &[],
        text_types: &[],
        color_types: &[],
    },
    FilterDefinition {
        id: FilterId::StretchSmear,
        label: "Stretch/Smear",
        params: &[ParamSpec { id: "amount", label: "Amount", min: 0.0, max: 1.0 }],
        toggles: &[],
        text_types: &[],
        color_types: &[],
    },
    FilterDefinition {
        id: FilterId::EchoTrails,
        label: "Echo Trails",
        params: &[
            ParamSpec { id: "amount", label: "Amount", min: 0.0, max: 1.0 },
            ParamSpec { id: "direction", label: "Direction", min: 0.0, max: 1.0 },
        ],
        toggles: &[],
        text_types: &[],
        color_types: &[],
    },
    FilterDefinition {
        id: FilterId::FractalDistortion,
        label: "Fractal Distortion",
        params: &[
            ParamSpec { id: "complexity", label: "Complexity", min: 0.0, max: 1.0 },
            ParamSpec { id: "intensity", label: "Intensity", min: 0.0, max: 1.0 },
            ParamSpec { id: "iterations", label: "Iterations", min: 1.0, max: 10.0 },
        ],
        toggles: &[
            ToggleSpec { id: "mirror", label: "Mirror Effect" },
            ToggleSpec { id: "rotate", label: "Rotation" },
        ],
        text_types: &[],
        color_types: &[],
    },
    FilterDefinition {
        id: FilterId::InvertColors,
        label: "Invert Colors",
        params: &[],
        toggles: &[],
        text_types: &[],
        color_types: &[],
    },
    FilterDefinition {
        id: FilterId::Posterize,
        label: "Posterize",
        params: &[ParamSpec { id: "intensity", label: "Intensity", min: 2.0, max: 16.0 }],
        toggles: &[],
        text_types: &[],
        color_types: &[],
    },
    FilterDefinition {
        id: FilterId::Pixelate,
        label: "Pixelate",
        params: &[
            ParamSpec { id: "size", label: "Size", min: 2.0, max: 32.0 },
            ParamSpec { id: "intensity", label: "Intensity", min: 0.0, max: 1.0 },
            ParamSpec { id: "random", label: "Random Areas", min: 0.0, max: 1.0 },
        ],
        toggles: &[],
        text_types: &[],
        color_types: &[],
    },
    FilterDefinition {
        id: FilterId::BurnedEdge,
        label: "Burned Edge",
        params: &[
            ParamSpec { id: "amount", label: "Amount", min: 0.0, max: 2.0 },
            ParamSpec { id: "feather", label: "Feather", min: 0.0, max: 1.0 },
        ],
        toggles: &[
            ToggleSpec { id: "white", label: "White Edge" },
            ToggleSpec { id: "invertEdge", label: "Invert Edge Color" },
        ],
        text_types: &[],
        color_types: &[],
    },
];

/// The full catalog in declaration order.
pub fn definitions() -> &'static [FilterDefinition] {
    &CATALOG
}

/// Identifiers shown on the "Basic" tab. Everything else is "Advanced".
pub const BASIC_FILTERS: &[&str] = &["rgbShift", "noise", "monochrome", "invertColors", "pixelate"];

/// The basic subset, in declaration order.
pub fn basic() -> impl Iterator<Item = &'static FilterDefinition> {
    definitions().iter().filter(|d| BASIC_FILTERS.contains(&d.id.as_str()))
}

/// The advanced subset (complement of basic), in declaration order.
pub fn advanced() -> impl Iterator<Item = &'static FilterDefinition> {
    definitions().iter().filter(|d| !BASIC_FILTERS.contains(&d.id.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn discriminants_index_the_catalog() {
        for (i, def) in CATALOG.iter().enumerate() {
            assert_eq!(def.id as usize, i, "{} out of order", def.id.as_str());
            assert_eq!(FilterId::ALL[i], def.id);
        }
    }

    #[test]
    fn identifiers_are_unique() {
        let mut seen = HashSet::new();
        for def in definitions() {
            assert!(seen.insert(def.id.as_str()), "duplicate filter id {}", def.id.as_str());

            let mut keys = HashSet::new();
            for p in def.params {
                assert!(keys.insert(p.id), "{}: duplicate param {}", def.id.as_str(), p.id);
            }
            for t in def.toggles {
                assert!(keys.insert(t.id), "{}: duplicate toggle {}", def.id.as_str(), t.id);
            }
            for t in def.text_types {
                assert!(keys.insert(t.id), "{}: duplicate text type {}", def.id.as_str(), t.id);
            }
            for c in def.color_types {
                assert!(keys.insert(c.id), "{}: duplicate color type {}", def.id.as_str(), c.id);
            }
        }
    }

    #[test]
    fn scalar_ranges_are_well_formed() {
        for def in definitions() {
            for p in def.params {
                assert!(p.min < p.max, "{}.{}: min >= max", def.id.as_str(), p.id);
            }
        }
    }

    #[test]
    fn wire_identifiers_round_trip() {
        for id in FilterId::ALL {
            assert_eq!(FilterId::from_str(id.as_str()), Some(id));
        }
        assert_eq!(FilterId::from_str("notAFilter"), None);
    }

    #[test]
    fn basic_and_advanced_partition_the_catalog() {
        let basic_count = basic().count();
        let advanced_count = advanced().count();
        assert_eq!(basic_count, BASIC_FILTERS.len());
        assert_eq!(basic_count + advanced_count, definitions().len());
    }

    #[test]
    fn text_categories_carry_non_empty_pools() {
        for def in definitions() {
            for t in def.text_types {
                assert!(!t.strings.is_empty(), "{}.{} has no strings", def.id.as_str(), t.id);
            }
        }
    }
}
