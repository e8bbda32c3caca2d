// ============================================================================
// PARAMETER STATE — runtime values for every catalog filter
// ============================================================================
//
// One EffectState per FilterDefinition, seeded from the catalog defaults:
// scalars start at the midpoint of their declared range, every boolean flag
// starts false, every filter starts disabled.
//
// An EffectStates value is a complete snapshot: it always carries one entry
// per catalog definition and every entry always carries every declared key.
// The accessors still fall back to the catalog default for unknown keys, so
// filter code never has to guard against a missing parameter.
// ============================================================================

use std::collections::BTreeMap;

use crate::catalog::{self, FilterDefinition, FilterId};

/// Runtime state for a single filter: the enabled flag plus one value per
/// declared parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectState {
    pub enabled: bool,
    scalars: BTreeMap<&'static str, f32>,
    toggles: BTreeMap<&'static str, bool>,
    text_types: BTreeMap<&'static str, bool>,
    color_types: BTreeMap<&'static str, bool>,
    def: &'static FilterDefinition,
}

impl EffectState {
    /// Seed a state record from a catalog definition.
    pub fn from_defaults(def: &'static FilterDefinition) -> Self {
        EffectState {
            enabled: false,
            scalars: def.params.iter().map(|p| (p.id, p.midpoint())).collect(),
            toggles: def.toggles.iter().map(|t| (t.id, false)).collect(),
            text_types: def.text_types.iter().map(|t| (t.id, false)).collect(),
            color_types: def.color_types.iter().map(|c| (c.id, false)).collect(),
            def,
        }
    }

    /// The catalog definition this state belongs to.
    pub fn definition(&self) -> &'static FilterDefinition {
        self.def
    }

    /// Current value of a scalar parameter. Unknown or missing keys fall
    /// back to the declared midpoint (0.0 for parameters the definition
    /// never declared).
    pub fn scalar(&self, id: &str) -> f32 {
        if let Some(v) = self.scalars.get(id) {
            return *v;
        }
        self.def
            .params
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.midpoint())
            .unwrap_or(0.0)
    }

    /// Current value of a boolean sub-toggle; missing keys read as `false`.
    pub fn toggle(&self, id: &str) -> bool {
        self.toggles.get(id).copied().unwrap_or(false)
    }

    /// Whether a text category is selected; missing keys read as `false`.
    pub fn text_type(&self, id: &str) -> bool {
        self.text_types.get(id).copied().unwrap_or(false)
    }

    /// Whether a color category is selected; missing keys read as `false`.
    pub fn color_type(&self, id: &str) -> bool {
        self.color_types.get(id).copied().unwrap_or(false)
    }

    /// Set a scalar parameter. Returns `false` (and changes nothing) for
    /// keys the definition does not declare.
    pub fn set_scalar(&mut self, id: &str, value: f32) -> bool {
        match self.def.params.iter().find(|p| p.id == id) {
            Some(p) => {
                self.scalars.insert(p.id, value);
                true
            }
            None => false,
        }
    }

    pub fn set_toggle(&mut self, id: &str, value: bool) -> bool {
        match self.def.toggles.iter().find(|t| t.id == id) {
            Some(t) => {
                self.toggles.insert(t.id, value);
                true
            }
            None => false,
        }
    }

    pub fn set_text_type(&mut self, id: &str, value: bool) -> bool {
        match self.def.text_types.iter().find(|t| t.id == id) {
            Some(t) => {
                self.text_types.insert(t.id, value);
                true
            }
            None => false,
        }
    }

    pub fn set_color_type(&mut self, id: &str, value: bool) -> bool {
        match self.def.color_types.iter().find(|c| c.id == id) {
            Some(c) => {
                self.color_types.insert(c.id, value);
                true
            }
            None => false,
        }
    }

    /// Declared scalar keys in declaration order, with current values.
    pub fn scalar_entries(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
        self.def.params.iter().map(|p| (p.id, self.scalar(p.id)))
    }

    /// Declared toggle keys in declaration order, with current values.
    pub fn toggle_entries(&self) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        self.def.toggles.iter().map(|t| (t.id, self.toggle(t.id)))
    }

    /// Declared text-category keys in declaration order, with current values.
    pub fn text_type_entries(&self) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        self.def.text_types.iter().map(|t| (t.id, self.text_type(t.id)))
    }

    /// Declared color-category keys in declaration order, with current values.
    pub fn color_type_entries(&self) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        self.def.color_types.iter().map(|c| (c.id, self.color_type(c.id)))
    }

    /// The pooled overlay strings of every enabled text category.
    pub fn active_texts(&self) -> Vec<&'static str> {
        self.def
            .text_types
            .iter()
            .filter(|t| self.text_type(t.id))
            .flat_map(|t| t.strings.iter().copied())
            .collect()
    }

    /// The display colors of every enabled color category.
    pub fn active_colors(&self) -> Vec<[u8; 3]> {
        self.def
            .color_types
            .iter()
            .filter(|c| self.color_type(c.id))
            .map(|c| c.rgb)
            .collect()
    }
}

/// A complete, immutable-per-render snapshot of all filter states, one entry
/// per catalog definition in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectStates {
    entries: Vec<EffectState>,
}

impl EffectStates {
    /// Fresh catalog defaults: everything disabled, scalars at midpoints.
    pub fn defaults() -> Self {
        EffectStates {
            entries: catalog::definitions().iter().map(EffectState::from_defaults).collect(),
        }
    }

    pub fn get(&self, id: FilterId) -> &EffectState {
        &self.entries[id as usize]
    }

    pub fn get_mut(&mut self, id: FilterId) -> &mut EffectState {
        &mut self.entries[id as usize]
    }

    pub fn is_enabled(&self, id: FilterId) -> bool {
        self.entries[id as usize].enabled
    }

    pub fn set_enabled(&mut self, id: FilterId, on: bool) {
        self.entries[id as usize].enabled = on;
    }

    /// Enabled filters in catalog declaration order.
    pub fn enabled_ids(&self) -> Vec<FilterId> {
        FilterId::ALL.iter().copied().filter(|&id| self.is_enabled(id)).collect()
    }
}

impl Default for EffectStates {
    fn default() -> Self {
        EffectStates::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_midpoints_and_false() {
        let states = EffectStates::defaults();
        for def in catalog::definitions() {
            let st = states.get(def.id);
            assert!(!st.enabled, "{} starts enabled", def.id.as_str());
            for p in def.params {
                assert_eq!(st.scalar(p.id), p.midpoint(), "{}.{}", def.id.as_str(), p.id);
            }
            for t in def.toggles {
                assert!(!st.toggle(t.id));
            }
            for t in def.text_types {
                assert!(!st.text_type(t.id));
            }
            for c in def.color_types {
                assert!(!st.color_type(c.id));
            }
        }
    }

    #[test]
    fn rgb_shift_defaults_to_zero_offsets() {
        // Midpoint of [-50, 50] — the identity configuration.
        let states = EffectStates::defaults();
        let st = states.get(FilterId::RgbShift);
        assert_eq!(st.scalar("redOffset"), 0.0);
        assert_eq!(st.scalar("greenOffset"), 0.0);
        assert_eq!(st.scalar("blueOffset"), 0.0);
    }

    #[test]
    fn undeclared_keys_are_rejected_and_fall_back() {
        let mut states = EffectStates::defaults();
        let st = states.get_mut(FilterId::Monochrome);
        assert!(!st.set_scalar("amount", 3.0));
        assert!(!st.set_toggle("radial", true));
        assert_eq!(st.scalar("amount"), 0.0);
        assert!(!st.toggle("radial"));
    }

    #[test]
    fn category_pools_follow_selection() {
        let mut states = EffectStates::defaults();
        let st = states.get_mut(FilterId::GlitchText);
        assert!(st.active_texts().is_empty());
        assert!(st.active_colors().is_empty());

        assert!(st.set_text_type("404", true));
        assert!(st.set_color_type("blue", true));
        assert_eq!(st.active_texts(), vec!["404", "500", "503"]);
        assert_eq!(st.active_colors(), vec![[0x00, 0x66, 0xFF]]);
    }
}
