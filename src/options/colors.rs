use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::molecule::Element;

/// Atom color palette.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ColorOptions {
    /// RGB tint replacing the CPK gray of carbon atoms, if set.
    pub carbon_tint: Option<[f32; 3]>,
    /// Per-element RGB overrides keyed by element symbol (e.g. `"N"`).
    pub element_overrides: HashMap<String, [f32; 3]>,
}

impl ColorOptions {
    /// Resolve the display color of `element`: explicit override, then
    /// carbon tint, then the CPK default.
    #[must_use]
    pub fn element_color(&self, element: Element) -> [f32; 3] {
        if let Some(color) = self
            .element_overrides
            .iter()
            .find(|(symbol, _)| Element::from_symbol(symbol) == element)
            .map(|(_, color)| *color)
        {
            return color;
        }
        match (element, self.carbon_tint) {
            (Element::C, Some(tint)) => tint,
            _ => element.cpk_color(),
        }
    }
}
