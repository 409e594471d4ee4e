//! Closed element enumeration with display properties.

/// Chemical elements recognised by the structure parser.
///
/// Anything outside this set maps to [`Element::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Element {
    /// Hydrogen.
    H,
    /// Carbon.
    C,
    /// Nitrogen.
    N,
    /// Oxygen.
    O,
    /// Fluorine.
    F,
    /// Phosphorus.
    P,
    /// Sulfur.
    S,
    /// Chlorine.
    Cl,
    /// Bromine.
    Br,
    /// Iodine.
    I,
    /// Any symbol outside the recognised set.
    #[default]
    Unknown,
}

impl Element {
    /// Map an element symbol to the enumeration.
    ///
    /// Surrounding whitespace is ignored and matching is case-insensitive, so
    /// `"CL"`, `"Cl"` and `" cl"` all map to [`Element::Cl`].
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Self {
        match symbol.trim().to_ascii_uppercase().as_str() {
            "H" | "D" => Self::H,
            "C" => Self::C,
            "N" => Self::N,
            "O" => Self::O,
            "F" => Self::F,
            "P" => Self::P,
            "S" => Self::S,
            "CL" => Self::Cl,
            "BR" => Self::Br,
            "I" => Self::I,
            _ => Self::Unknown,
        }
    }

    /// Canonical symbol (`"?"` for unknown).
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::H => "H",
            Self::C => "C",
            Self::N => "N",
            Self::O => "O",
            Self::F => "F",
            Self::P => "P",
            Self::S => "S",
            Self::Cl => "Cl",
            Self::Br => "Br",
            Self::I => "I",
            Self::Unknown => "?",
        }
    }

    /// Standard CPK color (linear RGB, 0..1).
    #[must_use]
    pub fn cpk_color(self) -> [f32; 3] {
        match self {
            Self::H => [1.0, 1.0, 1.0],
            Self::C => [0.56, 0.56, 0.56],
            Self::N => [0.19, 0.31, 0.97],
            Self::O => [1.0, 0.05, 0.05],
            Self::F => [0.56, 0.88, 0.31],
            Self::P => [1.0, 0.5, 0.0],
            Self::S => [1.0, 0.78, 0.19],
            Self::Cl => [0.12, 0.94, 0.12],
            Self::Br => [0.65, 0.16, 0.16],
            Self::I => [0.58, 0.0, 0.58],
            Self::Unknown => [1.0, 0.08, 0.58],
        }
    }

    /// Covalent radius in angstroms.
    #[must_use]
    pub fn covalent_radius(self) -> f32 {
        match self {
            Self::H => 0.31,
            Self::C => 0.76,
            Self::N => 0.71,
            Self::O => 0.66,
            Self::F => 0.57,
            Self::P => 1.07,
            Self::S => 1.05,
            Self::Cl => 1.02,
            Self::Br => 1.20,
            Self::I => 1.39,
            Self::Unknown => 0.76,
        }
    }

    /// Display size relative to carbon, used to scale the base atom radius.
    #[must_use]
    pub fn relative_size(self) -> f32 {
        self.covalent_radius() / Self::C.covalent_radius()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_are_case_insensitive() {
        assert_eq!(Element::from_symbol("Cl"), Element::Cl);
        assert_eq!(Element::from_symbol("CL "), Element::Cl);
        assert_eq!(Element::from_symbol(" br"), Element::Br);
        assert_eq!(Element::from_symbol("c"), Element::C);
    }

    #[test]
    fn unrecognised_symbols_are_unknown() {
        assert_eq!(Element::from_symbol("Fe"), Element::Unknown);
        assert_eq!(Element::from_symbol(""), Element::Unknown);
        assert_eq!(Element::from_symbol("*"), Element::Unknown);
    }

    #[test]
    fn carbon_is_unit_size() {
        assert!((Element::C.relative_size() - 1.0).abs() < 1e-6);
        assert!(Element::H.relative_size() < 1.0);
        assert!(Element::I.relative_size() > 1.0);
    }
}
