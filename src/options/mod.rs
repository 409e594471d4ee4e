//! Centralized runtime options with TOML preset support.
//!
//! Sequence building, animation timing, geometry and colors are consolidated
//! here. Options serialize to/from TOML so a viewer configuration can be
//! stored as a preset file and handed to the CLI with `--options`.

mod animation;
mod colors;
mod geometry;
mod sequence;

use std::path::Path;

pub use animation::AnimationOptions;
pub use colors::ColorOptions;
pub use geometry::GeometryOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use sequence::{SequenceOptions, SlotFallback};

use crate::error::MorphError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[animation]`) work correctly.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Alignment and normalization parameters.
    pub sequence: SequenceOptions,
    /// Transition timing and auto-advance.
    pub animation: AnimationOptions,
    /// Ball-and-stick sizing.
    pub geometry: GeometryOptions,
    /// Atom color palette.
    #[schemars(skip)]
    pub colors: ColorOptions,
}

impl Options {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// [`MorphError::Io`] if the file cannot be read,
    /// [`MorphError::OptionsParse`] if it is not valid options TOML.
    pub fn load(path: &Path) -> Result<Self, MorphError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse options from a TOML string. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// [`MorphError::OptionsParse`] if `content` is not valid options TOML.
    pub fn from_toml(content: &str) -> Result<Self, MorphError> {
        toml::from_str(content)
            .map_err(|e| MorphError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// [`MorphError::OptionsParse`] if serialization fails,
    /// [`MorphError::Io`] if the file or its parent cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), MorphError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| MorphError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// List available preset names (TOML file stems) in a directory.
    #[must_use]
    pub fn list_presets(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) =
                        path.file_stem().and_then(|s| s.to_str())
                    {
                        names.push(stem.to_owned());
                    }
                }
            }
        }
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::EasingFunction;
    use crate::molecule::Element;

    #[test]
    fn default_round_trips_through_toml() {
        let opts = Options::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed: Options = toml::from_str(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
[animation]
step = 0.05
easing = "linear"
loop = false
"#;
        let opts = Options::from_toml(toml_str).unwrap();
        assert_eq!(opts.animation.step, 0.05);
        assert_eq!(opts.animation.easing, EasingFunction::Linear);
        assert!(!opts.animation.looping);
        // Everything else should be default
        assert_eq!(opts.animation.advance_interval_secs, 3.0);
        assert_eq!(opts.sequence, SequenceOptions::default());
        assert_eq!(opts.geometry, GeometryOptions::default());
    }

    #[test]
    fn slot_fallback_is_snake_case() {
        let opts = Options::from_toml("[sequence]\nslot_fallback = \"none\"\n")
            .unwrap();
        assert_eq!(opts.sequence.slot_fallback, SlotFallback::None);
        assert_eq!(
            Options::default().sequence.slot_fallback,
            SlotFallback::RawIndex
        );
    }

    #[test]
    fn invalid_toml_is_options_parse_error() {
        let err = Options::from_toml("[animation]\nstep = \"fast\"\n")
            .unwrap_err();
        assert!(matches!(err, MorphError::OptionsParse(_)));
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir()
            .join(format!("molmorph-options-{}", std::process::id()));
        let path = dir.join("presets").join("slow.toml");
        let mut opts = Options::default();
        opts.animation.step = 0.01;
        opts.sequence.scale_cap = 2.5;
        opts.save(&path).unwrap();

        let loaded = Options::load(&path).unwrap();
        assert_eq!(loaded, opts);
        assert_eq!(Options::list_presets(&dir.join("presets")), ["slow"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Options::load(Path::new("/nonexistent/molmorph.toml"))
            .unwrap_err();
        assert!(matches!(err, MorphError::Io(_)));
    }

    #[test]
    fn element_color_lookup() {
        let mut colors = ColorOptions::default();
        assert_eq!(colors.element_color(Element::O), Element::O.cpk_color());

        colors.carbon_tint = Some([0.2, 0.7, 0.3]);
        let _ = colors
            .element_overrides
            .insert("n".to_owned(), [1.0, 0.0, 1.0]);
        assert_eq!(colors.element_color(Element::C), [0.2, 0.7, 0.3]);
        assert_eq!(colors.element_color(Element::N), [1.0, 0.0, 1.0]);
        assert_eq!(colors.element_color(Element::H), Element::H.cpk_color());
    }

    #[test]
    fn element_radius_scaling() {
        let mut geometry = GeometryOptions::default();
        assert_eq!(geometry.radius_for(Element::C), geometry.atom_radius);
        assert!(geometry.radius_for(Element::H) < geometry.atom_radius);
        geometry.size_by_element = false;
        assert_eq!(geometry.radius_for(Element::H), geometry.atom_radius);
    }

    #[test]
    fn schema_has_expected_properties() {
        let schema_value =
            serde_json::to_value(Options::json_schema()).unwrap();
        let props = schema_value["properties"].as_object().unwrap();

        assert!(props.contains_key("sequence"));
        assert!(props.contains_key("animation"));
        assert!(props.contains_key("geometry"));
        assert!(!props.contains_key("colors"));

        let sequence = &props["sequence"]["properties"];
        assert!(sequence.get("scale_cap").is_some());
        assert!(sequence.get("seed").is_none());
        assert!(props["animation"]["properties"].get("loop").is_some());
    }
}
