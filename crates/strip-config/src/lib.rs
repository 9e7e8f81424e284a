use cosmic::cosmic_config::{self, Config, ConfigGet, ConfigSet, CosmicConfigEntry};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strip_core::{GridStyle, ScrollBehavior};

pub const CONFIG_VERSION: u64 = 1;
pub const APP_ID: &str = "org.codeberg.bhh32.Photostrip";

/// Share of the strip's width each image takes, as used by the demo delegate.
pub const DEFAULT_ITEM_WIDTH_FRACTION: f32 = 0.4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripConfig {
    pub corner_radius: f32,
    pub scroll_behavior: ScrollBehavior,
    pub animate_scrolling: bool,
    pub scroll_animation_ms: u64,
    pub item_width_fraction: f32,
    pub show_hidden_files: bool,
    pub remember_last_dir: bool,
    pub last_dir: Option<String>,
}

impl Default for StripConfig {
    fn default() -> Self {
        let style = GridStyle::default();
        Self {
            corner_radius: style.corner_radius,
            scroll_behavior: style.scroll_behavior,
            animate_scrolling: true,
            scroll_animation_ms: style.scroll_animation.as_millis() as u64,
            item_width_fraction: DEFAULT_ITEM_WIDTH_FRACTION,
            show_hidden_files: false,
            remember_last_dir: true,
            last_dir: None,
        }
    }
}

impl StripConfig {
    /// Grid style with the user's overrides applied on top of the defaults.
    pub fn to_style(&self) -> GridStyle {
        let animation = if self.animate_scrolling {
            Duration::from_millis(self.scroll_animation_ms)
        } else {
            Duration::ZERO
        };

        GridStyle::default()
            .with_corner_radius(self.corner_radius.max(0.0))
            .with_scroll_behavior(self.scroll_behavior)
            .with_scroll_animation(animation)
    }

    /// Item width fraction clamped to something that can still be paged through.
    pub fn item_width_fraction(&self) -> f32 {
        if self.item_width_fraction.is_finite() && self.item_width_fraction > 0.0 {
            self.item_width_fraction.min(1.0)
        } else {
            DEFAULT_ITEM_WIDTH_FRACTION
        }
    }
}

impl CosmicConfigEntry for StripConfig {
    const VERSION: u64 = CONFIG_VERSION;

    fn write_entry(&self, config: &cosmic_config::Config) -> Result<(), cosmic_config::Error> {
        config.set("corner_radius", self.corner_radius)?;
        config.set("scroll_behavior", self.scroll_behavior)?;
        config.set("animate_scrolling", self.animate_scrolling)?;
        config.set("scroll_animation_ms", self.scroll_animation_ms)?;
        config.set("item_width_fraction", self.item_width_fraction)?;
        config.set("show_hidden_files", self.show_hidden_files)?;
        config.set("remember_last_dir", self.remember_last_dir)?;
        config.set("last_dir", self.last_dir.clone())?;
        Ok(())
    }

    fn get_entry(
        config: &cosmic_config::Config,
    ) -> Result<Self, (Vec<cosmic_config::Error>, Self)> {
        let mut errors = Vec::new();
        let mut cfg = StripConfig::default();

        macro_rules! get_field {
            ($name:literal, $field:ident, $type:ty) => {
                match config.get::<$type>($name) {
                    Ok(val) => cfg.$field = val,
                    Err(e) => errors.push(e),
                }
            };
        }

        get_field!("corner_radius", corner_radius, f32);
        get_field!("scroll_behavior", scroll_behavior, ScrollBehavior);
        get_field!("animate_scrolling", animate_scrolling, bool);
        get_field!("scroll_animation_ms", scroll_animation_ms, u64);
        get_field!("item_width_fraction", item_width_fraction, f32);
        get_field!("show_hidden_files", show_hidden_files, bool);
        get_field!("remember_last_dir", remember_last_dir, bool);
        get_field!("last_dir", last_dir, Option<String>);

        if errors.is_empty() {
            Ok(cfg)
        } else {
            Err((errors, cfg))
        }
    }

    fn update_keys<T: AsRef<str>>(
        &mut self,
        config: &cosmic_config::Config,
        changed_keys: &[T],
    ) -> (Vec<cosmic_config::Error>, Vec<&'static str>) {
        let mut errors = Vec::new();
        let mut updated = Vec::new();

        for key in changed_keys {
            match key.as_ref() {
                "corner_radius" => match config.get::<f32>("corner_radius") {
                    Ok(val) => {
                        self.corner_radius = val;
                        updated.push("corner_radius");
                    }
                    Err(e) => errors.push(e),
                },
                "scroll_behavior" => match config.get::<ScrollBehavior>("scroll_behavior") {
                    Ok(val) => {
                        self.scroll_behavior = val;
                        updated.push("scroll_behavior");
                    }
                    Err(e) => errors.push(e),
                },
                "animate_scrolling" => match config.get::<bool>("animate_scrolling") {
                    Ok(val) => {
                        self.animate_scrolling = val;
                        updated.push("animate_scrolling");
                    }
                    Err(e) => errors.push(e),
                },
                "scroll_animation_ms" => match config.get::<u64>("scroll_animation_ms") {
                    Ok(val) => {
                        self.scroll_animation_ms = val;
                        updated.push("scroll_animation_ms");
                    }
                    Err(e) => errors.push(e),
                },
                "item_width_fraction" => match config.get::<f32>("item_width_fraction") {
                    Ok(val) => {
                        self.item_width_fraction = val;
                        updated.push("item_width_fraction");
                    }
                    Err(e) => errors.push(e),
                },
                "show_hidden_files" => match config.get::<bool>("show_hidden_files") {
                    Ok(val) => {
                        self.show_hidden_files = val;
                        updated.push("show_hidden_files");
                    }
                    Err(e) => errors.push(e),
                },
                "remember_last_dir" => match config.get::<bool>("remember_last_dir") {
                    Ok(val) => {
                        self.remember_last_dir = val;
                        updated.push("remember_last_dir");
                    }
                    Err(e) => errors.push(e),
                },
                "last_dir" => match config.get::<Option<String>>("last_dir") {
                    Ok(val) => {
                        self.last_dir = val;
                        updated.push("last_dir");
                    }
                    Err(e) => errors.push(e),
                },
                _ => {}
            }
        }

        (errors, updated)
    }
}

pub fn config() -> Result<Config, cosmic_config::Error> {
    Config::new(APP_ID, CONFIG_VERSION)
}

/// Loads the stored configuration, falling back to defaults for anything missing or broken.
pub fn load() -> (StripConfig, Option<Config>) {
    match config() {
        Ok(handler) => {
            let config = match StripConfig::get_entry(&handler) {
                Ok(c) => c,
                Err((errors, c)) => {
                    for e in errors {
                        tracing::debug!("Using default for config field: {e}");
                    }
                    c
                }
            };
            (config, Some(handler))
        }
        Err(e) => {
            tracing::warn!("Config unavailable, using defaults: {e}");
            (StripConfig::default(), None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_grid_style() {
        let config = StripConfig::default();
        assert_eq!(config.to_style(), GridStyle::default());
    }

    #[test]
    fn test_disabled_animation_yields_zero_duration() {
        let config = StripConfig {
            animate_scrolling: false,
            ..StripConfig::default()
        };
        assert!(config.to_style().scroll_animation.is_zero());
    }

    #[test]
    fn test_style_overrides() {
        let config = StripConfig {
            corner_radius: -3.0,
            scroll_behavior: ScrollBehavior::Continuous,
            scroll_animation_ms: 120,
            ..StripConfig::default()
        };

        let style = config.to_style();
        assert_eq!(style.corner_radius, 0.0);
        assert_eq!(style.scroll_behavior, ScrollBehavior::Continuous);
        assert_eq!(style.scroll_animation, Duration::from_millis(120));
        assert_eq!(style.group_trailing_inset, GridStyle::GROUP_TRAILING_INSET);
    }

    #[test]
    fn test_item_width_fraction_is_sanitized() {
        let mut config = StripConfig::default();
        assert_eq!(config.item_width_fraction(), DEFAULT_ITEM_WIDTH_FRACTION);

        config.item_width_fraction = 2.5;
        assert_eq!(config.item_width_fraction(), 1.0);

        config.item_width_fraction = 0.0;
        assert_eq!(config.item_width_fraction(), DEFAULT_ITEM_WIDTH_FRACTION);

        config.item_width_fraction = f32::NAN;
        assert_eq!(config.item_width_fraction(), DEFAULT_ITEM_WIDTH_FRACTION);
    }

    #[test]
    fn test_update_keys_picks_up_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let handler =
            Config::with_custom_path(APP_ID, CONFIG_VERSION, dir.path().to_path_buf()).unwrap();

        let stored = StripConfig {
            corner_radius: 4.0,
            scroll_behavior: ScrollBehavior::Continuous,
            animate_scrolling: false,
            scroll_animation_ms: 90,
            item_width_fraction: 0.6,
            show_hidden_files: true,
            remember_last_dir: false,
            last_dir: Some("/photos/2024".to_string()),
        };
        stored.write_entry(&handler).unwrap();

        let keys = [
            "corner_radius",
            "scroll_behavior",
            "animate_scrolling",
            "scroll_animation_ms",
            "item_width_fraction",
            "show_hidden_files",
            "remember_last_dir",
            "last_dir",
        ];
        let mut watched = StripConfig::default();
        let (errors, updated) = watched.update_keys(&handler, &keys);

        assert!(errors.is_empty());
        assert_eq!(updated, keys);
        assert_eq!(watched, stored);
    }
}
