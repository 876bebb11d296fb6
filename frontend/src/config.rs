use log::{warn, Level};
use serde::{Deserialize, Serialize};
use web_sys::Document;

#[cfg(debug_assertions)]
pub fn log_level() -> Level {
    Level::Debug // Verbose while developing locally
}

#[cfg(not(debug_assertions))]
pub fn log_level() -> Level {
    Level::Info
}

/// Id of the optional `<script type="application/json">` block holding overrides.
pub const CONFIG_ELEMENT_ID: &str = "landing-config";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LandingConfig {
    pub fade_slider: FadeSliderConfig,
    pub projects: ProjectsConfig,
    pub reveal: RevealConfig,
    pub back_to_top: BackToTopConfig,
    pub candy_rain: CandyRainConfig,
    pub headline: HeadlineConfig,
    pub gallery: GalleryConfig,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeSliderConfig {
    pub interval_ms: u32,
}

impl Default for FadeSliderConfig {
    fn default() -> Self {
        Self { interval_ms: 8000 }
    }
}

impl FadeSliderConfig {
    /// A zero period would tick continuously, so it falls back to the default.
    pub fn interval(&self) -> u32 {
        positive_or(self.interval_ms, Self::default().interval_ms)
    }
}

fn positive_or(ms: u32, default_ms: u32) -> u32 {
    if ms > 0 {
        ms
    } else {
        default_ms
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectsConfig {
    /// Used when the viewport has no `data-interval`.
    pub interval_ms: u32,
    pub visibility_threshold: f64,
}

impl Default for ProjectsConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5000,
            visibility_threshold: 0.2,
        }
    }
}

impl ProjectsConfig {
    pub fn interval(&self) -> u32 {
        positive_or(self.interval_ms, Self::default().interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    pub threshold: f64,
    pub root_margin: String,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            threshold: 0.15,
            root_margin: "50px".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackToTopConfig {
    pub threshold_px: f64,
    pub target: String,
}

impl Default for BackToTopConfig {
    fn default() -> Self {
        Self {
            threshold_px: 400.0,
            target: "#hero".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandyRainConfig {
    pub count: usize,
    pub hide_after_ms: u32,
    pub fade_out_ms: u32,
    pub glyphs: Vec<String>,
}

impl Default for CandyRainConfig {
    fn default() -> Self {
        Self {
            count: 40,
            hide_after_ms: 3100,
            fade_out_ms: 800,
            glyphs: ["🍬", "🍭", "🎁", "✨", "🍫"]
                .iter()
                .map(|g| g.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlineConfig {
    pub text: String,
    pub step_ms: u32,
}

impl Default for HeadlineConfig {
    fn default() -> Self {
        Self {
            text: "ЖИВОЙ РЕПОРТАЖ".to_string(),
            step_ms: 80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub alt_prefix: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            alt_prefix: "Фотография".to_string(),
        }
    }
}

/// Each tag loader can be switched off by setting it to `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub metrika: Option<MetrikaConfig>,
    pub gtm: Option<GtmConfig>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            metrika: Some(MetrikaConfig::default()),
            gtm: Some(GtmConfig::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetrikaConfig {
    pub counter_id: u64,
    pub delay_ms: u32,
    pub webvisor: bool,
    pub clickmap: bool,
    pub accurate_track_bounce: bool,
    pub track_links: bool,
}

impl Default for MetrikaConfig {
    fn default() -> Self {
        Self {
            counter_id: 16707172,
            delay_ms: 3000,
            webvisor: true,
            clickmap: true,
            accurate_track_bounce: true,
            track_links: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GtmConfig {
    pub container_id: String,
    pub data_layer: String,
    pub delay_ms: u32,
}

impl Default for GtmConfig {
    fn default() -> Self {
        Self {
            container_id: "GTM-KRVNNK".to_string(),
            data_layer: "dataLayer".to_string(),
            delay_ms: 4000,
        }
    }
}

impl LandingConfig {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Reads overrides from the page, falling back to defaults.
    pub fn from_page(document: &Document) -> Self {
        let Some(raw) = document
            .get_element_by_id(CONFIG_ELEMENT_ID)
            .and_then(|el| el.text_content())
            .filter(|raw| !raw.trim().is_empty())
        else {
            return Self::default();
        };
        match Self::parse(&raw) {
            Ok(config) => config,
            Err(err) => {
                warn!("ignoring #{}: {}", CONFIG_ELEMENT_ID, err);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = LandingConfig::parse("{}").unwrap();
        assert_eq!(config, LandingConfig::default());
        assert_eq!(config.fade_slider.interval_ms, 8000);
        assert_eq!(config.projects.interval_ms, 5000);
        assert_eq!(config.candy_rain.count, 40);
    }

    #[test]
    fn partial_overrides_keep_sibling_defaults() {
        let config = LandingConfig::parse(
            r#"{"fade_slider": {"interval_ms": 30000}, "projects": {"visibility_threshold": 0.5}}"#,
        )
        .unwrap();
        assert_eq!(config.fade_slider.interval_ms, 30000);
        assert_eq!(config.projects.interval_ms, 5000);
        assert_eq!(config.projects.visibility_threshold, 0.5);
        assert_eq!(config.reveal.root_margin, "50px");
    }

    #[test]
    fn zero_intervals_fall_back_to_defaults() {
        let config = LandingConfig::parse(
            r#"{"fade_slider": {"interval_ms": 0}, "projects": {"interval_ms": 0}}"#,
        )
        .unwrap();
        assert_eq!(config.fade_slider.interval(), 8000);
        assert_eq!(config.projects.interval(), 5000);

        let config = LandingConfig::parse(r#"{"fade_slider": {"interval_ms": 30000}}"#).unwrap();
        assert_eq!(config.fade_slider.interval(), 30000);
    }

    #[test]
    fn null_disables_a_tag_loader() {
        let config = LandingConfig::parse(r#"{"analytics": {"gtm": null}}"#).unwrap();
        assert!(config.analytics.gtm.is_none());
        assert_eq!(config.analytics.metrika, Some(MetrikaConfig::default()));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(LandingConfig::parse("{fade_slider:").is_err());
        assert!(LandingConfig::parse(r#"{"candy_rain": {"count": -1}}"#).is_err());
    }
}
