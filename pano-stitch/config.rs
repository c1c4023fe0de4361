use crate::error::{StitchError, StitchResult};
use pano_core::FeatureConfig;
use pano_geometry::RansacConfig;
use pano_match::MatchConfig;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Limits on the composited output
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompositorConfig {
    /// Largest accepted `width * height` of the canvas
    pub max_output_pixels: u64,
    /// Largest accepted canvas side
    pub max_output_dimension: u32,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            max_output_pixels: 50_000_000,
            max_output_dimension: 32_768,
        }
    }
}

/// Complete stitcher configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StitchConfig {
    pub features: FeatureConfig,
    pub matching: MatchConfig,
    pub ransac: RansacConfig,
    pub compositor: CompositorConfig,
    /// Frames whose longest side exceeds this are analysed at reduced size (0 disables)
    pub analysis_max_dimension: usize,
    /// Metadata
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub description: Option<String>,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self::balanced_preset()
    }
}

impl StitchConfig {
    /// Default settings, suitable for handheld video sweeps
    pub fn balanced_preset() -> Self {
        Self {
            features: FeatureConfig::default(),
            matching: MatchConfig::default(),
            ransac: RansacConfig::default(),
            compositor: CompositorConfig::default(),
            analysis_max_dimension: 1024,
            name: Some("Balanced".to_string()),
            description: Some("Default trade-off between alignment robustness and speed".to_string()),
        }
    }

    /// Fewer keypoints and RANSAC trials on a smaller analysis image
    pub fn fast_preset() -> Self {
        Self {
            features: FeatureConfig {
                threshold: 30,
                max_keypoints: 800,
                nms_radius: 5,
                ..FeatureConfig::default()
            },
            matching: MatchConfig::default(),
            ransac: RansacConfig { max_iters: 400, ..RansacConfig::default() },
            compositor: CompositorConfig::default(),
            analysis_max_dimension: 640,
            name: Some("Fast".to_string()),
            description: Some("Optimized for speed on large frames".to_string()),
        }
    }

    /// More keypoints, tighter inlier threshold and full-resolution analysis up to 2048 px
    pub fn precise_preset() -> Self {
        Self {
            features: FeatureConfig {
                threshold: 15,
                max_keypoints: 4000,
                nms_radius: 2,
                ..FeatureConfig::default()
            },
            matching: MatchConfig { ratio: 0.75, ..MatchConfig::default() },
            ransac: RansacConfig {
                max_iters: 3000,
                inlier_threshold: 2.0,
                ..RansacConfig::default()
            },
            compositor: CompositorConfig::default(),
            analysis_max_dimension: 2048,
            name: Some("Precise".to_string()),
            description: Some("Maximum alignment accuracy at higher cost".to_string()),
        }
    }

    /// Look up a preset by name (`balanced`, `fast` or `precise`)
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "balanced" | "default" => Some(Self::balanced_preset()),
            "fast" => Some(Self::fast_preset()),
            "precise" | "quality" => Some(Self::precise_preset()),
            _ => None,
        }
    }

    /// Add metadata to configuration
    pub fn with_metadata(mut self, name: &str, description: &str) -> Self {
        self.name = Some(name.to_string());
        self.description = Some(description.to_string());
        self
    }

    /// Convert to StitcherBuilder for further customization
    pub fn to_builder(self) -> crate::builder::StitcherBuilder {
        crate::builder::StitcherBuilder::from_config(self)
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "StitchConfig{}: threshold={}, max_keypoints={}, harris={}, analysis<={}px, ratio={}, cross_check={}, ransac={}x@{}px (seed {}), threads={}",
            self.name.as_deref().map(|n| format!(" [{}]", n)).unwrap_or_default(),
            self.features.threshold,
            self.features.max_keypoints,
            self.features.harris_scoring,
            self.analysis_max_dimension,
            self.matching.ratio,
            self.matching.cross_check,
            self.ransac.max_iters,
            self.ransac.inlier_threshold,
            self.ransac.seed,
            self.features.n_threads,
        )
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> StitchResult<()> {
        let invalid = |msg: String| Err(StitchError::InvalidConfig(msg));

        let f = &self.features;
        if f.threshold == 0 || f.threshold > 127 {
            return invalid(format!("FAST threshold must be in 1..=127, got {}", f.threshold));
        }
        if f.patch_size < 3 || f.patch_size % 2 == 0 {
            return invalid(format!("patch size must be odd and at least 3, got {}", f.patch_size));
        }
        if f.max_keypoints == 0 {
            return invalid("max_keypoints must be positive".to_string());
        }

        let m = &self.matching;
        if !(m.ratio > 0.0 && m.ratio <= 1.0) {
            return invalid(format!("ratio must be in (0, 1], got {}", m.ratio));
        }
        if m.min_matches < 4 {
            return invalid(format!("min_matches must be at least 4, got {}", m.min_matches));
        }

        let r = &self.ransac;
        if r.max_iters == 0 {
            return invalid("RANSAC needs at least one iteration".to_string());
        }
        if !(r.inlier_threshold.is_finite() && r.inlier_threshold > 0.0) {
            return invalid(format!("inlier threshold must be positive, got {}", r.inlier_threshold));
        }
        if !(0.0..=1.0).contains(&r.min_inlier_ratio) {
            return invalid(format!("min_inlier_ratio must be in [0, 1], got {}", r.min_inlier_ratio));
        }

        let c = &self.compositor;
        if c.max_output_pixels == 0 || c.max_output_dimension == 0 {
            return invalid("output limits must be positive".to_string());
        }
        Ok(())
    }

    /// Save configuration to JSON file
    #[cfg(feature = "serde")]
    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load configuration from JSON file
    #[cfg(feature = "serde")]
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save configuration to TOML file
    #[cfg(feature = "serde")]
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Load configuration from TOML file
    #[cfg(feature = "serde")]
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Serialize to JSON string
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserialize from TOML string
    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}
