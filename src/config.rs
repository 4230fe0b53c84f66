// config.rs - Collector run configuration
// Purpose: resolve every run parameter once, before the acquisition loop starts

use crate::acquisition::{ExhaustionPolicy, SampleForm};
use crate::errors::{CollectorError, CollectorResult};
use crate::features::{ColorSpace, FeatureExtractor};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "collector.toml";

/// One entry of the object list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSettings {
    #[serde(default)]
    pub color_space: ColorSpace,
    #[serde(default = "default_bins")]
    pub color_bins: usize,
    #[serde(default = "default_bins")]
    pub normal_bins: usize,
}

fn default_bins() -> usize {
    32
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            color_space: ColorSpace::Hsv,
            color_bins: default_bins(),
            normal_bins: default_bins(),
        }
    }
}

/// Which implementation backs the environment, camera and normal service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Synthetic,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSettings {
    #[serde(default)]
    pub kind: BackendKind,
    #[serde(default = "default_scene_url")]
    pub scene_url: String,
    #[serde(default = "default_normals_url")]
    pub normals_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Probability that the synthetic camera returns an empty cloud.
    #[serde(default)]
    pub dropout: f64,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_scene_url() -> String {
    "http://127.0.0.1:8765".to_string()
}

fn default_normals_url() -> String {
    "http://127.0.0.1:8765/feature_extractor/get_normals".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            kind: BackendKind::Synthetic,
            scene_url: default_scene_url(),
            normals_url: default_normals_url(),
            timeout_secs: default_timeout(),
            dropout: 0.0,
            seed: None,
        }
    }
}

/// Resolved parameters for one collection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorConfig {
    pub path: PathBuf,
    pub as_feature: bool,
    /// Steps per model.
    pub steps: u32,
    pub max_try: u32,
    #[serde(default)]
    pub on_exhausted: ExhaustionPolicy,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    // TOML output needs tables after plain values.
    pub object_list: Vec<ModelEntry>,
    #[serde(default)]
    pub features: FeatureSettings,
    #[serde(default)]
    pub backend: BackendSettings,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("config").join("training_set.json"),
            as_feature: false,
            steps: 16,
            max_try: 8,
            on_exhausted: ExhaustionPolicy::Keep,
            log_level: default_log_level(),
            object_list: Vec::new(),
            features: FeatureSettings::default(),
            backend: BackendSettings::default(),
        }
    }
}

impl CollectorConfig {
    /// Defaults, then the TOML file, then `COLLECTOR_*` environment variables.
    ///
    /// Nested keys use a double underscore, e.g. `COLLECTOR_BACKEND__KIND=remote`.
    pub fn figment(file: Option<&str>) -> Figment {
        let file = file
            .map(str::to_string)
            .or_else(|| std::env::var("COLLECTOR_CONFIG_PATH").ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        Figment::from(Serialized::defaults(CollectorConfig::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("COLLECTOR_").ignore(&["config_path"]).split("__"))
    }

    pub fn load(file: Option<&str>) -> CollectorResult<Self> {
        let config: CollectorConfig = Self::figment(file).extract()?;
        Ok(config)
    }

    pub fn model_names(&self) -> Vec<String> {
        self.object_list.iter().map(|m| m.name.clone()).collect()
    }

    pub fn form(&self) -> SampleForm {
        SampleForm::from_flag(self.as_feature)
    }

    pub fn extractor(&self) -> FeatureExtractor {
        FeatureExtractor {
            color_space: self.features.color_space,
            color_bins: self.features.color_bins,
            normal_bins: self.features.normal_bins,
        }
    }

    /// Checks values the run cannot proceed with.
    pub fn validate(&self) -> CollectorResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(CollectorError::validation("path", "output path cannot be empty"));
        }

        let mut seen = HashSet::new();
        for entry in &self.object_list {
            if entry.name.trim().is_empty() {
                return Err(CollectorError::validation("object_list", "model name cannot be empty"));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(CollectorError::validation(
                    "object_list",
                    format!("duplicate model '{}'", entry.name),
                ));
            }
        }

        if self.as_feature && (self.features.color_bins == 0 || self.features.normal_bins == 0) {
            return Err(CollectorError::validation("features", "histogram bins must be positive"));
        }

        if !(0.0..=1.0).contains(&self.backend.dropout) {
            return Err(CollectorError::validation("backend.dropout", "must be within [0, 1]"));
        }

        Ok(())
    }

    /// Effective configuration rendered as TOML.
    pub fn to_toml(&self) -> CollectorResult<String> {
        toml::to_string_pretty(self).map_err(|e| CollectorError::config(e.to_string()))
    }
}
