// src/tests/config.rs
use crate::acquisition::{ExhaustionPolicy, SampleForm};
use crate::config::{BackendKind, CollectorConfig, ModelEntry};
use crate::features::ColorSpace;
use figment::Jail;
use std::path::PathBuf;

#[test]
pub fn defaults_match_collection_conventions() {
    let cfg = CollectorConfig::default();
    assert!(cfg.object_list.is_empty());
    assert_eq!(cfg.path, PathBuf::from("config/training_set.json"));
    assert!(!cfg.as_feature);
    assert_eq!(cfg.steps, 16);
    assert_eq!(cfg.max_try, 8);
    assert_eq!(cfg.on_exhausted, ExhaustionPolicy::Keep);
    assert_eq!(cfg.features.color_space, ColorSpace::Hsv);
    assert_eq!(cfg.extractor().feature_len(), 3 * 32 + 3 * 32);
    assert_eq!(cfg.form(), SampleForm::Raw);
}

#[test]
pub fn toml_file_then_env_override() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "collector.toml",
            r#"
                path = "out/set.json"
                as_feature = true
                steps = 5

                [[object_list]]
                name = "biscuits"

                [[object_list]]
                name = "soap"

                [features]
                color_bins = 16
            "#,
        )?;
        jail.set_env("COLLECTOR_MAX_TRY", "3");
        jail.set_env("COLLECTOR_BACKEND__KIND", "remote");

        let cfg: CollectorConfig = CollectorConfig::figment(Some("collector.toml")).extract()?;

        assert_eq!(cfg.model_names(), vec!["biscuits", "soap"]);
        assert_eq!(cfg.path, PathBuf::from("out/set.json"));
        assert!(cfg.as_feature);
        assert_eq!(cfg.steps, 5);
        assert_eq!(cfg.max_try, 3);
        assert_eq!(cfg.features.color_bins, 16);
        assert_eq!(cfg.features.normal_bins, 32);
        assert_eq!(cfg.backend.kind, BackendKind::Remote);
        Ok(())
    });
}

#[test]
pub fn missing_file_falls_back_to_defaults() {
    Jail::expect_with(|_jail| {
        let cfg: CollectorConfig = CollectorConfig::figment(Some("absent.toml")).extract()?;
        assert_eq!(cfg, CollectorConfig::default());
        Ok(())
    });
}

#[test]
pub fn duplicate_models_rejected() {
    let cfg = CollectorConfig {
        object_list: vec![
            ModelEntry { name: "cube".into() },
            ModelEntry { name: "cube".into() },
        ],
        ..Default::default()
    };
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("duplicate model 'cube'"));
}

#[test]
pub fn zero_bins_rejected_in_feature_mode() {
    let mut cfg = CollectorConfig {
        as_feature: true,
        ..Default::default()
    };
    cfg.features.normal_bins = 0;
    assert!(cfg.validate().is_err());

    cfg.as_feature = false;
    assert!(cfg.validate().is_ok());
}

#[test]
pub fn dropout_out_of_range_rejected() {
    let mut cfg = CollectorConfig::default();
    cfg.backend.dropout = 1.5;
    assert!(cfg.validate().is_err());
}

#[test]
pub fn effective_config_renders_as_toml() {
    let cfg = CollectorConfig {
        object_list: vec![ModelEntry { name: "cube".into() }],
        ..Default::default()
    };
    let rendered = cfg.to_toml().unwrap();
    assert!(rendered.contains("max_try = 8"));
    assert!(rendered.contains("name = \"cube\""));
}
