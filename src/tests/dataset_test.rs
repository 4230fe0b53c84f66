// src/tests/dataset_test.rs
use crate::acquisition::{SampleForm, SampleRecord};
use crate::dataset::{manifest_path, Dataset};
use crate::errors::CollectorError;
use crate::features::FeatureVector;
use crate::tests::test_utils::valid_cloud;
use std::path::Path;

fn feature(len: usize) -> SampleRecord {
    SampleRecord::Feature(FeatureVector(vec![0.5; len]))
}

#[test]
fn duplicate_key_rejected() {
    let mut dataset = Dataset::new(SampleForm::Raw);
    dataset.insert("cube", vec![]).unwrap();
    let err = dataset.insert("cube", vec![]).unwrap_err();
    assert!(matches!(err, CollectorError::Dataset { .. }));
    assert_eq!(dataset.len(), 1);
}

#[test]
fn mixed_forms_rejected() {
    let mut dataset = Dataset::new(SampleForm::Feature);
    dataset.insert("cube", vec![feature(4)]).unwrap();
    let result = dataset.insert("sphere", vec![SampleRecord::Raw(valid_cloud(1, 3))]);
    assert!(result.is_err());
    assert!(dataset.get("sphere").is_none());
}

#[test]
fn feature_length_must_agree_across_models() {
    let mut dataset = Dataset::new(SampleForm::Feature);
    dataset.insert("cube", vec![feature(6), feature(6)]).unwrap();
    assert!(dataset.insert("sphere", vec![feature(5)]).is_err());
    assert!(dataset.insert("cone", vec![feature(6), feature(7)]).is_err());
    assert_eq!(dataset.feature_len(), Some(6));
}

#[test]
fn counts_and_totals() {
    let mut dataset = Dataset::new(SampleForm::Raw);
    dataset
        .insert("cube", vec![SampleRecord::Raw(valid_cloud(0, 2)); 3])
        .unwrap();
    dataset.insert("sphere", vec![]).unwrap();

    assert_eq!(dataset.total_samples(), 3);
    assert_eq!(dataset.counts()["cube"], 3);
    assert_eq!(dataset.counts()["sphere"], 0);
    assert_eq!(dataset.feature_len(), None);
}

#[test]
fn manifest_sits_next_to_dataset() {
    assert_eq!(
        manifest_path(Path::new("config/training_set.json")),
        Path::new("config/training_set.json.manifest.json")
    );
}
