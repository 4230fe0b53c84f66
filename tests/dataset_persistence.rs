//! Dataset write/load/verify against the filesystem

use cloud_collector::dataset::{self, manifest_path, Dataset};
use cloud_collector::features::FeatureVector;
use cloud_collector::point_cloud::{Point, PointCloud};
use cloud_collector::{SampleForm, SampleRecord};
use std::fs;
use tempfile::TempDir;

fn raw_dataset() -> Dataset {
    let cloud = PointCloud::new(vec![
        Point::new(0.5, 0.25, 0.125, [255, 128, 0]),
        Point::new(-0.5, 0.0, 0.0625, [0, 0, 0]),
    ]);
    let mut data = Dataset::new(SampleForm::Raw);
    data.insert("cube", vec![SampleRecord::Raw(cloud.clone()); 2])
        .unwrap();
    data.insert("sphere", vec![]).unwrap();
    data
}

#[test]
fn persist_then_load_preserves_samples() {
    let tmp = TempDir::new().expect("tmp dir");
    let path = tmp.path().join("training_set.json");
    let data = raw_dataset();

    let manifest = dataset::persist(&data, &path).expect("persist");
    assert_eq!(manifest.models["cube"], 2);
    assert_eq!(manifest.models["sphere"], 0);
    assert!(manifest_path(&path).exists());

    let loaded = dataset::load(&path).expect("load");
    assert_eq!(loaded, data);
}

#[test]
fn feature_form_survives_without_manifest() {
    let tmp = TempDir::new().expect("tmp dir");
    let path = tmp.path().join("features.json");
    let mut data = Dataset::new(SampleForm::Feature);
    data.insert(
        "cube",
        vec![SampleRecord::Feature(FeatureVector(vec![0.25, 0.75, 0.0]))],
    )
    .unwrap();

    dataset::persist(&data, &path).expect("persist");
    fs::remove_file(manifest_path(&path)).expect("remove manifest");

    let loaded = dataset::load(&path).expect("load");
    assert_eq!(loaded.form(), SampleForm::Feature);
    assert_eq!(loaded.feature_len(), Some(3));
}

#[test]
fn tampered_blob_fails_verification() {
    let tmp = TempDir::new().expect("tmp dir");
    let path = tmp.path().join("training_set.json");
    dataset::persist(&raw_dataset(), &path).expect("persist");
    assert!(dataset::verify(&path).is_ok());

    fs::write(&path, b"{}").expect("overwrite");
    assert!(dataset::verify(&path).is_err());
}

#[test]
fn unwritable_destination_is_an_error() {
    let tmp = TempDir::new().expect("tmp dir");
    let blocker = tmp.path().join("not_a_dir");
    fs::write(&blocker, b"file").expect("blocker");

    let path = blocker.join("training_set.json");
    assert!(dataset::persist(&raw_dataset(), &path).is_err());
    assert!(!path.exists());
}

#[test]
fn failed_manifest_write_leaves_no_blob() {
    let tmp = TempDir::new().expect("tmp dir");
    let path = tmp.path().join("training_set.json");
    // A non-empty directory where the manifest should go.
    let blocker = manifest_path(&path);
    fs::create_dir_all(blocker.join("occupied")).expect("blocker");

    assert!(dataset::persist(&raw_dataset(), &path).is_err());
    assert!(!path.exists());
    let leftovers: Vec<_> = fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![blocker.file_name().unwrap().to_os_string()]);
}

#[test]
fn failed_blob_write_removes_new_manifest() {
    let tmp = TempDir::new().expect("tmp dir");
    let path = tmp.path().join("training_set.json");
    fs::create_dir_all(path.join("occupied")).expect("blocker");

    assert!(dataset::persist(&raw_dataset(), &path).is_err());
    assert!(!manifest_path(&path).exists());
}

#[test]
fn failed_rewrite_leaves_previous_blob_untouched() {
    let tmp = TempDir::new().expect("tmp dir");
    let path = tmp.path().join("training_set.json");
    dataset::persist(&raw_dataset(), &path).expect("first persist");
    let before = fs::read(&path).expect("first blob");

    // Block the manifest rename for the second run.
    let manifest_file = manifest_path(&path);
    fs::remove_file(&manifest_file).expect("remove manifest");
    fs::create_dir_all(manifest_file.join("occupied")).expect("blocker");

    let mut second = Dataset::new(SampleForm::Raw);
    second.insert("cone", vec![]).unwrap();
    assert!(dataset::persist(&second, &path).is_err());
    assert_eq!(fs::read(&path).expect("blob after failure"), before);
}
