// dataset.rs - Per-model sample collections and their on-disk form
// Purpose: build the dataset in memory, write it once atomically, read it back for training

use crate::acquisition::{SampleForm, SampleRecord};
use crate::errors::{CollectorError, CollectorResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;
use uuid::Uuid;

/// Mapping from model name to its accepted samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    form: SampleForm,
    models: BTreeMap<String, Vec<SampleRecord>>,
}

impl Dataset {
    pub fn new(form: SampleForm) -> Self {
        Self {
            form,
            models: BTreeMap::new(),
        }
    }

    pub fn form(&self) -> SampleForm {
        self.form
    }

    /// Adds one model's samples.
    ///
    /// Rejects a key that is already present, a record of the wrong form, and
    /// a feature vector whose length differs from the ones already stored.
    pub fn insert(&mut self, model_name: &str, records: Vec<SampleRecord>) -> CollectorResult<()> {
        if self.models.contains_key(model_name) {
            return Err(CollectorError::dataset(format!(
                "model '{model_name}' already present"
            )));
        }

        let mut expected_len = self.feature_len();
        for record in &records {
            if record.form() != self.form {
                return Err(CollectorError::dataset(format!(
                    "model '{model_name}': {:?} record in a {:?} dataset",
                    record.form(),
                    self.form
                )));
            }
            if let SampleRecord::Feature(vector) = record {
                match expected_len {
                    Some(len) if len != vector.len() => {
                        return Err(CollectorError::dataset(format!(
                            "model '{model_name}': feature length {} differs from {len}",
                            vector.len()
                        )));
                    }
                    Some(_) => {}
                    None => expected_len = Some(vector.len()),
                }
            }
        }

        self.models.insert(model_name.to_string(), records);
        Ok(())
    }

    pub fn get(&self, model_name: &str) -> Option<&[SampleRecord]> {
        self.models.get(model_name).map(Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn models(&self) -> &BTreeMap<String, Vec<SampleRecord>> {
        &self.models
    }

    /// Number of models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn total_samples(&self) -> usize {
        self.models.values().map(Vec::len).sum()
    }

    /// Length of the stored feature vectors, if any are stored.
    pub fn feature_len(&self) -> Option<usize> {
        self.models
            .values()
            .flatten()
            .find_map(|record| match record {
                SampleRecord::Feature(vector) => Some(vector.len()),
                SampleRecord::Raw(_) => None,
            })
    }

    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.models
            .iter()
            .map(|(name, records)| (name.clone(), records.len()))
            .collect()
    }
}

/// Sidecar describing a persisted dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub dataset_file: String,
    pub sha256: String,
    pub form: SampleForm,
    pub feature_len: Option<usize>,
    pub models: BTreeMap<String, usize>,
    pub total_samples: usize,
}

/// Path of the manifest written next to `path`.
pub fn manifest_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".manifest.json");
    path.with_file_name(name)
}

fn hash_bytes(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

fn output_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Writes `data` to a synced temp file in `dir`, ready to be renamed into place.
fn stage(dir: &Path, data: &[u8]) -> CollectorResult<NamedTempFile> {
    let mut tmp =
        NamedTempFile::new_in(dir).map_err(|e| CollectorError::io("creating temp file", e))?;
    tmp.write_all(data)
        .map_err(|e| CollectorError::io("writing temp file", e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| CollectorError::io("syncing temp file", e))?;
    Ok(tmp)
}

fn commit(staged: NamedTempFile, path: &Path) -> CollectorResult<()> {
    staged
        .persist(path)
        .map_err(|e| CollectorError::io(format!("renaming into {}", path.display()), e.error))?;
    Ok(())
}

/// Writes the dataset and its manifest.
///
/// Both files are staged before either is renamed into place. The manifest
/// is committed first; the blob at `path` is only replaced once the manifest
/// is in place, and a failed blob rename removes the new manifest again.
pub fn persist(dataset: &Dataset, path: &Path) -> CollectorResult<DatasetManifest> {
    let blob = serde_json::to_vec(dataset.models())
        .map_err(|e| CollectorError::serialization("encoding dataset", e))?;

    let manifest = DatasetManifest {
        run_id: Uuid::new_v4(),
        created_at: Utc::now(),
        dataset_file: path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string(),
        sha256: hash_bytes(&blob),
        form: dataset.form(),
        feature_len: dataset.feature_len(),
        models: dataset.counts(),
        total_samples: dataset.total_samples(),
    };
    let manifest_json = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| CollectorError::serialization("encoding manifest", e))?;

    let dir = output_dir(path);
    fs::create_dir_all(&dir).map_err(|e| CollectorError::io("creating output directory", e))?;
    let staged_blob = stage(&dir, &blob)?;
    let staged_manifest = stage(&dir, &manifest_json)?;

    let manifest_file = manifest_path(path);
    commit(staged_manifest, &manifest_file)?;
    if let Err(err) = commit(staged_blob, path) {
        let _ = fs::remove_file(&manifest_file);
        return Err(err);
    }

    info!(
        path = %path.display(),
        models = dataset.len(),
        samples = dataset.total_samples(),
        sha256 = %manifest.sha256,
        "Dataset written"
    );
    Ok(manifest)
}

/// Reads the manifest next to `path`, if there is one.
pub fn load_manifest(path: &Path) -> CollectorResult<Option<DatasetManifest>> {
    let manifest_file = manifest_path(path);
    if !manifest_file.exists() {
        return Ok(None);
    }
    let raw = fs::read(&manifest_file).map_err(|e| CollectorError::io("reading manifest", e))?;
    let manifest = serde_json::from_slice(&raw)
        .map_err(|e| CollectorError::serialization("decoding manifest", e))?;
    Ok(Some(manifest))
}

/// Reads a dataset written by [`persist`].
///
/// The record form comes from the manifest when present, otherwise from the
/// first stored record.
pub fn load(path: &Path) -> CollectorResult<Dataset> {
    let raw = fs::read(path).map_err(|e| CollectorError::io("reading dataset", e))?;
    let models: BTreeMap<String, Vec<SampleRecord>> = serde_json::from_slice(&raw)
        .map_err(|e| CollectorError::serialization("decoding dataset", e))?;

    let form = match load_manifest(path)? {
        Some(manifest) => manifest.form,
        None => models
            .values()
            .flatten()
            .next()
            .map(SampleRecord::form)
            .unwrap_or(SampleForm::Raw),
    };

    let mut dataset = Dataset::new(form);
    for (name, records) in models {
        dataset.insert(&name, records)?;
    }
    Ok(dataset)
}

/// Checks the blob at `path` against its manifest digest.
pub fn verify(path: &Path) -> CollectorResult<DatasetManifest> {
    let manifest = load_manifest(path)?.ok_or_else(|| {
        CollectorError::dataset(format!("no manifest for {}", path.display()))
    })?;
    let raw = fs::read(path).map_err(|e| CollectorError::io("reading dataset", e))?;
    let actual = hash_bytes(&raw);
    if actual != manifest.sha256 {
        return Err(CollectorError::dataset(format!(
            "digest mismatch: manifest {} vs file {actual}",
            manifest.sha256
        )));
    }
    Ok(manifest)
}
