//! Dataset builder: drives the acquisition loop over every requested model.
//!
//! Models are handled strictly one after another inside [`Scene::occupy`],
//! and the dataset is written exactly once after the last model. Any
//! environment, capture or service error aborts the run before that write.

use crate::acquisition::{SampleAcquirer, SampleRecord, StepStatus};
use crate::capture::CaptureAdapter;
use crate::dataset::{self, Dataset, DatasetManifest};
use crate::environment::{EnvironmentController, Scene};
use crate::errors::CollectorResult;
use crate::features::NormalEstimator;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Per-model accounting for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelReport {
    pub model: String,
    pub samples: usize,
    pub accepted: u32,
    pub exhausted_kept: u32,
    pub exhausted_discarded: u32,
    pub skipped: u32,
    pub attempts: u32,
}

impl ModelReport {
    fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub path: PathBuf,
    pub models: Vec<ModelReport>,
    pub manifest: DatasetManifest,
}

pub struct Collector<E, C, N>
where
    E: EnvironmentController,
    C: CaptureAdapter,
    N: NormalEstimator,
{
    env: E,
    capture: C,
    acquirer: SampleAcquirer<N>,
}

impl<E, C, N> Collector<E, C, N>
where
    E: EnvironmentController,
    C: CaptureAdapter,
    N: NormalEstimator,
{
    pub fn new(env: E, capture: C, acquirer: SampleAcquirer<N>) -> Self {
        Self {
            env,
            capture,
            acquirer,
        }
    }

    /// Builds the dataset in memory without persisting it.
    pub fn collect(
        &mut self,
        models: &[String],
        steps: u32,
    ) -> CollectorResult<(Dataset, Vec<ModelReport>)> {
        if models.is_empty() {
            warn!("No models configured, dataset will be empty");
        }

        let mut scene = Scene::prepare(&mut self.env)?;
        let mut dataset = Dataset::new(self.acquirer.form());
        let mut reports = Vec::with_capacity(models.len());

        for model in models {
            info!(model = %model, steps, "Collecting samples");
            let capture = &mut self.capture;
            let acquirer = &mut self.acquirer;
            let (records, report) =
                scene.occupy(model, || collect_model(acquirer, capture, model, steps))?;

            info!(
                model = %model,
                samples = report.samples,
                attempts = report.attempts,
                "Model done"
            );
            dataset.insert(model, records)?;
            reports.push(report);
        }

        Ok((dataset, reports))
    }

    /// Collects every model, then writes the dataset to `path`.
    pub fn run(mut self, models: &[String], steps: u32, path: &Path) -> CollectorResult<RunSummary> {
        let (dataset, reports) = self.collect(models, steps)?;
        let manifest = dataset::persist(&dataset, path)?;
        Ok(RunSummary {
            path: path.to_path_buf(),
            models: reports,
            manifest,
        })
    }

    pub fn into_parts(self) -> (E, C, SampleAcquirer<N>) {
        (self.env, self.capture, self.acquirer)
    }
}

fn collect_model<C: CaptureAdapter, N: NormalEstimator>(
    acquirer: &mut SampleAcquirer<N>,
    capture: &mut C,
    model: &str,
    steps: u32,
) -> CollectorResult<(Vec<SampleRecord>, ModelReport)> {
    let mut records = Vec::with_capacity(steps as usize);
    let mut report = ModelReport::new(model);

    for _ in 0..steps {
        let (record, step) = acquirer.acquire_record(capture)?;
        report.attempts += step.attempts;
        match step.status {
            StepStatus::Accepted => report.accepted += 1,
            StepStatus::ExhaustedKept => report.exhausted_kept += 1,
            StepStatus::ExhaustedDiscarded => report.exhausted_discarded += 1,
            StepStatus::Skipped => report.skipped += 1,
        }
        if let Some(record) = record {
            records.push(record);
        }
    }

    report.samples = records.len();
    Ok((records, report))
}
