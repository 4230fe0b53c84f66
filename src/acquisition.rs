//! Sample acquisition loop.
//!
//! One step captures with bounded retry until a reading has at least one
//! point, then optionally turns the accepted reading into a feature vector.
//! No state is carried between steps.

use crate::capture::CaptureAdapter;
use crate::errors::CollectorResult;
use crate::features::{FeatureExtractor, FeatureVector, NormalEstimator};
use crate::point_cloud::PointCloud;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Result of one step's capture attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// A reading with at least one point.
    Captured(PointCloud),
    /// Every attempt was invalid; this is the last reading obtained.
    Exhausted(PointCloud),
}

impl CaptureOutcome {
    pub fn cloud(&self) -> &PointCloud {
        match self {
            CaptureOutcome::Captured(cloud) | CaptureOutcome::Exhausted(cloud) => cloud,
        }
    }

    pub fn into_cloud(self) -> PointCloud {
        match self {
            CaptureOutcome::Captured(cloud) | CaptureOutcome::Exhausted(cloud) => cloud,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, CaptureOutcome::Exhausted(_))
    }
}

/// Runs up to `max_try` capture attempts.
///
/// Returns `Ok(None)` when no reading was ever produced (including
/// `max_try == 0`). A null reading counts as an attempt and does not replace
/// an earlier non-null one.
pub fn acquire_step<C: CaptureAdapter>(
    capture: &mut C,
    max_try: u32,
) -> CollectorResult<(Option<CaptureOutcome>, u32)> {
    let mut last: Option<PointCloud> = None;
    let mut attempts = 0;

    for attempt in 1..=max_try {
        attempts = attempt;
        match capture.capture_sample()? {
            Some(cloud) if cloud.is_valid() => {
                debug!(attempt, points = cloud.len(), "Cloud captured");
                return Ok((Some(CaptureOutcome::Captured(cloud)), attempts));
            }
            Some(cloud) => {
                warn!(attempt, max_try, "Invalid cloud detected");
                last = Some(cloud);
            }
            None => {
                warn!(attempt, max_try, "Invalid cloud detected (no reading)");
            }
        }
    }

    Ok((last.map(CaptureOutcome::Exhausted), attempts))
}

/// Form of every record in one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleForm {
    Raw,
    Feature,
}

impl SampleForm {
    pub fn from_flag(as_feature: bool) -> Self {
        if as_feature {
            SampleForm::Feature
        } else {
            SampleForm::Raw
        }
    }
}

/// One stored sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleRecord {
    Raw(PointCloud),
    Feature(FeatureVector),
}

impl SampleRecord {
    pub fn form(&self) -> SampleForm {
        match self {
            SampleRecord::Raw(_) => SampleForm::Raw,
            SampleRecord::Feature(_) => SampleForm::Feature,
        }
    }
}

/// What to do with a reading left over after all attempts were invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExhaustionPolicy {
    /// Store it like any other reading.
    #[default]
    Keep,
    /// Drop it; the step yields nothing.
    Discard,
}

/// How a step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Accepted,
    /// Exhausted, and the reading was stored anyway.
    ExhaustedKept,
    /// Exhausted, and the reading was dropped.
    ExhaustedDiscarded,
    /// No reading at all.
    Skipped,
}

/// Per-step accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub attempts: u32,
    pub status: StepStatus,
}

/// Sample acquisition for one run's configuration.
pub struct SampleAcquirer<N: NormalEstimator> {
    max_try: u32,
    form: SampleForm,
    policy: ExhaustionPolicy,
    extractor: FeatureExtractor,
    estimator: N,
}

impl<N: NormalEstimator> SampleAcquirer<N> {
    pub fn new(
        max_try: u32,
        form: SampleForm,
        policy: ExhaustionPolicy,
        extractor: FeatureExtractor,
        estimator: N,
    ) -> Self {
        Self {
            max_try,
            form,
            policy,
            extractor,
            estimator,
        }
    }

    pub fn form(&self) -> SampleForm {
        self.form
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Runs one step and converts its reading into a record.
    pub fn acquire_record<C: CaptureAdapter>(
        &mut self,
        capture: &mut C,
    ) -> CollectorResult<(Option<SampleRecord>, StepReport)> {
        let (outcome, attempts) = acquire_step(capture, self.max_try)?;

        let (cloud, status) = match outcome {
            None => {
                return Ok((
                    None,
                    StepReport {
                        attempts,
                        status: StepStatus::Skipped,
                    },
                ))
            }
            Some(CaptureOutcome::Captured(cloud)) => (cloud, StepStatus::Accepted),
            Some(CaptureOutcome::Exhausted(cloud)) => match self.policy {
                ExhaustionPolicy::Keep => {
                    warn!(attempts, "Retries exhausted, keeping last reading");
                    (cloud, StepStatus::ExhaustedKept)
                }
                ExhaustionPolicy::Discard => {
                    warn!(attempts, "Retries exhausted, discarding last reading");
                    return Ok((
                        None,
                        StepReport {
                            attempts,
                            status: StepStatus::ExhaustedDiscarded,
                        },
                    ));
                }
            },
        };

        let record = match self.form {
            SampleForm::Raw => SampleRecord::Raw(cloud),
            SampleForm::Feature => {
                SampleRecord::Feature(self.extractor.extract(&cloud, &mut self.estimator)?)
            }
        };

        Ok((Some(record), StepReport { attempts, status }))
    }
}
