use crate::acquisition::{ExhaustionPolicy, SampleAcquirer};
use crate::capture::CaptureAdapter;
use crate::collector::{Collector, RunSummary};
use crate::config::{BackendKind, CollectorConfig, ModelEntry};
use crate::dataset;
use crate::environment::EnvironmentController;
use crate::errors::CollectorResult;
use crate::features::NormalEstimator;
use crate::remote::{build_client, RemoteCamera, RemoteNormals, RemoteScene};
use crate::synthetic::{SyntheticScene, SyntheticSettings};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;

/// Top-level CLI interface
#[derive(Parser, Debug)]
#[command(
    name = "cloud_collector",
    version,
    about = "Collect labeled point-cloud training samples per object model"
)]
pub struct Cli {
    /// Configuration file (defaults to collector.toml or $COLLECTOR_CONFIG_PATH)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendArg {
    Synthetic,
    Remote,
}

/// Flags of `collect`; every one left unset keeps the configured value.
#[derive(Args, Debug, Default)]
pub struct CollectArgs {
    /// Model to sample; repeat to override the configured object list
    #[arg(short, long = "model")]
    pub models: Vec<String>,
    #[arg(short, long)]
    pub path: Option<PathBuf>,
    /// Store feature vectors instead of raw clouds
    #[arg(long, conflicts_with = "raw")]
    pub as_feature: bool,
    /// Store raw clouds even when the configuration asks for features
    #[arg(long)]
    pub raw: bool,
    #[arg(long)]
    pub steps: Option<u32>,
    #[arg(long)]
    pub max_try: Option<u32>,
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,
    /// Drop readings left over when every attempt was invalid
    #[arg(long, conflicts_with = "keep_exhausted")]
    pub discard_exhausted: bool,
    /// Keep the last invalid reading when attempts run out
    #[arg(long)]
    pub keep_exhausted: bool,
}

impl CollectArgs {
    /// `Some(true)` for `--as-feature`, `Some(false)` for `--raw`.
    pub fn form_override(&self) -> Option<bool> {
        match (self.as_feature, self.raw) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    pub fn exhaustion_override(&self) -> Option<ExhaustionPolicy> {
        match (self.discard_exhausted, self.keep_exhausted) {
            (true, _) => Some(ExhaustionPolicy::Discard),
            (_, true) => Some(ExhaustionPolicy::Keep),
            _ => None,
        }
    }

    /// Applies the flags on top of the loaded configuration.
    pub fn apply(self, mut config: CollectorConfig) -> CollectorConfig {
        if let Some(as_feature) = self.form_override() {
            config.as_feature = as_feature;
        }
        if let Some(policy) = self.exhaustion_override() {
            config.on_exhausted = policy;
        }
        if !self.models.is_empty() {
            config.object_list = self.models.into_iter().map(|name| ModelEntry { name }).collect();
        }
        if let Some(path) = self.path {
            config.path = path;
        }
        if let Some(steps) = self.steps {
            config.steps = steps;
        }
        if let Some(max_try) = self.max_try {
            config.max_try = max_try;
        }
        if let Some(backend) = self.backend {
            config.backend.kind = match backend {
                BackendArg::Synthetic => BackendKind::Synthetic,
                BackendArg::Remote => BackendKind::Remote,
            };
        }
        config
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Spawn each model, capture its samples and write the dataset
    Collect(CollectArgs),

    /// Summarize a saved dataset
    Inspect {
        #[arg(short, long)]
        path: PathBuf,
    },

    /// Check a saved dataset against its manifest digest
    Verify {
        #[arg(short, long)]
        path: PathBuf,
    },

    /// Print the effective configuration
    Config,
}

fn run_with<E, C, N>(config: &CollectorConfig, env: E, capture: C, normals: N) -> CollectorResult<RunSummary>
where
    E: EnvironmentController,
    C: CaptureAdapter,
    N: NormalEstimator,
{
    let acquirer = SampleAcquirer::new(
        config.max_try,
        config.form(),
        config.on_exhausted,
        config.extractor(),
        normals,
    );
    Collector::new(env, capture, acquirer).run(&config.model_names(), config.steps, &config.path)
}

/// Builds the configured backend and runs a full collection.
pub fn run_collection(config: &CollectorConfig) -> CollectorResult<RunSummary> {
    config.validate()?;
    info!(
        models = config.object_list.len(),
        steps = config.steps,
        max_try = config.max_try,
        as_feature = config.as_feature,
        backend = ?config.backend.kind,
        "Starting collection"
    );

    match config.backend.kind {
        BackendKind::Synthetic => {
            let scene = SyntheticScene::new(SyntheticSettings {
                dropout: config.backend.dropout,
                seed: config.backend.seed,
                ..Default::default()
            });
            let (env, camera, normals) = scene.split();
            run_with(config, env, camera, normals)
        }
        BackendKind::Remote => {
            let client = build_client(config.backend.timeout_secs)?;
            let env = RemoteScene::new(client.clone(), config.backend.scene_url.clone());
            let camera = RemoteCamera::new(client.clone(), &config.backend.scene_url);
            let normals = RemoteNormals::new(client, config.backend.normals_url.clone());
            run_with(config, env, camera, normals)
        }
    }
}

pub fn dispatch(cli: Cli) -> CollectorResult<()> {
    let config = CollectorConfig::load(cli.config.as_deref())?;
    crate::telemetry::init(&config.log_level);

    match cli.command {
        Commands::Collect(args) => {
            let config = args.apply(config);
            let summary = run_collection(&config)?;
            for report in &summary.models {
                println!(
                    "{:<24} samples={:<4} accepted={:<4} exhausted={:<4} skipped={:<4} attempts={}",
                    report.model,
                    report.samples,
                    report.accepted,
                    report.exhausted_kept + report.exhausted_discarded,
                    report.skipped,
                    report.attempts
                );
            }
            println!("Dataset written to {}", summary.path.display());
            println!("SHA256: {}", summary.manifest.sha256);
        }
        Commands::Inspect { path } => {
            let data = dataset::load(&path)?;
            println!("Form: {:?}", data.form());
            if let Some(len) = data.feature_len() {
                println!("Feature length: {len}");
            }
            for (model, count) in data.counts() {
                println!("  {model}: {count}");
            }
            println!("Total: {} samples across {} models", data.total_samples(), data.len());
        }
        Commands::Verify { path } => {
            let manifest = dataset::verify(&path)?;
            println!("OK {} ({})", path.display(), manifest.sha256);
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
