//! Sequencing of one upload run: inputs, provenance, coverage, payloads,
//! uploads, outputs.
//!
//! Every fatal condition ends the sequence and is logged. Whether it also
//! fails the step depends on `fail-on-error`.

use std::path::Path;

use tracing::{error, info};

use crate::actions;
use crate::config::{Config, Inputs, PipelineMode};
use crate::diff;
use crate::env::{self, EnvSource, Provenance};
use crate::error::{Result, Stage, UploadError};
use crate::ingest;
use crate::model::UploadResponse;
use crate::payload::{self, BuildShape};
use crate::upload::Uploader;

/// Values published as step outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outputs {
    pub build_hash: String,
    /// Only set by the two-phase pipeline.
    pub scene_key: Option<String>,
}

impl Outputs {
    /// `(name, value)` pairs in publication order.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("build-hash", self.build_hash.clone())];
        if let Some(scene_key) = &self.scene_key {
            pairs.push(("scene-key", scene_key.clone()));
        }
        pairs
    }
}

/// Result of a run as the step should report it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub outputs: Option<Outputs>,
    /// Message of the fatal error, if any. Always logged.
    pub error: Option<String>,
    /// True when the step must be reported as failed.
    pub failed: bool,
    pub fail_on_error: bool,
}

impl Outcome {
    fn from_error(err: &UploadError, fail_on_error: bool) -> Self {
        let message = err.to_string();
        error!("{message}");
        actions::error(&message);
        Self {
            outputs: None,
            error: Some(message),
            failed: fail_on_error,
            fail_on_error,
        }
    }

    /// Publish the outputs as step outputs. A write failure is handled like
    /// any other pipeline error.
    pub fn publish(self, env: &dyn EnvSource) -> Self {
        let Some(outputs) = &self.outputs else {
            return self;
        };
        for (name, value) in outputs.pairs() {
            if let Err(source) = actions::set_output(env, name, &value) {
                let err = UploadError::Output { name, source };
                return Self::from_error(&err, self.fail_on_error);
            }
        }
        self
    }
}

/// Check the `success` flag of an upload response.
fn accept(response: UploadResponse, stage: Stage) -> Result<UploadResponse> {
    if response.success {
        return Ok(response);
    }
    let message = response
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "Unknown error".to_string());
    Err(UploadError::Rejected { stage, message })
}

fn display_or_empty(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

/// Load coverage from `workdir` and upload it. `event` is the raw CI event
/// payload for the event-shaped build metadata.
pub fn upload(
    config: &Config,
    provenance: &Provenance,
    event: Option<String>,
    workdir: &Path,
    uploader: &dyn Uploader,
) -> Result<Outputs> {
    for (key, value) in provenance.to_fields() {
        info!("key:{key},value:{}", value.as_str().unwrap_or_default());
    }

    info!("Loading coverage files: {}", config.coverage_files.join(", "));
    let coverage = ingest::load_coverage_files(&config.coverage_files, workdir)?;
    if coverage.is_empty() {
        return Err(UploadError::EmptyCoverage);
    }
    info!("Loaded {} coverage entries", coverage.len());

    let diff = diff::load_diff(workdir);
    let build = payload::build_metadata(config.build_shape, provenance, event);
    let map_init = payload::build_map_init_payload(
        &coverage,
        provenance,
        &config.instrument_cwd,
        &config.build_target,
        build,
        diff.as_ref(),
    );

    info!("Uploading coverage map initialization...");
    let map_init_result = accept(uploader.map_init(&map_init)?, Stage::MapInit)?;
    info!(
        "Map init successful. BuildHash: {}",
        display_or_empty(&map_init_result.build_hash)
    );

    match config.mode {
        PipelineMode::SinglePhase => Ok(Outputs {
            build_hash: map_init_result.build_hash.unwrap_or_default(),
            scene_key: None,
        }),
        PipelineMode::TwoPhase => {
            let scene = payload::build_scene(config.scene.clone(), provenance);
            let client = payload::build_client_payload(&coverage, scene);

            info!("Uploading coverage data...");
            let client_result = accept(uploader.upload_client(&client)?, Stage::Client)?;
            info!(
                "Coverage upload successful. BuildHash: {}, SceneKey: {}",
                display_or_empty(&client_result.build_hash),
                display_or_empty(&client_result.scene_key)
            );

            Ok(Outputs {
                build_hash: client_result.build_hash.unwrap_or_default(),
                scene_key: Some(client_result.scene_key.unwrap_or_default()),
            })
        }
    }
}

/// Run the whole step. `connect` builds the uploader once the inputs are
/// validated. Never returns an error: failures land in the [`Outcome`].
pub fn run<U, F>(inputs: &Inputs, env: &dyn EnvSource, workdir: &Path, connect: F) -> Outcome
where
    U: Uploader,
    F: FnOnce(&Config) -> U,
{
    let fail_on_error = match inputs.fail_on_error() {
        Ok(flag) => flag,
        Err(e) => return Outcome::from_error(&e, true),
    };

    let result = inputs.resolve().and_then(|config| {
        let provenance = Provenance::from_env(env, config.repo_id_scheme);
        let event = match config.build_shape {
            BuildShape::Event => env::event_payload(env),
            BuildShape::Workflow => None,
        };
        let uploader = connect(&config);
        upload(&config, &provenance, event, workdir, &uploader)
    });

    match result {
        Ok(outputs) => Outcome {
            outputs: Some(outputs),
            error: None,
            failed: false,
            fail_on_error,
        },
        Err(e) => Outcome::from_error(&e, fail_on_error),
    }
}
