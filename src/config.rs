//! Step inputs. Each input is a `--flag` and the matching GitHub Actions
//! `INPUT_<NAME>` variable; validation happens in [`Inputs::resolve`] so that
//! a bad input is reported like any other pipeline failure.

use clap::{Args, ValueEnum};

use crate::env::RepoIdScheme;
use crate::error::{Result, UploadError};
use crate::ingest;
use crate::model::Scene;
use crate::payload::{self, BuildShape};

/// Which upload phases run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PipelineMode {
    /// map/init only; `build-hash` comes from map/init.
    SinglePhase,
    /// map/init then client upload; `build-hash` and `scene-key` come from
    /// the client upload.
    #[default]
    TwoPhase,
}

#[derive(Debug, Clone, Default, Args)]
pub struct Inputs {
    /// Comma-separated coverage JSON files.
    #[arg(long, env = "INPUT_COVERAGE-FILE")]
    pub coverage_file: Option<String>,

    /// Base URL of the Canyon service.
    #[arg(long, env = "INPUT_CANYON-URL")]
    pub canyon_url: Option<String>,

    /// Bearer token for the Canyon service.
    #[arg(long, env = "INPUT_CANYON-TOKEN", hide_env_values = true)]
    pub canyon_token: Option<String>,

    /// Working directory the sources were instrumented in.
    #[arg(long, env = "INPUT_INSTRUMENT-CWD")]
    pub instrument_cwd: Option<String>,

    /// Free-form build target label.
    #[arg(long, env = "INPUT_BUILD-TARGET")]
    pub build_target: Option<String>,

    /// JSON object merged into the upload scene.
    #[arg(long, env = "INPUT_SCENE")]
    pub scene: Option<String>,

    /// Fail the step when the upload fails (default: true).
    #[arg(long, env = "INPUT_FAIL-ON-ERROR")]
    pub fail_on_error: Option<String>,

    /// Upload phases to run: single-phase or two-phase (default).
    #[arg(long, env = "INPUT_MODE")]
    pub mode: Option<String>,

    /// Shape of the `build` object sent to map/init: workflow (default) or event.
    #[arg(long, env = "INPUT_BUILD-METADATA")]
    pub build_metadata: Option<String>,

    /// Variable that identifies the repository: repository (default) or repository-id.
    #[arg(long, env = "INPUT_REPO-ID-SCHEME")]
    pub repo_id_scheme: Option<String>,
}

/// Validated inputs.
#[derive(Debug, Clone)]
pub struct Config {
    pub coverage_files: Vec<String>,
    pub canyon_url: String,
    pub canyon_token: Option<String>,
    pub instrument_cwd: String,
    pub build_target: String,
    pub scene: Scene,
    pub fail_on_error: bool,
    pub mode: PipelineMode,
    pub build_shape: BuildShape,
    pub repo_id_scheme: RepoIdScheme,
}

fn trimmed(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or_default()
}

fn required(value: &Option<String>, name: &'static str) -> Result<String> {
    match trimmed(value) {
        "" => Err(UploadError::MissingInput(name)),
        v => Ok(v.to_string()),
    }
}

/// Boolean input in the YAML 1.2 core schema spellings the Actions toolkit
/// accepts.
pub fn parse_bool_input(name: &'static str, value: &str) -> Result<bool> {
    match value.trim() {
        "true" | "True" | "TRUE" => Ok(true),
        "false" | "False" | "FALSE" => Ok(false),
        other => Err(UploadError::InvalidInput {
            name,
            reason: format!("'{other}' is not one of true|True|TRUE|false|False|FALSE"),
        }),
    }
}

/// Enumerated input; blank means the type's default.
pub fn parse_enum_input<T: ValueEnum + Default>(
    name: &'static str,
    value: &Option<String>,
) -> Result<T> {
    match trimmed(value) {
        "" => Ok(T::default()),
        v => T::from_str(v, true).map_err(|_| {
            let allowed: Vec<String> = T::value_variants()
                .iter()
                .filter_map(|variant| variant.to_possible_value())
                .map(|possible| possible.get_name().to_string())
                .collect();
            UploadError::InvalidInput {
                name,
                reason: format!("'{v}' is not one of {}", allowed.join("|")),
            }
        }),
    }
}

impl Inputs {
    /// `fail-on-error`, defaulting to true when unset or blank.
    pub fn fail_on_error(&self) -> Result<bool> {
        match trimmed(&self.fail_on_error) {
            "" => Ok(true),
            v => parse_bool_input("fail-on-error", v),
        }
    }

    pub fn resolve(&self) -> Result<Config> {
        let fail_on_error = self.fail_on_error()?;
        let mode = parse_enum_input("mode", &self.mode)?;
        let build_shape = parse_enum_input("build-metadata", &self.build_metadata)?;
        let repo_id_scheme = parse_enum_input("repo-id-scheme", &self.repo_id_scheme)?;
        let coverage_input = required(&self.coverage_file, "coverage-file")?;
        let canyon_url = required(&self.canyon_url, "canyon-url")?;
        let instrument_cwd = required(&self.instrument_cwd, "instrument-cwd")?;

        let coverage_files = ingest::split_paths(&coverage_input);
        if coverage_files.is_empty() {
            return Err(UploadError::NoCoverageFiles);
        }

        let token = trimmed(&self.canyon_token);
        Ok(Config {
            coverage_files,
            canyon_url,
            canyon_token: (!token.is_empty()).then(|| token.to_string()),
            instrument_cwd,
            build_target: trimmed(&self.build_target).to_string(),
            scene: payload::parse_scene(trimmed(&self.scene)),
            fail_on_error,
            mode,
            build_shape,
            repo_id_scheme,
        })
    }
}
