//! Request bodies for the two upload endpoints. Everything here is a pure
//! transform of already-loaded data.

use serde_json::Value;
use tracing::warn;

use crate::env::Provenance;
use crate::model::{
    BuildMetadata, ClientPayload, CoverageMap, MapInitPayload, Scene, STRIPPED_FIELDS,
};

/// Which `build` object the map/init payload carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BuildShape {
    /// `{workflow, runId, runAttempt, ref}`
    #[default]
    Workflow,
    /// `{provider, event?, buildID, branch?}`
    Event,
}

/// Tags describing an automated CI upload.
const AUTOMATION_SCENE: [(&str, &str); 4] = [
    ("source", "automation"),
    ("type", "ci"),
    ("env", "test"),
    ("trigger", "pipeline"),
];

/// String value of `field` in the first coverage entry, if present and non-empty.
pub fn first_entry_field<'a>(coverage: &'a CoverageMap, field: &str) -> Option<&'a str> {
    coverage
        .values()
        .next()?
        .get(field)?
        .as_str()
        .filter(|s| !s.is_empty())
}

fn non_empty(value: &str) -> Option<&str> {
    Some(value).filter(|v| !v.is_empty())
}

pub fn build_metadata(
    shape: BuildShape,
    provenance: &Provenance,
    event: Option<String>,
) -> BuildMetadata {
    match shape {
        BuildShape::Workflow => BuildMetadata::Workflow {
            workflow: provenance.workflow.clone(),
            run_id: provenance.run_id.clone(),
            run_attempt: provenance.run_attempt.clone(),
            git_ref: provenance.git_ref.clone(),
        },
        BuildShape::Event => BuildMetadata::Event {
            provider: provenance.provider.clone(),
            event,
            build_id: provenance.run_id.clone(),
            branch: provenance.branch().map(str::to_string),
        },
    }
}

/// Build the map/init body. `sha`, `provider` and `repoID` prefer the first
/// coverage entry over the environment; `instrumentCwd` and `buildTarget`
/// prefer the explicit inputs over the first entry.
pub fn build_map_init_payload<'a>(
    coverage: &'a CoverageMap,
    provenance: &Provenance,
    instrument_cwd: &str,
    build_target: &str,
    build: BuildMetadata,
    diff: Option<&'a Value>,
) -> MapInitPayload<'a> {
    let embedded = |field: &'static str| first_entry_field(coverage, field);

    MapInitPayload {
        sha: embedded("sha").unwrap_or(provenance.sha.as_str()).to_string(),
        provider: embedded("provider")
            .unwrap_or(provenance.provider.as_str())
            .to_string(),
        repo_id: embedded("repoID")
            .unwrap_or(provenance.repo_id.as_str())
            .to_string(),
        instrument_cwd: non_empty(instrument_cwd)
            .or_else(|| embedded("instrumentCwd"))
            .unwrap_or_default()
            .to_string(),
        build_target: non_empty(build_target)
            .or_else(|| embedded("buildTarget"))
            .unwrap_or_default()
            .to_string(),
        build,
        coverage,
        diff,
    }
}

/// Build the client body. Object entries are copied without the structural
/// maps; anything else passes through untouched. `coverage` is not modified.
pub fn build_client_payload(coverage: &CoverageMap, scene: Scene) -> ClientPayload {
    let cleaned = coverage
        .iter()
        .map(|(file_path, entry)| {
            let entry = match entry {
                Value::Object(fields) => Value::Object(
                    fields
                        .iter()
                        .filter(|(key, _)| !STRIPPED_FIELDS.contains(&key.as_str()))
                        .map(|(key, value)| (key.clone(), value.clone()))
                        .collect(),
                ),
                other => other.clone(),
            };
            (file_path.clone(), entry)
        })
        .collect();

    ClientPayload {
        coverage: cleaned,
        scene,
    }
}

/// Caller scene, overlaid with the automation tags and then every
/// provenance field.
pub fn build_scene(user_scene: Scene, provenance: &Provenance) -> Scene {
    let mut scene = user_scene;
    for (key, value) in AUTOMATION_SCENE {
        scene.insert(key.to_string(), Value::from(value));
    }
    scene.extend(provenance.to_fields());
    scene
}

/// Decode the `scene` input. Blank input is `{}`; anything that is not a
/// JSON object logs a warning and also yields `{}`.
pub fn parse_scene(input: &str) -> Scene {
    if input.trim().is_empty() {
        return Scene::new();
    }
    match serde_json::from_str::<Value>(input) {
        Ok(Value::Object(scene)) => scene,
        Ok(other) => {
            warn!("Scene input is not a JSON object ({other}). Using empty object.");
            Scene::new()
        }
        Err(e) => {
            warn!("Failed to parse scene JSON: {e}. Using empty object.");
            Scene::new()
        }
    }
}
