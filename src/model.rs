//! Data shapes shared by the loader, payload builder and upload client.
//! Coverage entries stay as opaque JSON values; only the handful of fields
//! the service contract names are given Rust types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Merged coverage keyed by source file path. Insertion order is preserved,
/// so the first key of the first file is the "first entry".
pub type CoverageMap = Map<String, Value>;

/// Free-form scene tags attached to the client upload.
pub type Scene = Map<String, Value>;

/// Structural fields dropped from every entry of the client payload.
pub const STRIPPED_FIELDS: [&str; 4] = ["statementMap", "fnMap", "branchMap", "inputSourceMap"];

/// Build metadata nested under `build` in the map/init payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BuildMetadata {
    Workflow {
        workflow: String,
        #[serde(rename = "runId")]
        run_id: String,
        #[serde(rename = "runAttempt")]
        run_attempt: String,
        #[serde(rename = "ref")]
        git_ref: String,
    },
    Event {
        provider: String,
        /// Raw CI event payload, as read from disk.
        #[serde(skip_serializing_if = "Option::is_none")]
        event: Option<String>,
        #[serde(rename = "buildID")]
        build_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        branch: Option<String>,
    },
}

/// Body of `POST /api/coverage/map/init`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapInitPayload<'a> {
    pub sha: String,
    pub provider: String,
    #[serde(rename = "repoID")]
    pub repo_id: String,
    pub instrument_cwd: String,
    pub build_target: String,
    pub build: BuildMetadata,
    pub coverage: &'a CoverageMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<&'a Value>,
}

/// Body of `POST /api/coverage/client`.
#[derive(Debug, Clone, Serialize)]
pub struct ClientPayload {
    pub coverage: CoverageMap,
    pub scene: Scene,
}

/// Response envelope shared by both endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub build_hash: Option<String>,
    #[serde(default)]
    pub scene_key: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
