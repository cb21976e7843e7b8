use crate::{model::MakeDocument, workflow::Workflow};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_WORKFLOW_NAME: &str = "Converted Workflow";
pub const DEFAULT_MAX_REVISIONS: u32 = 3;

/// Stage of a conversion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Init,
    Researching,
    Deterministic,
    Delegated,
    Completed,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Researching => "researching",
            Stage::Deterministic => "deterministic",
            Stage::Delegated => "delegated",
            Stage::Completed => "completed",
            Stage::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

/// The single mutable record threaded through one conversion run.
///
/// Created per invocation, owned exclusively by that run, and returned to the
/// caller afterwards so logs and discovered mappings survive a failure.
/// `parameter_mappings`, `connection_graph`, `routing_rules` and
/// `schema_validation` are populated only by a delegated backend; the
/// deterministic path carries them untouched.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionState {
    pub source: MakeDocument,
    pub workflow_name: String,

    pub analysis_results: Value,
    pub research_findings: IndexMap<String, String>,
    /// Module-type (lower-cased) to node-type overlay mined from research.
    pub learned_mappings: IndexMap<String, String>,

    /// Source module id to generated node id.
    pub node_mappings: IndexMap<String, String>,
    pub parameter_mappings: Value,

    pub connection_graph: Value,
    pub routing_rules: Value,

    pub schema_validation: Value,
    pub validation_errors: Vec<String>,

    pub revision_number: u32,
    pub max_revisions: u32,
    pub stage: Stage,

    pub workflow: Option<Workflow>,
    pub conversion_logs: Vec<String>,
}

impl ConversionState {
    pub fn new(source: MakeDocument) -> Self {
        let workflow_name = source
            .name
            .clone()
            .unwrap_or_else(|| DEFAULT_WORKFLOW_NAME.to_string());
        ConversionState {
            source,
            workflow_name,
            analysis_results: empty_object(),
            research_findings: IndexMap::new(),
            learned_mappings: IndexMap::new(),
            node_mappings: IndexMap::new(),
            parameter_mappings: empty_object(),
            connection_graph: empty_object(),
            routing_rules: empty_object(),
            schema_validation: empty_object(),
            validation_errors: Vec::new(),
            revision_number: 1,
            max_revisions: DEFAULT_MAX_REVISIONS,
            stage: Stage::Init,
            workflow: None,
            conversion_logs: Vec::new(),
        }
    }

    /// Append a conversion event to the run log.
    pub fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(stage = %self.stage, "{message}");
        self.conversion_logs.push(message);
    }

    pub fn set_stage(&mut self, stage: Stage) {
        tracing::debug!(from = %self.stage, to = %stage, "stage transition");
        self.stage = stage;
    }

    /// Merge a mined mapping overlay into `learned_mappings`, returning how
    /// many entries the overlay contributed.
    pub fn learn_mappings(&mut self, overlay: IndexMap<String, String>) -> usize {
        let discovered = overlay.len();
        self.learned_mappings.extend(overlay);
        discovered
    }
}
