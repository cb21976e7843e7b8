use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

fn empty_object() -> Value {
    Value::Object(Default::default())
}

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    1
}

/// An n8n workflow document in import-ready shape.
///
/// Field names follow n8n's JSON exactly; everything beyond `nodes` and
/// `connections` is bookkeeping n8n expects on import. Deserialization is
/// deliberately lenient so documents produced by a delegated backend parse
/// even when optional bookkeeping is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default = "empty_object")]
    pub connections: Value,
    #[serde(default)]
    pub settings: WorkflowSettings,
    #[serde(default)]
    pub tags: Vec<Value>,
    #[serde(default = "empty_object")]
    pub pin_data: Value,
    #[serde(default = "default_version")]
    pub version_id: u32,
    #[serde(default)]
    pub trigger_count: u32,
    #[serde(default)]
    pub static_data: Value,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Workflow {
    /// Empty workflow scaffold with fixed settings, a fresh id and current
    /// timestamps. Nodes and connections are filled in by the converter.
    pub fn scaffold(name: &str) -> Self {
        let now = Utc::now().to_rfc3339();
        Workflow {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            active: true,
            nodes: Vec::new(),
            connections: empty_object(),
            settings: WorkflowSettings::default(),
            tags: Vec::new(),
            pin_data: empty_object(),
            version_id: 1,
            trigger_count: 1,
            static_data: Value::Null,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSettings {
    #[serde(default)]
    pub execution_order: String,
    #[serde(default)]
    pub save_execution_progress: bool,
    #[serde(default)]
    pub save_manual_executions: bool,
    #[serde(default)]
    pub timezone: String,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        WorkflowSettings {
            execution_order: "v1".to_string(),
            save_execution_progress: true,
            save_manual_executions: true,
            timezone: "America/New_York".to_string(),
        }
    }
}

/// One step in the generated workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowNode {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default = "default_version")]
    pub type_version: u32,
    #[serde(default)]
    pub position: [i64; 2],
    #[serde(default = "empty_object")]
    pub parameters: Value,
    #[serde(default)]
    pub disabled: bool,
}
