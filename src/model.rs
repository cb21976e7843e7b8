use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

fn default_module_type() -> String {
    "unknown".to_string()
}

/// A Make.com scenario export as loaded from disk or pasted JSON.
///
/// Only `name` and `flow` carry meaning for the conversion; everything else
/// the export contains is kept opaquely in `extra` and is not required to
/// survive into the output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MakeDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub flow: Vec<FlowItem>,
    #[serde(flatten, default)]
    pub extra: BTreeMap<String, Value>,
}

/// One module in the scenario's execution sequence. Order is significant and
/// drives the positional layout of the generated nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowItem {
    #[serde(rename = "type", default = "default_module_type")]
    pub module_type: String,
    /// Make exports use numeric module ids; accept both forms.
    #[serde(default, deserialize_with = "id_as_string")]
    pub id: Option<String>,
    #[serde(flatten, default)]
    pub raw: BTreeMap<String, Value>,
}

fn id_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => Some(other.to_string()),
    })
}
