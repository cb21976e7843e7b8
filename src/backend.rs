use crate::{
    error::{ConvertError, Result},
    state::ConversionState,
    workflow::Workflow,
};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::{Value, json};

/// One task description handed to the delegated backend.
#[derive(Debug, Clone, Serialize)]
pub struct TaskSpec {
    pub description: String,
    pub expected_output: String,
    pub context: Value,
}

/// The opaque conversion backend (an external agent/LLM system). It receives
/// the ordered task list and returns one final text result; whatever happens
/// inside is its own business.
#[async_trait]
pub trait ConversionBackend: Send + Sync {
    async fn run_tasks(&self, tasks: &[TaskSpec]) -> anyhow::Result<String>;
}

fn with_extra(shared: &Value, extras: &[(&str, Value)]) -> Value {
    let mut context = shared.clone();
    if let Some(map) = context.as_object_mut() {
        for (key, value) in extras {
            map.insert((*key).to_string(), value.clone());
        }
    }
    context
}

/// Build the four ordered conversion tasks from the current state: analyze,
/// map, connect, validate. Each carries the shared run context plus the
/// state slices that stage needs.
pub fn build_conversion_tasks(state: &ConversionState) -> Vec<TaskSpec> {
    let source_json = serde_json::to_string_pretty(&state.source).unwrap_or_default();
    let shared = json!({
        "workflow_name": state.workflow_name,
        "revision_number": state.revision_number,
        "research_findings": state.research_findings,
        "current_stage": state.stage,
    });

    vec![
        TaskSpec {
            description: format!("Analyze the Make.com workflow structure:\n{source_json}"),
            expected_output: "Detailed analysis of the Make.com workflow structure".to_string(),
            context: shared.clone(),
        },
        TaskSpec {
            description: "Map Make.com components to n8n equivalents using the analysis"
                .to_string(),
            expected_output: "Complete mapping of Make.com components to n8n".to_string(),
            context: with_extra(
                &shared,
                &[("analysis_results", state.analysis_results.clone())],
            ),
        },
        TaskSpec {
            description: "Create connection structure for n8n workflow".to_string(),
            expected_output: "Detailed n8n connection configuration".to_string(),
            context: with_extra(&shared, &[("node_mappings", json!(state.node_mappings))]),
        },
        TaskSpec {
            description: "Validate and optimize the n8n workflow structure".to_string(),
            expected_output: "Validated and optimized n8n workflow JSON".to_string(),
            context: with_extra(
                &shared,
                &[
                    ("connection_graph", state.connection_graph.clone()),
                    ("validation_errors", json!(state.validation_errors)),
                ],
            ),
        },
    ]
}

lazy_static! {
    static ref FENCED_RE: Regex = Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").unwrap();
    static ref BACKTICK_RE: Regex = Regex::new(r"`([\s\S]*?)`").unwrap();
    static ref BRACE_RE: Regex = Regex::new(r"(?s)(\{.*\})").unwrap();
}

/// Parse a backend result into a workflow document.
///
/// Tries the raw text first, then candidates delimited by a fenced code
/// block, single backticks, and the outermost brace span, in that order.
/// When no candidate parses the failure is structured, never a panic.
pub fn parse_workflow_result(raw: &str) -> Result<Workflow> {
    if let Ok(workflow) = serde_json::from_str::<Workflow>(raw.trim()) {
        return Ok(workflow);
    }
    for re in [&*FENCED_RE, &*BACKTICK_RE, &*BRACE_RE] {
        if let Some(caps) = re.captures(raw)
            && let Ok(workflow) = serde_json::from_str::<Workflow>(caps[1].trim())
        {
            return Ok(workflow);
        }
    }
    Err(ConvertError::ResultUnparseable)
}
