use crate::{
    backend::{ConversionBackend, build_conversion_tasks, parse_workflow_result},
    error::{ConvertError, Result},
    loader,
    model::{FlowItem, MakeDocument},
    registry::NodeTypeTable,
    research::{ResearchOracle, run_research},
    resolve::resolve_node_type,
    state::{ConversionState, Stage},
    workflow::{Workflow, WorkflowNode},
};
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;
use uuid::Uuid;

/// Horizontal distance between generated nodes. Encodes ordering only, not
/// real layout semantics.
pub const NODE_SPACING_X: i64 = 200;

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(120);

type ProgressSink = Box<dyn Fn(&str) + Send + Sync>;

/// Result of one conversion run: the final state (document, logs, discovered
/// mappings) plus the error when the run failed. Nothing escapes uncaught;
/// partial progress survives a failure so a retry can benefit from it.
pub struct ConversionOutcome {
    pub state: ConversionState,
    pub error: Option<ConvertError>,
}

impl ConversionOutcome {
    fn rejected(error: ConvertError) -> Self {
        let mut state = ConversionState::new(MakeDocument::default());
        state.set_stage(Stage::Failed);
        state.log(error.to_string());
        ConversionOutcome {
            state,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn workflow(&self) -> Option<&Workflow> {
        self.state.workflow.as_ref()
    }

    pub fn into_workflow(self) -> Option<Workflow> {
        self.state.workflow
    }

    pub fn logs(&self) -> &[String] {
        &self.state.conversion_logs
    }
}

/// Converts Make.com exports into n8n workflow documents.
///
/// With no oracle and no backend this is a pure deterministic run. An oracle
/// adds a research stage whose findings feed the type resolver; a backend
/// replaces the deterministic builder with a delegated conversion.
pub struct Converter {
    table: NodeTypeTable,
    oracle: Option<Box<dyn ResearchOracle>>,
    backend: Option<Box<dyn ConversionBackend>>,
    call_timeout: Duration,
    progress: Option<ProgressSink>,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter {
    pub fn new() -> Self {
        Converter {
            table: NodeTypeTable::default(),
            oracle: None,
            backend: None,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            progress: None,
        }
    }

    pub fn with_table(mut self, table: NodeTypeTable) -> Self {
        self.table = table;
        self
    }

    pub fn with_oracle(mut self, oracle: impl ResearchOracle + 'static) -> Self {
        self.oracle = Some(Box::new(oracle));
        self
    }

    pub fn with_backend(mut self, backend: impl ConversionBackend + 'static) -> Self {
        self.backend = Some(Box::new(backend));
        self
    }

    /// Timeout applied to each research query and to the backend call.
    /// A timed-out call counts as failed, never half-applied.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Receive every logged conversion event as it happens.
    pub fn on_progress(mut self, sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(sink));
        self
    }

    fn report(&self, state: &mut ConversionState, message: &str) {
        state.log(message);
        if let Some(sink) = &self.progress {
            sink(message);
        }
    }

    /// Convert a raw JSON string.
    pub async fn convert_str(&self, json: &str) -> ConversionOutcome {
        match loader::load_make_from_str(json) {
            Ok(doc) => self.convert(doc).await,
            Err(err) => ConversionOutcome::rejected(err),
        }
    }

    /// Convert an already-parsed JSON value.
    pub async fn convert_value(&self, value: Value) -> ConversionOutcome {
        match loader::document_from_value(value) {
            Ok(doc) => self.convert(doc).await,
            Err(err) => ConversionOutcome::rejected(err),
        }
    }

    /// Convert a loaded document. This is the stage machine:
    /// init → (researching) → deterministic | delegated → completed, with
    /// any unrecoverable error absorbed into a failed outcome.
    pub async fn convert(&self, source: MakeDocument) -> ConversionOutcome {
        let mut state = ConversionState::new(source);
        let opening = format!("Starting conversion of '{}'", state.workflow_name);
        self.report(&mut state, &opening);

        if let Some(oracle) = &self.oracle {
            state.set_stage(Stage::Researching);
            self.report(&mut state, "Researching platform information");
            run_research(oracle.as_ref(), &mut state, self.call_timeout).await;
        }

        let result = match &self.backend {
            Some(backend) => {
                state.set_stage(Stage::Delegated);
                self.report(&mut state, "Delegating conversion to the configured backend");
                self.run_delegated(backend.as_ref(), &mut state).await
            }
            None => {
                state.set_stage(Stage::Deterministic);
                self.report(&mut state, "No backend configured, converting deterministically");
                build_workflow(&mut state, &self.table)
            }
        };

        match result {
            Ok(workflow) => {
                state.workflow = Some(workflow);
                state.set_stage(Stage::Completed);
                self.report(&mut state, "Conversion completed successfully");
                ConversionOutcome { state, error: None }
            }
            Err(error) => {
                state.set_stage(Stage::Failed);
                state.log(error.to_string());
                ConversionOutcome {
                    state,
                    error: Some(error),
                }
            }
        }
    }

    async fn run_delegated(
        &self,
        backend: &dyn ConversionBackend,
        state: &mut ConversionState,
    ) -> Result<Workflow> {
        let tasks = build_conversion_tasks(state);
        let raw = match timeout(self.call_timeout, backend.run_tasks(&tasks)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(err)) => return Err(ConvertError::Backend(err.to_string())),
            Err(_) => {
                return Err(ConvertError::Backend(format!(
                    "timed out after {:?}",
                    self.call_timeout
                )));
            }
        };
        parse_workflow_result(&raw)
    }
}

/// Deterministic conversion: one node per flow item, in source order.
///
/// Connections are intentionally left empty here; recreating Make.com's
/// branching semantics needs the connection-graph model the delegated
/// backend owns.
pub fn build_workflow(state: &mut ConversionState, table: &NodeTypeTable) -> Result<Workflow> {
    let mut workflow = Workflow::scaffold(&state.workflow_name);
    let items: Vec<FlowItem> = state.source.flow.clone();
    for (index, item) in items.iter().enumerate() {
        workflow.nodes.push(build_node(item, index, state, table));
    }
    state.log(format!(
        "Deterministic conversion produced {} nodes",
        workflow.nodes.len()
    ));
    Ok(workflow)
}

fn build_node(
    item: &FlowItem,
    index: usize,
    state: &mut ConversionState,
    table: &NodeTypeTable,
) -> WorkflowNode {
    let node_type = resolve_node_type(&item.module_type, state, table);
    let name = format!("{node_type} {}", index + 1);
    let node = WorkflowNode {
        id: Uuid::new_v4().to_string(),
        name,
        node_type,
        type_version: 1,
        position: [index as i64 * NODE_SPACING_X, 0],
        parameters: Value::Object(Default::default()),
        disabled: false,
    };
    let source_id = item
        .id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    state.node_mappings.insert(source_id, node.id.clone());
    node
}
