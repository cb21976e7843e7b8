use async_trait::async_trait;
use flowport::{
    ConvertError, Converter,
    backend::{ConversionBackend, TaskSpec},
    research::{ResearchOracle, research_conversion_overview},
    state::Stage,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

/// Oracle that only knows the mapping-table topic; everything else errors.
struct MappingsOnlyOracle;

#[async_trait]
impl ResearchOracle for MappingsOnlyOracle {
    async fn query(&self, query: &str, _model_hint: &str) -> anyhow::Result<String> {
        if query.contains("mapping table") {
            Ok("notion module maps to 'n8n-nodes-base.notion'".to_string())
        } else {
            anyhow::bail!("offline")
        }
    }
}

/// Oracle that never answers in time.
struct StalledOracle;

#[async_trait]
impl ResearchOracle for StalledOracle {
    async fn query(&self, _query: &str, _model_hint: &str) -> anyhow::Result<String> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(String::new())
    }
}

struct CannedBackend {
    response: String,
}

#[async_trait]
impl ConversionBackend for CannedBackend {
    async fn run_tasks(&self, _tasks: &[TaskSpec]) -> anyhow::Result<String> {
        Ok(self.response.clone())
    }
}

struct BrokenBackend;

#[async_trait]
impl ConversionBackend for BrokenBackend {
    async fn run_tasks(&self, _tasks: &[TaskSpec]) -> anyhow::Result<String> {
        anyhow::bail!("agent pool unavailable")
    }
}

#[tokio::test]
async fn failed_research_queries_are_skipped_not_fatal() {
    let outcome = Converter::new()
        .with_oracle(MappingsOnlyOracle)
        .convert_value(json!({
            "name": "Research run",
            "flow": [{"type": "notion", "id": "a"}]
        }))
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.state.stage, Stage::Completed);

    // Only the mapping-table query succeeded; its text was stored and mined.
    assert_eq!(outcome.state.research_findings.len(), 1);
    assert!(outcome.state.research_findings.contains_key("module_mappings"));
    assert_eq!(
        outcome
            .state
            .learned_mappings
            .get("notion")
            .map(String::as_str),
        Some("n8n-nodes-base.notion")
    );

    // The learned mapping drove the resolver.
    let workflow = outcome.workflow().unwrap();
    assert_eq!(workflow.nodes[0].node_type, "n8n-nodes-base.notion");

    let logs = outcome.logs().join("\n");
    assert!(logs.contains("research query 'make_platform' failed"));
    assert!(logs.contains("Discovered 1 module mappings from research"));
}

#[tokio::test]
async fn stalled_research_times_out_and_conversion_continues() {
    let outcome = Converter::new()
        .with_oracle(StalledOracle)
        .with_call_timeout(Duration::from_millis(50))
        .convert_value(json!({"name": "Slow", "flow": [{"type": "http", "id": "a"}]}))
        .await;

    assert!(outcome.is_success());
    assert!(outcome.state.research_findings.is_empty());
    assert!(outcome.state.learned_mappings.is_empty());
    assert_eq!(
        outcome.workflow().unwrap().nodes[0].node_type,
        "n8n-nodes-base.httpRequest"
    );
    assert!(outcome.logs().join("\n").contains("timed out"));
}

#[tokio::test]
async fn backend_result_in_fenced_block_is_accepted() {
    let response = r#"Mapped everything. Final document:
```json
{"id": "wf-9", "name": "Delegated", "active": true, "nodes": [], "connections": {}}
```"#;
    let outcome = Converter::new()
        .with_backend(CannedBackend {
            response: response.to_string(),
        })
        .convert_value(json!({"name": "Input", "flow": []}))
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.state.stage, Stage::Completed);
    assert_eq!(outcome.workflow().unwrap().name, "Delegated");
}

#[tokio::test]
async fn backend_prose_without_json_is_a_structured_failure() {
    let outcome = Converter::new()
        .with_backend(CannedBackend {
            response: "I am unable to produce a workflow today.".to_string(),
        })
        .convert_value(json!({"name": "Input", "flow": []}))
        .await;

    assert!(!outcome.is_success());
    assert!(matches!(
        &outcome.error,
        Some(ConvertError::ResultUnparseable)
    ));
    assert_eq!(outcome.state.stage, Stage::Failed);
    assert!(
        outcome
            .logs()
            .join("\n")
            .contains("no convertible workflow JSON")
    );
}

#[tokio::test]
async fn backend_error_is_reported_with_logs_retained() {
    let outcome = Converter::new()
        .with_oracle(MappingsOnlyOracle)
        .with_backend(BrokenBackend)
        .convert_value(json!({"name": "Input", "flow": [{"type": "notion", "id": "a"}]}))
        .await;

    assert!(!outcome.is_success());
    match &outcome.error {
        Some(ConvertError::Backend(message)) => {
            assert!(message.contains("agent pool unavailable"))
        }
        other => panic!("expected Backend error, got {other:?}"),
    }
    // Partial progress survives the failed run.
    assert!(outcome.state.learned_mappings.contains_key("notion"));
    assert!(!outcome.logs().is_empty());
}

#[tokio::test]
async fn progress_sink_receives_conversion_events() {
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let outcome = Converter::new()
        .on_progress(move |message| sink.lock().unwrap().push(message.to_string()))
        .convert_value(json!({"name": "Progress", "flow": []}))
        .await;

    assert!(outcome.is_success());
    let seen = seen.lock().unwrap();
    assert!(seen.iter().any(|m| m.contains("Starting conversion")));
    assert!(seen.iter().any(|m| m == "Conversion completed successfully"));
}

#[tokio::test]
async fn overview_research_passes_the_combined_query_through() {
    let text = research_conversion_overview(&MappingsOnlyOracle).await;
    // The combined query is not the mapping-table query, so this oracle fails.
    assert!(text.is_err());

    struct EchoOracle;
    #[async_trait]
    impl ResearchOracle for EchoOracle {
        async fn query(&self, query: &str, _model_hint: &str) -> anyhow::Result<String> {
            Ok(query.to_string())
        }
    }
    let echoed = research_conversion_overview(&EchoOracle).await.unwrap();
    assert!(echoed.contains("Make.com"));
    assert!(echoed.contains("n8n"));
}
