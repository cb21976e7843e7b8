use flowport::{
    ConvertError, Converter,
    convert::{NODE_SPACING_X, build_workflow},
    loader::document_from_value,
    registry::{FALLBACK_NODE_TYPE, NodeTypeTable},
    state::{ConversionState, Stage},
};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn one_node_per_flow_item_in_source_order() {
    let doc = document_from_value(json!({
        "name": "Layout",
        "flow": [
            {"type": "webhook", "id": "a"},
            {"type": "router", "id": "b"},
            {"type": "slack", "id": "c"}
        ]
    }))
    .unwrap();

    let mut state = ConversionState::new(doc);
    let workflow = build_workflow(&mut state, &NodeTypeTable::default()).unwrap();

    assert_eq!(workflow.name, "Layout");
    assert_eq!(workflow.nodes.len(), 3);
    for (i, node) in workflow.nodes.iter().enumerate() {
        assert_eq!(node.position, [i as i64 * NODE_SPACING_X, 0]);
        assert_eq!(node.type_version, 1);
        assert!(!node.disabled);
        assert_eq!(node.name, format!("{} {}", node.node_type, i + 1));
    }

    let keys: Vec<&str> = state.node_mappings.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["a", "b", "c"]);
    for (i, node_id) in state.node_mappings.values().enumerate() {
        assert_eq!(node_id, &workflow.nodes[i].id);
    }
}

#[test]
fn missing_item_id_gets_synthesized() {
    let doc = document_from_value(json!({"flow": [{"type": "http"}]})).unwrap();
    let mut state = ConversionState::new(doc);
    build_workflow(&mut state, &NodeTypeTable::default()).unwrap();
    assert_eq!(state.node_mappings.len(), 1);
    let key = state.node_mappings.keys().next().unwrap();
    assert!(!key.is_empty());
}

#[tokio::test]
async fn empty_flow_yields_empty_workflow() {
    let outcome = Converter::new().convert_value(json!({"name": "Empty"})).await;
    assert!(outcome.is_success());
    let workflow = outcome.workflow().unwrap();
    assert!(workflow.nodes.is_empty());
    assert_eq!(workflow.connections, json!({}));
    assert!(workflow.active);
    assert_eq!(outcome.state.stage, Stage::Completed);
}

#[tokio::test]
async fn default_name_when_source_has_none() {
    let outcome = Converter::new().convert_value(json!({})).await;
    assert_eq!(outcome.workflow().unwrap().name, "Converted Workflow");
}

#[tokio::test]
async fn known_types_map_and_unknown_falls_back() {
    let outcome = Converter::new()
        .convert_value(json!({
            "name": "Test",
            "flow": [
                {"type": "http", "id": "a"},
                {"type": "webhook", "id": "b"},
                {"type": "mystery-module", "id": "c"}
            ]
        }))
        .await;

    assert!(outcome.is_success());
    let types: Vec<&str> = outcome
        .workflow()
        .unwrap()
        .nodes
        .iter()
        .map(|n| n.node_type.as_str())
        .collect();
    assert_eq!(
        types,
        vec![
            "n8n-nodes-base.httpRequest",
            "n8n-nodes-base.webhook",
            FALLBACK_NODE_TYPE,
        ]
    );
}

#[tokio::test]
async fn non_object_source_is_a_structured_failure() {
    let outcome = Converter::new().convert_value(json!([1, 2, 3])).await;
    assert!(!outcome.is_success());
    assert!(matches!(
        &outcome.error,
        Some(ConvertError::InvalidSource(_))
    ));
    assert_eq!(outcome.state.stage, Stage::Failed);
    assert!(outcome.workflow().is_none());
    assert!(!outcome.logs().is_empty());
}

#[tokio::test]
async fn workflow_serializes_in_n8n_shape() {
    let outcome = Converter::new()
        .convert_value(json!({"name": "Shape", "flow": [{"type": "http", "id": "a"}]}))
        .await;
    let value = serde_json::to_value(outcome.workflow().unwrap()).unwrap();

    for key in [
        "id",
        "name",
        "active",
        "nodes",
        "connections",
        "settings",
        "tags",
        "pinData",
        "versionId",
        "triggerCount",
        "staticData",
        "createdAt",
        "updatedAt",
    ] {
        assert!(value.get(key).is_some(), "missing workflow key {key}");
    }
    assert_eq!(value["settings"]["executionOrder"], json!("v1"));
    assert_eq!(value["settings"]["saveExecutionProgress"], json!(true));
    assert_eq!(value["settings"]["timezone"], json!("America/New_York"));
    assert_eq!(value["versionId"], json!(1));
    assert_eq!(value["staticData"], json!(null));

    let node = &value["nodes"][0];
    for key in ["id", "name", "type", "typeVersion", "position", "parameters", "disabled"] {
        assert!(node.get(key).is_some(), "missing node key {key}");
    }
    assert_eq!(node["parameters"], json!({}));
}

#[tokio::test]
async fn node_ids_are_unique_uuids() {
    let outcome = Converter::new()
        .convert_value(json!({"flow": [{"type": "http"}, {"type": "http"}]}))
        .await;
    let workflow = outcome.workflow().unwrap();
    assert_ne!(workflow.nodes[0].id, workflow.nodes[1].id);
    for node in &workflow.nodes {
        uuid::Uuid::parse_str(&node.id).unwrap();
    }
    uuid::Uuid::parse_str(&workflow.id).unwrap();
}
