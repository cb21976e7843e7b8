use crate::{registry::NodeTypeTable, state::ConversionState};
use regex::Regex;

/// Resolve a module type to an n8n node type. Total; never fails.
///
/// First hit wins: research-derived overlay, then raw research text, then the
/// static table, then the fallback. Freshly learned mappings must shadow the
/// hard-coded defaults.
pub fn resolve_node_type(
    module_type: &str,
    state: &ConversionState,
    table: &NodeTypeTable,
) -> String {
    let key = module_type.to_lowercase();

    if let Some(node_type) = state.learned_mappings.get(&key) {
        tracing::info!(module_type, %node_type, "using research-derived mapping");
        return node_type.clone();
    }

    if let Some(node_type) = search_research_text(module_type, state) {
        tracing::info!(module_type, %node_type, "found mapping in raw research text");
        return node_type;
    }

    if let Some(node_type) = table.get(&key) {
        tracing::debug!(module_type, node_type, "using default mapping");
        return node_type.to_string();
    }

    tracing::debug!(module_type, fallback = %table.fallback, "no mapping, using fallback");
    table.fallback.clone()
}

/// Legacy path: scan the raw research texts, in topic insertion order, for a
/// prose statement mapping this exact module type.
fn search_research_text(module_type: &str, state: &ConversionState) -> Option<String> {
    if state.research_findings.is_empty() {
        return None;
    }
    let pattern = format!(
        r#"(?i){}\s*(?:module|connector)?\s*(?:maps|corresponds|translates|converts)?\s*(?:to)?\s*['"]?(n8n-nodes-[a-zA-Z0-9.-]+)['"]?"#,
        regex::escape(module_type)
    );
    let re = Regex::new(&pattern).ok()?;
    for text in state.research_findings.values() {
        if let Some(caps) = re.captures(text) {
            return Some(caps[1].to_string());
        }
    }
    None
}
