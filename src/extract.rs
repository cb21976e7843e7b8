use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

/// Namespace marker every extracted node type must carry.
pub const TARGET_NAMESPACE: &str = "n8n-nodes-";

/// One way of reading module-type to node-type associations out of free text.
pub trait MappingExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Vec<(String, String)>;
}

lazy_static! {
    static ref PROSE_RE: Regex = Regex::new(
        r#"([a-zA-Z0-9_.-]+)\s*(?:module|connector)?\s*(?:maps|corresponds|translates|converts)?\s*(?:to)?\s*['"]?(n8n-nodes-[a-zA-Z0-9.-]+)['"]?"#
    )
    .unwrap();
    static ref TABLE_RE: Regex = Regex::new(
        r#"\|\s*([a-zA-Z0-9_.-]+)\s*\|\s*(?:[a-zA-Z0-9_.\s-]+\|\s*)*(n8n-nodes-[a-zA-Z0-9.-]+)"#
    )
    .unwrap();
    static ref LIST_RE: Regex = Regex::new(
        r#"[-*•]\s+['"]?([a-zA-Z0-9_.-]+)['"]?\s*(?::|->|→|maps to|corresponds to)\s*['"]?([a-zA-Z0-9_.-]*n8n-nodes-[a-zA-Z0-9.-]+)['"]?"#
    )
    .unwrap();
}

/// Prose statements like `router module maps to 'n8n-nodes-base.switch'`.
pub struct ProseExtractor;

impl MappingExtractor for ProseExtractor {
    fn extract(&self, text: &str) -> Vec<(String, String)> {
        PROSE_RE
            .captures_iter(text)
            .map(|caps| (caps[1].to_string(), caps[2].to_string()))
            .filter(|(_, node_type)| node_type.starts_with(TARGET_NAMESPACE))
            .collect()
    }
}

/// Pipe-delimited table rows whose first cell is the module type and whose
/// last namespaced cell is the node type.
pub struct TableRowExtractor;

impl MappingExtractor for TableRowExtractor {
    fn extract(&self, text: &str) -> Vec<(String, String)> {
        TABLE_RE
            .captures_iter(text)
            .map(|caps| (caps[1].to_string(), caps[2].to_string()))
            .filter(|(_, node_type)| node_type.starts_with(TARGET_NAMESPACE))
            .collect()
    }
}

/// Bulleted lines like `- webhook -> n8n-nodes-base.webhook`; the node type
/// may carry a prefix as long as the namespace appears somewhere in it.
pub struct BulletListExtractor;

impl MappingExtractor for BulletListExtractor {
    fn extract(&self, text: &str) -> Vec<(String, String)> {
        LIST_RE
            .captures_iter(text)
            .map(|caps| (caps[1].to_string(), caps[2].to_string()))
            .filter(|(_, node_type)| node_type.contains(TARGET_NAMESPACE))
            .collect()
    }
}

/// Fixed application order; on key collision the later match wins.
pub static EXTRACTORS: [&(dyn MappingExtractor); 3] =
    [&ProseExtractor, &TableRowExtractor, &BulletListExtractor];

/// Mine a research text for module-type to node-type associations.
///
/// Pure function of its input; returns an empty overlay when nothing
/// matches. Keys are lower-cased before insertion.
pub fn extract_mappings(text: &str) -> IndexMap<String, String> {
    let mut overlay = IndexMap::new();
    for extractor in EXTRACTORS {
        for (module_type, node_type) in extractor.extract(text) {
            overlay.insert(module_type.to_lowercase(), node_type);
        }
    }
    overlay
}
