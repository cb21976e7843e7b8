use crate::{
    error::ConvertError,
    extract::extract_mappings,
    state::ConversionState,
};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::time::Duration;
use tokio::time::timeout;

/// Model hint passed to the oracle when the caller has no preference.
pub const DEFAULT_RESEARCH_MODEL: &str = "pplx-70b-online";

/// External question-answering service supplying free-text platform
/// information. Implementations may call out over the network; failures are
/// per-query and never abort a conversion.
#[async_trait]
pub trait ResearchOracle: Send + Sync {
    async fn query(&self, query: &str, model_hint: &str) -> anyhow::Result<String>;
}

pub struct ResearchTopic {
    pub name: &'static str,
    pub query: &'static str,
}

/// The four independent research topics issued per conversion. Results are
/// merged by topic name in this order, never by completion order.
pub const RESEARCH_TOPICS: [ResearchTopic; 4] = [
    ResearchTopic {
        name: "make_platform",
        query: "Latest Make.com (formerly Integromat) workflow structure, node types, and connection patterns",
    },
    ResearchTopic {
        name: "n8n_platform",
        query: "Latest n8n workflow JSON structure, node types, and connection patterns",
    },
    ResearchTopic {
        name: "module_mappings",
        query: "Provide a comprehensive list of Make.com modules and their equivalent n8n nodes, formatted as a mapping table",
    },
    ResearchTopic {
        name: "conversion_patterns",
        query: "Common patterns for converting between Make.com and n8n workflows",
    },
];

const OVERVIEW_QUERY: &str = "\
I need detailed information about converting workflows from Make.com (formerly Integromat) to n8n:

1. What are the latest formats and structures of Make.com JSON export files?
2. What are the current node types and structures in n8n workflows?
3. What is the mapping between Make.com modules and n8n nodes?
4. Are there any official tools or guides for converting between these platforms?
5. What are the key differences in how data is processed between Make.com and n8n?
6. Are there any limitations or edge cases to be aware of when converting?

Please provide detailed technical information with examples where possible.";

/// One combined question covering the whole conversion topic, for callers
/// that want a single research pass outside a conversion run.
pub async fn research_conversion_overview(oracle: &dyn ResearchOracle) -> anyhow::Result<String> {
    oracle.query(OVERVIEW_QUERY, DEFAULT_RESEARCH_MODEL).await
}

/// Run the four research queries concurrently and fold the results into the
/// state. Each query is individually tolerant of failure or timeout; whatever
/// succeeded is stored under its topic name and mined for mappings.
pub async fn run_research(
    oracle: &dyn ResearchOracle,
    state: &mut ConversionState,
    per_query_timeout: Duration,
) {
    let (make, n8n, mappings, patterns) = tokio::join!(
        query_one(oracle, &RESEARCH_TOPICS[0], per_query_timeout),
        query_one(oracle, &RESEARCH_TOPICS[1], per_query_timeout),
        query_one(oracle, &RESEARCH_TOPICS[2], per_query_timeout),
        query_one(oracle, &RESEARCH_TOPICS[3], per_query_timeout),
    );

    let outcomes = [make, n8n, mappings, patterns];
    for (topic, outcome) in RESEARCH_TOPICS.iter().zip(outcomes) {
        match outcome {
            Ok(text) => {
                state.research_findings.insert(topic.name.to_string(), text);
            }
            Err(message) => {
                let err = ConvertError::ResearchQuery {
                    query: topic.name.to_string(),
                    message,
                };
                tracing::warn!(topic = topic.name, "research query skipped");
                state.log(err.to_string());
            }
        }
    }

    if !state.research_findings.is_empty() {
        mine_research(state);
    }
}

async fn query_one(
    oracle: &dyn ResearchOracle,
    topic: &ResearchTopic,
    limit: Duration,
) -> Result<String, String> {
    match timeout(limit, oracle.query(topic.query, DEFAULT_RESEARCH_MODEL)).await {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(err)) => Err(err.to_string()),
        Err(_) => Err(format!("timed out after {:?}", limit)),
    }
}

/// Mine every stored research text, in topic insertion order, and merge the
/// discovered mappings into the learned overlay.
pub fn mine_research(state: &mut ConversionState) {
    let mut discovered: IndexMap<String, String> = IndexMap::new();
    for text in state.research_findings.values() {
        discovered.extend(extract_mappings(text));
    }
    let count = state.learn_mappings(discovered);
    state.log(format!("Discovered {count} module mappings from research"));
}
