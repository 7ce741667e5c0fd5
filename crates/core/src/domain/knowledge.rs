use serde::{Deserialize, Serialize};

/// Static product facts used to answer product questions.
///
/// Loaded once at process start and treated as immutable thereafter, so it
/// is safe to share across sessions without synchronization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    pub pricing: Pricing,
    pub policies: Policies,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    pub basic: Plan,
    pub pro: Plan,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub price: String,
    pub videos: String,
    pub resolution: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policies {
    pub refund: String,
    pub support: String,
}
