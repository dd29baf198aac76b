use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// Static menu file (JSON array of dish records)
    pub menu_path: PathBuf,
    /// If set, every retrieval result is written here as pretty JSON
    pub snapshot_path: Option<PathBuf>,
    /// Return the unranked retrieval set when the ranking reply is unusable
    pub rerank_fallback: bool,
    /// Vector index configuration
    pub index: IndexConfig,
    /// LLM provider configuration
    pub llm: LlmConfig,
}

/// How the index is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Pure semantic nearest-neighbour search
    NearText,
    /// Keyword + vector search blended by `alpha`
    Hybrid,
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "near_text" | "neartext" | "semantic" => Ok(Self::NearText),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(format!("unknown search mode: {other}")),
        }
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NearText => f.write_str("near_text"),
            Self::Hybrid => f.write_str("hybrid"),
        }
    }
}

/// Configuration for the Weaviate-compatible dish index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Cluster endpoint, e.g. "https://my-cluster.weaviate.network"
    pub base_url: String,
    /// Index API key
    pub api_key: Option<String>,
    /// Key forwarded to the index's embedding provider
    pub embedding_api_key: Option<String>,
    /// Collection holding dish records
    pub collection: String,
    pub search_mode: SearchMode,
    /// Maximum dishes retrieved per query
    pub limit: usize,
    /// Hybrid weighting: 0 = pure keyword, 1 = pure vector
    pub alpha: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_key: None,
            embedding_api_key: None,
            collection: "FoodRecommend".to_string(),
            search_mode: SearchMode::Hybrid,
            limit: 4,
            alpha: 0.5,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "gemini", "openai" or "ollama"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name used for re-ranking
    pub chat_model: String,
    /// API key (not needed for Ollama)
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            chat_model: "gemini-1.5-flash".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            menu_path: PathBuf::from("./data.json"),
            snapshot_path: None,
            rerank_fallback: false,
            index: IndexConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build a config from defaults overridden by whatever `var` returns.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = var("MENU_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(path) = var("MENU_DATA_PATH") {
            config.menu_path = PathBuf::from(path);
        }
        if let Some(path) = var("MENU_SNAPSHOT_PATH") {
            if !path.is_empty() {
                config.snapshot_path = Some(PathBuf::from(path));
            }
        }
        if let Some(val) = var("MENU_RERANK_FALLBACK") {
            config.rerank_fallback = parse_flag(&val);
        }

        // Index config (names match the deployed Streamlit secrets)
        if let Some(url) = var("CLUSTER_URL") {
            config.index.base_url = url;
        }
        if let Some(key) = var("Weav_API_KEY") {
            config.index.api_key = Some(key);
        }
        if let Some(key) = var("hf_key") {
            config.index.embedding_api_key = Some(key);
        }
        if let Some(name) = var("INDEX_COLLECTION") {
            if is_graphql_name(&name) {
                config.index.collection = name;
            } else {
                tracing::warn!("Ignoring INDEX_COLLECTION: '{name}' is not a valid class name");
            }
        }
        if let Some(mode) = var("INDEX_SEARCH_MODE") {
            match mode.parse() {
                Ok(m) => config.index.search_mode = m,
                Err(e) => tracing::warn!("Ignoring INDEX_SEARCH_MODE: {e}"),
            }
        }
        if let Some(val) = var("INDEX_LIMIT") {
            if let Ok(v) = val.parse::<usize>() {
                config.index.limit = v.max(1);
            }
        }
        if let Some(val) = var("INDEX_ALPHA") {
            match val.parse::<f32>() {
                Ok(v) if v.is_finite() => config.index.alpha = v.clamp(0.0, 1.0),
                _ => tracing::warn!("Ignoring INDEX_ALPHA: '{val}' is not a finite number"),
            }
        }
        if let Some(val) = var("INDEX_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.index.timeout_secs = v;
            }
        }

        // LLM config
        if let Some(provider) = var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Some(url) = var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Some(model) = var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Some(key) = var("LLM_API_KEY").or_else(|| var("API_KEY")) {
            config.llm.api_key = Some(key);
        }
        if let Some(val) = var("LLM_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.llm.timeout_secs = v;
            }
        }

        config
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`; the collection is spliced into GraphQL text.
fn is_graphql_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_flag(val: &str) -> bool {
    matches!(
        val.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
