use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::tool_source::{ToolCallContent, ToolSourceError, ToolSpec};
use crate::tools::Tool;

/// Tool name for web search.
pub const TOOL_SEARCH_WEB: &str = "search_web";

/// Brave Search web endpoint.
pub const BRAVE_SEARCH_URL: &str = "https://api.search.brave.com/res/v1/web/search";

/// Results requested per search.
pub const SEARCH_WEB_COUNT: usize = 5;

/// Tool for searching the web through the Brave Search API.
///
/// Wraps reqwest::Client. Without an API key the tool still registers and answers every
/// call with a "not configured" text so the model can tell the user.
///
/// # Interaction
///
/// - **reqwest::Client**: Performs the HTTP GET against the search endpoint
/// - **ToolRegistry**: Registers this tool by name "search_web"
/// - **ToolSourceError**: HTTP failures map to `Transport`
pub struct SearchWebTool {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
}

impl SearchWebTool {
    /// Creates the tool; `api_key` of `None` or empty disables searching.
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_key)
    }

    /// Creates the tool with a custom HTTP client (timeouts, proxies).
    pub fn with_client(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            endpoint: BRAVE_SEARCH_URL.to_string(),
        }
    }

    /// Points the tool at another endpoint with the same response shape.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

fn format_results(query: &str, response: BraveResponse) -> String {
    let results = response.web.map(|w| w.results).unwrap_or_default();
    if results.is_empty() {
        return format!("No web results found for: {}", query);
    }
    let mut out = format!("Web search results for '{}':\n", query);
    for (i, r) in results.iter().take(SEARCH_WEB_COUNT).enumerate() {
        out.push_str(&format!("\n{}. {}\n   {}\n", i + 1, r.title, r.url));
        if !r.description.is_empty() {
            out.push_str(&format!("   {}\n", r.description));
        }
    }
    out
}

#[async_trait]
impl Tool for SearchWebTool {
    fn name(&self) -> &str {
        TOOL_SEARCH_WEB
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_SEARCH_WEB.to_string(),
            description: Some(
                "Search the web for current information: troubleshooting tips, recalls and \
                 known issues, owner experiences, and specifications not found in the manual."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query."
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: Value) -> Result<ToolCallContent, ToolSourceError> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| ToolSourceError::InvalidInput("missing query".to_string()))?;

        let Some(api_key) = &self.api_key else {
            return Ok(ToolCallContent {
                text: "Web search not configured: BRAVE_API_KEY is not set. Please add \
                       BRAVE_API_KEY to your .env file."
                    .to_string(),
            });
        };

        debug!(query, "web search");
        let count = SEARCH_WEB_COUNT.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("count", count.as_str())])
            .header("Accept", "application/json")
            .header("X-Subscription-Token", api_key)
            .send()
            .await
            .map_err(|e| ToolSourceError::Transport(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ToolSourceError::Transport(format!(
                "request failed with status: {}",
                response.status()
            )));
        }

        let body: BraveResponse = response
            .json()
            .await
            .map_err(|e| ToolSourceError::Transport(format!("failed to read response: {}", e)))?;

        Ok(ToolCallContent {
            text: format_results(query, body),
        })
    }
}
