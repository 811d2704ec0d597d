//! Web tools: fetch pages as readable text and scrape them with CSS selectors

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};

use toolgate_domain::{
    Domain, OutcomeMetadata, ParamType, ToolCall, ToolDefinition, ToolError, ToolOutcome,
    ToolParameter,
};

use crate::provider::ToolProvider;

pub const FETCH: &str = "web.fetch";
pub const SCRAPE: &str = "web.scrape";

/// Maximum response body size (1 MB).
const MAX_BODY_SIZE: usize = 1024 * 1024;

const MAX_REDIRECTS: usize = 5;
const REQUEST_TIMEOUT_SECS: u64 = 20;

/// Default number of nodes returned by `web.scrape`.
const DEFAULT_MAX_NODES: usize = 20;

const USER_AGENT: &str = "Toolgate/0.4 (Agent Tool)";

/// HTTP fetching and scraping tools sharing one client.
pub struct WebProvider {
    client: Client,
}

impl WebProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for WebProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolProvider for WebProvider {
    fn id(&self) -> &str {
        "web"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                FETCH,
                "Fetch a web page and extract its readable text",
                Domain::Web,
            )
            .with_parameter(ToolParameter::new("url", "The URL to fetch", true)),
            ToolDefinition::new(
                SCRAPE,
                "Extract matching nodes from a web page using a CSS selector",
                Domain::Web,
            )
            .with_parameter(ToolParameter::new("url", "The URL to fetch", true))
            .with_parameter(ToolParameter::new(
                "selector",
                "CSS selector to match (e.g. 'article h2')",
                true,
            ))
            .with_parameter(ToolParameter::new(
                "attribute",
                "What to extract per node: 'text', 'html' or 'attr:<name>' (default: text)",
                false,
            ))
            .with_parameter(
                ToolParameter::new("max_nodes", "Maximum nodes to return (default: 20)", false)
                    .with_type(ParamType::Integer),
            ),
        ]
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutcome {
        match call.name.as_str() {
            FETCH => execute_fetch(&self.client, call).await,
            SCRAPE => execute_scrape(&self.client, call).await,
            other => ToolOutcome::failure(other, ToolError::unknown_tool(other)),
        }
    }
}

pub async fn execute_fetch(client: &Client, call: &ToolCall) -> ToolOutcome {
    let start = Instant::now();

    let url = match call.require_string("url") {
        Ok(u) => u,
        Err(e) => return ToolOutcome::failure(FETCH, ToolError::invalid_argument(e)),
    };

    let page = match fetch_page(client, url, FETCH).await {
        Ok(page) => page,
        Err(outcome) => return *outcome,
    };

    let text = if page.is_html() {
        html_to_text(&page.body)
    } else {
        // JSON, plain text and friends pass through untouched
        page.body.clone()
    };

    let header = format!(
        "Fetched: {} (status {}, {}, {} bytes)",
        url,
        page.status,
        page.content_type,
        page.body.len()
    );

    ToolOutcome::success(FETCH, format!("{header}\n\n{text}")).with_metadata(OutcomeMetadata {
        duration_ms: Some(start.elapsed().as_millis() as u64),
        bytes: Some(page.body.len()),
        ..Default::default()
    })
}

pub async fn execute_scrape(client: &Client, call: &ToolCall) -> ToolOutcome {
    let start = Instant::now();

    let url = match call.require_string("url") {
        Ok(u) => u,
        Err(e) => return ToolOutcome::failure(SCRAPE, ToolError::invalid_argument(e)),
    };
    let selector = match call.require_string("selector") {
        Ok(s) => s,
        Err(e) => return ToolOutcome::failure(SCRAPE, ToolError::invalid_argument(e)),
    };
    let attribute = call.get_string("attribute").unwrap_or("text");
    let max_nodes = call
        .get_i64("max_nodes")
        .map(|n| n.max(1) as usize)
        .unwrap_or(DEFAULT_MAX_NODES);

    let page = match fetch_page(client, url, SCRAPE).await {
        Ok(page) => page,
        Err(outcome) => return *outcome,
    };

    let nodes = match scrape_nodes(&page.body, selector, attribute, max_nodes) {
        Ok(nodes) => nodes,
        Err(e) => return ToolOutcome::failure(SCRAPE, ToolError::invalid_argument(e)),
    };

    let match_count = nodes.len();
    let output = if nodes.is_empty() {
        format!("No nodes matched selector '{selector}'")
    } else {
        nodes.join("\n")
    };

    ToolOutcome::success(SCRAPE, output).with_metadata(OutcomeMetadata {
        duration_ms: Some(start.elapsed().as_millis() as u64),
        bytes: Some(page.body.len()),
        match_count: Some(match_count),
        ..Default::default()
    })
}

struct Page {
    body: String,
    status: u16,
    content_type: String,
}

impl Page {
    fn is_html(&self) -> bool {
        self.content_type.contains("text/html") || self.content_type.contains("application/xhtml")
    }
}

async fn fetch_page(client: &Client, url: &str, tool: &str) -> Result<Page, Box<ToolOutcome>> {
    let response = client.get(url).send().await.map_err(|e| {
        Box::new(ToolOutcome::failure(
            tool,
            ToolError::execution_failed(format!("Failed to fetch URL: {e}")),
        ))
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(Box::new(ToolOutcome::failure(
            tool,
            ToolError::execution_failed(format!(
                "HTTP error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )),
        )));
    }

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let body = response.bytes().await.map_err(|e| {
        Box::new(ToolOutcome::failure(
            tool,
            ToolError::execution_failed(format!("Failed to read response body: {e}")),
        ))
    })?;
    if body.len() > MAX_BODY_SIZE {
        return Err(Box::new(ToolOutcome::failure(
            tool,
            ToolError::execution_failed(format!(
                "Response too large: {} bytes (max: {} bytes)",
                body.len(),
                MAX_BODY_SIZE
            )),
        )));
    }

    Ok(Page {
        body: String::from_utf8_lossy(&body).into_owned(),
        status: status.as_u16(),
        content_type,
    })
}

/// Extract readable text from HTML, stripping tags, scripts, and styles.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);

    // Tags whose entire subtree should be ignored
    let skip_tags = ["script", "style", "noscript", "svg"];

    let body_selector = Selector::parse("body").unwrap();
    let parts = if let Some(body) = document.select(&body_selector).next() {
        collect_element_text(body, &skip_tags)
    } else {
        collect_element_text(document.root_element(), &skip_tags)
    };

    clean_whitespace(&parts.join(" "))
}

fn collect_element_text(element: scraper::ElementRef, skip_tags: &[&str]) -> Vec<String> {
    if skip_tags.contains(&element.value().name()) {
        return Vec::new();
    }

    let mut parts = Vec::new();
    for child in element.children() {
        match child.value() {
            scraper::Node::Text(text) => {
                let t = text.trim();
                if !t.is_empty() {
                    parts.push(t.to_string());
                }
            }
            scraper::Node::Element(_) => {
                if let Some(child_el) = scraper::ElementRef::wrap(child) {
                    parts.extend(collect_element_text(child_el, skip_tags));
                }
            }
            _ => {}
        }
    }
    parts
}

/// Apply a CSS selector to an HTML document and extract one value per node.
fn scrape_nodes(
    html: &str,
    selector: &str,
    attribute: &str,
    max_nodes: usize,
) -> Result<Vec<String>, String> {
    let parsed =
        Selector::parse(selector).map_err(|e| format!("Invalid CSS selector '{selector}': {e}"))?;

    enum Extract<'a> {
        Text,
        Html,
        Attr(&'a str),
    }
    let extract = match attribute {
        "text" => Extract::Text,
        "html" => Extract::Html,
        a if a.starts_with("attr:") => Extract::Attr(&a["attr:".len()..]),
        other => {
            return Err(format!(
                "Invalid attribute '{other}' (expected 'text', 'html' or 'attr:<name>')"
            ));
        }
    };

    let document = Html::parse_document(html);
    let mut nodes = Vec::new();
    for element in document.select(&parsed) {
        if nodes.len() >= max_nodes {
            break;
        }
        match &extract {
            Extract::Text => {
                let text = element.text().collect::<Vec<_>>().join(" ");
                nodes.push(clean_whitespace(&text));
            }
            Extract::Html => nodes.push(element.html()),
            Extract::Attr(name) => {
                if let Some(value) = element.value().attr(name) {
                    nodes.push(value.to_string());
                }
            }
        }
    }
    Ok(nodes)
}

/// Clean up excessive whitespace.
fn clean_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_whitespace = false;
    let mut newline_count = 0;

    for ch in text.chars() {
        if ch == '\n' {
            newline_count += 1;
            if newline_count <= 2 {
                result.push('\n');
            }
            prev_was_whitespace = true;
        } else if ch.is_whitespace() {
            if !prev_was_whitespace {
                result.push(' ');
            }
            prev_was_whitespace = true;
            newline_count = 0;
        } else {
            result.push(ch);
            prev_was_whitespace = false;
            newline_count = 0;
        }
    }

    result.trim().to_string()
}
