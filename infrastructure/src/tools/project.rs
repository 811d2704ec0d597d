//! Project tools: text search across the workspace plus ranged reads

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use glob::glob;
use regex::Regex;

use toolgate_domain::{
    Domain, OutcomeMetadata, ParamType, ToolCall, ToolDefinition, ToolError, ToolOutcome,
    ToolParameter,
};

use crate::provider::ToolProvider;
use crate::tools::files::read_lines_range;

pub const SEARCH_TEXT: &str = "project.search_text";
pub const READ_RANGE: &str = "project.read_range";

/// Default and hard cap on matches returned per search.
const DEFAULT_MAX_RESULTS: usize = 50;
const MAX_RESULTS: usize = 1000;

/// Files above this size are skipped during text search (1 MB).
const MAX_SEARCH_FILE_SIZE: u64 = 1024 * 1024;

const DEFAULT_RANGE_LINES: usize = 200;

/// Workspace-wide code search tools.
pub struct ProjectProvider {
    workspace: PathBuf,
}

impl ProjectProvider {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl ToolProvider for ProjectProvider {
    fn id(&self) -> &str {
        "project"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                SEARCH_TEXT,
                "Search file contents across the workspace using a regex",
                Domain::Project,
            )
            .with_parameter(ToolParameter::new("pattern", "Regex pattern to search for", true))
            .with_parameter(
                ToolParameter::new(
                    "directory",
                    "Directory to search in (default: workspace root)",
                    false,
                )
                .with_type(ParamType::Path),
            )
            .with_parameter(
                ToolParameter::new(
                    "max_results",
                    "Maximum number of matches to return (default: 50)",
                    false,
                )
                .with_type(ParamType::Integer),
            ),
            ToolDefinition::new(READ_RANGE, "Read a 1-based line range from a file", Domain::Project)
                .with_parameter(
                    ToolParameter::new("path", "Path to the file to read", true)
                        .with_type(ParamType::Path),
                )
                .with_parameter(
                    ToolParameter::new("start", "First line to read (1-based)", true)
                        .with_type(ParamType::Integer),
                )
                .with_parameter(
                    ToolParameter::new("end", "Last line to read (default: start + 200)", false)
                        .with_type(ParamType::Integer),
                )
                .with_result_cap(crate::tools::files::READ_RESULT_CAP),
        ]
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutcome {
        match call.name.as_str() {
            SEARCH_TEXT => execute_search_text(&self.workspace, call),
            READ_RANGE => execute_read_range(call),
            other => ToolOutcome::failure(other, ToolError::unknown_tool(other)),
        }
    }
}

pub fn execute_search_text(workspace: &Path, call: &ToolCall) -> ToolOutcome {
    let start = Instant::now();

    let pattern_str = match call.require_string("pattern") {
        Ok(p) => p,
        Err(e) => return ToolOutcome::failure(SEARCH_TEXT, ToolError::invalid_argument(e)),
    };
    let regex = match Regex::new(pattern_str) {
        Ok(r) => r,
        Err(e) => {
            return ToolOutcome::failure(
                SEARCH_TEXT,
                ToolError::invalid_argument(format!("Invalid regex pattern: {e}")),
            );
        }
    };

    let base = call
        .get_string("directory")
        .map(PathBuf::from)
        .unwrap_or_else(|| workspace.to_path_buf());
    if !base.exists() {
        return ToolOutcome::failure(SEARCH_TEXT, ToolError::not_found(base.display().to_string()));
    }

    let max_results = call
        .get_i64("max_results")
        .map(|n| n.max(1) as usize)
        .unwrap_or(DEFAULT_MAX_RESULTS)
        .min(MAX_RESULTS);

    let mut results = Vec::new();
    'files: for file_path in collect_files(&base) {
        // Oversized and binary files are skipped, not errors
        if let Ok(metadata) = fs::metadata(&file_path)
            && metadata.len() > MAX_SEARCH_FILE_SIZE
        {
            continue;
        }
        let Ok(bytes) = fs::read(&file_path) else {
            continue;
        };
        if bytes.contains(&0) {
            continue;
        }
        let content = String::from_utf8_lossy(&bytes);
        let file_display = file_path.display().to_string();

        for (line_num, line) in content.lines().enumerate() {
            if regex.is_match(line) {
                results.push(format!("{}:{}: {}", file_display, line_num + 1, line));
                if results.len() >= max_results {
                    break 'files;
                }
            }
        }
    }

    let duration_ms = start.elapsed().as_millis() as u64;
    let match_count = results.len();

    let mut output = if results.is_empty() {
        "No matches found".to_string()
    } else {
        results.join("\n")
    };
    if match_count >= max_results {
        output.push_str(&format!("\n... (limited to {max_results} matches)"));
    }

    ToolOutcome::success(SEARCH_TEXT, output).with_metadata(OutcomeMetadata {
        duration_ms: Some(duration_ms),
        match_count: Some(match_count),
        path: Some(base.display().to_string()),
        ..Default::default()
    })
}

pub fn execute_read_range(call: &ToolCall) -> ToolOutcome {
    let path_str = match call.require_string("path") {
        Ok(p) => p,
        Err(e) => return ToolOutcome::failure(READ_RANGE, ToolError::invalid_argument(e)),
    };
    let Some(start_line) = call.get_i64("start") else {
        return ToolOutcome::failure(
            READ_RANGE,
            ToolError::invalid_argument("missing required parameter 'start'"),
        );
    };
    if start_line < 1 {
        return ToolOutcome::failure(
            READ_RANGE,
            ToolError::invalid_argument("'start' must be 1 or greater"),
        );
    }
    let start_line = start_line as usize;
    let end_line = match call.get_i64("end") {
        Some(end) if end < start_line as i64 => {
            return ToolOutcome::failure(
                READ_RANGE,
                ToolError::invalid_argument("'end' must not be smaller than 'start'"),
            );
        }
        Some(end) => end as usize,
        None => start_line + DEFAULT_RANGE_LINES,
    };

    read_lines_range(Path::new(path_str), start_line, end_line, READ_RANGE)
}

fn collect_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if dir.is_file() {
        files.push(dir.to_path_buf());
        return files;
    }

    let full_pattern = format!("{}/**/*", dir.display());
    if let Ok(paths) = glob(&full_pattern) {
        for entry in paths.flatten() {
            if entry.is_file() {
                files.push(entry);
            }
        }
    }
    files
}
