//! File tools: list, read, write and friends under the `files` domain
//!
//! Handlers receive vetted absolute paths from the safety boundary. The
//! exception is `files.list`/`files.search` without a directory argument,
//! which fall back to the provider's workspace root.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use async_trait::async_trait;
use glob::glob;

use toolgate_domain::{
    Domain, OutcomeMetadata, ParamType, ToolCall, ToolDefinition, ToolError, ToolOutcome,
    ToolParameter,
};

use crate::provider::ToolProvider;

pub const LIST: &str = "files.list";
pub const READ: &str = "files.read";
pub const READ_RANGE: &str = "files.read_range";
pub const WRITE: &str = "files.write";
pub const APPEND: &str = "files.append";
pub const DELETE: &str = "files.delete";
pub const MKDIR: &str = "files.mkdir";
pub const SEARCH: &str = "files.search";

/// Cap on file-read results, above the default because reads are the point.
pub const READ_RESULT_CAP: usize = 100_000;

/// Hard bound on file size for reads (10 MB).
const MAX_READ_SIZE: u64 = 10 * 1024 * 1024;

/// Default window for `files.read_range` when `end` is omitted.
const DEFAULT_RANGE_LINES: usize = 200;

/// Maximum number of search results.
const MAX_SEARCH_RESULTS: usize = 1000;

/// File tools rooted at one workspace.
pub struct FilesProvider {
    workspace: PathBuf,
}

impl FilesProvider {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl ToolProvider for FilesProvider {
    fn id(&self) -> &str {
        "files"
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        definitions()
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutcome {
        match call.name.as_str() {
            LIST => execute_list(&self.workspace, call),
            READ => execute_read(call),
            READ_RANGE => execute_read_range(call),
            WRITE => execute_write(call),
            APPEND => execute_append(call),
            DELETE => execute_delete(call),
            MKDIR => execute_mkdir(call),
            SEARCH => execute_search(&self.workspace, call),
            other => ToolOutcome::failure(other, ToolError::unknown_tool(other)),
        }
    }
}

pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(LIST, "List the entries of a directory", Domain::Files)
            .with_parameter(
                ToolParameter::new("directory", "Directory to list (default: workspace root)", false)
                    .with_type(ParamType::Path),
            )
            .with_parameter(ToolParameter::new(
                "pattern",
                "Glob filter applied to entry names (e.g. '*.rs')",
                false,
            )),
        ToolDefinition::new(READ, "Read the contents of a file", Domain::Files)
            .with_parameter(
                ToolParameter::new("path", "Path to the file to read", true)
                    .with_type(ParamType::Path),
            )
            .with_parameter(
                ToolParameter::new("offset", "Line number to start from (0-indexed)", false)
                    .with_type(ParamType::Integer),
            )
            .with_parameter(
                ToolParameter::new("limit", "Maximum number of lines to read", false)
                    .with_type(ParamType::Integer),
            )
            .with_result_cap(READ_RESULT_CAP),
        ToolDefinition::new(READ_RANGE, "Read a 1-based line range from a file", Domain::Files)
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
            .with_result_cap(READ_RESULT_CAP),
        ToolDefinition::new(
            WRITE,
            "Write content to a file, creating parent directories as needed",
            Domain::Files,
        )
        .with_parameter(
            ToolParameter::new("path", "Path to the file to write", true).with_type(ParamType::Path),
        )
        .with_parameter(ToolParameter::new("content", "Content to write", true)),
        ToolDefinition::new(APPEND, "Append content to a file", Domain::Files)
            .with_parameter(
                ToolParameter::new("path", "Path to the file to append to", true)
                    .with_type(ParamType::Path),
            )
            .with_parameter(ToolParameter::new("content", "Content to append", true)),
        ToolDefinition::new(DELETE, "Delete a file or an empty directory", Domain::Files)
            .with_parameter(
                ToolParameter::new("path", "Path to delete", true).with_type(ParamType::Path),
            ),
        ToolDefinition::new(MKDIR, "Create a directory, including parents", Domain::Files)
            .with_parameter(
                ToolParameter::new("path", "Directory to create", true).with_type(ParamType::Path),
            ),
        ToolDefinition::new(
            SEARCH,
            "Find files matching a glob pattern (e.g. '**/*.rs')",
            Domain::Files,
        )
        .with_parameter(ToolParameter::new("pattern", "Glob pattern to match", true))
        .with_parameter(
            ToolParameter::new("directory", "Directory to search from (default: workspace root)", false)
                .with_type(ParamType::Path),
        ),
    ]
}

pub fn execute_list(workspace: &Path, call: &ToolCall) -> ToolOutcome {
    let directory = call
        .get_string("directory")
        .map(PathBuf::from)
        .unwrap_or_else(|| workspace.to_path_buf());

    if !directory.exists() {
        return ToolOutcome::failure(LIST, ToolError::not_found(directory.display().to_string()));
    }
    if !directory.is_dir() {
        return ToolOutcome::failure(
            LIST,
            ToolError::invalid_argument(format!("'{}' is not a directory", directory.display())),
        );
    }

    let name_filter = match call.get_string("pattern").map(glob::Pattern::new) {
        Some(Ok(pattern)) => Some(pattern),
        Some(Err(e)) => {
            return ToolOutcome::failure(
                LIST,
                ToolError::invalid_argument(format!("Invalid glob pattern: {e}")),
            );
        }
        None => None,
    };

    let entries = match fs::read_dir(&directory) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                return ToolOutcome::failure(
                    LIST,
                    ToolError::permission_denied(directory.display().to_string()),
                );
            }
            return ToolOutcome::failure(
                LIST,
                ToolError::execution_failed(format!("Failed to read directory: {e}")),
            );
        }
    };

    let mut lines = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(filter) = &name_filter
            && !filter.matches(&name)
        {
            continue;
        }
        let metadata = entry.metadata().ok();
        let is_dir = metadata.as_ref().map(|m| m.is_dir()).unwrap_or(false);
        if is_dir {
            lines.push(format!("{name}/"));
        } else {
            let size = metadata.map(|m| m.len()).unwrap_or(0);
            lines.push(format!("{name} ({size} bytes)"));
        }
    }
    lines.sort();

    let count = lines.len();
    let output = if lines.is_empty() {
        "(empty directory)".to_string()
    } else {
        lines.join("\n")
    };

    ToolOutcome::success(LIST, output).with_metadata(OutcomeMetadata {
        path: Some(directory.display().to_string()),
        match_count: Some(count),
        ..Default::default()
    })
}

pub fn execute_read(call: &ToolCall) -> ToolOutcome {
    let start = Instant::now();
    let path_str = match call.require_string("path") {
        Ok(p) => p,
        Err(e) => return ToolOutcome::failure(READ, ToolError::invalid_argument(e)),
    };
    let path = Path::new(path_str);

    let content = match read_bounded(path, READ) {
        Ok(content) => content,
        Err(outcome) => return *outcome,
    };

    let offset = call.get_i64("offset").unwrap_or(0).max(0) as usize;
    let limit = call.get_i64("limit");

    let output = if offset > 0 || limit.is_some() {
        let lines: Vec<&str> = content.lines().collect();
        if offset >= lines.len() {
            String::new()
        } else {
            let end = match limit {
                Some(l) => (offset + l.max(0) as usize).min(lines.len()),
                None => lines.len(),
            };
            lines[offset..end].join("\n")
        }
    } else {
        content
    };

    let bytes = output.len();
    ToolOutcome::success(READ, output).with_metadata(OutcomeMetadata {
        duration_ms: Some(start.elapsed().as_millis() as u64),
        bytes: Some(bytes),
        path: Some(path_str.to_string()),
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

/// Shared by `files.read_range` and `project.read_range`.
pub(crate) fn read_lines_range(
    path: &Path,
    start_line: usize,
    end_line: usize,
    tool: &str,
) -> ToolOutcome {
    let content = match read_bounded(path, tool) {
        Ok(content) => content,
        Err(outcome) => return *outcome,
    };

    let lines: Vec<&str> = content.lines().collect();
    let total = lines.len();
    if start_line > total {
        return ToolOutcome::failure(
            tool,
            ToolError::invalid_argument(format!(
                "'start' is {start_line} but the file has {total} lines"
            )),
        );
    }
    let end_line = end_line.min(total);
    let output = lines[start_line - 1..end_line].join("\n");
    let bytes = output.len();

    ToolOutcome::success(tool, output).with_metadata(OutcomeMetadata {
        bytes: Some(bytes),
        path: Some(path.display().to_string()),
        ..Default::default()
    })
}

/// Read a file with the existence, kind and size checks every read shares.
fn read_bounded(path: &Path, tool: &str) -> Result<String, Box<ToolOutcome>> {
    if !path.exists() {
        return Err(Box::new(ToolOutcome::failure(
            tool,
            ToolError::not_found(path.display().to_string()),
        )));
    }
    if !path.is_file() {
        return Err(Box::new(ToolOutcome::failure(
            tool,
            ToolError::invalid_argument(format!("'{}' is not a file", path.display())),
        )));
    }
    match fs::metadata(path) {
        Ok(metadata) if metadata.len() > MAX_READ_SIZE => {
            return Err(Box::new(ToolOutcome::failure(
                tool,
                ToolError::invalid_argument(format!(
                    "File too large ({} bytes). Maximum size is {} bytes",
                    metadata.len(),
                    MAX_READ_SIZE
                )),
            )));
        }
        Ok(_) => {}
        Err(e) => {
            return Err(Box::new(ToolOutcome::failure(
                tool,
                ToolError::execution_failed(format!("Failed to get file metadata: {e}")),
            )));
        }
    }
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            Box::new(ToolOutcome::failure(
                tool,
                ToolError::permission_denied(path.display().to_string()),
            ))
        } else {
            Box::new(ToolOutcome::failure(
                tool,
                ToolError::execution_failed(format!("Failed to read file: {e}")),
            ))
        }
    })
}

pub fn execute_write(call: &ToolCall) -> ToolOutcome {
    let path_str = match call.require_string("path") {
        Ok(p) => p,
        Err(e) => return ToolOutcome::failure(WRITE, ToolError::invalid_argument(e)),
    };
    let content = match call.require_string("content") {
        Ok(c) => c,
        Err(e) => return ToolOutcome::failure(WRITE, ToolError::invalid_argument(e)),
    };
    let path = Path::new(path_str);

    if let Some(parent) = path.parent()
        && !parent.exists()
        && let Err(e) = fs::create_dir_all(parent)
    {
        return ToolOutcome::failure(
            WRITE,
            ToolError::execution_failed(format!("Failed to create parent directories: {e}")),
        );
    }

    let bytes = content.len();
    if let Err(e) = fs::write(path, content) {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            return ToolOutcome::failure(WRITE, ToolError::permission_denied(path_str));
        }
        return ToolOutcome::failure(
            WRITE,
            ToolError::execution_failed(format!("Failed to write file: {e}")),
        );
    }

    ToolOutcome::success(WRITE, format!("Wrote {bytes} bytes to {path_str}")).with_metadata(
        OutcomeMetadata {
            bytes: Some(bytes),
            path: Some(path_str.to_string()),
            ..Default::default()
        },
    )
}

pub fn execute_append(call: &ToolCall) -> ToolOutcome {
    let path_str = match call.require_string("path") {
        Ok(p) => p,
        Err(e) => return ToolOutcome::failure(APPEND, ToolError::invalid_argument(e)),
    };
    let content = match call.require_string("content") {
        Ok(c) => c,
        Err(e) => return ToolOutcome::failure(APPEND, ToolError::invalid_argument(e)),
    };

    let mut file = match fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path_str)
    {
        Ok(f) => f,
        Err(e) => {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                return ToolOutcome::failure(APPEND, ToolError::permission_denied(path_str));
            }
            return ToolOutcome::failure(
                APPEND,
                ToolError::execution_failed(format!("Failed to open file: {e}")),
            );
        }
    };

    let bytes = content.len();
    if let Err(e) = file.write_all(content.as_bytes()) {
        return ToolOutcome::failure(
            APPEND,
            ToolError::execution_failed(format!("Failed to append: {e}")),
        );
    }

    ToolOutcome::success(APPEND, format!("Appended {bytes} bytes to {path_str}")).with_metadata(
        OutcomeMetadata {
            bytes: Some(bytes),
            path: Some(path_str.to_string()),
            ..Default::default()
        },
    )
}

pub fn execute_delete(call: &ToolCall) -> ToolOutcome {
    let path_str = match call.require_string("path") {
        Ok(p) => p,
        Err(e) => return ToolOutcome::failure(DELETE, ToolError::invalid_argument(e)),
    };
    let path = Path::new(path_str);

    if !path.exists() {
        return ToolOutcome::failure(DELETE, ToolError::not_found(path_str));
    }

    let result = if path.is_dir() {
        // empty directories only; recursive deletion stays out of reach
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => ToolOutcome::success(DELETE, format!("Deleted {path_str}")).with_metadata(
            OutcomeMetadata {
                path: Some(path_str.to_string()),
                ..Default::default()
            },
        ),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            ToolOutcome::failure(DELETE, ToolError::permission_denied(path_str))
        }
        Err(e) => ToolOutcome::failure(
            DELETE,
            ToolError::execution_failed(format!("Failed to delete: {e}")),
        ),
    }
}

pub fn execute_mkdir(call: &ToolCall) -> ToolOutcome {
    let path_str = match call.require_string("path") {
        Ok(p) => p,
        Err(e) => return ToolOutcome::failure(MKDIR, ToolError::invalid_argument(e)),
    };

    match fs::create_dir_all(path_str) {
        Ok(()) => ToolOutcome::success(MKDIR, format!("Created directory {path_str}"))
            .with_metadata(OutcomeMetadata {
                path: Some(path_str.to_string()),
                ..Default::default()
            }),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            ToolOutcome::failure(MKDIR, ToolError::permission_denied(path_str))
        }
        Err(e) => ToolOutcome::failure(
            MKDIR,
            ToolError::execution_failed(format!("Failed to create directory: {e}")),
        ),
    }
}

pub fn execute_search(workspace: &Path, call: &ToolCall) -> ToolOutcome {
    let start = Instant::now();
    let pattern = match call.require_string("pattern") {
        Ok(p) => p,
        Err(e) => return ToolOutcome::failure(SEARCH, ToolError::invalid_argument(e)),
    };
    let base = call
        .get_string("directory")
        .map(PathBuf::from)
        .unwrap_or_else(|| workspace.to_path_buf());

    let full_pattern = format!("{}/{}", base.display(), pattern);
    let entries = match glob(&full_pattern) {
        Ok(paths) => paths,
        Err(e) => {
            return ToolOutcome::failure(
                SEARCH,
                ToolError::invalid_argument(format!("Invalid glob pattern: {e}")),
            );
        }
    };

    let mut results = Vec::new();
    for path in entries.flatten() {
        if results.len() >= MAX_SEARCH_RESULTS {
            break;
        }
        results.push(path.display().to_string());
    }

    let match_count = results.len();
    let mut output = if results.is_empty() {
        "No files found matching the pattern".to_string()
    } else {
        results.join("\n")
    };
    if match_count >= MAX_SEARCH_RESULTS {
        output.push_str(&format!("\n... (limited to {MAX_SEARCH_RESULTS} results)"));
    }

    ToolOutcome::success(SEARCH, output).with_metadata(OutcomeMetadata {
        duration_ms: Some(start.elapsed().as_millis() as u64),
        match_count: Some(match_count),
        ..Default::default()
    })
}
