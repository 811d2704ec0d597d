//! Step executor — resolves one turn's tool calls into trace records
//!
//! For each proposed call, in proposal order: resolve the name against the
//! visible surface, validate arguments, pass path arguments through the
//! safety boundary, then run the handler under its timeout and clip the
//! result to the tool's size cap. Every rejection or handler failure is
//! captured as a failed record; nothing here aborts the session.
//!
//! Control tools (`domain.*`, `assistant.final`) are executed inline
//! because they own the per-session gate; everything else is dispatched to
//! the tool runtime. Runtime invocations within one turn are independent by
//! construction and run concurrently, but records are written in proposal
//! order so traces replay deterministically.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio::time::{Duration, timeout};
use tracing::{debug, info, warn};

use toolgate_domain::tool::definition::DEFAULT_TIMEOUT_SECS;
use toolgate_domain::{
    Domain, DomainGate, StepRecord, ToolCall, ToolCatalog, ToolDefinition, ToolError, ToolOutcome,
    control, validate_call,
};

use crate::ports::{SafetyPolicy, ToolRuntime};

const TRUNCATION_MARKER: &str = "\n... (output truncated)";

/// What one turn's proposals resolved to.
pub struct TurnOutcome {
    /// Records for the executed prefix, in proposal order.
    pub records: Vec<StepRecord>,
    /// Set when the finalization tool was called; proposals after it were
    /// not executed.
    pub final_text: Option<String>,
    /// Proposals dropped because the step budget ran out mid-turn.
    pub dropped: usize,
}

/// Executes tool calls against the runtime, under the gate and the safety
/// boundary. Stateless across turns; all per-session state lives in the
/// gate and the trace owned by the engine.
pub struct StepExecutor {
    runtime: Arc<dyn ToolRuntime>,
    safety: Arc<dyn SafetyPolicy>,
}

enum Prepared {
    /// Already resolved to a record (control tools, rejections).
    Done(StepRecord),
    /// Ready for the runtime.
    Invoke {
        call: ToolCall,
        raw_arguments: HashMap<String, serde_json::Value>,
        cap: usize,
        timeout_secs: u64,
    },
}

impl StepExecutor {
    pub fn new(runtime: Arc<dyn ToolRuntime>, safety: Arc<dyn SafetyPolicy>) -> Self {
        Self { runtime, safety }
    }

    pub fn catalog(&self) -> &ToolCatalog {
        self.runtime.catalog()
    }

    /// Execute one turn's proposals, spending at most `budget_left` steps.
    ///
    /// Exactly one record is produced per consumed proposal. A finalization
    /// call stops the batch; proposals beyond the budget are dropped and
    /// reported via [`TurnOutcome::dropped`].
    pub async fn run_turn(
        &self,
        gate: &mut DomainGate,
        calls: &[ToolCall],
        budget_left: usize,
    ) -> TurnOutcome {
        let mut prepared: Vec<Prepared> = Vec::new();
        let mut final_text: Option<String> = None;
        let mut used = 0usize;

        // Sequential pass: resolution has to happen in proposal order so a
        // domain switch is visible to the calls proposed after it.
        for call in calls {
            if final_text.is_some() || used >= budget_left {
                break;
            }
            used += 1;

            let tool = match gate.resolve(self.runtime.catalog(), &call.name) {
                Ok(tool) => tool,
                Err(err) => {
                    warn!(tool = %call.name, code = err.code(), "tool call rejected");
                    let name = match &err {
                        toolgate_domain::StepError::ToolNotActive { name, .. } => name.clone(),
                        _ => call.name.clone(),
                    };
                    prepared.push(Prepared::Done(StepRecord::failure(
                        name,
                        call.arguments.clone(),
                        &err.into_tool_error(),
                    )));
                    continue;
                }
            };

            if let Err(err) = validate_call(tool, call) {
                warn!(tool = %tool.name, "invalid arguments");
                prepared.push(Prepared::Done(StepRecord::failure(
                    tool.name.clone(),
                    call.arguments.clone(),
                    &err.into_tool_error(),
                )));
                continue;
            }

            // Single safety choke point. Control tools pass through as well:
            // `domain.files` forwards a path-typed directory argument.
            let arguments = match self.safety.authorize(tool, call.arguments.clone()) {
                Ok(arguments) => arguments,
                Err(err) => {
                    warn!(tool = %tool.name, "safety boundary rejected call");
                    prepared.push(Prepared::Done(StepRecord::failure(
                        tool.name.clone(),
                        call.arguments.clone(),
                        &err.into_tool_error(),
                    )));
                    continue;
                }
            };

            if tool.name == control::FINAL {
                // validated above: final_text is a required string
                let text = call.get_string("final_text").unwrap_or_default().to_string();
                prepared.push(Prepared::Done(StepRecord::success(
                    tool.name.clone(),
                    call.arguments.clone(),
                    text.clone(),
                )));
                final_text = Some(text);
                continue;
            }

            if tool.is_control() {
                let tool = tool.clone();
                let outcome = self.execute_control(gate, &tool, call, &arguments).await;
                let mut record = record_from_outcome(&tool.name, call.arguments.clone(), outcome);
                clip_record(&mut record, tool.result_cap);
                prepared.push(Prepared::Done(record));
                continue;
            }

            prepared.push(Prepared::Invoke {
                call: ToolCall {
                    name: tool.name.clone(),
                    arguments,
                    native_id: call.native_id.clone(),
                },
                raw_arguments: call.arguments.clone(),
                cap: tool.result_cap,
                timeout_secs: tool.timeout_secs,
            });
        }

        let dropped = calls.len().saturating_sub(used);
        if dropped > 0 && final_text.is_none() {
            warn!(dropped, "step budget exhausted mid-turn; remaining proposals not executed");
        }

        // Concurrent pass for the runtime invocations; records still land
        // in proposal order.
        let invocations: Vec<_> = prepared
            .iter()
            .filter_map(|p| match p {
                Prepared::Invoke {
                    call, timeout_secs, ..
                } => Some(self.invoke_with_timeout(call.clone(), *timeout_secs)),
                Prepared::Done(_) => None,
            })
            .collect();
        let mut outcomes = join_all(invocations).await.into_iter();

        let mut records = Vec::with_capacity(prepared.len());
        for p in prepared {
            match p {
                Prepared::Done(record) => records.push(record),
                Prepared::Invoke {
                    call,
                    raw_arguments,
                    cap,
                    ..
                } => {
                    let outcome = outcomes.next().unwrap_or_else(|| {
                        ToolOutcome::failure(
                            call.name.clone(),
                            ToolError::execution_failed("tool runtime produced no outcome"),
                        )
                    });
                    let mut record = record_from_outcome(&call.name, raw_arguments, outcome);
                    clip_record(&mut record, cap);
                    records.push(record);
                }
            }
        }

        TurnOutcome {
            records,
            final_text,
            dropped,
        }
    }

    async fn invoke_with_timeout(&self, call: ToolCall, timeout_secs: u64) -> ToolOutcome {
        debug!(tool = %call.name, "invoking tool handler");
        let started = Instant::now();
        let result = timeout(
            Duration::from_secs(timeout_secs),
            self.runtime.invoke(&call),
        )
        .await;
        let elapsed = started.elapsed().as_millis() as u64;

        let mut outcome = match result {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(tool = %call.name, timeout_secs, "tool handler timed out");
                ToolOutcome::failure(call.name.clone(), ToolError::timeout(&call.name))
            }
        };
        if outcome.metadata.duration_ms.is_none() {
            outcome.metadata.duration_ms = Some(elapsed);
        }
        outcome
    }

    /// Control tools own the gate, so they run inline rather than through
    /// the runtime. The only control tool with a side effect beyond the
    /// gate is the chained action on `domain.files`.
    async fn execute_control(
        &self,
        gate: &mut DomainGate,
        tool: &ToolDefinition,
        call: &ToolCall,
        arguments: &HashMap<String, serde_json::Value>,
    ) -> ToolOutcome {
        let catalog = self.runtime.catalog();
        match tool.name.as_str() {
            control::LIST => {
                let mut lines = vec![format!("Active domain: {}", gate.active_name())];
                for domain in Domain::SELECTABLE {
                    let count = catalog.list_by_domain(domain).len();
                    let marker = if gate.active() == Some(domain) {
                        " [active]"
                    } else {
                        ""
                    };
                    lines.push(format!("- {domain}: {count} tools{marker}"));
                }
                ToolOutcome::success(&tool.name, lines.join("\n"))
            }
            control::DESCRIBE => {
                let name = call.get_string("name").unwrap_or_default();
                match name.parse::<Domain>() {
                    Ok(domain) => {
                        ToolOutcome::success(&tool.name, describe_domain(catalog, domain))
                    }
                    Err(err) => ToolOutcome::failure(&tool.name, ToolError::invalid_argument(err)),
                }
            }
            control::RESET => {
                gate.reset();
                debug!("domain gate reset");
                ToolOutcome::success(
                    &tool.name,
                    "Domain deactivated. Only control tools are visible.",
                )
            }
            name => match control::parse_selector(name) {
                Some(domain) => self.activate_domain(gate, tool, domain, arguments).await,
                // unreachable for a well-formed catalog
                None => ToolOutcome::failure(&tool.name, ToolError::unknown_tool(name)),
            },
        }
    }

    async fn activate_domain(
        &self,
        gate: &mut DomainGate,
        tool: &ToolDefinition,
        domain: Domain,
        arguments: &HashMap<String, serde_json::Value>,
    ) -> ToolOutcome {
        gate.activate(domain);
        info!(domain = %domain, "domain activated");

        let catalog = self.runtime.catalog();
        let mut text = format!(
            "Activated domain '{domain}'. Visible tools:\n{}",
            describe_domain(catalog, domain)
        );

        // `domain.files` may chain an immediate listing or search as part
        // of the same call. A failed chained action is reported in the
        // text; the activation itself has already happened.
        if domain == Domain::Files {
            let directory = arguments.get("directory").cloned();
            let pattern = arguments.get("pattern").cloned();
            if directory.is_some() || pattern.is_some() {
                let (name, mut chained) = if pattern.is_some() {
                    ("files.search", ToolCall::new("files.search"))
                } else {
                    ("files.list", ToolCall::new("files.list"))
                };
                if let Some(pattern) = pattern {
                    chained.arguments.insert("pattern".to_string(), pattern);
                }
                if let Some(directory) = directory {
                    chained.arguments.insert("directory".to_string(), directory);
                }
                let timeout_secs = catalog
                    .get(name)
                    .map(|d| d.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS);
                let outcome = self.invoke_with_timeout(chained, timeout_secs).await;
                text.push_str("\n\n");
                text.push_str(&outcome.render());
            }
        }

        ToolOutcome::success(&tool.name, text)
    }
}

fn describe_domain(catalog: &ToolCatalog, domain: Domain) -> String {
    let tools = catalog.list_by_domain(domain);
    if tools.is_empty() {
        return format!("(no tools registered for '{domain}')");
    }
    tools
        .iter()
        .map(|t| {
            let params: Vec<String> = t
                .parameters
                .iter()
                .map(|p| {
                    let optional = if p.required { "" } else { "?" };
                    format!("{}{}: {}", p.name, optional, p.param_type.as_str())
                })
                .collect();
            if params.is_empty() {
                format!("- {}: {}", t.name, t.description)
            } else {
                format!("- {} ({}): {}", t.name, params.join(", "), t.description)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn record_from_outcome(
    name: &str,
    arguments: HashMap<String, serde_json::Value>,
    outcome: ToolOutcome,
) -> StepRecord {
    if outcome.is_success() {
        StepRecord::success(name, arguments, outcome.render())
    } else {
        let error = outcome
            .error
            .unwrap_or_else(|| ToolError::execution_failed("tool failed without detail"));
        StepRecord::failure(name, arguments, &error)
    }
}

/// Clip a record's result to the tool's cap, marking it truncated. The
/// clipped payload never exceeds the cap, marker included.
fn clip_record(record: &mut StepRecord, cap: usize) {
    if record.result.len() <= cap {
        return;
    }
    let mut keep = if cap > TRUNCATION_MARKER.len() {
        cap - TRUNCATION_MARKER.len()
    } else {
        cap
    };
    while keep > 0 && !record.result.is_char_boundary(keep) {
        keep -= 1;
    }
    record.result.truncate(keep);
    if cap > TRUNCATION_MARKER.len() {
        record.result.push_str(TRUNCATION_MARKER);
    }
    record.truncated = true;
    debug!(tool = %record.name, cap, "result clipped to size cap");
}
