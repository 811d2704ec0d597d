//! Orchestration engine — the bounded tool-calling loop
//!
//! One `run` drives the whole session: ask the model, execute the proposed
//! calls through the step executor, fold the results back into the
//! conversation, repeat. `tool_max_steps` bounds both provider turns and
//! executed steps, and the caller always gets a [`RunResult`] back:
//! provider failures and cancellation land in `terminated_reason`, never in
//! an `Err`.
//!
//! ```text
//!                 schemas(visible surface)
//!   ┌─────────┐ ◀──────────────────────── ┌──────┬──────────┐
//!   │  model  │ ──── proposed calls ────▶ │ gate │ executor │ ──▶ records
//!   └─────────┘ ◀──── tool results ────── └──────┴──────────┘
//!        │
//!        └──── assistant.final ────▶ RunResult
//! ```
//!
//! The definitive answer comes only from the finalization tool or, when the
//! host allows it, from a turn with no tool calls at all. Plain assistant
//! commentary on a tool-calling turn is kept in the conversation but never
//! promoted to `final_text`.

use std::sync::Arc;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use toolgate_domain::{DomainGate, Message, RunResult, StepRecord, TerminationReason};

use crate::executor::StepExecutor;
use crate::ports::{ModelClient, SafetyPolicy, SchemaView, ToolRuntime, TraceEvent, TraceSink};
use crate::request::RunRequest;

const DEFAULT_SYSTEM_PROMPT: &str = "You are an assistant that works through tools. \
Tools are grouped into domains and only the active domain's tools are callable. \
Call domain.list to see the domains, domain.<name> to activate one, and \
domain.reset to deactivate. When you have the complete answer, call \
assistant.final with it in final_text.";

const NUDGE_PROMPT: &str = "Do not answer in plain text. Call assistant.final \
with your complete answer in final_text.";

/// Drives one model against one tool runtime.
///
/// Shared, read-only wiring: a single engine can serve many sessions, each
/// `run` owning its own gate and trace.
pub struct Engine<M: ModelClient> {
    model: Arc<M>,
    executor: StepExecutor,
    schema: Arc<dyn SchemaView>,
    trace_sink: Option<Arc<dyn TraceSink>>,
    cancel: Option<CancellationToken>,
}

impl<M: ModelClient> Engine<M> {
    pub fn new(
        model: Arc<M>,
        runtime: Arc<dyn ToolRuntime>,
        safety: Arc<dyn SafetyPolicy>,
        schema: Arc<dyn SchemaView>,
    ) -> Self {
        Self {
            model,
            executor: StepExecutor::new(runtime, safety),
            schema,
            trace_sink: None,
            cancel: None,
        }
    }

    /// Cancel between turns when the token fires; in-flight steps finish.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace_sink = Some(sink);
        self
    }

    /// Run one session to completion.
    pub async fn run(&self, request: RunRequest) -> RunResult {
        let mut gate = DomainGate::new();
        if let Some(domain) = request.domain_hint {
            gate.activate(domain);
            info!(domain = %domain, "domain pre-activated by host");
        }

        let budget = request.tool_max_steps;
        let mut steps: Vec<StepRecord> = Vec::new();
        let mut messages = vec![
            Message::system(
                request
                    .system_message
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            ),
            Message::user(request.prompt.clone()),
        ];

        self.emit(
            "run_started",
            json!({ "prompt": request.prompt, "budget": budget }),
        );

        for turn in 0..budget {
            if let Some(cancel) = &self.cancel
                && cancel.is_cancelled()
            {
                info!(turn, "session cancelled between turns");
                self.emit("run_cancelled", json!({ "steps": steps.len() }));
                return RunResult::new(String::new(), steps, TerminationReason::Cancelled);
            }

            let visible = gate.visible(self.executor.catalog());
            let schemas = self.schema.schemas_for(&visible);
            debug!(turn, tools = schemas.len(), active = gate.active_name(), "requesting model turn");

            let assistant = match self.model.converse(&messages, &schemas).await {
                Ok(assistant) => assistant,
                Err(err) => {
                    error!(error = %err, "provider call failed");
                    self.emit("provider_failed", json!({ "error": err.to_string() }));
                    return RunResult::provider_failed(steps, err.to_string());
                }
            };

            if !assistant.has_tool_calls() {
                if !request.require_final_tool {
                    info!(turn, "model stopped calling tools");
                    self.emit("run_finished", json!({ "reason": "model_stopped_calling_tools" }));
                    return RunResult::new(
                        assistant.text_content(),
                        steps,
                        TerminationReason::ModelStoppedCallingTools,
                    );
                }
                // Commentary stays in the history, but it is not an answer.
                // The nudge turn counts against the budget like any other.
                if let Some(text) = assistant.text.clone()
                    && !text.is_empty()
                {
                    messages.push(Message::assistant(text));
                }
                messages.push(Message::user(NUDGE_PROMPT));
                debug!(turn, "no tool calls; nudging toward the finalization tool");
                continue;
            }

            messages.push(Message::assistant_with_calls(
                assistant.text.clone(),
                assistant.tool_calls.clone(),
            ));

            let budget_left = budget - steps.len();
            let outcome = self
                .executor
                .run_turn(&mut gate, &assistant.tool_calls, budget_left)
                .await;

            for record in &outcome.records {
                self.emit("step", serde_json::to_value(record).unwrap_or_default());
            }
            // Records are a prefix of the proposals, one each, so the zip
            // pairs every record with its originating call.
            for (call, record) in assistant.tool_calls.iter().zip(outcome.records.iter()) {
                let id = call.native_id.clone().unwrap_or_else(|| call.name.clone());
                messages.push(Message::tool_result(id, record.result.clone()));
            }
            steps.extend(outcome.records);

            if let Some(text) = outcome.final_text {
                info!(steps = steps.len(), "finalization tool called");
                self.emit("run_finished", json!({ "reason": "final_tool_called" }));
                return RunResult::new(text, steps, TerminationReason::FinalToolCalled);
            }
            if outcome.dropped > 0 || steps.len() >= budget {
                info!(steps = steps.len(), "step budget exhausted");
                self.emit("run_finished", json!({ "reason": "step_limit_reached" }));
                return RunResult::new(String::new(), steps, TerminationReason::StepLimitReached);
            }
        }

        info!(steps = steps.len(), "turn budget exhausted without finalization");
        self.emit("run_finished", json!({ "reason": "step_limit_reached" }));
        RunResult::new(String::new(), steps, TerminationReason::StepLimitReached)
    }

    fn emit(&self, event_type: &'static str, payload: serde_json::Value) {
        if let Some(sink) = &self.trace_sink {
            sink.record(TraceEvent::new(event_type, payload));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{ProviderError, ToolSchema};
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use toolgate_domain::{
        AssistantTurn, Domain, StepError, ToolCall, ToolCatalog, ToolDefinition, ToolError,
        ToolOutcome, control,
    };

    struct MockModel {
        turns: Mutex<VecDeque<Result<AssistantTurn, ProviderError>>>,
        seen_tools: Mutex<Vec<Vec<String>>>,
        requests: Mutex<Vec<Vec<Message>>>,
    }

    impl MockModel {
        fn scripted(turns: Vec<Result<AssistantTurn, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                turns: Mutex::new(turns.into()),
                seen_tools: Mutex::new(Vec::new()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ModelClient for MockModel {
        async fn converse(
            &self,
            messages: &[Message],
            tools: &[ToolSchema],
        ) -> Result<AssistantTurn, ProviderError> {
            self.seen_tools
                .lock()
                .unwrap()
                .push(tools.iter().map(|t| t.name.clone()).collect());
            self.requests.lock().unwrap().push(messages.to_vec());
            self.turns
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(AssistantTurn::text("script exhausted")))
        }
    }

    struct FakeRuntime {
        catalog: ToolCatalog,
    }

    impl FakeRuntime {
        fn new() -> Self {
            let mut catalog = ToolCatalog::new();
            control::register(&mut catalog).unwrap();
            catalog
                .register(ToolDefinition::new("files.list", "List a directory", Domain::Files))
                .unwrap();
            catalog
                .register(ToolDefinition::new("files.slow", "Slow listing", Domain::Files))
                .unwrap();
            catalog
                .register(ToolDefinition::new("git.status", "Git status", Domain::Git))
                .unwrap();
            Self { catalog }
        }
    }

    #[async_trait]
    impl ToolRuntime for FakeRuntime {
        fn catalog(&self) -> &ToolCatalog {
            &self.catalog
        }

        async fn invoke(&self, call: &ToolCall) -> ToolOutcome {
            match call.name.as_str() {
                "files.list" => ToolOutcome::success("files.list", "a.txt\nb.txt"),
                "files.slow" => {
                    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
                    ToolOutcome::success("files.slow", "slow done")
                }
                "git.status" => ToolOutcome::success("git.status", "clean"),
                other => ToolOutcome::failure(other, ToolError::unknown_tool(other)),
            }
        }
    }

    struct PermitAll;

    impl SafetyPolicy for PermitAll {
        fn authorize(
            &self,
            _tool: &ToolDefinition,
            arguments: HashMap<String, serde_json::Value>,
        ) -> Result<HashMap<String, serde_json::Value>, StepError> {
            Ok(arguments)
        }
    }

    struct PlainSchemas;

    impl SchemaView for PlainSchemas {
        fn schema_for(&self, tool: &ToolDefinition) -> ToolSchema {
            ToolSchema {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: json!({ "type": "object" }),
            }
        }
    }

    struct CollectingSink {
        events: Mutex<Vec<String>>,
    }

    impl TraceSink for CollectingSink {
        fn record(&self, event: TraceEvent) {
            self.events.lock().unwrap().push(event.event_type.to_string());
        }
    }

    fn engine(model: Arc<MockModel>) -> Engine<MockModel> {
        Engine::new(
            model,
            Arc::new(FakeRuntime::new()),
            Arc::new(PermitAll),
            Arc::new(PlainSchemas),
        )
    }

    fn final_call(text: &str) -> AssistantTurn {
        AssistantTurn::new(
            None,
            vec![ToolCall::new(control::FINAL).with_arg("final_text", text)],
        )
    }

    #[tokio::test]
    async fn final_tool_ends_the_run_with_its_text() {
        let model = MockModel::scripted(vec![
            Ok(AssistantTurn::new(
                Some("let me look".to_string()),
                vec![ToolCall::from_native("call_1", "files.list", HashMap::new())],
            )),
            Ok(final_call("two files")),
        ]);
        let engine = engine(model.clone());

        let result = engine
            .run(RunRequest::new("what is in the workspace?").with_domain_hint(Domain::Files))
            .await;

        assert_eq!(result.terminated_reason, TerminationReason::FinalToolCalled);
        assert_eq!(result.final_text, "two files");
        assert_eq!(result.steps.len(), 2);
        assert!(result.steps.iter().all(|s| s.ok));

        // the tool result was fed back under its native id
        let second_request = &model.requests.lock().unwrap()[1];
        let fed_back = second_request
            .iter()
            .find(|m| m.tool_call_id.as_deref() == Some("call_1"))
            .unwrap();
        assert_eq!(fed_back.content, "a.txt\nb.txt");
    }

    #[tokio::test]
    async fn final_alias_records_the_canonical_name() {
        let model = MockModel::scripted(vec![Ok(AssistantTurn::new(
            None,
            vec![ToolCall::new("final").with_arg("final_text", "done")],
        ))]);
        let result = engine(model).run(RunRequest::new("finish")).await;

        assert_eq!(result.terminated_reason, TerminationReason::FinalToolCalled);
        assert_eq!(result.steps[0].name, control::FINAL);
    }

    #[tokio::test]
    async fn plain_text_is_the_answer_when_final_not_required() {
        let model = MockModel::scripted(vec![Ok(AssistantTurn::text("just an answer"))]);
        let result = engine(model).run(RunRequest::new("say something")).await;

        assert_eq!(
            result.terminated_reason,
            TerminationReason::ModelStoppedCallingTools
        );
        assert_eq!(result.final_text, "just an answer");
        assert!(result.steps.is_empty());
    }

    #[tokio::test]
    async fn plain_text_draws_a_nudge_when_final_required() {
        let model = MockModel::scripted(vec![
            Ok(AssistantTurn::text("thinking out loud")),
            Ok(final_call("the real answer")),
        ]);
        let engine = engine(model.clone());

        let result = engine
            .run(RunRequest::new("answer properly").require_final(true))
            .await;

        assert_eq!(result.terminated_reason, TerminationReason::FinalToolCalled);
        assert_eq!(result.final_text, "the real answer");

        // second request carries the commentary and the nudge
        let second_request = &model.requests.lock().unwrap()[1];
        let last = second_request.last().unwrap();
        assert!(last.content.contains("assistant.final"));
        assert!(second_request.iter().any(|m| m.content == "thinking out loud"));
    }

    #[tokio::test]
    async fn commentary_never_becomes_final_text_when_final_required() {
        let model = MockModel::scripted(vec![
            Ok(AssistantTurn::text("first answer attempt")),
            Ok(AssistantTurn::text("second answer attempt")),
        ]);
        let result = engine(model.clone())
            .run(
                RunRequest::new("answer properly")
                    .require_final(true)
                    .with_tool_max_steps(2),
            )
            .await;

        assert_eq!(result.terminated_reason, TerminationReason::StepLimitReached);
        assert!(result.final_text.is_empty());
        assert!(result.steps.is_empty());
        // both turns were spent on nudges
        assert_eq!(model.request_count(), 2);
    }

    #[tokio::test]
    async fn step_budget_caps_a_single_turn() {
        let model = MockModel::scripted(vec![Ok(AssistantTurn::new(
            None,
            vec![
                ToolCall::new("files.list"),
                ToolCall::new("files.list"),
                ToolCall::new("files.list"),
            ],
        ))]);
        let result = engine(model)
            .run(
                RunRequest::new("list everything")
                    .with_domain_hint(Domain::Files)
                    .with_tool_max_steps(2),
            )
            .await;

        assert_eq!(result.terminated_reason, TerminationReason::StepLimitReached);
        assert_eq!(result.steps.len(), 2);
        assert!(result.final_text.is_empty());
    }

    #[tokio::test]
    async fn step_budget_caps_the_run_across_turns() {
        let list_turn = || {
            Ok(AssistantTurn::new(
                None,
                vec![ToolCall::new("files.list")],
            ))
        };
        let model = MockModel::scripted(vec![list_turn(), list_turn(), Ok(final_call("late"))]);
        let engine = engine(model.clone());

        let result = engine
            .run(
                RunRequest::new("keep listing")
                    .with_domain_hint(Domain::Files)
                    .with_tool_max_steps(2),
            )
            .await;

        assert_eq!(result.terminated_reason, TerminationReason::StepLimitReached);
        assert_eq!(result.steps.len(), 2);
        // the third turn never went out
        assert_eq!(model.request_count(), 2);
    }

    #[tokio::test]
    async fn provider_failure_keeps_the_partial_trace() {
        let model = MockModel::scripted(vec![
            Ok(AssistantTurn::new(None, vec![ToolCall::new("files.list")])),
            Err(ProviderError::Connection("connection refused".to_string())),
        ]);
        let result = engine(model)
            .run(RunRequest::new("list then fail").with_domain_hint(Domain::Files))
            .await;

        assert_eq!(result.terminated_reason, TerminationReason::ProviderFailed);
        assert_eq!(result.steps.len(), 1);
        assert!(result.provider_error.unwrap().contains("connection refused"));
        assert!(result.final_text.is_empty());
    }

    #[tokio::test]
    async fn cancellation_before_a_turn_stops_the_run() {
        let model = MockModel::scripted(vec![Ok(final_call("never sent"))]);
        let token = CancellationToken::new();
        token.cancel();
        let engine = engine(model.clone()).with_cancellation(token);

        let result = engine.run(RunRequest::new("anything")).await;

        assert_eq!(result.terminated_reason, TerminationReason::Cancelled);
        assert!(result.steps.is_empty());
        assert_eq!(model.request_count(), 0);
    }

    #[tokio::test]
    async fn visible_surface_grows_after_a_domain_switch() {
        let model = MockModel::scripted(vec![
            Ok(AssistantTurn::new(None, vec![ToolCall::new("domain.git")])),
            Ok(final_call("switched")),
        ]);
        let engine = engine(model.clone());
        engine.run(RunRequest::new("use git")).await;

        let seen = model.seen_tools.lock().unwrap();
        assert!(!seen[0].contains(&"git.status".to_string()));
        assert!(seen[0].contains(&"domain.git".to_string()));
        assert!(seen[0].contains(&control::FINAL.to_string()));
        assert!(seen[1].contains(&"git.status".to_string()));
    }

    #[tokio::test]
    async fn gated_call_fails_but_the_session_continues() {
        let model = MockModel::scripted(vec![
            Ok(AssistantTurn::new(None, vec![ToolCall::new("git.status")])),
            Ok(final_call("recovered")),
        ]);
        let result = engine(model).run(RunRequest::new("status")).await;

        assert_eq!(result.terminated_reason, TerminationReason::FinalToolCalled);
        assert_eq!(result.final_text, "recovered");
        assert!(!result.steps[0].ok);
        assert!(result.steps[0].result.contains("TOOL_NOT_ACTIVE"));
    }

    #[tokio::test]
    async fn proposals_after_final_are_not_executed() {
        let model = MockModel::scripted(vec![Ok(AssistantTurn::new(
            None,
            vec![
                ToolCall::new(control::FINAL).with_arg("final_text", "stop here"),
                ToolCall::new("files.list"),
            ],
        ))]);
        let result = engine(model)
            .run(RunRequest::new("finish fast").with_domain_hint(Domain::Files))
            .await;

        assert_eq!(result.terminated_reason, TerminationReason::FinalToolCalled);
        assert_eq!(result.steps.len(), 1);
        assert_eq!(result.steps[0].name, control::FINAL);
    }

    #[tokio::test(start_paused = true)]
    async fn records_follow_proposal_order_not_completion_order() {
        let model = MockModel::scripted(vec![
            Ok(AssistantTurn::new(
                None,
                vec![ToolCall::new("files.slow"), ToolCall::new("files.list")],
            )),
            Ok(final_call("ordered")),
        ]);
        let result = engine(model)
            .run(RunRequest::new("race").with_domain_hint(Domain::Files))
            .await;

        assert_eq!(result.steps[0].name, "files.slow");
        assert_eq!(result.steps[0].result, "slow done");
        assert_eq!(result.steps[1].name, "files.list");
    }

    #[tokio::test]
    async fn trace_replays_against_a_fresh_gate() {
        let model = MockModel::scripted(vec![
            Ok(AssistantTurn::new(None, vec![ToolCall::new("domain.files")])),
            Ok(AssistantTurn::new(None, vec![ToolCall::new("files.list")])),
            Ok(AssistantTurn::new(None, vec![ToolCall::new("domain.git")])),
            Ok(AssistantTurn::new(None, vec![ToolCall::new("git.status")])),
            Ok(final_call("replayed")),
        ]);
        let result = engine(model)
            .run(RunRequest::new("tour the domains").with_tool_max_steps(8))
            .await;

        assert_eq!(result.terminated_reason, TerminationReason::FinalToolCalled);

        // every successful step must have been visible at its position
        let runtime = FakeRuntime::new();
        let mut replay_gate = DomainGate::new();
        for step in result.steps.iter().filter(|s| s.ok) {
            assert!(
                replay_gate.resolve(runtime.catalog(), &step.name).is_ok(),
                "step '{}' not visible on replay",
                step.name
            );
            if let Some(domain) = control::parse_selector(&step.name) {
                replay_gate.activate(domain);
            } else if step.name == control::RESET {
                replay_gate.reset();
            }
        }
    }

    #[tokio::test]
    async fn sink_sees_the_run_lifecycle() {
        let model = MockModel::scripted(vec![
            Ok(AssistantTurn::new(None, vec![ToolCall::new("files.list")])),
            Ok(final_call("logged")),
        ]);
        let sink = Arc::new(CollectingSink {
            events: Mutex::new(Vec::new()),
        });
        let engine = engine(model)
            .with_trace_sink(sink.clone());
        engine
            .run(RunRequest::new("log me").with_domain_hint(Domain::Files))
            .await;

        let events = sink.events.lock().unwrap();
        assert_eq!(events.first().map(String::as_str), Some("run_started"));
        assert!(events.iter().any(|e| e == "step"));
        assert_eq!(events.last().map(String::as_str), Some("run_finished"));
    }
}
