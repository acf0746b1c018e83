//! `ResearchAgent` drives the control loop from `Decide` to `Done`.
//!
//! One run owns one [`AgentState`]. The model and tool registry are shared
//! and read-only, so any number of runs can execute concurrently against
//! the same agent. Cancellation is checked before each node starts.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use paperscout_core::error::RunFailed;
use paperscout_core::event::{DomainEvent, EventBus};
use paperscout_core::message::{Message, Role};
use paperscout_core::model::LanguageModel;
use paperscout_core::tool::ToolRegistry;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::collector::StreamCollector;
use crate::graph::{Limits, Node, transition};
use crate::nodes::{self, NodeContext};
use crate::state::{AgentState, ToolRun};
use crate::stream_event::AgentStreamEvent;

/// The research agent.
#[derive(Clone)]
pub struct ResearchAgent {
    model: Arc<dyn LanguageModel>,
    tools: Arc<ToolRegistry>,
    limits: Limits,
    event_bus: Arc<EventBus>,
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: String,
    /// The last message appended by any node, if any was.
    pub final_message: Option<Message>,
    /// Every appended message, in node-visit order.
    pub emitted: Vec<Message>,
    /// Nodes executed, in order (`Done` excluded).
    pub visited: Vec<Node>,
    pub state: AgentState,
}

impl ResearchAgent {
    pub fn new(model: Arc<dyn LanguageModel>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            model,
            tools,
            limits: Limits::default(),
            event_bus: Arc::new(EventBus::default()),
        }
    }

    /// Set the loop bounds.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Publish domain events on a shared bus.
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = bus;
        self
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Answer `input`, returning the final message's text.
    ///
    /// Fails with `RunFailed::NoOutput` if the run appended nothing.
    /// Dropping the returned future cancels the run.
    pub async fn run_agent(&self, input: &str) -> Result<String, RunFailed> {
        let cancel = CancellationToken::new();
        let _abandon = cancel.clone().drop_guard();
        StreamCollector::collect(self.run_stream_with_cancel(input, cancel))
            .await?
            .map(|message| message.content)
            .ok_or(RunFailed::NoOutput)
    }

    /// Run to completion.
    pub async fn run(&self, input: &str, cancel: &CancellationToken) -> Result<RunOutcome, RunFailed> {
        self.drive(input, cancel, None).await
    }

    /// Run on a background task, streaming events as nodes complete.
    ///
    /// Dropping the receiver stops the run.
    pub fn run_stream(&self, input: &str) -> mpsc::Receiver<AgentStreamEvent> {
        self.run_stream_with_cancel(input, CancellationToken::new())
    }

    /// Like [`run_stream`](Self::run_stream), stopping with
    /// `RunFailed::Cancelled` once `cancel` fires.
    pub fn run_stream_with_cancel(
        &self,
        input: &str,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<AgentStreamEvent> {
        let (tx, rx) = mpsc::channel(128);
        let agent = self.clone();
        let input = input.to_string();

        tokio::spawn(async move {
            let event = match agent.drive(&input, &cancel, Some(&tx)).await {
                Ok(outcome) => AgentStreamEvent::Done {
                    run_id: outcome.run_id,
                    nodes_visited: outcome.visited.len(),
                    feedback_requests: outcome.state.num_feedback_requests(),
                },
                Err(failure) => AgentStreamEvent::failed(failure),
            };
            let _ = tx.send(event).await;
        });

        rx
    }

    async fn drive(
        &self,
        input: &str,
        cancel: &CancellationToken,
        sink: Option<&mpsc::Sender<AgentStreamEvent>>,
    ) -> Result<RunOutcome, RunFailed> {
        let run_id = uuid::Uuid::new_v4().to_string();
        info!(run_id = %run_id, "Research run starting");
        self.event_bus.publish(DomainEvent::RunStarted {
            run_id: run_id.clone(),
            input_preview: input.chars().take(80).collect(),
            timestamp: Utc::now(),
        });

        let mut state = AgentState::new(input);
        let mut emitted = Vec::new();
        let mut visited = Vec::new();

        let result = self
            .drive_nodes(&run_id, &mut state, &mut emitted, &mut visited, cancel, sink)
            .await;

        let success = result.is_ok();
        self.event_bus.publish(DomainEvent::RunFinished {
            run_id: run_id.clone(),
            success,
            nodes_visited: visited.len(),
            feedback_requests: state.num_feedback_requests(),
            timestamp: Utc::now(),
        });

        match result {
            Ok(()) => {
                info!(
                    run_id = %run_id,
                    nodes = visited.len(),
                    feedback_requests = state.num_feedback_requests(),
                    "Research run completed"
                );
                Ok(RunOutcome {
                    run_id,
                    final_message: emitted.last().cloned(),
                    emitted,
                    visited,
                    state,
                })
            }
            Err(failure) => {
                warn!(run_id = %run_id, error = %failure, "Research run failed");
                Err(failure)
            }
        }
    }

    async fn drive_nodes(
        &self,
        run_id: &str,
        state: &mut AgentState,
        emitted: &mut Vec<Message>,
        visited: &mut Vec<Node>,
        cancel: &CancellationToken,
        sink: Option<&mpsc::Sender<AgentStreamEvent>>,
    ) -> Result<(), RunFailed> {
        let ctx = NodeContext {
            model: self.model.as_ref(),
            tools: self.tools.as_ref(),
        };
        let mut node = Node::Decide;

        while !node.is_terminal() {
            if cancel.is_cancelled() || sink.is_some_and(|tx| tx.is_closed()) {
                return Err(RunFailed::Cancelled { node: node.as_str() });
            }

            debug!(run_id, node = %node, "Node starting");
            emit(sink, AgentStreamEvent::NodeStarted { node }).await;

            let start = Instant::now();
            let update = tokio::select! {
                update = nodes::execute(node, &ctx, state) => {
                    update.map_err(|source| RunFailed::ModelUnavailable {
                        node: node.as_str(),
                        source,
                    })?
                }
                _ = abandoned(cancel, sink) => {
                    return Err(RunFailed::Cancelled { node: node.as_str() });
                }
            };
            let tool_runs = update.tool_runs.clone();
            let appended = state.apply(update)?.to_vec();
            let duration_ms = start.elapsed().as_millis() as u64;

            self.report_tool_runs(run_id, &tool_runs, &appended, sink).await;
            for message in &appended {
                emit(
                    sink,
                    AgentStreamEvent::Message {
                        node,
                        message: message.clone(),
                    },
                )
                .await;
                for call in &message.tool_calls {
                    emit(
                        sink,
                        AgentStreamEvent::ToolCall {
                            id: call.id.clone(),
                            name: call.name.clone(),
                            input: call.arguments.clone(),
                        },
                    )
                    .await;
                }
            }

            self.event_bus.publish(DomainEvent::NodeCompleted {
                run_id: run_id.to_string(),
                node: node.as_str().to_string(),
                messages_appended: appended.len(),
                duration_ms,
                timestamp: Utc::now(),
            });
            emitted.extend(appended);
            visited.push(node);

            let next = transition(node, state, &self.limits);
            if node == Node::Judge && next.is_terminal() && !state.is_good_answer() {
                warn!(
                    run_id,
                    feedback_requests = state.num_feedback_requests(),
                    "Feedback cycle limit reached, ending with best answer so far"
                );
            }
            node = next;
        }

        Ok(())
    }

    async fn report_tool_runs(
        &self,
        run_id: &str,
        runs: &[ToolRun],
        appended: &[Message],
        sink: Option<&mpsc::Sender<AgentStreamEvent>>,
    ) {
        for run in runs {
            self.event_bus.publish(DomainEvent::ToolExecuted {
                run_id: run_id.to_string(),
                tool_name: run.tool_name.clone(),
                success: run.success,
                duration_ms: run.duration_ms,
                timestamp: Utc::now(),
            });

            let output = appended
                .iter()
                .find(|m| m.role == Role::Tool && m.tool_call_id.as_deref() == Some(run.call_id.as_str()))
                .map(|m| m.content.clone())
                .unwrap_or_default();
            emit(
                sink,
                AgentStreamEvent::ToolResult {
                    id: run.call_id.clone(),
                    name: run.tool_name.clone(),
                    output,
                    success: run.success,
                },
            )
            .await;
        }
    }
}

/// Resolves once the run's caller has gone away.
async fn abandoned(cancel: &CancellationToken, sink: Option<&mpsc::Sender<AgentStreamEvent>>) {
    match sink {
        Some(tx) => tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tx.closed() => {}
        },
        None => cancel.cancelled().await,
    }
}

async fn emit(sink: Option<&mpsc::Sender<AgentStreamEvent>>, event: AgentStreamEvent) {
    if let Some(tx) = sink {
        // A dropped receiver only means nobody is watching.
        let _ = tx.send(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{EchoSearchTool, FailingTool, FnModel, ScriptedModel, registry};
    use paperscout_core::error::ProviderError;
    use paperscout_core::tool::Tool;

    fn agent(model: Arc<dyn LanguageModel>, tools: Vec<Box<dyn Tool>>) -> ResearchAgent {
        ResearchAgent::new(model, Arc::new(registry(tools)))
    }

    fn research_tools() -> Vec<Box<dyn Tool>> {
        vec![Box::new(EchoSearchTool), Box::new(FailingTool)]
    }

    const NEEDS_RESEARCH: &str = r#"{"requires_research": true}"#;
    const GOOD: &str = r#"{"is_good_answer": true}"#;
    const SEARCH: &str = "TOOL: search-papers\nARGS: {\"query\": \"transformer attention\"}";

    #[tokio::test]
    async fn trivial_question_is_answered_by_decide() {
        let model = Arc::new(ScriptedModel::new([r#"{"requires_research": false, "answer": "4"}"#]));
        let agent = agent(model.clone(), research_tools());

        let outcome = agent.run("What is 2+2?", &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome.final_message.unwrap().content, "4");
        assert_eq!(outcome.visited, vec![Node::Decide]);
        assert_eq!(outcome.state.num_feedback_requests(), 0);
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn run_agent_returns_final_text() {
        let model = Arc::new(ScriptedModel::new([r#"{"requires_research": false, "answer": "4"}"#]));
        let agent = agent(model, research_tools());
        assert_eq!(agent.run_agent("What is 2+2?").await.unwrap(), "4");
    }

    #[tokio::test]
    async fn research_run_searches_summarizes_and_is_approved() {
        let model = Arc::new(ScriptedModel::new([
            NEEDS_RESEARCH,
            "1. Search for papers on transformer attention",
            SEARCH,
            "Attention lets every token weigh every other token.",
            GOOD,
        ]));
        let agent = agent(model.clone(), research_tools());

        let outcome = agent
            .run("Summarize recent work on transformer attention", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            outcome.visited,
            vec![Node::Decide, Node::Plan, Node::Synthesize, Node::Act, Node::Synthesize, Node::Judge]
        );
        assert_eq!(
            outcome.final_message.unwrap().content,
            "Attention lets every token weigh every other token."
        );
        assert_eq!(outcome.state.num_feedback_requests(), 1);
        assert!(outcome.state.is_good_answer());

        let summary_prompt = &model.prompts()[3];
        assert!(summary_prompt.starts_with("Process and summarize the following research results:\n"));
        assert!(summary_prompt.contains("results for: transformer attention"));
    }

    #[tokio::test]
    async fn tool_results_answer_the_preceding_request() {
        let model = Arc::new(ScriptedModel::new([
            NEEDS_RESEARCH,
            "plan",
            SEARCH,
            "summary",
            GOOD,
        ]));
        let outcome = agent(model, research_tools())
            .run("q", &CancellationToken::new())
            .await
            .unwrap();

        let messages = outcome.state.messages();
        for (i, message) in messages.iter().enumerate() {
            if message.role != Role::Tool {
                continue;
            }
            let requester = messages[..i].iter().rev().find(|m| m.role != Role::Tool).unwrap();
            let id = message.tool_call_id.as_deref().unwrap();
            assert!(requester.tool_calls.iter().any(|c| c.id == id));
        }
    }

    #[tokio::test]
    async fn failing_tool_becomes_error_text_and_run_continues() {
        let model = Arc::new(ScriptedModel::new([
            NEEDS_RESEARCH,
            "plan",
            "TOOL: download-paper\nARGS: {\"url\": \"https://x/paper.pdf\"}",
            "The download failed, so no summary is available.",
            GOOD,
        ]));
        let outcome = agent(model.clone(), research_tools())
            .run("q", &CancellationToken::new())
            .await
            .unwrap();

        let tool_message = outcome
            .emitted
            .iter()
            .find(|m| m.role == Role::Tool)
            .unwrap();
        assert!(tool_message.content.starts_with("Error: "));
        assert!(tool_message.content.contains("404"));
        assert!(model.prompts()[3].contains("Error: "));
    }

    #[tokio::test]
    async fn n_feedback_cycles_give_n_plus_one_judge_visits() {
        for cycles in 0..3u32 {
            let mut script = vec![NEEDS_RESEARCH.to_string()];
            for _ in 0..cycles {
                script.extend([
                    "plan".to_string(),
                    "draft answer".to_string(),
                    r#"{"is_good_answer": false, "feedback": "add sources"}"#.to_string(),
                ]);
            }
            script.extend(["plan".to_string(), "final answer".to_string(), GOOD.to_string()]);

            let outcome = agent(Arc::new(ScriptedModel::new(script)), research_tools())
                .with_limits(Limits::unbounded())
                .run("q", &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(outcome.state.num_feedback_requests(), cycles + 1);
            assert_eq!(outcome.final_message.unwrap().content, "final answer");
            let judges = outcome.visited.iter().filter(|n| **n == Node::Judge).count();
            assert_eq!(judges as u32, cycles + 1);
        }
    }

    #[tokio::test]
    async fn feedback_cap_ends_an_endless_critic() {
        let model = Arc::new(FnModel(|prompt: &str| -> Result<String, ProviderError> {
            Ok(if prompt.contains("\"is_good_answer\"") {
                r#"{"is_good_answer": false, "feedback": "try again"}"#.to_string()
            } else if prompt.contains("\"requires_research\"") {
                NEEDS_RESEARCH.to_string()
            } else {
                "another attempt".to_string()
            })
        }));
        let outcome = agent(model, research_tools())
            .with_limits(Limits {
                max_feedback_cycles: Some(2),
            })
            .run("q", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.state.num_feedback_requests(), 3);
        assert!(!outcome.state.is_good_answer());
        assert_eq!(outcome.final_message.unwrap().content, "try again");
    }

    #[tokio::test]
    async fn model_failure_fails_the_run_with_node_name() {
        let model = Arc::new(ScriptedModel::new([NEEDS_RESEARCH]));
        let err = agent(model, research_tools())
            .run("q", &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            RunFailed::ModelUnavailable { node, source } => {
                assert_eq!(node, "plan");
                assert!(matches!(source, ProviderError::NotConfigured(_)));
            }
            other => panic!("Expected ModelUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn degenerate_run_has_no_output() {
        let model = Arc::new(ScriptedModel::new([r#"{"requires_research": false}"#]));
        let agent = agent(model, research_tools());
        assert!(matches!(agent.run_agent("hm").await, Err(RunFailed::NoOutput)));
    }

    #[tokio::test]
    async fn cancelled_before_first_node() {
        let model = Arc::new(ScriptedModel::new([GOOD]));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = agent(model.clone(), research_tools())
            .run("q", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, RunFailed::Cancelled { node: "decide" }));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn cancellation_is_checked_between_nodes() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let model = Arc::new(FnModel(move |_prompt: &str| -> Result<String, ProviderError> {
            trigger.cancel();
            Ok(NEEDS_RESEARCH.to_string())
        }));
        let err = agent(model, research_tools())
            .run("q", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, RunFailed::Cancelled { node: "plan" }));
    }

    #[tokio::test]
    async fn concurrent_runs_are_independent() {
        let model = Arc::new(FnModel(|prompt: &str| -> Result<String, ProviderError> {
            let question = prompt
                .lines()
                .find_map(|l| l.strip_prefix("human: "))
                .unwrap_or_default()
                .to_string();
            Ok(serde_json::json!({
                "requires_research": false,
                "answer": format!("answer to {question}")
            })
            .to_string())
        }));
        let agent = agent(model, research_tools());

        let questions: Vec<String> = (0..8).map(|i| format!("question {i}")).collect();
        let answers =
            futures::future::join_all(questions.iter().map(|q| agent.run_agent(q))).await;

        for (question, answer) in questions.iter().zip(answers) {
            assert_eq!(answer.unwrap(), format!("answer to {question}"));
        }
    }

    #[tokio::test]
    async fn stream_emits_node_and_tool_events() {
        let model = Arc::new(ScriptedModel::new([
            NEEDS_RESEARCH,
            "plan",
            SEARCH,
            "summary",
            GOOD,
        ]));
        let rx = agent(model, research_tools()).run_stream("q");

        let mut kinds = Vec::new();
        let last = StreamCollector::collect_with(rx, |e| kinds.push(e.event_type()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(last.content, "summary");
        assert_eq!(kinds.iter().filter(|k| **k == "node_started").count(), 6);
        assert_eq!(kinds.iter().filter(|k| **k == "tool_call").count(), 1);
        assert_eq!(kinds.iter().filter(|k| **k == "tool_result").count(), 1);
        assert_eq!(kinds.last(), Some(&"done"));
    }

    #[tokio::test]
    async fn domain_events_are_published() {
        let model = Arc::new(ScriptedModel::new([
            NEEDS_RESEARCH,
            "plan",
            SEARCH,
            "summary",
            GOOD,
        ]));
        let agent = agent(model, research_tools());
        let mut events = agent.event_bus().subscribe();

        agent.run("q", &CancellationToken::new()).await.unwrap();

        let mut tool_runs = 0;
        let mut finished = None;
        while let Ok(event) = events.try_recv() {
            match event.as_ref() {
                DomainEvent::ToolExecuted { tool_name, success, .. } => {
                    assert_eq!(tool_name, "search-papers");
                    assert!(success);
                    tool_runs += 1;
                }
                DomainEvent::RunFinished { success, feedback_requests, .. } => {
                    finished = Some((*success, *feedback_requests));
                }
                _ => {}
            }
        }
        assert_eq!(tool_runs, 1);
        assert_eq!(finished, Some((true, 1)));
    }

    /// Always wants more research and never approves, taking 20ms per call.
    struct TirelessModel {
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl LanguageModel for TirelessModel {
        fn name(&self) -> &str {
            "tireless"
        }

        async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            Ok(if prompt.contains("\"is_good_answer\"") {
                r#"{"is_good_answer": false, "feedback": "more"}"#.to_string()
            } else if prompt.contains("\"requires_research\"") {
                NEEDS_RESEARCH.to_string()
            } else {
                "attempt".to_string()
            })
        }
    }

    impl TirelessModel {
        fn calls(&self) -> usize {
            self.calls.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn abandoned_run_agent_stops_calling_the_model() {
        let model = Arc::new(TirelessModel {
            calls: Default::default(),
        });
        let agent = agent(model.clone(), research_tools()).with_limits(Limits::unbounded());

        let abandoned = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            agent.run_agent("q"),
        )
        .await;
        assert!(abandoned.is_err());

        let at_abandon = model.calls();
        assert!(at_abandon > 0);
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        assert_eq!(model.calls(), at_abandon);
    }

    #[tokio::test]
    async fn dropped_stream_stops_the_run() {
        let model = Arc::new(TirelessModel {
            calls: Default::default(),
        });
        let agent = agent(model.clone(), research_tools()).with_limits(Limits::unbounded());

        let mut events = agent.run_stream("q");
        assert!(matches!(
            events.recv().await,
            Some(AgentStreamEvent::NodeStarted { node: Node::Decide })
        ));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        drop(events);

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        let at_drop = model.calls();
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        assert_eq!(model.calls(), at_drop);
    }

    #[tokio::test]
    async fn cancellation_interrupts_a_running_node() {
        let model = Arc::new(TirelessModel {
            calls: Default::default(),
        });
        let agent = agent(model.clone(), research_tools());
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            trigger.cancel();
        });

        let err = agent.run("q", &cancel).await.unwrap_err();
        assert!(matches!(err, RunFailed::Cancelled { node: "decide" }));
        assert_eq!(model.calls(), 1);
    }
}
