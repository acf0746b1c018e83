//! `paperscout ask` — Answer a question with the research agent.

use std::sync::Arc;
use std::time::Duration;

use paperscout_agent::{AgentStreamEvent, Limits, ResearchAgent, StreamCollector};
use paperscout_config::AppConfig;
use paperscout_core::error::RunFailed;
use paperscout_tools::PendingQuestion;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::credential_help;

pub async fn run(question: String, stream: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let router = paperscout_providers::build_from_config(&config)?;
    let model = router.default_model().ok_or("No default provider configured")?;

    let (human, questions) = paperscout_tools::human_channel(
        8,
        config.human.timeout_secs.map(Duration::from_secs),
    );
    let tools = paperscout_tools::research_registry(&config, human).map_err(credential_help)?;
    tokio::spawn(answer_questions(questions, BufReader::new(tokio::io::stdin())));

    let agent = ResearchAgent::new(model, Arc::new(tools)).with_limits(Limits::from(&config.agent));

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if watch_interrupts(tokio::signal::ctrl_c, on_interrupt).await {
            eprintln!("\n  Interrupted");
            std::process::exit(130);
        }
    });

    let events = agent.run_stream_with_cancel(&question, cancel);
    let outcome = if stream {
        StreamCollector::collect_with(events, |event| {
            if let Some(line) = render_event(event) {
                eprintln!("{line}");
            }
        })
        .await
    } else {
        eprint!("  Researching...");
        let outcome = StreamCollector::collect(events).await;
        eprint!("\r                \r");
        outcome
    };

    let answer = outcome?.ok_or(RunFailed::NoOutput)?;
    println!("{}", answer.content);

    Ok(())
}

/// Cancel the run on the first interrupt.
///
/// Returns `true` once a second interrupt arrives, `false` if the signal
/// cannot be listened for.
async fn watch_interrupts<F, Fut>(mut next_interrupt: F, cancel: CancellationToken) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = next_interrupt().await {
        warn!(error = %e, "Cannot listen for Ctrl-C");
        return false;
    }
    eprintln!("\n  Stopping... press Ctrl-C again to quit");
    cancel.cancel();
    next_interrupt().await.is_ok()
}

/// Answer each pending question with the next line from `input`.
///
/// Stops at end of input; questions still pending are then dropped, which
/// the asking tool reports as an unavailable human.
pub async fn answer_questions<R>(mut questions: mpsc::Receiver<PendingQuestion>, input: R)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while let Some(pending) = questions.recv().await {
        eprintln!("\n  Question > {}", pending.question);
        eprint!("  Answer   > ");
        match lines.next_line().await {
            Ok(Some(line)) => {
                let id = pending.id.clone();
                if !pending.answer(line.trim()) {
                    warn!(question_id = %id, "Answer arrived after the question was abandoned");
                }
            }
            Ok(None) => {
                warn!("Input closed, no more questions can be answered");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read answer");
                break;
            }
        }
    }
}

/// One progress line per interesting event.
fn render_event(event: &AgentStreamEvent) -> Option<String> {
    match event {
        AgentStreamEvent::NodeStarted { node } => Some(format!("  ── {node}")),
        AgentStreamEvent::Message { message, .. } if !message.content.is_empty() => Some(
            message
                .content
                .lines()
                .map(|line| format!("     {line}"))
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        AgentStreamEvent::ToolCall { name, input, .. } => Some(format!("  → {name} {input}")),
        AgentStreamEvent::ToolResult {
            name,
            output,
            success,
            ..
        } => Some(format!(
            "  ← {name} {} ({} chars)",
            if *success { "ok" } else { "failed" },
            output.chars().count()
        )),
        AgentStreamEvent::Done {
            nodes_visited,
            feedback_requests,
            ..
        } => Some(format!(
            "  ✓ done after {nodes_visited} steps, {feedback_requests} review(s)"
        )),
        _ => None,
    }
}
