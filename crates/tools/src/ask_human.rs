//! `ask-human-feedback` — pose a question to whoever hosts the run.
//!
//! The tool does not read a terminal itself. Each question is sent to the
//! host as a [`PendingQuestion`] over an mpsc channel, and the tool waits on
//! the question's oneshot reply. The CLI answers from stdin; tests answer
//! programmatically.

use async_trait::async_trait;
use paperscout_core::error::ToolError;
use paperscout_core::tool::{Tool, ToolResult};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

const TOOL_NAME: &str = "ask-human-feedback";

/// A question waiting for a human answer.
#[derive(Debug)]
pub struct PendingQuestion {
    pub id: String,
    pub question: String,
    reply: oneshot::Sender<String>,
}

impl PendingQuestion {
    /// Deliver the answer. Returns `false` if the asking tool stopped waiting.
    pub fn answer(self, text: impl Into<String>) -> bool {
        self.reply.send(text.into()).is_ok()
    }
}

/// Create the tool and the receiving end the host answers from.
pub fn human_channel(
    capacity: usize,
    timeout: Option<Duration>,
) -> (AskHumanTool, mpsc::Receiver<PendingQuestion>) {
    let (tx, rx) = mpsc::channel(capacity);
    (AskHumanTool { questions: tx, timeout }, rx)
}

pub struct AskHumanTool {
    questions: mpsc::Sender<PendingQuestion>,
    timeout: Option<Duration>,
}

#[async_trait]
impl Tool for AskHumanTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Ask for human feedback. You should call this tool when encountering unexpected errors."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "The question to ask the human"
                }
            },
            "required": ["question"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let question = arguments["question"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'question' argument".into()))?;

        let (reply, answer) = oneshot::channel();
        let pending = PendingQuestion {
            id: uuid::Uuid::new_v4().to_string(),
            question: question.to_string(),
            reply,
        };
        info!(question_id = %pending.id, "Asking human");

        self.questions
            .send(pending)
            .await
            .map_err(|_| ToolError::HumanUnavailable("no responder is listening".into()))?;

        let answer = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, answer).await.map_err(|_| {
                warn!(timeout_secs = limit.as_secs(), "Human did not answer in time");
                ToolError::Timeout {
                    tool_name: TOOL_NAME.into(),
                    timeout_secs: limit.as_secs(),
                }
            })?,
            None => answer.await,
        };

        answer
            .map(ToolResult::ok)
            .map_err(|_| ToolError::HumanUnavailable("question was dropped unanswered".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answer_is_returned_as_output() {
        let (tool, mut questions) = human_channel(4, None);

        let responder = tokio::spawn(async move {
            let pending = questions.recv().await.unwrap();
            assert_eq!(pending.question, "Which year?");
            assert!(pending.answer("2017"));
        });

        let result = tool
            .execute(serde_json::json!({"question": "Which year?"}))
            .await
            .unwrap();
        responder.await.unwrap();
        assert_eq!(result.output, "2017");
    }

    #[tokio::test]
    async fn closed_channel_means_unavailable() {
        let (tool, questions) = human_channel(1, None);
        drop(questions);

        let err = tool
            .execute(serde_json::json!({"question": "anyone?"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::HumanUnavailable(_)));
    }

    #[tokio::test]
    async fn dropped_question_means_unavailable() {
        let (tool, mut questions) = human_channel(1, None);
        tokio::spawn(async move {
            let pending = questions.recv().await.unwrap();
            drop(pending);
        });

        let err = tool
            .execute(serde_json::json!({"question": "hello?"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::HumanUnavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_question_times_out() {
        let (tool, mut questions) = human_channel(1, Some(Duration::from_secs(30)));
        let holder = tokio::spawn(async move {
            // Keep the question alive without answering.
            let pending = questions.recv().await;
            tokio::time::sleep(Duration::from_secs(3600)).await;
            drop(pending);
        });

        let err = tool
            .execute(serde_json::json!({"question": "still there?"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout { timeout_secs: 30, .. }));
        holder.abort();
    }

    #[tokio::test]
    async fn missing_question_argument() {
        let (tool, _questions) = human_channel(1, None);
        let err = tool.execute(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
