//! The model/tool loop for one user turn.
//!
//! [`Agent::respond`] calls the model with the whole history, appends the
//! assistant turn, runs every requested tool in order, and calls the model
//! again until a response asks for no tools.

use crate::constants::NO_RESPONSE_TEXT;
use crate::message::{History, ToolCall};
use crate::output::Renderer;
use crate::provider::{ModelClient, ModelError, ModelRequest, Usage};
use crate::tools::{ToolDescriptor, ToolRegistry};

/// Counters for one [`Agent::respond`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub model_calls: usize,
    pub tool_calls: usize,
    pub usage: Usage,
}

/// Everything held constant across a session's model calls.
pub struct Agent {
    model: Box<dyn ModelClient>,
    tools: ToolRegistry,
    descriptors: Vec<ToolDescriptor>,
    model_name: String,
    system_prompt: String,
    max_tokens: u32,
    max_tool_rounds: Option<usize>,
    session_id: String,
}

impl Agent {
    pub fn new(
        model: Box<dyn ModelClient>,
        tools: ToolRegistry,
        model_name: impl Into<String>,
        system_prompt: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        let descriptors = tools.descriptors();
        if tools.is_empty() {
            tracing::warn!("agent has no tools registered");
        }
        tracing::debug!(
            count = tools.len(),
            tools = ?descriptors.iter().map(|d| d.name()).collect::<Vec<_>>(),
            "tools declared"
        );
        Self {
            model,
            tools,
            descriptors,
            model_name: model_name.into(),
            system_prompt: system_prompt.into(),
            max_tokens,
            max_tool_rounds: None,
            session_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Stop after `rounds` completed tool rounds per user turn. `None` is
    /// unbounded. A round always runs to completion, so the smallest useful
    /// cap is 1; config loading rejects 0.
    pub fn with_max_tool_rounds(mut self, rounds: Option<usize>) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Runs the model until it stops requesting tools.
    ///
    /// On a model error the history keeps every turn appended so far; a
    /// partially answered response never exists because calls are answered
    /// before the next model call.
    pub async fn respond(
        &self,
        history: &mut History,
        renderer: &mut dyn Renderer,
    ) -> Result<LoopSummary, ModelError> {
        let mut summary = LoopSummary::default();
        let mut rounds = 0usize;
        debug_assert!(!history.is_empty(), "respond needs a user turn");

        loop {
            debug_assert!(
                history.unanswered_tool_calls().is_empty(),
                "every tool call is answered before the next model call"
            );
            let request = ModelRequest {
                model: &self.model_name,
                max_tokens: self.max_tokens,
                system: &self.system_prompt,
                messages: history.turns(),
                tools: &self.descriptors,
            };
            tracing::debug!(
                session = %self.session_id,
                turns = history.len(),
                "calling model"
            );
            let response = self.model.complete(&request).await?;
            summary.model_calls += 1;
            summary.usage.input_tokens += response.usage.input_tokens;
            summary.usage.output_tokens += response.usage.output_tokens;

            let text = response.primary_text().unwrap_or(NO_RESPONSE_TEXT);
            history.push_assistant_text(text);
            renderer.assistant_text(text);
            renderer.usage(&response.usage);

            let calls: Vec<ToolCall> = response.tool_calls().cloned().collect();
            tracing::debug!(
                session = %self.session_id,
                stop_reason = response.stop_reason.as_deref().unwrap_or("-"),
                tool_calls = calls.len(),
                "model responded"
            );
            if calls.is_empty() {
                break;
            }

            for call in calls {
                renderer.tool_start(&call);
                self.tools.dispatch(call, history).await;
                if let Some(result) = history.last_tool_result() {
                    renderer.tool_result(result);
                }
                summary.tool_calls += 1;
            }

            rounds += 1;
            if self.max_tool_rounds.is_some_and(|cap| rounds >= cap) {
                tracing::warn!(session = %self.session_id, rounds, "tool round limit reached");
                renderer.notice(&format!("Stopped after {rounds} tool rounds."));
                break;
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ContentBlock, Role};
    use crate::output::RecordingRenderer;
    use crate::provider::{ModelResponse, ResponseBlock};
    use crate::tools::{Tool, ToolError, ToolOutput};
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Answers from a script and records the history length of each request.
    struct ScriptedModel {
        responses: Mutex<VecDeque<Result<ModelResponse, ModelError>>>,
        seen_turns: Arc<Mutex<Vec<usize>>>,
    }

    impl ScriptedModel {
        fn new(responses: Vec<Result<ModelResponse, ModelError>>) -> (Self, Arc<Mutex<Vec<usize>>>) {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let model = Self {
                responses: Mutex::new(responses.into()),
                seen_turns: seen.clone(),
            };
            (model, seen)
        }
    }

    #[async_trait::async_trait]
    impl ModelClient for ScriptedModel {
        async fn complete(&self, request: &ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
            self.seen_turns.lock().unwrap().push(request.messages.len());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(text_response("done")))
        }
    }

    struct Echo;

    #[async_trait::async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor::Function {
                name: "echo".to_string(),
                description: "Echo the input".to_string(),
                input_schema: json!({"type": "object"}),
            }
        }

        async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::Text(input.to_string()))
        }
    }

    fn text_response(text: &str) -> ModelResponse {
        ModelResponse {
            content: vec![ResponseBlock::Text {
                text: text.to_string(),
            }],
            stop_reason: Some("end_turn".to_string()),
            usage: Usage {
                input_tokens: 5,
                output_tokens: 2,
            },
        }
    }

    fn tool_response(text: Option<&str>, ids: &[&str]) -> ModelResponse {
        let mut content = Vec::new();
        if let Some(text) = text {
            content.push(ResponseBlock::Text {
                text: text.to_string(),
            });
        }
        for id in ids {
            content.push(ResponseBlock::ToolUse(ToolCall {
                id: id.to_string(),
                name: "echo".to_string(),
                input: json!({"id": id}),
            }));
        }
        ModelResponse {
            content,
            stop_reason: Some("tool_use".to_string()),
            usage: Usage::default(),
        }
    }

    fn agent(model: ScriptedModel) -> Agent {
        let mut tools = ToolRegistry::new();
        tools.register(Box::new(Echo));
        Agent::new(Box::new(model), tools, "test-model", "system", 1024)
    }

    fn user_history(text: &str) -> History {
        let mut history = History::new();
        history.push_user_text(text);
        history
    }

    #[tokio::test]
    async fn test_no_tool_calls_means_one_model_call() {
        let (model, seen) = ScriptedModel::new(vec![Ok(text_response("Hello!"))]);
        let agent = agent(model);
        let mut history = user_history("hi");
        let mut renderer = RecordingRenderer::default();

        let summary = agent.respond(&mut history, &mut renderer).await.unwrap();

        assert_eq!(summary.model_calls, 1);
        assert_eq!(summary.tool_calls, 0);
        assert_eq!(summary.usage.input_tokens, 5);
        assert_eq!(*seen.lock().unwrap(), vec![1]);
        assert_eq!(history.len(), 2);
        assert_eq!(history.last().unwrap().role, Role::Assistant);
        assert_eq!(renderer.assistant, vec!["Hello!"]);
    }

    #[tokio::test]
    async fn test_every_call_in_a_response_is_answered_in_order() {
        let (model, seen) = ScriptedModel::new(vec![
            Ok(tool_response(Some("Running three."), &["a", "b", "c"])),
            Ok(text_response("All done.")),
        ]);
        let agent = agent(model);
        let mut history = user_history("go");
        let mut renderer = RecordingRenderer::default();

        let summary = agent.respond(&mut history, &mut renderer).await.unwrap();

        assert_eq!(summary.model_calls, 2);
        assert_eq!(summary.tool_calls, 3);
        // user, assistant(+3 calls), 3 results, then the second request.
        assert_eq!(*seen.lock().unwrap(), vec![1, 5]);
        assert_eq!(history.len(), 6);

        let assistant = &history.turns()[1];
        assert_eq!(assistant.primary_text(), Some("Running three."));
        let result_ids: Vec<&str> = history.turns()[2..5]
            .iter()
            .flat_map(|t| t.blocks())
            .filter_map(|b| match b {
                ContentBlock::ToolResult(r) => Some(r.tool_use_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(result_ids, vec!["a", "b", "c"]);
        assert!(history.unanswered_tool_calls().is_empty());
        assert_eq!(renderer.tools, vec!["echo", "echo", "echo"]);
        assert_eq!(renderer.results.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_text_uses_placeholder() {
        let (model, _) = ScriptedModel::new(vec![
            Ok(tool_response(None, &["a"])),
            Ok(text_response("ok")),
        ]);
        let agent = agent(model);
        let mut history = user_history("go");
        let mut renderer = RecordingRenderer::default();

        agent.respond(&mut history, &mut renderer).await.unwrap();

        assert_eq!(history.turns()[1].primary_text(), Some(NO_RESPONSE_TEXT));
        assert_eq!(renderer.assistant[0], NO_RESPONSE_TEXT);
    }

    #[tokio::test]
    async fn test_loops_until_no_tool_calls() {
        let (model, seen) = ScriptedModel::new(vec![
            Ok(tool_response(Some("one"), &["a"])),
            Ok(tool_response(Some("two"), &["b"])),
            Ok(tool_response(Some("three"), &["c"])),
            Ok(text_response("finished")),
        ]);
        let agent = agent(model);
        let mut history = user_history("go");
        let mut renderer = RecordingRenderer::default();

        let summary = agent.respond(&mut history, &mut renderer).await.unwrap();

        assert_eq!(summary.model_calls, 4);
        assert_eq!(*seen.lock().unwrap(), vec![1, 3, 5, 7]);
        assert_eq!(history.last().unwrap().primary_text(), Some("finished"));
    }

    #[tokio::test]
    async fn test_round_cap_stops_the_loop() {
        let (model, seen) = ScriptedModel::new(vec![
            Ok(tool_response(Some("one"), &["a"])),
            Ok(tool_response(Some("two"), &["b"])),
            Ok(tool_response(Some("three"), &["c"])),
        ]);
        let agent = agent(model).with_max_tool_rounds(Some(2));
        let mut history = user_history("go");
        let mut renderer = RecordingRenderer::default();

        let summary = agent.respond(&mut history, &mut renderer).await.unwrap();

        assert_eq!(summary.model_calls, 2);
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert!(history.unanswered_tool_calls().is_empty());
        assert_eq!(renderer.notices, vec!["Stopped after 2 tool rounds."]);
    }

    #[cfg(debug_assertions)]
    #[tokio::test]
    #[should_panic(expected = "every tool call is answered")]
    async fn test_unanswered_call_never_reaches_the_model() {
        let (model, _) = ScriptedModel::new(vec![Ok(text_response("unreachable"))]);
        let agent = agent(model);
        let mut history = user_history("go");
        history.push_assistant_text("calling");
        history.attach_tool_call(ToolCall {
            id: "dangling".to_string(),
            name: "echo".to_string(),
            input: json!({}),
        });
        let mut renderer = RecordingRenderer::default();

        let _ = agent.respond(&mut history, &mut renderer).await;
    }

    #[tokio::test]
    async fn test_model_error_keeps_history() {
        let (model, _) = ScriptedModel::new(vec![
            Ok(tool_response(Some("one"), &["a"])),
            Err(ModelError::Api {
                status: 529,
                message: "Overloaded".to_string(),
            }),
        ]);
        let agent = agent(model);
        let mut history = user_history("go");
        let mut renderer = RecordingRenderer::default();

        let err = agent.respond(&mut history, &mut renderer).await.unwrap_err();

        assert_eq!(err.to_string(), "API error (529): Overloaded");
        assert_eq!(history.len(), 3);
        assert!(history.unanswered_tool_calls().is_empty());
    }
}
