//! # FitCoach Agent
//!
//! The conversation engine: specialist tool-calling agents, a one-step
//! supervisor that routes each turn to one of them, and a grounded
//! answering chain for direct corpus questions.
//!
//! Specialists share one provider and one tool registry; each sees only
//! its allow-listed tools. Every specialist reply ends with a standing
//! safety disclaimer.

pub mod rag_chain;
pub mod session;
pub mod supervisor;

use std::sync::Arc;

use fitcoach_core::error::Result;
use fitcoach_core::traits::Provider;
use fitcoach_core::types::{GenerateParams, Message, Role, ToolCall};
use fitcoach_tools::{ToolRegistry, validate_args};

pub use rag_chain::answer_grounded;
pub use session::SessionContext;
pub use supervisor::{CoachTeam, Route, Supervisor};

/// Appended to every specialist reply.
const DISCLAIMER: &str = "⚠️ This is general fitness advice. Consult a professional about medical conditions, medications, or injuries.";

/// Extra system rule given to web-capable agents when the session enables
/// corroboration.
const WEB_CORROBORATION_RULE: &str = "Web corroboration is enabled: call corroborate_answer before giving your final answer, and end the answer with a one-line status badge: web cross-check used yes/no, provider, result count, elapsed ms.";

/// Tool output beyond this is truncated before it reaches the model.
const MAX_TOOL_OUTPUT_CHARS: usize = 4000;

const MAX_TOOL_ROUNDS: usize = 3;

/// A domain-focused tool-calling agent.
pub struct SpecialistAgent {
    name: String,
    system_prompt: String,
    tool_names: Vec<&'static str>,
    provider: Arc<dyn Provider>,
    registry: Arc<ToolRegistry>,
    params: GenerateParams,
}

impl SpecialistAgent {
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        tool_names: Vec<&'static str>,
        provider: Arc<dyn Provider>,
        registry: Arc<ToolRegistry>,
        params: GenerateParams,
    ) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            tool_names,
            provider,
            registry,
            params,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Produce one reply for the session's latest user message.
    ///
    /// Runs the tool-calling loop: the model may request tools for up to
    /// [`MAX_TOOL_ROUNDS`] rounds; the final round withholds tool
    /// definitions so the turn always ends in text. The reply is appended
    /// to the session history.
    pub async fn respond(&self, ctx: &mut SessionContext) -> Result<String> {
        let mut messages = Vec::with_capacity(ctx.messages.len() + 3);
        messages.push(Message::system(&self.system_prompt));
        messages.push(Message::system(ctx.profile.as_system_block()));
        if ctx.use_web && self.tool_names.contains(&"corroborate_answer") {
            messages.push(Message::system(WEB_CORROBORATION_RULE));
        }
        messages.extend(ctx.messages.iter().cloned());

        let tool_defs = self.registry.definitions_for(&self.tool_names);
        let mut final_content = String::new();

        for round in 0..=MAX_TOOL_ROUNDS {
            let current_tools: &[_] =
                if round < MAX_TOOL_ROUNDS { &tool_defs } else { &[] };
            let response = self.provider.chat(&messages, current_tools, &self.params).await?;

            if response.tool_calls.is_empty() {
                final_content =
                    response.content.unwrap_or_else(|| "I'm not sure how to respond.".into());
                break;
            }

            tracing::info!(
                agent = %self.name,
                round = round + 1,
                calls = response.tool_calls.len(),
                "tool round"
            );

            let mut tool_results = Vec::new();
            for tc in &response.tool_calls {
                let output = self.run_tool(tc).await;
                tool_results.push(Message::tool(output, &tc.id));
            }

            messages.push(Message {
                role: Role::Assistant,
                content: response.content.unwrap_or_default(),
                tool_call_id: None,
                tool_calls: Some(response.tool_calls),
            });
            messages.extend(tool_results);
        }

        if final_content.is_empty() {
            final_content = "I executed the requested tools.".into();
        }

        let reply = format!("{final_content}\n\n{DISCLAIMER}");
        ctx.push_assistant(&reply);
        Ok(reply)
    }

    /// Run one requested tool call. Arguments are checked against the
    /// tool's declared required fields before execution; every failure
    /// becomes a Tool message the model can react to.
    async fn run_tool(&self, tc: &ToolCall) -> String {
        let Some(tool) = self.registry.get(&tc.function.name) else {
            return format!("Tool not found: {}", tc.function.name);
        };
        let args: serde_json::Value = match serde_json::from_str(&tc.function.arguments) {
            Ok(v) => v,
            Err(e) => return format!("Tool error: arguments are not valid JSON: {e}"),
        };
        if let Err(msg) = validate_args(&tool.definition(), &args) {
            return format!("Tool error: {msg}");
        }
        match tool.execute(&tc.function.arguments).await {
            Ok(result) => truncate_output(result.output),
            Err(e) => format!("Tool error: {e}"),
        }
    }
}

fn truncate_output(output: String) -> String {
    if output.chars().count() <= MAX_TOOL_OUTPUT_CHARS {
        return output;
    }
    let head: String = output.chars().take(MAX_TOOL_OUTPUT_CHARS).collect();
    format!("{head}...\n[truncated, {} total chars]", output.chars().count())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use fitcoach_core::types::{FunctionCall, Profile, ProviderResponse, ToolCall};
    use fitcoach_tools::EstimateTdeeTool;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted provider: pops one canned response per chat call and
    /// records what each call looked like.
    pub(crate) struct MockProvider {
        responses: Mutex<VecDeque<ProviderResponse>>,
        /// (message count, tool definition count) per call
        pub(crate) calls: Mutex<Vec<(usize, usize)>>,
        pub(crate) last_messages: Mutex<Vec<Message>>,
    }

    impl MockProvider {
        pub(crate) fn scripted(responses: Vec<ProviderResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
                last_messages: Mutex::new(Vec::new()),
            })
        }
    }

    pub(crate) fn text_response(content: &str) -> ProviderResponse {
        ProviderResponse {
            content: Some(content.into()),
            tool_calls: vec![],
            finish_reason: Some("stop".into()),
            usage: None,
        }
    }

    pub(crate) fn tool_call_response(name: &str, arguments: &str) -> ProviderResponse {
        ProviderResponse {
            content: None,
            tool_calls: vec![ToolCall {
                id: "call_1".into(),
                call_type: "function".into(),
                function: FunctionCall { name: name.into(), arguments: arguments.into() },
            }],
            finish_reason: Some("tool_calls".into()),
            usage: None,
        }
    }

    #[async_trait::async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn chat(
            &self,
            messages: &[Message],
            tools: &[fitcoach_core::types::ToolDefinition],
            _params: &GenerateParams,
        ) -> Result<ProviderResponse> {
            self.calls.lock().unwrap().push((messages.len(), tools.len()));
            *self.last_messages.lock().unwrap() = messages.to_vec();
            self.responses.lock().unwrap().pop_front().ok_or_else(|| {
                fitcoach_core::error::FitCoachError::Provider("script exhausted".into())
            })
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EstimateTdeeTool));
        Arc::new(registry)
    }

    #[tokio::test]
    async fn test_respond_runs_tool_loop_and_appends_disclaimer() {
        let provider = MockProvider::scripted(vec![
            tool_call_response(
                "estimate_tdee",
                r#"{"sex":"F","age":30,"height_cm":165,"weight_kg":60,"activity":"moderate"}"#,
            ),
            text_response("Your TDEE is about 2046 kcal."),
        ]);
        let agent = SpecialistAgent::new(
            "nutrition",
            "You are a nutrition coach.",
            vec!["estimate_tdee"],
            provider.clone(),
            registry(),
            GenerateParams::default(),
        );

        let mut ctx = SessionContext::new(Profile::default(), false);
        ctx.push_user("what is my TDEE?");
        let reply = agent.respond(&mut ctx).await.unwrap();

        assert!(reply.starts_with("Your TDEE is about 2046 kcal."));
        assert!(reply.ends_with(DISCLAIMER));
        // The second call saw the tool result in history
        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].0 > calls[0].0);
        // Reply landed in the session history
        assert_eq!(ctx.messages.last().unwrap().role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_respond_reports_tool_errors_to_model() {
        let provider = MockProvider::scripted(vec![
            tool_call_response(
                "estimate_tdee",
                r#"{"sex":"F","age":"thirty","height_cm":165,"weight_kg":60}"#,
            ),
            text_response("I need more profile details."),
        ]);
        let agent = SpecialistAgent::new(
            "nutrition",
            "You are a nutrition coach.",
            vec!["estimate_tdee"],
            provider.clone(),
            registry(),
            GenerateParams::default(),
        );

        let mut ctx = SessionContext::new(Profile::default(), false);
        ctx.push_user("tdee?");
        agent.respond(&mut ctx).await.unwrap();

        let seen = provider.last_messages.lock().unwrap();
        let tool_msg = seen.iter().find(|m| m.role == Role::Tool).unwrap();
        assert!(tool_msg.content.starts_with("Tool error:"));
    }

    #[tokio::test]
    async fn test_rejects_calls_missing_required_arguments() {
        let provider = MockProvider::scripted(vec![
            tool_call_response("estimate_tdee", r#"{"age":30}"#),
            text_response("I still need your sex, height, and weight."),
        ]);
        let agent = SpecialistAgent::new(
            "nutrition",
            "You are a nutrition coach.",
            vec!["estimate_tdee"],
            provider.clone(),
            registry(),
            GenerateParams::default(),
        );

        let mut ctx = SessionContext::new(Profile::default(), false);
        ctx.push_user("tdee?");
        agent.respond(&mut ctx).await.unwrap();

        // The call is rejected before execution, naming the first gap.
        let seen = provider.last_messages.lock().unwrap();
        let tool_msg = seen.iter().find(|m| m.role == Role::Tool).unwrap();
        assert_eq!(tool_msg.content, "Tool error: Missing required argument: sex");
    }

    #[tokio::test]
    async fn test_reports_unparseable_arguments() {
        let provider = MockProvider::scripted(vec![
            tool_call_response("estimate_tdee", "not json"),
            text_response("Let me try again."),
        ]);
        let agent = SpecialistAgent::new(
            "nutrition",
            "You are a nutrition coach.",
            vec!["estimate_tdee"],
            provider.clone(),
            registry(),
            GenerateParams::default(),
        );

        let mut ctx = SessionContext::new(Profile::default(), false);
        ctx.push_user("tdee?");
        agent.respond(&mut ctx).await.unwrap();

        let seen = provider.last_messages.lock().unwrap();
        let tool_msg = seen.iter().find(|m| m.role == Role::Tool).unwrap();
        assert!(tool_msg.content.starts_with("Tool error: arguments are not valid JSON"));
    }

    #[tokio::test]
    async fn test_final_round_withholds_tools() {
        // Model keeps asking for tools; after MAX_TOOL_ROUNDS the last
        // call must carry no tool definitions.
        let args = r#"{"sex":"F","age":30,"height_cm":165,"weight_kg":60}"#;
        let provider = MockProvider::scripted(vec![
            tool_call_response("estimate_tdee", args),
            tool_call_response("estimate_tdee", args),
            tool_call_response("estimate_tdee", args),
            text_response("Done."),
        ]);
        let agent = SpecialistAgent::new(
            "nutrition",
            "You are a nutrition coach.",
            vec!["estimate_tdee"],
            provider.clone(),
            registry(),
            GenerateParams::default(),
        );

        let mut ctx = SessionContext::new(Profile::default(), false);
        ctx.push_user("tdee?");
        agent.respond(&mut ctx).await.unwrap();

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[3].1, 0);
    }

    #[tokio::test]
    async fn test_web_rule_only_for_corroborating_agents() {
        let provider = MockProvider::scripted(vec![text_response("ok")]);
        let agent = SpecialistAgent::new(
            "qa",
            "You answer questions.",
            vec!["corroborate_answer"],
            provider.clone(),
            Arc::new(ToolRegistry::new()),
            GenerateParams::default(),
        );

        let mut ctx = SessionContext::new(Profile::default(), true);
        ctx.push_user("hello");
        agent.respond(&mut ctx).await.unwrap();

        let seen = provider.last_messages.lock().unwrap();
        assert!(seen.iter().any(|m| m.content == WEB_CORROBORATION_RULE));
    }

    #[test]
    fn test_truncate_output() {
        let long = "x".repeat(MAX_TOOL_OUTPUT_CHARS + 10);
        let truncated = truncate_output(long);
        assert!(truncated.contains("[truncated, 4010 total chars]"));

        let short = truncate_output("short".into());
        assert_eq!(short, "short");
    }
}
