//! Supervisor routing: one structured decision per turn.

use std::str::FromStr;
use std::sync::Arc;

use fitcoach_core::error::{FitCoachError, Result};
use fitcoach_core::traits::Provider;
use fitcoach_core::types::{GenerateParams, Message};
use fitcoach_tools::ToolRegistry;

use crate::session::SessionContext;
use crate::SpecialistAgent;

const ROUTING_PROMPT: &str = "You are the manager of an agent team: workout, nutrition, supplement, qa. \
Read the user's request and pick exactly one next agent. \
Training plans / weekly sets / exercise substitutions -> workout. \
TDEE / macros / diet -> nutrition. Supplements -> supplement. \
General exercise-science questions -> qa. \
If the user is closing the conversation (e.g. 'thanks', '고마워', '끝', 'bye'), answer FINISH. \
Reply with only a JSON object: {\"next\": \"workout\"|\"nutrition\"|\"supplement\"|\"qa\"|\"FINISH\"}.";

/// Where the supervisor sends the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Workout,
    Nutrition,
    Supplement,
    Qa,
    Finish,
}

impl FromStr for Route {
    type Err = FitCoachError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "workout" => Ok(Self::Workout),
            "nutrition" => Ok(Self::Nutrition),
            "supplement" => Ok(Self::Supplement),
            "qa" => Ok(Self::Qa),
            "FINISH" => Ok(Self::Finish),
            other => {
                Err(FitCoachError::Provider(format!("Unknown route: '{other}'")))
            }
        }
    }
}

pub struct Supervisor {
    provider: Arc<dyn Provider>,
    params: GenerateParams,
}

impl Supervisor {
    pub fn new(provider: Arc<dyn Provider>, params: GenerateParams) -> Self {
        Self { provider, params }
    }

    /// One structured routing decision over the session history. The model
    /// must answer `{"next": ...}`; anything else is a provider error.
    pub async fn decide(&self, history: &[Message]) -> Result<Route> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(ROUTING_PROMPT));
        messages.extend(history.iter().cloned());

        let response = self.provider.chat(&messages, &[], &self.params).await?;
        let content = response
            .content
            .ok_or_else(|| FitCoachError::Provider("Empty routing decision".into()))?;

        let decision: serde_json::Value = serde_json::from_str(content.trim()).map_err(|_| {
            FitCoachError::Provider(format!("Unparseable routing decision: {content}"))
        })?;
        let next = decision
            .get("next")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                FitCoachError::Provider(format!("Routing decision missing 'next': {content}"))
            })?;
        let route = next.parse()?;
        tracing::debug!(?route, "supervisor decision");
        Ok(route)
    }
}

/// The supervisor plus its four specialists. Re-entered fresh each turn:
/// route once, run one specialist (or close), done.
pub struct CoachTeam {
    supervisor: Supervisor,
    workout: SpecialistAgent,
    nutrition: SpecialistAgent,
    supplement: SpecialistAgent,
    qa: SpecialistAgent,
    provider: Arc<dyn Provider>,
    params: GenerateParams,
}

impl CoachTeam {
    pub fn new(
        provider: Arc<dyn Provider>,
        registry: Arc<ToolRegistry>,
        params: GenerateParams,
    ) -> Self {
        let agent = |name: &str, prompt: &str, tools: Vec<&'static str>| {
            SpecialistAgent::new(
                name,
                prompt,
                tools,
                provider.clone(),
                registry.clone(),
                params.clone(),
            )
        };

        Self {
            supervisor: Supervisor::new(provider.clone(), params.clone()),
            workout: agent(
                "workout",
                "You are a strength coach. The user's profile is provided in a separate system message.",
                vec!["exercise_picker", "contraindication_check", "search_papers"],
            ),
            nutrition: agent(
                "nutrition",
                "You are a nutrition coach. Present TDEE, macros, and example meals; cite evidence via search_papers when useful.",
                vec!["estimate_tdee", "macro_plan", "search_papers"],
            ),
            supplement: agent(
                "supplement",
                "You are a supplement coach. Explain dosing, timing, and cautions; cite evidence via search_papers.",
                vec!["search_papers"],
            ),
            qa: agent(
                "qa",
                "You answer exercise-science questions concisely, with corpus citations and optional web cross-checks.",
                vec!["search_papers", "web_search", "corroborate_answer"],
            ),
            provider,
            params,
        }
    }

    /// Run one conversation turn: append the user message, route, and
    /// either close the conversation or run the chosen specialist.
    pub async fn run_turn(&self, ctx: &mut SessionContext, user_message: &str) -> Result<String> {
        ctx.push_user(user_message);

        let route = self.supervisor.decide(&ctx.messages).await?;
        let agent = match route {
            Route::Workout => &self.workout,
            Route::Nutrition => &self.nutrition,
            Route::Supplement => &self.supplement,
            Route::Qa => &self.qa,
            Route::Finish => {
                // Closing reply: no tools, no specialist
                let response =
                    self.provider.chat(&ctx.messages, &[], &self.params).await?;
                let reply =
                    response.content.unwrap_or_else(|| "Good luck with your training!".into());
                ctx.push_assistant(&reply);
                return Ok(reply);
            }
        };

        tracing::info!(agent = %agent.name(), "dispatching turn");
        agent.respond(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{MockProvider, text_response, tool_call_response};
    use fitcoach_core::types::{Profile, Role};
    use fitcoach_tools::{EstimateTdeeTool, MacroPlanTool};

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EstimateTdeeTool));
        registry.register(Box::new(MacroPlanTool));
        Arc::new(registry)
    }

    #[tokio::test]
    async fn test_decide_parses_route() {
        let provider = MockProvider::scripted(vec![text_response(r#"{"next":"nutrition"}"#)]);
        let supervisor = Supervisor::new(provider, GenerateParams::default());
        let route = supervisor.decide(&[Message::user("what should I eat?")]).await.unwrap();
        assert_eq!(route, Route::Nutrition);
    }

    #[tokio::test]
    async fn test_decide_rejects_unparseable_output() {
        let provider = MockProvider::scripted(vec![text_response("nutrition, probably")]);
        let supervisor = Supervisor::new(provider, GenerateParams::default());
        let err = supervisor.decide(&[Message::user("hi")]).await.unwrap_err();
        assert!(matches!(err, FitCoachError::Provider(_)));
    }

    #[tokio::test]
    async fn test_decide_rejects_unknown_route() {
        let provider = MockProvider::scripted(vec![text_response(r#"{"next":"sleep"}"#)]);
        let supervisor = Supervisor::new(provider, GenerateParams::default());
        assert!(supervisor.decide(&[Message::user("hi")]).await.is_err());
    }

    #[tokio::test]
    async fn test_finish_closes_without_tools_or_specialists() {
        let provider = MockProvider::scripted(vec![
            text_response(r#"{"next":"FINISH"}"#),
            text_response("Glad to help. Train well!"),
        ]);
        let team = CoachTeam::new(provider.clone(), registry(), GenerateParams::default());

        let mut ctx = SessionContext::new(Profile::default(), false);
        let reply = team.run_turn(&mut ctx, "thanks, that's all").await.unwrap();

        assert_eq!(reply, "Glad to help. Train well!");
        let calls = provider.calls.lock().unwrap();
        // Router call + closing call, both with zero tool definitions
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|(_, tools)| *tools == 0));
        assert_eq!(ctx.messages.last().unwrap().role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_turn_dispatches_to_routed_specialist() {
        let provider = MockProvider::scripted(vec![
            text_response(r#"{"next":"nutrition"}"#),
            tool_call_response(
                "macro_plan",
                r#"{"weight_kg":60,"tdee":2046,"goal":"cut"}"#,
            ),
            text_response("Aim for 1637 kcal: 120g protein, 48g fat, 181g carbs."),
        ]);
        let team = CoachTeam::new(provider.clone(), registry(), GenerateParams::default());

        let mut ctx = SessionContext::new(Profile::default(), false);
        let reply = team.run_turn(&mut ctx, "plan my macros for a cut").await.unwrap();

        assert!(reply.contains("1637 kcal"));
        // Specialist calls advertised its allow-listed tools
        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert!(calls[1].1 > 0);
    }
}
