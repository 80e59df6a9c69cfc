use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use boardroom_core::advisor::{Advisor, ADVICE_FALLBACK};
use boardroom_core::domain::action::ActionRecommendation;
use boardroom_core::domain::company::CompanySnapshot;
use boardroom_core::domain::conversation::{Conversation, ConversationTurn, NonBlankText};
use boardroom_core::llm::gemini::GeminiClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = boardroom_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let company = settings.load_company().map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        e
    })?;
    let llm = GeminiClient::from_settings(&settings).map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        e
    })?;
    tracing::info!(
        company = %company.name,
        model = llm.model(),
        projected_runway_months = ?company.projected_runway_months(),
        "strategist ready"
    );

    let state = AppState::new(company, Advisor::new(Arc::new(llm)));
    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/company", get(get_company))
        .route("/chat", get(get_chat).post(post_chat))
        .route("/simulate", post(post_simulate))
        .route("/actions", post(post_actions))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    company: Arc<CompanySnapshot>,
    advisor: Advisor,
    conversation: Arc<Mutex<Conversation>>,
}

impl AppState {
    fn new(company: CompanySnapshot, advisor: Advisor) -> Self {
        let conversation = Conversation::with_greeting(&company);
        Self {
            company: Arc::new(company),
            advisor,
            conversation: Arc::new(Mutex::new(conversation)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    text: String,
}

#[derive(Debug, Deserialize)]
struct SimulateRequest {
    scenario: String,
}

#[derive(Debug, Serialize)]
struct SimulateResponse {
    memo: String,
}

#[derive(Debug, Serialize)]
struct ActionsResponse {
    actions: Vec<ActionRecommendation>,
}

async fn get_company(State(state): State<AppState>) -> Json<CompanySnapshot> {
    Json(state.company.as_ref().clone())
}

async fn get_chat(State(state): State<AppState>) -> Json<Vec<ConversationTurn>> {
    let conversation = state.conversation.lock().await;
    Json(conversation.turns().to_vec())
}

async fn post_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ConversationTurn>, StatusCode> {
    let query = NonBlankText::parse(&req.text).ok_or(StatusCode::BAD_REQUEST)?;

    // Detached so the reply is recorded even if the caller goes away.
    let exchange = tokio::spawn(async move {
        // Held for the whole exchange so each reply directly follows its question.
        let mut conversation = state.conversation.lock().await;
        if conversation.awaiting_reply() {
            tracing::warn!("previous question was left unanswered; recording fallback reply");
            conversation.push_model(ADVICE_FALLBACK);
        }

        let history = conversation.turns().to_vec();
        conversation.push_user(&query);

        let reply = state.advisor.advise(&history, &state.company, &query).await;
        let turn = conversation.push_model(reply).clone();
        turn
    });

    let turn = exchange.await.map_err(|e| {
        tracing::error!(error = %e, "chat exchange task failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(turn))
}

async fn post_simulate(
    State(state): State<AppState>,
    Json(req): Json<SimulateRequest>,
) -> Result<Json<SimulateResponse>, StatusCode> {
    let scenario = NonBlankText::parse(&req.scenario).ok_or(StatusCode::BAD_REQUEST)?;
    let memo = state.advisor.simulate(&state.company, &scenario).await;
    Ok(Json(SimulateResponse { memo }))
}

async fn post_actions(State(state): State<AppState>) -> Json<ActionsResponse> {
    let actions = state.advisor.recommend_actions(&state.company).await;
    if actions.iter().any(ActionRecommendation::is_error_sentinel) {
        tracing::warn!("serving error placeholder for next best actions");
    }
    Json(ActionsResponse { actions })
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &boardroom_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardroom_core::domain::conversation::Role;
    use boardroom_core::llm::{GenerateRequest, GenerateResponse, LlmClient, Prompt, Provider};
    use std::time::Duration;

    struct CountingClient;

    #[async_trait::async_trait]
    impl LlmClient for CountingClient {
        fn provider(&self) -> Provider {
            Provider::Gemini
        }

        async fn generate(&self, request: GenerateRequest) -> anyhow::Result<GenerateResponse> {
            let units = match request.contents {
                Prompt::Turns(units) => units.len(),
                Prompt::Text(_) => 1,
            };
            Ok(GenerateResponse {
                text: Some(format!("saw {units} units")),
            })
        }
    }

    struct DownClient;

    #[async_trait::async_trait]
    impl LlmClient for DownClient {
        fn provider(&self) -> Provider {
            Provider::Gemini
        }

        async fn generate(&self, _request: GenerateRequest) -> anyhow::Result<GenerateResponse> {
            anyhow::bail!("connection refused")
        }
    }

    struct SlowClient;

    #[async_trait::async_trait]
    impl LlmClient for SlowClient {
        fn provider(&self) -> Provider {
            Provider::Gemini
        }

        async fn generate(&self, _request: GenerateRequest) -> anyhow::Result<GenerateResponse> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(GenerateResponse {
                text: Some("late reply".to_string()),
            })
        }
    }

    fn state(llm: Arc<dyn LlmClient>) -> AppState {
        AppState::new(CompanySnapshot::seed(), Advisor::new(llm))
    }

    #[tokio::test]
    async fn chat_rejects_blank_text_without_recording_it() {
        let state = state(Arc::new(CountingClient));
        let res = post_chat(
            State(state.clone()),
            Json(ChatRequest {
                text: "   ".to_string(),
            }),
        )
        .await;
        assert_eq!(res.unwrap_err(), StatusCode::BAD_REQUEST);
        assert_eq!(state.conversation.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn chat_appends_question_then_reply() {
        let state = state(Arc::new(CountingClient));
        for (i, text) in ["first", "second"].into_iter().enumerate() {
            let Json(turn) = post_chat(
                State(state.clone()),
                Json(ChatRequest {
                    text: text.to_string(),
                }),
            )
            .await
            .unwrap();
            assert_eq!(turn.role, Role::Model);
            // greeting + prior exchanges + the composite query unit
            assert_eq!(turn.text, format!("saw {} units", 2 + 2 * i));
        }

        let Json(turns) = get_chat(State(state)).await;
        let roles: Vec<_> = turns.iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![Role::Model, Role::User, Role::Model, Role::User, Role::Model]
        );
        assert_eq!(turns[1].text, "first");
        assert_eq!(turns[3].text, "second");
    }

    #[tokio::test]
    async fn outage_degrades_to_fallbacks() {
        let state = state(Arc::new(DownClient));

        let Json(turn) = post_chat(
            State(state.clone()),
            Json(ChatRequest {
                text: "Status?".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(turn.text, ADVICE_FALLBACK);

        let Json(sim) = post_simulate(
            State(state.clone()),
            Json(SimulateRequest {
                scenario: "Acquire competitor X".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(sim.memo, "Unable to run simulation protocols.");

        let Json(actions) = post_actions(State(state)).await;
        assert_eq!(actions.actions, vec![ActionRecommendation::error_sentinel()]);
    }

    #[tokio::test]
    async fn simulate_rejects_blank_scenario() {
        let res = post_simulate(
            State(state(Arc::new(CountingClient))),
            Json(SimulateRequest {
                scenario: String::new(),
            }),
        )
        .await;
        assert_eq!(res.unwrap_err(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn abandoned_chat_still_records_reply() {
        let state = state(Arc::new(SlowClient));
        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            post_chat(
                State(state.clone()),
                Json(ChatRequest {
                    text: "Are we default alive?".to_string(),
                }),
            ),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(400)).await;

        let conversation = state.conversation.lock().await;
        let roles: Vec<_> = conversation.turns().iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::Model, Role::User, Role::Model]);
        assert_eq!(conversation.turns()[2].text, "late reply");
    }

    #[tokio::test]
    async fn unanswered_question_gets_fallback_before_next_exchange() {
        let state = state(Arc::new(CountingClient));
        state
            .conversation
            .lock()
            .await
            .push_user(&NonBlankText::parse("lost question").unwrap());

        let Json(turn) = post_chat(
            State(state.clone()),
            Json(ChatRequest {
                text: "next question".to_string(),
            }),
        )
        .await
        .unwrap();
        // greeting, lost question, fallback + composite query unit
        assert_eq!(turn.text, "saw 4 units");

        let conversation = state.conversation.lock().await;
        let roles: Vec<_> = conversation.turns().iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![Role::Model, Role::User, Role::Model, Role::User, Role::Model]
        );
        assert_eq!(conversation.turns()[2].text, ADVICE_FALLBACK);
    }
}
