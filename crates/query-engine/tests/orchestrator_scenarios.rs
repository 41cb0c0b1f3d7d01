use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use query_engine::llm::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatTransport,
    ChatTransportFuture, TransportError,
};
use query_engine::orchestrator::{DEFAULT_CHAT_MODEL, MAX_RESPONSE_TOKENS, SAMPLING_TEMPERATURE};
use query_engine::{
    ChatConfig, Citation, ConversationStore, ExchangeState, GroundingConfig, OrchestratorError,
    QueryOrchestrator, Role, Turn, build_grounding_descriptor,
};

const PERSONA: &str = "You are a zodiac guide.";

#[derive(Default)]
struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<ChatCompletionResponse, TransportError>>>,
    seen_requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl ScriptedTransport {
    fn with_replies(replies: Vec<Result<ChatCompletionResponse, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::from(replies)),
            seen_requests: Mutex::new(Vec::new()),
        })
    }

    fn seen_requests(&self) -> Vec<ChatCompletionRequest> {
        self.seen_requests
            .lock()
            .expect("request log lock should not be poisoned")
            .clone()
    }
}

impl ChatTransport for ScriptedTransport {
    fn complete<'a>(&'a self, request: ChatCompletionRequest) -> ChatTransportFuture<'a> {
        Box::pin(async move {
            self.seen_requests
                .lock()
                .expect("request log lock should not be poisoned")
                .push(request);
            self.replies
                .lock()
                .expect("reply queue lock should not be poisoned")
                .pop_front()
                .unwrap_or_else(|| {
                    Err(TransportError::ServiceFailure(
                        "exhausted_test_replies".to_string(),
                    ))
                })
        })
    }
}

struct NeverRespondingTransport;

impl ChatTransport for NeverRespondingTransport {
    fn complete<'a>(&'a self, _request: ChatCompletionRequest) -> ChatTransportFuture<'a> {
        Box::pin(std::future::pending())
    }
}

fn chat_config(model: &str) -> ChatConfig {
    ChatConfig {
        chat_endpoint: "https://zodiac.openai.azure.com/".to_string(),
        api_key: "chat-key".to_string(),
        model_deployment_name: model.to_string(),
    }
}

fn grounding_config() -> GroundingConfig {
    GroundingConfig {
        search_endpoint: "https://zodiac.search.windows.net".to_string(),
        index_name: "zodiac-index".to_string(),
        api_key: "search-key".to_string(),
        embedding_deployment_name: "text-embedding-ada-002".to_string(),
    }
}

fn orchestrator_with(transport: Arc<dyn ChatTransport>) -> QueryOrchestrator {
    QueryOrchestrator::new(
        ConversationStore::init(PERSONA),
        &chat_config("zodiac-gpt"),
        grounding_config(),
        transport,
    )
}

fn reply(text: &str) -> Result<ChatCompletionResponse, TransportError> {
    Ok(ChatCompletionResponse::from_message(ChatMessage::text(text)))
}

#[tokio::test]
async fn failed_exchange_restores_history_and_retry_appends_exactly_two_turns() {
    let transport = ScriptedTransport::with_replies(vec![
        Err(TransportError::Unavailable("connection refused".to_string())),
        reply("Hello, stargazer!"),
    ]);
    let mut orchestrator = orchestrator_with(transport.clone());

    let err = orchestrator
        .ask("What is a Leo?")
        .await
        .expect_err("transport failure should surface");
    assert!(matches!(
        err,
        OrchestratorError::Transport(TransportError::Unavailable(_))
    ));
    assert!(err.to_string().contains("connection refused"));
    assert_eq!(orchestrator.history(), &[Turn::system(PERSONA)]);
    assert_eq!(orchestrator.state(), ExchangeState::Idle);

    let formatted = orchestrator
        .ask("hi")
        .await
        .expect("second exchange should succeed");

    assert_eq!(formatted, "Hello, stargazer!");
    assert_eq!(
        orchestrator.history(),
        &[
            Turn::system(PERSONA),
            Turn::user("hi"),
            Turn::assistant("Hello, stargazer!"),
        ]
    );

    let requests = transport.seen_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[1].messages,
        vec![Turn::system(PERSONA), Turn::user("hi")]
    );
}

#[tokio::test]
async fn blank_input_is_rejected_without_touching_history_or_transport() {
    let transport = ScriptedTransport::with_replies(vec![reply("unused")]);
    let mut orchestrator = orchestrator_with(transport.clone());

    for input in ["", "   ", "\n\t"] {
        let err = orchestrator
            .ask(input)
            .await
            .expect_err("blank input should be rejected");
        assert!(matches!(err, OrchestratorError::InvalidInput));
    }

    assert_eq!(orchestrator.history(), &[Turn::system(PERSONA)]);
    assert!(transport.seen_requests().is_empty());
}

#[tokio::test]
async fn clear_then_ask_leaves_exactly_one_exchange() {
    let transport = ScriptedTransport::with_replies(vec![
        reply("Aries charges ahead."),
        reply("Taurus is..."),
    ]);
    let mut orchestrator = orchestrator_with(transport);

    orchestrator
        .ask("Tell me about Aries")
        .await
        .expect("first exchange should succeed");
    assert_eq!(orchestrator.history().len(), 3);

    orchestrator.clear();
    assert_eq!(orchestrator.history(), &[Turn::system(PERSONA)]);

    orchestrator
        .ask("Tell me about Taurus")
        .await
        .expect("exchange after clear should succeed");

    assert_eq!(
        orchestrator.history(),
        &[
            Turn::system(PERSONA),
            Turn::user("Tell me about Taurus"),
            Turn::assistant("Taurus is..."),
        ]
    );
}

#[tokio::test]
async fn null_content_becomes_empty_assistant_turn() {
    let transport = ScriptedTransport::with_replies(vec![Ok(
        ChatCompletionResponse::from_message(ChatMessage::default()),
    )]);
    let mut orchestrator = orchestrator_with(transport);

    let formatted = orchestrator
        .ask("Anything about Pisces?")
        .await
        .expect("empty content is not an error");

    assert_eq!(formatted, "");
    let tail = orchestrator.history().last().expect("history is never empty");
    assert_eq!(tail, &Turn::assistant(""));
    assert_eq!(orchestrator.state(), ExchangeState::Idle);
}

#[tokio::test]
async fn request_carries_history_grounding_and_fixed_sampling() {
    let transport = ScriptedTransport::with_replies(vec![reply("first"), reply("second")]);
    let mut orchestrator = orchestrator_with(transport.clone());

    orchestrator.ask("one").await.expect("exchange should succeed");
    orchestrator.ask("two").await.expect("exchange should succeed");

    let requests = transport.seen_requests();
    let last = requests.last().expect("two requests should be recorded");
    assert_eq!(last.model, "zodiac-gpt");
    assert_eq!(last.temperature, SAMPLING_TEMPERATURE);
    assert_eq!(last.temperature, 0.7);
    assert_eq!(last.max_tokens, MAX_RESPONSE_TOKENS);
    assert_eq!(last.max_tokens, 2000);
    assert_eq!(
        last.grounding,
        Some(build_grounding_descriptor(&grounding_config()))
    );
    assert_eq!(
        last.messages,
        vec![
            Turn::system(PERSONA),
            Turn::user("one"),
            Turn::assistant("first"),
            Turn::user("two"),
        ]
    );
}

#[tokio::test]
async fn blank_model_name_uses_default_model() {
    let transport = ScriptedTransport::with_replies(vec![reply("ok")]);
    let mut orchestrator = QueryOrchestrator::new(
        ConversationStore::init(PERSONA),
        &chat_config("  "),
        grounding_config(),
        transport.clone(),
    );

    orchestrator.ask("hello").await.expect("exchange should succeed");

    assert_eq!(orchestrator.model(), DEFAULT_CHAT_MODEL);
    assert_eq!(transport.seen_requests()[0].model, "gpt-4o");
}

#[tokio::test]
async fn citations_are_rendered_but_history_keeps_raw_text() {
    let transport = ScriptedTransport::with_replies(vec![Ok(
        ChatCompletionResponse::from_message(ChatMessage {
            content: Some("Leos love an audience.".to_string()),
            citations: vec![
                Citation::Structured {
                    title: Some("Sun Signs: Leo".to_string()),
                    content: Some("x".repeat(250)),
                },
                Citation::Freeform("love-signs.pdf".to_string()),
            ],
        }),
    )]);
    let mut orchestrator = orchestrator_with(transport);

    let formatted = orchestrator
        .ask("What is a Leo?")
        .await
        .expect("exchange should succeed");

    assert_eq!(
        formatted,
        format!(
            "Leos love an audience.\n\n📚 **Sources:**\n1. **Sun Signs: Leo**\n   {}...\n\n2. love-signs.pdf\n",
            "x".repeat(200)
        )
    );
    let tail = orchestrator.history().last().expect("history is never empty");
    assert_eq!(tail, &Turn::assistant("Leos love an audience."));
}

#[tokio::test]
async fn response_without_choices_is_a_transport_error_and_rolls_back() {
    let transport =
        ScriptedTransport::with_replies(vec![Ok(ChatCompletionResponse::default())]);
    let mut orchestrator = orchestrator_with(transport);

    let err = orchestrator
        .ask("Is anyone there?")
        .await
        .expect_err("missing choices should fail");

    assert!(matches!(
        err,
        OrchestratorError::Transport(TransportError::InvalidPayload(ref detail)) if detail == "missing_choice"
    ));
    assert_eq!(orchestrator.history().len(), 1);
}

#[tokio::test]
async fn repeated_failures_never_accumulate_turns() {
    let transport = ScriptedTransport::with_replies(vec![
        reply("first answer"),
        Err(TransportError::Timeout),
        Err(TransportError::Unauthorized("status=401 code=401".to_string())),
        Err(TransportError::InvalidPayload("response_json_parse_failed".to_string())),
    ]);
    let mut orchestrator = orchestrator_with(transport);

    orchestrator.ask("first").await.expect("exchange should succeed");
    let before = orchestrator.history().to_vec();

    for _ in 0..3 {
        orchestrator
            .ask("retry me")
            .await
            .expect_err("scripted failures should surface");
        assert_eq!(orchestrator.history(), before.as_slice());
    }
    assert_eq!(
        orchestrator
            .history()
            .iter()
            .filter(|turn| turn.role == Role::User)
            .count(),
        1
    );
}

#[tokio::test]
async fn abandoned_exchange_is_rolled_back_before_next_operation() {
    let mut orchestrator = orchestrator_with(Arc::new(NeverRespondingTransport));

    let timed_out =
        tokio::time::timeout(Duration::from_millis(20), orchestrator.ask("hello?")).await;
    assert!(timed_out.is_err(), "pending transport should never resolve");
    assert_eq!(orchestrator.state(), ExchangeState::Sending);
    assert_eq!(orchestrator.history().len(), 2);

    orchestrator.clear();

    assert_eq!(orchestrator.state(), ExchangeState::Idle);
    assert_eq!(orchestrator.history(), &[Turn::system(PERSONA)]);
}

#[tokio::test]
async fn store_round_trips_through_orchestrator() {
    let mut store = ConversationStore::init(PERSONA);
    store.append_user("earlier").expect("user turn should append");
    store.append_assistant("earlier answer");

    let transport = ScriptedTransport::with_replies(vec![reply("later answer")]);
    let mut orchestrator = QueryOrchestrator::new(
        store,
        &chat_config("zodiac-gpt"),
        grounding_config(),
        transport,
    );
    orchestrator.ask("later").await.expect("exchange should succeed");

    let store = orchestrator.into_store();
    assert_eq!(store.snapshot().len(), 5);
    assert_eq!(store.snapshot()[0], Turn::system(PERSONA));
}
