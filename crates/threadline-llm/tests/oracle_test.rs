use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use threadline_llm::{
    CompletionClient, CompletionOracle, GenerateRequest, GenerateResponse, UNREADABLE_RESPONSE_TEXT,
};

enum Script {
    Text(&'static str),
    NoText,
    Fail,
}

struct ScriptedClient {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedClient {
    fn new(script: Script) -> Arc<Self> {
        Arc::new(Self { script, calls: AtomicUsize::new(0) })
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn generate(&self, _request: GenerateRequest) -> Result<GenerateResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script {
            Script::Text(text) => Ok(GenerateResponse {
                text: Some(text.to_string()),
                finish_reason: None,
                usage: None,
                raw: serde_json::Value::Null,
            }),
            Script::NoText => Ok(GenerateResponse {
                text: None,
                finish_reason: None,
                usage: None,
                raw: serde_json::Value::Null,
            }),
            Script::Fail => anyhow::bail!("connection refused"),
        }
    }

    fn provider_name(&self) -> &str {
        "Scripted"
    }
}

#[tokio::test]
async fn test_complete_returns_text() {
    let client = ScriptedClient::new(Script::Text("Hello there"));
    let oracle = CompletionOracle::new(client.clone());

    assert_eq!(oracle.complete("hi").await, "Hello there");
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_complete_without_text_uses_unreadable_text() {
    let oracle = CompletionOracle::new(ScriptedClient::new(Script::NoText));

    assert_eq!(oracle.complete("hi").await, UNREADABLE_RESPONSE_TEXT);
}

#[tokio::test]
async fn test_complete_never_raises_on_hard_failure() {
    let oracle = CompletionOracle::new(ScriptedClient::new(Script::Fail));

    assert_eq!(
        oracle.complete("hi").await,
        "Something went wrong while contacting Scripted."
    );
    assert_eq!(oracle.fallback_text(), "Something went wrong while contacting Scripted.");
}

#[tokio::test]
async fn test_try_complete_distinguishes_failure_from_empty() {
    let failing = CompletionOracle::new(ScriptedClient::new(Script::Fail));
    assert!(failing.try_complete("hi").await.is_err());

    let empty = CompletionOracle::new(ScriptedClient::new(Script::Text("")));
    assert_eq!(empty.try_complete("hi").await.unwrap(), None);
}
