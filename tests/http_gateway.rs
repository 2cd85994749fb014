//! HTTP gateway integration tests
//!
//! Runs the gateway against a local mock server and checks both the requests
//! it sends and how it decodes the backend's responses.

use serde_json::json;
use std::sync::Arc;
use toolsession::backend::{BackendGateway, ChatMessage, HttpGateway, HttpGatewayConfig};
use toolsession::domain::{Role, ToolOrigin};
use toolsession::error::{Result, SessionError};
use toolsession::ingest::{ProvenanceLedger, ToolIngestionPipeline};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn gateway(server: &MockServer) -> Result<HttpGateway> {
    HttpGateway::new(HttpGatewayConfig::with_base_url(format!("{}/api", server.uri())))
}

/// Integration test: chat sends the full history and decodes tool calls
#[tokio::test]
async fn test_chat_request_and_tool_calls() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Sent!",
            "tool_calls": [
                {"id": "c1", "type": "function", "function": {"name": "send_mail", "arguments": "{\"to\":\"a@b.c\"}"}},
                {"id": "c2", "toolName": "take_a_picture", "argumentsPayload": {"camera": 0}}
            ],
            "debug_logs": ["[INFO] routing"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gw = gateway(&server).await?;
    let history = vec![
        ChatMessage::new("hi", Role::User),
        ChatMessage::new("hello", Role::Assistant),
        ChatMessage::new("mail bob", Role::User),
    ];
    let reply = gw.chat(&history).await?;

    assert_eq!(reply.response, "Sent!");
    assert_eq!(reply.invocations.len(), 2);
    assert_eq!(reply.invocations[0].tool_name, "send_mail");
    assert_eq!(reply.invocations[0].arguments_payload, "{\"to\":\"a@b.c\"}");
    assert_eq!(reply.invocations[1].tool_name, "take_a_picture");
    assert_eq!(reply.invocations[1].arguments_payload, "{\"camera\":0}");
    assert_eq!(reply.debug_logs, vec!["[INFO] routing".to_string()]);

    let requests = server.received_requests().await.unwrap();
    let body = requests[0].body_json::<serde_json::Value>().unwrap();
    assert_eq!(
        body,
        json!({"messages": [
            {"text": "hi", "role": "user"},
            {"text": "hello", "role": "assistant"},
            {"text": "mail bob", "role": "user"}
        ]})
    );

    Ok(())
}

/// Integration test: a missing tool_calls field means no invocations
#[tokio::test]
async fn test_chat_without_tool_calls() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "Hi there"})))
        .mount(&server)
        .await;

    let reply = gateway(&server).await?.chat(&[ChatMessage::new("hi", Role::User)]).await?;
    assert_eq!(reply.response, "Hi there");
    assert!(reply.invocations.is_empty());
    assert!(reply.debug_logs.is_empty());

    Ok(())
}

/// Integration test: an error body's detail becomes the request error detail
#[tokio::test]
async fn test_error_detail_surfaces() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tools/from-git"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "duplicate name"})))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .await?
        .import_from_git("https://github.com/u/r/blob/main/x.py")
        .await
        .unwrap_err();

    match &err {
        SessionError::Request { status, detail } => {
            assert_eq!(*status, 400);
            assert_eq!(detail.as_deref(), Some("duplicate name"));
        }
        other => panic!("Expected request error, got {:?}", other),
    }
    assert_eq!(err.user_message("Failed to add tool from git"), "duplicate name");

    Ok(())
}

/// Integration test: an error without a JSON body falls back to the generic message
#[tokio::test]
async fn test_error_without_detail() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tools/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let err = gateway(&server).await?.generate_tool("jokes").await.unwrap_err();
    assert!(matches!(err, SessionError::Request { status: 500, detail: None }));
    assert_eq!(err.user_message("Failed to generate code"), "Failed to generate code");

    Ok(())
}

/// Integration test: tool names are percent-encoded into the source path
#[tokio::test]
async fn test_tool_source_path_encoding() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/tools/.+/code$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": "def my_tool(): ..."})))
        .mount(&server)
        .await;

    let code = gateway(&server).await?.tool_source("my tool").await?;
    assert_eq!(code, "def my_tool(): ...");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.path(), "/api/tools/my%20tool/code");

    Ok(())
}

/// Integration test: legacy listing flags map onto origins
#[tokio::test]
async fn test_listing_legacy_flags() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tools"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tools": [
            {"name": "send_mail", "description": "Send an email", "parameters": [{"name": "to", "type": "string"}]},
            {"name": "joke", "description": "Tell a joke", "isCustom": true},
            {"name": "weather.py", "description": "GitHub tool", "isCustom": true, "isGitHub": true,
             "url": "https://github.com/u/r/blob/main/weather.py"}
        ]})))
        .mount(&server)
        .await;

    let listings = gateway(&server).await?.list_tools().await?;
    let tools = ProvenanceLedger::new().resolve_all(listings);

    assert_eq!(tools[0].origin, ToolOrigin::Builtin);
    assert_eq!(tools[0].parameters[0].param_type, "string");
    assert_eq!(tools[1].origin, ToolOrigin::Custom);
    assert_eq!(tools[2].origin, ToolOrigin::Git);
    assert_eq!(
        tools[2].source_ref.as_deref(),
        Some("https://github.com/u/r/blob/main/weather.py")
    );

    Ok(())
}

/// Integration test: pasting over HTTP registers the tool and refreshes the registry
#[tokio::test]
async fn test_paste_pipeline_over_http() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tools/add"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "Successfully added tool: joke", "name": "joke"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tools"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tools": [
            {"name": "send_mail", "description": "Send an email"},
            {"name": "joke", "description": "Tell a joke", "isCustom": true}
        ]})))
        .mount(&server)
        .await;

    let pipeline = ToolIngestionPipeline::new(Arc::new(gateway(&server).await?));
    let reply = pipeline.submit_paste("def joke(): ...").await?;
    assert_eq!(reply.name, "joke");

    let registry = pipeline.registry().await;
    assert_eq!(registry.names(), vec!["joke", "send_mail"]);

    let requests = server.received_requests().await.unwrap();
    let add = requests.iter().find(|r| r.url.path() == "/api/tools/add").unwrap();
    assert_eq!(add.body_json::<serde_json::Value>().unwrap(), json!({"code": "def joke(): ..."}));

    Ok(())
}
