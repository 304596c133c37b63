//! End-to-end editor protocol tests over a real WebSocket connection.

use arsenal_editor::{create_router, EditorConfig, EditorState};
use arsenal_llm::providers::mock::MockCompletionParser;
use arsenal_llm::ParserRegistry;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;

type WsClient = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn start_server(config_path: Option<PathBuf>) -> String {
    let registry = Arc::new(ParserRegistry::new());
    registry
        .register(Arc::new(MockCompletionParser::new("mock")), None)
        .unwrap();

    let config = EditorConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        config_path,
    };
    let state = Arc::new(EditorState::new(config, registry));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("ws://{}/ws", addr)
}

async fn connect(url: &str) -> WsClient {
    let (client, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    client
}

async fn send(client: &mut WsClient, frame: Value) {
    client
        .send(Message::Text(frame.to_string()))
        .await
        .unwrap();
}

async fn next_json(client: &mut WsClient) -> Value {
    loop {
        match client.next().await.expect("connection closed").unwrap() {
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            _ => continue,
        }
    }
}

#[tokio::test]
async fn test_status_add_run_roundtrip() {
    let url = start_server(None).await;
    let mut client = connect(&url).await;

    send(
        &mut client,
        json!({"command": {"command_name": "get_instance_status"}}),
    )
    .await;
    let response = next_json(&mut client).await;
    assert_eq!(response["is_success"], json!(true));
    assert_eq!(response["data"]["status"], json!("OK"));
    let instance_id = response["instance_id"].as_str().unwrap().to_string();

    send(
        &mut client,
        json!({"command": {
            "command_name": "add_prompt",
            "prompt_name": "p1",
            "prompt_data": {
                "name": "p1",
                "input": "greet {{name}}",
                "metadata": {"model": "mock"}
            }
        }}),
    )
    .await;
    let response = next_json(&mut client).await;
    assert_eq!(response["is_success"], json!(true));
    assert_eq!(response["instance_id"].as_str().unwrap(), instance_id);
    assert_eq!(response["aiconfig"]["prompts"][0]["name"], json!("p1"));

    send(
        &mut client,
        json!({"command": {
            "command_name": "run",
            "prompt_name": "p1",
            "params": {"name": "World"}
        }}),
    )
    .await;
    let response = next_json(&mut client).await;
    assert_eq!(response["is_success"], json!(true));
    assert_eq!(
        response["data"]["outputs"][0]["data"],
        json!("echo: greet World")
    );
}

#[tokio::test]
async fn test_streaming_run_interleaves_chunks() {
    let url = start_server(None).await;
    let mut client = connect(&url).await;

    send(
        &mut client,
        json!({"command": {
            "command_name": "add_prompt",
            "prompt_name": "p1",
            "prompt_data": {
                "name": "p1",
                "input": "a fairly long template body",
                "metadata": {"model": "mock"}
            }
        }}),
    )
    .await;
    next_json(&mut client).await;

    send(
        &mut client,
        json!({"command": {
            "command_name": "run",
            "prompt_name": "p1",
            "stream": true
        }}),
    )
    .await;

    let mut chunk_count = 0;
    loop {
        let frame = next_json(&mut client).await;
        if frame.get("output_chunk").is_some() {
            chunk_count += 1;
            continue;
        }
        assert_eq!(frame["is_success"], json!(true));
        break;
    }
    assert!(chunk_count >= 2, "expected chunk frames before the response");
}

#[tokio::test]
async fn test_parameter_commands_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.json");

    let url = start_server(None).await;
    let mut client = connect(&url).await;

    send(
        &mut client,
        json!({"command": {
            "command_name": "set_parameter",
            "parameter_name": "city",
            "parameter_value": "Rotterdam"
        }}),
    )
    .await;
    let response = next_json(&mut client).await;
    assert_eq!(
        response["aiconfig"]["metadata"]["parameters"]["city"],
        json!("Rotterdam")
    );

    send(
        &mut client,
        json!({"command": {"command_name": "set_name", "name": "renamed"}}),
    )
    .await;
    next_json(&mut client).await;

    send(
        &mut client,
        json!({"command": {"command_name": "save", "path": path}}),
    )
    .await;
    let response = next_json(&mut client).await;
    assert_eq!(response["is_success"], json!(true));

    let saved: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["name"], json!("renamed"));
    assert_eq!(saved["metadata"]["parameters"]["city"], json!("Rotterdam"));
}

#[tokio::test]
async fn test_disconnect_saves_bound_instance() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let url = start_server(Some(path.clone())).await;
    let mut client = connect(&url).await;

    // Initialization created the file for a fresh instance.
    send(
        &mut client,
        json!({"command": {"command_name": "get_instance_status"}}),
    )
    .await;
    next_json(&mut client).await;
    assert!(path.exists());

    send(
        &mut client,
        json!({"command": {
            "command_name": "add_prompt",
            "prompt_name": "kept",
            "prompt_data": {"name": "kept", "input": "persisted on close"}
        }}),
    )
    .await;
    next_json(&mut client).await;

    client.close(None).await.unwrap();

    // The final save lands shortly after the close frame.
    let mut saved = Value::Null;
    for _ in 0..40 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let contents = std::fs::read_to_string(&path).unwrap();
        saved = serde_json::from_str(&contents).unwrap();
        if saved["prompts"][0]["name"] == json!("kept") {
            break;
        }
    }
    assert_eq!(saved["prompts"][0]["name"], json!("kept"));
}

#[tokio::test]
async fn test_unknown_command_is_reported_not_fatal() {
    let url = start_server(None).await;
    let mut client = connect(&url).await;

    send(&mut client, json!({"command": {"command_name": "warp"}})).await;
    let response = next_json(&mut client).await;
    assert_eq!(response["is_success"], json!(false));
    assert!(response["message"]
        .as_str()
        .unwrap()
        .contains("Malformed command"));

    send(
        &mut client,
        json!({"command": {"command_name": "get_instance_status"}}),
    )
    .await;
    assert_eq!(next_json(&mut client).await["is_success"], json!(true));
}
