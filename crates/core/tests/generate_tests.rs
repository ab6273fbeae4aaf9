//! DeepSeek client against a local one-shot HTTP responder
use std::time::Duration;

use metagen_core::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// Serves a single canned response and hands back the raw request it received.
async fn serve_once(status: &'static str, body: String) -> (Url, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });

    let url = Url::parse(&format!("http://{}/v1/chat/completions", addr)).unwrap();
    (url, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn completion(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

fn generator(url: Url) -> DeepSeekGenerator {
    let settings = GeneratorSettings {
        api_key: "sk-test".to_string(),
        api_url: url,
        model: metagen_core::config::DEFAULT_MODEL.to_string(),
        temperature: metagen_core::config::DEFAULT_TEMPERATURE,
        max_tokens: metagen_core::config::DEFAULT_MAX_TOKENS,
        timeout: Duration::from_secs(5),
    };
    DeepSeekGenerator::new(settings).unwrap()
}

#[tokio::test]
async fn test_generate_success_sends_contract() {
    let body = completion("```json\n{\"meta_keywords\":\"rome, city\",\"meta_description\":\"Discover Rome today.\"}\n```");
    let (url, server) = serve_once("200 OK", body).await;

    let meta = generator(url).generate("Rome", "Rome is a city.").await.unwrap();
    assert_eq!(meta.meta_keywords, "rome, city");
    assert_eq!(meta.meta_description, "Discover Rome today.");

    let request = server.await.unwrap();
    let lower = request.to_lowercase();
    assert!(request.starts_with("POST /v1/chat/completions"));
    assert!(lower.contains("authorization: bearer sk-test"));
    assert!(lower.contains("content-type: application/json"));

    let json_start = request.find("\r\n\r\n").unwrap() + 4;
    let payload: serde_json::Value = serde_json::from_str(&request[json_start..]).unwrap();
    assert_eq!(payload["model"], "deepseek-chat");
    assert_eq!(payload["max_tokens"], 200);
    assert_eq!(payload["response_format"]["type"], "json_object");
    assert_eq!(payload["messages"].as_array().unwrap().len(), 1);
    assert_eq!(payload["messages"][0]["role"], "user");
    let prompt = payload["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.contains("Rome is a city."));
}

#[tokio::test]
async fn test_generate_non_success_status() {
    let (url, server) = serve_once("429 Too Many Requests", r#"{"error":"rate limit"}"#.to_string()).await;

    let err = generator(url).generate("Rome", "text").await.unwrap_err();
    assert!(matches!(err, GenerationError::Status { status: 429, .. }));
    server.await.unwrap();
}

#[tokio::test]
async fn test_generate_commentary_is_rejected() {
    let body = completion("{\"meta_keywords\":\"a\",\"meta_description\":\"b\"}\nThese keywords should work well.");
    let (url, server) = serve_once("200 OK", body).await;

    let err = generator(url).generate("Rome", "text").await.unwrap_err();
    assert!(matches!(err, GenerationError::InvalidPayload(_)));
    server.await.unwrap();
}

#[tokio::test]
async fn test_generate_empty_choices() {
    let (url, server) = serve_once("200 OK", r#"{"choices":[]}"#.to_string()).await;

    let err = generator(url).generate("Rome", "text").await.unwrap_err();
    assert!(matches!(err, GenerationError::EmptyChoices));
    server.await.unwrap();
}

#[tokio::test]
async fn test_generate_non_json_body() {
    let (url, server) = serve_once("200 OK", "<html>gateway</html>".to_string()).await;

    let err = generator(url).generate("Rome", "text").await.unwrap_err();
    assert!(matches!(err, GenerationError::MalformedResponse(_)));
    server.await.unwrap();
}

#[tokio::test]
async fn test_generate_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = Url::parse(&format!("http://{}/v1/chat/completions", addr)).unwrap();
    let err = generator(url).generate("Rome", "text").await.unwrap_err();
    assert!(matches!(err, GenerationError::Http(_)));
}
