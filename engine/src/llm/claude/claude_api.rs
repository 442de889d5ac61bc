use std::time::Duration;

use color_eyre::{Result, eyre::eyre};
use log::debug;
use reqwest::header::{self, HeaderValue};
use serde::{Deserialize, Serialize};

mod error;
pub use error::ClaudeApiError;

#[derive(Debug)]
pub struct Request {
    pub api_key: String,
    pub data: RequestBody,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RequestBody {
    pub model: String,
    pub messages: Vec<Message>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    pub max_tokens: usize,
    pub temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: String) -> Self {
        Self {
            role: "user".into(),
            content,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Response {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

impl Response {
    /// Concatenated text of all text blocks in the reply
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|b| b.block_type == "text")
            .map(|b| b.text.as_str())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,

    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

pub async fn send_request(req: &Request, client: &reqwest::Client) -> Result<Response> {
    let request = client
        .post("https://api.anthropic.com/v1/messages")
        .timeout(Duration::from_secs(60 * 3))
        .json(&req.data)
        .header("x-api-key", &req.api_key)
        .header("anthropic-version", HeaderValue::from_static("2023-06-01"))
        .header(header::ACCEPT, HeaderValue::from_static("application/json"));

    debug!("request: {request:#?}");
    let res = request.send().await?;

    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(parsed) => Err(
                ClaudeApiError::from_type(&parsed.error.error_type, parsed.error.message).into(),
            ),
            Err(_) => Err(eyre!("Anthropic error {status}: {body}")),
        };
    }

    Ok(res.json().await?)
}

#[cfg(test)]
mod test {
    use expect_test::expect;

    use super::*;

    #[test]
    fn request_serialization() {
        let body = RequestBody {
            model: "model".into(),
            system: None,
            messages: vec![Message::user("Some user msg".into())],
            max_tokens: 300,
            temperature: 0.8,
        };

        let expect = expect![[
            r#"{"model":"model","messages":[{"role":"user","content":"Some user msg"}],"max_tokens":300,"temperature":0.8}"#
        ]];
        expect.assert_eq(&serde_json::to_string(&body).unwrap());
    }

    #[test]
    fn response_text_skips_non_text_blocks() {
        let raw = r#"{
            "content": [
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": "Hello "},
                {"type": "text", "text": "world"}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }"#;

        let res: Response = serde_json::from_str(raw).unwrap();
        assert_eq!(res.text(), "Hello world");
        assert_eq!(res.usage.input_tokens, 10);
        assert_eq!(res.usage.output_tokens, 5);
    }
}
