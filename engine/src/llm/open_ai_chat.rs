use color_eyre::eyre::{Context, eyre};
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Completion, CompletionFuture, LLM, Request};

/// Client for OpenAI-compatible chat completion endpoints, which
/// includes most locally hosted model servers.
#[derive(Debug, Clone)]
pub struct OpenAIChat {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAIChat {
    pub fn new(api_key: String, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.into(),
            model: model.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: usize,
    temperature: f32,
    n: usize,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

impl LLM for OpenAIChat {
    fn complete<'a>(&'a self, req: Request) -> CompletionFuture<'a> {
        Box::pin(async move {
            let mut messages = Vec::new();

            if let Some(system) = req.system {
                messages.push(OpenAIMessage {
                    role: "system",
                    content: system,
                });
            }

            messages.push(OpenAIMessage {
                role: "user",
                content: req.prompt,
            });

            let body = OpenAIChatRequest {
                model: self.model.clone(),
                messages,
                max_tokens: req.max_tokens,
                temperature: if req.sample { req.temperature } else { 0.0 },
                n: req.num_sequences,
            };

            let res = self
                .client
                .post(&self.base_url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
                .context("initial response")?;

            if !res.status().is_success() {
                let status = res.status();
                let body = res.text().await.unwrap_or_default();
                return Err(eyre!("OpenAI error {status}: {body}"));
            }

            debug!("OpenAI response:\n{res:#?}");
            let parsed: OpenAIChatResponse = res.json().await?;

            // usage counts are reported for the request as a whole
            let (input_tokens, output_tokens) = parsed
                .usage
                .map(|u| (u.prompt_tokens, u.completion_tokens))
                .unwrap_or((0, 0));

            Ok(parsed
                .choices
                .into_iter()
                .map(|c| Completion {
                    input_tokens,
                    output_tokens,
                    text: c.message.content.unwrap_or_default(),
                })
                .collect())
        })
    }

    fn clone(&self) -> Box<dyn LLM + Send + Sync + 'static> {
        Box::new(Clone::clone(self))
    }
}

#[cfg(test)]
mod test {
    use expect_test::expect;

    use super::*;

    #[test]
    fn request_serialization() {
        let body = OpenAIChatRequest {
            model: "gpt-neo".into(),
            messages: vec![OpenAIMessage {
                role: "user",
                content: "Some user msg".into(),
            }],
            max_tokens: 300,
            temperature: 0.8,
            n: 1,
        };

        let expect = expect![[
            r#"{"model":"gpt-neo","messages":[{"role":"user","content":"Some user msg"}],"max_tokens":300,"temperature":0.8,"n":1}"#
        ]];
        expect.assert_eq(&serde_json::to_string(&body).unwrap());
    }
}
