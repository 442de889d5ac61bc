use super::{Completion, CompletionFuture, LLM, Request};

mod claude_api;
pub use claude_api::ClaudeApiError;

#[derive(Clone)]
pub struct Claude {
    pub api_key: String,
    pub model: String,
    pub client: reqwest::Client,
}

impl Claude {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

impl LLM for Claude {
    fn complete<'a>(&'a self, req: Request) -> CompletionFuture<'a> {
        let Request {
            system,
            prompt,
            max_tokens,
            sample,
            temperature,
            num_sequences,
        } = req;

        let claude_req = claude_api::Request {
            api_key: self.api_key.clone(),
            data: claude_api::RequestBody {
                model: self.model.clone(),
                system,
                messages: vec![claude_api::Message::user(prompt)],
                max_tokens,
                temperature: if sample { temperature } else { 0.0 },
            },
        };

        Box::pin(async move {
            // The Messages API produces one candidate per request, so
            // additional sequences cost additional round trips.
            let mut completions = Vec::with_capacity(num_sequences);
            for _ in 0..num_sequences {
                let res = claude_api::send_request(&claude_req, &self.client).await?;
                completions.push(Completion {
                    input_tokens: res.usage.input_tokens,
                    output_tokens: res.usage.output_tokens,
                    text: res.text(),
                });
            }
            Ok(completions)
        })
    }

    fn clone(&self) -> Box<dyn LLM + Send + Sync + 'static> {
        Box::new(Clone::clone(self))
    }
}
