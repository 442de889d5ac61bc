use std::pin::Pin;

use color_eyre::Result;

pub trait LLM {
    fn complete<'a>(&'a self, req: Request) -> CompletionFuture<'a>;
    fn clone(&self) -> Box<dyn LLM + Send + Sync + 'static>;
}

pub type CompletionFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<Completion>>> + Send + 'a>>;

/// A single text-generation call. `num_sequences` candidates are
/// returned, in the order the backend produced them.
#[derive(Debug, Clone)]
pub struct Request {
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: usize,
    pub sample: bool,
    pub temperature: f32,
    pub num_sequences: usize,
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub text: String,
}

mod claude;
pub use claude::Claude;

mod open_ai_chat;
pub use open_ai_chat::OpenAIChat;
