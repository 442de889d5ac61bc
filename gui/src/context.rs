use std::collections::BTreeMap;

use color_eyre::{Result, eyre::ensure};
use engine::{
    ImgModBox, LLMBox,
    comic::ComicCrafter,
    image_model,
    llm::{Claude, OpenAIChat},
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::{CLAUDE_MODEL, OPENAI_CHAT_URL, OPENAI_MODEL};

/// Process-wide state shared by all GUI states. The model handles are
/// built once from the config instead of being initialized lazily on
/// first use.
pub struct Context {
    pub config: Config,
    pub crafter: Option<ComicCrafter>,
}

impl Context {
    pub fn from_config(config: Config) -> Self {
        let crafter = config.make_crafter().ok();
        Self { config, crafter }
    }

    /// Recreates the model handles after the config changed
    pub fn rebuild_crafter(&mut self) {
        self.crafter = self.config.make_crafter().ok();
    }

    pub fn crafter(&self) -> Result<&ComicCrafter> {
        self.crafter.as_ref().ok_or_else(|| {
            color_eyre::eyre::eyre!(
                "The models are not configured. Please set the API keys in the options menu."
            )
        })
    }
}

/// Which backend writes the stories
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumIter, Serialize, Deserialize,
)]
pub enum TextModelProvider {
    #[default]
    #[strum(to_string = "Anthropic (Claude)")]
    Claude,
    #[strum(to_string = "OpenAI-compatible")]
    OpenAIChat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub current_text_model: TextModelProvider,
    pub claude_token: String,
    pub claude_model: String,
    pub openai_token: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub img_model_tokens: BTreeMap<image_model::ModelProvider, String>,
    pub current_img_model: image_model::Model,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            current_text_model: TextModelProvider::default(),
            claude_token: String::new(),
            claude_model: CLAUDE_MODEL.into(),
            openai_token: String::new(),
            openai_base_url: OPENAI_CHAT_URL.into(),
            openai_model: OPENAI_MODEL.into(),
            img_model_tokens: BTreeMap::new(),
            current_img_model: image_model::Model::default(),
        }
    }
}

impl Config {
    pub fn get_llm(&self) -> Result<LLMBox> {
        match self.current_text_model {
            TextModelProvider::Claude => {
                ensure!(
                    !self.claude_token.trim().is_empty(),
                    "Anthropic API key is not set"
                );
                Ok(Box::new(Claude::new(
                    self.claude_token.clone(),
                    self.claude_model.clone(),
                )))
            }
            // no key check: local OpenAI-compatible servers run without one
            TextModelProvider::OpenAIChat => {
                ensure!(
                    !self.openai_base_url.trim().is_empty(),
                    "OpenAI-compatible base URL is not set"
                );
                Ok(Box::new(OpenAIChat::new(
                    self.openai_token.clone(),
                    self.openai_base_url.clone(),
                    self.openai_model.clone(),
                )))
            }
        }
    }

    pub fn get_image_model(&self) -> Result<ImgModBox> {
        let provider = self.current_img_model.provider();
        let key = self
            .img_model_tokens
            .get(&provider)
            .map(String::as_str)
            .unwrap_or("");
        ensure!(!key.trim().is_empty(), "No API key for {provider}");
        Ok(self.current_img_model.make(key.to_string()))
    }

    pub fn make_crafter(&self) -> Result<ComicCrafter> {
        Ok(ComicCrafter::new(self.get_llm()?, self.get_image_model()?))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn get_llm_uses_the_selected_provider() {
        let mut cfg = Config::default();

        // Claude needs a key, an OpenAI-compatible server does not
        assert!(cfg.get_llm().is_err());
        cfg.claude_token = "sk-ant-123".into();
        assert!(cfg.get_llm().is_ok());

        cfg.current_text_model = TextModelProvider::OpenAIChat;
        assert!(cfg.get_llm().is_ok());
    }

    #[test]
    fn get_llm_reports_missing_settings() {
        let cfg = Config::default();
        let err = cfg.get_llm().err().unwrap();
        assert!(err.to_string().contains("Anthropic API key"));

        let cfg = Config {
            current_text_model: TextModelProvider::OpenAIChat,
            openai_base_url: String::new(),
            ..Config::default()
        };
        let err = cfg.get_llm().err().unwrap();
        assert!(err.to_string().contains("base URL"));
    }
}
