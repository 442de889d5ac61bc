use derive_more::{From, TryInto};

#[derive(Debug, Clone, From, TryInto)]
pub enum Message {
    Crafting(state_messages::Crafting),
    OptionsMenu(state_messages::OptionsMenu),
    MessageDialog(state_messages::MessageDialog),
}

pub mod state_messages {
    use engine::{
        comic::{ParsedStory, SectionLabel},
        image_model,
    };
    use iced::widget::text_editor;

    use crate::{StringError, context::TextModelProvider};

    #[derive(Debug, Clone)]
    pub enum Crafting {
        UpdatePromptText(text_editor::Action),
        Generate,
        StoryReady(Result<ParsedStory, StringError>),
        ImageReady(SectionLabel, Result<image_model::Image, StringError>),
        OpenOptions,
    }

    #[derive(Debug, Clone)]
    pub enum OptionsMenu {
        SelectTextModel(TextModelProvider),
        ClaudeTokenChanged(String),
        ClaudeModelChanged(String),
        OpenAiTokenChanged(String),
        OpenAiBaseUrlChanged(String),
        OpenAiModelChanged(String),
        ImgModelTokenChanged(image_model::ModelProvider, String),
        SelectImageModel(image_model::Model),
        Ok,
    }

    #[derive(Debug, Clone)]
    pub enum MessageDialog {
        Confirm,
        EditAction(text_editor::Action),
    }
}
