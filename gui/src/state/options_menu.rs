use color_eyre::Result;
use iced::{
    Length,
    widget::{button, column, radio, row, space, text, text_input},
};
use strum::IntoEnumIterator;

use crate::{
    TryIntoExt, bold_text,
    context::{Context, TextModelProvider},
    elem_list,
    message::{Message, state_messages::OptionsMenu as MyMessage},
    save_config,
    state::{Crafting, State, StateCommand, cmd},
    top_level_container,
};
use engine::image_model;

#[derive(Debug, Clone)]
pub struct OptionsMenu;

impl State for OptionsMenu {
    fn update(&mut self, event: Message, ctx: &mut Context) -> Result<StateCommand> {
        let msg: MyMessage = event.try_into_ex()?;

        use MyMessage::*;
        match msg {
            SelectTextModel(provider) => {
                ctx.config.current_text_model = provider;
                cmd::none()
            }

            ClaudeTokenChanged(val) => {
                ctx.config.claude_token = val;
                cmd::none()
            }

            ClaudeModelChanged(val) => {
                ctx.config.claude_model = val;
                cmd::none()
            }

            OpenAiTokenChanged(val) => {
                ctx.config.openai_token = val;
                cmd::none()
            }

            OpenAiBaseUrlChanged(val) => {
                ctx.config.openai_base_url = val;
                cmd::none()
            }

            OpenAiModelChanged(val) => {
                ctx.config.openai_model = val;
                cmd::none()
            }

            ImgModelTokenChanged(provider, val) => {
                ctx.config.img_model_tokens.insert(provider, val);
                cmd::none()
            }

            SelectImageModel(model) => {
                ctx.config.current_img_model = model;
                cmd::none()
            }

            Ok => {
                save_config(&ctx.config)?;
                ctx.rebuild_crafter();
                cmd::transition(Crafting::new())
            }
        }
    }

    fn view<'a>(&'a self, ctx: &'a Context) -> iced::Element<'a, Message> {
        let mut items = Vec::from(elem_list![
            bold_text("Options").width(Length::Fill).center(),
            space().height(20),
            text("Active Text Model"),
            column(TextModelProvider::iter().map(|p| {
                radio(
                    p.to_string(),
                    p,
                    Some(ctx.config.current_text_model),
                    |p| MyMessage::SelectTextModel(p).into(),
                )
                .into()
            }))
            .spacing(10),
        ]);

        match ctx.config.current_text_model {
            TextModelProvider::Claude => items.extend(elem_list![
                text("Anthropic (Claude) API Key"),
                text_input("sk-ant-...", &ctx.config.claude_token,)
                    .on_input(|s| MyMessage::ClaudeTokenChanged(s).into())
                    .width(Length::Fill),
                text("Claude Model"),
                text_input("claude-...", &ctx.config.claude_model,)
                    .on_input(|s| MyMessage::ClaudeModelChanged(s).into())
                    .width(Length::Fill),
            ]),
            TextModelProvider::OpenAIChat => items.extend(elem_list![
                text("Chat Completions URL"),
                text_input("https://.../v1/chat/completions", &ctx.config.openai_base_url,)
                    .on_input(|s| MyMessage::OpenAiBaseUrlChanged(s).into())
                    .width(Length::Fill),
                text("Model"),
                text_input("gpt-...", &ctx.config.openai_model,)
                    .on_input(|s| MyMessage::OpenAiModelChanged(s).into())
                    .width(Length::Fill),
                text("API Key (leave empty for local servers)"),
                text_input("sk-...", &ctx.config.openai_token,)
                    .on_input(|s| MyMessage::OpenAiTokenChanged(s).into())
                    .width(Length::Fill),
            ]),
        }

        items.extend(elem_list![
            space().height(20),
            text("Active Image Model"),
            column(image_model::Model::iter().map(|m| {
                radio(
                    format!("{m} ({})", m.provider()),
                    m,
                    Some(ctx.config.current_img_model),
                    |m| MyMessage::SelectImageModel(m).into(),
                )
                .into()
            }))
            .spacing(10),
            space().height(20),
            bold_text("Image Model API Keys"),
        ]);

        for provider in image_model::ModelProvider::iter() {
            let value = ctx
                .config
                .img_model_tokens
                .get(&provider)
                .map(String::as_str)
                .unwrap_or("");

            items.push(text(format!("{provider}")).into());
            items.push(
                text_input("API token", value)
                    .on_input(move |s| MyMessage::ImgModelTokenChanged(provider, s).into())
                    .width(Length::Fill)
                    .into(),
            );
        }

        items.push(space().height(30).into());
        items.push(row![button("Ok").on_press(MyMessage::Ok.into())].into());

        top_level_container(
            column(items)
                .spacing(12)
                .width(Length::Fill)
                .height(Length::Fill),
        )
        .into()
    }

    fn clone(&self) -> Box<dyn State> {
        Box::new(Clone::clone(self))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::Config;

    #[test]
    fn options_edit_the_config_in_place() {
        let mut ctx = Context {
            config: Config::default(),
            crafter: None,
        };
        let mut state = OptionsMenu;

        state
            .update(
                MyMessage::SelectTextModel(TextModelProvider::OpenAIChat).into(),
                &mut ctx,
            )
            .unwrap();
        state
            .update(
                MyMessage::OpenAiBaseUrlChanged("http://localhost:8080/v1/chat/completions".into()).into(),
                &mut ctx,
            )
            .unwrap();
        state
            .update(MyMessage::OpenAiModelChanged("llama-3".into()).into(), &mut ctx)
            .unwrap();

        assert_eq!(ctx.config.current_text_model, TextModelProvider::OpenAIChat);
        assert_eq!(
            ctx.config.openai_base_url,
            "http://localhost:8080/v1/chat/completions"
        );
        assert_eq!(ctx.config.openai_model, "llama-3");
        assert!(ctx.config.get_llm().is_ok());
    }
}
