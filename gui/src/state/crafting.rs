use std::mem;

use color_eyre::Result;
use engine::comic::{ComicCrafter, ParsedStory, SectionLabel};
use iced::{
    Element, Length, Task,
    widget::{button, column, image, row, space, text, text_editor},
};
use log::warn;

use crate::{
    StringError, TryIntoExt, bold_text,
    context::Context,
    elem_list, italic_text,
    message::{Message, state_messages::Crafting as MyMessage},
    state::{OptionsMenu, State, StateCommand, cmd},
    top_level_container,
};

/// The main screen: prompt input on top, then the four generated
/// sections with their illustrations.
#[derive(Debug, Clone)]
pub struct Crafting {
    prompt_content: text_editor::Content,
    warning: Option<String>,
    phase: Phase,
}

#[derive(Debug, Clone, Default)]
enum Phase {
    #[default]
    Idle,
    GeneratingStory,
    GeneratingImages {
        story: ParsedStory,
        panels: [Panel; 4],
        next_label: usize,
        cost: Option<f64>,
    },
    Complete {
        story: ParsedStory,
        panels: [Panel; 4],
        cost: Option<f64>,
    },
}

#[derive(Debug, Clone, Default)]
enum Panel {
    #[default]
    Pending,
    Ready(image::Handle),
    Failed,
}

impl Crafting {
    pub fn new() -> Self {
        Self {
            prompt_content: text_editor::Content::default(),
            warning: None,
            phase: Phase::Idle,
        }
    }

    fn running(&self) -> bool {
        matches!(
            self.phase,
            Phase::GeneratingStory | Phase::GeneratingImages { .. }
        )
    }

    fn start_generation(&mut self, ctx: &Context) -> Result<StateCommand> {
        let prompt = self.prompt_content.text();
        if prompt.trim().is_empty() {
            self.warning = Some("Please enter a valid prompt.".into());
            return cmd::none();
        }

        let crafter = ctx.crafter()?.clone();
        self.warning = None;
        self.phase = Phase::GeneratingStory;

        cmd::task(Task::perform(
            async move {
                crafter
                    .generate_story(prompt.trim())
                    .await
                    .map_err(StringError::from)
            },
            |res| MyMessage::StoryReady(res).into(),
        ))
    }
}

impl State for Crafting {
    fn update(&mut self, event: Message, ctx: &mut Context) -> Result<StateCommand> {
        use MyMessage::*;
        match event.try_into_ex()? {
            UpdatePromptText(action) => {
                self.prompt_content.perform(action);
                cmd::none()
            }
            Generate => self.start_generation(ctx),
            StoryReady(res) => {
                let story = res.map_err(color_eyre::Report::new)?;
                if !story.parsed {
                    self.warning = Some("Could not parse story. Returning empty sections.".into());
                }

                let label = SectionLabel::ALL[0];
                let section = story.sections.get(label).to_string();
                let crafter = ctx.crafter()?.clone();
                self.phase = Phase::GeneratingImages {
                    story,
                    panels: Default::default(),
                    next_label: 0,
                    cost: None,
                };
                cmd::task(illustrate_task(crafter, label, section))
            }
            ImageReady(label, res) => match mem::take(&mut self.phase) {
                Phase::GeneratingImages {
                    story,
                    mut panels,
                    next_label,
                    mut cost,
                } => {
                    panels[label as usize] = match res {
                        Ok(img) => {
                            if let Some(c) = img.cost {
                                cost = Some(cost.unwrap_or(0.0) + c);
                            }
                            Panel::Ready(image::Handle::from_bytes(img.data))
                        }
                        Err(e) => {
                            warn!("Failed to generate image for {label}: {e}");
                            Panel::Failed
                        }
                    };

                    let next = next_label + 1;
                    if let Some(next_label) = SectionLabel::ALL.get(next).copied() {
                        let section = story.sections.get(next_label).to_string();
                        let crafter = ctx.crafter()?.clone();
                        self.phase = Phase::GeneratingImages {
                            story,
                            panels,
                            next_label: next,
                            cost,
                        };
                        cmd::task(illustrate_task(crafter, next_label, section))
                    } else {
                        self.phase = Phase::Complete { story, panels, cost };
                        cmd::none()
                    }
                }
                other => {
                    self.phase = other;
                    cmd::none()
                }
            },
            OpenOptions => cmd::transition(OptionsMenu),
        }
    }

    fn view<'a>(&'a self, _ctx: &'a Context) -> Element<'a, Message> {
        let mut items = Vec::from(elem_list![
            bold_text("AI ComicCrafter").size(30),
            text("Generate AI-driven comic stories with illustrations!"),
            space().height(10),
            text_editor(&self.prompt_content)
                .placeholder("Enter a comic story prompt...")
                .height(100)
                .on_action(|a| MyMessage::UpdatePromptText(a).into()),
            row![
                button("Generate Comic")
                    .on_press_maybe((!self.running()).then(|| MyMessage::Generate.into())),
                space().width(Length::Fill),
                button("Options").on_press(MyMessage::OpenOptions.into()),
            ],
        ]);

        if let Some(w) = &self.warning {
            items.push(text(w.as_str()).style(text::danger).into());
        }

        match &self.phase {
            Phase::Idle => {}
            Phase::GeneratingStory => {
                items.push(italic_text("Generating story...").into());
            }
            Phase::GeneratingImages { story, panels, .. } => {
                items.push(italic_text("Generating images...").into());
                push_sections(&mut items, story, panels);
            }
            Phase::Complete { story, panels, cost } => {
                push_sections(&mut items, story, panels);
                items.push(text("Comic generation complete!").style(text::success).into());
                if let Some(c) = cost {
                    items.push(italic_text(format!("Total image cost: ${c:.2}")).into());
                }
            }
        }

        top_level_container(column(items).spacing(12).width(Length::Fill)).into()
    }

    fn clone(&self) -> Box<dyn State> {
        Box::new(Clone::clone(self))
    }
}

fn illustrate_task(crafter: ComicCrafter, label: SectionLabel, section: String) -> Task<Message> {
    Task::perform(
        async move { crafter.illustrate(&section).await.map_err(StringError::from) },
        move |res| MyMessage::ImageReady(label, res).into(),
    )
}

fn push_sections<'a>(
    items: &mut Vec<Element<'a, Message>>,
    story: &'a ParsedStory,
    panels: &'a [Panel; 4],
) {
    for (label, section) in story.sections.iter() {
        items.push(bold_text(label.to_string()).size(20).into());
        let body = if section.is_empty() {
            "[No content generated]"
        } else {
            section
        };
        items.push(text(body).into());

        match &panels[label as usize] {
            Panel::Pending => items.push(italic_text("Waiting for illustration...").into()),
            Panel::Ready(handle) => {
                items.push(image(handle.clone()).width(Length::Fill).into());
                items.push(italic_text(format!("{label} Illustration")).into());
            }
            Panel::Failed => items.push(
                text(format!("Failed to generate image for {label}."))
                    .style(text::danger)
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;

    use engine::{
        comic::parse_sections,
        image_model::{Image, ImageModel},
        llm::{CompletionFuture, LLM, Request},
    };

    use super::*;
    use crate::context::Config;

    #[derive(Clone)]
    struct StubLLM;

    impl LLM for StubLLM {
        fn complete<'a>(&'a self, _req: Request) -> CompletionFuture<'a> {
            Box::pin(async { Ok(vec![]) })
        }

        fn clone(&self) -> Box<dyn LLM + Send + Sync + 'static> {
            Box::new(Clone::clone(self))
        }
    }

    #[derive(Clone)]
    struct StubImageModel;

    impl ImageModel for StubImageModel {
        fn get_image<'a>(
            &'a self,
            _prompt: &'a str,
            _guidance_scale: f32,
        ) -> Pin<Box<dyn Future<Output = Result<Image>> + Send + 'a>> {
            Box::pin(async {
                Ok(Image {
                    data: vec![0],
                    cost: None,
                })
            })
        }

        fn clone(&self) -> Box<dyn ImageModel + Send + Sync + 'static> {
            Box::new(Clone::clone(self))
        }
    }

    fn stub_context() -> Context {
        Context {
            config: Config::default(),
            crafter: Some(ComicCrafter::new(Box::new(StubLLM), Box::new(StubImageModel))),
        }
    }

    fn sample_story() -> ParsedStory {
        parse_sections("Introduction: a Storyline: b Climax: c Moral: d")
    }

    fn priced_image(cost: Option<f64>) -> Image {
        Image {
            data: vec![1, 2, 3],
            cost,
        }
    }

    #[test]
    fn failed_illustration_marks_only_its_own_panel() {
        let mut ctx = stub_context();
        let mut state = Crafting::new();

        let cmd = state
            .update(MyMessage::StoryReady(Ok(sample_story())).into(), &mut ctx)
            .unwrap();
        assert!(cmd.task.is_some());

        for label in SectionLabel::ALL {
            let res = if label == SectionLabel::Climax {
                Err(StringError("boom".into()))
            } else {
                Ok(priced_image(Some(0.05)))
            };
            state
                .update(MyMessage::ImageReady(label, res).into(), &mut ctx)
                .unwrap();
        }

        let Phase::Complete { panels, cost, .. } = &state.phase else {
            panic!("expected Complete, got {:?}", state.phase);
        };
        assert!(matches!(panels[0], Panel::Ready(_)));
        assert!(matches!(panels[1], Panel::Ready(_)));
        assert!(matches!(panels[2], Panel::Failed));
        assert!(matches!(panels[3], Panel::Ready(_)));

        let total = cost.unwrap();
        assert!((total - 0.15).abs() < 1e-9, "unexpected cost {total}");
    }

    #[test]
    fn empty_prompt_shows_warning_without_starting() {
        let mut ctx = stub_context();
        ctx.crafter = None;
        let mut state = Crafting::new();

        let cmd = state.update(MyMessage::Generate.into(), &mut ctx).unwrap();

        assert!(cmd.task.is_none());
        assert!(matches!(state.phase, Phase::Idle));
        assert!(state.warning.is_some());
    }

    #[test]
    fn unparsed_story_sets_warning_and_continues() {
        let mut ctx = stub_context();
        let mut state = Crafting::new();

        let story = ParsedStory {
            sections: Default::default(),
            parsed: false,
        };
        let cmd = state
            .update(MyMessage::StoryReady(Ok(story)).into(), &mut ctx)
            .unwrap();

        assert!(cmd.task.is_some());
        assert!(state.warning.is_some());
        assert!(matches!(state.phase, Phase::GeneratingImages { .. }));
    }
}
