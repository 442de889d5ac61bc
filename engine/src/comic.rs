use color_eyre::{
    Result,
    eyre::{ensure, eyre},
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::{
    ImgModBox, LLMBox,
    image_model::Image,
    llm::Request,
};

pub const STORY_TEMPERATURE: f32 = 0.8;
pub const STORY_MAX_TOKENS: usize = 300;
pub const IMAGE_GUIDANCE_SCALE: f32 = 5.0;
pub const IMAGE_STYLE_PREFIX: &str = "Comic book style, vibrant and detailed: ";

/// The four fixed headings that structure a generated comic story.
/// They are used both to instruct the text model and to delimit its
/// output.
#[derive(Debug, Clone, Copy, Display, Serialize, Deserialize, Hash, PartialEq, Eq)]
pub enum SectionLabel {
    Introduction,
    Storyline,
    Climax,
    Moral,
}

impl SectionLabel {
    pub const ALL: [SectionLabel; 4] = [
        SectionLabel::Introduction,
        SectionLabel::Storyline,
        SectionLabel::Climax,
        SectionLabel::Moral,
    ];

    /// The literal token that delimits this section in model output
    pub fn delimiter(&self) -> &'static str {
        match self {
            SectionLabel::Introduction => "Introduction:",
            SectionLabel::Storyline => "Storyline:",
            SectionLabel::Climax => "Climax:",
            SectionLabel::Moral => "Moral:",
        }
    }
}

/// The four story sections in label order. All four entries are always
/// present; a section whose label was missing from the model output is
/// the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorySections([String; 4]);

impl StorySections {
    pub fn get(&self, label: SectionLabel) -> &str {
        &self.0[label as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (SectionLabel, &str)> {
        SectionLabel::ALL
            .into_iter()
            .zip(self.0.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStory {
    pub sections: StorySections,

    /// false means the raw text could not be parsed at all. The
    /// sections are all empty in that case.
    pub parsed: bool,
}

/// Splits raw model output into the four labeled sections.
///
/// Each `Label:` token is located with a case-insensitive scan, and a
/// section's content is the text between its token and the next found
/// token (or the end of the text). A label that never appears yields
/// an empty section. The one exception is `Introduction:`: without it
/// there is no anchor to split on, so the whole result counts as
/// unparsed and every section is empty.
pub fn parse_sections(raw: &str) -> ParsedStory {
    let mut offsets = [None; 4];
    let mut cursor = 0;
    for (i, label) in SectionLabel::ALL.iter().enumerate() {
        if let Some(pos) = find_ignore_ascii_case(&raw[cursor..], label.delimiter()) {
            let abs = cursor + pos;
            offsets[i] = Some(abs);
            cursor = abs + label.delimiter().len();
        }
    }

    if offsets[0].is_none() {
        warn!("Could not parse story, returning empty sections");
        return ParsedStory {
            sections: StorySections::default(),
            parsed: false,
        };
    }

    let mut sections = <[String; 4]>::default();
    for (i, label) in SectionLabel::ALL.iter().enumerate() {
        let Some(offset) = offsets[i] else { continue };
        let start = offset + label.delimiter().len();
        let end = offsets[i + 1..]
            .iter()
            .flatten()
            .next()
            .copied()
            .unwrap_or(raw.len());
        sections[i] = raw[start..end].trim().to_string();
    }

    ParsedStory {
        sections: StorySections(sections),
        parsed: true,
    }
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}

/// Holds the two model handles and runs the generation pipeline:
/// one text call parsed into sections, then one image call per
/// section.
pub struct ComicCrafter {
    llm: LLMBox,
    imgmod: ImgModBox,
}

impl Clone for ComicCrafter {
    fn clone(&self) -> Self {
        Self {
            llm: self.llm.clone(),
            imgmod: self.imgmod.clone(),
        }
    }
}

impl ComicCrafter {
    pub fn new(llm: LLMBox, imgmod: ImgModBox) -> Self {
        Self { llm, imgmod }
    }

    /// The instruction sent to the text model: the user prompt wrapped
    /// in a template that asks for exactly the four labeled sections.
    pub fn story_request(user_prompt: &str) -> Request {
        let prompt = indoc::formatdoc! {"
            Write a short comic-style story based on: {user_prompt}.
            Format it as follows:
            Introduction:
            Storyline:
            Climax:
            Moral:
        "};

        Request {
            system: None,
            prompt,
            max_tokens: STORY_MAX_TOKENS,
            sample: true,
            temperature: STORY_TEMPERATURE,
            num_sequences: 1,
        }
    }

    /// Generates the story text and parses it. A story that cannot be
    /// parsed is not an error; the result carries empty sections and
    /// `parsed == false`. Text model failures propagate.
    pub async fn generate_story(&self, user_prompt: &str) -> Result<ParsedStory> {
        ensure!(
            !user_prompt.trim().is_empty(),
            "Story prompt must not be empty"
        );

        info!("Generating story");
        let completions = self.llm.complete(Self::story_request(user_prompt)).await?;
        let completion = completions
            .into_iter()
            .next()
            .ok_or_else(|| eyre!("Text model returned no completions"))?;

        debug!("Raw story text:\n{}", completion.text);
        Ok(parse_sections(&completion.text))
    }

    /// Generates one illustration for a section. The caller decides
    /// what a failure means; the remaining sections are unaffected.
    pub async fn illustrate(&self, section_text: &str) -> Result<Image> {
        let prompt = format!("{IMAGE_STYLE_PREFIX}{section_text}");
        self.imgmod.get_image(&prompt, IMAGE_GUIDANCE_SCALE).await
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;

    fn section_strings(story: &ParsedStory) -> [&str; 4] {
        [
            story.sections.get(SectionLabel::Introduction),
            story.sections.get(SectionLabel::Storyline),
            story.sections.get(SectionLabel::Climax),
            story.sections.get(SectionLabel::Moral),
        ]
    }

    #[test]
    fn parses_all_four_sections() {
        let raw =
            "Introduction:\nA hero appears.\nStoryline:\nThey fight.\nClimax:\nVictory.\nMoral:\nBe brave.";
        let story = parse_sections(raw);

        assert!(story.parsed);
        assert_eq!(
            section_strings(&story),
            ["A hero appears.", "They fight.", "Victory.", "Be brave."]
        );
    }

    #[test]
    fn no_labels_at_all_fails() {
        let story = parse_sections("Once upon a time there was no structure whatsoever.");
        assert!(!story.parsed);
        assert_eq!(section_strings(&story), ["", "", "", ""]);
    }

    #[test]
    fn missing_introduction_discards_later_labels() {
        let story = parse_sections("Storyline:\nThey fight.\nMoral:\nBe brave.");
        assert!(!story.parsed);
        assert_eq!(section_strings(&story), ["", "", "", ""]);
    }

    #[test]
    fn missing_middle_label_only_empties_that_section() {
        let raw = "Introduction: A hero appears. Climax: Victory at last.";
        let story = parse_sections(raw);

        assert!(story.parsed);
        assert_eq!(
            section_strings(&story),
            ["A hero appears.", "", "Victory at last.", ""]
        );
    }

    #[test]
    fn missing_last_label_captures_through_end() {
        let raw = "Introduction: start Storyline: middle Climax: end of text";
        let story = parse_sections(raw);

        assert!(story.parsed);
        assert_eq!(
            section_strings(&story),
            ["start", "middle", "end of text", ""]
        );
    }

    #[test]
    fn labels_match_case_insensitively() {
        let raw = "INTRODUCTION: a STORYLINE: b climax: c moRal: d";
        let story = parse_sections(raw);

        assert!(story.parsed);
        assert_eq!(section_strings(&story), ["a", "b", "c", "d"]);
    }

    #[test]
    fn text_before_introduction_is_discarded() {
        let raw = "Here is your story!\nIntroduction: a Storyline: b Climax: c Moral: d";
        let story = parse_sections(raw);

        assert!(story.parsed);
        assert_eq!(section_strings(&story), ["a", "b", "c", "d"]);
    }

    #[test]
    fn bare_template_yields_empty_sections() {
        let story = parse_sections("Introduction:\nStoryline:\nClimax:\nMoral:\n");
        assert!(story.parsed);
        assert_eq!(section_strings(&story), ["", "", "", ""]);
    }

    #[test]
    fn parsing_is_idempotent() {
        let raw = "Introduction: a Storyline: b Climax: c Moral: d";
        assert_eq!(parse_sections(raw), parse_sections(raw));
    }

    #[test]
    fn story_request_template() {
        let req = ComicCrafter::story_request("a brave toaster");

        assert!(req.system.is_none());
        assert!(req.sample);
        assert_eq!(req.num_sequences, 1);
        assert_eq!(req.max_tokens, STORY_MAX_TOKENS);

        let expect = expect![[r#"
            Write a short comic-style story based on: a brave toaster.
            Format it as follows:
            Introduction:
            Storyline:
            Climax:
            Moral:
        "#]];
        expect.assert_eq(&req.prompt);
    }

    #[test]
    fn sections_iterate_in_label_order() {
        let raw = "Introduction: a Storyline: b Climax: c Moral: d";
        let story = parse_sections(raw);
        let labels: Vec<SectionLabel> = story.sections.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, SectionLabel::ALL);
    }

    mod counting {
        use std::{
            pin::Pin,
            sync::{
                Arc,
                atomic::{AtomicUsize, Ordering},
            },
        };

        use crate::{
            image_model::{Image, ImageModel},
            llm::{CompletionFuture, LLM, Request},
        };

        #[derive(Clone)]
        pub struct CountingLLM(pub Arc<AtomicUsize>);

        impl LLM for CountingLLM {
            fn complete<'a>(&'a self, _req: Request) -> CompletionFuture<'a> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Box::pin(async { Ok(vec![]) })
            }

            fn clone(&self) -> Box<dyn LLM + Send + Sync + 'static> {
                Box::new(Clone::clone(self))
            }
        }

        #[derive(Clone)]
        pub struct CountingImageModel(pub Arc<AtomicUsize>);

        impl ImageModel for CountingImageModel {
            fn get_image<'a>(
                &'a self,
                _prompt: &'a str,
                _guidance_scale: f32,
            ) -> Pin<Box<dyn Future<Output = color_eyre::Result<Image>> + Send + 'a>> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Box::pin(async {
                    Ok(Image {
                        data: vec![],
                        cost: None,
                    })
                })
            }

            fn clone(&self) -> Box<dyn ImageModel + Send + Sync + 'static> {
                Box::new(Clone::clone(self))
            }
        }
    }

    #[tokio::test]
    async fn empty_prompt_invokes_no_model() {
        use std::sync::{Arc, atomic::AtomicUsize};

        let llm_calls = Arc::new(AtomicUsize::new(0));
        let img_calls = Arc::new(AtomicUsize::new(0));
        let crafter = ComicCrafter::new(
            Box::new(counting::CountingLLM(llm_calls.clone())),
            Box::new(counting::CountingImageModel(img_calls.clone())),
        );

        let res = crafter.generate_story("   \n\t").await;

        assert!(res.is_err());
        assert_eq!(llm_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert_eq!(img_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }
}
