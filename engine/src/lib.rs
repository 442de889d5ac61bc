use crate::{image_model::ImageModel, llm::LLM};

pub mod comic;
pub mod image_model;
pub mod llm;

pub type LLMBox = Box<dyn LLM + Send + Sync>;
pub type ImgModBox = Box<dyn ImageModel + Send + Sync>;
