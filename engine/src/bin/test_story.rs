use clap::Parser;
use color_eyre::{Result, eyre::eyre};
use engine::{
    comic::{ComicCrafter, parse_sections},
    llm::{Claude, LLM as _},
};

/// Generates a story from the terminal and prints the parsed sections.
#[derive(clap::Parser)]
struct Arg {
    key: String,
    prompt: String,

    #[arg(long, default_value = "claude-sonnet-4-5")]
    model: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    pretty_env_logger::init();
    let Arg { key, prompt, model } = Arg::parse();

    let llm = Claude::new(key, model);
    let completions = llm.complete(ComicCrafter::story_request(&prompt)).await?;
    let completion = completions
        .first()
        .ok_or(eyre!("No completion returned"))?;

    let story = parse_sections(&completion.text);
    if !story.parsed {
        println!("WARNING: could not parse story, raw text follows\n");
        println!("{}", completion.text);
        return Ok(());
    }

    for (label, section) in story.sections.iter() {
        println!("# {label}\n{section}\n");
    }
    println!(
        "({} input tokens, {} output tokens)",
        completion.input_tokens, completion.output_tokens
    );

    Ok(())
}
