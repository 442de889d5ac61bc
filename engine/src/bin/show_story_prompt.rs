use clap::Parser;
use color_eyre::Result;
use engine::comic::ComicCrafter;

/// Prints the exact instruction that would be sent to the text model
/// for the given user prompt.
#[derive(clap::Parser)]
struct Arg {
    prompt: String,
}

pub fn main() -> Result<()> {
    color_eyre::install()?;
    let Arg { prompt } = Arg::parse();
    let req = ComicCrafter::story_request(&prompt);

    if let Some(system) = req.system {
        println!("# System Message\n{system}\n");
    }
    println!("{}", req.prompt);

    Ok(())
}
