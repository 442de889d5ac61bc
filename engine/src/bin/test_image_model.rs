use clap::Parser;
use color_eyre::Result;
use engine::{comic::IMAGE_GUIDANCE_SCALE, image_model::Model};

#[derive(clap::Parser)]
struct Arg {
    model: Model,
    key: String,
    prompt: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    pretty_env_logger::init();
    let Arg { model, key, prompt } = Arg::parse();
    let imgmod = model.make(key);

    let image = imgmod.get_image(&prompt, IMAGE_GUIDANCE_SCALE).await?;
    std::fs::write("output.jpeg", &image.data)?;
    println!("Saved image, {} bytes", image.data.len());

    Ok(())
}
