use clap::Parser;
use color_eyre::Result;
use comic_crafter::{Gui, cli::Cli, load_config};

pub fn main() -> Result<()> {
    color_eyre::install()?;
    pretty_env_logger::init();

    let cli = Cli::parse();
    let mut cfg = load_config()?;
    if let Some(token) = cli.claude_token {
        cfg.get_or_insert_default().claude_token = token;
    }

    iced::application(move || Gui::new(cfg.clone()), Gui::update, Gui::view).run()?;
    Ok(())
}
