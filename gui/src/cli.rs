#[derive(Debug, Clone, clap::Parser)]
pub struct Cli {
    /// Anthropic API key, overrides the configured one for this run
    #[arg(short, long)]
    pub claude_token: Option<String>,
}
