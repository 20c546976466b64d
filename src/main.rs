mod cli;
mod handle;
mod output;
mod prompt;
mod secure;
mod store;
mod template;

use clap::Parser;
use cli::Args;
use handle::{handle, Handler};
use output::{write_result, TerminalOutput};
use prompt::TerminalPrompt;
use store::{SsmStore, StoreConfig};
use template::TemplateDir;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    if let Err(err) = run(&args).await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

async fn run(args: &Args) -> anyhow::Result<()> {
    let store = SsmStore::connect(StoreConfig {
        region: args.region.clone(),
    })
    .await;
    let prompt = TerminalPrompt::new(std::io::stdin().lock(), std::io::stdout());
    let mut handler = Handler::new(
        prompt,
        store,
        TemplateDir::resolve(),
        TerminalOutput::new(std::io::stdout()),
    );
    let result = handle(&mut handler, args).await?;
    write_result(result, TerminalOutput::new(std::io::stdout()))
}
