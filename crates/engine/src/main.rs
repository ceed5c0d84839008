use clap::Parser;
use tracing_subscriber::EnvFilter;

use cc_engine::cli::{self, Cli, Command, ConfigCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    match args.command {
        None | Some(Command::Chat { .. }) => {
            init_tracing();
            let config = cli::load_config(&args.config)?;
            let (scripted, user, conversation) = match args.command {
                Some(Command::Chat {
                    scripted,
                    user,
                    conversation,
                }) => (scripted, user, conversation),
                _ => (false, "local".to_owned(), None),
            };
            cli::chat(config, scripted, user, conversation).await
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let config = cc_domain::config::Config::load(&args.config)?;
            if !cli::validate(&config) {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let config = cc_domain::config::Config::load(&args.config)?;
            cli::show(&config);
            Ok(())
        }
        Some(Command::Version) => {
            println!("compass {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,cc_engine=debug")),
        )
        .init();
}
