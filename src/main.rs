use clap::Parser;

use microfiche::cli::{self, Cli, Command, ConfigCommand};
use microfiche::{config, logging, server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        // No subcommand or explicit `start` both launch the server.
        None | Some(Command::Start) => run_server().await,

        Some(Command::Config(sub)) => {
            match sub {
                ConfigCommand::Show => cli::handle_config_show()?,
                ConfigCommand::Get { key } => cli::handle_config_get(&key)?,
                ConfigCommand::Set { key, value } => cli::handle_config_set(&key, &value)?,
                ConfigCommand::Path => cli::handle_config_path(),
            }
            Ok(())
        }

        Some(Command::Detect { user_agent }) => cli::handle_detect(&user_agent),

        Some(Command::Status { port, host }) => cli::handle_status(&host, port).await,

        Some(Command::Version) => {
            cli::handle_version();
            Ok(())
        }
    }
}

/// Load configuration, install logging, and run the server until shutdown.
async fn run_server() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_config()?;
    logging::init_logging(&config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("MICROFICHE_GIT_HASH"),
        "starting microfiche"
    );

    server::serve(config).await?;
    Ok(())
}
