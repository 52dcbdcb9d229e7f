use anyhow::Result;
use clap::Parser;

use polyglot_cli::cli::{Cli, Commands};
use polyglot_cli::{commands, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level, cli.verbose);

    match cli.command {
        Commands::Translate {
            text,
            from,
            to,
            detected,
            back,
            json,
        } => {
            let options = commands::translate::TranslateOptions {
                text,
                from,
                to,
                detected,
                back,
                json,
            };
            commands::translate::execute(cli.config, options).await
        }
        Commands::Speak { text, lang, output } => {
            commands::speak::execute(cli.config, text, lang, output).await
        }
        Commands::Recognize { image, lang } => {
            commands::recognize::execute(cli.config, image, lang).await
        }
        Commands::Collect { source, result } => {
            commands::collect::execute(cli.config, source, result).await
        }
        Commands::Plugins { capability } => commands::plugins::execute(cli.config, capability),
        Commands::History { limit, clear } => {
            commands::history::execute(cli.config, limit, clear).await
        }
        Commands::Config(cmd) => commands::config::execute(cli.config, cmd),
    }
}
