use clap::{Parser, Subcommand};
use taskflow_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{open_engine, print_json, ProviderChoice};

#[derive(Parser)]
#[command(name = "taskflow", version, about = "TaskFlow task and calendar manager")]
struct Cli {
    /// Use the HTTP API at this base URL
    #[arg(long, global = true, value_name = "URL", conflicts_with = "local")]
    remote: Option<String>,
    /// Use the local store regardless of `provider.mode`
    #[arg(long, global = true)]
    local: bool,
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn provider_choice(&self) -> ProviderChoice {
        match (&self.remote, self.local) {
            (Some(url), _) => ProviderChoice::Remote(url.clone()),
            (None, true) => ProviderChoice::Local,
            (None, false) => ProviderChoice::Configured,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Calendar events
    Event {
        #[command(subcommand)]
        action: commands::event::EventAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Local store maintenance
    Storage {
        #[command(subcommand)]
        action: commands::storage::StorageAction,
    },
    /// Provider and record counts
    Status,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let choice = cli.provider_choice();
    let result = match Config::load() {
        Ok(config) => match cli.command {
            Commands::Task { action } => commands::task::run(action, &choice, &config).await,
            Commands::Event { action } => commands::event::run(action, &choice, &config).await,
            Commands::Config { action } => commands::config::run(action, config),
            Commands::Storage { action } => commands::storage::run(action, &config),
            Commands::Status => match open_engine(&choice, &config).await {
                Ok(engine) => print_json(&engine.status()),
                Err(e) => Err(e),
            },
        },
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn provider_flags_select_the_provider() {
        let cli = Cli::try_parse_from(["taskflow", "task", "list"]).unwrap();
        assert_eq!(cli.provider_choice(), ProviderChoice::Configured);

        let cli = Cli::try_parse_from(["taskflow", "--local", "task", "list"]).unwrap();
        assert_eq!(cli.provider_choice(), ProviderChoice::Local);

        let cli =
            Cli::try_parse_from(["taskflow", "event", "list", "--remote", "http://localhost:8080/"])
                .unwrap();
        assert_eq!(
            cli.provider_choice(),
            ProviderChoice::Remote("http://localhost:8080/".into())
        );
    }

    #[test]
    fn remote_and_local_conflict() {
        assert!(Cli::try_parse_from(["taskflow", "--local", "--remote", "http://x/", "status"]).is_err());
    }

    #[test]
    fn enum_arguments_are_validated() {
        assert!(Cli::try_parse_from(["taskflow", "task", "list", "--status", "in-progress"]).is_ok());
        assert!(Cli::try_parse_from(["taskflow", "task", "list", "--status", "doing"]).is_err());
        assert!(Cli::try_parse_from(["taskflow", "task", "list", "--sort", "priority"]).is_ok());
        assert!(Cli::try_parse_from(["taskflow", "task", "add", "x", "--deadline", "03/15/2024"]).is_err());
    }

    #[test]
    fn event_times_parse_as_clock_times() {
        let ok = Cli::try_parse_from([
            "taskflow", "event", "add", "Standup", "--date", "2024-03-15", "--start", "09:00",
            "--end", "09:15",
        ]);
        assert!(ok.is_ok());
        let bad = Cli::try_parse_from([
            "taskflow", "event", "add", "Standup", "--date", "2024-03-15", "--start", "9am",
        ]);
        assert!(bad.is_err());
    }

    #[test]
    fn clear_times_conflicts_with_new_times() {
        let parsed = Cli::try_parse_from([
            "taskflow", "event", "update", "e-1", "--clear-times", "--start", "10:00",
        ]);
        assert!(parsed.is_err());
    }
}
