pub mod config;
pub mod event;
pub mod storage;
pub mod task;

use chrono::NaiveDate;
use serde::Serialize;
use taskflow_core::{Config, LocalProvider, LocalStore, Provider, ProviderMode, RemoteProvider, SyncEngine};
use tracing::debug;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Provider picked on the command line, overriding `provider.mode`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProviderChoice {
    #[default]
    Configured,
    Local,
    Remote(String),
}

/// Build the provider for this invocation.
pub fn provider(choice: &ProviderChoice, config: &Config) -> Result<Box<dyn Provider>, Box<dyn std::error::Error>> {
    let mode = match choice {
        ProviderChoice::Configured => config.provider.mode,
        ProviderChoice::Local => ProviderMode::Local,
        ProviderChoice::Remote(_) => ProviderMode::Remote,
    };
    let provider: Box<dyn Provider> = match mode {
        ProviderMode::Local => Box::new(LocalProvider::new(LocalStore::open(config.local_dir()?)?)),
        ProviderMode::Remote => {
            let base_url = match choice {
                ProviderChoice::Remote(url) => url.as_str(),
                _ => config.remote.base_url.as_str(),
            };
            Box::new(RemoteProvider::new(base_url, config.remote.timeout())?)
        }
    };
    Ok(provider)
}

/// Open the engine and load both collections.
pub async fn open_engine(choice: &ProviderChoice, config: &Config) -> Result<SyncEngine, Box<dyn std::error::Error>> {
    let mut engine = SyncEngine::new(provider(choice, config)?);
    engine.load().await?;
    debug!(
        provider = engine.provider_name(),
        tasks = engine.tasks().len(),
        events = engine.events().len(),
        "loaded"
    );
    Ok(engine)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
