//! Local store maintenance commands.

use clap::Subcommand;
use serde_json::Value;
use taskflow_core::{Config, LocalStore};

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum StorageAction {
    /// Size and record count per key
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove every TaskFlow key from the local store
    Clear {
        /// Skip the safety check
        #[arg(long)]
        yes: bool,
    },
    /// Print the local store directory
    Path,
    /// Show the settings object
    Settings,
    /// Set one setting (JSON values are parsed, anything else is a string)
    SetSetting { key: String, value: String },
    /// Remove one setting
    UnsetSetting { key: String },
}

/// Parse a setting the way a user would type it: `true`, `3`, `"x"` or bare text.
pub(crate) fn setting_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn human_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}

pub fn run(action: StorageAction, config: &Config) -> CmdResult {
    let store = LocalStore::open(config.local_dir()?)?;

    match action {
        StorageAction::Stats { json } => {
            let stats = store.stats()?;
            if json {
                print_json(&stats)?;
            } else {
                for usage in &stats.items {
                    println!(
                        "{:<18} {:>9}  {} item(s)",
                        usage.key,
                        human_size(usage.size),
                        usage.item_count
                    );
                }
                println!("{:<18} {:>9}", "total", human_size(stats.total));
            }
        }
        StorageAction::Clear { yes } => {
            if !yes {
                return Err("refusing to clear local data without --yes".into());
            }
            store.clear_all()?;
            println!("local data cleared");
        }
        StorageAction::Path => println!("{}", store.dir().display()),
        StorageAction::Settings => print_json(&store.settings())?,
        StorageAction::SetSetting { key, value } => {
            let mut settings = store.settings();
            settings.insert(key, setting_value(&value));
            store.save_settings(&settings)?;
            println!("ok");
        }
        StorageAction::UnsetSetting { key } => {
            let mut settings = store.settings();
            if settings.remove(&key).is_none() {
                return Err(format!("unknown setting: {key}").into());
            }
            store.save_settings(&settings)?;
            println!("ok");
        }
    }
    Ok(())
}
