//! Config command handler

use crate::application::ports::SettingsStore;
use crate::domain::config::CONFIG_KEYS;
use crate::domain::error::ConfigError;

use super::args::ConfigAction;
use super::presenter::Presenter;

/// Handle config subcommand
pub async fn handle_config_command<S: SettingsStore + ?Sized>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => {
            presenter.output(&store.path().to_string_lossy());
            Ok(())
        }
        ConfigAction::Reset => {
            store.reset().await?;
            presenter.success(&format!("Settings reset to defaults at: {}", store.path().display()));
            Ok(())
        }
    }
}

async fn handle_init<S: SettingsStore + ?Sized>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!("Settings file created at: {}", store.path().display()));
    Ok(())
}

async fn handle_set<S: SettingsStore + ?Sized>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    let mut config = store.load().await;
    config.set(key, value)?;
    store.save(&config).await?;

    let shown = config.get(key).unwrap_or_else(|| value.to_string());
    presenter.success(&format!("{} = {}", key, shown));
    Ok(())
}

async fn handle_get<S: SettingsStore + ?Sized>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    let config = store.load().await;
    let value = config.get(key).ok_or_else(|| unknown_key(key))?;
    presenter.output(&display_value(&value));
    Ok(())
}

async fn handle_list<S: SettingsStore + ?Sized>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await;
    for key in CONFIG_KEYS {
        let value = config.get(key).unwrap_or_default();
        presenter.key_value(key, &display_value(&value));
    }
    Ok(())
}

fn unknown_key(key: &str) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", CONFIG_KEYS.join(", ")),
    }
}

fn display_value(value: &str) -> String {
    if value.is_empty() {
        "(none)".to_string()
    } else {
        value.to_string()
    }
}
