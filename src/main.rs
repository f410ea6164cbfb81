//! Screen Audio Recorder CLI entry point

use std::process::ExitCode;

use clap::Parser;

use screen_audio_recorder::application::ports::{LoadedSettings, SettingsStore};
use screen_audio_recorder::cli::{
    app::apply_overrides,
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    logging::init_logging,
    presenter::Presenter,
    run_list_apps, run_list_screens, run_recording, RecordOptions, EXIT_ERROR, EXIT_USAGE_ERROR,
};
use screen_audio_recorder::domain::error::ConfigError;
use screen_audio_recorder::domain::recording::Duration;
use screen_audio_recorder::infrastructure::JsonSettingsStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let presenter = Presenter::new();
    let store = JsonSettingsStore::new();

    if let Some(Commands::Config { action }) = &cli.command {
        return match handle_config_command(action.clone(), &store, &presenter).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e @ ConfigError::ValidationError { .. }) => {
                presenter.error(&e.to_string());
                ExitCode::from(EXIT_USAGE_ERROR)
            }
            Err(e) => {
                presenter.error(&e.to_string());
                ExitCode::from(EXIT_ERROR)
            }
        };
    }

    let LoadedSettings { mut config, notes } = store.load_reported().await;
    if let Err(e) = apply_overrides(&mut config, &cli) {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_USAGE_ERROR);
    }

    let duration = match cli.duration.as_deref().map(str::parse::<Duration>) {
        Some(Ok(duration)) => Some(duration),
        Some(Err(e)) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
        None => None,
    };

    init_logging(config.effective_log_level());
    for note in &notes {
        note.log();
    }

    match cli.command {
        Some(Commands::Apps) => return run_list_apps(&config).await,
        Some(Commands::Screens) => return run_list_screens(&config),
        _ => {}
    }

    let options = RecordOptions {
        duration,
        start: cli.start_options(),
        notify: cli.notify,
    };
    run_recording(config, options).await
}
