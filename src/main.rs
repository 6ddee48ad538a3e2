//! Headless image playground runner.

mod cli;

use std::path::Path;
use std::process;

use clap::Parser;
use imagen_playground::cassette::config::{is_recording_enabled, RECORD_ENV, REPLAY_ENV};
use imagen_playground::config::{self, Config};
use imagen_playground::context::{RecordingSession, ServiceContext};
use imagen_playground::media::GatherProgress;
use imagen_playground::model::ModelKey;
use imagen_playground::state::Terminal;
use imagen_playground::{Playground, PlaygroundError};
use log::debug;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

/// Run one prediction. Returns whether an image was produced.
async fn run(cli: Cli) -> Result<bool, PlaygroundError> {
    let config_path = config::discover_config_path(cli.config.as_deref());
    let config = Config::load(&config_path).map_err(PlaygroundError::Config)?;

    let model: ModelKey = cli.model.as_deref().unwrap_or(&config.defaults.model).parse()?;
    cli.validate(model).map_err(PlaygroundError::Validation)?;
    let prompt = cli.resolve_prompt()?;
    debug!("Model: {model} ({})", model.display_name());

    let (services, recording) = services(&config, cli.verbose)?;
    let mut playground = Playground::new(services, config.poll_policy(), model);
    cli.configure(playground.form_mut(model), prompt).await;
    playground.rerender();

    if cli.refine {
        let refined = playground.refine_prompt(model).await;
        flush(&mut playground);
        if refined.is_err() {
            finish_recording(recording);
            return Ok(false);
        }
    }

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::unbounded_channel();
    let progress = tokio::spawn(async move {
        while let Some(event) = progress_rx.recv().await {
            match event {
                GatherProgress::Compressing { file } => eprintln!("Compressing {file}..."),
                GatherProgress::Processed { count, total } => eprintln!("Processed {count}/{total} images"),
            }
        }
    });
    let submitted = playground.submit(model, Some(&progress_tx)).await;
    drop(progress_tx);
    let _ = progress.await;

    if let Err(e) = submitted {
        let notifications = playground.drain_notifications();
        if notifications.is_empty() {
            eprintln!("Error: {e}");
        }
        for notification in notifications {
            eprintln!("{notification}");
        }
        finish_recording(recording);
        return Ok(false);
    }

    playground.wait_idle(model).await;
    flush(&mut playground);
    eprintln!("{}", playground.view());
    if cli.json {
        println!("{}", playground.view().json);
    }

    let state = playground.state(model);
    let succeeded = state.last_outcome() == Some(Terminal::Succeeded) && state.image().is_some();

    if succeeded && !cli.no_download {
        match playground.download(model, cli.output.as_deref()).await {
            Ok(path) => eprintln!("Saved: {}", path.display()),
            Err(e) => {
                eprintln!("Error: {e}");
                finish_recording(recording);
                return Ok(false);
            }
        }
    }

    finish_recording(recording);
    Ok(succeeded)
}

/// Pick live, recording, or replaying services from the environment.
fn services(config: &Config, verbose: bool) -> Result<(ServiceContext, Option<RecordingSession>), PlaygroundError> {
    if let Ok(cassette_path) = std::env::var(REPLAY_ENV) {
        if verbose {
            eprintln!("Replaying from: {cassette_path}");
        }
        return Ok((ServiceContext::replaying(Path::new(&cassette_path), config)?, None));
    }
    if is_recording_enabled(std::env::var(RECORD_ENV).ok().as_deref()) {
        if verbose {
            eprintln!("Recording mode enabled");
        }
        let (ctx, session) = ServiceContext::recording(config)?;
        return Ok((ctx, Some(session)));
    }
    Ok((ServiceContext::live(config)?, None))
}

fn flush(playground: &mut Playground) {
    for notification in playground.drain_notifications() {
        eprintln!("{notification}");
    }
}

fn finish_recording(recording: Option<RecordingSession>) {
    if let Some(session) = recording {
        match session.finish() {
            Ok(path) => eprintln!("Cassette saved: {}", path.display()),
            Err(e) => eprintln!("Warning: failed to save cassette: {e}"),
        }
    }
}
