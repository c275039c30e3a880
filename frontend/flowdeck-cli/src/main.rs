mod cli;
mod picker;
mod renderer;

use std::path::PathBuf;
use std::sync::Arc;

use flowdeck_core::{Config, Error, Event, Flowdeck, LaunchOutcome};
use tokio::sync::broadcast;

use crate::picker::StdinPicker;
use crate::renderer::Renderer;

fn main() {
    if let Err(error) = run() {
        eprintln!("flowdeck failed: {error}");
        std::process::exit(1);
    }
}

fn run() -> flowdeck_core::Result<()> {
    let args = cli::Cli::parse_args();
    let config = flowdeck_core::config::load(args.config.as_deref())?;
    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    flowdeck_core::logging::init_tracing(&level);

    if args.command == cli::Command::ValidateConfig {
        println!("Config is valid.");
        return Ok(());
    }

    let runtime = tokio::runtime::Runtime::new().map_err(|err| {
        Error::Config(format!("failed to create tokio runtime: {err}"))
    })?;
    runtime.block_on(run_command(args, config))
}

fn resolve_roots(roots: &[PathBuf]) -> flowdeck_core::Result<Vec<PathBuf>> {
    if roots.is_empty() {
        let work_dir = std::env::current_dir().map_err(|err| {
            Error::Config(format!("failed to resolve current dir: {err}"))
        })?;
        return Ok(vec![work_dir]);
    }
    Ok(roots.to_vec())
}

async fn run_command(args: cli::Cli, mut config: Config) -> flowdeck_core::Result<()> {
    let roots = resolve_roots(&args.roots)?;
    let renderer = Renderer::new(args.output);

    match args.command {
        cli::Command::List => {
            config.watch.enabled = false;
            let app = Flowdeck::new(config)?;
            let mut events = app.events().subscribe();

            let records = app.registry().set_roots(roots).await?;
            drain_notifications(&mut events, &renderer);
            renderer.render_records(&records);
        }
        cli::Command::Run { query } => {
            config.watch.enabled = false;
            let app = Flowdeck::new(config)?;
            let mut events = app.events().subscribe();

            app.registry().set_roots(roots).await?;
            drain_notifications(&mut events, &renderer);

            let record = match query {
                Some(query) => Some(app.registry().find(&query).ok_or_else(|| {
                    Error::NotFound(format!("no workflow matches '{query}'"))
                })?),
                None => None,
            };

            let launcher = app.launcher(Arc::new(StdinPicker), Arc::new(app.shell_runner()));
            let outcome = launcher.launch(app.registry(), record).await?;
            drain_notifications(&mut events, &renderer);
            if let LaunchOutcome::Launched(request) = outcome {
                tracing::debug!(title = %request.title, "workflow handed to runner");
                if !app.config().launch.wait_for_exit {
                    renderer.render_launch(&request);
                }
            }
        }
        cli::Command::Watch => {
            config.watch.enabled = true;
            let app = Flowdeck::new(config)?;
            let mut events = app.events().subscribe();

            let records = app.registry().set_roots(roots).await?;
            drain_notifications(&mut events, &renderer);
            renderer.render_records(&records);

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    received = events.recv() => match received {
                        Ok(event @ Event::Notification { .. }) => renderer.render_event(&event),
                        Ok(event @ Event::RecordsUpdated { .. }) => {
                            renderer.render_event(&event);
                            renderer.render_records(&app.registry().records());
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "event renderer lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }

            app.shutdown();
        }
        cli::Command::ValidateConfig => {}
    }

    Ok(())
}

/// Renders queued notifications. Record-count events are dropped; one-shot
/// commands print the list themselves.
fn drain_notifications(events: &mut broadcast::Receiver<Event>, renderer: &Renderer) {
    loop {
        match events.try_recv() {
            Ok(event @ Event::Notification { .. }) => renderer.render_event(&event),
            Ok(Event::RecordsUpdated { .. }) => {}
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
}
