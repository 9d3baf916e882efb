use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use log::LevelFilter;
use ziprun_core::{update, AppState, AppViewModel, Msg, RunState};
use ziprun_engine::EngineEvent;
use ziprun_logging::{ziprun_error, ziprun_info};

use super::cli::Cli;
use super::config::ClientConfig;
use super::effects::{map_event, EffectRunner};
use super::render::TerminalRenderer;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub fn run_app() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    ziprun_logging::initialize(cli.log_to, level);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            ziprun_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// What the driver does after a message has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Wait,
    Retrieve,
    Finish { success: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Running,
    Retrieving,
}

fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = ClientConfig::load(&cli.config)?.with_overrides(cli.server, cli.output_dir);
    let selected = read_selection(&cli.file)?;

    let mut session = Session::new(EffectRunner::new(config.engine_settings()));
    session.dispatch(selected)?;
    if !session.state.start_enabled() {
        return Ok(false);
    }
    session.dispatch(Msg::StartClicked)?;

    let mut phase = Phase::Running;
    loop {
        let Some(msg) = inbound_msg(session.runner.next_event(POLL_INTERVAL))? else {
            continue;
        };
        let retrieval = match &msg {
            Msg::RetrievalSaved { .. } => Some(true),
            Msg::RetrievalFailed { .. } => Some(false),
            _ => None,
        };
        session.dispatch(msg)?;

        match next_step(&session.state.view(), phase, retrieval, cli.no_download) {
            Step::Wait => {}
            Step::Retrieve => {
                phase = Phase::Retrieving;
                session.dispatch(Msg::RetrieveClicked)?;
            }
            Step::Finish { success } => return Ok(success),
        }
    }
}

/// `Ok(None)` when there is nothing to dispatch yet. Errors when the engine is gone.
fn inbound_msg(received: Result<EngineEvent, RecvTimeoutError>) -> anyhow::Result<Option<Msg>> {
    match received {
        Ok(EngineEvent::EngineFailed { message }) => bail!("engine stopped: {message}"),
        Ok(event) => Ok(map_event(event)),
        Err(RecvTimeoutError::Timeout) => Ok(None),
        Err(RecvTimeoutError::Disconnected) => bail!("engine stopped unexpectedly"),
    }
}

fn read_selection(path: &Path) -> anyhow::Result<Msg> {
    let content = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    ziprun_info!("Read {} ({} bytes)", name, content.len());
    Ok(Msg::FileSelected {
        name,
        size_bytes: content.len() as u64,
        content: Arc::from(content),
    })
}

fn next_step(
    view: &AppViewModel,
    phase: Phase,
    retrieval: Option<bool>,
    no_download: bool,
) -> Step {
    match phase {
        Phase::Retrieving => match retrieval {
            Some(success) => Step::Finish { success },
            None => Step::Wait,
        },
        Phase::Running => match &view.run_state {
            RunState::Succeeded { .. } if no_download => Step::Finish { success: true },
            RunState::Succeeded { .. } if view.retrieval_enabled => Step::Retrieve,
            RunState::Succeeded { .. } => Step::Finish { success: true },
            RunState::Failed { .. } => Step::Finish { success: false },
            _ => Step::Wait,
        },
    }
}

struct Session {
    state: AppState,
    runner: EffectRunner,
    renderer: TerminalRenderer,
}

impl Session {
    fn new(runner: EffectRunner) -> Self {
        Self {
            state: AppState::new(),
            runner,
            renderer: TerminalRenderer::with_timestamps(),
        }
    }

    fn dispatch(&mut self, msg: Msg) -> io::Result<()> {
        let state = std::mem::take(&mut self.state);
        let (mut next_state, effects) = update(state, msg);
        self.runner.enqueue(effects);
        if next_state.consume_dirty() {
            let view = next_state.view();
            let mut stdout = io::stdout().lock();
            for line in self.renderer.render(&view) {
                writeln!(stdout, "{line}")?;
            }
        }
        self.state = next_state;
        Ok(())
    }
}
