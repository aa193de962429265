use std::{path::PathBuf, time::Duration};

use grabtris_engine::{GameSession, PieceSeed, PointerOutcome};

use crate::{
    schema::{
        script::{Script, ScriptEvent},
        summary::SessionSummary,
    },
    util::{self, Output},
};

use super::SessionArg;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ReplayArg {
    /// Path to the input script (JSON format)
    script_file: PathBuf,
    #[clap(flatten)]
    session: SessionArg,
    /// Output file path for the JSON summary; stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ReplayArg) -> anyhow::Result<()> {
    let ReplayArg {
        script_file,
        session: session_arg,
        output,
    } = arg;

    eprintln!("Loading script from {}", script_file.display());
    let script: Script = util::read_json_file("script", script_file)?;
    eprintln!("Loaded {} events", script.events.len());

    let config = session_arg
        .load_config()?
        .or(script.config)
        .unwrap_or_default();
    let (mut session, seed) = super::start_session(config, session_arg.seed.or(script.seed))?;

    let mut replayer = Replayer::new(seed, &session);
    for (i, event) in script.events.iter().enumerate() {
        if session.is_game_over() {
            eprintln!("Session ended before event #{i}");
            break;
        }
        if !replayer.apply(&mut session, *event) {
            eprintln!("Event #{i} had no effect: {event:?}");
        }
    }
    let summary = replayer.finish(&session);

    if let Some(reason) = summary.game_over {
        eprintln!("Game over: {reason}");
    }
    eprint!("{}", session.board());

    Output::save_json(&summary, output.clone())
}

/// Applies script events to a session and keeps the running summary.
struct Replayer {
    summary: SessionSummary,
    now: Duration,
}

impl Replayer {
    fn new(seed: PieceSeed, session: &GameSession) -> Self {
        Self {
            summary: SessionSummary::new(seed, session),
            now: Duration::ZERO,
        }
    }

    /// Forwards one event. Returns `false` when the session ignored or rejected it.
    fn apply(&mut self, session: &mut GameSession, event: ScriptEvent) -> bool {
        match event {
            ScriptEvent::Tick { at_ms } => {
                let at = Duration::from_millis(at_ms);
                if at < self.now {
                    return false;
                }
                self.now = at;
                if let Some(report) = session.tick(at).committed {
                    self.summary.record_commit(&report);
                }
                true
            }
            ScriptEvent::PointerMoved { x, y } => {
                session.pointer_moved(x, y);
                true
            }
            ScriptEvent::PointerDown { x, y } => match session.pointer_down(x, y) {
                PointerOutcome::PickedUp => true,
                PointerOutcome::Dropped(report) => {
                    self.summary.record_commit(&report);
                    true
                }
                PointerOutcome::Ignored | PointerOutcome::Rejected => false,
            },
            ScriptEvent::Rotate => session.rotate(),
            ScriptEvent::Shift { dx } => session.shift(dx),
            ScriptEvent::SoftDrop => {
                let was_falling = session.state().is_falling();
                if let Some(report) = session.soft_drop() {
                    self.summary.record_commit(&report);
                }
                was_falling
            }
            ScriptEvent::PickFromConveyor { slot } => session.pick_from_conveyor(slot),
        }
    }

    fn finish(mut self, session: &GameSession) -> SessionSummary {
        self.summary.update(session, self.now);
        self.summary
    }
}
