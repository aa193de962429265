use std::{path::PathBuf, time::Duration};

use crate::{schema::summary::SessionSummary, util::Output};

use super::SessionArg;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    #[clap(flatten)]
    session: SessionArg,
    /// Number of gravity ticks to run (the session may end earlier)
    #[arg(long, default_value_t = 3000)]
    ticks: u64,
    /// Output file path for the JSON summary; stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let SimulateArg {
        session: session_arg,
        ticks,
        output,
    } = arg;

    let config = session_arg.load_config()?.unwrap_or_default();
    let (mut session, seed) = super::start_session(config, session_arg.seed)?;
    let frame = session.config().gravity_interval();

    let mut summary = SessionSummary::new(seed, &session);
    let mut now = Duration::ZERO;
    for _ in 0..*ticks {
        if session.is_game_over() {
            break;
        }
        now += frame;
        if let Some(report) = session.tick(now).committed {
            summary.record_commit(&report);
        }
    }
    summary.update(&session, now);

    match session.game_over_reason() {
        Some(reason) => eprintln!("Game over after {} pieces: {reason}", summary.committed_pieces),
        None => eprintln!("Stopped after {ticks} ticks"),
    }
    eprint!("{}", session.board());

    Output::save_json(&summary, output.clone())
}
