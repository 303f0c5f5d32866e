//! Per-session serialized execution context.
//!
//! Each session owns exactly one worker task fed by an unbounded mailbox.
//! Commands for a handle execute strictly in submission order; distinct
//! handles run on independent tasks and never serialize against each other.
//! The engine instance lives inside the worker and is dropped exactly once,
//! when the worker exits.

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::engine::{AnalyzerEngine, MetricsSnapshot};
use crate::error::Result;
use crate::types::SessionHandle;

/// One queued operation plus its pending-result channel.
///
/// Dropping a command unanswers its reply channel; the submitting caller
/// observes that as the session being gone.
pub(crate) enum SessionCommand {
    Push {
        samples: Vec<f64>,
        t0: f64,
        reply: oneshot::Sender<Result<()>>,
    },
    PushTs {
        samples: Vec<f64>,
        timestamps: Vec<f64>,
        reply: oneshot::Sender<Result<()>>,
    },
    Poll {
        reply: oneshot::Sender<Result<Option<MetricsSnapshot>>>,
    },
    SetWindow {
        seconds: f64,
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Spawn the dedicated worker for one session and hand back its mailbox.
///
/// Cancelling `cancel` stops the worker before it takes the next queued
/// command; the command currently executing is allowed to finish, but queued
/// commands are dropped unanswered when the mailbox closes.
pub(crate) fn spawn_worker(
    handle: SessionHandle,
    mut engine: Box<dyn AnalyzerEngine>,
    cancel: CancellationToken,
) -> mpsc::UnboundedSender<SessionCommand> {
    let (tx, mut rx) = mpsc::unbounded_channel::<SessionCommand>();

    tokio::spawn(async move {
        debug!(session = %handle, "session worker started");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                cmd = rx.recv() => match cmd {
                    Some(cmd) => execute(engine.as_mut(), cmd),
                    None => break,
                },
            }
        }
        // Engine released here, exactly once.
        debug!(session = %handle, "session worker exited");
    });

    tx
}

fn execute(engine: &mut dyn AnalyzerEngine, cmd: SessionCommand) {
    match cmd {
        SessionCommand::Push { samples, t0, reply } => {
            let _ = reply.send(engine.push(&samples, t0));
        }
        SessionCommand::PushTs {
            samples,
            timestamps,
            reply,
        } => {
            let _ = reply.send(engine.push_ts(&samples, &timestamps));
        }
        SessionCommand::Poll { reply } => {
            let _ = reply.send(engine.poll());
        }
        SessionCommand::SetWindow { seconds, reply } => {
            let _ = reply.send(engine.set_window(seconds));
        }
    }
}
