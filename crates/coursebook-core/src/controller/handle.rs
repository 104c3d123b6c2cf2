use std::collections::VecDeque;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use super::{ListSnapshot, Outcome, PaginationController, RejectReason};
use crate::cache::KeyValueStore;
use crate::error::ControllerError;
use crate::source::DataSource;

type Reply = oneshot::Sender<Result<Outcome, ControllerError>>;

/// Mutating operations accepted by a running controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Startup,
    Refresh,
    LoadMore,
}

struct Request {
    command: Command,
    reply: Reply,
}

/// A queued command and everyone waiting on it.
struct Batch {
    command: Command,
    replies: Vec<Reply>,
}

/// A submitted command awaiting its result.
pub struct PendingRequest {
    rx: oneshot::Receiver<Result<Outcome, ControllerError>>,
}

impl PendingRequest {
    pub async fn outcome(self) -> Result<Outcome, ControllerError> {
        self.rx.await.map_err(|_| ControllerError::Closed)?
    }
}

/// Cloneable front end of a spawned [`PaginationController`].
///
/// Commands run one at a time in submission order. Requests that arrive
/// while an operation is in flight are settled when it commits:
/// load-more is rejected as [`RejectReason::Busy`], refresh and startup are
/// queued and run next. A command repeating the last queued one joins it and
/// shares its outcome.
pub struct ListHandle<T> {
    tx: mpsc::UnboundedSender<Request>,
    updates: watch::Receiver<ListSnapshot<T>>,
}

impl<T> Clone for ListHandle<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            updates: self.updates.clone(),
        }
    }
}

impl<T: Clone> ListHandle<T> {
    /// Enqueue a command without waiting for it.
    pub fn submit(&self, command: Command) -> PendingRequest {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Request { command, reply }).is_err() {
            debug!(?command, "List controller stopped, dropping command");
        }
        PendingRequest { rx }
    }

    pub async fn startup(&self) -> Result<Outcome, ControllerError> {
        self.submit(Command::Startup).outcome().await
    }

    pub async fn on_pull_to_refresh(&self) -> Result<Outcome, ControllerError> {
        self.submit(Command::Refresh).outcome().await
    }

    pub async fn on_reach_end(&self) -> Result<Outcome, ControllerError> {
        self.submit(Command::LoadMore).outcome().await
    }

    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot<T>> {
        self.updates.clone()
    }

    pub fn snapshot(&self) -> ListSnapshot<T> {
        self.updates.borrow().clone()
    }
}

impl<D, S> PaginationController<D, S>
where
    D: DataSource,
    S: KeyValueStore + 'static,
{
    /// Move the controller into a task and return its handle.
    ///
    /// The task ends once every handle has been dropped.
    pub fn spawn(self) -> (ListHandle<D::Entity>, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = ListHandle {
            tx,
            updates: self.subscribe(),
        };
        let task = tokio::spawn(self.run(rx));
        (handle, task)
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Request>) {
        let mut queued: VecDeque<Batch> = VecDeque::new();
        loop {
            let batch = match queued.pop_front() {
                Some(batch) => batch,
                None => match rx.recv().await {
                    Some(request) => Batch {
                        command: request.command,
                        replies: vec![request.reply],
                    },
                    None => break,
                },
            };

            let result = self.execute(batch.command).await;
            for reply in batch.replies {
                let _ = reply.send(result.clone());
            }

            // Settle whatever arrived while that operation was in flight
            while let Ok(late) = rx.try_recv() {
                match late.command {
                    Command::LoadMore => {
                        debug!("Rejecting load-more queued behind another operation");
                        let _ = late.reply.send(Ok(Outcome::Rejected(RejectReason::Busy)));
                    }
                    command => match queued.back_mut() {
                        Some(last) if last.command == command => {
                            debug!(?command, "Coalescing with queued command");
                            last.replies.push(late.reply);
                        }
                        _ => queued.push_back(Batch {
                            command,
                            replies: vec![late.reply],
                        }),
                    },
                }
            }
        }
        debug!("List controller stopped");
    }

    async fn execute(&mut self, command: Command) -> Result<Outcome, ControllerError> {
        match command {
            Command::Startup => self.startup().await,
            Command::Refresh => self.refresh().await,
            Command::LoadMore => self.load_more().await,
        }
    }
}
