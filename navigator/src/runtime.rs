use std::future::pending;
use std::time::Duration;

use crate::debounce::Debouncer;
use crate::events::Invalidation;
use crate::events::InvalidationListener;
use crate::navigator::Navigator;
use crate::navigator::NavigatorSnapshot;
use crate::query::QueryChange;
use crate::query::QueryWatcher;
use crate::query::SharedQuery;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio::time::sleep_until;
use tracing::debug;

/// Requests a front end can make of a running navigator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavCommand {
    First,
    Last,
    Next,
    Previous,
    Random,
    Reload,
    Activate,
    Export,
    Shutdown,
}

/// Cloneable handle to a navigator running on its own task.
#[derive(Clone)]
pub struct NavigatorHandle {
    commands: mpsc::Sender<NavCommand>,
    updates: watch::Receiver<NavigatorSnapshot>,
    query: SharedQuery,
}

impl NavigatorHandle {
    /// Queue a command. Returns `false` once the navigator has stopped.
    pub async fn send(&self, command: NavCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }

    /// Filter, sort key and direction, shared with the running navigator.
    pub fn query(&self) -> &SharedQuery {
        &self.query
    }

    pub fn updates(&self) -> watch::Receiver<NavigatorSnapshot> {
        self.updates.clone()
    }

    pub fn snapshot(&self) -> NavigatorSnapshot {
        self.updates.borrow().clone()
    }
}

/// Drives a [`Navigator`] from commands, query edits and collection
/// notifications.
///
/// Filter edits are debounced; sort and direction changes act immediately.
pub struct NavigatorRuntime {
    navigator: Navigator,
    watcher: Option<QueryWatcher>,
    listener: Option<InvalidationListener>,
    debouncer: Debouncer,
    commands: mpsc::Receiver<NavCommand>,
}

impl NavigatorRuntime {
    pub fn new(
        navigator: Navigator,
        listener: Option<InvalidationListener>,
        quiet_period: Duration,
    ) -> (Self, NavigatorHandle) {
        let (tx, rx) = mpsc::channel(32);
        let handle = NavigatorHandle {
            commands: tx,
            updates: navigator.subscribe(),
            query: navigator.query().clone(),
        };
        let runtime = Self {
            watcher: Some(navigator.query().subscribe()),
            navigator,
            listener,
            debouncer: Debouncer::new(quiet_period),
            commands: rx,
        };
        (runtime, handle)
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        self.navigator.load_count().await;
        loop {
            let deadline = self.debouncer.deadline();
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(NavCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                change = next_query_change(&mut self.watcher) => match change {
                    Some(change) => self.handle_query_change(change).await,
                    None => self.watcher = None,
                },
                invalidation = next_invalidation(&mut self.listener) => match invalidation {
                    Some(invalidation) => self.navigator.apply_invalidation(invalidation).await,
                    None => {
                        debug!("notification streams closed");
                        self.listener = None;
                    }
                },
                () = wait_for(deadline) => {
                    if self.debouncer.fire(Instant::now()) {
                        self.navigator.load_count().await;
                    }
                }
            }
        }
        debug!("navigator shutting down");
        if let Some(listener) = self.listener.take() {
            listener.dispose();
        }
        self.navigator.dispose();
    }

    async fn handle_command(&mut self, command: NavCommand) {
        debug!(?command, "navigator command");
        match command {
            NavCommand::First => self.navigator.first().await,
            NavCommand::Last => self.navigator.last().await,
            NavCommand::Next => self.navigator.next().await,
            NavCommand::Previous => self.navigator.previous().await,
            NavCommand::Random => self.navigator.random().await,
            NavCommand::Reload => {
                self.debouncer.cancel();
                self.navigator.reload().await;
            }
            NavCommand::Activate => self.navigator.activate(),
            NavCommand::Export => {
                let _ = self.navigator.export_observations();
            }
            NavCommand::Shutdown => {}
        }
    }

    async fn handle_query_change(&mut self, change: QueryChange) {
        if change.filter {
            self.debouncer.poke(Instant::now());
        }
        if change.ordering {
            self.navigator.adjust_index().await;
        }
    }
}

async fn next_query_change(watcher: &mut Option<QueryWatcher>) -> Option<QueryChange> {
    match watcher {
        Some(watcher) => watcher.changed().await,
        None => pending().await,
    }
}

async fn next_invalidation(listener: &mut Option<InvalidationListener>) -> Option<Invalidation> {
    match listener {
        Some(listener) => listener.next().await,
        None => pending().await,
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}
