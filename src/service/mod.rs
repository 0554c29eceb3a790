//! The imperative shell around the registry and engine.
//!
//! A single tokio task owns the [`FenceRegistry`] and [`TransitionEngine`]
//! and handles client requests, provider callbacks, and re-poll timers one
//! at a time. Engine commands are executed here; re-poll timers are sleeping
//! tasks guarded by a [`tokio_util::sync::CancellationToken`] that post back
//! into the loop.

pub mod error;
mod handle;
mod timers;

pub use error::ServiceError;
pub use handle::{ServiceHandle, SessionSnapshot};

use crate::config::GeoFenceConfig;
use crate::engine::{EngineCommand, EngineInput, TransitionEngine};
use crate::notify::NotificationSink;
use crate::provider::{AuthorizationLevel, ProviderEvent, RegionProvider};
use crate::registry::FenceRegistry;
use crate::store::{FenceStore, JsonFileStore};
use handle::{Message, Request};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use timers::PollTimers;

struct PollDue {
    identifier: String,
    ticket: u64,
}

/// Geofence monitoring service.
///
/// Build it with [`new`](Self::new), then [`start`](Self::start) it inside a
/// tokio runtime to get a [`ServiceHandle`].
pub struct GeoFenceService {
    registry: FenceRegistry,
    engine: TransitionEngine,
    provider: Arc<dyn RegionProvider>,
    sink: Arc<dyn NotificationSink>,
    foreground: bool,
    timers: PollTimers,
    timer_tx: mpsc::UnboundedSender<PollDue>,
    timer_rx: mpsc::UnboundedReceiver<PollDue>,
}

impl GeoFenceService {
    pub fn new(
        config: GeoFenceConfig,
        provider: Arc<dyn RegionProvider>,
        store: Box<dyn FenceStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        Self {
            registry: FenceRegistry::new(Arc::clone(&provider), store, config.registry),
            engine: TransitionEngine::new(config.engine),
            provider,
            sink,
            foreground: true,
            timers: PollTimers::default(),
            timer_tx,
            timer_rx,
        }
    }

    /// Build a service persisting to the JSON file named in `config.store`.
    pub fn with_file_store(
        config: GeoFenceConfig,
        provider: Arc<dyn RegionProvider>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let store = JsonFileStore::new(config.store.path.clone());
        Self::new(config, provider, Box::new(store), sink)
    }

    /// Restore persisted fences and spawn the event loop.
    ///
    /// Fences the provider still monitors get a live session right away;
    /// the rest stay registered but silent until added again. Authorization
    /// is requested if the user has not been asked yet.
    pub fn start(mut self) -> (ServiceHandle, JoinHandle<()>) {
        if let Err(e) = self.registry.load_all() {
            tracing::error!(error = %e, "Failed to load stored fences, starting empty");
        }

        let monitored = self.provider.monitored_identifiers();
        for fence in self.registry.fences() {
            if monitored.contains(fence.identifier()) {
                self.engine.adopt(fence);
            } else {
                tracing::warn!(
                    identifier = fence.identifier(),
                    "Stored fence is not monitored by the provider"
                );
            }
        }

        if self.provider.authorization_level() == AuthorizationLevel::NotDetermined {
            tracing::info!("Requesting always authorization");
            self.provider.request_always_authorization();
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(rx));
        (ServiceHandle::new(tx), task)
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Message>) {
        tracing::info!(
            fences = self.registry.len(),
            sessions = self.engine.session_count(),
            "Geofence service started"
        );

        loop {
            tokio::select! {
                biased;

                Some(due) = self.timer_rx.recv() => self.on_poll_due(due),

                message = rx.recv() => match message {
                    Some(Message::Shutdown) | None => break,
                    Some(Message::Provider(event)) => self.on_provider_event(event),
                    Some(Message::Request(request)) => self.on_request(request),
                    Some(Message::SetForeground(foreground)) => {
                        tracing::debug!(foreground, "Application state changed");
                        self.foreground = foreground;
                    }
                },
            }
        }

        self.timers.cancel_all();
        tracing::info!("Geofence service stopped");
    }

    fn on_provider_event(&mut self, event: ProviderEvent) {
        tracing::trace!(event = event.name(), "Provider event");
        let location = self.provider.location_available();
        let commands = self
            .engine
            .handle(EngineInput::Provider(event), &self.registry, location);
        self.execute(commands);
    }

    fn on_poll_due(&mut self, due: PollDue) {
        self.timers.fired(&due.identifier, due.ticket);
        let location = self.provider.location_available();
        let commands = self.engine.handle(
            EngineInput::PollDue {
                identifier: due.identifier,
                ticket: due.ticket,
            },
            &self.registry,
            location,
        );
        self.execute(commands);
    }

    fn on_request(&mut self, request: Request) {
        // A dropped reply receiver just means the caller stopped waiting.
        match request {
            Request::Add {
                center,
                raw_radius,
                note,
                trigger_on,
                reply,
            } => {
                let result = self.registry.add(center, raw_radius, note, trigger_on);
                if let Ok(fence) = &result {
                    self.engine.monitoring_requested(fence.identifier());
                }
                let _ = reply.send(result);
            }
            Request::Remove { identifier, reply } => {
                let commands = self.engine.stop(&identifier);
                self.execute(commands);
                let _ = reply.send(self.registry.remove(&identifier));
            }
            Request::RemoveAll { reply } => {
                let commands = self.engine.stop_all();
                self.execute(commands);
                let _ = reply.send(self.registry.remove_all());
            }
            Request::Find { identifier, reply } => {
                let _ = reply.send(self.registry.find(&identifier).cloned());
            }
            Request::List { reply } => {
                let _ = reply.send(self.registry.fences().to_vec());
            }
            Request::CanAddMore { reply } => {
                let _ = reply.send(self.registry.can_add_more());
            }
            Request::Session { identifier, reply } => {
                let snapshot = self
                    .engine
                    .session(&identifier)
                    .map(|session| SessionSnapshot {
                        phase: session.phase(),
                        last_known: session.last_known(),
                        poll_budget: session.poll_budget(),
                        poll_in_flight: session.poll_in_flight(),
                    });
                let _ = reply.send(snapshot);
            }
        }
    }

    fn execute(&mut self, commands: Vec<EngineCommand>) {
        for command in commands {
            match command {
                EngineCommand::RequestState { identifier } => {
                    self.provider.request_state(&identifier);
                }
                EngineCommand::SchedulePoll {
                    identifier,
                    delay,
                    ticket,
                } => self.schedule_poll(identifier, delay, ticket),
                EngineCommand::CancelPoll { identifier } => self.timers.cancel(&identifier),
                EngineCommand::StopMonitoring { identifier } => {
                    self.provider.stop_monitoring(&identifier);
                }
                EngineCommand::Evicted { identifier } => {
                    self.registry.remove(&identifier);
                }
                EngineCommand::Transition(transition) => {
                    self.sink
                        .notify(&transition.note, transition.is_inside, self.foreground);
                }
                EngineCommand::MonitoringFailed(failure) => {
                    self.sink.monitoring_failed(&failure.identifier);
                }
            }
        }
    }

    fn schedule_poll(&mut self, identifier: String, delay: Duration, ticket: u64) {
        let token = self.timers.arm(identifier.clone(), ticket);

        let tx = self.timer_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = tx.send(PollDue { identifier, ticket });
                }
            }
        });
    }
}
