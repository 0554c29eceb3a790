//! The region-transition state machine.

use super::output::{
    EngineCommand, EngineInput, FenceLookup, FenceMonitoringFailed, FenceTransition,
};
use super::session::MonitoringSession;
use crate::config::EngineConfig;
use crate::core::{Presence, SessionPhase};
use crate::fence::{FenceRecord, TriggerOn};
use crate::provider::{ProviderEvent, RegionState};
use std::collections::{HashMap, HashSet};

/// Reconciles provider callbacks into one notification per crossing.
///
/// Sessions are independent and keyed by fence identifier. Every input for
/// an identifier without a session is a silent no-op, so late callbacks for
/// removed or evicted fences are harmless.
///
/// An `entered` callback is reported only when the session does not already
/// know the device is inside. Entry fences are registered without exit
/// callbacks, so after one IN such a fence stays silent until something
/// reports the device outside: an `exited` callback or an `Outside` state
/// answer, solicited or not. A provider that honours the registration flags
/// therefore yields at most one IN per entry fence unless the caller asks
/// for the region state again.
#[derive(Debug)]
pub struct TransitionEngine {
    config: EngineConfig,
    sessions: HashMap<String, MonitoringSession>,
    starting: HashSet<String>,
    next_ticket: u64,
}

impl TransitionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            sessions: HashMap::new(),
            starting: HashSet::new(),
            next_ticket: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn session(&self, identifier: &str) -> Option<&MonitoringSession> {
        self.sessions.get(identifier)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn phase(&self, identifier: &str) -> SessionPhase {
        match self.sessions.get(identifier) {
            Some(session) => session.phase(),
            None if self.starting.contains(identifier) => SessionPhase::Starting,
            None => SessionPhase::Unmonitored,
        }
    }

    /// Note that monitoring was requested and a `started` callback is due.
    pub fn monitoring_requested(&mut self, identifier: &str) {
        if !self.sessions.contains_key(identifier) {
            self.starting.insert(identifier.to_string());
        }
    }

    /// Resume a session for a fence the provider kept monitoring across a
    /// restart. No `started` callback arrives for such regions.
    pub fn adopt(&mut self, fence: &FenceRecord) {
        if self.sessions.contains_key(fence.identifier()) {
            return;
        }
        let mut session = MonitoringSession::new(fence);
        session.move_to(SessionPhase::Steady, "restored");
        tracing::debug!(identifier = fence.identifier(), "Monitoring session restored");
        self.sessions.insert(fence.identifier().to_string(), session);
    }

    /// Destroy the session after an explicit removal.
    ///
    /// Stopping the provider is the caller's job; the returned commands only
    /// cancel a pending re-poll.
    pub fn stop(&mut self, identifier: &str) -> Vec<EngineCommand> {
        self.starting.remove(identifier);
        let Some(mut session) = self.sessions.remove(identifier) else {
            return Vec::new();
        };
        let phase = session.phase();
        session.move_to(SessionPhase::Unmonitored, "stop");
        tracing::debug!(
            identifier,
            %phase,
            active_for = ?session.history().duration(),
            "Session stopped"
        );
        cancel_command(identifier, session.pending_ticket())
            .into_iter()
            .collect()
    }

    /// Destroy every session.
    pub fn stop_all(&mut self) -> Vec<EngineCommand> {
        let identifiers: Vec<String> = self.sessions.keys().cloned().collect();
        self.starting.clear();
        identifiers
            .iter()
            .flat_map(|identifier| self.stop(identifier))
            .collect()
    }

    /// Process one input.
    ///
    /// `location_available` reflects the provider's fix at the moment the
    /// input is handled; region callbacks without a fix are dropped.
    pub fn handle(
        &mut self,
        input: EngineInput,
        fences: &dyn FenceLookup,
        location_available: bool,
    ) -> Vec<EngineCommand> {
        match input {
            EngineInput::PollDue { identifier, ticket } => self.on_poll_due(&identifier, ticket),
            EngineInput::Provider(event) => {
                if event.needs_location() && !location_available {
                    tracing::debug!(
                        event = event.name(),
                        identifier = event.identifier().unwrap_or_default(),
                        "Dropping region event without a location fix"
                    );
                    return Vec::new();
                }
                self.on_provider_event(event, fences)
            }
        }
    }

    fn on_provider_event(
        &mut self,
        event: ProviderEvent,
        fences: &dyn FenceLookup,
    ) -> Vec<EngineCommand> {
        match event {
            ProviderEvent::Started { identifier } => self.on_started(identifier, fences),
            ProviderEvent::Entered { identifier } => self.on_crossing(&identifier, true),
            ProviderEvent::Exited { identifier } => self.on_crossing(&identifier, false),
            ProviderEvent::StateDetermined { identifier, state } => {
                self.on_state_determined(&identifier, state)
            }
            ProviderEvent::MonitoringFailed { identifier, error } => {
                self.on_monitoring_failed(identifier, error, fences)
            }
            ProviderEvent::AuthorizationChanged { level } => {
                tracing::info!(%level, "Location authorization changed");
                Vec::new()
            }
            ProviderEvent::Failed { error } => {
                tracing::warn!(%error, "Location provider error");
                Vec::new()
            }
        }
    }

    fn on_started(&mut self, identifier: String, fences: &dyn FenceLookup) -> Vec<EngineCommand> {
        if let Some(existing) = self.sessions.get(&identifier) {
            tracing::error!(
                identifier = %identifier,
                phase = %existing.phase(),
                "Duplicate started callback for an active session, ignoring"
            );
            return Vec::new();
        }
        let was_starting = self.starting.remove(&identifier);

        let Some(fence) = fences.fence(&identifier) else {
            tracing::warn!(identifier = %identifier, "Monitoring started for an unknown fence");
            return Vec::new();
        };

        let mut session = MonitoringSession::new(fence);
        if was_starting {
            session.move_to(SessionPhase::Starting, "monitoring_requested");
        }

        let commands = match session.trigger_on() {
            TriggerOn::OnExit => {
                session.move_to(SessionPhase::Steady, "started");
                Vec::new()
            }
            TriggerOn::OnEntry => {
                // The device may already be inside; the provider reports no
                // entry in that case, so ask for the state right away.
                session.begin_polling(self.config.poll_budget, "started");
                vec![EngineCommand::RequestState {
                    identifier: identifier.clone(),
                }]
            }
        };

        tracing::info!(
            identifier = %identifier,
            trigger = session.trigger_on().label(),
            phase = %session.phase(),
            "Monitoring session created"
        );
        self.sessions.insert(identifier, session);
        commands
    }

    fn on_crossing(&mut self, identifier: &str, is_inside: bool) -> Vec<EngineCommand> {
        let cause = if is_inside { "entered" } else { "exited" };
        let Some(session) = self.sessions.get_mut(identifier) else {
            tracing::debug!(identifier, event = cause, "No session, ignoring");
            return Vec::new();
        };

        let mut commands = Vec::new();
        if session.phase() == SessionPhase::Polling {
            let pending = session.end_polling(true, cause);
            commands.extend(cancel_command(identifier, pending));
        }

        let reports = if is_inside {
            session.trigger_on() == TriggerOn::OnEntry && !session.last_known().is_inside()
        } else {
            session.trigger_on() == TriggerOn::OnExit
        };
        if reports {
            commands.push(transition(session, is_inside));
        } else if is_inside && session.trigger_on() == TriggerOn::OnEntry {
            tracing::debug!(identifier, "Already inside, entry not reported again");
        }
        session.set_last_known(Presence::from_inside(is_inside));
        commands
    }

    fn on_state_determined(&mut self, identifier: &str, state: RegionState) -> Vec<EngineCommand> {
        let Some(session) = self.sessions.get_mut(identifier) else {
            tracing::debug!(identifier, ?state, "No session, ignoring state");
            return Vec::new();
        };

        if session.phase() != SessionPhase::Polling {
            // Unsolicited answer: refresh what we know without notifying.
            match state {
                RegionState::Inside => session.set_last_known(Presence::Inside),
                RegionState::Outside => session.set_last_known(Presence::Outside),
                RegionState::Unknown => {}
            }
            return Vec::new();
        }

        match state {
            RegionState::Inside => {
                let mut commands: Vec<EngineCommand> =
                    cancel_command(identifier, session.end_polling(false, "state_inside"))
                        .into_iter()
                        .collect();
                if !session.last_known().is_inside() {
                    commands.push(transition(session, true));
                }
                session.set_last_known(Presence::Inside);
                commands
            }
            RegionState::Outside => {
                session.set_last_known(Presence::Outside);
                cancel_command(identifier, session.end_polling(true, "state_outside"))
                    .into_iter()
                    .collect()
            }
            RegionState::Unknown => self.on_ambiguous(identifier),
        }
    }

    fn on_ambiguous(&mut self, identifier: &str) -> Vec<EngineCommand> {
        let Some(session) = self.sessions.get_mut(identifier) else {
            return Vec::new();
        };

        if session.pending_ticket().is_some() {
            tracing::debug!(identifier, "Re-poll already scheduled, ignoring ambiguous state");
            return Vec::new();
        }

        if session.consume_budget() {
            let ticket = self.next_ticket;
            self.next_ticket += 1;
            session.arm_timer(ticket);
            tracing::debug!(
                identifier,
                budget = session.poll_budget(),
                ticket,
                "Ambiguous region state, re-poll scheduled"
            );
            return vec![EngineCommand::SchedulePoll {
                identifier: identifier.to_string(),
                delay: self.config.poll_interval(),
                ticket,
            }];
        }

        session.move_to(SessionPhase::Unmonitored, "evicted");
        tracing::warn!(
            identifier,
            budget = self.config.poll_budget,
            active_for = ?session.history().duration(),
            "Region state still ambiguous after retry budget, evicting fence"
        );
        self.sessions.remove(identifier);
        vec![
            EngineCommand::StopMonitoring {
                identifier: identifier.to_string(),
            },
            EngineCommand::Evicted {
                identifier: identifier.to_string(),
            },
        ]
    }

    fn on_poll_due(&mut self, identifier: &str, ticket: u64) -> Vec<EngineCommand> {
        let Some(session) = self.sessions.get_mut(identifier) else {
            return Vec::new();
        };
        if session.phase() != SessionPhase::Polling || !session.fire_timer(ticket) {
            tracing::debug!(identifier, ticket, "Stale re-poll timer, ignoring");
            return Vec::new();
        }
        vec![EngineCommand::RequestState {
            identifier: identifier.to_string(),
        }]
    }

    fn on_monitoring_failed(
        &mut self,
        identifier: String,
        error: String,
        fences: &dyn FenceLookup,
    ) -> Vec<EngineCommand> {
        tracing::warn!(identifier = %identifier, %error, "Region monitoring failed");
        self.starting.remove(&identifier);

        let mut commands = Vec::new();
        if let Some(session) = self.sessions.remove(&identifier) {
            commands.extend(cancel_command(&identifier, session.pending_ticket()));
        }
        let note = fences
            .fence(&identifier)
            .map(|fence| fence.note().to_string());
        commands.push(EngineCommand::MonitoringFailed(FenceMonitoringFailed {
            identifier,
            note,
            error,
        }));
        commands
    }
}

fn cancel_command(identifier: &str, pending: Option<u64>) -> Option<EngineCommand> {
    pending.map(|_| EngineCommand::CancelPoll {
        identifier: identifier.to_string(),
    })
}

fn transition(session: &MonitoringSession, is_inside: bool) -> EngineCommand {
    tracing::info!(
        identifier = session.identifier(),
        inside = is_inside,
        "Fence transition"
    );
    EngineCommand::Transition(FenceTransition {
        identifier: session.identifier().to_string(),
        note: session.note().to_string(),
        is_inside,
    })
}
