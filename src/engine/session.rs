//! Per-fence monitoring session.

use crate::core::{PhaseChange, PhaseHistory, Presence, SessionPhase};
use crate::fence::{FenceRecord, TriggerOn};
use chrono::Utc;

/// State the engine keeps for one monitored fence.
///
/// Created on the provider's `started` callback and dropped on stop,
/// eviction, or monitoring failure. The fence's trigger and note are
/// captured at creation; a fence's fields never change while monitored.
#[derive(Clone, Debug)]
pub struct MonitoringSession {
    identifier: String,
    note: String,
    trigger_on: TriggerOn,
    phase: SessionPhase,
    last_known: Presence,
    poll_budget: u32,
    poll_in_flight: bool,
    /// Ticket of the re-poll timer currently scheduled, if any.
    pending_ticket: Option<u64>,
    history: PhaseHistory,
}

impl MonitoringSession {
    pub(crate) fn new(fence: &FenceRecord) -> Self {
        Self {
            identifier: fence.identifier().to_string(),
            note: fence.note().to_string(),
            trigger_on: fence.trigger_on(),
            phase: SessionPhase::Unmonitored,
            last_known: Presence::Unknown,
            poll_budget: 0,
            poll_in_flight: false,
            pending_ticket: None,
            history: PhaseHistory::new(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn trigger_on(&self) -> TriggerOn {
        self.trigger_on
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn last_known(&self) -> Presence {
        self.last_known
    }

    pub fn poll_budget(&self) -> u32 {
        self.poll_budget
    }

    pub fn poll_in_flight(&self) -> bool {
        self.poll_in_flight
    }

    pub fn pending_ticket(&self) -> Option<u64> {
        self.pending_ticket
    }

    pub fn history(&self) -> &PhaseHistory {
        &self.history
    }

    pub(crate) fn set_last_known(&mut self, presence: Presence) {
        self.last_known = presence;
    }

    pub(crate) fn move_to(&mut self, to: SessionPhase, cause: &str) {
        if self.phase == to {
            return;
        }
        self.history.record(PhaseChange {
            from: self.phase,
            to,
            timestamp: Utc::now(),
            cause: cause.to_string(),
        });
        self.phase = to;
    }

    pub(crate) fn begin_polling(&mut self, budget: u32, cause: &str) {
        self.poll_budget = budget;
        self.poll_in_flight = true;
        self.pending_ticket = None;
        self.move_to(SessionPhase::Polling, cause);
    }

    /// Spend one retry. Returns `false` when the budget is already empty.
    pub(crate) fn consume_budget(&mut self) -> bool {
        if self.poll_budget == 0 {
            return false;
        }
        self.poll_budget -= 1;
        true
    }

    pub(crate) fn arm_timer(&mut self, ticket: u64) {
        self.pending_ticket = Some(ticket);
    }

    /// Clear the pending timer if `ticket` is the one armed.
    pub(crate) fn fire_timer(&mut self, ticket: u64) -> bool {
        if self.pending_ticket == Some(ticket) {
            self.pending_ticket = None;
            true
        } else {
            false
        }
    }

    /// Leave polling. Returns the ticket of a timer that must be cancelled.
    pub(crate) fn end_polling(&mut self, clear_budget: bool, cause: &str) -> Option<u64> {
        self.poll_in_flight = false;
        if clear_budget {
            self.poll_budget = 0;
        }
        self.move_to(SessionPhase::Steady, cause);
        self.pending_ticket.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fence::Coordinate;

    fn session() -> MonitoringSession {
        MonitoringSession::new(&FenceRecord::new(
            "F1",
            Coordinate::new(35.0, 139.0),
            500.0,
            "Home",
            TriggerOn::OnEntry,
        ))
    }

    #[test]
    fn new_session_is_unknown_and_idle() {
        let session = session();
        assert_eq!(session.note(), "Home");
        assert_eq!(session.last_known(), Presence::Unknown);
        assert_eq!(session.phase(), SessionPhase::Unmonitored);
        assert!(!session.poll_in_flight());
    }

    #[test]
    fn budget_stops_at_zero() {
        let mut session = session();
        session.begin_polling(2, "started");
        assert!(session.consume_budget());
        assert!(session.consume_budget());
        assert!(!session.consume_budget());
        assert_eq!(session.poll_budget(), 0);
    }

    #[test]
    fn only_armed_ticket_fires() {
        let mut session = session();
        session.arm_timer(7);
        assert!(!session.fire_timer(6));
        assert!(session.fire_timer(7));
        assert!(!session.fire_timer(7));
    }

    #[test]
    fn end_polling_returns_pending_timer() {
        let mut session = session();
        session.begin_polling(10, "started");
        session.arm_timer(3);
        assert_eq!(session.end_polling(true, "state_determined"), Some(3));
        assert_eq!(session.poll_budget(), 0);
        assert!(!session.poll_in_flight());
        assert_eq!(
            session.history().get_path(),
            vec![
                SessionPhase::Unmonitored,
                SessionPhase::Polling,
                SessionPhase::Steady
            ]
        );
    }
}
