//! Pending re-poll timers.

use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// At most one armed timer per identifier, tagged with its ticket.
#[derive(Debug, Default)]
pub(crate) struct PollTimers {
    armed: HashMap<String, (u64, CancellationToken)>,
}

impl PollTimers {
    /// Track a new timer, cancelling whatever was armed before it.
    pub(crate) fn arm(&mut self, identifier: String, ticket: u64) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some((_, previous)) = self.armed.insert(identifier, (ticket, token.clone())) {
            previous.cancel();
        }
        token
    }

    /// Forget a timer that fired. A ticket that is no longer armed leaves
    /// the current entry alone.
    pub(crate) fn fired(&mut self, identifier: &str, ticket: u64) {
        if matches!(self.armed.get(identifier), Some((armed, _)) if *armed == ticket) {
            self.armed.remove(identifier);
        }
    }

    pub(crate) fn cancel(&mut self, identifier: &str) {
        if let Some((_, token)) = self.armed.remove(identifier) {
            token.cancel();
        }
    }

    pub(crate) fn cancel_all(&mut self) {
        for (_, (_, token)) in self.armed.drain() {
            token.cancel();
        }
    }

    #[cfg(test)]
    fn ticket(&self, identifier: &str) -> Option<u64> {
        self.armed.get(identifier).map(|(ticket, _)| *ticket)
    }
}
