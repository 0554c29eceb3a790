//! Client handle for a running service.

use super::error::ServiceError;
use crate::core::{Presence, SessionPhase};
use crate::fence::{Coordinate, FenceRecord, TriggerOn};
use crate::provider::ProviderEvent;
use crate::registry::RegistryError;
use tokio::sync::{mpsc, oneshot};

/// Point-in-time view of a monitoring session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub last_known: Presence,
    pub poll_budget: u32,
    pub poll_in_flight: bool,
}

pub(crate) enum Request {
    Add {
        center: Coordinate,
        raw_radius: f64,
        note: String,
        trigger_on: TriggerOn,
        reply: oneshot::Sender<Result<FenceRecord, RegistryError>>,
    },
    Remove {
        identifier: String,
        reply: oneshot::Sender<Option<FenceRecord>>,
    },
    RemoveAll {
        reply: oneshot::Sender<usize>,
    },
    Find {
        identifier: String,
        reply: oneshot::Sender<Option<FenceRecord>>,
    },
    List {
        reply: oneshot::Sender<Vec<FenceRecord>>,
    },
    CanAddMore {
        reply: oneshot::Sender<bool>,
    },
    Session {
        identifier: String,
        reply: oneshot::Sender<Option<SessionSnapshot>>,
    },
}

pub(crate) enum Message {
    Provider(ProviderEvent),
    Request(Request),
    SetForeground(bool),
    Shutdown,
}

/// Cloneable handle to a running [`super::GeoFenceService`].
///
/// Every call is queued onto the service's single event loop, so calls and
/// provider events are handled strictly one at a time in arrival order.
#[derive(Clone, Debug)]
pub struct ServiceHandle {
    tx: mpsc::UnboundedSender<Message>,
}

impl ServiceHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Message>) -> Self {
        Self { tx }
    }

    fn send(&self, message: Message) -> Result<(), ServiceError> {
        self.tx.send(message).map_err(|_| ServiceError::Stopped)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Request,
    ) -> Result<T, ServiceError> {
        let (reply, response) = oneshot::channel();
        self.send(Message::Request(build(reply)))?;
        response.await.map_err(|_| ServiceError::Stopped)
    }

    /// Forward a provider callback to the engine.
    pub fn deliver(&self, event: ProviderEvent) -> Result<(), ServiceError> {
        self.send(Message::Provider(event))
    }

    /// Record whether the application is in the foreground.
    pub fn set_foreground(&self, foreground: bool) -> Result<(), ServiceError> {
        self.send(Message::SetForeground(foreground))
    }

    pub async fn add(
        &self,
        center: Coordinate,
        raw_radius: f64,
        note: impl Into<String>,
        trigger_on: TriggerOn,
    ) -> Result<FenceRecord, ServiceError> {
        let note = note.into();
        let result = self
            .request(|reply| Request::Add {
                center,
                raw_radius,
                note,
                trigger_on,
                reply,
            })
            .await?;
        Ok(result?)
    }

    pub async fn remove(&self, identifier: &str) -> Result<Option<FenceRecord>, ServiceError> {
        let identifier = identifier.to_string();
        self.request(|reply| Request::Remove { identifier, reply })
            .await
    }

    pub async fn remove_all(&self) -> Result<usize, ServiceError> {
        self.request(|reply| Request::RemoveAll { reply }).await
    }

    pub async fn find(&self, identifier: &str) -> Result<Option<FenceRecord>, ServiceError> {
        let identifier = identifier.to_string();
        self.request(|reply| Request::Find { identifier, reply })
            .await
    }

    /// Fences in insertion order.
    pub async fn list(&self) -> Result<Vec<FenceRecord>, ServiceError> {
        self.request(|reply| Request::List { reply }).await
    }

    pub async fn can_add_more(&self) -> Result<bool, ServiceError> {
        self.request(|reply| Request::CanAddMore { reply }).await
    }

    pub async fn session(&self, identifier: &str) -> Result<Option<SessionSnapshot>, ServiceError> {
        let identifier = identifier.to_string();
        self.request(|reply| Request::Session { identifier, reply })
            .await
    }

    /// Ask the loop to exit after the messages already queued.
    pub fn shutdown(&self) -> Result<(), ServiceError> {
        self.send(Message::Shutdown)
    }
}
