//! Requester configuration, stats and event types.

use crate::error::ToiError;
use crate::link::DEFAULT_LINK_NAME;
use crate::types::{Attributes, ToiId};
use serde::{Deserialize, Serialize};

/// Number of dropped objects kept cached when no capacity is configured.
pub const DEFAULT_RETAIN: usize = 0;

/// Configuration for a requester.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequesterConfig {
    /// Type name of the tracked objects.
    pub toc_ident: String,

    /// Attributes requested for every object, in order.
    pub attr_list: Vec<String>,

    /// Capacity of the pool of dropped-but-cached objects.
    /// Default: 0 (drop evicts immediately)
    #[serde(default = "default_retain")]
    pub retain: usize,

    /// Link name passed to the transport.
    /// Default: "Request"
    #[serde(default = "default_link_name")]
    pub link_name: String,
}

fn default_retain() -> usize {
    DEFAULT_RETAIN
}

fn default_link_name() -> String {
    DEFAULT_LINK_NAME.to_string()
}

impl RequesterConfig {
    /// Configuration for objects of type `toc_ident` with default retention.
    pub fn new(toc_ident: impl Into<String>, attr_list: &[&str]) -> Self {
        Self {
            toc_ident: toc_ident.into(),
            attr_list: attr_list.iter().map(|a| a.to_string()).collect(),
            retain: DEFAULT_RETAIN,
            link_name: default_link_name(),
        }
    }

    /// Set the retention pool capacity.
    pub fn with_retain(mut self, retain: usize) -> Self {
        self.retain = retain;
        self
    }

    /// Set the transport link name.
    pub fn with_link_name(mut self, link_name: impl Into<String>) -> Self {
        self.link_name = link_name.into();
        self
    }

    /// How many of the oldest dropped objects are evicted once the pool
    /// overflows: a fifth of the capacity, at least one.
    pub fn evict_batch(&self) -> usize {
        (self.retain / 5).max(1)
    }
}

/// Snapshot of requester bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequesterStats {
    pub tracked: usize,
    pub untracked: usize,
    /// Objects with a data entry, pending or not.
    pub cached: usize,
    /// Objects whose first diff has arrived.
    pub loaded: usize,
    /// Open subscriptions.
    pub links: usize,
}

/// Notification delivered through an [`EventStream`].
#[derive(Clone, Debug)]
pub enum ToiEvent {
    /// Fresh merged attributes for a tracked object.
    Data { toid: ToiId, attrs: Attributes },
    /// A tracked object failed and was removed from the cache.
    Error { toid: ToiId, error: ToiError },
}

impl ToiEvent {
    /// Object the event is about.
    pub fn toid(&self) -> &ToiId {
        match self {
            ToiEvent::Data { toid, .. } | ToiEvent::Error { toid, .. } => toid,
        }
    }
}

/// Receiving side of a requester created with `ToiRequester::with_events`.
pub struct EventStream {
    pub(crate) receiver: crossbeam_channel::Receiver<ToiEvent>,
}

impl EventStream {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<ToiEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<ToiEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<ToiEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Number of buffered events.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// True if no events are buffered.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
