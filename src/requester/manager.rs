//! Tracked-object cache on top of a link transport.

use crate::error::ToiError;
use crate::link::{LinkCallback, LinkMessage, LinkRequest, Subscription, Transport};
use crate::types::{merge_attributes, Attributes, ToiId};
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::types::{EventStream, RequesterConfig, RequesterStats, ToiEvent};

/// Consumer callback for fresh data on a tracked object.
pub type DataCallback = Box<dyn Fn(&ToiId, &Attributes) + Send + Sync>;

/// Consumer callback for a tracked object that failed.
pub type ErrorCallback = Box<dyn Fn(&ToiId, &ToiError) + Send + Sync>;

/// Bookkeeping guarded by the requester lock.
struct State {
    /// Cached attributes; `None` while the first diff is outstanding.
    data: HashMap<ToiId, Option<Attributes>>,
    /// Objects the owner currently wants.
    tracked: HashSet<ToiId>,
    /// Dropped objects still cached, least recently dropped first to go.
    untracked: LruCache<ToiId, ()>,
    /// Open subscriptions.
    links: HashMap<ToiId, Box<dyn Subscription>>,
    /// Link attempt still inside `make_link`, per object.
    opening: HashMap<ToiId, u64>,
    /// Attempts torn down by an error before their link handle was stored.
    orphaned: HashSet<u64>,
    next_attempt: u64,
}

impl State {
    fn new() -> Self {
        Self {
            data: HashMap::new(),
            tracked: HashSet::new(),
            untracked: LruCache::unbounded(),
            links: HashMap::new(),
            opening: HashMap::new(),
            orphaned: HashSet::new(),
            next_attempt: 0,
        }
    }

    /// Remove every trace of an object, returning its subscription.
    fn forget(&mut self, toid: &ToiId) -> Option<Box<dyn Subscription>> {
        self.data.remove(toid);
        self.tracked.remove(toid);
        self.untracked.pop(toid);
        self.opening.remove(toid);
        self.links.remove(toid)
    }

    /// Evict the oldest dropped objects, `batch` at a time, until the pool
    /// fits `retain`.
    fn evict(&mut self, retain: usize, batch: usize) -> Vec<Box<dyn Subscription>> {
        let mut links = Vec::new();
        while self.untracked.len() > retain {
            for _ in 0..batch {
                let Some((toid, ())) = self.untracked.pop_lru() else {
                    break;
                };
                self.data.remove(&toid);
                self.opening.remove(&toid);
                if let Some(link) = self.links.remove(&toid) {
                    links.push(link);
                }
                trace!(%toid, "evicted");
            }
        }
        links
    }
}

struct Shared {
    config: RequesterConfig,
    transport: Arc<dyn Transport>,
    state: Mutex<State>,
    on_data: DataCallback,
    on_error: Option<ErrorCallback>,
}

impl Shared {
    fn deliver(&self, toid: &ToiId, message: LinkMessage) {
        match message.into_update() {
            Some(Ok(diff)) => self.apply_diff(toid, diff),
            Some(Err(error)) => self.fail(toid, error),
            None => warn!(%toid, toc = %self.config.toc_ident, "link message without diff or error"),
        }
    }

    fn apply_diff(&self, toid: &ToiId, diff: Attributes) {
        let merged = {
            let mut state = self.state.lock();
            let tracked = state.tracked.contains(toid);
            let Some(entry) = state.data.get_mut(toid) else {
                trace!(%toid, "diff for uncached object ignored");
                return;
            };
            let attrs = entry.get_or_insert_with(Attributes::new);
            merge_attributes(attrs, diff);
            tracked.then(|| attrs.clone())
        };

        if let Some(attrs) = merged {
            (self.on_data)(toid, &attrs);
        }
    }

    fn fail(&self, toid: &ToiId, error: ToiError) {
        let (tracked, link) = {
            let mut state = self.state.lock();
            let tracked = state.tracked.contains(toid);
            let attempt = state.opening.get(toid).copied();
            let link = state.forget(toid);
            if let (None, Some(attempt)) = (&link, attempt) {
                state.orphaned.insert(attempt);
            }
            (tracked, link)
        };

        if tracked {
            warn!(%toid, toc = %self.config.toc_ident, %error, "tracked object failed");
            if let Some(on_error) = &self.on_error {
                on_error(toid, &error);
            }
        } else {
            debug!(%toid, %error, "error for untracked object");
        }

        if let Some(link) = link {
            link.detach();
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let links: Vec<_> = self.state.get_mut().links.drain().map(|(_, l)| l).collect();
        if !links.is_empty() {
            debug!(count = links.len(), "deactivating links of dropped requester");
        }
        for link in links {
            link.deactivate();
        }
    }
}

/// Cache of remotely tracked objects of one type.
///
/// Tracked objects keep a live subscription and report every diff to the
/// data callback. Dropped objects stay subscribed and cached in a bounded
/// pool so that tracking them again is free; once the pool overflows the
/// oldest ones are deactivated and forgotten.
///
/// Cloning yields another handle to the same cache. Callbacks run after the
/// internal lock is released and may call back into the requester.
#[derive(Clone)]
pub struct ToiRequester {
    shared: Arc<Shared>,
}

impl ToiRequester {
    /// Start building a requester.
    pub fn builder(transport: Arc<dyn Transport>, config: RequesterConfig) -> RequesterBuilder {
        RequesterBuilder {
            transport,
            config,
            on_data: None,
            on_error: None,
        }
    }

    /// Create a requester that reports through a bounded event channel.
    ///
    /// When the buffer is full new events are dropped (and logged) rather
    /// than blocking the transport.
    pub fn with_events(
        transport: Arc<dyn Transport>,
        config: RequesterConfig,
        buffer_size: usize,
    ) -> (Self, EventStream) {
        let (sender, receiver) = crossbeam_channel::bounded(buffer_size);
        let error_sender = sender.clone();

        let requester = Self::builder(transport, config)
            .on_data(move |toid, attrs| {
                send_event(
                    &sender,
                    ToiEvent::Data {
                        toid: toid.clone(),
                        attrs: attrs.clone(),
                    },
                )
            })
            .on_error(move |toid, error| {
                send_event(
                    &error_sender,
                    ToiEvent::Error {
                        toid: toid.clone(),
                        error: error.clone(),
                    },
                )
            })
            .build();

        (requester, EventStream { receiver })
    }

    /// Configuration the requester was built with.
    pub fn config(&self) -> &RequesterConfig {
        &self.shared.config
    }

    /// Start tracking an object.
    ///
    /// Returns true if the object is already cached (read it with `get`);
    /// no callback fires for it. Otherwise a subscription is opened and the
    /// data arrives through the data callback.
    pub fn track(&self, toid: impl Into<ToiId>) -> bool {
        let toid = toid.into();
        let attempt = {
            let mut state = self.shared.state.lock();
            if state.data.contains_key(&toid) {
                state.untracked.pop(&toid);
                state.tracked.insert(toid);
                return true;
            }
            state.data.insert(toid.clone(), None);
            state.tracked.insert(toid.clone());
            let attempt = state.next_attempt;
            state.next_attempt += 1;
            state.opening.insert(toid.clone(), attempt);
            attempt
        };

        let config = &self.shared.config;
        debug!(%toid, toc = %config.toc_ident, "subscribing");

        let request = LinkRequest::subscribe(toid.clone(), &config.toc_ident, &config.attr_list);
        let weak = Arc::downgrade(&self.shared);
        let link_toid = toid.clone();
        let callback: LinkCallback = Box::new(move |message| {
            if let Some(shared) = weak.upgrade() {
                shared.deliver(&link_toid, message);
            }
        });
        let link = self
            .shared
            .transport
            .make_link(&config.link_name, request, callback);

        let mut state = self.shared.state.lock();
        if state.orphaned.remove(&attempt) {
            drop(state);
            debug!(%toid, attempt, "link failed while opening");
            link.detach();
        } else if state.opening.get(&toid) == Some(&attempt) {
            state.opening.remove(&toid);
            state.links.insert(toid, link);
        } else {
            drop(state);
            debug!(%toid, "object released while opening link");
            link.deactivate();
        }
        false
    }

    /// Stop tracking an object, keeping it cached in the retention pool.
    ///
    /// Does nothing if the object is not tracked.
    pub fn drop(&self, toid: impl Into<ToiId>) {
        let toid = toid.into();
        let config = &self.shared.config;
        let evicted = {
            let mut state = self.shared.state.lock();
            if !state.tracked.remove(&toid) {
                trace!(%toid, "drop of untracked object ignored");
                return;
            }
            state.untracked.put(toid, ());
            state.evict(config.retain, config.evict_batch())
        };

        if !evicted.is_empty() {
            debug!(count = evicted.len(), toc = %config.toc_ident, "evicting dropped objects");
        }
        for link in evicted {
            link.deactivate();
        }
    }

    /// Handle one message from the link of `toid`.
    ///
    /// Links opened by `track` route here on their own; this is public for
    /// transports that demultiplex messages themselves.
    pub fn deliver(&self, toid: impl Into<ToiId>, message: LinkMessage) {
        self.shared.deliver(&toid.into(), message);
    }

    /// Decode a raw JSON link message and deliver it.
    pub fn deliver_json(&self, toid: impl Into<ToiId>, raw: &str) -> crate::error::Result<()> {
        let message = LinkMessage::from_json(raw)?;
        self.deliver(toid, message);
        Ok(())
    }

    /// Deactivate every subscription and forget all objects.
    pub fn destroy(&self) {
        let links: Vec<_> = {
            let mut state = self.shared.state.lock();
            state.data.clear();
            state.tracked.clear();
            state.untracked.clear();
            state.opening.clear();
            state.links.drain().map(|(_, link)| link).collect()
        };

        debug!(count = links.len(), toc = %self.shared.config.toc_ident, "destroying requester");
        for link in links {
            link.deactivate();
        }
    }

    // --- Inspection ---

    /// Cached attributes of an object, if its data has arrived.
    pub fn get(&self, toid: impl Into<ToiId>) -> Option<Attributes> {
        let toid = toid.into();
        self.shared.state.lock().data.get(&toid).cloned().flatten()
    }

    /// True if the object has a data entry (possibly still pending).
    pub fn contains(&self, toid: impl Into<ToiId>) -> bool {
        let toid = toid.into();
        self.shared.state.lock().data.contains_key(&toid)
    }

    /// True if the owner currently tracks the object.
    pub fn is_tracked(&self, toid: impl Into<ToiId>) -> bool {
        let toid = toid.into();
        self.shared.state.lock().tracked.contains(&toid)
    }

    /// Tracked objects, sorted.
    pub fn tracked(&self) -> Vec<ToiId> {
        let mut tracked: Vec<_> = self.shared.state.lock().tracked.iter().cloned().collect();
        tracked.sort();
        tracked
    }

    /// Dropped-but-cached objects, oldest drop first.
    pub fn untracked(&self) -> Vec<ToiId> {
        let state = self.shared.state.lock();
        state.untracked.iter().rev().map(|(toid, _)| toid.clone()).collect()
    }

    /// Snapshot of the bookkeeping counts.
    pub fn stats(&self) -> RequesterStats {
        let state = self.shared.state.lock();
        RequesterStats {
            tracked: state.tracked.len(),
            untracked: state.untracked.len(),
            cached: state.data.len(),
            loaded: state.data.values().filter(|d| d.is_some()).count(),
            links: state.links.len(),
        }
    }
}

fn send_event(sender: &crossbeam_channel::Sender<ToiEvent>, event: ToiEvent) {
    match sender.try_send(event) {
        Ok(()) => {}
        Err(crossbeam_channel::TrySendError::Full(event)) => {
            warn!(toid = %event.toid(), "event buffer full, dropping event");
        }
        Err(crossbeam_channel::TrySendError::Disconnected(_)) => {}
    }
}

/// Builder for [`ToiRequester`].
pub struct RequesterBuilder {
    transport: Arc<dyn Transport>,
    config: RequesterConfig,
    on_data: Option<DataCallback>,
    on_error: Option<ErrorCallback>,
}

impl RequesterBuilder {
    /// Callback for fresh data on tracked objects.
    pub fn on_data<F>(mut self, f: F) -> Self
    where
        F: Fn(&ToiId, &Attributes) + Send + Sync + 'static,
    {
        self.on_data = Some(Box::new(f));
        self
    }

    /// Callback for tracked objects that failed.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&ToiId, &ToiError) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Create the requester.
    pub fn build(self) -> ToiRequester {
        ToiRequester {
            shared: Arc::new(Shared {
                config: self.config,
                transport: self.transport,
                state: Mutex::new(State::new()),
                on_data: self.on_data.unwrap_or_else(|| Box::new(|_, _| {})),
                on_error: self.on_error,
            }),
        }
    }
}

/// Hands out requesters that share one transport.
#[derive(Clone)]
pub struct RequesterFactory {
    transport: Arc<dyn Transport>,
}

impl RequesterFactory {
    /// Create a factory bound to `transport`.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Builder for a requester of objects of type `toc_ident`.
    pub fn requester(&self, toc_ident: &str, attr_list: &[&str], retain: usize) -> RequesterBuilder {
        ToiRequester::builder(
            self.transport.clone(),
            RequesterConfig::new(toc_ident, attr_list).with_retain(retain),
        )
    }

    /// Builder for a requester from a full configuration.
    pub fn with_config(&self, config: RequesterConfig) -> RequesterBuilder {
        ToiRequester::builder(self.transport.clone(), config)
    }
}
