//! Recording fake transport shared by the integration tests.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::Arc;
use toilink::{
    Attributes, LinkCallback, LinkMessage, LinkRequest, RemoteError, RequesterConfig,
    Subscription, ToiError, ToiId, ToiRequester, Transport, NONEXISTENT_CLASS,
};

/// Everything observable from outside the requester, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Request { name: String, request: LinkRequest },
    Deactivate(ToiId),
    Detach(ToiId),
    Data(ToiId, Attributes),
    Gone(ToiId),
    Error(ToiId, RemoteError),
}

pub type SharedCallback = Arc<dyn Fn(LinkMessage) + Send + Sync>;

#[derive(Default)]
pub struct RecordingTransport {
    calls: Arc<Mutex<Vec<Call>>>,
    callbacks: Mutex<Vec<SharedCallback>>,
}

struct RecordingLink {
    toid: ToiId,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Subscription for RecordingLink {
    fn deactivate(self: Box<Self>) {
        self.calls.lock().push(Call::Deactivate(self.toid));
    }

    fn detach(self: Box<Self>) {
        self.calls.lock().push(Call::Detach(self.toid));
    }
}

impl Transport for RecordingTransport {
    fn make_link(
        &self,
        name: &str,
        request: LinkRequest,
        callback: LinkCallback,
    ) -> Box<dyn Subscription> {
        let toid = request.params.toid.clone();
        self.calls.lock().push(Call::Request {
            name: name.to_string(),
            request,
        });
        self.callbacks.lock().push(Arc::from(callback));
        Box::new(RecordingLink {
            toid,
            calls: self.calls.clone(),
        })
    }
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Requester whose callbacks record into the same log as the transport.
    pub fn requester(self: &Arc<Self>, config: RequesterConfig) -> ToiRequester {
        let data_log = self.calls.clone();
        let error_log = self.calls.clone();
        ToiRequester::builder(self.clone(), config)
            .on_data(move |toid, attrs| data_log.lock().push(Call::Data(toid.clone(), attrs.clone())))
            .on_error(move |toid, error| {
                let call = match error {
                    ToiError::ObjectGone(_) => Call::Gone(toid.clone()),
                    ToiError::Transport(remote) => Call::Error(toid.clone(), remote.clone()),
                    ToiError::Malformed(msg) => panic!("unexpected malformed error: {}", msg),
                };
                error_log.lock().push(call);
            })
            .build()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Return and clear the log.
    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock())
    }

    /// Callback of the most recently opened link.
    pub fn last_callback(&self) -> SharedCallback {
        self.callbacks.lock().last().cloned().expect("no link opened")
    }

    pub fn requests(&self) -> usize {
        self.callbacks.lock().len()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }
}

pub fn attrs(value: serde_json::Value) -> Attributes {
    serde_json::from_value(value).unwrap()
}

pub fn diff(value: serde_json::Value) -> LinkMessage {
    LinkMessage::diff(attrs(value))
}

pub fn gone(toc: &str, toid: i64) -> LinkMessage {
    LinkMessage::error(RemoteError {
        class: Some(NONEXISTENT_CLASS.to_string()),
        args: Some(serde_json::json!([toc, toid])),
        value: None,
    })
}

pub fn ids(range: impl IntoIterator<Item = i64>) -> Vec<ToiId> {
    range.into_iter().map(ToiId::Int).collect()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
