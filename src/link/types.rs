//! Transport traits and link wire types.

use crate::error::ToiError;
use crate::types::{Attributes, RemoteError, ToiId};
use serde::{Deserialize, Serialize};

/// Link name used for TOI subscription requests.
pub const DEFAULT_LINK_NAME: &str = "Request";

/// Callback invoked by the transport for every server message on a link.
pub type LinkCallback = Box<dyn Fn(LinkMessage) + Send + Sync>;

/// Opens subscription links on the server.
pub trait Transport: Send + Sync {
    /// Open a link. The callback may fire any number of times with diffs and
    /// at most once with a terminal error.
    fn make_link(
        &self,
        name: &str,
        request: LinkRequest,
        callback: LinkCallback,
    ) -> Box<dyn Subscription>;
}

/// Handle to an open link. Both operations consume the handle.
pub trait Subscription: Send {
    /// Ask the server to stop the subscription (fire and forget).
    fn deactivate(self: Box<Self>);

    /// Release the subscription locally without contacting the server.
    fn detach(self: Box<Self>);
}

/// Request arguments sent when opening a TOI link.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkRequest {
    pub params: LinkParams,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkParams {
    pub toid: ToiId,
    pub subscription: bool,
    /// Type name of the requested object.
    pub toc_ident: String,
    pub attr_list: Vec<String>,
}

impl LinkRequest {
    /// Build a subscribing request for one object.
    pub fn subscribe(toid: ToiId, toc_ident: &str, attr_list: &[String]) -> Self {
        Self {
            params: LinkParams {
                toid,
                subscription: true,
                toc_ident: toc_ident.to_string(),
                attr_list: attr_list.to_vec(),
            },
        }
    }
}

/// Attribute diff pushed by the server.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ToiDiff {
    #[serde(default)]
    pub attrs: Attributes,
}

/// One message delivered on a link.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkMessage {
    #[serde(rename = "toiDiff", default, skip_serializing_if = "Option::is_none")]
    pub toi_diff: Option<ToiDiff>,

    #[serde(default)]
    pub error: Option<RemoteError>,
}

impl LinkMessage {
    /// A data message carrying `attrs`.
    pub fn diff(attrs: Attributes) -> Self {
        Self {
            toi_diff: Some(ToiDiff { attrs }),
            error: None,
        }
    }

    /// An error message.
    pub fn error(error: RemoteError) -> Self {
        Self {
            toi_diff: None,
            error: Some(error),
        }
    }

    /// Decode a raw JSON message.
    pub fn from_json(raw: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Split into the error (which takes precedence) or the diff.
    /// Returns `None` for a message carrying neither.
    pub fn into_update(self) -> Option<std::result::Result<Attributes, ToiError>> {
        if let Some(error) = self.error {
            return Some(Err(ToiError::from_remote(error)));
        }
        self.toi_diff.map(|diff| Ok(diff.attrs))
    }
}
