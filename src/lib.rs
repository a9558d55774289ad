//! # toilink
//!
//! Client-side cache for objects whose attributes are pushed by a server
//! over a link transport.
//!
//! ## Core Concepts
//!
//! - **TOI**: a remote object of a fixed type, identified by a [`ToiId`]
//! - **Link**: a server subscription opened through a [`Transport`]
//! - **Diff**: a partial attribute update merged into the cached data
//! - **Retention pool**: recently dropped objects kept subscribed and cached
//!
//! ## Example
//!
//! ```ignore
//! use toilink::{RequesterConfig, ToiRequester};
//!
//! let (requester, events) = ToiRequester::with_events(
//!     transport,
//!     RequesterConfig::new("Foo", &["name", "price"]).with_retain(50),
//!     1000,
//! );
//!
//! requester.track(42);
//! while let Ok(event) = events.recv() {
//!     println!("{:?}", event);
//! }
//! ```

pub mod error;
pub mod link;
pub mod requester;
pub mod types;

// Re-exports
pub use error::{Result, ToiError, NONEXISTENT_CLASS};
pub use link::{
    LinkCallback, LinkMessage, LinkParams, LinkRequest, Subscription, ToiDiff, Transport,
    DEFAULT_LINK_NAME,
};
pub use requester::{
    DataCallback, ErrorCallback, EventStream, RequesterBuilder, RequesterConfig,
    RequesterFactory, RequesterStats, ToiEvent, ToiRequester, DEFAULT_RETAIN,
};
pub use types::{merge_attributes, Attributes, RemoteError, ToiId};
