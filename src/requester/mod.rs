//! Tracked-object requester.
//!
//! A requester keeps a cache of remote objects (TOIs) of one type:
//! - Tracked objects have a live subscription and report every diff
//! - Dropped objects stay subscribed in a bounded pool, so tracking them
//!   again needs no new request
//! - Errors from the server remove the object for good
//!
//! # Example
//!
//! ```ignore
//! let config = RequesterConfig::new("Foo", &["a", "b"]).with_retain(50);
//! let requester = ToiRequester::builder(transport, config)
//!     .on_data(|toid, attrs| println!("{toid}: {attrs:?}"))
//!     .on_error(|toid, err| eprintln!("{toid} failed: {err}"))
//!     .build();
//!
//! if requester.track(42) {
//!     // Already cached, no callback will follow
//!     let attrs = requester.get(42);
//! }
//! requester.drop(42);
//! ```

mod manager;
mod types;

pub use manager::{DataCallback, ErrorCallback, RequesterBuilder, RequesterFactory, ToiRequester};
pub use types::{EventStream, RequesterConfig, RequesterStats, ToiEvent, DEFAULT_RETAIN};
