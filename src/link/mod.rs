//! Contract consumed from the link transport.
//!
//! The transport itself lives outside this crate. It opens named link
//! channels on the server and calls back with either a TOI diff or an error:
//! - `Transport::make_link` opens a subscription and returns its handle
//! - `Subscription::deactivate` tells the server to stop the subscription
//! - `Subscription::detach` forgets the subscription locally (the server side
//!   is already gone)
//!
//! # Example
//!
//! ```ignore
//! let request = LinkRequest::subscribe(ToiId::from(42), "Foo", &["a".into()]);
//! let link = transport.make_link(DEFAULT_LINK_NAME, request, Box::new(|msg| {
//!     println!("got {:?}", msg);
//! }));
//! link.deactivate();
//! ```

mod types;

pub use types::{
    LinkCallback, LinkMessage, LinkParams, LinkRequest, Subscription, ToiDiff, Transport,
    DEFAULT_LINK_NAME,
};
