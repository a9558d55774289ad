//! Property tests for requester bookkeeping invariants.

mod common;

use common::{diff, gone, Call, RecordingTransport};
use proptest::prelude::*;
use serde_json::json;
use std::collections::HashSet;
use toilink::{LinkMessage, RemoteError, RequesterConfig, ToiId};

#[derive(Clone, Debug)]
enum Op {
    Track(i64),
    Drop(i64),
    Data(i64),
    Gone(i64),
    Fail(i64),
}

fn failure(id: i64) -> LinkMessage {
    LinkMessage::error(RemoteError {
        value: Some(json!(["failed", id])),
        ..Default::default()
    })
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..20i64).prop_map(Op::Track),
        (0..20i64).prop_map(Op::Drop),
        (0..20i64).prop_map(Op::Data),
        (0..20i64).prop_map(Op::Gone),
        (0..20i64).prop_map(Op::Fail),
    ]
}

proptest! {
    #[test]
    fn bookkeeping_invariants_hold(retain in 0usize..8, ops in prop::collection::vec(op(), 0..200)) {
        let transport = RecordingTransport::new();
        let requester = transport.requester(RequesterConfig::new("Foo", &["a"]).with_retain(retain));

        for op in ops {
            match op {
                Op::Track(id) => {
                    let cached = requester.contains(id);
                    let before = transport.requests();
                    let has_data = requester.track(id);
                    prop_assert_eq!(has_data, cached);
                    prop_assert_eq!(transport.requests(), before + usize::from(!cached));
                }
                Op::Drop(id) => requester.drop(id),
                Op::Data(id) => requester.deliver(id, diff(json!({"a": [id]}))),
                Op::Gone(id) => requester.deliver(id, gone("Foo", id)),
                Op::Fail(id) => requester.deliver(id, failure(id)),
            }

            let tracked: HashSet<ToiId> = requester.tracked().into_iter().collect();
            let untracked = requester.untracked();
            let stats = requester.stats();

            prop_assert!(untracked.len() <= retain);
            prop_assert!(untracked.iter().all(|id| !tracked.contains(id)));
            prop_assert_eq!(stats.links, tracked.len() + untracked.len());
            prop_assert_eq!(stats.cached, stats.links);
        }

        // Every opened link is released exactly once
        let open = requester.stats().links;
        let deactivated = transport.count(|c| matches!(c, Call::Deactivate(_)));
        requester.destroy();
        prop_assert_eq!(transport.count(|c| matches!(c, Call::Deactivate(_))) - deactivated, open);
        let released = transport.count(|c| matches!(c, Call::Deactivate(_) | Call::Detach(_)));
        prop_assert_eq!(released, transport.requests());
    }

    #[test]
    fn eviction_is_oldest_dropped_first(retain in 1usize..20, extra in 1usize..20) {
        let transport = RecordingTransport::new();
        let requester = transport.requester(RequesterConfig::new("Foo", &["a"]).with_retain(retain));
        let total = (retain + extra) as i64;

        for id in 0..total {
            requester.track(id);
        }
        for id in 0..total {
            requester.drop(id);
        }

        let untracked = requester.untracked();
        let first_kept = match untracked.first() {
            Some(ToiId::Int(n)) => *n,
            other => panic!("unexpected untracked head {:?}", other),
        };
        let expected: Vec<ToiId> = (first_kept..total).map(ToiId::Int).collect();
        prop_assert_eq!(&untracked, &expected);

        let deactivated: Vec<ToiId> = transport
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Deactivate(id) => Some(id),
                _ => None,
            })
            .collect();
        let expected: Vec<ToiId> = (0..first_kept).map(ToiId::Int).collect();
        prop_assert_eq!(deactivated, expected);
    }
}
