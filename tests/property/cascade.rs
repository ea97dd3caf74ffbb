//! After any edit sequence, a node's effective process model is the value of the latest
//! edit made at the node or one of its ancestors

use proptest::prelude::*;
use structsync::derived::DerivedSchedule;
use structsync::overrides::StagedValue;
use structsync::session::EditSession;
use structsync::tree::{Persisted, TreeBuilder, TreeModel};
use structsync::types::NodeKey;

// component:1 > riser:1,2 > floor:1..=4 > unit:1..=8
fn tree() -> TreeModel {
    let mut b = TreeBuilder::new();
    let c = b.add_component(1, "C", Persisted::new(Some(1), None)).unwrap();
    for r in 1..=2u64 {
        let riser = b.add_child(c, r, "R", Persisted::default()).unwrap();
        for f in 1..=2u64 {
            let floor_id = (r - 1) * 2 + f;
            let floor = b.add_child(riser, floor_id, "F", Persisted::default()).unwrap();
            for u in 1..=2u64 {
                let unit_id = (floor_id - 1) * 2 + u;
                b.add_child(floor, unit_id, "U", Persisted::default()).unwrap();
            }
        }
    }
    b.build()
}

fn edit_strategy() -> impl Strategy<Value = (usize, Option<u64>)> {
    (0usize..15, prop::option::of(1u64..5))
}

proptest! {
    #[test]
    fn effective_process_model_follows_last_covering_edit(
        edits in prop::collection::vec(edit_strategy(), 0..20)
    ) {
        let tree = tree();
        let keys: Vec<NodeKey> = tree.preorder().collect();
        prop_assert_eq!(keys.len(), 15);

        let mut session = EditSession::from_parts(1, tree, DerivedSchedule::default(), Vec::new());
        let mut history: Vec<(NodeKey, Option<u64>)> = Vec::new();
        for (index, value) in &edits {
            let key = keys[*index];
            session.stage(key, StagedValue::ProcessModel(*value)).unwrap();
            history.push((key, *value));
        }

        for key in &keys {
            let covering = history
                .iter()
                .rev()
                .find(|(target, _)| target == key || session.tree().is_ancestor(*target, *key));
            let expected = match covering {
                Some((_, value)) => *value,
                None => session.tree().persisted(key).and_then(|p| p.process_model_id),
            };
            prop_assert_eq!(session.effective_process_model(*key), expected, "node {}", key);
        }
    }
}
