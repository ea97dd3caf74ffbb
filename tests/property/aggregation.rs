//! The derived date of a floor is the null-safe minimum of its units' task dates

use chrono::NaiveDate;
use proptest::prelude::*;
use structsync::backend::TimelineTask;
use structsync::derived::DerivedAggregator;
use structsync::tree::{Persisted, TreeBuilder};
use structsync::types::NodeKey;

fn date_strategy() -> impl Strategy<Value = Option<NaiveDate>> {
    prop::option::of((0i64..2000).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(offset)
    }))
}

proptest! {
    #[test]
    fn floor_derived_is_min_of_unit_dates(
        unit_dates in prop::collection::vec(prop::collection::vec(date_strategy(), 0..4), 1..6)
    ) {
        let mut b = TreeBuilder::new();
        let c = b.add_component(1, "C", Persisted::default()).unwrap();
        let r = b.add_child(c, 1, "R", Persisted::default()).unwrap();
        let f = b.add_child(r, 1, "F", Persisted::default()).unwrap();

        let mut tasks = Vec::new();
        for (i, dates) in unit_dates.iter().enumerate() {
            let unit_id = i as u64 + 1;
            b.add_child(f, unit_id, "U", Persisted::default()).unwrap();
            for date in dates {
                tasks.push(TimelineTask::new(unit_id, *date, Some("PM")));
            }
        }
        let tree = b.build();
        let derived = DerivedAggregator::aggregate(&tree, &tasks);

        let expected = unit_dates.iter().flatten().flatten().min().copied();
        prop_assert_eq!(derived.earliest_start(NodeKey::floor(1)), expected);
        prop_assert_eq!(derived.earliest_start(NodeKey::component(1)), expected);

        for (i, dates) in unit_dates.iter().enumerate() {
            let unit_min = dates.iter().flatten().min().copied();
            prop_assert_eq!(derived.earliest_start(NodeKey::unit(i as u64 + 1)), unit_min);
        }
    }
}
