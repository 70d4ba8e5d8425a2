//! Integration tests for the channel directory and resolver
//!
//! These tests verify:
//! - Pre-order listing covers every descendant exactly once
//! - Depth bookkeeping survives child-before-parent snapshots
//! - Resolution is deterministic and honours the first-match rule

use std::collections::{HashMap, HashSet};

use simcom_core::{
    resolve, ChannelDirectory, ChannelEntry, ChannelId, ChannelInfo, Frequency, ResolverQuery,
};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    /// The layout used by the flying club's fly-in events
    pub fn fly_in_layout() -> Vec<ChannelEntry> {
        vec![
            ChannelEntry::new(1, "Lobby", 0),
            ChannelEntry::new(2, "Fly-in 1", 0),
            ChannelEntry::new(3, "F1 Dep - 118.300", 2),
            ChannelEntry::new(4, "F1 Unicom - 122.800", 2),
            ChannelEntry::new(5, "F1 Dep - 119.125", 2),
            ChannelEntry::new(6, "Fly-in 2", 0),
            ChannelEntry::new(7, "F2 Departure", 6),
            ChannelEntry::new(8, "F2D Ground - 118.300", 7),
            ChannelEntry::new(9, "F2D Tower - 125.100", 7),
            ChannelEntry::new(10, "F2D Departure - 119.125", 7),
            ChannelEntry::new(11, "F2 EnRoute", 6),
            ChannelEntry::new(12, "F2 Unicom - 122.800", 11),
            ChannelEntry::new(13, "F2 Arrival", 6),
            ChannelEntry::new(14, "F2D Departure - 118.300", 13),
            ChannelEntry::new(15, "F2D Tower - 125.100", 13),
            ChannelEntry::new(16, "F2D Ground - 119.125", 13),
            ChannelEntry::new(17, "F2 Other - 118.300", 6),
            ChannelEntry::new(18, "F2 Other - 122.800", 17),
            ChannelEntry::new(19, "F2 Other - 118.300", 18),
        ]
    }

    pub fn directory(entries: Vec<ChannelEntry>) -> ChannelDirectory {
        let mut dir = ChannelDirectory::new();
        assert_eq!(dir.load_snapshot(entries), 0);
        dir
    }

    pub fn ids(list: &[ChannelInfo]) -> Vec<u64> {
        list.iter().map(|c| c.id.0).collect()
    }

    pub fn mhz(text: &str) -> Frequency {
        text.parse().unwrap()
    }
}

// ============================================================================
// Listing Tests
// ============================================================================

mod listing_tests {
    use super::*;

    #[test]
    fn whole_layout_in_preorder() {
        let dir = helpers::directory(helpers::fly_in_layout());
        let list = dir.channel_list(None).unwrap();
        assert_eq!(helpers::ids(&list), (1..=19).collect::<Vec<_>>());
    }

    #[test]
    fn subtree_listing() {
        let dir = helpers::directory(helpers::fly_in_layout());
        let list = dir.channel_list(Some(ChannelId(13))).unwrap();
        assert_eq!(helpers::ids(&list), vec![13, 14, 15, 16]);
        assert!(list.iter().skip(1).all(|c| c.depth == 2));
    }

    #[test]
    fn reversed_snapshot_builds_same_tree() {
        let mut entries = helpers::fly_in_layout();
        entries.reverse();
        let dir = helpers::directory(entries);

        for id in 1..=19 {
            let forward = helpers::directory(helpers::fly_in_layout());
            assert_eq!(dir.depth(ChannelId(id)), forward.depth(ChannelId(id)));
        }
        // Sibling order follows the snapshot, so siblings come out reversed
        let list = dir.channel_list(Some(ChannelId(7))).unwrap();
        assert_eq!(helpers::ids(&list), vec![7, 10, 9, 8]);
    }

    #[test]
    fn reload_replaces_previous_session() {
        let mut dir = helpers::directory(helpers::fly_in_layout());
        dir.load_snapshot([ChannelEntry::new(100, "New server - 123.450", 0)]);
        assert_eq!(dir.len(), 1);
        assert!(dir.get(ChannelId(1)).is_none());
    }
}

// ============================================================================
// Resolver Tests
// ============================================================================

mod resolver_tests {
    use super::*;

    #[test]
    fn resolves_within_each_fly_in() {
        let dir = helpers::directory(helpers::fly_in_layout());

        assert_eq!(
            dir.resolve(helpers::mhz("118.30"), Some(ChannelId(2))),
            Some(ChannelId(3))
        );
        assert_eq!(
            dir.resolve(helpers::mhz("119.12"), Some(ChannelId(2))),
            Some(ChannelId(5))
        );
        assert_eq!(
            dir.resolve(helpers::mhz("118.30"), Some(ChannelId(6))),
            Some(ChannelId(8))
        );
        assert_eq!(
            dir.resolve(helpers::mhz("118.30"), Some(ChannelId(13))),
            Some(ChannelId(14))
        );
        assert_eq!(
            dir.resolve(helpers::mhz("122.80"), Some(ChannelId(17))),
            Some(ChannelId(18))
        );
    }

    #[test]
    fn not_found_outside_root() {
        let dir = helpers::directory(helpers::fly_in_layout());
        assert_eq!(dir.resolve(helpers::mhz("125.10"), Some(ChannelId(2))), None);
        assert_eq!(dir.resolve(helpers::mhz("125.10"), Some(ChannelId(1))), None);
    }

    #[test]
    fn tolerance_query_through_free_function() {
        let dir = helpers::directory(helpers::fly_in_layout());
        let query = ResolverQuery::new(helpers::mhz("125.12"), Some(ChannelId(7))).with_tolerance(3);
        assert_eq!(resolve(&dir, &query), Some(ChannelId(9)));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    const TAGS: &[&str] = &["118.300", "121.900", "122.800", "119.125"];

    /// A random forest: node `i + 1` hangs off `0` (top level) or an earlier node,
    /// delivered in a shuffled order.
    fn forest() -> impl Strategy<Value = Vec<ChannelEntry>> {
        (1usize..30)
            .prop_flat_map(|n| {
                let parents: Vec<_> = (0..n).map(|i| 0..=i as u64).collect();
                let tags = prop::collection::vec(prop::option::of(0..TAGS.len()), n);
                (parents, tags)
            })
            .prop_map(|(parents, tags)| {
                parents
                    .into_iter()
                    .zip(tags)
                    .enumerate()
                    .map(|(i, (parent, tag))| {
                        let id = i as u64 + 1;
                        let name = match tag {
                            Some(t) => format!("Chan {id} - {}", TAGS[t]),
                            None => format!("Group {id}"),
                        };
                        ChannelEntry::new(id, name, parent)
                    })
                    .collect::<Vec<_>>()
            })
            .prop_shuffle()
    }

    fn descendants(entries: &[ChannelEntry], root: ChannelId) -> HashSet<ChannelId> {
        let parents: HashMap<ChannelId, Option<ChannelId>> =
            entries.iter().map(|e| (e.id, e.parent)).collect();
        entries
            .iter()
            .filter(|e| {
                let mut cursor = Some(e.id);
                while let Some(c) = cursor {
                    if c == root {
                        return true;
                    }
                    cursor = parents.get(&c).copied().flatten();
                }
                false
            })
            .map(|e| e.id)
            .collect()
    }

    proptest! {
        #[test]
        fn listing_covers_every_node_once(entries in forest()) {
            let mut dir = ChannelDirectory::new();
            prop_assert_eq!(dir.load_snapshot(entries.clone()), 0);

            let list = dir.channel_list(None).unwrap();
            let seen: HashSet<ChannelId> = list.iter().map(|c| c.id).collect();
            prop_assert_eq!(list.len(), entries.len());
            prop_assert_eq!(seen.len(), entries.len());
        }

        #[test]
        fn parents_precede_children_with_consistent_depth(entries in forest()) {
            let mut dir = ChannelDirectory::new();
            dir.load_snapshot(entries);

            let list = dir.channel_list(None).unwrap();
            let position: HashMap<ChannelId, usize> =
                list.iter().enumerate().map(|(i, c)| (c.id, i)).collect();

            for info in &list {
                match info.parent {
                    Some(p) => {
                        prop_assert!(position[&p] < position[&info.id]);
                        prop_assert_eq!(info.depth, list[position[&p]].depth + 1);
                    }
                    None => prop_assert_eq!(info.depth, 0),
                }
            }
        }

        #[test]
        fn subtree_listing_matches_descendants(entries in forest(), pick in any::<prop::sample::Index>()) {
            let mut dir = ChannelDirectory::new();
            dir.load_snapshot(entries.clone());

            let root = entries[pick.index(entries.len())].id;
            let list = dir.channel_list(Some(root)).unwrap();
            let listed: HashSet<ChannelId> = list.iter().map(|c| c.id).collect();

            prop_assert_eq!(list[0].id, root);
            prop_assert_eq!(listed.len(), list.len());
            prop_assert_eq!(listed, descendants(&entries, root));
        }

        #[test]
        fn resolution_is_first_tagged_match(
            entries in forest(),
            pick in any::<prop::sample::Index>(),
            tag in 0..TAGS.len(),
        ) {
            let mut dir = ChannelDirectory::new();
            dir.load_snapshot(entries.clone());

            let root = entries[pick.index(entries.len())].id;
            let tuned: Frequency = TAGS[tag].parse().unwrap();

            let first = dir
                .channel_list(Some(root))
                .unwrap()
                .into_iter()
                .find(|c| c.frequency == Some(tuned))
                .map(|c| c.id);

            let resolved = dir.resolve(tuned, Some(root));
            prop_assert_eq!(resolved, first);
            // Deterministic on an unchanged directory
            prop_assert_eq!(dir.resolve(tuned, Some(root)), resolved);
        }
    }
}
