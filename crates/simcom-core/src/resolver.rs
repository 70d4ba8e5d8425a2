//! Frequency-to-channel resolution
//!
//! A read-only search of one directory subtree for the channel tagged with
//! the tuned frequency. The walk is pre-order over the directory's stored
//! child order and the first exact match wins, so two channels under the
//! same root carrying the same tag always resolve to the one listed first.

use tracing::debug;

use crate::directory::{ChannelDirectory, ChannelId};
use crate::frequency::Frequency;

/// Parameters of one resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverQuery {
    /// Tuned frequency
    pub frequency: Frequency,
    /// Root of the search (None searches every channel)
    pub root: Option<ChannelId>,
    /// Accepted distance in hundredths when nothing matches exactly
    pub tolerance: u32,
}

impl ResolverQuery {
    /// Exact-match query under `root`
    pub fn new(frequency: Frequency, root: Option<ChannelId>) -> Self {
        Self {
            frequency,
            root,
            tolerance: 0,
        }
    }

    /// Also accept the nearest tag within `tolerance` hundredths
    pub fn with_tolerance(mut self, tolerance: u32) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Find the channel for a query
///
/// Returns `None` (not found) when no channel under the root carries a
/// matching tag, or when the root itself is unknown. An exact match always
/// beats a tolerance match; among tolerance matches the closest wins, then
/// the earliest in pre-order.
pub fn resolve(directory: &ChannelDirectory, query: &ResolverQuery) -> Option<ChannelId> {
    let nodes = match directory.preorder(query.root) {
        Ok(nodes) => nodes,
        Err(e) => {
            debug!("Cannot resolve {}: {}", query.frequency, e);
            return None;
        }
    };

    let mut nearest: Option<(u32, ChannelId)> = None;
    for (node, _) in nodes {
        let Some(tag) = node.frequency else {
            continue;
        };
        if tag == query.frequency {
            return Some(node.id);
        }
        if query.tolerance > 0 {
            let distance = tag.abs_diff(query.frequency);
            if distance <= query.tolerance && nearest.map_or(true, |(best, _)| distance < best) {
                nearest = Some((distance, node.id));
            }
        }
    }

    nearest.map(|(_, id)| id)
}

impl ChannelDirectory {
    /// Exact-match resolution of `frequency` under `root`
    pub fn resolve(&self, frequency: Frequency, root: Option<ChannelId>) -> Option<ChannelId> {
        resolve(self, &ResolverQuery::new(frequency, root))
    }
}
