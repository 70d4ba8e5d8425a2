//! Channel directory
//!
//! In-memory mirror of the voice server's channel tree for the current
//! session. Nodes are indexed by id; each parent keeps an ordered list of
//! its children in the order the server first reported them.
//!
//! Snapshots don't always list a parent before its children, so depth is
//! never stored: it is derived by walking the parent chain when asked. A node
//! whose parent hasn't arrived yet is treated as top-level until it does.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::{debug, warn};

use crate::error::DirectoryError;
use crate::frequency::{parse_tag, Frequency};

/// Server-assigned channel identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ChannelId(pub u64);

impl ChannelId {
    /// Get the raw id value
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Convert a raw parent id from the voice client, where `0` means "no parent"
    pub fn parent_from_raw(raw: u64) -> Option<ChannelId> {
        (raw != 0).then_some(ChannelId(raw))
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of a channel snapshot as reported by the voice client
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelEntry {
    /// Channel id
    pub id: ChannelId,
    /// Channel name, possibly carrying a frequency tag
    pub name: String,
    /// Parent channel (None for a top-level channel)
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "deserialize_parent")
    )]
    pub parent: Option<ChannelId>,
}

// Layout files and snapshots use `0` for "no parent", like the voice client
#[cfg(feature = "serde")]
fn deserialize_parent<'de, D>(deserializer: D) -> Result<Option<ChannelId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<u64> = serde::Deserialize::deserialize(deserializer)?;
    Ok(raw.and_then(ChannelId::parent_from_raw))
}

impl ChannelEntry {
    /// Create an entry from raw ids, where a `parent` of `0` means top-level
    pub fn new(id: u64, name: impl Into<String>, parent: u64) -> Self {
        Self {
            id: ChannelId(id),
            name: name.into(),
            parent: ChannelId::parent_from_raw(parent),
        }
    }
}

/// A channel held by the directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelNode {
    /// Channel id
    pub id: ChannelId,
    /// Channel name
    pub name: String,
    /// Parent channel
    pub parent: Option<ChannelId>,
    /// Frequency tag parsed from the name
    pub frequency: Option<Frequency>,
}

/// A flattened directory entry produced by [`ChannelDirectory::channel_list`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    /// Channel id
    pub id: ChannelId,
    /// Channel name
    pub name: String,
    /// Parent channel
    pub parent: Option<ChannelId>,
    /// Frequency tag parsed from the name
    pub frequency: Option<Frequency>,
    /// Distance from the top of the tree (top-level channels are 0)
    pub depth: usize,
}

/// Hierarchical channel model for one voice server session
#[derive(Debug, Clone, Default)]
pub struct ChannelDirectory {
    nodes: HashMap<ChannelId, ChannelNode>,
    /// Ordered child lists, keyed by parent id (the parent may be absent)
    children: HashMap<ChannelId, Vec<ChannelId>>,
    /// Every node in first-seen order
    order: Vec<ChannelId>,
}

impl ChannelDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a channel or update an existing one
    ///
    /// Updating with identical values is a no-op. Moving a channel under a
    /// new parent appends it to the end of that parent's children. A parent
    /// link that would close a loop is rejected and nothing changes.
    pub fn add_or_update_channel(
        &mut self,
        name: impl Into<String>,
        id: ChannelId,
        parent: Option<ChannelId>,
    ) -> Result<(), DirectoryError> {
        if id.0 == 0 {
            return Err(DirectoryError::InvalidChannelId);
        }
        let parent = parent.filter(|p| p.0 != 0);
        if let Some(p) = parent {
            if self.would_cycle(id, p) {
                return Err(DirectoryError::Cycle { id, parent: p });
            }
        }

        let name = name.into();
        let frequency = parse_tag(&name);

        match self.nodes.get_mut(&id) {
            Some(node) => {
                let old_parent = node.parent;
                node.name = name;
                node.frequency = frequency;
                node.parent = parent;

                if old_parent != parent {
                    if let Some(old) = old_parent {
                        self.detach(old, id);
                    }
                    if let Some(new) = parent {
                        self.children.entry(new).or_default().push(id);
                    }
                }
            }
            None => {
                self.nodes.insert(
                    id,
                    ChannelNode {
                        id,
                        name,
                        parent,
                        frequency,
                    },
                );
                if let Some(p) = parent {
                    self.children.entry(p).or_default().push(id);
                }
                self.order.push(id);
            }
        }

        Ok(())
    }

    /// Insert a snapshot entry
    pub fn upsert(&mut self, entry: ChannelEntry) -> Result<(), DirectoryError> {
        self.add_or_update_channel(entry.name, entry.id, entry.parent)
    }

    /// Replace the whole directory with a snapshot
    ///
    /// Returns how many entries were rejected.
    pub fn load_snapshot<I>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = ChannelEntry>,
    {
        self.delete_all_channels();

        let mut rejected = 0;
        for entry in entries {
            let id = entry.id;
            if let Err(e) = self.upsert(entry) {
                warn!("Skipping channel {} from snapshot: {}", id, e);
                rejected += 1;
            }
        }

        debug!(
            "Loaded channel snapshot: {} channels, {} rejected",
            self.nodes.len(),
            rejected
        );
        rejected
    }

    /// Remove a channel and everything below it
    ///
    /// Returns the removed ids in pre-order.
    pub fn remove_channel(&mut self, id: ChannelId) -> Result<Vec<ChannelId>, DirectoryError> {
        let removed: Vec<ChannelId> = self.preorder(Some(id))?.map(|(n, _)| n.id).collect();

        if let Some(parent) = self.nodes.get(&id).and_then(|n| n.parent) {
            self.detach(parent, id);
        }

        let gone: HashSet<ChannelId> = removed.iter().copied().collect();
        for r in &removed {
            self.nodes.remove(r);
            self.children.remove(r);
        }
        self.order.retain(|i| !gone.contains(i));

        Ok(removed)
    }

    /// Clear the directory
    pub fn delete_all_channels(&mut self) {
        self.nodes.clear();
        self.children.clear();
        self.order.clear();
    }

    /// Look up a channel
    pub fn get(&self, id: ChannelId) -> Option<&ChannelNode> {
        self.nodes.get(&id)
    }

    /// Check whether a channel is present
    pub fn contains(&self, id: ChannelId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of channels
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the directory holds no channels
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth of a channel, counting only ancestors that are present
    pub fn depth(&self, id: ChannelId) -> Option<usize> {
        let node = self.nodes.get(&id)?;
        let mut depth = 0;
        let mut cursor = node.parent;
        while let Some(parent) = cursor.and_then(|p| self.nodes.get(&p)) {
            depth += 1;
            cursor = parent.parent;
        }
        Some(depth)
    }

    /// Channel names from the top of the tree down to `id`, joined by `" / "`
    pub fn path(&self, id: ChannelId) -> Option<String> {
        let mut names = Vec::new();
        let mut cursor = self.nodes.get(&id);
        while let Some(node) = cursor {
            names.push(node.name.as_str());
            cursor = node.parent.and_then(|p| self.nodes.get(&p));
        }
        if names.is_empty() {
            return None;
        }
        names.reverse();
        Some(names.join(" / "))
    }

    /// Iterate a subtree in pre-order, yielding each node with its depth
    ///
    /// `None` walks every top-level channel in first-seen order.
    pub fn preorder(&self, root: Option<ChannelId>) -> Result<Preorder<'_>, DirectoryError> {
        let stack = match root {
            Some(id) => {
                let depth = self.depth(id).ok_or(DirectoryError::UnknownChannel(id))?;
                vec![(id, depth)]
            }
            None => self
                .order
                .iter()
                .rev()
                .filter(|id| self.is_top_level(**id))
                .map(|id| (*id, 0))
                .collect(),
        };

        Ok(Preorder {
            directory: self,
            stack,
        })
    }

    /// Flatten a subtree (or the whole forest) in pre-order
    pub fn channel_list(&self, root: Option<ChannelId>) -> Result<Vec<ChannelInfo>, DirectoryError> {
        Ok(self
            .preorder(root)?
            .map(|(node, depth)| ChannelInfo {
                id: node.id,
                name: node.name.clone(),
                parent: node.parent,
                frequency: node.frequency,
                depth,
            })
            .collect())
    }

    fn is_top_level(&self, id: ChannelId) -> bool {
        self.nodes
            .get(&id)
            .is_some_and(|n| n.parent.map_or(true, |p| !self.nodes.contains_key(&p)))
    }

    /// Whether placing `id` under `parent` would make `id` its own ancestor
    fn would_cycle(&self, id: ChannelId, parent: ChannelId) -> bool {
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == id {
                return true;
            }
            cursor = self.nodes.get(&current).and_then(|n| n.parent);
        }
        false
    }

    fn detach(&mut self, parent: ChannelId, id: ChannelId) {
        if let Some(siblings) = self.children.get_mut(&parent) {
            siblings.retain(|c| *c != id);
        }
    }
}

/// Pre-order walk over a [`ChannelDirectory`] subtree
///
/// Uses an explicit stack, so deep trees can't overflow.
pub struct Preorder<'a> {
    directory: &'a ChannelDirectory,
    stack: Vec<(ChannelId, usize)>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = (&'a ChannelNode, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((id, depth)) = self.stack.pop() {
            let Some(node) = self.directory.nodes.get(&id) else {
                continue;
            };
            if let Some(children) = self.directory.children.get(&id) {
                self.stack
                    .extend(children.iter().rev().map(|c| (*c, depth + 1)));
            }
            return Some((node, depth));
        }
        None
    }
}
