//! Secondary indexes for the in-memory store.
//!
//! `EdgeIndex` keeps directed edges (follows, likes) with a pair lookup plus
//! forward and reverse adjacency, so membership checks and per-endpoint
//! listings never scan the whole edge table. `GroupIndex` maps an owner to
//! the ids of the records it owns (posts by author, comments by post).

use std::collections::{BTreeSet, HashMap};

/// Directed edges `source -> target`, each identified by an edge id.
///
/// Adjacency sets hold edge ids, so iteration yields edges in creation order.
#[derive(Debug, Default)]
pub struct EdgeIndex {
    /// (source, target) -> edge id
    pairs: HashMap<(i64, i64), i64>,
    /// edge id -> (source, target)
    ends: HashMap<i64, (i64, i64)>,
    /// source -> edge ids
    forward: HashMap<i64, BTreeSet<i64>>,
    /// target -> edge ids
    reverse: HashMap<i64, BTreeSet<i64>>,
}

impl EdgeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Edge id for the pair, if linked
    pub fn get(&self, source: i64, target: i64) -> Option<i64> {
        self.pairs.get(&(source, target)).copied()
    }

    /// Record an edge. Returns false (and changes nothing) if the pair is already linked.
    pub fn insert(&mut self, source: i64, target: i64, edge_id: i64) -> bool {
        if self.pairs.contains_key(&(source, target)) {
            return false;
        }
        self.pairs.insert((source, target), edge_id);
        self.ends.insert(edge_id, (source, target));
        self.forward.entry(source).or_default().insert(edge_id);
        self.reverse.entry(target).or_default().insert(edge_id);
        true
    }

    /// Unlink a pair, returning the removed edge id
    pub fn remove(&mut self, source: i64, target: i64) -> Option<i64> {
        let edge_id = self.pairs.remove(&(source, target))?;
        self.ends.remove(&edge_id);
        remove_from(&mut self.forward, source, edge_id);
        remove_from(&mut self.reverse, target, edge_id);
        Some(edge_id)
    }

    /// Unlink every edge pointing at `target`, returning the removed edge ids
    pub fn remove_target(&mut self, target: i64) -> Vec<i64> {
        let edge_ids: Vec<i64> = self
            .reverse
            .remove(&target)
            .map(|ids| ids.into_iter().collect())
            .unwrap_or_default();

        for edge_id in &edge_ids {
            if let Some((source, _)) = self.ends.remove(edge_id) {
                self.pairs.remove(&(source, target));
                remove_from(&mut self.forward, source, *edge_id);
            }
        }
        edge_ids
    }

    /// Edge ids leaving `source`, oldest first
    pub fn outgoing(&self, source: i64) -> impl Iterator<Item = i64> + '_ {
        self.forward.get(&source).into_iter().flatten().copied()
    }

    /// Edge ids arriving at `target`, oldest first
    pub fn incoming(&self, target: i64) -> impl Iterator<Item = i64> + '_ {
        self.reverse.get(&target).into_iter().flatten().copied()
    }

    pub fn outgoing_count(&self, source: i64) -> usize {
        self.forward.get(&source).map_or(0, BTreeSet::len)
    }

    pub fn incoming_count(&self, target: i64) -> usize {
        self.reverse.get(&target).map_or(0, BTreeSet::len)
    }
}

/// One-to-many ownership: owner id -> member ids in ascending order
#[derive(Debug, Default)]
pub struct GroupIndex {
    groups: HashMap<i64, BTreeSet<i64>>,
}

impl GroupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, owner: i64, member: i64) {
        self.groups.entry(owner).or_default().insert(member);
    }

    pub fn remove(&mut self, owner: i64, member: i64) {
        remove_from(&mut self.groups, owner, member);
    }

    /// Drop a whole group, returning its members
    pub fn remove_owner(&mut self, owner: i64) -> Vec<i64> {
        self.groups
            .remove(&owner)
            .map(|members| members.into_iter().collect())
            .unwrap_or_default()
    }

    pub fn members(&self, owner: i64) -> impl Iterator<Item = i64> + '_ {
        self.groups.get(&owner).into_iter().flatten().copied()
    }

    pub fn count(&self, owner: i64) -> usize {
        self.groups.get(&owner).map_or(0, BTreeSet::len)
    }
}

fn remove_from(map: &mut HashMap<i64, BTreeSet<i64>>, key: i64, value: i64) {
    if let Some(set) = map.get_mut(&key) {
        set.remove(&value);
        if set.is_empty() {
            map.remove(&key);
        }
    }
}
