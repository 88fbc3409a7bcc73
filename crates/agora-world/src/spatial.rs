//! Bucketed spatial index for radius queries over agent positions.
//!
//! Agents are hashed into square buckets of side `bucket_size`, picked as
//! `max(vision_radius, interaction_radius)` so that a query at either radius
//! only has to inspect the query bucket and its eight neighbours. Larger
//! radii widen the ring to `ceil(radius / bucket_size)` buckets. Candidates
//! are then filtered by exact Manhattan distance.
//!
//! Every map is ordered, so query results come back in ascending id order.

use std::collections::{BTreeMap, BTreeSet};

use agora_types::{AgentId, Position};

/// Bucket coordinate.
type BucketKey = (i32, i32);

/// Ordered bucket grid over agent positions.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    bucket_size: i32,
    buckets: BTreeMap<BucketKey, BTreeSet<AgentId>>,
    positions: BTreeMap<AgentId, Position>,
}

impl SpatialIndex {
    /// Create an empty index. A zero bucket size is raised to one.
    pub fn new(bucket_size: u32) -> Self {
        Self {
            bucket_size: i32::try_from(bucket_size.max(1)).unwrap_or(i32::MAX),
            buckets: BTreeMap::new(),
            positions: BTreeMap::new(),
        }
    }

    /// Create an index sized for the given perception and interaction radii.
    pub fn for_radii(vision_radius: u32, interaction_radius: u32) -> Self {
        Self::new(vision_radius.max(interaction_radius))
    }

    /// Side length of a bucket.
    pub fn bucket_size(&self) -> u32 {
        self.bucket_size.unsigned_abs()
    }

    fn bucket_of(&self, pos: Position) -> BucketKey {
        (
            pos.x.div_euclid(self.bucket_size),
            pos.y.div_euclid(self.bucket_size),
        )
    }

    /// Place an agent. An agent already present is moved.
    pub fn insert(&mut self, id: AgentId, pos: Position) {
        self.remove(id);
        let key = self.bucket_of(pos);
        self.buckets.entry(key).or_default().insert(id);
        self.positions.insert(id, pos);
    }

    /// Remove an agent, returning its last position.
    pub fn remove(&mut self, id: AgentId) -> Option<Position> {
        let pos = self.positions.remove(&id)?;
        let key = self.bucket_of(pos);
        if let Some(bucket) = self.buckets.get_mut(&key) {
            bucket.remove(&id);
            if bucket.is_empty() {
                self.buckets.remove(&key);
            }
        }
        Some(pos)
    }

    /// Move an agent from `old_pos` to `new_pos`.
    ///
    /// The stored position is authoritative; `old_pos` only short-circuits
    /// moves that stay inside one bucket.
    pub fn update(&mut self, id: AgentId, old_pos: Position, new_pos: Position) {
        let stored = self.positions.get(&id).copied();
        if stored == Some(old_pos) && self.bucket_of(old_pos) == self.bucket_of(new_pos) {
            self.positions.insert(id, new_pos);
            return;
        }
        self.insert(id, new_pos);
    }

    /// Current position of an agent.
    pub fn position(&self, id: AgentId) -> Option<Position> {
        self.positions.get(&id).copied()
    }

    /// Number of indexed agents.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Agents within Manhattan distance `radius` of `pos`, ascending by id.
    pub fn query_radius(&self, pos: Position, radius: u32) -> BTreeSet<AgentId> {
        let ring = i32::try_from(radius.div_ceil(self.bucket_size()).max(1)).unwrap_or(i32::MAX);
        let (bx, by) = self.bucket_of(pos);
        let mut found = BTreeSet::new();
        for dx in ring.saturating_neg()..=ring {
            for dy in ring.saturating_neg()..=ring {
                let key = (bx.saturating_add(dx), by.saturating_add(dy));
                let Some(bucket) = self.buckets.get(&key) else {
                    continue;
                };
                for id in bucket {
                    let within = self
                        .positions
                        .get(id)
                        .is_some_and(|other| pos.manhattan(*other) <= radius);
                    if within {
                        found.insert(*id);
                    }
                }
            }
        }
        found
    }
}
