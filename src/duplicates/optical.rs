//! Classification of duplicates that arise from sequencer optics rather than
//! from PCR.
//!
//! Within a duplicate set, members are compared only when they were imaged on
//! the same tile of the same read group (and, for pairs, sequenced in the same
//! orientation). Two members are related when their clusters lie within
//! `pixel_distance` of each other. Related members form connected components;
//! each component of `n` members holds `n - 1` optical duplicates. The set's
//! representative is never itself flagged.

use indexmap::IndexMap;
use itertools::Itertools;
use tracing::warn;

use crate::duplicates::keys::Candidate;

/// Default maximum distance, in pixels, between optical duplicates.
pub const DEFAULT_OPTICAL_PIXEL_DISTANCE: f64 = 100.0;

/// Default largest set that is checked for optical duplicates.
pub const DEFAULT_MAX_OPTICAL_SET_SIZE: usize = 300_000;

/// Finds optical duplicates within a duplicate set.
#[derive(Clone, Debug)]
pub struct OpticalDuplicateFinder {
    pixel_distance: f64,
    max_set_size: usize,
}

impl Default for OpticalDuplicateFinder {
    fn default() -> Self {
        Self::new(DEFAULT_OPTICAL_PIXEL_DISTANCE, DEFAULT_MAX_OPTICAL_SET_SIZE)
    }
}

impl OpticalDuplicateFinder {
    /// Creates a finder.
    pub fn new(pixel_distance: f64, max_set_size: usize) -> Self {
        Self {
            pixel_distance,
            max_set_size,
        }
    }

    /// The configured pixel distance.
    pub fn pixel_distance(&self) -> f64 {
        self.pixel_distance
    }

    /// Flags the optical duplicates of a set. `members` index into
    /// `candidates`, and `keeper` is the position of the representative
    /// within `members`. The returned flags line up with `members`.
    pub fn find(&self, candidates: &[Candidate], members: &[usize], keeper: usize) -> Vec<bool> {
        let mut optical = vec![false; members.len()];

        if members.len() < 2 {
            return optical;
        }

        if members.len() > self.max_set_size {
            warn!(
                "Skipping optical duplicate detection for a set of {} members (limit {}).",
                members.len(),
                self.max_set_size
            );
            return optical;
        }

        // (1) Bucket members that could be optically related.
        let mut tiles: IndexMap<(Option<&str>, i32, bool), Vec<usize>> = IndexMap::new();
        for (position, member) in members.iter().enumerate() {
            let candidate = &candidates[*member];

            if let Some(location) = candidate.location {
                tiles
                    .entry((
                        candidate.read_group.as_deref(),
                        location.tile,
                        candidate.read_one_first,
                    ))
                    .or_default()
                    .push(position);
            }
        }

        // (2) Cluster each bucket and flag all but one member of every
        // cluster.
        for positions in tiles.values().filter(|p| p.len() > 1) {
            let mut clusters = UnionFind::new(positions.len());

            for (i, j) in (0..positions.len()).tuple_combinations() {
                let a = candidates[members[positions[i]]].location;
                let b = candidates[members[positions[j]]].location;

                if let (Some(a), Some(b)) = (a, b) {
                    if a.distance(&b) <= self.pixel_distance {
                        clusters.union(i, j);
                    }
                }
            }

            for component in clusters.components() {
                if component.len() < 2 {
                    continue;
                }

                let component: Vec<usize> = component.iter().map(|i| positions[*i]).collect();
                let kept = if component.contains(&keeper) {
                    keeper
                } else {
                    *component
                        .iter()
                        .min_by_key(|p| candidates[members[**p]].order)
                        .unwrap_or(&component[0])
                };

                for position in component.into_iter().filter(|p| *p != kept) {
                    optical[position] = true;
                }
            }
        }

        optical
    }
}

//============//
// Union-find //
//============//

/// Disjoint sets over `0..n`.
#[derive(Debug)]
struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut a, mut b) = (self.find(a), self.find(b));
        if a == b {
            return;
        }

        if self.size[a] < self.size[b] {
            std::mem::swap(&mut a, &mut b);
        }

        self.parent[b] = a;
        self.size[a] += self.size[b];
    }

    /// The components, each listed in ascending order.
    fn components(&mut self) -> Vec<Vec<usize>> {
        let mut roots: IndexMap<usize, Vec<usize>> = IndexMap::new();
        for i in 0..self.parent.len() {
            let root = self.find(i);
            roots.entry(root).or_default().push(i);
        }
        roots.into_values().collect()
    }
}
