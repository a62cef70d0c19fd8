//! Resolves mates into pairs and partitions the keyed candidates of a run
//! into duplicate sets.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::IndexSet;
use tracing::debug;

use crate::duplicates::anomalies::Anomaly;
use crate::duplicates::anomalies::AnomalyCounts;
use crate::duplicates::keys::Candidate;
use crate::duplicates::keys::LibraryId;
use crate::duplicates::keys::ReadEnd;
use crate::duplicates::keys::RecordKey;
use crate::duplicates::physical::PhysicalLocationParser;
use crate::duplicates::record::AlignmentRecord;
use crate::duplicates::selection::ScoringStrategy;

/// A group of candidates sharing the same key. Members index into
/// [`Grouping::candidates`] and are listed in the order they were keyed.
#[derive(Clone, Debug)]
pub struct DuplicateSet {
    /// The shared key.
    pub key: RecordKey,

    /// The candidates in the set.
    pub members: Vec<usize>,
}

impl DuplicateSet {
    /// Number of candidates in the set.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the set has no candidates (never true for a built set).
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Everything produced by grouping a run.
#[derive(Debug)]
pub struct Grouping {
    /// Library names, indexed by [`LibraryId`].
    pub libraries: Vec<String>,

    /// All keyed candidates.
    pub candidates: Vec<Candidate>,

    /// The duplicate sets, in the order their keys were first seen.
    pub sets: Vec<DuplicateSet>,

    /// Problems found while keying.
    pub anomalies: AnomalyCounts,
}

/// The first mate of a pair, held until its partner arrives.
#[derive(Debug)]
struct PendingMate {
    index: usize,
    end: ReadEnd,
    library: LibraryId,
    score: u64,
    first_segment: bool,
}

/// Collects keyed records and builds duplicate sets from them.
#[derive(Debug)]
pub struct PairGrouper {
    scoring: ScoringStrategy,
    parser: Arc<dyn PhysicalLocationParser>,
    libraries: IndexSet<String>,
    candidates: Vec<Candidate>,
    pending: HashMap<(Option<String>, String), PendingMate>,
    anomalies: AnomalyCounts,
}

impl PairGrouper {
    /// Creates an empty grouper.
    pub fn new(scoring: ScoringStrategy, parser: Arc<dyn PhysicalLocationParser>) -> Self {
        Self {
            scoring,
            parser,
            libraries: IndexSet::new(),
            candidates: Vec::new(),
            pending: HashMap::new(),
            anomalies: AnomalyCounts::default(),
        }
    }

    /// Interns a library name.
    pub fn library_id(&mut self, name: &str) -> LibraryId {
        match self.libraries.get_index_of(name) {
            Some(id) => id,
            None => self.libraries.insert_full(name.to_string()).0,
        }
    }

    /// Adds a record keyed on its own end.
    pub fn add_fragment(&mut self, index: usize, record: &AlignmentRecord, end: ReadEnd) {
        let library = self.library_id(record.library_name());

        self.candidates.push(Candidate {
            key: RecordKey::Fragment { library, end },
            records: vec![index],
            name: record.name.clone(),
            score: self.scoring.score(record),
            read_group: record.read_group.clone(),
            location: None,
            read_one_first: true,
            order: index,
        });
    }

    /// Adds one mate of a pair. The pair is keyed when the second mate
    /// arrives.
    pub fn add_mate(&mut self, index: usize, record: &AlignmentRecord, end: ReadEnd) {
        let lookup = (record.read_group.clone(), record.name.clone());

        let mate = match self.pending.remove(&lookup) {
            Some(mate) => mate,
            None => {
                let library = self.library_id(record.library_name());
                self.pending.insert(
                    lookup,
                    PendingMate {
                        index,
                        end,
                        library,
                        score: self.scoring.score(record),
                        first_segment: record.flags.first_segment,
                    },
                );
                return;
            }
        };

        let (read_one, read_two) = if mate.first_segment {
            (mate.end, end)
        } else {
            (end, mate.end)
        };

        let location = self.parser.parse(&record.name);
        if location.is_none() && self.parser.expects_locations() {
            self.anomalies.record(Anomaly::MalformedRecord, &record.name);
        }

        self.candidates.push(Candidate {
            key: RecordKey::pair(mate.library, read_one, read_two),
            records: vec![mate.index, index],
            name: record.name.clone(),
            score: mate.score + self.scoring.score(record),
            read_group: record.read_group.clone(),
            location,
            read_one_first: read_one <= read_two,
            order: mate.index,
        });
    }

    /// Demotes unresolved mates to fragments and partitions all candidates
    /// into duplicate sets.
    pub fn finish(mut self) -> Grouping {
        let mut orphans: Vec<((Option<String>, String), PendingMate)> =
            self.pending.drain().collect();
        orphans.sort_by_key(|(_, mate)| mate.index);

        for ((read_group, name), mate) in orphans {
            self.anomalies.record(Anomaly::InconsistentMateInfo, &name);
            self.candidates.push(Candidate {
                key: RecordKey::Fragment {
                    library: mate.library,
                    end: mate.end,
                },
                records: vec![mate.index],
                name,
                score: mate.score,
                read_group,
                location: None,
                read_one_first: true,
                order: mate.index,
            });
        }

        let mut partition: IndexMap<RecordKey, Vec<usize>> = IndexMap::new();
        for (i, candidate) in self.candidates.iter().enumerate() {
            partition.entry(candidate.key).or_default().push(i);
        }

        debug!(
            "grouped {} candidates into {} duplicate sets",
            self.candidates.len(),
            partition.len()
        );

        Grouping {
            libraries: self.libraries.into_iter().collect(),
            candidates: self.candidates,
            sets: partition
                .into_iter()
                .map(|(key, members)| DuplicateSet { key, members })
                .collect(),
            anomalies: self.anomalies,
        }
    }
}
