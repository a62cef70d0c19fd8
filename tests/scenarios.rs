use markdup::duplicates::engine::mark_duplicates;
use markdup::duplicates::engine::DuplicateMarker;
use markdup::duplicates::engine::MarkDuplicatesConfig;
use markdup::duplicates::engine::MarkingOutcome;
use markdup::duplicates::record::Alignment;
use markdup::duplicates::record::AlignmentRecord;
use markdup::duplicates::record::Strand;

//==========//
// Fixtures //
//==========//

fn fragment(name: &str, start: i64, strand: Strand) -> AlignmentRecord {
    AlignmentRecord::fragment(name, Alignment::new(0, start, start + 99), strand)
        .with_quality_scores(vec![30; 100])
}

fn pair(name: &str, start: i64, mate_start: i64) -> Vec<AlignmentRecord> {
    vec![
        AlignmentRecord::mate(name, Alignment::new(0, start, start + 99), Strand::Forward, true)
            .with_quality_scores(vec![30; 100]),
        AlignmentRecord::mate(
            name,
            Alignment::new(0, mate_start, mate_start + 99),
            Strand::Reverse,
            false,
        )
        .with_quality_scores(vec![30; 100]),
    ]
}

/// A mixed run: duplicated fragments, duplicated pairs (some optical),
/// unique reads and reads that are never examined.
fn mixed_run() -> Vec<AlignmentRecord> {
    let mut records = Vec::new();

    for i in 0..3 {
        records.push(fragment(&format!("M:1:1101:{}:100", i * 1000), 500, Strand::Forward));
    }
    records.push(fragment("M:1:1101:5:5", 900, Strand::Reverse));

    records.extend(pair("M:1:1101:100:100", 1000, 1300));
    records.extend(pair("M:1:1101:120:110", 1000, 1300));
    records.extend(pair("M:1:1102:120:110", 1000, 1300));
    records.extend(pair("M:1:1101:9000:9000", 2000, 2300));

    let mut secondary = fragment("M:1:1101:7:7", 500, Strand::Forward);
    secondary.flags.secondary = true;
    records.push(secondary);
    records.push(AlignmentRecord::unmapped("M:1:1101:8:8"));

    records
}

fn run(records: &[AlignmentRecord]) -> MarkingOutcome {
    mark_duplicates(records, MarkDuplicatesConfig::default())
}

//===========//
// Scenarios //
//===========//

#[test]
fn four_identical_unpaired_reads() {
    let records: Vec<_> = (0..4)
        .map(|i| fragment(&format!("read{}", i), 100, Strand::Forward))
        .collect();

    let outcome = run(&records);
    let metrics = &outcome.report.metrics;

    assert_eq!(outcome.flags.iter().filter(|f| f.duplicate).count(), 3);
    assert_eq!(metrics.unpaired_reads_examined, 4);
    assert_eq!(metrics.unpaired_read_duplicates, 3);
    assert_eq!(metrics.percent_duplication, Some(0.75));
    assert_eq!(outcome.report.histograms.all_sets.get(4), 1);
    assert_eq!(outcome.report.histograms.all_sets.sum(), 1);
    assert_eq!(outcome.report.histograms.non_optical_sets.get(4), 1);
}

#[test]
fn two_optical_pairs() {
    let mut records = pair("M:1:1101:1000:1000", 100, 400);
    records.extend(pair("M:1:1101:1010:1020", 100, 400));

    let outcome = run(&records);
    let metrics = &outcome.report.metrics;

    assert_eq!(metrics.read_pairs_examined, 2);
    assert_eq!(metrics.read_pair_duplicates, 1);
    assert_eq!(metrics.read_pair_optical_duplicates, 1);
    assert_eq!(outcome.report.histograms.all_sets.get(2), 1);
    assert_eq!(outcome.report.histograms.non_optical_sets.get(1), 1);
    assert_eq!(outcome.report.histograms.optical_sets.get(2), 1);

    // Both records of the losing pair are optical duplicates.
    let optical: Vec<bool> = outcome.flags.iter().map(|f| f.optical_duplicate).collect();
    assert_eq!(optical.iter().filter(|o| **o).count(), 2);
    assert_eq!(optical[0], optical[1]);
    assert_eq!(optical[2], optical[3]);
}

#[test]
fn pairs_without_flowcell_locations_are_still_marked() {
    let mut records = pair("readA", 100, 400);
    records.extend(pair("readB", 100, 400));

    let outcome = run(&records);
    let report = &outcome.report;

    assert_eq!(report.metrics.read_pairs_examined, 2);
    assert_eq!(report.metrics.read_pair_duplicates, 1);
    assert_eq!(report.metrics.read_pair_optical_duplicates, 0);
    assert_eq!(outcome.flags.iter().filter(|f| f.duplicate).count(), 2);
    assert!(outcome.flags.iter().all(|f| !f.optical_duplicate));
    assert_eq!(report.anomalies.malformed_records, 2);
    assert_eq!(report.histograms.non_optical_sets.get(2), 1);
    assert!(report.histograms.optical_sets.is_empty());
}

#[test]
fn zero_duplication() {
    let mut records = Vec::new();
    for i in 0..5 {
        records.extend(pair(&format!("M:1:1101:{}:1", i * 500), 100 + i * 10, 600));
    }

    let outcome = run(&records);
    let metrics = &outcome.report.metrics;

    assert!(outcome.flags.iter().all(|f| !f.duplicate));
    assert_eq!(metrics.read_pairs_examined, 5);
    assert_eq!(metrics.percent_duplication, Some(0.0));
    assert_eq!(metrics.estimated_library_size, None);
    assert!(outcome.report.roi.is_empty());

    // Singleton sets are still counted.
    assert_eq!(outcome.report.histograms.all_sets.get(1), 5);
    assert_eq!(outcome.report.histograms.all_sets.sum(), 5);
}

#[test]
fn empty_input() {
    let outcome = DuplicateMarker::default().finish();
    let metrics = &outcome.report.metrics;

    assert!(outcome.flags.is_empty());
    assert_eq!(metrics.unpaired_reads_examined, 0);
    assert_eq!(metrics.read_pairs_examined, 0);
    assert_eq!(metrics.percent_duplication, None);
    assert_eq!(metrics.estimated_library_size, None);
    assert!(outcome.report.histograms.all_sets.is_empty());
}

//============//
// Properties //
//============//

#[test]
fn one_flag_per_record_in_input_order() {
    let records = mixed_run();
    let outcome = run(&records);

    assert_eq!(outcome.flags.len(), records.len());
}

#[test]
fn exactly_one_member_of_every_set_is_kept() {
    let records = mixed_run();
    let outcome = run(&records);
    let report = &outcome.report;
    let metrics = &report.metrics;

    // Every set of size n contributes n - 1 duplicate candidates.
    let expected = report.histograms.all_sets.weighted_sum() - report.histograms.all_sets.sum();
    assert_eq!(
        metrics.unpaired_read_duplicates + metrics.read_pair_duplicates,
        expected
    );

    // Candidates examined add up to the set sizes.
    assert_eq!(
        metrics.unpaired_reads_examined + metrics.read_pairs_examined,
        report.histograms.all_sets.weighted_sum()
    );

    let marked = outcome.flags.iter().filter(|f| f.duplicate).count() as u64;
    assert_eq!(marked, metrics.duplicate_reads());
}

#[test]
fn optical_duplicates_are_a_subset_of_duplicates() {
    let records = mixed_run();
    let outcome = run(&records);
    let metrics = &outcome.report.metrics;

    assert!(outcome
        .flags
        .iter()
        .all(|f| !f.optical_duplicate || f.duplicate));
    assert!(metrics.read_pair_optical_duplicates <= metrics.read_pair_duplicates);

    // The pair on tile 1102 is a duplicate but not optical.
    assert_eq!(metrics.read_pair_duplicates, 2);
    assert_eq!(metrics.read_pair_optical_duplicates, 1);
}

#[test]
fn unmapped_and_secondary_records_are_never_marked() {
    let records = mixed_run();
    let outcome = run(&records);

    for (record, flags) in records.iter().zip(&outcome.flags) {
        if record.is_unmapped() || record.flags.is_secondary_or_supplementary() {
            assert!(!flags.duplicate, "{} was marked", record.name);
        }
    }

    assert_eq!(outcome.report.metrics.unmapped_reads, 1);
    assert_eq!(outcome.report.metrics.secondary_or_supplementary_reads, 1);
}

#[test]
fn runs_are_deterministic_across_thread_counts() {
    let records = mixed_run();

    let single = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap()
        .install(|| run(&records));
    let many = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .unwrap()
        .install(|| run(&records));

    assert_eq!(single.flags, many.flags);
    assert_eq!(single.report, many.report);
}

#[test]
fn adding_a_duplicate_never_lowers_the_duplicate_count() {
    let mut records = mixed_run();
    let before = run(&records).report.metrics;

    records.push(fragment("M:1:1101:4000:4000", 500, Strand::Forward));
    let after = run(&records).report.metrics;

    assert_eq!(
        after.unpaired_read_duplicates,
        before.unpaired_read_duplicates + 1
    );
    assert!(after.percent_duplication >= before.percent_duplication);
}

#[test]
fn mate_order_does_not_change_the_key() {
    let mut forward = pair("a", 100, 400);
    let mut swapped = pair("b", 100, 400);
    swapped.reverse();
    forward.append(&mut swapped);

    let outcome = run(&forward);
    assert_eq!(outcome.report.metrics.read_pairs_examined, 2);
    assert_eq!(outcome.report.metrics.read_pair_duplicates, 1);
}
