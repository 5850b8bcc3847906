// Property Tests for Strata
// These tests check key ordering and lookups against a simple model

use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use strata::table::{MemoryStore, MemoryTable, TableCache};
use strata::{InternalKey, LookupKey, Options, ReadStats, ValueType, Version, VersionEdit};

/// One write: user key, value (None is a delete).
type Write = (String, Option<u8>);

fn key_strategy() -> impl Strategy<Value = String> {
    "[a-f]{1,2}"
}

fn write_strategy() -> impl Strategy<Value = Write> {
    (key_strategy(), prop::option::weighted(0.8, any::<u8>()))
}

/// Model: for each user key, every `(sequence, value)` written.
type Model = BTreeMap<String, Vec<(u64, Option<u8>)>>;

fn model_get(model: &Model, key: &str, snapshot: u64) -> Option<Option<u8>> {
    model
        .get(key)?
        .iter()
        .filter(|(seq, _)| *seq <= snapshot)
        .max_by_key(|(seq, _)| *seq)
        .map(|(_, value)| *value)
}

/// Older writes go to disjoint level-1 files, newer ones to overlapping level-0 files.
fn build(older: &[Write], newer: &[Vec<Write>]) -> (Version, Model) {
    let store = Arc::new(MemoryStore::new());
    let mut model = Model::new();
    let mut edits = Vec::new();
    let mut seq = 0u64;
    let mut number = 0u64;

    let mut level1: BTreeMap<String, Vec<(u64, Option<u8>)>> = BTreeMap::new();
    for (key, value) in older {
        seq += 1;
        level1.entry(key.clone()).or_default().push((seq, *value));
        model.entry(key.clone()).or_default().push((seq, *value));
    }
    // Two user keys per file keeps files disjoint.
    let groups: Vec<_> = level1.into_iter().collect();
    for chunk in groups.chunks(2) {
        let mut table = MemoryTable::new();
        for (key, versions) in chunk {
            for (s, value) in versions {
                match value {
                    Some(v) => table.put(key.as_bytes(), *s, &[*v]),
                    None => table.delete(key.as_bytes(), *s),
                }
            }
        }
        number += 1;
        edits.push(VersionEdit::add(1, &store.insert(number, table).unwrap()));
    }

    for batch in newer {
        let mut table = MemoryTable::new();
        for (key, value) in batch {
            seq += 1;
            match value {
                Some(v) => table.put(key.as_bytes(), seq, &[*v]),
                None => table.delete(key.as_bytes(), seq),
            }
            model.entry(key.clone()).or_default().push((seq, *value));
        }
        number += 1;
        if let Some(meta) = store.insert(number, table) {
            edits.push(VersionEdit::add(0, &meta));
        }
    }

    let version = Version::new(Options::default(), Arc::new(TableCache::new(store))).unwrap();
    (version.apply(&edits).unwrap(), model)
}

proptest! {
    #[test]
    fn prop_internal_key_order_matches_tuple_order(
        a in (key_strategy(), 0u64..1000, any::<bool>()),
        b in (key_strategy(), 0u64..1000, any::<bool>()),
    ) {
        let kind = |is_value: bool| if is_value { ValueType::Value } else { ValueType::Deletion };
        let ka = InternalKey::new(a.0.as_bytes().to_vec(), a.1, kind(a.2));
        let kb = InternalKey::new(b.0.as_bytes().to_vec(), b.1, kind(b.2));

        let expected = a.0.as_bytes().cmp(b.0.as_bytes())
            .then(b.1.cmp(&a.1))
            .then((b.2 as u8).cmp(&(a.2 as u8)));
        prop_assert_eq!(ka.cmp(&kb), expected);
        prop_assert_eq!(InternalKey::decode(&ka.encode()), Some(ka));
    }

    #[test]
    fn prop_get_matches_model(
        older in prop::collection::vec(write_strategy(), 0..30),
        newer in prop::collection::vec(prop::collection::vec(write_strategy(), 0..8), 0..5),
        reads in prop::collection::vec((key_strategy(), 0u64..80), 1..20),
    ) {
        let (version, model) = build(&older, &newer);
        prop_assert!(version.levels().iter().all(|level| level.check_invariants().is_ok()));

        let mut stats = ReadStats::new();
        for (key, snapshot) in reads {
            let lookup = LookupKey::new(key.as_bytes().to_vec(), snapshot);
            let result = version.get(&lookup, &mut stats).unwrap();
            let actual = result.map(|r| r.into_value().map(|v| v[0]));
            let expected = model_get(&model, &key, snapshot);
            prop_assert_eq!(actual, expected, "key {} at {}", key, snapshot);
        }
    }

    #[test]
    fn prop_range_overlap_matches_scan(
        older in prop::collection::vec(write_strategy(), 1..30),
        lo in key_strategy(),
        hi in key_strategy(),
    ) {
        let (version, _) = build(&older, &[]);
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };

        let level = version.level(1).unwrap();
        let scan = level.files().iter().any(|f| {
            f.smallest().user_key() <= hi.as_bytes() && f.largest().user_key() >= lo.as_bytes()
        });
        let indexed = level.some_file_overlaps_range(lo.as_bytes(), hi.as_bytes());
        prop_assert_eq!(indexed, scan);
    }
}
