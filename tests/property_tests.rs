//! Property-based tests for the weave engine.
//!
//! These tests use proptest to build random version histories over a small
//! line alphabet, with some final lines left unterminated and either
//! matcher, and verify the engine's invariants on each of them.

use proptest::prelude::*;

use weavestore::core::hash::{checksum_lines, Sha1Hasher};
use weavestore::weave::plan::{merge_lines, ConflictMarkers};
use weavestore::diff::MatcherKind;
use weavestore::weave::{format, MergeState, Weave, WeaveOptions};

/// One version to add: its text as alphabet indices, parent picks, and
/// whether its last line lacks a terminator.
type Step = (Vec<u8>, Vec<prop::sample::Index>, bool);

/// A random history of up to eight versions and the matcher to add them with.
#[derive(Debug, Clone)]
struct History {
    steps: Vec<Step>,
    matcher: MatcherKind,
}

fn history() -> impl Strategy<Value = History> {
    let steps = prop::collection::vec(
        (
            prop::collection::vec(0u8..6, 0..8),
            prop::collection::vec(any::<prop::sample::Index>(), 0..3),
            prop::bool::weighted(0.3),
        ),
        1..8,
    );
    let matcher = prop_oneof![Just(MatcherKind::Patience), Just(MatcherKind::Lcs)];
    (steps, matcher).prop_map(|(steps, matcher)| History { steps, matcher })
}

fn text_of(content: &[u8], open_end: bool) -> Vec<Vec<u8>> {
    let last = content.len().saturating_sub(1);
    content
        .iter()
        .enumerate()
        .map(|(i, n)| {
            if open_end && i == last {
                format!("line {}", n).into_bytes()
            } else {
                format!("line {}\n", n).into_bytes()
            }
        })
        .collect()
}

/// Build a weave from a history, returning it with each version's text.
fn build(history: &History) -> (Weave, Vec<Vec<Vec<u8>>>) {
    let mut weave = Weave::with_options(WeaveOptions {
        matcher: history.matcher,
        ..Default::default()
    });
    let mut texts = Vec::new();
    for (i, (content, picks, open_end)) in history.steps.iter().enumerate() {
        let lines = text_of(content, *open_end);
        let parent_names: Vec<String> = if i == 0 {
            Vec::new()
        } else {
            picks.iter().map(|p| format!("v{}", p.index(i))).collect()
        };
        let parents: Vec<&str> = parent_names.iter().map(String::as_str).collect();
        weave
            .add(&format!("v{}", i), &parents, &lines)
            .expect("add version");
        texts.push(lines);
    }
    (weave, texts)
}

proptest! {
    #[test]
    fn every_version_reads_back(history in history()) {
        let (weave, texts) = build(&history);
        for (i, expected) in texts.iter().enumerate() {
            prop_assert_eq!(&weave.get(&format!("v{}", i)).unwrap(), expected);
        }
    }

    #[test]
    fn serialization_round_trips(history in history()) {
        let (weave, texts) = build(&history);
        let bytes = format::to_bytes(&weave);
        let read = format::from_bytes(&bytes).unwrap();
        prop_assert_eq!(&read, &weave);
        prop_assert_eq!(format::to_bytes(&read), bytes);
        for (i, expected) in texts.iter().enumerate() {
            prop_assert_eq!(&read.get(&format!("v{}", i)).unwrap(), expected);
        }
        prop_assert!(read.check().is_ok());
    }

    #[test]
    fn checked_weave_checksums_match_texts(history in history()) {
        let (weave, _) = build(&history);
        prop_assert!(weave.check().is_ok());
        for name in weave.versions() {
            let lines = weave.get(name.as_str()).unwrap();
            prop_assert_eq!(
                weave.checksum(name.as_str()).unwrap(),
                &checksum_lines(&Sha1Hasher, &lines)
            );
        }
    }

    #[test]
    fn ancestry_contains_parent_ancestry(history in history()) {
        let (weave, _) = build(&history);
        for name in weave.versions() {
            let ancestry = weave.get_ancestry(&[name.as_str()]).unwrap();
            prop_assert!(ancestry.contains(name));
            for parent in weave.parent_names(name.as_str()).unwrap() {
                let parent_ancestry = weave.get_ancestry(&[parent.as_str()]).unwrap();
                prop_assert!(ancestry.is_superset(&parent_ancestry));
            }
        }
    }

    #[test]
    fn re_adding_changes_nothing(history in history()) {
        let (mut weave, texts) = build(&history);
        let before = weave.clone();
        let last = texts.len() - 1;
        let name = format!("v{}", last);
        let parents: Vec<String> = weave
            .parent_names(&name)
            .unwrap()
            .into_iter()
            .map(|p| p.to_string())
            .collect();
        let parents: Vec<&str> = parents.iter().map(String::as_str).collect();

        prop_assert_eq!(weave.add(&name, &parents, &texts[last]).unwrap(), last);
        prop_assert_eq!(&weave, &before);
    }

    #[test]
    fn merging_with_an_ancestor_gives_the_descendant(history in history()) {
        let (weave, texts) = build(&history);
        let last = texts.len() - 1;
        let name = format!("v{}", last);
        for parent in weave.parent_names(&name).unwrap() {
            let plan: Vec<(MergeState, &[u8])> = weave
                .plan_merge(&name, parent.as_str())
                .unwrap()
                .collect::<Result<_, _>>()
                .unwrap();
            let outcome = merge_lines(&plan, &ConflictMarkers::default());
            prop_assert!(!outcome.conflicted);
            prop_assert_eq!(&outcome.lines, &texts[last]);
        }
    }
}
