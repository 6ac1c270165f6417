//! Integration tests for the weave engine.
//!
//! These tests drive the public API end to end: adding versions, reading
//! them back, serializing, detecting corruption and combining weaves.

use weavestore::core::hash::{checksum_lines, Sha1Hasher};
use weavestore::weave::plan::{base_from_plan, merge_lines, ConflictMarkers};
use weavestore::weave::reweave::reweave;
use weavestore::weave::{format, MergeState, Weave, WeaveError};

// =============================================================================
// Test Helpers
// =============================================================================

fn text(lines: &[&str]) -> Vec<Vec<u8>> {
    lines.iter().map(|l| l.as_bytes().to_vec()).collect()
}

fn names(weave: &Weave) -> Vec<&str> {
    weave.versions().iter().map(|v| v.as_str()).collect()
}

/// Flip one character inside the serialized literal `line`.
fn corrupt(bytes: &[u8], line: &str, replacement: &str) -> Vec<u8> {
    let serialized = String::from_utf8(bytes.to_vec()).expect("utf8 weave");
    let needle = format!(". {}", line);
    assert!(serialized.contains(&needle), "line not in weave");
    serialized
        .replacen(&needle, &format!(". {}", replacement), 1)
        .into_bytes()
}

// =============================================================================
// Basic Behavior
// =============================================================================

#[test]
fn annotate_credits_each_line() {
    let mut weave = Weave::new();
    weave.add("text0", &[], &text(&["line 1\n"])).unwrap();
    weave
        .add("text1", &["text0"], &text(&["line 1\n", "line 2\n"]))
        .unwrap();

    let annotated: Vec<(String, Vec<u8>)> = weave
        .annotate("text1")
        .unwrap()
        .into_iter()
        .map(|(origin, line)| (origin.to_string(), line))
        .collect();
    assert_eq!(
        annotated,
        vec![
            ("text0".to_string(), b"line 1\n".to_vec()),
            ("text1".to_string(), b"line 2\n".to_vec()),
        ]
    );
}

#[test]
fn divergent_children_do_not_see_each_other() {
    let mut weave = Weave::new();
    weave.add("text0", &[], &text(&["A\n"])).unwrap();
    weave.add("text2", &["text0"], &text(&["A\n", "C\n"])).unwrap();
    weave.add("text3", &["text0"], &text(&["A\n", "B\n"])).unwrap();

    assert_eq!(weave.get("text2").unwrap(), text(&["A\n", "C\n"]));
    assert_eq!(weave.get("text3").unwrap(), text(&["A\n", "B\n"]));
    assert_eq!(weave.get("text0").unwrap(), text(&["A\n"]));
}

#[test]
fn repeated_add_is_idempotent() {
    let mut weave = Weave::new();
    weave.add("a", &[], &text(&["x\n"])).unwrap();
    let first = weave.add("b", &["a"], &text(&["x\n", "y\n"])).unwrap();
    let before = weave.clone();

    let second = weave.add("b", &["a"], &text(&["x\n", "y\n"])).unwrap();
    assert_eq!(first, second);
    assert_eq!(weave.len(), 2);
    assert_eq!(weave, before);
}

#[test]
fn conflicting_repeated_add_is_rejected() {
    let mut weave = Weave::new();
    weave.add("a", &[], &text(&["x\n"])).unwrap();
    assert!(matches!(
        weave.add("a", &[], &text(&["other\n"])),
        Err(WeaveError::DuplicateVersionConflict(_))
    ));
}

#[test]
fn empty_version_adds_no_instructions() {
    let mut weave = Weave::new();
    weave.add("empty", &[], &[]).unwrap();

    assert!(weave.instructions().is_empty());
    assert!(weave.get("empty").unwrap().is_empty());
    let empty: [Vec<u8>; 0] = [];
    assert_eq!(
        weave.checksum("empty").unwrap(),
        &checksum_lines(&Sha1Hasher, &empty)
    );
}

#[test]
fn unknown_parent_is_rejected() {
    let mut weave = Weave::new();
    assert!(matches!(
        weave.add("a", &["ghost"], &text(&["x\n"])),
        Err(WeaveError::UnknownParent(_))
    ));
}

// =============================================================================
// Serialization
// =============================================================================

#[test]
fn serialized_weave_round_trips() {
    let mut weave = Weave::new();
    weave.add("a", &[], &text(&["one\n", "two\n"])).unwrap();
    weave.add("b", &["a"], &text(&["one\n", "three"])).unwrap();
    weave.add("c", &["a", "b"], &text(&["zero\n", "one\n"])).unwrap();

    let bytes = format::to_bytes(&weave);
    let read = format::from_bytes(&bytes).unwrap();
    assert_eq!(read, weave);
    assert_eq!(format::to_bytes(&read), bytes);
    assert_eq!(read.get("b").unwrap(), text(&["one\n", "three"]));
}

#[test]
fn corruption_is_detected_for_containing_versions_only() {
    let mut weave = Weave::new();
    weave.add("base", &[], &text(&["shared\n", "doomed\n"])).unwrap();
    weave
        .add("keeps", &["base"], &text(&["shared\n", "doomed\n", "more\n"]))
        .unwrap();
    weave.add("drops", &["base"], &text(&["shared\n"])).unwrap();
    weave.add("fresh", &[], &text(&["unrelated\n"])).unwrap();

    let bytes = corrupt(&format::to_bytes(&weave), "doomed\n", "d00med\n");
    let damaged = format::from_bytes(&bytes).unwrap();

    for version in ["base", "keeps"] {
        assert!(
            matches!(
                damaged.get(version),
                Err(WeaveError::ChecksumMismatch { .. })
            ),
            "{} should fail",
            version
        );
    }
    assert_eq!(damaged.get("drops").unwrap(), text(&["shared\n"]));
    assert_eq!(damaged.get("fresh").unwrap(), text(&["unrelated\n"]));
    assert!(matches!(
        damaged.check(),
        Err(WeaveError::ChecksumMismatch { .. })
    ));
    assert_eq!(damaged.check_report().failures.len(), 2);
}

// =============================================================================
// Merging
// =============================================================================

#[test]
fn clean_merge_takes_both_sides() {
    let mut weave = Weave::new();
    weave
        .add("base", &[], &text(&["a\n", "b\n", "c\n", "d\n"]))
        .unwrap();
    weave
        .add("left", &["base"], &text(&["a\n", "B\n", "c\n", "d\n"]))
        .unwrap();
    weave
        .add("right", &["base"], &text(&["a\n", "b\n", "c\n", "D\n"]))
        .unwrap();

    let plan: Vec<(MergeState, &[u8])> = weave
        .plan_merge("left", "right")
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        base_from_plan(&plan),
        text(&["a\n", "b\n", "c\n", "d\n"])
    );

    let outcome = merge_lines(&plan, &ConflictMarkers::default());
    assert!(!outcome.conflicted);
    assert_eq!(outcome.lines, text(&["a\n", "B\n", "c\n", "D\n"]));
}

#[test]
fn overlapping_edits_conflict() {
    let mut weave = Weave::new();
    weave.add("base", &[], &text(&["a\n", "b\n", "c\n"])).unwrap();
    weave
        .add("left", &["base"], &text(&["a\n", "left\n", "c\n"]))
        .unwrap();
    weave
        .add("right", &["base"], &text(&["a\n", "right\n", "c\n"]))
        .unwrap();

    let plan: Vec<(MergeState, &[u8])> = weave
        .plan_merge("left", "right")
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    let outcome = merge_lines(&plan, &ConflictMarkers::default());
    assert!(outcome.conflicted);
    assert_eq!(
        outcome.lines,
        text(&[
            "a\n",
            "<<<<<<< \n",
            "left\n",
            "=======\n",
            "right\n",
            ">>>>>>> \n",
            "c\n"
        ])
    );
}

// =============================================================================
// Reweave and Join
// =============================================================================

#[test]
fn reweave_contains_union_with_parents() {
    let mut a = Weave::new();
    a.add("A", &[], &text(&["root\n"])).unwrap();
    a.add("B", &["A"], &text(&["root\n", "b\n"])).unwrap();

    let mut b = Weave::new();
    b.add("A", &[], &text(&["root\n"])).unwrap();
    b.add("C", &["A"], &text(&["c\n", "root\n"])).unwrap();

    let combined = reweave(&a, &b).unwrap();
    let mut listed = names(&combined);
    listed.sort_unstable();
    assert_eq!(listed, vec!["A", "B", "C"]);

    assert_eq!(combined.get("B").unwrap(), a.get("B").unwrap());
    assert_eq!(combined.get("C").unwrap(), b.get("C").unwrap());
    assert_eq!(
        combined.parent_names("C").unwrap()[0].as_str(),
        "A"
    );
    assert!(combined.check().is_ok());
}

#[test]
fn join_rejects_disagreeing_texts() {
    let mut a = Weave::new();
    a.add("A", &[], &text(&["one\n"])).unwrap();
    let mut b = Weave::new();
    b.add("A", &[], &text(&["two\n"])).unwrap();

    assert!(matches!(a.join(&b), Err(WeaveError::TextsDiffer(_))));
    assert_eq!(a.get("A").unwrap(), text(&["one\n"]));
}
