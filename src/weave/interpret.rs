//! weave::interpret
//!
//! Evaluation of the instruction stream.
//!
//! # Rules
//!
//! While scanning the stream the interpreter keeps an insert stack and a set
//! of open deletions. A literal line is active for a target set when:
//! - its innermost open insertion belongs to a version in the set, and
//! - no version in the set has an open deletion over it.
//!
//! Both structures are transient; nothing outlives one call.
//!
//! [`extract`] evaluates one inclusion set eagerly. [`Walk`] yields every line
//! with its full insertion and deletion context, so callers can evaluate
//! many targets in a single pass.

use std::collections::BTreeSet;
use std::collections::HashSet;
use std::rc::Rc;

use super::error::WeaveError;
use super::instruction::Instruction;

/// A line active for an inclusion set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveLine<'a> {
    /// Version whose insertion block introduced the line
    pub origin: usize,
    /// Position of the line in the instruction stream
    pub position: usize,
    /// The line itself
    pub line: &'a [u8],
}

/// Lines active for the given inclusion set, in stream order.
///
/// `included` must already be closed under ancestry; deletions by versions
/// outside it are ignored.
///
/// # Errors
///
/// Returns [`WeaveError::Format`] if the stream is unbalanced.
pub fn extract<'a>(
    stream: &'a [Instruction],
    included: &HashSet<usize>,
) -> Result<Vec<ActiveLine<'a>>, WeaveError> {
    let mut istack: Vec<usize> = Vec::new();
    let mut dset: HashSet<usize> = HashSet::new();
    let mut result = Vec::new();

    for (position, instruction) in stream.iter().enumerate() {
        match instruction {
            Instruction::BeginInsert(v) => istack.push(*v),
            Instruction::EndInsert => {
                if istack.pop().is_none() {
                    return Err(WeaveError::format(format!(
                        "end of insertion with no open block at {}",
                        position
                    )));
                }
            }
            Instruction::BeginDelete(v) => {
                if included.contains(v) {
                    dset.insert(*v);
                }
            }
            Instruction::EndDelete(v) => {
                if included.contains(v) && !dset.remove(v) {
                    return Err(WeaveError::format(format!(
                        "end of deletion {} that was never opened at {}",
                        v, position
                    )));
                }
            }
            Instruction::Line(line) => {
                if !dset.is_empty() {
                    continue;
                }
                if let Some(&origin) = istack.last() {
                    if included.contains(&origin) {
                        result.push(ActiveLine {
                            origin,
                            position,
                            line,
                        });
                    }
                }
            }
        }
    }

    if !istack.is_empty() {
        return Err(unclosed_insertions(&istack));
    }
    if !dset.is_empty() {
        return Err(unclosed_deletions(dset.iter()));
    }
    Ok(result)
}

/// One literal line together with its stream context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkItem<'a> {
    /// Position of the line in the instruction stream
    pub position: usize,
    /// Innermost open insertion
    pub inserted: usize,
    /// Every version with an open deletion over the line
    pub deleted: Rc<BTreeSet<usize>>,
    /// The line itself
    pub line: &'a [u8],
}

/// Lazy walk over every literal line of a stream.
///
/// All deletions are tracked regardless of target. The delete set is shared
/// between consecutive items and only copied when it changes.
///
/// Items are `Err` if the stream is unbalanced; the walk stops after the
/// first error.
#[derive(Debug)]
pub struct Walk<'a> {
    stream: std::iter::Enumerate<std::slice::Iter<'a, Instruction>>,
    istack: Vec<usize>,
    dset: Rc<BTreeSet<usize>>,
    done: bool,
}

impl<'a> Walk<'a> {
    /// Start walking a stream.
    pub fn new(stream: &'a [Instruction]) -> Self {
        Self {
            stream: stream.iter().enumerate(),
            istack: Vec::new(),
            dset: Rc::new(BTreeSet::new()),
            done: false,
        }
    }

    fn fail(&mut self, error: WeaveError) -> Option<Result<WalkItem<'a>, WeaveError>> {
        self.done = true;
        Some(Err(error))
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = Result<WalkItem<'a>, WeaveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        for (position, instruction) in self.stream.by_ref() {
            match instruction {
                Instruction::BeginInsert(v) => self.istack.push(*v),
                Instruction::EndInsert => {
                    if self.istack.pop().is_none() {
                        return self.fail(WeaveError::format(format!(
                            "end of insertion with no open block at {}",
                            position
                        )));
                    }
                }
                Instruction::BeginDelete(v) => {
                    Rc::make_mut(&mut self.dset).insert(*v);
                }
                Instruction::EndDelete(v) => {
                    if !Rc::make_mut(&mut self.dset).remove(v) {
                        return self.fail(WeaveError::format(format!(
                            "end of deletion {} that was never opened at {}",
                            v, position
                        )));
                    }
                }
                Instruction::Line(line) => {
                    let Some(&inserted) = self.istack.last() else {
                        return self.fail(WeaveError::format(format!(
                            "line outside any insertion block at {}",
                            position
                        )));
                    };
                    return Some(Ok(WalkItem {
                        position,
                        inserted,
                        deleted: Rc::clone(&self.dset),
                        line,
                    }));
                }
            }
        }

        self.done = true;
        if !self.istack.is_empty() {
            return Some(Err(unclosed_insertions(&self.istack)));
        }
        if !self.dset.is_empty() {
            return Some(Err(unclosed_deletions(self.dset.iter())));
        }
        None
    }
}

fn unclosed_insertions(istack: &[usize]) -> WeaveError {
    WeaveError::format(format!(
        "unclosed insertion blocks at end of weave: {:?}",
        istack
    ))
}

fn unclosed_deletions<'a>(open: impl Iterator<Item = &'a usize>) -> WeaveError {
    let mut open: Vec<usize> = open.copied().collect();
    open.sort_unstable();
    WeaveError::format(format!(
        "unclosed deletion blocks at end of weave: {:?}",
        open
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use Instruction::*;

    fn line(s: &str) -> Instruction {
        Line(s.as_bytes().to_vec())
    }

    fn set(items: &[usize]) -> HashSet<usize> {
        items.iter().copied().collect()
    }

    /// v0 = [a, b], v1 (parent v0) deletes b and adds c.
    fn stream() -> Vec<Instruction> {
        vec![
            BeginInsert(0),
            line("a\n"),
            BeginDelete(1),
            line("b\n"),
            EndDelete(1),
            BeginInsert(1),
            line("c\n"),
            EndInsert,
            EndInsert,
        ]
    }

    fn texts(active: &[ActiveLine<'_>]) -> Vec<&'static str> {
        active
            .iter()
            .map(|l| match l.line {
                b"a\n" => "a",
                b"b\n" => "b",
                b"c\n" => "c",
                _ => "?",
            })
            .collect()
    }

    #[test]
    fn extract_respects_inclusions() {
        let s = stream();
        assert_eq!(texts(&extract(&s, &set(&[0])).unwrap()), vec!["a", "b"]);
        assert_eq!(texts(&extract(&s, &set(&[0, 1])).unwrap()), vec!["a", "c"]);
    }

    #[test]
    fn extract_reports_origin_and_position() {
        let s = stream();
        let active = extract(&s, &set(&[0, 1])).unwrap();
        assert_eq!(active[0].origin, 0);
        assert_eq!(active[0].position, 1);
        assert_eq!(active[1].origin, 1);
        assert_eq!(active[1].position, 6);
    }

    #[test]
    fn empty_stream_is_empty() {
        assert!(extract(&[], &set(&[0])).unwrap().is_empty());
        assert_eq!(Walk::new(&[]).count(), 0);
    }

    #[test]
    fn unclosed_insert_is_format_error() {
        let s = vec![BeginInsert(0), line("a\n")];
        assert!(matches!(extract(&s, &set(&[0])), Err(WeaveError::Format(_))));
        let last = Walk::new(&s).last().unwrap();
        assert!(matches!(last, Err(WeaveError::Format(_))));
    }

    #[test]
    fn stray_end_insert_is_format_error() {
        let s = vec![EndInsert];
        assert!(matches!(extract(&s, &set(&[0])), Err(WeaveError::Format(_))));
    }

    #[test]
    fn stray_end_delete_is_format_error() {
        let s = vec![BeginInsert(0), line("a\n"), EndDelete(0), EndInsert];
        assert!(matches!(extract(&s, &set(&[0])), Err(WeaveError::Format(_))));
        assert!(Walk::new(&s).any(|item| item.is_err()));
    }

    #[test]
    fn unclosed_delete_is_format_error() {
        let s = vec![BeginInsert(0), BeginDelete(0), line("a\n"), EndInsert];
        assert!(matches!(extract(&s, &set(&[0])), Err(WeaveError::Format(_))));
    }

    #[test]
    fn walk_tracks_every_deletion() {
        let s = stream();
        let items: Vec<WalkItem<'_>> = Walk::new(&s).collect::<Result<_, _>>().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].inserted, 0);
        assert!(items[0].deleted.is_empty());
        assert_eq!(items[1].line, b"b\n");
        assert!(items[1].deleted.contains(&1));
        assert_eq!(items[2].inserted, 1);
        assert!(items[2].deleted.is_empty());
    }

    #[test]
    fn walk_shares_unchanged_delete_sets() {
        let s = vec![
            BeginInsert(0),
            line("a\n"),
            line("b\n"),
            EndInsert,
        ];
        let items: Vec<WalkItem<'_>> = Walk::new(&s).collect::<Result<_, _>>().unwrap();
        assert!(Rc::ptr_eq(&items[0].deleted, &items[1].deleted));
    }

    #[test]
    fn walk_stops_after_error() {
        let s = vec![EndInsert, BeginInsert(0), line("a\n"), EndInsert];
        let mut walk = Walk::new(&s);
        assert!(matches!(walk.next(), Some(Err(_))));
        assert!(walk.next().is_none());
    }
}
