//! weave::format
//!
//! The v5 weave text format.
//!
//! # Layout
//!
//! ```text
//! # weave file v5
//! i 0 1            parent indices ("i" alone for none)
//! 1 <hex>          checksum
//! n <name>
//!                  blank separator, then the next version
//! w
//! { 0              begin insert
//! . line           literal line, terminator kept
//! , line           literal line without terminator
//! }                end insert
//! [ 1              begin delete
//! ] 1              end delete
//! W
//! ```
//!
//! Writing then reading reproduces a weave exactly. Checksums are not
//! verified while reading; `get` and `check` do that.

use std::collections::HashSet;
use std::io::{BufRead, Write};

use tracing::debug;

use super::error::WeaveError;
use super::instruction::Instruction;
use super::Weave;
use crate::core::hash::HashAlgorithm;
use crate::core::types::{Checksum, VersionName};

/// First line of every weave file.
pub const FORMAT_MARKER: &[u8] = b"# weave file v5\n";

/// Serialize a weave.
pub fn write<W: Write>(weave: &Weave, out: &mut W) -> Result<(), WeaveError> {
    out.write_all(FORMAT_MARKER)?;

    for ((parents, checksum), name) in weave
        .parents
        .iter()
        .zip(&weave.checksums)
        .zip(&weave.names)
    {
        if parents.is_empty() {
            out.write_all(b"i\n")?;
        } else {
            let list: Vec<String> = parents.iter().map(usize::to_string).collect();
            writeln!(out, "i {}", list.join(" "))?;
        }
        writeln!(out, "1 {}", checksum)?;
        writeln!(out, "n {}", name)?;
        out.write_all(b"\n")?;
    }

    out.write_all(b"w\n")?;
    for instruction in &weave.stream {
        match instruction {
            Instruction::Line(line) => {
                if line.ends_with(b"\n") {
                    out.write_all(b". ")?;
                    out.write_all(line)?;
                } else {
                    out.write_all(b", ")?;
                    out.write_all(line)?;
                    out.write_all(b"\n")?;
                }
            }
            Instruction::BeginInsert(v) => writeln!(out, "{{ {}", v)?,
            Instruction::EndInsert => out.write_all(b"}\n")?,
            Instruction::BeginDelete(v) => writeln!(out, "[ {}", v)?,
            Instruction::EndDelete(v) => writeln!(out, "] {}", v)?,
        }
    }
    out.write_all(b"W\n")?;
    Ok(())
}

/// Serialize a weave into a byte vector.
pub fn to_bytes(weave: &Weave) -> Vec<u8> {
    let mut out = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write(weave, &mut out);
    out
}

/// Parse a weave with default capabilities.
pub fn read<R: BufRead>(reader: R) -> Result<Weave, WeaveError> {
    let mut weave = Weave::new();
    read_into(reader, &mut weave)?;
    Ok(weave)
}

/// Parse a weave from bytes with default capabilities.
pub fn from_bytes(bytes: &[u8]) -> Result<Weave, WeaveError> {
    read(bytes)
}

/// Parse a weave into `weave`, replacing its content.
///
/// The target keeps its capabilities, scope and options, except that its
/// hasher follows the stored checksums (SHA-1 or SHA-256 by length). Its
/// content is only replaced if the whole input parses.
///
/// # Errors
///
/// - [`WeaveError::NotAWeaveFile`] if the marker is missing
/// - [`WeaveError::Format`] for any other malformed input
pub fn read_into<R: BufRead>(reader: R, weave: &mut Weave) -> Result<(), WeaveError> {
    let mut lines = Lines::new(reader);

    match lines.next_line()? {
        Some(first) if first == FORMAT_MARKER => {}
        Some(first) => {
            return Err(WeaveError::NotAWeaveFile(format!(
                "invalid weave file header: {:?}",
                String::from_utf8_lossy(&first)
            )))
        }
        None => return Err(WeaveError::NotAWeaveFile("empty input".into())),
    }

    let mut parsed = weave.empty_like();

    loop {
        let line = lines.expect_line()?;
        if line == b"w\n" {
            break;
        }
        let parents = parse_parents(&line)?;

        let line = lines.expect_line()?;
        let checksum = match strip(&line, b"1 ") {
            Some(hex) => Checksum::new(utf8(hex)?)
                .map_err(|e| WeaveError::format(e.to_string()))?,
            None => return Err(unexpected("checksum", &line)),
        };

        let line = lines.expect_line()?;
        let name = match strip(&line, b"n ") {
            Some(name) => VersionName::new(utf8(name)?)
                .map_err(|e| WeaveError::format(e.to_string()))?,
            None => return Err(unexpected("name", &line)),
        };

        let line = lines.expect_line()?;
        if line != b"\n" {
            return Err(unexpected("blank separator", &line));
        }

        let index = parsed.parents.len();
        if parents.iter().any(|&p| p >= index) {
            return Err(WeaveError::format(format!(
                "version {} refers to a later parent: {:?}",
                index, parents
            )));
        }
        if parsed.name_map.insert(name.clone(), index).is_some() {
            return Err(WeaveError::format(format!("duplicate version name {}", name)));
        }
        parsed.parents.push(parents);
        parsed.checksums.push(checksum);
        parsed.names.push(name);
    }

    let versions = parsed.parents.len();
    let mut depth = 0usize;
    let mut deleting: HashSet<usize> = HashSet::new();
    loop {
        let line = lines.expect_line()?;
        let instruction = match line.first().copied() {
            Some(b'W') if line == b"W\n" => break,
            Some(b'.') if line.starts_with(b". ") => Instruction::Line(line[2..].to_vec()),
            Some(b',') if line.starts_with(b", ") && line.ends_with(b"\n") => {
                Instruction::Line(line[2..line.len() - 1].to_vec())
            }
            Some(b'{') => Instruction::BeginInsert(parse_operand(&line, versions)?),
            Some(b'}') if line == b"}\n" => Instruction::EndInsert,
            Some(b'[') => Instruction::BeginDelete(parse_operand(&line, versions)?),
            Some(b']') => Instruction::EndDelete(parse_operand(&line, versions)?),
            _ => return Err(unexpected("weave instruction", &line)),
        };
        match instruction {
            Instruction::BeginInsert(_) => depth += 1,
            Instruction::EndInsert => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    WeaveError::format("end of insertion with no open block")
                })?
            }
            Instruction::BeginDelete(v) => {
                deleting.insert(v);
            }
            Instruction::EndDelete(v) => {
                if !deleting.remove(&v) {
                    return Err(WeaveError::format(format!(
                        "end of deletion {} that was never opened",
                        v
                    )));
                }
            }
            Instruction::Line(_) => {}
        }
        parsed.stream.push(instruction);
    }
    if depth != 0 {
        return Err(WeaveError::format(format!(
            "{} unclosed insertion blocks at end of weave",
            depth
        )));
    }
    if !deleting.is_empty() {
        return Err(WeaveError::format(format!(
            "unclosed deletion blocks at end of weave: {:?}",
            deleting
        )));
    }

    if lines.next_line()?.is_some() {
        return Err(WeaveError::format("trailing data after end of weave"));
    }

    let stored = stored_algorithm(&parsed.checksums)?;

    debug!(
        weave = weave.label(),
        versions = parsed.len(),
        instructions = parsed.stream.len(),
        "parsed weave"
    );
    if let Some(alg) = stored {
        if alg != weave.hash_algorithm() {
            debug!(weave = weave.label(), hash = %alg, "using the hash the weave was written with");
            weave.hasher = alg.hasher();
        }
    }
    weave.copy_content_from(&parsed);
    Ok(())
}

/// The hash all stored checksums were made with, if there are any.
fn stored_algorithm(checksums: &[Checksum]) -> Result<Option<HashAlgorithm>, WeaveError> {
    let mut found = None;
    for checksum in checksums {
        let alg = HashAlgorithm::of_checksum(checksum).ok_or_else(|| {
            WeaveError::format(format!("checksum of unknown length: {}", checksum))
        })?;
        match found {
            None => found = Some(alg),
            Some(previous) if previous != alg => {
                return Err(WeaveError::format(format!(
                    "checksums mix {} and {}",
                    previous, alg
                )))
            }
            Some(_) => {}
        }
    }
    Ok(found)
}

/// Line reader keeping terminators.
struct Lines<R> {
    reader: R,
}

impl<R: BufRead> Lines<R> {
    fn new(reader: R) -> Self {
        Self { reader }
    }

    fn next_line(&mut self) -> Result<Option<Vec<u8>>, WeaveError> {
        let mut buf = Vec::new();
        if self.reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(buf))
    }

    fn expect_line(&mut self) -> Result<Vec<u8>, WeaveError> {
        self.next_line()?
            .ok_or_else(|| WeaveError::format("unexpected end of weave file"))
    }
}

fn strip<'a>(line: &'a [u8], prefix: &[u8]) -> Option<&'a [u8]> {
    line.strip_prefix(prefix)?.strip_suffix(b"\n")
}

fn utf8(bytes: &[u8]) -> Result<&str, WeaveError> {
    std::str::from_utf8(bytes).map_err(|_| {
        WeaveError::format(format!(
            "header is not valid UTF-8: {:?}",
            String::from_utf8_lossy(bytes)
        ))
    })
}

fn unexpected(expected: &str, line: &[u8]) -> WeaveError {
    WeaveError::format(format!(
        "expected {}, found {:?}",
        expected,
        String::from_utf8_lossy(line)
    ))
}

fn parse_parents(line: &[u8]) -> Result<Vec<usize>, WeaveError> {
    if line == b"i\n" {
        return Ok(Vec::new());
    }
    let Some(list) = strip(line, b"i ") else {
        return Err(unexpected("parent list", line));
    };
    utf8(list)?
        .split(' ')
        .map(|p| {
            p.parse::<usize>()
                .map_err(|_| WeaveError::format(format!("invalid parent index {:?}", p)))
        })
        .collect()
}

fn parse_operand(line: &[u8], versions: usize) -> Result<usize, WeaveError> {
    let operand = match line.get(1) {
        Some(b' ') => line[2..]
            .strip_suffix(b"\n")
            .ok_or_else(|| unexpected("version operand", line))?,
        _ => return Err(unexpected("version operand", line)),
    };
    let index = utf8(operand)?
        .parse::<usize>()
        .map_err(|_| unexpected("version operand", line))?;
    if index >= versions {
        return Err(WeaveError::format(format!(
            "instruction refers to unknown version {}",
            index
        )));
    }
    Ok(index)
}
