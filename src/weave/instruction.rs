//! weave::instruction
//!
//! Elements of the shared instruction stream.

/// One element of a weave's instruction stream.
///
/// Version operands are dense indices into the weave's tables. Lines are
/// opaque bytes and keep their terminator, if any.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// A literal line of text.
    Line(Vec<u8>),
    /// Open an insertion block owned by a version.
    BeginInsert(usize),
    /// Close the innermost open insertion block.
    EndInsert,
    /// Open a deletion block owned by a version.
    BeginDelete(usize),
    /// Close the deletion block owned by a version.
    EndDelete(usize),
}

impl Instruction {
    /// The literal line, if this is one.
    pub fn as_line(&self) -> Option<&[u8]> {
        match self {
            Instruction::Line(line) => Some(line),
            _ => None,
        }
    }

    /// Whether this is a control element rather than a line.
    pub fn is_control(&self) -> bool {
        !matches!(self, Instruction::Line(_))
    }

    /// The version operand of a control element.
    pub fn version(&self) -> Option<usize> {
        match self {
            Instruction::BeginInsert(v) | Instruction::BeginDelete(v) | Instruction::EndDelete(v) => {
                Some(*v)
            }
            Instruction::Line(_) | Instruction::EndInsert => None,
        }
    }
}
