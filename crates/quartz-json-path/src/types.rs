//! Path legs and their resolution against array lengths.

use std::fmt;

/// An array index in a path leg, counted either from the start
/// (`[2]`) or from the end (`[last-2]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayIndex {
    from_end: bool,
    index: u32,
}

impl ArrayIndex {
    /// Index counted from the start of the array.
    pub fn forward(index: u32) -> Self {
        Self {
            from_end: false,
            index,
        }
    }

    /// Index counted from the end of the array. `from_end(0)` is the
    /// last element.
    pub fn from_end(index: u32) -> Self {
        Self {
            from_end: true,
            index,
        }
    }

    pub fn is_from_end(&self) -> bool {
        self.from_end
    }

    /// Resolve against an array of `len` elements.
    pub fn resolve(&self, len: usize) -> ResolvedIndex {
        if self.from_end {
            let idx = self.index as usize;
            if idx < len {
                ResolvedIndex {
                    position: len - 1 - idx,
                    within_bounds: true,
                }
            } else {
                // Before the start of the array.
                ResolvedIndex {
                    position: 0,
                    within_bounds: false,
                }
            }
        } else {
            let idx = self.index as usize;
            ResolvedIndex {
                position: idx,
                within_bounds: idx < len,
            }
        }
    }
}

/// The outcome of resolving an [`ArrayIndex`] against a concrete
/// array length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedIndex {
    position: usize,
    within_bounds: bool,
}

impl ResolvedIndex {
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn within_bounds(&self) -> bool {
        self.within_bounds
    }
}

/// A half-open element range produced by resolving a range or
/// wildcard leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayRange {
    pub begin: usize,
    pub end: usize,
}

impl ArrayRange {
    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }
}

/// One step of a JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathLeg {
    /// Object member access by key: `.name` or `."quoted name"`.
    Member(String),
    /// All object members: `.*`.
    MemberWildcard,
    /// A single array cell: `[4]` or `[last-1]`.
    Cell(ArrayIndex),
    /// All array cells: `[*]`.
    CellWildcard,
    /// An inclusive cell range: `[2 to last-1]`.
    Range { begin: ArrayIndex, end: ArrayIndex },
    /// Recursive descent: `..`.
    Ellipsis,
}

impl PathLeg {
    /// True if this leg can match a non-array value as if it were a
    /// single-element array when auto-wrapping is in effect.
    pub fn is_autowrap(&self) -> bool {
        match self {
            PathLeg::Cell(idx) => idx.resolve(1).within_bounds(),
            PathLeg::CellWildcard => true,
            PathLeg::Range { .. } => !self.array_range(1).is_empty(),
            _ => false,
        }
    }

    /// Resolve this leg to a half-open range of cells in an array of
    /// `len` elements. Only meaningful for cell, wildcard, and range
    /// legs; other legs produce the empty range.
    pub fn array_range(&self, len: usize) -> ArrayRange {
        match self {
            PathLeg::Cell(idx) => {
                let r = idx.resolve(len);
                if r.within_bounds() {
                    ArrayRange {
                        begin: r.position(),
                        end: r.position() + 1,
                    }
                } else {
                    ArrayRange { begin: 0, end: 0 }
                }
            }
            PathLeg::CellWildcard => ArrayRange { begin: 0, end: len },
            PathLeg::Range { begin, end } => {
                let b = begin.resolve(len);
                let e = end.resolve(len);
                // A from-end bound past the start clamps to cell 0; a
                // forward bound past the end clamps to the last cell.
                let begin = if b.within_bounds() || begin.is_from_end() {
                    b.position()
                } else {
                    len
                };
                let end = if e.within_bounds() {
                    e.position() + 1
                } else if end.is_from_end() {
                    0
                } else {
                    len
                };
                ArrayRange { begin, end }
            }
            _ => ArrayRange { begin: 0, end: 0 },
        }
    }
}

/// A parsed JSON path: `$` followed by zero or more legs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JsonPath {
    legs: Vec<PathLeg>,
}

impl JsonPath {
    pub fn new(legs: Vec<PathLeg>) -> Self {
        Self { legs }
    }

    /// The root path `$`.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn legs(&self) -> &[PathLeg] {
        &self.legs
    }

    pub fn leg_count(&self) -> usize {
        self.legs.len()
    }

    pub fn push(&mut self, leg: PathLeg) {
        self.legs.push(leg);
    }

    /// True if any leg is recursive descent. Seek needs duplicate
    /// suppression only in that case.
    pub fn contains_ellipsis(&self) -> bool {
        self.legs.iter().any(|l| matches!(l, PathLeg::Ellipsis))
    }

    /// True if any leg can match more than one value.
    pub fn contains_wildcard_or_ellipsis(&self) -> bool {
        self.legs.iter().any(|l| {
            matches!(
                l,
                PathLeg::MemberWildcard
                    | PathLeg::CellWildcard
                    | PathLeg::Range { .. }
                    | PathLeg::Ellipsis
            )
        })
    }
}

/// True if `name` can be rendered as a bare member leg without quoting.
fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn write_quoted_member(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    write!(f, "\"")?;
    for c in name.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "\"")
}

impl fmt::Display for ArrayIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.from_end {
            if self.index == 0 {
                write!(f, "last")
            } else {
                write!(f, "last-{}", self.index)
            }
        } else {
            write!(f, "{}", self.index)
        }
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        // A member leg directly after `..` carries no dot of its own:
        // `$..a`, not `$...a`.
        let mut after_ellipsis = false;
        for leg in &self.legs {
            match leg {
                PathLeg::Member(name) => {
                    if !after_ellipsis {
                        write!(f, ".")?;
                    }
                    if is_plain_identifier(name) {
                        write!(f, "{name}")?;
                    } else {
                        write_quoted_member(f, name)?;
                    }
                }
                PathLeg::MemberWildcard => {
                    if !after_ellipsis {
                        write!(f, ".")?;
                    }
                    write!(f, "*")?;
                }
                PathLeg::Cell(idx) => write!(f, "[{idx}]")?,
                PathLeg::CellWildcard => write!(f, "[*]")?,
                PathLeg::Range { begin, end } => write!(f, "[{begin} to {end}]")?,
                PathLeg::Ellipsis => write!(f, "..")?,
            }
            after_ellipsis = matches!(leg, PathLeg::Ellipsis);
        }
        Ok(())
    }
}
