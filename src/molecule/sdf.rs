//! Fixed-column (V2000 molfile / SDF) structure record parser.
//!
//! Layout of the lines this parser reads:
//!
//! ```text
//! line 1-3   header (title, program, comment)
//! line 4     counts:  aaabbb...           atom count 0..3, bond count 3..6
//! atom line  xxxxx.xxxxyyyyy.yyyyzzzzz.zzzz aaa ...
//! bond line  111222ttt...                 1-based from/to, order code
//! ```
//!
//! Lines shorter than the fixed layout fall back to whitespace tokens, which
//! is what hand-written and some converter-produced records look like. Only
//! the first record of a multi-record file (terminated by `$$$$`) is read.

use std::ops::Range;

use glam::Vec3;

use super::{Bond, Element, Molecule};
use crate::error::MorphError;

/// Lines before the first atom line (3 header lines + counts line).
const HEADER_LINES: usize = 4;

const COUNT_ATOMS: Range<usize> = 0..3;
const COUNT_BONDS: Range<usize> = 3..6;
const ATOM_X: Range<usize> = 0..10;
const ATOM_Y: Range<usize> = 10..20;
const ATOM_Z: Range<usize> = 20..30;
const ATOM_SYMBOL: Range<usize> = 31..34;
const BOND_FROM: Range<usize> = 0..3;
const BOND_TO: Range<usize> = 3..6;
const BOND_ORDER: Range<usize> = 6..9;

/// A line of the record with its 1-based line number.
type NumberedLine<'a> = (usize, &'a str);

/// Parse a single structure record into a [`Molecule`].
///
/// Atom lines with a NaN coordinate are dropped together with any bond
/// touching them; every other malformed line is fatal.
///
/// # Errors
///
/// Returns [`MorphError::Parse`] when the record is too short, the counts
/// line is malformed or declares more lines than the record holds, an atom
/// line lacks three finite coordinates, a bond line is malformed or
/// references an atom outside the declared range, or no atom remains.
pub fn parse(record: &str) -> Result<Molecule, MorphError> {
    let lines = first_block(record);
    if lines.len() < HEADER_LINES {
        return Err(MorphError::parse(
            lines.len().max(1),
            "record must contain a 3-line header and a counts line",
        ));
    }

    let (counts_line_no, counts_line) = lines[HEADER_LINES - 1];
    if counts_line.contains("V3000") {
        return Err(MorphError::parse(
            counts_line_no,
            "V3000 records are not supported",
        ));
    }
    let (atom_count, bond_count) = parse_counts(counts_line, counts_line_no)?;
    if atom_count == 0 {
        return Err(MorphError::parse(counts_line_no, "record declares no atoms"));
    }

    let bond_start = HEADER_LINES + atom_count;
    if lines.len() < bond_start + bond_count {
        return Err(MorphError::parse(
            lines.last().map_or(counts_line_no, |(ln, _)| *ln),
            format!(
                "record ended before {atom_count} atoms and {bond_count} bonds \
                 were fully specified"
            ),
        ));
    }

    let (atoms, elements, remap) =
        parse_atoms(&lines[HEADER_LINES..bond_start])?;
    if atoms.is_empty() {
        return Err(MorphError::parse(
            counts_line_no,
            "every atom line has a NaN coordinate",
        ));
    }
    let bonds = parse_bonds(
        &lines[bond_start..bond_start + bond_count],
        &remap,
    )?;

    Molecule::new(atoms, elements, bonds)
}

/// Title (first header line) of a record, if present and non-blank.
#[must_use]
pub fn record_title(record: &str) -> Option<&str> {
    record
        .lines()
        .next()
        .map(str::trim)
        .filter(|title| !title.is_empty())
}

/// Lines of the first record, up to the `$$$$` delimiter.
fn first_block(record: &str) -> Vec<NumberedLine<'_>> {
    record
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .take_while(|(_, line)| line.trim() != "$$$$")
        .collect()
}

/// Substring at `range`, trimmed; `None` if the line is too short or the
/// field is blank.
fn field(line: &str, range: Range<usize>) -> Option<&str> {
    line.get(range).map(str::trim).filter(|f| !f.is_empty())
}

fn parse_counts(
    line: &str,
    line_no: usize,
) -> Result<(usize, usize), MorphError> {
    let fixed = field(line, COUNT_ATOMS)
        .zip(field(line, COUNT_BONDS))
        .and_then(|(a, b)| Some((a.parse().ok()?, b.parse().ok()?)));
    if let Some(counts) = fixed {
        return Ok(counts);
    }

    let mut tokens = line.split_whitespace();
    let atoms = tokens
        .next()
        .and_then(|t| t.parse::<usize>().ok())
        .ok_or_else(|| MorphError::parse(line_no, "invalid atom count"))?;
    let bonds = tokens
        .next()
        .and_then(|t| t.parse::<usize>().ok())
        .ok_or_else(|| MorphError::parse(line_no, "invalid bond count"))?;
    Ok((atoms, bonds))
}

/// A coordinate token: any finite number, or a literal NaN.
fn coordinate(token: &str) -> Option<f32> {
    token.parse::<f32>().ok().filter(|v| !v.is_infinite())
}

/// Coordinate triple and symbol of one atom line, or `None` when the line
/// does not hold three coordinates in either layout.
fn atom_fields(line: &str) -> Option<([f32; 3], Option<&str>)> {
    fixed_atom_fields(line).or_else(|| token_atom_fields(line))
}

fn fixed_atom_fields(line: &str) -> Option<([f32; 3], Option<&str>)> {
    let x = coordinate(field(line, ATOM_X)?)?;
    let y = coordinate(field(line, ATOM_Y)?)?;
    let z = coordinate(field(line, ATOM_Z)?)?;
    Some(([x, y, z], field(line, ATOM_SYMBOL)))
}

fn token_atom_fields(line: &str) -> Option<([f32; 3], Option<&str>)> {
    let mut tokens = line.split_whitespace();
    let x = coordinate(tokens.next()?)?;
    let y = coordinate(tokens.next()?)?;
    let z = coordinate(tokens.next()?)?;
    Some(([x, y, z], tokens.next()))
}

/// Parsed atoms plus a map from declared (0-based) index to kept index.
///
/// A line with a NaN coordinate is dropped; anything else that is not a
/// finite coordinate triple is an error at that line.
fn parse_atoms(
    lines: &[NumberedLine<'_>],
) -> Result<(Vec<Vec3>, Vec<Element>, Vec<Option<usize>>), MorphError> {
    let mut atoms = Vec::with_capacity(lines.len());
    let mut elements = Vec::with_capacity(lines.len());
    let mut remap = Vec::with_capacity(lines.len());

    for &(line_no, line) in lines {
        let (coords, symbol) = atom_fields(line).ok_or_else(|| {
            MorphError::parse(line_no, "atom line needs three finite coordinates")
        })?;
        if coords.iter().any(|c| c.is_nan()) {
            log::debug!("dropping atom on line {line_no}: NaN coordinate");
            remap.push(None);
            continue;
        }
        remap.push(Some(atoms.len()));
        atoms.push(Vec3::from_array(coords));
        elements.push(symbol.map_or(Element::Unknown, Element::from_symbol));
    }
    Ok((atoms, elements, remap))
}

/// 1-based from/to indices and order code of one bond line.
///
/// The fixed layout is used only when all three columns are present and
/// numeric; shorter lines are read as whitespace tokens.
fn parse_bond_fields(line: &str) -> Option<(usize, usize, u8)> {
    if let Some(fixed) = fixed_bond_fields(line) {
        return Some(fixed);
    }

    let mut tokens = line.split_whitespace();
    let from = tokens.next()?.parse().ok()?;
    let to = tokens.next()?.parse().ok()?;
    let order = tokens.next().and_then(|o| o.parse().ok()).unwrap_or(1);
    Some((from, to, order))
}

fn fixed_bond_fields(line: &str) -> Option<(usize, usize, u8)> {
    if line.len() < BOND_ORDER.end {
        return None;
    }
    let from = field(line, BOND_FROM)?.parse().ok()?;
    let to = field(line, BOND_TO)?.parse().ok()?;
    let order = field(line, BOND_ORDER)?.parse().ok()?;
    Some((from, to, order))
}

fn parse_bonds(
    lines: &[NumberedLine<'_>],
    remap: &[Option<usize>],
) -> Result<Vec<Bond>, MorphError> {
    let declared = remap.len();
    let mut bonds = Vec::with_capacity(lines.len());

    for &(line_no, line) in lines {
        let (from, to, order) = parse_bond_fields(line)
            .ok_or_else(|| MorphError::parse(line_no, "invalid bond line"))?;
        if from == 0 || to == 0 || from > declared || to > declared {
            return Err(MorphError::parse(
                line_no,
                format!("bond {from}-{to} references an atom outside 1..={declared}"),
            ));
        }
        if from == to {
            return Err(MorphError::parse(line_no, "bond joins an atom to itself"));
        }
        match (remap[from - 1], remap[to - 1]) {
            (Some(a), Some(b)) => bonds.push(Bond::new(a, b, order)),
            _ => log::debug!(
                "dropping bond {from}-{to} on line {line_no}: endpoint was dropped"
            ),
        }
    }
    Ok(bonds)
}
