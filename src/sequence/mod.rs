//! Ordered, aligned structure sequences.
//!
//! [`SequenceBuilder`] turns raw records into [`SequenceEntry`] values by
//! running parse → correspondence → rigid alignment → normalization against
//! the previous entry. A [`Sequence`] is append-only: once an entry is
//! published it never changes, so entries (and their `Arc`-shared
//! molecules) can be handed to other threads freely.

pub mod loader;
pub mod source;

use std::sync::Arc;

use crate::align::{self, AlignmentTransform, CorrespondenceMap};
use crate::error::MorphError;
use crate::molecule::{sdf, Molecule};
use crate::options::{SequenceOptions, SlotFallback};
pub use loader::{LoadEvent, LoadedEntry, SequenceLoader};
pub use source::{DirectorySource, MemorySource, StructureSource};
#[cfg(feature = "fetch")]
pub use source::PubChemSource;

/// One aligned, normalized structure in a [`Sequence`].
#[derive(Debug, Clone)]
pub struct SequenceEntry {
    /// Display label (compound name, file stem or record title).
    pub label: String,
    /// Aligned, normalized molecule.
    pub molecule: Arc<Molecule>,
    /// Map from this entry's atoms to the previous entry's atoms. All
    /// unmatched for the first entry.
    pub correspondence: CorrespondenceMap,
    /// Rigid transform that was applied to this entry's raw coordinates
    /// before normalization.
    pub alignment: AlignmentTransform,
}

impl SequenceEntry {
    /// Number of atoms in the entry.
    #[must_use]
    pub fn atom_count(&self) -> usize {
        self.molecule.atom_count()
    }
}

/// Append-only list of aligned entries.
#[derive(Debug, Clone, Default)]
pub struct Sequence {
    entries: Vec<SequenceEntry>,
}

impl Sequence {
    /// Empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry has been published yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&SequenceEntry> {
        self.entries.get(index)
    }

    /// Entry at `index`, or [`MorphError::InvalidIndex`].
    ///
    /// # Errors
    ///
    /// [`MorphError::InvalidIndex`] when `index >= len()`.
    pub fn entry(&self, index: usize) -> Result<&SequenceEntry, MorphError> {
        self.entries.get(index).ok_or(MorphError::InvalidIndex {
            index,
            len: self.entries.len(),
        })
    }

    /// Most recently published entry.
    #[must_use]
    pub fn last(&self) -> Option<&SequenceEntry> {
        self.entries.last()
    }

    /// All entries in order.
    #[must_use]
    pub fn entries(&self) -> &[SequenceEntry] {
        &self.entries
    }

    /// Publish `entry` at the end, returning its index.
    pub fn push(&mut self, entry: SequenceEntry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    /// Atom map from entry `from` to entry `to`.
    ///
    /// Neighboring entries reuse the stored correspondence (inverted when
    /// moving forward); any other pair, such as the wrap from the last entry
    /// back to the first, is resolved on the spot. With
    /// [`SlotFallback::RawIndex`] atoms still unmatched afterwards are
    /// paired by raw index where the target index is free.
    ///
    /// # Errors
    ///
    /// [`MorphError::InvalidIndex`] if either index is out of bounds.
    pub fn correspondence_between(
        &self,
        from: usize,
        to: usize,
        fallback: SlotFallback,
    ) -> Result<CorrespondenceMap, MorphError> {
        let source = self.entry(from)?;
        let target = self.entry(to)?;
        let len_to = target.atom_count();

        let map = if from == to {
            CorrespondenceMap::identity(len_to)
        } else if to == from + 1 {
            target.correspondence.inverse(source.atom_count())
        } else if to + 1 == from {
            source.correspondence.clone()
        } else {
            align::resolve(&source.molecule, &target.molecule)
        };

        Ok(match fallback {
            SlotFallback::RawIndex => map.with_raw_index_fallback(len_to),
            SlotFallback::None => map,
        })
    }
}

/// Runs the per-entry pipeline with a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct SequenceBuilder {
    options: SequenceOptions,
}

impl SequenceBuilder {
    /// Builder using `options`.
    #[must_use]
    pub const fn new(options: SequenceOptions) -> Self {
        Self { options }
    }

    /// Options in use.
    #[must_use]
    pub const fn options(&self) -> &SequenceOptions {
        &self.options
    }

    /// Align an already parsed `molecule` onto `previous` and normalize it.
    ///
    /// Without a predecessor the molecule is only normalized.
    #[must_use]
    pub fn align_molecule(
        &self,
        previous: Option<&Molecule>,
        label: impl Into<String>,
        molecule: &Molecule,
    ) -> SequenceEntry {
        let label = label.into();
        let Some(previous) = previous else {
            return SequenceEntry {
                molecule: Arc::new(align::normalize(
                    molecule,
                    self.options.scale_cap,
                )),
                correspondence: CorrespondenceMap::unmatched(
                    molecule.atom_count(),
                ),
                alignment: AlignmentTransform::IDENTITY,
                label,
            };
        };

        let correspondence = align::resolve(molecule, previous);
        let pairs =
            correspondence.matched_points(molecule.atoms(), previous.atoms());
        let alignment = self.options.solver().solve(&pairs);
        log::debug!(
            "'{label}': {}/{} atoms matched, rmsd {:.4}",
            correspondence.matched_count(),
            molecule.atom_count(),
            alignment.rmsd(&pairs)
        );

        let aligned = molecule.map_positions(|p| alignment.apply(p));
        SequenceEntry {
            molecule: Arc::new(align::normalize(
                &aligned,
                self.options.scale_cap,
            )),
            correspondence,
            alignment,
            label,
        }
    }

    /// Parse `record` and align it onto `previous`.
    ///
    /// An empty `label` is replaced by the record title.
    ///
    /// # Errors
    ///
    /// [`MorphError::Parse`] if the record is malformed.
    pub fn build_entry(
        &self,
        previous: Option<&Molecule>,
        label: &str,
        record: &str,
    ) -> Result<SequenceEntry, MorphError> {
        let (label, molecule) = parse_labeled(label, record)?;
        Ok(self.align_molecule(previous, label, &molecule))
    }

    /// Build an entry from `record` against the last entry of `sequence`
    /// and publish it, returning the new index.
    ///
    /// # Errors
    ///
    /// [`MorphError::Parse`] if the record is malformed; `sequence` is left
    /// untouched.
    pub fn push_record(
        &self,
        sequence: &mut Sequence,
        label: &str,
        record: &str,
    ) -> Result<usize, MorphError> {
        let previous = sequence.last().map(|e| e.molecule.as_ref());
        let entry = self.build_entry(previous, label, record)?;
        log::info!(
            "sequence: added '{}' ({} atoms, {} bonds)",
            entry.label,
            entry.molecule.atom_count(),
            entry.molecule.bond_count()
        );
        Ok(sequence.push(entry))
    }

    /// Build a sequence from `(label, record)` pairs.
    ///
    /// Elements that fail are logged, skipped, and returned alongside the
    /// sequence; later elements align against the last element that
    /// succeeded.
    pub fn build<I, L, R>(&self, records: I) -> (Sequence, Vec<(String, MorphError)>)
    where
        I: IntoIterator<Item = (L, R)>,
        L: AsRef<str>,
        R: AsRef<str>,
    {
        let mut sequence = Sequence::new();
        let mut skipped = Vec::new();
        for (label, record) in records {
            let label = label.as_ref();
            if let Err(err) =
                self.push_record(&mut sequence, label, record.as_ref())
            {
                log_skipped(label, &err);
                skipped.push((label.to_owned(), err));
            }
        }
        (sequence, skipped)
    }

    /// Build a sequence by resolving each of `ids` through `source`.
    ///
    /// Fetch and parse failures skip the element like [`build`](Self::build).
    pub fn build_from_source<S, I>(
        &self,
        source: &S,
        ids: I,
    ) -> (Sequence, Vec<(String, MorphError)>)
    where
        S: StructureSource + ?Sized,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut sequence = Sequence::new();
        let mut skipped = Vec::new();
        for id in ids {
            let id = id.as_ref();
            let result = source
                .fetch(id)
                .and_then(|record| self.push_record(&mut sequence, id, &record));
            if let Err(err) = result {
                log_skipped(id, &err);
                skipped.push((id.to_owned(), err));
            }
        }
        (sequence, skipped)
    }
}

/// Parse `record`, replacing an empty `label` with the record title.
pub(crate) fn parse_labeled(
    label: &str,
    record: &str,
) -> Result<(String, Molecule), MorphError> {
    let molecule = sdf::parse(record)?;
    let label = if label.is_empty() {
        sdf::record_title(record).unwrap_or("untitled")
    } else {
        label
    };
    Ok((label.to_owned(), molecule))
}

fn log_skipped(label: &str, err: &MorphError) {
    if err.is_element_fatal() {
        log::warn!("skipping '{label}': {err}");
    } else {
        log::error!("skipping '{label}' after unexpected error: {err}");
    }
}
