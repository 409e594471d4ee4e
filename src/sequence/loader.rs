//! Background sequence building.
//!
//! Fetching, parsing and aligning a structure can take far longer than a
//! frame. [`SequenceLoader`] runs that pipeline on a worker thread and hands
//! back finished [`SequenceEntry`] values only, so the frame thread never
//! observes a half-built molecule.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use web_time::Duration;

use super::{
    parse_labeled, Sequence, SequenceBuilder, SequenceEntry, StructureSource,
};
use crate::error::MorphError;
use crate::molecule::Molecule;

/// Request sent from the owning thread to the worker.
enum LoadRequest {
    /// Resolve an identifier through the loader's source.
    Fetch(String),
    /// Build from an already available record.
    Record { label: String, record: String },
    /// Shut down the background thread.
    Shutdown,
}

/// Result of one request, in request order.
#[derive(Debug)]
pub enum LoadEvent {
    /// A complete entry, aligned onto the previously loaded one.
    Entry(LoadedEntry),
    /// The element failed and was skipped.
    Skipped {
        /// Identifier or label of the failed element.
        label: String,
        /// Why it failed.
        error: MorphError,
    },
}

/// Entry built by the worker, together with the molecule it was aligned
/// onto.
///
/// The worker only knows the entries it built itself. If the sequence grew
/// by other means in the meantime, [`realign`](Self::realign) redoes the
/// alignment against the real predecessor from the parsed coordinates.
#[derive(Debug)]
pub struct LoadedEntry {
    /// Entry as built on the worker.
    pub entry: SequenceEntry,
    aligned_to: Option<Arc<Molecule>>,
    parsed: Molecule,
}

impl LoadedEntry {
    /// Whether the entry was aligned onto the last entry of `sequence`.
    #[must_use]
    pub fn follows(&self, sequence: &Sequence) -> bool {
        match (&self.aligned_to, sequence.last()) {
            (None, None) => true,
            (Some(previous), Some(last)) => Arc::ptr_eq(previous, &last.molecule),
            _ => false,
        }
    }

    /// The entry, aligned onto the last entry of `sequence`.
    #[must_use]
    pub fn realign(
        self,
        builder: &SequenceBuilder,
        sequence: &Sequence,
    ) -> SequenceEntry {
        if self.follows(sequence) {
            return self.entry;
        }
        log::debug!(
            "'{}' was aligned onto a stale predecessor; realigning",
            self.entry.label
        );
        builder.align_molecule(
            sequence.last().map(|e| e.molecule.as_ref()),
            self.entry.label,
            &self.parsed,
        )
    }
}

/// Worker thread that builds sequence entries in request order.
pub struct SequenceLoader {
    builder: SequenceBuilder,
    request_tx: mpsc::Sender<LoadRequest>,
    result_rx: mpsc::Receiver<LoadEvent>,
    pending: usize,
    thread: Option<JoinHandle<()>>,
}

impl SequenceLoader {
    /// Spawn the worker.
    ///
    /// `previous` is the molecule new entries align onto first, normally the
    /// last entry of the sequence being extended.
    ///
    /// # Errors
    ///
    /// [`MorphError::ThreadSpawn`] if the OS refuses to create the thread.
    pub fn spawn<S>(
        builder: SequenceBuilder,
        source: S,
        previous: Option<Arc<Molecule>>,
    ) -> Result<Self, MorphError>
    where
        S: StructureSource + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel::<LoadRequest>();
        let (result_tx, result_rx) = mpsc::channel::<LoadEvent>();

        let worker_builder = builder.clone();
        let thread = std::thread::Builder::new()
            .name("sequence-loader".into())
            .spawn(move || {
                Self::thread_loop(
                    &worker_builder,
                    &source,
                    previous,
                    &request_rx,
                    &result_tx,
                );
            })
            .map_err(MorphError::ThreadSpawn)?;

        Ok(Self {
            builder,
            request_tx,
            result_rx,
            pending: 0,
            thread: Some(thread),
        })
    }

    /// Spawn a worker that continues `sequence`.
    ///
    /// # Errors
    ///
    /// [`MorphError::ThreadSpawn`] if the OS refuses to create the thread.
    pub fn for_sequence<S>(
        builder: SequenceBuilder,
        source: S,
        sequence: &Sequence,
    ) -> Result<Self, MorphError>
    where
        S: StructureSource + Send + 'static,
    {
        let previous = sequence.last().map(|e| Arc::clone(&e.molecule));
        Self::spawn(builder, source, previous)
    }

    /// Queue `id` for fetching through the source (non-blocking).
    pub fn request(&mut self, id: impl Into<String>) {
        self.send(LoadRequest::Fetch(id.into()));
    }

    /// Queue a raw record (non-blocking).
    pub fn request_record(
        &mut self,
        label: impl Into<String>,
        record: impl Into<String>,
    ) {
        self.send(LoadRequest::Record {
            label: label.into(),
            record: record.into(),
        });
    }

    /// Requests not yet answered.
    #[must_use]
    pub const fn pending(&self) -> usize {
        self.pending
    }

    /// Non-blocking check for the next finished request.
    pub fn try_recv(&mut self) -> Option<LoadEvent> {
        let event = self.result_rx.try_recv().ok()?;
        self.pending = self.pending.saturating_sub(1);
        Some(event)
    }

    /// Wait up to `timeout` for the next finished request.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<LoadEvent> {
        let event = self.result_rx.recv_timeout(timeout).ok()?;
        self.pending = self.pending.saturating_sub(1);
        Some(event)
    }

    /// Append every finished entry to `sequence`, logging skipped elements.
    /// Entries whose predecessor is no longer the last entry of `sequence`
    /// are realigned first. Returns the number of entries appended.
    pub fn poll_into(&mut self, sequence: &mut Sequence) -> usize {
        let mut appended = 0;
        while let Some(event) = self.try_recv() {
            match event {
                LoadEvent::Entry(loaded) => {
                    let entry = loaded.realign(&self.builder, sequence);
                    log::info!(
                        "sequence: loaded '{}' ({} atoms)",
                        entry.label,
                        entry.atom_count()
                    );
                    let _ = sequence.push(entry);
                    appended += 1;
                }
                LoadEvent::Skipped { label, error } => {
                    log::warn!("skipping '{label}': {error}");
                }
            }
        }
        appended
    }

    /// Shut down the background thread and wait for it to finish.
    pub fn shutdown(&mut self) {
        let _ = self.request_tx.send(LoadRequest::Shutdown);
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::error!("sequence loader thread panicked");
            }
        }
    }

    fn send(&mut self, request: LoadRequest) {
        if self.request_tx.send(request).is_ok() {
            self.pending += 1;
        } else {
            log::error!("sequence loader is no longer running");
        }
    }

    /// Background thread main loop.
    fn thread_loop<S: StructureSource>(
        builder: &SequenceBuilder,
        source: &S,
        mut previous: Option<Arc<Molecule>>,
        request_rx: &mpsc::Receiver<LoadRequest>,
        result_tx: &mpsc::Sender<LoadEvent>,
    ) {
        // Block waiting for the next request; a closed channel ends the loop
        while let Ok(request) = request_rx.recv() {
            let (label, parsed) = match request {
                LoadRequest::Shutdown => break,
                LoadRequest::Fetch(id) => {
                    let parsed = source
                        .fetch(&id)
                        .and_then(|record| parse_labeled(&id, &record));
                    (id, parsed)
                }
                LoadRequest::Record { label, record } => {
                    let parsed = parse_labeled(&label, &record);
                    (label, parsed)
                }
            };

            let event = match parsed {
                Ok((label, molecule)) => {
                    let entry = builder.align_molecule(
                        previous.as_deref(),
                        label,
                        &molecule,
                    );
                    let aligned_to =
                        previous.replace(Arc::clone(&entry.molecule));
                    LoadEvent::Entry(LoadedEntry {
                        entry,
                        aligned_to,
                        parsed: molecule,
                    })
                }
                Err(error) => LoadEvent::Skipped { label, error },
            };
            if result_tx.send(event).is_err() {
                break;
            }
        }
        log::debug!("sequence loader stopped");
    }
}

impl Drop for SequenceLoader {
    fn drop(&mut self) {
        self.shutdown();
    }
}
