//! Self-contained morph viewer.
//!
//! [`MorphViewer`] bundles a [`Sequence`], a [`MorphController`] and an
//! [`AutoAdvance`] scheduler behind a per-frame entry point. It holds no
//! global state; any number of viewers can run side by side.

use web_time::Instant;

use crate::animation::{AutoAdvance, MorphController};
use crate::error::MorphError;
use crate::options::Options;
use crate::scene::{SceneSink, SceneUpdate};
use crate::sequence::{
    Sequence, SequenceBuilder, SequenceEntry, SequenceLoader, StructureSource,
};

/// Sequence + controller + auto-advance, driven once per frame.
pub struct MorphViewer {
    options: Options,
    builder: SequenceBuilder,
    sequence: Sequence,
    controller: MorphController,
    auto_advance: AutoAdvance,
    loader: Option<SequenceLoader>,
}

impl MorphViewer {
    /// Empty viewer whose auto-advance timer starts now.
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self::with_clock(options, Instant::now())
    }

    /// Empty viewer whose auto-advance timer starts at `now`.
    #[must_use]
    pub fn with_clock(options: Options, now: Instant) -> Self {
        Self {
            builder: SequenceBuilder::new(options.sequence.clone()),
            controller: MorphController::new(&options),
            auto_advance: AutoAdvance::from_options(&options.animation, now),
            sequence: Sequence::new(),
            loader: None,
            options,
        }
    }

    /// Current options.
    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Replace options and push them to the controller and scheduler.
    ///
    /// Sequence options only affect entries added afterwards.
    pub fn set_options(&mut self, new: Options) {
        self.options = new;
        self.apply_options();
    }

    fn apply_options(&mut self) {
        let animation = &self.options.animation;
        self.builder = SequenceBuilder::new(self.options.sequence.clone());
        self.controller.set_options(&self.options);
        self.auto_advance.set_interval(animation.advance_interval());
        self.auto_advance.set_looping(animation.looping);
    }

    /// Entries published so far.
    #[must_use]
    pub const fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    /// Transition controller.
    #[must_use]
    pub const fn controller(&self) -> &MorphController {
        &self.controller
    }

    /// Auto-advance scheduler (pause, resume, interval).
    pub fn auto_advance_mut(&mut self) -> &mut AutoAdvance {
        &mut self.auto_advance
    }

    /// Builder configured from the current sequence options.
    #[must_use]
    pub const fn builder(&self) -> &SequenceBuilder {
        &self.builder
    }

    /// Latest scene.
    #[must_use]
    pub const fn scene(&self) -> &SceneUpdate {
        self.controller.scene()
    }

    /// Parse, align and publish `record`. The first entry is shown
    /// immediately.
    ///
    /// # Errors
    ///
    /// [`MorphError::Parse`] if the record is malformed.
    pub fn push_record(
        &mut self,
        label: &str,
        record: &str,
    ) -> Result<usize, MorphError> {
        let index = self.builder.push_record(&mut self.sequence, label, record)?;
        self.show_if_first(index);
        Ok(index)
    }

    /// Publish an entry built elsewhere (e.g. by a [`SequenceLoader`]).
    /// The first entry is shown immediately.
    pub fn push_entry(&mut self, entry: SequenceEntry) -> usize {
        let index = self.sequence.push(entry);
        self.show_if_first(index);
        index
    }

    fn show_if_first(&mut self, index: usize) {
        if index == 0 {
            if let Err(err) = self.controller.show(&self.sequence, 0) {
                log::error!("failed to show first entry: {err}");
            }
        }
    }

    /// Start a background loader that continues this viewer's sequence
    /// and feeds it on every [`frame`](Self::frame).
    ///
    /// # Errors
    ///
    /// [`MorphError::ThreadSpawn`] if the worker thread cannot be created.
    pub fn spawn_loader<S>(
        &mut self,
        source: S,
    ) -> Result<&mut SequenceLoader, MorphError>
    where
        S: StructureSource + Send + 'static,
    {
        let loader = SequenceLoader::for_sequence(
            self.builder.clone(),
            source,
            &self.sequence,
        )?;
        Ok(self.loader.insert(loader))
    }

    /// Let `loader` feed this viewer; finished entries are appended on
    /// every [`frame`](Self::frame), realigned onto whatever entry is last
    /// at that point.
    pub fn attach_loader(&mut self, loader: SequenceLoader) {
        self.loader = Some(loader);
    }

    /// Loader attached with [`attach_loader`](Self::attach_loader).
    pub fn loader_mut(&mut self) -> Option<&mut SequenceLoader> {
        self.loader.as_mut()
    }

    /// Start a transition to entry `index`.
    ///
    /// # Errors
    ///
    /// [`MorphError::InvalidIndex`] if `index` is out of bounds.
    pub fn go_to(&mut self, index: usize) -> Result<(), MorphError> {
        self.controller.begin_transition(&self.sequence, index)
    }

    /// Advance one frame: take in loaded entries, let the scheduler start
    /// the next transition when due, then tick the controller.
    pub fn frame(&mut self, now: Instant) -> &SceneUpdate {
        if let Some(loader) = self.loader.as_mut() {
            let before = self.sequence.len();
            let appended = loader.poll_into(&mut self.sequence);
            if appended > 0 && before == 0 {
                self.show_if_first(0);
            }
        }

        if let Some(next) = self.auto_advance.poll(
            now,
            self.sequence.len(),
            self.controller.current_index(),
        ) {
            log::debug!("auto-advance to entry {next}");
            if let Err(err) = self.controller.begin_transition(&self.sequence, next) {
                log::error!("auto-advance failed: {err}");
            }
        }

        let _ = self.controller.tick();
        self.controller.scene()
    }

    /// [`frame`](Self::frame) and hand the result to `sink`.
    pub fn render_frame(&mut self, now: Instant, sink: &mut dyn SceneSink) {
        let scene = self.frame(now);
        sink.submit(scene);
    }
}

#[cfg(test)]
mod tests {
    use web_time::Duration;

    use super::*;
    use crate::molecule::sdf::tests::record;
    use crate::options::SlotFallback;
    use crate::sequence::MemorySource;

    fn methanol(dx: f32) -> String {
        record(
            "methanol",
            &[("C", dx, 0.0, 0.0), ("O", dx + 1.43, 0.0, 0.0)],
            &[(1, 2, 1)],
        )
    }

    fn wait_for(viewer: &mut MorphViewer, len: usize, now: Instant) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while viewer.sequence().len() < len && Instant::now() < deadline {
            let _ = viewer.frame(now);
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(viewer.sequence().len(), len);
    }

    fn formaldehyde() -> String {
        record(
            "formaldehyde",
            &[("C", 0.0, 0.0, 0.0), ("O", 0.0, 1.21, 0.0), ("H", 0.9, -0.5, 0.0)],
            &[(1, 2, 2), (1, 3, 1)],
        )
    }

    #[test]
    fn first_entry_is_shown_immediately() {
        let mut viewer = MorphViewer::new(Options::default());
        assert!(viewer.scene().atoms.is_empty());
        let index = viewer.push_record("m", &methanol(0.0)).unwrap();
        assert_eq!(index, 0);
        assert_eq!(viewer.controller().current_index(), Some(0));
        assert!(!viewer.controller().is_playing());
        assert_eq!(viewer.scene().atoms.len(), 2);
    }

    #[test]
    fn bad_record_is_rejected_without_side_effects() {
        let mut viewer = MorphViewer::new(Options::default());
        assert!(matches!(
            viewer.push_record("bad", "nope"),
            Err(MorphError::Parse { .. })
        ));
        assert!(viewer.sequence().is_empty());
        assert_eq!(viewer.controller().current_index(), None);
    }

    #[test]
    fn auto_advance_starts_transitions() {
        let t0 = Instant::now();
        let mut viewer = MorphViewer::with_clock(Options::default(), t0);
        let _ = viewer.push_record("a", &methanol(0.0)).unwrap();
        let _ = viewer.push_record("b", &formaldehyde()).unwrap();

        let scene = viewer.frame(t0 + Duration::from_secs(1));
        assert!(!scene.playing);
        assert_eq!(scene.to_index, Some(0));

        let scene = viewer.frame(t0 + Duration::from_secs(3));
        assert!(scene.playing);
        assert_eq!(scene.to_index, Some(1));
        assert!((scene.progress - 0.02).abs() < 1e-6);

        // wraps back to the first entry after another interval
        let scene = viewer.frame(t0 + Duration::from_secs(6));
        assert_eq!(scene.from_index, Some(1));
        assert_eq!(scene.to_index, Some(0));
    }

    #[test]
    fn paused_viewer_stays_put() {
        let t0 = Instant::now();
        let mut options = Options::default();
        options.animation.autoplay = false;
        let mut viewer = MorphViewer::with_clock(options, t0);
        let _ = viewer.push_record("a", &methanol(0.0)).unwrap();
        let _ = viewer.push_record("b", &formaldehyde()).unwrap();
        assert!(!viewer.frame(t0 + Duration::from_secs(30)).playing);

        viewer.go_to(1).unwrap();
        assert!(viewer.frame(t0 + Duration::from_secs(31)).playing);
        assert!(matches!(
            viewer.go_to(9),
            Err(MorphError::InvalidIndex { index: 9, len: 2 })
        ));
    }

    #[test]
    fn render_frame_submits_to_sink() {
        let t0 = Instant::now();
        let mut viewer = MorphViewer::with_clock(Options::default(), t0);
        let _ = viewer.push_record("a", &methanol(0.0)).unwrap();
        let mut frames: Vec<SceneUpdate> = Vec::new();
        for i in 0..3 {
            viewer.render_frame(t0 + Duration::from_millis(16 * i), &mut frames);
        }
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| f.atoms.len() == 2));
    }

    #[test]
    fn viewers_are_independent() {
        let mut first = MorphViewer::new(Options::default());
        let second = MorphViewer::new(Options::default());
        let _ = first.push_record("a", &methanol(0.0)).unwrap();
        assert_eq!(first.sequence().len(), 1);
        assert!(second.sequence().is_empty());
    }

    #[test]
    fn loader_feeds_the_viewer() {
        let t0 = Instant::now();
        let mut viewer = MorphViewer::with_clock(Options::default(), t0);
        let source = MemorySource::new()
            .with("methanol", methanol(2.0))
            .with("formaldehyde", formaldehyde());
        let mut loader = SequenceLoader::spawn(
            viewer.builder().clone(),
            source,
            None,
        )
        .unwrap();
        loader.request("methanol");
        loader.request("formaldehyde");
        viewer.attach_loader(loader);

        wait_for(&mut viewer, 2, t0);
        assert_eq!(viewer.controller().current_index(), Some(0));
        assert_eq!(viewer.loader_mut().map(|l| l.pending()), Some(0));
    }

    #[test]
    fn loaded_entries_align_onto_pushed_records() {
        let t0 = Instant::now();
        let mut viewer = MorphViewer::with_clock(Options::default(), t0);
        let _ = viewer.push_record("m1", &methanol(0.0)).unwrap();

        // loader started without the viewer's first entry
        let mut loader = SequenceLoader::spawn(
            viewer.builder().clone(),
            MemorySource::new().with("m2", methanol(3.0)),
            None,
        )
        .unwrap();
        loader.request("m2");
        viewer.attach_loader(loader);
        wait_for(&mut viewer, 2, t0);

        let entry = viewer.sequence().get(1).unwrap();
        assert_eq!(entry.correspondence.matched_count(), 2);
    }

    #[test]
    fn spawned_loader_continues_the_sequence() {
        let t0 = Instant::now();
        let mut viewer = MorphViewer::with_clock(Options::default(), t0);
        let _ = viewer.push_record("m1", &methanol(0.0)).unwrap();
        let loader = viewer
            .spawn_loader(MemorySource::new().with("m2", methanol(3.0)))
            .unwrap();
        loader.request("m2");
        // published while the load is still pending
        let _ = viewer.push_record("f", &formaldehyde()).unwrap();
        wait_for(&mut viewer, 3, t0);

        let last = viewer.sequence().get(2).unwrap();
        assert_eq!(last.label, "m2");
        assert_eq!(last.correspondence.matched_count(), 2);
        let map = viewer
            .sequence()
            .correspondence_between(1, 2, SlotFallback::None)
            .unwrap();
        assert_eq!(map.matched_count(), 2);
    }
}
