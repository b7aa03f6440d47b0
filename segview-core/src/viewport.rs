//! Per-viewport load state machine.
//!
//! ```text
//! Idle ──begin_load──▶ Loading ──finish_load(Ok, n ≥ 1)──▶ Ready ⟲ slice changes
//!                         └────finish_load(Err | empty)──▶ Failed
//! overlay: NoOverlay ──begin_overlay──▶ Loading ──▶ Ready | NoDecoder | NoOverlay
//! ```
//!
//! Every load is tagged with a generation. Starting a new load or tearing
//! the viewport down bumps the generation, so responses that arrive late
//! are recognised as stale and dropped instead of mutating state.

use crate::error::LoadError;
use crate::segmentation::{SegmentationDecoder, SegmentationOverlay};
use crate::types::{DicomImage, ViewId};

/// Slice position over a list of `len` images. Inactive when `len == 0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SliceCursor {
    index: usize,
    len: usize,
}

impl SliceCursor {
    /// Starts at the middle slice, `floor(len / 2)`.
    pub fn centered(len: usize) -> Self {
        Self { index: len / 2, len }
    }

    pub fn index(&self) -> Option<usize> {
        (self.len > 0).then_some(self.index)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Moves by `delta`, clamped to `[0, len - 1]`; no wraparound.
    /// Returns whether the index changed.
    pub fn step(&mut self, delta: isize) -> bool {
        if self.len == 0 {
            return false;
        }
        let target = self.index.saturating_add_signed(delta).min(self.len - 1);
        let changed = target != self.index;
        self.index = target;
        changed
    }

    /// Cine advance: next slice, wrapping from the last to the first.
    pub fn advance_wrapping(&mut self) -> bool {
        if self.len < 2 {
            return false;
        }
        self.index = (self.index + 1) % self.len;
        true
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading,
    Ready,
    /// Terminal for the current study; the error has been logged.
    Failed,
}

#[derive(Clone, Debug, PartialEq)]
pub enum OverlayPhase {
    NoOverlay,
    Loading,
    /// A payload arrived but nothing can decode it; renders nothing.
    NoDecoder,
    Ready(SegmentationOverlay),
}

/// Proof that a load was started at a given generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LoadOutcome {
    Ready { count: usize },
    Failed(LoadError),
    /// The ticket was stale or the viewport was torn down.
    Discarded,
}

#[derive(Clone, Debug)]
pub struct ViewportModel {
    view: ViewId,
    study_uid: Option<String>,
    phase: LoadPhase,
    images: Vec<DicomImage>,
    cursor: SliceCursor,
    playing: bool,
    overlay: OverlayPhase,
    overlay_shown: bool,
    generation: u64,
    torn_down: bool,
}

impl ViewportModel {
    pub fn new(view: ViewId) -> Self {
        Self {
            view,
            study_uid: None,
            phase: LoadPhase::Idle,
            images: Vec::new(),
            cursor: SliceCursor::default(),
            playing: false,
            overlay: OverlayPhase::NoOverlay,
            overlay_shown: true,
            generation: 0,
            torn_down: false,
        }
    }

    pub fn study_uid(&self) -> Option<&str> {
        self.study_uid.as_deref()
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == LoadPhase::Loading
    }

    pub fn images(&self) -> &[DicomImage] {
        &self.images
    }

    pub fn slice_index(&self) -> Option<usize> {
        self.cursor.index()
    }

    pub fn current_image(&self) -> Option<&DicomImage> {
        self.images.get(self.cursor.index()?)
    }

    pub fn overlay(&self) -> &OverlayPhase {
        &self.overlay
    }

    /// The overlay to draw, if one is decoded, visible and not hidden by
    /// the viewport's own toggle.
    pub fn visible_overlay(&self) -> Option<&SegmentationOverlay> {
        match &self.overlay {
            OverlayPhase::Ready(overlay) if self.overlay_shown && overlay.visible => Some(overlay),
            _ => None,
        }
    }

    pub fn overlay_shown(&self) -> bool {
        self.overlay_shown
    }

    pub fn toggle_overlay_shown(&mut self) {
        self.overlay_shown = !self.overlay_shown;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Starts (or restarts) loading `study_uid`. Any load already in flight
    /// becomes stale. Returns `None` once torn down.
    pub fn begin_load(&mut self, study_uid: &str) -> Option<LoadTicket> {
        if self.torn_down {
            return None;
        }
        self.generation += 1;
        self.study_uid = Some(study_uid.to_string());
        self.phase = LoadPhase::Loading;
        self.images.clear();
        self.cursor = SliceCursor::default();
        self.playing = false;
        self.overlay = OverlayPhase::NoOverlay;
        Some(self.ticket())
    }

    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<Vec<DicomImage>, LoadError>) -> LoadOutcome {
        if !self.accepts(ticket) {
            return LoadOutcome::Discarded;
        }
        match result {
            Ok(images) if !images.is_empty() => {
                let count = images.len();
                self.cursor = SliceCursor::centered(count);
                self.images = images;
                self.phase = LoadPhase::Ready;
                LoadOutcome::Ready { count }
            }
            Ok(_) => {
                let study = self.study_uid.clone().unwrap_or_default();
                self.fail(LoadError::EmptySeries(study))
            }
            Err(e) => self.fail(e),
        }
    }

    fn fail(&mut self, error: LoadError) -> LoadOutcome {
        log::error!(
            "{} view: failed to load study {}: {error}",
            self.view.title(),
            self.study_uid.as_deref().unwrap_or("?")
        );
        self.images.clear();
        self.cursor = SliceCursor::default();
        self.phase = LoadPhase::Failed;
        LoadOutcome::Failed(error)
    }

    /// Starts the overlay load for the current study; independent of the
    /// image load's progress. Only planar views carry an overlay.
    pub fn begin_overlay(&mut self) -> Option<LoadTicket> {
        if self.torn_down || self.study_uid.is_none() || !self.view.is_planar() {
            return None;
        }
        self.overlay = OverlayPhase::Loading;
        Some(self.ticket())
    }

    /// Applies a segmentation fetch. Failures and missing payloads leave
    /// no overlay; a payload nobody can decode lands in `NoDecoder`.
    /// Returns whether the result was applied.
    pub fn finish_overlay(
        &mut self,
        ticket: LoadTicket,
        result: Result<Option<Vec<u8>>, LoadError>,
        decoder: &impl SegmentationDecoder,
    ) -> bool {
        if !self.accepts(ticket) {
            return false;
        }
        self.overlay = match result {
            Ok(Some(payload)) => match decoder.decode(&payload) {
                Some(overlay) => OverlayPhase::Ready(overlay),
                None => {
                    log::info!(
                        "{} view: segmentation payload ({} bytes) not decodable, overlay disabled",
                        self.view.title(),
                        payload.len()
                    );
                    OverlayPhase::NoDecoder
                }
            },
            Ok(None) => OverlayPhase::NoOverlay,
            Err(e) => {
                log::error!("{} view: failed to load segmentation overlay: {e}", self.view.title());
                OverlayPhase::NoOverlay
            }
        };
        true
    }

    pub fn step_slice(&mut self, delta: isize) -> bool {
        self.phase == LoadPhase::Ready && self.cursor.step(delta)
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing && self.cursor.len() > 1;
    }

    pub fn toggle_playing(&mut self) {
        self.set_playing(!self.playing);
    }

    /// One cine tick; a no-op unless playing.
    pub fn cine_tick(&mut self) -> bool {
        self.playing && self.cursor.advance_wrapping()
    }

    /// Invalidates all outstanding tickets; later results are discarded.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.playing = false;
        self.generation += 1;
    }

    fn ticket(&self) -> LoadTicket {
        LoadTicket { generation: self.generation }
    }

    fn accepts(&self, ticket: LoadTicket) -> bool {
        !self.torn_down && ticket.generation == self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::NoDecoder;
    use crate::series::fake::{instance, FakeSource};
    use crate::series::{images_from_instances, load_study_images};

    fn images(n: i64) -> Vec<DicomImage> {
        (1..=n).map(|i| DicomImage::new(format!("sop-{i}"), i, "http://h/x.dcm")).collect()
    }

    struct FixedDecoder;

    /// Counts error records per thread so parallel tests don't interfere.
    struct ErrorCounter;

    thread_local! {
        static ERRORS: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
    }

    impl log::Log for ErrorCounter {
        fn enabled(&self, _metadata: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            if record.level() == log::Level::Error {
                ERRORS.with(|n| n.set(n.get() + 1));
            }
        }

        fn flush(&self) {}
    }

    static COUNTER: ErrorCounter = ErrorCounter;

    fn logged_errors() -> usize {
        static INIT: std::sync::Once = std::sync::Once::new();
        INIT.call_once(|| {
            let _ = log::set_logger(&COUNTER);
            log::set_max_level(log::LevelFilter::Trace);
        });
        ERRORS.with(|n| n.get())
    }

    impl SegmentationDecoder for FixedDecoder {
        fn decode(&self, _payload: &[u8]) -> Option<SegmentationOverlay> {
            SegmentationOverlay::new(1, 1, vec![1])
        }
    }

    #[test]
    fn test_initial_index_is_middle() {
        for (n, expected) in [(1, 0), (2, 1), (5, 2), (6, 3)] {
            let mut model = ViewportModel::new(ViewId::Axial);
            let ticket = model.begin_load("s").unwrap();
            assert_eq!(model.finish_load(ticket, Ok(images(n))), LoadOutcome::Ready { count: n as usize });
            assert_eq!(model.slice_index(), Some(expected));
        }
    }

    #[test]
    fn test_slice_clamps_at_both_ends() {
        let mut model = ViewportModel::new(ViewId::Axial);
        let ticket = model.begin_load("s").unwrap();
        model.finish_load(ticket, Ok(images(4)));
        for _ in 0..10 {
            model.step_slice(1);
        }
        assert_eq!(model.slice_index(), Some(3));
        assert!(!model.step_slice(1));
        for _ in 0..10 {
            model.step_slice(-1);
        }
        assert_eq!(model.slice_index(), Some(0));
        assert!(!model.step_slice(-1));
    }

    #[test]
    fn test_empty_cursor_is_inactive() {
        let mut cursor = SliceCursor::default();
        assert_eq!(cursor.index(), None);
        assert!(!cursor.step(1));
        assert!(!cursor.advance_wrapping());
    }

    #[tokio::test]
    async fn test_empty_study_fails_silently() {
        let source = FakeSource { study_uid: "1.2".into(), ..Default::default() };
        let mut model = ViewportModel::new(ViewId::Coronal);
        let ticket = model.begin_load("1.2").unwrap();
        assert!(model.is_loading());

        let before = logged_errors();
        let result = load_study_images(&source, "1.2").await;
        let outcome = model.finish_load(ticket, result);
        assert_eq!(logged_errors() - before, 1);

        assert!(matches!(outcome, LoadOutcome::Failed(LoadError::EmptySeries(_))));
        assert!(model.images().is_empty());
        assert!(!model.is_loading());
        assert_eq!(model.phase(), LoadPhase::Failed);
        assert!(model.current_image().is_none());
    }

    #[tokio::test]
    async fn test_unsorted_study_starts_on_middle_instance() {
        let source = FakeSource {
            study_uid: "1.2".into(),
            instances: [3, 1, 5, 2, 4].iter().map(|&n| instance(&format!("sop-{n}"), Some(n))).collect(),
            ..Default::default()
        };
        let mut model = ViewportModel::new(ViewId::Axial);
        let ticket = model.begin_load("1.2").unwrap();
        let result = load_study_images(&source, "1.2").await;
        model.finish_load(ticket, result);

        let numbers: Vec<i64> = model.images().iter().map(|i| i.instance_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
        assert_eq!(model.slice_index(), Some(2));
        assert_eq!(model.current_image().unwrap().image_id, "sop-3");
    }

    #[test]
    fn test_response_after_teardown_is_discarded() {
        let mut model = ViewportModel::new(ViewId::Sagittal);
        let ticket = model.begin_load("s").unwrap();
        let overlay_ticket = model.begin_overlay().unwrap();
        model.teardown();

        assert_eq!(model.finish_load(ticket, Ok(images(3))), LoadOutcome::Discarded);
        assert!(!model.finish_overlay(overlay_ticket, Ok(Some(vec![1])), &FixedDecoder));
        assert!(model.images().is_empty());
        assert!(model.begin_load("s").is_none());
    }

    #[test]
    fn test_restarted_load_discards_previous_response() {
        let mut model = ViewportModel::new(ViewId::Axial);
        let first = model.begin_load("a").unwrap();
        let second = model.begin_load("b").unwrap();
        assert_eq!(model.finish_load(first, Ok(images(2))), LoadOutcome::Discarded);
        assert!(model.is_loading());
        assert_eq!(model.finish_load(second, Ok(images(3))), LoadOutcome::Ready { count: 3 });
        assert_eq!(model.study_uid(), Some("b"));
    }

    #[test]
    fn test_overlay_phases() {
        let mut model = ViewportModel::new(ViewId::Axial);
        assert!(model.begin_overlay().is_none());
        model.begin_load("s").unwrap();

        let t = model.begin_overlay().unwrap();
        assert_eq!(model.overlay(), &OverlayPhase::Loading);
        model.finish_overlay(t, Ok(Some(vec![0u8; 16])), &NoDecoder);
        assert_eq!(model.overlay(), &OverlayPhase::NoDecoder);
        assert!(model.visible_overlay().is_none());

        let t = model.begin_overlay().unwrap();
        model.finish_overlay(t, Ok(None), &NoDecoder);
        assert_eq!(model.overlay(), &OverlayPhase::NoOverlay);

        let t = model.begin_overlay().unwrap();
        model.finish_overlay(t, Err(LoadError::Status { url: "u".into(), status: 500 }), &FixedDecoder);
        assert_eq!(model.overlay(), &OverlayPhase::NoOverlay);

        let t = model.begin_overlay().unwrap();
        model.finish_overlay(t, Ok(Some(vec![1])), &FixedDecoder);
        assert!(model.visible_overlay().is_some());
        model.toggle_overlay_shown();
        assert!(model.visible_overlay().is_none());
    }

    #[test]
    fn test_volume_view_never_loads_overlay() {
        let mut model = ViewportModel::new(ViewId::Volume);
        let ticket = model.begin_load("s").unwrap();
        model.finish_load(ticket, Ok(images(2)));
        assert!(model.begin_overlay().is_none());
        assert_eq!(model.overlay(), &OverlayPhase::NoOverlay);
    }

    #[test]
    fn test_cine_wraps_and_needs_two_slices() {
        let mut model = ViewportModel::new(ViewId::Axial);
        let ticket = model.begin_load("s").unwrap();
        model.finish_load(ticket, Ok(images(3)));
        assert!(!model.cine_tick());
        model.toggle_playing();
        assert!(model.is_playing());
        assert!(model.cine_tick());
        assert_eq!(model.slice_index(), Some(2));
        model.cine_tick();
        assert_eq!(model.slice_index(), Some(0));

        let mut single = ViewportModel::new(ViewId::Axial);
        let ticket = single.begin_load("s").unwrap();
        single.finish_load(ticket, Ok(images(1)));
        single.toggle_playing();
        assert!(!single.is_playing());
    }

    #[test]
    fn test_images_from_instances_feeds_model() {
        let instances = vec![instance("b", Some(2)), instance("a", Some(1))];
        let mut model = ViewportModel::new(ViewId::Axial);
        let ticket = model.begin_load("s").unwrap();
        model.finish_load(ticket, images_from_instances(&instances));
        assert_eq!(model.current_image().unwrap().image_id, "b");
    }
}
