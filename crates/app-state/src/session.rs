//! `EditorSession`: the single owner of an open project.
//!
//! The session holds the project together with its undo history, selection,
//! playback state, viewport, drag state, configuration and the recording
//! collaborator. Every edit goes through one internal entry point,
//! `mutate()`, which:
//!
//! 1. snapshots the project and selection,
//! 2. applies the clamped store operation,
//! 3. keeps overlays inside the timeline after clip-track changes,
//! 4. checks the timeline invariants (fatal in debug, repaired in release),
//! 5. revalidates the selection, marks the project dirty for auto-save,
//! 6. and records one history entry if the project actually changed.
//!
//! Operations that cannot be applied return `None`/`false` and leave the
//! project untouched.
//!
//! For multi-threaded hosts, wrap the session in a [`SharedSession`]:
//! composition takes the read lock, edits take the write lock.
//!
//! # Usage
//!
//! ```ignore
//! let mut session = EditorSession::for_recording(
//!     "Demo",
//!     RecordingRef(0),
//!     EditorConfig::default(),
//!     Arc::new(StaticRecordings::single(10.0)),
//! )?;
//! let zoom = session.insert_segment::<ZoomParams>(4.0);
//! session.undo();
//! let frame = session.compose_frame(5.0);
//! ```

use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use rk_common::{
    AspectRatio, BackgroundConfig, Crop, EditorConfig, EngineError, FrameNumber, ProjectStore,
    RecordingProvider, RecordingRef, RenderParams, XY,
};
use rk_project::{from_json_string, to_json_string, AutoSaver, BackgroundSaver, ProjectError, ProjectFile};
use rk_timeline_eval::{
    compose_frame_with, normalize_project, normalize_timeline, validate_timeline,
    CaptionStyleOverride, ComposeSettings, Project, TimeMap, Timeline, TrackKind, TrackParams,
};
use serde::{Deserialize, Serialize};

use crate::error::{SessionError, SessionResult};
use crate::history::HistoryManager;
use crate::interaction::{DragContext, DragKind, DragOutcome, DragState, DragTarget};
use crate::playback::PlaybackState;
use crate::selection::{IndexShift, SelectionState};
use crate::snapshot::EditorSnapshot;
use crate::store::{self, dispatch_overlay, EditLimits, Edge};
use crate::viewport::Viewport;

/// Readers-writer handle shared between the editor and the playback thread.
pub type SharedSession = Arc<RwLock<EditorSession>>;

/// Commands delivered by the host's event bus.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditorCommand {
    Undo,
    Redo,
    Play,
    Stop,
    Seek(f64),
    TogglePlayback,
    DeleteSelection,
}

/// Inputs a store operation may need, borrowed from the session.
struct EditContext<'a> {
    limits: EditLimits,
    config: &'a EditorConfig,
    recordings: &'a dyn RecordingProvider,
    playhead: f64,
}

impl EditContext<'_> {
    /// Available source seconds for `recording`, or `fallback` when the
    /// provider cannot say.
    fn source_limit(&self, recording: RecordingRef, fallback: f64) -> f64 {
        match self.recordings.duration(recording) {
            Ok(duration) => duration,
            Err(e) => {
                tracing::warn!(%recording, error = %e, "Recording duration unavailable");
                fallback
            }
        }
    }
}

pub struct EditorSession {
    file: ProjectFile,
    map: TimeMap,
    history: HistoryManager,
    selection: SelectionState,
    playback: PlaybackState,
    viewport: Viewport,
    drag: DragState,
    config: EditorConfig,
    recordings: Arc<dyn RecordingProvider>,
    cursor: Option<XY<f64>>,
    autosave: AutoSaver,
    saver: Option<BackgroundSaver>,
}

impl EditorSession {
    /// Open `file` for editing.
    ///
    /// The configuration is sanitized and the project repaired where
    /// possible; a timeline that is still invalid (e.g. no clips) is an error.
    pub fn new(
        mut file: ProjectFile,
        config: EditorConfig,
        recordings: Arc<dyn RecordingProvider>,
    ) -> SessionResult<Self> {
        let config = config.sanitized();
        if normalize_project(&mut file.project) {
            tracing::warn!(project_name = %file.name, "Project needed repair on open");
        }
        validate_timeline(&file.project.timeline)?;

        let map = TimeMap::new(&file.project.timeline.clips);
        let total = map.total_duration();
        tracing::info!(
            project_name = %file.name,
            clips = file.project.timeline.clips.len(),
            duration = total,
            "Editor session opened"
        );

        Ok(Self {
            map,
            history: HistoryManager::new(config.history_depth),
            selection: SelectionState::new(),
            playback: PlaybackState::new(),
            viewport: Viewport::new(config.viewport.clone(), total),
            drag: DragState::Idle,
            autosave: AutoSaver::from_config(&config),
            saver: None,
            cursor: None,
            file,
            config,
            recordings,
        })
    }

    /// A fresh project covering all of `recording`.
    pub fn for_recording(
        name: impl Into<String>,
        recording: RecordingRef,
        config: EditorConfig,
        recordings: Arc<dyn RecordingProvider>,
    ) -> SessionResult<Self> {
        let duration = recordings
            .duration(recording)
            .map_err(EngineError::from)?;
        let file = ProjectFile::for_recording(name, recording, duration);
        Self::new(file, config, recordings)
    }

    /// Open the project last saved in `store` and keep auto-saving into it.
    pub fn open(
        store: Arc<dyn ProjectStore>,
        config: EditorConfig,
        recordings: Arc<dyn RecordingProvider>,
    ) -> SessionResult<Self> {
        let json = store.load()?.ok_or(SessionError::NothingSaved)?;
        let file = from_json_string(&json)?;
        let mut session = Self::new(file, config, recordings)?;
        session.attach_store(store)?;
        Ok(session)
    }

    /// Wrap the session for sharing with a playback thread.
    pub fn shared(self) -> SharedSession {
        Arc::new(RwLock::new(self))
    }

    // -- Read accessors --

    pub fn project(&self) -> &Project {
        &self.file.project
    }

    pub fn file(&self) -> &ProjectFile {
        &self.file
    }

    pub fn timeline(&self) -> &Timeline {
        &self.file.project.timeline
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn time_map(&self) -> &TimeMap {
        &self.map
    }

    pub fn total_duration(&self) -> f64 {
        self.map.total_duration()
    }

    pub fn zoom_out_limit(&self) -> f64 {
        self.viewport.zoom_out_limit(self.total_duration())
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_dirty(&self) -> bool {
        self.autosave.is_dirty()
    }

    fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot::new(self.file.project.clone(), self.selection.clone())
    }

    // -- Mutation core --

    fn mutate<R>(
        &mut self,
        label: &str,
        op: impl FnOnce(&mut Project, &EditContext<'_>) -> Option<R>,
    ) -> Option<R> {
        self.mutate_shifting(label, op, |_| None)
    }

    /// Like `mutate`, for edits that insert or remove a segment. `shift`
    /// describes the index change so the selection follows its segments.
    fn mutate_shifting<R>(
        &mut self,
        label: &str,
        op: impl FnOnce(&mut Project, &EditContext<'_>) -> Option<R>,
        shift: impl FnOnce(&R) -> Option<IndexShift>,
    ) -> Option<R> {
        let before = self.snapshot();
        let total = self.map.total_duration();
        let ctx = EditContext {
            limits: EditLimits::new(&self.config, total),
            config: &self.config,
            recordings: self.recordings.as_ref(),
            playhead: self.playback.position(Instant::now(), total),
        };

        match op(&mut self.file.project, &ctx) {
            Some(result) => {
                if before.differs_from(&self.file.project) {
                    self.commit(label, before, shift(&result));
                }
                Some(result)
            }
            None => {
                if before.differs_from(&self.file.project) {
                    tracing::warn!(label, "Rejected edit left changes behind, reverting");
                    self.file.project = before.project;
                }
                tracing::debug!(label, "Edit rejected");
                None
            }
        }
    }

    fn commit(&mut self, label: &str, before: EditorSnapshot, shift: Option<IndexShift>) {
        let timeline = &mut self.file.project.timeline;
        if before.project.timeline.clips != timeline.clips {
            store::clamp_overlays(timeline);
            self.map = TimeMap::new(&timeline.clips);
            self.viewport.clamp(self.map.total_duration());
        }
        self.check_invariants();
        if let Some(shift) = shift {
            self.selection.apply_shift(shift);
        }
        self.selection.revalidate(&self.file.project.timeline);
        self.autosave.mark_dirty();
        self.history.push(label, before);
        tracing::debug!(label, duration = self.map.total_duration(), "Edit committed");
    }

    fn check_invariants(&mut self) {
        let result = validate_timeline(&self.file.project.timeline);
        debug_assert!(result.is_ok(), "edit broke timeline invariants: {result:?}");
        if let Err(e) = result {
            tracing::error!(error = %e, "Edit broke timeline invariants, repairing");
            normalize_timeline(&mut self.file.project.timeline);
            self.map = TimeMap::new(&self.file.project.timeline.clips);
        }
    }

    fn restore(&mut self, snapshot: EditorSnapshot) {
        self.file.project = snapshot.project;
        self.selection = snapshot.selection;
        self.map = TimeMap::new(&self.file.project.timeline.clips);
        self.selection.revalidate(&self.file.project.timeline);
        self.viewport.clamp(self.map.total_duration());
        self.autosave.mark_dirty();
    }

    // -- Overlay segments --

    /// Insert a default segment of track `P` at timeline `time` and select it.
    pub fn insert_segment<P: TrackParams>(&mut self, time: f64) -> Option<usize> {
        let label = format!("Insert {}", P::KIND);
        let index = self.mutate_shifting(
            &label,
            |project, ctx| {
                store::insert_at(
                    P::track_mut(&mut project.timeline),
                    time,
                    P::default_duration(ctx.config),
                    P::with_defaults(ctx.config),
                    &ctx.limits,
                )
            },
            |&index| Some(IndexShift::Inserted { kind: P::KIND, index }),
        )?;
        self.selection.select(P::KIND, index, false);
        Some(index)
    }

    /// Insert a segment of track `P` with explicit parameters.
    pub fn insert_segment_with<P: TrackParams>(
        &mut self,
        time: f64,
        duration: f64,
        params: P,
    ) -> Option<usize> {
        let label = format!("Insert {}", P::KIND);
        self.mutate_shifting(
            &label,
            |project, ctx| {
                store::insert_at(P::track_mut(&mut project.timeline), time, duration, params, &ctx.limits)
            },
            |&index| Some(IndexShift::Inserted { kind: P::KIND, index }),
        )
    }

    /// Translate an overlay segment. Clip segments cannot be moved.
    pub fn move_segment(&mut self, kind: TrackKind, index: usize, delta: f64) -> Option<(f64, f64)> {
        self.mutate("Move segment", |project, ctx| {
            dispatch_overlay!(kind,
                P => store::move_segment(P::track_mut(&mut project.timeline), index, delta, &ctx.limits),
                clip => None,
            )
        })
    }

    /// Move one edge of a segment to `time`.
    ///
    /// For overlays `time` is timeline seconds. For clips it is source
    /// seconds, clamped to the recording's available duration.
    pub fn resize_segment(
        &mut self,
        kind: TrackKind,
        index: usize,
        edge: Edge,
        time: f64,
    ) -> Option<f64> {
        self.mutate("Resize segment", |project, ctx| {
            dispatch_overlay!(kind,
                P => store::resize_edge(P::track_mut(&mut project.timeline), index, edge, time, &ctx.limits),
                clip => {
                    let clip = project.timeline.clips.get(index)?;
                    let max_source = ctx.source_limit(clip.recording, clip.end);
                    store::resize_clip(
                        &mut project.timeline.clips,
                        index,
                        edge,
                        time,
                        max_source,
                        ctx.config.min_segment_duration,
                    )
                },
            )
        })
    }

    /// Split a segment at timeline `time`. Returns the right half's index.
    pub fn split_segment(&mut self, kind: TrackKind, index: usize, time: f64) -> Option<usize> {
        self.mutate_shifting(
            "Split segment",
            |project, ctx| {
                dispatch_overlay!(kind,
                    P => store::split_at(P::track_mut(&mut project.timeline), index, time, &ctx.limits),
                    clip => {
                        let (start, end) = project.timeline.segment_bounds(TrackKind::Clip, index)?;
                        let fraction = (time - start) / (end - start);
                        store::split_clip(
                            &mut project.timeline.clips,
                            index,
                            fraction,
                            ctx.config.min_segment_duration,
                        )
                    },
                )
            },
            |&right| Some(IndexShift::Inserted { kind, index: right }),
        )
    }

    /// Remove a segment. Clip deletion closes the gap; the last clip stays.
    pub fn delete_segment(&mut self, kind: TrackKind, index: usize) -> bool {
        self.mutate_shifting(
            "Delete segment",
            |project, _| delete_at(&mut project.timeline, kind, index).then_some(()),
            |_| Some(IndexShift::Removed { kind, index }),
        )
        .is_some()
    }

    pub fn set_segment_enabled(&mut self, kind: TrackKind, index: usize, enabled: bool) -> bool {
        let label = if enabled { "Enable segment" } else { "Disable segment" };
        self.mutate(label, |project, _| {
            dispatch_overlay!(kind,
                P => store::set_enabled(P::track_mut(&mut project.timeline), index, enabled),
                clip => None,
            )
        })
        .is_some()
    }

    /// Edit the parameters of segment `index` on track `P`.
    pub fn update_params<P: TrackParams, R>(
        &mut self,
        index: usize,
        edit: impl FnOnce(&mut P) -> R,
    ) -> Option<R> {
        let label = format!("Edit {}", P::KIND);
        self.mutate(&label, |project, _| {
            let track = P::track_mut(&mut project.timeline);
            let result = store::update_params(track, index, edit)?;
            let segment = &mut track[index];
            let duration = segment.duration();
            segment.params.normalize(duration);
            Some(result)
        })
    }

    /// Set a mask's geometry under the configured keyframe edit policy,
    /// keyed at the current playhead.
    pub fn set_mask_geometry(&mut self, index: usize, center: XY<f64>, size: XY<f64>) -> bool {
        let policy = self.config.keyframe_edit_policy;
        self.mutate("Edit mask", |project, ctx| {
            store::set_mask_geometry(
                &mut project.timeline.masks,
                index,
                center,
                size,
                policy,
                ctx.playhead,
            )
        })
        .is_some()
    }

    /// Set a zoom segment's amount and focus under the keyframe edit policy.
    pub fn set_zoom_focus(&mut self, index: usize, amount: f64, center: XY<f64>) -> bool {
        let policy = self.config.keyframe_edit_policy;
        self.mutate("Edit zoom", |project, ctx| {
            store::set_zoom_focus(
                &mut project.timeline.zoom,
                index,
                amount,
                center,
                policy,
                ctx.playhead,
            )
        })
        .is_some()
    }

    /// Drop all keyframes on an overlay segment, keeping its static values.
    pub fn clear_animation(&mut self, kind: TrackKind, index: usize) -> bool {
        self.mutate("Clear animation", |project, _| {
            dispatch_overlay!(kind,
                P => store::clear_animation(P::track_mut(&mut project.timeline), index),
                clip => None,
            )
        })
        .is_some()
    }

    // -- Clip track --

    /// Split clip `index` at `fraction` of its length.
    pub fn split_clip(&mut self, index: usize, fraction: f64) -> Option<usize> {
        self.mutate_shifting(
            "Split clip",
            |project, ctx| {
                store::split_clip(
                    &mut project.timeline.clips,
                    index,
                    fraction,
                    ctx.config.min_segment_duration,
                )
            },
            clip_inserted,
        )
    }

    /// Split whichever clip plays at timeline `time`.
    pub fn split_clip_at_time(&mut self, time: f64) -> Option<usize> {
        self.mutate_shifting(
            "Split clip",
            |project, ctx| {
                store::split_clip_at_time(
                    &mut project.timeline.clips,
                    time,
                    ctx.config.min_segment_duration,
                )
            },
            clip_inserted,
        )
    }

    pub fn set_clip_timescale(&mut self, index: usize, timescale: f64) -> Option<f64> {
        self.mutate("Change speed", |project, ctx| {
            store::set_clip_timescale(
                &mut project.timeline.clips,
                index,
                timescale,
                ctx.config.min_timescale,
                ctx.config.max_timescale,
            )
        })
    }

    // -- Project look --

    pub fn set_aspect_ratio(&mut self, aspect_ratio: Option<AspectRatio>) -> bool {
        self.mutate("Change aspect ratio", |project, _| {
            project.aspect_ratio = aspect_ratio;
            Some(())
        })
        .is_some()
    }

    pub fn set_background(&mut self, background: BackgroundConfig) -> bool {
        self.mutate("Change background", |project, _| {
            project.background = background;
            Some(())
        })
        .is_some()
    }

    pub fn set_crop(&mut self, crop: Option<Crop>) -> bool {
        self.mutate("Crop", |project, _| {
            project.crop = crop;
            Some(())
        })
        .is_some()
    }

    pub fn set_caption_defaults(&mut self, style: CaptionStyleOverride) -> bool {
        self.mutate("Caption style", |project, _| {
            project.timeline.caption_defaults = style;
            Some(())
        })
        .is_some()
    }

    pub fn apply_preset(&mut self, name: &str) -> bool {
        self.mutate("Apply preset", |project, _| project.apply_preset(name).then_some(()))
            .is_some()
    }

    pub fn save_preset(&mut self, name: &str) {
        self.mutate("Save preset", |project, _| {
            project.save_preset(name);
            Some(())
        });
    }

    // -- Selection --

    pub fn select(&mut self, kind: TrackKind, index: usize, multi: bool) -> bool {
        if index >= self.timeline().track_len(kind) {
            return false;
        }
        self.selection.select(kind, index, multi);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Delete every selected segment as one undo step. Returns how many
    /// were removed.
    pub fn delete_selection(&mut self) -> usize {
        let Some(kind) = self.selection.kind() else {
            return 0;
        };
        // Highest index first so earlier removals don't shift later ones.
        let indices: Vec<usize> = self.selection.indices().rev().collect();
        let deleted = self
            .mutate("Delete selection", |project, _| {
                let count = indices
                    .iter()
                    .filter(|&&index| delete_at(&mut project.timeline, kind, index))
                    .count();
                (count > 0).then_some(count)
            })
            .unwrap_or(0);
        if deleted > 0 {
            self.selection.clear();
        }
        deleted
    }

    // -- History --

    pub fn undo(&mut self) -> bool {
        if !self.drag.is_idle() {
            self.cancel_drag();
        }
        let current = self.snapshot();
        match self.history.undo(current) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        if !self.drag.is_idle() {
            self.cancel_drag();
        }
        let current = self.snapshot();
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    /// Collect the following edits into one undo entry until the matching
    /// [`resume_history`](Self::resume_history). Calls nest.
    pub fn pause_history(&mut self, label: &str) {
        let before = self.snapshot();
        self.history.pause(label, before);
    }

    /// Returns `true` if the outermost resume recorded an entry.
    pub fn resume_history(&mut self) -> bool {
        self.history.resume(&self.file.project)
    }

    // -- Drag protocol --

    /// Start a drag on `target`.
    ///
    /// `pointer_x` is measured in pixels from the left edge of the timeline
    /// strip and `seconds_per_pixel` is the strip's current scale. History
    /// is paused until the drag ends. Returns `false` if the target does not
    /// exist or cannot be dragged that way (clips cannot be moved).
    pub fn begin_drag(
        &mut self,
        target: DragTarget,
        kind: DragKind,
        pointer_x: f64,
        seconds_per_pixel: f64,
    ) -> bool {
        if !self.drag.is_idle() {
            self.cancel_drag();
        }
        if !pointer_x.is_finite() || !seconds_per_pixel.is_finite() {
            return false;
        }

        let timeline = &self.file.project.timeline;
        let (initial, timescale, max_source) = match (target.kind, kind) {
            (TrackKind::Clip, DragKind::Move) => return false,
            (TrackKind::Clip, DragKind::Resize(_)) => {
                let Some(clip) = timeline.clips.get(target.index) else {
                    return false;
                };
                let max_source = match self.recordings.duration(clip.recording) {
                    Ok(duration) => duration,
                    Err(e) => {
                        tracing::warn!(error = %e, "Recording duration unavailable for drag");
                        clip.end
                    }
                };
                ((clip.start, clip.end), clip.timescale, max_source)
            }
            (other, _) => {
                let Some(bounds) = timeline.segment_bounds(other, target.index) else {
                    return false;
                };
                (bounds, 1.0, f64::INFINITY)
            }
        };

        let before = self.snapshot();
        self.history.pause(&format!("Drag {}", target.kind), before.clone());
        self.drag = DragState::Pending(DragContext {
            target,
            kind,
            origin_x: pointer_x,
            seconds_per_pixel,
            initial,
            timescale,
            max_source,
            before,
        });
        tracing::debug!(track = %target.kind, index = target.index, ?kind, "Drag started");
        true
    }

    /// Pointer moved. Returns `true` if the target was edited.
    pub fn drag_to(&mut self, pointer_x: f64) -> bool {
        let threshold = self.config.drag_threshold_px;
        match std::mem::take(&mut self.drag) {
            DragState::Idle => false,
            DragState::Pending(ctx) => {
                if ctx.exceeds_threshold(pointer_x, threshold) {
                    self.drag = DragState::Dragging(ctx);
                    self.apply_drag(pointer_x)
                } else {
                    self.drag = DragState::Pending(ctx);
                    false
                }
            }
            dragging @ DragState::Dragging(_) => {
                self.drag = dragging;
                self.apply_drag(pointer_x)
            }
        }
    }

    /// Recompute the target's geometry from the drag-start values and the
    /// total pointer travel, clamped against the current neighbours.
    fn apply_drag(&mut self, pointer_x: f64) -> bool {
        let Some(ctx) = self.drag.context() else {
            return false;
        };
        if !pointer_x.is_finite() {
            return false;
        }
        let DragTarget { kind: track, index } = ctx.target;
        let drag = ctx.kind;
        let delta = ctx.delta_secs(pointer_x);
        let (start, end) = ctx.initial;
        let timescale = ctx.timescale;
        let max_source = ctx.max_source;

        let edge_value = |edge: Edge| match edge {
            Edge::Start => start,
            Edge::End => end,
        };

        self.mutate("Drag", |project, ctx| match drag {
            DragKind::Move => dispatch_overlay!(track,
                P => {
                    let segments = P::track_mut(&mut project.timeline);
                    let current = segments.get(index)?.start;
                    store::move_segment(segments, index, start + delta - current, &ctx.limits)
                        .map(|_| ())
                },
                clip => None,
            ),
            DragKind::Resize(edge) => dispatch_overlay!(track,
                P => store::resize_edge(
                    P::track_mut(&mut project.timeline),
                    index,
                    edge,
                    edge_value(edge) + delta,
                    &ctx.limits,
                )
                .map(|_| ()),
                clip => store::resize_clip(
                    &mut project.timeline.clips,
                    index,
                    edge,
                    edge_value(edge) + delta * timescale,
                    max_source,
                    ctx.config.min_segment_duration,
                )
                .map(|_| ()),
            ),
        })
        .is_some()
    }

    /// Pointer released.
    ///
    /// A drag that never passed the click threshold is a click: the target
    /// is selected and the playhead moves to the time under the pointer.
    pub fn end_drag(&mut self, pointer_x: f64) -> DragOutcome {
        let threshold = self.config.drag_threshold_px;
        let ctx = match std::mem::take(&mut self.drag) {
            DragState::Idle => return DragOutcome::Cancelled,
            DragState::Pending(ctx) if !ctx.exceeds_threshold(pointer_x, threshold) => {
                self.history.resume(&self.file.project);
                let total = self.total_duration();
                let time = (self.viewport.position() + pointer_x * ctx.seconds_per_pixel)
                    .clamp(0.0, total);
                self.selection.select(ctx.target.kind, ctx.target.index, false);
                self.playback.seek(time, Instant::now(), total);
                tracing::debug!(time, "Drag resolved as click");
                return DragOutcome::Click { time };
            }
            DragState::Pending(ctx) | DragState::Dragging(ctx) => ctx,
        };

        let target = ctx.target;
        self.drag = DragState::Dragging(ctx);
        self.apply_drag(pointer_x);
        self.drag = DragState::Idle;
        self.history.resume(&self.file.project);
        self.selection.select(target.kind, target.index, false);
        tracing::debug!(track = %target.kind, index = target.index, "Drag committed");
        DragOutcome::Committed
    }

    /// Abort the drag in progress, restoring the pre-drag state.
    pub fn cancel_drag(&mut self) -> DragOutcome {
        let Some(ctx) = (match std::mem::take(&mut self.drag) {
            DragState::Idle => None,
            DragState::Pending(ctx) | DragState::Dragging(ctx) => Some(ctx),
        }) else {
            return DragOutcome::Cancelled;
        };
        if ctx.before.differs_from(&self.file.project) {
            self.restore(ctx.before);
        }
        self.history.resume(&self.file.project);
        tracing::debug!("Drag cancelled");
        DragOutcome::Cancelled
    }

    // -- Playback --

    pub fn play(&mut self) -> bool {
        self.playback.play(Instant::now(), self.map.total_duration())
    }

    pub fn stop(&mut self) -> bool {
        self.playback.stop(Instant::now(), self.map.total_duration())
    }

    pub fn toggle_playback(&mut self) {
        self.playback.toggle(Instant::now(), self.map.total_duration());
    }

    pub fn seek(&mut self, time: f64) {
        self.playback.seek(time, Instant::now(), self.map.total_duration());
    }

    /// Current playhead in timeline seconds.
    pub fn playhead(&self) -> f64 {
        self.playback.position(Instant::now(), self.map.total_duration())
    }

    /// Current playhead on the playback frame grid.
    pub fn playhead_frame(&self) -> FrameNumber {
        self.playback.frame_position(
            Instant::now(),
            self.map.total_duration(),
            self.config.playback_fps,
        )
    }

    // -- Viewport --

    pub fn zoom_viewport(&mut self, visible: f64, anchor: f64) {
        let total = self.total_duration();
        self.viewport.set_zoom(visible, anchor, total);
    }

    pub fn scroll_viewport(&mut self, delta: f64) {
        let total = self.total_duration();
        self.viewport.scroll_by(delta, total);
    }

    // -- Composition --

    /// Normalized cursor position followed by auto-mode zoom.
    pub fn set_cursor(&mut self, cursor: Option<XY<f64>>) {
        self.cursor = cursor;
    }

    pub fn compose_settings(&self) -> ComposeSettings {
        ComposeSettings {
            cursor: self.cursor,
            ..ComposeSettings::from(&self.config)
        }
    }

    /// Compose the frame at timeline `time`. Pure: never touches the project.
    pub fn compose_frame(&self, time: f64) -> RenderParams {
        compose_frame_with(&self.file.project, &self.map, time, &self.compose_settings())
    }

    // -- Commands --

    /// Handle a command from the host's event bus. Returns `true` if it had
    /// an effect.
    pub fn dispatch(&mut self, command: EditorCommand) -> bool {
        tracing::debug!(?command, "Dispatching command");
        match command {
            EditorCommand::Undo => self.undo(),
            EditorCommand::Redo => self.redo(),
            EditorCommand::Play => self.play(),
            EditorCommand::Stop => self.stop(),
            EditorCommand::Seek(time) => {
                self.seek(time);
                true
            }
            EditorCommand::TogglePlayback => {
                self.toggle_playback();
                true
            }
            EditorCommand::DeleteSelection => self.delete_selection() > 0,
        }
    }

    // -- Persistence --

    /// Start auto-saving into `store` on a background thread.
    pub fn attach_store(&mut self, store: Arc<dyn ProjectStore>) -> SessionResult<()> {
        if let Some(mut old) = self.saver.take() {
            old.shutdown();
        }
        self.saver = Some(BackgroundSaver::spawn(store)?);
        Ok(())
    }

    /// Hand a snapshot to the saver if the debounce period has passed.
    /// Never blocks on I/O. Returns `true` if a save was queued.
    pub fn poll_autosave(&mut self) -> bool {
        self.poll_autosave_at(Instant::now())
    }

    pub fn poll_autosave_at(&mut self, now: Instant) -> bool {
        if self.saver.is_none() || !self.drag.is_idle() || !self.autosave.should_save_at(now) {
            return false;
        }
        match self.save_now() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Auto-save failed");
                false
            }
        }
    }

    /// Queue a save of the current project immediately.
    pub fn save_now(&mut self) -> SessionResult<()> {
        let saver = self.saver.as_ref().ok_or(ProjectError::SaverStopped)?;
        self.file.touch();
        let json = to_json_string(&self.file)?;
        saver.submit(json)?;
        self.autosave.mark_saved();
        Ok(())
    }

    /// Failed background writes since the last call. In-memory state is
    /// never affected by these.
    pub fn take_save_errors(&self) -> Vec<EngineError> {
        self.saver
            .as_ref()
            .map(BackgroundSaver::take_errors)
            .unwrap_or_default()
    }

    /// Save pending changes and stop the saver thread.
    pub fn close(mut self) -> SessionResult<()> {
        if self.autosave.is_dirty() && self.saver.is_some() {
            self.save_now()?;
        }
        if let Some(mut saver) = self.saver.take() {
            saver.shutdown();
        }
        tracing::info!(project_name = %self.file.name, "Editor session closed");
        Ok(())
    }
}

fn clip_inserted(&index: &usize) -> Option<IndexShift> {
    Some(IndexShift::Inserted { kind: TrackKind::Clip, index })
}

/// Delete `index` from the `kind` track.
fn delete_at(timeline: &mut Timeline, kind: TrackKind, index: usize) -> bool {
    dispatch_overlay!(kind,
        P => store::delete_segment(P::track_mut(timeline), index).is_some(),
        clip => store::delete_clip(&mut timeline.clips, index).is_some(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk_common::{KeyframeEditPolicy, SceneMode, SceneState, StaticRecordings};
    use rk_project::MemoryStore;
    use rk_timeline_eval::{ClipSegment, Keyframe, MaskParams, SceneParams, ZoomParams};

    fn session(duration: f64) -> EditorSession {
        EditorSession::for_recording(
            "Test",
            RecordingRef(0),
            EditorConfig::default(),
            Arc::new(StaticRecordings::single(duration)),
        )
        .expect("session")
    }

    fn zoom_bounds(s: &EditorSession) -> Vec<(f64, f64)> {
        s.timeline().zoom.iter().map(|z| (z.start, z.end)).collect()
    }

    #[test]
    fn insert_example_scenario() {
        let mut s = session(10.0);
        assert_eq!(s.insert_segment::<ZoomParams>(4.0), Some(0));
        assert_eq!(zoom_bounds(&s), vec![(4.0, 7.0)]);
        assert!(s.selection().is_selected(TrackKind::Zoom, 0));

        assert_eq!(s.insert_segment::<ZoomParams>(5.0), None);
        assert_eq!(zoom_bounds(&s), vec![(4.0, 7.0)]);
        assert_eq!(s.history().undo_count(), 1);
    }

    #[test]
    fn undo_redo_round_trip() {
        let mut s = session(10.0);
        let original = s.project().clone();
        s.insert_segment::<ZoomParams>(1.0);
        s.insert_segment::<MaskParams>(2.0);
        s.split_clip_at_time(5.0);
        assert_eq!(s.history().undo_count(), 3);

        assert!(s.undo() && s.undo() && s.undo());
        assert_eq!(s.project(), &original);
        assert!(!s.undo());

        assert!(s.redo());
        assert_eq!(s.timeline().zoom.len(), 1);
        s.insert_segment::<ZoomParams>(6.0);
        assert!(!s.can_redo());
    }

    #[test]
    fn rejected_edit_records_nothing() {
        let mut s = session(10.0);
        assert_eq!(s.move_segment(TrackKind::Zoom, 0, 1.0), None);
        assert_eq!(s.move_segment(TrackKind::Clip, 0, 1.0), None);
        assert!(!s.can_undo());
        assert!(!s.is_dirty());
    }

    #[test]
    fn clip_edit_clamps_overlays() {
        let mut s = session(10.0);
        s.insert_segment::<ZoomParams>(6.0);
        s.split_clip_at_time(5.0).expect("split");
        assert!(s.delete_segment(TrackKind::Clip, 1));
        assert_eq!(s.total_duration(), 5.0);
        assert!(s.timeline().zoom.is_empty());
        assert!(validate_timeline(s.timeline()).is_ok());

        assert!(s.undo());
        assert_eq!(s.total_duration(), 10.0);
        assert_eq!(zoom_bounds(&s), vec![(6.0, 9.0)]);
    }

    #[test]
    fn clip_resize_clamped_to_recording() {
        let mut s = session(10.0);
        s.split_clip(0, 0.5).expect("split");
        assert!(s.delete_segment(TrackKind::Clip, 1));
        assert_eq!(s.resize_segment(TrackKind::Clip, 0, Edge::End, 30.0), Some(10.0));
        assert_eq!(s.total_duration(), 10.0);
    }

    #[test]
    fn timescale_changes_duration() {
        let mut s = session(10.0);
        assert_eq!(s.set_clip_timescale(0, 2.0), Some(2.0));
        assert_eq!(s.total_duration(), 5.0);
        assert_eq!(s.set_clip_timescale(0, 100.0), Some(4.0));
    }

    #[test]
    fn paused_edits_form_one_entry() {
        let mut s = session(20.0);
        s.pause_history("Batch");
        s.pause_history("Inner");
        s.insert_segment::<ZoomParams>(1.0);
        s.insert_segment::<MaskParams>(5.0);
        assert!(!s.resume_history());
        assert!(s.resume_history());

        assert_eq!(s.history().undo_count(), 1);
        assert_eq!(s.history().undo_label(), Some("Batch"));
        assert!(s.undo());
        assert!(s.timeline().zoom.is_empty() && s.timeline().masks.is_empty());
    }

    #[test]
    fn delete_selection_is_one_step() {
        let mut s = session(20.0);
        s.insert_segment::<ZoomParams>(0.0);
        s.insert_segment::<ZoomParams>(5.0);
        s.insert_segment::<ZoomParams>(10.0);
        s.select(TrackKind::Zoom, 0, false);
        s.select(TrackKind::Zoom, 2, true);

        assert_eq!(s.delete_selection(), 2);
        assert_eq!(zoom_bounds(&s), vec![(5.0, 8.0)]);
        assert!(s.selection().is_empty());

        assert!(s.undo());
        assert_eq!(s.timeline().zoom.len(), 3);
        assert_eq!(s.selection().count(), 2);
    }

    #[test]
    fn selection_follows_segment_when_earlier_one_is_deleted() {
        let mut s = session(20.0);
        s.insert_segment::<ZoomParams>(0.0);
        s.insert_segment::<ZoomParams>(5.0);
        s.insert_segment::<ZoomParams>(10.0);
        s.select(TrackKind::Zoom, 1, false);

        assert!(s.delete_segment(TrackKind::Zoom, 0));
        assert_eq!(s.selection().indices().collect::<Vec<_>>(), vec![0]);

        assert_eq!(s.delete_selection(), 1);
        assert_eq!(zoom_bounds(&s), vec![(10.0, 13.0)]);
    }

    #[test]
    fn deleting_the_selected_segment_clears_selection() {
        let mut s = session(20.0);
        s.insert_segment::<ZoomParams>(0.0);
        s.insert_segment::<ZoomParams>(5.0);
        s.select(TrackKind::Zoom, 0, false);

        assert!(s.delete_segment(TrackKind::Zoom, 0));
        assert!(s.selection().is_empty());
    }

    #[test]
    fn selection_follows_segment_across_insert_and_split() {
        let mut s = session(20.0);
        s.insert_segment::<ZoomParams>(10.0);
        s.select(TrackKind::Zoom, 0, false);

        let index = s
            .insert_segment_with(2.0, 4.0, ZoomParams::default())
            .expect("insert");
        assert_eq!(index, 0);
        assert!(s.selection().is_selected(TrackKind::Zoom, 1));

        assert_eq!(s.split_segment(TrackKind::Zoom, 0, 4.0), Some(1));
        assert_eq!(s.selection().indices().collect::<Vec<_>>(), vec![2]);
        assert_eq!(s.delete_selection(), 1);
        assert_eq!(zoom_bounds(&s), vec![(2.0, 4.0), (4.0, 6.0)]);
    }

    #[test]
    fn clip_selection_follows_split() {
        let mut s = session(20.0);
        assert_eq!(s.split_clip_at_time(10.0), Some(1));
        s.select(TrackKind::Clip, 1, false);

        assert_eq!(s.split_clip(0, 0.5), Some(1));
        assert_eq!(s.selection().indices().collect::<Vec<_>>(), vec![2]);
        assert_eq!(s.timeline().clips[2].start, 10.0);
    }

    #[test]
    fn scene_segment_inserts_and_composes() {
        let mut s = session(10.0);
        let index = s.insert_segment::<SceneParams>(2.0).expect("scene");
        assert_eq!(s.timeline().scenes[index].end, 7.0);
        assert!(s.selection().is_selected(TrackKind::Scene, index));
        assert_eq!(s.compose_frame(4.0).scene.mode(), SceneMode::CameraOnly);

        assert!(s.delete_segment(TrackKind::Scene, index));
        assert_eq!(s.compose_frame(4.0).scene, SceneState::DEFAULT);
    }

    #[test]
    fn clear_animation_is_undoable() {
        let mut s = session(10.0);
        let mut params = MaskParams::default();
        params.keyframes.intensity = vec![Keyframe::linear(0.0, 0.3), Keyframe::linear(1.0, 1.0)];
        s.insert_segment_with(1.0, 3.0, params).expect("mask");

        assert!(!s.clear_animation(TrackKind::Clip, 0));
        assert!(s.clear_animation(TrackKind::Mask, 0));
        assert!(s.timeline().masks[0].params.keyframes.intensity.is_empty());
        assert!(!s.clear_animation(TrackKind::Mask, 0));

        assert!(s.undo());
        assert_eq!(s.timeline().masks[0].params.keyframes.intensity.len(), 2);
    }

    #[test]
    fn drag_move_commits_single_entry() {
        let mut s = session(10.0);
        s.insert_segment::<ZoomParams>(2.0);
        let undo_before = s.history().undo_count();

        let target = DragTarget::new(TrackKind::Zoom, 0);
        assert!(s.begin_drag(target, DragKind::Move, 100.0, 0.01));
        assert!(s.drag_to(150.0));
        assert!(s.drag_to(200.0));
        assert_eq!(zoom_bounds(&s), vec![(3.0, 6.0)]);
        assert_eq!(s.end_drag(200.0), DragOutcome::Committed);

        assert_eq!(s.history().undo_count(), undo_before + 1);
        assert_eq!(s.history().undo_label(), Some("Drag zoom"));
        assert!(s.undo());
        assert_eq!(zoom_bounds(&s), vec![(2.0, 5.0)]);
    }

    #[test]
    fn drag_reads_neighbours_fresh() {
        let mut s = session(10.0);
        s.insert_segment::<ZoomParams>(0.0);
        s.insert_segment::<ZoomParams>(6.0);
        let target = DragTarget::new(TrackKind::Zoom, 0);
        s.begin_drag(target, DragKind::Resize(Edge::End), 0.0, 0.1);
        s.drag_to(100.0);
        assert_eq!(zoom_bounds(&s)[0], (0.0, 6.0));
        s.end_drag(100.0);
    }

    #[test]
    fn small_drag_is_click() {
        let mut s = session(10.0);
        s.insert_segment::<ZoomParams>(2.0);
        s.clear_selection();
        let undo_before = s.history().undo_count();

        let target = DragTarget::new(TrackKind::Zoom, 0);
        s.begin_drag(target, DragKind::Move, 300.0, 0.01);
        assert!(!s.drag_to(301.0));
        match s.end_drag(301.0) {
            DragOutcome::Click { time } => assert!((time - 3.01).abs() < 1e-9),
            other => panic!("expected click, got {other:?}"),
        }
        assert_eq!(s.history().undo_count(), undo_before);
        assert!(s.selection().is_selected(TrackKind::Zoom, 0));
        assert!((s.playhead() - 3.01).abs() < 1e-9);
    }

    #[test]
    fn cancel_drag_restores() {
        let mut s = session(10.0);
        s.insert_segment::<ZoomParams>(2.0);
        let before = s.project().clone();
        s.begin_drag(DragTarget::new(TrackKind::Zoom, 0), DragKind::Move, 0.0, 0.1);
        s.drag_to(30.0);
        assert_ne!(s.project(), &before);
        assert_eq!(s.cancel_drag(), DragOutcome::Cancelled);
        assert_eq!(s.project(), &before);
        assert!(!s.history().is_paused());
        assert_eq!(s.history().undo_count(), 1);
    }

    #[test]
    fn clip_drag_resize_follows_timescale() {
        let mut s = session(20.0);
        s.set_clip_timescale(0, 2.0);
        s.resize_segment(TrackKind::Clip, 0, Edge::End, 10.0);
        let target = DragTarget::new(TrackKind::Clip, 0);
        assert!(!s.begin_drag(target, DragKind::Move, 0.0, 0.1));
        assert!(s.begin_drag(target, DragKind::Resize(Edge::End), 0.0, 0.1));
        s.drag_to(10.0);
        // One timeline second at 2x is two source seconds.
        assert_eq!(s.timeline().clips[0].end, 12.0);
        s.drag_to(1000.0);
        assert_eq!(s.timeline().clips[0].end, 20.0);
        s.end_drag(1000.0);
    }

    #[test]
    fn mask_geometry_policy() {
        let mut s = session(10.0);
        let mut params = MaskParams::default();
        params.keyframes.position = vec![
            Keyframe::linear(0.0, XY::new(0.1, 0.1)),
            Keyframe::linear(2.0, XY::new(0.9, 0.9)),
        ];
        s.insert_segment_with(1.0, 3.0, params).expect("insert");

        assert!(s.set_mask_geometry(0, XY::new(0.4, 0.4), XY::new(0.2, 0.2)));
        assert!(s.timeline().masks[0].params.keyframes.position.is_empty());
        assert_eq!(s.config().keyframe_edit_policy, KeyframeEditPolicy::BakeOut);
    }

    #[test]
    fn dispatch_commands() {
        let mut s = session(10.0);
        s.insert_segment::<ZoomParams>(1.0);
        assert!(s.dispatch(EditorCommand::DeleteSelection));
        assert!(s.timeline().zoom.is_empty());
        assert!(s.dispatch(EditorCommand::Undo));
        assert_eq!(s.timeline().zoom.len(), 1);
        assert!(s.dispatch(EditorCommand::Redo));

        assert!(s.dispatch(EditorCommand::Seek(4.0)));
        assert!((s.playhead() - 4.0).abs() < 1e-9);
        assert!(s.dispatch(EditorCommand::Play));
        assert!(!s.dispatch(EditorCommand::Play));
        assert!(s.dispatch(EditorCommand::Stop));
        assert!(!s.dispatch(EditorCommand::Stop));
    }

    #[test]
    fn command_json_shape() {
        let cmd: EditorCommand = serde_json::from_str(r#"{"seek":2.5}"#).expect("parse");
        assert_eq!(cmd, EditorCommand::Seek(2.5));
        let cmd: EditorCommand = serde_json::from_str(r#""togglePlayback""#).expect("parse");
        assert_eq!(cmd, EditorCommand::TogglePlayback);
    }

    #[test]
    fn compose_reflects_edits() {
        let mut s = session(10.0);
        s.insert_segment::<ZoomParams>(2.0);
        assert!(s.compose_frame(3.5).zoom.amount > 1.0);
        assert!(s.compose_frame(8.0).zoom.is_identity());
    }

    #[test]
    fn empty_timeline_rejected() {
        let mut file = ProjectFile::for_recording("Bad", RecordingRef(0), 10.0);
        file.project.timeline.clips.clear();
        let result = EditorSession::new(
            file,
            EditorConfig::default(),
            Arc::new(StaticRecordings::single(10.0)),
        );
        assert!(matches!(result, Err(SessionError::Timeline(_))));
    }

    #[test]
    fn unknown_recording_is_an_error() {
        let result = EditorSession::for_recording(
            "Missing",
            RecordingRef(3),
            EditorConfig::default(),
            Arc::new(StaticRecordings::single(10.0)),
        );
        assert!(matches!(result, Err(SessionError::Engine(EngineError::Recording(_)))));
    }

    #[test]
    fn autosave_after_debounce() {
        let store = Arc::new(MemoryStore::new());
        let mut s = session(10.0);
        s.attach_store(store.clone()).expect("attach");
        assert!(!s.poll_autosave());

        s.insert_segment::<ZoomParams>(1.0);
        let now = Instant::now();
        assert!(!s.poll_autosave_at(now));
        assert!(s.poll_autosave_at(now + std::time::Duration::from_secs(2)));
        assert!(!s.is_dirty());

        s.close().expect("close");
        let saved = store.latest().expect("saved");
        let loaded = from_json_string(&saved).expect("load");
        assert_eq!(loaded.project.timeline.zoom.len(), 1);
    }

    #[test]
    fn open_from_store() {
        let store = Arc::new(MemoryStore::new());
        let mut file = ProjectFile::for_recording("Stored", RecordingRef(0), 8.0);
        file.project.timeline.clips = vec![ClipSegment::new(0.0, 3.0), ClipSegment::new(5.0, 8.0)];
        store
            .save(&to_json_string(&file).expect("serialize"))
            .expect("save");

        let s = EditorSession::open(
            store,
            EditorConfig::default(),
            Arc::new(StaticRecordings::single(8.0)),
        )
        .expect("open");
        assert_eq!(s.total_duration(), 6.0);
        assert_eq!(s.file().name, "Stored");
    }

    #[test]
    fn open_empty_store_fails() {
        let result = EditorSession::open(
            Arc::new(MemoryStore::new()),
            EditorConfig::default(),
            Arc::new(StaticRecordings::single(8.0)),
        );
        assert!(matches!(result, Err(SessionError::NothingSaved)));
    }

    #[test]
    fn save_without_store_fails() {
        let mut s = session(10.0);
        assert!(matches!(
            s.save_now(),
            Err(SessionError::Project(ProjectError::SaverStopped))
        ));
    }
}
