//! Playback ticker: a background thread that composes the frame at the
//! playhead once per playback frame and hands it to a [`Renderer`].
//!
//! The ticker never mutates the project. Each tick takes the session's read
//! lock just long enough to compose, then submits outside the lock so edits
//! are never blocked on the renderer. When the playhead reaches the end of
//! the timeline the ticker stops playback itself and exits.
//!
//! Renderer failures are logged and queued; fetch them with
//! [`Player::take_errors`]. A failed frame does not stop playback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use rk_common::{RenderError, Renderer, TransportCommand};

use crate::error::{SessionError, SessionResult};
use crate::session::SharedSession;

/// Tick used when the configured frame rate gives no usable interval.
const FALLBACK_TICK: Duration = Duration::from_millis(33);

enum PlayerCommand {
    Stop,
}

pub struct Player {
    session: SharedSession,
    renderer: Arc<dyn Renderer>,
    cmd_tx: Option<Sender<PlayerCommand>>,
    error_rx: Receiver<RenderError>,
    handle: Option<JoinHandle<()>>,
    frames: Arc<AtomicU64>,
}

impl Player {
    /// Start playback on `session` and spawn the ticker thread.
    pub fn start(session: SharedSession, renderer: Arc<dyn Renderer>) -> SessionResult<Self> {
        let (start_frame, tick) = {
            let mut editor = session.write();
            editor.play();
            let fps = editor.config().playback_fps;
            let tick = Duration::try_from_secs_f64(fps.frame_duration()).unwrap_or(FALLBACK_TICK);
            (editor.playhead_frame(), tick)
        };

        let (cmd_tx, cmd_rx) = channel::unbounded();
        let (error_tx, error_rx) = channel::unbounded();
        let frames = Arc::new(AtomicU64::new(0));

        if let Err(e) = renderer.transport(TransportCommand::Play(start_frame)) {
            tracing::warn!(error = %e, "Renderer rejected play");
            let _ = error_tx.send(e);
        }

        let spawned = thread::Builder::new().name("playback-ticker".into()).spawn({
            let session = Arc::clone(&session);
            let renderer = Arc::clone(&renderer);
            let frames = Arc::clone(&frames);
            move || ticker_main(session, renderer, cmd_rx, error_tx, frames, tick)
        });
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                session.write().stop();
                return Err(SessionError::PlayerSpawn(e));
            }
        };

        tracing::info!(frame = start_frame.0, tick_ms = tick.as_millis() as u64, "Player started");
        Ok(Self {
            session,
            renderer,
            cmd_tx: Some(cmd_tx),
            error_rx,
            handle: Some(handle),
            frames,
        })
    }

    /// Whether the ticker thread is still running.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Frames successfully submitted so far.
    pub fn frames_rendered(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Renderer errors since the last call.
    pub fn take_errors(&self) -> Vec<RenderError> {
        self.error_rx.try_iter().collect()
    }

    /// Block until playback ends on its own (end of timeline, or the
    /// session was stopped elsewhere).
    pub fn wait(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Playback thread panicked");
            }
        }
        self.cmd_tx = None;
    }

    /// Stop the ticker and freeze the playhead. Idempotent.
    pub fn stop(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(PlayerCommand::Stop);
        }
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.join().is_err() {
            tracing::error!("Playback thread panicked");
        }

        let stopped = {
            let mut editor = self.session.write();
            editor.stop().then(|| editor.playhead_frame())
        };
        if let Some(frame) = stopped {
            if let Err(e) = self.renderer.transport(TransportCommand::Pause(frame)) {
                tracing::warn!(error = %e, "Renderer rejected pause");
            }
            tracing::info!(frame = frame.0, "Player stopped");
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.stop();
    }
}

fn ticker_main(
    session: SharedSession,
    renderer: Arc<dyn Renderer>,
    cmd_rx: Receiver<PlayerCommand>,
    error_tx: Sender<RenderError>,
    frames: Arc<AtomicU64>,
    tick: Duration,
) {
    loop {
        let (frame, finished) = {
            let editor = session.read();
            let playback = editor.playback();
            if !playback.is_playing() {
                tracing::debug!("Playback ticker: session stopped, exiting");
                return;
            }
            let now = Instant::now();
            let total = editor.total_duration();
            let time = playback.quantized_position(now, total, editor.config().playback_fps);
            (editor.compose_frame(time.as_secs()), playback.is_finished(now, total))
        };

        match renderer.submit(&frame) {
            Ok(()) => {
                frames.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::warn!(time = frame.time, error = %e, "Frame submission failed");
                let _ = error_tx.send(e);
            }
        }

        if finished {
            let end_frame = {
                let mut editor = session.write();
                editor.stop();
                editor.playhead_frame()
            };
            if let Err(e) = renderer.transport(TransportCommand::Pause(end_frame)) {
                let _ = error_tx.send(e);
            }
            tracing::info!(frame = end_frame.0, "Playback reached end of timeline");
            return;
        }

        match cmd_rx.recv_timeout(tick) {
            Ok(PlayerCommand::Stop) => {
                tracing::debug!("Playback ticker: stop requested");
                return;
            }
            Err(RecvTimeoutError::Disconnected) => {
                tracing::debug!("Playback ticker: command channel closed, exiting");
                return;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
}
