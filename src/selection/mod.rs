//! Selection domain: one drag-selection across all displays.
//!
//! `SelectionMachine` owns at most one session. It is driven synchronously
//! by a serialized stream of pointer events in global coordinates, and
//! reports a finished rectangle or a cancellation exactly once per session.
//!
//! Render listeners are registered and unregistered explicitly by the host;
//! the machine never owns or reaches into renderer objects.
//!
//! Submodules:
//!   - surfaces.rs    : surface snapshot + per-surface clipping
//!   - cancellation.rs: escape signal shared with out-of-band key sources

pub mod cancellation;
pub mod surfaces;

pub use cancellation::{CancellationSource, EscapeSignal};
pub use surfaces::{SurfaceDescriptor, SurfaceEnumerator, SurfaceId, SurfaceRegistry, SurfaceView};

use crate::geometry::{rect_from_points, Global, Point, Rect};

/// Selections with a width or height at or below this (global units) are
/// treated as accidental clicks.
pub const MIN_SELECTION_SIZE: f64 = 5.0;

/// Observable state of the machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionState {
    /// No session.
    Idle,
    /// Session open, waiting for the pointer to go down.
    Armed,
    /// Anchor fixed, cursor tracking the pointer.
    Dragging,
    Completed(Rect<Global>),
    Cancelled,
}

impl SelectionState {
    fn name(&self) -> &'static str {
        match self {
            SelectionState::Idle => "idle",
            SelectionState::Armed => "armed",
            SelectionState::Dragging => "dragging",
            SelectionState::Completed(_) => "completed",
            SelectionState::Cancelled => "cancelled",
        }
    }
}

/// Integration errors raised synchronously to the host.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectionError {
    #[error("a selection session is already active")]
    AlreadyActive,
    #[error("cannot begin a selection without any display surfaces")]
    NoSurfaces,
    #[error("{operation} is not valid while the selection is {state}")]
    InvalidTransition {
        operation: &'static str,
        state: &'static str,
    },
}

/// What a pointer release did to the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerUpOutcome {
    /// The selection is final. Reported once per session.
    Completed(Rect<Global>),
    /// Too small to be intentional; the session is armed again.
    Reset,
    /// The session already ended; the release was dropped.
    Ignored,
}

/// Live selection broadcast to render listeners after every change.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionUpdate {
    /// Current selection in global space, `None` once it has been reset.
    pub selection: Option<Rect<Global>>,
    /// The selection clipped to each surface, in registration order.
    pub views: Vec<SurfaceView>,
}

/// Callbacks a host registers to follow the selection.
///
/// All methods default to no-ops so renderers only implement what they draw.
pub trait SelectionListener {
    fn selection_changed(&mut self, _update: &SelectionUpdate) {}
    fn selection_completed(&mut self, _rect: Rect<Global>) {}
    fn selection_cancelled(&mut self) {}
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Armed,
    Dragging {
        anchor: Point<Global>,
        cursor: Point<Global>,
    },
    Completed(Rect<Global>),
    Cancelled,
}

#[derive(Debug)]
struct Session {
    phase: Phase,
    surfaces: SurfaceRegistry,
}

impl Session {
    fn state(&self) -> SelectionState {
        match self.phase {
            Phase::Armed => SelectionState::Armed,
            Phase::Dragging { .. } => SelectionState::Dragging,
            Phase::Completed(rect) => SelectionState::Completed(rect),
            Phase::Cancelled => SelectionState::Cancelled,
        }
    }

    fn selection_rect(&self) -> Option<Rect<Global>> {
        match self.phase {
            Phase::Dragging { anchor, cursor } => Some(rect_from_points(anchor, cursor)),
            Phase::Completed(rect) => Some(rect),
            Phase::Armed | Phase::Cancelled => None,
        }
    }
}

/// The selection state machine.
///
/// Not `Sync`: callers serialize every call onto one event loop. The only
/// cross-thread entry is the `EscapeSignal` handed out by `escape_signal()`.
pub struct SelectionMachine {
    session: Option<Session>,
    listeners: Vec<(ListenerId, Box<dyn SelectionListener>)>,
    next_listener: u64,
    escape: EscapeSignal,
}

impl Default for SelectionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionMachine {
    pub fn new() -> Self {
        Self {
            session: None,
            listeners: Vec::new(),
            next_listener: 0,
            escape: EscapeSignal::new(),
        }
    }

    // ── Listeners ───────────────────────────────────────────────────

    pub fn subscribe(&mut self, listener: Box<dyn SelectionListener>) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Handle for out-of-band cancellation sources.
    pub fn escape_signal(&self) -> EscapeSignal {
        self.escape.clone()
    }

    /// Wire a platform cancellation source to this machine.
    pub fn attach_cancellation(&self, source: &mut dyn CancellationSource) {
        source.attach(self.escape_signal());
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn state(&self) -> SelectionState {
        self.session
            .as_ref()
            .map(Session::state)
            .unwrap_or(SelectionState::Idle)
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Anchor of the drag in progress.
    pub fn anchor(&self) -> Option<Point<Global>> {
        match self.session.as_ref()?.phase {
            Phase::Dragging { anchor, .. } => Some(anchor),
            _ => None,
        }
    }

    /// Cursor of the drag in progress.
    pub fn cursor(&self) -> Option<Point<Global>> {
        match self.session.as_ref()?.phase {
            Phase::Dragging { cursor, .. } => Some(cursor),
            _ => None,
        }
    }

    pub fn selection_rect(&self) -> Option<Rect<Global>> {
        self.session.as_ref()?.selection_rect()
    }

    pub fn surfaces(&self) -> Option<&SurfaceRegistry> {
        self.session.as_ref().map(|s| &s.surfaces)
    }

    // ── Transitions ─────────────────────────────────────────────────

    /// Open a session over a snapshot of `surfaces`.
    pub fn begin(&mut self, surfaces: Vec<SurfaceDescriptor>) -> Result<(), SelectionError> {
        if self.session.is_some() {
            return Err(SelectionError::AlreadyActive);
        }
        if surfaces.is_empty() {
            return Err(SelectionError::NoSurfaces);
        }
        // An escape raised before this session existed does not belong to it
        self.escape.take();
        log::debug!("[SELECTION] Session started over {} surface(s)", surfaces.len());
        self.session = Some(Session {
            phase: Phase::Armed,
            surfaces: SurfaceRegistry::new(surfaces),
        });
        Ok(())
    }

    /// Fix the anchor. Repeated presses while dragging are ignored.
    pub fn pointer_down(&mut self, at: Point<Global>) -> Result<(), SelectionError> {
        self.absorb_escape();
        let session = self.session_mut("pointer_down")?;
        match session.phase {
            Phase::Armed => {
                session.phase = Phase::Dragging {
                    anchor: at,
                    cursor: at,
                };
                log::debug!("[SELECTION] Anchor at ({:.1}, {:.1})", at.x, at.y);
            }
            Phase::Dragging { .. } => return Ok(()),
            Phase::Completed(_) | Phase::Cancelled => {
                log::debug!("[SELECTION] pointer_down after session ended, ignored");
                return Ok(());
            }
        }
        self.broadcast();
        Ok(())
    }

    /// Track the cursor and redraw every surface.
    pub fn pointer_move(&mut self, to: Point<Global>) -> Result<(), SelectionError> {
        self.absorb_escape();
        let session = self.session_mut("pointer_move")?;
        match &mut session.phase {
            Phase::Dragging { cursor, .. } => *cursor = to,
            Phase::Completed(_) | Phase::Cancelled => return Ok(()),
            Phase::Armed => {
                return Err(SelectionError::InvalidTransition {
                    operation: "pointer_move",
                    state: SelectionState::Armed.name(),
                })
            }
        }
        self.broadcast();
        Ok(())
    }

    /// Finish the drag.
    pub fn pointer_up(&mut self) -> Result<PointerUpOutcome, SelectionError> {
        self.absorb_escape();
        let session = self.session_mut("pointer_up")?;
        let rect = match session.phase {
            Phase::Dragging { anchor, cursor } => rect_from_points(anchor, cursor),
            Phase::Completed(_) | Phase::Cancelled => return Ok(PointerUpOutcome::Ignored),
            Phase::Armed => {
                return Err(SelectionError::InvalidTransition {
                    operation: "pointer_up",
                    state: SelectionState::Armed.name(),
                })
            }
        };

        if rect.width <= MIN_SELECTION_SIZE || rect.height <= MIN_SELECTION_SIZE {
            session.phase = Phase::Armed;
            log::debug!(
                "[SELECTION] {:.0}x{:.0} is below the minimum size, re-armed",
                rect.width,
                rect.height
            );
            self.broadcast();
            return Ok(PointerUpOutcome::Reset);
        }

        session.phase = Phase::Completed(rect);
        log::info!(
            "[SELECTION] Completed: {{x: {:.1}, y: {:.1}, w: {:.1}, h: {:.1}}}",
            rect.origin.x,
            rect.origin.y,
            rect.width,
            rect.height
        );
        for (_, listener) in self.listeners.iter_mut() {
            listener.selection_completed(rect);
        }
        Ok(PointerUpOutcome::Completed(rect))
    }

    /// Cancel the session. Returns true only for the call that cancelled it.
    pub fn cancel(&mut self) -> Result<bool, SelectionError> {
        self.escape.take();
        self.fire_cancel("cancel")
    }

    /// Same as `cancel`, for cancellations that arrive from a key channel.
    pub fn escape_requested(&mut self) -> Result<bool, SelectionError> {
        self.escape.take();
        self.fire_cancel("escape_requested")
    }

    /// Apply an escape raised through the `EscapeSignal` without waiting for
    /// a pointer event. Hosts call this on every event-loop tick.
    ///
    /// Returns true only when this call cancelled the session.
    pub fn poll_cancellation(&mut self) -> bool {
        self.absorb_escape()
    }

    /// Drop the session and its surfaces. Safe to call at any time.
    ///
    /// A pending escape on a live session is reported as a cancellation
    /// first. Returns the surface snapshot of the released session, if any,
    /// so the host can still pick a capture target after tearing the
    /// overlay down.
    pub fn teardown(&mut self) -> Option<SurfaceRegistry> {
        self.absorb_escape();
        let session = self.session.take()?;
        log::debug!("[SELECTION] Session torn down in state {}", session.state().name());
        Some(session.surfaces)
    }

    // ── Internals ───────────────────────────────────────────────────

    fn session_mut(&mut self, operation: &'static str) -> Result<&mut Session, SelectionError> {
        self.session
            .as_mut()
            .ok_or(SelectionError::InvalidTransition {
                operation,
                state: SelectionState::Idle.name(),
            })
    }

    fn fire_cancel(&mut self, operation: &'static str) -> Result<bool, SelectionError> {
        let session = self.session_mut(operation)?;
        match session.phase {
            Phase::Armed | Phase::Dragging { .. } => {
                session.phase = Phase::Cancelled;
            }
            Phase::Completed(_) | Phase::Cancelled => return Ok(false),
        }
        log::info!("[SELECTION] Cancelled via {}", operation);
        for (_, listener) in self.listeners.iter_mut() {
            listener.selection_cancelled();
        }
        Ok(true)
    }

    /// Apply an escape raised on another channel before handling an event.
    fn absorb_escape(&mut self) -> bool {
        if !self.escape.take() {
            return false;
        }
        let live = matches!(
            self.session.as_ref().map(|s| s.phase),
            Some(Phase::Armed | Phase::Dragging { .. })
        );
        live && self.fire_cancel("escape_signal").unwrap_or(false)
    }

    fn broadcast(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let selection = session.selection_rect();
        let views = match &selection {
            Some(rect) => session.surfaces.clip_all(rect),
            None => session
                .surfaces
                .iter()
                .map(|s| SurfaceView {
                    surface: s.id,
                    visible: None,
                })
                .collect(),
        };
        let update = SelectionUpdate { selection, views };
        for (_, listener) in self.listeners.iter_mut() {
            listener.selection_changed(&update);
        }
    }
}
