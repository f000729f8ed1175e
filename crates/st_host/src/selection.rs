//! Drives one selection session: page overlay lease, input events, feedback drawing.

use std::sync::Arc;

use st_app::selection::{Effect, Model};
use st_app::{InputEvent, OverlayLease, PageContext, Rect};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::PipelineError;

/// Overlay drawn over the page while the user drags.
pub trait OverlaySurface: Send {
    /// Cover the viewport and start receiving input.
    fn attach(&mut self, session: u64);
    /// Draw the feedback rectangle at `selection`.
    fn draw(&mut self, selection: Rect);
    /// Remove the overlay.
    fn detach(&mut self);
}

/// Surface that only logs; for hosts without a visible overlay.
#[derive(Debug, Default)]
pub struct LogSurface {
    last: Option<Rect>,
}

impl LogSurface {
    pub fn last_drawn(&self) -> Option<Rect> {
        self.last
    }
}

impl OverlaySurface for LogSurface {
    fn attach(&mut self, session: u64) {
        debug!(session, "Overlay attached");
    }

    fn draw(&mut self, selection: Rect) {
        debug!(?selection, "Overlay feedback");
        self.last = Some(selection);
    }

    fn detach(&mut self) {
        debug!("Overlay detached");
    }
}

/// Attached surface plus the page lease; dropping it tears both down.
struct ActiveOverlay<'a, S: OverlaySurface> {
    surface: &'a mut S,
    _lease: OverlayLease,
}

impl<'a, S: OverlaySurface> ActiveOverlay<'a, S> {
    fn attach(lease: OverlayLease, surface: &'a mut S) -> Self {
        surface.attach(lease.session());
        Self {
            surface,
            _lease: lease,
        }
    }
}

impl<S: OverlaySurface> Drop for ActiveOverlay<'_, S> {
    fn drop(&mut self) {
        // Surface goes first; the lease field is released right after.
        self.surface.detach();
    }
}

/// Run a selection session until it resolves or is cancelled.
///
/// The overlay is detached and the page released on every exit path, including when
/// the returned future is dropped. A closed input channel counts as a cancel.
pub async fn run_selection<S: OverlaySurface>(
    page: &Arc<PageContext>,
    surface: &mut S,
    input: &mut mpsc::Receiver<InputEvent>,
    min_size: i32,
) -> Result<Rect, PipelineError> {
    let lease = page.acquire_overlay()?;
    let overlay = ActiveOverlay::attach(lease, surface);
    let mut model = Model::new(min_size);

    loop {
        let Some(event) = input.recv().await else {
            debug!("Input closed before the selection resolved");
            return Err(PipelineError::SelectionCancelled);
        };

        for effect in model.reduce(event.into()) {
            match effect {
                Effect::ShowFeedback { selection } | Effect::UpdateFeedback { selection } => {
                    overlay.surface.draw(selection);
                }
                Effect::Resolved { selection } => {
                    info!(
                        "Region selected: {}x{} at ({}, {})",
                        selection.width, selection.height, selection.left, selection.top
                    );
                    return Ok(selection);
                }
                Effect::Cancelled { reason } => {
                    info!("Selection ended: {}", reason.message());
                    return Err(reason.into());
                }
            }
        }
    }
}
