//! Page-scoped overlay state.
//!
//! A [`PageContext`] is created once per page (or per host window) and shared by everything
//! that may put a selection overlay on it. Acquiring the overlay yields an [`OverlayLease`];
//! dropping the lease is the teardown and makes the page available again.

use std::sync::Arc;

use parking_lot::Mutex;

/// Returned when a second overlay is requested while one is already active on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("A selection is already in progress on this page.")]
pub struct OverlayBusy;

#[derive(Debug, Default)]
struct PageState {
    overlay_active: bool,
    sessions: u64,
}

/// Shared per-page overlay state.
#[derive(Debug, Default)]
pub struct PageContext {
    state: Mutex<PageState>,
}

impl PageContext {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Claim the page overlay for one selection session.
    pub fn acquire_overlay(self: &Arc<Self>) -> Result<OverlayLease, OverlayBusy> {
        let mut state = self.state.lock();
        if state.overlay_active {
            return Err(OverlayBusy);
        }
        state.overlay_active = true;
        state.sessions += 1;

        Ok(OverlayLease {
            page: Arc::clone(self),
            session: state.sessions,
        })
    }

    pub fn is_overlay_active(&self) -> bool {
        self.state.lock().overlay_active
    }

    /// Number of sessions started on this page.
    pub fn sessions_started(&self) -> u64 {
        self.state.lock().sessions
    }
}

/// Exclusive claim on a page's overlay. Released on drop.
#[derive(Debug)]
pub struct OverlayLease {
    page: Arc<PageContext>,
    session: u64,
}

impl OverlayLease {
    /// 1-based session number on this page.
    pub fn session(&self) -> u64 {
        self.session
    }
}

impl Drop for OverlayLease {
    fn drop(&mut self) {
        self.page.state.lock().overlay_active = false;
    }
}
