use crate::events::{InputEvent, KeyCode};

/// Minimum useful selection size (in viewport pixels) on both axes.
///
/// Anything smaller is rejected on release rather than sent to OCR.
pub const SELECTION_MIN_SIZE: i32 = 60;

/// Axis-aligned rectangle in viewport (CSS) pixel units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    #[inline]
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Construct a normalized rectangle (bounding box) from two points.
    #[inline]
    pub fn from_points(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            left: x1.min(x2),
            top: y1.min(y2),
            width: span(x1, x2),
            height: span(y1, y2),
        }
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.left.saturating_add(self.width)
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.top.saturating_add(self.height)
    }

    /// True if both width and height are at least `min_size`.
    #[inline]
    pub fn is_valid_min_size(&self, min_size: i32) -> bool {
        self.width >= min_size && self.height >= min_size
    }
}

/// Distance between two coordinates, saturating at `i32::MAX`.
#[inline]
fn span(a: i32, b: i32) -> i32 {
    i32::try_from(a.abs_diff(b)).unwrap_or(i32::MAX)
}

/// Validate a selection rectangle against a minimum size.
#[inline]
pub fn validate_min_size(rect: Rect, min_size: i32) -> Option<Rect> {
    rect.is_valid_min_size(min_size).then_some(rect)
}

/// Why a selection session ended without a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The user pressed Escape (or the input source went away).
    Canceled,
    /// The released rectangle was below the minimum size.
    TooSmall,
}

impl CancelReason {
    pub fn message(&self) -> &'static str {
        match self {
            CancelReason::Canceled => "Selection canceled.",
            CancelReason::TooSmall => "Selection too small.",
        }
    }
}

/// Selection phase.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    /// Pointer is held down; `selection` spans the anchor and the last pointer position.
    Dragging {
        anchor: (i32, i32),
        selection: Rect,
    },
    /// Terminal: a valid rectangle was released.
    Resolved { selection: Rect },
    /// Terminal: the session ended without a usable rectangle.
    Cancelled { reason: CancelReason },
}

/// Input actions (pure).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PointerDown { x: i32, y: i32 },
    PointerMove { x: i32, y: i32 },
    PointerUp { x: i32, y: i32 },
    KeyDown { key: KeyCode },
    /// Host reset back to idle (next session).
    Reset,
}

impl From<InputEvent> for Action {
    fn from(event: InputEvent) -> Self {
        match event {
            InputEvent::PointerDown { x, y } => Action::PointerDown { x, y },
            InputEvent::PointerMove { x, y } => Action::PointerMove { x, y },
            InputEvent::PointerUp { x, y } => Action::PointerUp { x, y },
            InputEvent::KeyDown { key } => Action::KeyDown { key },
        }
    }
}

/// Effects requested by the model (executed by the host overlay).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Show the feedback rectangle (zero-size at the anchor on pointer-down).
    ShowFeedback { selection: Rect },
    /// Move/resize the feedback rectangle.
    UpdateFeedback { selection: Rect },
    /// The session resolved to a valid rectangle.
    Resolved { selection: Rect },
    /// The session ended without a rectangle.
    Cancelled { reason: CancelReason },
}

/// Selection state machine model.
#[derive(Debug)]
pub struct Model {
    phase: Phase,
    min_size: i32,
}

impl Default for Model {
    fn default() -> Self {
        Self::new(SELECTION_MIN_SIZE)
    }
}

impl Model {
    pub fn new(min_size: i32) -> Self {
        Self {
            phase: Phase::Idle,
            min_size,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn min_size(&self) -> i32 {
        self.min_size
    }

    /// True once the session has resolved or been cancelled.
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Resolved { .. } | Phase::Cancelled { .. })
    }

    /// Rectangle currently drawn by the overlay, if any.
    pub fn visible_selection(&self) -> Option<Rect> {
        match &self.phase {
            Phase::Dragging { selection, .. } => Some(*selection),
            _ => None,
        }
    }

    pub fn reduce(&mut self, action: Action) -> Vec<Effect> {
        // Terminal phases swallow everything except an explicit reset.
        if self.is_finished() && action != Action::Reset {
            return Vec::new();
        }

        match action {
            Action::Reset => {
                self.phase = Phase::Idle;
                Vec::new()
            }

            Action::KeyDown { key } => {
                if key != KeyCode::ESCAPE {
                    return Vec::new();
                }
                self.finish(CancelReason::Canceled)
            }

            Action::PointerDown { x, y } => {
                let selection = Rect::new(x, y, 0, 0);
                self.phase = Phase::Dragging {
                    anchor: (x, y),
                    selection,
                };
                vec![Effect::ShowFeedback { selection }]
            }

            Action::PointerMove { x, y } => {
                let Phase::Dragging { anchor, selection } = &mut self.phase else {
                    return Vec::new();
                };

                let updated = Rect::from_points(anchor.0, anchor.1, x, y);
                if updated == *selection {
                    return Vec::new();
                }
                *selection = updated;
                vec![Effect::UpdateFeedback { selection: updated }]
            }

            Action::PointerUp { x, y } => {
                let Phase::Dragging { anchor, .. } = self.phase else {
                    return Vec::new();
                };

                let released = Rect::from_points(anchor.0, anchor.1, x, y);
                match validate_min_size(released, self.min_size) {
                    Some(selection) => {
                        self.phase = Phase::Resolved { selection };
                        vec![Effect::Resolved { selection }]
                    }
                    None => self.finish(CancelReason::TooSmall),
                }
            }
        }
    }

    fn finish(&mut self, reason: CancelReason) -> Vec<Effect> {
        self.phase = Phase::Cancelled { reason };
        vec![Effect::Cancelled { reason }]
    }
}
