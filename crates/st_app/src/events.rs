/// Key identifier (virtual key code).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const ESCAPE: KeyCode = KeyCode(0x1B);
    pub const ENTER: KeyCode = KeyCode(0x0D);
    pub const TAB: KeyCode = KeyCode(0x09);
}

/// Platform-agnostic input event routed to the selection overlay.
///
/// Coordinates are viewport (CSS) pixels relative to the top-left corner of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Primary pointer pressed.
    PointerDown { x: i32, y: i32 },
    /// Pointer moved.
    PointerMove { x: i32, y: i32 },
    /// Primary pointer released.
    PointerUp { x: i32, y: i32 },
    /// Key pressed.
    KeyDown { key: KeyCode },
}
