use foundation::math::Vec2;

/// Tooltip sits up and to the right of the cursor.
pub const TOOLTIP_OFFSET: Vec2 = Vec2 { x: 50.0, y: -50.0 };

/// Distinguishes a click from the end of a drag.
///
/// Any movement away from the press position turns the gesture into a drag.
/// Move events that report the press position again do not count.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PointerGesture {
    pressed_at: Option<Vec2>,
    moved: bool,
}

impl PointerGesture {
    pub fn down(&mut self, at: Vec2) {
        self.pressed_at = Some(at);
        self.moved = false;
    }

    pub fn moved(&mut self, at: Vec2) {
        if self.pressed_at.is_some_and(|p| p != at) {
            self.moved = true;
        }
    }

    /// `true` when this release completes a click.
    pub fn up(&mut self) -> bool {
        let click = self.pressed_at.is_some() && !self.moved;
        self.pressed_at = None;
        self.moved = false;
        click
    }

}

/// Last known pointer, relative to the canvas.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PointerState {
    /// Client coordinates.
    pub client: Vec2,
    /// Canvas bounding box at the time of the event.
    pub origin: Vec2,
    pub size: Vec2,
    pub inside: bool,
}

impl PointerState {
    pub fn local(&self) -> Vec2 {
        self.client - self.origin
    }

    pub fn tooltip_position(&self) -> Vec2 {
        self.local() + TOOLTIP_OFFSET
    }
}
