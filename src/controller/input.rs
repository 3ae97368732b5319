use ahash::AHashSet;
use glam::Vec2;

/// Movement keys, named by what they do rather than where they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// Removes material.
    Primary,
    /// Places material.
    Secondary,
    /// Toggles pointer capture.
    Middle,
}

/// Keyboard and pointer state for the current frame.
pub trait Input {
    fn is_key_down(&self, key: Key) -> bool;
    fn is_button_down(&self, button: Button) -> bool;
    /// True only on the frame the button went down.
    fn is_button_pressed(&self, button: Button) -> bool;
    /// Pointer movement since the last frame.
    fn pointer_velocity(&self) -> Vec2;
    fn is_grabbed(&self) -> bool;
    fn set_grabbed(&mut self, grabbed: bool);
}

/// A plain [`Input`] snapshot, filled in by the host's event loop.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub keys: AHashSet<Key>,
    pub buttons: AHashSet<Button>,
    pub pressed: AHashSet<Button>,
    pub pointer_velocity: Vec2,
    pub grabbed: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, button: Button) {
        if self.buttons.insert(button) {
            self.pressed.insert(button);
        }
    }

    pub fn release(&mut self, button: Button) {
        self.buttons.remove(&button);
    }

    /// Clears per-frame state. Call once the frame has been processed.
    pub fn end_frame(&mut self) {
        self.pressed.clear();
        self.pointer_velocity = Vec2::ZERO;
    }
}

impl Input for InputState {
    fn is_key_down(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    fn is_button_down(&self, button: Button) -> bool {
        self.buttons.contains(&button)
    }

    fn is_button_pressed(&self, button: Button) -> bool {
        self.pressed.contains(&button)
    }

    fn pointer_velocity(&self) -> Vec2 {
        self.pointer_velocity
    }

    fn is_grabbed(&self) -> bool {
        self.grabbed
    }

    fn set_grabbed(&mut self, grabbed: bool) {
        self.grabbed = grabbed;
    }
}

#[test]
fn pressed_lasts_one_frame() {
    let mut input = InputState::new();
    input.press(Button::Middle);
    assert!(input.is_button_pressed(Button::Middle));
    assert!(input.is_button_down(Button::Middle));

    input.end_frame();
    assert!(!input.is_button_pressed(Button::Middle));
    assert!(input.is_button_down(Button::Middle));

    // Still held, so no new press
    input.press(Button::Middle);
    assert!(!input.is_button_pressed(Button::Middle));

    input.release(Button::Middle);
    assert!(!input.is_button_down(Button::Middle));
}
