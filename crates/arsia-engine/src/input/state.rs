use std::collections::HashSet;

use super::frame::InputFrame;
use super::types::{InputEvent, Key, KeyState, Modifiers};

/// Current input state of the window.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,
    pub focused: bool,
    /// Pointer position in physical pixels, `None` while outside the window.
    pub pointer_pos: Option<(f32, f32)>,
    pub keys_down: HashSet<Key>,
}

impl InputState {
    /// Applies an event to the held state and records transitions in `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match ev {
            InputEvent::Key { key, state, repeat } => match state {
                KeyState::Pressed => {
                    if self.keys_down.insert(key) && !repeat {
                        frame.keys_pressed.insert(key);
                    }
                }
                KeyState::Released => {
                    // A release without a matching press (e.g. key held while the
                    // window gained focus) is still reported.
                    self.keys_down.remove(&key);
                    frame.keys_released.insert(key);
                }
            },
            InputEvent::ModifiersChanged(m) => self.modifiers = m,
            InputEvent::Focused(f) => {
                self.focused = f;
                if !f {
                    self.keys_down.clear();
                    self.modifiers = Modifiers::default();
                }
            }
            InputEvent::PointerMoved { x, y } => self.pointer_pos = Some((x, y)),
            InputEvent::PointerLeft => self.pointer_pos = None,
        }

        frame.push_event(ev);
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, state: KeyState) -> InputEvent {
        InputEvent::Key { key, state, repeat: false }
    }

    #[test]
    fn press_then_release_records_both_transitions() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, key(Key::Escape, KeyState::Pressed));
        assert!(state.key_down(Key::Escape));
        assert!(frame.key_pressed(Key::Escape));

        state.apply_event(&mut frame, key(Key::Escape, KeyState::Released));
        assert!(!state.key_down(Key::Escape));
        assert!(frame.key_released(Key::Escape));
        assert_eq!(frame.events.len(), 2);
    }

    #[test]
    fn repeat_does_not_count_as_new_press() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, key(Key::W, KeyState::Pressed));
        frame.clear();

        state.apply_event(
            &mut frame,
            InputEvent::Key { key: Key::W, state: KeyState::Pressed, repeat: true },
        );
        assert!(state.key_down(Key::W));
        assert!(!frame.key_pressed(Key::W));
    }

    #[test]
    fn unmatched_release_is_reported() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, key(Key::Escape, KeyState::Released));
        assert!(frame.key_released(Key::Escape));
    }

    #[test]
    fn focus_loss_clears_held_keys() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, InputEvent::Focused(true));
        state.apply_event(&mut frame, key(Key::A, KeyState::Pressed));
        state.apply_event(
            &mut frame,
            InputEvent::ModifiersChanged(Modifiers { shift: true, ..Default::default() }),
        );

        state.apply_event(&mut frame, InputEvent::Focused(false));
        assert!(!state.focused);
        assert!(state.keys_down.is_empty());
        assert!(!state.modifiers.any());
    }

    #[test]
    fn pointer_tracks_position_and_leave() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 3.0, y: 4.0 });
        assert_eq!(state.pointer_pos, Some((3.0, 4.0)));
        state.apply_event(&mut frame, InputEvent::PointerLeft);
        assert_eq!(state.pointer_pos, None);
    }

    #[test]
    fn clear_resets_frame_only() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, key(Key::Space, KeyState::Pressed));
        frame.clear();
        assert!(frame.events.is_empty());
        assert!(!frame.key_pressed(Key::Space));
        assert!(state.key_down(Key::Space));
    }
}
