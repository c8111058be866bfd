use winit::keyboard::{Key, NamedKey};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ArrowKey {
    Up,
    Down,
    Left,
    Right,
}

impl ArrowKey {
    /// Matches DOM style key names, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "arrowup" => Some(Self::Up),
            "arrowdown" => Some(Self::Down),
            "arrowleft" => Some(Self::Left),
            "arrowright" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn from_winit(key: &Key) -> Option<Self> {
        match key {
            Key::Named(NamedKey::ArrowUp) => Some(Self::Up),
            Key::Named(NamedKey::ArrowDown) => Some(Self::Down),
            Key::Named(NamedKey::ArrowLeft) => Some(Self::Left),
            Key::Named(NamedKey::ArrowRight) => Some(Self::Right),
            Key::Character(s) => Self::from_name(s),
            _ => None,
        }
    }
}

/// Held-key state for the camera container. Each axis is -1, 0 or 1.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct AxisInput {
    pub vertical: f32,
    pub horizontal: f32,
}

impl AxisInput {
    pub fn key_down(&mut self, key: ArrowKey) {
        match key {
            ArrowKey::Up => self.vertical = 1.0,
            ArrowKey::Down => self.vertical = -1.0,
            ArrowKey::Left => self.horizontal = -1.0,
            ArrowKey::Right => self.horizontal = 1.0,
        }
    }

    // Releasing either key of an axis zeroes the whole axis.
    pub fn key_up(&mut self, key: ArrowKey) {
        match key {
            ArrowKey::Up | ArrowKey::Down => self.vertical = 0.0,
            ArrowKey::Left | ArrowKey::Right => self.horizontal = 0.0,
        }
    }

    pub fn handle(&mut self, key: ArrowKey, is_pressed: bool) {
        if is_pressed {
            self.key_down(key);
        } else {
            self.key_up(key);
        }
    }

    pub fn is_idle(&self) -> bool {
        self.vertical == 0.0 && self.horizontal == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(ArrowKey::from_name("ArrowUp"), Some(ArrowKey::Up));
        assert_eq!(ArrowKey::from_name("ARROWLEFT"), Some(ArrowKey::Left));
        assert_eq!(ArrowKey::from_name("w"), None);
    }

    #[test]
    fn press_and_release_each_arrow() {
        let mut axis = AxisInput::default();
        axis.key_down(ArrowKey::Up);
        assert_eq!(axis.vertical, 1.0);
        axis.key_up(ArrowKey::Up);
        assert_eq!(axis.vertical, 0.0);

        axis.key_down(ArrowKey::Down);
        assert_eq!(axis.vertical, -1.0);
        axis.key_up(ArrowKey::Down);
        assert_eq!(axis.vertical, 0.0);

        axis.key_down(ArrowKey::Left);
        assert_eq!(axis.horizontal, -1.0);
        axis.key_up(ArrowKey::Left);
        assert_eq!(axis.horizontal, 0.0);

        axis.key_down(ArrowKey::Right);
        assert_eq!(axis.horizontal, 1.0);
        axis.key_up(ArrowKey::Right);
        assert!(axis.is_idle());
    }

    #[test]
    fn releasing_opposite_key_clears_axis() {
        let mut axis = AxisInput::default();
        axis.key_down(ArrowKey::Up);
        axis.key_up(ArrowKey::Down);
        assert_eq!(axis.vertical, 0.0);
    }

    #[test]
    fn axes_are_independent() {
        let mut axis = AxisInput::default();
        axis.handle(ArrowKey::Up, true);
        axis.handle(ArrowKey::Right, true);
        axis.handle(ArrowKey::Right, false);
        assert_eq!(axis, AxisInput { vertical: 1.0, horizontal: 0.0 });
    }

    #[test]
    fn winit_named_keys() {
        assert_eq!(
            ArrowKey::from_winit(&Key::Named(NamedKey::ArrowDown)),
            Some(ArrowKey::Down)
        );
        assert_eq!(ArrowKey::from_winit(&Key::Named(NamedKey::Escape)), None);
    }
}
