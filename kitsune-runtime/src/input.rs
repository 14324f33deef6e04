/// One of the four movement keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

impl Direction {
    /// Evaluation order used by the movement table.
    pub const ALL: [Direction; 4] = [
        Direction::Forward,
        Direction::Backward,
        Direction::Left,
        Direction::Right,
    ];

    /// Map a DOM `KeyboardEvent.key` name to a direction.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" => Some(Direction::Forward),
            "ArrowDown" => Some(Direction::Backward),
            "ArrowLeft" => Some(Direction::Left),
            "ArrowRight" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Which movement keys are currently held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press or release. Returns whether the state actually changed.
    pub fn set_key(&mut self, direction: Direction, pressed: bool) -> bool {
        let slot = match direction {
            Direction::Forward => &mut self.forward,
            Direction::Backward => &mut self.backward,
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
        };
        let changed = *slot != pressed;
        *slot = pressed;
        changed
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        match direction {
            Direction::Forward => self.forward,
            Direction::Backward => self.backward,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    pub fn any_held(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }

    /// Release every key (e.g., on focus loss). Returns whether anything was held.
    pub fn release_all(&mut self) -> bool {
        let was_held = self.any_held();
        *self = Self::default();
        was_held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrow_keys_map_to_directions() {
        assert_eq!(Direction::from_key("ArrowUp"), Some(Direction::Forward));
        assert_eq!(Direction::from_key("ArrowDown"), Some(Direction::Backward));
        assert_eq!(Direction::from_key("ArrowLeft"), Some(Direction::Left));
        assert_eq!(Direction::from_key("ArrowRight"), Some(Direction::Right));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        assert_eq!(Direction::from_key("w"), None);
        assert_eq!(Direction::from_key(""), None);
        assert_eq!(Direction::from_key("arrowup"), None);
    }

    #[test]
    fn test_set_key_reports_change_once() {
        let mut input = InputState::new();
        assert!(input.set_key(Direction::Left, true));
        assert!(!input.set_key(Direction::Left, true));
        assert!(input.left);
        assert!(input.set_key(Direction::Left, false));
        assert!(!input.set_key(Direction::Left, false));
        assert_eq!(input, InputState::default());
    }

    #[test]
    fn test_directions_are_independent() {
        let mut input = InputState::new();
        input.set_key(Direction::Forward, true);
        input.set_key(Direction::Right, true);
        assert!(input.is_held(Direction::Forward));
        assert!(input.is_held(Direction::Right));
        assert!(!input.is_held(Direction::Backward));
        assert!(!input.is_held(Direction::Left));

        input.set_key(Direction::Forward, false);
        assert!(input.any_held());
    }

    #[test]
    fn test_release_all() {
        let mut input = InputState::new();
        assert!(!input.release_all());
        for d in Direction::ALL {
            input.set_key(d, true);
        }
        assert!(input.release_all());
        assert!(!input.any_held());
    }
}
