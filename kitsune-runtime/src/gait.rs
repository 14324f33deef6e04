use crate::animation::ClipPlayback;
use crate::input::InputState;

/// Locomotion state of the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gait {
    Idle,
    Walk,
}

impl Gait {
    /// Walk while any movement key is held, otherwise idle.
    pub fn for_input(input: &InputState) -> Self {
        if input.any_held() {
            Gait::Walk
        } else {
            Gait::Idle
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gait::Idle => "idle",
            Gait::Walk => "walk",
        }
    }
}

/// Two-state idle/walk machine. Swaps clips only on a real transition and
/// never restarts the clip that is already active.
#[derive(Debug, Clone)]
pub struct GaitController {
    gait: Gait,
    idle_clip: usize,
    walk_clip: usize,
}

impl GaitController {
    /// Enter the gait matching `input` and start its clip.
    pub fn start(
        idle_clip: usize,
        walk_clip: usize,
        input: &InputState,
        playback: &mut impl ClipPlayback,
    ) -> Self {
        let controller = Self {
            gait: Gait::for_input(input),
            idle_clip,
            walk_clip,
        };
        playback.play(controller.active_clip());
        controller
    }

    pub fn gait(&self) -> Gait {
        self.gait
    }

    pub fn clip_for(&self, gait: Gait) -> usize {
        match gait {
            Gait::Idle => self.idle_clip,
            Gait::Walk => self.walk_clip,
        }
    }

    pub fn active_clip(&self) -> usize {
        self.clip_for(self.gait)
    }

    /// Re-evaluate against `input`. On a transition the old clip is stopped
    /// before the new one starts; returns the new gait. Returns `None` when
    /// the gait already matches.
    pub fn sync(&mut self, input: &InputState, playback: &mut impl ClipPlayback) -> Option<Gait> {
        let desired = Gait::for_input(input);
        if desired == self.gait {
            return None;
        }

        playback.stop(self.active_clip());
        self.gait = desired;
        playback.play(self.active_clip());
        log::debug!("gait -> {}", desired.as_str());
        Some(desired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Direction;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Play(usize),
        Stop(usize),
    }

    /// Records every play/stop in order.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl ClipPlayback for Recorder {
        fn play(&mut self, clip: usize) {
            self.calls.push(Call::Play(clip));
        }
        fn stop(&mut self, clip: usize) {
            self.calls.push(Call::Stop(clip));
        }
    }

    const IDLE: usize = 0;
    const WALK: usize = 1;

    fn held(directions: &[Direction]) -> InputState {
        let mut input = InputState::new();
        for &d in directions {
            input.set_key(d, true);
        }
        input
    }

    #[test]
    fn test_starts_idle_and_plays_idle_clip() {
        let mut rec = Recorder::default();
        let gait = GaitController::start(IDLE, WALK, &InputState::new(), &mut rec);
        assert_eq!(gait.gait(), Gait::Idle);
        assert_eq!(rec.calls, vec![Call::Play(IDLE)]);
    }

    #[test]
    fn test_starts_walking_when_keys_already_held() {
        let mut rec = Recorder::default();
        let gait = GaitController::start(IDLE, WALK, &held(&[Direction::Left]), &mut rec);
        assert_eq!(gait.gait(), Gait::Walk);
        assert_eq!(rec.calls, vec![Call::Play(WALK)]);
    }

    #[test]
    fn test_idle_to_walk_stops_then_plays() {
        let mut rec = Recorder::default();
        let mut gait = GaitController::start(IDLE, WALK, &InputState::new(), &mut rec);
        rec.calls.clear();

        let changed = gait.sync(&held(&[Direction::Forward]), &mut rec);
        assert_eq!(changed, Some(Gait::Walk));
        assert_eq!(rec.calls, vec![Call::Stop(IDLE), Call::Play(WALK)]);
    }

    #[test]
    fn test_walk_to_idle_stops_then_plays() {
        let mut rec = Recorder::default();
        let mut gait = GaitController::start(IDLE, WALK, &held(&[Direction::Right]), &mut rec);
        rec.calls.clear();

        assert_eq!(gait.sync(&InputState::new(), &mut rec), Some(Gait::Idle));
        assert_eq!(rec.calls, vec![Call::Stop(WALK), Call::Play(IDLE)]);
    }

    #[test]
    fn test_no_restart_while_state_unchanged() {
        let mut rec = Recorder::default();
        let mut gait = GaitController::start(IDLE, WALK, &InputState::new(), &mut rec);
        rec.calls.clear();

        // second key while already walking, then releasing one of two keys
        gait.sync(&held(&[Direction::Forward]), &mut rec);
        rec.calls.clear();
        assert_eq!(
            gait.sync(&held(&[Direction::Forward, Direction::Left]), &mut rec),
            None
        );
        assert_eq!(gait.sync(&held(&[Direction::Left]), &mut rec), None);
        assert!(gait.sync(&InputState::new(), &mut rec).is_some());
        assert_eq!(gait.sync(&InputState::new(), &mut rec), None);
        assert_eq!(rec.calls, vec![Call::Stop(WALK), Call::Play(IDLE)]);
    }

    #[test]
    fn test_clip_indices_are_configurable() {
        let mut rec = Recorder::default();
        let mut gait = GaitController::start(2, 5, &InputState::new(), &mut rec);
        gait.sync(&held(&[Direction::Backward]), &mut rec);
        assert_eq!(rec.calls, vec![Call::Play(2), Call::Stop(2), Call::Play(5)]);
        assert_eq!(gait.active_clip(), 5);
    }
}
