use glam::{Quat, Vec3, Vec4};

use crate::transform::NodeTransform;

/// Keyframe interpolation mode of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    Linear,
    /// Values hold `[in_tangent, value, out_tangent]` triples per keyframe.
    CubicSpline,
}

/// Keyframe values for one animated property.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelValues {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationChannel {
    pub target_node: usize,
    pub interpolation: Interpolation,
    pub times: Vec<f32>,
    pub values: ChannelValues,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    /// Largest keyframe time over all channels.
    pub duration: f32,
    pub channels: Vec<AnimationChannel>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, channels: Vec<AnimationChannel>) -> Self {
        let duration = channels
            .iter()
            .filter_map(|c| c.times.last().copied())
            .fold(0.0f32, f32::max);
        Self {
            name: name.into(),
            duration,
            channels,
        }
    }

    /// Write this clip's values at `time` into `pose`. Nodes without a
    /// channel are left untouched.
    pub fn sample_into(&self, time: f32, pose: &mut [NodeTransform]) {
        for channel in &self.channels {
            let Some(target) = pose.get_mut(channel.target_node) else {
                continue;
            };
            let Some((i0, i1, t)) = find_keyframe_index(&channel.times, time) else {
                continue;
            };
            let dt = channel.times[i1] - channel.times[i0];

            match &channel.values {
                ChannelValues::Translation(values) => {
                    if let Some(v) = sample_vec3(values, channel.interpolation, i0, i1, t, dt) {
                        target.translation = v;
                    }
                }
                ChannelValues::Scale(values) => {
                    if let Some(v) = sample_vec3(values, channel.interpolation, i0, i1, t, dt) {
                        target.scale = v;
                    }
                }
                ChannelValues::Rotation(values) => {
                    if let Some(q) = sample_quat(values, channel.interpolation, i0, i1, t, dt) {
                        target.rotation = q;
                    }
                }
            }
        }
    }
}

/// Binary search for the keyframe interval containing `time`.
/// Returns (index0, index1, interpolation_factor) or None.
fn find_keyframe_index(times: &[f32], time: f32) -> Option<(usize, usize, f32)> {
    if times.is_empty() {
        return None;
    }
    if times.len() == 1 || time <= times[0] {
        return Some((0, 0, 0.0));
    }
    if time >= times[times.len() - 1] {
        let last = times.len() - 1;
        return Some((last, last, 0.0));
    }

    let mut lo = 0;
    let mut hi = times.len() - 1;
    while lo < hi - 1 {
        let mid = (lo + hi) / 2;
        if times[mid] <= time {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    let t0 = times[lo];
    let t1 = times[hi];
    let factor = if (t1 - t0).abs() < 1e-8 {
        0.0
    } else {
        (time - t0) / (t1 - t0)
    };

    Some((lo, hi, factor))
}

fn hermite(p0: Vec4, m0: Vec4, p1: Vec4, m1: Vec4, t: f32) -> Vec4 {
    let t2 = t * t;
    let t3 = t2 * t;
    p0 * (2.0 * t3 - 3.0 * t2 + 1.0)
        + m0 * (t3 - 2.0 * t2 + t)
        + p1 * (-2.0 * t3 + 3.0 * t2)
        + m1 * (t3 - t2)
}

fn sample_vec3(
    values: &[Vec3],
    mode: Interpolation,
    i0: usize,
    i1: usize,
    t: f32,
    dt: f32,
) -> Option<Vec3> {
    match mode {
        Interpolation::Step => values.get(i0).copied(),
        Interpolation::Linear => Some(values.get(i0)?.lerp(*values.get(i1)?, t)),
        Interpolation::CubicSpline => {
            let p0 = values.get(i0 * 3 + 1)?.extend(0.0);
            let m0 = values.get(i0 * 3 + 2)?.extend(0.0) * dt;
            let p1 = values.get(i1 * 3 + 1)?.extend(0.0);
            let m1 = values.get(i1 * 3)?.extend(0.0) * dt;
            Some(hermite(p0, m0, p1, m1, t).truncate())
        }
    }
}

fn sample_quat(
    values: &[Quat],
    mode: Interpolation,
    i0: usize,
    i1: usize,
    t: f32,
    dt: f32,
) -> Option<Quat> {
    match mode {
        Interpolation::Step => values.get(i0).copied(),
        Interpolation::Linear => Some(values.get(i0)?.slerp(*values.get(i1)?, t)),
        Interpolation::CubicSpline => {
            let p0 = Vec4::from(*values.get(i0 * 3 + 1)?);
            let m0 = Vec4::from(*values.get(i0 * 3 + 2)?) * dt;
            let p1 = Vec4::from(*values.get(i1 * 3 + 1)?);
            let m1 = Vec4::from(*values.get(i1 * 3)?) * dt;
            Some(Quat::from_vec4(hermite(p0, m0, p1, m1, t)).normalize())
        }
    }
}

/// Start/stop control over a set of clips, indexed by clip number.
pub trait ClipPlayback {
    /// Start `clip` from its beginning. No effect if it is already playing.
    fn play(&mut self, clip: usize);
    /// Stop `clip` immediately and rewind it.
    fn stop(&mut self, clip: usize);
}

/// Playback state of one clip inside a mixer.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipAction {
    pub time: f32,
    pub playing: bool,
    pub looping: bool,
    duration: f32,
}

/// Advances clip actions and blends nothing: every playing clip writes its
/// channels in index order, so later clips win on shared nodes.
#[derive(Debug, Clone)]
pub struct AnimationMixer {
    actions: Vec<ClipAction>,
    time_scale: f32,
}

impl AnimationMixer {
    pub fn new(clips: &[AnimationClip]) -> Self {
        Self {
            actions: clips
                .iter()
                .map(|clip| ClipAction {
                    time: 0.0,
                    playing: false,
                    looping: true,
                    duration: clip.duration,
                })
                .collect(),
            time_scale: 1.0,
        }
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn action(&self, clip: usize) -> Option<&ClipAction> {
        self.actions.get(clip)
    }

    pub fn is_playing(&self, clip: usize) -> bool {
        self.actions.get(clip).is_some_and(|a| a.playing)
    }

    pub fn playing_clips(&self) -> impl Iterator<Item = usize> + '_ {
        self.actions
            .iter()
            .enumerate()
            .filter(|(_, a)| a.playing)
            .map(|(i, _)| i)
    }

    /// Advance every playing action by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let step = dt.max(0.0) * self.time_scale;
        for action in self.actions.iter_mut().filter(|a| a.playing) {
            action.time += step;
            if action.duration <= 0.0 {
                action.time = 0.0;
            } else if action.time > action.duration {
                if action.looping {
                    action.time %= action.duration;
                } else {
                    action.time = action.duration;
                    action.playing = false;
                }
            }
        }
    }

    /// Sample every playing clip into `pose`.
    pub fn apply(&self, clips: &[AnimationClip], pose: &mut [NodeTransform]) {
        for (action, clip) in self.actions.iter().zip(clips) {
            if action.playing {
                clip.sample_into(action.time, pose);
            }
        }
    }
}

impl ClipPlayback for AnimationMixer {
    fn play(&mut self, clip: usize) {
        let Some(action) = self.actions.get_mut(clip) else {
            log::warn!("play: no clip at index {clip}");
            return;
        };
        if !action.playing {
            action.time = 0.0;
            action.playing = true;
        }
    }

    fn stop(&mut self, clip: usize) {
        if let Some(action) = self.actions.get_mut(clip) {
            action.playing = false;
            action.time = 0.0;
        }
    }
}
