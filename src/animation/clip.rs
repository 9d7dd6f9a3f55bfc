//! Keyframed animation clips and CPU-side sampling.

use glam::{Quat, Vec3};

use crate::asset::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Linear,
    Step,
}

/// Keyframe values of one animated property
#[derive(Debug, Clone)]
pub enum Keyframes {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

impl Keyframes {
    pub fn len(&self) -> usize {
        match self {
            Keyframes::Translation(v) | Keyframes::Scale(v) => v.len(),
            Keyframes::Rotation(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One property track targeting one node
#[derive(Debug, Clone)]
pub struct Channel {
    pub node: usize,
    pub times: Vec<f32>,
    pub keyframes: Keyframes,
    pub interpolation: Interpolation,
}

/// Named set of channels sharing one timeline
///
/// Clips repeat: sampling at `t` past the end wraps to `t mod duration`.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    name: String,
    duration: f32,
    channels: Vec<Channel>,
}

impl AnimationClip {
    /// Duration is the last keyframe time across all channels
    pub fn new(name: impl Into<String>, channels: Vec<Channel>) -> Self {
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

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Maps accumulated playback time onto the clip timeline
    pub fn local_time(&self, elapsed: f32) -> f32 {
        if self.duration > 0.0 {
            elapsed.rem_euclid(self.duration)
        } else {
            0.0
        }
    }

    /// Overwrites the animated properties of `locals` at clip time `time`
    ///
    /// Channels targeting nodes outside `locals` are ignored.
    pub fn sample_into(&self, time: f32, locals: &mut [Transform]) {
        for channel in &self.channels {
            let Some(local) = locals.get_mut(channel.node) else {
                continue;
            };
            match &channel.keyframes {
                Keyframes::Translation(values) => {
                    if let Some(v) = sample_vec3(&channel.times, values, channel.interpolation, time) {
                        local.translation = v;
                    }
                }
                Keyframes::Rotation(values) => {
                    if let Some(q) = sample_quat(&channel.times, values, channel.interpolation, time) {
                        local.rotation = q;
                    }
                }
                Keyframes::Scale(values) => {
                    if let Some(v) = sample_vec3(&channel.times, values, channel.interpolation, time) {
                        local.scale = v;
                    }
                }
            }
        }
    }
}

/// Bracketing keyframes and blend factor for `t`
fn keyframe_span(times: &[f32], len: usize, t: f32) -> Option<(usize, usize, f32)> {
    let count = times.len().min(len);
    if count == 0 {
        return None;
    }
    if t <= times[0] {
        return Some((0, 0, 0.0));
    }
    let last = count - 1;
    if t >= times[last] {
        return Some((last, last, 0.0));
    }

    // first index whose time is > t; lies in 1..=last here
    let next = times[..count].partition_point(|&k| k <= t);
    let prev = next - 1;
    let span = times[next] - times[prev];
    let f = if span > 0.0 { (t - times[prev]) / span } else { 0.0 };
    Some((prev, next, f))
}

fn sample_vec3(times: &[f32], values: &[Vec3], mode: Interpolation, t: f32) -> Option<Vec3> {
    let (a, b, f) = keyframe_span(times, values.len(), t)?;
    Some(match mode {
        Interpolation::Step => values[a],
        Interpolation::Linear => values[a].lerp(values[b], f),
    })
}

fn sample_quat(times: &[f32], values: &[Quat], mode: Interpolation, t: f32) -> Option<Quat> {
    let (a, b, f) = keyframe_span(times, values.len(), t)?;
    Some(match mode {
        Interpolation::Step => values[a],
        Interpolation::Linear => values[a].slerp(values[b], f).normalize(),
    })
}
