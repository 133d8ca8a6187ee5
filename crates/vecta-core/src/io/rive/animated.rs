//! Keyframe tracks of one decoded object, keyed by property name.

use crate::math::{fuzzy_compare, lerp};
use crate::model::KeyframeTransition;
use crate::FrameTime;
use std::collections::HashMap;
use vecta_data::rive::RiveValue;

#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedKeyframe {
    pub time: FrameTime,
    pub value: Option<RiveValue>,
    /// Towards the next keyframe
    pub transition: KeyframeTransition,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimatedProperty {
    keyframes: Vec<AnimatedKeyframe>,
}

impl AnimatedProperty {
    pub fn push(&mut self, keyframe: AnimatedKeyframe) {
        let index = self.keyframes.partition_point(|kf| kf.time <= keyframe.time);
        self.keyframes.insert(index, keyframe);
    }

    pub fn keyframes(&self) -> &[AnimatedKeyframe] {
        &self.keyframes
    }

    fn at(&self, time: FrameTime) -> Option<&AnimatedKeyframe> {
        self.keyframes.iter().find(|kf| fuzzy_compare(kf.time, time))
    }

    /// Value of the track at `time`. Floats are interpolated between the
    /// surrounding keyframes, anything else holds.
    pub fn value_at(&self, time: FrameTime) -> Option<RiveValue> {
        if let Some(exact) = self.at(time) {
            return exact.value.clone();
        }
        let next = self.keyframes.partition_point(|kf| kf.time < time);
        if next == 0 {
            return self.keyframes.first()?.value.clone();
        }
        let before = &self.keyframes[next - 1];
        let Some(after) = self.keyframes.get(next) else {
            return before.value.clone();
        };
        match (&before.value, &after.value) {
            (Some(RiveValue::Float(a)), Some(RiveValue::Float(b))) => {
                let ratio = (time - before.time) / (after.time - before.time);
                let factor = before.transition.lerp_factor(ratio);
                Some(RiveValue::Float(lerp(f64::from(*a), f64::from(*b), factor) as f32))
            }
            (value, _) => value.clone(),
        }
    }
}

/// Values of several tracks sampled at one shared time.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedKeyframe {
    pub time: FrameTime,
    /// One entry per requested name; `None` when that property is static
    pub values: Vec<Option<RiveValue>>,
    pub transition: KeyframeTransition,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimatedProperties {
    pub properties: HashMap<&'static str, AnimatedProperty>,
}

impl AnimatedProperties {
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&AnimatedProperty> {
        self.properties.get(name)
    }

    /// Zips the tracks of `names` over the union of their keyframe times.
    pub fn joined(&self, names: &[&str]) -> Vec<JoinedKeyframe> {
        let tracks: Vec<Option<&AnimatedProperty>> = names.iter().map(|name| self.get(name)).collect();

        let mut times: Vec<FrameTime> = tracks
            .iter()
            .flatten()
            .flat_map(|track| track.keyframes.iter().map(|kf| kf.time))
            .collect();
        times.sort_by(|a, b| a.total_cmp(b));
        times.dedup_by(|a, b| fuzzy_compare(*a, *b));

        times
            .into_iter()
            .map(|time| {
                let transition = tracks
                    .iter()
                    .flatten()
                    .find_map(|track| track.at(time))
                    .map(|kf| kf.transition)
                    .unwrap_or_default();
                JoinedKeyframe {
                    time,
                    values: tracks
                        .iter()
                        .map(|track| track.and_then(|t| t.value_at(time)))
                        .collect(),
                    transition,
                }
            })
            .collect()
    }
}
