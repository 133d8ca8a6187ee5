//! Keyframed property values.

use super::traits::PropertyType;
use super::transition::KeyframeTransition;
use super::value::{Color, GradientStop, Value};
use crate::math::{self, bezier::Bezier};
use crate::FrameTime;
use glam::DVec2;
use kurbo::Size;

pub trait Interpolatable: Sized + Clone {
    fn lerp(&self, other: &Self, t: f64) -> Self;
}

impl Interpolatable for f64 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        math::lerp(*self, *other, t)
    }
}

impl Interpolatable for DVec2 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        DVec2::lerp(*self, *other, t)
    }
}

impl Interpolatable for Size {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Size::new(
            math::lerp(self.width, other.width, t),
            math::lerp(self.height, other.height, t),
        )
    }
}

impl Interpolatable for Color {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        let channel = |a: u8, b: u8| math::lerp(f64::from(a), f64::from(b), t).round().clamp(0.0, 255.0) as u8;
        Color::rgba(
            channel(self.r, other.r),
            channel(self.g, other.g),
            channel(self.b, other.b),
            channel(self.a, other.a),
        )
    }
}

impl Interpolatable for Bezier {
    /// Point-wise when both paths have the same number of points.
    fn lerp(&self, other: &Self, t: f64) -> Self {
        if self.len() != other.len() {
            return if t < 1.0 { self.clone() } else { other.clone() };
        }
        let mut result = self.clone();
        for (point, target) in result.points_mut().iter_mut().zip(other.points()) {
            point.pos = point.pos.lerp(target.pos, t);
            point.tan_in = point.tan_in.lerp(target.tan_in, t);
            point.tan_out = point.tan_out.lerp(target.tan_out, t);
        }
        result
    }
}

impl Interpolatable for Vec<GradientStop> {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        if self.len() != other.len() {
            return if t < 1.0 { self.clone() } else { other.clone() };
        }
        self.iter()
            .zip(other)
            .map(|(a, b)| GradientStop::new(math::lerp(a.offset, b.offset, t), a.color.lerp(&b.color, t)))
            .collect()
    }
}

impl Interpolatable for Value {
    /// Values of different or discrete types step at the end of the transition.
    fn lerp(&self, other: &Self, t: f64) -> Self {
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => Value::Float(math::lerp(*a, *b, t)),
            (Value::Int(a), Value::Int(b)) => {
                Value::Int(math::lerp(*a as f64, *b as f64, t).round() as i64)
            }
            (Value::Point(a), Value::Point(b)) => Value::Point(DVec2::lerp(*a, *b, t)),
            (Value::Size(a), Value::Size(b)) => Value::Size(Interpolatable::lerp(a, b, t)),
            (Value::Color(a), Value::Color(b)) => Value::Color(a.lerp(b, t)),
            (Value::Bezier(a), Value::Bezier(b)) => Value::Bezier(a.lerp(b, t)),
            (Value::Gradient(a), Value::Gradient(b)) => Value::Gradient(a.lerp(b, t)),
            _ if t < 1.0 => self.clone(),
            _ => other.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    time: FrameTime,
    value: Value,
    transition: KeyframeTransition,
}

impl Keyframe {
    pub fn time(&self) -> FrameTime {
        self.time
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Easing towards the next keyframe.
    pub fn transition(&self) -> &KeyframeTransition {
        &self.transition
    }

    pub fn set_transition(&mut self, transition: KeyframeTransition) -> &mut Self {
        self.transition = transition;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidTransitionKind {
    Invalid,
    SingleKeyframe,
    Middle,
}

/// Result of splitting the animation at an arbitrary time.
#[derive(Debug, Clone, PartialEq)]
pub struct MidTransition {
    pub kind: MidTransitionKind,
    pub value: Value,
    pub from_previous: KeyframeTransition,
    pub to_next: KeyframeTransition,
}

/// A value that is either static or driven by keyframes with ascending,
/// unique times.
#[derive(Debug, Clone, PartialEq)]
pub struct Animatable {
    value_type: PropertyType,
    value: Value,
    keyframes: Vec<Keyframe>,
    time: FrameTime,
}

impl Animatable {
    pub fn new(value_type: PropertyType, value: Value) -> Self {
        let value = value.coerce(value_type).unwrap_or(value);
        Self {
            value_type,
            value,
            keyframes: Vec::new(),
            time: 0.0,
        }
    }

    pub fn value_type(&self) -> PropertyType {
        self.value_type
    }

    /// Value at the current time.
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn time(&self) -> FrameTime {
        self.time
    }

    pub fn is_animated(&self) -> bool {
        !self.keyframes.is_empty()
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn keyframe_count(&self) -> usize {
        self.keyframes.len()
    }

    pub fn keyframe(&self, index: usize) -> Option<&Keyframe> {
        self.keyframes.get(index)
    }

    pub fn keyframe_mut(&mut self, index: usize) -> Option<&mut Keyframe> {
        self.keyframes.get_mut(index)
    }

    pub fn accepts(&self, value: &Value) -> bool {
        value.coerce(self.value_type).is_some()
    }

    /// Makes the property static, dropping every keyframe.
    pub fn set_value(&mut self, value: Value) -> bool {
        let Some(value) = value.coerce(self.value_type) else {
            return false;
        };
        self.keyframes.clear();
        self.value = value;
        true
    }

    /// Inserts a keyframe, or overwrites the one already at `time`.
    pub fn set_keyframe(&mut self, time: FrameTime, value: Value) -> Option<&mut Keyframe> {
        let value = value.coerce(self.value_type)?;
        let index = match self
            .keyframes
            .binary_search_by(|kf| kf.time.total_cmp(&time))
        {
            Ok(index) => {
                self.keyframes[index].value = value;
                index
            }
            Err(index) => {
                self.keyframes.insert(
                    index,
                    Keyframe {
                        time,
                        value,
                        transition: KeyframeTransition::default(),
                    },
                );
                index
            }
        };
        self.refresh();
        self.keyframes.get_mut(index)
    }

    pub fn set_transition(&mut self, index: usize, transition: KeyframeTransition) -> bool {
        let Some(keyframe) = self.keyframes.get_mut(index) else {
            return false;
        };
        keyframe.transition = transition;
        self.refresh();
        true
    }

    /// Removing the last keyframe keeps its value as the static one.
    pub fn remove_keyframe(&mut self, index: usize) -> Option<Keyframe> {
        if index >= self.keyframes.len() {
            return None;
        }
        let removed = self.keyframes.remove(index);
        if self.keyframes.is_empty() {
            self.value = removed.value.clone();
        } else {
            self.refresh();
        }
        Some(removed)
    }

    pub fn remove_keyframe_at_time(&mut self, time: FrameTime) -> Option<Keyframe> {
        let index = self
            .keyframes
            .binary_search_by(|kf| kf.time.total_cmp(&time))
            .ok()?;
        self.remove_keyframe(index)
    }

    /// Back to static, keeping the value at the current time.
    pub fn clear_keyframes(&mut self) {
        self.keyframes.clear();
    }

    /// Index of the last keyframe at or before `time`, 0 if `time` precedes
    /// them all.
    pub fn keyframe_index(&self, time: FrameTime) -> usize {
        self.keyframes
            .partition_point(|kf| kf.time <= time)
            .saturating_sub(1)
    }

    pub fn value_at(&self, time: FrameTime) -> Value {
        let Some(first) = self.keyframes.first() else {
            return self.value.clone();
        };

        let index = self.keyframes.partition_point(|kf| kf.time <= time);
        if index == 0 {
            return first.value.clone();
        }
        if index >= self.keyframes.len() {
            return self.keyframes[index - 1].value.clone();
        }

        let before = &self.keyframes[index - 1];
        let after = &self.keyframes[index];
        let ratio = math::unlerp(before.time, after.time, time);
        let t = before.transition.bezier_parameter(ratio);
        if let Some(boundary) = self.boundary_transition(index, t) {
            return boundary;
        }

        let (from_previous, to_next) = before.transition.split(ratio);
        MidTransition {
            kind: MidTransitionKind::Middle,
            value: before
                .value
                .lerp(&after.value, before.transition.lerp_factor(ratio)),
            from_previous,
            to_next,
        }
    }

    /// A curve parameter at either end of the segment starting at keyframe
    /// `index` lands on that end's keyframe instead of splitting the curve.
    fn boundary_transition(&self, index: usize, t: f64) -> Option<MidTransition> {
        let before = self.keyframes.get(index)?;
        let after = self.keyframes.get(index + 1)?;
        if t <= 0.0 {
            let from_previous = index
                .checked_sub(1)
                .and_then(|i| self.keyframes.get(i))
                .map(|kf| kf.transition)
                .unwrap_or_default();
            return Some(MidTransition {
                kind: MidTransitionKind::SingleKeyframe,
                value: before.value.clone(),
                from_previous,
                to_next: before.transition,
            });
        }
        if t >= 1.0 {
            return Some(MidTransition {
                kind: MidTransitionKind::SingleKeyframe,
                value: after.value.clone(),
                from_previous: before.transition,
                to_next: after.transition,
            });
        }
        None
    }

    /// Deep copy of another animatable of the same value type.
    pub fn assign_from(&mut self, other: &Animatable) -> bool {
        if other.value_type != self.value_type {
            return false;
        }
        self.keyframes.clear();
        if !other.is_animated() {
            return self.set_value(other.value.clone());
        }
        for keyframe in &other.keyframes {
            if let Some(kf) = self.set_keyframe(keyframe.time, keyframe.value.clone()) {
                kf.set_transition(keyframe.transition);
            }
        }
        self.refresh();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn float_at(anim: &Animatable, time: FrameTime) -> f64 {
        anim.value_at(time).as_f64().unwrap()
    }

    #[test]
    fn static_until_first_keyframe() {
        let mut anim = Animatable::new(PropertyType::Float, Value::Float(4.0));
        assert!(!anim.is_animated());
        assert_eq!(float_at(&anim, 100.0), 4.0);

        anim.set_keyframe(10.0, Value::Float(1.0));
        assert!(anim.is_animated());
        assert_eq!(anim.value(), &Value::Float(1.0));
    }

    #[test]
    fn keyframe_times_stay_sorted_and_unique() {
        let mut anim = Animatable::new(PropertyType::Float, Value::Float(0.0));
        for (i, time) in [30.0, 10.0, 20.0, 10.0, 0.0, 30.0, 15.0].into_iter().enumerate() {
            assert!(anim.set_keyframe(time, Value::Float(i as f64)).is_some());
        }
        let times: Vec<_> = anim.keyframes().iter().map(Keyframe::time).collect();
        assert_eq!(times, vec![0.0, 10.0, 15.0, 20.0, 30.0]);
        assert!(anim.keyframes().windows(2).all(|w| w[0].time() < w[1].time()));
        // Overwritten in place
        assert_eq!(anim.keyframe(1).unwrap().value(), &Value::Float(3.0));
        assert_eq!(anim.keyframe(4).unwrap().value(), &Value::Float(5.0));
    }

    #[test]
    fn rejects_wrong_type() {
        let mut anim = Animatable::new(PropertyType::Point, Value::Point(DVec2::ZERO));
        assert!(anim.set_keyframe(0.0, Value::from("nope")).is_none());
        assert!(!anim.set_value(Value::Bool(true)));
        assert!(!anim.is_animated());
    }

    #[test]
    fn interpolates_between_keyframes() {
        let mut anim = Animatable::new(PropertyType::Float, Value::Float(0.0));
        anim.set_keyframe(0.0, Value::Float(0.0));
        anim.set_keyframe(10.0, Value::Float(100.0));
        assert_eq!(float_at(&anim, -5.0), 0.0);
        assert_abs_diff_eq!(float_at(&anim, 2.5), 25.0, epsilon = 1e-9);
        assert_eq!(float_at(&anim, 50.0), 100.0);

        anim.set_transition(0, KeyframeTransition::hold());
        assert_eq!(float_at(&anim, 9.9), 0.0);
        assert_eq!(float_at(&anim, 10.0), 100.0);
    }

    #[test]
    fn colors_blend_per_channel() {
        let mut anim = Animatable::new(PropertyType::Color, Value::Color(Color::BLACK));
        anim.set_keyframe(0.0, Value::Color(Color::rgba(0, 0, 0, 255)));
        anim.set_keyframe(2.0, Value::Color(Color::rgba(200, 100, 50, 255)));
        assert_eq!(
            anim.value_at(1.0),
            Value::Color(Color::rgba(100, 50, 25, 255))
        );
    }

    #[test]
    fn removing_last_keyframe_goes_static() {
        let mut anim = Animatable::new(PropertyType::Float, Value::Float(0.0));
        anim.set_keyframe(5.0, Value::Float(7.0));
        assert!(anim.remove_keyframe_at_time(4.0).is_none());
        assert!(anim.remove_keyframe_at_time(5.0).is_some());
        assert!(!anim.is_animated());
        assert_eq!(anim.value(), &Value::Float(7.0));
    }

    #[test]
    fn mid_transition_preserves_curve() {
        let custom = KeyframeTransition::new(DVec2::new(0.6, 0.1), DVec2::new(0.3, 0.95));
        let mut original = Animatable::new(PropertyType::Float, Value::Float(0.0));
        original
            .set_keyframe(0.0, Value::Float(0.0))
            .unwrap()
            .set_transition(custom);
        original.set_keyframe(10.0, Value::Float(50.0));

        for split_time in [1.0, 3.5, 7.25, 9.0] {
            let mid = original.mid_transition(split_time);
            assert_eq!(mid.kind, MidTransitionKind::Middle);

            let mut split = original.clone();
            split.set_transition(0, mid.from_previous);
            split
                .set_keyframe(split_time, mid.value.clone())
                .unwrap()
                .set_transition(mid.to_next);

            for i in 0..=100 {
                let s = i as f64 / 10.0;
                assert_abs_diff_eq!(float_at(&split, s), float_at(&original, s), epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn mid_transition_on_keyframes() {
        let mut anim = Animatable::new(PropertyType::Float, Value::Float(0.0));
        assert_eq!(anim.mid_transition(3.0).kind, MidTransitionKind::Invalid);

        anim.set_keyframe(0.0, Value::Float(1.0));
        anim.set_keyframe(10.0, Value::Float(2.0));
        let mid = anim.mid_transition(0.0);
        assert_eq!(mid.kind, MidTransitionKind::SingleKeyframe);
        assert_eq!(mid.value, Value::Float(1.0));

        let mid = anim.mid_transition(12.0);
        assert_eq!(mid.kind, MidTransitionKind::SingleKeyframe);
        assert_eq!(mid.value, Value::Float(2.0));
    }

    #[test]
    fn curve_parameter_at_segment_end_lands_on_the_keyframe() {
        let mut anim = Animatable::new(PropertyType::Float, Value::Float(0.0));
        anim.set_keyframe(0.0, Value::Float(1.0)).unwrap().set_transition(KeyframeTransition::ease());
        anim.set_keyframe(10.0, Value::Float(2.0)).unwrap().set_transition(KeyframeTransition::hold());

        let end = anim.boundary_transition(0, 1.0).unwrap();
        assert_eq!(end.kind, MidTransitionKind::SingleKeyframe);
        assert_eq!(end.value, Value::Float(2.0));
        assert_eq!(end.from_previous, KeyframeTransition::ease());
        assert!(end.to_next.is_hold());

        let start = anim.boundary_transition(0, 0.0).unwrap();
        assert_eq!(start.value, Value::Float(1.0));
        assert_eq!(start.to_next, KeyframeTransition::ease());

        assert!(anim.boundary_transition(0, 0.5).is_none());
        assert!(anim.boundary_transition(1, 1.0).is_none());
    }

    #[test]
    fn assign_from_copies_by_value() {
        let mut source = Animatable::new(PropertyType::Float, Value::Float(0.0));
        source.set_keyframe(0.0, Value::Float(1.0)).unwrap().set_transition(KeyframeTransition::ease());
        source.set_keyframe(20.0, Value::Float(3.0));

        let mut copy = Animatable::new(PropertyType::Float, Value::Float(9.0));
        assert!(copy.assign_from(&source));
        assert_eq!(copy.keyframes(), source.keyframes());

        copy.set_keyframe(0.0, Value::Float(-1.0));
        copy.remove_keyframe(1);
        assert_eq!(source.keyframe_count(), 2);
        assert_eq!(source.keyframe(0).unwrap().value(), &Value::Float(1.0));

        let mut static_copy = Animatable::new(PropertyType::Float, Value::Float(0.0));
        let other = Animatable::new(PropertyType::Float, Value::Float(6.0));
        assert!(static_copy.assign_from(&other));
        assert_eq!(static_copy.value(), &Value::Float(6.0));

        let mut point = Animatable::new(PropertyType::Point, Value::Point(DVec2::ZERO));
        assert!(!point.assign_from(&source));
    }
}
