//! # Animation — Frame Names Over Time
//!
//! Animated sprites are plain atlas sprites whose name changes over time.
//! An [`Animation`] describes a run of numbered frames; an [`AnimationPlayer`]
//! advances through it and produces the atlas key of the current frame:
//!
//! ```text
//!  base "player_walk", 4 frames, 0.1s each
//!
//!  t:     0.0        0.1        0.2        0.3        0.4
//!         │ _0001    │ _0002    │ _0003    │ _0004    │ _0001 (looping)
//! ```
//!
//! Keys are `"{base}_{index:04}"` with a 1-based index, which is what
//! TexturePacker emits for numbered frame sequences.
//!
//! The store writes the key into the sprite's `sprite_name` whenever the
//! frame changes (see [`VisualStore::advance_animations`]).
//!
//! [`VisualStore::advance_animations`]: crate::store::VisualStore::advance_animations

use serde::{Deserialize, Serialize};

/// A sequence of numbered atlas frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    /// Frame key prefix, e.g. `"player_walk"`.
    pub base: String,
    pub frame_count: u32,
    /// Seconds per frame.
    pub frame_duration: f32,
    pub looping: bool,
    /// Playback speed multiplier (1.0 = normal).
    pub speed: f32,
}

impl Animation {
    pub fn new(base: impl Into<String>, frame_count: u32, frame_duration: f32) -> Self {
        Self {
            base: base.into(),
            frame_count,
            frame_duration,
            looping: true,
            speed: 1.0,
        }
    }

    /// Stop on the last frame instead of wrapping (builder pattern).
    pub fn once(mut self) -> Self {
        self.looping = false;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Atlas key for a 0-based frame index.
    pub fn frame_name(&self, frame: u32) -> String {
        format!("{}_{:04}", self.base, frame + 1)
    }
}

/// Drives one [`Animation`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationPlayer {
    animation: Animation,
    /// Accumulated time within the current frame.
    timer: f32,
    /// 0-based.
    frame: u32,
    finished: bool,
    paused: bool,
}

impl AnimationPlayer {
    pub fn new(animation: Animation) -> Self {
        Self {
            animation,
            timer: 0.0,
            frame: 0,
            finished: false,
            paused: false,
        }
    }

    pub fn animation(&self) -> &Animation {
        &self.animation
    }

    /// Replace the animation and restart from the first frame.
    pub fn play(&mut self, animation: Animation) {
        self.animation = animation;
        self.restart();
    }

    pub fn restart(&mut self) {
        self.timer = 0.0;
        self.frame = 0;
        self.finished = false;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Set once a non-looping animation reaches its last frame.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 0-based index of the current frame.
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Atlas key of the current frame.
    pub fn frame_name(&self) -> String {
        self.animation.frame_name(self.frame)
    }

    /// Advance by `dt` seconds. Returns `true` when the frame changed.
    pub fn advance(&mut self, dt: f32) -> bool {
        let anim = &self.animation;
        if self.paused || self.finished || anim.frame_count == 0 || anim.frame_duration <= 0.0 {
            return false;
        }

        let start = self.frame;
        self.timer += dt * anim.speed;
        if !self.timer.is_finite() {
            self.timer = 0.0;
            return false;
        }
        if self.timer < anim.frame_duration {
            return false;
        }

        let steps = (f64::from(self.timer) / f64::from(anim.frame_duration)).floor();
        self.timer = self.timer.rem_euclid(anim.frame_duration);
        let next = f64::from(self.frame) + steps;
        let count = f64::from(anim.frame_count);
        if anim.looping {
            self.frame = (next % count) as u32;
        } else if next >= count {
            self.frame = anim.frame_count - 1;
            self.finished = true;
        } else {
            self.frame = next as u32;
        }

        self.frame != start
    }
}
