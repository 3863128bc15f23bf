#![forbid(unsafe_code)]

//! Spring-driven value interpolation.
//!
//! A [`Spring`] chases a target value with damped harmonic motion. The host
//! calls [`Spring::tick`] once per rendered frame with the elapsed wall time;
//! the spring integrates in fixed 1/60 s sub-steps and interpolates between
//! the last two sub-steps so that the output is smooth regardless of the host
//! frame rate.
//!
//! # Invariants
//!
//! 1. Integration uses a fixed step, so the same sequence of `tick` totals
//!    produces the same resting point independent of frame pacing.
//! 2. Once both speed and distance to target drop below
//!    [`SpringConfig::precision`], the spring snaps to the target and rests.
//!    A resting spring ignores ticks until the target changes.
//! 3. A single `tick` catches up at most [`MAX_CATCH_UP_FRAMES`] sub-steps;
//!    time beyond that is dropped (a stalled host does not cause a burst).
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use pagemaker_core::animation::Spring;
//!
//! let mut spring = Spring::new(0.0);
//! spring.set_target(40.0);
//! for _ in 0..120 {
//!     spring.tick(Duration::from_millis(16));
//! }
//! assert!(spring.is_resting());
//! assert_eq!(spring.value(), 40.0);
//! ```

use std::time::Duration;

/// Duration of one integration sub-step.
pub const FRAME: Duration = Duration::from_nanos(16_666_667);

/// Upper bound on sub-steps integrated per [`Spring::tick`].
pub const MAX_CATCH_UP_FRAMES: u32 = 10;

const SECONDS_PER_FRAME: f32 = 1.0 / 60.0;

// ---------------------------------------------------------------------------
// SpringConfig
// ---------------------------------------------------------------------------

/// Physical parameters of a [`Spring`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConfig {
    /// Spring constant `k`. Higher is snappier. Default: 170.
    pub stiffness: f32,
    /// Damping coefficient `b`. Higher settles with less overshoot. Default: 26.
    pub damping: f32,
    /// Rest threshold for both speed and distance to target. Default: 0.01.
    pub precision: f32,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::no_wobble()
    }
}

impl SpringConfig {
    /// Create a config with the given stiffness and damping.
    #[must_use]
    pub const fn new(stiffness: f32, damping: f32) -> Self {
        Self {
            stiffness,
            damping,
            precision: 0.01,
        }
    }

    /// Critically-damped-ish preset with no visible overshoot.
    #[must_use]
    pub const fn no_wobble() -> Self {
        Self::new(170.0, 26.0)
    }

    /// Slow, soft preset.
    #[must_use]
    pub const fn gentle() -> Self {
        Self::new(120.0, 14.0)
    }

    /// Bouncy preset with visible overshoot.
    #[must_use]
    pub const fn wobbly() -> Self {
        Self::new(180.0, 12.0)
    }

    /// Fast preset.
    #[must_use]
    pub const fn stiff() -> Self {
        Self::new(210.0, 20.0)
    }

    /// Look up a preset by name (`"no-wobble"`, `"gentle"`, `"wobbly"`, `"stiff"`).
    #[must_use]
    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "no-wobble" | "nowobble" | "no_wobble" | "default" => Some(Self::no_wobble()),
            "gentle" => Some(Self::gentle()),
            "wobbly" => Some(Self::wobbly()),
            "stiff" => Some(Self::stiff()),
            _ => None,
        }
    }

    /// Set the rest threshold.
    #[must_use]
    pub fn with_precision(mut self, precision: f32) -> Self {
        self.precision = precision.abs().max(f32::MIN_POSITIVE);
        self
    }
}

// ---------------------------------------------------------------------------
// Spring
// ---------------------------------------------------------------------------

/// Integrated spring state at a sub-step boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Ideal {
    position: f32,
    velocity: f32,
}

/// A value that follows its target with spring physics.
#[derive(Debug, Clone)]
pub struct Spring {
    config: SpringConfig,
    target: f32,
    ideal: Ideal,
    /// Time banked toward the next sub-step.
    accumulated: Duration,
    /// Interpolated output for the current frame.
    current: f32,
}

impl Spring {
    /// Create a spring resting at `initial`.
    #[must_use]
    pub fn new(initial: f32) -> Self {
        Self {
            config: SpringConfig::default(),
            target: initial,
            ideal: Ideal {
                position: initial,
                velocity: 0.0,
            },
            accumulated: Duration::ZERO,
            current: initial,
        }
    }

    /// Set the spring parameters.
    #[must_use]
    pub fn with_config(mut self, config: SpringConfig) -> Self {
        self.config = config;
        self
    }

    /// Current physical parameters.
    pub fn config(&self) -> SpringConfig {
        self.config
    }

    /// Retarget the spring. Velocity is preserved so retargeting mid-flight
    /// stays continuous.
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Destination the spring is moving toward.
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Jump to `value` and rest there.
    pub fn snap_to(&mut self, value: f32) {
        self.target = value;
        self.ideal = Ideal {
            position: value,
            velocity: 0.0,
        };
        self.accumulated = Duration::ZERO;
        self.current = value;
    }

    /// Current interpolated value.
    pub fn value(&self) -> f32 {
        self.current
    }

    /// Velocity at the last integrated sub-step, in units per second.
    pub fn velocity(&self) -> f32 {
        self.ideal.velocity
    }

    /// Whether the spring sits on its target with zero velocity.
    pub fn is_resting(&self) -> bool {
        self.ideal.velocity == 0.0 && self.ideal.position == self.target
    }

    /// Advance the spring by `dt` of wall time.
    pub fn tick(&mut self, dt: Duration) {
        if self.is_resting() {
            self.accumulated = Duration::ZERO;
            self.current = self.target;
            return;
        }

        let cap = FRAME * MAX_CATCH_UP_FRAMES;
        self.accumulated = self.accumulated.saturating_add(dt).min(cap);

        let frames = (self.accumulated.as_nanos() / FRAME.as_nanos()) as u32;
        for _ in 0..frames {
            self.ideal = self.step(self.ideal);
        }
        self.accumulated = self.accumulated.saturating_sub(FRAME * frames);

        if self.is_resting() {
            self.accumulated = Duration::ZERO;
            self.current = self.target;
            return;
        }

        let completion = self.accumulated.as_secs_f32() / FRAME.as_secs_f32();
        let next = self.step(self.ideal);
        self.current = self.ideal.position + (next.position - self.ideal.position) * completion;
    }

    /// One fixed-step semi-implicit Euler integration.
    fn step(&self, state: Ideal) -> Ideal {
        let spring_force = -self.config.stiffness * (state.position - self.target);
        let damper_force = -self.config.damping * state.velocity;
        let acceleration = spring_force + damper_force;

        let velocity = state.velocity + acceleration * SECONDS_PER_FRAME;
        let position = state.position + velocity * SECONDS_PER_FRAME;

        if velocity.abs() < self.config.precision
            && (position - self.target).abs() < self.config.precision
        {
            Ideal {
                position: self.target,
                velocity: 0.0,
            }
        } else {
            Ideal { position, velocity }
        }
    }
}

impl Default for Spring {
    fn default() -> Self {
        Self::new(0.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
