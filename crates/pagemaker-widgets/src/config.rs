#![forbid(unsafe_code)]

//! Behavior knobs shared by every [`Draggable`](crate::draggable::Draggable).
//!
//! # Env Var Contract
//!
//! [`DraggableConfig::from_env`] reads:
//!
//! - `PAGEMAKER_LEAVE_RESET_MS` - delay before margins reset after a drag-leave
//! - `PAGEMAKER_MOTION` - `off`/`false`/`0` disables the gap animation globally
//! - `PAGEMAKER_SPRING` - spring preset: `no-wobble`, `gentle`, `wobbly`, `stiff`
//!
//! Invalid values fail open: the default is kept and a warning is logged.

use std::env;
use std::time::Duration;

use pagemaker_core::animation::SpringConfig;
use pagemaker_core::event::DropEffects;

/// Default delay between a drag-leave and the margin reset.
pub const DEFAULT_LEAVE_RESET_DELAY: Duration = Duration::from_millis(250);

const ENV_LEAVE_RESET_MS: &str = "PAGEMAKER_LEAVE_RESET_MS";
const ENV_MOTION: &str = "PAGEMAKER_MOTION";
const ENV_SPRING: &str = "PAGEMAKER_SPRING";

/// Configuration for draggable elements.
#[derive(Clone, Debug, PartialEq)]
pub struct DraggableConfig {
    /// Delay before animated margins reset after the pointer leaves
    /// (default: 250ms). Long enough to ride out leave/over pairs fired
    /// while crossing child boundaries.
    pub leave_reset_delay: Duration,
    /// Global motion switch, combined with each element's `enable_motion`
    /// prop (default: true).
    pub motion: bool,
    /// Spring used for the gap animation (default: no-wobble).
    pub spring: SpringConfig,
    /// `effectAllowed` written at drag start (default: copy).
    pub effect_allowed: DropEffects,
}

impl Default for DraggableConfig {
    fn default() -> Self {
        Self {
            leave_reset_delay: DEFAULT_LEAVE_RESET_DELAY,
            motion: true,
            spring: SpringConfig::default(),
            effect_allowed: DropEffects::COPY,
        }
    }
}

impl DraggableConfig {
    /// Set the leave reset delay.
    #[must_use]
    pub fn with_leave_reset_delay(mut self, delay: Duration) -> Self {
        self.leave_reset_delay = delay;
        self
    }

    /// Disable the gap animation for every element.
    #[must_use]
    pub fn without_motion(mut self) -> Self {
        self.motion = false;
        self
    }

    /// Set the spring parameters.
    #[must_use]
    pub fn with_spring(mut self, spring: SpringConfig) -> Self {
        self.spring = spring;
        self
    }

    /// Set the allowed drop effects.
    #[must_use]
    pub fn with_effect_allowed(mut self, effects: DropEffects) -> Self {
        self.effect_allowed = effects;
        self
    }

    /// Build from process environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, starting from the defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_LEAVE_RESET_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.leave_reset_delay = Duration::from_millis(ms),
                Err(_) => {
                    pagemaker_core::warn!(var = ENV_LEAVE_RESET_MS, value = %raw, "ignoring invalid value");
                }
            }
        }

        if let Some(raw) = lookup(ENV_MOTION) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "0" | "false" | "off" | "no" => config.motion = false,
                "1" | "true" | "on" | "yes" => config.motion = true,
                _ => {
                    pagemaker_core::warn!(var = ENV_MOTION, value = %raw, "ignoring invalid value");
                }
            }
        }

        if let Some(raw) = lookup(ENV_SPRING) {
            match SpringConfig::preset(&raw) {
                Some(spring) => config.spring = spring,
                None => {
                    pagemaker_core::warn!(var = ENV_SPRING, value = %raw, "unknown spring preset");
                }
            }
        }

        config
    }
}
