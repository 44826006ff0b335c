//! Tunable behaviour parameters.
//!
//! Each historical variant of the creature controller differed only in
//! these numbers, so they are data rather than code paths. Every field has a
//! default from [`crate::constants`]; a JSON file may override any subset.
use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;

/// Errors raised while loading or validating a [`BehaviourConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read behaviour config {path}: {source}")]
    Io {
        /// Path as given by the caller.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid JSON for this schema.
    #[error("failed to parse behaviour config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value parsed but cannot be used.
    #[error("invalid behaviour config field `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Short human-readable explanation.
        reason: &'static str,
    },
}

/// Turning limits shared by every handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Maximum yaw rate in degrees per second.
    pub turn_rate_degrees: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            turn_rate_degrees: TURN_RATE_DEGREES,
        }
    }
}

/// Pause, walk and hazard-search parameters of the wander cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WanderConfig {
    /// Shortest pause between walks, in seconds.
    pub min_wait: f32,
    /// Longest pause between walks, in seconds.
    pub max_wait: f32,
    /// Shortest walk length.
    pub min_distance: f32,
    /// Longest walk length.
    pub max_distance: f32,
    /// Fraction of the move speed used while wandering.
    pub speed_scale: f32,
    /// Seconds spent turning before each walk.
    pub turn_duration: f32,
    /// Range of the hazard probes along a heading.
    pub hazard_detection_distance: f32,
    /// Clearance demanded around the first waypoint candidate.
    pub safety_radius: f32,
    /// Candidates tried before the fallback step.
    pub waypoint_attempts: usize,
    /// Length of the last-resort short step.
    pub fallback_step: f32,
    /// Directions sampled when escaping a close hazard.
    pub escape_samples: usize,
    /// Directions sampled by the safe-direction search.
    pub safe_direction_samples: usize,
    /// Share of the detection distance a fallback direction must keep clear.
    pub safe_clearance_ratio: f32,
    /// Dot product above which a heading leads into the protected zone.
    pub zone_dot_threshold: f32,
    /// Half-width of the random turn applied when steering off the zone.
    pub zone_jitter_degrees: f32,
    /// Seconds a walk may overrun its planned duration.
    pub walk_duration_slack: f32,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            min_wait: WANDER_MIN_WAIT,
            max_wait: WANDER_MAX_WAIT,
            min_distance: WANDER_MIN_DISTANCE,
            max_distance: WANDER_MAX_DISTANCE,
            speed_scale: WANDER_SPEED_SCALE,
            turn_duration: WANDER_TURN_DURATION,
            hazard_detection_distance: HAZARD_DETECTION_DISTANCE,
            safety_radius: WAYPOINT_SAFETY_RADIUS,
            waypoint_attempts: WAYPOINT_ATTEMPTS,
            fallback_step: WANDER_FALLBACK_STEP,
            escape_samples: ESCAPE_SAMPLES,
            safe_direction_samples: SAFE_DIRECTION_SAMPLES,
            safe_clearance_ratio: SAFE_CLEARANCE_RATIO,
            zone_dot_threshold: ZONE_DOT_THRESHOLD,
            zone_jitter_degrees: ZONE_JITTER_DEGREES,
            walk_duration_slack: WALK_DURATION_SLACK,
        }
    }
}

/// Station keeping behind the leader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowConfig {
    /// Distance kept behind the leader.
    pub distance: f32,
    /// Distance from the station that counts as on station.
    pub position_tolerance: f32,
    /// Speed multiplier used when more than twice `distance` away.
    pub catch_up_scale: f32,
    /// Leader ground speed above which an on-station follower mirrors it.
    pub leader_moving_threshold: f32,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            distance: FOLLOW_DISTANCE,
            position_tolerance: FOLLOW_POSITION_TOLERANCE,
            catch_up_scale: FOLLOW_CATCH_UP_SCALE,
            leader_moving_threshold: LEADER_MOVING_THRESHOLD,
        }
    }
}

/// Separation from same-faction neighbours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvoidanceConfig {
    /// Radius of the neighbour query.
    pub query_radius: f32,
    /// Neighbours closer than this push the agent away.
    pub avoid_distance: f32,
    /// Cap on the share of the final direction taken by repulsion.
    pub max_blend_weight: f32,
    /// Nudge applied to stacked agents on idle ticks.
    pub overlap_push: f32,
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self {
            query_radius: AVOIDANCE_QUERY_RADIUS,
            avoid_distance: AVOIDANCE_DISTANCE,
            max_blend_weight: AVOIDANCE_MAX_BLEND,
            overlap_push: AVOIDANCE_OVERLAP_PUSH,
        }
    }
}

/// Hostile engagement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Radius of the hit volume used by scene-driven sensing.
    pub detection_radius: f32,
    /// A lost target further than this from its last known position is abandoned.
    pub give_up_range: f32,
    /// Speed multiplier while closing on a target.
    pub chase_speed_scale: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            detection_radius: HOSTILE_DETECTION_RADIUS,
            give_up_range: GIVE_UP_RANGE,
            chase_speed_scale: CHASE_SPEED_SCALE,
        }
    }
}

/// Loot scanning, pickup and delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LootConfig {
    /// Seconds between loot scans.
    pub scan_interval: f32,
    /// Radius of the loot scan.
    pub detection_radius: f32,
    /// Reach within which an item is claimed.
    pub pickup_distance: f32,
    /// Distance from the base at which carried loot is dropped.
    pub drop_distance: f32,
    /// Pause after a delivery before the next scan.
    pub pickup_cooldown: f32,
    /// Offset from the base where delivered loot lands.
    pub drop_offset: Vec3,
}

impl Default for LootConfig {
    fn default() -> Self {
        Self {
            scan_interval: LOOT_SCAN_INTERVAL,
            detection_radius: LOOT_DETECTION_RADIUS,
            pickup_distance: LOOT_PICKUP_DISTANCE,
            drop_distance: LOOT_DROP_DISTANCE,
            pickup_cooldown: LOOT_PICKUP_COOLDOWN,
            drop_offset: Vec3::from_array(LOOT_DROP_OFFSET),
        }
    }
}

/// Complete behaviour configuration for one controller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviourConfig {
    /// Turning limits.
    pub locomotion: LocomotionConfig,
    /// Wander cycle.
    pub wander: WanderConfig,
    /// Leader following.
    pub follow: FollowConfig,
    /// Neighbour separation.
    pub avoidance: AvoidanceConfig,
    /// Combat.
    pub combat: CombatConfig,
    /// Loot handling.
    pub loot: LootConfig,
}

fn positive(value: f32, field: &'static str) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: "must be a positive number",
        })
    }
}

fn ordered(min: f32, max: f32, field: &'static str) -> Result<(), ConfigError> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: "minimum exceeds maximum",
        })
    }
}

impl BehaviourConfig {
    /// Parses and validates a JSON document.
    ///
    /// # Examples
    /// ```
    /// use critter_ai::BehaviourConfig;
    /// let config = BehaviourConfig::from_json_str(r#"{ "follow": { "distance": 4.0 } }"#).unwrap();
    /// assert_eq!(config.follow.distance, 4.0);
    /// assert_eq!(config.wander, Default::default());
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = path.as_ref();
        let json = fs::read_to_string(file).map_err(|source| ConfigError::Io {
            path: file.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Rejects values the behaviour code cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive(self.locomotion.turn_rate_degrees, "locomotion.turn_rate_degrees")?;

        let wander = &self.wander;
        positive(wander.min_distance, "wander.min_distance")?;
        positive(wander.max_distance, "wander.max_distance")?;
        ordered(wander.min_distance, wander.max_distance, "wander.min_distance")?;
        ordered(wander.min_wait, wander.max_wait, "wander.min_wait")?;
        if wander.min_wait < 0.0 {
            return Err(ConfigError::Invalid {
                field: "wander.min_wait",
                reason: "must not be negative",
            });
        }
        positive(wander.speed_scale, "wander.speed_scale")?;
        positive(wander.turn_duration, "wander.turn_duration")?;
        positive(wander.hazard_detection_distance, "wander.hazard_detection_distance")?;
        positive(wander.safety_radius, "wander.safety_radius")?;
        positive(wander.fallback_step, "wander.fallback_step")?;
        if wander.waypoint_attempts < 2 {
            return Err(ConfigError::Invalid {
                field: "wander.waypoint_attempts",
                reason: "needs at least two attempts",
            });
        }
        if !(wander.zone_jitter_degrees.is_finite() && wander.zone_jitter_degrees >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "wander.zone_jitter_degrees",
                reason: "must be a non-negative number",
            });
        }
        if wander.escape_samples == 0 || wander.safe_direction_samples == 0 {
            return Err(ConfigError::Invalid {
                field: "wander.escape_samples",
                reason: "direction sampling needs at least one sample",
            });
        }

        positive(self.follow.distance, "follow.distance")?;
        positive(self.follow.position_tolerance, "follow.position_tolerance")?;

        let avoidance = &self.avoidance;
        positive(avoidance.avoid_distance, "avoidance.avoid_distance")?;
        ordered(
            avoidance.avoid_distance,
            avoidance.query_radius,
            "avoidance.avoid_distance",
        )?;
        if !(0.0..0.5).contains(&avoidance.max_blend_weight) {
            return Err(ConfigError::Invalid {
                field: "avoidance.max_blend_weight",
                reason: "must lie in [0, 0.5)",
            });
        }

        positive(self.combat.give_up_range, "combat.give_up_range")?;
        positive(self.combat.detection_radius, "combat.detection_radius")?;

        let loot = &self.loot;
        positive(loot.pickup_distance, "loot.pickup_distance")?;
        positive(loot.drop_distance, "loot.drop_distance")?;
        ordered(loot.pickup_distance, loot.detection_radius, "loot.pickup_distance")?;
        Ok(())
    }
}
