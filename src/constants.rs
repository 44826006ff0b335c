//! Default tuning values for creature behaviour.
//!
//! Every value here seeds a field of [`crate::config::BehaviourConfig`];
//! the config file overrides them per deployment.

/// Move speed used when the stats provider reports an unusable value.
pub const DEFAULT_MOVE_SPEED: f32 = 2.0;
/// Smallest move speed the locomotion primitive accepts.
pub const MIN_MOVE_SPEED: f32 = 0.1;
/// Upper bound on the speed multiplier handed to the locomotion primitive.
pub const MAX_SPEED_SCALE: f32 = 2.0;
/// Squared length below which a direction is treated as "no direction".
pub const DIRECTION_EPSILON: f32 = 1e-6;

/// Maximum yaw rate, degrees per second.
pub const TURN_RATE_DEGREES: f32 = 360.0;

/// Shortest pause between wander walks, in seconds.
pub const WANDER_MIN_WAIT: f32 = 1.0;
/// Longest pause between wander walks, in seconds.
pub const WANDER_MAX_WAIT: f32 = 3.0;
/// Shortest wander walk.
pub const WANDER_MIN_DISTANCE: f32 = 3.0;
/// Longest wander walk.
pub const WANDER_MAX_DISTANCE: f32 = 8.0;
/// Share of the move speed used while wandering.
pub const WANDER_SPEED_SCALE: f32 = 0.6;
/// Fixed duration of the turn performed before each walk, in seconds.
pub const WANDER_TURN_DURATION: f32 = 0.5;
/// Probe range for hazards along a heading.
pub const HAZARD_DETECTION_DISTANCE: f32 = 6.0;
/// Clearance required around the first waypoint candidate.
pub const WAYPOINT_SAFETY_RADIUS: f32 = 1.5;
/// Waypoint candidates tried along a requested direction.
pub const WAYPOINT_ATTEMPTS: usize = 10;
/// Length of the last-resort step tried when every waypoint candidate fails.
pub const WANDER_FALLBACK_STEP: f32 = 0.75;
/// Directions probed when a hazard is very close.
pub const ESCAPE_SAMPLES: usize = 8;
/// Directions probed by the safe-direction search, 30 degrees apart.
pub const SAFE_DIRECTION_SAMPLES: usize = 12;
/// Fraction of the detection distance a fallback direction must keep clear.
pub const SAFE_CLEARANCE_RATIO: f32 = 0.8;
/// Dot product above which a heading counts as "toward the protected zone".
pub const ZONE_DOT_THRESHOLD: f32 = 0.5;
/// Random spread applied to the away-from-zone heading.
pub const ZONE_JITTER_DEGREES: f32 = 45.0;
/// Extra walking time allowed beyond `distance / speed` before giving up.
pub const WALK_DURATION_SLACK: f32 = 1.5;

/// Distance a follower keeps behind its leader.
pub const FOLLOW_DISTANCE: f32 = 2.5;
/// Slack around the follow station.
pub const FOLLOW_POSITION_TOLERANCE: f32 = 0.5;
/// Speed multiplier when more than twice the follow distance away.
pub const FOLLOW_CATCH_UP_SCALE: f32 = 1.5;
/// Leader speed above which an on-station follower mirrors it.
pub const LEADER_MOVING_THRESHOLD: f32 = 0.1;

/// Neighbour query radius for separation.
pub const AVOIDANCE_QUERY_RADIUS: f32 = 3.0;
/// Neighbours closer than this repel.
pub const AVOIDANCE_DISTANCE: f32 = 1.5;
/// Cap on the repulsion weight; kept below one half so goal progress survives.
pub const AVOIDANCE_MAX_BLEND: f32 = 0.4;
/// Distance an overlapping agent is nudged apart on an otherwise idle tick.
pub const AVOIDANCE_OVERLAP_PUSH: f32 = 0.05;

/// Radius of the hostile sensing volume.
pub const HOSTILE_DETECTION_RADIUS: f32 = 6.0;
/// Chases of lost targets beyond this range are abandoned.
pub const GIVE_UP_RANGE: f32 = 15.0;
/// Speed multiplier while closing on a target.
pub const CHASE_SPEED_SCALE: f32 = 1.2;

/// Seconds between loot scans.
pub const LOOT_SCAN_INTERVAL: f32 = 0.5;
/// Loot scan radius.
pub const LOOT_DETECTION_RADIUS: f32 = 8.0;
/// Reach within which loot is claimed.
pub const LOOT_PICKUP_DISTANCE: f32 = 1.0;
/// Distance from the base at which carried loot is dropped.
pub const LOOT_DROP_DISTANCE: f32 = 1.5;
/// Pause after a delivery before scanning again.
pub const LOOT_PICKUP_COOLDOWN: f32 = 2.0;
/// Ground offset from the base at which dropped loot is placed.
pub const LOOT_DROP_OFFSET: [f32; 3] = [0.0, 0.0, 1.0];
