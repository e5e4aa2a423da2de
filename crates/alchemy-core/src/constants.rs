use glam::Vec3;

// Shared tuning constants for the interaction loop, the mixer and the particle field.

// Fixed tick rates
pub const INTERACTION_TICK_HZ: f32 = 30.0;
pub const REACTION_TICK_HZ: f32 = 20.0; // one decay step every 50 ms

// Interaction (normalized screen units)
pub const HIT_RADIUS: f32 = 0.06; // ~6% of the screen span
pub const GRAB_THRESHOLD: f32 = 0.8; // pinch strength needed to grab
pub const RELEASE_THRESHOLD: f32 = 0.5; // pinch strength below which a held element drops
pub const DROP_ZONE_CENTER: [f32; 2] = [0.5, 0.5];
pub const DROP_ZONE_RADIUS: f32 = 0.3;

// Pinch derivation from landmarks
pub const PINCH_DISTANCE: f32 = 0.05; // tips closer than this count as pinching
pub const PINCH_SATURATION_DISTANCE: f32 = 0.15; // strength reaches 0 at this separation

// Reaction timeline
pub const REACTION_DECAY_FACTOR: f32 = 0.9;
pub const REACTION_EPSILON: f32 = 0.05;
pub const COMPOSER_TIMEOUT_SEC: f32 = 10.0;

// Scene layout
pub const CAMERA_Z: f32 = 10.0;
pub const CAMERA_FOVY_DEG: f32 = 45.0;
pub const PARTICLE_COUNT: usize = 18_000;
pub const SPAWN_SPREAD: f32 = 1.5; // rest volume relative to the visible viewport
pub const SPAWN_DEPTH: f32 = 6.0;
pub const POINT_WORLD_SIZE: f32 = 0.06; // world-space quad diameter per unit of particle size

// Flow field
pub const FLOW_AMPLITUDE: f32 = 0.4;
pub const FLOW_DEPTH_AMPLITUDE: f32 = 0.2;
pub const REACTION_ACTIVE: f32 = 0.01;
pub const JITTER_SPATIAL_SCALE: f32 = 10.0;
pub const JITTER_TIME_SCALE: f32 = 20.0;

// Hand force field (world units)
pub const ATTRACT_THRESHOLD: f32 = 0.1; // pinch strength above which particles are pulled
pub const ATTRACT_RADIUS: f32 = 3.5;
pub const ATTRACT_BLEND: f32 = 0.6;
pub const REPEL_RADIUS: f32 = 2.0;
pub const SIZE_BOOST_RADIUS: f32 = 1.0;
pub const SIZE_BOOST: f32 = 1.5;
pub const PROXIMITY_RADIUS: f32 = 1.5;
pub const PROXIMITY_WHITEN: f32 = 0.3;
pub const HOT_TINT: [f32; 3] = [1.0, 0.8, 0.5];
pub const HOT_TINT_WEIGHT: f32 = 0.7;

// Per-frame smoothing, expressed at a 60 Hz reference frame
pub const SMOOTHING_REFERENCE_HZ: f32 = 60.0;
pub const HAND_SMOOTHING: f32 = 0.2;
pub const PROPERTY_SMOOTHING: f32 = 0.04;
pub const REACTION_SMOOTHING: f32 = 0.1;

// Trail and cursor
pub const TRAIL_CAPACITY: usize = 30;
pub const TRAIL_SCALE: f32 = 0.5;
pub const CURSOR_PINCH_SHRINK: f32 = 0.6;
pub const CURSOR_OUTER_SPIN: f32 = -0.05; // radians per reference frame
pub const CURSOR_INNER_SPIN: f32 = 0.03;
pub const CURSOR_OUTER_RADIUS: f32 = 0.425;
pub const CURSOR_INNER_RADIUS: f32 = 0.225;

// Render colors
pub const TRAIL_COLOR: [f32; 4] = [0.66, 0.33, 0.97, 0.3];
pub const CURSOR_OUTER_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 0.3];
pub const CURSOR_INNER_COLOR: [f32; 4] = [0.66, 0.33, 0.97, 0.6];

#[inline]
pub fn drop_zone_center() -> glam::Vec2 {
    glam::Vec2::from(DROP_ZONE_CENTER)
}

#[inline]
pub fn hot_tint() -> Vec3 {
    Vec3::from(HOT_TINT)
}
