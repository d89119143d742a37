use bevy::math::Vec3;

/// Vertical field of view in degrees at a 16:9 aspect ratio.
pub const BASE_FOV_DEGREES: f32 = 10.0;
pub const REFERENCE_ASPECT: f32 = 16.0 / 9.0;
pub const CAMERA_NEAR: f32 = 1.0;
pub const CAMERA_FAR: f32 = 2000.0;

pub const INITIAL_CAMERA_POSITION: Vec3 = Vec3::new(-120.0, 250.0, 200.0);
pub const RESET_CAMERA_POSITION: Vec3 = Vec3::new(1000.0, 500.0, -600.0);
pub const RESET_CAMERA_DURATION_MS: u32 = 1000;

pub const TOP_DOWN_CAMERA_POSITION: Vec3 = Vec3::new(0.0, 600.0, 0.0);
pub const TOP_DOWN_DURATION_MS: u32 = 1500;

/// Animations finish immediately when the camera is already this close.
pub const ANIMATION_POSITION_TOLERANCE: f32 = 0.5;
pub const ANIMATION_ROTATION_TOLERANCE: f32 = 0.01;

// Orbit controls
pub const ORBIT_MIN_DISTANCE: f32 = 120.0;
pub const ORBIT_MAX_DISTANCE: f32 = 600.0;
pub const ORBIT_MIN_POLAR: f32 = 0.001;
pub const ORBIT_MAX_POLAR: f32 = std::f32::consts::FRAC_PI_2 - 0.1;
pub const ORBIT_DAMPING: f32 = 0.05;
pub const ORBIT_ROTATE_SPEED: f32 = 0.005;
pub const ORBIT_ZOOM_SPEED: f32 = 0.1;

/// Pointer travel in logical pixels below which a press/release is a click.
pub const CLICK_SLOP_PX: f32 = 6.0;
