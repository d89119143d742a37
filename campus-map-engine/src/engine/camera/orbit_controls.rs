use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::input::touch::Touches;
use bevy::prelude::*;

use constants::camera::{
    ORBIT_DAMPING, ORBIT_MAX_DISTANCE, ORBIT_MAX_POLAR, ORBIT_MIN_DISTANCE, ORBIT_MIN_POLAR,
    ORBIT_ROTATE_SPEED, ORBIT_ZOOM_SPEED,
};

use super::animator::CameraAnimator;

/// The single perspective camera looking at the campus.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct MapCamera;

const SETTLE_EPSILON: f32 = 1e-4;

/// Damped orbit around `target`: rotate and zoom only, no panning.
/// Polar angle is measured from +Y and capped just above the horizon.
#[derive(Resource, Debug, Clone)]
pub struct OrbitControls {
    pub enabled: bool,
    pub target: Vec3,
    pub distance: f32,
    pub azimuth: f32,
    pub polar: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar: f32,
    pub max_polar: f32,
    pub damping: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    azimuth_velocity: f32,
    polar_velocity: f32,
    zoom_velocity: f32,
    moving: bool,
    settled: bool,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::from_pose(constants::camera::INITIAL_CAMERA_POSITION, Vec3::ZERO)
    }
}

impl OrbitControls {
    pub fn from_pose(position: Vec3, target: Vec3) -> Self {
        let mut controls = Self {
            enabled: true,
            target,
            distance: ORBIT_MIN_DISTANCE,
            azimuth: 0.0,
            polar: ORBIT_MAX_POLAR,
            min_distance: ORBIT_MIN_DISTANCE,
            max_distance: ORBIT_MAX_DISTANCE,
            min_polar: ORBIT_MIN_POLAR,
            max_polar: ORBIT_MAX_POLAR,
            damping: ORBIT_DAMPING,
            rotate_speed: ORBIT_ROTATE_SPEED,
            zoom_speed: ORBIT_ZOOM_SPEED,
            azimuth_velocity: 0.0,
            polar_velocity: 0.0,
            zoom_velocity: 0.0,
            moving: false,
            settled: false,
        };
        controls.sync_to_pose(position, target);
        controls
    }

    /// Re-derives the spherical state from an externally placed camera.
    /// Distance and polar angle are clamped to the control limits.
    pub fn sync_to_pose(&mut self, position: Vec3, target: Vec3) {
        let offset = position - target;
        let length = offset.length().max(f32::EPSILON);
        self.target = target;
        self.distance = length.clamp(self.min_distance, self.max_distance);
        self.polar = (offset.y / length)
            .clamp(-1.0, 1.0)
            .acos()
            .clamp(self.min_polar, self.max_polar);
        self.azimuth = offset.x.atan2(offset.z);
        self.stop();
    }

    /// `position` pulled along its direction from `target` into the distance limits.
    pub fn clamp_position(&self, position: Vec3, target: Vec3) -> Vec3 {
        let offset = position - target;
        let length = offset.length();
        if length <= f32::EPSILON {
            return position;
        }
        target + offset * (length.clamp(self.min_distance, self.max_distance) / length)
    }

    pub fn position(&self) -> Vec3 {
        let (sin_polar, cos_polar) = self.polar.sin_cos();
        let (sin_azimuth, cos_azimuth) = self.azimuth.sin_cos();
        self.target
            + self.distance * Vec3::new(sin_polar * sin_azimuth, cos_polar, sin_polar * cos_azimuth)
    }

    pub fn camera_transform(&self) -> Transform {
        Transform::from_translation(self.position()).looking_at(self.target, Vec3::Y)
    }

    /// Queues a rotation from a pointer drag in logical pixels.
    pub fn rotate(&mut self, drag: Vec2) {
        self.azimuth_velocity -= drag.x * self.rotate_speed;
        self.polar_velocity -= drag.y * self.rotate_speed;
    }

    /// Positive `amount` zooms in.
    pub fn zoom(&mut self, amount: f32) {
        self.zoom_velocity -= amount * self.zoom_speed;
    }

    pub fn stop(&mut self) {
        self.azimuth_velocity = 0.0;
        self.polar_velocity = 0.0;
        self.zoom_velocity = 0.0;
        self.moving = false;
    }

    /// Applies one damped step. Returns whether the camera moved.
    pub fn update(&mut self) -> bool {
        let active = self.azimuth_velocity.abs() > SETTLE_EPSILON
            || self.polar_velocity.abs() > SETTLE_EPSILON
            || self.zoom_velocity.abs() > SETTLE_EPSILON;

        if !active {
            if self.moving {
                self.stop();
                self.settled = true;
            }
            return false;
        }

        self.azimuth += self.azimuth_velocity * self.damping;
        self.polar =
            (self.polar + self.polar_velocity * self.damping).clamp(self.min_polar, self.max_polar);
        self.distance = (self.distance * (1.0 + self.zoom_velocity * self.damping))
            .clamp(self.min_distance, self.max_distance);

        let decay = 1.0 - self.damping;
        self.azimuth_velocity *= decay;
        self.polar_velocity *= decay;
        self.zoom_velocity *= decay;
        self.moving = true;
        true
    }

    /// True once after user-driven motion comes to rest.
    pub fn take_settled(&mut self) -> bool {
        std::mem::take(&mut self.settled)
    }
}

pub fn orbit_camera_controller(
    mut controls: ResMut<OrbitControls>,
    animator: Res<CameraAnimator>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    touches: Res<Touches>,
    mut camera: Query<&mut Transform, With<MapCamera>>,
) {
    let mouse_delta: Vec2 = mouse_motion.read().map(|motion| motion.delta).sum();
    let scroll: f32 = scroll_events
        .read()
        .map(|event| match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y * 0.05,
        })
        .sum();

    if !controls.enabled || animator.is_animating() {
        return;
    }

    if mouse_button.pressed(MouseButton::Left) && mouse_delta != Vec2::ZERO {
        controls.rotate(mouse_delta);
    }
    if scroll.abs() > f32::EPSILON {
        controls.zoom(scroll);
    }

    let active: Vec<_> = touches.iter().collect();
    match active.as_slice() {
        [touch] => controls.rotate(touch.delta()),
        [a, b] => {
            let current = a.position().distance(b.position());
            let previous = (a.position() - a.delta()).distance(b.position() - b.delta());
            if previous > f32::EPSILON {
                controls.zoom((current / previous - 1.0) * 10.0);
            }
        }
        _ => {}
    }

    if controls.update() {
        if let Ok(mut transform) = camera.single_mut() {
            *transform = controls.camera_transform();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn pose_round_trips_through_spherical_state() {
        let position = Vec3::new(-120.0, 250.0, 200.0);
        let controls = OrbitControls::from_pose(position, Vec3::ZERO);
        let back = controls.position();
        assert_relative_eq!(back.x, position.x, epsilon = 1e-2);
        assert_relative_eq!(back.y, position.y, epsilon = 1e-2);
        assert_relative_eq!(back.z, position.z, epsilon = 1e-2);
    }

    #[test]
    fn polar_angle_stays_above_horizon() {
        let mut controls = OrbitControls::default();
        controls.rotate(Vec2::new(0.0, -100_000.0));
        for _ in 0..200 {
            controls.update();
        }
        assert!(controls.polar <= controls.max_polar + f32::EPSILON);
        assert!(controls.position().y > 0.0);
    }

    #[test]
    fn zoom_is_clamped_to_distance_limits() {
        let mut controls = OrbitControls::default();
        controls.zoom(1_000.0);
        for _ in 0..500 {
            controls.update();
        }
        assert_relative_eq!(controls.distance, controls.min_distance);
    }

    #[test]
    fn far_pose_is_pulled_into_limits_without_a_jump() {
        let far = constants::camera::RESET_CAMERA_POSITION;
        let mut controls = OrbitControls::default();
        controls.sync_to_pose(far, Vec3::ZERO);
        assert_relative_eq!(controls.distance, controls.max_distance);

        let before = controls.position();
        controls.rotate(Vec2::new(1.0, 0.0));
        controls.update();
        assert!(before.distance(controls.position()) < 5.0);
    }

    #[test]
    fn clamp_position_keeps_direction() {
        let controls = OrbitControls::default();
        let far = Vec3::new(1000.0, 500.0, -600.0);
        let clamped = controls.clamp_position(far, Vec3::ZERO);
        assert_relative_eq!(clamped.length(), controls.max_distance, epsilon = 1e-3);
        assert!(clamped.normalize().distance(far.normalize()) < 1e-5);

        let near = Vec3::new(0.0, 200.0, 100.0);
        assert_eq!(controls.clamp_position(near, Vec3::ZERO), near);
    }

    #[test]
    fn motion_settles_once() {
        let mut controls = OrbitControls::default();
        controls.rotate(Vec2::new(10.0, 0.0));
        while controls.update() {}
        assert!(controls.take_settled());
        assert!(!controls.take_settled());
        assert!(!controls.update());
    }
}
