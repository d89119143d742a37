use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use bevy::prelude::*;

use constants::camera::{
    ANIMATION_POSITION_TOLERANCE, ANIMATION_ROTATION_TOLERANCE, TOP_DOWN_CAMERA_POSITION,
};

/// Camera position and orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl CameraPose {
    pub fn looking_at(translation: Vec3, focus: Vec3, up: Vec3) -> Self {
        let transform = Transform::from_translation(translation).looking_at(focus, up);
        Self {
            translation,
            rotation: transform.rotation,
        }
    }

    /// Straight down onto the origin with -Z at the top of the screen.
    pub fn top_down() -> Self {
        Self::looking_at(TOP_DOWN_CAMERA_POSITION, Vec3::ZERO, Vec3::NEG_Z)
    }

    pub fn within_tolerance(&self, other: &CameraPose) -> bool {
        self.translation.distance(other.translation) <= ANIMATION_POSITION_TOLERANCE
            && self.rotation.angle_between(other.rotation) <= ANIMATION_ROTATION_TOLERANCE
    }
}

impl From<&Transform> for CameraPose {
    fn from(transform: &Transform) -> Self {
        Self {
            translation: transform.translation,
            rotation: transform.rotation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    InOutCubic,
    InOutQuad,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Self::InOutCubic => ease_in_out_cubic(t),
            Self::InOutQuad => ease_in_out_quad(t),
        }
    }
}

pub fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

pub fn ease_in_out_quad(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Where an animation ends and what the orbit controls look at afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationTarget {
    pub pose: CameraPose,
    pub focus: Vec3,
    pub easing: Easing,
}

impl AnimationTarget {
    pub fn top_down() -> Self {
        Self {
            pose: CameraPose::top_down(),
            focus: Vec3::ZERO,
            easing: Easing::InOutCubic,
        }
    }

    pub fn overview(position: Vec3) -> Self {
        Self {
            pose: CameraPose::looking_at(position, Vec3::ZERO, Vec3::Y),
            focus: Vec3::ZERO,
            easing: Easing::InOutQuad,
        }
    }
}

const PENDING: u8 = 0;
const FINISHED: u8 = 1;
const CANCELLED: u8 = 2;

/// Shared completion signal handed to every caller of an animation request.
#[derive(Debug, Clone)]
pub struct AnimationCompletion {
    id: u64,
    state: Arc<AtomicU8>,
}

impl AnimationCompletion {
    fn pending(id: u64) -> Self {
        Self {
            id,
            state: Arc::new(AtomicU8::new(PENDING)),
        }
    }

    fn finished(id: u64) -> Self {
        Self {
            id,
            state: Arc::new(AtomicU8::new(FINISHED)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_done(&self) -> bool {
        self.state.load(Ordering::Acquire) != PENDING
    }

    pub fn is_finished(&self) -> bool {
        self.state.load(Ordering::Acquire) == FINISHED
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED
    }

    pub fn same_animation(&self, other: &AnimationCompletion) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    fn resolve(&self, outcome: u8) {
        self.state.store(outcome, Ordering::Release);
    }
}

#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
struct ActiveAnimation {
    start: CameraPose,
    target: AnimationTarget,
    elapsed: f32,
    duration: f32,
    restore_controls: bool,
    completion: AnimationCompletion,
    token: CancellationToken,
}

#[derive(Debug, Default)]
enum AnimatorState {
    #[default]
    Idle,
    Animating(ActiveAnimation),
}

/// Outcome of an animation request.
#[derive(Debug, Clone)]
pub enum AnimationRequest {
    /// A new animation took ownership of the camera.
    Started(AnimationCompletion),
    /// Another animation is in flight; its completion is shared.
    Joined(AnimationCompletion),
    /// Nothing to animate (disabled or already at the target).
    Skipped(AnimationCompletion),
}

impl AnimationRequest {
    pub fn completion(&self) -> &AnimationCompletion {
        match self {
            Self::Started(completion) | Self::Joined(completion) | Self::Skipped(completion) => {
                completion
            }
        }
    }

    pub fn started(&self) -> bool {
        matches!(self, Self::Started(_))
    }
}

/// One driver step.
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationFrame {
    Moving(CameraPose),
    Finished {
        pose: CameraPose,
        focus: Vec3,
        restore_controls: bool,
        animation_id: u64,
    },
    Cancelled {
        restore_controls: bool,
        animation_id: u64,
    },
}

/// Idle ⇄ Animating camera state machine. At most one animation drives the
/// camera; the orbit controls stay disabled while it runs.
#[derive(Resource, Debug, Default)]
pub struct CameraAnimator {
    state: AnimatorState,
    next_id: u64,
}

impl CameraAnimator {
    pub fn is_animating(&self) -> bool {
        matches!(self.state, AnimatorState::Animating(_))
    }

    pub fn current(&self) -> Option<&AnimationCompletion> {
        match &self.state {
            AnimatorState::Animating(active) => Some(&active.completion),
            AnimatorState::Idle => None,
        }
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Requests an animation from `current` to `target`. The caller disables
    /// user controls when this returns `Started`.
    pub fn request(
        &mut self,
        current: CameraPose,
        target: AnimationTarget,
        duration_secs: f32,
        animation_enabled: bool,
        controls_enabled: bool,
    ) -> AnimationRequest {
        if let AnimatorState::Animating(active) = &self.state {
            debug!("Camera animation {} already running", active.completion.id());
            return AnimationRequest::Joined(active.completion.clone());
        }

        let id = self.allocate_id();
        if !animation_enabled {
            debug!("Camera animation disabled by feature flag");
            return AnimationRequest::Skipped(AnimationCompletion::finished(id));
        }
        if current.within_tolerance(&target.pose) {
            debug!("Camera already at animation target");
            return AnimationRequest::Skipped(AnimationCompletion::finished(id));
        }

        let completion = AnimationCompletion::pending(id);
        self.state = AnimatorState::Animating(ActiveAnimation {
            start: current,
            target,
            elapsed: 0.0,
            duration: duration_secs.max(0.0),
            restore_controls: controls_enabled,
            completion: completion.clone(),
            token: CancellationToken::default(),
        });
        info!("Camera animation {} started ({:.2}s)", id, duration_secs);
        AnimationRequest::Started(completion)
    }

    /// Flags the running animation for cancellation; the driver stops it on its next step.
    pub fn cancel(&mut self) -> bool {
        match &self.state {
            AnimatorState::Animating(active) => {
                active.token.cancel();
                true
            }
            AnimatorState::Idle => false,
        }
    }

    /// Advances the running animation by `dt` seconds.
    pub fn advance(&mut self, dt: f32) -> Option<AnimationFrame> {
        let AnimatorState::Animating(active) = &mut self.state else {
            return None;
        };

        if active.token.is_cancelled() {
            let frame = AnimationFrame::Cancelled {
                restore_controls: active.restore_controls,
                animation_id: active.completion.id(),
            };
            active.completion.resolve(CANCELLED);
            self.state = AnimatorState::Idle;
            return Some(frame);
        }

        active.elapsed += dt;
        let progress = if active.duration <= f32::EPSILON {
            1.0
        } else {
            (active.elapsed / active.duration).min(1.0)
        };
        let eased = active.target.easing.apply(progress);
        let pose = CameraPose {
            translation: active
                .start
                .translation
                .lerp(active.target.pose.translation, eased),
            rotation: active.start.rotation.slerp(active.target.pose.rotation, eased),
        };

        if progress < 1.0 {
            return Some(AnimationFrame::Moving(pose));
        }

        let frame = AnimationFrame::Finished {
            pose: active.target.pose,
            focus: active.target.focus,
            restore_controls: active.restore_controls,
            animation_id: active.completion.id(),
        };
        active.completion.resolve(FINISHED);
        self.state = AnimatorState::Idle;
        Some(frame)
    }
}

/// Notification that an animation ended, finished or cancelled.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraAnimationEnded {
    pub animation_id: u64,
    pub cancelled: bool,
}

/// Single per-frame driver; runs before the orbit controls.
pub fn drive_camera_animation(
    time: Res<Time>,
    mut animator: ResMut<CameraAnimator>,
    mut controls: ResMut<super::orbit_controls::OrbitControls>,
    mut camera: Query<&mut Transform, With<super::orbit_controls::MapCamera>>,
    mut ended: EventWriter<CameraAnimationEnded>,
) {
    if !animator.is_animating() {
        return;
    }
    let Some(frame) = animator.advance(time.delta_secs()) else {
        return;
    };

    match frame {
        AnimationFrame::Moving(pose) => {
            if let Ok(mut transform) = camera.single_mut() {
                transform.translation = pose.translation;
                transform.rotation = pose.rotation;
            }
        }
        AnimationFrame::Finished {
            pose,
            focus,
            restore_controls,
            animation_id,
        } => {
            controls.sync_to_pose(pose.translation, focus);
            let reach = pose.translation.distance(focus);
            if let Ok(mut transform) = camera.single_mut() {
                // Out of orbit range: land where the controls will continue from.
                if reach < controls.min_distance || reach > controls.max_distance {
                    *transform = controls.camera_transform();
                } else {
                    transform.translation = pose.translation;
                    transform.rotation = pose.rotation;
                }
            }
            controls.enabled = restore_controls;
            info!("Camera animation {} finished", animation_id);
            ended.write(CameraAnimationEnded {
                animation_id,
                cancelled: false,
            });
        }
        AnimationFrame::Cancelled {
            restore_controls,
            animation_id,
        } => {
            if let Ok(transform) = camera.single() {
                let focus = controls.target;
                controls.sync_to_pose(transform.translation, focus);
            }
            controls.enabled = restore_controls;
            info!("Camera animation {} cancelled", animation_id);
            ended.write(CameraAnimationEnded {
                animation_id,
                cancelled: true,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn start_pose() -> CameraPose {
        CameraPose::looking_at(Vec3::new(-120.0, 250.0, 200.0), Vec3::ZERO, Vec3::Y)
    }

    #[test]
    fn easing_hits_endpoints_and_midpoint() {
        assert_relative_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_relative_eq!(ease_in_out_cubic(0.5), 0.5);
        assert_relative_eq!(ease_in_out_cubic(1.0), 1.0);
        assert_relative_eq!(ease_in_out_cubic(0.25), 0.0625);
        assert_relative_eq!(ease_in_out_quad(0.5), 0.5);
    }

    #[test]
    fn concurrent_requests_share_one_completion() {
        let mut animator = CameraAnimator::default();
        let first = animator.request(start_pose(), AnimationTarget::top_down(), 1.5, true, true);
        let second = animator.request(start_pose(), AnimationTarget::top_down(), 1.5, true, true);

        assert!(first.started());
        assert!(matches!(second, AnimationRequest::Joined(_)));
        assert!(first.completion().same_animation(second.completion()));
        assert!(!first.completion().is_done());
    }

    #[test]
    fn already_at_target_resolves_without_animating() {
        let mut animator = CameraAnimator::default();
        let request = animator.request(
            CameraPose::top_down(),
            AnimationTarget::top_down(),
            1.5,
            true,
            true,
        );
        assert!(matches!(request, AnimationRequest::Skipped(_)));
        assert!(request.completion().is_finished());
        assert!(!animator.is_animating());
        assert_eq!(animator.advance(0.1), None);
    }

    #[test]
    fn disabled_flag_resolves_immediately() {
        let mut animator = CameraAnimator::default();
        let request = animator.request(start_pose(), AnimationTarget::top_down(), 1.5, false, true);
        assert!(request.completion().is_finished());
        assert!(!animator.is_animating());
    }

    #[test]
    fn runs_to_completion_and_restores_controls() {
        let mut animator = CameraAnimator::default();
        let request = animator.request(start_pose(), AnimationTarget::top_down(), 1.0, true, true);

        let Some(AnimationFrame::Moving(mid)) = animator.advance(0.5) else {
            panic!("expected a moving frame");
        };
        let halfway = start_pose().translation.lerp(CameraPose::top_down().translation, 0.5);
        assert_relative_eq!(mid.translation.y, halfway.y, epsilon = 1e-3);

        match animator.advance(0.6) {
            Some(AnimationFrame::Finished {
                pose,
                focus,
                restore_controls,
                ..
            }) => {
                assert_eq!(pose.translation, Vec3::new(0.0, 600.0, 0.0));
                assert_eq!(focus, Vec3::ZERO);
                assert!(restore_controls);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(request.completion().is_finished());
        assert!(!animator.is_animating());
    }

    #[test]
    fn cancellation_is_observed_on_next_step() {
        let mut animator = CameraAnimator::default();
        let request = animator.request(start_pose(), AnimationTarget::top_down(), 1.0, true, false);
        assert!(animator.cancel());
        assert!(animator.is_animating());

        assert!(matches!(
            animator.advance(0.016),
            Some(AnimationFrame::Cancelled {
                restore_controls: false,
                ..
            })
        ));
        assert!(request.completion().is_cancelled());
        assert!(!animator.cancel());
    }

    #[test]
    fn finished_pose_outside_control_limits_lands_on_the_controls_pose() {
        use super::super::orbit_controls::{MapCamera, OrbitControls};

        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<CameraAnimator>()
            .init_resource::<OrbitControls>()
            .add_event::<CameraAnimationEnded>()
            .add_systems(Update, drive_camera_animation);
        app.world_mut()
            .spawn((MapCamera, Transform::from_translation(start_pose().translation)));

        let far = Vec3::new(1000.0, 500.0, -600.0);
        app.world_mut().resource_mut::<CameraAnimator>().request(
            start_pose(),
            AnimationTarget::overview(far),
            0.0,
            true,
            true,
        );
        app.update();

        let controls_position = app.world().resource::<OrbitControls>().position();
        let mut cameras = app
            .world_mut()
            .query_filtered::<&Transform, With<MapCamera>>();
        let transform = cameras.single(app.world()).unwrap();
        assert!(transform.translation.distance(controls_position) < 1e-2);
        assert!(transform.translation.length() < far.length());
    }

    #[test]
    fn driver_system_moves_camera_and_reenables_controls() {
        use super::super::orbit_controls::{MapCamera, OrbitControls};

        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<CameraAnimator>()
            .init_resource::<OrbitControls>()
            .add_event::<CameraAnimationEnded>()
            .add_systems(Update, drive_camera_animation);
        app.world_mut()
            .spawn((MapCamera, Transform::from_translation(start_pose().translation)));

        let start = CameraPose::from(&Transform::from_translation(start_pose().translation));
        app.world_mut().resource_mut::<CameraAnimator>().request(
            start,
            AnimationTarget::top_down(),
            0.0,
            true,
            true,
        );
        app.world_mut().resource_mut::<OrbitControls>().enabled = false;

        app.update();

        let mut cameras = app
            .world_mut()
            .query_filtered::<&Transform, With<MapCamera>>();
        let transform = cameras.single(app.world()).unwrap();
        assert_relative_eq!(transform.translation.y, 600.0);
        assert!(app.world().resource::<OrbitControls>().enabled);
        assert!(!app.world().resource::<CameraAnimator>().is_animating());
    }
}
