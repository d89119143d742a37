//! Map camera: damped orbit controls, scripted animations and cross-instance sync.
//!
//! Exactly one writer moves the camera in a frame. `drive_camera_animation`
//! runs first; `orbit_camera_controller` is skipped while an animation is
//! active and re-enabled by the animator when it finishes or is cancelled.

/// Idle/animating state machine with shared completions and cancellation.
pub mod animator;

/// Orbit controls resource, camera marker and pointer input handling.
pub mod orbit_controls;

/// Camera spawning and aspect-dependent field of view.
pub mod setup;

/// Camera placement messages shared with other viewer instances.
pub mod sync;
