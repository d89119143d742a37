use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowResized};

use constants::camera::{BASE_FOV_DEGREES, CAMERA_FAR, CAMERA_NEAR, REFERENCE_ASPECT};

use super::orbit_controls::{MapCamera, OrbitControls};

/// Vertical FOV (radians) keeping the horizontal extent stable across aspect ratios.
pub fn fov_for_aspect(aspect: f32) -> f32 {
    let base = BASE_FOV_DEGREES.to_radians();
    if !aspect.is_finite() || aspect <= 0.0 {
        return base;
    }
    base / (aspect / REFERENCE_ASPECT).sqrt()
}

pub fn spawn_map_camera(
    mut commands: Commands,
    controls: Res<OrbitControls>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let aspect = windows
        .single()
        .map(|window| window.width() / window.height())
        .unwrap_or(REFERENCE_ASPECT);

    commands.spawn((
        Camera3d::default(),
        MapCamera,
        Projection::from(PerspectiveProjection {
            fov: fov_for_aspect(aspect),
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            ..default()
        }),
        controls.camera_transform(),
    ));
}

pub fn adapt_fov_to_window(
    mut resized: EventReader<WindowResized>,
    mut projections: Query<&mut Projection, With<MapCamera>>,
) {
    let Some(event) = resized.read().last() else {
        return;
    };
    if event.height <= 0.0 {
        return;
    }
    let fov = fov_for_aspect(event.width / event.height);
    for mut projection in &mut projections {
        if let Projection::Perspective(perspective) = projection.as_mut() {
            perspective.fov = fov;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn fov_matches_base_at_reference_aspect() {
        assert_relative_eq!(fov_for_aspect(16.0 / 9.0), 10f32.to_radians());
    }

    #[test]
    fn wider_screens_narrow_the_fov() {
        let wide = fov_for_aspect(4.0 * 16.0 / 9.0);
        assert_relative_eq!(wide, 5f32.to_radians(), epsilon = 1e-6);
        assert!(fov_for_aspect(9.0 / 16.0) > 10f32.to_radians());
        assert_relative_eq!(fov_for_aspect(0.0), 10f32.to_radians());
    }
}
