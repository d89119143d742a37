use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use constants::camera::{RESET_CAMERA_DURATION_MS, RESET_CAMERA_POSITION};

use crate::engine::assets::map_data::{BuildingId, MapBuilding, NodeId};
use crate::engine::assets::registry::{BuildingRef, MapRegistry};
use crate::engine::backend::client::{BackendClient, BackendRequest};
use crate::engine::camera::animator::{
    AnimationRequest, AnimationTarget, CameraAnimator, CameraPose,
};
use crate::engine::camera::orbit_controls::{MapCamera, OrbitControls};
use crate::engine::config::ViewerConfig;
use crate::engine::flags::{FeatureFlag, FeatureFlags};
use crate::engine::loading::building_loader::SpawnedBuildings;
use crate::tools::highlighter::HighlightState;
use crate::tools::route_tracer::{RouteError, RouteTracer};

/// Typed control surface over the running map. Everything the page can ask
/// the viewer to do goes through here.
#[derive(SystemParam)]
pub struct MapApi<'w, 's> {
    registry: Option<Res<'w, MapRegistry>>,
    config: Res<'w, ViewerConfig>,
    flags: ResMut<'w, FeatureFlags>,
    highlight: ResMut<'w, HighlightState>,
    route: ResMut<'w, RouteTracer>,
    animator: ResMut<'w, CameraAnimator>,
    controls: ResMut<'w, OrbitControls>,
    spawned: Res<'w, SpawnedBuildings>,
    backend: Res<'w, BackendClient>,
    camera: Query<'w, 's, &'static Transform, With<MapCamera>>,
}

impl MapApi<'_, '_> {
    pub fn is_initialized(&self) -> bool {
        self.registry.is_some()
    }

    pub fn registry(&self) -> Option<&MapRegistry> {
        self.registry.as_deref()
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    // Highlight

    pub fn highlight_building(&mut self, target: impl Into<BuildingRef>) -> Option<BuildingId> {
        let target = target.into();
        let Some(registry) = self.registry.as_deref() else {
            warn!("Cannot highlight {}: map not loaded", target);
            return None;
        };
        match self.highlight.highlight_building(
            &target,
            registry,
            self.flags.enable_building_highlight,
        ) {
            Ok(id) => {
                debug!("Building {} highlighted", id);
                Some(id)
            }
            Err(e) => {
                warn!("Highlight of {} ignored: {}", target, e);
                None
            }
        }
    }

    pub fn highlight_multiple(&mut self, targets: &[BuildingRef]) -> Vec<BuildingId> {
        let Some(registry) = self.registry.as_deref() else {
            warn!("Cannot highlight {} buildings: map not loaded", targets.len());
            return Vec::new();
        };
        self.highlight
            .highlight_multiple(targets, registry, self.flags.enable_building_highlight)
            .unwrap_or_else(|e| {
                warn!("Highlight ignored: {}", e);
                Vec::new()
            })
    }

    pub fn clear_highlight(&mut self) {
        if !self.highlight.is_empty() {
            self.highlight.clear();
        }
    }

    pub fn highlighted_building(&self) -> Option<&MapBuilding> {
        let id = self.highlight.highlighted_building()?;
        self.registry.as_deref()?.building(id)
    }

    pub fn highlighted_buildings(&self) -> &[BuildingId] {
        self.highlight.highlighted_buildings()
    }

    pub fn highlighted_node(&self) -> Option<NodeId> {
        self.highlight.highlighted_node()
    }

    // Routes

    pub fn trace_route(&mut self, node_ids: &[NodeId]) -> Result<usize, RouteError> {
        if node_ids.len() < 2 {
            warn!("Route needs at least 2 nodes, got {}", node_ids.len());
            return Err(RouteError::TooShort(node_ids.len()));
        }
        let Some(registry) = self.registry.as_deref() else {
            warn!("Cannot trace route: map not loaded");
            return Err(RouteError::MapNotLoaded);
        };
        self.route.trace_route(node_ids, registry)
    }

    pub fn clear_route(&mut self) {
        if self.route.current_route().is_some() || !self.route.segments().is_empty() {
            self.route.clear_route();
        }
    }

    pub fn current_route(&self) -> Option<&[NodeId]> {
        self.route.current_route()
    }

    pub fn route_segment_count(&self) -> usize {
        self.route.segments().len()
    }

    /// Asks the backend for a route from the totem to `destination`.
    pub fn request_route_to(&self, destination: NodeId) -> NodeId {
        let from = self.config.totem.node_id;
        info!("Requesting route {} -> {}", from, destination);
        self.backend.request(BackendRequest::Route {
            from,
            to: destination,
        });
        from
    }

    // Camera

    fn current_pose(&self, fallback: CameraPose) -> CameraPose {
        self.camera
            .single()
            .map(CameraPose::from)
            .unwrap_or(fallback)
    }

    fn animate(
        &mut self,
        target: AnimationTarget,
        duration_ms: u32,
        animation_enabled: bool,
    ) -> AnimationRequest {
        let current = self.current_pose(target.pose);
        let request = self.animator.request(
            current,
            target,
            duration_ms as f32 / 1000.0,
            animation_enabled,
            self.controls.enabled,
        );
        if request.started() {
            self.controls.stop();
            self.controls.enabled = false;
        }
        request
    }

    /// Eases the camera to the straight-down overview. Joins an animation
    /// already in flight instead of starting a second one.
    pub fn animate_to_top_down(&mut self, duration_ms: Option<u32>) -> AnimationRequest {
        let duration = duration_ms.unwrap_or(self.config.camera_animation_ms);
        let enabled = self.flags.enable_camera_animation;
        self.animate(AnimationTarget::top_down(), duration, enabled)
    }

    /// Returns to the default overview. `animate = false` jumps there on the next frame.
    /// The overview is pulled in to the orbit range so the controls pick up from it.
    pub fn reset_camera(&mut self, animate: bool) -> AnimationRequest {
        let duration = if animate { RESET_CAMERA_DURATION_MS } else { 0 };
        let position = self
            .controls
            .clamp_position(RESET_CAMERA_POSITION, Vec3::ZERO);
        self.animate(AnimationTarget::overview(position), duration, true)
    }

    pub fn cancel_camera_animation(&mut self) -> bool {
        self.animator.cancel()
    }

    pub fn is_camera_animating(&self) -> bool {
        self.animator.is_animating()
    }

    // Lookups

    pub fn building_by_id(&self, id: BuildingId) -> Option<&MapBuilding> {
        self.registry.as_deref()?.building(id)
    }

    pub fn building_by_name(&self, name: &str) -> Option<&MapBuilding> {
        self.registry.as_deref()?.building_by_name(name)
    }

    pub fn building_id_by_name(&self, name: &str) -> Option<BuildingId> {
        self.registry.as_deref()?.building_id_by_name(name)
    }

    pub fn node_id_for_building(&self, id: BuildingId) -> Option<NodeId> {
        self.registry.as_deref()?.node_id_for_building(id)
    }

    pub fn all_buildings(&self) -> &[MapBuilding] {
        self.registry
            .as_deref()
            .map(MapRegistry::buildings)
            .unwrap_or_default()
    }

    pub fn loaded_building_names(&self) -> Vec<String> {
        self.spawned.names()
    }

    // Feature flags

    pub fn feature_flags(&self) -> FeatureFlags {
        *self.flags
    }

    /// Returns whether the flag changed. Disabling highlight also clears it.
    pub fn set_feature_flag(&mut self, flag: FeatureFlag, enabled: bool) -> bool {
        let changed = self.flags.bypass_change_detection().set(flag, enabled);
        if !changed {
            return false;
        }
        self.flags.set_changed();
        info!("Feature flag {:?} set to {}", flag, enabled);

        if flag == FeatureFlag::EnableBuildingHighlight && !enabled {
            self.clear_highlight();
        }
        true
    }

    /// Restores every flag to the value from the viewer config.
    pub fn refresh_feature_flags(&mut self) -> FeatureFlags {
        let configured = self.config.feature_flags;
        if *self.flags != configured {
            *self.flags = configured;
            if !configured.enable_building_highlight {
                self.clear_highlight();
            }
        }
        configured
    }
}
