use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;
use thiserror::Error;

use constants::render_settings::{
    ROUTE_CAP_SEGMENTS, ROUTE_COLOR, ROUTE_HEIGHT, ROUTE_OPACITY, ROUTE_REVEAL_INTERVAL_SECS,
    ROUTE_WIDTH,
};

use crate::engine::assets::map_data::NodeId;
use crate::engine::assets::registry::MapRegistry;
use crate::engine::flags::FeatureFlags;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteStyle {
    pub color: Color,
    pub width: f32,
    pub opacity: f32,
    pub height: f32,
}

impl Default for RouteStyle {
    fn default() -> Self {
        Self {
            color: ROUTE_COLOR,
            width: ROUTE_WIDTH,
            opacity: ROUTE_OPACITY,
            height: ROUTE_HEIGHT,
        }
    }
}

/// Flat ribbon between two consecutive route nodes, with round caps at both ends.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSegment {
    pub from: NodeId,
    pub to: NodeId,
    pub start: Vec3,
    pub end: Vec3,
    /// Ribbon corners: start-left, start-right, end-right, end-left.
    pub corners: [Vec3; 4],
    pub cap_radius: f32,
}

impl RouteSegment {
    fn new(from: NodeId, to: NodeId, a: Vec2, b: Vec2, style: &RouteStyle) -> Self {
        let half_width = style.width * 0.5;
        let direction = (b - a).normalize_or_zero();
        let offset = Vec2::new(-direction.y, direction.x) * half_width;
        let lift = |point: Vec2| Vec3::new(point.x, style.height, point.y);

        Self {
            from,
            to,
            start: lift(a),
            end: lift(b),
            corners: [lift(a + offset), lift(a - offset), lift(b - offset), lift(b + offset)],
            cap_radius: half_width,
        }
    }

    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// Two triangles: (v1, v2, v3) and (v1, v3, v4).
    pub fn ribbon_mesh(&self) -> Mesh {
        let [v1, v2, v3, v4] = self.corners;
        let positions: Vec<[f32; 3]> = [v1, v2, v3, v1, v3, v4]
            .iter()
            .map(|vertex| vertex.to_array())
            .collect();
        let uvs = vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 0.0],
            [1.0, 1.0],
            [0.0, 1.0],
        ];

        Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
            .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
            .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, vec![[0.0, 1.0, 0.0]; 6])
            .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("a route needs at least 2 nodes, got {0}")]
    TooShort(usize),
    #[error("map data is not loaded")]
    MapNotLoaded,
}

/// Current route and its geometry. Replaced wholesale by each trace.
#[derive(Resource, Debug, Default)]
pub struct RouteTracer {
    style: RouteStyle,
    current_route: Option<Vec<NodeId>>,
    segments: Vec<RouteSegment>,
}

impl RouteTracer {
    /// Replaces the current route. Pairs with an unknown node are skipped.
    pub fn trace_route(
        &mut self,
        node_ids: &[NodeId],
        registry: &MapRegistry,
    ) -> Result<usize, RouteError> {
        if node_ids.len() < 2 {
            warn!("Route needs at least 2 nodes, got {}", node_ids.len());
            return Err(RouteError::TooShort(node_ids.len()));
        }

        self.clear_route();
        self.current_route = Some(node_ids.to_vec());
        self.rebuild_segments(registry);

        info!(
            "Route traced through {} nodes ({} segments)",
            node_ids.len(),
            self.segments.len()
        );
        Ok(self.segments.len())
    }

    fn rebuild_segments(&mut self, registry: &MapRegistry) {
        self.segments.clear();
        let Some(route) = self.current_route.as_ref() else {
            return;
        };

        for pair in route.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            match (registry.node_position(from), registry.node_position(to)) {
                (Some(a), Some(b)) => {
                    self.segments
                        .push(RouteSegment::new(from, to, a, b, &self.style));
                }
                _ => warn!("Route segment {} -> {} skipped: node not found", from, to),
            }
        }
    }

    pub fn clear_route(&mut self) {
        self.current_route = None;
        self.segments.clear();
    }

    pub fn current_route(&self) -> Option<&[NodeId]> {
        self.current_route.as_deref()
    }

    pub fn segments(&self) -> &[RouteSegment] {
        &self.segments
    }

    pub fn style(&self) -> &RouteStyle {
        &self.style
    }

    /// Changes the route style and redraws the current route with it.
    pub fn set_style(&mut self, style: RouteStyle, registry: &MapRegistry) {
        self.style = style;
        self.rebuild_segments(registry);
    }
}

/// Mesh entity drawing part of segment `segment`.
#[derive(Component, Debug, Clone, Copy)]
pub struct RouteSegmentPiece {
    pub segment: usize,
}

/// Progressive reveal of route segments when route animation is enabled.
#[derive(Resource, Debug, Default)]
pub struct RouteReveal {
    timer: Timer,
    revealed: usize,
    total: usize,
}

impl RouteReveal {
    fn restart(&mut self, total: usize) {
        self.timer = Timer::from_seconds(ROUTE_REVEAL_INTERVAL_SECS, TimerMode::Repeating);
        self.revealed = 0;
        self.total = total;
    }

    pub fn is_running(&self) -> bool {
        self.revealed < self.total
    }
}

pub fn route_material(style: &RouteStyle) -> StandardMaterial {
    StandardMaterial {
        base_color: style.color.with_alpha(style.opacity),
        unlit: true,
        double_sided: true,
        cull_mode: None,
        depth_bias: 10.0,
        alpha_mode: if style.opacity < 1.0 {
            AlphaMode::Blend
        } else {
            AlphaMode::Opaque
        },
        ..default()
    }
}

/// Mirrors the tracer into mesh entities whenever it changes.
pub fn render_route(
    mut commands: Commands,
    tracer: Res<RouteTracer>,
    flags: Res<FeatureFlags>,
    pieces: Query<Entity, With<RouteSegmentPiece>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut reveal: ResMut<RouteReveal>,
) {
    if !tracer.is_changed() {
        return;
    }

    for entity in &pieces {
        commands.entity(entity).despawn();
    }

    let segments = tracer.segments();
    let animate = flags.enable_route_animation;
    reveal.restart(if animate { segments.len() } else { 0 });
    if segments.is_empty() {
        return;
    }

    let material = materials.add(route_material(tracer.style()));
    let cap = meshes.add(
        Circle::new(tracer.style().width * 0.5)
            .mesh()
            .resolution(ROUTE_CAP_SEGMENTS)
            .build(),
    );
    let visibility = if animate {
        Visibility::Hidden
    } else {
        Visibility::Inherited
    };
    let flat = Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2);

    for (index, segment) in segments.iter().enumerate() {
        let piece = RouteSegmentPiece { segment: index };
        commands.spawn((
            piece,
            Mesh3d(meshes.add(segment.ribbon_mesh())),
            MeshMaterial3d(material.clone()),
            Transform::IDENTITY,
            visibility,
        ));
        for center in [segment.start, segment.end] {
            commands.spawn((
                piece,
                Mesh3d(cap.clone()),
                MeshMaterial3d(material.clone()),
                Transform::from_translation(center).with_rotation(flat),
                visibility,
            ));
        }
    }
}

pub fn reveal_route(
    time: Res<Time>,
    mut reveal: ResMut<RouteReveal>,
    mut pieces: Query<(&RouteSegmentPiece, &mut Visibility)>,
) {
    if !reveal.is_running() {
        return;
    }
    reveal.timer.tick(time.delta());
    let steps = reveal.timer.times_finished_this_tick() as usize;
    if steps == 0 {
        return;
    }

    reveal.revealed = (reveal.revealed + steps).min(reveal.total);
    for (piece, mut visibility) in &mut pieces {
        if piece.segment < reveal.revealed {
            visibility.set_if_neq(Visibility::Inherited);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::registry::sample_registry;
    use approx::assert_relative_eq;

    fn ids(raw: &[u32]) -> Vec<NodeId> {
        raw.iter().copied().map(NodeId).collect()
    }

    #[test]
    fn traces_one_segment_per_consecutive_pair() {
        let registry = sample_registry();
        let mut tracer = RouteTracer::default();
        let route = ids(&[1, 2, 3]);

        assert_eq!(tracer.trace_route(&route, &registry), Ok(2));
        assert_eq!(tracer.current_route(), Some(route.as_slice()));

        let segments = tracer.segments();
        assert_eq!(segments[0].start, Vec3::new(0.0, ROUTE_HEIGHT, 0.0));
        assert_eq!(segments[0].end, Vec3::new(10.0, ROUTE_HEIGHT, 0.0));
        assert_eq!(segments[1].start, Vec3::new(10.0, ROUTE_HEIGHT, 0.0));
        assert_eq!(segments[1].end, Vec3::new(10.0, ROUTE_HEIGHT, 10.0));
    }

    #[test]
    fn ribbon_is_offset_by_half_width_perpendicular() {
        let registry = sample_registry();
        let mut tracer = RouteTracer::default();
        tracer.trace_route(&ids(&[1, 2]), &registry).unwrap();

        let [v1, v2, v3, v4] = tracer.segments()[0].corners;
        assert_relative_eq!(v1.z, 1.0);
        assert_relative_eq!(v2.z, -1.0);
        assert_relative_eq!(v3.x, 10.0);
        assert_relative_eq!(v3.z, -1.0);
        assert_relative_eq!(v4.z, 1.0);
        assert_relative_eq!(tracer.segments()[0].cap_radius, 1.0);

        let mesh = tracer.segments()[0].ribbon_mesh();
        assert_eq!(mesh.count_vertices(), 6);
    }

    #[test]
    fn short_routes_leave_current_route_untouched() {
        let registry = sample_registry();
        let mut tracer = RouteTracer::default();
        tracer.trace_route(&ids(&[1, 2]), &registry).unwrap();

        assert_eq!(
            tracer.trace_route(&ids(&[3]), &registry),
            Err(RouteError::TooShort(1))
        );
        assert_eq!(tracer.current_route(), Some(ids(&[1, 2]).as_slice()));
        assert_eq!(tracer.segments().len(), 1);

        let mut empty = RouteTracer::default();
        assert!(empty.trace_route(&[], &registry).is_err());
        assert!(empty.segments().is_empty());
        assert_eq!(empty.current_route(), None);
    }

    #[test]
    fn unknown_nodes_are_skipped_but_route_is_recorded() {
        let registry = sample_registry();
        let mut tracer = RouteTracer::default();
        assert_eq!(tracer.trace_route(&ids(&[1, 99]), &registry), Ok(0));
        assert_eq!(tracer.current_route(), Some(ids(&[1, 99]).as_slice()));

        assert_eq!(tracer.trace_route(&ids(&[1, 99, 2, 3]), &registry), Ok(1));
    }

    #[test]
    fn clear_removes_route_and_geometry() {
        let registry = sample_registry();
        let mut tracer = RouteTracer::default();
        tracer.trace_route(&ids(&[1, 2, 3]), &registry).unwrap();
        tracer.clear_route();
        assert!(tracer.segments().is_empty());
        assert_eq!(tracer.current_route(), None);
    }

    #[test]
    fn style_change_redraws_current_route() {
        let registry = sample_registry();
        let mut tracer = RouteTracer::default();
        tracer.trace_route(&ids(&[1, 2]), &registry).unwrap();
        tracer.set_style(
            RouteStyle {
                width: 6.0,
                ..default()
            },
            &registry,
        );
        assert_relative_eq!(tracer.segments()[0].corners[0].z, 3.0);
    }

    #[test]
    fn render_system_spawns_ribbon_and_caps_per_segment() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<StandardMaterial>>()
            .init_resource::<RouteTracer>()
            .init_resource::<RouteReveal>()
            .init_resource::<FeatureFlags>()
            .add_systems(Update, render_route);

        let registry = sample_registry();
        app.world_mut()
            .resource_mut::<RouteTracer>()
            .trace_route(&ids(&[1, 2, 3]), &registry)
            .unwrap();
        app.update();

        let mut pieces = app.world_mut().query::<&RouteSegmentPiece>();
        assert_eq!(pieces.iter(app.world()).count(), 6);

        app.world_mut().resource_mut::<RouteTracer>().clear_route();
        app.update();
        let mut pieces = app.world_mut().query::<&RouteSegmentPiece>();
        assert_eq!(pieces.iter(app.world()).count(), 0);
    }

    fn visible_segments(app: &mut App) -> Vec<usize> {
        let mut pieces = app.world_mut().query::<(&RouteSegmentPiece, &Visibility)>();
        let mut visible: Vec<usize> = pieces
            .iter(app.world())
            .filter(|(_, visibility)| **visibility != Visibility::Hidden)
            .map(|(piece, _)| piece.segment)
            .collect();
        visible.sort_unstable();
        visible.dedup();
        visible
    }

    #[test]
    fn animated_route_is_revealed_one_segment_at_a_time() {
        use bevy::time::TimeUpdateStrategy;
        use std::time::Duration;

        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(50)))
            .init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<StandardMaterial>>()
            .init_resource::<RouteTracer>()
            .init_resource::<RouteReveal>()
            .insert_resource(FeatureFlags {
                enable_route_animation: true,
                ..default()
            })
            .add_systems(Update, (render_route, reveal_route).chain());
        app.update();

        let registry = sample_registry();
        app.world_mut()
            .resource_mut::<RouteTracer>()
            .trace_route(&ids(&[1, 2, 3]), &registry)
            .unwrap();

        // 50 ms steps against an 80 ms reveal interval.
        app.update();
        assert!(visible_segments(&mut app).is_empty());
        let mut pieces = app.world_mut().query::<&RouteSegmentPiece>();
        assert_eq!(pieces.iter(app.world()).count(), 6);

        app.update();
        assert_eq!(visible_segments(&mut app), vec![0]);
        app.update();
        assert_eq!(visible_segments(&mut app), vec![0]);

        app.update();
        assert_eq!(visible_segments(&mut app), vec![0, 1]);
        assert!(!app.world().resource::<RouteReveal>().is_running());
    }
}
