use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::engine::assets::company::CompanyDirectory;
use crate::engine::assets::map_data::{BuildingId, NodeId};
use crate::engine::assets::registry::BuildingRef;
use crate::engine::backend::client::{BackendClient, BackendRequest};
use crate::engine::camera::animator::AnimationRequest;
use crate::engine::camera::sync::{CameraSetMessage, CameraSyncBus};
use crate::engine::core::app_state::ReloadMapRequest;
use crate::engine::flags::FeatureFlag;
use crate::engine::map_api::MapApi;
use crate::tools::categories::CategoryIndex;
use crate::tools::picking::BuildingPicker;
use crate::tools::search::SearchIndex;

use super::web_rpc::RpcError;

/// Everything an RPC method may read or change.
#[derive(SystemParam)]
pub struct RpcContext<'w, 's> {
    api: MapApi<'w, 's>,
    picker: BuildingPicker<'w, 's>,
    search: Res<'w, SearchIndex>,
    categories: Res<'w, CategoryIndex>,
    directory: ResMut<'w, CompanyDirectory>,
    backend: Res<'w, BackendClient>,
    sync_bus: Res<'w, CameraSyncBus>,
    camera_messages: EventWriter<'w, CameraSetMessage>,
    reloads: EventWriter<'w, ReloadMapRequest>,
    diagnostics: Res<'w, DiagnosticsStore>,
}

pub(crate) type MethodResult = Result<Value, RpcError>;

/// Routes a method name to its handler. `None` means the method is unknown.
pub(crate) fn dispatch(method: &str, params: &Value, ctx: &mut RpcContext) -> Option<MethodResult> {
    let result = match method {
        // Highlight
        "highlight_building" => handle_highlight_building(params, ctx),
        "highlight_multiple" => handle_highlight_multiple(params, ctx),
        "clear_highlight" => {
            ctx.api.clear_highlight();
            Ok(json!({ "success": true }))
        }
        "get_highlighted_building" => Ok(json!({
            "building": ctx.api.highlighted_building(),
            "buildingIds": ctx.api.highlighted_buildings(),
            "nodeId": ctx.api.highlighted_node(),
        })),

        // Routes
        "trace_route" => handle_trace_route(params, ctx),
        "clear_route" => {
            ctx.api.clear_route();
            Ok(json!({ "success": true }))
        }
        "get_current_route" => Ok(json!({ "nodeIds": ctx.api.current_route() })),
        "route_to_destination" => handle_route_to_destination(params, ctx),

        // Camera
        "animate_to_top_down" => handle_animate_to_top_down(params, ctx),
        "reset_camera" => handle_reset_camera(params, ctx),
        "cancel_camera_animation" => Ok(json!({
            "cancelled": ctx.api.cancel_camera_animation()
        })),
        "camera_set" => handle_camera_set(params, ctx),
        "get_last_camera" => Ok(json!({ "camera": ctx.sync_bus.last_camera() })),

        // Buildings
        "get_building" => handle_get_building(params, ctx),
        "get_all_buildings" => Ok(json!({ "buildings": ctx.api.all_buildings() })),
        "get_loaded_building_names" => Ok(json!({ "names": ctx.api.loaded_building_names() })),
        "get_building_at" => handle_get_building_at(params, ctx),
        "get_buildings_in_rect" => handle_get_buildings_in_rect(params, ctx),

        // Destinations
        "search_destinations" => handle_search_destinations(params, ctx),
        "get_categories" => Ok(json!({
            "allLabel": ctx.categories.all_label(),
            "categories": ctx.categories.categories(),
        })),
        "highlight_category" => handle_highlight_category(params, ctx),
        "refresh_companies" => handle_refresh_companies(params, ctx),

        // Flags and lifecycle
        "get_feature_flags" => Ok(json!(ctx.api.feature_flags())),
        "set_feature_flag" => handle_set_feature_flag(params, ctx),
        "refresh_feature_flags" => Ok(json!(ctx.api.refresh_feature_flags())),
        "reload_map" => handle_reload_map(params, ctx),
        "get_fps" => handle_get_fps(&ctx.diagnostics),

        _ => return None,
    };
    Some(result)
}

fn parse<T: DeserializeOwned>(params: &Value, expected: &str) -> Result<T, RpcError> {
    let params = if params.is_null() {
        json!({})
    } else {
        params.clone()
    };
    serde_json::from_value(params).map_err(|e| {
        debug!("Rejected RPC params: {}", e);
        RpcError::invalid_params(&format!("Expected {}", expected))
    })
}

fn animation_json(request: &AnimationRequest) -> Value {
    let completion = request.completion();
    json!({
        "animationId": completion.id(),
        "started": request.started(),
        "joined": matches!(request, AnimationRequest::Joined(_)),
        "done": completion.is_done(),
    })
}

fn handle_highlight_building(params: &Value, ctx: &mut RpcContext) -> MethodResult {
    #[derive(Deserialize)]
    struct HighlightParams {
        building: BuildingRef,
    }

    let params: HighlightParams = parse(params, "'building' id or name")?;
    let id = ctx.api.highlight_building(params.building);
    Ok(json!({ "success": id.is_some(), "buildingId": id }))
}

fn handle_highlight_multiple(params: &Value, ctx: &mut RpcContext) -> MethodResult {
    #[derive(Deserialize)]
    struct HighlightMultipleParams {
        buildings: Vec<BuildingRef>,
    }

    let params: HighlightMultipleParams = parse(params, "'buildings' array")?;
    let ids = ctx.api.highlight_multiple(&params.buildings);
    Ok(json!({ "success": !ids.is_empty(), "buildingIds": ids }))
}

fn handle_trace_route(params: &Value, ctx: &mut RpcContext) -> MethodResult {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct TraceRouteParams {
        node_ids: Vec<NodeId>,
    }

    let params: TraceRouteParams = parse(params, "'nodeIds' array")?;
    Ok(match ctx.api.trace_route(&params.node_ids) {
        Ok(segments) => json!({ "success": true, "segments": segments }),
        Err(e) => json!({ "success": false, "segments": 0, "error": e.to_string() }),
    })
}

fn handle_route_to_destination(params: &Value, ctx: &mut RpcContext) -> MethodResult {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct DestinationParams {
        node_id: Option<NodeId>,
        building: Option<BuildingRef>,
    }

    let params: DestinationParams = parse(params, "'nodeId' or 'building'")?;
    let destination = match (params.node_id, params.building) {
        (Some(node_id), _) => node_id,
        (None, Some(building)) => ctx
            .api
            .registry()
            .and_then(|registry| {
                let id = registry.resolve_building(&building)?;
                registry.node_id_for_building(id)
            })
            .ok_or_else(|| {
                RpcError::invalid_params(&format!("No node for building {}", building))
            })?,
        (None, None) => return Err(RpcError::invalid_params("Expected 'nodeId' or 'building'")),
    };

    let from = ctx.api.request_route_to(destination);
    Ok(json!({ "requested": true, "fromNodeId": from, "toNodeId": destination }))
}

fn handle_animate_to_top_down(params: &Value, ctx: &mut RpcContext) -> MethodResult {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct TopDownParams {
        duration_ms: Option<u32>,
    }

    let params: TopDownParams = parse(params, "optional 'durationMs'")?;
    let request = ctx.api.animate_to_top_down(params.duration_ms);
    Ok(animation_json(&request))
}

fn handle_reset_camera(params: &Value, ctx: &mut RpcContext) -> MethodResult {
    #[derive(Deserialize)]
    struct ResetParams {
        #[serde(default = "default_true")]
        animate: bool,
    }

    let params: ResetParams = parse(params, "optional 'animate' flag")?;
    let request = ctx.api.reset_camera(params.animate);
    Ok(animation_json(&request))
}

fn default_true() -> bool {
    true
}

fn handle_camera_set(params: &Value, ctx: &mut RpcContext) -> MethodResult {
    let message: CameraSetMessage = parse(params, "'position', 'target' and 'sourceId'")?;
    // Our own broadcast, echoed back by the page.
    if ctx.sync_bus.is_local(&message) {
        return Ok(json!({ "accepted": false }));
    }
    ctx.camera_messages.write(message);
    Ok(json!({ "accepted": true }))
}

fn handle_get_building(params: &Value, ctx: &mut RpcContext) -> MethodResult {
    #[derive(Deserialize)]
    struct GetBuildingParams {
        id: Option<BuildingId>,
        name: Option<String>,
    }

    let params: GetBuildingParams = parse(params, "'id' or 'name'")?;
    let building = match (params.id, params.name.as_deref()) {
        (Some(id), _) => ctx.api.building_by_id(id),
        (None, Some(name)) => ctx.api.building_by_name(name),
        (None, None) => return Err(RpcError::invalid_params("Expected 'id' or 'name'")),
    };
    let node_id = building.and_then(|building| ctx.api.node_id_for_building(building.id));
    Ok(json!({ "building": building, "nodeId": node_id }))
}

#[derive(Deserialize)]
struct ScreenPoint {
    x: f32,
    y: f32,
}

fn handle_get_building_at(params: &Value, ctx: &mut RpcContext) -> MethodResult {
    let point: ScreenPoint = parse(params, "'x' and 'y' in logical pixels")?;
    let building_id = ctx.picker.building_at(Vec2::new(point.x, point.y));
    Ok(json!({ "hit": building_id.is_some(), "buildingId": building_id }))
}

fn handle_get_buildings_in_rect(params: &Value, ctx: &mut RpcContext) -> MethodResult {
    #[derive(Deserialize)]
    struct RectParams {
        from: ScreenPoint,
        to: ScreenPoint,
    }

    let params: RectParams = parse(params, "'from' and 'to' points")?;
    let ids = ctx.picker.buildings_in_rect(
        Vec2::new(params.from.x, params.from.y),
        Vec2::new(params.to.x, params.to.y),
    );
    Ok(json!({ "buildingIds": ids }))
}

fn handle_search_destinations(params: &Value, ctx: &mut RpcContext) -> MethodResult {
    #[derive(Deserialize)]
    struct SearchParams {
        query: String,
        limit: Option<usize>,
    }

    let params: SearchParams = parse(params, "'query' string")?;
    let limit = params.limit.unwrap_or(ctx.api.config().search_limit);
    Ok(json!({ "results": ctx.search.search(&params.query, limit) }))
}

fn handle_highlight_category(params: &Value, ctx: &mut RpcContext) -> MethodResult {
    #[derive(Deserialize)]
    struct CategoryParams {
        category: String,
    }

    let params: CategoryParams = parse(params, "'category' name")?;
    let targets: Vec<BuildingRef> = ctx
        .categories
        .buildings_in(&params.category)
        .ok_or_else(|| {
            RpcError::invalid_params(&format!("Unknown category: {}", params.category))
        })?
        .iter()
        .copied()
        .map(BuildingRef::from)
        .collect();

    let ids = ctx.api.highlight_multiple(&targets);
    Ok(json!({ "category": params.category, "buildingIds": ids }))
}

fn handle_refresh_companies(params: &Value, ctx: &mut RpcContext) -> MethodResult {
    #[derive(Deserialize)]
    struct RefreshParams {
        #[serde(default = "default_true")]
        force: bool,
    }

    let params: RefreshParams = parse(params, "optional 'force' flag")?;
    let requested = ctx.directory.begin_fetch(params.force);
    if requested {
        ctx.backend.request(BackendRequest::Companies);
    }
    Ok(json!({
        "requested": requested,
        "loaded": ctx.directory.is_loaded(),
        "fetching": ctx.directory.is_fetching(),
        "count": ctx.directory.companies().len(),
        "fetchedAtSecs": ctx.directory.fetched_at_secs(),
        "lastError": ctx.directory.last_error(),
    }))
}

fn handle_set_feature_flag(params: &Value, ctx: &mut RpcContext) -> MethodResult {
    #[derive(Deserialize)]
    struct FlagParams {
        flag: FeatureFlag,
        enabled: bool,
    }

    let params: FlagParams = parse(params, "'flag' name and 'enabled' boolean")?;
    let changed = ctx.api.set_feature_flag(params.flag, params.enabled);
    Ok(json!({ "changed": changed, "flags": ctx.api.feature_flags() }))
}

fn handle_reload_map(params: &Value, ctx: &mut RpcContext) -> MethodResult {
    #[derive(Deserialize)]
    struct ReloadParams {
        url: Option<String>,
    }

    let params: ReloadParams = parse(params, "optional 'url'")?;
    info!(
        "Map reload requested{}",
        params
            .url
            .as_deref()
            .map(|url| format!(" from {}", url))
            .unwrap_or_default()
    );
    ctx.reloads.write(ReloadMapRequest { url: params.url });
    Ok(json!({ "reloading": true }))
}

fn handle_get_fps(diagnostics: &DiagnosticsStore) -> MethodResult {
    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|fps_diagnostic| fps_diagnostic.smoothed())
        .unwrap_or(0.0) as f32;

    Ok(json!({ "fps": fps }))
}
