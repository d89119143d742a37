use bevy::prelude::*;
use serde_json::json;

use crate::engine::backend::client::RouteFetched;
use crate::engine::map_api::MapApi;
use crate::rpc::web_rpc::WebRpcInterface;

/// Traces routes answered by the backend and reports the outcome to the page.
pub fn receive_routes(
    mut events: EventReader<RouteFetched>,
    mut api: MapApi,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for event in events.read() {
        let (from, to) = (event.from, event.to);
        match &event.result {
            Ok(Some(node_ids)) => match api.trace_route(node_ids) {
                Ok(segments) => {
                    rpc_interface.send_notification(
                        "route_traced",
                        json!({
                            "fromNodeId": from,
                            "toNodeId": to,
                            "nodeIds": node_ids,
                            "segments": segments,
                        }),
                    );
                    if api.config().animate_camera_on_route {
                        api.animate_to_top_down(None);
                    }
                }
                Err(e) => {
                    warn!("Route {} -> {} not traced: {}", from, to, e);
                    rpc_interface.send_notification(
                        "route_failed",
                        json!({ "fromNodeId": from, "toNodeId": to, "error": e.to_string() }),
                    );
                }
            },
            Ok(None) => {
                warn!("No route found from {} to {}", from, to);
                rpc_interface.send_notification(
                    "route_not_found",
                    json!({ "fromNodeId": from, "toNodeId": to }),
                );
            }
            Err(e) => {
                error!("Route request {} -> {} failed: {}", from, to, e);
                rpc_interface.send_notification(
                    "route_failed",
                    json!({ "fromNodeId": from, "toNodeId": to, "error": e.to_string() }),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::map_data::NodeId;
    use crate::engine::camera::animator::CameraAnimator;
    use crate::testing::map_test_app;
    use crate::tools::route_tracer::RouteTracer;

    fn methods(app: &App) -> Vec<String> {
        app.world()
            .resource::<WebRpcInterface>()
            .pending_notifications()
            .iter()
            .map(|notification| notification.method.clone())
            .collect()
    }

    #[test]
    fn found_route_is_traced_and_camera_moves_top_down() {
        let mut app = map_test_app();
        app.add_event::<RouteFetched>()
            .add_systems(Update, receive_routes);

        app.world_mut().send_event(RouteFetched {
            from: NodeId(1),
            to: NodeId(3),
            result: Ok(Some(vec![NodeId(1), NodeId(2), NodeId(3)])),
        });
        app.update();

        let tracer = app.world().resource::<RouteTracer>();
        assert_eq!(tracer.segments().len(), 2);
        assert!(app.world().resource::<CameraAnimator>().is_animating());
        assert_eq!(methods(&app), vec!["route_traced"]);
    }

    #[test]
    fn missing_route_traces_nothing() {
        let mut app = map_test_app();
        app.add_event::<RouteFetched>()
            .add_systems(Update, receive_routes);

        app.world_mut().send_event(RouteFetched {
            from: NodeId(1),
            to: NodeId(3),
            result: Ok(None),
        });
        app.update();

        assert!(app.world().resource::<RouteTracer>().current_route().is_none());
        assert!(!app.world().resource::<CameraAnimator>().is_animating());
        assert_eq!(methods(&app), vec!["route_not_found"]);
    }
}
