use bevy::prelude::*;
use serde_json::json;

use crate::engine::camera::animator::CameraAnimationEnded;
use crate::engine::flags::FeatureFlags;

use super::web_rpc::WebRpcInterface;

pub fn notify_feature_flag_changes(
    flags: Res<FeatureFlags>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    if flags.is_changed() && !flags.is_added() {
        rpc_interface.send_notification("feature_flags_changed", json!(*flags));
    }
}

pub fn notify_camera_animation_end(
    mut ended: EventReader<CameraAnimationEnded>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for event in ended.read() {
        rpc_interface.send_notification(
            "camera_animation_finished",
            json!({
                "animationId": event.animation_id,
                "cancelled": event.cancelled,
            }),
        );
    }
}
