use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use constants::map::DEFAULT_INSTANCE_ID;

use super::animator::{CameraAnimationEnded, CameraAnimator};
use super::orbit_controls::{MapCamera, OrbitControls};
use crate::rpc::web_rpc::WebRpcInterface;

/// Camera placement shared between viewer instances.
#[derive(Event, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraSetMessage {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub source_id: String,
}

impl CameraSetMessage {
    pub fn new(position: Vec3, target: Vec3, source_id: impl Into<String>) -> Self {
        Self {
            position: position.to_array(),
            target: target.to_array(),
            source_id: source_id.into(),
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn target(&self) -> Vec3 {
        Vec3::from_array(self.target)
    }
}

/// Owner of the last known camera placement across instances.
#[derive(Resource, Debug, Clone)]
pub struct CameraSyncBus {
    instance_id: String,
    last_camera: Option<CameraSetMessage>,
}

impl Default for CameraSyncBus {
    fn default() -> Self {
        Self::new(DEFAULT_INSTANCE_ID)
    }
}

impl CameraSyncBus {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            last_camera: None,
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn last_camera(&self) -> Option<&CameraSetMessage> {
        self.last_camera.as_ref()
    }

    pub fn is_local(&self, message: &CameraSetMessage) -> bool {
        message.source_id == self.instance_id
    }

    pub fn record(&mut self, message: &CameraSetMessage) {
        self.last_camera = Some(message.clone());
    }
}

/// Publishes the camera once user motion settles or an animation completes.
pub fn publish_camera_changes(
    mut controls: ResMut<OrbitControls>,
    mut ended: EventReader<CameraAnimationEnded>,
    camera: Query<&Transform, With<MapCamera>>,
    bus: Res<CameraSyncBus>,
    mut messages: EventWriter<CameraSetMessage>,
) {
    let animation_done = ended.read().any(|event| !event.cancelled);
    if !(controls.take_settled() || animation_done) {
        return;
    }
    let Ok(transform) = camera.single() else {
        return;
    };
    messages.write(CameraSetMessage::new(
        transform.translation,
        controls.target,
        bus.instance_id(),
    ));
}

/// Records every camera message; forwards local ones to the page and applies foreign ones.
pub fn apply_camera_messages(
    mut messages: EventReader<CameraSetMessage>,
    mut bus: ResMut<CameraSyncBus>,
    mut controls: ResMut<OrbitControls>,
    animator: Res<CameraAnimator>,
    mut camera: Query<&mut Transform, With<MapCamera>>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for message in messages.read() {
        bus.record(message);

        if bus.is_local(message) {
            match serde_json::to_value(message) {
                Ok(params) => rpc_interface.send_notification("camera_set", params),
                Err(e) => error!("Failed to serialize camera message: {}", e),
            }
            continue;
        }

        if animator.is_animating() {
            debug!("Ignoring camera from {} during animation", message.source_id);
            continue;
        }

        controls.sync_to_pose(message.position(), message.target());
        if let Ok(mut transform) = camera.single_mut() {
            *transform =
                Transform::from_translation(message.position()).looking_at(message.target(), Vec3::Y);
        }
    }
}
