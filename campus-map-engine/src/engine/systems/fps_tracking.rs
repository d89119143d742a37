use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use serde_json::json;

use crate::rpc::web_rpc::WebRpcInterface;

const FPS_NOTIFY_INTERVAL_SECS: f32 = 0.5;

/// Native on-screen frame rate readout.
#[derive(Component)]
pub struct FpsText;

fn smoothed_fps(diagnostics: &DiagnosticsStore) -> Option<f64> {
    diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|fps| fps.smoothed())
}

/// Reports the smoothed frame rate to the page twice a second.
pub fn fps_notification_system(
    mut rpc_interface: ResMut<WebRpcInterface>,
    diagnostics: Res<DiagnosticsStore>,
    time: Res<Time>,
    mut last_sent: Local<Option<f32>>,
) {
    let now = time.elapsed_secs();
    if last_sent.is_some_and(|sent| now - sent < FPS_NOTIFY_INTERVAL_SECS) {
        return;
    }
    let Some(fps) = smoothed_fps(&diagnostics) else {
        return;
    };

    rpc_interface.send_notification("fps_update", json!({ "fps": fps as f32 }));
    *last_sent = Some(now);
}

pub fn spawn_fps_overlay(mut commands: Commands) {
    commands.spawn((
        Text::new("FPS: "),
        TextFont {
            font_size: 14.0,
            ..default()
        },
        TextColor(Color::srgb(1.0, 0.0, 0.0)),
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(12.0),
            right: Val::Px(12.0),
            ..default()
        },
        FpsText,
    ));
}

pub fn fps_text_update_system(
    diagnostics: Res<DiagnosticsStore>,
    mut query: Query<&mut Text, With<FpsText>>,
) {
    let Some(fps) = smoothed_fps(&diagnostics) else {
        return;
    };
    for mut text in &mut query {
        text.0 = format!("FPS: {fps:.1}");
    }
}
