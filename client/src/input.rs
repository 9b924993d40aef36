//! Keyboard and mouse input
//!
//! Keys feed the shared `InputState` snapshot read by the fixed step. Mouse motion turns the
//! walker directly, event by event.

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, CursorOptions, PrimaryWindow};
use pinewalk_shared::{ActorState, InputState, MoveKey, WalkConfig};

use crate::player::Walker;

/// Key bindings for the held-state table.
const BINDINGS: [(KeyCode, MoveKey); 5] = [
    (KeyCode::KeyW, MoveKey::Forward),
    (KeyCode::KeyS, MoveKey::Backward),
    (KeyCode::KeyA, MoveKey::Left),
    (KeyCode::KeyD, MoveKey::Right),
    (KeyCode::Space, MoveKey::Jump),
];

/// Refresh the held-key table from the keyboard.
pub fn handle_keyboard_input(keyboard: Res<ButtonInput<KeyCode>>, mut input_state: ResMut<InputState>) {
    for (code, key) in BINDINGS {
        input_state.set(key, keyboard.pressed(code));
    }
}

/// Turn the walker with the mouse while the pointer is captured.
pub fn handle_mouse_input(
    mut mouse_motion: MessageReader<MouseMotion>,
    cursor: Query<&CursorOptions, With<PrimaryWindow>>,
    config: Res<WalkConfig>,
    mut walker: Query<&mut ActorState, With<Walker>>,
) {
    let captured = cursor
        .single()
        .is_ok_and(|c| c.grab_mode != CursorGrabMode::None);
    if !captured {
        mouse_motion.clear();
        return;
    }

    let Ok(mut actor) = walker.single_mut() else {
        return;
    };

    for motion in mouse_motion.read() {
        actor.apply_look(
            motion.delta,
            config.movement.mouse_sensitivity,
            config.movement.pitch_limit,
        );
    }
}

/// Capture the pointer on left click.
pub fn grab_cursor(
    windows: Query<Entity, With<PrimaryWindow>>,
    mut cursor_opts: Query<&mut CursorOptions>,
    mouse_button: Res<ButtonInput<MouseButton>>,
) {
    if !mouse_button.just_pressed(MouseButton::Left) {
        return;
    }
    let Ok(window_entity) = windows.single() else {
        return;
    };
    if let Ok(mut cursor) = cursor_opts.get_mut(window_entity) {
        cursor.grab_mode = CursorGrabMode::Locked;
        cursor.visible = false;
    }
}

/// Give the pointer back on Escape.
pub fn release_cursor(
    windows: Query<Entity, With<PrimaryWindow>>,
    mut cursor_opts: Query<&mut CursorOptions>,
    keyboard: Res<ButtonInput<KeyCode>>,
) {
    if !keyboard.just_pressed(KeyCode::Escape) {
        return;
    }
    let Ok(window_entity) = windows.single() else {
        return;
    };
    if let Ok(mut cursor) = cursor_opts.get_mut(window_entity) {
        cursor.grab_mode = CursorGrabMode::None;
        cursor.visible = true;
    }
}
