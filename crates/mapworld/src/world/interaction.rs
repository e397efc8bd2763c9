use tracing::debug;

use super::config::NpcHitbox;
use super::entities::{Dialog, Npc, NpcKind};
use super::geometry::Camera2D;

/// Pointer position in client (window) coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerEvent {
    pub client_x: f32,
    pub client_y: f32,
}

/// Client-space offset of the canvas' top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CanvasRect {
    pub left: f32,
    pub top: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickOutcome {
    pub canvas_x: f32,
    pub canvas_y: f32,
    /// Index and id of the NPC whose dialog ended up shown.
    pub npc: Option<(usize, u32)>,
    pub dialog: Dialog,
    pub hits: usize,
}

/// Hit-tests every clickable NPC against the click point.
///
/// Every NPC is tested; nothing stops at the first match. On each hit the
/// dialogs of all other NPCs are hidden, so with overlapping hitboxes the
/// last match in collection order keeps its dialog.
pub fn resolve_click(
    npcs: &mut [Npc],
    event: PointerEvent,
    rect: CanvasRect,
    camera: &Camera2D,
    hitbox: &NpcHitbox,
) -> ClickOutcome {
    let canvas_x = event.client_x - rect.left;
    let canvas_y = event.client_y - rect.top;
    let mut outcome = ClickOutcome {
        canvas_x,
        canvas_y,
        npc: None,
        dialog: Dialog::Hidden,
        hits: 0,
    };

    for index in 0..npcs.len() {
        let npc = &npcs[index];
        if !npc.is_clickable() {
            continue;
        }
        let position = npc.position();
        let left = position.x - camera.x() - hitbox.offset_x;
        let top = position.y - camera.y() - hitbox.offset_y;
        let inside = canvas_x >= left
            && canvas_x <= left + hitbox.width
            && canvas_y >= top
            && canvas_y <= top + hitbox.height;
        if !inside {
            continue;
        }

        for (other_index, other) in npcs.iter_mut().enumerate() {
            if other_index != index {
                other.hide_dialog();
            }
        }

        let npc = &mut npcs[index];
        match npc.kind {
            NpcKind::Taxi => npc.show_taxi_dialog(),
            NpcKind::Standard => npc.show_speech(),
        }
        debug!(npc_id = npc.id, kind = ?npc.kind, canvas_x, canvas_y, "npc_clicked");
        outcome.npc = Some((index, npc.id));
        outcome.dialog = npc.dialog();
        outcome.hits += 1;
    }

    outcome
}
