//! Operations on the active selection: align, group/ungroup, stacking order,
//! clipboard, lock and delete.
//!
//! Geo-code linked objects (markers and placed labels) are persisted through
//! their positions, so they never join a group and are never copied.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use tracing::debug;

use crate::consts::PASTE_OFFSET;
use crate::doc::{Bounds, ObjectId, ObjectKind, SceneObject};
use crate::hit;
use crate::surface::Surface;
use crate::viewport::Point;

/// Edge or center the selection is aligned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    HCenter,
    Right,
    Top,
    VCenter,
    Bottom,
}

/// Stacking-order move applied to every selected object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerMove {
    ToFront,
    Forward,
    Backward,
    ToBack,
}

fn is_linked(obj: &SceneObject) -> bool {
    obj.role.geo_code_id().is_some()
}

/// Union of the bounding boxes of `ids`.
#[must_use]
pub fn selection_bounds(surface: &Surface, ids: &[ObjectId]) -> Option<Bounds> {
    ids.iter()
        .filter_map(|id| surface.scene.get(id))
        .map(SceneObject::bounds)
        .reduce(|a, b| a.union(&b))
}

/// Align the unlocked selected objects on the selection's bounds. Returns the
/// ids that moved.
pub fn align(surface: &mut Surface, mode: Alignment) -> Vec<ObjectId> {
    let items: Vec<(ObjectId, Bounds)> = surface
        .selected_objects()
        .into_iter()
        .filter(|o| !o.locked)
        .map(|o| (o.id, o.bounds()))
        .collect();
    if items.len() < 2 {
        return Vec::new();
    }
    let Some(overall) = items.iter().map(|(_, b)| *b).reduce(|a, b| a.union(&b)) else {
        return Vec::new();
    };
    let mut moved = Vec::new();
    for (id, b) in items {
        let (dx, dy) = match mode {
            Alignment::Left => (overall.left - b.left, 0.0),
            Alignment::HCenter => (overall.center().x - b.center().x, 0.0),
            Alignment::Right => (overall.right() - b.right(), 0.0),
            Alignment::Top => (0.0, overall.top - b.top),
            Alignment::VCenter => (0.0, overall.center().y - b.center().y),
            Alignment::Bottom => (0.0, overall.bottom() - b.bottom()),
        };
        if dx.abs() < f64::EPSILON && dy.abs() < f64::EPSILON {
            continue;
        }
        if let Some(obj) = surface.scene.get_mut(&id) {
            obj.translate(dx, dy);
            moved.push(id);
        }
    }
    moved
}

/// Replace two or more selected objects with one group at the position of the
/// topmost member. Returns the group id.
pub fn group(surface: &mut Surface) -> Option<ObjectId> {
    let members: Vec<ObjectId> = surface
        .selected_objects()
        .into_iter()
        .filter(|o| !is_linked(o) && !o.role.is_structural())
        .map(|o| o.id)
        .collect();
    if members.len() < 2 {
        return None;
    }
    let insert_at = members.iter().filter_map(|id| surface.scene.index_of(id)).max()?;
    let bounds = selection_bounds(surface, &members)?;

    let mut children = Vec::with_capacity(members.len());
    for id in &members {
        if let Some(obj) = surface.scene.remove(id) {
            children.push(obj);
        }
    }
    let mut grouped = SceneObject::new(ObjectKind::Group, bounds);
    grouped.children = children;
    let group_id = grouped.id;

    let idx = insert_at.saturating_sub(members.len() - 1).min(surface.scene.len());
    surface.scene.insert(grouped);
    move_to_index(surface, &group_id, idx);
    surface.select_one(group_id);
    debug!(members = members.len(), %group_id, "objects grouped");
    Some(group_id)
}

/// Dissolve every selected group, putting its children back in its place.
/// Returns the ids of the released children.
pub fn ungroup(surface: &mut Surface) -> Vec<ObjectId> {
    let groups: Vec<ObjectId> = surface
        .selected_objects()
        .into_iter()
        .filter(|o| o.kind == ObjectKind::Group)
        .map(|o| o.id)
        .collect();
    let mut released = Vec::new();
    for group_id in groups {
        let Some(idx) = surface.scene.index_of(&group_id) else {
            continue;
        };
        let Some(group) = surface.scene.remove(&group_id) else {
            continue;
        };
        let (pivot, angle) = (group.center(), group.angle);
        for (offset, mut child) in group.children.into_iter().enumerate() {
            if angle.abs() > f64::EPSILON {
                rotate_into_parent(&mut child, pivot, angle);
            }
            released.push(child.id);
            let child_id = child.id;
            surface.scene.insert(child);
            move_to_index(surface, &child_id, idx + offset);
        }
    }
    if !released.is_empty() {
        surface.select(released.clone());
    }
    released
}

/// Carry a group's rotation over to a child being released from it.
fn rotate_into_parent(child: &mut SceneObject, pivot: Point, angle: f64) {
    let center = child.center();
    let moved = hit::rotate_point(center, pivot, angle);
    child.translate(moved.x - center.x, moved.y - center.y);
    child.angle = (child.angle + angle).rem_euclid(360.0);
}

fn move_to_index(surface: &mut Surface, id: &ObjectId, target: usize) {
    // Scene only exposes adjacent swaps; walk the object down to `target`.
    while surface.scene.index_of(id).is_some_and(|idx| idx > target) {
        if !surface.scene.send_backward(id) {
            break;
        }
    }
}

/// Apply a stacking-order move to the selection. Returns whether anything moved.
pub fn reorder(surface: &mut Surface, layer: LayerMove) -> bool {
    let mut ids: Vec<ObjectId> = surface.selected_objects().iter().map(|o| o.id).collect();
    // Handle the member nearest the destination first so members keep their order.
    if matches!(layer, LayerMove::ToBack | LayerMove::Forward) {
        ids.reverse();
    }
    let mut changed = false;
    for id in &ids {
        changed |= match layer {
            LayerMove::ToFront => surface.scene.bring_to_front(id),
            LayerMove::Forward => surface.scene.bring_forward(id),
            LayerMove::Backward => surface.scene.send_backward(id),
            LayerMove::ToBack => surface.scene.send_to_back(id),
        };
    }
    changed
}

/// Toggle the lock on the selection: lock all when any is unlocked, otherwise
/// unlock all. Returns the new state, or `None` for an empty selection.
pub fn toggle_lock(surface: &mut Surface) -> Option<bool> {
    let ids: Vec<ObjectId> = surface.selection().to_vec();
    if ids.is_empty() {
        return None;
    }
    let lock = surface.selected_objects().iter().any(|o| !o.locked);
    for id in &ids {
        if let Some(obj) = surface.scene.get_mut(id) {
            obj.locked = lock;
        }
    }
    Some(lock)
}

/// Remove the selected objects (never structural ones). Returns them.
pub fn delete(surface: &mut Surface) -> Vec<SceneObject> {
    let ids: Vec<ObjectId> = surface.selection().to_vec();
    let mut removed = Vec::with_capacity(ids.len());
    for id in &ids {
        let structural = surface.scene.get(id).is_some_and(|o| o.role.is_structural());
        if structural {
            continue;
        }
        if let Some(obj) = surface.scene.remove(id) {
            removed.push(obj);
        }
    }
    if surface.editing_text().is_some_and(|id| ids.contains(&id)) {
        surface.end_text_edit();
    }
    surface.clear_selection();
    removed
}

/// Copied objects waiting to be pasted.
#[derive(Debug, Default, Clone)]
pub struct Clipboard {
    objects: Vec<SceneObject>,
    pastes: u32,
}

impl Clipboard {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Copy the selection, skipping linked and structural objects. Returns the count.
    pub fn copy(&mut self, surface: &Surface) -> usize {
        self.objects = surface
            .selected_objects()
            .into_iter()
            .filter(|o| !is_linked(o) && !o.role.is_structural())
            .cloned()
            .collect();
        self.pastes = 0;
        self.objects.len()
    }

    /// Insert fresh copies offset from the originals and select them.
    pub fn paste(&mut self, surface: &mut Surface) -> Vec<ObjectId> {
        if self.objects.is_empty() {
            return Vec::new();
        }
        self.pastes += 1;
        let offset = PASTE_OFFSET * f64::from(self.pastes);
        let mut ids = Vec::with_capacity(self.objects.len());
        for obj in &self.objects {
            let mut copy = obj.duplicate();
            copy.translate(offset, offset);
            copy.locked = false;
            copy.selectable = true;
            copy.evented = true;
            ids.push(copy.id);
            surface.scene.insert(copy);
        }
        surface.select(ids.clone());
        ids
    }
}
