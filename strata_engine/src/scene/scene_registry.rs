/// SceneRegistry — scenes in draw order, addressed by stable keys
///
/// Traversal is fixed: scenes in registration order, then objects in
/// position order. The first scene's pass also hosts the overlay, so
/// registration order decides compositing.

use slotmap::{new_key_type, SlotMap};
use super::scene::Scene;
use super::ui_scene::UiScene;

new_key_type! {
    /// Stable handle to a registered scene
    pub struct SceneKey;
}

/// A registered scene: either a generic scene or a UI adapter over one
pub enum RegisteredScene {
    World(Scene),
    Ui(UiScene),
}

impl RegisteredScene {
    pub fn scene(&self) -> &Scene {
        match self {
            RegisteredScene::World(scene) => scene,
            RegisteredScene::Ui(ui) => ui.scene(),
        }
    }
}

#[derive(Default)]
pub struct SceneRegistry {
    scenes: SlotMap<SceneKey, RegisteredScene>,
    order: Vec<SceneKey>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scene after every existing one
    pub fn add_scene(&mut self, scene: Scene) -> SceneKey {
        self.insert(RegisteredScene::World(scene))
    }

    /// Register a UI scene after every existing one
    pub fn add_ui_scene(&mut self, ui: UiScene) -> SceneKey {
        self.insert(RegisteredScene::Ui(ui))
    }

    fn insert(&mut self, entry: RegisteredScene) -> SceneKey {
        let key = self.scenes.insert(entry);
        self.order.push(key);
        key
    }

    /// Unregister a scene, releasing its device resources when the result is dropped
    ///
    /// The caller must make sure no in-flight frame still reads them.
    pub fn remove_scene(&mut self, key: SceneKey) -> Option<RegisteredScene> {
        let removed = self.scenes.remove(key)?;
        self.order.retain(|k| *k != key);
        Some(removed)
    }

    pub fn get(&self, key: SceneKey) -> Option<&Scene> {
        self.scenes.get(key).map(RegisteredScene::scene)
    }

    /// Mutable access to a generic scene (UI scenes go through [`Self::ui_mut`])
    pub fn scene_mut(&mut self, key: SceneKey) -> Option<&mut Scene> {
        match self.scenes.get_mut(key)? {
            RegisteredScene::World(scene) => Some(scene),
            RegisteredScene::Ui(_) => None,
        }
    }

    pub fn ui_mut(&mut self, key: SceneKey) -> Option<&mut UiScene> {
        match self.scenes.get_mut(key)? {
            RegisteredScene::Ui(ui) => Some(ui),
            RegisteredScene::World(_) => None,
        }
    }

    /// Scenes in draw order
    pub fn iter(&self) -> impl Iterator<Item = (SceneKey, &Scene)> + '_ {
        self.order
            .iter()
            .filter_map(move |key| self.scenes.get(*key).map(|entry| (*key, entry.scene())))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
#[path = "scene_registry_tests.rs"]
mod tests;
