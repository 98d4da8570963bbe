use super::*;
use crate::frame::DynamicBlockLayout;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::scene::{Scene, UiScene};

fn layout() -> DynamicBlockLayout {
    DynamicBlockLayout::plan(256, 128, 4).unwrap()
}

#[test]
fn test_iteration_follows_registration_order() {
    let device = MockGraphicsDevice::new();
    let mut registry = SceneRegistry::new();
    let names = ["sky", "world", "hud"];
    for name in names {
        registry.add_scene(Scene::new(&device, name, layout(), 2).unwrap());
    }
    let visited: Vec<&str> = registry.iter().map(|(_, s)| s.name()).collect();
    assert_eq!(visited, names);
}

#[test]
fn test_remove_scene_keeps_other_keys_valid() {
    let device = MockGraphicsDevice::new();
    let mut registry = SceneRegistry::new();
    let a = registry.add_scene(Scene::new(&device, "a", layout(), 2).unwrap());
    let b = registry.add_scene(Scene::new(&device, "b", layout(), 2).unwrap());
    let c = registry.add_scene(Scene::new(&device, "c", layout(), 2).unwrap());

    assert!(registry.remove_scene(b).is_some());
    assert!(registry.remove_scene(b).is_none());
    assert!(registry.get(b).is_none());
    assert_eq!(registry.get(a).unwrap().name(), "a");
    assert_eq!(registry.get(c).unwrap().name(), "c");
    assert_eq!(registry.len(), 2);
    let visited: Vec<&str> = registry.iter().map(|(_, s)| s.name()).collect();
    assert_eq!(visited, ["a", "c"]);
}

#[test]
fn test_ui_scene_is_not_exposed_as_generic_scene() {
    let device = MockGraphicsDevice::new();
    let mut registry = SceneRegistry::new();
    let world = registry.add_scene(Scene::new(&device, "world", layout(), 2).unwrap());
    let ui = registry.add_ui_scene(UiScene::new(&device, "ui", layout(), 2).unwrap());

    assert!(registry.scene_mut(world).is_some());
    assert!(registry.ui_mut(world).is_none());
    assert!(registry.scene_mut(ui).is_none());
    assert!(registry.ui_mut(ui).is_some());
    assert_eq!(registry.get(ui).unwrap().name(), "ui");
}
