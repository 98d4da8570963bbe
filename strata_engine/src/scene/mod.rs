/// Scene module - scenes, their objects, and the registry ordering them

pub mod layouts;
pub mod mesh;
pub mod render_object;
pub mod camera;
pub mod scene;
pub mod scene_registry;
pub mod ui_scene;

pub use layouts::{scene_binding_layout, texture_binding_layout, SCENE_SET, TEXTURE_SET};
pub use mesh::{Mesh, Vertex};
pub use render_object::{ObjectDesc, RenderObject, TransformBlock};
pub use camera::{Camera, CameraBlock, Projection};
pub use scene::{Scene, SceneFrameResources, TextureSet};
pub use scene_registry::{RegisteredScene, SceneKey, SceneRegistry};
pub use ui_scene::{PanelId, PanelRect, UiScene};
