mod projection;
mod scene;
mod viewport;

pub use scene::{MapScene, SceneBuilder};
