pub mod chunk;
pub mod debug_lines;
pub mod lighting;
pub mod renderer;

pub use chunk::GpuChunk;
pub use debug_lines::DebugVertex;
pub use lighting::{LightUniforms, SceneLight};
pub use renderer::{CameraUniforms, Renderer};
