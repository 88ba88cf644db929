// Export Adapter: layout-safe render tree, text cleanup, and the renderer collaborator.

pub mod handlers;
pub mod render_tree;
pub mod renderer;
pub mod sanitize;

pub use render_tree::{to_render_tree, RenderNode, RenderTree};
