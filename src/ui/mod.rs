//! Shell presentation: layout, widget state, map geometry and rendering

pub mod layout;
pub mod map_view;
pub mod renderer;
pub mod shell;

pub use layout::{Control, ShellLayout};
pub use map_view::MapScene;
pub use renderer::{Frame, RendererError, ShellRenderer};
pub use shell::SearchBox;
