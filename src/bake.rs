mod exec;
mod highlight;
mod html;
mod notebook;
mod paths;
pub mod pipeline;
mod render;
mod scan;
mod strip;
mod style;

pub use exec::NbconvertExecutor;
pub use render::renderer_from_config;
