//! Baking stages.
//!
//! The full pipeline runs them in this order:
//!
//! 1. **StyleStage** - Validate markdown cells and inline their class styles
//! 2. **WriteSolvedStage** - Save the styled solved notebook
//! 3. **RunStage** (solved) - Re-execute it and scan for errors
//! 4. **DeriveUnsolvedStage** - Write the copy one directory up, paths promoted
//! 5. **RunStage** (unsolved) - Re-execute the copy from its new location
//! 6. **CleanUnsolvedStage** - Strip solutions, clear outputs, save
//! 7. **RenderStage** - Render the solved notebook to HTML

mod clean;
mod derive;
mod render;
mod run;
mod style;
mod write;

pub use clean::CleanUnsolvedStage;
pub use derive::DeriveUnsolvedStage;
pub use render::RenderStage;
pub use run::RunStage;
pub use style::StyleStage;
pub use write::WriteSolvedStage;
