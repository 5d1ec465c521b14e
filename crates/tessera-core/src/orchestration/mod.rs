//! Save and load passes over a whole project
//!
//! ```text
//! <project version="1">
//!   <workspace id="…" name="…">   ← one per Workspace, project order
//!     <identifier>…</identifier>  ← one per provider, snapshot order
//!   </workspace>
//! </project>
//! ```

mod load;
mod save;

pub use load::LoadOrchestrator;
pub use save::SaveOrchestrator;

/// Root element of a project document
pub const PROJECT_ELEMENT: &str = "project";

/// Element wrapping one workspace's fragments
pub const WORKSPACE_ELEMENT: &str = "workspace";

/// Format version written to `<project version="…">`
pub const FORMAT_VERSION: u32 = 1;

const VERSION_ATTRIBUTE: &str = "version";
const ID_ATTRIBUTE: &str = "id";
const NAME_ATTRIBUTE: &str = "name";
