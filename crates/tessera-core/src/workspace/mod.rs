//! Workspace model
//!
//! A [`Project`] owns an ordered list of [`Workspace`]s. Each workspace is an
//! opaque container: an identity plus type-indexed state owned by providers.
//!
//! # Architecture
//!
//! ```text
//! Project
//!     │
//!     ├── Workspace (id, name)
//!     │   └── HashMap<TypeId, Box<dyn Any>>   (provider state)
//!     │
//!     └── ProjectStorage (disk I/O)
//!         └── <path>/project.xml  (atomic temp-file + rename)
//! ```

mod storage;
mod types;

pub use storage::ProjectStorage;
pub use types::{Project, Workspace, WorkspaceId};
