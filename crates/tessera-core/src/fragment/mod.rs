//! Fragment layer
//!
//! Everything between a workspace element and the providers:
//!
//! ```text
//! save:  write_workspace ──→ FragmentWriter (buffered) ──→ StreamWriter
//! load:  StreamReader ──→ FragmentDispatcher ──→ FragmentReader ──→ provider
//!                                 │
//!                                 └── unrecognized ──→ skipped / RetainedFragments
//! ```

mod dispatcher;
mod reader;
mod retained;
mod writer;

pub use dispatcher::{DispatchEnd, FragmentDispatcher, WorkspaceReadOutcome};
pub(crate) use dispatcher::skip_subtree;
pub use reader::FragmentReader;
pub use retained::{RetainedFragment, RetainedFragments};
pub use writer::{write_workspace, FragmentWriter, WorkspaceWriteOutcome};
