//! Provider abstraction and registry
//!
//! Providers are registered once at startup and looked up by identifier. The
//! identifier doubles as the tag of the provider's fragment.

mod properties;
mod registry;
mod traits;

pub use properties::{Properties, PropertiesProvider, PropertySet};
pub use registry::{ProviderEntry, ProviderRegistry, RegistrySnapshot};
pub use traits::{FragmentProvider, ProviderCapabilities, ProviderError, SharedProvider};
