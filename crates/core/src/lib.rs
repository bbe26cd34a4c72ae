//! OS2mo → OS2rollekatalog synchronization core library.
//!
//! This crate reads org units and employees from OS2mo, joins employees
//! against a local identity mapping file, reshapes everything into the
//! OS2rollekatalog organisation payload and POSTs it in a single request.

pub mod config;
pub mod errors;
pub mod identity;
pub mod mo;
pub mod models;
pub mod rollekatalog;
pub mod sync_engine;
pub mod transform;

// Re-exports for convenience.
pub use config::AppConfig;
pub use errors::CoreError;
pub use identity::{IdentityMapping, MappingFile};
pub use mo::{MoClient, OrgSource};
pub use rollekatalog::{RoleCatalogClient, RoleCatalogSink};
pub use sync_engine::{SyncEngine, SyncReport};
