//! Employee identity resolution.
//!
//! Two lookups feed every user record:
//! 1. The mapping file, translating an OS2mo person uuid into the external
//!    directory GUID (`extUuid`). Employees missing from it are not synced.
//! 2. The person's IT accounts in OS2mo, filtered to the configured
//!    directory system, giving the login (`userId`).

pub mod directory;
pub mod mapping_file;

pub use directory::resolve_directory_user;
pub use mapping_file::{IdentityMapping, MappingFile};
