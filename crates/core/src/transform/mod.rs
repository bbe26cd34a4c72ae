//! Reshaping OS2mo data into OS2rollekatalog payloads.
//!
//! - [`org_units`]: flat org unit list with parent and manager.
//! - [`employees`]: user list joined against the identity mapping.
//! - [`tree`]: the older nested org unit tree.
//!
//! Every transformer pulls from an [`OrgSource`](crate::mo::OrgSource),
//! preserves the source's order, and appends data-integrity warnings to the
//! caller's list instead of failing.

pub mod employees;
pub mod org_units;
pub mod tree;

pub use employees::transform_employees;
pub use org_units::transform_org_units;
pub use tree::build_org_tree;
