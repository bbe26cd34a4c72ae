//! Read access to OS2mo.
//!
//! [`OrgSource`] is the read contract the transformers depend on;
//! [`MoClient`] implements it against the OS2mo `/service` REST API.

pub mod client;
#[cfg(test)]
pub(crate) mod fake;
pub mod models;

use async_trait::async_trait;

use crate::errors::SourceError;

pub use client::MoClient;
pub use models::{
    Address, EmployeeSummary, Engagement, ItAccount, ManagerFunction, OrgUnitDetail,
    OrgUnitSummary,
};

/// Everything the sync reads from the organisation-management system.
///
/// Listings return objects in the source's native order, which the
/// transformers preserve.
#[async_trait]
pub trait OrgSource: Send + Sync {
    /// All org units of the organisation. The listing carries no parent.
    async fn list_org_units(&self) -> Result<Vec<OrgUnitSummary>, SourceError>;

    /// A single org unit, including its parent reference.
    async fn get_org_unit(&self, uuid: &str) -> Result<OrgUnitDetail, SourceError>;

    async fn get_org_unit_managers(&self, uuid: &str)
        -> Result<Vec<ManagerFunction>, SourceError>;

    async fn get_org_unit_engagements(&self, uuid: &str) -> Result<Vec<Engagement>, SourceError>;

    async fn get_org_unit_children(&self, uuid: &str) -> Result<Vec<OrgUnitSummary>, SourceError>;

    /// All employees of the organisation.
    async fn list_employees(&self) -> Result<Vec<EmployeeSummary>, SourceError>;

    /// IT-system accounts of a person.
    async fn get_employee_it(&self, uuid: &str) -> Result<Vec<ItAccount>, SourceError>;

    async fn get_employee_addresses(&self, uuid: &str) -> Result<Vec<Address>, SourceError>;

    async fn get_employee_engagements(&self, uuid: &str) -> Result<Vec<Engagement>, SourceError>;
}
