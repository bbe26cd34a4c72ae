//! OS2mo response types.
//!
//! Only the fields the sync reads are modelled; everything else in the
//! responses is ignored by serde.

use serde::{Deserialize, Serialize};

/// A bare `{"uuid": ...}` reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UuidRef {
    pub uuid: String,
}

/// A `{"name": ...}` reference (job function, IT system).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonRef {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
}

/// Entry in `GET /service/o/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organisation {
    pub uuid: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// One page of a bulk listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub total: Option<usize>,
}

/// Org unit as returned by the bulk listing and the children endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrgUnitSummary {
    pub uuid: String,
    pub name: String,
}

/// Org unit as returned by `GET /service/ou/{uuid}/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrgUnitDetail {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub parent: Option<UuidRef>,
}

/// A manager function attached to an org unit. Vacant when `person` is null.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManagerFunction {
    pub uuid: String,
    #[serde(default)]
    pub person: Option<PersonRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmployeeSummary {
    pub uuid: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItAccount {
    pub itsystem: NamedRef,
    pub user_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddressType {
    pub scope: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub address_type: AddressType,
    pub value: String,
}

impl Address {
    pub fn is_email(&self) -> bool {
        self.address_type.scope == "EMAIL"
    }
}

/// An engagement, seen either from the person or from the org unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Engagement {
    #[serde(default)]
    pub person: Option<PersonRef>,
    pub job_function: NamedRef,
    pub org_unit: UuidRef,
}
