//! Payload types sent to OS2rollekatalog, plus the data-integrity warnings
//! collected while building them.
//!
//! Field names follow the role catalog's wire format, so the flat payload is
//! camelCase while the legacy tree payload is snake_case with two
//! hyphenated KLE keys.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Flat payload
// ---------------------------------------------------------------------------

/// The organisation import payload: every org unit and every mapped user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrganisationPayload {
    pub org_units: Vec<OrgUnit>,
    pub users: Vec<User>,
}

/// One organisational unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrgUnit {
    pub uuid: String,
    pub name: String,
    pub parent_org_unit_uuid: Option<String>,
    pub manager: Option<Manager>,
}

/// The manager of an org unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Manager {
    /// The OS2mo manager function's uuid.
    pub uuid: String,
    /// The manager's directory user id.
    pub user_id: String,
}

/// One employee with a directory mapping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// External (directory) identifier from the mapping file. Never empty.
    pub ext_uuid: String,
    pub user_id: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub positions: Vec<Position>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Job function title.
    pub name: String,
    pub org_unit_uuid: String,
}

// ---------------------------------------------------------------------------
// Tree payload
// ---------------------------------------------------------------------------

/// An org unit and its subtree, as accepted by the older role catalog API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrgTreeNode {
    pub uuid: String,
    pub name: String,
    pub employees: Vec<TreeEmployee>,
    #[serde(rename = "kle-performing")]
    pub kle_performing: Vec<String>,
    #[serde(rename = "kle-interest")]
    pub kle_interest: Vec<String>,
    pub children: Vec<OrgTreeNode>,
}

impl OrgTreeNode {
    /// Number of nodes in this subtree, including `self`.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(OrgTreeNode::len).sum::<usize>()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreeEmployee {
    pub uuid: String,
    pub name: String,
    pub user_id: String,
    pub title: Option<String>,
}

// ---------------------------------------------------------------------------
// Either payload
// ---------------------------------------------------------------------------

/// What gets POSTed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RoleCatalogPayload {
    Flat(OrganisationPayload),
    Tree(OrgTreeNode),
}

impl RoleCatalogPayload {
    pub fn org_unit_count(&self) -> usize {
        match self {
            Self::Flat(p) => p.org_units.len(),
            Self::Tree(t) => t.len(),
        }
    }

    pub fn user_count(&self) -> usize {
        match self {
            Self::Flat(p) => p.users.len(),
            Self::Tree(t) => count_tree_employees(t),
        }
    }
}

fn count_tree_employees(node: &OrgTreeNode) -> usize {
    node.employees.len() + node.children.iter().map(count_tree_employees).sum::<usize>()
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// A data-integrity problem that was resolved by a best-effort choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataWarning {
    /// The org unit has several managers; the first was used.
    MultipleManagers { org_unit_uuid: String, count: usize },
    /// The employee has several email addresses; the first was used.
    MultipleEmails { employee_uuid: String, count: usize },
    /// The person has several directory accounts; the first was used.
    MultipleDirectoryAccounts { person_uuid: String, count: usize },
    /// The employee is absent from the mapping file and was left out.
    UnmappedEmployee { employee_uuid: String },
}

impl std::fmt::Display for DataWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultipleManagers { org_unit_uuid, count } => {
                write!(f, "{} managers exist for {}", count, org_unit_uuid)
            }
            Self::MultipleEmails { employee_uuid, count } => {
                write!(f, "{} emails exist for user {}", count, employee_uuid)
            }
            Self::MultipleDirectoryAccounts { person_uuid, count } => {
                write!(f, "{} directory users exist for employee {}", count, person_uuid)
            }
            Self::UnmappedEmployee { employee_uuid } => {
                write!(f, "unable to find employee in mapping with UUID {}", employee_uuid)
            }
        }
    }
}
