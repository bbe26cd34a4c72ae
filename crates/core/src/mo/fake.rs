//! In-memory [`OrgSource`] for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::models::{AddressType, NamedRef, PersonRef, UuidRef};
use super::{
    Address, EmployeeSummary, Engagement, ItAccount, ManagerFunction, OrgSource, OrgUnitDetail,
    OrgUnitSummary,
};
use crate::errors::SourceError;

#[derive(Default)]
pub struct FakeSource {
    pub org_units: Vec<OrgUnitDetail>,
    pub managers: HashMap<String, Vec<ManagerFunction>>,
    pub unit_engagements: HashMap<String, Vec<Engagement>>,
    pub children: HashMap<String, Vec<OrgUnitSummary>>,
    pub employees: Vec<EmployeeSummary>,
    pub it: HashMap<String, Vec<ItAccount>>,
    pub addresses: HashMap<String, Vec<Address>>,
    pub engagements: HashMap<String, Vec<Engagement>>,
    /// Any request mentioning this uuid fails with HTTP 500.
    pub fail_on: Option<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_org_unit(mut self, uuid: &str, name: &str, parent: Option<&str>) -> Self {
        self.org_units.push(OrgUnitDetail {
            uuid: uuid.into(),
            name: name.into(),
            parent: parent.map(|p| UuidRef { uuid: p.into() }),
        });
        if let Some(parent) = parent {
            self.children
                .entry(parent.into())
                .or_default()
                .push(OrgUnitSummary {
                    uuid: uuid.into(),
                    name: name.into(),
                });
        }
        self
    }

    pub fn with_manager(mut self, org_unit: &str, function_uuid: &str, person: Option<&str>) -> Self {
        self.managers
            .entry(org_unit.into())
            .or_default()
            .push(ManagerFunction {
                uuid: function_uuid.into(),
                person: person.map(|p| PersonRef {
                    uuid: p.into(),
                    name: String::new(),
                }),
            });
        self
    }

    pub fn with_employee(mut self, uuid: &str, name: &str) -> Self {
        self.employees.push(EmployeeSummary {
            uuid: uuid.into(),
            name: name.into(),
        });
        self
    }

    pub fn with_it(mut self, person: &str, system: &str, user_key: &str) -> Self {
        self.it.entry(person.into()).or_default().push(ItAccount {
            itsystem: NamedRef {
                name: system.into(),
            },
            user_key: user_key.into(),
        });
        self
    }

    pub fn with_address(mut self, person: &str, scope: &str, value: &str) -> Self {
        self.addresses
            .entry(person.into())
            .or_default()
            .push(Address {
                address_type: AddressType {
                    scope: scope.into(),
                },
                value: value.into(),
            });
        self
    }

    /// Register an engagement on both the person and the org unit side.
    pub fn with_engagement(mut self, person: &str, person_name: &str, job: &str, org_unit: &str) -> Self {
        let engagement = Engagement {
            person: Some(PersonRef {
                uuid: person.into(),
                name: person_name.into(),
            }),
            job_function: NamedRef { name: job.into() },
            org_unit: UuidRef {
                uuid: org_unit.into(),
            },
        };
        self.engagements
            .entry(person.into())
            .or_default()
            .push(engagement.clone());
        self.unit_engagements
            .entry(org_unit.into())
            .or_default()
            .push(engagement);
        self
    }

    pub fn failing_on(mut self, uuid: &str) -> Self {
        self.fail_on = Some(uuid.into());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), SourceError> {
        let fails = self
            .fail_on
            .as_deref()
            .map(|uuid| call.contains(uuid))
            .unwrap_or(false);
        self.calls.lock().unwrap().push(call.clone());
        if fails {
            return Err(SourceError::ApiError {
                status: 500,
                url: call,
                body: "internal error".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl OrgSource for FakeSource {
    async fn list_org_units(&self) -> Result<Vec<OrgUnitSummary>, SourceError> {
        self.record("list_org_units".into())?;
        Ok(self
            .org_units
            .iter()
            .map(|ou| OrgUnitSummary {
                uuid: ou.uuid.clone(),
                name: ou.name.clone(),
            })
            .collect())
    }

    async fn get_org_unit(&self, uuid: &str) -> Result<OrgUnitDetail, SourceError> {
        self.record(format!("get_org_unit {}", uuid))?;
        self.org_units
            .iter()
            .find(|ou| ou.uuid == uuid)
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                entity: "org unit".into(),
                uuid: uuid.into(),
            })
    }

    async fn get_org_unit_managers(&self, uuid: &str) -> Result<Vec<ManagerFunction>, SourceError> {
        self.record(format!("get_org_unit_managers {}", uuid))?;
        Ok(self.managers.get(uuid).cloned().unwrap_or_default())
    }

    async fn get_org_unit_engagements(&self, uuid: &str) -> Result<Vec<Engagement>, SourceError> {
        self.record(format!("get_org_unit_engagements {}", uuid))?;
        Ok(self.unit_engagements.get(uuid).cloned().unwrap_or_default())
    }

    async fn get_org_unit_children(&self, uuid: &str) -> Result<Vec<OrgUnitSummary>, SourceError> {
        self.record(format!("get_org_unit_children {}", uuid))?;
        Ok(self.children.get(uuid).cloned().unwrap_or_default())
    }

    async fn list_employees(&self) -> Result<Vec<EmployeeSummary>, SourceError> {
        self.record("list_employees".into())?;
        Ok(self.employees.clone())
    }

    async fn get_employee_it(&self, uuid: &str) -> Result<Vec<ItAccount>, SourceError> {
        self.record(format!("get_employee_it {}", uuid))?;
        Ok(self.it.get(uuid).cloned().unwrap_or_default())
    }

    async fn get_employee_addresses(&self, uuid: &str) -> Result<Vec<Address>, SourceError> {
        self.record(format!("get_employee_addresses {}", uuid))?;
        Ok(self.addresses.get(uuid).cloned().unwrap_or_default())
    }

    async fn get_employee_engagements(&self, uuid: &str) -> Result<Vec<Engagement>, SourceError> {
        self.record(format!("get_employee_engagements {}", uuid))?;
        Ok(self.engagements.get(uuid).cloned().unwrap_or_default())
    }
}
