//! Org unit transformer.

use tracing::{debug, error, info, warn};

use crate::errors::{CoreError, TransformError};
use crate::identity::resolve_directory_user;
use crate::mo::OrgSource;
use crate::models::{DataWarning, Manager, OrgUnit};

/// Build one [`OrgUnit`] per unit in the organisation.
///
/// The bulk listing lacks the parent reference, so each unit is fetched
/// again by uuid. A manager without a directory account aborts the run.
pub async fn transform_org_units<S>(
    source: &S,
    ad_system_name: &str,
    warnings: &mut Vec<DataWarning>,
) -> Result<Vec<OrgUnit>, CoreError>
where
    S: OrgSource + ?Sized,
{
    let units = source.list_org_units().await?;
    info!(count = units.len(), "transforming org units");

    let mut converted = Vec::with_capacity(units.len());
    for unit in units {
        let detail = source.get_org_unit(&unit.uuid).await?;
        let manager = resolve_manager(source, &unit.uuid, ad_system_name, warnings).await?;

        debug!(uuid = %unit.uuid, has_manager = manager.is_some(), "converted org unit");
        converted.push(OrgUnit {
            uuid: unit.uuid,
            name: unit.name,
            parent_org_unit_uuid: detail.parent.map(|p| p.uuid),
            manager,
        });
    }

    Ok(converted)
}

async fn resolve_manager<S>(
    source: &S,
    org_unit_uuid: &str,
    ad_system_name: &str,
    warnings: &mut Vec<DataWarning>,
) -> Result<Option<Manager>, CoreError>
where
    S: OrgSource + ?Sized,
{
    let managers = source.get_org_unit_managers(org_unit_uuid).await?;
    let Some(manager) = managers.first() else {
        return Ok(None);
    };

    if managers.len() > 1 {
        let warning = DataWarning::MultipleManagers {
            org_unit_uuid: org_unit_uuid.to_string(),
            count: managers.len(),
        };
        warn!(org_unit_uuid, count = managers.len(), "{}", warning);
        warnings.push(warning);
    }

    let Some(person) = &manager.person else {
        debug!(org_unit_uuid, manager_uuid = %manager.uuid, "manager function is vacant");
        return Ok(None);
    };

    let accounts = source.get_employee_it(&person.uuid).await?;
    match resolve_directory_user(&accounts, ad_system_name, &person.uuid, warnings) {
        Some(user_id) => Ok(Some(Manager {
            uuid: manager.uuid.clone(),
            user_id,
        })),
        None => {
            error!(
                person_uuid = %person.uuid,
                org_unit_uuid,
                "manager has no associated directory user"
            );
            Err(TransformError::ManagerWithoutDirectoryAccount {
                person_uuid: person.uuid.clone(),
                org_unit_uuid: org_unit_uuid.to_string(),
                system: ad_system_name.to_string(),
            }
            .into())
        }
    }
}
