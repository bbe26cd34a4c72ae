//! Employee transformer.

use tracing::{debug, info, warn};

use crate::config::PositionPolicy;
use crate::errors::CoreError;
use crate::identity::{resolve_directory_user, IdentityMapping};
use crate::mo::{Address, Engagement, OrgSource};
use crate::models::{DataWarning, Position, User};

/// Build one [`User`] per employee present in the identity mapping.
///
/// Employees without a mapping are skipped with a warning before any of
/// their details are fetched.
pub async fn transform_employees<S>(
    source: &S,
    mapping: &IdentityMapping,
    ad_system_name: &str,
    policy: PositionPolicy,
    warnings: &mut Vec<DataWarning>,
) -> Result<Vec<User>, CoreError>
where
    S: OrgSource + ?Sized,
{
    let employees = source.list_employees().await?;
    info!(count = employees.len(), "transforming employees");

    let mut converted = Vec::new();
    for employee in employees {
        let Some(ext_uuid) = mapping.get(&employee.uuid) else {
            let warning = DataWarning::UnmappedEmployee {
                employee_uuid: employee.uuid.clone(),
            };
            warn!(employee_uuid = %employee.uuid, "{}", warning);
            warnings.push(warning);
            continue;
        };

        let accounts = source.get_employee_it(&employee.uuid).await?;
        let user_id = resolve_directory_user(&accounts, ad_system_name, &employee.uuid, warnings);

        let addresses = source.get_employee_addresses(&employee.uuid).await?;
        let email = pick_email(&addresses, &employee.uuid, warnings);

        let engagements = source.get_employee_engagements(&employee.uuid).await?;
        let positions = positions(&engagements, policy);

        debug!(
            employee_uuid = %employee.uuid,
            has_user_id = user_id.is_some(),
            positions = positions.len(),
            "converted employee"
        );
        converted.push(User {
            ext_uuid: ext_uuid.to_string(),
            user_id,
            name: employee.name,
            email,
            positions,
        });
    }

    Ok(converted)
}

fn pick_email(
    addresses: &[Address],
    employee_uuid: &str,
    warnings: &mut Vec<DataWarning>,
) -> Option<String> {
    let emails: Vec<&Address> = addresses.iter().filter(|a| a.is_email()).collect();
    if emails.len() > 1 {
        let warning = DataWarning::MultipleEmails {
            employee_uuid: employee_uuid.to_string(),
            count: emails.len(),
        };
        warn!(employee_uuid, count = emails.len(), "{}", warning);
        warnings.push(warning);
    }
    emails.first().map(|a| a.value.clone())
}

fn positions(engagements: &[Engagement], policy: PositionPolicy) -> Vec<Position> {
    let take = match policy {
        PositionPolicy::All => engagements.len(),
        PositionPolicy::First => 1,
    };
    engagements
        .iter()
        .take(take)
        .map(|e| Position {
            name: e.job_function.name.clone(),
            org_unit_uuid: e.org_unit.uuid.clone(),
        })
        .collect()
}
