//! Nested org unit tree for the older role catalog API.
//!
//! The tree is loaded breadth-first into a flat map and assembled once every
//! unit is known, so the source traversal itself never recurses. Each unit
//! may appear once; cycles and units shared between parents are rejected.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, info};

use crate::errors::{CoreError, TransformError};
use crate::identity::resolve_directory_user;
use crate::mo::OrgSource;
use crate::models::{DataWarning, OrgTreeNode, TreeEmployee};

struct LoadedUnit {
    name: String,
    employees: Vec<TreeEmployee>,
    children: Vec<String>,
}

/// Load the subtree rooted at `root_uuid`.
///
/// Employees come from the engagements in each unit; those without a
/// directory user id are left out. The title is the job function of the
/// person's first engagement.
pub async fn build_org_tree<S>(
    source: &S,
    root_uuid: &str,
    ad_system_name: &str,
    warnings: &mut Vec<DataWarning>,
) -> Result<OrgTreeNode, CoreError>
where
    S: OrgSource + ?Sized,
{
    let root = source.get_org_unit(root_uuid).await?;
    info!(root = %root.uuid, name = %root.name, "loading org unit tree");

    let mut loaded: HashMap<String, LoadedUnit> = HashMap::new();
    let mut seen: HashSet<String> = HashSet::from([root.uuid.clone()]);
    let mut queue: VecDeque<(String, String)> = VecDeque::from([(root.uuid, root.name)]);

    while let Some((uuid, name)) = queue.pop_front() {
        let employees = load_employees(source, &uuid, ad_system_name, warnings).await?;

        let children = source.get_org_unit_children(&uuid).await?;
        let mut child_uuids = Vec::with_capacity(children.len());
        for child in children {
            if !seen.insert(child.uuid.clone()) {
                return Err(TransformError::RepeatedOrgUnit(child.uuid).into());
            }
            child_uuids.push(child.uuid.clone());
            queue.push_back((child.uuid, child.name));
        }

        debug!(uuid = %uuid, employees = employees.len(), children = child_uuids.len(), "loaded org unit");
        loaded.insert(
            uuid,
            LoadedUnit {
                name,
                employees,
                children: child_uuids,
            },
        );
    }

    info!(units = loaded.len(), "org unit tree loaded");
    Ok(assemble(root_uuid, &mut loaded))
}

async fn load_employees<S>(
    source: &S,
    org_unit_uuid: &str,
    ad_system_name: &str,
    warnings: &mut Vec<DataWarning>,
) -> Result<Vec<TreeEmployee>, CoreError>
where
    S: OrgSource + ?Sized,
{
    let engagements = source.get_org_unit_engagements(org_unit_uuid).await?;

    let mut employees = Vec::new();
    let mut seen = HashSet::new();
    for person in engagements.into_iter().filter_map(|e| e.person) {
        if !seen.insert(person.uuid.clone()) {
            continue;
        }

        let accounts = source.get_employee_it(&person.uuid).await?;
        let Some(user_id) = resolve_directory_user(&accounts, ad_system_name, &person.uuid, warnings)
        else {
            debug!(person_uuid = %person.uuid, org_unit_uuid, "skipping employee without directory user");
            continue;
        };

        let title = source
            .get_employee_engagements(&person.uuid)
            .await?
            .into_iter()
            .next()
            .map(|e| e.job_function.name);

        employees.push(TreeEmployee {
            uuid: person.uuid,
            name: person.name,
            user_id,
            title,
        });
    }
    Ok(employees)
}

fn assemble(uuid: &str, loaded: &mut HashMap<String, LoadedUnit>) -> OrgTreeNode {
    let unit = loaded.remove(uuid).unwrap_or(LoadedUnit {
        name: String::new(),
        employees: Vec::new(),
        children: Vec::new(),
    });
    let children = unit
        .children
        .iter()
        .map(|child| assemble(child, loaded))
        .collect();

    OrgTreeNode {
        uuid: uuid.to_string(),
        name: unit.name,
        employees: unit.employees,
        kle_performing: Vec::new(),
        kle_interest: Vec::new(),
        children,
    }
}
