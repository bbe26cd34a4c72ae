//! Directory user id lookup from a person's IT accounts.

use tracing::warn;

use crate::mo::ItAccount;
use crate::models::DataWarning;

/// Pick the `user_key` of the person's account in the directory system.
///
/// Returns `None` when the person has no such account. With several, the
/// first one in source order wins and a warning is recorded.
pub fn resolve_directory_user(
    accounts: &[ItAccount],
    system_name: &str,
    person_uuid: &str,
    warnings: &mut Vec<DataWarning>,
) -> Option<String> {
    let matching: Vec<&ItAccount> = accounts
        .iter()
        .filter(|account| account.itsystem.name == system_name)
        .collect();

    if matching.len() > 1 {
        let warning = DataWarning::MultipleDirectoryAccounts {
            person_uuid: person_uuid.to_string(),
            count: matching.len(),
        };
        warn!(person_uuid, count = matching.len(), "{}", warning);
        warnings.push(warning);
    }

    matching.first().map(|account| account.user_key.clone())
}
