// Copyright (c) 2025 - Cowboy AI, Inc.
//! Security Group Locator
//!
//! Name lookups against the provider. Nova offers no server-side filter by
//! name, so the full list is fetched and matched here.
//!
//! | matches | [`find_by_name`] | [`find_by_name_or_fail`] |
//! |---------|------------------|--------------------------|
//! | 0       | `Ok(None)`       | `NotFound`               |
//! | 1       | `Ok(Some(sg))`   | `Ok(sg)`                 |
//! | >1      | `AmbiguousName`  | `AmbiguousName`          |

use tracing::{debug, warn};

use crate::domain::SecurityGroup;
use crate::errors::{ProvisionerError, ProvisionerResult};
use crate::provider::SecurityGroupProvider;

/// Pick the single group named `name` out of a listing
pub fn select_unique(
    groups: Vec<SecurityGroup>,
    name: &str,
) -> ProvisionerResult<Option<SecurityGroup>> {
    let mut matching: Vec<SecurityGroup> = groups.into_iter().filter(|g| g.name == name).collect();

    match matching.len() {
        0 => Ok(None),
        1 => Ok(matching.pop()),
        count => {
            warn!(name = %name, count, "Security group name is not unique");
            Err(ProvisionerError::AmbiguousName {
                name: name.to_string(),
                count,
            })
        }
    }
}

/// Look up the group named `name`; absence is not an error
pub async fn find_by_name<P>(client: &P, name: &str) -> ProvisionerResult<Option<SecurityGroup>>
where
    P: SecurityGroupProvider + ?Sized,
{
    let groups = client.list_groups().await?;
    debug!(name = %name, listed = groups.len(), "Looking up security group by name");
    select_unique(groups, name)
}

/// Look up the group named `name`; absence is `NotFound`
pub async fn find_by_name_or_fail<P>(client: &P, name: &str) -> ProvisionerResult<SecurityGroup>
where
    P: SecurityGroupProvider + ?Sized,
{
    find_by_name(client, name)
        .await?
        .ok_or_else(|| ProvisionerError::NotFound {
            name: name.to_string(),
        })
}
