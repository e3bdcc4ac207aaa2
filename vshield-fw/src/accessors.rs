//! Property accessors for a matched rule.
//!
//! Reads map remote identifiers back to human-readable names so callers can
//! compare them with desired state. Identifiers with no matching object are
//! dropped: the object may have been deleted out of band, which is not an error
//! for a read. Writes never touch the rule; they only record in a [`ChangeSet`]
//! which properties need to be folded into the next update.

use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use crate::model::{
    AddressScope, AddressSet, ApplicationScope, NamedObject, Service, ServiceGroup,
    SERVICE_GROUP_PREFIX, SERVICE_PREFIX,
};

/// A managed rule property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    Action,
    Source,
    Destination,
    ServiceApplication,
    ServiceGroup,
}

impl Property {
    pub fn as_str(self) -> &'static str {
        match self {
            Property::Action => "action",
            Property::Source => "source",
            Property::Destination => "destination",
            Property::ServiceApplication => "service_application",
            Property::ServiceGroup => "service_group",
        }
    }
}

impl Display for Property {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Properties staged for the next update of a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    staged: BTreeSet<Property>,
}

impl ChangeSet {
    pub fn stage(&mut self, property: Property) {
        self.staged.insert(property);
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    pub fn contains(&self, property: Property) -> bool {
        self.staged.contains(&property)
    }

    pub fn properties(&self) -> Vec<Property> {
        self.staged.iter().copied().collect()
    }
}

/// Address-set names referenced by a source or destination block, sorted.
pub fn read_addresses(scope: &AddressScope, address_sets: &[AddressSet]) -> Vec<String> {
    names_for(&scope.grouping_object_id, address_sets, "")
}

/// Names of the individual services a rule allows, sorted.
pub fn read_service_applications(scope: &ApplicationScope, services: &[Service]) -> Vec<String> {
    names_for(&scope.application_id, services, SERVICE_PREFIX)
}

/// Names of the service groups a rule allows, sorted.
pub fn read_service_groups(scope: &ApplicationScope, groups: &[ServiceGroup]) -> Vec<String> {
    names_for(&scope.application_id, groups, SERVICE_GROUP_PREFIX)
}

fn names_for(ids: &[String], objects: &[NamedObject], prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = ids
        .iter()
        .filter_map(|id| {
            objects
                .iter()
                .find(|object| object.object_id == *id && object.object_id.starts_with(prefix))
        })
        .filter(|object| !object.name.is_empty())
        .map(|object| object.name.clone())
        .collect();
    names.sort();
    names
}
