//! Recipient resolution
//!
//! Turns a targeting selection into a concrete, deduplicated list of
//! eligible contacts. Ineligible contacts named by an explicit selection
//! are dropped without an error; the count is reported in `Resolution`.
//! Output order is not meaningful.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::aggregates::{Contact, EligibilityPolicy};
use crate::domain::value_objects::{EntityId, Targeting};
use crate::ports::outbound::{ContactRepository, GroupRepository, RepositoryError};

/// Resolution result with enough detail to explain an empty list
#[derive(Clone, Debug, Default)]
pub struct Resolution {
    pub recipients: Vec<Contact>,
    /// Distinct contacts the selection pointed at before eligibility filtering
    pub requested: usize,
    pub excluded_ineligible: usize,
    /// The active selection set itself was empty
    pub empty_selection: bool,
}

impl Resolution {
    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }
}

pub struct RecipientResolver {
    contacts: Arc<dyn ContactRepository>,
    groups: Arc<dyn GroupRepository>,
    policy: EligibilityPolicy,
}

impl RecipientResolver {
    pub fn new(
        contacts: Arc<dyn ContactRepository>,
        groups: Arc<dyn GroupRepository>,
        policy: EligibilityPolicy,
    ) -> Self {
        Self { contacts, groups, policy }
    }

    pub fn policy(&self) -> &EligibilityPolicy {
        &self.policy
    }

    pub async fn resolve(&self, targeting: &Targeting, owner_id: &EntityId) -> Result<Vec<Contact>, RepositoryError> {
        Ok(self.resolve_detailed(targeting, owner_id).await?.recipients)
    }

    pub async fn resolve_detailed(
        &self,
        targeting: &Targeting,
        owner_id: &EntityId,
    ) -> Result<Resolution, RepositoryError> {
        if targeting.is_empty_selection() {
            debug!(mode = targeting.mode().as_str(), "Empty targeting selection");
            return Ok(Resolution { empty_selection: true, ..Resolution::default() });
        }

        let candidates = match targeting {
            Targeting::All => {
                self.contacts
                    .find_by_owner_and_status(owner_id, &self.policy.statuses())
                    .await?
            }
            Targeting::Contacts(ids) => {
                let ids: Vec<EntityId> = ids.iter().cloned().collect();
                self.contacts.find_by_ids(owner_id, &ids).await?
            }
            Targeting::Groups(group_ids) => {
                let group_ids: Vec<EntityId> = group_ids.iter().cloned().collect();
                let members: HashSet<EntityId> = self
                    .groups
                    .member_ids(owner_id, &group_ids)
                    .await?
                    .into_iter()
                    .collect();
                if members.is_empty() {
                    Vec::new()
                } else {
                    let ids: Vec<EntityId> = members.into_iter().collect();
                    self.contacts.find_by_ids(owner_id, &ids).await?
                }
            }
        };

        let resolution = self.filter(candidates, owner_id);
        if resolution.excluded_ineligible > 0 {
            warn!(
                mode = targeting.mode().as_str(),
                excluded = resolution.excluded_ineligible,
                "Ineligible contacts excluded from selection"
            );
        }
        debug!(
            mode = targeting.mode().as_str(),
            requested = resolution.requested,
            recipients = resolution.recipients.len(),
            "Recipients resolved"
        );
        Ok(resolution)
    }

    /// Dedup by id, then keep only the owner's eligible contacts. Adapters
    /// are not trusted to have filtered.
    fn filter(&self, candidates: Vec<Contact>, owner_id: &EntityId) -> Resolution {
        let mut seen = HashSet::new();
        let mut resolution = Resolution::default();

        for contact in candidates {
            if contact.owner_id() != owner_id || !seen.insert(contact.id().clone()) {
                continue;
            }
            resolution.requested += 1;
            if self.policy.is_eligible(contact.status()) {
                resolution.recipients.push(contact);
            } else {
                resolution.excluded_ineligible += 1;
            }
        }
        resolution
    }
}
