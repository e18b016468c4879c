use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Kind of account, as recorded by the surrounding platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccountType {
    /// A person posting on their own behalf
    #[default]
    Individual,
    /// A registered charity
    Charity,
    /// Any other organisation (business, community group)
    Organisation,
}

/// The slice of account metadata the pipeline needs to weigh an author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account identifier
    pub id: UserId,
    /// When the account was registered
    pub created_at: DateTime<Utc>,
    /// Whether the account holds site administrator rights
    #[serde(default)]
    pub is_admin: bool,
    /// Kind of account
    #[serde(default)]
    pub account_type: AccountType,
}

impl Account {
    /// Account age at `now`; registrations in the future count as brand new
    pub fn age_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        (now - self.created_at).max(chrono::Duration::zero())
    }
}
