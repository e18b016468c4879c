//! Command-line interface for the `vigil` binary

use chrono::{DateTime, TimeDelta, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use vigil_common::{Account, AccountType, ContentId, ModerationError, ReportReason, Result, UserId};

use crate::queue::ResolveAction;

/// Arguments to the `vigil` binary
#[derive(Parser, Debug)]
#[command(author, version, about = "Score posts and work the moderation queue")]
pub struct Args {
    /// Path to a KDL rules file (built-in rules when omitted)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the JSON store file
    #[arg(short = 's', long, global = true, default_value = "vigil-store.json")]
    pub store: PathBuf,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score text against the rule tables
    Score {
        /// Text to score
        text: String,
    },

    /// Compute the trust adjustment for an account
    Trust {
        /// Account to weigh
        #[command(flatten)]
        account: AccountArgs,
    },

    /// Submit a post through admission
    Submit {
        /// Author user id
        #[arg(short = 'a', long)]
        author: UserId,

        /// Author account metadata
        #[command(flatten)]
        account: AccountArgs,

        /// Number of attachments on the post
        #[arg(long, default_value_t = 0)]
        attachments: u32,

        /// Publish even if the post needs review
        #[arg(long)]
        confirm: bool,

        /// Post body
        text: String,
    },

    /// File a report against a post
    Report {
        /// Reported content id
        #[arg(long)]
        content: ContentId,

        /// Reporter user id
        #[arg(long)]
        reporter: UserId,

        /// Report reason
        #[arg(long)]
        reason: ReportReason,

        /// Optional explanation
        #[arg(long)]
        details: Option<String>,
    },

    /// List items awaiting review
    Queue,

    /// Resolve a queue entry
    Resolve {
        /// Content id to resolve
        #[arg(long)]
        content: ContentId,

        /// approve, hide or delete
        #[arg(long)]
        action: ResolveAction,

        /// Reviewer user id
        #[arg(long)]
        reviewer: UserId,

        /// Reviewer notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Show a post and every report against it
    Show {
        /// Content id
        content: ContentId,
    },

    /// Print the loaded rule tables
    Rules,
}

/// Account metadata for commands that weigh an author
#[derive(clap::Args, Debug, Clone)]
pub struct AccountArgs {
    /// Account age in days
    #[arg(
        long,
        default_value_t = 30,
        value_parser = clap::value_parser!(i64).range(0..=MAX_AGE_DAYS)
    )]
    pub age_days: i64,

    /// Account holds site administrator rights
    #[arg(long)]
    pub admin: bool,

    /// Kind of account
    #[arg(long, value_enum, default_value_t = AccountKind::Individual)]
    pub account_type: AccountKind,
}

/// Oldest account age accepted on the command line, roughly a century
pub const MAX_AGE_DAYS: i64 = 36_500;

impl AccountArgs {
    /// Build the account as seen at `now`
    ///
    /// Fails with a validation error if the age is negative or does not fit
    /// before `now`.
    pub fn account(&self, id: UserId, now: DateTime<Utc>) -> Result<Account> {
        let created_at = (self.age_days >= 0)
            .then(|| TimeDelta::try_days(self.age_days))
            .flatten()
            .and_then(|age| now.checked_sub_signed(age))
            .ok_or_else(|| {
                ModerationError::validation(
                    "age_days",
                    format!("{} is not a usable account age", self.age_days),
                )
            })?;
        Ok(Account {
            id,
            created_at,
            is_admin: self.admin,
            account_type: self.account_type.into(),
        })
    }
}

/// Command-line spelling of [`AccountType`]
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum AccountKind {
    Individual,
    Charity,
    Organisation,
}

impl From<AccountKind> for AccountType {
    fn from(kind: AccountKind) -> Self {
        match kind {
            AccountKind::Individual => AccountType::Individual,
            AccountKind::Charity => AccountType::Charity,
            AccountKind::Organisation => AccountType::Organisation,
        }
    }
}
