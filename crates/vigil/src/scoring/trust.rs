use chrono::{DateTime, Duration, Utc};
use vigil_common::{Account, AccountType};

/// Added for accounts younger than a day
pub const BRAND_NEW_ACCOUNT: i64 = 20;
/// Added for accounts between one and seven days old
pub const RECENT_ACCOUNT: i64 = 10;
/// Credit for site administrators
pub const ADMIN_CREDIT: i64 = -50;
/// Credit for registered charities
pub const CHARITY_CREDIT: i64 = -10;

/// Account-risk adjustment for an author, floored at zero
///
/// Higher means less trusted. Rules are summed in a fixed order: one age
/// bucket (under a day, or one to seven days inclusive), the admin credit,
/// then the charity credit.
pub fn trust_adjustment(account: &Account, now: DateTime<Utc>) -> i64 {
    let age = account.age_at(now);
    let mut adjustment = 0;

    if age < Duration::days(1) {
        adjustment += BRAND_NEW_ACCOUNT;
    } else if age <= Duration::days(7) {
        adjustment += RECENT_ACCOUNT;
    }
    if account.is_admin {
        adjustment += ADMIN_CREDIT;
    }
    if account.account_type == AccountType::Charity {
        adjustment += CHARITY_CREDIT;
    }

    adjustment.max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_common::UserId;

    fn account(age: Duration, is_admin: bool, account_type: AccountType) -> (Account, DateTime<Utc>) {
        let now = Utc::now();
        (
            Account {
                id: UserId::new("someone").unwrap(),
                created_at: now - age,
                is_admin,
                account_type,
            },
            now,
        )
    }

    #[test]
    fn age_buckets_are_exclusive() {
        let (fresh, now) = account(Duration::hours(3), false, AccountType::Individual);
        assert_eq!(trust_adjustment(&fresh, now), 20);

        let (day_old, now) = account(Duration::days(1), false, AccountType::Individual);
        assert_eq!(trust_adjustment(&day_old, now), 10);

        let (week_old, now) = account(Duration::days(7), false, AccountType::Individual);
        assert_eq!(trust_adjustment(&week_old, now), 10);

        let (established, now) = account(Duration::days(10), false, AccountType::Individual);
        assert_eq!(trust_adjustment(&established, now), 0);
    }

    #[test]
    fn credits_floor_at_zero() {
        let (admin, now) = account(Duration::hours(1), true, AccountType::Individual);
        assert_eq!(trust_adjustment(&admin, now), 0);

        let (charity, now) = account(Duration::hours(1), false, AccountType::Charity);
        assert_eq!(trust_adjustment(&charity, now), 10);

        let (old_charity, now) = account(Duration::days(30), false, AccountType::Charity);
        assert_eq!(trust_adjustment(&old_charity, now), 0);
    }

    #[test]
    fn future_registration_counts_as_brand_new() {
        let (skewed, now) = account(-Duration::minutes(5), false, AccountType::Organisation);
        assert_eq!(trust_adjustment(&skewed, now), 20);
    }

    #[test]
    fn monotonic_in_age_and_admin() {
        for account_type in [AccountType::Individual, AccountType::Charity, AccountType::Organisation] {
            for is_admin in [false, true] {
                let (young, now) = account(Duration::zero(), is_admin, account_type);
                let (old, _) = account(Duration::days(10), is_admin, account_type);
                let old = Account { created_at: now - Duration::days(10), ..old };
                assert!(trust_adjustment(&young, now) >= trust_adjustment(&old, now));
            }
            for age in [Duration::zero(), Duration::days(3), Duration::days(10)] {
                let (member, now) = account(age, false, account_type);
                let admin = Account { is_admin: true, ..member.clone() };
                let plain = trust_adjustment(&member, now);
                let elevated = trust_adjustment(&admin, now);
                assert!(elevated < plain || (elevated == 0 && plain == 0));
            }
        }
    }
}
