//! Entitlement resolution
//!
//! The single place that decides effective Pro access. Feature gates and
//! handlers consume the resolved boolean; nothing else re-derives it.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use tally_types::AccountPlan;

/// Privileged identities that always resolve Pro.
///
/// Checked client-side for UI affordances and server-side for privileged
/// RPCs (maintenance bypass, habit-cap exemption).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    emails: BTreeSet<String>,
}

impl AllowList {
    /// The compiled-in allow-list
    pub fn builtin() -> Self {
        Self::from_emails(["admin@trytally.app", "dev@trytally.app"])
    }

    /// Build an allow-list from an email iterator (lowercased, trimmed)
    pub fn from_emails<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            emails: emails
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Extend with additional emails (e.g. from configuration)
    pub fn with_extra<I, S>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.emails
            .extend(emails.into_iter().map(|e| e.as_ref().trim().to_lowercase()));
        self
    }

    /// Membership check, case-insensitive
    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(&email.trim().to_lowercase())
    }

    /// Number of privileged identities
    pub fn len(&self) -> usize {
        self.emails.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

/// Device-local "simulate free" override for the designated QA account.
///
/// Modeled as an explicit value passed into resolution rather than ambient
/// state, so the resolver stays pure. It never touches the backend record
/// and is inert for every identity except the configured test email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalOverride {
    /// The one identity the override applies to
    pub test_email: String,
    /// When true, the test account renders as free regardless of its record
    pub simulate_free: bool,
}

impl LocalOverride {
    /// Create an override scoped to a test identity
    pub fn new(test_email: impl Into<String>, simulate_free: bool) -> Self {
        Self {
            test_email: test_email.into().trim().to_lowercase(),
            simulate_free,
        }
    }

    /// Whether this override applies to the given account email
    pub fn applies_to(&self, email: &str) -> bool {
        self.test_email == email.trim().to_lowercase()
    }
}

/// Resolve effective Pro access from the account plan record.
///
/// Policy, in order:
/// 1. allow-listed email: Pro, unconditionally (overrides plan and expiry);
/// 2. `plan != pro`: free;
/// 3. no expiry set: Pro (non-expiring manual grant);
/// 4. otherwise Pro only while `pro_expires_at > now` — the exact expiry
///    instant is already expired.
///
/// Pure and deterministic; expiry is evaluated on every call, so a lapsed
/// record reverts to free on the next read without any background job.
pub fn resolve_is_pro(record: &AccountPlan, allow_list: &AllowList, now: DateTime<Utc>) -> bool {
    if allow_list.contains(&record.email) {
        return true;
    }
    if !record.plan.is_pro() {
        return false;
    }
    match record.pro_expires_at {
        None => true,
        Some(expires_at) => expires_at > now,
    }
}

/// Resolve effective Pro access with the device-local override applied.
///
/// The override only bites for the designated test identity and only in the
/// "simulate free" direction; it cannot grant Pro.
pub fn resolve_effective(
    record: &AccountPlan,
    allow_list: &AllowList,
    local_override: Option<&LocalOverride>,
    now: DateTime<Utc>,
) -> bool {
    let is_pro = resolve_is_pro(record, allow_list, now);
    match local_override {
        Some(ov) if ov.simulate_free && ov.applies_to(&record.email) => false,
        _ => is_pro,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tally_types::{Plan, UserId};

    fn record(plan: Plan, expires_at: Option<DateTime<Utc>>, email: &str) -> AccountPlan {
        let mut r = AccountPlan::new_free(UserId::new(), email);
        r.plan = plan;
        r.pro_expires_at = expires_at;
        r
    }

    #[test]
    fn test_allow_list_overrides_everything() {
        let allow = AllowList::from_emails(["vip@trytally.app"]);
        let now = Utc::now();

        // Free plan, expired pro, pro - all resolve Pro for the allow-listed email
        let free = record(Plan::Free, None, "vip@trytally.app");
        let expired = record(Plan::Pro, Some(now - Duration::days(1)), "vip@trytally.app");
        let active = record(Plan::Pro, None, "vip@trytally.app");

        assert!(resolve_is_pro(&free, &allow, now));
        assert!(resolve_is_pro(&expired, &allow, now));
        assert!(resolve_is_pro(&active, &allow, now));
    }

    #[test]
    fn test_allow_list_is_case_insensitive() {
        let allow = AllowList::from_emails(["VIP@TryTally.app"]);
        let r = record(Plan::Free, None, "vip@trytally.app");
        assert!(resolve_is_pro(&r, &allow, Utc::now()));
    }

    #[test]
    fn test_free_plan_resolves_free() {
        let r = record(Plan::Free, None, "user@example.com");
        assert!(!resolve_is_pro(&r, &AllowList::default(), Utc::now()));
    }

    #[test]
    fn test_no_expiry_is_permanent_grant() {
        let r = record(Plan::Pro, None, "user@example.com");
        let far_future = Utc::now() + Duration::days(365 * 10);
        assert!(resolve_is_pro(&r, &AllowList::default(), far_future));
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let t = Utc::now();
        let r = record(Plan::Pro, Some(t), "user@example.com");
        let allow = AllowList::default();

        // Strictly before T: pro
        assert!(resolve_is_pro(&r, &allow, t - Duration::seconds(1)));
        // Exactly T: already expired
        assert!(!resolve_is_pro(&r, &allow, t));
        // After T: expired
        assert!(!resolve_is_pro(&r, &allow, t + Duration::seconds(1)));
    }

    #[test]
    fn test_override_only_applies_to_test_account() {
        let allow = AllowList::default();
        let now = Utc::now();
        let ov = LocalOverride::new("qa@trytally.app", true);

        let qa = record(Plan::Pro, None, "qa@trytally.app");
        let other = record(Plan::Pro, None, "user@example.com");

        assert!(!resolve_effective(&qa, &allow, Some(&ov), now));
        assert!(resolve_effective(&other, &allow, Some(&ov), now));
    }

    #[test]
    fn test_override_cannot_grant_pro() {
        let allow = AllowList::default();
        let now = Utc::now();
        // simulate_free = false leaves resolution untouched
        let ov = LocalOverride::new("qa@trytally.app", false);
        let qa_free = record(Plan::Free, None, "qa@trytally.app");

        assert!(!resolve_effective(&qa_free, &allow, Some(&ov), now));
    }
}
