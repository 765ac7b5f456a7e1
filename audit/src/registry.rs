//! Auditor approvals and the verification log.

use std::collections::HashMap;

use elect_identity::IdentityRegistry;
use elect_types::{AccessPolicy, Address, ElectionError, Role, Timestamp};
use serde::{Deserialize, Serialize};

use crate::auditor::{Auditor, VerificationRecord};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditRegistry {
    policy: AccessPolicy,
    auditors: HashMap<Address, Auditor>,
    /// First-approval order.
    order: Vec<Address>,
    records: Vec<VerificationRecord>,
}

impl AuditRegistry {
    pub fn new(policy: AccessPolicy) -> Self {
        Self {
            policy,
            auditors: HashMap::new(),
            order: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Approve `address` as an auditor for `organization`.
    ///
    /// Re-approving an existing auditor overwrites its organization and approval
    /// time but keeps its enumeration position.
    pub fn approve_auditor(
        &mut self,
        caller: &Address,
        address: &Address,
        organization: &str,
        now: Timestamp,
    ) -> Result<(), ElectionError> {
        self.policy.require_commission(caller)?;
        let organization = organization.trim();
        if organization.is_empty() {
            return Err(ElectionError::InvalidFormat("organization must not be empty".into()));
        }

        let auditor = Auditor {
            address: address.clone(),
            organization: organization.to_string(),
            approved: true,
            approved_at: now,
        };
        match self.auditors.insert(address.clone(), auditor) {
            Some(previous) => {
                tracing::debug!(
                    auditor = %address,
                    from = %previous.organization,
                    to = organization,
                    "auditor re-approved"
                );
            }
            None => self.order.push(address.clone()),
        }
        Ok(())
    }

    /// Append a verification record from an approved auditor.
    pub fn submit_verification(
        &mut self,
        caller: &Address,
        comments: &str,
        verification_passed: bool,
        now: Timestamp,
    ) -> Result<&VerificationRecord, ElectionError> {
        self.require_auditor(caller)?;
        self.records.push(VerificationRecord {
            auditor: caller.clone(),
            timestamp: now,
            comments: comments.to_string(),
            verification_passed,
        });
        let index = self.records.len() - 1;
        tracing::debug!(auditor = %caller, index, verification_passed, "verification recorded");
        Ok(&self.records[index])
    }

    /// Whether the citizen holding `national_id` has voted.
    ///
    /// Restricted to the commission and approved auditors.
    pub fn check_vote_by_national_id(
        &self,
        caller: &Address,
        identity: &IdentityRegistry,
        national_id: &str,
    ) -> Result<bool, ElectionError> {
        if !self.policy.is_commission(caller) {
            self.require_auditor(caller)?;
        }
        Ok(identity.voter_by_national_id(national_id)?.has_voted)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn is_approved_auditor(&self, address: &Address) -> bool {
        self.auditors.get(address).is_some_and(|a| a.approved)
    }

    pub fn auditor(&self, address: &Address) -> Result<&Auditor, ElectionError> {
        self.auditors
            .get(address)
            .ok_or_else(|| ElectionError::NotFound(format!("auditor {address}")))
    }

    /// Auditors in first-approval order.
    pub fn all_auditors(&self) -> impl Iterator<Item = &Auditor> {
        self.order.iter().filter_map(|a| self.auditors.get(a))
    }

    pub fn total_auditors(&self) -> u64 {
        self.auditors.len() as u64
    }

    /// Verification records in submission order.
    pub fn all_verification_records(&self) -> &[VerificationRecord] {
        &self.records
    }

    pub fn verification_count(&self) -> u64 {
        self.records.len() as u64
    }

    pub fn verification_record(&self, index: u64) -> Result<&VerificationRecord, ElectionError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.records.get(i))
            .ok_or_else(|| ElectionError::NotFound(format!("verification record {index}")))
    }

    fn require_auditor(&self, caller: &Address) -> Result<(), ElectionError> {
        if self.is_approved_auditor(caller) {
            Ok(())
        } else {
            Err(ElectionError::Unauthorized {
                caller: caller.clone(),
                role: Role::Auditor,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elect_identity::VoterApplication;
    use elect_types::{ErrorKind, Phase};

    fn addr(seed: u8) -> Address {
        Address::from_bytes([seed; 20])
    }

    fn registry() -> AuditRegistry {
        AuditRegistry::new(AccessPolicy::new(addr(0)))
    }

    fn t(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    #[test]
    fn approval_is_commission_only() {
        let mut reg = registry();
        let err = reg.approve_auditor(&addr(5), &addr(7), "Watchdog", t(0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(!reg.is_approved_auditor(&addr(7)));
        assert_eq!(reg.total_auditors(), 0);
    }

    #[test]
    fn empty_organization_rejected() {
        let mut reg = registry();
        let err = reg.approve_auditor(&addr(0), &addr(7), "  ", t(0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }

    #[test]
    fn reapproval_overwrites_organization_and_keeps_position() {
        let mut reg = registry();
        reg.approve_auditor(&addr(0), &addr(7), "First Org", t(1)).unwrap();
        reg.approve_auditor(&addr(0), &addr(8), "Other", t(2)).unwrap();
        reg.approve_auditor(&addr(0), &addr(7), "Second Org", t(3)).unwrap();

        let auditor = reg.auditor(&addr(7)).unwrap();
        assert_eq!(auditor.organization, "Second Org");
        assert_eq!(auditor.approved_at, t(3));
        assert!(auditor.approved);

        let order: Vec<_> = reg.all_auditors().map(|a| a.address.clone()).collect();
        assert_eq!(order, vec![addr(7), addr(8)]);
        assert_eq!(reg.total_auditors(), 2);
    }

    #[test]
    fn unapproved_caller_cannot_submit() {
        let mut reg = registry();
        let err = reg.submit_verification(&addr(7), "looks fine", true, t(0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        // The commission is not an auditor either.
        let err = reg.submit_verification(&addr(0), "looks fine", true, t(0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(reg.verification_count(), 0);
    }

    #[test]
    fn records_are_appended_in_order() {
        let mut reg = registry();
        reg.approve_auditor(&addr(0), &addr(7), "Org", t(0)).unwrap();
        reg.submit_verification(&addr(7), "first", true, t(10)).unwrap();
        reg.submit_verification(&addr(7), "second", false, t(20)).unwrap();

        assert_eq!(reg.verification_count(), 2);
        let second = reg.verification_record(1).unwrap();
        assert_eq!(second.comments, "second");
        assert!(!second.verification_passed);
        assert_eq!(second.timestamp, t(20));
        assert_eq!(reg.all_verification_records()[0].comments, "first");
        assert_eq!(reg.verification_record(2).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn unknown_auditor_is_not_found() {
        let reg = registry();
        assert_eq!(reg.auditor(&addr(3)).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn national_id_lookup_is_restricted() {
        let mut reg = registry();
        let mut identity = IdentityRegistry::new(AccessPolicy::new(addr(0)), 6);
        identity
            .self_register_voter(&addr(1), Phase::RegistrationOpen, VoterApplication::new("123456", "Ann"), t(0))
            .unwrap();
        reg.approve_auditor(&addr(0), &addr(7), "Org", t(0)).unwrap();

        assert!(!reg.check_vote_by_national_id(&addr(0), &identity, "123456").unwrap());
        assert!(!reg.check_vote_by_national_id(&addr(7), &identity, "123456").unwrap());
        assert_eq!(
            reg.check_vote_by_national_id(&addr(1), &identity, "123456").unwrap_err().kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            reg.check_vote_by_national_id(&addr(7), &identity, "999999").unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
