//! The identity registry: arenas of voters and candidates.

use std::collections::{BTreeMap, HashMap};

use elect_types::{AccessPolicy, Address, CandidateId, ElectionError, NationalId, Phase, Timestamp};
use serde::{Deserialize, Serialize};

use crate::candidate::{Candidate, CandidateApplication};
use crate::voter::{Voter, VoterApplication};

/// Owns all voter and candidate records.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdentityRegistry {
    policy: AccessPolicy,
    /// Required length of a national id.
    id_length: usize,
    voters: HashMap<Address, Voter>,
    /// Registration order, for stable enumeration.
    voter_order: Vec<Address>,
    /// Voter national id → address.
    voter_national_ids: HashMap<NationalId, Address>,
    candidates: BTreeMap<CandidateId, Candidate>,
    /// Candidate national id → id. Independent of `voter_national_ids`.
    candidate_national_ids: HashMap<NationalId, CandidateId>,
    /// Self-nominated candidates by the nominating address.
    candidate_registrants: HashMap<Address, CandidateId>,
    next_candidate_id: CandidateId,
}

impl IdentityRegistry {
    pub fn new(policy: AccessPolicy, id_length: usize) -> Self {
        Self {
            policy,
            id_length,
            voters: HashMap::new(),
            voter_order: Vec::new(),
            voter_national_ids: HashMap::new(),
            candidates: BTreeMap::new(),
            candidate_national_ids: HashMap::new(),
            candidate_registrants: HashMap::new(),
            next_candidate_id: CandidateId::FIRST,
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn id_length(&self) -> usize {
        self.id_length
    }

    // ── Candidates ──────────────────────────────────────────────────────

    /// Register a candidate on behalf of the commission.
    pub fn register_candidate(
        &mut self,
        caller: &Address,
        phase: Phase,
        application: CandidateApplication,
        now: Timestamp,
    ) -> Result<CandidateId, ElectionError> {
        self.policy.require_commission(caller)?;
        Self::ensure_registration_window(phase, "register a candidate")?;
        self.insert_candidate(application, None, now)
    }

    /// Register the caller as a candidate.
    pub fn self_register_candidate(
        &mut self,
        caller: &Address,
        phase: Phase,
        application: CandidateApplication,
        now: Timestamp,
    ) -> Result<CandidateId, ElectionError> {
        Self::ensure_registration_window(phase, "register a candidate")?;
        self.insert_candidate(application, Some(caller.clone()), now)
    }

    fn insert_candidate(
        &mut self,
        application: CandidateApplication,
        registrant: Option<Address>,
        now: Timestamp,
    ) -> Result<CandidateId, ElectionError> {
        let national_id = NationalId::parse(&application.national_id, self.id_length)?;
        let name = Self::require_text("candidate name", &application.name)?;
        if let Some(address) = &registrant {
            if self.candidate_registrants.contains_key(address) {
                return Err(ElectionError::DuplicateAddress(address.clone()));
            }
        }
        if self.candidate_national_ids.contains_key(&national_id) {
            return Err(ElectionError::DuplicateCandidate(national_id.to_string()));
        }
        let id = self.next_candidate_id;
        let next = id
            .next()
            .ok_or_else(|| ElectionError::Internal("candidate id space exhausted".into()))?;

        let candidate = Candidate {
            id,
            national_id: national_id.clone(),
            name,
            party: application.party.trim().to_string(),
            manifesto: application.manifesto,
            is_registered: true,
            registrant: registrant.clone(),
            registered_at: now,
        };
        tracing::debug!(candidate = %id, national_id = %national_id, "candidate registered");
        self.candidates.insert(id, candidate);
        self.candidate_national_ids.insert(national_id, id);
        if let Some(address) = registrant {
            self.candidate_registrants.insert(address, id);
        }
        self.next_candidate_id = next;
        Ok(id)
    }

    // ── Voters ──────────────────────────────────────────────────────────

    /// Register `address` as a voter on behalf of the commission.
    pub fn register_voter(
        &mut self,
        caller: &Address,
        phase: Phase,
        address: &Address,
        application: VoterApplication,
        now: Timestamp,
    ) -> Result<(), ElectionError> {
        self.policy.require_commission(caller)?;
        Self::ensure_registration_window(phase, "register a voter")?;
        self.insert_voter(address, application, false, now)
    }

    /// Register the caller's own address as a voter.
    pub fn self_register_voter(
        &mut self,
        caller: &Address,
        phase: Phase,
        application: VoterApplication,
        now: Timestamp,
    ) -> Result<(), ElectionError> {
        Self::ensure_registration_window(phase, "register a voter")?;
        self.insert_voter(caller, application, true, now)
    }

    fn insert_voter(
        &mut self,
        address: &Address,
        application: VoterApplication,
        self_registered: bool,
        now: Timestamp,
    ) -> Result<(), ElectionError> {
        let national_id = NationalId::parse(&application.national_id, self.id_length)?;
        let name = Self::require_text("voter name", &application.name)?;
        if self.voters.contains_key(address) {
            return Err(ElectionError::DuplicateAddress(address.clone()));
        }
        if self.voter_national_ids.contains_key(&national_id) {
            return Err(ElectionError::DuplicateNationalId(national_id.to_string()));
        }

        let voter = Voter {
            address: address.clone(),
            national_id: national_id.clone(),
            name,
            is_registered: true,
            has_voted: false,
            registered_at: now,
            self_registered,
        };
        tracing::debug!(voter = %address, self_registered, "voter registered");
        self.voters.insert(address.clone(), voter);
        self.voter_order.push(address.clone());
        self.voter_national_ids.insert(national_id, address.clone());
        Ok(())
    }

    /// Flip a voter's `has_voted` flag.
    ///
    /// Public only because the ballot ledger lives in its own crate; it is the
    /// sole caller, and it appends the matching ballot in the same commit. A flag
    /// set any other way has no ballot behind it and fails the recount in
    /// `elect-audit`.
    pub fn mark_voted(&mut self, address: &Address) -> Result<(), ElectionError> {
        let voter = self
            .voters
            .get_mut(address)
            .filter(|v| v.is_registered)
            .ok_or_else(|| ElectionError::VoterNotRegistered(address.clone()))?;
        if voter.has_voted {
            return Err(ElectionError::AlreadyVoted(address.clone()));
        }
        voter.has_voted = true;
        Ok(())
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn is_registered_voter(&self, address: &Address) -> bool {
        self.voters.get(address).is_some_and(|v| v.is_registered)
    }

    /// Whether `address` has cast a ballot. Unknown addresses have not.
    pub fn has_voted(&self, address: &Address) -> bool {
        self.voters.get(address).is_some_and(|v| v.has_voted)
    }

    pub fn voter(&self, address: &Address) -> Result<&Voter, ElectionError> {
        self.voters
            .get(address)
            .ok_or_else(|| ElectionError::NotFound(format!("voter {address}")))
    }

    pub fn voter_by_national_id(&self, national_id: &str) -> Result<&Voter, ElectionError> {
        NationalId::parse(national_id, self.id_length)
            .ok()
            .and_then(|id| self.voter_national_ids.get(&id))
            .and_then(|address| self.voters.get(address))
            .ok_or_else(|| ElectionError::NotFound(format!("voter with national id {national_id}")))
    }

    /// Voters in registration order.
    pub fn voters(&self) -> impl Iterator<Item = &Voter> {
        self.voter_order.iter().filter_map(|a| self.voters.get(a))
    }

    pub fn candidate(&self, id: CandidateId) -> Result<&Candidate, ElectionError> {
        self.candidates
            .get(&id)
            .ok_or_else(|| ElectionError::NotFound(format!("candidate {id}")))
    }

    /// Whether `id` names a registered candidate a ballot may choose.
    pub fn is_valid_candidate(&self, id: CandidateId) -> bool {
        self.candidates.get(&id).is_some_and(|c| c.is_registered)
    }

    /// All candidate ids in ascending order.
    pub fn candidate_ids(&self) -> Vec<CandidateId> {
        self.candidates.keys().copied().collect()
    }

    /// Candidates in ascending id order.
    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.values()
    }

    pub fn total_voters(&self) -> u64 {
        self.voters.len() as u64
    }

    pub fn total_candidates(&self) -> u64 {
        self.candidates.len() as u64
    }

    /// Number of voters whose `has_voted` flag is set, counted from the records.
    pub fn voted_count(&self) -> u64 {
        self.voters.values().filter(|v| v.has_voted).count() as u64
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    fn ensure_registration_window(phase: Phase, action: &'static str) -> Result<(), ElectionError> {
        if phase.has_ended() {
            return Err(ElectionError::PhaseViolation { phase, action });
        }
        Ok(())
    }

    fn require_text(field: &str, value: &str) -> Result<String, ElectionError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ElectionError::InvalidFormat(format!("{field} must not be empty")));
        }
        Ok(trimmed.to_string())
    }
}
