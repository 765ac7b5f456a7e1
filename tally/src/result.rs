//! Result rows.

use elect_identity::Candidate;
use elect_types::{CandidateId, NationalId};
use serde::{Deserialize, Serialize};

/// One candidate's outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub candidate_id: CandidateId,
    pub national_id: NationalId,
    pub name: String,
    pub party: String,
    pub vote_count: u64,
}

impl ResultEntry {
    pub fn for_candidate(candidate: &Candidate, vote_count: u64) -> Self {
        Self {
            candidate_id: candidate.id,
            national_id: candidate.national_id.clone(),
            name: candidate.name.clone(),
            party: candidate.party.clone(),
            vote_count,
        }
    }
}

/// Pick the entry with the most votes; ties go to the lowest candidate id.
///
/// `entries` may be in any order.
pub fn leader<'a, I>(entries: I) -> Option<&'a ResultEntry>
where
    I: IntoIterator<Item = &'a ResultEntry>,
{
    entries.into_iter().fold(None, |best: Option<&ResultEntry>, entry| match best {
        Some(b)
            if b.vote_count > entry.vote_count
                || (b.vote_count == entry.vote_count && b.candidate_id < entry.candidate_id) =>
        {
            Some(b)
        }
        _ => Some(entry),
    })
}
