//! Blake2b hashing for ballot records.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use elect_types::{Address, BallotHash, CandidateId, Timestamp};

type Blake2b256 = Blake2b<U32>;

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Digest of one ballot, committing to its position and predecessor.
pub fn hash_ballot(
    previous: &BallotHash,
    sequence: u64,
    voter: &Address,
    candidate: CandidateId,
    timestamp: Timestamp,
) -> BallotHash {
    BallotHash::new(blake2b_256_multi(&[
        previous.as_bytes(),
        &sequence.to_le_bytes(),
        voter.as_str().as_bytes(),
        &candidate.get().to_le_bytes(),
        &timestamp.as_secs().to_le_bytes(),
    ]))
}
