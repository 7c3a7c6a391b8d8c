use serde::Serialize;

/// A scanner-proposed registry header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub address: u64,
    /// Offset from the module base
    pub offset: u64,
    pub score: i32,
    pub details: CandidateDetails,
}

impl Candidate {
    pub fn has_sample(&self, name: &str) -> bool {
        self.details.sample_names.iter().any(|n| n == name)
    }
}

/// What the scorer saw at a candidate address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CandidateDetails {
    pub declared_size: u32,
    pub head_ptr: u64,
    /// Sampled elements with a well-formed class name
    pub valid_elements: usize,
    /// Valid elements whose nested method table looked plausible
    pub nested_tables: usize,
    pub sample_names: Vec<String>,
}

/// Pick the candidate to decode.
///
/// Prefers the best-ranked candidate whose samples contain the root
/// `Object` class, otherwise the best-ranked one.
pub fn select_candidate(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates
        .iter()
        .find(|c| c.has_sample("Object"))
        .or_else(|| candidates.first())
}
