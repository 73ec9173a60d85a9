use common::Verdict;
use common::problem::TestCase;

/// Points awarded for one judged test case.
///
/// The pipeline clamps the returned value to the case weight and zeroes it
/// for cases excluded from scoring.
pub trait ScoringPolicy: Send + Sync {
    fn score(&self, case: &TestCase, verdict: Verdict) -> u32;
}

/// Full weight on `Accepted`, nothing otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryScoring;

impl ScoringPolicy for BinaryScoring {
    fn score(&self, case: &TestCase, verdict: Verdict) -> u32 {
        if verdict.is_accepted() { case.weight } else { 0 }
    }
}

pub(crate) fn awarded(policy: &dyn ScoringPolicy, case: &TestCase, verdict: Verdict) -> u32 {
    if !case.include_in_scoring {
        return 0;
    }
    policy.score(case, verdict).min(case.weight)
}
