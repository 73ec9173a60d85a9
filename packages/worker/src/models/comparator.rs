use common::problem::ComparisonPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Match,
    Mismatch,
}

impl Comparison {
    pub fn is_match(self) -> bool {
        self == Comparison::Match
    }
}

impl From<bool> for Comparison {
    fn from(matched: bool) -> Self {
        if matched {
            Comparison::Match
        } else {
            Comparison::Mismatch
        }
    }
}

/// Compare program output against the expected output under `policy`.
pub fn compare(expected: &str, actual: &str, policy: ComparisonPolicy) -> Comparison {
    let matched = match policy {
        ComparisonPolicy::Exact => expected.as_bytes() == actual.as_bytes(),
        ComparisonPolicy::Trimmed => trimmed_lines(expected).eq(trimmed_lines(actual)),
        ComparisonPolicy::Tokenwise => expected.split_whitespace().eq(actual.split_whitespace()),
    };
    matched.into()
}

/// Lines with trailing whitespace removed, without trailing blank lines.
fn trimmed_lines(s: &str) -> impl Iterator<Item = &str> {
    let lines: Vec<&str> = s.lines().map(str::trim_end).collect();
    let keep = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |last| last + 1);
    lines.into_iter().take(keep)
}
