//! Sample catalogue: six problems, four contests placed around the clock's
//! current time, and five users.

use chrono::Duration;
use common::contest::ContestStatus;
use common::problem::{ComparisonPolicy, Difficulty, SampleTestCase};
use common::user::Role;
use tracing::info;

use crate::Platform;
use crate::error::PlatformError;
use crate::models::contest::CreateContestRequest;
use crate::models::problem::{CreateProblemRequest, TestCaseRequest};
use crate::models::user::CreateUserRequest;

struct SeedProblem {
    id: &'static str,
    title: &'static str,
    difficulty: Difficulty,
    description: &'static str,
    input_description: &'static str,
    output_description: &'static str,
    constraints: &'static [&'static str],
    /// `(input, output, explanation)`. Also used as the judged test cases.
    samples: &'static [(&'static str, &'static str, Option<&'static str>)],
    time_limit_ms: u32,
    memory_limit_mb: u32,
    comparison: ComparisonPolicy,
}

const PROBLEMS: &[SeedProblem] = &[
    SeedProblem {
        id: "p1",
        title: "Two Sum",
        difficulty: Difficulty::Easy,
        description: "Given an array of integers `nums` and an integer `target`, return indices \
            of the two numbers such that they add up to `target`.\n\nYou may assume that each \
            input would have **exactly one solution**, and you may not use the same element twice.",
        input_description: "The first line contains an integer `n`, the length of the array.\n\
            The second line contains `n` space-separated integers.\n\
            The third line contains the target integer.",
        output_description: "Output two space-separated integers representing the indices of the two numbers.",
        constraints: &[
            "2 ≤ n ≤ 10^4",
            "-10^9 ≤ nums[i] ≤ 10^9",
            "-10^9 ≤ target ≤ 10^9",
            "Only one valid answer exists",
        ],
        samples: &[
            ("4\n2 7 11 15\n9", "0 1", Some("nums[0] + nums[1] = 2 + 7 = 9")),
            ("3\n3 2 4\n6", "1 2", None),
        ],
        time_limit_ms: 1000,
        memory_limit_mb: 256,
        comparison: ComparisonPolicy::Tokenwise,
    },
    SeedProblem {
        id: "p2",
        title: "Binary Search",
        difficulty: Difficulty::Easy,
        description: "Given a sorted array of integers and a target value, return the index of \
            the target if it exists, otherwise return `-1`.\n\nYou must write an algorithm with \
            **O(log n)** runtime complexity.",
        input_description: "The first line contains two integers `n` and `target`.\n\
            The second line contains `n` space-separated integers in sorted order.",
        output_description: "Output a single integer representing the index of the target, or -1 if not found.",
        constraints: &[
            "1 ≤ n ≤ 10^4",
            "-10^4 ≤ nums[i], target ≤ 10^4",
            "All integers in nums are unique",
            "nums is sorted in ascending order",
        ],
        samples: &[("5 7\n1 3 5 7 9", "3", None), ("5 6\n1 3 5 7 9", "-1", None)],
        time_limit_ms: 1000,
        memory_limit_mb: 256,
        comparison: ComparisonPolicy::Trimmed,
    },
    SeedProblem {
        id: "p3",
        title: "Longest Increasing Subsequence",
        difficulty: Difficulty::Medium,
        description: "Given an integer array `nums`, return the length of the longest \
            **strictly increasing subsequence**.",
        input_description: "The first line contains an integer `n`.\n\
            The second line contains `n` space-separated integers.",
        output_description: "Output a single integer representing the length of the longest increasing subsequence.",
        constraints: &["1 ≤ n ≤ 2500", "-10^4 ≤ nums[i] ≤ 10^4"],
        samples: &[
            (
                "8\n10 9 2 5 3 7 101 18",
                "4",
                Some("The longest increasing subsequence is [2,3,7,101]"),
            ),
            ("7\n0 1 0 3 2 3 7", "4", None),
        ],
        time_limit_ms: 2000,
        memory_limit_mb: 256,
        comparison: ComparisonPolicy::Trimmed,
    },
    SeedProblem {
        id: "p4",
        title: "Merge K Sorted Lists",
        difficulty: Difficulty::Hard,
        description: "You are given an array of `k` linked-lists, each linked-list is sorted in \
            ascending order.\n\nMerge all the linked-lists into one sorted linked-list and return it.",
        input_description: "The first line contains an integer `k`.\n\
            The next `k` lines each contain a sorted list of integers.",
        output_description: "Output a single line containing the merged sorted list.",
        constraints: &[
            "k = lists.length",
            "0 ≤ k ≤ 10^4",
            "0 ≤ lists[i].length ≤ 500",
            "-10^4 ≤ lists[i][j] ≤ 10^4",
        ],
        samples: &[("3\n1 4 5\n1 3 4\n2 6", "1 1 2 3 4 4 5 6", None)],
        time_limit_ms: 3000,
        memory_limit_mb: 512,
        comparison: ComparisonPolicy::Tokenwise,
    },
    SeedProblem {
        id: "p5",
        title: "Valid Parentheses",
        difficulty: Difficulty::Easy,
        description: "Given a string `s` containing just the characters `(`, `)`, `{`, `}`, `[` \
            and `]`, determine if the input string is valid.",
        input_description: "A single line containing the string `s`.",
        output_description: "Output \"true\" if the string is valid, \"false\" otherwise.",
        constraints: &["1 ≤ s.length ≤ 10^4", "s consists of parentheses only: ()[]{}"],
        samples: &[("()", "true", None), ("()[]{}", "true", None), ("(]", "false", None)],
        time_limit_ms: 1000,
        memory_limit_mb: 256,
        comparison: ComparisonPolicy::Trimmed,
    },
    SeedProblem {
        id: "p6",
        title: "Maximum Subarray",
        difficulty: Difficulty::Medium,
        description: "Given an integer array `nums`, find the contiguous subarray (containing at \
            least one number) which has the largest sum and return its sum.",
        input_description: "The first line contains an integer `n`.\n\
            The second line contains `n` space-separated integers.",
        output_description: "Output a single integer representing the maximum subarray sum.",
        constraints: &["1 ≤ n ≤ 10^5", "-10^4 ≤ nums[i] ≤ 10^4"],
        samples: &[(
            "9\n-2 1 -3 4 -1 2 1 -5 4",
            "6",
            Some("[4,-1,2,1] has the largest sum = 6"),
        )],
        time_limit_ms: 1500,
        memory_limit_mb: 256,
        comparison: ComparisonPolicy::Trimmed,
    },
];

/// Split 100 points over `count` cases, the remainder going to the first.
fn weights(count: usize) -> Vec<u32> {
    let count = count.max(1) as u32;
    let base = 100 / count;
    let mut weights = vec![base; count as usize];
    weights[0] += 100 - base * count;
    weights
}

fn problem_request(seed: &SeedProblem) -> CreateProblemRequest {
    let test_cases = seed
        .samples
        .iter()
        .zip(weights(seed.samples.len()))
        .map(|(&(input, output, _), weight)| TestCaseRequest::literal(input, output, weight))
        .collect();

    let mut req = CreateProblemRequest::new(seed.title, seed.difficulty, test_cases).with_id(seed.id);
    req.description = seed.description.into();
    req.input_description = seed.input_description.into();
    req.output_description = seed.output_description.into();
    req.constraints = seed.constraints.iter().map(|c| c.to_string()).collect();
    req.samples = seed
        .samples
        .iter()
        .map(|&(input, output, explanation)| SampleTestCase {
            input: input.into(),
            output: output.into(),
            explanation: explanation.map(Into::into),
        })
        .collect();
    req.time_limit_ms = seed.time_limit_ms;
    req.memory_limit_mb = seed.memory_limit_mb;
    req.comparison = seed.comparison;
    req
}

/// Load the sample catalogue. Fails with `Conflict` if any record already
/// exists.
pub fn seed(platform: &Platform) -> Result<(), PlatformError> {
    for problem in PROBLEMS {
        platform.create_problem(problem_request(problem))?;
    }

    let now = platform.now();
    let contests = [
        CreateContestRequest::new(
            "Weekly Contest 120",
            now + Duration::days(2),
            now + Duration::days(2) + Duration::hours(2),
            [("p1", 100), ("p2", 150), ("p3", 200), ("p4", 300)],
        )
        .with_id("c1"),
        CreateContestRequest::new(
            "Educational Round 15",
            now - Duration::minutes(30),
            now + Duration::minutes(90),
            [("p5", 100), ("p6", 150), ("p3", 200)],
        )
        .with_id("c2"),
        CreateContestRequest::new(
            "Beginner Practice Contest",
            now - Duration::days(7),
            now - Duration::days(7) + Duration::hours(3),
            [("p1", 100), ("p5", 100), ("p2", 150)],
        )
        .with_id("c3"),
        CreateContestRequest::new(
            "Advanced Algorithms Championship",
            now + Duration::days(5),
            now + Duration::days(5) + Duration::hours(4),
            [("p3", 200), ("p4", 300)],
        )
        .with_id("c4"),
    ];
    let descriptions = [
        "A weekly contest featuring 4 problems of varying difficulty.",
        "An educational round designed for learning. Editorials are published after the contest.",
        "Perfect for beginners! Easy problems to help you get started.",
        "A challenging contest for experienced programmers.",
    ];
    for (mut contest, description) in contests.into_iter().zip(descriptions) {
        contest.description = description.into();
        platform.create_contest(contest)?;
    }

    let users = [
        ("u1", "John Doe", "john.doe@example.com", Role::Student, true),
        ("u2", "Jane Smith", "jane.smith@example.com", Role::Instructor, true),
        ("u3", "Alice Johnson", "alice.j@example.com", Role::Student, true),
        ("u4", "Bob Williams", "bob.w@example.com", Role::Student, false),
        ("u5", "Admin User", "admin@example.com", Role::Admin, true),
    ];
    for (id, name, email, role, enabled) in users {
        let user = platform.create_user(CreateUserRequest::new(name, email, role).with_id(id))?;
        if !enabled {
            platform.set_user_enabled(&user.id, false)?;
        }
    }

    // Registration is closed for finished contests.
    for contest in platform.contests() {
        if contest.status == ContestStatus::Finished {
            continue;
        }
        for user in ["u1", "u3"] {
            platform.register_participant(&contest.id, &user.into())?;
        }
    }

    info!(
        problems = PROBLEMS.len(),
        contests = 4,
        users = 5,
        "Sample data loaded"
    );
    Ok(())
}
