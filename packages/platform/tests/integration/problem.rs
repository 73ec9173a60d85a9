use ::common::judge_result::JudgeSystemErrorInfo;
use ::common::problem::{ComparisonPolicy, Difficulty, ExpectedOutput};
use ::common::user::Role;
use ::common::{SubmissionStatus, Verdict};
use chrono::Duration;
use platform::models::problem::{CreateProblemRequest, TestCaseRequest, UpdateProblemRequest};
use platform::models::user::CreateUserRequest;

use crate::common::{TestApp, epoch, programs};

mod authoring {
    use super::*;

    #[tokio::test]
    async fn created_problem_can_be_read_back() {
        let app = TestApp::spawn().await;
        let mut req = CreateProblemRequest::new(
            "  Sum  ",
            Difficulty::Medium,
            vec![
                TestCaseRequest::literal("1 2", "3", 30).with_id("small"),
                TestCaseRequest::literal("40 60", "100", 70).with_id("large"),
                TestCaseRequest::literal("0 0", "0", 0).unscored(),
            ],
        );
        req.time_limit_ms = 2000;
        req.comparison = ComparisonPolicy::Tokenwise;

        let created = app.platform.create_problem(req).unwrap();
        assert!(created.id.as_str().starts_with("p-"));
        assert_eq!(created.title, "Sum");
        assert_eq!(created.revision, 1);
        assert_eq!(created.max_score(), 100);

        let fetched = app.platform.problem(&created.id).unwrap();
        let ids: Vec<_> = fetched.test_cases.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["small", "large", "3"]);
        assert_eq!(fetched.time_limit_ms, 2000);
        assert_eq!(fetched.comparison, ComparisonPolicy::Tokenwise);
        assert!(matches!(
            &fetched.test_cases[0].expected,
            ExpectedOutput::Literal { output } if output == "3"
        ));
    }

    #[tokio::test]
    async fn problems_are_listed_by_id() {
        let app = TestApp::spawn().await;
        app.create_sum_problem("p2");
        app.create_sum_problem("p1");

        let ids: Vec<_> = app
            .platform
            .problems()
            .iter()
            .map(|p| p.id.as_str().to_string())
            .collect();
        assert_eq!(ids, ["p1", "p2"]);
    }

    #[tokio::test]
    async fn updates_bump_the_revision() {
        let app = TestApp::spawn().await;
        app.create_sum_problem("p1");

        let updated = app
            .platform
            .update_problem(
                &"p1".into(),
                UpdateProblemRequest {
                    title: Some("A plus B".into()),
                    memory_limit_mb: Some(512),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.revision, 2);
        assert_eq!(updated.title, "A plus B");
        assert_eq!(updated.memory_limit_mb, 512);

        let replaced = app
            .platform
            .replace_test_cases(&"p1".into(), vec![TestCaseRequest::literal("5 5", "10", 40)])
            .unwrap();
        assert_eq!(replaced.revision, 3);
        assert_eq!(replaced.max_score(), 40);
    }

    #[tokio::test]
    async fn duplicate_id_conflicts() {
        let app = TestApp::spawn().await;
        app.create_sum_problem("p1");

        let err = app
            .platform
            .create_problem(
                CreateProblemRequest::new(
                    "Again",
                    Difficulty::Easy,
                    vec![TestCaseRequest::literal("1", "1", 100)],
                )
                .with_id("p1"),
            )
            .unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn deleted_problem_is_gone() {
        let app = TestApp::spawn().await;
        app.create_user("u1");
        app.create_sum_problem("p1");
        app.judge("u1", "p1", programs::SUM).await;

        app.platform.delete_problem(&"p1".into()).unwrap();

        assert_eq!(app.platform.problem(&"p1".into()).unwrap_err().code(), "NOT_FOUND");
        assert_eq!(
            app.platform.problem_stats(&"p1".into()).await.unwrap_err().code(),
            "NOT_FOUND"
        );
        assert_eq!(
            app.platform.delete_problem(&"p1".into()).unwrap_err().code(),
            "NOT_FOUND"
        );
    }

    #[tokio::test]
    async fn deleted_problem_id_is_retired() {
        let app = TestApp::spawn().await;
        app.create_user("u1");
        app.create_sum_problem("p1");
        let wrong = app.judge("u1", "p1", programs::WRONG).await;
        app.judge("u1", "p1", programs::SUM).await;

        app.platform.delete_problem(&"p1".into()).unwrap();

        // A new problem cannot inherit the old one's submissions or stats.
        let err = app
            .platform
            .create_problem(
                CreateProblemRequest::new(
                    "Echo",
                    Difficulty::Easy,
                    vec![TestCaseRequest::literal("x", "wrong", 100)],
                )
                .with_id("p1"),
            )
            .unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
        assert_eq!(
            app.platform.rejudge(&wrong.submission.id).await.unwrap_err().code(),
            "NOT_FOUND"
        );

        // Submissions made before the delete stay readable.
        let record = app.platform.submission(&wrong.submission.id).await.unwrap();
        assert_eq!(record.status, SubmissionStatus::WrongAnswer);
    }
}

mod validation {
    use super::*;

    fn request(test_cases: Vec<TestCaseRequest>) -> CreateProblemRequest {
        CreateProblemRequest::new("Sum", Difficulty::Easy, test_cases)
    }

    #[tokio::test]
    async fn malformed_problems_are_rejected() {
        let app = TestApp::spawn().await;
        let one = || vec![TestCaseRequest::literal("1 2", "3", 100)];

        let mut no_title = request(one());
        no_title.title = "   ".into();
        let mut zero_time = request(one());
        zero_time.time_limit_ms = 0;
        let mut huge_memory = request(one());
        huge_memory.memory_limit_mb = 8192;
        let mut both_outputs = TestCaseRequest::literal("1 2", "3", 100);
        both_outputs.reference = TestCaseRequest::reference("1 2", "fake", programs::SUM, 100).reference;

        let cases = [
            ("no title", no_title),
            ("zero time limit", zero_time),
            ("memory limit", huge_memory),
            ("no cases", request(Vec::new())),
            ("only unscored", request(vec![TestCaseRequest::literal("1", "1", 10).unscored()])),
            ("zero weight", request(vec![TestCaseRequest::literal("1", "1", 0)])),
            (
                "duplicate ids",
                request(vec![
                    TestCaseRequest::literal("1", "1", 10).with_id("a"),
                    TestCaseRequest::literal("2", "2", 10).with_id("a"),
                ]),
            ),
            ("both outputs", request(vec![both_outputs])),
        ];
        for (name, req) in cases {
            let err = app.platform.create_problem(req).unwrap_err();
            assert_eq!(err.code(), "VALIDATION_ERROR", "{name}");
        }
        assert!(app.platform.problems().is_empty());
    }

    #[tokio::test]
    async fn invalid_update_leaves_the_problem_unchanged() {
        let app = TestApp::spawn().await;
        app.create_sum_problem("p1");

        let err = app
            .platform
            .update_problem(
                &"p1".into(),
                UpdateProblemRequest {
                    title: Some("Renamed".into()),
                    time_limit_ms: Some(60_000),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let problem = app.platform.problem(&"p1".into()).unwrap();
        assert_eq!(problem.title, "A + B");
        assert_eq!(problem.revision, 1);

        let err = app
            .platform
            .update_problem(&"p9".into(), UpdateProblemRequest::default())
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }
}

mod reference_solutions {
    use super::*;

    #[tokio::test]
    async fn expected_output_comes_from_the_reference() {
        let app = TestApp::spawn().await;
        app.create_user("u1");
        app.create_problem(
            "p1",
            vec![TestCaseRequest::reference("20 22", "fake", programs::SUM, 100)],
        );

        let record = app.judge("u1", "p1", programs::SUM).await;
        assert_eq!(record.status, SubmissionStatus::Accepted);
        // Reference run plus the submission.
        assert_eq!(app.adapter.calls(), 2);

        let record = app.judge("u1", "p1", programs::WRONG).await;
        assert_eq!(record.status, SubmissionStatus::WrongAnswer);
        // The reference output is cached.
        assert_eq!(app.adapter.calls(), 3);
    }

    #[tokio::test]
    async fn replacing_test_cases_regenerates_reference_output() {
        let app = TestApp::spawn().await;
        app.create_user("u1");
        app.create_problem(
            "p1",
            vec![TestCaseRequest::reference("20 22", "fake", programs::SUM, 100)],
        );
        app.judge("u1", "p1", programs::SUM).await;

        app.platform
            .replace_test_cases(
                &"p1".into(),
                vec![TestCaseRequest::reference("20 22", "fake", programs::ECHO, 100)],
            )
            .unwrap();
        let record = app.judge("u1", "p1", programs::SUM).await;

        assert_eq!(record.status, SubmissionStatus::WrongAnswer);
        assert_eq!(app.adapter.calls(), 4);
    }

    #[tokio::test]
    async fn failing_reference_is_reported_as_system_error() {
        let app = TestApp::spawn().await;
        app.create_user("u1");
        app.create_problem(
            "p1",
            vec![TestCaseRequest::reference("1 2", "fake", programs::CRASH, 100)],
        );

        let record = app.judge("u1", "p1", programs::SUM).await;

        assert_eq!(record.status, SubmissionStatus::RuntimeError);
        assert_eq!(record.score(), Some(0));
        let diagnostic = record.diagnostic().unwrap();
        assert_eq!(diagnostic.code, JudgeSystemErrorInfo::REFERENCE_FAILED);
        assert!(!diagnostic.is_retryable());
    }
}

mod statistics {
    use super::*;

    #[tokio::test]
    async fn stats_track_judged_and_accepted_submissions() {
        let app = TestApp::spawn().await;
        app.create_user("u1");
        app.create_sum_problem("p1");
        app.create_sum_problem("p2");

        let fresh = app.platform.problem_stats(&"p1".into()).await.unwrap();
        assert_eq!((fresh.judged, fresh.accepted), (0, 0));
        assert_eq!(fresh.acceptance_rate(), 0.0);

        app.judge("u1", "p1", programs::SUM).await;
        app.judge("u1", "p1", programs::WRONG).await;
        app.judge("u1", "p1", programs::SUM).await;
        app.judge("u1", "p1", programs::TLE).await;
        app.judge("u1", "p2", programs::CRASH).await;

        let all = app.platform.list_problem_stats().await;
        let summary: Vec<_> = all
            .iter()
            .map(|s| (s.problem_id.as_str().to_string(), s.judged, s.accepted))
            .collect();
        assert_eq!(
            summary,
            [("p1".to_string(), 4, 2), ("p2".to_string(), 1, 0)]
        );
        assert_eq!(all[0].acceptance_rate(), 0.5);
    }

    #[tokio::test]
    async fn overview_counts_entities_and_latest_verdicts() {
        let app = TestApp::spawn().await;
        app.create_user("u1");
        app.create_user("u2");
        app.platform
            .create_user(CreateUserRequest::new("Grace", "grace@uni.edu", Role::Instructor))
            .unwrap();
        app.platform.set_user_enabled(&"u2".into(), false).unwrap();
        app.create_sum_problem("p1");
        app.create_sum_problem("p2");
        app.create_contest("c1", epoch() + Duration::hours(1), epoch() + Duration::hours(3), [("p2", 100)]);
        app.create_contest("c2", epoch() + Duration::hours(8), epoch() + Duration::hours(9), [("p2", 100)]);

        app.judge("u1", "p1", programs::SUM).await;
        let wrong = app.judge("u1", "p1", programs::WRONG).await;
        app.judge("u1", "p2", programs::TLE).await;

        // The wrong answer becomes correct once the test cases change.
        app.platform
            .replace_test_cases(&"p1".into(), vec![TestCaseRequest::literal("x", "wrong", 100)])
            .unwrap();
        let rejudged = app.rejudge(&wrong.submission.id).await;
        assert_eq!(rejudged.status, SubmissionStatus::Accepted);
        app.advance(Duration::hours(2));

        let overview = app.platform.overview();
        assert_eq!(
            (overview.users, overview.students, overview.instructors, overview.admins),
            (3, 2, 1, 0)
        );
        assert_eq!(overview.enabled_users, 2);
        assert_eq!((overview.problems, overview.contests), (2, 2));
        assert_eq!(overview.active_contests, 1);
        assert_eq!(overview.submissions, 3);

        let counts: Vec<_> = overview
            .verdicts
            .iter()
            .map(|c| (c.verdict, c.count))
            .collect();
        assert_eq!(
            counts,
            [
                (Verdict::Accepted, 2),
                (Verdict::WrongAnswer, 0),
                (Verdict::TimeLimitExceeded, 1),
                (Verdict::MemoryLimitExceeded, 0),
                (Verdict::RuntimeError, 0),
                (Verdict::CompileError, 0),
            ]
        );
    }
}
