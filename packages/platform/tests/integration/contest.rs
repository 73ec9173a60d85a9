use ::common::contest::ContestStatus;
use ::common::{SubmissionStatus, UserId};
use chrono::Duration;
use platform::models::contest::CreateContestRequest;
use platform::models::problem::{TestCaseRequest, UpdateProblemRequest};
use platform::models::submission::SubmitRequest;

use crate::common::{TestApp, epoch, programs};

/// Contest `c1` running from +1h to +3h with `p1` (150 points) and `p2`
/// (200 points), users `a` and `b` registered.
async fn contest_app() -> TestApp {
    let app = TestApp::spawn().await;
    app.create_sum_problem("p1");
    app.create_sum_problem("p2");
    app.create_user("a");
    app.create_user("b");
    app.create_contest(
        "c1",
        epoch() + Duration::hours(1),
        epoch() + Duration::hours(3),
        [("p1", 150), ("p2", 200)],
    );
    for user in ["a", "b"] {
        app.platform
            .register_participant(&"c1".into(), &user.into())
            .unwrap();
    }
    app
}

mod leaderboard {
    use super::*;

    #[tokio::test]
    async fn best_scores_are_scaled_and_summed() {
        let app = contest_app().await;
        app.advance(Duration::minutes(70));

        let a1 = app.judge_in_contest("a", "p1", "c1", programs::SUM_SMALL).await;
        assert_eq!(a1.status, SubmissionStatus::WrongAnswer);
        app.advance(Duration::minutes(5));
        app.judge_in_contest("a", "p1", "c1", programs::SUM).await;
        app.advance(Duration::minutes(5));
        // A later, worse attempt does not lower the best.
        app.judge_in_contest("a", "p1", "c1", programs::WRONG).await;
        app.judge_in_contest("b", "p2", "c1", programs::SUM_SMALL).await;

        let board = app.platform.leaderboard(&"c1".into()).await.unwrap();
        assert_eq!(board.status, ContestStatus::Ongoing);

        let a = board.entry(&"a".into()).unwrap();
        assert_eq!(a.total_score, 150);
        assert_eq!(a.rank, 1);
        let p1 = a.problems.iter().find(|p| p.problem_id.as_str() == "p1").unwrap();
        assert_eq!(p1.best_score, 150);
        assert_eq!(p1.attempts, 3);
        assert_eq!(p1.best_at, Some(epoch() + Duration::minutes(75)));

        let b = board.entry(&"b".into()).unwrap();
        // 50 of 100 on a 200 point problem.
        assert_eq!(b.total_score, 100);
        assert_eq!(b.rank, 2);
    }

    #[tokio::test]
    async fn equal_totals_rank_by_who_reached_them_first() {
        let app = contest_app().await;
        app.advance(Duration::minutes(65));

        app.judge_in_contest("a", "p1", "c1", programs::SUM).await;
        app.advance(Duration::minutes(10));
        app.judge_in_contest("b", "p1", "c1", programs::SUM).await;
        app.advance(Duration::minutes(10));
        app.judge_in_contest("b", "p2", "c1", programs::SUM).await;
        app.advance(Duration::minutes(10));
        app.judge_in_contest("a", "p2", "c1", programs::SUM).await;

        let board = app.platform.leaderboard(&"c1".into()).await.unwrap();
        let order: Vec<_> = board
            .entries
            .iter()
            .map(|e| (e.rank, e.user_id.as_str().to_string(), e.total_score))
            .collect();
        assert_eq!(
            order,
            [(1, "b".to_string(), 350), (2, "a".to_string(), 350)]
        );
        assert_eq!(
            board.entries[0].reached_at,
            Some(epoch() + Duration::minutes(85))
        );
        assert_eq!(
            board.entries[1].reached_at,
            Some(epoch() + Duration::minutes(95))
        );
    }

    #[tokio::test]
    async fn registered_participant_without_submissions_is_listed() {
        let app = contest_app().await;
        app.advance(Duration::minutes(90));
        app.judge_in_contest("a", "p1", "c1", programs::SUM).await;

        let board = app.platform.leaderboard(&"c1".into()).await.unwrap();
        assert_eq!(board.entries.len(), 2);
        let b = board.entry(&"b".into()).unwrap();
        assert_eq!(b.total_score, 0);
        assert_eq!(b.reached_at, None);
        assert_eq!(b.rank, 2);
    }

    #[tokio::test]
    async fn submissions_outside_the_window_do_not_count() {
        let app = contest_app().await;

        // Before the start.
        let early = app.judge_in_contest("a", "p1", "c1", programs::SUM).await;
        assert_eq!(early.status, SubmissionStatus::Accepted);

        // In the window, but not submitted to the contest.
        app.advance(Duration::minutes(90));
        app.judge("b", "p1", programs::SUM).await;

        // After the end.
        app.advance(Duration::hours(3));
        app.judge_in_contest("b", "p2", "c1", programs::SUM).await;

        let board = app.platform.leaderboard(&"c1".into()).await.unwrap();
        assert_eq!(board.status, ContestStatus::Finished);
        assert!(board.entries.iter().all(|e| e.total_score == 0));

        // Problem statistics still count every judged submission.
        let stats = app.platform.problem_stats(&"p1".into()).await.unwrap();
        assert_eq!((stats.judged, stats.accepted), (2, 2));
    }

    #[tokio::test]
    async fn rejudge_replaces_the_contest_attempt() {
        let app = contest_app().await;
        app.advance(Duration::minutes(70));
        let record = app.judge_in_contest("a", "p1", "c1", programs::SUM_SMALL).await;

        let board = app.platform.leaderboard(&"c1".into()).await.unwrap();
        assert_eq!(board.entry(&"a".into()).unwrap().total_score, 75);

        app.platform
            .update_problem(
                &"p1".into(),
                UpdateProblemRequest {
                    title: Some("A + B (easy)".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        app.advance(Duration::minutes(10));
        let rejudged = app.rejudge(&record.submission.id).await;
        assert_eq!(rejudged.evaluations.len(), 2);

        // Same outcome, same attempt: nothing is counted twice.
        let board = app.platform.leaderboard(&"c1".into()).await.unwrap();
        let a = board.entry(&"a".into()).unwrap();
        assert_eq!(a.total_score, 75);
        let p1 = a.problems.iter().find(|p| p.problem_id.as_str() == "p1").unwrap();
        assert_eq!(p1.attempts, 1);
    }

    #[tokio::test]
    async fn unknown_contest_is_not_found() {
        let app = TestApp::spawn().await;
        let err = app.platform.leaderboard(&"c9".into()).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn status_follows_the_clock() {
        let app = contest_app().await;
        let id = "c1".into();

        assert_eq!(app.platform.contest_status(&id).unwrap(), ContestStatus::Upcoming);
        app.advance(Duration::hours(1));
        assert_eq!(app.platform.contest_status(&id).unwrap(), ContestStatus::Ongoing);
        app.advance(Duration::hours(2));
        assert_eq!(app.platform.contest_status(&id).unwrap(), ContestStatus::Finished);

        let summaries = app.platform.contests();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].status, ContestStatus::Finished);
        assert_eq!(summaries[0].participant_count, 2);
        assert_eq!(summaries[0].total_points, 350);
    }

    #[tokio::test]
    async fn registration_rules() {
        let app = contest_app().await;
        app.create_user("c");
        let contest = "c1".into();

        assert!(app.platform.register_participant(&contest, &"c".into()).unwrap());
        assert!(!app.platform.register_participant(&contest, &"c".into()).unwrap());

        app.create_user("d");
        app.platform.set_user_enabled(&"d".into(), false).unwrap();
        let err = app
            .platform
            .register_participant(&contest, &"d".into())
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let err = app
            .platform
            .register_participant(&contest, &UserId::new("ghost"))
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");

        app.advance(Duration::hours(4));
        app.create_user("e");
        let err = app
            .platform
            .register_participant(&contest, &"e".into())
            .unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn test_cases_lock_once_the_contest_starts() {
        let app = contest_app().await;
        let problem = "p1".into();
        let cases = || vec![TestCaseRequest::literal("2 2", "4", 100)];

        let updated = app.platform.replace_test_cases(&problem, cases()).unwrap();
        assert_eq!(updated.revision, 2);

        app.advance(Duration::minutes(61));
        let err = app.platform.replace_test_cases(&problem, cases()).unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
        let err = app
            .platform
            .update_problem(
                &problem,
                UpdateProblemRequest {
                    time_limit_ms: Some(2000),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.code(), "CONFLICT");

        // Statement edits stay allowed.
        let updated = app
            .platform
            .update_problem(
                &problem,
                UpdateProblemRequest {
                    description: Some("Add two integers.".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.revision, 3);
        assert_eq!(app.platform.problem(&problem).unwrap().test_cases.len(), 1);
    }

    #[tokio::test]
    async fn contests_are_deleted_only_when_not_running() {
        let app = contest_app().await;
        let contest = "c1".into();
        app.create_contest(
            "c2",
            epoch() + Duration::hours(5),
            epoch() + Duration::hours(6),
            [("p1", 100)],
        );
        app.platform.delete_contest(&"c2".into()).unwrap();

        app.advance(Duration::minutes(90));
        let err = app.platform.delete_contest(&contest).unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
        let record = app.judge_in_contest("a", "p1", "c1", programs::SUM).await;

        app.advance(Duration::hours(2));
        app.platform.delete_contest(&contest).unwrap();

        assert_eq!(app.platform.contest(&contest).unwrap_err().code(), "NOT_FOUND");
        assert_eq!(
            app.platform.leaderboard(&contest).await.unwrap_err().code(),
            "NOT_FOUND"
        );
        assert_eq!(
            app.platform.delete_contest(&contest).unwrap_err().code(),
            "NOT_FOUND"
        );
        let err = app
            .platform
            .submit(SubmitRequest::new("a", "p1", "fake", programs::SUM).in_contest("c1"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");

        // The old id stays taken, the submission stays readable, and the
        // problem is free to go.
        let err = app
            .platform
            .create_contest(
                CreateContestRequest::new(
                    "Rerun",
                    epoch() + Duration::hours(10),
                    epoch() + Duration::hours(11),
                    [("p1", 100)],
                )
                .with_id("c1"),
            )
            .unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
        let rejudged = app.rejudge(&record.submission.id).await;
        assert_eq!(rejudged.status, SubmissionStatus::Accepted);
        app.platform.delete_problem(&"p1".into()).unwrap();
        assert!(app.platform.contests().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn problem_deletion_and_contest_creation_do_not_interleave() {
        let app = TestApp::spawn().await;
        let start = epoch() + Duration::hours(1);

        for round in 0..64 {
            let problem = format!("q{round}");
            app.create_sum_problem(&problem);
            let mut req = CreateContestRequest::new("Race", start, start + Duration::hours(2), [("", 100)])
                .with_id(format!("r{round}"));
            req.problems[0].problem_id = problem.as_str().into();

            let platform = &app.platform;
            let (created, deleted) = std::thread::scope(|scope| {
                let create = scope.spawn(move || platform.create_contest(req));
                let delete = scope.spawn(|| platform.delete_problem(&problem.as_str().into()));
                (create.join().unwrap(), delete.join().unwrap())
            });

            // Whichever runs first wins and the other sees its effect.
            assert!(
                created.is_ok() != deleted.is_ok(),
                "round {round}: created {:?}, deleted {:?}",
                created.map(|c| c.id.clone()),
                deleted
            );
        }

        for contest in app.platform.contests() {
            let contest = app.platform.contest(&contest.id).unwrap();
            for entry in &contest.problems {
                assert!(app.platform.problem(&entry.problem_id).is_ok());
            }
        }
    }

    #[tokio::test]
    async fn problems_in_unfinished_contests_cannot_be_deleted() {
        let app = contest_app().await;
        let problem = "p1".into();

        let err = app.platform.delete_problem(&problem).unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
        app.advance(Duration::hours(2));
        let err = app.platform.delete_problem(&problem).unwrap_err();
        assert_eq!(err.code(), "CONFLICT");

        app.advance(Duration::hours(2));
        app.platform.delete_problem(&problem).unwrap();
        assert_eq!(app.platform.problem(&problem).unwrap_err().code(), "NOT_FOUND");
    }
}

mod validation {
    use super::*;

    #[tokio::test]
    async fn malformed_contests_are_rejected() {
        let app = TestApp::spawn().await;
        app.create_sum_problem("p1");
        let start = epoch();

        let cases = [
            CreateContestRequest::new("Backwards", start, start - Duration::hours(1), [("p1", 100)]),
            CreateContestRequest::new("Empty", start, start + Duration::hours(1), Vec::new()),
            CreateContestRequest::new("Zero", start, start + Duration::hours(1), [("p1", 0)]),
            CreateContestRequest::new(
                "Twice",
                start,
                start + Duration::hours(1),
                [("p1", 100), ("p1", 50)],
            ),
            CreateContestRequest::new("Unknown", start, start + Duration::hours(1), [("p9", 100)]),
            CreateContestRequest::new("  ", start, start + Duration::hours(1), [("p1", 100)]),
        ];
        for req in cases {
            let name = req.name.clone();
            let err = app.platform.create_contest(req).unwrap_err();
            assert_eq!(err.code(), "VALIDATION_ERROR", "contest {name:?}");
        }
        assert!(app.platform.contests().is_empty());
    }

    #[tokio::test]
    async fn duplicate_id_conflicts() {
        let app = TestApp::spawn().await;
        app.create_sum_problem("p1");
        app.create_contest("c1", epoch(), epoch() + Duration::hours(1), [("p1", 100)]);

        let err = app
            .platform
            .create_contest(
                CreateContestRequest::new("Again", epoch(), epoch() + Duration::hours(1), [("p1", 100)])
                    .with_id("c1"),
            )
            .unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn generated_ids_are_unique() {
        let app = TestApp::spawn().await;
        app.create_sum_problem("p1");
        let first = app
            .platform
            .create_contest(CreateContestRequest::new("One", epoch(), epoch() + Duration::hours(1), [("p1", 100)]))
            .unwrap();
        let second = app
            .platform
            .create_contest(CreateContestRequest::new("Two", epoch(), epoch() + Duration::hours(1), [("p1", 100)]))
            .unwrap();
        assert_ne!(first.id, second.id);
        assert!(first.id.as_str().starts_with("c-"));
    }
}
