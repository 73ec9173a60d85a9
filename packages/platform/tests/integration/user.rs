use ::common::UserId;
use ::common::contest::ContestStatus;
use ::common::user::{Role, UserStats};
use chrono::Duration;
use platform::models::submission::SubmitRequest;
use platform::models::user::{CreateUserRequest, UpdateUserRequest, UserQuery};

use crate::common::{TestApp, epoch, programs};

mod accounts {
    use super::*;

    #[tokio::test]
    async fn created_user_is_enabled() {
        let app = TestApp::spawn().await;

        let user = app
            .platform
            .create_user(CreateUserRequest::new("Ada Lovelace", "ada@example.com", Role::Instructor))
            .unwrap();

        assert!(user.enabled);
        assert!(user.id.as_str().starts_with("u-"));
        assert_eq!(app.platform.user(&user.id).unwrap().name, "Ada Lovelace");
        assert_eq!(
            app.platform.user_stats(&user.id).await.unwrap(),
            UserStats::default()
        );
    }

    #[tokio::test]
    async fn email_is_unique_ignoring_case() {
        let app = TestApp::spawn().await;
        app.create_user("u1");

        let err = app
            .platform
            .create_user(CreateUserRequest::new("Copy", "U1@Example.COM", Role::Student))
            .unwrap_err();
        assert_eq!(err.code(), "CONFLICT");

        let err = app
            .platform
            .create_user(CreateUserRequest::new("Bad", "not-an-email", Role::Student))
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn update_changes_profile_fields() {
        let app = TestApp::spawn().await;
        app.create_user("u1");
        app.create_user("u2");
        let id = UserId::new("u1");

        let updated = app
            .platform
            .update_user(
                &id,
                UpdateUserRequest {
                    name: Some("Renamed".into()),
                    email: Some("renamed@example.com".into()),
                    role: Some(Role::Admin),
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.role, Role::Admin);

        // The old address is free again, the new one is taken.
        app.platform
            .create_user(CreateUserRequest::new("New", "u1@example.com", Role::Student))
            .unwrap();
        let err = app
            .platform
            .update_user(
                &"u2".into(),
                UpdateUserRequest {
                    email: Some("RENAMED@example.com".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let app = TestApp::spawn().await;
        let id = UserId::new("ghost");

        assert_eq!(app.platform.user(&id).unwrap_err().code(), "NOT_FOUND");
        assert_eq!(
            app.platform.set_user_enabled(&id, false).unwrap_err().code(),
            "NOT_FOUND"
        );
        assert_eq!(
            app.platform.user_stats(&id).await.unwrap_err().code(),
            "NOT_FOUND"
        );
    }

    #[tokio::test]
    async fn users_are_listed_by_id() {
        let app = TestApp::spawn().await;
        app.create_user("u2");
        app.create_user("u1");

        let ids: Vec<_> = app
            .platform
            .users()
            .into_iter()
            .map(|u| u.id.as_str().to_string())
            .collect();
        assert_eq!(ids, ["u1", "u2"]);
    }
}

mod removal {
    use super::*;

    #[tokio::test]
    async fn only_users_without_submissions_can_be_deleted() {
        let app = TestApp::spawn().await;
        app.create_user("u1");
        app.create_user("u2");
        app.create_sum_problem("p1");
        app.create_contest(
            "c1",
            epoch() + Duration::hours(1),
            epoch() + Duration::hours(2),
            [("p1", 100)],
        );
        app.platform
            .register_participant(&"c1".into(), &"u2".into())
            .unwrap();
        app.judge("u1", "p1", programs::SUM).await;

        let err = app.platform.delete_user(&"u1".into()).unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
        assert!(app.platform.user(&"u1".into()).is_ok());

        app.platform.delete_user(&"u2".into()).unwrap();
        assert_eq!(app.platform.user(&"u2".into()).unwrap_err().code(), "NOT_FOUND");
        assert_eq!(
            app.platform.delete_user(&"u2".into()).unwrap_err().code(),
            "NOT_FOUND"
        );
        let contest = app.platform.contest(&"c1".into()).unwrap();
        assert!(!contest.participants.contains(&UserId::from("u2")));

        // The email is free again.
        app.platform
            .create_user(CreateUserRequest::new("Newcomer", "U2@example.com", Role::Student))
            .unwrap();
        let err = app
            .platform
            .submit(SubmitRequest::new("u2", "p1", "fake", programs::SUM))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn search_filters_by_role_and_text() {
        let app = TestApp::spawn().await;
        app.create_user("u1");
        app.create_user("u2");
        app.platform
            .create_user(
                CreateUserRequest::new("Grace Hopper", "grace@navy.mil", Role::Instructor)
                    .with_id("t1"),
            )
            .unwrap();

        let ids = |query: UserQuery| -> Vec<String> {
            app.platform
                .search_users(&query)
                .into_iter()
                .map(|u| u.id.as_str().to_string())
                .collect()
        };
        assert_eq!(ids(UserQuery::default()), ["t1", "u1", "u2"]);
        assert_eq!(ids(UserQuery::default().role(Role::Student)), ["u1", "u2"]);
        assert_eq!(ids(UserQuery::default().search("hopper")), ["t1"]);
        assert_eq!(ids(UserQuery::default().search("U2@EXAMPLE")), ["u2"]);
        assert!(ids(UserQuery::default().role(Role::Admin)).is_empty());
    }
}

mod sample_data {
    use super::*;

    #[tokio::test]
    async fn seed_loads_the_catalogue() {
        let app = TestApp::spawn().await;
        platform::seed::seed(&app.platform).unwrap();

        assert_eq!(app.platform.problems().len(), 6);
        assert_eq!(app.platform.users().len(), 5);
        assert!(!app.platform.user(&"u4".into()).unwrap().enabled);

        let statuses: Vec<_> = ["c1", "c2", "c3", "c4"]
            .into_iter()
            .map(|id| app.platform.contest_status(&id.into()).unwrap())
            .collect();
        assert_eq!(
            statuses,
            [
                ContestStatus::Upcoming,
                ContestStatus::Ongoing,
                ContestStatus::Finished,
                ContestStatus::Upcoming,
            ]
        );

        let c2 = app.platform.contest(&"c2".into()).unwrap();
        assert_eq!(c2.participant_count(), 2);
        assert_eq!(c2.total_points(), 450);
        let c3 = app.platform.contest(&"c3".into()).unwrap();
        assert_eq!(c3.participant_count(), 0);
    }

    #[tokio::test]
    async fn seeding_twice_conflicts() {
        let app = TestApp::spawn().await;
        platform::seed::seed(&app.platform).unwrap();

        let err = platform::seed::seed(&app.platform).unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
    }
}
