// ABOUTME: End-to-end orchestrator tests over in-memory fakes.
// ABOUTME: Covers step ordering, filtering, retries, partial publishes, and notification.

mod support;

use support::fakes::{FAKE_DIGEST, FakePlatform, FakeStore, RecordingNotifier};

use slipway::config::{
    EnvValue, NotifyConfig, RegistryConfig, RetryConfig, RolloutConfig, TargetPlan, VaultConfig,
    WatchConfig,
};
use slipway::notify::Notifier;
use slipway::pipeline::{RunStatus, StepName, StepStatus, TriggerEvent, execute};
use slipway::platform::RolloutStatus;
use slipway::types::{DeploymentId, ImageRef, SecretName, ServiceName};
use std::collections::HashMap;
use std::path::PathBuf;

const COMMIT: &str = "0a1b2c3d4e5f67890123456789abcdef01234567";

fn plan() -> TargetPlan {
    TargetPlan {
        service: ServiceName::new("api").unwrap(),
        target: "dev".to_string(),
        deployment: DeploymentId::new("api-dev"),
        context: PathBuf::from("."),
        dockerfile: "Dockerfile".to_string(),
        build_args: HashMap::new(),
        extra_tags: vec!["latest".to_string()],
        env: HashMap::from([(
            "LOG_LEVEL".to_string(),
            EnvValue::Literal("info".to_string()),
        )]),
        secrets: vec![
            SecretName::new("DATABASE_URL").unwrap(),
            SecretName::new("REGISTRY_USER").unwrap(),
            SecretName::new("REGISTRY_PASS").unwrap(),
        ],
        registry: RegistryConfig {
            repository: ImageRef::parse("registry.example.com/acme/api").unwrap(),
            username_secret: Some(SecretName::new("REGISTRY_USER").unwrap()),
            password_secret: Some(SecretName::new("REGISTRY_PASS").unwrap()),
        },
        vault: VaultConfig {
            url: "https://vault.example.com:8200".to_string(),
            token: EnvValue::Literal("root".to_string()),
            mount: "secret".to_string(),
        },
        watch: Some(WatchConfig {
            branch: Some("main".to_string()),
            paths: vec!["api".to_string()],
        }),
        rollout: RolloutConfig::default(),
        retry: RetryConfig::default(),
        notify: Some(NotifyConfig {
            webhook: EnvValue::Literal("https://hooks.example.com/deploys".to_string()),
            channel: Some("#deploys".to_string()),
            on_success: true,
        }),
    }
}

fn store() -> FakeStore {
    FakeStore::new(&[
        ("DATABASE_URL", "postgres://app:[email protected]/app"),
        ("REGISTRY_USER", "deploy-bot"),
        ("REGISTRY_PASS", "hunter2"),
    ])
}

fn trigger() -> TriggerEvent {
    TriggerEvent::new("main", COMMIT, ["api/src/handlers.py"])
}

#[tokio::test(start_paused = true)]
async fn successful_run_executes_steps_in_order() {
    let store = store();
    let platform = FakePlatform::new();
    let notifier = RecordingNotifier::new();

    let run = execute(
        plan(),
        trigger(),
        &store,
        &platform,
        Some(&notifier as &dyn Notifier),
    )
    .await;

    assert_eq!(run.status(), RunStatus::Succeeded);
    let names: Vec<StepName> = run.steps().iter().map(|s| s.name).collect();
    assert_eq!(
        names,
        vec![
            StepName::Resolve,
            StepName::Build,
            StepName::Publish,
            StepName::Rollout,
        ]
    );
    assert!(
        run.steps()
            .iter()
            .all(|s| s.status == StepStatus::Succeeded)
    );
    assert_eq!(store.fetches(), 3);

    // Commit tag is built and pushed first, extra tags follow, rollout last.
    let commit_ref = format!("registry.example.com/acme/api:{}", &COMMIT[..12]);
    assert_eq!(
        platform.calls(),
        vec![
            format!("build {commit_ref}"),
            format!("tag {commit_ref}"),
            format!("push {commit_ref}"),
            "tag registry.example.com/acme/api:latest".to_string(),
            "push registry.example.com/acme/api:latest".to_string(),
            format!("apply api-dev {FAKE_DIGEST}"),
            "status api-dev".to_string(),
        ]
    );

    let reports = notifier.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].status, RunStatus::Succeeded);
    assert_eq!(reports[0].channel.as_deref(), Some("#deploys"));
    assert!(reports[0].failing_step.is_none());
}

mod filtering {
    use super::*;

    #[tokio::test]
    async fn non_matching_path_skips_without_side_effects() {
        let store = store();
        let platform = FakePlatform::new();
        let notifier = RecordingNotifier::new();
        let trigger = TriggerEvent::new("main", COMMIT, ["docs/readme.md"]);

        let run = execute(
            plan(),
            trigger,
            &store,
            &platform,
            Some(&notifier as &dyn Notifier),
        )
        .await;

        assert_eq!(run.status(), RunStatus::Skipped);
        assert!(run.steps().is_empty());
        assert!(run.skip_reason().unwrap().contains("path"));
        assert_eq!(store.fetches(), 0);
        assert!(platform.calls().is_empty());
        assert!(notifier.reports().is_empty());
    }

    #[tokio::test]
    async fn branch_mismatch_names_both_branches() {
        let store = store();
        let platform = FakePlatform::new();
        let trigger = TriggerEvent::new("develop", COMMIT, ["api/src/handlers.py"]);

        let run = execute(plan(), trigger, &store, &platform, None).await;

        assert_eq!(run.status(), RunStatus::Skipped);
        let reason = run.skip_reason().unwrap();
        assert!(reason.contains("develop"));
        assert!(reason.contains("main"));
    }

    #[tokio::test]
    async fn absent_watch_config_runs_everything() {
        let mut plan = plan();
        plan.watch = None;
        let store = store();
        let platform = FakePlatform::new();
        let trigger = TriggerEvent::new("any-branch", COMMIT, Vec::<String>::new());

        let run = execute(plan, trigger, &store, &platform, None).await;

        assert_eq!(run.status(), RunStatus::Succeeded);
    }
}

mod retries {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn transient_vault_failures_are_retried() {
        let store = store().failing_first(2);
        let platform = FakePlatform::new();

        let run = execute(plan(), trigger(), &store, &platform, None).await;

        assert_eq!(run.status(), RunStatus::Succeeded);
        // Two failed fetches of the first name, then one success per name.
        assert_eq!(store.fetches(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn vault_outage_past_the_budget_fails_resolve() {
        let store = store().failing_first(10);
        let platform = FakePlatform::new();
        let notifier = RecordingNotifier::new();

        let run = execute(
            plan(),
            trigger(),
            &store,
            &platform,
            Some(&notifier as &dyn Notifier),
        )
        .await;

        assert_eq!(run.status(), RunStatus::Failed);
        let failing = run.failing_step().unwrap();
        assert_eq!(failing.name, StepName::Resolve);
        // One initial attempt plus the retry budget, then give up.
        assert_eq!(store.fetches(), 4);
        assert!(platform.calls().is_empty());

        let reports = notifier.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].failing_step.as_deref(), Some("resolve"));
    }

    #[tokio::test(start_paused = true)]
    async fn flaky_engine_build_is_retried() {
        let store = store();
        let platform = FakePlatform::new().build_flaking(2);

        let run = execute(plan(), trigger(), &store, &platform, None).await;

        assert_eq!(run.status(), RunStatus::Succeeded);
        let builds = platform
            .calls()
            .iter()
            .filter(|c| c.starts_with("build"))
            .count();
        assert_eq!(builds, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_push_failures_are_retried_per_destination() {
        let store = store();
        let platform = FakePlatform::new().push_flaking(1);

        let run = execute(plan(), trigger(), &store, &platform, None).await;

        assert_eq!(run.status(), RunStatus::Succeeded);
        // First destination pushed twice, second once.
        let pushes = platform
            .calls()
            .iter()
            .filter(|c| c.starts_with("push"))
            .count();
        assert_eq!(pushes, 3);
    }
}

mod publishing {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn failed_destination_fails_the_run_and_skips_rollout() {
        let store = store();
        let platform = FakePlatform::new().rejecting_pushes_to(":latest");
        let notifier = RecordingNotifier::new();

        let run = execute(
            plan(),
            trigger(),
            &store,
            &platform,
            Some(&notifier as &dyn Notifier),
        )
        .await;

        assert_eq!(run.status(), RunStatus::Failed);
        let failing = run.failing_step().unwrap();
        assert_eq!(failing.name, StepName::Publish);

        let detail = failing.detail.as_deref().unwrap();
        assert!(detail.contains(&format!("api:{}: pushed", &COMMIT[..12])));
        assert!(detail.contains("api:latest: failed"));

        assert!(platform.calls().iter().all(|c| !c.starts_with("apply")));
        assert_eq!(notifier.reports()[0].failing_step.as_deref(), Some("publish"));
    }

    #[tokio::test(start_paused = true)]
    async fn publish_continues_past_a_failed_destination() {
        let store = store();
        let platform = FakePlatform::new().rejecting_pushes_to(&COMMIT[..12]);

        let run = execute(plan(), trigger(), &store, &platform, None).await;

        assert_eq!(run.status(), RunStatus::Failed);
        let detail = run.failing_step().unwrap().detail.as_deref().unwrap();
        assert!(detail.contains(&format!("api:{}: failed", &COMMIT[..12])));
        assert!(detail.contains("api:latest: pushed"));
    }
}

mod rollout {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn unconfirmed_rollout_times_out_and_notifies_once() {
        let store = store();
        let platform = FakePlatform::new().never_settling();
        let notifier = RecordingNotifier::new();

        let run = execute(
            plan(),
            trigger(),
            &store,
            &platform,
            Some(&notifier as &dyn Notifier),
        )
        .await;

        assert_eq!(run.status(), RunStatus::Failed);
        let step = run.steps().last().unwrap();
        assert_eq!(step.name, StepName::Rollout);
        assert_eq!(step.status, StepStatus::TimedOut);
        assert!(run.timed_out());

        let reports = notifier.reports();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].timed_out);
        assert_eq!(reports[0].status, RunStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn confirmed_rollout_failure_is_not_a_timeout() {
        let store = store();
        let platform = FakePlatform::new().with_rollout(
            &[RolloutStatus::Progressing],
            RolloutStatus::Failed("containers crash-looping".to_string()),
        );
        let notifier = RecordingNotifier::new();

        let run = execute(
            plan(),
            trigger(),
            &store,
            &platform,
            Some(&notifier as &dyn Notifier),
        )
        .await;

        assert_eq!(run.status(), RunStatus::Failed);
        let step = run.steps().last().unwrap();
        assert_eq!(step.status, StepStatus::Failed);
        assert!(step.detail.as_deref().unwrap().contains("crash-looping"));
        assert!(!run.timed_out());
        assert!(!notifier.reports()[0].timed_out);
    }
}

mod notification {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn delivery_failure_does_not_change_the_run() {
        let store = store();
        let platform = FakePlatform::new();
        let notifier = RecordingNotifier::failing();

        let run = execute(
            plan(),
            trigger(),
            &store,
            &platform,
            Some(&notifier as &dyn Notifier),
        )
        .await;

        assert_eq!(run.status(), RunStatus::Succeeded);
        assert_eq!(notifier.reports().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn success_reports_respect_the_on_success_flag() {
        let mut plan = plan();
        plan.notify.as_mut().unwrap().on_success = false;
        let store = store();
        let platform = FakePlatform::new();
        let notifier = RecordingNotifier::new();

        let run = execute(
            plan,
            trigger(),
            &store,
            &platform,
            Some(&notifier as &dyn Notifier),
        )
        .await;

        assert_eq!(run.status(), RunStatus::Succeeded);
        assert!(notifier.reports().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failures_notify_even_when_success_reports_are_off() {
        let mut plan = plan();
        plan.notify.as_mut().unwrap().on_success = false;
        let store = store();
        let platform = FakePlatform::new().rejecting_pushes_to(":latest");
        let notifier = RecordingNotifier::new();

        let run = execute(
            plan,
            trigger(),
            &store,
            &platform,
            Some(&notifier as &dyn Notifier),
        )
        .await;

        assert_eq!(run.status(), RunStatus::Failed);
        assert_eq!(notifier.reports().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn no_notifier_configured_still_finishes_the_run() {
        let store = store();
        let platform = FakePlatform::new();

        let run = execute(plan(), trigger(), &store, &platform, None).await;

        assert_eq!(run.status(), RunStatus::Succeeded);
    }
}
