//! Scenario tests driven through a scripted launcher and probe

mod common;

use command_executor::CapturedOutput;
use command_executor::testing::ScriptedLauncher;
use common::{CONTAINER_ID, CONTAINER_IP, FakeProbe, fast_config, healthy_launcher, ruby_source};
use image_test::{
    ContainerId, ImageTest, ImageTestError, OutputCheck, logging::init_test_tracing,
    with_container,
};

fn removals(launcher: &ScriptedLauncher) -> usize {
    launcher.count_matching(["docker", "rm", "-f"])
}

#[tokio::test]
async fn test_end_to_end_success() {
    init_test_tracing();
    let launcher = healthy_launcher();
    let probe = FakeProbe::ok();
    let test = ImageTest::with_parts(fast_config(), launcher.clone(), probe.clone());

    test.run(&ruby_source()).await.unwrap();

    let log = launcher.argv_log();
    assert_eq!(
        log.first().unwrap(),
        &vec![
            "sti",
            "build",
            "--force-pull=false",
            "--context-dir=",
            "https://example/app",
            "ruby-22-centos7",
            "app-test"
        ]
    );
    assert_eq!(
        log[1],
        vec!["docker", "run", "--user=12345", "-p", "8080", "-d", "app-test"]
    );
    assert_eq!(log.last().unwrap(), &vec!["docker", "rm", "-f", CONTAINER_ID]);
    assert_eq!(removals(&launcher), 1);
    assert_eq!(launcher.count_matching(["docker", "exec", CONTAINER_ID]), 1);
    assert_eq!(launcher.count_matching(["docker", "run", "--rm", "app-test"]), 1);
    assert_eq!(probe.urls(), vec![format!("http://{CONTAINER_IP}:8080")]);
}

#[tokio::test]
async fn test_reuse_mode_never_builds() {
    let launcher = healthy_launcher();
    let config = fast_config().with_reuse_images(true);
    let test = ImageTest::with_parts(config, launcher.clone(), FakeProbe::ok());

    test.run(&ruby_source()).await.unwrap();

    assert_eq!(launcher.count_matching(["sti"]), 0);
    assert_eq!(removals(&launcher), 1);
}

#[tokio::test]
async fn test_build_failure_aborts_before_run() {
    let launcher = ScriptedLauncher::new();
    launcher.respond(
        ["sti", "build"],
        CapturedOutput::failure(1, "error: unable to fetch https://example/app"),
    );
    let test = ImageTest::with_parts(fast_config(), launcher.clone(), FakeProbe::ok());

    let err = test.run(&ruby_source()).await.unwrap_err();

    assert!(matches!(err, ImageTestError::Build { .. }));
    assert!(err.to_string().contains("unable to fetch"));
    assert_eq!(launcher.count_matching(["docker"]), 0);
}

#[tokio::test]
async fn test_start_failure_skips_teardown() {
    let launcher = ScriptedLauncher::new();
    launcher.respond(
        ["docker", "run", "--user=12345"],
        CapturedOutput::failure(125, "docker: Error response from daemon: No such image"),
    );
    let test = ImageTest::with_parts(
        fast_config().with_reuse_images(true),
        launcher.clone(),
        FakeProbe::ok(),
    );

    let err = test.run(&ruby_source()).await.unwrap_err();

    assert!(err.to_string().contains("No such image"));
    assert_eq!(removals(&launcher), 0);
    assert_eq!(launcher.count_matching(["docker", "exec"]), 0);
}

#[tokio::test]
async fn test_failed_checks_are_all_reported_and_container_removed_once() {
    let launcher = healthy_launcher();
    let probe = FakeProbe::answering(vec![Ok(500)]);
    let config = fast_config().with_output_check(OutputCheck::scl_enabled("ruby --version", "ruby 2.2"));
    let test = ImageTest::with_parts(config, launcher.clone(), probe.clone());

    let err = test.run(&ruby_source()).await.unwrap_err();

    let failures = err.check_failures();
    assert_eq!(failures.len(), 2, "{err}");
    let http = failures.iter().find(|f| f.check == "http-connectivity").unwrap();
    assert_eq!(http.message, "HTTP status: got 500, want 200");
    let output = failures.iter().find(|f| f.check == "command-output").unwrap();
    assert!(output.message.contains("want 'ruby 2.2'"));
    assert!(output.message.contains("ruby 2.0.0p598"));

    assert_eq!(probe.urls().len(), 1);
    assert_eq!(removals(&launcher), 1);
}

#[tokio::test]
async fn test_connectivity_retries_transport_errors() {
    let launcher = healthy_launcher();
    let probe = FakeProbe::answering(vec![
        Err("connection refused".to_string()),
        Err("connection refused".to_string()),
        Ok(200),
    ]);
    let test = ImageTest::with_parts(fast_config(), launcher.clone(), probe.clone());

    test.run(&ruby_source()).await.unwrap();

    assert_eq!(probe.urls().len(), 3);
}

#[tokio::test]
async fn test_unreachable_application_fails_after_budget() {
    let launcher = healthy_launcher();
    let probe = FakeProbe::answering(vec![Err("connection refused".to_string())]);
    let test = ImageTest::with_parts(fast_config(), launcher.clone(), probe.clone());

    let err = test.run(&ruby_source()).await.unwrap_err();

    assert_eq!(err.check_failures().len(), 1);
    assert_eq!(
        err.check_failures()[0].message,
        "failed after 10 attempts: connection refused"
    );
    assert_eq!(probe.urls().len(), 10);
    assert_eq!(removals(&launcher), 1);
}

#[tokio::test]
async fn test_inspect_failure_fails_only_connectivity() {
    let launcher = ScriptedLauncher::new();
    launcher
        .respond(
            ["docker", "run", "--user=12345"],
            CapturedOutput::success(format!("{CONTAINER_ID}\n")),
        )
        .respond(["docker", "inspect"], CapturedOutput::failure(1, "Error: No such object"))
        .respond_always(["docker", "exec"], CapturedOutput::success("ruby 2.0.0\n"))
        .respond_always(["docker", "run", "--rm"], CapturedOutput::success("ruby 2.0.0\n"));
    let probe = FakeProbe::ok();
    let test = ImageTest::with_parts(fast_config().with_reuse_images(true), launcher.clone(), probe.clone());

    let err = test.run(&ruby_source()).await.unwrap_err();

    assert_eq!(err.check_failures().len(), 1);
    assert!(err.check_failures()[0].message.contains("No such object"));
    assert!(probe.urls().is_empty());
    assert_eq!(removals(&launcher), 1);
}

#[tokio::test]
async fn test_teardown_failure_is_reported_when_checks_pass() {
    let launcher = healthy_launcher();
    launcher.respond(["docker", "rm"], CapturedOutput::failure(1, "removal of container is already in progress"));
    let test = ImageTest::with_parts(fast_config(), launcher.clone(), FakeProbe::ok());

    let err = test.run(&ruby_source()).await.unwrap_err();

    assert!(matches!(err, ImageTestError::Teardown { .. }));
    assert!(err.to_string().contains("already in progress"));
}

#[tokio::test]
async fn test_with_container_removes_after_panic() {
    let launcher = ScriptedLauncher::new();
    let test = ImageTest::with_parts(fast_config(), launcher.clone(), FakeProbe::ok());
    let runtime = test.runtime();

    let outcome = tokio::spawn(async move {
        let rt = &runtime;
        with_container(rt, ContainerId::new("abc"), move |_id| async move {
            if rt.app_port() == 8080 {
                panic!("assertion inside scenario");
            }
            Ok(())
        })
        .await
    })
    .await;

    assert!(outcome.unwrap_err().is_panic());
    assert_eq!(launcher.argv_log(), vec![vec!["docker", "rm", "-f", "abc"]]);
}

#[tokio::test]
async fn test_custom_ports_and_user() {
    let launcher = healthy_launcher();
    launcher.respond(
        ["docker", "run", "--user=1001"],
        CapturedOutput::success(format!("{CONTAINER_ID}\n")),
    );
    let probe = FakeProbe::ok();
    let mut config = fast_config().with_reuse_images(true);
    config.user_id = 1001;
    config.app_port = 3000;
    let test = ImageTest::with_parts(config, launcher.clone(), probe.clone());

    test.run(&ruby_source()).await.unwrap();

    assert_eq!(
        launcher.argv_log()[0],
        vec!["docker", "run", "--user=1001", "-p", "3000", "-d", "app-test"]
    );
    assert_eq!(probe.urls(), vec![format!("http://{CONTAINER_IP}:3000")]);
}
