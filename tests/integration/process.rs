use mbuild::{
    command::Command,
    error::ProcessError,
    process::{ForkRunner, Runner, await_process, run_async, run_sync},
};

fn shell(script: &str) -> Command {
    let mut command = Command::new();
    command.args(["sh", "-c", script]);
    command
}

#[test]
fn successful_child_is_ok() {
    let command: Command = ["true"].into_iter().collect();
    assert!(run_sync(&command).is_ok());
}

#[test]
fn exit_code_is_reported() {
    match run_sync(&shell("exit 5")) {
        Err(ProcessError::ExitCode(code)) => assert_eq!(code, 5),
        other => panic!("expected exit code failure, got {other:?}"),
    }
}

#[test]
fn signal_termination_is_reported() {
    match run_sync(&shell("kill -TERM $$")) {
        Err(ProcessError::Signaled(signal)) => assert_eq!(signal, "SIGTERM"),
        other => panic!("expected signal failure, got {other:?}"),
    }
}

#[test]
fn missing_program_fails_in_child() {
    let command: Command = ["mbuild-definitely-not-a-program"].into_iter().collect();
    assert!(matches!(
        run_sync(&command),
        Err(ProcessError::ExitCode(1))
    ));
}

#[test]
fn async_handle_can_be_awaited_later() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("marker");
    let handle = run_async(&shell(&format!("sleep 0.1; touch {}", marker.display()))).unwrap();

    assert!(handle.is_valid());
    assert!(handle.pid().is_some());
    await_process(handle).unwrap();
    assert!(marker.exists());
}

#[test]
fn fork_runner_runs_commands_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("order.log");
    let runner = ForkRunner;

    for word in ["first", "second"] {
        runner
            .run_sync(&shell(&format!("echo {word} >> {}", log.display())))
            .unwrap();
    }

    assert_eq!(std::fs::read_to_string(&log).unwrap(), "first\nsecond\n");
}
