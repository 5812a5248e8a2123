//! Integration tests for the `demo run` command.
use projectsim::cli::RunOpts;
use projectsim::cli::demo::handle_demo_run_command;
use projectsim::settings::Settings;
use tempfile::tempdir;

/// An integration test for the `demo run` command.
#[test]
fn test_handle_demo_run_command() {
    unsafe { std::env::set_var("PROJECTSIM_LOG_LEVEL", "off") };

    let tempdir = tempdir().unwrap();
    let output_dir = tempdir.path().join("carbon");
    let opts = RunOpts {
        steps: Some(36),
        output_dir: Some(output_dir.clone()),
        ..RunOpts::default()
    };
    handle_demo_run_command("carbon", opts, Some(Settings::default())).unwrap();
    assert!(output_dir.join("transactions.csv").is_file());
}
