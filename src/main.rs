use human_panic::setup_panic;
use projectsim::cli::run_cli;

fn main() -> anyhow::Result<()> {
    setup_panic!();
    run_cli()
}
