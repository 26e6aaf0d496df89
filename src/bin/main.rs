use clap::Parser;
use std::{
    env,
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
    rc::Rc,
};
use tracing::{Level, error};
use tracing_subscriber::{EnvFilter, fmt::writer::MakeWriterExt};

use mbuild::{
    cli::Cli,
    config::{Config, load_config},
    dispatch,
    process::{ForkRunner, PREVIEW_TARGET},
    project::Project,
    rebuild::Bootstrapper,
};

fn main() -> ExitCode {
    let argv: Vec<String> = env::args().collect();
    let program = argv.first().cloned().unwrap_or_else(|| "mbuild".into());

    let cli = match Cli::try_parse_from(&argv) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::FAILURE;
        }
    };
    init_logging(&cli);

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!("failed to load configuration: {err}.");
            return ExitCode::FAILURE;
        }
    };
    let project_dir = config
        .project_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    if !cli.no_rebuild
        && let Some(code) = self_rebuild(&config, &project_dir, &argv)
    {
        return code;
    }

    let project = Project::new(config, Rc::new(ForkRunner));
    let registry = match project.registry() {
        Ok(registry) => registry,
        Err(err) => {
            error!("{err}.");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = env::set_current_dir(&project_dir) {
        error!("could not enter {}: {err}.", project_dir.display());
        return ExitCode::FAILURE;
    }

    let stdout = io::stdout();
    let stderr = io::stderr();
    let result = dispatch::apply(
        &registry,
        &program,
        &cli.request(),
        &mut stdout.lock(),
        &mut stderr.lock(),
    );
    let _ = io::stdout().flush();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

fn init_logging(args: &Cli) {
    let base = match args.log_level {
        Some(level) => level.as_str().to_string(),
        None => env::var(EnvFilter::DEFAULT_ENV)
            .ok()
            .filter(|directives| !directives.trim().is_empty())
            .unwrap_or_else(|| "info".into()),
    };
    // Command previews are the audit trail and survive any level.
    let filter = EnvFilter::builder().parse_lossy(format!("{base},{PREVIEW_TARGET}=info"));

    let writer = io::stderr.with_max_level(Level::WARN).or_else(io::stdout);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .without_time()
        .try_init();
}

/// Returns the exit code to terminate with when the binary was rebuilt or the
/// rebuild failed, and `None` when execution should continue.
fn self_rebuild(config: &Config, project_dir: &Path, argv: &[String]) -> Option<ExitCode> {
    let rebuild = config.rebuild.as_ref()?;

    let binary = match env::current_exe() {
        Ok(binary) => binary,
        Err(err) => {
            error!("could not locate the running binary: {err}.");
            return Some(ExitCode::FAILURE);
        }
    };
    let source = rebuild.source_path(project_dir);
    let args = argv.get(1..).unwrap_or_default().to_vec();

    let runner = ForkRunner;
    match Bootstrapper::new(binary, source, rebuild.command.clone(), args, &runner).run() {
        Ok(outcome) => outcome.exit_code().map(ExitCode::from),
        Err(err) => {
            error!("{err}.");
            Some(ExitCode::FAILURE)
        }
    }
}
