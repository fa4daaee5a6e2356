use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use tailwind_cli_manager::{
    build, download_cli, list_templates, prepare_watch, process, remove_cli, runserver,
    server_command, BuildOutcome, Cli, Commands, Config, GithubReleases, HelpFlagVerifier,
    InstallMode, Installer, Removal, ScaffoldOutcome, Session, Settings,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.command.verbose());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .with_env_var("TAILWIND_CLI_LOG")
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(cli.settings.settings_file.as_deref(), &cwd)?
        .merge(cli.settings.overrides());

    if let Commands::ListTemplates(args) = &cli.command {
        let config = Config::from_settings(settings)?;
        return print_templates(&config, args.verbose);
    }

    let client = GithubReleases::new()?;
    let verifier = HelpFlagVerifier;
    let installer = Installer::new(&client, &verifier);
    let session = Session::open(settings, &installer)?;

    if let Some(warning) = &session.version.warning {
        eprintln!("{} {}", "Warning:".yellow().bold(), warning);
    }

    match cli.command {
        Commands::Build(args) => {
            let report = build(&session, &installer, args.force)?;
            print_scaffold(&report.scaffolded);
            match report.outcome {
                BuildOutcome::Built(output) => {
                    if args.verbose {
                        eprintln!("{}", report.invocation.to_string().dimmed());
                        eprint!("{}", output.stderr);
                    }
                    println!(
                        "{} Built production stylesheet '{}'",
                        "✓".green(),
                        session.layout.dist_css.display()
                    );
                }
                BuildOutcome::UpToDate => {
                    println!(
                        "{} Production stylesheet '{}' is up to date. Use --force to rebuild.",
                        "✓".green(),
                        session.layout.dist_css.display()
                    );
                }
            }
        }
        Commands::Watch(args) => {
            let invocation = prepare_watch(&session, &installer)?;
            if args.verbose {
                eprintln!("{}", invocation.to_string().dimmed());
            }
            tokio_runtime()?.block_on(process::run_watch(&invocation))?;
        }
        Commands::DownloadCli => {
            let location = download_cli(&session, &installer)?;
            match location.mode {
                InstallMode::Managed => println!(
                    "{} Downloaded Tailwind CSS CLI {} to '{}'",
                    "✓".green(),
                    session.version,
                    location.path.display()
                ),
                InstallMode::PreInstalled => println!(
                    "{} Using pre-installed Tailwind CSS CLI at '{}'",
                    "✓".green(),
                    location.path.display()
                ),
            }
        }
        Commands::RemoveCli => match remove_cli(&session, &installer)? {
            Removal::Removed(path) => {
                println!("{} Removed Tailwind CSS CLI at '{}'", "✓".green(), path.display())
            }
            Removal::NothingInstalled(path) => println!(
                "{} Tailwind CSS CLI not found at '{}', nothing to remove",
                "•".yellow(),
                path.display()
            ),
            Removal::PreInstalledKept(path) => println!(
                "{} '{}' is a pre-installed Tailwind CSS CLI and was left in place",
                "•".yellow(),
                path.display()
            ),
        },
        Commands::Runserver(args) => {
            let invocation = prepare_watch(&session, &installer)?;
            let runtime = tokio_runtime()?;
            // Tokio commands register with the reactor, build them inside it
            runtime.block_on(async {
                let server = server_command(&session.config, &args.server_args())?;
                runserver(&invocation, server).await
            })?;
        }
        Commands::ListTemplates(_) => {}
    }

    Ok(())
}

fn tokio_runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread().enable_all().build()?)
}

fn print_scaffold(outcomes: &[ScaffoldOutcome]) {
    for outcome in outcomes {
        if let ScaffoldOutcome::Created(path) = outcome {
            println!("{} Created '{}'", "✓".green(), path.display());
        }
    }
}

fn print_templates(config: &Config, verbose: bool) -> anyhow::Result<()> {
    let scan = list_templates(config)?;

    for template in &scan.templates {
        println!("{}", template.display());
    }

    if verbose {
        for dir in &scan.scanned {
            eprintln!("{} Scanned '{}'", "•".blue(), dir.display());
        }
        eprintln!(
            "{} {} templates in {} directories",
            "•".blue(),
            scan.templates.len(),
            scan.scanned.len()
        );
    }
    for (_, message) in &scan.errors {
        eprintln!("{} {}", "Warning:".yellow().bold(), message);
    }

    Ok(())
}
