use clap::Parser;
use tappweb::cli::{self, Cli, Command};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    if let Command::Run(args) = &cli.command {
        builder.worker_threads(usize::from(args.workers));
    }
    let runtime = builder.enable_all().build()?;

    runtime.block_on(async move {
        match cli.command {
            Command::MakeMigrations => cli::migrations::make_migrations().await,
            Command::Migrate => cli::migrations::migrate().await,
            Command::Rollback => cli::migrations::rollback().await,
            Command::Run(args) => cli::run::run(args).await,
        }
    })
}
