use azure_nsg_reconcile::cli::Cli;
use azure_nsg_reconcile::{logging, output, run};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Do as little as possible in main.rs as it can't contain any tests
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let result = logging::init(&cli.log_config).and_then(|()| {
        log::info!("#Start main()");
        run(cli)
    });

    match result {
        Ok(()) => {
            log::info!("#End main()");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            output::print_error(&err);
            ExitCode::FAILURE
        }
    }
}
