use std::process;

mod cli;
mod logging;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let parsed = match cli::parse_args(&args) {
        Ok(cli::Command::Run(parsed)) => parsed,
        Ok(cli::Command::Help) => {
            cli::print_help();
            return;
        }
        Err(err) => {
            eprintln!("neurite: {err}");
            cli::print_help();
            process::exit(1);
        }
    };

    logging::setup_tracing(parsed.log_level);
    tracing::info!("Neurite starting");

    match cli::run(&parsed) {
        Ok(report) => println!("{}", cli::summary(&report)),
        Err(err) => {
            eprintln!("neurite error: {err}");
            process::exit(1);
        }
    }
}
