use colored::Colorize;
use schema_openapi::cli;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let command_line_interface = cli::CommandLineInterface::load();
    if let Err(error) = command_line_interface.run() {
        eprintln!("{} {error:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
