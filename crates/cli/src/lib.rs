pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "techshop",
    about = "TechShop assistant operator CLI",
    long_about = "Apply migrations, load the demo catalog, inspect configuration, and run product searches from the terminal.",
    after_help = "Examples:\n  techshop migrate\n  techshop seed\n  techshop search --category \"điện thoại\" --qualifier cheap\n  techshop search --brand samsung --min-ram 12 --explain"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo catalog (idempotent) and verify every seeded row")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
    #[command(about = "Run the product search for the given filters and print the reply as text")]
    Search(commands::search::SearchArgs),
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Search(args) => commands::search::run(&args),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
