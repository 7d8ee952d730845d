mod aggregator;
mod categorizer;
mod cli;
mod error;
mod export;
mod fmt;
mod importer;
mod logging;
mod models;
mod normalizer;
mod pipeline;
mod reports;
mod settings;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);
    let rules = cli.rules.as_deref();

    let result = match cli.command {
        Commands::Load { file } => cli::load::run(&file, rules),
        Commands::Kpi { file, filter } => cli::report::kpi(&file, rules, &filter),
        Commands::Trend {
            file,
            frequency,
            filter,
        } => cli::report::trend(&file, rules, frequency, &filter),
        Commands::Top {
            file,
            by,
            dimension,
            limit,
            filter,
        } => cli::report::top(&file, rules, &by, &dimension, limit, &filter),
        Commands::Split { file, by, filter } => cli::report::split(&file, rules, &by, &filter),
        Commands::Compare {
            file,
            from1,
            to1,
            from2,
            to2,
            name1,
            name2,
        } => cli::report::compare(&file, rules, &from1, &to1, &from2, &to2, &name1, &name2),
        Commands::Export {
            file,
            output,
            json,
            filter,
        } => cli::export::run(&file, rules, output, json, &filter),
        Commands::Categories => cli::categories::list(rules),
        Commands::Articles { file, categories } => {
            cli::categories::articles(&file, rules, &categories)
        }
        Commands::Settings {
            rules_path,
            top_limit,
            frequency,
        } => cli::config::run(rules_path, top_limit, frequency),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
