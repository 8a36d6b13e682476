use colored::Colorize;
use std::process;

fn main() {
    if let Err(e) = rjust::cli::run() {
        eprintln!("{} {}", "error:".red().bold(), e);
        process::exit(e.exit_code());
    }
}
