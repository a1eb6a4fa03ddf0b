use colored::Colorize;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    let msg = err.to_string().to_lowercase();

    if msg.contains("database already open") || msg.contains("cannot acquire lock") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Another moodmem process is using the database.");
        eprintln!("  Pass a different one with {} moodmem --db-path <file>", "$".dimmed());
    }

    if msg.contains("unknown config key") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  List the available keys with:");
        eprintln!("  {} moodmem config show", "$".dimmed());
    }

    std::process::exit(1);
}
