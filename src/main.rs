use colored::Colorize;

fn main() {
    match hookguard::run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{} {}", "✗".bright_red(), err);
            std::process::exit(1);
        }
    }
}
