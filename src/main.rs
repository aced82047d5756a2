use colored::Colorize;

fn main() {
    if let Err(err) = tag_filters::run() {
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
