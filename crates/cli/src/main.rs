//! `faultline` binary entry point.

fn main() {
    std::process::exit(faultline_cli::run());
}
