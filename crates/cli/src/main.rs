fn main() {
    if let Err(e) = chainscope_cli::run() {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
