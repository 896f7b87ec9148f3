fn main() {
    if let Err(err) = ctfb::run() {
        eprintln!("fatal: {err:#}");
        std::process::exit(1);
    }
}
