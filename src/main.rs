fn main() {
    if let Err(e) = pii_detector::run() {
        eprintln!("pii-detector: {e}");
        std::process::exit(1);
    }
}
