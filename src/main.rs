fn main() {
    if let Err(err) = gesturepointer_lib::run() {
        log::error!("{err}");
        eprintln!("gesturepointer: {err}");
        std::process::exit(1);
    }
}
