fn main() {
    if let Err(e) = medicfacil_lib::run() {
        eprintln!("{}: {e}", medicfacil_lib::config::APP_NAME);
        std::process::exit(1);
    }
}
