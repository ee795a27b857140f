fn main() {
    if let Err(e) = vync_drv::main() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
