fn main() {
    if let Err(e) = llpc_drv::main() {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}
