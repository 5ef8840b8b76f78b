use std::process::exit;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    exit(emc_drv::run(&args));
}
