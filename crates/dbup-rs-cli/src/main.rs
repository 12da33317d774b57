//! The `dbup` binary.
//!
//! Propagated errors are printed to standard output with an `[ERR]`
//! prefix and exit non-zero, matching the historical client; controlled
//! aborts exit zero after the engine has reported them.

#[tokio::main]
async fn main() {
    let matches = dbup_rs_cli::cli().get_matches();
    if let Err(e) = dbup_rs_cli::run(&matches).await {
        println!("[ERR] Caught exception: {e}");
        std::process::exit(1);
    }
}
