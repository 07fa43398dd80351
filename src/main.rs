// gene - ask your database questions in plain english

use gene::cli;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("{e:?}");
        std::process::exit(1);
    }
}
