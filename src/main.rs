// src/main.rs
use bilingual_portal::start_server;

#[tokio::main]
async fn main() {
    if let Err(e) = start_server().await {
        eprintln!("bilingual-portal failed: {e}");
        std::process::exit(1);
    }
}
