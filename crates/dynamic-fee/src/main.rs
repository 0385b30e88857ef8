#[tokio::main]
async fn main() {
    dynamic_fee::start(std::env::args()).await;
}
