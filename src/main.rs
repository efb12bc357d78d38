#[tokio::main]
async fn main() -> anyhow::Result<()> {
    installation_tokens::app::run().await
}
