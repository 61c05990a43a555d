#[tokio::main]
async fn main() -> anyhow::Result<()> {
    hebcards::run().await
}
