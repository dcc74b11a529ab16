#[tokio::main]
async fn main() -> anyhow::Result<()> {
    swapgate_lib::run().await
}
