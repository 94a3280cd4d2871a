#[tokio::main]
async fn main() -> anyhow::Result<()> {
    verb_trainer_backend::run().await
}
