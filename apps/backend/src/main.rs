#[tokio::main]
async fn main() -> anyhow::Result<()> {
    hakwon_prep_backend::run().await
}
