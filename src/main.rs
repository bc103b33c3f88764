#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dnf_proxy_lib::run().await
}
