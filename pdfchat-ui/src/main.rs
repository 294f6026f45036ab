use pdfchat_ui::server::{ServerConfig, run_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    run_server(ServerConfig::from_env()).await
}
