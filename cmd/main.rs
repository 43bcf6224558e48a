use esther_callbacks::{
    ApplicationBootstrap, init_tracing_from_config, load_config, with_bootstrap_logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::var("ESTHER_CONFIG").ok();
    let config = with_bootstrap_logging(|| load_config(path.as_deref()))?;
    init_tracing_from_config(Some(&config.logging));

    ApplicationBootstrap::run(&config).await
}
