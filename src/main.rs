use roadstop::config::Config;
use roadstop::engine::Engine;
use roadstop::error::Error;
use roadstop::server::serve;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let engine = Engine::new(&config)?;

    serve(engine, config.addr).await
}
