use nafez::configuration::get_configuration;
use nafez::startup::Application;
use nafez::telemetry::{get_subscriber, init_subscriber};

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("nafez".into(), "nafez=info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let configuration = get_configuration()?;
    let application = Application::build(configuration).await?;
    application.run_until_stopped().await?;
    Ok(())
}
