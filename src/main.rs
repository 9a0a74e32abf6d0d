use anyhow::Context;

use lectern_kernel::settings::Settings;
use lectern_kernel::{InitCtx, ModuleRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load Lectern settings")?;

    lectern_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        "lectern-app bootstrap starting"
    );

    let pool = lectern_db::connect(&settings.database).await?;

    let mut registry = ModuleRegistry::new();
    lectern_app::modules::register_all(&mut registry, pool.clone());

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_all(&ctx).await?;

    lectern_db::run_migrations(&pool, &registry.collect_migrations()).await?;

    registry.start_all(&ctx).await?;

    tracing::info!("lectern-app bootstrap complete");

    lectern_http::start_server(&registry, &settings).await?;

    registry.stop_all().await?;
    pool.close().await;

    Ok(())
}
