use std::sync::Arc;

use photofacet_backend::{
    config::Config, database, models::FilterState, query::GalleryEngine, store::PgPhotoStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("photofacet_backend=warn"))
        .init();

    let config = Config::from_env()?;
    let pool = database::create_pool(&config).await?;
    let engine = GalleryEngine::new(Arc::new(PgPhotoStore::new(pool)), &config);

    let counts = engine.facet_counts(&FilterState::new()).await;

    for (dimension, facets) in &counts.dimensions {
        println!(
            "{} via {:?}: {} values, {} photos",
            dimension,
            facets.path,
            facets.counts.len(),
            facets.total()
        );
        for count in &facets.counts {
            println!("    {:<20} {}", count.value, count.count);
        }
    }

    if counts.dimensions.values().any(|facets| facets.used_fallback()) {
        println!("facet_value_counts() is not installed; run the migrations to enable grouped counts");
    }

    Ok(())
}
