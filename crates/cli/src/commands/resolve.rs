use modsmith_config::BuildConfig;
use modsmith_resolve::Resolver;
use modsmith_transfer::Transfer;
use std::sync::Arc;

pub async fn execute(config: BuildConfig) -> eyre::Result<()> {
    let resolver = Resolver::new(config, Arc::new(Transfer::new()?))?;
    let resolution = resolver.resolve().await?;

    for fetched in &resolution.fetched {
        println!("{} <- {}", fetched.module, fetched.uri);
    }
    println!(
        "{} module(s) declared, {} fetched in {} round(s)",
        resolution.declared.len(),
        resolution.fetched.len(),
        resolution.rounds
    );
    Ok(())
}
