//! Cache maintenance commands.

use crate::cache::MetadataCache;
use crate::config::Config;

fn open_cache(config: &Config) -> MetadataCache {
    MetadataCache::open(config.cache_path(), config.cache_settings())
}

/// Print record counts
pub fn cmd_cache_stats(config: &Config) -> anyhow::Result<()> {
    let cache = open_cache(config);
    let stats = cache.stats();

    println!("Cache: {}", cache.path().display());
    if cache.is_empty() {
        println!("  (empty)");
        return Ok(());
    }
    println!("  Total:   {}", stats.total);
    println!("  Valid:   {}", stats.valid);
    println!("  Expired: {}", stats.expired);
    println!("  Failed:  {}", stats.failed);
    Ok(())
}

/// Remove expired records and save
pub fn cmd_cache_clean(config: &Config) -> anyhow::Result<()> {
    let mut cache = open_cache(config);
    let removed = cache.cleanup_expired();

    if removed == 0 {
        println!("No expired records in {}", cache.path().display());
        return Ok(());
    }

    cache.save()?;
    println!(
        "✓ Removed {} expired records, {} remain",
        removed,
        cache.len()
    );
    Ok(())
}
