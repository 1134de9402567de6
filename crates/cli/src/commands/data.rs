//! JSON collection maintenance.
//!
//! `check` reads every collection file without repairing anything, so it is
//! safe to run against a live data directory. `seed` loads catalog content
//! from a YAML file, validating every entry before anything is written.
//!
//! # Seed file format
//!
//! ```yaml
//! products:
//!   - name: Weekender Duffel
//!     price: 45000
//!     category: travel
//! blog_posts:
//!   - title: Caring for leather
//!     content: "..."
//! ```

use std::path::Path;

use bagworks_core::{BlogPostId, ProductId};
use bagworks_server::config::data_dir_from_env;
use bagworks_server::models::{NewBlogPost, NewProduct, ValidationError};
use bagworks_server::store::{JsonCollection, Record, Store, StoreError, unique_timestamp_id};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur during data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// One or more collection files could not be read.
    #[error("{0} collection file(s) unreadable")]
    Unreadable(usize),

    /// Seed file could not be read.
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    /// Seed file is not valid YAML for the expected shape.
    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Seed entries failed validation.
    #[error("{0} validation errors found")]
    Invalid(usize),

    /// Writing a collection failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Catalog content accepted by `data seed`.
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub products: Vec<NewProduct>,
    #[serde(default)]
    pub blog_posts: Vec<NewBlogPost>,
}

/// Report the record count of every collection.
///
/// # Errors
///
/// Returns [`DataError::Unreadable`] if any file exists but is not a JSON array.
pub async fn check() -> Result<(), DataError> {
    let data_dir = data_dir_from_env();
    tracing::info!(data_dir = %data_dir.display(), "Checking collections");

    let store = Store::new(&data_dir);
    let results = [
        report(&store.products).await,
        report(&store.orders).await,
        report(&store.blog_posts).await,
        report(&store.admins).await,
    ];

    let unreadable = results.iter().filter(|ok| !**ok).count();
    if unreadable > 0 {
        return Err(DataError::Unreadable(unreadable));
    }
    Ok(())
}

async fn report<T: Record>(collection: &JsonCollection<T>) -> bool {
    match collection.check().await {
        Ok(count) => {
            tracing::info!(collection = collection.name(), count, "OK");
            true
        }
        Err(reason) => {
            tracing::error!(
                collection = collection.name(),
                path = %collection.path().display(),
                reason = %reason,
                "Unreadable"
            );
            false
        }
    }
}

/// Load products and blog posts from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, any entry fails
/// validation (nothing is written in that case), or a collection cannot be
/// written.
pub async fn seed(file_path: &str, replace: bool) -> Result<(), DataError> {
    let path = Path::new(file_path);
    tracing::info!(path = %file_path, "Loading seed file");

    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;
    tracing::info!(
        products = seed.products.len(),
        blog_posts = seed.blog_posts.len(),
        "Parsed seed file"
    );

    let store = Store::new(&data_dir_from_env());
    seed_store(&store, seed, replace, Utc::now()).await
}

async fn seed_store(
    store: &Store,
    seed: SeedFile,
    replace: bool,
    now: DateTime<Utc>,
) -> Result<(), DataError> {
    // Validate everything up front so a bad entry leaves both files untouched.
    let mut errors = validate_entries("product", &seed.products, |p| {
        p.clone().into_product(ProductId::new("0"), now).map(drop)
    });
    errors += validate_entries("blog post", &seed.blog_posts, |p| {
        p.clone().into_post(BlogPostId::new("0"), now).map(drop)
    });
    if errors > 0 {
        return Err(DataError::Invalid(errors));
    }

    let products = load(
        &store.products,
        seed.products,
        replace,
        |p, id| p.into_product(ProductId::new(id), now),
        now,
    )
    .await?;
    let posts = load(
        &store.blog_posts,
        seed.blog_posts,
        replace,
        |p, id| p.into_post(BlogPostId::new(id), now),
        now,
    )
    .await?;

    tracing::info!(products, blog_posts = posts, replace, "Seeding complete");
    Ok(())
}

fn validate_entries<P>(
    kind: &str,
    payloads: &[P],
    check: impl Fn(&P) -> Result<(), ValidationError>,
) -> usize {
    payloads
        .iter()
        .enumerate()
        .filter_map(|(index, payload)| check(payload).err().map(|e| (index, e)))
        .inspect(|(index, e)| tracing::error!("  - {kind} #{}: {e}", index + 1))
        .count()
}

/// Append (or replace with) the validated records and return how many were written.
///
/// A collection with no entries in the seed file is left alone, even when replacing.
async fn load<T, P>(
    collection: &JsonCollection<T>,
    payloads: Vec<P>,
    replace: bool,
    build: impl Fn(P, String) -> Result<T, ValidationError>,
    now: DateTime<Utc>,
) -> Result<usize, DataError>
where
    T: Record,
{
    if payloads.is_empty() {
        return Ok(0);
    }

    let fill = |records: &mut Vec<T>| -> Result<usize, DataError> {
        let count = payloads.len();
        for payload in payloads {
            let id = unique_timestamp_id(records, now.timestamp_millis());
            let record = build(payload, id).map_err(|_| DataError::Invalid(1))?;
            records.push(record);
        }
        Ok(count)
    };

    if replace {
        let mut records = Vec::new();
        let count = fill(&mut records)?;
        collection.write(&records).await?;
        return Ok(count);
    }

    let count = collection
        .mutate(|records| fill(records).map(Some))
        .await?
        .unwrap_or_default();
    Ok(count)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_store() -> (Store, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("bw-cli-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        (Store::new(&dir), dir)
    }

    const SEED: &str = r"
products:
  - name: Weekender Duffel
    price: 45000
    category: travel
  - name: Card Sleeve
    price: '7500.50'
blog_posts:
  - title: Caring for Leather
    content: Condition twice a year.
";

    #[test]
    fn test_seed_file_parses() {
        let seed: SeedFile = serde_yaml::from_str(SEED).unwrap();
        assert_eq!(seed.products.len(), 2);
        assert_eq!(seed.blog_posts.len(), 1);
        assert_eq!(seed.products[1].price.unwrap().to_string(), "7500.50");
    }

    #[tokio::test]
    async fn test_seed_appends_with_unique_ids() {
        let (store, dir) = temp_store();
        let seed: SeedFile = serde_yaml::from_str(SEED).unwrap();

        seed_store(&store, seed, false, Utc::now()).await.unwrap();

        let products = store.products.read().await;
        assert_eq!(products.len(), 2);
        assert_ne!(products[0].id, products[1].id);
        let posts = store.blog_posts.read().await;
        assert_eq!(posts[0].slug.as_deref(), Some("caring-for-leather"));

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_invalid_entry_writes_nothing() {
        let (store, dir) = temp_store();
        let seed: SeedFile = serde_yaml::from_str(
            "products:\n  - name: Tote\n    price: 100\n  - name: ''\n    price: 5\n",
        )
        .unwrap();

        let err = seed_store(&store, seed, false, Utc::now()).await.unwrap_err();
        assert!(matches!(err, DataError::Invalid(1)));
        assert!(store.products.read().await.is_empty());
        assert!(!store.products.path().exists());

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_replace_overwrites_existing() {
        let (store, dir) = temp_store();
        let first: SeedFile = serde_yaml::from_str(SEED).unwrap();
        seed_store(&store, first, false, Utc::now()).await.unwrap();

        let second: SeedFile =
            serde_yaml::from_str("products:\n  - name: Belt Bag\n    price: 12000\n").unwrap();
        seed_store(&store, second, true, Utc::now()).await.unwrap();

        let products = store.products.read().await;
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Belt Bag");
        assert_eq!(store.blog_posts.read().await.len(), 1);

        std::fs::remove_dir_all(dir).ok();
    }
}
