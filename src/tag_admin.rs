use std::io::{self, Write};
use std::path::Path;

use anyhow::Context as _;

use crate::cli::{StoreArgs, TagSeedArgs};
use crate::config::StoreConfig;
use crate::formats::{NewTag, Tag};
use crate::store::{ContentStore, StrapiClient};
use crate::tags::slugify;

pub const DEFAULT_TAG_ORDER: &[(&str, i64)] = &[
    ("popular", 1),
    ("adventure", 2),
    ("cultural", 3),
    ("culinary", 4),
    ("art", 5),
    ("historical", 6),
    ("wellness", 7),
    ("family", 8),
    ("budget", 9),
    ("luxury", 10),
    ("eco-tourism", 11),
    ("wildlife", 12),
    ("road-trip", 13),
    ("spiritual", 14),
];

const UNORDERED: i64 = 999;

pub async fn list(args: StoreArgs) -> anyhow::Result<()> {
    let config = StoreConfig::from_env(args.base_url.as_deref())?;
    let client = StrapiClient::new(&config)?;

    let tags = client.list_tags().await.context("fetch tags")?;
    let mut out = io::stdout().lock();
    write_tag_listing(&tags, &mut out).context("write tag listing")?;
    out.flush().context("flush stdout")?;
    Ok(())
}

pub fn write_tag_listing(tags: &[Tag], out: &mut dyn Write) -> io::Result<()> {
    if tags.is_empty() {
        writeln!(out, "No tags found.")?;
        return Ok(());
    }

    let mut sorted: Vec<&Tag> = tags.iter().collect();
    sorted.sort_by_key(|tag| tag.order.unwrap_or(UNORDERED));

    for (position, tag) in sorted.iter().enumerate() {
        let order = tag
            .order
            .map(|order| order.to_string())
            .unwrap_or_else(|| "not set".to_owned());
        writeln!(out, "{}. {} (order: {order})", position + 1, tag.name)?;
        writeln!(out, "   slug: {}", tag.slug)?;
        if let Some(description) = tag.description.as_deref().filter(|d| !d.trim().is_empty()) {
            writeln!(out, "   description: {description}")?;
        }
        if let Some(icon) = &tag.icon
            && !icon.is_null()
        {
            let url = icon
                .get("url")
                .and_then(|url| url.as_str())
                .unwrap_or("uploaded");
            writeln!(out, "   icon: {url}")?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReorderReport {
    pub updated: usize,
    pub failed: usize,
}

pub async fn reorder(args: StoreArgs) -> anyhow::Result<()> {
    let config = StoreConfig::from_env(args.base_url.as_deref())?.require_token()?;
    let client = StrapiClient::new(&config)?;

    let report = apply_tag_order(&client, DEFAULT_TAG_ORDER).await;
    println!("Updated: {} tags", report.updated);
    println!("Failed: {} tags", report.failed);
    Ok(())
}

pub async fn apply_tag_order<S: ContentStore + ?Sized>(
    store: &S,
    order: &[(&str, i64)],
) -> ReorderReport {
    let mut report = ReorderReport::default();
    for &(slug, position) in order {
        let tag = match store.find_tag_by_slug(slug).await {
            Ok(Some(tag)) => tag,
            Ok(None) => {
                tracing::warn!(slug, "tag not found");
                report.failed += 1;
                continue;
            }
            Err(err) => {
                tracing::error!(slug, error = %err, "failed to look up tag");
                report.failed += 1;
                continue;
            }
        };

        match store.update_tag_order(tag.id, position).await {
            Ok(()) => {
                tracing::info!(slug, order = position, "updated tag order");
                report.updated += 1;
            }
            Err(err) => {
                tracing::error!(slug, error = %err, "failed to update tag order");
                report.failed += 1;
            }
        }
    }
    report
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub async fn seed(args: TagSeedArgs) -> anyhow::Result<()> {
    let seeds = read_seed_file(Path::new(&args.file)).await?;
    let config = StoreConfig::from_env(args.store.base_url.as_deref())?;
    let client = StrapiClient::new(&config)?;

    tracing::info!(tags = seeds.len(), "seeding tags");
    let report = seed_tags(&client, &seeds).await;
    println!("Created: {} tags", report.created);
    println!("Skipped: {} tags", report.skipped);
    println!("Failed: {} tags", report.failed);
    Ok(())
}

pub async fn read_seed_file(path: &Path) -> anyhow::Result<Vec<NewTag>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("read seed file: {}", path.display()))?;
    let mut seeds: Vec<NewTag> = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse seed file: {}", path.display()))?;
    for seed in &mut seeds {
        if seed.slug.trim().is_empty() {
            seed.slug = slugify(&seed.name);
        }
    }
    Ok(seeds)
}

pub async fn seed_tags<S: ContentStore + ?Sized>(store: &S, seeds: &[NewTag]) -> SeedReport {
    let existing = match store.list_tags().await {
        Ok(tags) => tags,
        Err(err) => {
            tracing::error!(error = %err, "failed to fetch existing tags; seeding all");
            Vec::new()
        }
    };
    tracing::info!(existing = existing.len(), "fetched existing tags");

    let mut report = SeedReport::default();
    for seed in seeds {
        if existing.iter().any(|tag| tag.name == seed.name) {
            tracing::info!(tag = %seed.name, "skipping existing tag");
            report.skipped += 1;
            continue;
        }
        match store.create_tag(seed).await {
            Ok(_) => {
                tracing::info!(tag = %seed.name, "created tag");
                report.created += 1;
            }
            Err(err) => {
                tracing::error!(tag = %seed.name, error = %err, "failed to create tag");
                report.failed += 1;
            }
        }
    }
    report
}
