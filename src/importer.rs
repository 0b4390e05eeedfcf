use std::io::Write as _;
use std::path::PathBuf;

use anyhow::Context as _;

use crate::cli::{DuplicatePolicy, ImportArgs};
use crate::columns::ColumnLayout;
use crate::config::StoreConfig;
use crate::days::assemble_days;
use crate::fields;
use crate::formats::{DayEntry, EntryId, ItineraryRecord, PublishStatus};
use crate::store::{ContentStore, StoreError, StrapiClient};
use crate::summary::ImportResult;
use crate::table::{Row, Table};
use crate::tags::TagResolver;

pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, thiserror::Error)]
pub enum RowError {
    #[error("Missing required fields: title and country are mandatory")]
    MissingRequiredFields,

    #[error("malformed CSV record: {0}")]
    Malformed(String),

    #[error("remove existing itinerary {id}: {error}")]
    Replace { id: String, error: StoreError },

    #[error("create itinerary: {0}")]
    Create(StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Created,
    Replaced,
    Skipped,
}

pub async fn run(args: ImportArgs) -> anyhow::Result<()> {
    let path = PathBuf::from(&args.file);
    tracing::info!(file = %path.display(), "reading CSV file");
    let table = crate::table::read_table(&path).await?;
    tracing::info!(records = table.len(), "parsed CSV");

    if args.test {
        tracing::info!("test mode: nothing will be written to the content store");
        let mut out = std::io::stdout().lock();
        crate::preview::write_preview(&table, args.max_test_rows, &mut out)
            .context("write preview")?;
        out.flush().context("flush stdout")?;
        return Ok(());
    }

    let config = StoreConfig::from_env(args.base_url.as_deref())?;
    if config.api_token.is_none() {
        tracing::warn!("STRAPI_API_TOKEN is not set; sending unauthenticated requests");
    }
    let client = StrapiClient::new(&config)?;

    let result = import_table(&client, &table, args.on_duplicate).await?;

    let mut out = std::io::stdout().lock();
    result
        .write_summary("IMPORT SUMMARY", &mut out)
        .context("write import summary")?;
    out.flush().context("flush stdout")?;
    Ok(())
}

pub async fn import_table<S: ContentStore + ?Sized>(
    store: &S,
    table: &Table,
    on_duplicate: DuplicatePolicy,
) -> anyhow::Result<ImportResult> {
    store.ping().await.context("check content store connection")?;
    tracing::info!("content store is reachable");

    let mut importer = Importer::new(store, on_duplicate);
    importer.warm_tag_cache().await;
    importer.import_all(table).await;
    Ok(importer.finish())
}

pub struct Importer<'a, S: ContentStore + ?Sized> {
    store: &'a S,
    tags: TagResolver<'a, S>,
    on_duplicate: DuplicatePolicy,
    result: ImportResult,
}

impl<'a, S: ContentStore + ?Sized> Importer<'a, S> {
    pub fn new(store: &'a S, on_duplicate: DuplicatePolicy) -> Self {
        Self {
            store,
            tags: TagResolver::new(store),
            on_duplicate,
            result: ImportResult::default(),
        }
    }

    pub async fn warm_tag_cache(&mut self) {
        match self.tags.warm().await {
            Ok(count) => tracing::info!(count, "loaded tag cache"),
            Err(err) => {
                let error = format!("{err:#}");
                tracing::warn!(%error, "could not load tag cache; tags will be created on demand");
            }
        }
    }

    pub async fn import_all(&mut self, table: &Table) {
        let layout = ColumnLayout::from_headers(table.headers.iter().map(String::as_str));
        layout.log_unrecognized();

        let total = table.len();
        for (position, row) in table.rows.iter().enumerate() {
            let row = match row {
                Ok(row) => row,
                Err(malformed) => {
                    let err = RowError::Malformed(malformed.message.clone());
                    tracing::error!(row = malformed.number, error = %err, "skipping malformed record");
                    self.result
                        .record_failure(malformed.number, None, err.to_string());
                    continue;
                }
            };

            let title = row.get("title").unwrap_or_default().trim();
            tracing::info!(
                row = row.number,
                position = position + 1,
                total,
                title,
                "processing record"
            );

            match self.import_row(row, &layout).await {
                Ok(RowOutcome::Skipped) => self.result.record_skipped(),
                Ok(outcome) => {
                    tracing::info!(row = row.number, title, ?outcome, "imported");
                    self.result.record_success();
                }
                Err(err) => {
                    tracing::error!(row = row.number, title, error = %err, "failed to import record");
                    self.result
                        .record_failure(row.number, Some(title), err.to_string());
                }
            }
        }
    }

    pub async fn import_row(
        &mut self,
        row: &Row,
        layout: &ColumnLayout,
    ) -> Result<RowOutcome, RowError> {
        let (title, country) = required_fields(row)?;

        let mut replaced = false;
        match self.store.find_itinerary_by_title(&title).await {
            Ok(None) => {}
            Ok(Some(existing)) => match self.on_duplicate {
                DuplicatePolicy::Skip => {
                    tracing::warn!(title = %title, "itinerary already exists; skipping");
                    return Ok(RowOutcome::Skipped);
                }
                DuplicatePolicy::Replace => match existing.path_id() {
                    Some(id) => {
                        tracing::info!(title = %title, id = %id, "replacing existing itinerary");
                        self.store
                            .delete_itinerary(&id)
                            .await
                            .map_err(|error| RowError::Replace {
                                id: id.clone(),
                                error,
                            })?;
                        replaced = true;
                    }
                    None => {
                        tracing::warn!(title = %title, "existing itinerary has no id; creating alongside it");
                    }
                },
            },
            Err(err) => {
                tracing::warn!(title = %title, error = %err, "could not check for duplicates; creating anyway");
            }
        }

        let days = assemble_days(&layout.group(row));
        log_day_preview(&title, &days);

        let tags = self.tags.resolve(row.get("tags")).await;
        let record = compose_record(row, title, country, tags, days);

        self.store
            .create_itinerary(&record)
            .await
            .map_err(RowError::Create)?;

        Ok(if replaced {
            RowOutcome::Replaced
        } else {
            RowOutcome::Created
        })
    }

    pub fn finish(self) -> ImportResult {
        self.result
    }
}

pub fn required_fields(row: &Row) -> Result<(String, String), RowError> {
    match (
        fields::text(row.get("title")),
        fields::text(row.get("country")),
    ) {
        (Some(title), Some(country)) => Ok((title, country)),
        _ => Err(RowError::MissingRequiredFields),
    }
}

pub fn compose_record(
    row: &Row,
    title: String,
    country: String,
    tags: Vec<EntryId>,
    days: Vec<DayEntry>,
) -> ItineraryRecord {
    ItineraryRecord {
        title,
        country,
        region: fields::text(row.get("region")),
        city: fields::text(row.get("city")),
        tags,
        price: fields::decimal(row.get("price")),
        currency: fields::text(row.get("currency")).unwrap_or_else(|| DEFAULT_CURRENCY.to_owned()),
        is_free: fields::boolean(row.get("isFree")),
        highlights: fields::text(row.get("highlights")),
        publish_status: fields::enumerated(row.get("publishStatus")).unwrap_or(PublishStatus::Draft),
        days,
    }
}

fn log_day_preview(title: &str, days: &[DayEntry]) {
    tracing::info!(title, days = days.len(), "assembled day entries");
    for day in days.iter().take(3) {
        tracing::debug!(
            day = day.day_number,
            subtitle = %day.subtitle,
            has_recommendation = day.recommendation.is_some(),
            "day entry"
        );
    }
}
