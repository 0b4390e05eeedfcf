use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::fs;

use crate::cli::{MigrateExportArgs, MigrateImportArgs};
use crate::config::StoreConfig;
use crate::store::{StrapiClient, data_entries};
use crate::summary::ImportResult;

pub const EXPORT_FILES: &[(&str, &str)] = &[
    ("itineraries.json", "api/itineraries?populate=*"),
    ("global.json", "api/global?populate=*"),
    ("home-page.json", "api/home-page?populate=*"),
];

const MANIFEST_FILE: &str = "manifest.json";
const ITINERARIES_FILE: &str = "itineraries.json";

const SERVER_FIELDS: &[&str] = &["id", "documentId", "createdAt", "updatedAt", "publishedAt"];
const RELATION_WRAPPER_KEYS: &[&str] = &["data", "meta"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportManifest {
    pub exported_at: DateTime<Utc>,
    pub source: String,
    pub files: Vec<String>,
}

pub async fn export(args: MigrateExportArgs) -> anyhow::Result<()> {
    let config = StoreConfig::from_env(args.source.as_deref())?;
    let client = StrapiClient::new(&config)?;
    let out_dir = PathBuf::from(&args.out);

    let manifest = export_to_dir(&client, &out_dir).await?;
    println!(
        "Exported {} files from {} to {}",
        manifest.files.len(),
        manifest.source,
        out_dir.display()
    );
    Ok(())
}

pub async fn export_to_dir(client: &StrapiClient, out_dir: &Path) -> anyhow::Result<ExportManifest> {
    fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("create export dir: {}", out_dir.display()))?;

    let mut files = Vec::with_capacity(EXPORT_FILES.len());
    for &(file_name, path) in EXPORT_FILES {
        let value = client
            .get_json(path)
            .await
            .with_context(|| format!("fetch {path}"))?;
        let entries = value
            .get("data")
            .and_then(Value::as_array)
            .map(Vec::len);
        tracing::info!(file = file_name, ?entries, "exported");
        write_json(&out_dir.join(file_name), &value).await?;
        files.push(file_name.to_owned());
    }

    let manifest = ExportManifest {
        exported_at: Utc::now(),
        source: client.base_url().to_owned(),
        files,
    };
    write_json(&out_dir.join(MANIFEST_FILE), &manifest).await?;
    Ok(manifest)
}

pub async fn import(args: MigrateImportArgs) -> anyhow::Result<()> {
    let config = StoreConfig::production_from_env(args.target.as_deref())?;
    let client = StrapiClient::new(&config)?;

    let path = Path::new(&args.dir).join(ITINERARIES_FILE);
    let bytes = fs::read(&path)
        .await
        .with_context(|| format!("read export: {}", path.display()))?;
    let exported: Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse export: {}", path.display()))?;

    let entries = data_entries(&exported);
    tracing::info!(
        entries = entries.len(),
        target = client.base_url(),
        "importing itineraries"
    );

    let result = import_entries(&client, entries).await;

    let mut out = io::stdout().lock();
    result
        .write_summary("MIGRATION SUMMARY", &mut out)
        .context("write migration summary")?;
    out.flush().context("flush stdout")?;
    Ok(())
}

pub async fn import_entries(client: &StrapiClient, entries: Vec<Value>) -> ImportResult {
    let mut result = ImportResult::default();
    for (index, entry) in entries.into_iter().enumerate() {
        let number = index + 1;
        let title = entry
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_owned);

        match client
            .create_entry("itineraries", strip_server_fields(entry))
            .await
        {
            Ok(_) => {
                tracing::info!(entry = number, title = ?title, "migrated itinerary");
                result.record_success();
            }
            Err(err) => {
                let message = err.to_string();
                tracing::error!(entry = number, title = ?title, error = %message, "failed to migrate itinerary");
                result.record_failure(number, title.as_deref(), message);
            }
        }
    }
    result
}

pub fn strip_server_fields(entry: Value) -> Value {
    match entry {
        Value::Object(object) => Value::Object(strip_component(object)),
        other => other,
    }
}

// Components lose their server ids; populated relations collapse to ids.
fn strip_nested(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nested).collect()),
        Value::Object(object) if is_relation_wrapper(&object) => {
            match object.get("data") {
                Some(Value::Array(entries)) => {
                    Value::Array(entries.iter().map(relation_id).collect())
                }
                Some(entry @ Value::Object(_)) => relation_id(entry),
                _ => Value::Null,
            }
        }
        Value::Object(object) if object.contains_key("documentId") => {
            relation_id(&Value::Object(object))
        }
        Value::Object(object) => Value::Object(strip_component(object)),
        other => other,
    }
}

fn strip_component(mut object: Map<String, Value>) -> Map<String, Value> {
    for field in SERVER_FIELDS {
        object.remove(*field);
    }
    object
        .into_iter()
        .map(|(key, value)| (key, strip_nested(value)))
        .collect()
}

// v4 relations arrive as `{ "data": ..., "meta"?: ... }`.
fn is_relation_wrapper(object: &Map<String, Value>) -> bool {
    object.contains_key("data")
        && object
            .keys()
            .all(|key| RELATION_WRAPPER_KEYS.contains(&key.as_str()))
}

fn relation_id(entry: &Value) -> Value {
    entry
        .get("id")
        .or_else(|| entry.get("documentId"))
        .cloned()
        .unwrap_or(Value::Null)
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let data = serde_json::to_vec_pretty(value).context("serialize json")?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, &data)
        .await
        .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("rename tmp to final: {}", path.display()))?;
    Ok(())
}
