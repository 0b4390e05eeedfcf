use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::Context as _;
use tokio::fs;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub number: usize,
    values: BTreeMap<String, String>,
}

impl Row {
    pub fn new(number: usize, values: BTreeMap<String, String>) -> Self {
        Self { number, values }
    }

    pub fn from_pairs<'a>(number: usize, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Self { number, values }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn is_blank(&self) -> bool {
        self.values.values().all(|v| v.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRow {
    pub number: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Result<Row, MalformedRow>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub async fn read_table(path: &Path) -> anyhow::Result<Table> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            anyhow::bail!("CSV file not found: {}", path.display());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("read CSV file: {}", path.display()));
        }
    };
    parse_table(bytes.as_slice()).with_context(|| format!("parse CSV file: {}", path.display()))
}

pub fn parse_table<R: Read>(reader: R) -> anyhow::Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .context("read CSV header row")?
        .iter()
        .enumerate()
        .map(|(idx, h)| {
            let h = if idx == 0 { h.trim_start_matches('\u{feff}') } else { h };
            h.trim().to_owned()
        })
        .collect();

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let number = idx + 1;
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                rows.push(Err(MalformedRow {
                    number,
                    message: err.to_string(),
                }));
                continue;
            }
        };

        let values = headers
            .iter()
            .zip(record.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, value)| (header.clone(), value.to_owned()))
            .collect();
        let row = Row::new(number, values);
        if row.is_blank() {
            tracing::debug!(row = number, "skipping blank CSV row");
            continue;
        }
        rows.push(Ok(row));
    }

    Ok(Table { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_keyed_by_trimmed_headers() -> anyhow::Result<()> {
        let input = "\u{feff}title , country,subtitle_1a\nKyoto Walk,Japan,Temples\n";
        let table = parse_table(input.as_bytes())?;

        assert_eq!(table.headers, vec!["title", "country", "subtitle_1a"]);
        assert_eq!(table.len(), 1);
        let row = table.rows[0].as_ref().map_err(|e| anyhow::anyhow!("{e:?}"))?;
        assert_eq!(row.number, 1);
        assert_eq!(row.get("title"), Some("Kyoto Walk"));
        assert_eq!(row.get("subtitle_1a"), Some("Temples"));
        Ok(())
    }

    #[test]
    fn blank_rows_are_skipped_but_numbering_is_kept() -> anyhow::Result<()> {
        let input = "title,country\n,\nLisbon,Portugal\n";
        let table = parse_table(input.as_bytes())?;

        assert_eq!(table.len(), 1);
        let row = table.rows[0].as_ref().map_err(|e| anyhow::anyhow!("{e:?}"))?;
        assert_eq!(row.number, 2);
        Ok(())
    }

    #[test]
    fn short_rows_only_carry_present_cells() -> anyhow::Result<()> {
        let input = "title,country,city\nPorto,Portugal\n";
        let table = parse_table(input.as_bytes())?;

        let row = table.rows[0].as_ref().map_err(|e| anyhow::anyhow!("{e:?}"))?;
        assert_eq!(row.get("country"), Some("Portugal"));
        assert_eq!(row.get("city"), None);
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let err = read_table(Path::new("/definitely/not/here.csv"))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("CSV file not found"));
    }

    #[tokio::test]
    async fn reads_file_from_disk() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("trips.csv");
        std::fs::write(&path, "title,country
Kyoto Walk,Japan
,
Porto,Portugal
")?;

        let table = read_table(&path).await?;

        assert_eq!(table.len(), 2);
        let porto = table.rows[1].as_ref().map_err(|e| anyhow::anyhow!("{e:?}"))?;
        assert_eq!(porto.number, 3);
        assert_eq!(porto.get("title"), Some("Porto"));
        Ok(())
    }
}
