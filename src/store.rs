use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::config::StoreConfig;
use crate::formats::{EntryId, Envelope, ItineraryRecord, ItineraryRef, NewTag, Tag};

const TAG_PAGE_SIZE: &str = "100";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot connect to content store at {url}")]
    Connect {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{method} {url} failed ({status}): {message}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
        message: String,
    },

    #[error("{method} {url}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("invalid endpoint {url}: {message}")]
    Endpoint { url: String, message: String },

    #[error("encode request body")]
    Encode(#[from] serde_json::Error),
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Succeeds when the store answers at all, whatever the status or body.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn list_tags(&self) -> Result<Vec<Tag>, StoreError>;
    async fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>, StoreError>;
    async fn find_tag_by_slug(&self, slug: &str) -> Result<Option<Tag>, StoreError>;
    async fn create_tag(&self, tag: &NewTag) -> Result<Tag, StoreError>;
    async fn update_tag_order(&self, id: EntryId, order: i64) -> Result<(), StoreError>;

    async fn find_itinerary_by_title(&self, title: &str)
    -> Result<Option<ItineraryRef>, StoreError>;
    async fn create_itinerary(&self, record: &ItineraryRecord) -> Result<ItineraryRef, StoreError>;
    async fn delete_itinerary(&self, path_id: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct StrapiClient {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl StrapiClient {
    pub fn new(config: &StoreConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base_url: config.base_url.as_str().trim_end_matches('/').to_owned(),
            api_token: config.api_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&raw).map_err(|err| StoreError::Endpoint {
            url: raw,
            message: err.to_string(),
        })
    }

    fn query_endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, StoreError> {
        let mut url = self.endpoint(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, body: Option<Value>) -> Result<Value, StoreError> {
        tracing::debug!(%method, %url, "content store request");

        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|source| {
            if source.is_connect() {
                StoreError::Connect {
                    url: self.base_url.clone(),
                    source: Box::new(source),
                }
            } else {
                StoreError::Transport {
                    method: method.clone(),
                    url: url.to_string(),
                    source,
                }
            }
        })?;

        let status = response.status();
        let raw = response.text().await.map_err(|source| StoreError::Transport {
            method: method.clone(),
            url: url.to_string(),
            source,
        })?;

        if !status.is_success() {
            if !raw.is_empty() {
                tracing::debug!(%method, %url, %status, body = %raw, "content store error body");
            }
            let message = parse_error_message(&raw).unwrap_or_else(|| raw.trim().to_owned());
            return Err(StoreError::Status {
                method,
                url: url.to_string(),
                status,
                message,
            });
        }

        if raw.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&raw).map_err(|err| StoreError::Decode {
            url: url.to_string(),
            message: err.to_string(),
        })
    }

    pub async fn get_json(&self, path: &str) -> Result<Value, StoreError> {
        let url = self.endpoint(path)?;
        self.send(Method::GET, url, None).await
    }

    pub async fn create_entry(&self, collection: &str, data: Value) -> Result<Value, StoreError> {
        let url = self.endpoint(&format!("api/{collection}"))?;
        let body = serde_json::to_value(Envelope { data })?;
        self.send(Method::POST, url, Some(body)).await
    }

    pub async fn health(&self) -> Result<(), StoreError> {
        let url = self.endpoint("_health")?;
        self.send(Method::GET, url, None).await.map(|_| ())
    }

    async fn find_tag(&self, field: &str, value: &str) -> Result<Option<Tag>, StoreError> {
        let key = format!("filters[{field}][$eq]");
        let url = self.query_endpoint("api/tags", &[(key.as_str(), value)])?;
        let response = self.send(Method::GET, url.clone(), None).await?;
        data_entries(&response)
            .into_iter()
            .next()
            .map(|entry| decode(&url, entry))
            .transpose()
    }
}

#[async_trait]
impl ContentStore for StrapiClient {
    async fn ping(&self) -> Result<(), StoreError> {
        let url = self.query_endpoint("api/itineraries", &[("pagination[limit]", "1")])?;
        match self.send(Method::GET, url, None).await {
            Ok(_) => Ok(()),
            Err(err @ (StoreError::Connect { .. } | StoreError::Transport { .. })) => Err(err),
            Err(err) => {
                tracing::debug!(error = %err, "content store answered; treating as reachable");
                Ok(())
            }
        }
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, StoreError> {
        let url = self.query_endpoint("api/tags", &[("pagination[pageSize]", TAG_PAGE_SIZE)])?;
        let response = self.send(Method::GET, url.clone(), None).await?;
        data_entries(&response)
            .into_iter()
            .map(|entry| decode(&url, entry))
            .collect()
    }

    async fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>, StoreError> {
        self.find_tag("name", name).await
    }

    async fn find_tag_by_slug(&self, slug: &str) -> Result<Option<Tag>, StoreError> {
        self.find_tag("slug", slug).await
    }

    async fn create_tag(&self, tag: &NewTag) -> Result<Tag, StoreError> {
        let url = self.endpoint("api/tags")?;
        let body = serde_json::to_value(Envelope { data: tag })?;
        let response = self.send(Method::POST, url.clone(), Some(body)).await?;
        let entry = data_entry(&response).ok_or_else(|| StoreError::Decode {
            url: url.to_string(),
            message: "missing `data` in create response".to_owned(),
        })?;
        decode(&url, entry)
    }

    async fn update_tag_order(&self, id: EntryId, order: i64) -> Result<(), StoreError> {
        let url = self.endpoint(&format!("api/tags/{id}"))?;
        let body = serde_json::json!({ "data": { "order": order } });
        self.send(Method::PUT, url, Some(body)).await.map(|_| ())
    }

    async fn find_itinerary_by_title(
        &self,
        title: &str,
    ) -> Result<Option<ItineraryRef>, StoreError> {
        let url = self.query_endpoint(
            "api/itineraries",
            &[("filters[title][$eq]", title), ("pagination[limit]", "1")],
        )?;
        let response = self.send(Method::GET, url.clone(), None).await?;
        data_entries(&response)
            .into_iter()
            .next()
            .map(|entry| decode(&url, entry))
            .transpose()
    }

    async fn create_itinerary(&self, record: &ItineraryRecord) -> Result<ItineraryRef, StoreError> {
        let url = self.endpoint("api/itineraries")?;
        let body = serde_json::to_value(Envelope { data: record })?;
        let response = self.send(Method::POST, url.clone(), Some(body)).await?;
        match data_entry(&response) {
            Some(entry) => decode(&url, entry),
            None => Ok(ItineraryRef {
                id: None,
                document_id: None,
                title: record.title.clone(),
            }),
        }
    }

    async fn delete_itinerary(&self, path_id: &str) -> Result<(), StoreError> {
        let url = self.endpoint(&format!("api/itineraries/{path_id}"))?;
        self.send(Method::DELETE, url, None).await.map(|_| ())
    }
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: Value = serde_json::from_str(raw_json).ok()?;
    let message = value.get("error")?.get("message")?.as_str()?.to_owned();
    Some(message)
}

pub fn flatten_entry(entry: &Value) -> Value {
    let Some(attributes) = entry.get("attributes").and_then(Value::as_object) else {
        return entry.clone();
    };
    let mut flat = attributes.clone();
    for key in ["id", "documentId"] {
        if let Some(value) = entry.get(key) {
            flat.insert(key.to_owned(), value.clone());
        }
    }
    Value::Object(flat)
}

pub fn data_entries(response: &Value) -> Vec<Value> {
    response
        .get("data")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(flatten_entry).collect())
        .unwrap_or_default()
}

pub fn data_entry(response: &Value) -> Option<Value> {
    response
        .get("data")
        .filter(|data| data.is_object())
        .map(flatten_entry)
}

fn decode<T: DeserializeOwned>(url: &Url, entry: Value) -> Result<T, StoreError> {
    serde_json::from_value(entry).map_err(|err| StoreError::Decode {
        url: url.to_string(),
        message: err.to_string(),
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_nested_and_flat_entries() {
        let nested = serde_json::json!({
            "id": 4,
            "attributes": { "name": "Adventure", "slug": "adventure" }
        });
        let flat = flatten_entry(&nested);
        assert_eq!(flat["id"], 4);
        assert_eq!(flat["name"], "Adventure");

        let v5 = serde_json::json!({ "id": 5, "documentId": "d5", "name": "Food", "slug": "food" });
        assert_eq!(flatten_entry(&v5), v5);
    }

    #[test]
    fn data_helpers_decode_collections_and_single_entries() {
        let response = serde_json::json!({
            "data": [
                { "id": 1, "attributes": { "name": "Beach", "slug": "beach" } },
                { "id": 2, "documentId": "x", "name": "Urban", "slug": "urban", "order": 3 }
            ],
            "meta": {}
        });
        let tags: Vec<Tag> = data_entries(&response)
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(tags[0].name, "Beach");
        assert_eq!(tags[1].order, Some(3));
        assert_eq!(tags[1].document_id.as_deref(), Some("x"));

        assert!(data_entry(&serde_json::json!({ "data": null })).is_none());
        assert!(data_entries(&serde_json::json!({})).is_empty());
    }

    #[test]
    fn error_message_comes_from_error_envelope() {
        let raw = r#"{"data":null,"error":{"status":400,"name":"ValidationError","message":"title must be unique"}}"#;
        assert_eq!(
            parse_error_message(raw).as_deref(),
            Some("title must be unique")
        );
        assert_eq!(parse_error_message("Bad Gateway"), None);
    }

    #[test]
    fn endpoints_keep_base_path_and_encode_filters() -> anyhow::Result<()> {
        let config = StoreConfig::resolve(Some("https://cms.example.com/strapi/"), |_| None)?;
        let client = StrapiClient::new(&config)?;

        let url = client.endpoint("api/tags")?;
        assert_eq!(url.as_str(), "https://cms.example.com/strapi/api/tags");

        let url = client.query_endpoint("api/tags", &[("filters[name][$eq]", "Road Trip")])?;
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![("filters[name][$eq]".to_owned(), "Road Trip".to_owned())]
        );
        Ok(())
    }
}
