use std::sync::{Arc, Mutex, MutexGuard, mpsc};
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};

/// Entries held by the stub. Tags are served in the nested `attributes`
/// shape, itineraries in the flat shape.
#[derive(Debug, Default)]
pub struct StubState {
    pub tags: Vec<Value>,
    pub itineraries: Vec<Value>,
    pub requests: Vec<String>,
    pub rejected_titles: Vec<String>,
    pub html_only: bool,
    next_id: u64,
}

#[allow(dead_code)]
impl StubState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn add_tag(&mut self, name: &str, slug: &str) -> u64 {
        let id = self.next_id();
        self.tags.push(json!({
            "id": id,
            "attributes": { "name": name, "slug": slug, "order": null }
        }));
        id
    }

    pub fn add_itinerary(&mut self, data: Value) -> String {
        let id = self.next_id();
        let document_id = format!("doc-{id}");
        let mut entry = data;
        if let Some(object) = entry.as_object_mut() {
            object.insert("id".to_owned(), json!(id));
            object.insert("documentId".to_owned(), json!(document_id));
        }
        self.itineraries.push(entry);
        document_id
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.tags
            .iter()
            .filter_map(|tag| tag.pointer("/attributes/name").and_then(Value::as_str))
            .map(str::to_owned)
            .collect()
    }

    pub fn itinerary_titles(&self) -> Vec<String> {
        self.itineraries
            .iter()
            .filter_map(|entry| entry.get("title").and_then(Value::as_str))
            .map(str::to_owned)
            .collect()
    }

    pub fn requests_matching(&self, prefix: &str) -> usize {
        self.requests
            .iter()
            .filter(|request| request.starts_with(prefix))
            .count()
    }
}

pub struct StoreStub {
    pub base_url: String,
    state: Arc<Mutex<StubState>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

#[allow(dead_code)]
impl StoreStub {
    pub fn spawn() -> Self {
        Self::spawn_with(StubState::default())
    }

    pub fn spawn_with(initial: StubState) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start store stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let state = Arc::new(Mutex::new(initial));
        let thread_state = Arc::clone(&state);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let mut body = String::new();
                if request.as_reader().read_to_string(&mut body).is_err() {
                    let _ = request.respond(
                        tiny_http::Response::from_string("invalid request body")
                            .with_status_code(400),
                    );
                    continue;
                }

                let url = url::Url::parse(&format!("http://stub{}", request.url()))
                    .expect("parse request url");
                let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
                let method = request.method().as_str().to_owned();

                let (status, response, content_type) = {
                    let mut state = thread_state.lock().expect("stub state lock");
                    state.requests.push(format!("{method} {}", url.path()));
                    if state.html_only {
                        (200, "<html>ok</html>".to_owned(), "text/html")
                    } else {
                        let (status, response) =
                            route(&mut state, &method, url.path(), &query, &body);
                        (status, response.to_string(), "application/json")
                    }
                };

                let mut reply =
                    tiny_http::Response::from_string(response).with_status_code(status);
                let header =
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes())
                        .expect("build header");
                reply = reply.with_header(header);
                let _ = request.respond(reply);
            }
        });

        Self {
            base_url,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().expect("stub state lock")
    }
}

impl Drop for StoreStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn query_value<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn error(status: u16, message: &str) -> (u16, Value) {
    (
        status,
        json!({ "data": null, "error": { "status": status, "message": message } }),
    )
}

fn collection(entries: Vec<Value>) -> Value {
    let total = entries.len();
    json!({ "data": entries, "meta": { "pagination": { "total": total } } })
}

fn route(
    state: &mut StubState,
    method: &str,
    path: &str,
    query: &[(String, String)],
    body: &str,
) -> (u16, Value) {
    let data = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("data").cloned());

    match (method, path) {
        ("GET", "/_health") => (200, json!({})),
        ("GET", "/api/global") => (200, json!({ "data": { "id": 1, "siteName": "Trips" } })),
        ("GET", "/api/home-page") => (200, json!({ "data": { "id": 1, "heading": "Go" } })),

        ("GET", "/api/tags") => {
            let by_name = query_value(query, "filters[name][$eq]");
            let by_slug = query_value(query, "filters[slug][$eq]");
            let matches = state
                .tags
                .iter()
                .filter(|tag| {
                    let attr = |field: &str| {
                        tag.pointer(&format!("/attributes/{field}"))
                            .and_then(Value::as_str)
                            .map(str::to_owned)
                    };
                    by_name.is_none_or(|name| attr("name").as_deref() == Some(name))
                        && by_slug.is_none_or(|slug| attr("slug").as_deref() == Some(slug))
                })
                .cloned()
                .collect();
            (200, collection(matches))
        }
        ("POST", "/api/tags") => {
            let Some(data) = data else {
                return error(400, "missing data");
            };
            let name = data.get("name").and_then(Value::as_str).unwrap_or_default();
            let slug = data.get("slug").and_then(Value::as_str).unwrap_or_default();
            state.add_tag(name, slug);
            let created = state.tags.last().cloned().unwrap_or(Value::Null);
            (200, json!({ "data": created }))
        }
        ("PUT", tag_path) if tag_path.starts_with("/api/tags/") => {
            let id: Option<u64> = tag_path.trim_start_matches("/api/tags/").parse().ok();
            let order = data.as_ref().and_then(|d| d.get("order")).cloned();
            let Some(tag) = state
                .tags
                .iter_mut()
                .find(|tag| tag.get("id").and_then(Value::as_u64) == id)
            else {
                return error(404, "Not Found");
            };
            if let (Some(order), Some(attributes)) = (order, tag.get_mut("attributes")) {
                attributes["order"] = order;
            }
            (200, json!({ "data": tag.clone() }))
        }

        ("GET", "/api/itineraries") => {
            let by_title = query_value(query, "filters[title][$eq]");
            let matches = state
                .itineraries
                .iter()
                .filter(|entry| {
                    by_title.is_none_or(|title| {
                        entry.get("title").and_then(Value::as_str) == Some(title)
                    })
                })
                .cloned()
                .collect();
            (200, collection(matches))
        }
        ("POST", "/api/itineraries") => {
            let Some(data) = data else {
                return error(400, "missing data");
            };
            let title = data.get("title").and_then(Value::as_str).unwrap_or_default();
            if state.rejected_titles.iter().any(|t| t == title) {
                return error(400, "title rejected by validation");
            }
            state.add_itinerary(data);
            let created = state.itineraries.last().cloned().unwrap_or(Value::Null);
            (200, json!({ "data": created }))
        }
        ("DELETE", entry_path) if entry_path.starts_with("/api/itineraries/") => {
            let document_id = entry_path.trim_start_matches("/api/itineraries/");
            let before = state.itineraries.len();
            state
                .itineraries
                .retain(|entry| entry.get("documentId").and_then(Value::as_str) != Some(document_id));
            if state.itineraries.len() == before {
                return error(404, "Not Found");
            }
            (200, json!({ "data": null }))
        }

        _ => error(404, "Not Found"),
    }
}
