use std::cell::Cell;
use std::rc::Rc;

use apbia_client::api::{HttpRequest, HttpResponse, Method};
use apbia_client::{ApiClient, ClientConfig, ClientError, KeyValueStore, MemoryStore, SessionStore, StoreError, Transport};
use gloo_net::http::{Method as HttpMethod, RequestBuilder};
use gloo_timers::callback::Timeout;
use web_sys::{AbortController, Storage};

pub type WebClient = ApiClient<GlooTransport, BrowserStore>;
pub type WebSession = SessionStore<BrowserStore>;

/// Backend settings, baked in at build time.
pub fn config() -> ClientConfig {
    ClientConfig::from_overrides(option_env!("APBIA_API_URL"), option_env!("APBIA_REQUEST_TIMEOUT_SECS"))
}

pub fn session() -> WebSession {
    SessionStore::new(BrowserStore::open())
}

/// A fresh API client over `localStorage` and `fetch`.
pub fn client() -> WebClient {
    ApiClient::new(GlooTransport, session(), config())
}

// ── Storage ──────────────────────────────────────────────────────────────────

/// `localStorage`, or process memory when the browser refuses it (private mode, disabled storage).
#[derive(Clone, Debug)]
pub enum BrowserStore {
    Local(Storage),
    Memory(MemoryStore),
}

impl BrowserStore {
    pub fn open() -> Self {
        match web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
            Some(storage) => BrowserStore::Local(storage),
            None => {
                log::warn!("localStorage unavailable, session will not survive a reload");
                BrowserStore::Memory(MemoryStore::new())
            }
        }
    }
}

impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Option<String> {
        match self {
            BrowserStore::Local(storage) => storage.get_item(key).ok().flatten(),
            BrowserStore::Memory(memory) => memory.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        match self {
            BrowserStore::Local(storage) => storage.set_item(key, value).map_err(|e| StoreError::WriteFailed {
                key: key.to_string(),
                message: format!("{e:?}"),
            }),
            BrowserStore::Memory(memory) => memory.set(key, value),
        }
    }

    fn remove(&self, key: &str) {
        match self {
            BrowserStore::Local(storage) => {
                let _ = storage.remove_item(key);
            }
            BrowserStore::Memory(memory) => memory.remove(key),
        }
    }
}

// ── HTTP ─────────────────────────────────────────────────────────────────────

/// `fetch` through gloo-net, aborted once the request timeout elapses.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlooTransport;

impl Transport for GlooTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let controller = AbortController::new().map_err(|e| ClientError::Transport(format!("{e:?}")))?;

        let mut builder = RequestBuilder::new(&request.url)
            .method(match request.method {
                Method::Get => HttpMethod::GET,
                Method::Post => HttpMethod::POST,
                Method::Put => HttpMethod::PUT,
                Method::Delete => HttpMethod::DELETE,
            })
            .abort_signal(Some(&controller.signal()));
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let built = match request.body {
            Some(body) => builder.body(body),
            None => builder.build(),
        }
        .map_err(|e| ClientError::Encode(e.to_string()))?;

        let timed_out = Rc::new(Cell::new(false));
        let flag = timed_out.clone();
        let millis = u32::try_from(request.timeout.as_millis()).unwrap_or(u32::MAX);
        let timer = Timeout::new(millis, move || {
            flag.set(true);
            controller.abort();
        });

        let outcome = match built.send().await {
            Ok(resp) => {
                let status = resp.status();
                resp.text().await.map(|body| HttpResponse { status, body })
            }
            Err(e) => Err(e),
        };
        drop(timer);

        outcome.map_err(|e| {
            if timed_out.get() {
                ClientError::Timeout { seconds: request.timeout.as_secs() }
            } else {
                ClientError::Transport(e.to_string())
            }
        })
    }
}
