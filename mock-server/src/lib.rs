use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

/// Promotion addressed by `/rideem/from/{app}` without a `/for/{promo}` suffix.
pub const DEFAULT_PROMO: &str = "default";

/// Body of a redeem response. Absent fields are omitted from the JSON.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCount {
    pub count: u64,
}

/// A promotion: codes handed out in order, an optional private key, and the
/// delay reported with each redemption.
#[derive(Clone, Debug, Default)]
pub struct Promo {
    pub codes: VecDeque<String>,
    pub key: Option<String>,
    pub delay: u64,
}

impl Promo {
    pub fn new<I, S>(codes: I, delay: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
            key: None,
            delay,
        }
    }

    /// A promotion with `count` random codes.
    pub fn generated(count: usize, delay: u64) -> Self {
        Self::new((0..count).map(|_| Uuid::new_v4().simple().to_string()), delay)
    }

    /// Require `key` on every redemption.
    pub fn private(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

#[derive(Debug, Default)]
pub struct Store {
    promos: HashMap<(String, String), Promo>,
    requests: HashMap<String, u64>,
}

impl Store {
    /// Register `promo` for `app`; `None` registers the default promotion.
    pub fn with_promo(mut self, app: &str, name: Option<&str>, promo: Promo) -> Self {
        let name = name.unwrap_or(DEFAULT_PROMO);
        self.promos.insert((app.to_string(), name.to_string()), promo);
        self
    }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Deserialize)]
pub struct KeyParam {
    pub key: Option<String>,
}

pub fn app() -> Router {
    app_with(Store::default())
}

pub fn app_with(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/rideem/from/{app}", get(redeem_default))
        .route("/rideem/from/{app}/for/{promo}", get(redeem_promo))
        .route("/rideem/request/{app}", post(request))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, Store::default()).await
}

pub async fn run_with(listener: TcpListener, store: Store) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(store)).await
}

async fn redeem_default(
    State(db): State<Db>,
    Path(app): Path<String>,
    Query(params): Query<KeyParam>,
) -> (StatusCode, Json<Redemption>) {
    redeem(&db, app, DEFAULT_PROMO.to_string(), params.key).await
}

async fn redeem_promo(
    State(db): State<Db>,
    Path((app, promo)): Path<(String, String)>,
    Query(params): Query<KeyParam>,
) -> (StatusCode, Json<Redemption>) {
    redeem(&db, app, promo, params.key).await
}

async fn redeem(
    db: &Db,
    app: String,
    promo: String,
    key: Option<String>,
) -> (StatusCode, Json<Redemption>) {
    let mut store = db.write().await;
    let Some(entry) = store.promos.get_mut(&(app.clone(), promo.clone())) else {
        return (StatusCode::NOT_FOUND, Json(Redemption::default()));
    };
    if entry.key.is_some() && entry.key != key {
        return (StatusCode::FORBIDDEN, Json(Redemption::default()));
    }

    let delay = Some(entry.delay);
    match entry.codes.pop_front() {
        Some(code) => {
            info!(%app, %promo, remaining = entry.codes.len(), "code redeemed");
            (StatusCode::OK, Json(Redemption { code: Some(code), delay }))
        }
        None => (StatusCode::NOT_FOUND, Json(Redemption { code: None, delay })),
    }
}

async fn request(State(db): State<Db>, Path(app): Path<String>) -> Json<RequestCount> {
    let mut store = db.write().await;
    let count = store.requests.entry(app).or_insert(0);
    *count += 1;
    Json(RequestCount { count: *count })
}
