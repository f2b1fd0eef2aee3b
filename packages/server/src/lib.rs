#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the NYPD arrests aggregations.
//!
//! Loads one dataset snapshot at startup and serves chart-ready JSON for
//! the dashboard: the all-years reference tables, per-year map points and
//! raw-record samples, demographic histograms, offense rankings, and k-means centroids. Year
//! slices are memoized in a shared [`YearFilterCache`] so every chart for
//! the same year filters the snapshot once.

mod handlers;
pub mod interactive;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, error::InternalError, middleware, web};
use nypd_arrests_analytics::{YearFilterCache, YearSlice, filter_year};
use nypd_arrests_dataset::progress::{ProgressCallback, null_progress};
use nypd_arrests_dataset::{Dataset, DatasetError, LoadOptions, load_csv, paths};
use nypd_arrests_reference::ReferenceTables;
use nypd_arrests_server_models::ApiError;

/// Default bind address when `BIND_ADDR` is unset.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
/// Default port when `PORT` is unset or invalid.
pub const DEFAULT_PORT: u16 = 8080;

/// Errors that can occur while starting the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The dataset could not be loaded.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// The HTTP server failed to bind or crashed.
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared application state.
pub struct AppState {
    /// The loaded snapshot.
    pub dataset: Dataset,
    /// Memoized year slices of `dataset`.
    pub year_cache: Mutex<YearFilterCache>,
    /// Embedded all-years reference tables.
    pub reference: &'static ReferenceTables,
}

impl AppState {
    /// Wraps a loaded snapshot with an empty year cache.
    #[must_use]
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            year_cache: Mutex::new(YearFilterCache::new()),
            reference: nypd_arrests_reference::tables(),
        }
    }

    /// Returns the rows of `year`, filtering the snapshot on first use.
    ///
    /// The cache lock is released while filtering, so a slow miss never
    /// blocks requests for other years. Concurrent misses on the same year
    /// may both filter; the first slice inserted wins.
    pub fn year_slice(&self, year: i32) -> Arc<YearSlice> {
        let cached = self.cache().get(self.dataset.id(), year);
        if let Some(slice) = cached {
            return slice;
        }

        let slice = filter_year(&self.dataset, year);
        self.cache().insert(slice)
    }

    fn cache(&self) -> MutexGuard<'_, YearFilterCache> {
        // A panic while the lock was held cannot leave the cache half-written.
        self.year_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Bind address and port for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
}

impl ServerConfig {
    /// Reads `BIND_ADDR` and `PORT`, falling back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self { bind_addr, port }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Registers the `/api` routes and the JSON query-error handler.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(ApiError {
            error: err.to_string(),
        });
        InternalError::from_response(err, response).into()
    }))
    .service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/summary", web::get().to(handlers::summary))
            .route(
                "/reference/totals",
                web::get().to(handlers::reference_totals),
            )
            .route(
                "/reference/offenses",
                web::get().to(handlers::reference_offenses),
            )
            .route("/points", web::get().to(handlers::points))
            .route("/records", web::get().to(handlers::records))
            .route("/histogram", web::get().to(handlers::histogram))
            .route("/offenses", web::get().to(handlers::offenses))
            .route("/clusters", web::get().to(handlers::clusters)),
    );
}

/// Loads the dataset configured by `NYPD_ARRESTS_CSV` and
/// `NYPD_ARRESTS_SAMPLE`.
///
/// # Errors
///
/// Returns [`DatasetError`] if the sample setting is invalid or the CSV
/// cannot be loaded.
pub fn load_dataset_from_env(
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Dataset, DatasetError> {
    let options = LoadOptions {
        sample_fraction: paths::sample_fraction()?,
        ..LoadOptions::default()
    };
    let (dataset, report) = load_csv(&paths::csv_path(), &options, progress)?;

    log::debug!("Load report: {report:?}");
    if dataset.is_empty() {
        log::warn!("Loaded dataset is empty; every aggregation will report empty input");
    }

    Ok(dataset)
}

/// Starts the API server using environment configuration.
///
/// Loads the dataset from `NYPD_ARRESTS_CSV`, then binds to `BIND_ADDR`
/// and `PORT`. This is a regular async function; the caller provides the
/// runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if the dataset fails to load or the HTTP server
/// fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> Result<(), ServerError> {
    let dataset = load_dataset_from_env(&null_progress())?;
    serve(dataset, ServerConfig::from_env()).await
}

/// Serves an already loaded snapshot.
///
/// # Errors
///
/// Returns [`ServerError::Io`] if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn serve(dataset: Dataset, config: ServerConfig) -> Result<(), ServerError> {
    log::info!("Serving {} arrests from {}", dataset.len(), dataset.id());
    let state = web::Data::new(AppState::new(dataset));

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await?;

    Ok(())
}
