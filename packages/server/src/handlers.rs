//! HTTP handler functions for the arrests API.

use actix_web::{HttpResponse, web};
use nypd_arrests_analytics::{
    AnalyticsError, DEFAULT_SAMPLE_ROWS, cluster, histogram_for, offense_ranking, sample,
    top_offenses,
};
use nypd_arrests_analytics_models::{DEFAULT_SEED, KMeansParams};
use nypd_arrests_arrest_models::{ArrestRecord, Dimension};
use nypd_arrests_server_models::{
    ApiError, ApiHealth, ApiPoints, ApiRecords, ApiReferenceTotals, ApiSummary, ApiYearRange,
    ClustersQuery, HistogramQuery, OffensesQuery, PointsQuery, RecordsQuery, TotalsQuery,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/summary`
///
/// All-years reference figures plus the size and year span of the loaded
/// snapshot.
pub async fn summary(state: web::Data<AppState>) -> HttpResponse {
    let dataset = &state.dataset;

    HttpResponse::Ok().json(ApiSummary {
        reference: state.reference.summary.clone(),
        snapshot: dataset.id().to_string(),
        loaded_arrests: dataset.len() as u64,
        observed_years: dataset
            .year_range()
            .map(|(first, last)| ApiYearRange { first, last }),
    })
}

/// `GET /api/reference/totals`
pub async fn reference_totals(
    state: web::Data<AppState>,
    params: web::Query<TotalsQuery>,
) -> HttpResponse {
    match Dimension::from_selector(&params.dimension) {
        Ok(dimension) => HttpResponse::Ok().json(ApiReferenceTotals {
            dimension,
            totals: state
                .reference
                .demographics
                .for_dimension(dimension)
                .to_vec(),
        }),
        Err(e) => error_response(&AnalyticsError::from(e)),
    }
}

/// `GET /api/reference/offenses`
///
/// All-years offense totals, most frequent first.
pub async fn reference_offenses(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.reference.offenses_by_count())
}

/// `GET /api/points`
///
/// Arrest locations of one year. With `limit`, a seeded random sample of
/// that many locations in dataset order.
pub async fn points(state: web::Data<AppState>, params: web::Query<PointsQuery>) -> HttpResponse {
    let slice = state.year_slice(params.year);
    let seed = params.seed.unwrap_or(DEFAULT_SEED);
    let points = match params.limit {
        Some(limit) => sample(slice.rows(), limit, seed)
            .into_iter()
            .map(ArrestRecord::location)
            .collect(),
        None => slice.points(),
    };

    HttpResponse::Ok().json(ApiPoints {
        year: params.year,
        total: slice.len() as u64,
        points,
    })
}

/// `GET /api/records`
///
/// A seeded random sample of one year's rows under the canonical column
/// names.
pub async fn records(
    state: web::Data<AppState>,
    params: web::Query<RecordsQuery>,
) -> HttpResponse {
    let slice = state.year_slice(params.year);
    let seed = params.seed.unwrap_or(DEFAULT_SEED);
    let limit = params.limit.unwrap_or(DEFAULT_SAMPLE_ROWS);

    HttpResponse::Ok().json(ApiRecords {
        year: params.year,
        total: slice.len() as u64,
        seed,
        records: sample(slice.rows(), limit, seed)
            .into_iter()
            .cloned()
            .collect(),
    })
}

/// `GET /api/histogram`
pub async fn histogram(
    state: web::Data<AppState>,
    params: web::Query<HistogramQuery>,
) -> HttpResponse {
    let slice = state.year_slice(params.year);

    match histogram_for(
        slice.rows(),
        &params.dimension,
        params.match_mode.unwrap_or_default(),
    ) {
        Ok(histogram) => HttpResponse::Ok().json(histogram),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/offenses`
///
/// Top offenses of one year, within `race` when given.
pub async fn offenses(
    state: web::Data<AppState>,
    params: web::Query<OffensesQuery>,
) -> HttpResponse {
    let slice = state.year_slice(params.year);
    let mode = params.mode.unwrap_or_default();

    let result = match params.race.as_deref() {
        Some(race) => offense_ranking(
            slice.rows(),
            race,
            mode,
            params.match_mode.unwrap_or_default(),
        ),
        None => top_offenses(slice.rows(), mode),
    };

    match result {
        Ok(table) => HttpResponse::Ok().json(table),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/clusters`
///
/// Runs k-means on a blocking thread so large years don't stall the
/// worker.
pub async fn clusters(
    state: web::Data<AppState>,
    params: web::Query<ClustersQuery>,
) -> HttpResponse {
    let kmeans = KMeansParams::new(params.k);
    let kmeans = params.seed.map_or(kmeans, |seed| kmeans.with_seed(seed));
    let points = state.year_slice(params.year).points();

    match web::block(move || cluster(&points, &kmeans)).await {
        Ok(Ok(centroids)) => HttpResponse::Ok().json(centroids),
        Ok(Err(e)) => error_response(&e),
        Err(e) => {
            log::error!("Clustering task failed: {e}");
            HttpResponse::InternalServerError().json(ApiError {
                error: "Clustering task failed".to_string(),
            })
        }
    }
}

/// Maps an aggregation failure to a JSON error response.
///
/// Bad parameters are the caller's fault (`400`); an empty selection or an
/// unclusterable point set is a well-formed request the data cannot
/// satisfy (`422`).
fn error_response(e: &AnalyticsError) -> HttpResponse {
    let body = ApiError {
        error: e.to_string(),
    };

    match e {
        AnalyticsError::InvalidParameter { .. } => {
            log::debug!("Rejected request: {e}");
            HttpResponse::BadRequest().json(body)
        }
        AnalyticsError::EmptyInput { .. } | AnalyticsError::Clustering { .. } => {
            log::warn!("Aggregation failed: {e}");
            HttpResponse::UnprocessableEntity().json(body)
        }
    }
}
