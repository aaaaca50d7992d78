#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the crime forecaster.
//!
//! Loads the historical incident CSV once at startup and serves city
//! listings, pattern summaries and prediction batches over a small JSON
//! API under `/api`.

mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use crime_forecast::{ForecastConfig, Forecaster};
use crime_forecast_areas::RegistryAreaLookup;
use crime_forecast_models::HistoricalRecord;

/// CSV file read when `CRIME_DATA_PATH` is unset.
pub const DEFAULT_DATA_PATH: &str = "crime_dataset_india.csv";

/// Shared application state.
pub struct AppState {
    /// Every historical record, loaded once at startup.
    pub records: Arc<Vec<HistoricalRecord>>,
    /// Forecaster placing predictions in the embedded city registry.
    pub forecaster: Arc<Forecaster<RegistryAreaLookup>>,
}

impl AppState {
    /// Creates the state from loaded records and a configuration.
    #[must_use]
    pub fn new(records: Vec<HistoricalRecord>, config: ForecastConfig) -> Self {
        Self {
            records: Arc::new(records),
            forecaster: Arc::new(Forecaster::new(config, RegistryAreaLookup::new())),
        }
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/cities", web::get().to(handlers::cities))
            .route("/predict", web::post().to(handlers::predict))
            .route("/patterns/{city}", web::get().to(handlers::patterns)),
    );
}

/// Loads the forecast configuration from `FORECAST_CONFIG`, if set, and
/// applies the `FORECAST_*` environment overrides.
fn load_config() -> std::io::Result<ForecastConfig> {
    let config = match std::env::var("FORECAST_CONFIG") {
        Ok(path) => ForecastConfig::load(&PathBuf::from(path)),
        Err(_) => Ok(ForecastConfig::default()),
    };

    config
        .and_then(ForecastConfig::apply_env_overrides)
        .map_err(std::io::Error::other)
}

/// Starts the crime forecast API server.
///
/// Reads the dataset named by `CRIME_DATA_PATH`, builds the forecaster,
/// and starts the Actix-Web HTTP server on `BIND_ADDR:PORT`. This is a
/// regular async function; the caller provides the async runtime (e.g.
/// via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the dataset or configuration
/// cannot be loaded, or if the HTTP server fails to bind or encounters a
/// runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = load_config()?;

    let data_path =
        std::env::var("CRIME_DATA_PATH").unwrap_or_else(|_| DEFAULT_DATA_PATH.to_string());
    let records = crime_forecast_source::load_records(&PathBuf::from(&data_path))
        .map_err(std::io::Error::other)?;

    if records.is_empty() {
        log::warn!("No historical records found in {data_path}");
    }

    let state = web::Data::new(AppState::new(records, config));

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use crime_forecast_server_models::{ApiHealth, CitiesResponse, PredictResponse};

    use super::*;

    const SAMPLE: &str = "\
City,Date of Occurrence,Time of Occurrence,Crime Description,Victim Age,Victim Gender,Weapon Used
Delhi,05-01-2024 00:00,05-01-2024 22:10,THEFT,25,M,None
Delhi,05-01-2024 00:00,05-01-2024 23:40,THEFT,31,F,Knife
Delhi,06-01-2024 00:00,06-01-2024 14:05,ASSAULT,47,M,Blunt Object
Pune,07-01-2024 00:00,07-01-2024 09:30,BURGLARY,62,F,Other
";

    fn state() -> web::Data<AppState> {
        let records = crime_forecast_source::read_records(SAMPLE.as_bytes()).unwrap();
        let config = ForecastConfig {
            seed: Some(7),
            ..ForecastConfig::default()
        };
        web::Data::new(AppState::new(records, config))
    }

    macro_rules! app {
        () => {
            test::init_service(App::new().app_data(state()).configure(configure)).await
        };
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let health: ApiHealth = test::call_and_read_body_json(&app, req).await;
        assert!(health.healthy);
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn cities_lists_record_counts() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/cities").to_request();
        let body: CitiesResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.cities.len(), 2);
        assert_eq!(body.cities[0].name, "Delhi");
        assert_eq!(body.cities[0].crime_count, 3);
    }

    #[actix_web::test]
    async fn predict_returns_ranked_batch() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/predict")
            .set_json(serde_json::json!({ "city": "Delhi", "numPredictions": 4 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: PredictResponse = test::read_body_json(resp).await;
        assert_eq!(body.city, "Delhi");
        assert_eq!(body.total_predictions, 4);
        assert_eq!(body.data_points, 3);
        assert!(
            body.predictions
                .windows(2)
                .all(|w| w[0].score() >= w[1].score())
        );
        assert!(body.predictions.iter().all(|p| p.location != "Unknown Area"));
    }

    #[actix_web::test]
    async fn predict_defaults_to_ten() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/predict")
            .set_json(serde_json::json!({ "city": " Delhi " }))
            .to_request();
        let body: PredictResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.total_predictions, 10);
        assert_eq!(body.city, "Delhi");
    }

    #[actix_web::test]
    async fn predict_accepts_maximum_count() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/predict")
            .set_json(serde_json::json!({ "city": "Delhi", "numPredictions": 1000 }))
            .to_request();
        let body: PredictResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.total_predictions, 1000);
    }

    #[actix_web::test]
    async fn predict_rejects_bad_requests() {
        let app = app!();

        let missing_city = test::TestRequest::post()
            .uri("/api/predict")
            .set_json(serde_json::json!({ "city": "  " }))
            .to_request();
        let resp = test::call_service(&app, missing_city).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let zero = test::TestRequest::post()
            .uri("/api/predict")
            .set_json(serde_json::json!({ "city": "Delhi", "numPredictions": 0 }))
            .to_request();
        let resp = test::call_service(&app, zero).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let too_many = test::TestRequest::post()
            .uri("/api/predict")
            .set_json(serde_json::json!({ "city": "Delhi", "numPredictions": 1_000_000_000_000_u64 }))
            .to_request();
        let resp = test::call_service(&app, too_many).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let unknown = test::TestRequest::post()
            .uri("/api/predict")
            .set_json(serde_json::json!({ "city": "Atlantis" }))
            .to_request();
        let resp = test::call_service(&app, unknown).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn patterns_summarize_city() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/patterns/Delhi")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["crimeTypeFrequency"]["THEFT"], 2);
        assert_eq!(body["hourlyDistribution"]["22"], 1);

        let req = test::TestRequest::get()
            .uri("/api/patterns/Atlantis")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
