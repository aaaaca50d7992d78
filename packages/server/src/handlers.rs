//! HTTP handler functions for the crime forecast API.

use std::sync::Arc;

use actix_web::{HttpResponse, web};
use crime_forecast::ForecastError;
use crime_forecast_server_models::{
    ApiCity, ApiError, ApiHealth, CitiesResponse, DEFAULT_NUM_PREDICTIONS, MAX_NUM_PREDICTIONS,
    PredictRequest, PredictResponse,
};
use crime_forecast_source::{city_counts, records_for_city};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/cities`
///
/// Lists every city in the dataset with its record count.
pub async fn cities(state: web::Data<AppState>) -> HttpResponse {
    let cities = city_counts(&state.records)
        .into_iter()
        .map(ApiCity::from)
        .collect();

    HttpResponse::Ok().json(CitiesResponse { cities })
}

/// `POST /api/predict`
///
/// Generates a ranked batch of predictions for the requested city. Counts
/// above [`MAX_NUM_PREDICTIONS`] are rejected with 400.
pub async fn predict(state: web::Data<AppState>, body: web::Json<PredictRequest>) -> HttpResponse {
    let request = body.into_inner();

    let city = request
        .city
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    if city.is_empty() {
        return HttpResponse::BadRequest().json(ApiError::new("City is required"));
    }

    let count = request.num_predictions.unwrap_or(DEFAULT_NUM_PREDICTIONS);
    if count == 0 {
        return HttpResponse::BadRequest()
            .json(ApiError::new("numPredictions must be at least 1"));
    }
    if count > MAX_NUM_PREDICTIONS {
        return HttpResponse::BadRequest().json(ApiError::new(format!(
            "numPredictions must be at most {MAX_NUM_PREDICTIONS}"
        )));
    }

    let city_records = records_for_city(&state.records, &city);
    if city_records.is_empty() {
        return HttpResponse::NotFound()
            .json(ApiError::new(format!("No crime data found for city: {city}")));
    }

    let data_points = city_records.len();
    let forecaster = Arc::clone(&state.forecaster);
    let task_city = city.clone();

    let result = web::block(move || {
        forecaster.generate_predictions(&city_records, &task_city, Some(count))
    })
    .await;

    match result {
        Ok(Ok(predictions)) => {
            log::info!(
                "Generated {} predictions for {city} from {data_points} records",
                predictions.len()
            );
            HttpResponse::Ok().json(PredictResponse::new(city, predictions, data_points))
        }
        Ok(Err(ForecastError::InvalidInput { message })) => {
            log::warn!("Cannot predict for {city}: {message}");
            HttpResponse::UnprocessableEntity().json(ApiError::new(message))
        }
        Ok(Err(e)) => {
            log::error!("Prediction failed for {city}: {e}");
            HttpResponse::InternalServerError().json(ApiError::new(e.to_string()))
        }
        Err(e) => {
            log::error!("Prediction task failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Prediction task failed"))
        }
    }
}

/// `GET /api/patterns/{city}`
///
/// Returns the frequency tables extracted from a city's records.
pub async fn patterns(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let city = path.into_inner();
    let city_records = records_for_city(&state.records, &city);

    if city_records.is_empty() {
        return HttpResponse::NotFound().json(ApiError::new(format!(
            "No crime data found for city: {}",
            city.trim()
        )));
    }

    HttpResponse::Ok().json(state.forecaster.analyze_patterns(&city_records))
}
