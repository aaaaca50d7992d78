#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the crime forecast server.
//!
//! These types are serialized to JSON for the REST API. They wrap the core
//! forecast types so the HTTP contract can evolve without touching the
//! forecaster.

use chrono::{DateTime, Utc};
use crime_forecast_models::Prediction;
use crime_forecast_source::CityCount;
use serde::{Deserialize, Serialize};

/// Name reported for the forecasting algorithm.
pub const ALGORITHM_NAME: &str = "Statistical Pattern Recognition";

/// Prediction count used when a request does not ask for one.
pub const DEFAULT_NUM_PREDICTIONS: usize = 10;

/// Largest prediction count a single request may ask for.
pub const MAX_NUM_PREDICTIONS: usize = 1000;

/// Body of `POST /api/predict`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequest {
    /// City to forecast for.
    pub city: Option<String>,
    /// Number of predictions to return.
    pub num_predictions: Option<usize>,
}

/// Response of `POST /api/predict`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictResponse {
    /// City the predictions were generated for.
    pub city: String,
    /// Predictions, highest score first.
    pub predictions: Vec<Prediction>,
    /// Number of predictions returned.
    pub total_predictions: usize,
    /// Number of historical records the forecast was built from.
    pub data_points: usize,
    /// When the batch was generated.
    pub generated_at: DateTime<Utc>,
    /// Server version that produced the batch.
    pub model_version: String,
    /// Algorithm name.
    pub algorithm: String,
    /// Mean confidence across the batch.
    pub confidence_score: f64,
}

impl PredictResponse {
    /// Wraps a batch of predictions with its metadata.
    #[must_use]
    pub fn new(city: String, predictions: Vec<Prediction>, data_points: usize) -> Self {
        let confidence_score = mean_confidence(&predictions);
        Self {
            city,
            total_predictions: predictions.len(),
            predictions,
            data_points,
            generated_at: Utc::now(),
            model_version: env!("CARGO_PKG_VERSION").to_string(),
            algorithm: ALGORITHM_NAME.to_string(),
            confidence_score,
        }
    }
}

/// Mean confidence of `predictions`, or `0.0` when there are none.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_confidence(predictions: &[Prediction]) -> f64 {
    if predictions.is_empty() {
        return 0.0;
    }
    predictions.iter().map(|p| p.confidence).sum::<f64>() / predictions.len() as f64
}

/// A city with historical records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCity {
    /// City name.
    pub name: String,
    /// Number of historical records.
    pub crime_count: u64,
}

impl From<CityCount> for ApiCity {
    fn from(count: CityCount) -> Self {
        Self {
            name: count.name,
            crime_count: count.crime_count,
        }
    }
}

/// Response of `GET /api/cities`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitiesResponse {
    /// Cities, most records first.
    pub cities: Vec<ApiCity>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
