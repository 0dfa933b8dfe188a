//! Booking service HTTP client
//!
//! Implements the core's [`ReservationDirectory`] and [`BookingGateway`]
//! ports against the booking REST service. Failures are classified on
//! structured signals in order of preference: a typed `code` field in the
//! error body, then the HTTP status, then keyword inspection of the message
//! (legacy services only send prose).
//!
//! Endpoints:
//! - `GET  {base}/rooms/{id}`
//! - `GET  {base}/rooms/{id}/reservations?date=YYYY-MM-DD`
//! - `POST {base}/bookings`

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use roomly_core::booking::{BookingGateway, ReservationDirectory};
use roomly_core::classify::{ClassifiedError, FailureKind};
use roomly_domain::constants::DATE_FORMAT;
use roomly_domain::{ApiConfig, Booking, BookingPayload, Reservation, Room, RoomId};

/// Reqwest-backed adapter for both booking ports.
pub struct HttpBookingClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBookingClient {
    /// Build a client from the API configuration.
    pub fn new(config: &ApiConfig) -> Result<Self, ClassifiedError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ClassifiedError::new(FailureKind::Generic, e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.http.get(format!("{}{}", self.base_url, path)))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.http.post(format!("{}{}", self.base_url, path)))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ClassifiedError> {
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();

        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                ClassifiedError::new(FailureKind::Generic, format!("malformed response: {e}"))
            });
        }

        let body = response.text().await.unwrap_or_default();
        let error = classify_http_error(status.as_u16(), &body);
        warn!(status = status.as_u16(), kind = %error.kind, "booking service error");
        Err(error)
    }
}

#[async_trait]
impl ReservationDirectory for HttpBookingClient {
    async fn fetch_reservations(
        &self,
        room_id: &RoomId,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, ClassifiedError> {
        let date_str = date.format(DATE_FORMAT).to_string();
        let reservations: Vec<Reservation> = self
            .send(
                self.get(&format!("/rooms/{}/reservations", room_id))
                    .query(&[("date", date_str.as_str())]),
            )
            .await?;

        // Defensive exact-date filter: the contract is string equality on
        // the local date, and some legacy backends return neighbours.
        let filtered: Vec<Reservation> =
            reservations.into_iter().filter(|r| r.date == date).collect();
        debug!(room = %room_id, date = %date_str, count = filtered.len(), "fetched reservations");
        Ok(filtered)
    }

    async fn fetch_room(&self, room_id: &RoomId) -> Result<Room, ClassifiedError> {
        self.send(self.get(&format!("/rooms/{}", room_id))).await
    }
}

#[async_trait]
impl BookingGateway for HttpBookingClient {
    async fn submit_booking(&self, payload: BookingPayload) -> Result<Booking, ClassifiedError> {
        self.send(self.post("/bookings").json(&payload)).await
    }
}

/// Error body the booking service emits; `code` is the typed discriminator,
/// older deployments only fill `message`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

fn transport_error(err: reqwest::Error) -> ClassifiedError {
    let kind = if err.is_timeout() || err.is_connect() || err.is_request() {
        FailureKind::Network
    } else {
        FailureKind::Generic
    };
    ClassifiedError::new(kind, err.to_string())
}

fn kind_from_code(code: &str) -> Option<FailureKind> {
    match code {
        "conflict" | "slot_taken" => Some(FailureKind::Conflict),
        "unauthorized" | "forbidden" => Some(FailureKind::Auth),
        "validation" | "invalid_request" => Some(FailureKind::Validation),
        "server_error" => Some(FailureKind::Server),
        _ => None,
    }
}

/// Classify a non-success HTTP response.
fn classify_http_error(status: u16, body: &str) -> ClassifiedError {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        let message =
            parsed.message.unwrap_or_else(|| format!("booking service returned {status}"));

        if let Some(kind) = parsed.code.as_deref().and_then(kind_from_code) {
            return ClassifiedError { kind, message, status: Some(status) };
        }

        let mut error = ClassifiedError::from_status(status, message);
        if error.kind == FailureKind::Generic {
            // Status told us nothing; fall back to the prose.
            let fallback = ClassifiedError::from_message(error.message.clone());
            error.kind = fallback.kind;
        }
        return error;
    }

    let message = if body.trim().is_empty() {
        format!("booking service returned {status}")
    } else {
        body.to_string()
    };
    let mut error = ClassifiedError::from_status(status, message);
    if error.kind == FailureKind::Generic {
        let fallback = ClassifiedError::from_message(error.message.clone());
        error.kind = fallback.kind;
    }
    error
}
