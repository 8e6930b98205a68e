// Copyright (c) 2025 intg-procon-ip contributors
// SPDX-License-Identifier: MPL-2.0

//! Custom application error with conversions from common Rust and 3rd-party errors.

use actix::MailboxError;
use actix::dev::SendError;
use derive_more::Display;

#[derive(Debug, Display, PartialEq)]
pub enum ServiceError {
    /// Network or HTTP failure reaching a device endpoint.
    ///
    /// The caller retries on its own schedule; no retry logic lives here.
    #[display("fetch failed: {_0}")]
    FetchFailed(String),

    /// Structurally invalid `GetState.csv` body.
    #[display("malformed device response: {_0}")]
    MalformedResponse(String),

    /// Relay column or mode outside the fixed protocol range.
    ///
    /// This signals a caller programming error, not a device condition.
    #[display("invalid relay request: {_0}")]
    InvalidRelayRequest(String),

    /// The requested operation needs device state that isn't available yet.
    #[display("service unavailable: {_0}")]
    ServiceUnavailable(String),

    #[display("internal error: {_0}")]
    InternalError(String),
}

impl std::error::Error for ServiceError {}

impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self {
        ServiceError::InternalError(format!("{e:?}"))
    }
}

impl From<MailboxError> for ServiceError {
    fn from(e: MailboxError) -> Self {
        ServiceError::InternalError(format!("Internal message error: {e:?}"))
    }
}

impl From<awc::error::SendRequestError> for ServiceError {
    fn from(e: awc::error::SendRequestError) -> Self {
        ServiceError::FetchFailed(e.to_string())
    }
}

impl From<awc::error::PayloadError> for ServiceError {
    fn from(e: awc::error::PayloadError) -> Self {
        ServiceError::FetchFailed(e.to_string())
    }
}

impl From<strum::ParseError> for ServiceError {
    fn from(e: strum::ParseError) -> Self {
        ServiceError::InvalidRelayRequest(e.to_string())
    }
}

impl<T> From<SendError<T>> for ServiceError {
    fn from(e: SendError<T>) -> Self {
        ServiceError::InternalError(format!("Error sending internal message: {e:?}"))
    }
}
