/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

use thiserror::Error;
use crate::{UnitId, RouteId};

pub type Result<T> = std::result::Result<T,OdinEnrouteError>;

#[derive(Error,Debug)]
pub enum OdinEnrouteError {
    #[error("invalid route geometry: {0}")]
    InvalidGeometry(String),

    #[error("unknown unit {0}")]
    UnknownUnit(UnitId),

    #[error("unknown route {0}")]
    UnknownRoute(RouteId),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("routing service unavailable: {0}")]
    RoutingServiceUnavailable(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),

    #[error("http error {0}")]
    HttpError( #[from] reqwest::Error),

    #[error("JSON error {0}")]
    JsonError( #[from] serde_json::Error),

    #[error("config RON error {0}")]
    RonError( #[from] ron::error::SpannedError),
}

impl OdinEnrouteError {
    /// routing failures are transient and worth another attempt, everything else is not
    pub fn is_retryable (&self)->bool {
        matches!( self, OdinEnrouteError::RoutingServiceUnavailable(_) | OdinEnrouteError::HttpError(_))
    }
}

macro_rules! invalid_state {
    ($fmt:literal $(, $arg:expr )* ) => {
        crate::errors::OdinEnrouteError::InvalidState( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use invalid_state;

macro_rules! invalid_geometry {
    ($fmt:literal $(, $arg:expr )* ) => {
        crate::errors::OdinEnrouteError::InvalidGeometry( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use invalid_geometry;

macro_rules! routing_unavailable {
    ($fmt:literal $(, $arg:expr )* ) => {
        crate::errors::OdinEnrouteError::RoutingServiceUnavailable( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use routing_unavailable;

macro_rules! config_error {
    ($fmt:literal $(, $arg:expr )* ) => {
        crate::errors::OdinEnrouteError::ConfigError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use config_error;
