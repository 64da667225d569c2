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
#![allow(unused)]

/// the accept/reject decision for projected telemetry readings. This is a pure function of the
/// projection, the reading and the thresholds, i.e. there is no state here

use std::fmt;
use serde::{Serialize,Deserialize};

use crate::projection::ProjectionResult;
use crate::telemetry::TelemetryReading;
use crate::config::AnimationConfig;

#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash,Serialize,Deserialize)]
#[serde(rename_all="SCREAMING_SNAKE_CASE")]
pub enum SnapReason {
    OnRoute,
    Marginal,
    LowAccuracySnapped,
    OffRoute,
}

impl fmt::Display for SnapReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SnapReason::OnRoute => "ON_ROUTE",
            SnapReason::Marginal => "MARGINAL",
            SnapReason::LowAccuracySnapped => "LOW_ACCURACY_SNAPPED",
            SnapReason::OffRoute => "OFF_ROUTE",
        };
        f.write_str(s)
    }
}

#[derive(Debug,Clone,Copy,PartialEq,Serialize)]
pub struct SnapDecision {
    pub accept: bool,
    pub reason: SnapReason,
}

impl SnapDecision {
    fn accepted (reason: SnapReason)->Self { SnapDecision { accept: true, reason } }
    fn rejected (reason: SnapReason)->Self { SnapDecision { accept: false, reason } }
}

/// snap thresholds in meters. `off_route_threshold` should not exceed `max_snap_distance`
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct SnapPolicy {
    pub max_snap_distance: f64,
    pub gps_accuracy_threshold: f64,
    pub off_route_threshold: f64,
}

impl SnapPolicy {
    pub fn new (max_snap_distance: f64, gps_accuracy_threshold: f64, off_route_threshold: f64)->Self {
        SnapPolicy { max_snap_distance, gps_accuracy_threshold, off_route_threshold }
    }

    pub fn evaluate (&self, projection: &ProjectionResult, reading: &TelemetryReading)->SnapDecision {
        let dist = projection.distance_meters;

        if !(dist <= self.max_snap_distance) { // NaN distances are off route too
            SnapDecision::rejected( SnapReason::OffRoute)
        } else if reading.accuracy.is_some_and( |acc| acc > self.gps_accuracy_threshold) {
            SnapDecision::accepted( SnapReason::LowAccuracySnapped)
        } else if dist > self.off_route_threshold {
            SnapDecision::accepted( SnapReason::Marginal)
        } else {
            SnapDecision::accepted( SnapReason::OnRoute)
        }
    }
}

impl From<&AnimationConfig> for SnapPolicy {
    fn from (config: &AnimationConfig)->Self {
        SnapPolicy::new( config.max_snap_distance, config.gps_accuracy_threshold, config.off_route_threshold)
    }
}
