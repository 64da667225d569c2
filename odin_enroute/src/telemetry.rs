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

/// inbound telemetry: the [`TelemetryReading`] wire type, the bounded buffer for units that are still waiting
/// for their route, and the [`TelemetryOutcome`] of processing a reading

use std::collections::VecDeque;
use chrono::{DateTime,Utc};
use serde::{Serialize,Deserialize};

use crate::{UnitId, push_to_ringbuffer};
use crate::errors::Result;
use crate::geo::GeoPoint;
use crate::snap::SnapReason;

/// a raw position report. Serialized as camelCase JSON, e.g.
/// `{"unitId":"E12","latitude":37.41,"longitude":-122.06,"accuracy":8.0,"timestamp":"2025-03-01T12:00:00Z"}`
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
#[serde(rename_all="camelCase")]
pub struct TelemetryReading {
    pub unit_id: UnitId,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if="Option::is_none")]
    pub accuracy: Option<f64>,  // reported accuracy radius in meters
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if="Option::is_none")]
    pub progress: Option<f64>,  // route progress [0,1] if the source tracks it
}

impl TelemetryReading {
    pub fn new (unit_id: impl Into<UnitId>, latitude: f64, longitude: f64, timestamp: DateTime<Utc>)->Self {
        TelemetryReading { unit_id: unit_id.into(), latitude, longitude, accuracy: None, timestamp, progress: None }
    }

    pub fn with_accuracy (mut self, accuracy: f64)->Self { self.accuracy = Some(accuracy); self }
    pub fn with_progress (mut self, progress: f64)->Self { self.progress = Some(progress); self }

    pub fn position (&self)->GeoPoint { GeoPoint::from_lat_lon_degrees( self.latitude, self.longitude) }

    pub fn has_valid_position (&self)->bool { self.position().is_valid() }

    pub fn from_json (s: &str)->Result<Self> {
        Ok( serde_json::from_str(s)? )
    }
}

/// what happened to a reading. These are not errors - they are reported to observability (logs, events, stats)
#[derive(Debug,Clone,Copy,PartialEq,Serialize)]
#[serde(rename_all="camelCase")]
pub enum TelemetryOutcome {
    /// projected reading accepted by snap policy and applied as new target
    Accepted(SnapReason),
    /// projected reading rejected by snap policy, unit continues on time based fallback
    Rejected(SnapReason),
    /// trusted source progress applied without projection
    DirectProgress,
    /// reading not newer than the last accepted one
    Stale,
    /// position readings are ignored for sessions without GPS snapping
    SnappingDisabled,
    /// non-finite or out of range coordinates / progress
    Invalid,
    /// unit is waiting for its route, reading was buffered
    Buffered,
    /// unit is waiting for its route and the buffer was full, the oldest reading was dropped
    Dropped,
    UnknownUnit,
    /// session is not running or paused
    Inactive,
}

impl TelemetryOutcome {
    pub fn is_applied (&self)->bool {
        matches!( self, TelemetryOutcome::Accepted(_) | TelemetryOutcome::DirectProgress)
    }
}

/// bounded per-unit buffer for readings that arrive before the route is available.
/// When full the oldest reading is dropped
#[derive(Debug,Clone)]
pub struct PendingTelemetry {
    readings: VecDeque<TelemetryReading>,
    capacity: usize,
    dropped: u64,
    waiting_since: Option<DateTime<Utc>>, // first update loop tick that saw this buffer
}

impl PendingTelemetry {
    pub fn new (capacity: usize)->Self {
        PendingTelemetry { readings: VecDeque::with_capacity(capacity), capacity: capacity.max(1), dropped: 0, waiting_since: None }
    }

    /// returns the dropped reading if the buffer was full
    pub fn push (&mut self, reading: TelemetryReading)->Option<TelemetryReading> {
        let evicted = push_to_ringbuffer( &mut self.readings, self.capacity, reading);
        if evicted.is_some() { self.dropped += 1 }
        evicted
    }

    pub fn len (&self)->usize { self.readings.len() }
    pub fn is_empty (&self)->bool { self.readings.is_empty() }
    pub fn dropped (&self)->u64 { self.dropped }

    /// when we started waiting for the route, stamped with `now` on first call
    pub fn waiting_since (&mut self, now: DateTime<Utc>)->DateTime<Utc> {
        *self.waiting_since.get_or_insert( now)
    }

    /// a new route request restarts the wait
    pub fn reset_wait (&mut self) { self.waiting_since = None }

    /// all buffered readings in timestamp order
    pub fn into_sorted (self)->Vec<TelemetryReading> {
        let mut v: Vec<TelemetryReading> = self.readings.into();
        v.sort_by_key( |r| r.timestamp);
        v
    }
}
