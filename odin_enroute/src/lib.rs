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

//! odin_enroute keeps a live, route-constrained position for moving response units.
//!
//! Each unit follows a fixed route geometry (usually obtained from a routing service). Noisy position
//! reports are snapped onto that route, and if reports stop coming in the unit keeps moving along the route
//! on a time based schedule. A fixed rate update loop samples all units and publishes snapshot batches
//! to subscribers.
//!
//! The main parts are
//!   - [`route::Route`] - immutable arc-length parametrized polyline
//!   - [`projection::project`] - closest point on route for arbitrary positions
//!   - [`snap::SnapPolicy`] - accept/reject decision for projected readings
//!   - [`scheduler::ProgressScheduler`] - eased time based progress with pause/resume/speed
//!   - [`reconciler::Reconciler`] - per-unit state machine merging the above
//!   - [`tracker::Tracker`] - registries, control operations and the update loop / fan-out

use std::{fmt, sync::Arc, borrow::Borrow, collections::VecDeque};
use serde::{Serialize,Deserialize};

pub mod errors;
pub use errors::{OdinEnrouteError,Result};

pub mod config;
pub mod geo;
pub mod route;
pub mod projection;
pub mod snap;
pub mod scheduler;
pub mod telemetry;
pub mod reconciler;
pub mod tracker;
pub mod router;
pub mod sim;

pub use config::{TrackerConfig,AnimationConfig,SmoothingConfig,RouterConfig,load_config};
pub use geo::{GeoPoint,Heading};
pub use route::Route;
pub use projection::{project,ProjectionResult};
pub use snap::{SnapPolicy,SnapDecision,SnapReason};
pub use scheduler::{ProgressScheduler,EasingProfile,SchedulerState};
pub use telemetry::{TelemetryReading,TelemetryOutcome};
pub use reconciler::{Reconciler,UnitTrackState,UnitSnapshot,AnimationStatus};
pub use tracker::{Tracker,SnapshotBatch,TrackEvent};
pub use router::{RoutingService,RouteRequest,RouteResponse,OsrmRouter,RetryingRouter,StaticRouter};

/* #region ids ********************************************************************************************/

// unit and route ids are shared between registries, snapshots and events - keep them in Arcs so that
// we can clone them without heap allocation

/// identifier of a tracked unit (vehicle)
#[derive(Debug,Clone,PartialEq,Eq,Hash,PartialOrd,Ord,Serialize,Deserialize)]
#[serde(transparent)]
pub struct UnitId(Arc<str>);

impl UnitId {
    pub fn new (id: &str)->Self { UnitId( Arc::from(id)) }
    pub fn as_str (&self)->&str { &self.0 }
}

impl From<&str> for UnitId {
    fn from (id: &str)->Self { UnitId::new(id) }
}

impl From<String> for UnitId {
    fn from (id: String)->Self { UnitId( Arc::from(id)) }
}

impl Borrow<str> for UnitId {
    fn borrow (&self)->&str { &self.0 }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// identifier of a registered route. Routes are never shared between units, the id is
/// unique for each registration
#[derive(Debug,Clone,PartialEq,Eq,Hash,PartialOrd,Ord,Serialize,Deserialize)]
#[serde(transparent)]
pub struct RouteId(Arc<str>);

impl RouteId {
    pub fn new (id: &str)->Self { RouteId( Arc::from(id)) }
    pub fn as_str (&self)->&str { &self.0 }

    /// the id we generate for routes that were obtained from the routing service on behalf of a unit
    pub fn for_unit (unit_id: &UnitId, seq: u64)->Self {
        RouteId( Arc::from( format!("{}-route-{}", unit_id, seq)))
    }
}

impl From<&str> for RouteId {
    fn from (id: &str)->Self { RouteId::new(id) }
}

impl From<String> for RouteId {
    fn from (id: String)->Self { RouteId( Arc::from(id)) }
}

impl Borrow<str> for RouteId {
    fn borrow (&self)->&str { &self.0 }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/* #endregion ids */

/// push a new element to the end of a VecDeque used as a bounded ringbuffer, returning the evicted
/// oldest element if we were at capacity
#[inline]
pub(crate) fn push_to_ringbuffer<T> (v: &mut VecDeque<T>, max_len: usize, t: T)->Option<T> {
    let evicted = if v.len() >= max_len { v.pop_front() } else { None };
    v.push_back(t);
    evicted
}
