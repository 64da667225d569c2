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

/// the [`Tracker`] owns the route and unit registries, exposes the session control operations, routes
/// telemetry to the owning [`Reconciler`] and runs the fixed rate update loop that publishes [`SnapshotBatch`]
/// values to subscribers.
///
/// Registries are `DashMap`s. Each unit's reconciler sits behind its own mutex so that telemetry ingestion and
/// ticks for the same unit are serialized, while different units never contend. We never hold a registry
/// shard lock while locking a reconciler - entries are cloned out first.

use std::{sync::{Arc,Mutex,MutexGuard,atomic::{AtomicU64,Ordering}}, time::Duration};
use chrono::{DateTime,Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use serde::Serialize;
use tokio::{sync::{broadcast,mpsc}, task::{AbortHandle,JoinHandle}, time::{interval,MissedTickBehavior}};
use tracing::{debug,info,warn,error};

use crate::{UnitId, RouteId};
use crate::errors::{OdinEnrouteError,Result,invalid_state};
use crate::config::{TrackerConfig,AnimationConfig};
use crate::geo::GeoPoint;
use crate::route::Route;
use crate::reconciler::{Reconciler,UnitSnapshot,RerouteReport};
use crate::router::{RoutingService,RouteRequest};
use crate::snap::SnapReason;
use crate::telemetry::{TelemetryReading,TelemetryOutcome,PendingTelemetry};

/// what we publish on each tick
#[derive(Debug,Clone,PartialEq,Serialize)]
#[serde(rename_all="camelCase")]
pub struct SnapshotBatch {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub units: Vec<UnitSnapshot>,
}

/// session lifecycle and telemetry events, published on a separate channel
#[derive(Debug,Clone,PartialEq,Serialize)]
#[serde(tag="event", rename_all="camelCase", rename_all_fields="camelCase")]
pub enum TrackEvent {
    Started { unit_id: UnitId, route_id: RouteId, time: DateTime<Utc> },
    Completed { unit_id: UnitId, time: DateTime<Utc> },
    Reopened { unit_id: UnitId, time: DateTime<Utc> },
    Stopped { unit_id: UnitId, route_id: RouteId, time: DateTime<Utc> },
    Evicted { unit_id: UnitId, route_id: RouteId, time: DateTime<Utc> },
    RouteExpired { route_id: RouteId, time: DateTime<Utc> },
    PendingExpired { unit_id: UnitId, discarded: usize, time: DateTime<Utc> },
    Rerouted { unit_id: UnitId, old_route_id: RouteId, new_route_id: RouteId, displacement_meters: f64, time: DateTime<Utc> },
    Rejected { unit_id: UnitId, reason: SnapReason, time: DateTime<Utc> },
    Stale { unit_id: UnitId, time: DateTime<Utc> },
    TelemetryDropped { unit_id: UnitId, time: DateTime<Utc> },
    RouteFailed { unit_id: UnitId, message: String },
}

/* #region stats ******************************************************************************************/

#[derive(Debug,Default)]
pub struct TrackerStats {
    accepted: AtomicU64,
    rejected: AtomicU64,
    direct_progress: AtomicU64,
    stale: AtomicU64,
    snapping_disabled: AtomicU64,
    invalid: AtomicU64,
    buffered: AtomicU64,
    dropped: AtomicU64,
    unknown_unit: AtomicU64,
    evicted: AtomicU64,
    expired_routes: AtomicU64,
    expired_pending: AtomicU64,
    ticks: AtomicU64,
}

#[derive(Debug,Clone,Copy,PartialEq,Eq,Default,Serialize)]
#[serde(rename_all="camelCase")]
pub struct StatsSnapshot {
    pub accepted: u64,
    pub rejected: u64,
    pub direct_progress: u64,
    pub stale: u64,
    pub snapping_disabled: u64,
    pub invalid: u64,
    pub buffered: u64,
    pub dropped: u64,
    pub unknown_unit: u64,
    pub evicted: u64,
    pub expired_routes: u64,
    pub expired_pending: u64,
    pub ticks: u64,
}

impl TrackerStats {
    fn record (&self, outcome: &TelemetryOutcome) {
        let counter = match outcome {
            TelemetryOutcome::Accepted(_) => &self.accepted,
            TelemetryOutcome::Rejected(_) => &self.rejected,
            TelemetryOutcome::DirectProgress => &self.direct_progress,
            TelemetryOutcome::Stale => &self.stale,
            TelemetryOutcome::SnappingDisabled => &self.snapping_disabled,
            TelemetryOutcome::Invalid => &self.invalid,
            TelemetryOutcome::Buffered => &self.buffered,
            TelemetryOutcome::Dropped => &self.dropped,
            TelemetryOutcome::UnknownUnit | TelemetryOutcome::Inactive => &self.unknown_unit,
        };
        counter.fetch_add( 1, Ordering::Relaxed);
    }

    pub fn snapshot (&self)->StatsSnapshot {
        StatsSnapshot {
            accepted: self.accepted.load( Ordering::Relaxed),
            rejected: self.rejected.load( Ordering::Relaxed),
            direct_progress: self.direct_progress.load( Ordering::Relaxed),
            stale: self.stale.load( Ordering::Relaxed),
            snapping_disabled: self.snapping_disabled.load( Ordering::Relaxed),
            invalid: self.invalid.load( Ordering::Relaxed),
            buffered: self.buffered.load( Ordering::Relaxed),
            dropped: self.dropped.load( Ordering::Relaxed),
            unknown_unit: self.unknown_unit.load( Ordering::Relaxed),
            evicted: self.evicted.load( Ordering::Relaxed),
            expired_routes: self.expired_routes.load( Ordering::Relaxed),
            expired_pending: self.expired_pending.load( Ordering::Relaxed),
            ticks: self.ticks.load( Ordering::Relaxed),
        }
    }
}

/* #endregion stats */

type SharedReconciler = Arc<Mutex<Reconciler>>;

fn has_elapsed (since: DateTime<Utc>, now: DateTime<Utc>, timeout: Duration)->bool {
    (now - since).to_std().is_ok_and( |d| d >= timeout)
}

fn lock (r: &SharedReconciler)->MutexGuard<'_,Reconciler> {
    r.lock().unwrap_or_else( |poisoned| poisoned.into_inner())
}

pub struct Tracker {
    config: Arc<TrackerConfig>,
    routes: DashMap<RouteId,Arc<Route>>,
    bindings: DashMap<RouteId,UnitId>,   // route -> the unit using it
    unbound_since: DashMap<RouteId,DateTime<Utc>>, // first tick that saw a registered route without unit
    units: DashMap<UnitId,SharedReconciler>,
    pending: DashMap<UnitId,PendingTelemetry>, // units waiting for their route
    route_seq: AtomicU64,
    batch_seq: AtomicU64,
    stats: TrackerStats,
    latest: Mutex<Option<Arc<SnapshotBatch>>>,
    snapshot_tx: broadcast::Sender<Arc<SnapshotBatch>>,
    event_tx: broadcast::Sender<TrackEvent>,
}

impl Tracker {
    pub fn new (config: TrackerConfig)->Result<Self> {
        config.validate()?;

        let (snapshot_tx, _) = broadcast::channel( config.publish_capacity);
        let (event_tx, _) = broadcast::channel( config.publish_capacity * 4);

        Ok( Tracker {
            config: Arc::new(config),
            routes: DashMap::new(),
            bindings: DashMap::new(),
            unbound_since: DashMap::new(),
            units: DashMap::new(),
            pending: DashMap::new(),
            route_seq: AtomicU64::new(0),
            batch_seq: AtomicU64::new(0),
            stats: TrackerStats::default(),
            latest: Mutex::new(None),
            snapshot_tx,
            event_tx,
        })
    }

    pub fn config (&self)->&TrackerConfig { &self.config }
    pub fn stats (&self)->StatsSnapshot { self.stats.snapshot() }

    pub fn subscribe (&self)->broadcast::Receiver<Arc<SnapshotBatch>> { self.snapshot_tx.subscribe() }
    pub fn subscribe_events (&self)->broadcast::Receiver<TrackEvent> { self.event_tx.subscribe() }

    fn publish_event (&self, event: TrackEvent) {
        let _ = self.event_tx.send( event); // no subscribers is not an error
    }

    /* #region routes *****************************************************************************************/

    /// create and register a route. Fails with `InvalidGeometry` for unusable waypoints and with `InvalidState`
    /// if a route with the same id is in use
    pub fn register_route (&self, route_id: RouteId, waypoints: Vec<GeoPoint>)->Result<Arc<Route>> {
        let route = Route::new( route_id, waypoints)?;
        self.insert_route( route)
    }

    pub fn insert_route (&self, route: Route)->Result<Arc<Route>> {
        let route_id = route.id().clone();
        if self.bindings.contains_key( &route_id) {
            return Err( invalid_state!("route {} is in use", route_id))
        }
        let route = Arc::new(route);
        self.routes.insert( route_id.clone(), route.clone());
        debug!(route=%route_id, segments=route.segments().len(), length=route.total_meters(), "route registered");
        Ok(route)
    }

    pub fn remove_route (&self, route_id: &RouteId)->Result<Arc<Route>> {
        if let Some(e) = self.bindings.get( route_id) {
            return Err( invalid_state!("route {} is in use by unit {}", route_id, e.value()))
        }
        self.unbound_since.remove( route_id);
        self.routes.remove( route_id).map( |(_,r)| r).ok_or_else( || OdinEnrouteError::UnknownRoute( route_id.clone()))
    }

    pub fn route (&self, route_id: &RouteId)->Option<Arc<Route>> {
        self.routes.get( route_id).map( |e| e.value().clone())
    }

    pub fn route_count (&self)->usize { self.routes.len() }

    /// bind a route to a unit. Routes are never shared between units
    fn bind_route (&self, route_id: &RouteId, unit_id: &UnitId)->Result<()> {
        match self.bindings.entry( route_id.clone()) {
            Entry::Occupied(e) => {
                if e.get() != unit_id {
                    return Err( invalid_state!("route {} already bound to unit {}", route_id, e.get()))
                }
            }
            Entry::Vacant(e) => { e.insert( unit_id.clone()); }
        }
        self.unbound_since.remove( route_id);
        Ok(())
    }

    /// routes are destroyed with the session that used them
    fn release_route (&self, route_id: &RouteId) {
        self.bindings.remove( route_id);
        self.routes.remove( route_id);
        self.unbound_since.remove( route_id);
    }

    /// registered routes that no unit picked up within the idle timeout are dropped
    fn expire_unbound_routes (&self, now: DateTime<Utc>) {
        let mut expired: Vec<RouteId> = Vec::new();
        for e in self.routes.iter() {
            let route_id = e.key();
            if !self.bindings.contains_key( route_id) {
                let since = *self.unbound_since.entry( route_id.clone()).or_insert( now);
                if has_elapsed( since, now, self.config.idle_timeout) {
                    expired.push( route_id.clone());
                }
            }
        }

        for route_id in expired {
            if !self.bindings.contains_key( &route_id) && self.routes.remove( &route_id).is_some() {
                self.unbound_since.remove( &route_id);
                self.stats.expired_routes.fetch_add( 1, Ordering::Relaxed);
                info!(route=%route_id, "unused route expired");
                self.publish_event( TrackEvent::RouteExpired { route_id, time: now });
            }
        }
    }

    /* #endregion routes */

    /* #region sessions **************************************************************************************/

    fn get_unit (&self, unit_id: &UnitId)->Result<SharedReconciler> {
        self.units.get( unit_id).map( |e| e.value().clone()).ok_or_else( || OdinEnrouteError::UnknownUnit( unit_id.clone()))
    }

    pub fn has_unit (&self, unit_id: &UnitId)->bool { self.units.contains_key( unit_id) }
    pub fn unit_count (&self)->usize { self.units.len() }

    pub fn unit_ids (&self)->Vec<UnitId> {
        let mut ids: Vec<UnitId> = self.units.iter().map( |e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// start tracking `unit_id` on a registered route. If `config` is `None` we use the configured default
    /// animation. A finished (idle) session of the same unit is replaced, an active one is an error.
    /// Buffered telemetry for this unit is replayed in timestamp order
    pub fn start_session (&self, now: DateTime<Utc>, unit_id: &UnitId, route_id: &RouteId, config: Option<AnimationConfig>)->Result<()> {
        let route = self.route( route_id).ok_or_else( || OdinEnrouteError::UnknownRoute( route_id.clone()))?;
        let config = config.unwrap_or_else( || self.config.default_animation.clone());
        config.validate()?;

        if let Some(existing) = self.units.get( unit_id).map( |e| e.value().clone()) {
            let r = lock( &existing);
            if !r.is_idle() {
                return Err( invalid_state!("unit {} already has an active session", unit_id))
            }
        }

        self.bind_route( route_id, unit_id)?;

        let mut reconciler = Reconciler::new( unit_id.clone(), route, config, &self.config);
        self.arm_completion( &mut reconciler);

        if let Err(e) = reconciler.start( now) {
            self.bindings.remove( route_id);
            return Err(e)
        }

        if let Some(old) = self.units.insert( unit_id.clone(), Arc::new( Mutex::new( reconciler))) {
            let old_route = lock( &old).route_id().clone();
            if &old_route != route_id { self.release_route( &old_route) }
        }
        self.publish_event( TrackEvent::Started { unit_id: unit_id.clone(), route_id: route_id.clone(), time: now });

        if let Some((_,pending)) = self.pending.remove( unit_id) {
            let readings = pending.into_sorted();
            if !readings.is_empty() {
                debug!(unit=%unit_id, n=readings.len(), "replaying buffered telemetry");
                for reading in &readings {
                    self.ingest( reading);
                }
            }
        }
        Ok(())
    }

    /// end the session of `unit_id` and release its route. Returns the last snapshot
    pub fn stop_session (&self, now: DateTime<Utc>, unit_id: &UnitId)->Result<UnitSnapshot> {
        let (_,reconciler) = self.units.remove( unit_id).ok_or_else( || OdinEnrouteError::UnknownUnit( unit_id.clone()))?;
        let mut r = lock( &reconciler);
        r.stop( now);
        let route_id = r.route_id().clone();
        self.release_route( &route_id);
        self.pending.remove( unit_id);

        self.publish_event( TrackEvent::Stopped { unit_id: unit_id.clone(), route_id, time: now });
        Ok( r.snapshot())
    }

    pub fn pause_session (&self, now: DateTime<Utc>, unit_id: &UnitId)->Result<()> {
        let reconciler = self.get_unit( unit_id)?;
        let mut r = lock( &reconciler);
        r.pause( now)
    }

    pub fn resume_session (&self, now: DateTime<Utc>, unit_id: &UnitId)->Result<()> {
        let reconciler = self.get_unit( unit_id)?;
        let mut r = lock( &reconciler);
        r.resume( now)
    }

    pub fn set_speed (&self, now: DateTime<Utc>, unit_id: &UnitId, multiplier: f64)->Result<()> {
        let reconciler = self.get_unit( unit_id)?;
        let mut r = lock( &reconciler);
        r.set_speed( now, multiplier)
    }

    /// move a unit onto another registered route. The old route is released
    pub fn reroute_session (&self, now: DateTime<Utc>, unit_id: &UnitId, new_route_id: &RouteId)->Result<RerouteReport> {
        let reconciler = self.get_unit( unit_id)?;
        let new_route = self.route( new_route_id).ok_or_else( || OdinEnrouteError::UnknownRoute( new_route_id.clone()))?;
        self.bind_route( new_route_id, unit_id)?;

        let mut r = lock( &reconciler);
        let old_route_id = r.route_id().clone();
        match r.reroute( now, new_route) {
            Ok(report) => {
                if &old_route_id != new_route_id { self.release_route( &old_route_id) }
                self.publish_event( TrackEvent::Rerouted {
                    unit_id: unit_id.clone(),
                    old_route_id: report.old_route_id.clone(),
                    new_route_id: report.new_route_id.clone(),
                    displacement_meters: report.displacement_meters,
                    time: now
                });
                Ok(report)
            }
            Err(e) => {
                if &old_route_id != new_route_id { self.bindings.remove( new_route_id); }
                Err(e)
            }
        }
    }

    pub fn snapshot (&self, unit_id: &UnitId)->Option<UnitSnapshot> {
        self.units.get( unit_id).map( |e| e.value().clone()).map( |r| lock( &r).snapshot())
    }

    pub fn eta (&self, now: DateTime<Utc>, unit_id: &UnitId)->Option<DateTime<Utc>> {
        self.units.get( unit_id).map( |e| e.value().clone()).and_then( |r| lock( &r).eta( now))
    }

    /* #endregion sessions */

    /* #region telemetry *************************************************************************************/

    /// hand a reading to the owning reconciler, or buffer it if the unit is still waiting for its route
    pub fn ingest (&self, reading: &TelemetryReading)->TelemetryOutcome {
        let outcome = if let Some(reconciler) = self.units.get( &reading.unit_id).map( |e| e.value().clone()) {
            let mut r = lock( &reconciler);
            let was_reopenable = r.is_reopenable();
            let outcome = r.on_telemetry( reading);
            if was_reopenable && !r.is_completed() {
                self.arm_completion( &mut r);
                self.publish_event( TrackEvent::Reopened { unit_id: reading.unit_id.clone(), time: reading.timestamp });
            }
            drop(r);

            match outcome {
                TelemetryOutcome::Rejected(reason) => {
                    self.publish_event( TrackEvent::Rejected { unit_id: reading.unit_id.clone(), reason, time: reading.timestamp })
                }
                TelemetryOutcome::Stale => {
                    self.publish_event( TrackEvent::Stale { unit_id: reading.unit_id.clone(), time: reading.timestamp })
                }
                _ => {}
            }
            outcome

        } else if let Some(mut pending) = self.pending.get_mut( &reading.unit_id) {
            if pending.push( reading.clone()).is_some() {
                warn!(unit=%reading.unit_id, capacity=self.config.pending_capacity, "pending telemetry buffer full, dropped oldest reading");
                self.publish_event( TrackEvent::TelemetryDropped { unit_id: reading.unit_id.clone(), time: reading.timestamp });
                TelemetryOutcome::Dropped
            } else {
                TelemetryOutcome::Buffered
            }

        } else {
            debug!(unit=%reading.unit_id, "telemetry for unknown unit ignored");
            TelemetryOutcome::UnknownUnit
        };

        self.stats.record( &outcome);
        outcome
    }

    /// completion notifications are one-shot, reopened sessions get a new one
    fn arm_completion (&self, reconciler: &mut Reconciler) {
        let tx = self.event_tx.clone();
        let uid = reconciler.unit_id().clone();
        reconciler.set_on_complete( move |time| {
            info!(unit=%uid, "session completed");
            let _ = tx.send( TrackEvent::Completed { unit_id: uid, time });
        });
    }

    /// mark a unit as waiting for its route so that its telemetry gets buffered
    pub fn mark_pending (&self, unit_id: &UnitId) {
        let capacity = self.config.pending_capacity;
        self.pending.entry( unit_id.clone())
            .and_modify( |p| p.reset_wait())
            .or_insert_with( || PendingTelemetry::new( capacity));
    }

    /// units that did not get a route within the idle timeout stop buffering
    fn expire_pending (&self, now: DateTime<Utc>) {
        let mut expired: Vec<UnitId> = Vec::new();
        for mut e in self.pending.iter_mut() {
            let since = e.value_mut().waiting_since( now);
            if has_elapsed( since, now, self.config.idle_timeout) {
                expired.push( e.key().clone());
            }
        }

        for unit_id in expired {
            if let Some((_,pending)) = self.pending.remove( &unit_id) {
                let discarded = pending.len();
                self.stats.expired_pending.fetch_add( 1, Ordering::Relaxed);
                warn!(unit=%unit_id, discarded, "no route obtained in time, buffered telemetry discarded");
                self.publish_event( TrackEvent::PendingExpired { unit_id, discarded, time: now });
            }
        }
    }

    pub fn is_pending (&self, unit_id: &UnitId)->bool { self.pending.contains_key( unit_id) }

    /// give up waiting for a route, returns the number of discarded readings
    pub fn cancel_pending (&self, unit_id: &UnitId)->usize {
        self.pending.remove( unit_id).map( |(_,p)| p.len()).unwrap_or(0)
    }

    /// spawn a task that ingests readings from the given channel until it is closed
    pub fn spawn_ingest (self: &Arc<Self>, mut rx: mpsc::Receiver<TelemetryReading>)->JoinHandle<()> {
        let tracker = self.clone();
        tokio::spawn( async move {
            while let Some(reading) = rx.recv().await {
                tracker.ingest( &reading);
            }
            debug!("telemetry channel closed");
        })
    }

    /* #endregion telemetry */

    /// obtain a route for `unit_id` from the routing service, register it and start the session.
    /// While the request is in flight the unit's telemetry is buffered (bounded). If the request fails
    /// the unit stays routeless (and buffering) until a later request succeeds or [`Tracker::cancel_pending`]
    pub async fn request_route (&self, router: &dyn RoutingService, unit_id: &UnitId, request: &RouteRequest,
                                config: Option<AnimationConfig>)->Result<RouteId> {
        self.mark_pending( unit_id);

        let response = match router.fetch_route( request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(unit=%unit_id, "failed to obtain route: {}", e);
                self.publish_event( TrackEvent::RouteFailed { unit_id: unit_id.clone(), message: e.to_string() });
                return Err(e)
            }
        };

        let seq = self.route_seq.fetch_add( 1, Ordering::Relaxed) + 1;
        let route_id = RouteId::for_unit( unit_id, seq);
        let route = match response.into_route( route_id.clone()) {
            Ok(route) => route,
            Err(e) => {
                warn!(unit=%unit_id, "routing service returned unusable route: {}", e);
                self.publish_event( TrackEvent::RouteFailed { unit_id: unit_id.clone(), message: e.to_string() });
                return Err(e)
            }
        };

        info!(unit=%unit_id, route=%route_id, length=route.total_meters(), "route obtained");
        self.insert_route( route)?;
        if let Err(e) = self.start_session( Utc::now(), unit_id, &route_id, config) {
            self.routes.remove( &route_id);
            return Err(e)
        }
        Ok(route_id)
    }

    /* #region update loop ***********************************************************************************/

    /// advance all active units to `now`, evict units that have been idle for longer than the configured
    /// idle timeout and publish the resulting batch
    pub fn tick (&self, now: DateTime<Utc>)->Arc<SnapshotBatch> {
        let entries: Vec<(UnitId,SharedReconciler)> = self.units.iter().map( |e| (e.key().clone(), e.value().clone())).collect();
        let mut snapshots: Vec<UnitSnapshot> = Vec::with_capacity( entries.len());
        let mut evictions: Vec<(UnitId,SharedReconciler,RouteId)> = Vec::new();

        for (unit_id, reconciler) in entries {
            let mut r = lock( &reconciler);
            if r.is_idle() {
                if r.idle_duration( now).is_some_and( |d| d >= self.config.idle_timeout) {
                    let route_id = r.route_id().clone();
                    drop(r);
                    evictions.push( (unit_id, reconciler, route_id));
                } else {
                    snapshots.push( r.snapshot());
                }
            } else {
                snapshots.push( r.on_tick( now));
            }
        }

        for (unit_id, reconciler, route_id) in evictions {
            // the session might have been replaced concurrently
            if self.units.remove_if( &unit_id, |_,v| Arc::ptr_eq( v, &reconciler)).is_some() {
                self.release_route( &route_id);
                self.stats.evicted.fetch_add( 1, Ordering::Relaxed);
                info!(unit=%unit_id, route=%route_id, "idle unit evicted");
                self.publish_event( TrackEvent::Evicted { unit_id, route_id, time: now });
            }
        }

        self.expire_unbound_routes( now);
        self.expire_pending( now);

        snapshots.sort_by( |a,b| a.unit_id.cmp( &b.unit_id));
        let batch = Arc::new( SnapshotBatch {
            seq: self.batch_seq.fetch_add( 1, Ordering::Relaxed) + 1,
            timestamp: now,
            units: snapshots
        });

        *self.latest.lock().unwrap_or_else( |p| p.into_inner()) = Some( batch.clone());
        self.stats.ticks.fetch_add( 1, Ordering::Relaxed);
        let _ = self.snapshot_tx.send( batch.clone());
        batch
    }

    /// the last published batch
    pub fn latest_batch (&self)->Option<Arc<SnapshotBatch>> {
        self.latest.lock().unwrap_or_else( |p| p.into_inner()).clone()
    }

    /// start the fixed rate update loop on the current tokio runtime
    pub fn spawn_update_loop (self: &Arc<Self>)->UpdateLoop {
        let tracker = self.clone();
        let tick_interval = self.config.tick_interval;

        let jh = tokio::spawn( async move {
            let mut ticker = interval( tick_interval);
            ticker.set_missed_tick_behavior( MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                tracker.tick( Utc::now());
            }
        });
        info!("update loop started with interval {:?}", tick_interval);
        UpdateLoop { task: Some( jh.abort_handle()) }
    }

    /* #endregion update loop */
}

/// handle for a running update loop
pub struct UpdateLoop {
    task: Option<AbortHandle>,
}

impl UpdateLoop {
    pub fn is_running (&self)->bool { self.task.as_ref().is_some_and( |ah| !ah.is_finished()) }

    pub fn terminate (&mut self) {
        if let Some(ah) = self.task.take() {
            ah.abort();
            debug!("update loop terminated");
        }
    }
}

impl Drop for UpdateLoop {
    fn drop (&mut self) { self.terminate() }
}
