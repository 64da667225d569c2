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

/// the per-unit state machine that merges snapped telemetry, time based fallback progress and
/// frame-by-frame smoothing into one canonical position.
///
/// We keep two distances along the route: the *target* (where telemetry or the scheduler says the unit is)
/// and the *displayed* distance, which follows the target with a bounded step per tick. The target never
/// decreases within one route, only a reroute re-baselines it.

use std::{sync::Arc, time::Duration, collections::VecDeque};
use chrono::{DateTime,Utc};
use serde::{Serialize,Deserialize};
use tracing::{debug,info,warn};

use crate::{UnitId, RouteId, push_to_ringbuffer};
use crate::errors::{Result,invalid_state};
use crate::config::{AnimationConfig,SmoothingConfig,TrackerConfig};
use crate::geo::{GeoPoint,Heading};
use crate::route::Route;
use crate::projection::project;
use crate::snap::{SnapPolicy,SnapReason};
use crate::scheduler::{ProgressScheduler,SchedulerState,secs_between,checked_add_secs};
use crate::telemetry::{TelemetryReading,TelemetryOutcome};

/// displayed positions closer than this to the target are moved onto it
pub const SNAP_EPSILON_METERS: f64 = 0.5;

/// below this smoothed velocity (m/s) we consider a unit standing and do not estimate arrival
pub const MIN_ETA_VELOCITY: f64 = 0.1;

#[derive(Debug,Clone,Copy,PartialEq,Eq,Serialize,Deserialize)]
#[serde(rename_all="camelCase")]
pub enum AnimationStatus {
    Stopped,
    Running,
    Paused,
}

#[derive(Debug,Clone,Copy,PartialEq,Serialize)]
#[serde(rename_all="camelCase")]
pub struct TrackSample {
    pub time: DateTime<Utc>,
    pub progress: f64,
    pub along_meters: f64,
    pub position: GeoPoint,
}

/// the mutable per-unit state. This is only modified by the owning [`Reconciler`]
#[derive(Debug,Clone)]
pub struct UnitTrackState {
    pub unit_id: UnitId,
    pub route_id: RouteId,
    pub progress: f64,
    pub position: GeoPoint,
    pub heading: Heading,
    pub velocity: f64, // smoothed, in m/s
    pub last_accepted: Option<DateTime<Utc>>,
    pub last_update: DateTime<Utc>,
    pub status: AnimationStatus,
    pub is_on_route: bool,
    pub history: VecDeque<TrackSample>, // accepted readings, oldest first
}

/// what we publish for each unit on every tick
#[derive(Debug,Clone,PartialEq,Serialize)]
#[serde(rename_all="camelCase")]
pub struct UnitSnapshot {
    pub unit_id: UnitId,
    pub route_id: RouteId,
    pub latitude: f64,
    pub longitude: f64,
    pub heading_degrees: f64,
    pub progress: f64,
    pub velocity_meters_per_second: f64,
    pub timestamp: DateTime<Utc>,
    pub last_accepted_at: Option<DateTime<Utc>>,
    pub is_on_route: bool,
    pub status: AnimationStatus,
}

/// result of replacing a unit's route
#[derive(Debug,Clone,PartialEq,Serialize)]
#[serde(rename_all="camelCase")]
pub struct RerouteReport {
    pub unit_id: UnitId,
    pub old_route_id: RouteId,
    pub new_route_id: RouteId,
    pub old_progress: f64,
    pub new_progress: f64,
    /// distance between the last displayed position and its projection onto the new route
    pub displacement_meters: f64,
}

pub struct Reconciler {
    state: UnitTrackState,
    route: Arc<Route>,
    config: AnimationConfig,
    policy: SnapPolicy,
    smoothing: SmoothingConfig,
    telemetry_timeout_secs: f64,
    history_capacity: usize,
    trust_source_progress: bool,

    scheduler: ProgressScheduler,
    target_meters: f64,
    displayed_meters: f64,
    fallback: bool,
    completed_by_schedule: bool, // ran out of schedule without telemetry confirming arrival
    last_reading_rejected: bool,
    last_tick: Option<DateTime<Utc>>,
    idle_since: Option<DateTime<Utc>>,
}

impl Reconciler {
    pub fn new (unit_id: UnitId, route: Arc<Route>, config: AnimationConfig, tracker_config: &TrackerConfig)->Self {
        let position = route.first_point();
        let heading = route.heading_at_meters( 0.0);

        let state = UnitTrackState {
            unit_id,
            route_id: route.id().clone(),
            progress: 0.0,
            position,
            heading,
            velocity: 0.0,
            last_accepted: None,
            last_update: DateTime::<Utc>::MIN_UTC,
            status: AnimationStatus::Stopped,
            is_on_route: false,
            history: VecDeque::with_capacity( tracker_config.history_capacity),
        };

        Reconciler {
            state,
            route,
            policy: SnapPolicy::from( &config),
            config,
            smoothing: tracker_config.smoothing.clone(),
            telemetry_timeout_secs: tracker_config.telemetry_timeout.as_secs_f64(),
            history_capacity: tracker_config.history_capacity.max(2),
            trust_source_progress: tracker_config.trust_source_progress,
            scheduler: ProgressScheduler::new(),
            target_meters: 0.0,
            displayed_meters: 0.0,
            fallback: true,
            completed_by_schedule: false,
            last_reading_rejected: false,
            last_tick: None,
            idle_since: None,
        }
    }

    /// set the notification that is invoked once when the session reaches the end of its route
    pub fn set_on_complete<F> (&mut self, f: F) where F: FnOnce(DateTime<Utc>) + Send + Sync + 'static {
        self.scheduler.set_on_complete( f);
    }

    pub fn unit_id (&self)->&UnitId { &self.state.unit_id }
    pub fn route_id (&self)->&RouteId { &self.state.route_id }
    pub fn route (&self)->&Arc<Route> { &self.route }
    pub fn config (&self)->&AnimationConfig { &self.config }
    pub fn state (&self)->&UnitTrackState { &self.state }
    pub fn status (&self)->AnimationStatus { self.state.status }
    pub fn scheduler_state (&self)->SchedulerState { self.scheduler.state() }
    pub fn is_fallback (&self)->bool { self.fallback }

    pub fn target_progress (&self)->f64 { self.route.progress_at_meters( self.target_meters) }
    pub fn displayed_progress (&self)->f64 { self.route.progress_at_meters( self.displayed_meters) }

    /// the session duration: explicit config, or what the routing service estimated for this route
    fn session_duration (&self)->Duration {
        self.route.expected_duration().unwrap_or( self.config.duration)
    }

    /* #region control ****************************************************************************************/

    pub fn start (&mut self, now: DateTime<Utc>)->Result<()> {
        if self.scheduler.state() != SchedulerState::Idle {
            return Err( invalid_state!("session for unit {} already started", self.state.unit_id))
        }
        self.scheduler.start( now, self.session_duration(), self.config.profile)?;
        if self.config.speed != 1.0 {
            self.scheduler.set_speed( now, self.config.speed)?;
        }

        self.state.status = AnimationStatus::Running;
        self.state.last_update = now;
        self.last_tick = Some(now);
        self.update_display_state();
        info!(unit=%self.state.unit_id, route=%self.state.route_id, "session started");
        Ok(())
    }

    pub fn pause (&mut self, now: DateTime<Utc>)->Result<()> {
        if self.state.status != AnimationStatus::Running {
            return Err( invalid_state!("cannot pause unit {} in state {:?}", self.state.unit_id, self.state.status))
        }
        if self.scheduler.is_running() {
            self.scheduler.pause( now)?;
        }
        self.state.status = AnimationStatus::Paused;
        self.state.velocity = 0.0;
        debug!(unit=%self.state.unit_id, "session paused");
        Ok(())
    }

    pub fn resume (&mut self, now: DateTime<Utc>)->Result<()> {
        if self.state.status != AnimationStatus::Paused {
            return Err( invalid_state!("cannot resume unit {} in state {:?}", self.state.unit_id, self.state.status))
        }
        if self.scheduler.state() == SchedulerState::Paused {
            self.scheduler.resume( now)?;
        }
        self.state.status = AnimationStatus::Running;
        self.last_tick = Some(now);
        debug!(unit=%self.state.unit_id, "session resumed");
        Ok(())
    }

    pub fn set_speed (&mut self, now: DateTime<Utc>, multiplier: f64)->Result<()> {
        if self.state.status == AnimationStatus::Stopped {
            return Err( invalid_state!("cannot change speed of stopped unit {}", self.state.unit_id))
        }
        if !(multiplier > 0.0 && multiplier.is_finite()) {
            return Err( invalid_state!("invalid speed multiplier {}", multiplier))
        }
        if self.scheduler.is_active() {
            self.scheduler.set_speed( now, multiplier)?;
        }
        self.config.speed = multiplier;
        debug!(unit=%self.state.unit_id, speed=multiplier, "speed changed");
        Ok(())
    }

    pub fn stop (&mut self, now: DateTime<Utc>) {
        self.scheduler.stop( now);
        self.state.status = AnimationStatus::Stopped;
        self.state.velocity = 0.0;
        self.state.last_update = now;
        self.idle_since = Some(now);
        info!(unit=%self.state.unit_id, route=%self.state.route_id, "session stopped");
    }

    /// switch to a new route. The last displayed position is projected onto the new route and becomes the
    /// new baseline for both target and display, so the unit moves at most by the projection distance
    pub fn reroute (&mut self, now: DateTime<Utc>, new_route: Arc<Route>)->Result<RerouteReport> {
        if self.scheduler.state() == SchedulerState::Stopped || self.scheduler.state() == SchedulerState::Idle {
            return Err( invalid_state!("cannot reroute unit {} without active session", self.state.unit_id))
        }

        let old_route_id = self.state.route_id.clone();
        let old_progress = self.displayed_progress();
        let proj = project( &new_route, &self.state.position);

        self.route = new_route;
        self.state.route_id = self.route.id().clone();
        self.target_meters = proj.along_meters;
        self.displayed_meters = proj.along_meters;
        self.state.history.clear(); // distances along the old route are meaningless now
        self.completed_by_schedule = false;

        let was_completed = self.scheduler.state() == SchedulerState::Completed;
        self.scheduler.rebase( now, self.session_duration(), proj.progress)?;
        if was_completed {
            self.state.status = AnimationStatus::Running;
            self.idle_since = None;
            self.last_tick = Some(now);
        }

        self.state.last_update = now;
        self.update_display_state();

        let report = RerouteReport {
            unit_id: self.state.unit_id.clone(),
            old_route_id,
            new_route_id: self.state.route_id.clone(),
            old_progress,
            new_progress: proj.progress,
            displacement_meters: proj.distance_meters,
        };
        info!(unit=%report.unit_id, old_route=%report.old_route_id, new_route=%report.new_route_id,
              displacement=report.displacement_meters, "session rerouted");
        Ok(report)
    }

    /* #endregion control */

    /* #region telemetry *************************************************************************************/

    pub fn on_telemetry (&mut self, reading: &TelemetryReading)->TelemetryOutcome {
        let inactive = !self.is_reopenable() && (self.state.status == AnimationStatus::Stopped
            || matches!( self.scheduler.state(), SchedulerState::Idle | SchedulerState::Stopped));
        if inactive {
            return TelemetryOutcome::Inactive
        }
        if self.state.last_accepted.is_some_and( |t| reading.timestamp <= t) {
            debug!(unit=%self.state.unit_id, timestamp=%reading.timestamp, "stale telemetry dropped");
            return TelemetryOutcome::Stale
        }

        if self.trust_source_progress {
            if let Some(progress) = reading.progress {
                if !(0.0..=1.0).contains( &progress) { // also rejects NaN
                    warn!(unit=%self.state.unit_id, progress, "invalid source progress ignored");
                    return TelemetryOutcome::Invalid
                }
                let along = self.route.meters_at_progress( progress);
                self.apply_accepted( reading.timestamp, along);
                self.last_reading_rejected = false;
                return TelemetryOutcome::DirectProgress
            }
        }

        if !self.config.gps_snapping {
            return TelemetryOutcome::SnappingDisabled
        }
        if !reading.has_valid_position() {
            warn!(unit=%self.state.unit_id, lat=reading.latitude, lon=reading.longitude, "invalid telemetry position ignored");
            return TelemetryOutcome::Invalid
        }

        let proj = project( &self.route, &reading.position());
        let decision = self.policy.evaluate( &proj, reading);

        if decision.accept {
            self.apply_accepted( reading.timestamp, proj.along_meters);
            self.last_reading_rejected = false;
            TelemetryOutcome::Accepted( decision.reason)
        } else {
            self.last_reading_rejected = true;
            self.state.is_on_route = false;
            debug!(unit=%self.state.unit_id, reason=%decision.reason, distance=proj.distance_meters, "telemetry rejected");
            TelemetryOutcome::Rejected( decision.reason)
        }
    }

    /// a session whose schedule ran out during a telemetry outage can be reopened by new telemetry
    pub fn is_reopenable (&self)->bool {
        self.completed_by_schedule && self.scheduler.state() == SchedulerState::Completed
    }

    fn apply_accepted (&mut self, time: DateTime<Utc>, along_meters: f64) {
        // a target that was advanced by the schedule is only an estimate, telemetry overrides it
        let new_target = if self.fallback { along_meters } else { self.target_meters.max( along_meters) };

        if let Some(prev) = self.state.history.back() {
            let dt = secs_between( prev.time, time);
            if dt > 0.0 {
                let v = (new_target - prev.along_meters).max(0.0) / dt;
                self.state.velocity = self.smooth_velocity( v);
            }
        }

        let sample = TrackSample {
            time,
            progress: self.route.progress_at_meters( new_target),
            along_meters: new_target,
            position: self.route.position_at_meters( new_target),
        };
        push_to_ringbuffer( &mut self.state.history, self.history_capacity, sample);

        self.target_meters = new_target;
        self.state.last_accepted = Some(time);
        self.state.is_on_route = true;

        if self.fallback {
            self.fallback = false;
            debug!(unit=%self.state.unit_id, "telemetry resumed");
        }

        if self.target_meters >= self.route.total_meters() - SNAP_EPSILON_METERS {
            self.target_meters = self.route.total_meters();
            self.scheduler.complete( time);
            self.completed_by_schedule = false;
        } else if self.is_reopenable() {
            self.reopen( time);
        }
    }

    fn reopen (&mut self, time: DateTime<Utc>) {
        let progress = self.target_progress();
        match self.scheduler.rebase( time, self.session_duration(), progress) {
            Ok(()) => {
                self.completed_by_schedule = false;
                if self.state.status == AnimationStatus::Stopped {
                    self.state.status = AnimationStatus::Running;
                    self.idle_since = None;
                    self.last_tick = Some(time);
                }
                info!(unit=%self.state.unit_id, progress, "telemetry after schedule completion, session reopened");
            }
            Err(e) => warn!(unit=%self.state.unit_id, "failed to reopen session: {}", e)
        }
    }

    fn smooth_velocity (&self, v: f64)->f64 {
        let w = self.smoothing.velocity_decay;
        self.state.velocity + w * (v - self.state.velocity)
    }

    /* #endregion telemetry */

    /* #region tick ******************************************************************************************/

    fn telemetry_timed_out (&self, now: DateTime<Utc>)->bool {
        match self.state.last_accepted {
            Some(t) => secs_between( t, now) > self.telemetry_timeout_secs,
            None => true // no telemetry yet, follow the schedule
        }
    }

    /// advance the unit to `now` and return its snapshot
    pub fn on_tick (&mut self, now: DateTime<Utc>)->UnitSnapshot {
        if self.state.status != AnimationStatus::Running {
            return self.snapshot()
        }
        let dt = self.last_tick.map( |t| secs_between( t, now)).unwrap_or(0.0);

        if self.telemetry_timed_out( now) {
            if !self.fallback {
                self.fallback = true;
                if self.scheduler.is_active() {
                    let _ = self.scheduler.seek( now, self.target_progress());
                }
                info!(unit=%self.state.unit_id, "no recent telemetry, continuing on schedule");
            }

            if self.scheduler.is_running() {
                let p = self.scheduler.sample( now);
                if self.scheduler.state() == SchedulerState::Completed {
                    self.completed_by_schedule = true;
                }
                let new_target = self.target_meters.max( self.route.meters_at_progress( p));
                if dt > 0.0 {
                    let v = (new_target - self.target_meters) / dt;
                    self.state.velocity = self.smooth_velocity( v);
                }
                self.target_meters = new_target;
            }
        }

        self.step_display();

        if self.scheduler.state() == SchedulerState::Completed && self.displayed_meters >= self.route.total_meters() {
            self.state.status = AnimationStatus::Stopped;
            self.state.velocity = 0.0;
            self.idle_since = Some(now);
            info!(unit=%self.state.unit_id, route=%self.state.route_id, "unit reached end of route");
        }

        self.last_tick = Some(now);
        self.state.last_update = now;
        self.update_display_state();
        self.snapshot()
    }

    /// move the displayed distance towards the target by a bounded step
    fn step_display (&mut self) {
        let remaining = self.target_meters - self.displayed_meters;
        if remaining.abs() <= SNAP_EPSILON_METERS {
            self.displayed_meters = self.target_meters;
        } else {
            let max_step = self.smoothing.max_step_meters;
            let step = (remaining * self.smoothing.step_fraction).clamp( -max_step, max_step);
            self.displayed_meters += step;
        }
    }

    fn update_display_state (&mut self) {
        let d = self.displayed_meters;
        self.state.progress = self.route.progress_at_meters( d);
        self.state.position = self.route.position_at_meters( d);
        self.state.heading = self.route.heading_at_meters( d);
        self.state.is_on_route = !self.fallback && !self.last_reading_rejected && self.state.last_accepted.is_some();
    }

    /* #endregion tick */

    /// pure read of the current state
    pub fn snapshot (&self)->UnitSnapshot {
        let s = &self.state;
        UnitSnapshot {
            unit_id: s.unit_id.clone(),
            route_id: s.route_id.clone(),
            latitude: s.position.latitude_degrees(),
            longitude: s.position.longitude_degrees(),
            heading_degrees: s.heading.degrees(),
            progress: s.progress,
            velocity_meters_per_second: s.velocity,
            timestamp: s.last_update,
            last_accepted_at: s.last_accepted,
            is_on_route: s.is_on_route,
            status: s.status,
        }
    }

    /// idle units (finished or stopped) are not recomputed and are eventually evicted
    pub fn is_idle (&self)->bool { self.state.status == AnimationStatus::Stopped }

    pub fn idle_duration (&self, now: DateTime<Utc>)->Option<Duration> {
        self.idle_since.and_then( |t| (now - t).to_std().ok())
    }

    /// true if the session reached the end of its route, confirmed by telemetry or by running out of schedule
    pub fn is_completed (&self)->bool { self.scheduler.state() == SchedulerState::Completed }

    /// estimated arrival time, based on the current velocity if we have telemetry or the schedule otherwise
    pub fn eta (&self, now: DateTime<Utc>)->Option<DateTime<Utc>> {
        if self.state.status != AnimationStatus::Running { return None }
        if self.fallback {
            self.scheduler.eta( now)
        } else if self.state.velocity >= MIN_ETA_VELOCITY {
            let remaining = self.route.total_meters() - self.displayed_meters;
            checked_add_secs( now, remaining / self.state.velocity)
        } else {
            None
        }
    }
}
