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

/// time based route progress. A [`ProgressScheduler`] advances a raw progress value linearly from 0 to 1 over
/// the session duration (scaled by a speed multiplier) and maps it through an [`EasingProfile`].
///
/// We do not keep a start time but an anchor `(time, raw_progress)` that is moved on each pause, resume,
/// speed change or seek. This makes all these operations continuous by construction - the raw progress
/// at the time of the operation is carried over to the new anchor.

use std::{fmt, time::Duration};
use chrono::{DateTime,Utc};
use serde::{Serialize,Deserialize};
use tracing::debug;

use crate::errors::{Result,invalid_state};

/// seconds from `from` to `to` (negative if `to` is earlier)
pub(crate) fn secs_between (from: DateTime<Utc>, to: DateTime<Utc>)->f64 {
    let d = to - from;
    match d.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => d.num_milliseconds() as f64 / 1000.0
    }
}

/// `t + secs`, or `None` if the result is not representable
pub(crate) fn checked_add_secs (t: DateTime<Utc>, secs: f64)->Option<DateTime<Utc>> {
    let us = (secs * 1_000_000.0).round();
    if !us.is_finite() || us.abs() >= i64::MAX as f64 {
        return None
    }
    t.checked_add_signed( chrono::Duration::microseconds( us as i64))
}

/* #region easing *****************************************************************************************/

/// mapping of raw (linear time) progress to route progress. All curves are monotonic with
/// `ease(0) == 0` and `ease(1) == 1`:
///   - `Instant`:   identity
///   - `Normal`:    smoothstep `3t² - 2t³`
///   - `Cautious`:  quadratic ease-in-out
///   - `Emergency`: cubic ease-out `1 - (1-t)³`
#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash,Serialize,Deserialize,Default)]
pub enum EasingProfile {
    Instant,
    #[default]
    Normal,
    Cautious,
    Emergency,
}

impl EasingProfile {
    pub fn ease (&self, t: f64)->f64 {
        let t = t.clamp( 0.0, 1.0);
        match self {
            EasingProfile::Instant => t,
            EasingProfile::Normal => t * t * (3.0 - 2.0 * t),
            EasingProfile::Cautious => {
                if t < 0.5 { 2.0 * t * t } else { 1.0 - (-2.0 * t + 2.0).powi(2) / 2.0 }
            }
            EasingProfile::Emergency => 1.0 - (1.0 - t).powi(3),
        }
    }

    /// raw progress for a given eased progress. We use bisection since not all curves have
    /// a convenient closed form inverse
    pub fn inverse (&self, p: f64)->f64 {
        let p = p.clamp( 0.0, 1.0);
        if *self == EasingProfile::Instant || p == 0.0 || p == 1.0 { return p }

        let (mut lo, mut hi) = (0.0, 1.0);
        for _ in 0..60 {
            let mid = (lo + hi) / 2.0;
            if self.ease(mid) < p { lo = mid } else { hi = mid }
        }
        (lo + hi) / 2.0
    }
}

impl fmt::Display for EasingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:?}", self) }
}

/* #endregion easing */

#[derive(Debug,Clone,Copy,PartialEq,Eq,Serialize,Deserialize)]
pub enum SchedulerState {
    Idle,
    Running,
    Paused,
    Completed,
    Stopped,
}

pub type CompletionCallback = Box<dyn FnOnce(DateTime<Utc>) + Send + Sync>;

pub struct ProgressScheduler {
    state: SchedulerState,
    duration: Duration,        // at speed 1.0
    profile: EasingProfile,
    speed: f64,
    anchor_time: DateTime<Utc>,
    anchor_raw: f64,
    on_complete: Option<CompletionCallback>,
}

impl fmt::Debug for ProgressScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressScheduler")
            .field("state", &self.state)
            .field("duration", &self.duration)
            .field("profile", &self.profile)
            .field("speed", &self.speed)
            .field("anchor_time", &self.anchor_time)
            .field("anchor_raw", &self.anchor_raw)
            .finish()
    }
}

impl Default for ProgressScheduler {
    fn default()->Self { ProgressScheduler::new() }
}

impl ProgressScheduler {
    pub fn new ()->Self {
        ProgressScheduler {
            state: SchedulerState::Idle,
            duration: Duration::ZERO,
            profile: EasingProfile::default(),
            speed: 1.0,
            anchor_time: DateTime::<Utc>::MIN_UTC,
            anchor_raw: 0.0,
            on_complete: None,
        }
    }

    /// set the completion notification, which is invoked exactly once when the scheduler enters `Completed`
    pub fn set_on_complete<F> (&mut self, f: F) where F: FnOnce(DateTime<Utc>) + Send + Sync + 'static {
        self.on_complete = Some( Box::new(f));
    }

    pub fn with_on_complete<F> (mut self, f: F)->Self where F: FnOnce(DateTime<Utc>) + Send + Sync + 'static {
        self.set_on_complete(f);
        self
    }

    pub fn state (&self)->SchedulerState { self.state }
    pub fn profile (&self)->EasingProfile { self.profile }
    pub fn speed (&self)->f64 { self.speed }
    pub fn duration (&self)->Duration { self.duration }

    pub fn is_running (&self)->bool { self.state == SchedulerState::Running }
    pub fn is_active (&self)->bool { matches!( self.state, SchedulerState::Running | SchedulerState::Paused) }

    fn effective_secs (&self)->f64 {
        self.duration.as_secs_f64() / self.speed
    }

    /// `Idle -> Running`
    pub fn start (&mut self, now: DateTime<Utc>, duration: Duration, profile: EasingProfile)->Result<()> {
        if self.state != SchedulerState::Idle {
            return Err( invalid_state!("cannot start scheduler in state {:?}", self.state))
        }
        if duration.is_zero() {
            return Err( invalid_state!("cannot start scheduler with zero duration"))
        }
        self.duration = duration;
        self.profile = profile;
        self.anchor_time = now;
        self.anchor_raw = 0.0;
        self.state = SchedulerState::Running;
        Ok(())
    }

    /// linear (uneased) progress at the given time. This does not change state
    pub fn raw_progress (&self, now: DateTime<Utc>)->f64 {
        match self.state {
            SchedulerState::Idle => 0.0,
            SchedulerState::Running => {
                let eff = self.effective_secs();
                (self.anchor_raw + secs_between( self.anchor_time, now) / eff).clamp( 0.0, 1.0)
            }
            SchedulerState::Paused | SchedulerState::Stopped => self.anchor_raw,
            SchedulerState::Completed => 1.0
        }
    }

    /// eased progress at the given time. If the raw progress reaches 1 this transitions into `Completed`
    /// and invokes the completion notification
    pub fn sample (&mut self, now: DateTime<Utc>)->f64 {
        let raw = self.raw_progress( now);
        if raw >= 1.0 && self.state == SchedulerState::Running {
            self.enter_completed( now);
        }
        self.profile.ease( raw)
    }

    /// eased progress without state transition
    pub fn peek (&self, now: DateTime<Utc>)->f64 {
        self.profile.ease( self.raw_progress( now))
    }

    /// `Running -> Paused`
    pub fn pause (&mut self, now: DateTime<Utc>)->Result<()> {
        if self.state != SchedulerState::Running {
            return Err( invalid_state!("cannot pause scheduler in state {:?}", self.state))
        }
        self.anchor_raw = self.raw_progress( now);
        self.anchor_time = now;
        self.state = SchedulerState::Paused;
        Ok(())
    }

    /// `Paused -> Running`, continuing from the progress we had when pausing
    pub fn resume (&mut self, now: DateTime<Utc>)->Result<()> {
        if self.state != SchedulerState::Paused {
            return Err( invalid_state!("cannot resume scheduler in state {:?}", self.state))
        }
        self.anchor_time = now;
        self.state = SchedulerState::Running;
        Ok(())
    }

    /// change the rate of future progress without changing the current progress
    pub fn set_speed (&mut self, now: DateTime<Utc>, multiplier: f64)->Result<()> {
        if !(multiplier > 0.0 && multiplier.is_finite()) {
            return Err( invalid_state!("invalid speed multiplier {}", multiplier))
        }
        match self.state {
            SchedulerState::Running => {
                self.anchor_raw = self.raw_progress( now);
                self.anchor_time = now;
            }
            SchedulerState::Paused | SchedulerState::Idle => {}
            state => return Err( invalid_state!("cannot change speed of scheduler in state {:?}", state))
        }
        self.speed = multiplier;
        Ok(())
    }

    /// re-position to the given eased progress, e.g. to continue from where telemetry left the unit
    pub fn seek (&mut self, now: DateTime<Utc>, progress: f64)->Result<()> {
        if !self.is_active() {
            return Err( invalid_state!("cannot seek scheduler in state {:?}", self.state))
        }
        self.anchor_raw = self.profile.inverse( progress);
        self.anchor_time = now;
        Ok(())
    }

    /// replace duration (new route) and re-position. This also re-activates a completed scheduler
    pub fn rebase (&mut self, now: DateTime<Utc>, duration: Duration, progress: f64)->Result<()> {
        if duration.is_zero() {
            return Err( invalid_state!("cannot rebase scheduler with zero duration"))
        }
        match self.state {
            SchedulerState::Running | SchedulerState::Paused => {}
            SchedulerState::Completed => self.state = SchedulerState::Running,
            state => return Err( invalid_state!("cannot rebase scheduler in state {:?}", state))
        }
        self.duration = duration;
        self.anchor_raw = self.profile.inverse( progress);
        self.anchor_time = now;
        Ok(())
    }

    /// force completion (e.g. because telemetry reported arrival). No-op if already completed
    pub fn complete (&mut self, now: DateTime<Utc>) {
        if self.is_active() {
            self.enter_completed( now);
        }
    }

    /// terminal, does not invoke the completion notification
    pub fn stop (&mut self, now: DateTime<Utc>) {
        if self.state == SchedulerState::Running {
            self.anchor_raw = self.raw_progress( now);
            self.anchor_time = now;
        }
        self.state = SchedulerState::Stopped;
        self.on_complete = None;
    }

    /// estimated time of completion if we keep the current speed. `None` if not running or too far out
    pub fn eta (&self, now: DateTime<Utc>)->Option<DateTime<Utc>> {
        match self.state {
            SchedulerState::Running => {
                let remaining = (1.0 - self.raw_progress( now)) * self.effective_secs();
                checked_add_secs( now, remaining)
            }
            _ => None
        }
    }

    fn enter_completed (&mut self, now: DateTime<Utc>) {
        self.anchor_raw = 1.0;
        self.anchor_time = now;
        self.state = SchedulerState::Completed;
        debug!("scheduler completed at {}", now);

        if let Some(f) = self.on_complete.take() {
            f(now)
        }
    }
}
