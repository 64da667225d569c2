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

/// RON configuration for trackers, animation sessions and the routing client.
/// All config structs have defaults so that config files only need to specify what differs

use std::{env, fs, path::{Path,PathBuf}, time::Duration};
use serde::{Serialize,Deserialize,de::DeserializeOwned};
use tracing::{debug,warn};

use crate::errors::{Result,config_error};
use crate::scheduler::EasingProfile;

pub const CRATE_NAME: &str = "odin_enroute";
pub const CONFIGS: &str = "configs";

/// session duration used if neither the routing service nor the caller provide one
pub const DEFAULT_ROUTE_DURATION: Duration = Duration::from_secs(300);

/// per route session parameters. Distances are in meters
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub duration: Duration,          // total time to traverse the route at speed 1.0
    pub profile: EasingProfile,
    pub speed: f64,                  // initial speed multiplier
    pub gps_snapping: bool,          // if false we do not project position readings
    pub max_snap_distance: f64,      // readings further away from the route are rejected
    pub gps_accuracy_threshold: f64, // reported accuracy radius above which readings count as low accuracy
    pub off_route_threshold: f64,    // readings further away are accepted but marginal
}

impl Default for AnimationConfig {
    fn default()->Self {
        AnimationConfig {
            duration: DEFAULT_ROUTE_DURATION,
            profile: EasingProfile::Normal,
            speed: 1.0,
            gps_snapping: true,
            max_snap_distance: 100.0,
            gps_accuracy_threshold: 50.0,
            off_route_threshold: 30.0,
        }
    }
}

impl AnimationConfig {
    pub fn with_duration (mut self, duration: Duration)->Self { self.duration = duration; self }
    pub fn with_profile (mut self, profile: EasingProfile)->Self { self.profile = profile; self }
    pub fn with_speed (mut self, speed: f64)->Self { self.speed = speed; self }
    pub fn with_gps_snapping (mut self, enabled: bool)->Self { self.gps_snapping = enabled; self }

    pub fn with_thresholds (mut self, max_snap_distance: f64, gps_accuracy_threshold: f64, off_route_threshold: f64)->Self {
        self.max_snap_distance = max_snap_distance;
        self.gps_accuracy_threshold = gps_accuracy_threshold;
        self.off_route_threshold = off_route_threshold;
        self
    }

    pub fn validate (&self)->Result<()> {
        if self.duration.is_zero() { return Err( config_error!("animation duration must be positive")) }
        if !(self.speed > 0.0 && self.speed.is_finite()) { return Err( config_error!("invalid speed multiplier {}", self.speed)) }
        if !(self.max_snap_distance > 0.0) { return Err( config_error!("max_snap_distance must be positive")) }
        if !(self.gps_accuracy_threshold > 0.0) { return Err( config_error!("gps_accuracy_threshold must be positive")) }
        if !(self.off_route_threshold >= 0.0 && self.off_route_threshold <= self.max_snap_distance) {
            return Err( config_error!("off_route_threshold {} not in [0,max_snap_distance {}]", self.off_route_threshold, self.max_snap_distance))
        }
        Ok(())
    }
}

/// displayed position smoothing. Each tick moves the displayed position `step_fraction` of the remaining
/// distance towards the target, but never more than `max_step_meters`
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub step_fraction: f64,
    pub max_step_meters: f64,
    pub velocity_decay: f64, // weight of a new velocity estimate in the exponential smoothing, (0,1]
}

impl Default for SmoothingConfig {
    fn default()->Self {
        SmoothingConfig { step_fraction: 0.3, max_step_meters: 50.0, velocity_decay: 0.3 }
    }
}

#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub tick_interval: Duration,      // update loop interval
    pub telemetry_timeout: Duration,  // no accepted reading for this long puts unit into time based fallback
    pub idle_timeout: Duration,       // idle (completed or stopped) sessions are evicted after this
    pub pending_capacity: usize,      // max telemetry readings buffered per unit while waiting for a route
    pub history_capacity: usize,      // max samples kept per unit for velocity smoothing
    pub publish_capacity: usize,      // broadcast channel bounds for snapshot batches and events
    pub trust_source_progress: bool,  // accept progress values supplied by telemetry sources
    pub default_animation: AnimationConfig,
    pub smoothing: SmoothingConfig,
}

impl Default for TrackerConfig {
    fn default()->Self {
        TrackerConfig {
            tick_interval: Duration::from_millis(100),
            telemetry_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(60),
            pending_capacity: 16,
            history_capacity: 16,
            publish_capacity: 16,
            trust_source_progress: true,
            default_animation: AnimationConfig::default(),
            smoothing: SmoothingConfig::default(),
        }
    }
}

impl TrackerConfig {
    /// config errors are the only conditions we treat as fatal, hence this should be called before
    /// a tracker is created (which `Tracker::new` does)
    pub fn validate (&self)->Result<()> {
        if self.tick_interval.is_zero() || self.tick_interval > Duration::from_secs(1) {
            return Err( config_error!("tick_interval {:?} not in (0,1s]", self.tick_interval))
        }
        if self.telemetry_timeout.is_zero() { return Err( config_error!("telemetry_timeout must be positive")) }
        if self.pending_capacity == 0 { return Err( config_error!("pending_capacity must be positive")) }
        if self.history_capacity < 2 { return Err( config_error!("history_capacity must be at least 2")) }
        if self.publish_capacity == 0 { return Err( config_error!("publish_capacity must be positive")) }

        let s = &self.smoothing;
        if !(s.step_fraction > 0.0 && s.step_fraction <= 1.0) { return Err( config_error!("step_fraction {} not in (0,1]", s.step_fraction)) }
        if !(s.max_step_meters > 0.0) { return Err( config_error!("max_step_meters must be positive")) }
        if !(s.velocity_decay > 0.0 && s.velocity_decay <= 1.0) { return Err( config_error!("velocity_decay {} not in (0,1]", s.velocity_decay)) }

        self.default_animation.validate()
    }
}

/// OSRM compatible routing service client config
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RouterConfig {
    fn default()->Self {
        RouterConfig {
            base_url: "https://router.project-osrm.org".to_string(),
            profile: "driving".to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RouterConfig {
    pub fn validate (&self)->Result<()> {
        if self.base_url.is_empty() { return Err( config_error!("empty routing service base_url")) }
        if self.timeout.is_zero() { return Err( config_error!("routing service timeout must be positive")) }
        if self.initial_backoff > self.max_backoff { return Err( config_error!("initial_backoff exceeds max_backoff")) }
        Ok(())
    }
}

/* #region config lookup **********************************************************************************/

/// look up config files in (1) $ODIN_HOME/configs/odin_enroute/, (2) ~/.odin/configs/odin_enroute/ and
/// finally (3) the configs/ dir of this crate
pub fn find_config_file (filename: &str)->Option<PathBuf> {
    if let Ok(odin_home) = env::var("ODIN_HOME") {
        let path = Path::new( &odin_home).join( CONFIGS).join( CRATE_NAME).join( filename);
        if path.is_file() { return Some(path) }
    }

    if let Ok(usr_home) = env::var("HOME") {
        let path = Path::new( &usr_home).join(".odin").join( CONFIGS).join( CRATE_NAME).join( filename);
        if path.is_file() { return Some(path) }
    }

    let path = Path::new( env!("CARGO_MANIFEST_DIR")).join( CONFIGS).join( filename);
    if path.is_file() { Some(path) } else { None }
}

pub fn load_config<C> (filename: &str)->Result<C> where C: DeserializeOwned {
    match find_config_file( filename) {
        Some(path) => {
            debug!("loading config {:?}", path);
            load_config_path( &path)
        }
        None => Err( config_error!("config file {} not found", filename))
    }
}

pub fn load_config_path<C,P> (path: P)->Result<C> where C: DeserializeOwned, P: AsRef<Path> {
    let src = fs::read_to_string( path.as_ref())?;
    config_from_str( &src)
}

pub fn config_from_str<C> (src: &str)->Result<C> where C: DeserializeOwned {
    Ok( ron::from_str( src)? )
}

/// load and validate a tracker config, falling back to defaults if there is no config file
pub fn load_tracker_config (filename: &str)->Result<TrackerConfig> {
    let config: TrackerConfig = if find_config_file( filename).is_some() {
        load_config( filename)?
    } else {
        warn!("no tracker config {} found, using defaults", filename);
        TrackerConfig::default()
    };
    config.validate()?;
    Ok(config)
}

/* #endregion config lookup */
