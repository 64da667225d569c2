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

/// synthetic telemetry: a unit driving along a route at constant speed, with gaussian position noise
/// and random dropouts. Used by the `simulate_units` demo and tests

use std::sync::Arc;
use chrono::{DateTime,Utc};
use rand::{Rng,SeedableRng,rngs::StdRng};
use rand_distr::{Distribution,Normal};

use crate::UnitId;
use crate::geo::{GeoPoint,MEAN_EARTH_RADIUS};
use crate::route::Route;
use crate::scheduler::secs_between;
use crate::telemetry::TelemetryReading;

pub struct TelemetrySimulator {
    unit_id: UnitId,
    route: Arc<Route>,
    start: DateTime<Utc>,
    speed: f64,               // m/s
    noise: Option<Normal<f64>>, // position noise in meters
    accuracy: Option<f64>,    // reported accuracy radius
    dropout_probability: f64, // probability to not report anything
    report_progress: bool,
    rng: StdRng,
}

impl TelemetrySimulator {
    pub fn new (unit_id: UnitId, route: Arc<Route>, start: DateTime<Utc>, speed: f64, seed: u64)->Self {
        TelemetrySimulator {
            unit_id, route, start, speed,
            noise: None,
            accuracy: None,
            dropout_probability: 0.0,
            report_progress: false,
            rng: StdRng::seed_from_u64( seed),
        }
    }

    pub fn with_noise (mut self, sigma_meters: f64)->Self { self.noise = Normal::new( 0.0, sigma_meters.max(0.0)).ok(); self }
    pub fn with_accuracy (mut self, accuracy_meters: f64)->Self { self.accuracy = Some(accuracy_meters); self }
    pub fn with_dropout (mut self, probability: f64)->Self { self.dropout_probability = probability.clamp(0.0,1.0); self }
    pub fn with_progress_reports (mut self, report: bool)->Self { self.report_progress = report; self }

    pub fn unit_id (&self)->&UnitId { &self.unit_id }

    /// true distance along the route at `now`
    pub fn true_meters (&self, now: DateTime<Utc>)->f64 {
        (secs_between( self.start, now) * self.speed).clamp( 0.0, self.route.total_meters())
    }

    pub fn true_position (&self, now: DateTime<Utc>)->GeoPoint {
        self.route.position_at_meters( self.true_meters( now))
    }

    pub fn is_finished (&self, now: DateTime<Utc>)->bool {
        self.true_meters( now) >= self.route.total_meters()
    }

    /// the next reading, or `None` for a dropout
    pub fn reading_at (&mut self, now: DateTime<Utc>)->Option<TelemetryReading> {
        if self.dropout_probability > 0.0 && self.rng.random::<f64>() < self.dropout_probability {
            return None
        }

        let along = self.true_meters( now);
        let p = self.route.position_at_meters( along);
        let (north, east) = match self.noise {
            Some(normal) => (normal.sample( &mut self.rng), normal.sample( &mut self.rng)),
            None => (0.0, 0.0)
        };

        let lat = p.latitude_degrees() + (north / MEAN_EARTH_RADIUS).to_degrees();
        let lon = p.longitude_degrees() + (east / (MEAN_EARTH_RADIUS * p.latitude_degrees().to_radians().cos())).to_degrees();

        let mut reading = TelemetryReading::new( self.unit_id.clone(), lat, lon, now);
        if let Some(acc) = self.accuracy {
            reading = reading.with_accuracy( acc);
        }
        if self.report_progress {
            reading = reading.with_progress( self.route.progress_at_meters( along));
        }
        Some(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::RouteId;

    fn route ()->Arc<Route> {
        Arc::new( Route::from_lat_lon_pairs( RouteId::new("r"), &[[0.0,0.0],[0.0,0.01]]).unwrap())
    }

    #[test]
    fn test_noise_free_readings_are_on_route() {
        let t0 = Utc.with_ymd_and_hms( 2025, 3, 1, 12, 0, 0).unwrap();
        let mut sim = TelemetrySimulator::new( UnitId::new("E1"), route(), t0, 10.0, 1).with_progress_reports( true);
        let now = t0 + chrono::Duration::seconds(10);

        let r = sim.reading_at( now).unwrap();
        assert!( r.latitude.abs() < 1e-12);
        assert!( (sim.true_meters( now) - 100.0).abs() < 1e-9);
        assert!( r.progress.is_some_and( |p| p > 0.0 && p < 1.0));
        assert!( sim.is_finished( t0 + chrono::Duration::seconds(200)));
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let t0 = Utc.with_ymd_and_hms( 2025, 3, 1, 12, 0, 0).unwrap();
        let mut a = TelemetrySimulator::new( UnitId::new("E1"), route(), t0, 10.0, 7).with_noise( 5.0);
        let mut b = TelemetrySimulator::new( UnitId::new("E1"), route(), t0, 10.0, 7).with_noise( 5.0);
        let now = t0 + chrono::Duration::seconds(3);
        assert_eq!( a.reading_at( now), b.reading_at( now));

        let mut silent = TelemetrySimulator::new( UnitId::new("E1"), route(), t0, 10.0, 7).with_dropout( 1.0);
        assert!( silent.reading_at( now).is_none());
    }

    #[test]
    fn test_noise_spread() {
        let t0 = Utc.with_ymd_and_hms( 2025, 3, 1, 12, 0, 0).unwrap();
        let mut sim = TelemetrySimulator::new( UnitId::new("E1"), route(), t0, 0.0, 3).with_noise( 10.0);

        let n = 4000;
        let norths: Vec<f64> = (0..n).map( |i| {
            let r = sim.reading_at( t0 + chrono::Duration::seconds(i)).unwrap();
            r.latitude.to_radians() * MEAN_EARTH_RADIUS
        }).collect();
        let mean = norths.iter().sum::<f64>() / n as f64;
        let sigma = (norths.iter().map( |x| (x - mean).powi(2)).sum::<f64>() / n as f64).sqrt();
        println!("noise mean: {:.3} m, sigma: {:.3} m", mean, sigma);
        assert!( mean.abs() < 1.0);
        assert!( (sigma - 10.0).abs() < 1.0);
    }
}
