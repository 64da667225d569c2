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

/// the immutable route geometry. A [`Route`] is an arc-length parametrized polyline: besides the waypoints
/// we keep per-segment great circle lengths and a cumulative distance table so that we can look up
/// positions and headings at a given distance along the route in O(log n)

use std::time::Duration;
use serde::Serialize;
use uom::si::f64::Length;
use uom::si::length::meter;

use crate::RouteId;
use crate::geo::{GeoPoint,Heading,meters};
use crate::errors::{Result,invalid_geometry};

/// one leg of a route between two consecutive waypoints
#[derive(Debug,Clone,Serialize)]
#[serde(rename_all="camelCase")]
pub struct Segment {
    pub start: GeoPoint,
    pub end: GeoPoint,
    pub length_meters: f64,      // haversine distance start->end
    pub cumulative_meters: f64,  // distance from route start to segment start
}

impl Segment {
    pub fn length (&self)->Length { meters(self.length_meters) }
    pub fn cumulative (&self)->Length { meters(self.cumulative_meters) }
    pub fn is_degenerate (&self)->bool { self.length_meters <= 0.0 }

    pub fn heading (&self)->Heading {
        if self.is_degenerate() { Heading::default() } else { self.start.bearing_to( &self.end) }
    }
}

#[derive(Debug,Clone,Serialize)]
#[serde(rename_all="camelCase")]
pub struct Route {
    id: RouteId,
    waypoints: Vec<GeoPoint>,
    #[serde(skip)]
    segments: Vec<Segment>,
    total_meters: f64,
    expected_duration: Option<Duration>,
}

impl Route {
    /// create a new route from an ordered sequence of waypoints. This fails with `InvalidGeometry` if we get
    /// less than two waypoints, coordinates that are out of range or if all waypoints coincide
    pub fn new (id: RouteId, waypoints: Vec<GeoPoint>)->Result<Self> {
        if waypoints.len() < 2 {
            return Err( invalid_geometry!("route {} needs at least 2 waypoints, got {}", id, waypoints.len()))
        }
        if let Some(idx) = waypoints.iter().position(|p| !p.is_valid()) {
            return Err( invalid_geometry!("route {} has invalid waypoint {} at index {}", id, waypoints[idx], idx))
        }

        let mut segments: Vec<Segment> = Vec::with_capacity( waypoints.len()-1);
        let mut cumulative = 0.0;
        for w in waypoints.windows(2) {
            let length_meters = w[0].haversine_meters( &w[1]);
            segments.push( Segment { start: w[0], end: w[1], length_meters, cumulative_meters: cumulative });
            cumulative += length_meters;
        }

        if cumulative <= 0.0 {
            return Err( invalid_geometry!("route {} is degenerate (zero length)", id))
        }

        Ok( Route { id, waypoints, segments, total_meters: cumulative, expected_duration: None } )
    }

    /// create route from `[lat,lon]` pairs as they come from the routing service
    pub fn from_lat_lon_pairs (id: RouteId, pairs: &[[f64;2]])->Result<Self> {
        let waypoints: Vec<GeoPoint> = pairs.iter().map( |p| GeoPoint::from_lat_lon_degrees( p[0], p[1])).collect();
        Route::new( id, waypoints)
    }

    pub fn with_expected_duration (mut self, duration: Duration)->Self {
        self.expected_duration = if duration.is_zero() { None } else { Some(duration) };
        self
    }

    pub fn id (&self)->&RouteId { &self.id }
    pub fn waypoints (&self)->&[GeoPoint] { &self.waypoints }
    pub fn segments (&self)->&[Segment] { &self.segments }
    pub fn expected_duration (&self)->Option<Duration> { self.expected_duration }

    pub fn total_length (&self)->Length { meters(self.total_meters) }
    #[inline] pub fn total_meters (&self)->f64 { self.total_meters }

    pub fn first_point (&self)->GeoPoint { self.waypoints[0] }
    pub fn last_point (&self)->GeoPoint { self.waypoints[self.waypoints.len()-1] }

    /// index of the segment that contains the given distance along the route.
    /// Segment boundaries belong to the following segment, distances at or past the end map to the
    /// last non-degenerate segment
    pub fn segment_index_at (&self, dist_meters: f64)->usize {
        if dist_meters >= self.total_meters {
            self.segments.iter().rposition(|s| !s.is_degenerate()).unwrap_or( self.segments.len()-1)
        } else {
            let i = self.segments.partition_point( |s| s.cumulative_meters <= dist_meters);
            if i > 0 { i-1 } else { 0 }
        }
    }

    pub fn position_at_distance (&self, dist: Length)->GeoPoint {
        self.position_at_meters( dist.get::<meter>())
    }

    /// position at given distance, clamped to [0,total_length]. We return the exact first and last waypoints
    /// at (or beyond) the route boundaries
    pub fn position_at_meters (&self, dist_meters: f64)->GeoPoint {
        if !(dist_meters > 0.0) { // also catches NaN
            self.first_point()
        } else if dist_meters >= self.total_meters {
            self.last_point()
        } else {
            let seg = &self.segments[ self.segment_index_at( dist_meters)];
            if seg.is_degenerate() {
                seg.start
            } else {
                let t = (dist_meters - seg.cumulative_meters) / seg.length_meters;
                seg.start.interpolate( &seg.end, t)
            }
        }
    }

    pub fn heading_at_distance (&self, dist: Length)->Heading {
        self.heading_at_meters( dist.get::<meter>())
    }

    /// forward azimuth of the segment containing the given distance (0 for degenerate segments)
    pub fn heading_at_meters (&self, dist_meters: f64)->Heading {
        let d = if dist_meters.is_nan() { 0.0 } else { dist_meters.clamp( 0.0, self.total_meters) };
        self.segments[ self.segment_index_at(d)].heading()
    }

    pub fn progress_at_distance (&self, dist: Length)->f64 {
        self.progress_at_meters( dist.get::<meter>())
    }

    #[inline] pub fn progress_at_meters (&self, dist_meters: f64)->f64 {
        (dist_meters / self.total_meters).clamp( 0.0, 1.0)
    }

    pub fn distance_at_progress (&self, progress: f64)->Length {
        meters( self.meters_at_progress( progress))
    }

    #[inline] pub fn meters_at_progress (&self, progress: f64)->f64 {
        progress.clamp( 0.0, 1.0) * self.total_meters
    }
}
