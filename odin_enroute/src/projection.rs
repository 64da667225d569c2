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

/// closest point computation for arbitrary positions with respect to a [`Route`].
/// We project onto each segment in a local equirectangular plane (longitudes scaled with the cosine of the
/// mean segment latitude), clamp to the segment endpoints and measure the result with haversine distance

use serde::Serialize;
use uom::si::f64::Length;

use crate::geo::{GeoPoint,meters};
use crate::route::{Route,Segment};

#[derive(Debug,Clone,Copy,PartialEq,Serialize)]
#[serde(rename_all="camelCase")]
pub struct ProjectionResult {
    /// closest point on the route
    pub point: GeoPoint,
    /// haversine distance between the projected input and `point` (snap distance), in meters
    pub distance_meters: f64,
    /// distance along the route from its start to `point`, in meters
    pub along_meters: f64,
    /// along_meters / total route length
    pub progress: f64,
    pub segment_index: usize,
}

impl ProjectionResult {
    pub fn distance (&self)->Length { meters(self.distance_meters) }
    pub fn along (&self)->Length { meters(self.along_meters) }
}

/// parameter t in [0,1] of the closest point on the segment
fn segment_parameter (p: &GeoPoint, seg: &Segment)->f64 {
    if seg.is_degenerate() { return 0.0 }

    let (a, b) = (&seg.start, &seg.end);
    let cos_lat = ((a.latitude_degrees() + b.latitude_degrees()) / 2.0).to_radians().cos();

    let dx = (b.longitude_degrees() - a.longitude_degrees()) * cos_lat;
    let dy = b.latitude_degrees() - a.latitude_degrees();
    let px = (p.longitude_degrees() - a.longitude_degrees()) * cos_lat;
    let py = p.latitude_degrees() - a.latitude_degrees();

    let len_sq = dx*dx + dy*dy;
    if len_sq < 1e-20 { return 0.0 }

    ((px*dx + py*dy) / len_sq).clamp( 0.0, 1.0)
}

/// find the closest point on any of the route segments. On exact distance ties the earliest segment wins.
/// This is linear in the number of segments, which is fine since we only call it per telemetry event
pub fn project (route: &Route, point: &GeoPoint)->ProjectionResult {
    let mut best: Option<ProjectionResult> = None;

    for (segment_index, seg) in route.segments().iter().enumerate() {
        let t = segment_parameter( point, seg);
        let p = seg.start.interpolate( &seg.end, t);
        let distance_meters = point.haversine_meters( &p);

        if best.as_ref().map_or( true, |b| distance_meters < b.distance_meters) {
            let along_meters = (seg.cumulative_meters + t * seg.length_meters).min( route.total_meters());
            best = Some( ProjectionResult {
                point: p,
                distance_meters,
                along_meters,
                progress: route.progress_at_meters( along_meters),
                segment_index
            });
        }
    }

    // routes always have at least one segment
    best.unwrap_or_else( || ProjectionResult {
        point: route.first_point(),
        distance_meters: point.haversine_meters( &route.first_point()),
        along_meters: 0.0,
        progress: 0.0,
        segment_index: 0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RouteId;

    #[test]
    fn test_segment_parameter_clamps() {
        let route = Route::from_lat_lon_pairs( RouteId::new("r"), &[[0.0,0.0],[0.0,1.0]]).unwrap();
        let seg = &route.segments()[0];

        assert_eq!( segment_parameter( &GeoPoint::from_lat_lon_degrees( 0.0, -1.0), seg), 0.0);
        assert_eq!( segment_parameter( &GeoPoint::from_lat_lon_degrees( 0.0, 2.0), seg), 1.0);
        assert!( (segment_parameter( &GeoPoint::from_lat_lon_degrees( 0.3, 0.25), seg) - 0.25).abs() < 1e-12);
    }
}
