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

use uom::si::length::meter;
use odin_enroute::RouteId;
use odin_enroute::geo::GeoPoint;
use odin_enroute::route::Route;
use odin_enroute::projection::project;

fn equator_route ()->Route {
    Route::from_lat_lon_pairs( RouteId::new("equator"), &[[0.0,0.0],[0.0,1.0],[0.0,2.0]]).unwrap()
}

#[test]
fn test_on_route_scenario() {
    let route = equator_route();
    let proj = project( &route, &GeoPoint::from_lat_lon_degrees( 0.0, 0.5));
    println!("projection: {:?}", proj);

    assert!( proj.distance_meters < 1e-6);
    assert!( (proj.progress - 0.25).abs() < 1e-9);
    assert_eq!( proj.segment_index, 0);
}

#[test]
fn test_on_route_idempotence() {
    let route = Route::from_lat_lon_pairs( RouteId::new("bay"),
        &[[37.4100,-122.0600],[37.4153,-122.0521],[37.4210,-122.0490],[37.4302,-122.0355]]).unwrap();
    let n = 50;

    for i in 0..=n {
        let d = route.total_meters() * i as f64 / n as f64;
        let p = route.position_at_meters( d);
        let proj = project( &route, &p);

        assert!( proj.distance_meters < 0.01, "distance {} at {}", proj.distance_meters, d);
        assert!( (proj.along_meters - d).abs() < 0.01, "along {} != {}", proj.along_meters, d);
        assert!( proj.point.haversine_distance_to( &p).get::<meter>() < 0.01);
    }
}

#[test]
fn test_perpendicular_offset() {
    let route = equator_route();
    let proj = project( &route, &GeoPoint::from_lat_lon_degrees( 0.001, 1.5));
    println!("offset projection: {:?}", proj);

    assert!( (proj.distance_meters - 111.19).abs() < 0.1);
    assert!( (proj.progress - 0.75).abs() < 1e-9);
    assert_eq!( proj.segment_index, 1);
}

#[test]
fn test_clamped_to_endpoints() {
    let route = equator_route();

    let before = project( &route, &GeoPoint::from_lat_lon_degrees( 0.0, -0.5));
    assert_eq!( before.point, route.first_point());
    assert_eq!( before.progress, 0.0);
    assert!( (before.distance_meters - 55597.46).abs() < 1.0);

    let after = project( &route, &GeoPoint::from_lat_lon_degrees( 0.0, 2.5));
    assert_eq!( after.point, route.last_point());
    assert_eq!( after.progress, 1.0);
    assert_eq!( after.segment_index, 1);
}

#[test]
fn test_earliest_segment_wins_ties() {
    // out and back on the same road
    let route = Route::from_lat_lon_pairs( RouteId::new("out-and-back"), &[[0.0,0.0],[0.0,1.0],[0.0,0.0]]).unwrap();
    let proj = project( &route, &GeoPoint::from_lat_lon_degrees( 0.001, 0.5));

    assert_eq!( proj.segment_index, 0);
    assert!( (proj.progress - 0.25).abs() < 1e-9);
}
