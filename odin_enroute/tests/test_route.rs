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

use uom::si::length::{meter,kilometer};
use odin_enroute::{RouteId, OdinEnrouteError};
use odin_enroute::geo::{GeoPoint, Heading, meters};
use odin_enroute::route::Route;

// run with "cargo test --test test_route -- --nocapture"

const METERS_PER_DEGREE: f64 = 111194.9266; // on MEAN_EARTH_RADIUS great circles

fn equator_route ()->Route {
    Route::from_lat_lon_pairs( RouteId::new("equator"), &[[0.0,0.0],[0.0,1.0],[0.0,2.0]]).unwrap()
}

#[test]
fn test_segments() {
    let route = equator_route();
    println!("route length: {:.3} km", route.total_length().get::<kilometer>());

    assert_eq!( route.segments().len(), 2);
    let s0 = &route.segments()[0];
    let s1 = &route.segments()[1];
    assert!( (s0.length_meters - METERS_PER_DEGREE).abs() < 0.01);
    assert_eq!( s0.cumulative_meters, 0.0);
    assert_eq!( s1.cumulative_meters, s0.length_meters);
    assert!( (route.total_meters() - 2.0 * METERS_PER_DEGREE).abs() < 0.02);
    assert_eq!( s1.cumulative_meters + s1.length_meters, route.total_meters());
}

#[test]
fn test_invalid_geometry() {
    let single = Route::from_lat_lon_pairs( RouteId::new("single"), &[[37.0,-122.0]]);
    assert!( matches!( single, Err(OdinEnrouteError::InvalidGeometry(_))));

    let empty = Route::new( RouteId::new("empty"), vec![]);
    assert!( matches!( empty, Err(OdinEnrouteError::InvalidGeometry(_))));

    let degenerate = Route::from_lat_lon_pairs( RouteId::new("degenerate"), &[[37.0,-122.0],[37.0,-122.0],[37.0,-122.0]]);
    assert!( matches!( degenerate, Err(OdinEnrouteError::InvalidGeometry(_))));

    let nan = Route::from_lat_lon_pairs( RouteId::new("nan"), &[[37.0,-122.0],[f64::NAN,-122.0]]);
    assert!( matches!( nan, Err(OdinEnrouteError::InvalidGeometry(_))));

    let out_of_range = Route::from_lat_lon_pairs( RouteId::new("range"), &[[37.0,-122.0],[95.0,-122.0]]);
    assert!( matches!( out_of_range, Err(OdinEnrouteError::InvalidGeometry(_))));

    // a repeated waypoint within an otherwise valid route is fine
    let repeated = Route::from_lat_lon_pairs( RouteId::new("repeated"), &[[0.0,0.0],[0.0,0.0],[0.0,1.0]]);
    assert!( repeated.is_ok());
}

#[test]
fn test_boundary_exactness() {
    let routes = vec![
        equator_route(),
        Route::from_lat_lon_pairs( RouteId::new("bay"), &[[37.4100,-122.0600],[37.4153,-122.0521],[37.4210,-122.0490],[37.4302,-122.0355]]).unwrap(),
        Route::from_lat_lon_pairs( RouteId::new("short"), &[[45.0,7.0],[45.0001,7.0001]]).unwrap(),
    ];

    for route in &routes {
        let first = route.waypoints()[0];
        let last = *route.waypoints().last().unwrap();

        assert_eq!( route.position_at_distance( meters(0.0)), first);
        assert_eq!( route.position_at_distance( route.total_length()), last);
        assert_eq!( route.position_at_meters( -10.0), first);
        assert_eq!( route.position_at_meters( route.total_meters() + 10.0), last);
    }
}

#[test]
fn test_interpolation() {
    let route = equator_route();

    let p = route.position_at_meters( route.total_meters() / 4.0);
    println!("position at 1/4: {}", p);
    assert!( (p.longitude_degrees() - 0.5).abs() < 1e-9);
    assert!( p.latitude_degrees().abs() < 1e-12);

    let p = route.position_at_meters( route.segments()[1].cumulative_meters);
    assert!( (p.longitude_degrees() - 1.0).abs() < 1e-12);
}

#[test]
fn test_monotonic_progress() {
    let route = Route::from_lat_lon_pairs( RouteId::new("bay"), &[[37.4100,-122.0600],[37.4153,-122.0521],[37.4153,-122.0521],[37.4210,-122.0490],[37.4302,-122.0355]]).unwrap();
    let n = 200;
    let mut last_progress = -1.0;

    for i in 0..=n {
        let d = route.total_meters() * i as f64 / n as f64;
        let progress = route.progress_at_meters( d);
        assert!( progress >= last_progress);
        assert!( (0.0..=1.0).contains( &progress));
        last_progress = progress;
    }
    assert_eq!( last_progress, 1.0);

    assert_eq!( route.distance_at_progress( 1.0).get::<meter>(), route.total_meters());
    assert_eq!( route.distance_at_progress( 2.0).get::<meter>(), route.total_meters());
    assert_eq!( route.progress_at_distance( meters(-1.0)), 0.0);
}

#[test]
fn test_heading() {
    let route = equator_route();
    let h = route.heading_at_meters( 1000.0);
    println!("heading along equator: {}", h);
    assert!( (h.degrees() - 90.0).abs() < 1e-9);

    let north = Route::from_lat_lon_pairs( RouteId::new("north"), &[[10.0,20.0],[11.0,20.0]]).unwrap();
    assert!( north.heading_at_meters( 10.0).degrees().abs() < 1e-9);

    let west = Route::from_lat_lon_pairs( RouteId::new("west"), &[[0.0,1.0],[0.0,0.0]]).unwrap();
    assert!( (west.heading_at_meters( 10.0).degrees() - 270.0).abs() < 1e-9);

    let south = Route::from_lat_lon_pairs( RouteId::new("south"), &[[1.0,0.0],[0.0,0.0]]).unwrap();
    assert!( (south.heading_at_meters( 10.0).degrees() - 180.0).abs() < 1e-9);

    // end of route uses the last segment
    assert!( (route.heading_at_distance( route.total_length()).degrees() - 90.0).abs() < 1e-9);

    // zero length segments have heading 0
    let repeated = Route::from_lat_lon_pairs( RouteId::new("repeated"), &[[0.0,0.0],[0.0,0.0],[0.0,1.0]]).unwrap();
    assert_eq!( repeated.segments()[0].heading().degrees(), 0.0);
    assert!( (repeated.heading_at_meters( 0.0).degrees() - 90.0).abs() < 1e-9);
}

#[test]
fn test_heading_normalization() {
    assert_eq!( Heading::from_degrees( -90.0).degrees(), 270.0);
    assert_eq!( Heading::from_degrees( 360.0).degrees(), 0.0);
    assert_eq!( Heading::from_degrees( 725.0).degrees(), 5.0);
    assert_eq!( Heading::from_degrees( 350.0).difference( &Heading::from_degrees( 10.0)), 20.0);
}

#[test]
fn test_geo_point_serde() {
    let p: GeoPoint = serde_json::from_str( r#"{ "longitude": -122.0, "latitude": 37.0 }"#).unwrap();
    assert_eq!( p, GeoPoint::from_lat_lon_degrees( 37.0, -122.0));

    let p: GeoPoint = serde_json::from_str( r#"{ "x": -122.0, "y": 37.0 }"#).unwrap();
    assert_eq!( p, GeoPoint::from_lat_lon_degrees( 37.0, -122.0));

    let s = serde_json::to_string( &p).unwrap();
    println!("serialized: {}", s);
    assert_eq!( s, r#"{"lon":-122.0,"lat":37.0}"#);
}

#[test]
fn test_haversine() {
    let sfo = GeoPoint::from_lat_lon_degrees( 37.6213, -122.3790);
    let lax = GeoPoint::from_lat_lon_degrees( 33.9416, -118.4085);
    let d = sfo.haversine_distance_to( &lax).get::<kilometer>();
    println!("SFO-LAX: {:.1} km", d);
    assert!( (d - 543.0).abs() < 2.0);
    assert_eq!( sfo.haversine_distance_to( &sfo).get::<meter>(), 0.0);
}

#[test]
fn test_great_circle_metric() {
    use odin_enroute::geo::MEAN_EARTH_RADIUS;

    let p0 = GeoPoint::from_lat_lon_degrees( 0.0, 0.0);
    let p1 = GeoPoint::from_lat_lon_degrees( 0.0, 1.0);
    let d = p0.haversine_distance_to( &p1).get::<meter>();
    assert!( (d - MEAN_EARTH_RADIUS * 1.0f64.to_radians()).abs() < 1e-6);
    assert!( (d - METERS_PER_DEGREE).abs() < 1e-3);

    // meridian arcs have the same length, distances are symmetric
    let p2 = GeoPoint::from_lat_lon_degrees( 1.0, 0.0);
    assert!( (p0.haversine_distance_to( &p2).get::<meter>() - d).abs() < 1e-6);
    assert!( (p1.haversine_distance_to( &p0).get::<meter>() - d).abs() < 1e-9);

    // bearings on a great circle through the pole
    let ne = p0.bearing_to( &GeoPoint::from_lat_lon_degrees( 1.0, 1.0));
    assert!( ne.degrees() > 44.9 && ne.degrees() < 45.0);
    assert!( (p1.bearing_to( &p0).degrees() - 270.0).abs() < 1e-9);
}
