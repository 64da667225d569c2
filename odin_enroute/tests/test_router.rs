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

use std::time::Duration;
use odin_enroute::{RouteId, OdinEnrouteError};
use odin_enroute::config::RouterConfig;
use odin_enroute::router::{parse_osrm_response,OsrmRouter,RetryingRouter,RouteRequest,RouteResponse,RoutingService,StaticRouter};

const OSRM_OK: &str = r#"{
  "code": "Ok",
  "routes": [{
    "geometry": { "type": "LineString", "coordinates": [[-122.06,37.41],[-122.055,37.415],[-122.05,37.42]] },
    "legs": [],
    "distance": 1500.5,
    "duration": 120.3,
    "weight": 120.3
  }],
  "waypoints": []
}"#;

fn response ()->RouteResponse {
    RouteResponse { waypoints: vec![[37.41,-122.06],[37.42,-122.05]], total_distance_meters: 1400.0, total_duration_seconds: 90.0 }
}

fn fast_retry<R: RoutingService> (inner: R, max_retries: u32)->RetryingRouter<R> {
    RetryingRouter::new( inner, max_retries, Duration::from_millis(1), Duration::from_millis(4))
}

#[test]
fn test_parse_osrm() {
    let res = parse_osrm_response( OSRM_OK).unwrap();
    println!("{:?}", res);
    assert_eq!( res.waypoints.len(), 3);
    assert_eq!( res.waypoints[0], [37.41,-122.06]); // swapped to lat,lon
    assert_eq!( res.total_distance_meters, 1500.5);
    assert_eq!( res.duration(), Some( Duration::from_secs_f64( 120.3)));

    let route = res.into_route( RouteId::new("r1")).unwrap();
    assert_eq!( route.segments().len(), 2);
    assert!( route.expected_duration().is_some());
}

#[test]
fn test_parse_osrm_failures() {
    let no_route = r#"{"code":"NoRoute","message":"Impossible route between points"}"#;
    assert!( matches!( parse_osrm_response( no_route), Err(OdinEnrouteError::RoutingServiceUnavailable(_))));

    let empty = r#"{"code":"Ok","routes":[]}"#;
    assert!( matches!( parse_osrm_response( empty), Err(OdinEnrouteError::RoutingServiceUnavailable(_))));

    let single = r#"{"code":"Ok","routes":[{"geometry":{"coordinates":[[-122.06,37.41]]},"distance":0,"duration":0}]}"#;
    assert!( matches!( parse_osrm_response( single), Err(OdinEnrouteError::RoutingServiceUnavailable(_))));

    assert!( matches!( parse_osrm_response( "{"), Err(OdinEnrouteError::RoutingServiceUnavailable(_))));
}

#[test]
fn test_response_without_duration() {
    let res = RouteResponse { total_duration_seconds: 0.0, ..response() };
    assert_eq!( res.duration(), None);
    assert!( res.into_route( RouteId::new("r1")).unwrap().expected_duration().is_none());
}

#[test]
fn test_request_url() {
    let config = RouterConfig { base_url: "http://localhost:5000/".into(), ..RouterConfig::default() };
    let router = OsrmRouter::new( config).unwrap();
    let url = router.request_url( &RouteRequest::new( 37.41, -122.06, 37.42, -122.05));
    assert_eq!( url, "http://localhost:5000/route/v1/driving/-122.06,37.41;-122.05,37.42?overview=full&geometries=geojson");
}

#[tokio::test]
async fn test_retry_recovers() {
    let router = fast_retry( StaticRouter::failing( response(), 2), 3);
    let res = router.fetch_route( &RouteRequest::new( 37.41, -122.06, 37.42, -122.05)).await.unwrap();
    assert_eq!( res, response());
    assert_eq!( router.inner().calls(), 3);
}

#[tokio::test]
async fn test_retry_gives_up() {
    let router = fast_retry( StaticRouter::unavailable(), 2);
    let res = router.fetch_route( &RouteRequest::new( 37.41, -122.06, 37.42, -122.05)).await;
    assert!( matches!( res, Err(OdinEnrouteError::RoutingServiceUnavailable(_))));
    assert_eq!( router.inner().calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_retry_backoff_schedule() {
    let config = RouterConfig { max_retries: 4, initial_backoff: Duration::from_millis(500), max_backoff: Duration::from_secs(1), ..RouterConfig::default() };
    let router = RetryingRouter::from_config( StaticRouter::failing( response(), 3), &config);

    let start = tokio::time::Instant::now();
    let res = router.fetch_route( &RouteRequest::new( 37.41, -122.06, 37.42, -122.05)).await;
    let elapsed = start.elapsed();
    println!("recovered after {:?}", elapsed);

    assert!( res.is_ok());
    assert_eq!( router.inner().calls(), 4);
    assert!( elapsed >= Duration::from_millis(2500)); // 500 + 1000 + 1000 (capped)
    assert!( elapsed < Duration::from_millis(2600));
}

#[test]
fn test_out_of_range_duration() {
    let body = r#"{"code":"Ok","routes":[{"geometry":{"coordinates":[[-122.06,37.41],[-122.05,37.42]]},"distance":1500.0,"duration":1e30}]}"#;
    let res = parse_osrm_response( body).unwrap();
    assert_eq!( res.duration(), None);

    let route = res.into_route( RouteId::new("r1")).unwrap();
    assert!( route.expected_duration().is_none());

    let res = RouteResponse { total_duration_seconds: f64::NAN, ..response() };
    assert_eq!( res.duration(), None);
}
