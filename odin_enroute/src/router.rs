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

/// the boundary to the external routing service that turns origin/destination pairs into route geometries.
/// Routing failures are retried here (see [`RetryingRouter`]), the tracker only sees "no route yet"

use std::{sync::{Arc,atomic::{AtomicU32,Ordering}}, time::Duration};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Serialize,Deserialize};
use tokio::time::sleep;
use tracing::{debug,info,warn};

use crate::RouteId;
use crate::config::RouterConfig;
use crate::errors::{OdinEnrouteError,Result,routing_unavailable};
use crate::route::Route;

#[derive(Debug,Clone,Copy,PartialEq,Serialize,Deserialize)]
#[serde(rename_all="camelCase")]
pub struct RouteRequest {
    pub origin_lat: f64,
    pub origin_lon: f64,
    pub dest_lat: f64,
    pub dest_lon: f64,
}

impl RouteRequest {
    pub fn new (origin_lat: f64, origin_lon: f64, dest_lat: f64, dest_lon: f64)->Self {
        RouteRequest { origin_lat, origin_lon, dest_lat, dest_lon }
    }
}

/// routing service result. Waypoints are `[lat,lon]` pairs
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
#[serde(rename_all="camelCase")]
pub struct RouteResponse {
    pub waypoints: Vec<[f64;2]>,
    pub total_distance_meters: f64,
    pub total_duration_seconds: f64,
}

impl RouteResponse {
    /// the reported duration, if it is usable (positive and representable)
    pub fn duration (&self)->Option<Duration> {
        if self.total_duration_seconds > 0.0 {
            Duration::try_from_secs_f64( self.total_duration_seconds).ok()
        } else {
            None
        }
    }

    pub fn into_route (self, id: RouteId)->Result<Route> {
        let route = Route::from_lat_lon_pairs( id, &self.waypoints)?;
        Ok( match self.duration() {
            Some(d) => route.with_expected_duration(d),
            None => route
        })
    }
}

#[async_trait]
pub trait RoutingService: Send + Sync {
    async fn fetch_route (&self, request: &RouteRequest)->Result<RouteResponse>;
}

/* #region OSRM *******************************************************************************************/

#[derive(Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

#[derive(Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64;2]>, // GeoJSON order: [lon,lat]
}

/// parse an OSRM `route` service response (with `geometries=geojson`). We only use the first route
pub fn parse_osrm_response (body: &str)->Result<RouteResponse> {
    let response: OsrmResponse = serde_json::from_str( body)
        .map_err( |e| routing_unavailable!("malformed routing response: {}", e))?;

    if response.code != "Ok" {
        return Err( routing_unavailable!("routing service returned {}: {}", response.code, response.message.unwrap_or_default()))
    }

    let route = response.routes.into_iter().next().ok_or_else( || routing_unavailable!("no route found"))?;
    if route.geometry.coordinates.len() < 2 {
        return Err( routing_unavailable!("empty route geometry"))
    }

    Ok( RouteResponse {
        waypoints: route.geometry.coordinates.iter().map( |c| [c[1], c[0]]).collect(),
        total_distance_meters: route.distance,
        total_duration_seconds: route.duration,
    })
}

pub struct OsrmRouter {
    config: RouterConfig,
    client: Client,
}

impl OsrmRouter {
    pub fn new (config: RouterConfig)->Result<Self> {
        let client = Client::builder().timeout( config.timeout).build()?;
        Ok( OsrmRouter { config, client } )
    }

    pub fn request_url (&self, request: &RouteRequest)->String {
        format!("{}/route/v1/{}/{},{};{},{}?overview=full&geometries=geojson",
            self.config.base_url.trim_end_matches('/'), self.config.profile,
            request.origin_lon, request.origin_lat, request.dest_lon, request.dest_lat)
    }
}

#[async_trait]
impl RoutingService for OsrmRouter {
    async fn fetch_route (&self, request: &RouteRequest)->Result<RouteResponse> {
        let url = self.request_url( request);
        debug!("requesting route {}", url);

        let response = self.client.get( &url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err( routing_unavailable!("routing service status {}", status))
        }

        let body = response.text().await?;
        parse_osrm_response( &body)
    }
}

/* #endregion OSRM */

/// wraps another [`RoutingService`] and retries retryable failures with exponential backoff
pub struct RetryingRouter<R> where R: RoutingService {
    inner: R,
    max_retries: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl<R> RetryingRouter<R> where R: RoutingService {
    pub fn new (inner: R, max_retries: u32, initial_backoff: Duration, max_backoff: Duration)->Self {
        RetryingRouter { inner, max_retries, initial_backoff, max_backoff }
    }

    pub fn from_config (inner: R, config: &RouterConfig)->Self {
        RetryingRouter::new( inner, config.max_retries, config.initial_backoff, config.max_backoff)
    }

    pub fn inner (&self)->&R { &self.inner }
}

#[async_trait]
impl<R> RoutingService for RetryingRouter<R> where R: RoutingService {
    async fn fetch_route (&self, request: &RouteRequest)->Result<RouteResponse> {
        let mut backoff = self.initial_backoff;
        let mut attempt = 0;

        loop {
            match self.inner.fetch_route( request).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!("routing request failed ({}), retry {}/{} in {:?}", e, attempt, self.max_retries, backoff);
                    sleep( backoff).await;
                    backoff = (backoff * 2).min( self.max_backoff);
                }
                Err(e) => return Err(e)
            }
        }
    }
}

/// a routing service that returns a fixed response, optionally failing the first n calls.
/// This is used for offline operation and tests
pub struct StaticRouter {
    response: Option<RouteResponse>,
    failures: AtomicU32,
    calls: AtomicU32,
}

impl StaticRouter {
    pub fn new (response: RouteResponse)->Self {
        StaticRouter { response: Some(response), failures: AtomicU32::new(0), calls: AtomicU32::new(0) }
    }

    /// a router that fails the first `n` requests before returning the response
    pub fn failing (response: RouteResponse, n: u32)->Self {
        StaticRouter { response: Some(response), failures: AtomicU32::new(n), calls: AtomicU32::new(0) }
    }

    /// a router that never returns a route
    pub fn unavailable ()->Self {
        StaticRouter { response: None, failures: AtomicU32::new(0), calls: AtomicU32::new(0) }
    }

    pub fn calls (&self)->u32 { self.calls.load( Ordering::Relaxed) }
}

#[async_trait]
impl RoutingService for StaticRouter {
    async fn fetch_route (&self, request: &RouteRequest)->Result<RouteResponse> {
        self.calls.fetch_add( 1, Ordering::Relaxed);

        let failing = self.failures.fetch_update( Ordering::Relaxed, Ordering::Relaxed, |n| if n > 0 { Some(n-1) } else { None }).is_ok();
        if failing {
            return Err( routing_unavailable!("simulated routing failure"))
        }

        self.response.clone().ok_or_else( || routing_unavailable!("no route available"))
    }
}
