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

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use odin_enroute::{
    RouteId, RouteRequest, RoutingService, OsrmRouter, RetryingRouter,
    config::{RouterConfig, find_config_file, load_config}
};

/// query the routing service for a route between two points
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// router config file
    #[arg(long, default_value = "router.ron")]
    config: String,

    /// print the raw route response as JSON
    #[arg(short,long)]
    json: bool,

    origin_lat: f64,
    origin_lon: f64,
    dest_lat: f64,
    dest_lon: f64,
}

#[tokio::main]
async fn main()->Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter( EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config: RouterConfig = if find_config_file( &args.config).is_some() { load_config( &args.config)? } else { RouterConfig::default() };
    config.validate()?;

    let router = RetryingRouter::from_config( OsrmRouter::new( config.clone())?, &config);
    let request = RouteRequest::new( args.origin_lat, args.origin_lon, args.dest_lat, args.dest_lon);
    let response = router.fetch_route( &request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty( &response)?);
    } else {
        let route = response.clone().into_route( RouteId::new("fetched"))?;
        println!("waypoints:          {}", route.waypoints().len());
        println!("length (haversine): {:.1} m", route.total_meters());
        println!("reported distance:  {:.1} m", response.total_distance_meters);
        println!("reported duration:  {:.1} s", response.total_duration_seconds);
    }
    Ok(())
}
