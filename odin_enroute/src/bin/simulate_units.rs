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

use std::{sync::Arc, time::Duration};
use lazy_static::lazy_static;
use anyhow::Result;
use clap::Parser;
use chrono::Utc;
use tokio::{self, sync::mpsc, time::{sleep,Instant}};
use tracing::{info,warn};
use tracing_subscriber::EnvFilter;

use odin_enroute::{Tracker, TrackEvent, RouteId, UnitId, GeoPoint, config::load_tracker_config, sim::TelemetrySimulator};

/// simulate a number of units driving along synthetic routes and print the tracked snapshot batches as JSON
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// number of simulated units
    #[arg(short,long, default_value_t = 3)]
    units: usize,

    /// how long to run the simulation in seconds
    #[arg(short,long, default_value_t = 60)]
    duration: u64,

    /// unit speed in m/s
    #[arg(long, default_value_t = 15.0)]
    speed: f64,

    /// std deviation of position noise in meters
    #[arg(long, default_value_t = 12.0)]
    noise: f64,

    /// probability of missing telemetry reports
    #[arg(long, default_value_t = 0.1)]
    dropout: f64,

    /// telemetry report interval in milliseconds
    #[arg(long, default_value_t = 1000)]
    report_interval: u64,

    /// only print every n-th snapshot batch
    #[arg(long, default_value_t = 10)]
    every: u64,

    /// random seed for telemetry noise
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// tracker config file
    #[arg(long, default_value = "enroute.ron")]
    config: String,

    /// pretty print JSON output
    #[arg(short,long)]
    pretty: bool,
}

lazy_static! {
    static ref ARGS: Args = Args::parse();
}

/// a zig-zag route starting at a point that is offset for each unit
fn demo_route (idx: usize)->Vec<GeoPoint> {
    let lat0 = 37.33 + 0.01 * idx as f64;
    let lon0 = -121.89 - 0.01 * idx as f64;
    (0..8).map( |i| {
        let lat = lat0 + 0.004 * i as f64;
        let lon = lon0 + if i % 2 == 0 { 0.0 } else { 0.003 };
        GeoPoint::from_lat_lon_degrees( lat, lon)
    }).collect()
}

#[tokio::main]
async fn main()->Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter( EnvFilter::from_default_env()) // use RUST_LOG to set max level
        .with_writer( std::io::stderr)
        .init();

    let config = load_tracker_config( &ARGS.config)?;
    let tracker = Arc::new( Tracker::new( config)?);
    let now = Utc::now();

    let mut sims: Vec<TelemetrySimulator> = Vec::with_capacity( ARGS.units);
    for i in 0..ARGS.units {
        let unit_id = UnitId::from( format!("unit-{}", i+1));
        let route_id = RouteId::from( format!("demo-route-{}", i+1));
        let route = tracker.register_route( route_id.clone(), demo_route(i))?;
        tracker.start_session( now, &unit_id, &route_id, None)?;

        let sim = TelemetrySimulator::new( unit_id, route, now, ARGS.speed, ARGS.seed + i as u64)
            .with_noise( ARGS.noise)
            .with_accuracy( ARGS.noise * 1.5)
            .with_dropout( ARGS.dropout);
        sims.push( sim);
    }
    info!("simulating {} units for {}s", ARGS.units, ARGS.duration);

    let (tx, rx) = mpsc::channel( 64);
    let ingest_task = tracker.spawn_ingest( rx);

    let producer = tokio::spawn( async move {
        loop {
            sleep( Duration::from_millis( ARGS.report_interval)).await;
            let now = Utc::now();
            for sim in sims.iter_mut() {
                if let Some(reading) = sim.reading_at( now) {
                    if tx.send( reading).await.is_err() { return }
                }
            }
        }
    });

    let mut events = tracker.subscribe_events();
    tokio::spawn( async move {
        while let Ok(event) = events.recv().await {
            match &event {
                TrackEvent::Rejected{..} | TrackEvent::Stale{..} => {}
                _ => info!("event: {}", serde_json::to_string( &event).unwrap_or_default())
            }
        }
    });

    let mut batches = tracker.subscribe();
    let mut update_loop = tracker.spawn_update_loop();
    let deadline = Instant::now() + Duration::from_secs( ARGS.duration);

    loop {
        tokio::select! {
            _ = tokio::time::sleep_until( deadline) => break,
            res = batches.recv() => match res {
                Ok(batch) => {
                    if batch.seq % ARGS.every == 0 {
                        let json = if ARGS.pretty { serde_json::to_string_pretty( batch.as_ref())? } else { serde_json::to_string( batch.as_ref())? };
                        println!("{}", json);
                    }
                }
                Err(e) => warn!("snapshot receiver: {}", e)
            }
        }
    }

    update_loop.terminate();
    producer.abort();
    info!("stats: {}", serde_json::to_string( &tracker.stats())?);
    Ok(())
}
