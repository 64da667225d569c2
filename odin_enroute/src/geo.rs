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

/// geodetic primitives used for route geometry: [`GeoPoint`] positions and [`Heading`] angles.
/// We store positions as `geo::Point` (x = longitude, y = latitude, both in degrees) but expose
/// lengths as `uom` quantities so that callers do not have to guess units

use std::fmt;
use serde::{Serialize,Deserialize};
use geo::{Point, Bearing, Distance, HaversineMeasure};
use uom::si::f64::Length;
use uom::si::length::meter;

/// mean earth radius in meters
pub const MEAN_EARTH_RADIUS: f64 = 6371000.0;

/// great circle metric space on a sphere with [`MEAN_EARTH_RADIUS`]
pub const SPHERE: HaversineMeasure = HaversineMeasure::new( MEAN_EARTH_RADIUS);

#[inline] pub fn meters (len: f64)->Length { Length::new::<meter>(len) }

/* #region GeoPoint ***************************************************************************************/

/// a wrapper for geo::Point that uses geodetic degrees stored as f64.
/// Note that we do not normalize on construction - routes have to reject invalid coordinates
/// and we would lose that information by wrapping/clamping
#[derive(Debug,Clone,Copy,PartialEq,Serialize,Deserialize)]
#[serde(from="LonLat", into="LonLat")]
pub struct GeoPoint(Point);

impl GeoPoint {
    pub fn from_lat_lon_degrees (lat: f64, lon: f64)->Self { GeoPoint( Point::new( lon, lat)) }
    pub fn from_lon_lat_degrees (lon: f64, lat: f64)->Self { GeoPoint( Point::new( lon, lat)) }

    #[inline] pub fn latitude_degrees (&self)->f64 { self.0.y() }
    #[inline] pub fn longitude_degrees (&self)->f64 { self.0.x() }

    pub fn point (&self)->&Point { &self.0 }

    /// finite and within [-90,90] latitude and [-180,180] longitude
    pub fn is_valid (&self)->bool {
        let lat = self.0.y();
        let lon = self.0.x();
        lat.is_finite() && lon.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
    }

    /// great circle distance on a sphere with [`MEAN_EARTH_RADIUS`]
    pub fn haversine_distance_to (&self, other: &GeoPoint)->Length {
        Length::new::<meter>( self.haversine_meters( other))
    }

    pub(crate) fn haversine_meters (&self, other: &GeoPoint)->f64 {
        SPHERE.distance( self.0, other.0)
    }

    /// initial great circle bearing (forward azimuth) from self to other
    pub fn bearing_to (&self, other: &GeoPoint)->Heading {
        Heading::from_degrees( SPHERE.bearing( self.0, other.0))
    }

    /// linear interpolation in lat/lon space. This is only meant for route segments, which are short enough
    /// so that the difference to a great circle interpolation does not matter
    pub fn interpolate (&self, other: &GeoPoint, t: f64)->GeoPoint {
        let t = t.clamp(0.0, 1.0);
        GeoPoint( Point::new(
            self.0.x() + (other.0.x() - self.0.x()) * t,
            self.0.y() + (other.0.y() - self.0.y()) * t
        ))
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.0.y(), self.0.x())
    }
}

// we accept "lon", "longitude" or "x" for longitude degrees and "lat", "latitude" or "y" for latitude degrees,
// which allows to read data that was serialized by `geo` types
#[derive(Serialize,Deserialize)]
struct LonLat {
    #[serde(alias="longitude", alias="x")]
    lon: f64,
    #[serde(alias="latitude", alias="y")]
    lat: f64
}

impl From<LonLat> for GeoPoint {
    fn from (p: LonLat)->Self { GeoPoint::from_lon_lat_degrees( p.lon, p.lat) }
}

impl From<GeoPoint> for LonLat {
    fn from (p: GeoPoint)->Self { LonLat { lon: p.0.x(), lat: p.0.y() } }
}

/* #endregion GeoPoint */

/* #region Heading ****************************************************************************************/

pub fn normalize_360 (d: f64)->f64 {
    let x = d % 360.0;
    if x < 0.0 { 360.0 + x } else { x }
}

/// direction of travel in degrees clockwise from true north, always in [0,360)
#[derive(Debug,Clone,Copy,PartialEq,PartialOrd,Serialize,Deserialize,Default)]
#[serde(transparent)]
pub struct Heading(f64);

impl Heading {
    pub fn from_degrees (deg: f64)->Self {
        let d = normalize_360(deg);
        Heading( if d >= 360.0 { 0.0 } else { d }) // -1e-17 % 360 + 360 rounds up to 360
    }
    #[inline] pub fn degrees (&self)->f64 { self.0 }

    /// smallest absolute angle between two headings, in [0,180]
    pub fn difference (&self, other: &Heading)->f64 {
        let d = (self.0 - other.0).abs();
        if d > 180.0 { 360.0 - d } else { d }
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:.1}°", self.0) }
}

/* #endregion Heading */
