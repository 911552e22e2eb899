//! Compact polyline wire format returned by the routing service.
//!
//! Each coordinate is a pair of zig-zag encoded deltas (latitude first) at
//! 1e-5 degree precision, written as 5-bit chunks offset by 63 with the
//! `0x20` bit as the continuation flag. Valid characters are `'?'..='~'`.

use crate::models::GeoPoint;

const PRECISION: f64 = 1e5;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PolylineError {
    #[error("polyline ends in the middle of a value at byte {offset}")]
    Truncated { offset: usize },
    #[error("invalid polyline character {found:?} at byte {offset}")]
    InvalidCharacter { offset: usize, found: char },
    #[error("polyline coordinate out of range at byte {offset}")]
    Overflow { offset: usize },
}

pub fn decode_polyline(encoded: &str) -> Result<Vec<GeoPoint>, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut coordinates = Vec::with_capacity(bytes.len() / 4);

    while index < bytes.len() {
        let offset = index;
        lat = lat
            .checked_add(decode_value(bytes, &mut index)?)
            .ok_or(PolylineError::Overflow { offset })?;
        let offset = index;
        lng = lng
            .checked_add(decode_value(bytes, &mut index)?)
            .ok_or(PolylineError::Overflow { offset })?;
        coordinates.push(GeoPoint {
            lon: lng as f64 / PRECISION,
            lat: lat as f64 / PRECISION,
        });
    }

    Ok(coordinates)
}

fn decode_value(bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let mut result: i64 = 0;
    let mut shift = 0;
    loop {
        let offset = *index;
        let &byte = bytes
            .get(offset)
            .ok_or(PolylineError::Truncated { offset })?;
        if !(63..=126).contains(&byte) {
            return Err(PolylineError::InvalidCharacter {
                offset,
                found: byte as char,
            });
        }
        *index += 1;

        let b = i64::from(byte - 63);
        if shift < 64 {
            result |= (b & 0x1f) << shift;
        }
        shift += 5;
        if b < 0x20 {
            break;
        }
    }

    Ok(if result & 1 == 1 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

pub fn encode_polyline(points: &[GeoPoint]) -> String {
    let mut out = String::with_capacity(points.len() * 8);
    let (mut prev_lat, mut prev_lng) = (0i64, 0i64);
    for point in points {
        let lat = (point.lat * PRECISION).round() as i64;
        let lng = (point.lon * PRECISION).round() as i64;
        encode_value(lat - prev_lat, &mut out);
        encode_value(lng - prev_lng, &mut out);
        prev_lat = lat;
        prev_lng = lng;
    }
    out
}

fn encode_value(delta: i64, out: &mut String) {
    let mut value = if delta < 0 { !(delta << 1) } else { delta << 1 };
    while value >= 0x20 {
        out.push(char::from((0x20 | (value & 0x1f)) as u8 + 63));
        value >>= 5;
    }
    out.push(char::from(value as u8 + 63));
}
