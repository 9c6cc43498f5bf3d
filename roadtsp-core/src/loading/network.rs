//! Decoding of uploaded networks into plain geometries
//!
//! Decoders only translate encodings; line validation happens in
//! [`super::build_network`].

use std::str::FromStr;

use geo::Geometry;
use geojson::GeoJson;
use wkt::TryFromWkt;

use crate::Error;

/// Decodes a GeoJSON `FeatureCollection` into one geometry per feature
///
/// # Errors
///
/// [`Error::InputFormat`] if the text is not GeoJSON or not a feature
/// collection, [`Error::InvalidGeometry`] for a feature without a usable
/// geometry.
pub fn decode_geojson_network(text: &str) -> Result<Vec<Geometry<f64>>, Error> {
    let text = text.trim_start_matches('\u{feff}');
    let geojson = GeoJson::from_str(text)
        .map_err(|e| Error::InputFormat(format!("network is not valid GeoJSON: {e}")))?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(Error::InputFormat(
            "network must be a GeoJSON FeatureCollection".to_string(),
        ));
    };

    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            let geometry = feature.geometry.ok_or_else(|| Error::InvalidGeometry {
                index,
                reason: "feature has no geometry".to_string(),
            })?;
            Geometry::<f64>::try_from(geometry).map_err(|e| Error::InvalidGeometry {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Decodes WKT text; a `MULTILINESTRING` or `GEOMETRYCOLLECTION` yields one
/// geometry per member
pub fn decode_wkt_network(text: &str) -> Result<Vec<Geometry<f64>>, Error> {
    let geometry = Geometry::<f64>::try_from_wkt_str(text.trim())
        .map_err(|e| Error::InputFormat(format!("network is not valid WKT: {e}")))?;

    Ok(match geometry {
        Geometry::MultiLineString(lines) => lines.0.into_iter().map(Geometry::LineString).collect(),
        Geometry::GeometryCollection(collection) => collection.0,
        other => vec![other],
    })
}
