//! Point table parsing
//!
//! Headers are matched case-insensitively against a fixed alias table once,
//! then every row is read by position.

use std::io::Read;

use csv::{ReaderBuilder, StringRecord, Trim};
use geo::Coord;
use log::debug;

use super::builder::is_valid_lon_lat;
use crate::{Error, model::PointRecord};

const ID_ALIASES: &[&str] = &["id", "point_id"];
const LAT_ALIASES: &[&str] = &["lat", "latitude"];
const LON_ALIASES: &[&str] = &["lon", "lng", "longitude"];

/// Positions of the canonical fields in a header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnLayout {
    id: usize,
    lat: usize,
    lon: usize,
}

impl ColumnLayout {
    fn resolve(headers: &StringRecord) -> Result<Self, Error> {
        let id = find_column(headers, "id", ID_ALIASES);
        let lat = find_column(headers, "latitude", LAT_ALIASES);
        let lon = find_column(headers, "longitude", LON_ALIASES);

        let mut problems = Vec::new();
        let mut take = |column: Result<Option<usize>, String>, field: &str| match column {
            Ok(Some(position)) => Some(position),
            Ok(None) => {
                problems.push(format!("missing {field} column"));
                None
            }
            Err(problem) => {
                problems.push(problem);
                None
            }
        };
        let id = take(id, "id");
        let lat = take(lat, "latitude");
        let lon = take(lon, "longitude");

        match (id, lat, lon) {
            (Some(id), Some(lat), Some(lon)) => Ok(Self { id, lat, lon }),
            _ => Err(Error::InputFormat(format!(
                "point table needs id, lat and lon columns: {}",
                problems.join(", ")
            ))),
        }
    }
}

fn find_column(
    headers: &StringRecord,
    field: &str,
    aliases: &[&str],
) -> Result<Option<usize>, String> {
    let matches: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, header)| {
            let header = header.trim().to_lowercase();
            aliases.contains(&header.as_str())
        })
        .map(|(position, _)| position)
        .collect();

    match matches.as_slice() {
        [] => Ok(None),
        [position] => Ok(Some(*position)),
        _ => Err(format!("{field} matches more than one column")),
    }
}

/// Parses a CSV point table with `id`, latitude and longitude columns
///
/// # Errors
///
/// Returns [`Error::InputFormat`] when the header cannot be resolved or any
/// row holds an empty id or an unparsable / out-of-range coordinate. No
/// partial result is returned.
pub fn parse_points_csv<R: Read>(reader: R) -> Result<Vec<PointRecord>, Error> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| Error::InputFormat(format!("cannot read point table header: {e}")))?
        .clone();
    if headers.is_empty() {
        return Err(Error::InputFormat("point table has no header".to_string()));
    }
    let layout = ColumnLayout::resolve(&headers)?;
    debug!("Resolved point columns: {layout:?}");

    reader
        .records()
        .enumerate()
        .map(|(row, record)| {
            let record = record
                .map_err(|e| Error::InputFormat(format!("row {}: {e}", row + 1)))?;
            parse_row(&record, layout, row + 1)
        })
        .collect()
}

/// Same as [`parse_points_csv`] for in-memory text, tolerating a UTF-8 BOM
pub fn parse_points_csv_str(text: &str) -> Result<Vec<PointRecord>, Error> {
    parse_points_csv(text.trim_start_matches('\u{feff}').as_bytes())
}

fn parse_row(record: &StringRecord, layout: ColumnLayout, row: usize) -> Result<PointRecord, Error> {
    let field = |position: usize| record.get(position).unwrap_or_default();

    let id = field(layout.id);
    if id.is_empty() {
        return Err(Error::InputFormat(format!("row {row}: empty point id")));
    }

    let parse = |value: &str| value.parse::<f64>().ok();
    let (Some(lat), Some(lon)) = (parse(field(layout.lat)), parse(field(layout.lon))) else {
        return Err(Error::InputFormat(format!(
            "row {row}: invalid lat/lon for point id={id} (lat={}, lon={})",
            field(layout.lat),
            field(layout.lon)
        )));
    };

    if !is_valid_lon_lat(&Coord { x: lon, y: lat }) {
        return Err(Error::InputFormat(format!(
            "row {row}: lat/lon out of range for point id={id} (lat={lat}, lon={lon})"
        )));
    }

    Ok(PointRecord::new(id, lat, lon))
}
