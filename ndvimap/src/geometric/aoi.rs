use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{coord, Area, Coord, LineString, Polygon};
use serde_json::Value;

use crate::error::InvalidAoiError;
use crate::geo_core::AreaOfInterest;

/// AOI as handed over by the drawing tool
#[derive(Debug, Clone)]
pub enum AoiInput {
    /// Geometry that already went through validation
    Geometry(AreaOfInterest),
    /// Loosely structured object exposing `coordinates` (GeoJSON geometry or feature)
    Raw(Value),
}

impl From<AreaOfInterest> for AoiInput {
    fn from(aoi: AreaOfInterest) -> Self {
        AoiInput::Geometry(aoi)
    }
}

impl From<Value> for AoiInput {
    fn from(value: Value) -> Self {
        AoiInput::Raw(value)
    }
}

/// Resolve the drawn AOI into a canonical polygon.
/// `None` (nothing drawn) fails the same way as malformed input.
pub fn validate(input: Option<AoiInput>) -> Result<AreaOfInterest, InvalidAoiError> {
    match input {
        None => Err(InvalidAoiError::Missing),
        Some(AoiInput::Geometry(aoi)) => Ok(aoi),
        Some(AoiInput::Raw(value)) => from_raw(&value),
    }
}

impl TryFrom<Polygon<f64>> for AreaOfInterest {
    type Error = InvalidAoiError;

    fn try_from(polygon: Polygon<f64>) -> Result<Self, Self::Error> {
        let (exterior, interiors) = polygon.into_inner();
        let rings = std::iter::once(exterior)
            .chain(interiors)
            .map(|ring| ring.0)
            .collect::<Vec<_>>();
        build_polygon(rings)
    }
}

fn from_raw(value: &Value) -> Result<AreaOfInterest, InvalidAoiError> {
    let object = match value {
        Value::Null => return Err(InvalidAoiError::Missing),
        Value::Object(object) => object,
        _ => return Err(InvalidAoiError::MissingRings),
    };

    // Drawn shapes are exported as features; the rings sit under `geometry`
    if object.get("type").and_then(Value::as_str) == Some("Feature") {
        return match object.get("geometry") {
            Some(geometry) => from_raw(geometry),
            None => Err(InvalidAoiError::MissingRings),
        };
    }

    let rings = object
        .get("coordinates")
        .and_then(Value::as_array)
        .filter(|rings| !rings.is_empty())
        .ok_or(InvalidAoiError::MissingRings)?;

    let mut parsed = Vec::with_capacity(rings.len());
    for (ring_index, ring) in rings.iter().enumerate() {
        let positions = ring
            .as_array()
            .ok_or(InvalidAoiError::MalformedRing { ring: ring_index })?;
        let mut coords = Vec::with_capacity(positions.len());
        for (position, pair) in positions.iter().enumerate() {
            coords.push(parse_position(pair, ring_index, position)?);
        }
        parsed.push(coords);
    }

    build_polygon(parsed)
}

/// `[lon, lat]` or `[lon, lat, alt]`; altitude is dropped
fn parse_position(value: &Value, ring: usize, position: usize) -> Result<Coord<f64>, InvalidAoiError> {
    let malformed = InvalidAoiError::MalformedPosition { ring, position };
    let pair = value.as_array().ok_or_else(|| malformed.clone())?;
    if pair.len() != 2 && pair.len() != 3 {
        return Err(malformed);
    }
    let mut numbers = [0.0; 3];
    for (slot, item) in numbers.iter_mut().zip(pair.iter()) {
        *slot = item
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| malformed.clone())?;
    }
    Ok(coord! { x: numbers[0], y: numbers[1] })
}

fn build_polygon(rings: Vec<Vec<Coord<f64>>>) -> Result<AreaOfInterest, InvalidAoiError> {
    if rings.is_empty() {
        return Err(InvalidAoiError::MissingRings);
    }

    let mut closed = Vec::with_capacity(rings.len());
    for (ring_index, coords) in rings.into_iter().enumerate() {
        closed.push(normalize_ring(coords, ring_index)?);
    }

    let mut rings = closed.into_iter();
    let exterior = rings.next().ok_or(InvalidAoiError::MissingRings)?;
    let polygon = Polygon::new(exterior, rings.collect());

    if Polygon::new(polygon.exterior().clone(), vec![]).unsigned_area() <= 0.0 {
        return Err(InvalidAoiError::ZeroArea);
    }

    Ok(AreaOfInterest::from_validated(polygon))
}

/// Range-check, drop repeated vertices, close the ring and reject self-intersections
fn normalize_ring(coords: Vec<Coord<f64>>, ring: usize) -> Result<LineString<f64>, InvalidAoiError> {
    for (position, c) in coords.iter().enumerate() {
        if !(-180.0..=180.0).contains(&c.x) || !(-90.0..=90.0).contains(&c.y) {
            return Err(InvalidAoiError::OutOfRange { ring, position });
        }
    }

    let mut vertices = coords;
    vertices.dedup();
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    if vertices.len() < 3 {
        return Err(InvalidAoiError::TooFewVertices {
            ring,
            count: vertices.len(),
        });
    }

    let mut line_string = LineString::new(vertices);
    line_string.close();

    if is_self_intersecting(&line_string) {
        return Err(InvalidAoiError::SelfIntersecting { ring });
    }

    Ok(line_string)
}

fn is_self_intersecting(ring: &LineString<f64>) -> bool {
    let segments: Vec<_> = ring.lines().collect();
    let n = segments.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            match line_intersection(segments[i], segments[j]) {
                None => {}
                // Neighbours share exactly one vertex
                Some(LineIntersection::SinglePoint { .. }) if adjacent => {}
                Some(_) => return true,
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::BoundingRect;
    use geo::polygon;
    use serde_json::json;

    fn rectangle() -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [[
                [-75.84, 38.60],
                [-75.83, 38.60],
                [-75.83, 38.62],
                [-75.84, 38.62],
                [-75.84, 38.60]
            ]]
        })
    }

    #[test]
    fn test_validate_raw_rectangle() {
        let aoi = validate(Some(AoiInput::Raw(rectangle()))).unwrap();
        assert_eq!(aoi.polygon().exterior().0.len(), 5);
        assert!(aoi.polygon().interiors().is_empty());
        let rect = aoi.polygon().bounding_rect().unwrap();
        assert_eq!(rect.min().x, -75.84);
        assert_eq!(rect.max().y, 38.62);
    }

    #[test]
    fn test_validate_is_idempotent() {
        let aoi = validate(Some(rectangle().into())).unwrap();
        let again = validate(Some(AoiInput::Geometry(aoi.clone()))).unwrap();
        assert_eq!(aoi, again);
    }

    #[test]
    fn test_open_ring_is_closed() {
        let open = json!({
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]]
        });
        let aoi = validate(Some(open.into())).unwrap();
        let ring = &aoi.polygon().exterior().0;
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn test_feature_wrapper_is_unwrapped() {
        let feature = json!({
            "type": "Feature",
            "properties": {},
            "geometry": rectangle()
        });
        assert!(validate(Some(feature.into())).is_ok());
    }

    #[test]
    fn test_missing_aoi() {
        assert_eq!(validate(None), Err(InvalidAoiError::Missing));
        assert_eq!(
            validate(Some(AoiInput::Raw(Value::Null))),
            Err(InvalidAoiError::Missing)
        );
    }

    #[test]
    fn test_empty_object_is_invalid() {
        assert_eq!(
            validate(Some(json!({}).into())),
            Err(InvalidAoiError::MissingRings)
        );
        assert_eq!(
            validate(Some(json!({"coordinates": []}).into())),
            Err(InvalidAoiError::MissingRings)
        );
        assert_eq!(
            validate(Some(json!("polygon").into())),
            Err(InvalidAoiError::MissingRings)
        );
    }

    #[test]
    fn test_wrong_nesting_is_invalid() {
        // A bare ring instead of a list of rings
        let flat = json!({"coordinates": [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]});
        assert!(matches!(
            validate(Some(flat.into())),
            Err(InvalidAoiError::MalformedPosition { ring: 0, .. })
        ));
        let scalar_ring = json!({"coordinates": [1.0]});
        assert_eq!(
            validate(Some(scalar_ring.into())),
            Err(InvalidAoiError::MalformedRing { ring: 0 })
        );
    }

    #[test]
    fn test_malformed_positions() {
        let short = json!({"coordinates": [[[0.0], [1.0, 0.0], [1.0, 1.0]]]});
        assert_eq!(
            validate(Some(short.into())),
            Err(InvalidAoiError::MalformedPosition {
                ring: 0,
                position: 0
            })
        );
        let text = json!({"coordinates": [[[0.0, 0.0], ["a", 0.0], [1.0, 1.0]]]});
        assert_eq!(
            validate(Some(text.into())),
            Err(InvalidAoiError::MalformedPosition {
                ring: 0,
                position: 1
            })
        );
        let far = json!({"coordinates": [[[0.0, 0.0], [200.0, 0.0], [1.0, 1.0]]]});
        assert_eq!(
            validate(Some(far.into())),
            Err(InvalidAoiError::OutOfRange {
                ring: 0,
                position: 1
            })
        );
    }

    #[test]
    fn test_altitude_is_dropped() {
        let with_z = json!({"coordinates": [[[0.0, 0.0, 5.0], [1.0, 0.0, 5.0], [1.0, 1.0, 5.0]]]});
        let aoi = validate(Some(with_z.into())).unwrap();
        assert_eq!(aoi.polygon().exterior().0[1], coord! { x: 1.0, y: 0.0 });
    }

    #[test]
    fn test_degenerate_rings() {
        let two_points = json!({"coordinates": [[[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]});
        assert_eq!(
            validate(Some(two_points.into())),
            Err(InvalidAoiError::TooFewVertices { ring: 0, count: 2 })
        );
        let collinear = json!({"coordinates": [[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]]});
        assert!(validate(Some(collinear.into())).is_err());
    }

    #[test]
    fn test_bow_tie_is_self_intersecting() {
        let bow_tie = json!({"coordinates": [[[0.0, 0.0], [1.0, 1.0], [1.0, 0.0], [0.0, 1.0], [0.0, 0.0]]]});
        assert_eq!(
            validate(Some(bow_tie.into())),
            Err(InvalidAoiError::SelfIntersecting { ring: 0 })
        );
    }

    #[test]
    fn test_polygon_with_hole() {
        let holed = json!({"coordinates": [
            [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]],
            [[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 2.0], [1.0, 1.0]]
        ]});
        let aoi = validate(Some(holed.into())).unwrap();
        assert_eq!(aoi.polygon().interiors().len(), 1);
    }

    #[test]
    fn test_try_from_geo_polygon() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        assert!(AreaOfInterest::try_from(square).is_ok());
        let bow_tie = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0), (x: 1.0, y: 0.0), (x: 0.0, y: 1.0)];
        assert!(AreaOfInterest::try_from(bow_tie).is_err());
    }
}
