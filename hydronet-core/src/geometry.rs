//! Polyline measurements used to derive branch lengths and split points.
//!
//! Distances are planar (coordinates are expected in a projected CRS with
//! metre units), measured along the line from its first coordinate.

use geo::{Coord, Euclidean, InterpolatableLine, Length, Line, LineString, Point};

fn segment_length(segment: &Line<f64>) -> f64 {
    Euclidean.length(segment)
}

fn interpolate(segment: &Line<f64>, distance: f64) -> Coord<f64> {
    segment.point_at_distance_from_start(&Euclidean, distance).0
}

/// Arc length of a polyline.
pub fn line_length(line: &LineString<f64>) -> f64 {
    Euclidean.length(line)
}

/// Point at `distance` along `line`, clamped to its ends.
///
/// Returns `None` for an empty line string.
pub fn point_at_distance(line: &LineString<f64>, distance: f64) -> Option<Point<f64>> {
    line.point_at_distance_from_start(&Euclidean, distance)
}

/// Splits `line` at `distance` into the part before and the part after it.
///
/// Both halves contain the split point. Returns `None` unless `distance`
/// lies strictly inside the line.
pub fn split_line(
    line: &LineString<f64>,
    distance: f64,
) -> Option<(LineString<f64>, LineString<f64>)> {
    if distance <= 0.0 || distance >= line_length(line) {
        return None;
    }

    let mut head = vec![*line.0.first()?];
    let mut walked = 0.0;
    for (idx, segment) in line.lines().enumerate() {
        let len = segment_length(&segment);
        if walked + len >= distance {
            let split = interpolate(&segment, distance - walked);
            if head.last() != Some(&split) {
                head.push(split);
            }

            let mut tail = vec![split];
            tail.extend(line.0[idx + 1..].iter().copied().filter(|c| *c != split));
            if tail.len() < 2 {
                tail.push(segment.end);
            }
            return Some((LineString::new(head), LineString::new(tail)));
        }
        head.push(segment.end);
        walked += len;
    }

    None
}

/// Part of `line` between two distances along it.
///
/// When `from > to` the returned line runs backwards, so its first
/// coordinate is always the point at `from`.
pub fn sub_line(line: &LineString<f64>, from: f64, to: f64) -> Option<LineString<f64>> {
    if from > to {
        return sub_line(line, to, from).map(|mut reversed| {
            reversed.0.reverse();
            reversed
        });
    }

    let start = point_at_distance(line, from)?;
    let end = point_at_distance(line, to)?;

    let mut coords = vec![start.0];
    let mut walked = 0.0;
    for segment in line.lines() {
        walked += segment_length(&segment);
        if walked > from && walked < to {
            coords.push(segment.end);
        }
    }
    coords.push(end.0);

    Some(LineString::new(coords))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::line_string;

    fn bent_line() -> LineString<f64> {
        line_string![(x: 0.0, y: 0.0), (x: 60.0, y: 0.0), (x: 60.0, y: 40.0)]
    }

    #[test]
    fn test_line_length() {
        assert_relative_eq!(line_length(&bent_line()), 100.0);
        assert_relative_eq!(line_length(&LineString::new(vec![])), 0.0);
    }

    #[test]
    fn test_point_at_distance() {
        let line = bent_line();
        let p = point_at_distance(&line, 80.0).unwrap();
        assert_relative_eq!(p.x(), 60.0);
        assert_relative_eq!(p.y(), 20.0);

        // clamped at both ends
        assert_eq!(point_at_distance(&line, -5.0).unwrap(), Point::new(0.0, 0.0));
        assert_eq!(point_at_distance(&line, 500.0).unwrap(), Point::new(60.0, 40.0));
        assert!(point_at_distance(&LineString::new(vec![]), 1.0).is_none());
    }

    #[test]
    fn test_repeated_vertex() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 30.0, y: 0.0), (x: 30.0, y: 0.0), (x: 60.0, y: 0.0)];
        assert_relative_eq!(line_length(&line), 60.0);

        let p = point_at_distance(&line, 45.0).unwrap();
        assert_relative_eq!(p.x(), 45.0);
        assert_relative_eq!(p.y(), 0.0);

        let (head, tail) = split_line(&line, 30.0).unwrap();
        assert_relative_eq!(line_length(&head), 30.0);
        assert_relative_eq!(line_length(&tail), 30.0);
    }

    #[test]
    fn test_split_line() {
        let (head, tail) = split_line(&bent_line(), 30.0).unwrap();
        assert_relative_eq!(line_length(&head), 30.0);
        assert_relative_eq!(line_length(&tail), 70.0);
        assert_eq!(head.0.last(), tail.0.first());
        assert_eq!(tail.0.len(), 3);
    }

    #[test]
    fn test_split_line_at_vertex() {
        let (head, tail) = split_line(&bent_line(), 60.0).unwrap();
        assert_eq!(head.0.len(), 2);
        assert_eq!(tail.0.len(), 2);
        assert_relative_eq!(line_length(&tail), 40.0);
    }

    #[test]
    fn test_split_line_rejects_ends() {
        assert!(split_line(&bent_line(), 0.0).is_none());
        assert!(split_line(&bent_line(), 100.0).is_none());
    }

    #[test]
    fn test_sub_line_reversed() {
        let forward = sub_line(&bent_line(), 50.0, 70.0).unwrap();
        assert_relative_eq!(line_length(&forward), 20.0);
        assert_eq!(forward.0.len(), 3);

        let backward = sub_line(&bent_line(), 70.0, 50.0).unwrap();
        assert_eq!(backward.0.first(), forward.0.last());
        assert_relative_eq!(line_length(&backward), 20.0);
    }
}
