use crate::domain::RoutePoint;
use crate::route::normalize::sort_and_dedup;

/// Merges newly received points into an accumulated route. The result is sorted by timestamp
/// with unique timestamps. On a timestamp collision the point already in `existing` wins.
pub fn merge_route_points(existing: &[RoutePoint], additions: &[RoutePoint]) -> Vec<RoutePoint> {
    if additions.is_empty() {
        return existing.to_vec();
    }

    let mut combined = Vec::with_capacity(existing.len() + additions.len());
    combined.extend_from_slice(existing);
    combined.extend_from_slice(additions);
    sort_and_dedup(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::normalize_records;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn point(timestamp: i64) -> RoutePoint {
        RoutePoint::new(-16.5 + timestamp as f64 * 0.001, -68.1, timestamp)
    }

    #[test]
    fn merging_nothing_returns_the_existing_route() {
        let route = vec![point(1), point(2)];
        assert_eq!(merge_route_points(&route, &[]), route);
    }

    #[test]
    fn merging_into_an_empty_route_sorts_the_additions() {
        let merged = merge_route_points(&[], &[point(3), point(1), point(2)]);
        assert_eq!(merged, vec![point(1), point(2), point(3)]);
    }

    #[test]
    fn merging_interleaves_and_dedups() {
        let merged = merge_route_points(&[point(1), point(3), point(5)], &[point(4), point(3), point(2)]);
        assert_eq!(merged, vec![point(1), point(2), point(3), point(4), point(5)]);
    }

    #[test]
    fn merging_is_idempotent() {
        let route = merge_route_points(&[point(1), point(4)], &[point(2), point(3)]);
        let again = merge_route_points(&route, &[point(2), point(3)]);
        assert_eq!(again, route);
    }

    #[test]
    fn merge_order_does_not_change_the_timestamps() {
        let a = vec![point(10), point(30)];
        let b = vec![point(20), point(30), point(40)];

        let ab = merge_route_points(&a, &b);
        let ba = merge_route_points(&b, &a);

        assert_eq!(ab, ba);
    }

    #[test]
    fn keeps_the_existing_point_on_a_timestamp_collision() {
        let existing = RoutePoint::new(-16.0, -68.0, 100);
        let conflicting = RoutePoint::new(-17.0, -69.0, 100);

        let merged = merge_route_points(&[existing], &[conflicting]);

        assert_eq!(merged, vec![existing]);
    }

    #[test]
    fn merged_batches_contain_the_union_of_valid_records() {
        let a = normalize_records(&[
            json!({ "lat": -16.49, "lon": -68.11, "timestamp": 100 }),
            json!({ "lat": -16.48, "lon": -68.10, "timestamp": 50 }),
            json!({ "lat": -16.40 }),
        ]);
        let b = normalize_records(&[
            json!({ "lat": -16.47, "lon": -68.09, "fixTime": "1970-01-01T00:00:00.150Z" }),
            json!({ "lat": -16.49, "lon": -68.11, "timestamp": 100 }),
        ]);

        let merged = merge_route_points(&a, &b);

        assert_eq!(
            merged,
            vec![
                RoutePoint::new(-16.48, -68.10, 50),
                RoutePoint::new(-16.49, -68.11, 100),
                RoutePoint::new(-16.47, -68.09, 150),
            ]
        );
        assert_eq!(merged.last(), Some(&RoutePoint::new(-16.47, -68.09, 150)));
    }
}
