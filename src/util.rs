#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{shapes::Rect, P2};

/// One of the four quarters of a branch area. North is toward smaller y.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Quadrant {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Quadrant {
    /// All quadrants in slot order
    pub const ALL: [Quadrant; 4] = [
        Quadrant::NorthWest,
        Quadrant::NorthEast,
        Quadrant::SouthWest,
        Quadrant::SouthEast,
    ];

    /// Position of the quadrant in a branch's slot array
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Classify a point against the midpoint of `rect`.
///
/// Ties on the midpoint go east and south. Points outside the rect are still
/// classified by the midpoint alone.
///
/// **Returns** `None` when either coordinate is not finite, since such a point
/// has no meaningful quadrant.
pub fn determine_quadrant(rect: &Rect, point: &P2) -> Option<Quadrant> {
    if !point.x.is_finite() || !point.y.is_finite() {
        return None;
    }

    let mid = rect.center();
    let quadrant = match (point.x < mid.x, point.y < mid.y) {
        (true, true) => Quadrant::NorthWest,
        (true, false) => Quadrant::SouthWest,
        (false, true) => Quadrant::NorthEast,
        (false, false) => Quadrant::SouthEast,
    };
    Some(quadrant)
}

#[cfg(test)]
pub(crate) mod tests {
    use nalgebra::point;

    use super::*;

    pub(crate) fn make_rect(x1: f64, y1: f64, x2: f64, y2: f64) -> Rect {
        Rect::new(point![x1, y1], point![x2, y2])
    }

    #[test]
    fn test_determine_quadrant() {
        let rect = make_rect(0.0, 0.0, 10.0, 10.0);
        let points = [
            point![2.5, 2.5],
            point![7.5, 2.5],
            point![2.5, 7.5],
            point![7.5, 7.5],
            point![f64::NAN, 2.5],
            point![2.5, f64::INFINITY],
        ];

        let expected_quadrants = [
            Some(Quadrant::NorthWest),
            Some(Quadrant::NorthEast),
            Some(Quadrant::SouthWest),
            Some(Quadrant::SouthEast),
            None,
            None,
        ];
        let results = points
            .iter()
            .map(|point| determine_quadrant(&rect, point))
            .collect::<Vec<_>>();

        assert_eq!(
            results, expected_quadrants,
            "Each point should match its expected quadrant"
        );
    }

    #[test]
    fn midpoint_ties_go_east_and_south() {
        let rect = make_rect(0.0, 0.0, 10.0, 10.0);
        assert_eq!(
            determine_quadrant(&rect, &point![5.0, 5.0]),
            Some(Quadrant::SouthEast)
        );
        assert_eq!(
            determine_quadrant(&rect, &point![5.0, 4.9]),
            Some(Quadrant::NorthEast)
        );
        assert_eq!(
            determine_quadrant(&rect, &point![4.9, 5.0]),
            Some(Quadrant::SouthWest)
        );
    }

    #[test]
    fn classification_partitions_the_rect() {
        let rect = make_rect(-20.0, 10.0, 40.0, 70.0);
        for i in 0..=60 {
            for j in 0..=60 {
                let point = point![-20.0 + i as f64, 10.0 + j as f64];
                let quadrant = determine_quadrant(&rect, &point)
                    .expect("Finite points should always be classified");
                let containing = rect
                    .quarter()
                    .iter()
                    .zip(Quadrant::ALL)
                    .filter(|(r, _)| r.contains(&point))
                    .map(|(_, q)| q)
                    .collect::<Vec<_>>();
                assert!(
                    containing.contains(&quadrant),
                    "Point {point} should lie inside the rect of its quadrant {quadrant:?}"
                );
            }
        }
    }

    #[test]
    fn points_outside_are_classified_by_midpoint() {
        let rect = make_rect(0.0, 0.0, 10.0, 10.0);
        assert_eq!(
            determine_quadrant(&rect, &point![-50.0, 300.0]),
            Some(Quadrant::SouthWest)
        );
    }

    #[test]
    fn quadrant_indices_follow_slot_order() {
        for (i, q) in Quadrant::ALL.iter().enumerate() {
            assert_eq!(q.index(), i);
        }
    }
}
