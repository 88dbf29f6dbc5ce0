//! Spatial aggregation from grid cells to country polygons.
//!
//! A [`CountryIndex`] holds an insertion-ordered country polygon set plus
//! an R-tree over the polygon bounding boxes, so locating the country
//! containing a grid point costs O(log polygons) instead of a scan over
//! every polygon. [`aggregate_by_country`] assigns every cell of one
//! month's attribute grids to a country and reduces the groups into
//! [`CountryMonthRecord`]s.
//!
//! A point intersecting several polygons (coastal or disputed boundaries)
//! is deterministically credited to the first-inserted country; this
//! mirrors the accepted first-match resolution of the join and is covered
//! by tests rather than treated as an error.

use crate::grid::FloatValue;
use chrono::NaiveDate;
use geo::{BoundingRect, Intersects, MultiPolygon, Point};
use log::{debug, warn};
use ndarray::{Array1, ArrayView2};
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

/// How grid cells falling outside every country polygon are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinPolicy {
    /// Unmatched cells contribute to no record (the left-join rows with a
    /// null country are discarded before grouping).
    #[default]
    DropUnmatched,
    /// Unmatched cells are grouped into one record with no country name.
    KeepUnmatched,
}

/// R-tree entry: one country's bounding box plus its insertion index.
#[derive(Debug, Clone)]
struct CountryEnvelope {
    id: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for CountryEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// An immutable, insertion-ordered country polygon set with a bounding-box
/// index for point queries.
///
/// Polygon coordinates must use the [-180, 180] longitude convention the
/// grids are normalized to.
pub struct CountryIndex {
    names: Vec<String>,
    geometries: Vec<MultiPolygon<f64>>,
    tree: RTree<CountryEnvelope>,
}

impl CountryIndex {
    /// Build the index from (name, geometry) pairs.
    ///
    /// Insertion order defines the tie-break priority when a point falls
    /// inside more than one polygon. Empty geometries are kept in the set
    /// (they keep their id) but never match a point.
    pub fn new(countries: Vec<(String, MultiPolygon<f64>)>) -> Self {
        let mut names = Vec::with_capacity(countries.len());
        let mut geometries = Vec::with_capacity(countries.len());
        let mut envelopes = Vec::with_capacity(countries.len());
        for (id, (name, geometry)) in countries.into_iter().enumerate() {
            match geometry.bounding_rect() {
                Some(rect) => envelopes.push(CountryEnvelope {
                    id,
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                }),
                None => warn!("{name}: empty geometry, will never match a point"),
            }
            names.push(name);
            geometries.push(geometry);
        }
        debug!(
            "country index built: {} countries, {} indexed envelopes",
            names.len(),
            envelopes.len()
        );
        Self {
            names,
            geometries,
            tree: RTree::bulk_load(envelopes),
        }
    }

    /// Number of countries in the set.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name of the country with the given id.
    pub fn name(&self, id: usize) -> &str {
        &self.names[id]
    }

    /// Id of the first-inserted country containing (lon, lat), if any.
    ///
    /// Candidates come from the bounding-box tree; the exact test uses
    /// intersects semantics, so boundary points match.
    pub fn locate(&self, lon: f64, lat: f64) -> Option<usize> {
        let point = Point::new(lon, lat);
        self.tree
            .locate_in_envelope_intersecting(&AABB::from_point([lon, lat]))
            .filter(|candidate| self.geometries[candidate.id].intersects(&point))
            .map(|candidate| candidate.id)
            .min()
    }
}

/// How one attribute column reduces over the cells of a country.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Mean,
    Sum,
}

/// One output column: a named per-cell field and its group reduction.
pub struct CellField<'a> {
    pub column: &'a str,
    pub values: ArrayView2<'a, FloatValue>,
    pub reduction: Reduction,
}

/// One aggregated row keyed by (month date, country).
///
/// `country` is `None` only under [`JoinPolicy::KeepUnmatched`].
#[derive(Debug, Clone, PartialEq)]
pub struct CountryMonthRecord {
    pub date: NaiveDate,
    pub country: Option<String>,
    /// (column name, aggregated value) in the field order of the pipeline.
    pub values: Vec<(String, FloatValue)>,
}

/// Group every grid cell by containing country and reduce the given fields.
///
/// A single pass assigns each (lat, lon) cell to a group through the index,
/// accumulating per-group sums and counts for all fields at once; means and
/// sums are then emitted per country in insertion order, with the unmatched
/// group last when retained. Peak memory is one month's accumulator set,
/// nothing carries over between months.
pub fn aggregate_by_country(
    index: &CountryIndex,
    latitudes: &Array1<f64>,
    longitudes: &Array1<f64>,
    fields: &[CellField<'_>],
    date: NaiveDate,
    policy: JoinPolicy,
) -> Vec<CountryMonthRecord> {
    // Group ids 0..len() are countries; len() is the unmatched group.
    let unmatched = index.len();
    let n_groups = unmatched + 1;
    let mut sums = vec![vec![0.0; n_groups]; fields.len()];
    let mut counts = vec![0usize; n_groups];

    for (i, &lat) in latitudes.iter().enumerate() {
        for (j, &lon) in longitudes.iter().enumerate() {
            let group = index.locate(lon, lat).unwrap_or(unmatched);
            counts[group] += 1;
            for (k, field) in fields.iter().enumerate() {
                sums[k][group] += field.values[[i, j]];
            }
        }
    }

    let mut records = Vec::new();
    for group in 0..n_groups {
        if counts[group] == 0 {
            continue;
        }
        if group == unmatched && policy == JoinPolicy::DropUnmatched {
            continue;
        }
        let values = fields
            .iter()
            .enumerate()
            .map(|(k, field)| {
                let total = sums[k][group];
                let value = match field.reduction {
                    Reduction::Mean => total / counts[group] as FloatValue,
                    Reduction::Sum => total,
                };
                (field.column.to_string(), value)
            })
            .collect();
        records.push(CountryMonthRecord {
            date,
            country: (group != unmatched).then(|| index.name(group).to_string()),
            values,
        });
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};
    use is_close::is_close;
    use ndarray::array;

    fn square(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![
                (min_x, min_y),
                (max_x, min_y),
                (max_x, max_y),
                (min_x, max_y),
                (min_x, min_y),
            ]),
            vec![],
        )])
    }

    fn july() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 7, 1).unwrap()
    }

    #[test]
    fn locate_inside_and_outside() {
        let index = CountryIndex::new(vec![
            ("Aland".to_string(), square(0.0, 0.0, 10.0, 10.0)),
            ("Borduria".to_string(), square(20.0, 0.0, 30.0, 10.0)),
        ]);
        assert_eq!(index.locate(5.0, 5.0), Some(0));
        assert_eq!(index.locate(25.0, 5.0), Some(1));
        assert_eq!(index.locate(15.0, 5.0), None);
        assert_eq!(index.locate(-50.0, -50.0), None);
    }

    #[test]
    fn boundary_point_matches() {
        let index = CountryIndex::new(vec![("Aland".to_string(), square(0.0, 0.0, 10.0, 10.0))]);
        // Intersects semantics: a point on the edge is assigned.
        assert_eq!(index.locate(0.0, 5.0), Some(0));
    }

    #[test]
    fn overlap_resolved_by_insertion_order() {
        let index = CountryIndex::new(vec![
            ("First".to_string(), square(0.0, 0.0, 10.0, 10.0)),
            ("Second".to_string(), square(5.0, 0.0, 15.0, 10.0)),
        ]);
        // Inside both; first-inserted wins.
        assert_eq!(index.locate(7.0, 5.0), Some(0));
        // Only inside the second.
        assert_eq!(index.locate(12.0, 5.0), Some(1));
    }

    #[test]
    fn land_cell_credited_ocean_cell_dropped() {
        let index = CountryIndex::new(vec![("Aland".to_string(), square(0.0, 40.0, 10.0, 50.0))]);
        let dd = array![[3.25, 7.0]];
        let fields = [
            CellField {
                column: "cdd_avg",
                values: dd.view(),
                reduction: Reduction::Mean,
            },
            CellField {
                column: "cdd_sum",
                values: dd.view(),
                reduction: Reduction::Sum,
            },
        ];
        // One point inside the square, one in open ocean.
        let records = aggregate_by_country(
            &index,
            &array![45.0],
            &array![5.0, 120.0],
            &fields,
            july(),
            JoinPolicy::DropUnmatched,
        );
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.country.as_deref(), Some("Aland"));
        // The ocean cell's 7.0 must not leak into Aland's aggregates.
        assert_eq!(record.values[0], ("cdd_avg".to_string(), 3.25));
        assert_eq!(record.values[1], ("cdd_sum".to_string(), 3.25));
    }

    #[test]
    fn keep_unmatched_emits_null_country_record() {
        let index = CountryIndex::new(vec![("Aland".to_string(), square(0.0, 40.0, 10.0, 50.0))]);
        let dd = array![[3.25, 7.0]];
        let fields = [CellField {
            column: "cdd_sum",
            values: dd.view(),
            reduction: Reduction::Sum,
        }];
        let records = aggregate_by_country(
            &index,
            &array![45.0],
            &array![5.0, 120.0],
            &fields,
            july(),
            JoinPolicy::KeepUnmatched,
        );
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].country.as_deref(), Some("Aland"));
        assert_eq!(records[1].country, None);
        assert_eq!(records[1].values[0].1, 7.0);
    }

    #[test]
    fn group_means_over_multiple_cells() {
        let index = CountryIndex::new(vec![("Aland".to_string(), square(0.0, 40.0, 10.0, 50.0))]);
        // 2x2 grid, all four cells inside the square.
        let temps = array![[10.0, 20.0], [30.0, 40.0]];
        let fields = [CellField {
            column: "avg_temp",
            values: temps.view(),
            reduction: Reduction::Mean,
        }];
        let records = aggregate_by_country(
            &index,
            &array![44.0, 46.0],
            &array![2.0, 8.0],
            &fields,
            july(),
            JoinPolicy::DropUnmatched,
        );
        assert_eq!(records.len(), 1);
        assert!(is_close!(records[0].values[0].1, 25.0));
    }
}
