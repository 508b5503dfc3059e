//! Main/secondary landmass classification
//!
//! A feature's largest landmass anchors the outline; every other landmass
//! either joins it at full size ("main") or becomes a small companion
//! outline ("secondary"). Membership is decided on two axes at once:
//! proximity to the anchor's center and area relative to the anchor. Area
//! alone would drop genuinely attached peninsular or near-shore landmass;
//! proximity alone would include unrelated same-latitude noise.

use crate::math::PolygonData;
use std::collections::HashMap;

/// Default proximity threshold in degrees of longitude/latitude.
pub const DEFAULT_PROXIMITY_DEG: f64 = 15.0;
/// Tight proximity for continental nations with far-flung territories.
pub const TIGHT_PROXIMITY_DEG: f64 = 10.0;
/// Wide proximity for archipelago nations.
pub const NEARBY_PROXIMITY_DEG: f64 = 25.0;
/// Widest proximity for nations with integral but distant island groups.
pub const EXTRA_WIDE_PROXIMITY_DEG: f64 = 35.0;

/// Default significance threshold as a fraction of the anchor's area.
pub const DEFAULT_SIGNIFICANCE: f64 = 0.03;
/// Very low significance threshold for archipelago nations, where even
/// tiny islands belong in the main outline.
///
/// Empirically tuned, like the proximity values above; revisit if
/// classification quality regresses on new country shapes.
pub const NEARBY_SIGNIFICANCE: f64 = 0.001;

/// Maximum number of secondary outlines kept per feature.
pub const MAX_SECONDARY: usize = 3;

/// Per-country classification overrides. Default (all false) uses the
/// standard thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationPolicy {
    /// Tight proximity: far-flung territories are dropped to secondary.
    pub exclude_distant: bool,
    /// Archipelago: very low significance threshold, wide proximity.
    pub include_all_nearby: bool,
    /// Integral but distant island groups: widest proximity, normal
    /// significance.
    pub extra_wide_proximity: bool,
}

impl ClassificationPolicy {
    /// Resolve the (proximity degrees, significance fraction) pair.
    fn thresholds(&self) -> (f64, f64) {
        if self.exclude_distant {
            (TIGHT_PROXIMITY_DEG, DEFAULT_SIGNIFICANCE)
        } else if self.extra_wide_proximity {
            (EXTRA_WIDE_PROXIMITY_DEG, DEFAULT_SIGNIFICANCE)
        } else if self.include_all_nearby {
            (NEARBY_PROXIMITY_DEG, NEARBY_SIGNIFICANCE)
        } else {
            (DEFAULT_PROXIMITY_DEG, DEFAULT_SIGNIFICANCE)
        }
    }
}

/// Country-name keyed policy map, passed into the classifier so the core
/// stays free of hidden shared state.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    entries: HashMap<String, ClassificationPolicy>,
}

impl PolicyTable {
    /// An empty table: every country gets the default thresholds.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// The built-in per-country overrides.
    pub fn builtin() -> Self {
        let mut table = Self::empty();

        // Continental nations whose overseas territories should never share
        // the card with the mainland.
        for name in ["France", "Netherlands", "Denmark", "Norway"] {
            table.insert(
                name,
                ClassificationPolicy {
                    exclude_distant: true,
                    ..Default::default()
                },
            );
        }

        // Archipelagos: every nearby island is part of the silhouette.
        for name in [
            "Philippines",
            "Indonesia",
            "Japan",
            "Greece",
            "Maldives",
            "Bahamas",
            "Fiji",
        ] {
            table.insert(
                name,
                ClassificationPolicy {
                    include_all_nearby: true,
                    ..Default::default()
                },
            );
        }

        // Nations with integral but distant island groups.
        for name in ["Portugal", "Spain", "Ecuador", "United States"] {
            table.insert(
                name,
                ClassificationPolicy {
                    extra_wide_proximity: true,
                    ..Default::default()
                },
            );
        }

        table
    }

    /// Add or replace the policy for a country.
    pub fn insert(&mut self, name: &str, policy: ClassificationPolicy) {
        self.entries.insert(name.to_lowercase(), policy);
    }

    /// Policy for a country (case-insensitive), defaulting to no overrides.
    pub fn get(&self, name: &str) -> ClassificationPolicy {
        self.entries
            .get(&name.to_lowercase())
            .copied()
            .unwrap_or_default()
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Result of classification: at least one main landmass whenever the input
/// has one, and at most [`MAX_SECONDARY`] secondaries.
#[derive(Debug, Clone, Default)]
pub struct Classified {
    pub main: Vec<PolygonData>,
    pub secondary: Vec<PolygonData>,
}

/// Split a feature's landmasses into main and secondary sets.
///
/// The largest landmass is always main (the anchor). Every other landmass
/// joins it iff its center is within the proximity threshold of the
/// anchor's center on *both* axes AND its area clears the significance
/// threshold. Candidates that fail either test become secondary, truncated
/// to the [`MAX_SECONDARY`] largest.
pub fn classify(mut polygons: Vec<PolygonData>, policy: ClassificationPolicy) -> Classified {
    // The anchor must be first; extraction sorts, but re-sorting keeps the
    // invariant independent of the caller.
    polygons.sort_by(|a, b| b.area.total_cmp(&a.area));

    let mut iter = polygons.into_iter();
    let Some(anchor) = iter.next() else {
        return Classified::default();
    };

    let (proximity_deg, significance) = policy.thresholds();
    let anchor_center = anchor.center();
    let min_area = anchor.area * significance;

    let mut main = vec![anchor];
    let mut secondary = Vec::new();

    for polygon in iter {
        let center = polygon.center();
        let close = (center.x - anchor_center.x).abs() < proximity_deg
            && (center.y - anchor_center.y).abs() < proximity_deg;
        let significant = polygon.area >= min_area;

        if close && significant {
            main.push(polygon);
        } else if secondary.len() < MAX_SECONDARY {
            // Input is area-descending, so the first candidates are the
            // largest; the rest are dropped.
            secondary.push(polygon);
        } else {
            tracing::debug!(
                area = polygon.area,
                "dropping landmass beyond the secondary cap"
            );
        }
    }

    Classified { main, secondary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;

    /// Square landmass with side `size` whose lower-left corner is at (x, y).
    fn square(x: f64, y: f64, size: f64) -> PolygonData {
        PolygonData::from_exterior(vec![
            Coord { x, y },
            Coord { x: x + size, y },
            Coord {
                x: x + size,
                y: y + size,
            },
            Coord { x, y: y + size },
        ])
        .unwrap()
    }

    #[test]
    fn test_empty_input() {
        let result = classify(Vec::new(), ClassificationPolicy::default());
        assert!(result.main.is_empty());
        assert!(result.secondary.is_empty());
    }

    #[test]
    fn test_largest_is_always_main() {
        let result = classify(
            vec![square(0.0, 0.0, 1.0), square(0.0, 0.0, 10.0)],
            ClassificationPolicy::default(),
        );
        assert!(!result.main.is_empty());
        assert!((result.main[0].area - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_nearby_significant_joins_main() {
        // 5 degrees away, 25% of the anchor's area
        let result = classify(
            vec![square(0.0, 0.0, 10.0), square(15.0, 0.0, 5.0)],
            ClassificationPolicy::default(),
        );
        assert_eq!(result.main.len(), 2);
        assert!(result.secondary.is_empty());
    }

    #[test]
    fn test_distant_square_is_secondary() {
        // Scenario B: two same-size squares 50 degrees apart in longitude
        let result = classify(
            vec![square(0.0, 0.0, 1.0), square(50.0, 0.0, 1.0)],
            ClassificationPolicy::default(),
        );
        assert_eq!(result.main.len(), 1);
        assert_eq!(result.secondary.len(), 1);
    }

    #[test]
    fn test_proximity_gates_even_with_low_significance() {
        // Scenario C: includeAllNearby widens proximity to 25 degrees, but
        // 50 degrees still fails it, so significance alone cannot include.
        let result = classify(
            vec![square(0.0, 0.0, 1.0), square(50.0, 0.0, 1.0)],
            ClassificationPolicy {
                include_all_nearby: true,
                ..Default::default()
            },
        );
        assert_eq!(result.main.len(), 1);
        assert_eq!(result.secondary.len(), 1);
    }

    #[test]
    fn test_include_all_nearby_keeps_tiny_islands() {
        // 0.25% of the anchor area: below the default 3% threshold but
        // above the archipelago 0.1% threshold.
        let tiny = square(5.0, 5.0, 0.5);
        let polys = vec![square(0.0, 0.0, 10.0), tiny.clone()];

        let default = classify(polys.clone(), ClassificationPolicy::default());
        assert_eq!(default.main.len(), 1);
        assert_eq!(default.secondary.len(), 1);

        let archipelago = classify(
            polys,
            ClassificationPolicy {
                include_all_nearby: true,
                ..Default::default()
            },
        );
        assert_eq!(archipelago.main.len(), 2);
    }

    #[test]
    fn test_exclude_distant_tightens_proximity() {
        // 12 degrees away: inside the default 15, outside the tight 10.
        let polys = vec![square(0.0, 0.0, 10.0), square(14.0, 0.0, 6.0)];

        let default = classify(polys.clone(), ClassificationPolicy::default());
        assert_eq!(default.main.len(), 2);

        let tight = classify(
            polys,
            ClassificationPolicy {
                exclude_distant: true,
                ..Default::default()
            },
        );
        assert_eq!(tight.main.len(), 1);
        assert_eq!(tight.secondary.len(), 1);
    }

    #[test]
    fn test_extra_wide_proximity() {
        // 30 degrees away and large: outside default, inside 35-degree wide.
        let polys = vec![square(0.0, 0.0, 10.0), square(28.0, 0.0, 8.0)];

        let default = classify(polys.clone(), ClassificationPolicy::default());
        assert_eq!(default.main.len(), 1);

        let wide = classify(
            polys,
            ClassificationPolicy {
                extra_wide_proximity: true,
                ..Default::default()
            },
        );
        assert_eq!(wide.main.len(), 2);
    }

    #[test]
    fn test_secondary_capped_at_three() {
        let mut polys = vec![square(0.0, 0.0, 10.0)];
        for i in 0..6 {
            polys.push(square(100.0 + i as f64 * 5.0, 0.0, 2.0 - i as f64 * 0.1));
        }
        let result = classify(polys, ClassificationPolicy::default());
        assert_eq!(result.secondary.len(), MAX_SECONDARY);
        // The kept secondaries are the largest candidates
        assert!(result.secondary[0].area >= result.secondary[1].area);
        assert!(result.secondary[1].area >= result.secondary[2].area);
    }

    #[test]
    fn test_builtin_table_lookup() {
        let table = PolicyTable::builtin();
        assert!(table.get("France").exclude_distant);
        assert!(table.get("philippines").include_all_nearby);
        assert!(table.get("Portugal").extra_wide_proximity);
        assert_eq!(table.get("Testland"), ClassificationPolicy::default());
    }
}
