//! Outline engine: composition of store, classifier, fitter, and loader
//!
//! The engine is the only entry point the renderer talks to. Its single
//! operation never fails: any unknown name, degenerate geometry, or asset
//! problem degrades to an empty result the renderer shows as a placeholder.

use crate::assets::{ExternalOutlineLoader, ExtraOutlineAsset};
use crate::classify::{Classified, PolicyTable, classify};
use crate::fit::{MAIN_PADDING, Projection, SECONDARY_PADDING, SvgDimensions};
use crate::math::{PolygonData, Ring, bounds_of_points};
use crate::path::build_path;
use crate::ribbon::{ExtractedBoundary, RibbonConfig, extract_outer_boundary};
use crate::store::BoundaryStore;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

/// Classified-geometry cache capacity (countries). Extraction and
/// classification are cheap but not free; a render cycle touches the same
/// handful of countries repeatedly.
const GEOMETRY_CACHE_CAPACITY: usize = 256;

/// Per-call sizing parameters.
#[derive(Debug, Clone)]
pub struct OutlineOptions {
    /// Upper bound on the main outline box, in SVG units.
    pub max_size: f64,
    /// Upper bound on each secondary outline box.
    pub secondary_size: f64,
}

impl Default for OutlineOptions {
    fn default() -> Self {
        Self {
            max_size: 140.0,
            secondary_size: 36.0,
        }
    }
}

/// A small companion outline for a distant or marginal landmass.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryOutline {
    pub path: String,
    pub width: f64,
    pub height: f64,
}

/// The only value exposed to the renderer: one main path with its fitted
/// box, plus up to three secondary paths with theirs.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineResult {
    pub main_path: String,
    pub main_dimensions: SvgDimensions,
    pub secondary: Vec<SecondaryOutline>,
}

impl OutlineResult {
    /// The degraded "draw nothing" value.
    pub fn empty() -> Self {
        Self {
            main_path: String::new(),
            main_dimensions: SvgDimensions::default(),
            secondary: Vec::new(),
        }
    }

    /// Whether there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.main_path.is_empty()
    }
}

/// Country-outline geometry engine.
pub struct OutlineEngine {
    store: BoundaryStore,
    policies: PolicyTable,
    loader: Option<ExternalOutlineLoader>,
    ribbon: RibbonConfig,
    cache: Mutex<LruCache<String, Arc<Classified>>>,
}

impl OutlineEngine {
    pub fn new(store: BoundaryStore, policies: PolicyTable) -> Self {
        // Capacity is a compile-time nonzero constant
        let capacity = NonZeroUsize::new(GEOMETRY_CACHE_CAPACITY).unwrap();
        Self {
            store,
            policies,
            loader: None,
            ribbon: RibbonConfig::default(),
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Attach an external-asset loader for countries absent from the store.
    pub fn with_loader(mut self, loader: ExternalOutlineLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Override the ribbon-extraction tuning.
    pub fn with_ribbon_config(mut self, config: RibbonConfig) -> Self {
        self.ribbon = config;
        self
    }

    /// Compute the outline for a country.
    ///
    /// Dataset hit with at least one non-degenerate landmass → classified,
    /// fitted, and built into paths. Otherwise the external-asset path is
    /// tried. Every failure mode degrades to [`OutlineResult::empty`].
    pub async fn outline(&self, country: &str, options: &OutlineOptions) -> OutlineResult {
        if let Some(classified) = self.classified(country) {
            if !classified.main.is_empty() {
                return self.render(&classified, options);
            }
            tracing::debug!(
                country = %country,
                "feature has no usable landmass, trying external asset"
            );
        }

        if let Some(loader) = &self.loader {
            if let Some(asset) = loader.load(country).await {
                return self.render_asset(&asset, options);
            }
        }

        tracing::debug!(country = %country, "no outline available");
        OutlineResult::empty()
    }

    /// Classified geometry for a country, cached per name.
    fn classified(&self, country: &str) -> Option<Arc<Classified>> {
        let key = country.to_lowercase();

        if let Ok(mut cache) = self.cache.lock() {
            if let Some(hit) = cache.get(&key) {
                return Some(hit.clone());
            }
        }

        let feature = self.store.get(country)?;
        let polygons = PolygonData::extract(&feature.geometry);
        let classified = Arc::new(classify(polygons, self.policies.get(country)));

        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, classified.clone());
        }
        Some(classified)
    }

    fn render(&self, classified: &Classified, options: &OutlineOptions) -> OutlineResult {
        let main_rings: Vec<&Ring> = classified.main.iter().map(|p| &p.ring).collect();
        let Some(bounds) =
            bounds_of_points(main_rings.iter().flat_map(|r| r.iter().copied()))
        else {
            return OutlineResult::empty();
        };

        let projection = Projection::fit_geographic(bounds, options.max_size, MAIN_PADDING);
        let main_path = build_path(main_rings.into_iter(), &projection);

        let secondary = classified
            .secondary
            .iter()
            .map(|polygon| {
                let projection = Projection::fit_geographic(
                    polygon.bounds,
                    options.secondary_size,
                    SECONDARY_PADDING,
                );
                let dims = projection.dimensions();
                SecondaryOutline {
                    path: build_path([&polygon.ring], &projection),
                    width: dims.width,
                    height: dims.height,
                }
            })
            .collect();

        OutlineResult {
            main_path,
            main_dimensions: projection.dimensions(),
            secondary,
        }
    }

    /// Render a pre-traced asset: recover outer boundaries per raw path,
    /// then fit them in screen space (asset coordinates are already
    /// projected, Y down).
    fn render_asset(&self, asset: &ExtraOutlineAsset, options: &OutlineOptions) -> OutlineResult {
        let mut rings: Vec<Ring> = Vec::new();
        for raw in &asset.raw_paths {
            match extract_outer_boundary(raw, &self.ribbon) {
                ExtractedBoundary::Boundary(points) => rings.push(points),
                ExtractedBoundary::Raw(subpaths) => {
                    // Recoverable degradation: draw the unmodified trace
                    rings.extend(subpaths.into_iter().map(|s| s.points));
                }
            }
        }
        rings.retain(|ring| ring.len() >= 3);

        let Some(bounds) = bounds_of_points(rings.iter().flat_map(|r| r.iter().copied())) else {
            tracing::warn!("asset produced no drawable rings");
            return OutlineResult::empty();
        };

        let projection = Projection::fit_screen(bounds, options.max_size, MAIN_PADDING);
        OutlineResult {
            main_path: build_path(rings.iter(), &projection),
            main_dimensions: projection.dimensions(),
            secondary: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetFetcher, FetchFuture};
    use crate::{OutlineError, classify::MAX_SECONDARY};
    use std::collections::HashMap;

    const DATASET: &str = r#"{
        "features": [
            {
                "name": "Testland",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0, 0.0], [4.0, 0.0], [4.0, 2.0], [0.0, 2.0]]]
                }
            },
            {
                "name": "Twin Isles",
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]],
                        [[[50.0, 0.0], [51.0, 0.0], [51.0, 1.0], [50.0, 1.0]]]
                    ]
                }
            },
            {
                "name": "Pointland",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[10.0, 10.0]]]
                }
            }
        ]
    }"#;

    struct StaticFetcher(HashMap<String, String>);

    impl AssetFetcher for StaticFetcher {
        fn fetch<'a>(&'a self, filename: &'a str) -> FetchFuture<'a> {
            Box::pin(async move {
                self.0
                    .get(filename)
                    .cloned()
                    .ok_or_else(|| OutlineError::AssetFetch("404".to_string()))
            })
        }
    }

    fn engine() -> OutlineEngine {
        let store = BoundaryStore::from_geojson(DATASET).unwrap();
        OutlineEngine::new(store, PolicyTable::builtin())
    }

    fn engine_with_asset(filename: &str, document: &str) -> OutlineEngine {
        let fetcher = Arc::new(StaticFetcher(HashMap::from([(
            filename.to_string(),
            document.to_string(),
        )])));
        let table = HashMap::from([("Pointland".to_string(), filename.to_string())]);
        engine().with_loader(ExternalOutlineLoader::with_table(fetcher, table))
    }

    #[tokio::test]
    async fn test_scenario_a_single_polygon() {
        let result = engine()
            .outline(
                "Testland",
                &OutlineOptions {
                    max_size: 100.0,
                    ..Default::default()
                },
            )
            .await;

        assert!(!result.is_empty());
        assert_eq!(result.main_path.matches('Z').count(), 1);
        assert_eq!(result.main_path.matches('M').count(), 1);
        assert!(result.secondary.is_empty());
        assert!(result.main_dimensions.width <= 100.0);
        assert!(result.main_dimensions.height <= 100.0);
    }

    #[tokio::test]
    async fn test_scenario_b_distant_island_is_secondary() {
        let result = engine()
            .outline("Twin Isles", &OutlineOptions::default())
            .await;

        assert_eq!(result.main_path.matches('Z').count(), 1);
        assert_eq!(result.secondary.len(), 1);
        let secondary = &result.secondary[0];
        assert!(!secondary.path.is_empty());
        assert!(secondary.width <= 36.0 && secondary.height <= 36.0);
    }

    #[tokio::test]
    async fn test_scenario_d_unknown_country_is_empty() {
        let result = engine().outline("Atlantis", &OutlineOptions::default()).await;
        assert_eq!(result, OutlineResult::empty());
    }

    #[tokio::test]
    async fn test_secondary_cap_holds() {
        let result = engine()
            .outline("Twin Isles", &OutlineOptions::default())
            .await;
        assert!(result.secondary.len() <= MAX_SECONDARY);
    }

    #[tokio::test]
    async fn test_degenerate_geometry_without_asset_is_empty() {
        let result = engine().outline("Pointland", &OutlineOptions::default()).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_degenerate_geometry_falls_through_to_asset() {
        let document = r#"<svg viewBox="0 0 512 512">
            <path d="M10,10 L200,10 L200,200 L10,200 Z M30,30 L180,30 L180,180 L30,180 Z"/>
        </svg>"#;
        let engine = engine_with_asset("pointland.svg", document);

        let result = engine.outline("Pointland", &OutlineOptions::default()).await;
        assert!(!result.is_empty());
        // Structured asset: the outer sub-path alone survives
        assert_eq!(result.main_path.matches('Z').count(), 1);
        assert!(result.secondary.is_empty());
        assert!(result.main_dimensions.width <= 140.0);
        assert!(result.main_dimensions.height <= 140.0);
    }

    #[tokio::test]
    async fn test_unusable_asset_is_empty() {
        // The document fetches fine but has no path elements
        let engine = engine_with_asset("other.svg", "<svg/>");
        let result = engine.outline("Pointland", &OutlineOptions::default()).await;
        assert_eq!(result, OutlineResult::empty());
    }

    #[tokio::test]
    async fn test_geometry_cache_returns_same_classification() {
        let engine = engine();
        let first = engine.classified("Testland").unwrap();
        let second = engine.classified("testland").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_main_path_points_match_ring() {
        let result = engine()
            .outline("Testland", &OutlineOptions::default())
            .await;
        // 4-point ring: one M plus three L
        assert_eq!(result.main_path.matches('L').count(), 3);
    }
}
