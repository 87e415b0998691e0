//! YAML catalog loading.
//!
//! A catalog file declares metrics under a `metrics:` section. Each entry is
//! either a leaf-set (a single `statistic:` shorthand or a `components:`
//! list) or, with `type: derived`, an arithmetic combination of other
//! aliases. Invalid entries are logged and skipped; the rest of the catalog
//! still loads.
//!
//! ```yaml
//! metrics:
//!   times_jumped:
//!     display-name: Times Jumped
//!     statistic: jump
//!   blocks_mined:
//!     display-name: Blocks Mined
//!     statistic: mine_block   # keyed, no discriminator: totals the domain
//!   ores_mined_iron:
//!     display-name: Iron Ores Mined
//!     components:
//!       - statistic: mine_block
//!         discriminator: iron_ore
//!       - statistic: mine_block
//!         discriminator: deepslate_iron_ore
//!   net_kills:
//!     display-name: Net Kills
//!     type: derived
//!     components:
//!       - metric: player_kills
//!         operation: "+"
//!       - metric: deaths
//!         operation: "-"
//! ```

use super::{Catalog, CatalogSource, LeafRef, MetricDefinition};
use crate::core::{Alias, Result, StatError, StatKind};
use crate::provider::StatisticRegistry;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Deserialize, Default)]
struct RawCatalog {
    #[serde(default)]
    metrics: BTreeMap<String, RawMetric>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMetric {
    #[serde(rename = "display-name")]
    display_name: Option<String>,
    #[serde(rename = "type")]
    metric_type: Option<String>,
    statistic: Option<String>,
    kind: Option<StatKind>,
    discriminator: Option<String>,
    #[serde(default)]
    total: bool,
    components: Option<Vec<RawComponent>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawComponent {
    // Leaf-set component fields
    statistic: Option<String>,
    kind: Option<StatKind>,
    discriminator: Option<String>,
    // Derived component fields
    metric: Option<String>,
    operation: Option<String>,
}

/// Parses a catalog from YAML. Individual invalid definitions are skipped
/// with a warning; only malformed YAML fails the whole load.
pub fn parse_catalog(yaml: &str, registry: &dyn StatisticRegistry) -> Result<Catalog> {
    let raw: RawCatalog = serde_yaml::from_str(yaml)
        .map_err(|e| StatError::catalog(format!("failed to parse catalog YAML: {}", e)))?;

    let mut definitions = Vec::with_capacity(raw.metrics.len());
    for (alias, metric) in raw.metrics {
        match build_definition(&alias, metric, registry) {
            Ok(definition) => definitions.push(definition),
            Err(err) => {
                tracing::warn!(alias = %alias, error = %err, "skipping invalid metric definition");
            },
        }
    }

    Ok(Catalog::from_definitions(definitions))
}

fn build_definition(
    alias: &str,
    metric: RawMetric,
    registry: &dyn StatisticRegistry,
) -> Result<MetricDefinition> {
    let display_name = metric.display_name.clone().unwrap_or_else(|| alias.to_owned());

    if metric.metric_type.as_deref() == Some("derived") {
        return build_derived(alias, display_name, metric);
    }

    if let Some(components) = metric.components {
        let leaves = components
            .into_iter()
            .map(|component| {
                let statistic = component.statistic.ok_or_else(|| {
                    StatError::catalog(format!("metric '{}': component is missing 'statistic'", alias))
                })?;
                Ok(leaf_ref(&statistic, component.kind, component.discriminator, false, registry))
            })
            .collect::<Result<Vec<_>>>()?;
        return MetricDefinition::leaf_set(alias, display_name, leaves, metric.total, registry);
    }

    let statistic = metric.statistic.ok_or_else(|| {
        StatError::catalog(format!("metric '{}': needs 'statistic' or 'components'", alias))
    })?;
    let leaf = leaf_ref(&statistic, metric.kind, metric.discriminator, true, registry);
    // A keyed statistic with no fixed discriminator is a total request.
    let is_total =
        metric.total || (leaf.kind == StatKind::Keyed && leaf.discriminator.is_none());
    MetricDefinition::leaf_set(alias, display_name, vec![leaf], is_total, registry)
}

fn leaf_ref(
    statistic: &str,
    declared: Option<StatKind>,
    discriminator: Option<String>,
    infer_from_registry: bool,
    registry: &dyn StatisticRegistry,
) -> LeafRef {
    let statistic_id = crate::core::StatisticId::new(statistic);
    let kind = declared.unwrap_or_else(|| {
        if discriminator.is_some() {
            StatKind::Keyed
        } else if infer_from_registry {
            registry.kind_of(&statistic_id).unwrap_or(StatKind::Untyped)
        } else {
            StatKind::Untyped
        }
    });
    LeafRef {
        statistic: statistic_id,
        kind,
        discriminator: discriminator.map(crate::core::Discriminator::new),
    }
}

fn build_derived(alias: &str, display_name: String, metric: RawMetric) -> Result<MetricDefinition> {
    let components = metric.components.ok_or_else(|| {
        StatError::catalog(format!("derived metric '{}': missing 'components' list", alias))
    })?;

    let pairs = components
        .into_iter()
        .map(|component| {
            let target = component.metric.ok_or_else(|| {
                StatError::catalog(format!("derived metric '{}': component is missing 'metric'", alias))
            })?;
            let operation = component.operation.ok_or_else(|| {
                StatError::catalog(format!(
                    "derived metric '{}': component is missing 'operation'",
                    alias
                ))
            })?;
            // Exactly one operator symbol; anything longer is a config typo.
            let mut symbols = operation.chars();
            let symbol = match (symbols.next(), symbols.next()) {
                (Some(symbol), None) => symbol,
                _ => {
                    return Err(StatError::catalog(format!(
                        "derived metric '{}': operation '{}' must be a single operator symbol",
                        alias, operation
                    )))
                },
            };
            Ok((Alias::new(target), symbol))
        })
        .collect::<Result<Vec<_>>>()?;

    MetricDefinition::derived(alias, display_name, pairs)
}

/// The built-in catalog used when a configuration declares no metrics.
///
/// Statistics unknown to the registry are skipped, so an embedding that
/// tracks only some of these still gets the rest.
pub fn default_catalog(registry: &dyn StatisticRegistry) -> Catalog {
    let defaults: &[(&str, &str, &str)] = &[
        ("times_jumped", "Times Jumped", "jump"),
        ("play_time", "Play Time", "play_one_minute"),
        ("player_kills", "Player Kills", "player_kills"),
        ("mob_kills", "Mob Kills", "mob_kills"),
        ("deaths", "Deaths", "deaths"),
        ("blocks_mined", "Blocks Mined", "mine_block"),
    ];

    let mut definitions = Vec::new();
    for (alias, display_name, statistic) in defaults {
        let statistic_id = crate::core::StatisticId::new(statistic);
        let leaf = match registry.kind_of(&statistic_id) {
            Some(StatKind::Untyped) => LeafRef::untyped(*statistic),
            Some(StatKind::Keyed) => LeafRef::keyed_total(*statistic),
            None => {
                tracing::warn!(alias, statistic, "default metric references untracked statistic, skipping");
                continue;
            },
        };
        let is_total = leaf.kind == StatKind::Keyed;
        match MetricDefinition::leaf_set(*alias, *display_name, vec![leaf], is_total, registry) {
            Ok(definition) => definitions.push(definition),
            Err(err) => tracing::warn!(alias, error = %err, "skipping default metric"),
        }
    }
    Catalog::from_definitions(definitions)
}

/// Loads catalog snapshots from a YAML file on disk.
pub struct YamlCatalogSource {
    path: PathBuf,
    registry: Arc<dyn StatisticRegistry>,
}

impl YamlCatalogSource {
    /// Creates a source reading from the given path.
    pub fn new(path: impl Into<PathBuf>, registry: Arc<dyn StatisticRegistry>) -> Self {
        YamlCatalogSource {
            path: path.into(),
            registry,
        }
    }
}

impl CatalogSource for YamlCatalogSource {
    fn load(&self) -> Result<Catalog> {
        let content = std::fs::read_to_string(&self.path)?;
        let catalog = parse_catalog(&content, self.registry.as_ref())?;
        if catalog.is_empty() {
            tracing::warn!(path = %self.path.display(), "no metrics defined, using built-in defaults");
            return Ok(default_catalog(self.registry.as_ref()));
        }
        tracing::info!(
            path = %self.path.display(),
            metrics = catalog.len(),
            "loaded metric catalog"
        );
        Ok(catalog)
    }
}
