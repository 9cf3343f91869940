// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::engine as en;
use crate::spec;
use en::backend::InferenceBackend;
use en::error::UnknownScenario;
use spec::{Approach, Health, Stability, Tension};

/// Maximum number of identifiers returned as a hint for an unknown scenario.
pub const HINT_LIMIT: usize = 5;

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A predefined diagnostic outcome for a named scenario.
///
/// # Examples
///
/// ```
/// # use motordiag::engine::*;
/// let catalog = ScenarioCatalog::standard();
/// let record = catalog.resolve("adjustment_tight")?;
///
/// assert_eq!(record.tension(), Tension::Tight);
/// assert_eq!(record.health(), Health::RequiresLoosening);
/// # Ok::<(), UnknownScenario>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioRecord {
    identifier: String,
    tension: Tension,
    stability: Stability,
    health: Health,
    approach: Approach,
    description: String,
}

impl ScenarioRecord {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn tension(&self) -> Tension {
        self.tension
    }

    pub fn stability(&self) -> Stability {
        self.stability
    }

    pub fn health(&self) -> Health {
        self.health
    }

    pub fn approach(&self) -> Approach {
        self.approach
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Status fields describing this record as the result of a scenario run.
    pub fn to_report(&self) -> spec::StatusReport {
        spec::StatusReport {
            machine_state: spec::MachineState::On,
            tension: self.tension,
            stability: self.stability,
            health: self.health,
            scenario: Some(self.identifier.clone()),
            approach: Some(self.approach),
            available_scenarios: None,
        }
    }
}

/// A named set of scenarios sharing one [`Approach`].
///
/// # Examples
///
/// ```
/// # use motordiag::engine::*;
/// let group = ScenarioGroup::new("Adjustment", Approach::Approach2)
///     .add(
///         "adjustment_loose",
///         Tension::Loose,
///         Stability::NotApplicable,
///         Health::RequiresTightening,
///         "Belt is loose, needs adjustment",
///     );
/// ```
pub struct ScenarioGroup {
    name: String,
    approach: Approach,
    records: Vec<ScenarioRecord>,
}

impl ScenarioGroup {
    pub fn new(name: &str, approach: Approach) -> Self {
        ScenarioGroup {
            name: name.to_owned(),
            approach,
            records: Vec::new(),
        }
    }

    pub fn add(
        mut self,
        identifier: &str,
        tension: Tension,
        stability: Stability,
        health: Health,
        description: &str,
    ) -> Self {
        self.records.push(ScenarioRecord {
            identifier: normalize(identifier),
            tension,
            stability,
            health,
            approach: self.approach,
            description: description.to_owned(),
        });
        self
    }
}

/// Builder for the [`ScenarioCatalog`] object.
///
/// Groups are merged in the order they are added. An identifier that was
/// already registered by an earlier group is replaced in place and a
/// warning is logged.
#[derive(Default)]
pub struct CatalogBuilder {
    groups: Vec<ScenarioGroup>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_group(mut self, group: ScenarioGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn build(self) -> ScenarioCatalog {
        let mut records: Vec<ScenarioRecord> = Vec::new();
        let mut index = BTreeMap::<String, usize>::new();
        let mut groups = Vec::with_capacity(self.groups.len());

        for group in self.groups {
            let mut members = Vec::with_capacity(group.records.len());
            for record in group.records {
                members.push(record.identifier.clone());
                match index.get(&record.identifier) {
                    Some(&slot) => {
                        warn!(
                            identifier = %record.identifier,
                            group = %group.name,
                            "scenario identifier registered twice, keeping the later definition"
                        );
                        records[slot] = record;
                    }
                    None => {
                        index.insert(record.identifier.clone(), records.len());
                        records.push(record);
                    }
                }
            }
            groups.push((group.name, members));
        }

        ScenarioCatalog {
            records,
            index,
            groups,
        }
    }
}

/// Static registry mapping scenario identifiers to diagnostic outcomes.
///
/// The set of entries is fixed when the catalog is built.
pub struct ScenarioCatalog {
    records: Vec<ScenarioRecord>,
    index: BTreeMap<String, usize>,
    groups: Vec<(String, Vec<String>)>,
}

impl ScenarioCatalog {
    /// Creates a new [`CatalogBuilder`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use motordiag::engine::*;
    /// let catalog = ScenarioCatalog::builder()
    ///     .add_group(ScenarioGroup::new("Custom", Approach::Approach1).add(
    ///         "idle",
    ///         Tension::Optimal,
    ///         Stability::Stable,
    ///         Health::Good,
    ///         "Idle machine",
    ///     ))
    ///     .build();
    ///
    /// assert_eq!(catalog.list_identifiers(), vec!["idle"]);
    /// ```
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// The belt-drive catalog: the stability/health group followed by the
    /// adjustment group.
    pub fn standard() -> Self {
        let stability_health = ScenarioGroup::new("Stability-Health", Approach::Approach1)
            .add(
                "loose_unstable_good",
                Tension::Loose,
                Stability::Unstable,
                Health::Good,
                "Loose tension with unstable operation, but motor health is good",
            )
            .add(
                "optimal_stable_good",
                Tension::Optimal,
                Stability::Stable,
                Health::Good,
                "Optimal conditions with stable operation and good health",
            )
            .add(
                "optimal_unstable_warning",
                Tension::Optimal,
                Stability::Unstable,
                Health::Warning,
                "Optimal tension but unstable, requiring attention",
            )
            .add(
                "tight_stable_critical",
                Tension::Tight,
                Stability::Stable,
                Health::Critical,
                "Tight tension causing critical motor health condition",
            );

        let adjustment = ScenarioGroup::new("Adjustment", Approach::Approach2)
            .add(
                "adjustment_loose",
                Tension::Loose,
                Stability::NotApplicable,
                Health::RequiresTightening,
                "Belt is loose, needs adjustment",
            )
            .add(
                "adjustment_optimal",
                Tension::Optimal,
                Stability::NotApplicable,
                Health::NoAdjustmentNeeded,
                "Belt tension is optimal",
            )
            .add(
                "adjustment_tight",
                Tension::Tight,
                Stability::NotApplicable,
                Health::RequiresLoosening,
                "Belt is too tight, needs loosening",
            );

        Self::builder()
            .add_group(stability_health)
            .add_group(adjustment)
            .build()
    }

    /// Looks up a scenario by name, ignoring case and surrounding whitespace.
    ///
    /// # Examples
    ///
    /// ```
    /// # use motordiag::engine::*;
    /// let catalog = ScenarioCatalog::standard();
    ///
    /// let err = catalog.resolve("not_a_real_scenario").unwrap_err();
    /// assert_eq!(err.available.len(), 5);
    /// ```
    pub fn resolve(&self, name: &str) -> Result<&ScenarioRecord, UnknownScenario> {
        self.index
            .get(&normalize(name))
            .map(|&slot| &self.records[slot])
            .ok_or_else(|| UnknownScenario {
                requested: name.to_owned(),
                available: self
                    .records
                    .iter()
                    .take(HINT_LIMIT)
                    .map(|r| r.identifier.clone())
                    .collect(),
            })
    }

    /// All registered identifiers, in registration order.
    pub fn list_identifiers(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.identifier.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Logs every entry, grouped as registered.
    pub fn log_available(&self) {
        info!("loaded {} scenarios", self.records.len());
        for (name, members) in &self.groups {
            info!("--- {} ---", name);
            for id in members {
                if let Ok(record) = self.resolve(id) {
                    info!("  {}: {}", record.identifier, record.description);
                }
            }
        }
    }
}

impl Default for ScenarioCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl InferenceBackend for ScenarioCatalog {
    fn name(&self) -> &str {
        "catalog"
    }

    fn infer(&self, scenario: &str) -> Result<ScenarioRecord, UnknownScenario> {
        self.resolve(scenario).cloned()
    }
}
