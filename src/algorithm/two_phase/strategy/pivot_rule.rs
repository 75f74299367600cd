//! # Pivot rules
//!
//! Strategies for choosing the variable that enters the basis.
//!
//! All strategies agree on which variables are attractive, they differ in how many of them are
//! looked at and how they are compared. `Dantzig` takes the largest reduced cost, `Partial` does
//! the same on a rotating section of the variables and the weighted rules divide the reduced cost
//! by (an estimate of) the norm of the transformed column.
use std::ops::Range;

use enum_map::{Enum, EnumMap};
use log::debug;

use crate::algorithm::two_phase::basis::{BasisState, VariableStatus};
use crate::algorithm::two_phase::matrix_provider::MatrixProvider;
use crate::data::linear_algebra::SparseTuple;
use crate::data::linear_algebra::vector::{inner_product, squared_norm};
use crate::error::SolveError;

/// Below this many variables, `Auto` resolves to `Devex`, at or above it to `Partial`.
const AUTO_PARTIAL_THRESHOLD: usize = 5000;
/// Weights below this value are not trusted and replaced by `1`.
const WEIGHT_FLOOR: f64 = 1e-12;
/// Bounds on the automatically chosen number of sections for partial pricing.
const MIN_SECTIONS: usize = 2;
const MAX_SECTIONS: usize = 64;

/// Deciding how to choose the entering variable.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PricingStrategy {
    /// Choose a strategy based on the problem size.
    Auto,
    /// The largest reduced cost in magnitude.
    Dantzig,
    /// The largest reduced cost in a rotating section of the variables.
    Partial,
    /// Goldfarb and Reid's steepest edge, with exactly updated reference weights.
    SteepestEdge,
    /// Forrest and Goldfarb's Devex approximation of steepest edge.
    Devex,
}

impl PricingStrategy {
    /// Replace `Auto` by a concrete strategy.
    #[must_use]
    pub fn resolve(self, nr_variables: usize) -> Self {
        match self {
            PricingStrategy::Auto if nr_variables < AUTO_PARTIAL_THRESHOLD => PricingStrategy::Devex,
            PricingStrategy::Auto => PricingStrategy::Partial,
            other => other,
        }
    }

    /// Whether this strategy keeps a weight for every variable.
    pub fn is_weighted(self) -> bool {
        matches!(self, PricingStrategy::SteepestEdge | PricingStrategy::Devex)
    }
}

/// Whether moving a nonbasic variable away from its current value improves the objective.
///
/// # Arguments
///
/// * `reduced_cost`: Reduced cost of the variable.
/// * `status`: Where the variable currently is.
/// * `tolerance`: Reduced costs smaller than this in magnitude are considered zero.
pub fn is_attractive(reduced_cost: f64, status: VariableStatus, tolerance: f64) -> bool {
    match status {
        VariableStatus::Basic(_) => false,
        VariableStatus::AtLower => reduced_cost < -tolerance,
        VariableStatus::AtUpper => reduced_cost > tolerance,
        VariableStatus::Free => reduced_cost.abs() > tolerance,
    }
}

/// Score of a variable under a weighted strategy, `|d_j| / sqrt(w_j)`.
pub fn weighted_score(reduced_cost: f64, weight: f64) -> f64 {
    let weight = if weight >= WEIGHT_FLOOR { weight } else { 1.0 };
    reduced_cost.abs() / weight.sqrt()
}

/// Select the attractive variable with the highest weighted score.
///
/// Ties are broken by index: the first one found wins.
///
/// # Arguments
///
/// * `reduced_costs`: Reduced cost of every variable.
/// * `weights`: Weight of every variable.
/// * `var_status`: Status of every variable.
/// * `tolerance`: See `is_attractive`.
pub fn select_best(
    reduced_costs: &[f64],
    weights: &[f64],
    var_status: &[VariableStatus],
    tolerance: f64,
) -> Option<usize> {
    debug_assert_eq!(reduced_costs.len(), weights.len());
    debug_assert_eq!(reduced_costs.len(), var_status.len());

    best_weighted(0..reduced_costs.len(), reduced_costs, |j| weights[j], var_status, tolerance)
}

fn best_weighted(
    candidates: impl Iterator<Item = usize>,
    reduced_costs: &[f64],
    weight: impl Fn(usize) -> f64,
    var_status: &[VariableStatus],
    tolerance: f64,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for j in candidates.filter(|&j| is_attractive(reduced_costs[j], var_status[j], tolerance)) {
        let score = weighted_score(reduced_costs[j], weight(j));
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((j, score));
        }
    }

    best.map(|(j, _)| j)
}

/// Levels at which candidates are gathered.
#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum ScanKind {
    /// A single section of the variables.
    Section,
    /// All variables, ordered by reduced cost.
    Full,
    /// All variables, ordered by weighted score.
    Weighted,
}

/// Cumulative counts of the work done by pricing.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PricingStats {
    /// Number of scans of each kind.
    pub scans: EnumMap<ScanKind, usize>,
    /// Number of variables looked at over all scans.
    pub candidates_scanned: usize,
    /// Number of times a section scan found nothing and all variables had to be scanned.
    pub full_scan_fallbacks: usize,
}

/// What changed in a basis change, as needed to update the pricing weights.
#[derive(Copy, Clone, Debug)]
pub struct PivotInfo<'a> {
    /// Variable entering the basis.
    pub entering: usize,
    /// Variable leaving the basis.
    pub leaving: usize,
    /// Row in which the basis changes.
    pub pivot_row: usize,
    /// The entering column `B^-1 a_q`, relative to the basis before the change.
    pub column: &'a [f64],
    /// Nonzero values `(j, e_r^T B^-1 a_j)` of the pivot row, for nonbasic `j`.
    pub row: &'a [SparseTuple<f64>],
}

/// State of pricing over the course of a solve.
#[derive(Clone, Debug)]
pub struct PricingContext {
    /// Never `Auto`.
    strategy: PricingStrategy,
    nr_variables: usize,

    num_sections: usize,
    /// Number of section scans so far, determines the next section.
    section_pointer: usize,
    /// Maximum number of candidates kept per level.
    limit: usize,

    /// Candidates of the last scan at each level, best first.
    candidates: EnumMap<ScanKind, Vec<usize>>,
    /// Number of candidates found by the last scan at each level, `None` if stale.
    cached_counts: EnumMap<ScanKind, Option<usize>>,

    /// Weight of every variable, weighted strategies only.
    ///
    /// Always at least `WEIGHT_FLOOR`.
    weights: Option<Vec<f64>>,
    /// Variables that may never enter again.
    excluded: Vec<bool>,

    stats: PricingStats,
}

impl PricingContext {
    /// Create a new instance.
    ///
    /// # Arguments
    ///
    /// * `strategy`: Strategy to use; `Auto` is resolved immediately.
    /// * `nr_variables`: Number of variables, including slacks and artificials.
    /// * `sections`: Number of sections for partial pricing, `0` to derive it from the size.
    /// * `limit`: Maximum number of candidates gathered per scan.
    pub fn new(strategy: PricingStrategy, nr_variables: usize, sections: usize, limit: usize) -> Self {
        let strategy = strategy.resolve(nr_variables);
        let num_sections = if sections == 0 {
            ((nr_variables as f64).sqrt() as usize).clamp(MIN_SECTIONS, MAX_SECTIONS)
        } else {
            sections
        }.min(nr_variables).max(1);

        Self {
            strategy,
            nr_variables,
            num_sections,
            section_pointer: 0,
            limit: limit.max(1),
            candidates: EnumMap::default(),
            cached_counts: EnumMap::default(),
            weights: strategy.is_weighted().then(|| vec![1.0; nr_variables]),
            excluded: vec![false; nr_variables],
            stats: PricingStats::default(),
        }
    }

    /// Choose the entering variable.
    ///
    /// Candidates of an earlier scan are reused if no invalidation happened since. A section scan
    /// that finds nothing is followed by a full scan, such that `None` means that no variable is
    /// attractive.
    ///
    /// # Arguments
    ///
    /// * `reduced_costs`: Reduced cost of every variable.
    /// * `var_status`: Status of every variable.
    /// * `tolerance`: See `is_attractive`.
    pub fn choose_entering(
        &mut self,
        reduced_costs: &[f64],
        var_status: &[VariableStatus],
        tolerance: f64,
    ) -> Option<usize> {
        debug_assert_eq!(reduced_costs.len(), self.nr_variables);
        debug_assert_eq!(var_status.len(), self.nr_variables);

        match self.strategy {
            PricingStrategy::SteepestEdge | PricingStrategy::Devex => {
                self.select_weighted(reduced_costs, var_status, tolerance)
            },
            PricingStrategy::Auto | PricingStrategy::Dantzig | PricingStrategy::Partial => {
                if let Some(j) = self.from_cache(reduced_costs, var_status, tolerance) {
                    return Some(j);
                }

                let limit = self.limit;
                let found = self.select_candidates(reduced_costs, var_status, tolerance, limit)
                    .first().copied();
                found.or_else(|| {
                    if self.strategy == PricingStrategy::Partial {
                        self.stats.full_scan_fallbacks += 1;
                        debug!("Pricing section was empty, scanning all variables");
                        self.select_candidates_full(reduced_costs, var_status, tolerance, limit)
                            .first().copied()
                    } else {
                        None
                    }
                })
            },
        }
    }

    /// Gather attractive variables, best first.
    ///
    /// For partial pricing, only the current section is scanned and the section pointer advances.
    /// All other strategies scan all variables.
    ///
    /// # Arguments
    ///
    /// * `reduced_costs`: Reduced cost of every variable.
    /// * `var_status`: Status of every variable.
    /// * `tolerance`: See `is_attractive`.
    /// * `limit`: Maximum number of candidates returned.
    ///
    /// # Return value
    ///
    /// Candidates ordered by decreasing `|d_j|`, ties in scan order.
    pub fn select_candidates(
        &mut self,
        reduced_costs: &[f64],
        var_status: &[VariableStatus],
        tolerance: f64,
        limit: usize,
    ) -> &[usize] {
        if self.strategy == PricingStrategy::Partial {
            let section = self.section_pointer % self.num_sections;
            self.section_pointer += 1;
            let range = self.section_range(section);
            self.scan(ScanKind::Section, range, reduced_costs, var_status, tolerance, limit)
        } else {
            self.select_candidates_full(reduced_costs, var_status, tolerance, limit)
        }
    }

    /// Gather attractive variables from all variables, best first.
    pub fn select_candidates_full(
        &mut self,
        reduced_costs: &[f64],
        var_status: &[VariableStatus],
        tolerance: f64,
        limit: usize,
    ) -> &[usize] {
        self.scan(ScanKind::Full, 0..self.nr_variables, reduced_costs, var_status, tolerance, limit)
    }

    /// Select the attractive variable with the best weighted score using the current weights.
    ///
    /// Without weights, all weights are taken to be `1`.
    pub fn select_weighted(
        &mut self,
        reduced_costs: &[f64],
        var_status: &[VariableStatus],
        tolerance: f64,
    ) -> Option<usize> {
        self.stats.scans[ScanKind::Weighted] += 1;
        self.stats.candidates_scanned += self.nr_variables;

        let excluded = &self.excluded;
        let weights = self.weights.as_deref();
        let chosen = best_weighted(
            (0..self.nr_variables).filter(|&j| !excluded[j]),
            reduced_costs,
            |j| weights.map_or(1.0, |weights| weights[j]),
            var_status,
            tolerance,
        );

        self.candidates[ScanKind::Weighted].clear();
        self.candidates[ScanKind::Weighted].extend(chosen);
        self.cached_counts[ScanKind::Weighted] = Some(usize::from(chosen.is_some()));

        chosen
    }

    /// Mark all cached candidates as stale.
    ///
    /// Should be called after every basis change, because all reduced costs change.
    ///
    /// # Arguments
    ///
    /// * `reset_weights`: Whether to also set all weights back to `1`, pending a recompute.
    pub fn invalidate(&mut self, reset_weights: bool) {
        for (kind, count) in self.cached_counts.iter_mut() {
            *count = None;
            self.candidates[kind].clear();
        }

        if reset_weights {
            if let Some(weights) = self.weights.as_mut() {
                weights.fill(1.0);
            }
        }
    }

    /// Drop a single variable from the cached candidates.
    ///
    /// Used when a variable moved to its other bound without a basis change, such that the
    /// reduced costs, and with them the other candidates, are still valid.
    pub fn remove_candidate(&mut self, j: usize) {
        for (kind, count) in self.cached_counts.iter_mut() {
            if count.is_some() {
                self.candidates[kind].retain(|&candidate| candidate != j);
                *count = Some(self.candidates[kind].len());
            }
        }
    }

    /// Never consider variable `j` again.
    pub fn exclude(&mut self, j: usize) {
        self.excluded[j] = true;
        self.remove_candidate(j);
    }

    /// Whether variable `j` was excluded.
    pub fn is_excluded(&self, j: usize) -> bool {
        self.excluded[j]
    }

    /// Compute the weights from scratch for the current basis.
    ///
    /// For steepest edge, `w_j = 1 + ||B^-1 a_j||^2` for every nonbasic variable. For Devex, a new
    /// reference framework is started in which all weights are `1`.
    pub fn reset_weights<MP: MatrixProvider>(
        &mut self,
        provider: &MP,
        basis: &BasisState,
    ) -> Result<(), SolveError> {
        match (self.strategy, self.weights.as_mut()) {
            (PricingStrategy::SteepestEdge, Some(weights)) => {
                for (j, weight) in weights.iter_mut().enumerate() {
                    *weight = if basis.status(j).is_basic() || self.excluded[j] {
                        1.0
                    } else {
                        let column = basis.generate_column(provider.column(j))?;
                        1.0 + squared_norm(&column)
                    };
                }
            },
            (_, Some(weights)) => weights.fill(1.0),
            (_, None) => {},
        }

        Ok(())
    }

    /// Update the weights for a basis change.
    ///
    /// Should be called before the basis changes: for steepest edge, `B^-T (B^-1 a_q)` is
    /// computed with the current basis.
    ///
    /// # Arguments
    ///
    /// * `provider`: Columns of the problem.
    /// * `basis`: The basis before the change.
    /// * `info`: The change.
    pub fn update_weights<MP: MatrixProvider>(
        &mut self,
        provider: &MP,
        basis: &BasisState,
        info: &PivotInfo,
    ) -> Result<(), SolveError> {
        let Some(weights) = self.weights.as_mut() else {
            return Ok(());
        };

        let alpha_rq = info.column[info.pivot_row];
        debug_assert!(alpha_rq != 0.0);

        let gamma_q = match self.strategy {
            PricingStrategy::SteepestEdge => {
                let gamma_q = 1.0 + squared_norm(info.column);
                let mut tau = info.column.to_vec();
                basis.btran(&mut tau)?;

                for &(j, alpha_rj) in info.row {
                    if j == info.entering || self.excluded[j] {
                        continue;
                    }
                    let ratio = alpha_rj / alpha_rq;
                    let updated = weights[j]
                        - 2.0 * ratio * inner_product(&tau, provider.column(j))
                        + ratio * ratio * gamma_q;
                    weights[j] = updated.max(1.0 + ratio * ratio);
                }
                gamma_q
            },
            _ => {
                let w_q = weights[info.entering].max(WEIGHT_FLOOR);
                for &(j, alpha_rj) in info.row {
                    if j == info.entering || self.excluded[j] {
                        continue;
                    }
                    let ratio = alpha_rj / alpha_rq;
                    weights[j] = weights[j].max(ratio * ratio * w_q);
                }
                w_q
            },
        };

        weights[info.leaving] = (gamma_q / (alpha_rq * alpha_rq)).max(1.0);

        Ok(())
    }

    /// The strategy in use, never `Auto`.
    pub fn strategy(&self) -> PricingStrategy {
        self.strategy
    }

    /// Number of candidate levels.
    pub fn num_levels(&self) -> usize {
        self.cached_counts.len()
    }

    /// Number of sections used by partial pricing.
    pub fn num_sections(&self) -> usize {
        self.num_sections
    }

    /// Number of candidates found at a level by the last scan, `None` if stale.
    pub fn cached_count(&self, kind: ScanKind) -> Option<usize> {
        self.cached_counts[kind]
    }

    /// Current weights, for the weighted strategies.
    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    /// Cumulative statistics.
    pub fn stats(&self) -> &PricingStats {
        &self.stats
    }

    /// Variables in a section; the last section absorbs the remainder.
    fn section_range(&self, section: usize) -> Range<usize> {
        debug_assert!(section < self.num_sections);

        let size = self.nr_variables / self.num_sections;
        let start = section * size;
        let end = if section == self.num_sections - 1 { self.nr_variables } else { start + size };
        start..end
    }

    fn scan(
        &mut self,
        kind: ScanKind,
        range: Range<usize>,
        reduced_costs: &[f64],
        var_status: &[VariableStatus],
        tolerance: f64,
        limit: usize,
    ) -> &[usize] {
        self.stats.scans[kind] += 1;
        self.stats.candidates_scanned += range.len();

        let excluded = &self.excluded;
        let mut found = range
            .filter(|&j| !excluded[j] && is_attractive(reduced_costs[j], var_status[j], tolerance))
            .map(|j| (j, reduced_costs[j].abs()))
            .collect::<Vec<_>>();
        // Stable, so ties remain in scan order
        found.sort_by(|(_, a), (_, b)| b.total_cmp(a));
        found.truncate(limit);

        let buffer = &mut self.candidates[kind];
        buffer.clear();
        buffer.extend(found.into_iter().map(|(j, _)| j));
        self.cached_counts[kind] = Some(buffer.len());

        &self.candidates[kind]
    }

    /// First cached candidate that is still attractive.
    fn from_cache(
        &self,
        reduced_costs: &[f64],
        var_status: &[VariableStatus],
        tolerance: f64,
    ) -> Option<usize> {
        [ScanKind::Section, ScanKind::Full].into_iter()
            .filter(|&kind| self.cached_counts[kind].is_some_and(|count| count > 0))
            .flat_map(|kind| self.candidates[kind].iter().copied())
            .find(|&j| !self.excluded[j] && is_attractive(reduced_costs[j], var_status[j], tolerance))
    }
}
