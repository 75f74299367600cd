//! # Reinversion
//!
//! Rebuild the product form of the inverse from the columns of the basic variables. Unit columns
//! that sit in their own row need no factor; all other columns are transformed by the factors
//! written so far and pivoted in one by one.
use crate::algorithm::two_phase::basis::decomposition::pivoting::Markowitz;
use crate::algorithm::two_phase::basis::eta_file::{EtaFile, EtaKind};
use crate::algorithm::two_phase::basis::FactorTolerances;
use crate::algorithm::two_phase::matrix_provider::MatrixProvider;
use crate::data::linear_algebra::vector::scatter;
use crate::error::SolveError;

mod pivoting;

/// Result of rebuilding the factors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) struct Reinversion {
    /// Variable that is basic in each row.
    pub basic_vars: Vec<usize>,
    /// Previously basic variables that turned out to be dependent on the others.
    pub rejected: Vec<usize>,
    /// Unit columns that took the place of the rejected variables.
    pub inserted: Vec<usize>,
}

/// Write a fresh set of factors for a basis.
///
/// The result depends only on the set of basic variables, not on the rows they were in.
///
/// # Arguments
///
/// * `provider`: Source of the columns.
/// * `basic_vars`: The variables to build a basis from.
/// * `eta_file`: Empty file to write the factors to.
/// * `threshold`: Relative pivot threshold, see `Markowitz::choose_row`.
/// * `tolerances`: Absolute pivot and storage tolerances.
pub(super) fn reinvert<MP: MatrixProvider>(
    provider: &MP,
    basic_vars: &[usize],
    eta_file: &mut EtaFile,
    threshold: f64,
    tolerances: FactorTolerances,
) -> Result<Reinversion, SolveError> {
    debug_assert!(eta_file.is_empty());

    let m = provider.nr_rows();
    let mut assigned = vec![None; m];
    let mut remaining = Vec::new();
    for &j in basic_vars {
        match provider.unit_row(j) {
            Some(i) if assigned[i].is_none() => assigned[i] = Some(j),
            _ => remaining.push(j),
        }
    }
    remaining.sort_unstable();

    let columns = remaining.iter()
        .map(|&j| provider.column(j).collect::<Vec<_>>())
        .collect::<Vec<_>>();
    let mut markowitz = Markowitz::new(&columns, assigned.iter().map(Option::is_some).collect());

    let mut rejected = Vec::new();
    while let Some(k) = markowitz.next_column() {
        let mut alpha = scatter(columns[k].iter().copied(), m);
        eta_file.ftran(&mut alpha)?;

        let row = markowitz.choose_row(&alpha, threshold, tolerances.pivot);
        match row {
            Some(row) => {
                eta_file.push_column(EtaKind::Refactorization, row, &alpha, tolerances.zero)?;
                assigned[row] = Some(remaining[k]);
            },
            None => rejected.push(remaining[k]),
        }
        markowitz.eliminate(k, row);
    }

    let mut inserted = Vec::new();
    let basic_vars = assigned.into_iter().enumerate()
        .map(|(i, j)| j.unwrap_or_else(|| {
            let unit = provider.unit_column_of_row(i);
            inserted.push(unit);
            unit
        }))
        .collect();

    Ok(Reinversion { basic_vars, rejected, inserted })
}
