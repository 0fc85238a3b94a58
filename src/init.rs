//! Module containing initialization routines for the parameters of a model.

use crate::factor::TabularCpd;
use crate::util::{PgmError, Result};
use crate::variable::Variable;

use ndarray::prelude as nd;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

/// Defines possible ways to initialize a `Variable`s CPD.
#[derive(Clone, Debug)]
pub enum Initialization<'a> {
    /// A uniform distribution over all possibilities
    Uniform,

    /// Randomly initialize the weights of the CPD.
    Random,

    /// Initialize the CPD as a Binomial distribution with parameter ```p```, the probability of
    /// state 0. Note that this `Initialization` is valid only to a binary `Variable` with no
    /// parents.
    Binomial(f64),

    /// Initialize the CPD as a Multinomial distribution with parameters ```p_0, p_1...```.
    /// Note that this `Initialization` is valid only to a `Variable` with no parents.
    Multinomial(&'a [f64]),

    /// User defined CPD
    Table(TabularCpd)
}


impl<'a> Initialization<'a> {

    /// Construct a CPD, initialized based on ```self```
    ///
    /// # Args
    /// * `var`: the child variable
    /// * `parents`: the parents of `var`, in the column order of the resulting CPD
    ///
    /// # Errors
    /// `PgmError::InvalidInitialization` if ```self``` cannot describe a CPD of `var` given
    /// `parents`
    pub fn build_cpd(self, var: &Variable, parents: &[Variable]) -> Result<TabularCpd> {
        let columns: usize = parents.iter().map(|v| v.cardinality()).product();
        let rows = var.cardinality();

        let tbl = match self {
            // if this is a user defined CPD, it just needs to be verified and returned
            Initialization::Table(cpd) => {
                let evidence = cpd.evidence();
                let same_parents = evidence.len() == parents.len()
                    && parents.iter().all(|p| evidence.contains(p));

                if cpd.variable() != var || !same_parents {
                    return Err(PgmError::InvalidInitialization(
                        format!("the supplied CPD is not a distribution of `{}` given its parents", var)
                    ));
                }

                return Ok(cpd);
            },

            Initialization::Uniform => {
                // normalizing constant is just the number of child states
                nd::Array2::from_elem((rows, columns), 1. / (rows as f64))
            },

            Initialization::Random => {
                let tbl = nd::Array2::random((rows, columns), Uniform::new(1.0, 100.0));
                let z = tbl.sum_axis(nd::Axis(0));
                &tbl / &z
            },

            Initialization::Binomial(_) | Initialization::Multinomial(_) if !parents.is_empty() => {
                return Err(PgmError::InvalidInitialization(
                    format!("`{}` has parents, so it cannot be a binomial or multinomial", var)
                ));
            },

            Initialization::Binomial(p) => {
                // A binomial distribution on a non-binary variable
                if rows != 2 {
                    return Err(PgmError::InvalidInitialization(
                        format!("a binomial requires a binary variable, `{}` has {} states", var, rows)
                    ));
                }

                if !(0.0..=1.0).contains(&p) {
                    return Err(PgmError::InvalidInitialization(format!("{} is not a probability", p)));
                }

                ndarray::array![[p], [1.0 - p]]
            },

            Initialization::Multinomial(ps) => {
                if ps.len() != rows {
                    return Err(PgmError::InvalidInitialization(
                        format!("`{}` has {} states but {} parameters were given", var, rows, ps.len())
                    ));
                }

                nd::Array2::from_shape_fn((rows, 1), |(i, _)| ps[i])
            }
        };

        TabularCpd::new(var.clone(), parents.to_vec(), tbl)
    }

}
