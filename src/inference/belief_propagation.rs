//! Defines an inference engine that calibrates a `JunctionTree` by two-pass message passing.
//!
//! Implementation of Koller & Friedman Algorithm 10.2 (Sum-Product Clique Tree Calibration) and
//! its max-product counterpart from Section 13.3.

use crate::factor::Factor;
use crate::model::junction_tree::JunctionTree;
use crate::util::{PgmError, Result};
use crate::variable::{Assignment, VariableSet};
use super::variable_elimination::VariableElimination;
use super::{ConditionalInference, MapInference, Semiring};

use approx::AbsDiffEq;
use indexmap::IndexMap;
use log::{debug, trace};

/// Exact inference by message passing over a `JunctionTree`
///
/// Calibration computes a belief for every clique and separator. On a calibrated tree, adjacent
/// cliques agree on the distribution of the variables they share. Beliefs are discarded whenever
/// a potential is replaced; calibration is never incremental.
#[derive(Clone, Debug)]
pub struct BeliefPropagation {

    /// The tree holding the clique potentials
    tree: JunctionTree,

    /// The result of the last calibration, if it is still valid
    calibration: Option<Calibration>

}


/// The beliefs computed by one calibration
#[derive(Clone, Debug)]
struct Calibration {

    /// The semiring the messages were passed in
    semiring: Semiring,

    /// The belief of every clique, in clique order
    cliques: Vec<Factor>,

    /// The belief of every separator, in edge order
    sepsets: Vec<Factor>

}


impl BeliefPropagation {

    pub fn new(tree: JunctionTree) -> Self {
        BeliefPropagation { tree, calibration: None }
    }


    pub fn tree(&self) -> &JunctionTree {
        &self.tree
    }


    /// Calibrate the tree with sum-product messages. Each clique belief is then the unnormalized
    /// marginal of the clique's variables.
    pub fn calibrate(&mut self) -> Result<()> {
        self.run(Semiring::SumProduct)
    }


    /// Calibrate the tree with max-product messages. Each clique belief is then the unnormalized
    /// max-marginal of the clique's variables.
    pub fn max_calibrate(&mut self) -> Result<()> {
        self.run(Semiring::MaxProduct)
    }


    /// The semiring of the current calibration
    pub fn semiring(&self) -> Option<Semiring> {
        self.calibration.as_ref().map(|c| c.semiring)
    }


    /// The belief of every clique, keyed by its variables
    ///
    /// # Errors
    /// `PgmError::NotCalibrated` if the tree has not been calibrated since it last changed
    pub fn get_clique_beliefs(&self) -> Result<IndexMap<VariableSet, Factor>> {
        let calibration = self.calibration()?;

        Ok(self.tree
               .cliques()
               .iter()
               .cloned()
               .zip(calibration.cliques.iter().cloned())
               .collect())
    }


    /// The belief of every separator, keyed by its variables. Two edges may share the same
    /// separator; on a calibrated tree their beliefs agree and the first edge's is kept.
    ///
    /// # Errors
    /// `PgmError::NotCalibrated` if the tree has not been calibrated since it last changed
    pub fn get_sepset_beliefs(&self) -> Result<IndexMap<VariableSet, Factor>> {
        let calibration = self.calibration()?;
        let mut beliefs = IndexMap::new();

        for (&(a, b), belief) in self.tree.edges().iter().zip(calibration.sepsets.iter()) {
            if let Some(sepset) = self.tree.sepset(a, b) {
                beliefs.entry(sepset).or_insert_with(|| belief.clone());
            }
        }

        Ok(beliefs)
    }


    /// The belief of the separator between cliques `a` and `b`
    ///
    /// # Errors
    /// * `PgmError::NotCalibrated` if the tree has not been calibrated since it last changed
    /// * `PgmError::InvalidStructure` if the cliques are not adjacent
    pub fn sepset_belief(&self, a: usize, b: usize) -> Result<&Factor> {
        let calibration = self.calibration()?;

        self.tree
            .edges()
            .iter()
            .position(|&e| e == (a, b) || e == (b, a))
            .and_then(|i| calibration.sepsets.get(i))
            .ok_or_else(|| PgmError::InvalidStructure(format!("cliques {} and {} are not adjacent", a, b)))
    }


    /// Check that the beliefs of every pair of adjacent cliques agree on their separator, up to
    /// `tolerance` relative to the scale of the beliefs. An uncalibrated tree is not calibrated.
    /// `util::CALIBRATION_TOLERANCE` is a sensible default.
    pub fn is_calibrated(&self, tolerance: f64) -> bool {
        let calibration = match self.calibration.as_ref() {
            Some(c) => c,
            None => return false
        };

        let scale = calibration.cliques.iter().map(|b| b.max_value()).fold(1.0, f64::max);

        self.tree.edges().iter().all(|&(a, b)| {
            let sepset = match self.tree.sepset(a, b) {
                Some(s) => s,
                None => return false
            };

            let projected = calibration.semiring.project(&calibration.cliques[a], &sepset)
                .and_then(|x| calibration.semiring.project(&calibration.cliques[b], &sepset).map(|y| (x, y)));

            match projected {
                Ok((x, y)) => x.abs_diff_eq(&y, tolerance * scale),
                Err(_) => false
            }
        })
    }


    /// Replace the potential of `clique`, discarding any beliefs
    ///
    /// # Errors
    /// * `PgmError::InvalidStructure` if there is no such clique or the factor is not over
    ///   exactly its variables
    /// * `PgmError::CardinalityMismatch` if the factor disagrees with the rest of the tree
    pub fn update_potential(&mut self, clique: &VariableSet, factor: Factor) -> Result<()> {
        let i = self.tree
                    .clique_index(clique)
                    .ok_or_else(|| PgmError::InvalidStructure(format!("there is no clique {}", clique)))?;

        self.tree.set_potential(i, factor)?;
        self.calibration = None;
        Ok(())
    }


    fn calibration(&self) -> Result<&Calibration> {
        self.calibration.as_ref().ok_or(PgmError::NotCalibrated)
    }


    /// Pass messages towards the root and back out, then compute every belief
    fn run(&mut self, semiring: Semiring) -> Result<()> {
        self.calibration = None;

        let (parent, preorder) = traversal(&self.tree);
        debug!("calibrating {} cliques from root {} by {:?}", preorder.len(), self.tree.cliques()[0], semiring);

        let mut messages: IndexMap<(usize, usize), Factor> = IndexMap::new();

        // collect: every clique reports to its parent once all of its children have
        for &i in preorder.iter().rev() {
            if let Some(p) = parent[i] {
                let msg = self.message(semiring, &messages, i, p)?;
                messages.insert((i, p), msg);
            }
        }

        // distribute: every clique informs its children once its parent has
        for &i in preorder.iter() {
            for &c in self.tree.neighbors(i).iter().filter(|&&c| parent[c] == Some(i)) {
                let msg = self.message(semiring, &messages, i, c)?;
                messages.insert((i, c), msg);
            }
        }

        let cliques = (0..self.tree.num_cliques())
            .map(|i| {
                let incoming = self.incoming(&messages, i, None)?;
                self.potential(i)?.product(&Factor::product_all(incoming)?)
            })
            .collect::<Result<Vec<Factor>>>()?;

        let sepsets = self.tree
                          .edges()
                          .iter()
                          .map(|&(a, b)| semiring.project(&cliques[a], &self.separator(a, b)?))
                          .collect::<Result<Vec<Factor>>>()?;

        debug!("calibrated {} cliques with {} messages", cliques.len(), messages.len());
        self.calibration = Some(Calibration { semiring, cliques, sepsets });
        Ok(())
    }


    /// The message from clique `from` to its neighbour `to`
    fn message(
        &self,
        semiring: Semiring,
        messages: &IndexMap<(usize, usize), Factor>,
        from: usize,
        to: usize
    ) -> Result<Factor> {
        let incoming = self.incoming(messages, from, Some(to))?;
        let psi = self.potential(from)?.product(&Factor::product_all(incoming)?)?;
        let sepset = self.separator(from, to)?;

        trace!("message {} -> {} over {}", self.tree.cliques()[from], self.tree.cliques()[to], sepset);
        semiring.project(&psi, &sepset)
    }


    /// The messages clique `i` has received, from every neighbour but `except`
    fn incoming<'a>(
        &self,
        messages: &'a IndexMap<(usize, usize), Factor>,
        i: usize,
        except: Option<usize>
    ) -> Result<Vec<&'a Factor>> {
        self.tree
            .neighbors(i)
            .iter()
            .filter(|&&k| Some(k) != except)
            .map(|&k| messages.get(&(k, i)).ok_or_else(|| {
                PgmError::InvalidStructure(format!("clique {} has not heard from clique {}", i, k))
            }))
            .collect()
    }


    fn potential(&self, i: usize) -> Result<&Factor> {
        self.tree
            .potential(i)
            .ok_or_else(|| PgmError::InvalidStructure(format!("there is no clique {}", i)))
    }


    fn separator(&self, a: usize, b: usize) -> Result<VariableSet> {
        self.tree
            .sepset(a, b)
            .ok_or_else(|| PgmError::InvalidStructure(format!("there is no edge {} - {}", a, b)))
    }


    /// An engine over the product of the clique potentials
    fn eliminator(&self) -> Result<VariableElimination> {
        VariableElimination::new(self.tree.potentials().to_vec())
    }


    /// Answer a query from a single clique belief, if the tree is sum-calibrated and some clique
    /// holds every queried variable
    fn from_belief(&self, variables: &[&str]) -> Option<Result<Factor>> {
        let calibration = self.calibration.as_ref().filter(|c| c.semiring == Semiring::SumProduct)?;

        let query: VariableSet = variables.iter().collect();
        if query.len() != variables.len() {
            return None;
        }

        let i = self.tree.cliques().iter().position(|c| query.is_subset(c))?;
        trace!("answering {} from the belief of {}", query, self.tree.cliques()[i]);

        let belief = &calibration.cliques[i];
        let others: Vec<&str> = belief.names().filter(|v| !query.contains(v)).collect();

        Some(belief.marginalize(&others)
                   .and_then(|phi| phi.reorder(variables))
                   .and_then(|phi| phi.normalize().map_err(|_| PgmError::InconsistentEvidence)))
    }

}


/// Visit the tree depth first from the root, clique 0
///
/// # Returns
/// the parent of every clique, and the cliques in the order they were visited
fn traversal(tree: &JunctionTree) -> (Vec<Option<usize>>, Vec<usize>) {
    let n = tree.num_cliques();
    let mut parent = vec![None; n];
    let mut visited = vec![false; n];
    let mut preorder = Vec::with_capacity(n);

    let mut stack = vec![0];
    visited[0] = true;
    while let Some(i) = stack.pop() {
        preorder.push(i);
        for &j in tree.neighbors(i).iter() {
            if !visited[j] {
                visited[j] = true;
                parent[j] = Some(i);
                stack.push(j);
            }
        }
    }

    (parent, preorder)
}


impl ConditionalInference for BeliefPropagation {

    fn query(&self, variables: &[&str], evidence: &Assignment) -> Result<Factor> {
        if variables.is_empty() {
            return Err(PgmError::EmptyQuery);
        }

        if evidence.is_empty() {
            if let Some(result) = self.from_belief(variables) {
                return result;
            }
        }

        self.eliminator()?.query(variables, evidence)
    }

}


impl MapInference for BeliefPropagation {

    fn map_query(&self, variables: Option<&[&str]>, evidence: &Assignment) -> Result<Assignment> {
        self.eliminator()?.map_query(variables, evidence)
    }

    fn max_marginal(&self, variables: Option<&[&str]>, evidence: &Assignment) -> Result<f64> {
        self.eliminator()?.max_marginal(variables, evidence)
    }

}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::tests::student_tree;
    use crate::model::junction_tree::JunctionTreeBuilder;
    use crate::util::CALIBRATION_TOLERANCE;
    use crate::variable::Variable;
    use approx::assert_abs_diff_eq;
    use ndarray::prelude as nd;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn counting(scope: &[(&str, usize)]) -> Factor {
        let scope: Vec<Variable> = scope.iter().map(|&(n, c)| Variable::discrete(n, c)).collect();
        let size: usize = scope.iter().map(|v| v.cardinality()).product();
        Factor::from_values(scope, (0..size).map(|x| x as f64).collect()).unwrap()
    }

    /// (A, B) - (B, C) - (C, D)
    fn chain() -> (Factor, Factor, Factor, BeliefPropagation) {
        let phi1 = counting(&[("A", 2), ("B", 3)]);
        let phi2 = counting(&[("B", 3), ("C", 2)]);
        let phi3 = counting(&[("C", 2), ("D", 2)]);

        let tree = JunctionTreeBuilder::new()
            .with_edge(VariableSet::from(["A", "B"]), VariableSet::from(["B", "C"]))
            .with_edge(VariableSet::from(["B", "C"]), VariableSet::from(["C", "D"]))
            .with_factor(phi1.clone())
            .with_factor(phi2.clone())
            .with_factor(phi3.clone())
            .build()
            .unwrap();

        (phi1, phi2, phi3, BeliefPropagation::new(tree))
    }

    /// (A, B, C) - (B, C, D), (B, C, D) - (C, E) and (B, C, D) - (D, F) with random potentials
    fn random_tree(seed: u64) -> BeliefPropagation {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut random = |scope: &[(&str, usize)]| {
            let scope: Vec<Variable> = scope.iter().map(|&(n, c)| Variable::discrete(n, c)).collect();
            let shape: Vec<usize> = scope.iter().map(|v| v.cardinality()).collect();
            let table = nd::ArrayD::random_using(nd::IxDyn(&shape), Uniform::new(0.1, 1.0), &mut rng);
            Factor::new(scope, table).unwrap()
        };

        let tree = JunctionTreeBuilder::new()
            .with_edge(VariableSet::from(["A", "B", "C"]), VariableSet::from(["B", "C", "D"]))
            .with_edge(VariableSet::from(["B", "C", "D"]), VariableSet::from(["C", "E"]))
            .with_edge(VariableSet::from(["B", "C", "D"]), VariableSet::from(["D", "F"]))
            .with_factor(random(&[("A", 2), ("B", 3), ("C", 2)]))
            .with_factor(random(&[("C", 2), ("B", 3), ("D", 2)]))
            .with_factor(random(&[("E", 3), ("C", 2)]))
            .with_factor(random(&[("D", 2), ("F", 2)]))
            .with_factor(random(&[("D", 2), ("B", 3), ("C", 2)]))
            .build()
            .unwrap();

        BeliefPropagation::new(tree)
    }

    #[test]
    fn calibrate_clique_beliefs() {
        let (phi1, phi2, phi3, mut bp) = chain();
        bp.calibrate().unwrap();
        let beliefs = bp.get_clique_beliefs().unwrap();

        let d = phi3.marginalize(&["D"]).unwrap();
        let a = phi1.marginalize(&["A"]).unwrap();

        let b_ab = phi1.product(&d.product(&phi2).unwrap().marginalize(&["C"]).unwrap()).unwrap();
        let b_bc = phi2.product(&a.product(&d).unwrap()).unwrap();
        let b_cd = phi3.product(&a.product(&phi2).unwrap().marginalize(&["B"]).unwrap()).unwrap();

        assert_eq!(3, beliefs.len());
        assert_abs_diff_eq!(b_ab, beliefs[&VariableSet::from(["A", "B"])], epsilon = 1e-9);
        assert_abs_diff_eq!(b_bc, beliefs[&VariableSet::from(["B", "C"])], epsilon = 1e-9);
        assert_abs_diff_eq!(b_cd, beliefs[&VariableSet::from(["C", "D"])], epsilon = 1e-9);
        assert!(bp.is_calibrated(CALIBRATION_TOLERANCE));
    }

    #[test]
    fn calibrate_sepset_beliefs() {
        let (_, _, _, mut bp) = chain();
        bp.calibrate().unwrap();
        let cliques = bp.get_clique_beliefs().unwrap();
        let sepsets = bp.get_sepset_beliefs().unwrap();

        let b_b = cliques[&VariableSet::from(["A", "B"])].marginalize(&["A"]).unwrap();
        let b_c = cliques[&VariableSet::from(["B", "C"])].marginalize(&["B"]).unwrap();

        assert_eq!(2, sepsets.len());
        assert_abs_diff_eq!(b_b, sepsets[&VariableSet::from(["B"])], epsilon = 1e-9);
        assert_abs_diff_eq!(b_c, sepsets[&VariableSet::from(["C"])], epsilon = 1e-9);

        // either side of the separator gives the same belief
        let b_c = cliques[&VariableSet::from(["C", "D"])].marginalize(&["D"]).unwrap();
        assert_abs_diff_eq!(&b_c, bp.sepset_belief(2, 1).unwrap(), epsilon = 1e-9);
        assert!(bp.sepset_belief(0, 2).is_err());
    }

    #[test]
    fn calibrate_twice() {
        let (_, _, _, mut bp) = chain();
        bp.calibrate().unwrap();
        let first = bp.get_clique_beliefs().unwrap();

        bp.calibrate().unwrap();
        assert_eq!(first, bp.get_clique_beliefs().unwrap());
    }

    #[test]
    fn stale_beliefs() {
        let (_, _, _, mut bp) = chain();
        assert_eq!(Err(PgmError::NotCalibrated), bp.get_clique_beliefs());
        assert_eq!(Err(PgmError::NotCalibrated), bp.get_sepset_beliefs());
        assert!(!bp.is_calibrated(CALIBRATION_TOLERANCE));

        bp.calibrate().unwrap();
        assert_eq!(Some(Semiring::SumProduct), bp.semiring());

        let uniform = Factor::from_values(
            vec![ Variable::discrete("C", 2), Variable::discrete("D", 2) ],
            vec![ 1., 1., 1., 1. ]
        ).unwrap();
        bp.update_potential(&VariableSet::from(["D", "C"]), uniform.clone()).unwrap();
        assert_eq!(Err(PgmError::NotCalibrated), bp.get_clique_beliefs());
        assert_eq!(None, bp.semiring());

        // C and D are independent of A and B now
        bp.calibrate().unwrap();
        let d = bp.query(&["D"], &Assignment::new()).unwrap();
        assert_abs_diff_eq!(0.5, d.values()[0], epsilon = 1e-12);

        match bp.update_potential(&VariableSet::from(["A", "D"]), uniform) {
            Err(PgmError::InvalidStructure(_)) => (),
            other => panic!("incorrect result {:?}", other)
        };
        assert!(bp.is_calibrated(CALIBRATION_TOLERANCE));
    }

    #[test]
    fn matches_brute_force() {
        for seed in 0..4 {
            let mut bp = random_tree(seed);
            let joint = Factor::product_all(bp.tree().potentials()).unwrap();
            bp.calibrate().unwrap();
            assert!(bp.is_calibrated(CALIBRATION_TOLERANCE));

            for (clique, belief) in bp.get_clique_beliefs().unwrap() {
                let others: Vec<&str> = joint.names().filter(|v| !clique.contains(v)).collect();
                assert_abs_diff_eq!(joint.marginalize(&others).unwrap(), belief, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn max_calibrate() {
        for seed in 0..4 {
            let mut bp = random_tree(seed);
            let joint = Factor::product_all(bp.tree().potentials()).unwrap();
            bp.max_calibrate().unwrap();
            assert_eq!(Some(Semiring::MaxProduct), bp.semiring());
            assert!(bp.is_calibrated(CALIBRATION_TOLERANCE));

            for (clique, belief) in bp.get_clique_beliefs().unwrap() {
                let others: Vec<&str> = joint.names().filter(|v| !clique.contains(v)).collect();
                assert_abs_diff_eq!(joint.maximize(&others).unwrap(), belief, epsilon = 1e-9);
            }

            // every clique agrees on the value of the best assignment
            let best = joint.max_value();
            for belief in bp.get_clique_beliefs().unwrap().values() {
                assert_abs_diff_eq!(best, belief.max_value(), epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn query_across_cliques() {
        let mut bp = random_tree(7);
        bp.calibrate().unwrap();
        let ve = VariableElimination::new(bp.tree().potentials().to_vec()).unwrap();

        // within a clique, out of order
        let within = bp.query(&["C", "A"], &Assignment::new()).unwrap();
        assert_eq!(vec!["C", "A"], within.names().collect::<Vec<_>>());
        assert_abs_diff_eq!(ve.query(&["C", "A"], &Assignment::new()).unwrap(), within, epsilon = 1e-9);

        // spanning cliques, and with evidence
        let across = bp.query(&["A", "F"], &Assignment::new()).unwrap();
        assert_abs_diff_eq!(ve.query(&["A", "F"], &Assignment::new()).unwrap(), across, epsilon = 1e-9);

        let evidence = Assignment::new().with("E", 2);
        let conditioned = bp.query(&["B"], &evidence).unwrap();
        assert_abs_diff_eq!(ve.query(&["B"], &evidence).unwrap(), conditioned, epsilon = 1e-9);

        assert_eq!(Err(PgmError::DuplicateVariable(String::from("A"))), bp.query(&["A", "A"], &Assignment::new()));
    }

    #[test]
    fn shared_separators() {
        let mut bp = BeliefPropagation::new(student_tree());
        bp.calibrate().unwrap();

        // both edges separate on J
        let sepsets = bp.get_sepset_beliefs().unwrap();
        assert_eq!(1, sepsets.len());
        assert_abs_diff_eq!(bp.sepset_belief(0, 1).unwrap(), bp.sepset_belief(0, 2).unwrap(), epsilon = 1e-12);
        assert_abs_diff_eq!(0.416, sepsets[&VariableSet::from(["J"])].values()[0], epsilon = 1e-9);
    }
}
