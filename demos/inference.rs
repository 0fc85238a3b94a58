//! Provides an example of how to use pgm-exact to perform inference on a Bayesian Network, first
//! by variable elimination and then by calibrating a junction tree of the same network.
//!
//! Run with `RUST_LOG=debug` to see the elimination orders and calibration.

use ndarray::array;
use pgm_exact as p;
use p::{ConditionalInference, MapInference};

fn main() -> p::Result<()> {
    env_logger::init();

    let difficulty = p::Variable::binary("D");
    let intelligence = p::Variable::binary("I");
    let grade = p::Variable::discrete("G", 3);
    let sat = p::Variable::binary("S");
    let letter = p::Variable::binary("L");

    let scope = StudentVariables(difficulty, intelligence, grade, sat, letter);

    /////////////////////////////////////////////////////
    // Step 1: Build Model
    let model = build_model(scope)?;

    /////////////////////////////////////////////////////
    // Step 2: Compile some evidence
    let evidence = p::Assignment::new().with("D", 0).with("L", 1).with("S", 0);

    /////////////////////////////////////////////////////
    // Step 3: Build an inference engine
    let engine = p::VariableElimination::for_directed(&model)
        .with_heuristic(p::EliminationHeuristic::MinFill);

    println!("elimination order: {:?}", engine.elimination_order(&["I"], &evidence)?);

    /////////////////////////////////////////////////////
    // Step 4: Run a Conditional Query
    let phi = engine.query(&["I"], &evidence)?;
    let vars = phi.scope().to_vec();
    for assignment in p::all_assignments(&vars) {
        println!("P({} | D = 0, S = 0, L = 1) = {:.4}", assignment, phi.value(&assignment)?);
    }

    /////////////////////////////////////////////////////
    // Step 5: Run a MAP Query
    let map = engine.map_query(None, &evidence)?;
    println!("MAP(G, I | D = 0, S = 0, L = 1) = {}", map);
    println!("P(MAP | D = 0, S = 0, L = 1) = {:.4}", engine.max_marginal(None, &evidence)?);

    /////////////////////////////////////////////////////
    // Step 6: Calibrate a junction tree of the same network
    let mut bp = p::BeliefPropagation::new(build_tree(&model)?);
    bp.calibrate()?;

    for (clique, belief) in bp.get_clique_beliefs()? {
        println!("belief of {}:\n{}", clique, belief);
    }

    let phi = bp.query(&["G"], &p::Assignment::new())?;
    println!("P(G) =\n{}", phi);

    Ok(())
}

struct StudentVariables(p::Variable, p::Variable, p::Variable, p::Variable, p::Variable);

/// The student network of Koller & Friedman Figure 3.4
fn build_model(vars: StudentVariables) -> p::Result<p::DirectedModel> {
    let StudentVariables(d, i, g, s, l) = vars;

    ///////////////////////////////////////////////////
    // Step 1: Build CPTs for variables with parents
    let cpt_g = p::TabularCpd::new(
        g.clone(),
        vec![i.clone(), d.clone()],
        array![
            [0.3, 0.05, 0.9, 0.5],
            [0.4, 0.25, 0.08, 0.3],
            [0.3, 0.7, 0.02, 0.2]
        ]
    )?;

    let cpt_s = p::TabularCpd::new(
        s.clone(),
        vec![i.clone()],
        array![
            [0.95, 0.2],
            [0.05, 0.8]
        ]
    )?;

    let cpt_l = p::TabularCpd::new(
        l.clone(),
        vec![g.clone()],
        array![
            [0.1, 0.4, 0.99],
            [0.9, 0.6, 0.01]
        ]
    )?;

    ///////////////////////////////////////////////////
    // Step 2: Build the Model
    p::DirectedModelBuilder::new()
        .with_variable(&d, &[], p::Initialization::Binomial(0.6))
        .with_variable(&i, &[], p::Initialization::Binomial(0.7))
        .with_variable(&g, &[i.clone(), d], p::Initialization::Table(cpt_g))
        .with_variable(&s, &[i], p::Initialization::Table(cpt_s))
        .with_variable(&l, &[g], p::Initialization::Table(cpt_l))
        .build()
}

/// Cliques (D, I, G) - (I, S) and (D, I, G) - (G, L)
fn build_tree(model: &p::DirectedModel) -> p::Result<p::JunctionTree> {
    let cpd = |name: &str| {
        model.cpd(name)
             .map(|c| c.to_factor())
             .ok_or_else(|| p::PgmError::UnknownVariable(name.to_string()))
    };

    p::JunctionTreeBuilder::new()
        .with_edge(p::VariableSet::from(["D", "I", "G"]), p::VariableSet::from(["I", "S"]))
        .with_edge(p::VariableSet::from(["D", "I", "G"]), p::VariableSet::from(["G", "L"]))
        .with_factor(p::Factor::product_all(&[cpd("D")?, cpd("I")?, cpd("G")?])?)
        .with_factor(cpd("S")?)
        .with_factor(cpd("L")?)
        .build()
}
