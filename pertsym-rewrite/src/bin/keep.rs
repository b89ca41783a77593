use log::{info, LevelFilter};
use pertsym_algebra::{number::frac, Dependencies, Node, Operator, Perturbation, State, TemporumType};
use pertsym_rewrite::{find_all, keep_if, remove_if, Error};
use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};
use std::collections::BTreeSet;

/// Prints the report of an error against the rendering of `expr`.
fn report(error: Error, expr: &Node) {
    error.eprint("expr", &expr.to_string()).ok();
}

fn main() {
    let level = match std::env::var("PERTSYM_LOG").as_deref() {
        Ok("trace") => LevelFilter::Trace,
        Ok("debug") => LevelFilter::Debug,
        Ok("warn") => LevelFilter::Warn,
        _ => LevelFilter::Info,
    };
    CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]).ok();

    // first-order response of a Hartree-Fock energy to an electric field
    let el = Perturbation::new("el").with_frequency(frac(1, 10)).with_components([0, 1, 2]);
    let d = Node::density(State::new("D"));
    let d_el = Node::density(State::new("D").differentiate(el.clone()));
    let h = Operator::new("h", [&el].into_iter().collect());
    let h_el = Node::one_elec_operator(h.differentiate(el.clone()));
    let g = Operator::new("G", Dependencies::new());
    let s = Node::one_elec_operator(Operator::new("S", Dependencies::new()));
    let lambda = Node::lag_multiplier(State::new("Z"));

    let t = Node::temporum(&s * &d_el, TemporumType::Ket);
    let expr = &(&(&Node::trace(&h_el * &d) + &Node::trace(&Node::one_elec_operator(h.clone()) * &d_el))
        + &Node::two_elec_energy(g, &d + &d_el, d.clone()))
        + &Node::trace(&lambda * &t);
    info!("response expression: {}", expr);

    let symbols = BTreeSet::from([d_el.clone()]);
    match find_all(&expr, &d) {
        Ok(found) => {
            for node in found {
                info!("found: {}", node);
            }
        },
        Err(error) => report(error, &expr),
    }

    match remove_if(&expr, &symbols) {
        Ok(Some(removed)) => info!("without {}: {}", d_el, removed),
        Ok(None) => info!("without {}: nothing left", d_el),
        Err(error) => report(error, &expr),
    }

    match keep_if(&expr, &symbols, true) {
        Ok(Some(kept)) => info!("only {}: {}", d_el, kept),
        Ok(None) => info!("only {}: nothing left", d_el),
        Err(error) => report(error, &expr),
    }

    let broken = &expr + &Node::function("f", vec![Node::symbol("x")]);
    if let Err(error) = keep_if(&broken, &symbols, false) {
        report(error, &broken);
    }
}
