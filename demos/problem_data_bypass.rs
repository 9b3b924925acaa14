//! Solving Through Problem Data
//!
//! Compiles a problem once, then calls the solver directly on the cached
//! data. Verification and canonicalization are paid for only once.

use std::time::Instant;

use cvxpipe::prelude::*;

fn main() -> Result<()> {
    env_logger::init();

    let n = 30;
    let x = variable(n);
    let c = constant_vec((0..n).map(|i| (i as f64 * 0.37).sin()).collect());
    let problem = Problem::minimize(dot(&c, &x) + norm2(&x))
        .subject_to([x.ge(-1.0), x.le(1.0), sum(&x).eq(0.0)])
        .build();

    let direct = problem.solve()?;
    let t = direct.stats.timings;
    println!("solve():");
    println!("  status {} value {:?}", direct.status, direct.value);
    println!(
        "  verify {:?} canonicalize {:?} dispatch {:?} solve {:?} unpack {:?}",
        t.verify, t.canonicalize, t.dispatch, t.solve, t.unpack
    );

    let start = Instant::now();
    let (data, chain, inverse) =
        problem.get_problem_data_with(&SolverRegistry::default(), &CompileOptions::unchecked())?;
    println!("\ncompiled in {:?}", start.elapsed());
    println!("  keys {:?}", data.keys());
    println!(
        "  {} variables, {} constraints, {} problem for {}",
        data.num_variables(),
        data.num_constraints(),
        data.class().kind(),
        chain.solver_name()
    );

    let settings = Settings::default();
    let start = Instant::now();
    let rounds = 20;
    let mut last = None;
    for _ in 0..rounds {
        let raw = chain.solve_via_data(&data, &settings)?;
        last = Some(problem.unpack_results(&raw, &chain, &inverse));
    }
    println!("\n{} solves via data in {:?}", rounds, start.elapsed());
    if let Some(bypass) = last {
        println!("  status {} value {:?}", bypass.status, bypass.value);
        println!("  identical to solve(): {}", bypass.value == direct.value);
    }
    Ok(())
}
