//! Portfolio Optimization Example
//!
//! Markowitz portfolio optimization with a parameterized return target:
//!
//! minimize    x' Σ x                (risk)
//! subject to  μ' x >= target        (minimum return)
//!             sum(x) = 1            (fully invested)
//!             x >= 0                (long-only)
//!
//! The problem is built once; only the parameter changes along the
//! efficient frontier.

use cvxpipe::prelude::*;

fn main() -> Result<()> {
    env_logger::init();
    println!("=== Portfolio Optimization ===\n");

    let mu = constant_vec(vec![0.12, 0.10, 0.07, 0.05]);

    #[rustfmt::skip]
    let sigma = constant_matrix(vec![
         0.04,  0.01,  0.00, -0.01,
         0.01,  0.03,  0.00,  0.00,
         0.00,  0.00,  0.02,  0.00,
        -0.01,  0.00,  0.00,  0.01,
    ], 4, 4);

    let x = nonneg_variable(4);
    let target = ParameterBuilder::scalar().name("target").build()?;

    let problem = Problem::minimize(quad_form(&x, &sigma))
        .subject_to([dot(&mu, &x).geq(&target), sum(&x).eq(1.0)])
        .build();

    println!("{:>8}  {:>8}  weights", "return", "risk");
    for t in [0.06, 0.08, 0.09, 0.10, 0.12, 0.13] {
        target.set_value(t)?;
        let solution = problem.solve()?;
        match (solution.status, solution.value) {
            (SolveStatus::Optimal, Some(variance)) => {
                let w = &solution[&x];
                println!(
                    "{:>7.1}%  {:>7.2}%  [{:.2}, {:.2}, {:.2}, {:.2}]",
                    t * 100.0,
                    variance.sqrt() * 100.0,
                    w[(0, 0)],
                    w[(1, 0)],
                    w[(2, 0)],
                    w[(3, 0)]
                );
            }
            (status, _) => println!("{:>7.1}%  {}", t * 100.0, status),
        }
    }
    Ok(())
}
