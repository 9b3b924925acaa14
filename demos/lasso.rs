//! Lasso Regression Example
//!
//! minimize    ||Ax - b||_2^2 + λ ||x||_1
//!
//! Sweeps λ and reports how many coefficients survive.

use cvxpipe::prelude::*;
use nalgebra::DMatrix;

fn main() -> Result<()> {
    env_logger::init();
    println!("=== Lasso Regression ===\n");

    let (m, n) = (20, 8);
    // deterministic pseudo-random design
    let a = DMatrix::from_fn(m, n, |i, j| (((i * 13 + j * 7) % 17) as f64 - 8.0) / 8.0);
    let truth = nalgebra::DVector::from_vec(vec![1.5, 0.0, -2.0, 0.0, 0.0, 0.7, 0.0, 0.0]);
    let b = &a * &truth;

    let x = variable(n);
    let lambda = ParameterBuilder::scalar().name("lambda").nonneg().build()?;
    let fit = sum_squares(&(matmul(&constant_dmatrix(a), &x) - constant_vec(b.as_slice().to_vec())));
    let problem = Problem::minimize(fit + &lambda * &norm1(&x)).build();

    for l in [0.0, 0.5, 2.0, 8.0, 32.0] {
        lambda.set_value(l)?;
        let solution = problem.solve()?;
        let Some(coef) = solution.get(&x) else {
            println!("λ = {:>5.1}: {}", l, solution.status);
            continue;
        };
        let nonzero = coef.iter().filter(|v| v.abs() > 1e-4).count();
        println!(
            "λ = {:>5.1}: value {:>9.4}, {} nonzero, x = {:.3?}",
            l,
            solution.value.unwrap_or(f64::NAN),
            nonzero,
            coef.as_slice()
        );
    }
    Ok(())
}
