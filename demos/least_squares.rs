//! Least Squares Regression Example
//!
//! minimize    ||Aw - b||_2^2
//!
//! Fits a line to five points, once freely and once with nonnegative
//! coefficients, and prints the compiled problem sizes.

use cvxpipe::prelude::*;

fn main() -> Result<()> {
    env_logger::init();
    println!("=== Least Squares Regression ===\n");

    #[rustfmt::skip]
    let a = constant_matrix(vec![
        1.0, 1.0, 1.0, 1.0, 1.0,
        1.0, 2.0, 3.0, 4.0, 5.0,
    ], 5, 2);
    let b = constant_vec(vec![3.1, 5.2, 6.8, 9.1, 10.9]);

    let w = named_variable("w", 2);
    let residual = matmul(&a, &w) - &b;

    let solution = Problem::minimize(sum_squares(&residual)).solve()?;
    println!("Unconstrained:");
    println!("  status: {}", solution.status);
    println!("  value:  {:.6}", solution.value.unwrap_or(f64::NAN));
    println!("  intercept = {:.6}", solution[&w][(0, 0)]);
    println!("  slope     = {:.6}", solution[&w][(1, 0)]);

    // Force a nonpositive intercept.
    let solution = Problem::minimize(sum_squares(&residual))
        .constraint(index(&w, 0).le(0.0))
        .solve()?;
    println!("\nIntercept <= 0:");
    println!("  status: {}", solution.status);
    println!("  value:  {:.6}", solution.value.unwrap_or(f64::NAN));
    if let Some(w) = solution.by_name("w") {
        println!("  intercept = {:.6}", w[(0, 0)]);
        println!("  slope     = {:.6}", w[(1, 0)]);
    }
    println!(
        "  {} columns, {} rows, solved by {} in {} iterations",
        solution.stats.num_variables,
        solution.stats.num_constraints,
        solution.stats.solver,
        solution.stats.iterations
    );
    Ok(())
}
