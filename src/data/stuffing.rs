//! Matrix stuffing: lays a canonicalized problem out as `ProblemData`.

use std::collections::BTreeMap;

use log::{debug, trace};
use nalgebra::DVector;
use nalgebra_sparse::CscMatrix;

use super::inverse::{ConstraintRows, InverseData, RowBlock, VariableSlot};
use super::{CompileOptions, ConeDims, ProblemData};
use crate::canon::{canonicalize, AffineExpr, CanonProblem, ConeConstraint, QuadraticExpr};
use crate::error::Result;
use crate::expr::ExprId;
use crate::problem::Problem;
use crate::sparse::{csc_upper_triangle, Triplets};

/// Compile `problem` into solver data and the inverse mapping.
///
/// With `options.verify` the DCP verifier runs first and a violation is
/// returned as `Error::NotDcp`. `options.solver` is not consulted here.
pub fn compile(problem: &Problem, options: &CompileOptions) -> Result<(ProblemData, InverseData)> {
    if options.verify {
        problem.verify()?;
    }
    let canon = canonicalize(problem)?;
    Ok(stuff(&canon))
}

/// Column offset of every variable, user variables first.
fn column_map(canon: &CanonProblem) -> (BTreeMap<ExprId, usize>, Vec<VariableSlot>, usize) {
    let mut offsets = BTreeMap::new();
    let mut slots = Vec::with_capacity(canon.variables.len());
    let mut n = 0;
    for v in &canon.variables {
        offsets.insert(v.id, n);
        slots.push(VariableSlot {
            id: v.id,
            name: v.label(),
            shape: v.shape.clone(),
            offset: n,
        });
        n += v.shape.size();
    }
    for (id, shape) in &canon.aux {
        offsets.insert(*id, n);
        n += shape.size();
    }
    (offsets, slots, n)
}

fn stuff(canon: &CanonProblem) -> (ProblemData, InverseData) {
    let (offsets, slots, n) = column_map(canon);

    let (c, p, offset) = stuff_objective(&canon.objective, &offsets, n);

    // Group cone constraints in the order the cone block expects.
    let order = ["zero", "nonneg", "soc", "exp", "power", "psd"];
    let mut grouped: Vec<usize> = (0..canon.constraints.len()).collect();
    grouped.sort_by_key(|&i| {
        let kind = canon.constraints[i].kind_name();
        order.iter().position(|k| *k == kind).unwrap_or(order.len())
    });

    let mut dims = ConeDims::default();
    let mut rows_of: Vec<Option<ConstraintRows>> = vec![None; canon.constraints.len()];
    let (mut eq_rows, mut cone_rows) = (0, 0);
    for &i in &grouped {
        let cone = &canon.constraints[i];
        let len = cone.rows();
        match cone {
            ConeConstraint::Zero(_) => {
                dims.zero += len;
                rows_of[i] = Some(ConstraintRows {
                    block: RowBlock::Equality,
                    start: eq_rows,
                    len,
                });
                eq_rows += len;
                continue;
            }
            ConeConstraint::NonNeg(_) => dims.nonneg += len,
            ConeConstraint::Soc { .. } => dims.soc.push(len),
            ConeConstraint::Exp { x, .. } => dims.exp += x.size(),
            ConeConstraint::Power { x, alpha, .. } => {
                dims.power.extend(std::iter::repeat(*alpha).take(x.size()))
            }
            ConeConstraint::Psd { n, .. } => dims.psd.push(*n),
        }
        rows_of[i] = Some(ConstraintRows {
            block: RowBlock::Cone,
            start: cone_rows,
            len,
        });
        cone_rows += len;
    }

    let mut a = Triplets::new(eq_rows, n);
    let mut b = DVector::zeros(eq_rows);
    let mut g = Triplets::new(cone_rows, n);
    let mut h = DVector::zeros(cone_rows);
    for (i, cone) in canon.constraints.iter().enumerate() {
        let Some(rows) = &rows_of[i] else { continue };
        let u = cone.stacked();
        match rows.block {
            // u = Mx + d = 0  ⇒  A = M, b = -d
            RowBlock::Equality => {
                place(&mut a, &u, rows.start, &offsets, 1.0);
                b.rows_mut(rows.start, rows.len).copy_from(&(-&u.constant));
            }
            // s = u = Mx + d ∈ K  ⇒  G = -M, h = d
            RowBlock::Cone => {
                place(&mut g, &u, rows.start, &offsets, -1.0);
                h.rows_mut(rows.start, rows.len).copy_from(&u.constant);
            }
        }
    }

    let constraints = canon
        .constraint_map
        .iter()
        .filter_map(|&i| rows_of[i].clone())
        .collect();

    let data = ProblemData {
        c,
        p,
        a: a.build(),
        b,
        g: g.build(),
        h,
        dims,
        offset,
    };
    debug!(
        "stuffed problem: {} variables, {} equality rows, {} cone rows, nnz(A)={}, nnz(G)={}",
        n,
        eq_rows,
        cone_rows,
        data.a.nnz(),
        data.g.nnz()
    );
    trace!("cone dims: {:?}", data.dims);

    let inverse = InverseData {
        variables: slots,
        num_columns: n,
        num_rows: eq_rows + cone_rows,
        num_eq_rows: eq_rows,
        objective_sign: canon.objective_sign,
        p: data.p.clone(),
        c: data.c.clone(),
        offset,
        constraints,
    };
    (data, inverse)
}

fn place(
    t: &mut Triplets,
    u: &AffineExpr,
    row_offset: usize,
    offsets: &BTreeMap<ExprId, usize>,
    sign: f64,
) {
    for (id, m) in &u.coeffs {
        if let Some(&col) = offsets.get(id) {
            for (i, j, v) in m.triplet_iter() {
                t.push(row_offset + i, col + j, sign * v);
            }
        }
    }
}

/// `c`, the upper triangle of `P`, and the offset.
///
/// `Σ xᵢᵀQᵢⱼxⱼ = xᵀMx = ½ xᵀ(M + Mᵀ)x`, so `P = M + Mᵀ`.
fn stuff_objective(
    objective: &QuadraticExpr,
    offsets: &BTreeMap<ExprId, usize>,
    n: usize,
) -> (DVector<f64>, Option<CscMatrix<f64>>, f64) {
    let mut c = DVector::zeros(n);
    for (id, row) in &objective.linear.coeffs {
        if let Some(&col) = offsets.get(id) {
            for (_, j, v) in row.triplet_iter() {
                c[col + j] += v;
            }
        }
    }
    let offset = objective.linear.constant[0];

    if objective.is_linear() {
        return (c, None, offset);
    }
    let mut m = Triplets::new(n, n);
    for ((i, j), q) in &objective.quad {
        if let (Some(&ri), Some(&cj)) = (offsets.get(i), offsets.get(j)) {
            for (r, k, v) in q.triplet_iter() {
                m.push(ri + r, cj + k, *v);
                m.push(cj + k, ri + r, *v);
            }
        }
    }
    (c, Some(csc_upper_triangle(&m.build())), offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::{norm2, sum, sum_squares};
    use crate::constraints::ConstraintExt;
    use crate::error::Error;
    use crate::expr::{constant_vec, variable, VariableExt};
    use crate::sparse::csc_to_dense;

    #[test]
    fn test_lp_layout() {
        let x = variable(2).named("x");
        let problem = Problem::minimize(sum(&x))
            .subject_to([sum(&x).eq(1.0), x.ge(0.0)])
            .build();
        let (data, inverse) = compile(&problem, &CompileOptions::default()).unwrap();
        data.validate().unwrap();

        assert_eq!(data.c.as_slice(), &[1.0, 1.0]);
        assert!(data.p.is_none());
        assert_eq!(data.dims.zero, 1);
        assert_eq!(data.dims.nonneg, 2);
        assert_eq!(data.b.as_slice(), &[1.0]);
        assert_eq!(csc_to_dense(&data.g), -nalgebra::DMatrix::<f64>::identity(2, 2));

        assert_eq!(inverse.variables[0].name, "x");
        assert_eq!(inverse.constraints[0].block, RowBlock::Equality);
        assert_eq!(inverse.constraints[1].block, RowBlock::Cone);
        assert_eq!(inverse.constraints[1].range(), 0..2);
        assert_eq!(inverse.num_aux(), 0);
    }

    #[test]
    fn test_least_squares_objective() {
        let x = variable(2);
        let b = constant_vec(vec![1.0, 2.0]);
        let problem = Problem::minimize(sum_squares(&(&x - &b))).build();
        let (data, _) = compile(&problem, &CompileOptions::default()).unwrap();
        data.validate().unwrap();
        // ‖x - b‖² = xᵀx - 2bᵀx + bᵀb
        let p = csc_to_dense(data.p.as_ref().unwrap());
        assert_eq!(p, nalgebra::DMatrix::<f64>::identity(2, 2) * 2.0);
        assert_eq!(data.c.as_slice(), &[-2.0, -4.0]);
        assert_eq!(data.offset, 5.0);
    }

    #[test]
    fn test_cones_are_ordered() {
        let x = variable(3);
        let problem = Problem::minimize(norm2(&x))
            .subject_to([x.ge(1.0)])
            .build();
        let (data, inverse) = compile(&problem, &CompileOptions::default()).unwrap();
        data.validate().unwrap();
        assert_eq!(data.dims.nonneg, 3);
        assert_eq!(data.dims.soc, vec![4]);
        // the user constraint comes first among the cone rows
        assert_eq!(inverse.constraints[0].range(), 0..3);
        assert_eq!(inverse.num_aux(), 1);
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let x = variable(3);
        let problem = Problem::minimize(norm2(&x) + sum_squares(&x))
            .subject_to([sum(&x).eq(1.0)])
            .build();
        let (d1, _) = compile(&problem, &CompileOptions::default()).unwrap();
        let (d2, _) = compile(&problem, &CompileOptions::default()).unwrap();
        assert_eq!(d1, d2);
    }

    #[test]
    fn test_verification_is_optional() {
        let x = variable(2);
        let problem = Problem::maximize(norm2(&x))
            .subject_to([x.le(1.0), x.ge(-1.0)])
            .build();
        assert!(matches!(
            compile(&problem, &CompileOptions::default()),
            Err(Error::NotDcp { .. })
        ));
        assert!(compile(&problem, &CompileOptions::unchecked()).is_ok());
    }
}
