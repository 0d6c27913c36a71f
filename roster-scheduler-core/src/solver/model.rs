use std::fmt;

/// Handle of a decision variable inside one [`CpModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Var(usize);

impl Var {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// `lo <= sum(coef * var) <= hi`, either bound optional.
#[derive(Debug, Clone)]
pub struct LinearConstraint {
    pub terms: Vec<(i64, Var)>,
    pub lo: Option<i64>,
    pub hi: Option<i64>,
}

/// `target = max(floor, operands...)`. The floor stands in for constant
/// operands, e.g. `excess = max(0, raw)`.
#[derive(Debug, Clone)]
pub struct MaxEquality {
    pub target: Var,
    pub operands: Vec<Var>,
    pub floor: i64,
}

#[derive(Debug, Clone)]
pub enum Constraint {
    Linear(LinearConstraint),
    MaxEquality(MaxEquality),
}

impl Constraint {
    /// Variables mentioned by the constraint, for watch lists.
    pub fn vars(&self) -> Vec<Var> {
        match self {
            Constraint::Linear(linear) => linear.terms.iter().map(|&(_, v)| v).collect(),
            Constraint::MaxEquality(me) => {
                let mut vars = vec![me.target];
                vars.extend(&me.operands);
                vars
            }
        }
    }
}

/// An integer program over bounded variables with a linear minimisation
/// objective. Variables and constraints keep creation order; the search
/// branches in that order, which makes solves reproducible.
#[derive(Debug, Default)]
pub struct CpModel {
    domains: Vec<(i64, i64)>,
    constraints: Vec<Constraint>,
    objective: Vec<(i64, Var)>,
}

impl CpModel {
    pub fn new() -> CpModel {
        CpModel::default()
    }

    pub fn new_bool(&mut self) -> Var {
        self.new_int_var(0, 1)
    }

    pub fn new_int_var(&mut self, lo: i64, hi: i64) -> Var {
        self.domains.push((lo, hi));
        Var(self.domains.len() - 1)
    }

    pub fn add_linear_leq(&mut self, terms: Vec<(i64, Var)>, rhs: i64) {
        self.add_linear(terms, None, Some(rhs));
    }

    pub fn add_linear_geq(&mut self, terms: Vec<(i64, Var)>, rhs: i64) {
        self.add_linear(terms, Some(rhs), None);
    }

    pub fn add_linear_eq(&mut self, terms: Vec<(i64, Var)>, rhs: i64) {
        self.add_linear(terms, Some(rhs), Some(rhs));
    }

    pub fn add_linear_range(&mut self, terms: Vec<(i64, Var)>, lo: i64, hi: i64) {
        self.add_linear(terms, Some(lo), Some(hi));
    }

    fn add_linear(&mut self, terms: Vec<(i64, Var)>, lo: Option<i64>, hi: Option<i64>) {
        let terms = merge_terms(terms);
        self.constraints
            .push(Constraint::Linear(LinearConstraint { terms, lo, hi }));
    }

    /// `target = max(floor, operands...)`.
    pub fn add_max_equality(&mut self, target: Var, operands: Vec<Var>, floor: i64) {
        self.constraints.push(Constraint::MaxEquality(MaxEquality {
            target,
            operands,
            floor,
        }));
    }

    /// Sets the objective; the search minimises it. Calling again replaces
    /// the previous objective.
    pub fn minimize(&mut self, terms: Vec<(i64, Var)>) {
        self.objective = merge_terms(terms);
    }

    pub fn num_vars(&self) -> usize {
        self.domains.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn domain(&self, var: Var) -> (i64, i64) {
        self.domains[var.0]
    }

    pub fn domains(&self) -> &[(i64, i64)] {
        &self.domains
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &[(i64, Var)] {
        &self.objective
    }

    /// Objective value of a complete assignment.
    pub fn objective_of(&self, values: &[i64]) -> i64 {
        self.objective
            .iter()
            .map(|(coef, var)| coef * values[var.0])
            .sum()
    }

    /// Whether a complete assignment satisfies every constraint.
    pub fn is_satisfied(&self, values: &[i64]) -> bool {
        self.constraints.iter().all(|con| match con {
            Constraint::Linear(linear) => {
                let sum: i64 = linear
                    .terms
                    .iter()
                    .map(|&(coef, var)| coef * values[var.0])
                    .sum();
                linear.hi.is_none_or(|hi| sum <= hi) && linear.lo.is_none_or(|lo| sum >= lo)
            }
            Constraint::MaxEquality(me) => {
                let max = me
                    .operands
                    .iter()
                    .map(|&v| values[v.0])
                    .fold(me.floor, i64::max);
                values[me.target.0] == max
            }
        })
    }
}

/// Sums duplicate variables and drops zero coefficients so the propagator
/// sees each variable at most once per constraint.
fn merge_terms(terms: Vec<(i64, Var)>) -> Vec<(i64, Var)> {
    let mut merged: Vec<(i64, Var)> = Vec::with_capacity(terms.len());
    for (coef, var) in terms {
        if coef == 0 {
            continue;
        }
        match merged.iter_mut().find(|(_, v)| *v == var) {
            Some((c, _)) => *c += coef,
            None => merged.push((coef, var)),
        }
    }
    merged.retain(|(c, _)| *c != 0);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(con: &Constraint) -> &LinearConstraint {
        match con {
            Constraint::Linear(linear) => linear,
            other => panic!("expected a linear constraint, got {other:?}"),
        }
    }

    #[test]
    fn merge_collapses_duplicate_vars() {
        let mut model = CpModel::new();
        let a = model.new_bool();
        let b = model.new_bool();
        model.add_linear_leq(vec![(1, a), (2, a), (1, b), (0, b)], 3);
        let con = linear(&model.constraints()[0]);
        assert_eq!(con.terms, vec![(3, a), (1, b)]);
        assert_eq!(con.hi, Some(3));
        assert_eq!(con.lo, None);
    }

    #[test]
    fn merge_drops_cancelled_terms() {
        let mut model = CpModel::new();
        let a = model.new_bool();
        let b = model.new_int_var(0, 5);
        model.add_linear_eq(vec![(1, a), (-1, a), (2, b)], 4);
        assert_eq!(linear(&model.constraints()[0]).terms, vec![(2, b)]);
    }

    #[test]
    fn objective_evaluation() {
        let mut model = CpModel::new();
        let a = model.new_bool();
        let b = model.new_int_var(0, 10);
        model.minimize(vec![(5, a), (3, b)]);
        assert_eq!(model.objective_of(&[1, 4]), 17);
    }

    #[test]
    fn satisfaction_covers_max_equality() {
        let mut model = CpModel::new();
        let raw = model.new_int_var(-3, 3);
        let excess = model.new_int_var(0, 3);
        model.add_max_equality(excess, vec![raw], 0);
        assert!(model.is_satisfied(&[-2, 0]));
        assert!(model.is_satisfied(&[2, 2]));
        assert!(!model.is_satisfied(&[2, 0]));
        assert!(!model.is_satisfied(&[-2, 1]));
    }
}
