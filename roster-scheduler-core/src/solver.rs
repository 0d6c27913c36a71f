//! Constraint model and solving backend. The roster builder only depends
//! on the capability exposed here: Boolean/integer variables, linear
//! constraints, a linear objective, and a time-limited solve returning a
//! status plus values and a log stream. Any engine honouring
//! [`search::Backend`] can replace the in-tree branch-and-bound.

pub mod model;
pub mod search;
