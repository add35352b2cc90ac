//! Constraint sets as data.
//!
//! A [`ConstraintSet`] declares a circuit's signal layout and an ordered list
//! of constraints over [`Expr`] trees. The same description drives witness
//! solving, relation checking, and the public-signal layout used on the wire.
//!
//! Comparisons are only sound when both operands are known to fit the declared
//! bit width, so every comparison operand must be range-checked by an earlier
//! constraint. [`ConstraintSetBuilder`] emits those checks itself and
//! [`ConstraintSet::validate`] rejects sets that skip them.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use veridicus_core::field::MAX_COMPARISON_BITS;
use veridicus_core::{CircuitId, FieldElement};
use veridicus_crypto::poseidon::{self, MAX_ARITY};

use crate::error::ProofError;

/// Signal name to value.
pub type SignalMap = BTreeMap<String, FieldElement>;

/// An arithmetic expression over named signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Signal(String),
    Const(FieldElement),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    /// Poseidon over 1..=12 inputs.
    Hash(Vec<Expr>),
    /// Root reached from `leaf` along `siblings`, `indices[i] = 1` meaning right child.
    MerkleRoot {
        leaf: Box<Expr>,
        siblings: Vec<Expr>,
        indices: Vec<Expr>,
    },
    /// `1` if `lhs < rhs` else `0`.
    LessThan {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        bits: u32,
    },
    LessEq {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        bits: u32,
    },
    GreaterEq {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        bits: u32,
    },
}

enum EvalFailure {
    /// The set itself is broken: unknown signal, bad hash arity.
    Malformed(String),
    /// No valid assignment exists, e.g. a comparison operand wider than declared.
    Unsatisfied,
}

impl Expr {
    pub fn signal(name: impl Into<String>) -> Self {
        Self::Signal(name.into())
    }

    pub fn constant(value: u64) -> Self {
        Self::Const(FieldElement::from_u64(value))
    }

    pub fn hash(inputs: Vec<Expr>) -> Self {
        Self::Hash(inputs)
    }

    fn comparison(&self) -> Option<(&Expr, &Expr, u32)> {
        match self {
            Self::LessThan { lhs, rhs, bits }
            | Self::LessEq { lhs, rhs, bits }
            | Self::GreaterEq { lhs, rhs, bits } => Some((lhs, rhs, *bits)),
            _ => None,
        }
    }

    /// Pre-order traversal.
    fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Expr)) {
        visit(self);
        match self {
            Self::Signal(_) | Self::Const(_) => {}
            Self::Add(a, b) | Self::Sub(a, b) | Self::Mul(a, b) => {
                a.walk(visit);
                b.walk(visit);
            }
            Self::Hash(inputs) => inputs.iter().for_each(|e| e.walk(visit)),
            Self::MerkleRoot {
                leaf,
                siblings,
                indices,
            } => {
                leaf.walk(visit);
                siblings.iter().for_each(|e| e.walk(visit));
                indices.iter().for_each(|e| e.walk(visit));
            }
            Self::LessThan { lhs, rhs, .. }
            | Self::LessEq { lhs, rhs, .. }
            | Self::GreaterEq { lhs, rhs, .. } => {
                lhs.walk(visit);
                rhs.walk(visit);
            }
        }
    }

    fn eval(&self, values: &SignalMap) -> Result<FieldElement, EvalFailure> {
        Ok(match self {
            Self::Signal(name) => *values
                .get(name)
                .ok_or_else(|| EvalFailure::Malformed(format!("unknown signal {}", name)))?,
            Self::Const(c) => *c,
            Self::Add(a, b) => a.eval(values)? + b.eval(values)?,
            Self::Sub(a, b) => a.eval(values)? - b.eval(values)?,
            Self::Mul(a, b) => a.eval(values)? * b.eval(values)?,
            Self::Hash(inputs) => {
                let evaluated = inputs
                    .iter()
                    .map(|e| e.eval(values))
                    .collect::<Result<Vec<_>, _>>()?;
                poseidon::try_hash(&evaluated)
                    .map_err(|e| EvalFailure::Malformed(e.to_string()))?
            }
            Self::MerkleRoot {
                leaf,
                siblings,
                indices,
            } => {
                let mut node = leaf.eval(values)?;
                for (sibling, index) in siblings.iter().zip(indices) {
                    let sibling = sibling.eval(values)?;
                    let s = index.eval(values)?;
                    // Selector mux: s = 0 keeps (node, sibling), s = 1 swaps.
                    let left = (sibling - node) * s + node;
                    let right = (node - sibling) * s + sibling;
                    node = poseidon::hash_pair(left, right);
                }
                node
            }
            Self::LessThan { lhs, rhs, bits } => {
                compare(lhs, rhs, *bits, values, |o| o == Ordering::Less)?
            }
            Self::LessEq { lhs, rhs, bits } => {
                compare(lhs, rhs, *bits, values, |o| o != Ordering::Greater)?
            }
            Self::GreaterEq { lhs, rhs, bits } => {
                compare(lhs, rhs, *bits, values, |o| o != Ordering::Less)?
            }
        })
    }
}

fn compare(
    lhs: &Expr,
    rhs: &Expr,
    bits: u32,
    values: &SignalMap,
    holds: impl Fn(Ordering) -> bool,
) -> Result<FieldElement, EvalFailure> {
    let (a, b) = (lhs.eval(values)?, rhs.eval(values)?);
    if !a.fits_in_bits(bits) || !b.fits_in_bits(bits) {
        return Err(EvalFailure::Unsatisfied);
    }
    Ok(FieldElement::from(holds(a.to_biguint().cmp(&b.to_biguint()))))
}

impl Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        Expr::Add(Box::new(self), Box::new(rhs))
    }
}

impl Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        Expr::Sub(Box::new(self), Box::new(rhs))
    }
}

impl Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        Expr::Mul(Box::new(self), Box::new(rhs))
    }
}

/// A hard constraint. Every variant carries the label reported when it fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// Define `signal` as `expr` and constrain it to that value.
    Assign {
        label: String,
        signal: String,
        expr: Expr,
    },
    Equal {
        label: String,
        lhs: Expr,
        rhs: Expr,
    },
    /// `expr * (expr - 1) == 0`.
    Boolean { label: String, expr: Expr },
    /// `expr < 2^bits`.
    RangeCheck {
        label: String,
        expr: Expr,
        bits: u32,
    },
}

impl Constraint {
    pub fn label(&self) -> &str {
        match self {
            Self::Assign { label, .. }
            | Self::Equal { label, .. }
            | Self::Boolean { label, .. }
            | Self::RangeCheck { label, .. } => label,
        }
    }

    fn exprs(&self) -> Vec<&Expr> {
        match self {
            Self::Assign { expr, .. } | Self::Boolean { expr, .. } | Self::RangeCheck { expr, .. } => {
                vec![expr]
            }
            Self::Equal { lhs, rhs, .. } => vec![lhs, rhs],
        }
    }

    fn holds(&self, values: &SignalMap) -> Result<bool, EvalFailure> {
        Ok(match self {
            Self::Assign { signal, expr, .. } => {
                let assigned = values
                    .get(signal)
                    .ok_or_else(|| EvalFailure::Malformed(format!("unknown signal {}", signal)))?;
                expr.eval(values)? == *assigned
            }
            Self::Equal { lhs, rhs, .. } => lhs.eval(values)? == rhs.eval(values)?,
            Self::Boolean { expr, .. } => {
                let v = expr.eval(values)?;
                v.is_zero() || v == FieldElement::one()
            }
            Self::RangeCheck { expr, bits, .. } => expr.eval(values)?.fits_in_bits(*bits),
        })
    }
}

/// A circuit's signal layout and its ordered constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSet {
    pub circuit: CircuitId,
    pub private_inputs: Vec<String>,
    pub public_inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub constraints: Vec<Constraint>,
}

/// A solved assignment of every signal in a constraint set.
///
/// Private values are wiped on drop and never printed.
#[derive(Clone)]
pub struct Witness {
    pub circuit: CircuitId,
    pub values: SignalMap,
    pub public_signals: Vec<FieldElement>,
}

impl fmt::Debug for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Witness")
            .field("circuit", &self.circuit)
            .field("signals", &self.values.len())
            .field("public_signals", &self.public_signals)
            .finish()
    }
}

impl Drop for Witness {
    fn drop(&mut self) {
        self.values.values_mut().for_each(Zeroize::zeroize);
    }
}

impl ConstraintSet {
    /// Public signal names in wire order: outputs, then public inputs.
    pub fn public_signal_names(&self) -> Vec<&str> {
        self.outputs
            .iter()
            .chain(&self.public_inputs)
            .map(String::as_str)
            .collect()
    }

    pub fn public_signal_count(&self) -> usize {
        self.outputs.len() + self.public_inputs.len()
    }

    fn invalid(&self, label: &str, reason: impl fmt::Display) -> ProofError {
        ProofError::InvalidInput(format!(
            "{} constraint set, '{}': {}",
            self.circuit, label, reason
        ))
    }

    fn unsatisfied(&self, label: &str) -> ProofError {
        ProofError::WitnessUnsatisfiable {
            circuit: self.circuit,
            constraint: label.to_string(),
        }
    }

    /// Structural checks: signals defined before use, hash arities, bit widths,
    /// and a prior range check on every comparison operand.
    pub fn validate(&self) -> Result<(), ProofError> {
        let mut defined: HashSet<&str> = HashSet::new();
        for name in self.private_inputs.iter().chain(&self.public_inputs) {
            if !defined.insert(name) {
                return Err(self.invalid(name, "input declared twice"));
            }
        }

        let mut range_checked: Vec<(&Expr, u32)> = Vec::new();
        for constraint in &self.constraints {
            let label = constraint.label();
            let mut problem: Option<String> = None;
            for root in constraint.exprs() {
                root.walk(&mut |expr| {
                    if problem.is_some() {
                        return;
                    }
                    problem = self.check_expr(expr, &defined, &range_checked);
                });
            }
            if let Some(reason) = problem {
                return Err(self.invalid(label, reason));
            }

            match constraint {
                Constraint::Assign { signal, .. } => {
                    if !defined.insert(signal) {
                        return Err(self.invalid(label, format!("{} assigned twice", signal)));
                    }
                }
                Constraint::RangeCheck { expr, bits, .. } => {
                    if *bits == 0 || *bits > MAX_COMPARISON_BITS {
                        return Err(self.invalid(
                            label,
                            format!("range width {} outside 1..={}", bits, MAX_COMPARISON_BITS),
                        ));
                    }
                    range_checked.push((expr, *bits));
                }
                Constraint::Equal { .. } | Constraint::Boolean { .. } => {}
            }
        }

        let mut seen_outputs = HashSet::new();
        for output in &self.outputs {
            if !seen_outputs.insert(output) {
                return Err(self.invalid(output, "output declared twice"));
            }
            let is_input = self.private_inputs.contains(output) || self.public_inputs.contains(output);
            if is_input || !defined.contains(output.as_str()) {
                return Err(self.invalid(output, "output is never assigned"));
            }
        }
        Ok(())
    }

    fn check_expr(
        &self,
        expr: &Expr,
        defined: &HashSet<&str>,
        range_checked: &[(&Expr, u32)],
    ) -> Option<String> {
        match expr {
            Expr::Signal(name) if !defined.contains(name.as_str()) => {
                Some(format!("signal {} used before it is defined", name))
            }
            Expr::Hash(inputs) if inputs.is_empty() || inputs.len() > MAX_ARITY => Some(format!(
                "hash arity {} outside 1..={}",
                inputs.len(),
                MAX_ARITY
            )),
            Expr::MerkleRoot {
                siblings, indices, ..
            } if siblings.is_empty() || siblings.len() != indices.len() => Some(format!(
                "merkle path with {} siblings and {} indices",
                siblings.len(),
                indices.len()
            )),
            _ => {
                let (lhs, rhs, bits) = expr.comparison()?;
                if bits == 0 || bits > MAX_COMPARISON_BITS {
                    return Some(format!(
                        "comparison width {} outside 1..={}",
                        bits, MAX_COMPARISON_BITS
                    ));
                }
                let covered = |operand: &Expr| {
                    range_checked
                        .iter()
                        .any(|(checked, width)| *checked == operand && *width <= bits)
                };
                if !covered(lhs) || !covered(rhs) {
                    return Some(format!(
                        "{}-bit comparison operand is not range-checked beforehand",
                        bits
                    ));
                }
                None
            }
        }
    }

    fn check_inputs(&self, private: &SignalMap, public: &SignalMap) -> Result<(), ProofError> {
        for (given, declared, kind) in [
            (private, &self.private_inputs, "private"),
            (public, &self.public_inputs, "public"),
        ] {
            if let Some(missing) = declared.iter().find(|name| !given.contains_key(*name)) {
                return Err(ProofError::InvalidInput(format!(
                    "{}: missing {} input {}",
                    self.circuit, kind, missing
                )));
            }
            if let Some(extra) = given.keys().find(|name| !declared.contains(name)) {
                return Err(ProofError::InvalidInput(format!(
                    "{}: unexpected {} input {}",
                    self.circuit, kind, extra
                )));
            }
        }
        Ok(())
    }

    /// Compute every assigned signal, then check each constraint in order.
    ///
    /// The first violated constraint is reported by label.
    pub fn solve(&self, private: &SignalMap, public: &SignalMap) -> Result<Witness, ProofError> {
        self.check_inputs(private, public)?;

        let mut values: SignalMap = private.clone();
        values.extend(public.iter().map(|(k, v)| (k.clone(), *v)));

        for constraint in &self.constraints {
            let label = constraint.label();
            let failure = match constraint {
                Constraint::Assign { signal, expr, .. } => match expr.eval(&values) {
                    Ok(value) => {
                        values.insert(signal.clone(), value);
                        None
                    }
                    Err(e) => Some(e),
                },
                _ => match constraint.holds(&values) {
                    Ok(true) => None,
                    Ok(false) => Some(EvalFailure::Unsatisfied),
                    Err(e) => Some(e),
                },
            };
            match failure {
                None => {}
                Some(EvalFailure::Unsatisfied) => return Err(self.unsatisfied(label)),
                Some(EvalFailure::Malformed(reason)) => return Err(self.invalid(label, reason)),
            }
        }

        let public_signals = self.collect_public(&values)?;
        tracing::debug!(circuit = %self.circuit, signals = values.len(), "witness solved");
        Ok(Witness {
            circuit: self.circuit,
            values,
            public_signals,
        })
    }

    /// Re-check a complete witness against every constraint.
    pub fn check(&self, witness: &Witness) -> Result<(), ProofError> {
        if witness.circuit != self.circuit {
            return Err(ProofError::ArtifactMismatch {
                expected: self.circuit.to_string(),
                found: witness.circuit.to_string(),
            });
        }
        for constraint in &self.constraints {
            match constraint.holds(&witness.values) {
                Ok(true) => {}
                Ok(false) | Err(EvalFailure::Unsatisfied) => {
                    return Err(self.unsatisfied(constraint.label()))
                }
                Err(EvalFailure::Malformed(reason)) => {
                    return Err(self.invalid(constraint.label(), reason))
                }
            }
        }
        if self.collect_public(&witness.values)? != witness.public_signals {
            return Err(self.unsatisfied("public signals match witness"));
        }
        Ok(())
    }

    fn collect_public(&self, values: &SignalMap) -> Result<Vec<FieldElement>, ProofError> {
        self.public_signal_names()
            .into_iter()
            .map(|name| {
                values
                    .get(name)
                    .copied()
                    .ok_or_else(|| self.invalid(name, "public signal has no value"))
            })
            .collect()
    }

    /// Reject a public-signal vector that does not match the layout.
    pub fn check_public_count(&self, public_signals: &[FieldElement]) -> Result<(), ProofError> {
        if public_signals.len() != self.public_signal_count() {
            return Err(ProofError::InvalidInput(format!(
                "{} expects {} public signals, got {}",
                self.circuit,
                self.public_signal_count(),
                public_signals.len()
            )));
        }
        Ok(())
    }

    /// Named outputs taken from a wire-order public-signal vector.
    pub fn outputs_from(
        &self,
        public_signals: &[FieldElement],
    ) -> Result<BTreeMap<String, FieldElement>, ProofError> {
        self.check_public_count(public_signals)?;
        Ok(self
            .outputs
            .iter()
            .cloned()
            .zip(public_signals.iter().copied())
            .collect())
    }

    /// Serialized form stored as an artifact's circuit descriptor.
    pub fn to_descriptor(&self) -> Result<Vec<u8>, ProofError> {
        serde_json::to_vec(self).map_err(|e| ProofError::Backend(format!("encode descriptor: {}", e)))
    }

    pub fn from_descriptor(bytes: &[u8]) -> Result<Self, ProofError> {
        let set: ConstraintSet = serde_json::from_slice(bytes)
            .map_err(|e| ProofError::InvalidInput(format!("decode descriptor: {}", e)))?;
        set.validate()?;
        Ok(set)
    }
}

/// Incremental construction of a [`ConstraintSet`].
///
/// Comparison helpers range-check both operands before comparing them.
pub struct ConstraintSetBuilder {
    set: ConstraintSet,
}

impl ConstraintSetBuilder {
    pub fn new(circuit: CircuitId) -> Self {
        Self {
            set: ConstraintSet {
                circuit,
                private_inputs: Vec::new(),
                public_inputs: Vec::new(),
                outputs: Vec::new(),
                constraints: Vec::new(),
            },
        }
    }

    pub fn private(&mut self, name: impl Into<String>) -> Expr {
        let name = name.into();
        self.set.private_inputs.push(name.clone());
        Expr::Signal(name)
    }

    pub fn public(&mut self, name: impl Into<String>) -> Expr {
        let name = name.into();
        self.set.public_inputs.push(name.clone());
        Expr::Signal(name)
    }

    /// Intermediate signal `name <== expr`.
    pub fn assign(&mut self, name: impl Into<String>, expr: Expr) -> Expr {
        let name = name.into();
        self.set.constraints.push(Constraint::Assign {
            label: format!("{} assignment", name),
            signal: name.clone(),
            expr,
        });
        Expr::Signal(name)
    }

    /// Public output `name <== expr`. Outputs keep their declaration order.
    pub fn output(&mut self, name: impl Into<String>, expr: Expr) -> Expr {
        let signal = self.assign(name, expr);
        if let Expr::Signal(name) = &signal {
            self.set.outputs.push(name.clone());
        }
        signal
    }

    pub fn equal(&mut self, label: impl Into<String>, lhs: Expr, rhs: Expr) {
        self.set.constraints.push(Constraint::Equal {
            label: label.into(),
            lhs,
            rhs,
        });
    }

    pub fn boolean(&mut self, label: impl Into<String>, expr: Expr) {
        self.set.constraints.push(Constraint::Boolean {
            label: label.into(),
            expr,
        });
    }

    pub fn range(&mut self, label: impl Into<String>, expr: Expr, bits: u32) {
        self.set.constraints.push(Constraint::RangeCheck {
            label: label.into(),
            expr,
            bits,
        });
    }

    fn ensure_range(&mut self, label: String, expr: &Expr, bits: u32) {
        let covered = self.set.constraints.iter().any(|c| {
            matches!(c, Constraint::RangeCheck { expr: checked, bits: width, .. }
                if checked == expr && *width <= bits)
        });
        if !covered {
            self.range(label, expr.clone(), bits);
        }
    }

    fn guard_operands(&mut self, label: &str, lhs: &Expr, rhs: &Expr, bits: u32) {
        self.ensure_range(format!("{} (lhs range)", label), lhs, bits);
        self.ensure_range(format!("{} (rhs range)", label), rhs, bits);
    }

    pub fn less_than(&mut self, label: &str, lhs: Expr, rhs: Expr, bits: u32) -> Expr {
        self.guard_operands(label, &lhs, &rhs, bits);
        Expr::LessThan {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            bits,
        }
    }

    pub fn less_eq(&mut self, label: &str, lhs: Expr, rhs: Expr, bits: u32) -> Expr {
        self.guard_operands(label, &lhs, &rhs, bits);
        Expr::LessEq {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            bits,
        }
    }

    pub fn greater_eq(&mut self, label: &str, lhs: Expr, rhs: Expr, bits: u32) -> Expr {
        self.guard_operands(label, &lhs, &rhs, bits);
        Expr::GreaterEq {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            bits,
        }
    }

    pub fn build(self) -> Result<ConstraintSet, ProofError> {
        self.set.validate()?;
        Ok(self.set)
    }
}
