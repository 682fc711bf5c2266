//! Toy SSA arithmetic dialect backing the integration tests.
//!
//! Single flat region, one result per operation (none for `sink`), constants
//! carried as attributes. Just enough surface to exercise the framework.

#![allow(dead_code)]

use passforge::graph::ProgramGraph;
use passforge::pattern::Pattern;
use passforge::rewriter::GraphRewriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Const,
    Add,
    Mul,
    Neg,
    Sink,
}

impl OpKind {
    fn mnemonic(self) -> &'static str {
        match self {
            OpKind::Const => "const",
            OpKind::Add => "add",
            OpKind::Mul => "mul",
            OpKind::Neg => "neg",
            OpKind::Sink => "sink",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attr {
    None,
    Int(i64),
}

#[derive(Debug, Clone)]
pub struct Op {
    pub id: OpId,
    pub kind: OpKind,
    pub attr: Attr,
    pub operands: Vec<ValueId>,
    pub results: Vec<ValueId>,
}

#[derive(Debug, Clone, Default)]
pub struct TestGraph {
    ops: Vec<Op>,
    outputs: Vec<ValueId>,
    next_op: u32,
    next_value: u32,
}

impl TestGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(&mut self, value: i64) -> ValueId {
        self.append(OpKind::Const, Attr::Int(value), Vec::new())
    }

    pub fn add(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.append(OpKind::Add, Attr::None, vec![lhs, rhs])
    }

    pub fn mul(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.append(OpKind::Mul, Attr::None, vec![lhs, rhs])
    }

    pub fn neg(&mut self, operand: ValueId) -> ValueId {
        self.append(OpKind::Neg, Attr::None, vec![operand])
    }

    /// Side-effecting consumer; survives dead-op cleanup.
    pub fn sink(&mut self, operand: ValueId) -> OpId {
        let id = self.alloc_op();
        self.ops.push(Op {
            id,
            kind: OpKind::Sink,
            attr: Attr::None,
            operands: vec![operand],
            results: Vec::new(),
        });
        id
    }

    /// Marks `value` as escaping the graph.
    pub fn mark_output(&mut self, value: ValueId) {
        self.outputs.push(value);
    }

    pub fn outputs(&self) -> &[ValueId] {
        &self.outputs
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn op(&self, id: OpId) -> &Op {
        self.ops
            .iter()
            .find(|op| op.id == id)
            .expect("operation id must be live")
    }

    pub fn def_op(&self, value: ValueId) -> Option<&Op> {
        self.ops.iter().find(|op| op.results.contains(&value))
    }

    /// Constant payload of `value`'s defining op, if it is a `const`.
    pub fn const_value(&self, value: ValueId) -> Option<i64> {
        match self.def_op(value) {
            Some(op) if op.kind == OpKind::Const => match op.attr {
                Attr::Int(payload) => Some(payload),
                Attr::None => None,
            },
            _ => None,
        }
    }

    pub fn kinds(&self) -> Vec<OpKind> {
        self.ops.iter().map(|op| op.kind).collect()
    }

    /// Deterministic textual listing, for whole-graph comparisons.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for op in &self.ops {
            let operands = op
                .operands
                .iter()
                .map(|value| format!("%{}", value.0))
                .collect::<Vec<_>>()
                .join(", ");
            match (op.results.first(), &op.attr) {
                (Some(result), Attr::Int(payload)) => {
                    text.push_str(&format!("%{} = {} {}\n", result.0, op.kind.mnemonic(), payload));
                }
                (Some(result), Attr::None) => {
                    text.push_str(&format!("%{} = {} {}\n", result.0, op.kind.mnemonic(), operands));
                }
                (None, _) => {
                    text.push_str(&format!("{} {}\n", op.kind.mnemonic(), operands));
                }
            }
        }
        for output in &self.outputs {
            text.push_str(&format!("output %{}\n", output.0));
        }
        text
    }

    fn append(&mut self, kind: OpKind, attr: Attr, operands: Vec<ValueId>) -> ValueId {
        let id = self.alloc_op();
        let result = self.alloc_value();
        self.ops.push(Op {
            id,
            kind,
            attr,
            operands,
            results: vec![result],
        });
        result
    }

    fn alloc_op(&mut self) -> OpId {
        let id = OpId(self.next_op);
        self.next_op += 1;
        id
    }

    fn alloc_value(&mut self) -> ValueId {
        let value = ValueId(self.next_value);
        self.next_value += 1;
        value
    }

    fn position(&self, id: OpId) -> Option<usize> {
        self.ops.iter().position(|op| op.id == id)
    }
}

impl ProgramGraph for TestGraph {
    type OpId = OpId;
    type ValueId = ValueId;
    type OpKind = OpKind;
    type Attribute = Attr;
    type Context = ();

    fn ops_pre_order(&self) -> Vec<OpId> {
        self.ops.iter().map(|op| op.id).collect()
    }

    fn contains(&self, op: OpId) -> bool {
        self.position(op).is_some()
    }

    fn kind(&self, op: OpId) -> OpKind {
        self.op(op).kind
    }

    fn operands(&self, op: OpId) -> &[ValueId] {
        &self.op(op).operands
    }

    fn results(&self, op: OpId) -> &[ValueId] {
        &self.op(op).results
    }

    fn users(&self, value: ValueId) -> Vec<OpId> {
        self.ops
            .iter()
            .filter(|op| op.operands.contains(&value))
            .map(|op| op.id)
            .collect()
    }

    fn has_side_effects(&self, op: OpId) -> bool {
        self.op(op).kind == OpKind::Sink
    }

    fn is_live_out(&self, value: ValueId) -> bool {
        self.outputs.contains(&value)
    }

    fn replace_all_uses(&mut self, from: ValueId, to: ValueId) {
        if from == to {
            return;
        }
        for op in &mut self.ops {
            for operand in &mut op.operands {
                if *operand == from {
                    *operand = to;
                }
            }
        }
        for output in &mut self.outputs {
            if *output == from {
                *output = to;
            }
        }
    }

    fn erase_op(&mut self, op: OpId) {
        let position = self.position(op).expect("erasing an op requires it to be live");
        self.ops.remove(position);
    }

    fn create_op(
        &mut self,
        before: OpId,
        kind: OpKind,
        operands: &[ValueId],
        attribute: Attr,
    ) -> OpId {
        let position = self.position(before).expect("insertion point must be live");
        let id = self.alloc_op();
        let results = if kind == OpKind::Sink {
            Vec::new()
        } else {
            vec![self.alloc_value()]
        };
        self.ops.insert(
            position,
            Op {
                id,
                kind,
                attr: attribute,
                operands: operands.to_vec(),
                results,
            },
        );
        id
    }
}

/// Folds `add` of two constants into a fresh constant.
pub struct FoldAddOfConstants;

impl Pattern<TestGraph> for FoldAddOfConstants {
    fn root_kind(&self) -> Option<OpKind> {
        Some(OpKind::Add)
    }

    fn match_and_rewrite(&self, op: OpId, rewriter: &mut GraphRewriter<'_, TestGraph>) -> bool {
        let &[lhs, rhs] = rewriter.operands(op) else {
            return false;
        };
        let (Some(a), Some(b)) = (
            rewriter.graph().const_value(lhs),
            rewriter.graph().const_value(rhs),
        ) else {
            return false;
        };
        let folded = rewriter.create_op(op, OpKind::Const, &[], Attr::Int(a + b));
        let replacement = rewriter.results(folded)[0];
        rewriter.replace_op(op, &[replacement]);
        true
    }
}

/// Folds `neg` of a constant.
pub struct FoldNegOfConstant;

impl Pattern<TestGraph> for FoldNegOfConstant {
    fn root_kind(&self) -> Option<OpKind> {
        Some(OpKind::Neg)
    }

    fn match_and_rewrite(&self, op: OpId, rewriter: &mut GraphRewriter<'_, TestGraph>) -> bool {
        let &[operand] = rewriter.operands(op) else {
            return false;
        };
        let Some(value) = rewriter.graph().const_value(operand) else {
            return false;
        };
        let folded = rewriter.create_op(op, OpKind::Const, &[], Attr::Int(-value));
        let replacement = rewriter.results(folded)[0];
        rewriter.replace_op(op, &[replacement]);
        true
    }
}

/// Replaces a `neg` with a fresh identical `neg`, forever. Adversarial:
/// exists to prove the iteration bound holds.
pub struct RegenerateNeg;

impl Pattern<TestGraph> for RegenerateNeg {
    fn root_kind(&self) -> Option<OpKind> {
        Some(OpKind::Neg)
    }

    fn match_and_rewrite(&self, op: OpId, rewriter: &mut GraphRewriter<'_, TestGraph>) -> bool {
        let operands = rewriter.operands(op).to_vec();
        let fresh = rewriter.create_op(op, OpKind::Neg, &operands, Attr::None);
        let replacement = rewriter.results(fresh)[0];
        rewriter.replace_op(op, &[replacement]);
        true
    }
}

/// Builds `add(add(1, 2), 3)` with the outer result marked live-out.
pub fn nested_add_graph() -> TestGraph {
    let mut graph = TestGraph::new();
    let one = graph.constant(1);
    let two = graph.constant(2);
    let inner = graph.add(one, two);
    let three = graph.constant(3);
    let outer = graph.add(inner, three);
    graph.mark_output(outer);
    graph
}
