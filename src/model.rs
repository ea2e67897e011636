//! Model-based checking of [`RbTree`] against [`BTreeSet`].

use std::collections::BTreeSet;

use arbitrary::Arbitrary;
use proptest::strategy::{Just, Strategy};

use crate::{DeleteOutcome, InsertOutcome, RbTree};

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    /// Picks the `n`th (modulo length) key currently in the model, so deletes and searches hit.
    Index(usize),
    Random(u32),
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue),
    Delete(ItemValue),
    Search(ItemValue),
    FindMin,
    Clear,
}

impl Op {
    fn finalize(self, model: &BTreeSet<u32>) -> FinalOp {
        fn get_value(set: &BTreeSet<u32>, i: ItemValue) -> u32 {
            match i {
                ItemValue::Index(idx) => match set.iter().nth(idx % set.len().max(1)) {
                    Some(&key) => key,
                    None => idx as u32,
                },
                ItemValue::Random(v) => v,
            }
        }

        match self {
            Op::Insert(item) => FinalOp::Insert(get_value(model, item)),
            Op::Delete(item) => FinalOp::Delete(get_value(model, item)),
            Op::Search(item) => FinalOp::Search(get_value(model, item)),
            Op::FindMin => FinalOp::FindMin,
            Op::Clear => FinalOp::Clear,
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Insert(u32),
    Delete(u32),
    Search(u32),
    FindMin,
    Clear,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        4 => value_strategy().prop_map(Op::Insert),
        3 => value_strategy().prop_map(Op::Delete),
        2 => value_strategy().prop_map(Op::Search),
        1 => Just(Op::FindMin),
        1 => Just(Op::Clear),
    ]
}

/// Applies `ops` to both an [`RbTree`] and a [`BTreeSet`], asserting that every outcome agrees
/// and that the tree's invariants hold after each step.
pub fn run_btree_equivalence(ops: Vec<Op>) {
    let mut btree = BTreeSet::new();
    let mut rb: RbTree<u32> = RbTree::new();

    for (op_id, op) in ops.into_iter().enumerate() {
        let final_op = op.finalize(&btree);

        match final_op {
            FinalOp::Insert(value) => {
                let from_btree = if btree.insert(value) {
                    InsertOutcome::Inserted
                } else {
                    InsertOutcome::AlreadyPresent
                };
                let from_rb = rb.insert(value);

                assert_eq!(from_btree, from_rb, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Delete(value) => {
                let from_btree = if btree.remove(&value) {
                    DeleteOutcome::Removed
                } else {
                    DeleteOutcome::NotFound
                };
                let from_rb = rb.delete(&value);

                assert_eq!(from_btree, from_rb, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Search(value) => {
                let from_btree = btree.get(&value);
                let from_rb = rb.search(&value).map(|node| node.key());

                assert_eq!(from_btree, from_rb, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::FindMin => {
                let from_btree = btree.first();
                let from_rb = rb.find_min().map(|node| node.key());

                assert_eq!(from_btree, from_rb, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Clear => {
                btree.clear();
                rb.clear();
            }
        }

        rb.assert_invariants();
        assert_eq!(btree.len(), rb.len());

        let in_order = rb
            .snapshot()
            .map(|snap| snap.in_order().into_iter().copied().collect::<Vec<_>>())
            .unwrap_or_default();
        assert!(btree.iter().copied().eq(in_order));
    }
}
