//! Property tests checking abstraction and representatives against brute force.

use add_rs::abstraction::Abstraction;
use add_rs::diagram::Diagram;
use add_rs::manager::AddManager;
use add_rs::types::Var;
use proptest::prelude::*;

const N: usize = 4;

// ─── Helpers ───────────────────────────────────────────────────────────────────

fn vars() -> Vec<Var> {
    (1..=N as u32).map(Var::new).collect()
}

/// Assignment encoded in the bits of `index`: bit `i` is the value of `x{i+1}`.
fn bits(index: usize) -> Vec<bool> {
    (0..N).map(|i| index >> i & 1 == 1).collect()
}

fn index_of(a: &[bool]) -> usize {
    a.iter().enumerate().map(|(i, &b)| (b as usize) << i).sum()
}

fn eval_at(mgr: &AddManager, f: &Diagram<'_>, index: usize) -> f64 {
    mgr.eval(f, |v| index >> (v.id() - 1) & 1 == 1)
}

fn build<'m>(mgr: &'m AddManager, values: &[f64]) -> Diagram<'m> {
    mgr.tabulate(&vars(), |a| values[index_of(a)]).unwrap()
}

fn cube_vars(mask: u8) -> Vec<Var> {
    vars().into_iter().filter(|v| mask >> (v.id() - 1) & 1 == 1).collect()
}

/// Every full assignment agreeing with `index` outside `mask`.
fn completions(index: usize, mask: u8) -> Vec<usize> {
    let mask = mask as usize;
    (0..1usize << N).filter(|&c| c & !mask == index & !mask).collect()
}

fn brute_force(op: Abstraction, values: &[f64]) -> f64 {
    match op {
        Abstraction::Exist => values.iter().sum(),
        Abstraction::Univ => values.iter().product(),
        Abstraction::Or => {
            if values.iter().any(|&v| v != 0.0) {
                1.0
            } else {
                0.0
            }
        }
        Abstraction::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        Abstraction::MinExcept0 => {
            let m = values.iter().copied().filter(|&v| v != 0.0).fold(f64::INFINITY, f64::min);
            if m.is_infinite() {
                0.0
            } else {
                m
            }
        }
        Abstraction::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}

fn operand(op: Abstraction, raw: &[u8]) -> Vec<f64> {
    match op {
        Abstraction::Or => raw.iter().map(|&v| (v % 2) as f64).collect(),
        _ => raw.iter().map(|&v| v as f64).collect(),
    }
}

// ─── Properties ────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Each abstraction equals the aggregate over all settings of the cube variables.
    #[test]
    fn abstraction_matches_brute_force(
        raw in prop::collection::vec(0u8..4, 1 << N),
        mask in 0u8..(1 << N),
    ) {
        let mgr = AddManager::default();
        let cube = mgr.cube(cube_vars(mask)).unwrap();
        for op in Abstraction::ALL {
            let values = operand(op, &raw);
            let f = build(&mgr, &values);
            let g = mgr.abstract_with(op, &f, &cube).unwrap();

            for v in mgr.support(&g) {
                prop_assert!(mask >> (v.id() - 1) & 1 == 0, "{} still depends on {}", op, v);
            }
            for index in 0..1usize << N {
                let over: Vec<f64> = completions(index, mask).iter().map(|&c| values[c]).collect();
                prop_assert_eq!(eval_at(&mgr, &g, index), brute_force(op, &over), "{} at {:?}", op, bits(index));
            }
        }
    }

    /// Abstracting two variables at once equals abstracting them one after the other.
    #[test]
    fn abstraction_is_order_independent(
        raw in prop::collection::vec(0u8..4, 1 << N),
        x in 1u32..=N as u32,
        y in 1u32..=N as u32,
    ) {
        prop_assume!(x != y);
        let mgr = AddManager::default();
        let (x, y) = (Var::new(x), Var::new(y));
        let both = mgr.cube([x, y]).unwrap();
        let cx = mgr.cube([x]).unwrap();
        let cy = mgr.cube([y]).unwrap();
        for op in Abstraction::ALL {
            let f = build(&mgr, &operand(op, &raw));
            let at_once = mgr.abstract_with(op, &f, &both).unwrap();
            let first = mgr.abstract_with(op, &f, &cx).unwrap();
            let in_turn = mgr.abstract_with(op, &first, &cy).unwrap();
            prop_assert_eq!(at_once, in_turn, "{}", op);
        }
    }

    /// Operators that fold an absent variable into itself are idempotent.
    #[test]
    fn idempotent_abstractions(
        raw in prop::collection::vec(0u8..4, 1 << N),
        mask in 0u8..(1 << N),
    ) {
        let mgr = AddManager::default();
        let cube = mgr.cube(cube_vars(mask)).unwrap();
        for op in [Abstraction::Or, Abstraction::Min, Abstraction::MinExcept0, Abstraction::Max] {
            let f = build(&mgr, &operand(op, &raw));
            let once = mgr.abstract_with(op, &f, &cube).unwrap();
            let twice = mgr.abstract_with(op, &once, &cube).unwrap();
            prop_assert_eq!(once, twice, "{}", op);
        }
    }

    /// Representatives pick exactly one extremal, false-preferring assignment.
    #[test]
    fn representatives_are_valid(
        raw in prop::collection::vec(0u8..3, 1 << N),
        mask in 0u8..(1 << N),
    ) {
        let mgr = AddManager::default();
        let values: Vec<f64> = raw.iter().map(|&v| v as f64).collect();
        let f = build(&mgr, &values);
        let cube = mgr.cube(cube_vars(mask)).unwrap();

        for max in [false, true] {
            let (w, g) = if max {
                (mgr.max_representative(&f, &cube).unwrap(), mgr.max_abstract(&f, &cube).unwrap())
            } else {
                (mgr.min_representative(&f, &cube).unwrap(), mgr.min_abstract(&f, &cube).unwrap())
            };

            for leaf in mgr.leaves(&w) {
                prop_assert!(leaf == 0.0 || leaf == 1.0);
            }
            for index in 0..1usize << N {
                let chosen: Vec<usize> = completions(index, mask)
                    .into_iter()
                    .filter(|&c| eval_at(&mgr, &w, c) == 1.0)
                    .collect();
                prop_assert_eq!(chosen.len(), 1, "no unique witness at {:?}", bits(index));
                let best = eval_at(&mgr, &g, index);
                prop_assert_eq!(values[chosen[0]], best);

                // Among all optimal completions the witness is the one that is false first.
                let optimal = completions(index, mask)
                    .into_iter()
                    .filter(|&c| values[c] == best)
                    .min_by_key(|&c| (0..N).map(|i| c >> i & 1).collect::<Vec<_>>())
                    .unwrap();
                prop_assert_eq!(chosen[0], optimal);
            }
        }
    }

    /// Equal functions built in different ways share one node.
    #[test]
    fn results_are_canonical(
        raw in prop::collection::vec(0u8..4, 1 << N),
        mask in 1u8..(1 << N),
    ) {
        let mgr = AddManager::default();
        let values: Vec<f64> = raw.iter().map(|&v| v as f64).collect();
        let f = build(&mgr, &values);
        let cube = mgr.cube(cube_vars(mask)).unwrap();
        let g = mgr.exist_abstract(&f, &cube).unwrap();

        let expected: Vec<f64> = (0..1usize << N)
            .map(|i| completions(i, mask).iter().map(|&c| values[c]).sum())
            .collect();
        let h = build(&mgr, &expected);
        prop_assert_eq!(g, h);
    }
}
