use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeSet;

const LETTERS: &[u8; 4] = b"ACGT";
const MAX_DEPTH: usize = 5;

/// Check every structural invariant of the arena.
fn validate_trie<const N: usize>(t: &MerTrie<N>) {
    let arena = &t.arena;
    assert_eq!(arena.node(ROOT_OFFSET).state, State::Internal, "root must be INTERNAL");
    assert_eq!(arena.node(FINAL_OFFSET).state, State::Final, "sentinel must be FINAL");

    let mut reachable = vec![false; arena.len()];
    reachable[ROOT_OFFSET as usize] = true;
    reachable[FINAL_OFFSET as usize] = true;

    let mut stack = vec![ROOT_OFFSET];
    while let Some(off) = stack.pop() {
        let node = arena.node(off);
        if off != ROOT_OFFSET {
            assert!(node.has_children(), "internal node {off} is a dead end");
        }
        for &e in &node.edges {
            if e == 0 || e == FINAL_OFFSET {
                continue;
            }
            assert_eq!(
                arena.node(e).state,
                State::Internal,
                "edge {off} -> {e} must target an INTERNAL node"
            );
            assert!(!reachable[e as usize], "node {e} reached twice");
            reachable[e as usize] = true;
            stack.push(e);
        }
    }

    let mut free = vec![false; arena.len()];
    let mut cur = arena.empty_head;
    while cur != 0 {
        assert!(!reachable[cur as usize], "free node {cur} is reachable");
        assert!(!free[cur as usize], "free list cycles through {cur}");
        assert_eq!(arena.node(cur).state, State::Empty, "free node {cur} must be EMPTY");
        free[cur as usize] = true;
        cur = arena.edge(cur, 0);
    }

    for (idx, node) in arena.nodes.iter().enumerate() {
        assert!(
            reachable[idx] ^ free[idx],
            "node {idx} must be either reachable or free"
        );
        if idx != FINAL_OFFSET as usize {
            assert!(!node.is_final(), "node {idx} is FINAL outside the sentinel");
        }
    }
}

/// Naive model: the list of inserted mers, prefix closure computed on demand.
#[derive(Default)]
struct Model {
    inserted: BTreeSet<Vec<u8>>,
}

impl Model {
    fn find(&self, q: &[u8]) -> Found {
        if self.inserted.iter().any(|p| q.starts_with(p)) {
            Found::HasPrefix
        } else if q.is_empty() || self.inserted.iter().any(|p| p.starts_with(q)) {
            Found::PrefixOf
        } else {
            Found::Not
        }
    }

    fn mers(&self, depth: usize) -> Vec<Vec<u8>> {
        let mut out = BTreeSet::new();
        for p in &self.inserted {
            if p.len() > depth {
                out.insert(p[..depth].to_vec());
                continue;
            }
            let mut frontier = vec![p.clone()];
            for _ in p.len()..depth {
                frontier = frontier
                    .into_iter()
                    .flat_map(|m| {
                        LETTERS.iter().map(move |&c| {
                            let mut n = m.clone();
                            n.push(c);
                            n
                        })
                    })
                    .collect();
            }
            out.extend(frontier);
        }
        if depth == 0 {
            out.insert(Vec::new());
        }
        // LETTERS is in ascending byte order, so byte order is alphabet order.
        out.into_iter().collect()
    }
}

fn mer_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(LETTERS.to_vec()), 0..=6)
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 6)]
    Insert(#[proptest(strategy = "mer_strategy()")] Vec<u8>),
    #[proptest(weight = 3)]
    Find(#[proptest(strategy = "mer_strategy()")] Vec<u8>),
    #[proptest(weight = 1)]
    Compact,
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in prop::collection::vec(any::<Op>(), 0..=200)) {
        let mut t: MerTrie<4> = MerTrie::new(LETTERS).unwrap();
        let mut m = Model::default();

        for op in ops {
            match op {
                Op::Insert(mer) => {
                    t.insert(&mer).unwrap();
                    if !mer.is_empty() {
                        m.inserted.insert(mer);
                    }
                }
                Op::Find(q) => {
                    prop_assert_eq!(t.find(&q).unwrap(), m.find(&q));
                }
                Op::Compact => {
                    t.compact();
                    prop_assert_eq!(t.free_count(), 0);
                }
            }
        }

        validate_trie(&t);
        for depth in 0..=MAX_DEPTH {
            let got = t.all_mers(depth);
            prop_assert_eq!(t.size(depth), got.len() as f64);
            prop_assert_eq!(t.count(depth), Some(got.len() as u128));
            prop_assert_eq!(got, m.mers(depth));
        }
    }

    #[test]
    fn prop_round_trip(mers in prop::collection::vec(mer_strategy(), 0..=64)) {
        let mut t: MerTrie<4> = MerTrie::new(LETTERS).unwrap();
        t.insert_all(&mers).unwrap();

        let mut buf = Vec::new();
        t.dump(&mut buf).unwrap();
        let back: MerTrie<4> = MerTrie::load(&buf[..]).unwrap();
        validate_trie(&back);
        prop_assert_eq!(&back, &t);
        prop_assert_eq!(back.node_count(), t.node_count());
        prop_assert_eq!(back.free_count(), t.free_count());

        let mut again = Vec::new();
        back.dump(&mut again).unwrap();
        prop_assert_eq!(again, buf);
    }

    #[test]
    fn prop_insert_idempotent(s in mer_strategy(), rest in prop::collection::vec(mer_strategy(), 0..=16)) {
        let mut once: MerTrie<4> = MerTrie::new(LETTERS).unwrap();
        once.insert_all(&rest).unwrap();
        let mut twice = once.clone();

        once.insert(&s).unwrap();
        twice.insert(&s).unwrap();
        twice.insert(&s).unwrap();
        prop_assert_eq!(&once, &twice);
        validate_trie(&twice);
    }

    #[test]
    fn prop_prefix_absorption_and_collapse(s in mer_strategy(), tail in mer_strategy()) {
        prop_assume!(!s.is_empty());
        let ext: Vec<u8> = s.iter().chain(tail.iter()).copied().collect();

        let mut only: MerTrie<4> = MerTrie::new(LETTERS).unwrap();
        only.insert(&s).unwrap();

        let mut absorbed = only.clone();
        absorbed.insert(&ext).unwrap();
        prop_assert_eq!(&absorbed, &only);

        let mut collapsed: MerTrie<4> = MerTrie::new(LETTERS).unwrap();
        collapsed.insert(&ext).unwrap();
        collapsed.insert(&s).unwrap();
        prop_assert_eq!(&collapsed, &only);
        validate_trie(&collapsed);

        prop_assert_eq!(only.find(&s).unwrap(), Found::HasPrefix);
        prop_assert_eq!(only.find(&ext).unwrap(), Found::HasPrefix);
    }

    #[test]
    fn prop_enumeration_sorted_unique(mers in prop::collection::vec(mer_strategy(), 0..=32), depth in 0..=MAX_DEPTH) {
        let mut t: MerTrie<4> = MerTrie::new(LETTERS).unwrap();
        t.insert_all(&mers).unwrap();
        let got = t.all_mers(depth);
        for w in got.windows(2) {
            prop_assert!(w[0] < w[1], "{:?} !< {:?}", w[0], w[1]);
        }
        prop_assert!(got.iter().all(|m| m.len() == depth));
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let mers: Vec<&[u8]> = vec![&b"A"[..], &b"AC"[..], &b"ACG"[..], &b"CG"[..], &b"CGT"[..], &b"T"[..]];

    let mut reference: MerTrie<4> = MerTrie::new(LETTERS).unwrap();
    reference.insert_all(&mers).unwrap();

    for_each_permutation(&mers, |perm| {
        let mut t: MerTrie<4> = MerTrie::new(LETTERS).unwrap();
        for mer in &perm {
            t.insert(mer).unwrap();
            validate_trie(&t);
        }
        assert_eq!(t, reference, "order {perm:?}");
        assert_eq!(t.all_mers(3), reference.all_mers(3));
    });
}
