#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::rc::Rc;

use fbind_reactive::{Lifetime, LifetimeBag, Observable, Signal};
use proptest::prelude::*;

fn collect<T: Clone + 'static>(signal: &Signal<T>) -> (Rc<RefCell<Vec<T>>>, Lifetime) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = Rc::clone(&seen);
    let lifetime = signal.subscribe(move |v: &T| s.borrow_mut().push(v.clone()));
    (seen, lifetime)
}

proptest! {
    #[test]
    fn map_preserves_send_order(values in prop::collection::vec(-1000i32..1000, 0..32)) {
        let (input, signal) = Signal::channel();
        let doubled = signal.map(|v: &i32| v * 2);
        let (seen, _lifetime) = collect(&doubled);
        for v in &values {
            input.send(*v);
        }
        let expected: Vec<i32> = values.iter().map(|v| v * 2).collect();
        prop_assert_eq!(seen.borrow().clone(), expected);
    }

    #[test]
    fn filter_map_drops_only_rejected_values(values in prop::collection::vec(0u8..=255, 0..32)) {
        let (input, signal) = Signal::channel();
        let even = signal.filter_map(|v: &u8| (v % 2 == 0).then_some(*v));
        let (seen, _lifetime) = collect(&even);
        for v in &values {
            input.send(*v);
        }
        let expected: Vec<u8> = values.iter().copied().filter(|v| v % 2 == 0).collect();
        prop_assert_eq!(seen.borrow().clone(), expected);
    }

    #[test]
    fn merge_interleaves_in_send_order(
        sends in prop::collection::vec((any::<bool>(), 0u16..100), 0..32),
    ) {
        let (left_in, left) = Signal::<u16>::channel();
        let (right_in, right) = Signal::<u16>::channel();
        let merged = left.merge([right]);
        let (seen, _lifetime) = collect(&merged);
        for (to_left, v) in &sends {
            if *to_left {
                left_in.send(*v);
            } else {
                right_in.send(*v);
            }
        }
        let expected: Vec<u16> = sends.iter().map(|(_, v)| *v).collect();
        prop_assert_eq!(seen.borrow().clone(), expected);
    }

    #[test]
    fn bag_cancels_most_recent_first(n in 0usize..16) {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut bag = LifetimeBag::new();
        for i in 0..n {
            let o = Rc::clone(&order);
            bag.hold(Lifetime::new(move || o.borrow_mut().push(i)));
        }
        bag.cancel_all();
        let expected: Vec<usize> = (0..n).rev().collect();
        prop_assert_eq!(order.borrow().clone(), expected);
        prop_assert!(bag.is_empty());
    }

    #[test]
    fn observable_notifies_once_per_change(sets in prop::collection::vec(0u8..4, 0..32)) {
        let observable = Observable::new(0u8);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _lifetime = observable.subscribe(move |v| s.borrow_mut().push(*v));
        let mut expected = Vec::new();
        let mut current = 0u8;
        for v in &sets {
            observable.set(*v);
            if *v != current {
                expected.push(*v);
                current = *v;
            }
        }
        prop_assert_eq!(seen.borrow().clone(), expected);
        prop_assert_eq!(observable.version(), seen.borrow().len() as u64);
    }
}
