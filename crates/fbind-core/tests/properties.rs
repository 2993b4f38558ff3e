#![forbid(unsafe_code)]

//! Property tests for value application, delegate dispatch and the side
//! table.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use fbind_core::{
    Attachment, Callback, Delegate, Dynamic, InstanceKey, LifetimeBag, Observable, Selector,
    Signal, StorageTable,
};
use proptest::prelude::*;

const SEL: Selector = Selector::new("Prop", "notify");

fn attachment() -> Attachment {
    Attachment {
        lifetimes: LifetimeBag::new(),
        retained: Vec::new(),
        delegate: None,
        storage: Rc::new(()),
        widget: "Prop",
    }
}

proptest! {
    #[test]
    fn signal_dynamic_sees_every_value_in_order(
        values in prop::collection::vec(any::<i32>(), 0..40),
    ) {
        let (input, signal) = Signal::channel();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _lifetime = Dynamic::from(signal).apply(move |v: i32| s.borrow_mut().push(v));
        for v in &values {
            input.send(*v);
        }
        prop_assert_eq!(&*seen.borrow(), &values);
    }

    #[test]
    fn observable_dynamic_sees_initial_then_changes(
        initial in any::<u8>(),
        values in prop::collection::vec(any::<u8>(), 0..40),
    ) {
        let source = Observable::new(initial);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _lifetime = Dynamic::from(source.clone()).apply(move |v: u8| s.borrow_mut().push(v));

        let mut expected = vec![initial];
        for v in &values {
            if expected.last() != Some(v) {
                expected.push(*v);
            }
            source.set(*v);
        }
        prop_assert_eq!(&*seen.borrow(), &expected);
    }

    #[test]
    fn cancelled_dynamic_stops_for_good(before in 0usize..10, after in 1usize..10) {
        let (input, signal) = Signal::channel();
        let count = Rc::new(RefCell::new(0usize));
        let c = Rc::clone(&count);
        let mut lifetime = Dynamic::from(signal)
            .apply(move |_: ()| *c.borrow_mut() += 1)
            .expect("signal dynamics are live");
        for _ in 0..before {
            input.send(());
        }
        lifetime.cancel();
        lifetime.cancel();
        for _ in 0..after {
            input.send(());
        }
        prop_assert_eq!(*count.borrow(), before);
    }

    #[test]
    fn multi_handlers_run_in_registration_order(n in 1usize..12, arg in any::<u16>()) {
        let delegate = Delegate::default();
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..n {
            let log = Rc::clone(&log);
            delegate.add_multi_handler(
                SEL,
                Callback::new(move |a: u16| log.borrow_mut().push((i, a))),
            );
        }
        delegate.multi_handler(SEL, arg);
        let expected: Vec<(usize, u16)> = (0..n).map(|i| (i, arg)).collect();
        prop_assert_eq!(&*log.borrow(), &expected);
    }

    #[test]
    fn last_single_handler_wins(results in prop::collection::vec(any::<i64>(), 1..12)) {
        let delegate = Delegate::default();
        for r in &results {
            let r = *r;
            delegate.add_single_handler(SEL, Callback::new(move |()| r));
        }
        prop_assert_eq!(delegate.handler_count(SEL), 1);
        prop_assert_eq!(delegate.single_handler::<(), i64>(SEL, ()), *results.last().unwrap());
    }

    #[test]
    fn side_table_handles_track_liveness(
        ops in prop::collection::vec((any::<bool>(), 0u64..16), 0..80),
    ) {
        let mut table = StorageTable::new();
        let mut live = HashMap::new();
        let mut retired = Vec::new();

        for (attach, raw) in ops {
            let key = InstanceKey::new(raw);
            if attach {
                if !live.contains_key(&key) {
                    live.insert(key, table.attach(key, attachment()));
                }
            } else if table.detach(key).is_some() {
                retired.push(live.remove(&key).expect("live handle"));
            }
        }

        prop_assert_eq!(table.len(), live.len());
        for (key, handle) in &live {
            prop_assert_eq!(table.handle(*key), Some(*handle));
            prop_assert!(table.get(*handle).is_some());
        }
        for handle in &retired {
            prop_assert!(table.get(*handle).is_none());
        }
    }
}
