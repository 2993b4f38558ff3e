#![forbid(unsafe_code)]

use fbind_core::{AppContext, BinderPreparer, Observable, Signal, bindings};
use fbind_widgets::{
    IndexPath, OutlineView, OutlineViewBinding, OutlineViewPreparer, OutlineViewStorage, TreeNode,
};
use proptest::prelude::*;

fn tree() -> Vec<TreeNode<String>> {
    (0..3)
        .map(|i| {
            TreeNode::branch(
                format!("root {i}"),
                vec![
                    TreeNode::branch(format!("{i}.0"), vec![TreeNode::leaf(format!("{i}.0.0"))]),
                    TreeNode::leaf(format!("{i}.1")),
                ],
            )
        })
        .collect()
}

fn visible_paths(storage: &OutlineViewStorage, rows: usize) -> Vec<Option<IndexPath>> {
    (0..rows).map(|row| storage.index_path_for_row(row)).collect()
}

proptest! {
    #[test]
    fn replacement_preserves_visible_rows(expand in prop::collection::vec(any::<bool>(), 6)) {
        let app = AppContext::default();
        let content = Observable::new(tree());
        let (input, expansions) = Signal::channel();
        let outline = OutlineView::new(bindings![
            OutlineViewBinding::tree().observe(&content),
            OutlineViewBinding::expand().bind(expansions),
        ])
        .instance(&app);
        let storage = app
            .storage::<OutlineViewStorage>(OutlineViewPreparer::instance_key(&outline))
            .expect("storage attached");

        for (i, pair) in expand.chunks(2).enumerate() {
            if pair[0] {
                input.send(IndexPath::new(vec![i]));
            }
            if pair[1] {
                input.send(IndexPath::new(vec![i, 0]));
            }
        }
        let rows = outline.number_of_rows();
        let before = visible_paths(&storage, rows);
        prop_assert!(before.iter().all(Option::is_some));

        content.update(|roots| roots[2].value = String::from("renamed"));

        prop_assert_eq!(outline.number_of_rows(), rows);
        prop_assert_eq!(visible_paths(&storage, rows), before);
    }

    #[test]
    fn rows_and_paths_round_trip(expand in prop::collection::vec(any::<bool>(), 3)) {
        let app = AppContext::default();
        let (input, expansions) = Signal::channel();
        let outline = OutlineView::new(bindings![
            OutlineViewBinding::tree().is(tree()),
            OutlineViewBinding::expand().bind(expansions),
        ])
        .instance(&app);
        let storage = app
            .storage::<OutlineViewStorage>(OutlineViewPreparer::instance_key(&outline))
            .expect("storage attached");
        for (i, open) in expand.iter().enumerate() {
            if *open {
                input.send(IndexPath::new(vec![i, 0]));
            }
        }
        for row in 0..outline.number_of_rows() {
            let path = storage.index_path_for_row(row).expect("visible row has a path");
            prop_assert_eq!(storage.row_for_index_path(&path), Some(row));
        }
    }
}
