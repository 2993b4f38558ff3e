#![forbid(unsafe_code)]

use fbind_headless::{NativePopUpButton, Rect};
use proptest::prelude::*;

proptest! {
    #[test]
    fn selection_is_always_a_selectable_item(
        pulls_down in any::<bool>(),
        count in 0usize..8,
        picks in prop::collection::vec(0usize..10, 0..20),
    ) {
        let popup = NativePopUpButton::new(Rect::ZERO, pulls_down);
        popup.set_items((0..count).map(|i| format!("item {i}")).collect());
        for pick in picks {
            popup.select_item_at(pick);
            if let Some(selected) = popup.index_of_selected_item() {
                prop_assert!(selected < count);
                prop_assert!(!(pulls_down && selected == 0));
                prop_assert_eq!(selected, pick);
            }
        }
    }

    #[test]
    fn pull_down_title_is_first_item(count in 1usize..8) {
        let popup = NativePopUpButton::new(Rect::ZERO, true);
        popup.set_items((0..count).map(|i| format!("item {i}")).collect());
        prop_assert_eq!(popup.title(), "item 0");
    }
}
