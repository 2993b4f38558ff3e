#![forbid(unsafe_code)]

//! Duplicate single-handler registration under each policy, observed through
//! a capturing tracing layer.

use std::sync::{Arc, Mutex};

use fbind_core::{Callback, Delegate, DuplicateHandlerPolicy, Selector};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

const SEL: Selector = Selector::new("Capture", "should_close");

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<(Level, String)>>>);

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Captured {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        struct Message(String);
        impl tracing::field::Visit for Message {
            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.0 = format!("{value:?}");
                }
            }
        }
        let mut message = Message(String::new());
        event.record(&mut message);
        if let Ok(mut log) = self.0.lock() {
            log.push((*event.metadata().level(), message.0));
        }
    }
}

fn register_twice(policy: DuplicateHandlerPolicy) -> Vec<(Level, String)> {
    let captured = Captured::default();
    let _guard = tracing_subscriber::registry()
        .with(captured.clone())
        .set_default();
    let delegate = Delegate::new(policy);
    delegate.add_single_handler(SEL, Callback::new(|()| 1u8));
    delegate.add_single_handler(SEL, Callback::new(|()| 2u8));
    assert_eq!(delegate.single_handler::<(), u8>(SEL, ()), 2);
    let log = captured.0.lock().expect("log lock").clone();
    log
}

#[test]
fn replace_policy_logs_at_debug() {
    let log = register_twice(DuplicateHandlerPolicy::Replace);
    assert!(
        log.iter()
            .any(|(level, msg)| *level == Level::DEBUG && msg.contains("replacing"))
    );
    assert!(log.iter().all(|(level, _)| *level != Level::WARN));
}

#[test]
fn warn_policy_logs_a_warning() {
    let log = register_twice(DuplicateHandlerPolicy::Warn);
    assert!(
        log.iter()
            .any(|(level, msg)| *level == Level::WARN && msg.contains("replacing"))
    );
}
