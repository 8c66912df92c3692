//! Drives the bridge end to end: registers a root, applies a couple of
//! instruction batches, simulates a user dragging the slider, and prints the
//! events that come back out of the channel.
//!
//! Run with `RUST_LOG=debug` to watch property dispatch decisions.

use casement_bridge::{ChildInsert, EventDispatcher, Instruction, ManagerRegistry, UiManagerModule};
use casement_core::{Size, Tag};
use casement_host::UiDispatcher;
use serde_json::json;

fn main() {
    env_logger::init();

    let ui = UiDispatcher::spawn();
    let (events, rx) = EventDispatcher::channel();
    let module = UiManagerModule::new(ui.clone(), ManagerRegistry::with_builtins(), events);

    module
        .register_root(
            Tag::new(1),
            Size {
                width: 800.0,
                height: 600.0,
            },
        )
        .unwrap();

    let report = module
        .dispatch_batch(vec![
            Instruction::Create {
                tag: Tag::new(2),
                class: "Panel".into(),
                props: json!({
                    "backgroundColor": "#202840",
                    "overflow": "hidden",
                    "width": 400.0,
                    "height": 200.0,
                    "opacity": 0.95,
                }),
            },
            Instruction::Create {
                tag: Tag::new(3),
                class: "Slider".into(),
                props: json!({
                    "minimumValue": 0.0,
                    "maximumValue": 10.0,
                    "value": 3.0,
                    "height": 40.0,
                }),
            },
            Instruction::Create {
                tag: Tag::new(4),
                class: "Label".into(),
                props: json!({ "text": "Volume", "fontSize": 16.0 }),
            },
            Instruction::ManageChildren {
                parent: Tag::new(1),
                insert: vec![ChildInsert {
                    tag: Tag::new(2),
                    index: 0,
                }],
                remove_at: vec![],
            },
            Instruction::ManageChildren {
                parent: Tag::new(2),
                insert: vec![
                    ChildInsert {
                        tag: Tag::new(4),
                        index: 0,
                    },
                    ChildInsert {
                        tag: Tag::new(3),
                        index: 1,
                    },
                ],
                remove_at: vec![],
            },
        ])
        .unwrap();
    println!("batch applied, clean = {}", report.is_clean());

    // Simulated user interaction on the UI thread.
    ui.run(|host| {
        let slider = host.resolve(Tag::new(3)).unwrap();
        host.slider_drag_to(slider, 7.0).unwrap();
        host.pointer_released(slider);
    });

    for event in rx.try_iter() {
        println!("event tag={} {} {}", event.tag, event.name, event.payload);
    }
}
