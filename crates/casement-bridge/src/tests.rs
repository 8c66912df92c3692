#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crossbeam_channel::Receiver;
    use serde_json::json;

    use casement_core::{Size, Tag};
    use casement_host::{DragContent, DragFile, UiDispatcher};

    use crate::events::{EventDispatcher, UiEvent};
    use crate::manager::{CommandError, ManagerRegistry};
    use crate::uimanager::{ChildInsert, Instruction, UiManagerError, UiManagerModule};

    const ROOT: Tag = Tag::new(1);

    fn module() -> (UiManagerModule, Receiver<UiEvent>) {
        let ui = UiDispatcher::spawn();
        let (events, rx) = EventDispatcher::channel();
        let module = UiManagerModule::new(ui, ManagerRegistry::with_builtins(), events);
        module
            .register_root(
                ROOT,
                Size {
                    width: 800.0,
                    height: 600.0,
                },
            )
            .unwrap();
        (module, rx)
    }

    fn create(tag: i64, class: &str, props: serde_json::Value) -> Instruction {
        Instruction::Create {
            tag: Tag::new(tag),
            class: class.to_string(),
            props,
        }
    }

    fn insert_under(parent: Tag, tag: i64, index: usize) -> Instruction {
        Instruction::ManageChildren {
            parent,
            insert: vec![ChildInsert {
                tag: Tag::new(tag),
                index,
            }],
            remove_at: vec![],
        }
    }

    #[test]
    fn test_slider_batch_end_to_end() {
        let (module, _rx) = module();
        let report = module
            .dispatch_batch(vec![
                create(
                    5,
                    "Slider",
                    json!({
                        "minimumValue": 0.0,
                        "maximumValue": 10.0,
                        "value": 3.0,
                        "width": 200.0,
                        "height": 40.0,
                    }),
                ),
                insert_under(ROOT, 5, 0),
            ])
            .unwrap();
        assert!(report.is_clean());

        let (range, bounds, is_first_child) = module.ui().run(|host| {
            let root = host.resolve(ROOT).unwrap();
            let handle = host.resolve(Tag::new(5)).unwrap();
            let slider = host.slider(handle).unwrap();
            (
                (slider.minimum, slider.maximum, slider.value),
                host.bounds(handle).unwrap(),
                host.child_at(root, 0).unwrap() == handle,
            )
        });
        assert_eq!(range, (0.0, 10.0, 3.0));
        assert_eq!((bounds.width, bounds.height), (200.0, 40.0));
        assert!(is_first_child);
    }

    #[test]
    fn test_unknown_props_skip_and_coercion_failures_isolate() {
        let (module, _rx) = module();
        let report = module
            .dispatch_batch(vec![create(
                5,
                "Panel",
                json!({
                    "opacity": 0.4,
                    "somePropFromTheFuture": {"nested": true},
                    "zIndex": "not-a-number",
                }),
            )])
            .unwrap();

        // The unknown key is silently skipped; the bad zIndex is the only
        // reported failure; opacity still applied.
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].prop, "zIndex");
        assert_eq!(report.failures[0].tag, Tag::new(5));

        let opacity = module.ui().run(|host| {
            let handle = host.resolve(Tag::new(5)).unwrap();
            host.view(handle).unwrap().opacity
        });
        assert_eq!(opacity, 0.4);
    }

    #[test]
    fn test_explicit_null_restores_declared_default() {
        let (module, _rx) = module();
        module
            .dispatch_batch(vec![create(5, "Panel", json!({"opacity": 0.4}))])
            .unwrap();
        module
            .dispatch_batch(vec![Instruction::UpdateProps {
                tag: Tag::new(5),
                props: json!({"opacity": null}),
            }])
            .unwrap();
        let opacity = module.ui().run(|host| {
            let handle = host.resolve(Tag::new(5)).unwrap();
            host.view(handle).unwrap().opacity
        });
        assert_eq!(opacity, 1.0);
    }

    #[test]
    fn test_transform_primitive_selection_through_batches() {
        let (module, _rx) = module();
        module
            .dispatch_batch(vec![
                create(5, "Panel", json!({"width": 100.0, "height": 50.0})),
                insert_under(ROOT, 5, 0),
            ])
            .unwrap();

        let update = |props: serde_json::Value| {
            module
                .dispatch_batch(vec![Instruction::UpdateProps {
                    tag: Tag::new(5),
                    props,
                }])
                .unwrap()
        };
        let native_state = || {
            module.ui().run(|host| {
                let handle = host.resolve(Tag::new(5)).unwrap();
                (
                    host.render_translation(handle).unwrap(),
                    host.projection(handle).unwrap().is_some(),
                )
            })
        };

        update(json!({"transform": [{"translateX": 10.0}]}));
        assert_eq!(native_state(), (Some((10.0, 0.0)), false));

        update(json!({"transform": [{"rotate": "45deg"}]}));
        assert_eq!(native_state(), (None, true));

        update(json!({"transform": null}));
        assert_eq!(native_state(), (None, false));
    }

    #[test]
    fn test_overflow_clip_follows_layout_resizes() {
        let (module, _rx) = module();
        module
            .dispatch_batch(vec![
                create(
                    5,
                    "Panel",
                    json!({"width": 100.0, "height": 50.0, "overflow": "hidden"}),
                ),
                insert_under(ROOT, 5, 0),
            ])
            .unwrap();

        let clip = |module: &UiManagerModule| {
            module.ui().run(|host| {
                let handle = host.resolve(Tag::new(5)).unwrap();
                host.clip(handle)
                    .unwrap()
                    .map(|s| (s.width, s.height))
            })
        };
        assert_eq!(clip(&module), Some((100.0, 50.0)));

        module
            .dispatch_batch(vec![Instruction::UpdateProps {
                tag: Tag::new(5),
                props: json!({"width": 300.0}),
            }])
            .unwrap();
        assert_eq!(clip(&module), Some((300.0, 50.0)));

        module
            .dispatch_batch(vec![Instruction::UpdateProps {
                tag: Tag::new(5),
                props: json!({"overflow": "visible"}),
            }])
            .unwrap();
        assert_eq!(clip(&module), None);
        let has_listener = module.ui().run(|host| {
            let handle = host.resolve(Tag::new(5)).unwrap();
            host.has_resize_listener(handle)
        });
        assert!(!has_listener);
    }

    #[test]
    fn test_remove_subtree_releases_every_resource() {
        let (module, rx) = module();
        module
            .dispatch_batch(vec![
                create(5, "Panel", json!({"overflow": "hidden", "width": 100.0, "height": 100.0})),
                create(6, "Slider", json!({"allowDrop": true, "transform": [{"scale": 2.0}]})),
                insert_under(ROOT, 5, 0),
                insert_under(Tag::new(5), 6, 0),
            ])
            .unwrap();

        let handler_count = module.ui().run(|host| {
            let slider = host.resolve(Tag::new(6)).unwrap();
            host.handler_count(slider)
        });
        assert!(handler_count > 0);
        assert!(!module.aux().is_empty());

        module
            .dispatch_batch(vec![Instruction::RemoveSubtree { tag: Tag::new(5) }])
            .unwrap();

        let (count, resolved_five, resolved_six, root_children) = module.ui().run(|host| {
            let root = host.resolve(ROOT).unwrap();
            (
                host.view_count(),
                host.resolve(Tag::new(5)),
                host.resolve(Tag::new(6)),
                host.child_count(root).unwrap(),
            )
        });
        assert_eq!(count, 1); // only the root remains
        assert_eq!(resolved_five, None);
        assert_eq!(resolved_six, None);
        assert_eq!(root_children, 0);
        assert!(module.aux().is_empty());

        // Events for the removed nodes are dropped silently.
        assert!(!module.events().is_live(Tag::new(6)));
        module.events().dispatch(UiEvent {
            tag: Tag::new(6),
            name: "topChange".into(),
            payload: json!({}),
        });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_manage_children_removal_drops_native_subtree() {
        let (module, _rx) = module();
        module
            .dispatch_batch(vec![
                create(5, "Panel", json!(null)),
                create(6, "Label", json!({"text": "inside"})),
                insert_under(ROOT, 5, 0),
                insert_under(Tag::new(5), 6, 0),
            ])
            .unwrap();

        module
            .dispatch_batch(vec![Instruction::ManageChildren {
                parent: ROOT,
                insert: vec![],
                remove_at: vec![0],
            }])
            .unwrap();

        let (count, root_children) = module.ui().run(|host| {
            let root = host.resolve(ROOT).unwrap();
            (host.view_count(), host.child_count(root).unwrap())
        });
        assert_eq!(count, 1);
        assert_eq!(root_children, 0);
    }

    #[test]
    fn test_slider_events_keep_per_node_order() {
        let (module, rx) = module();
        module
            .dispatch_batch(vec![
                create(5, "Slider", json!({"minimumValue": 0.0, "maximumValue": 10.0})),
                insert_under(ROOT, 5, 0),
            ])
            .unwrap();

        module.ui().run(|host| {
            let handle = host.resolve(Tag::new(5)).unwrap();
            host.slider_drag_to(handle, 2.0).unwrap();
            host.slider_drag_to(handle, 4.0).unwrap();
            host.pointer_released(handle);
        });

        let events: Vec<(String, serde_json::Value)> = rx
            .try_iter()
            .map(|e| (e.name, e.payload["value"].clone()))
            .collect();
        assert_eq!(
            events,
            vec![
                ("topChange".to_string(), json!(2.0)),
                ("topChange".to_string(), json!(4.0)),
                ("topSlidingComplete".to_string(), json!(4.0)),
            ]
        );
    }

    #[test]
    fn test_update_before_create_is_a_contract_error() {
        let (module, _rx) = module();
        let err = module
            .dispatch_batch(vec![Instruction::UpdateProps {
                tag: Tag::new(99),
                props: json!({"opacity": 1.0}),
            }])
            .unwrap_err();
        assert_eq!(err, UiManagerError::UnknownTag(Tag::new(99)));

        // Nothing was applied.
        let count = module.ui().run(|host| host.view_count());
        assert_eq!(count, 1);
    }

    #[test]
    fn test_commands_focus_and_error_paths() {
        let (module, _rx) = module();
        module
            .dispatch_batch(vec![create(5, "Panel", json!(null)), insert_under(ROOT, 5, 0)])
            .unwrap();

        module
            .dispatch_batch(vec![Instruction::DispatchCommand {
                tag: Tag::new(5),
                command: "focus".into(),
                args: json!([]),
            }])
            .unwrap();
        let focused = module.ui().run(|host| {
            let handle = host.resolve(Tag::new(5)).unwrap();
            host.view(handle).unwrap().focused
        });
        assert!(focused);

        let err = module
            .dispatch_batch(vec![Instruction::DispatchCommand {
                tag: Tag::new(42),
                command: "focus".into(),
                args: json!([]),
            }])
            .unwrap_err();
        assert_eq!(err, UiManagerError::UnknownTag(Tag::new(42)));

        let err = module
            .dispatch_batch(vec![Instruction::DispatchCommand {
                tag: Tag::new(5),
                command: "explode".into(),
                args: json!([]),
            }])
            .unwrap_err();
        assert_eq!(
            err,
            UiManagerError::Command(CommandError::UnknownCommand {
                class: "Panel",
                command: "explode".into(),
            })
        );
    }

    #[test]
    fn test_drop_event_resolves_metadata_then_dispatches() {
        let (module, rx) = module();
        module
            .dispatch_batch(vec![
                create(5, "Panel", json!({"allowDrop": true})),
                insert_under(ROOT, 5, 0),
            ])
            .unwrap();

        module.ui().run(|host| {
            let handle = host.resolve(Tag::new(5)).unwrap();
            let content = DragContent::from_files(vec![DragFile {
                name: "photo.png".into(),
                size: 2048,
                content_type: "image/png".into(),
            }]);
            host.dropped(handle, &content);
        });

        // Metadata resolution happens off-thread; the event arrives once it
        // completes.
        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event.name, "topDrop");
        assert_eq!(event.tag, Tag::new(5));
        assert_eq!(event.payload["files"][0]["name"], json!("photo.png"));
        assert_eq!(event.payload["files"][0]["size"], json!(2048));
        let uri = event.payload["files"][0]["uri"].as_str().unwrap().to_string();
        assert_eq!(module.access().lookup(&uri).as_deref(), Some("photo.png"));
    }

    #[test]
    fn test_unknown_class_is_an_error() {
        let (module, _rx) = module();
        let err = module
            .dispatch_batch(vec![create(5, "Carousel", json!(null))])
            .unwrap_err();
        assert_eq!(err, UiManagerError::UnknownClass("Carousel".into()));
    }

    #[test]
    fn test_children_on_leaf_class_is_an_error() {
        let (module, _rx) = module();
        module
            .dispatch_batch(vec![
                create(5, "Label", json!(null)),
                create(6, "Label", json!(null)),
                insert_under(ROOT, 5, 0),
            ])
            .unwrap();
        let err = module
            .dispatch_batch(vec![insert_under(Tag::new(5), 6, 0)])
            .unwrap_err();
        assert_eq!(err, UiManagerError::NotAContainer { class: "Label" });
    }
}
