//! Selection and view behaviour under arbitrary gesture sequences.

use gribview_common::{AttributeTable, FieldRecord, GridExtent, RecordHeader, RecordId, RecordLocator};
use message_store::MemoryStore;
use proptest::prelude::*;
use test_utils::{bootstrap_attributes, create_ramp_grid, extent};
use viewer_core::{AppState, Canvas, ClickMode, Selection, StepDirection, ViewTransform, ViewerConfig};

fn records(n: usize) -> Vec<FieldRecord> {
    (0..n)
        .map(|i| {
            FieldRecord::from_header(
                RecordId(i as u64),
                i + 1,
                RecordHeader {
                    locator: RecordLocator::new("p", i as u64),
                    extent: GridExtent::new(2, 2, 1.0, 0.0, 0.0, 1.0),
                    attributes: AttributeTable::new(),
                },
            )
        })
        .collect()
}

#[derive(Debug, Clone)]
enum Gesture {
    Click(usize, ClickMode),
    Step(StepDirection, bool),
    Refresh(Option<usize>),
}

fn gesture() -> impl Strategy<Value = Gesture> {
    let mode = prop_oneof![
        Just(ClickMode::Single),
        Just(ClickMode::Range),
        Just(ClickMode::Toggle)
    ];
    let direction = prop_oneof![Just(StepDirection::Up), Just(StepDirection::Down)];
    prop_oneof![
        (0usize..10, mode).prop_map(|(i, m)| Gesture::Click(i, m)),
        (direction, any::<bool>()).prop_map(|(d, e)| Gesture::Step(d, e)),
        proptest::option::of(0usize..10).prop_map(Gesture::Refresh),
    ]
}

// ============================================================================
// Selection invariant
// ============================================================================

proptest! {
    #[test]
    fn active_is_always_selected(
        len in 0usize..8,
        gestures in proptest::collection::vec(gesture(), 0..40),
    ) {
        let mut recs = records(len);
        let mut selection = Selection::new();

        for g in gestures {
            match g {
                Gesture::Click(i, mode) => {
                    selection.click(&mut recs, i, mode);
                }
                Gesture::Step(direction, extend) => {
                    selection.step(&mut recs, direction, extend);
                }
                Gesture::Refresh(preferred) => {
                    selection.refresh(&recs, preferred);
                }
            }

            let selected = recs.iter().filter(|r| r.selected).count();
            match selection.active() {
                Some(active) => {
                    prop_assert!(active < recs.len());
                    prop_assert!(recs[active].selected);
                }
                None => prop_assert_eq!(selected, 0),
            }
            if let Some(anchor) = selection.anchor() {
                prop_assert!(anchor < recs.len());
            }
        }
    }

    #[test]
    fn single_select_leaves_exactly_one(len in 1usize..10, pick in 0usize..10) {
        let mut recs = records(len);
        let mut selection = Selection::new();
        let pick = pick % len;
        selection.single_select(&mut recs, pick);

        prop_assert_eq!(recs.iter().filter(|r| r.selected).count(), 1);
        prop_assert_eq!(selection.active(), Some(pick));
        prop_assert_eq!(selection.anchor(), Some(pick));
    }
}

// ============================================================================
// Zoom and pan
// ============================================================================

proptest! {
    #[test]
    fn zoom_never_drops_below_floor(
        tex_w in 1usize..500,
        tex_h in 1usize..500,
        wheels in proptest::collection::vec(-3.0f64..3.0, 1..30),
    ) {
        let mut view = ViewTransform::new(Canvas::new(350.0, 0.0, 930.0, 770.0));
        view.set_texture(tex_w, tex_h);
        view.reset_to_fit();
        let floor = view.min_zoom().unwrap();

        for wheel in wheels {
            view.zoom_at(600.0, 300.0, wheel, 0.1);
            prop_assert!(view.zoom() >= floor);
        }
    }

    #[test]
    fn point_under_cursor_stays_put(
        cursor_x in 350.0f64..1280.0,
        cursor_y in 0.0f64..770.0,
        wheel in 0.1f64..5.0,
    ) {
        let mut view = ViewTransform::new(Canvas::new(350.0, 0.0, 930.0, 770.0));
        view.set_texture(120, 60);
        view.reset_to_fit();

        let before = view.frame();
        let gx = (cursor_x - before.origin_x) / before.zoom;
        let gy = (cursor_y - before.origin_y) / before.zoom;

        view.zoom_at(cursor_x, cursor_y, wheel, 0.1);
        let after = view.frame();
        let x = after.origin_x + gx * after.zoom;
        let y = after.origin_y + gy * after.zoom;
        prop_assert!((x - cursor_x).abs() < 1.0);
        prop_assert!((y - cursor_y).abs() < 1.0);
    }
}

#[test]
fn test_pan_moves_probe_position() {
    let mut store = MemoryStore::new();
    store.add_grid(
        "mem",
        extent::descending_11x11(),
        bootstrap_attributes("TMP", 850, "20240115", 0),
        create_ramp_grid(11, 11, 0.0, 120.0),
    );
    let mut state = AppState::new(store, ViewerConfig::default());
    state.load_files(["mem"]);

    // Halfway between grid columns and rows, clear of the strict edge
    let zoom = state.view().zoom();
    let (x, y) = (1.5 * zoom, 1.5 * zoom);
    let before = state.probe(x, y).unwrap();

    assert!(state.view_mut().begin_pan(100.0, 100.0));
    state.view_mut().drag_to(100.0 + zoom, 100.0);
    state.view_mut().end_pan();

    // The same pixel now sits one column further west
    let after = state.probe(x, y).unwrap();
    assert!((before.lon - after.lon - 1.0).abs() < 1e-9);
    assert!((before.lat - after.lat).abs() < 1e-9);
}

#[test]
fn test_keyboard_navigation_through_state() {
    let mut store = MemoryStore::new();
    for step in 0..4 {
        store.add_grid("mem", extent::small_2x2(), bootstrap_attributes("TMP", 850, "20240115", step), vec![0.0; 4]);
    }
    let mut state = AppState::new(store, ViewerConfig::default());
    state.load_files(["mem"]);
    state.take_scroll_request();

    state.step(StepDirection::Down, false);
    state.step(StepDirection::Down, true);
    assert_eq!(state.selection().active(), Some(2));
    assert_eq!(state.records().selected_positions(), vec![1, 2]);
    assert_eq!(state.take_scroll_request(), Some(2));

    state.click(0, ClickMode::Toggle);
    assert_eq!(state.selection().active(), Some(0));
    assert_eq!(state.records().selected_count(), 3);
}
