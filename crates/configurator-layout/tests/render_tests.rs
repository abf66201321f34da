use std::cell::Cell;
use std::rc::Rc;

use configurator_core::{CellOptions, SessionStore, StateCell, StateError, Value};
use configurator_layout::{
    Anchor, Children, Component, ComponentConfig, ConfigUpdate, PageConfig, PageRenderer,
    RenderError, ScopedResource, Slot,
};
use configurator_testing::{Event, RecordingHost};

fn node(component: Component) -> ComponentConfig {
    ComponentConfig::new(component)
}

#[test]
fn result_written_by_one_node_is_read_by_the_next() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let counter = renderer.namespace().declare("COUNTER", 0);

    let page = PageConfig::new(
        "counter",
        [
            node(host.echo("producer")).arg(5).result_key(&counter),
            node(host.echo("consumer")).arg(&counter),
        ],
    );
    renderer.render_page(&page).unwrap();

    let consumed = host.calls_of("consumer");
    assert_eq!(consumed.len(), 1);
    assert_eq!(consumed[0].arg(0), Some(&Value::from(5)));
    assert_eq!(renderer.namespace().value("COUNTER").unwrap(), Value::from(5));
}

#[test]
fn cells_with_the_same_name_alias_across_namespaces() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let writer = renderer.namespace().declare("VALUE", 0);
    let other = host.namespace();
    let reader = other.declare("VALUE", 0);

    let page = PageConfig::new(
        "shared",
        [
            node(host.echo("write")).arg("written").result_key(&writer),
            node(host.echo("read")).arg(&reader),
        ],
    );
    renderer.render_page(&page).unwrap();

    assert_eq!(host.calls_of("read")[0].arg(0), Some(&Value::from("written")));
}

#[test]
fn empty_slot_in_parallel_layout_renders_nothing() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let slots: Vec<Slot> = vec![Some(node(host.text("a"))), None, Some(node(host.text("c")))];
    let page = PageConfig::new("gaps", [node(host.columns("cols")).arg(3).children(slots)]);

    renderer.render_page(&page).unwrap();

    assert_eq!(host.rendered(), vec!["cols", "cols[0]/a", "cols[2]/c"]);
    let events = host.events();
    let empty = events
        .iter()
        .position(|event| *event == Event::Enter("cols[1]".into()))
        .unwrap();
    assert_eq!(events[empty + 1], Event::Exit("cols[1]".into()));
}

#[test]
fn nested_children_are_transposed_into_columns() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let rows: Vec<Vec<Slot>> = vec![
        vec![Some(node(host.text("r1c1"))), Some(node(host.text("r1c2")))],
        vec![Some(node(host.text("r2c1"))), Some(node(host.text("r2c2")))],
    ];
    let page = PageConfig::new("grid", [node(host.columns("cols")).arg(2).children(rows)]);

    renderer.render_page(&page).unwrap();

    assert_eq!(
        host.rendered(),
        vec![
            "cols",
            "cols[0]/r1c1",
            "cols[0]/r2c1",
            "cols[1]/r1c2",
            "cols[1]/r2c2",
        ]
    );
}

#[test]
fn more_anchors_than_children_is_a_shape_error() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let page = PageConfig::new(
        "short",
        [node(host.columns("cols")).arg(3).children(vec![node(host.text("only"))])],
    );

    let err = renderer.render_page(&page).unwrap_err();
    assert!(matches!(
        err,
        RenderError::MissingSlot { index: 1, available: 1, .. }
    ));
}

#[test]
fn more_anchors_than_columns_is_a_shape_error() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let rows: Vec<Vec<Slot>> = vec![vec![Some(node(host.text("a")))]];
    let page = PageConfig::new("short", [node(host.columns("cols")).arg(2).children(rows)]);

    let err = renderer.render_page(&page).unwrap_err();
    assert!(matches!(err, RenderError::MissingSlot { index: 1, .. }));
}

#[test]
fn falsy_cell_condition_skips_the_node() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let show = renderer.namespace().declare("SHOW", false);
    let page = PageConfig::new(
        "gated",
        [
            node(host.text("hidden")).condition(&show),
            node(host.container("box"))
                .condition(&show)
                .children(vec![node(host.text("inner"))]),
            node(host.text("visible")),
        ],
    );

    renderer.render_page(&page).unwrap();
    assert_eq!(host.rendered(), vec!["visible"]);

    renderer.namespace().set("SHOW", true);
    host.clear_events();
    renderer.render_page(&page).unwrap();
    assert_eq!(host.rendered(), vec!["hidden", "box", "box/inner", "visible"]);
}

#[test]
fn component_condition_uses_the_truthiness_of_its_result() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let page = PageConfig::new(
        "gated",
        [
            node(host.text("no")).condition(node(host.echo("check_empty")).arg("")),
            node(host.text("yes")).condition(node(host.echo("check_full")).arg("ok")),
        ],
    );

    renderer.render_page(&page).unwrap();
    assert_eq!(host.rendered(), vec!["check_empty", "check_full", "yes"]);
}

#[test]
fn keyed_widget_reads_and_writes_through_its_result_cell() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let name = renderer.namespace().declare("NAME", "");
    let page = PageConfig::new(
        "profile",
        [node(host.input("text_input"))
            .arg("What is your name?")
            .kwarg("value", &name)
            .result_key(&name)],
    );

    renderer.render_page(&page).unwrap();
    assert_eq!(host.calls_of("text_input")[0].key(), Some("profile_NAME"));

    host.interact("profile_NAME", "Ada");
    renderer.render_page(&page).unwrap();
    let calls = host.calls_of("text_input");
    assert_eq!(calls[1].kwarg("value"), Some(&Value::from("Ada")));
    assert_eq!(renderer.namespace().value("NAME").unwrap(), Value::from("Ada"));
}

#[test]
fn explicit_key_is_shared_with_the_result_cell() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let age = renderer.namespace().declare("AGE", 18);
    let page = PageConfig::new(
        "profile",
        [node(host.input("slider"))
            .kwarg("value", &age)
            .kwarg("key", "age_slider")
            .result_key(&age)],
    );

    host.interact("age_slider", 40);
    renderer.render_page(&page).unwrap();

    assert_eq!(host.calls_of("slider")[0].key(), Some("age_slider"));
    assert_eq!(age.storage_key(renderer.namespace().store()), "age_slider");
    assert_eq!(renderer.namespace().value("AGE").unwrap(), Value::from(40));
}

#[test]
fn page_scoped_cells_are_kept_apart_per_page() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let value = renderer.namespace().declare("VALUE", 0);
    let store_on = |tag: &str, stored: i64| {
        PageConfig::new(tag, [node(host.echo("store")).arg(stored).result_key(&value)])
    };

    renderer.render_page(&store_on("first", 1)).unwrap();
    renderer.render_page(&store_on("second", 2)).unwrap();

    let store = host.store();
    assert_eq!(store.placeholder("first_VALUE"), Some(Value::from(1)));
    assert_eq!(store.placeholder("second_VALUE"), Some(Value::from(2)));
}

#[test]
fn global_cells_are_shared_between_pages() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let theme = renderer.namespace().declare_cell(
        "THEME",
        StateCell::with_options(
            None::<String>,
            CellOptions::new().default_value("light").global(),
        ),
    );

    let settings = PageConfig::new(
        "settings",
        [node(host.echo("pick")).arg("dark").result_key(&theme)],
    );
    let home = PageConfig::new("home", [node(host.echo("show")).arg(&theme)]);
    renderer.render_page(&settings).unwrap();
    renderer.render_page(&home).unwrap();

    assert_eq!(host.calls_of("show")[0].arg(0), Some(&Value::from("dark")));
}

#[test]
fn persistent_cell_keeps_the_first_changed_value() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let choice = renderer.namespace().declare_cell(
        "CHOICE",
        StateCell::with_options(
            None::<String>,
            CellOptions::new().default_value("a").persist(true),
        ),
    );
    let page = PageConfig::new("poll", [node(host.echo("show")).arg(&choice)]);

    renderer.render_page(&page).unwrap();
    choice.set(renderer.namespace().store(), "b");
    renderer.render_page(&page).unwrap();
    choice.set(renderer.namespace().store(), "c");
    renderer.render_page(&page).unwrap();

    let shown: Vec<Value> = host
        .calls_of("show")
        .into_iter()
        .filter_map(|call| call.arg(0).cloned())
        .collect();
    assert_eq!(shown, vec![Value::from("a"), Value::from("b"), Value::from("b")]);
}

#[test]
fn sidebar_renders_before_body_inside_the_sidebar_scope() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let page = PageConfig::new("home", [node(host.text("body"))])
        .sidebar([node(host.text("nav"))]);

    renderer.render_page(&page).unwrap();
    assert_eq!(host.rendered(), vec!["sidebar/nav", "body"]);
}

#[test]
fn sidebar_content_needs_a_sidebar_scope() {
    let host = RecordingHost::new();
    let renderer = PageRenderer::new(host.namespace());
    let page = PageConfig::new("home", [node(host.text("body"))])
        .sidebar([node(host.text("nav"))]);

    assert!(matches!(renderer.render_page(&page), Err(RenderError::MissingSidebar)));
    assert!(host.rendered().is_empty());
}

#[test]
fn decorator_wraps_the_render_of_its_children() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let page = PageConfig::new(
        "wrapped",
        [node(host.decorator("frame")).children(vec![node(host.text("a")), node(host.text("b"))])],
    );

    renderer.render_page(&page).unwrap();
    assert_eq!(host.rendered(), vec!["frame", "frame/a", "frame/b"]);
}

#[test]
fn missing_anchor_skips_the_children() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let page = PageConfig::new(
        "empty",
        [node(host.empty_container("nothing")).children(vec![node(host.text("child"))])],
    );

    renderer.render_page(&page).unwrap();
    assert_eq!(host.rendered(), vec!["nothing"]);
}

#[test]
fn container_arguments_are_resolved_from_state() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let count = renderer.namespace().declare("COLUMNS", 2);
    let page = PageConfig::new(
        "dynamic",
        [node(host.columns("cols"))
            .arg(&count)
            .children(vec![node(host.text("left")), node(host.text("right"))])],
    );

    renderer.render_page(&page).unwrap();
    assert_eq!(host.rendered(), vec!["cols", "cols[0]/left", "cols[1]/right"]);
}

#[test]
fn widget_failure_propagates_and_releases_open_scopes() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let page = PageConfig::new(
        "broken",
        [
            node(host.container("box")).children(vec![node(host.failing("boom", "exploded"))]),
            node(host.text("after")),
        ],
    );

    let err = renderer.render_page(&page).unwrap_err();
    match err {
        RenderError::Component { component, source } => {
            assert_eq!(component, "boom");
            assert_eq!(source.to_string(), "exploded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(host.events().last(), Some(&Event::Exit("box".into())));
    assert!(!host.rendered().contains(&"after".to_owned()));
}

#[test]
fn widget_with_children_is_rejected() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let page = PageConfig::new(
        "invalid",
        [node(host.text("plain")).children(vec![node(host.text("child"))])],
    );

    assert!(matches!(
        renderer.render_page(&page),
        Err(RenderError::NotAContainer { component }) if component == "plain"
    ));
}

#[test]
fn rows_need_a_sequence_anchor() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let rows: Vec<Vec<Slot>> = vec![vec![Some(node(host.text("a")))]];
    let page = PageConfig::new("invalid", [node(host.container("box")).children(rows)]);

    assert!(matches!(
        renderer.render_page(&page),
        Err(RenderError::UnsupportedShape { shape: "nested", .. })
    ));
}

#[test]
fn rows_are_rejected_by_a_decorator() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let rows: Vec<Vec<Slot>> = vec![vec![Some(node(host.text("a"))), Some(node(host.text("b")))]];
    let page = PageConfig::new("invalid", [node(host.decorator("frame")).children(rows)]);

    assert!(matches!(
        renderer.render_page(&page),
        Err(RenderError::UnsupportedShape { component, shape: "nested" }) if component == "frame"
    ));
    assert!(host.calls_of("a").is_empty());
}

#[test]
fn format_failure_surfaces_as_a_state_error() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let score = renderer.namespace().declare_cell(
        "SCORE",
        StateCell::with_options(
            None::<String>,
            CellOptions::new()
                .default_value(3)
                .format(|_| Err(anyhow::anyhow!("not a score"))),
        ),
    );
    let page = PageConfig::new("scores", [node(host.echo("show")).arg(&score)]);

    match renderer.render_page(&page).unwrap_err() {
        RenderError::State(StateError::Format { cell, source }) => {
            assert_eq!(cell, "SCORE");
            assert_eq!(source.to_string(), "not a score");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(host.calls_of("show").is_empty());
}

struct RefusingScope {
    exits: Rc<Cell<usize>>,
}

impl ScopedResource for RefusingScope {
    fn enter(&self) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("scope unavailable"))
    }

    fn exit(&self) {
        self.exits.set(self.exits.get() + 1);
    }
}

#[test]
fn failed_enter_is_reported_and_never_exited() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let exits = Rc::new(Cell::new(0));
    let scope_exits = Rc::clone(&exits);
    let locked = Component::container("locked", move |_| {
        Ok(Some(Anchor::scoped(RefusingScope {
            exits: Rc::clone(&scope_exits),
        })))
    });
    let page = PageConfig::new(
        "locked",
        [node(locked).children(vec![node(host.text("inside"))])],
    );

    match renderer.render_page(&page).unwrap_err() {
        RenderError::Component { component, source } => {
            assert_eq!(component, "locked");
            assert_eq!(source.to_string(), "scope unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(exits.get(), 0);
    assert!(host.calls_of("inside").is_empty());
}

#[test]
fn templates_are_specialised_with_update() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let title = node(host.echo("title"))
        .arg("Default title")
        .kwarg("anchor", false)
        .kwarg("help", "none");
    let page = PageConfig::new(
        "templated",
        [
            title.update(ConfigUpdate::new().args(["Persistent state"]).kwarg("help", "tooltip")),
            title.clone(),
        ],
    );

    renderer.render_page(&page).unwrap();
    let calls = host.calls_of("title");
    assert_eq!(calls[0].arg(0), Some(&Value::from("Persistent state")));
    assert_eq!(calls[0].kwarg("anchor"), Some(&Value::from(false)));
    assert_eq!(calls[0].kwarg("help"), Some(&Value::from("tooltip")));
    assert_eq!(calls[1].arg(0), Some(&Value::from("Default title")));
    assert!(matches!(title.get_children(), Children::Flat(slots) if slots.is_empty()));
}

#[test]
fn nested_containers_recurse() {
    let host = RecordingHost::new();
    let renderer = host.renderer();
    let inner = node(host.columns("inner")).arg(2).children(vec![
        node(host.text("x")),
        node(host.text("y")),
    ]);
    let page = PageConfig::new(
        "nested",
        [node(host.container("outer")).children(vec![inner])],
    );

    renderer.render_page(&page).unwrap();
    assert_eq!(
        host.rendered(),
        vec!["outer", "outer/inner", "outer/inner[0]/x", "outer/inner[1]/y"]
    );
}
