use std::cell::Cell;
use std::rc::Rc;

use configurator_core::{MemorySessionStore, Namespace, ResolvedCall, SessionStore, Value};
use configurator_layout::{
    Anchor, Component, ComponentConfig, PageConfig, PageRenderer, ScopedResource, Slot,
};

const GENDER_OPTIONS: [&str; 3] = ["Male", "Female", "Others"];
const DEFAULT_GENDER: &str = "Others";

/// Prints widgets as indented lines; scopes increase the indent.
struct Console {
    depth: Cell<usize>,
}

impl Console {
    fn line(&self, text: impl AsRef<str>) {
        println!("{}{}", "  ".repeat(self.depth.get()), text.as_ref());
    }
}

struct Block {
    console: Rc<Console>,
    label: String,
}

impl ScopedResource for Block {
    fn enter(&self) -> anyhow::Result<()> {
        self.console.line(format!("[{}]", self.label));
        self.console.depth.set(self.console.depth.get() + 1);
        Ok(())
    }

    fn exit(&self) {
        self.console.depth.set(self.console.depth.get().saturating_sub(1));
    }
}

/// Console stand-in for a widget library sitting on a session store.
struct ConsoleHost {
    console: Rc<Console>,
    store: Rc<MemorySessionStore>,
}

impl ConsoleHost {
    fn new() -> Self {
        Self {
            console: Rc::new(Console { depth: Cell::new(0) }),
            store: Rc::new(MemorySessionStore::new()),
        }
    }

    fn block(&self, label: impl Into<String>) -> Block {
        Block {
            console: Rc::clone(&self.console),
            label: label.into(),
        }
    }

    /// The value a keyed widget shows: the user's input if any, else `initial`.
    fn widget_state(store: &MemorySessionStore, call: &ResolvedCall, initial: Value) -> Value {
        let Some(key) = call.key() else {
            return initial;
        };
        let value = store.get(key).unwrap_or(initial);
        store.set(key, value.clone());
        value
    }

    fn markdown(&self) -> Component {
        let console = Rc::clone(&self.console);
        Component::widget("markdown", move |call| {
            console.line(call.arg(0).map(Value::to_string).unwrap_or_default());
            Ok(Value::Null)
        })
    }

    fn text_input(&self) -> Component {
        let console = Rc::clone(&self.console);
        let store = Rc::clone(&self.store);
        Component::widget("text_input", move |call| {
            let initial = call.kwarg("value").cloned().unwrap_or_default();
            let value = Self::widget_state(&store, call, initial);
            console.line(format!("{}: [{value}]", label(call)));
            Ok(value)
        })
        .keyed()
    }

    fn slider(&self) -> Component {
        let console = Rc::clone(&self.console);
        let store = Rc::clone(&self.store);
        Component::widget("slider", move |call| {
            let initial = call.kwarg("value").cloned().unwrap_or(Value::Int(0));
            let value = Self::widget_state(&store, call, initial);
            let max = call.kwarg("max_value").and_then(Value::as_i64).unwrap_or(100);
            console.line(format!("{}: {value}/{max}", label(call)));
            Ok(value)
        })
        .keyed()
    }

    fn selectbox(&self) -> Component {
        let console = Rc::clone(&self.console);
        let store = Rc::clone(&self.store);
        Component::widget("selectbox", move |call| {
            let options = call.arg(1).and_then(Value::as_list).unwrap_or_default();
            let initial = call
                .kwarg("index")
                .and_then(Value::as_i64)
                .and_then(|index| options.get(usize::try_from(index).ok()?))
                .cloned()
                .unwrap_or_default();
            let value = Self::widget_state(&store, call, initial);
            console.line(format!("{}: <{value}>", label(call)));
            Ok(value)
        })
        .keyed()
    }

    fn container(&self) -> Component {
        let console = Rc::clone(&self.console);
        Component::container("container", move |_| {
            Ok(Some(Anchor::scoped(Block {
                console: Rc::clone(&console),
                label: "container".into(),
            })))
        })
    }

    fn columns(&self) -> Component {
        let console = Rc::clone(&self.console);
        Component::container("columns", move |call| {
            let count = call
                .arg(0)
                .and_then(Value::as_i64)
                .ok_or_else(|| anyhow::anyhow!("columns expects a count"))?;
            Ok(Some(Anchor::sequence((0..count).map(|index| Block {
                console: Rc::clone(&console),
                label: format!("column {index}"),
            }))))
        })
    }

    fn expander(&self) -> Component {
        let console = Rc::clone(&self.console);
        Component::container("expander", move |call| {
            let title = label(call);
            let console = Rc::clone(&console);
            Ok(Some(Anchor::decorator(move |render, children| {
                console.line(format!("v {title}"));
                console.depth.set(console.depth.get() + 1);
                let result = render(children);
                console.depth.set(console.depth.get().saturating_sub(1));
                result
            })))
        })
    }
}

fn label(call: &ResolvedCall) -> String {
    call.arg(0).map(Value::to_string).unwrap_or_default()
}

fn gender_index(call: &ResolvedCall) -> anyhow::Result<Value> {
    let index = call
        .arg(0)
        .and_then(Value::as_str)
        .and_then(|gender| GENDER_OPTIONS.iter().position(|option| *option == gender));
    Ok(Value::from(index))
}

fn profile_page(host: &ConsoleHost, namespace: &Namespace) -> PageConfig {
    let name = namespace.declare("NAME", "");
    let age = namespace.declare("AGE", 18);
    let gender = namespace.declare("GENDER", DEFAULT_GENDER);
    let default_index = GENDER_OPTIONS.iter().position(|option| *option == DEFAULT_GENDER);
    let gender_index_cell = namespace.declare("GENDER_INDEX", Value::from(default_index));

    let form = ComponentConfig::new(host.container()).children(vec![
        ComponentConfig::new(host.text_input())
            .arg("What is your name?")
            .kwarg("value", &name)
            .result_key(&name),
        ComponentConfig::new(host.slider())
            .arg("How old are you?")
            .kwarg("max_value", 100)
            .kwarg("value", &age)
            .result_key(&age),
        ComponentConfig::new(host.selectbox())
            .arg("What is your gender?")
            .arg(Value::from(GENDER_OPTIONS.to_vec()))
            .kwarg("index", &gender_index_cell)
            .result_key(&gender),
        ComponentConfig::new(Component::widget("gender_index", gender_index))
            .arg(&gender)
            .result_key(&gender_index_cell),
    ]);

    let summary_rows: Vec<Vec<Slot>> = vec![
        vec![
            Some(ComponentConfig::new(host.markdown()).arg("Name")),
            Some(ComponentConfig::new(host.markdown()).arg("Age")),
        ],
        vec![
            Some(ComponentConfig::new(host.markdown()).arg(&name)),
            Some(ComponentConfig::new(host.markdown()).arg(&age)),
        ],
    ];
    let summary = ComponentConfig::new(host.expander())
        .arg("Summary")
        .condition(&name)
        .children(vec![ComponentConfig::new(host.columns())
            .arg(2)
            .children(summary_rows)]);

    PageConfig::new(
        "profile",
        [
            ComponentConfig::new(host.markdown()).arg("# Profile"),
            form,
            summary,
        ],
    )
    .sidebar([ComponentConfig::new(host.markdown()).arg("Pages: profile")])
}

fn run() -> anyhow::Result<()> {
    let host = ConsoleHost::new();
    let namespace = Namespace::new(host.store.clone());
    let page = profile_page(&host, &namespace);
    let renderer = PageRenderer::new(namespace).with_sidebar(Rc::new(host.block("sidebar")));

    println!("--- first visit ---");
    renderer.render_page(&page)?;

    println!("--- after typing a name ---");
    host.store.set("profile_NAME", Value::from("Ada"));
    renderer.render_page(&page)?;

    println!("--- after moving the slider ---");
    host.store.set("profile_AGE", Value::from(36));
    renderer.render_page(&page)?;

    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(err) = run() {
        log::error!("render failed: {err:#}");
        std::process::exit(1);
    }
}
