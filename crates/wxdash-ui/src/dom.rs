//! Typed element trees.
//!
//! A page is a tree of [`Node`]s built from [`ElementSpec`] values. Elements
//! carry their listeners as data: a listener maps an event to a message of
//! type `A`, so dispatching an event returns messages instead of running
//! callbacks. Dispatch follows DOM bubbling: listeners on the target run
//! first, then on each ancestor, until one of them stops propagation.

/// Event kinds the dashboard listens for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    PointerDown,
    Input,
}

/// An event aimed at the element with id `target`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub target: String,
    /// New field value for `Input` events
    pub value: Option<String>,
}

impl Event {
    pub fn click(target: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Click,
            target: target.into(),
            value: None,
        }
    }

    pub fn pointer_down(target: impl Into<String>) -> Self {
        Self {
            kind: EventKind::PointerDown,
            target: target.into(),
            value: None,
        }
    }

    pub fn input(target: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Input,
            target: target.into(),
            value: Some(value.into()),
        }
    }
}

/// How a listener turns an event into a message
#[derive(Debug, Clone)]
pub enum Handler<A> {
    /// Always the same message
    Emit(A),
    /// Built from the event value (empty if the event has none)
    WithValue(fn(String) -> A),
    /// Built from the id of the event target
    WithTarget(fn(String) -> A),
}

#[derive(Debug, Clone)]
pub struct Listener<A> {
    pub kind: EventKind,
    pub handler: Handler<A>,
    pub stop_propagation: bool,
}

impl<A: Clone> Listener<A> {
    fn message_for(&self, event: &Event) -> A {
        match &self.handler {
            Handler::Emit(msg) => msg.clone(),
            Handler::WithValue(f) => f(event.value.clone().unwrap_or_default()),
            Handler::WithTarget(f) => f(event.target.clone()),
        }
    }
}

/// Everything needed to build one element, minus its children.
#[derive(Debug, Clone)]
pub struct ElementSpec<A> {
    pub tag: &'static str,
    pub id: Option<String>,
    pub class: Option<String>,
    pub text: Option<String>,
    pub attrs: Vec<(&'static str, String)>,
    pub listeners: Vec<Listener<A>>,
}

impl<A> ElementSpec<A> {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            id: None,
            class: None,
            text: None,
            attrs: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Text content, placed before any children
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    /// Set a boolean attribute when `on` holds
    pub fn flag(self, name: &'static str, on: bool) -> Self {
        if on {
            self.attr(name, "")
        } else {
            self
        }
    }

    pub fn on(mut self, kind: EventKind, msg: A) -> Self {
        self.listeners.push(Listener {
            kind,
            handler: Handler::Emit(msg),
            stop_propagation: false,
        });
        self
    }

    pub fn on_value(mut self, kind: EventKind, f: fn(String) -> A) -> Self {
        self.listeners.push(Listener {
            kind,
            handler: Handler::WithValue(f),
            stop_propagation: false,
        });
        self
    }

    pub fn on_target(mut self, kind: EventKind, f: fn(String) -> A) -> Self {
        self.listeners.push(Listener {
            kind,
            handler: Handler::WithTarget(f),
            stop_propagation: false,
        });
        self
    }

    /// Like [`ElementSpec::on`], but the event does not reach ancestors
    pub fn on_stop(mut self, kind: EventKind, msg: A) -> Self {
        self.listeners.push(Listener {
            kind,
            handler: Handler::Emit(msg),
            stop_propagation: true,
        });
        self
    }
}

#[derive(Debug, Clone)]
pub struct Element<A> {
    pub tag: &'static str,
    pub id: Option<String>,
    pub class: Option<String>,
    pub attrs: Vec<(&'static str, String)>,
    pub listeners: Vec<Listener<A>>,
    pub children: Vec<Node<A>>,
}

#[derive(Debug, Clone)]
pub enum Node<A> {
    Element(Element<A>),
    Text(String),
}

/// Build an element from `spec` and `children`.
pub fn el<A>(spec: ElementSpec<A>, children: impl IntoIterator<Item = Node<A>>) -> Node<A> {
    let mut nodes = Vec::new();
    if let Some(text) = spec.text {
        nodes.push(Node::Text(text));
    }
    nodes.extend(children);

    Node::Element(Element {
        tag: spec.tag,
        id: spec.id,
        class: spec.class,
        attrs: spec.attrs,
        listeners: spec.listeners,
        children: nodes,
    })
}

/// A text node
pub fn text<A>(content: impl Into<String>) -> Node<A> {
    Node::Text(content.into())
}

impl<A> Element<A> {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn is_hidden(&self) -> bool {
        self.has_attr("hidden")
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class
            .as_deref()
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element<A>> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Whether the element itself or one of its descendants has id `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.id.as_deref() == Some(id) || self.child_elements().any(|c| c.contains(id))
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }
}

impl<A> Node<A> {
    pub fn as_element(&self) -> Option<&Element<A>> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    /// Depth-first search by element id
    pub fn find(&self, id: &str) -> Option<&Element<A>> {
        let e = self.as_element()?;
        if e.id.as_deref() == Some(id) {
            return Some(e);
        }
        e.children.iter().find_map(|c| c.find(id))
    }

    /// Elements from the root down to the element with id `id`
    pub fn path_to(&self, id: &str) -> Option<Vec<&Element<A>>> {
        let e = self.as_element()?;
        if e.id.as_deref() == Some(id) {
            return Some(vec![e]);
        }
        e.children.iter().find_map(|c| {
            c.path_to(id).map(|mut rest| {
                rest.insert(0, e);
                rest
            })
        })
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => {
                for child in &e.children {
                    child.collect_text(out);
                }
            }
        }
    }
}

impl<A: Clone> Node<A> {
    /// Messages produced by delivering `event` to its target, in bubbling order.
    ///
    /// An unknown target produces nothing, and neither does a target inside
    /// a hidden subtree. Disabled elements ignore clicks.
    pub fn dispatch(&self, event: &Event) -> Vec<A> {
        let Some(path) = self.path_to(&event.target) else {
            tracing::debug!("No element with id {:?}", event.target);
            return Vec::new();
        };

        if path.iter().any(|e| e.is_hidden()) {
            tracing::debug!("Ignoring event on hidden element {:?}", event.target);
            return Vec::new();
        }

        if let Some(target) = path.last() {
            if event.kind == EventKind::Click && target.has_attr("disabled") {
                return Vec::new();
            }
        }

        let mut messages = Vec::new();
        for element in path.iter().rev() {
            let mut stop = false;
            for listener in element.listeners.iter().filter(|l| l.kind == event.kind) {
                messages.push(listener.message_for(event));
                stop |= listener.stop_propagation;
            }
            if stop {
                break;
            }
        }
        messages
    }
}
