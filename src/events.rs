//! Typed change notifications of the graph.
//!
//! The node tree and the dependency engine only queue events; the `Graph`
//! facade publishes them to subscribers once a mutation is complete, so a
//! subscriber always observes a consistent state.

use log::trace;

/// Something observable happened to the graph.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    /// A node was moved by the user
    Drag { node: String },
    /// A node was folded or unfolded (interactive or bulk)
    Fold { node: String, folded: bool },
    /// The relayout following an interactive fold/unfold has settled
    FoldFinished { node: String },
    /// A relayout completed and all nodes have their new positions
    LayoutChanged,
    /// A node was folded while loading the graph
    InitialFold { node: String },
    /// The root changed its size during a relayout
    SizeChanged { half_width: f64, half_height: f64 },
    /// The root grew because a node was dragged towards its rim
    SizeExpanded { half_width: f64, half_height: f64 },
    /// A node's radius grew to keep a dragged descendant inside
    NodeRimChanged { node: String },
    /// Nodes were brought to the front to highlight a dependency
    NodesFocused { nodes: Vec<String> },
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

type Subscriber = Box<dyn FnMut(&GraphEvent)>;

/// List of subscriber closures, called in subscription order.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&GraphEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        before != self.subscribers.len()
    }

    pub fn publish(&mut self, event: &GraphEvent) {
        trace!("publishing {:?}", event);
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(event);
        }
    }

    pub fn publish_all(&mut self, events: impl IntoIterator<Item = GraphEvent>) {
        for event in events {
            self.publish(&event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
