//! Entity identifiers, the label registry and higher-order node keys
//!
//! Callers name entities with strings. Internally every entity is interned
//! into a dense `NodeId`, which keeps path keys and higher-order nodes small
//! and cheap to hash. The `Alphabet` travels with every artifact (behind an
//! `Arc`) so ids can always be resolved back to labels.

use crate::error::{PathError, Result};
use fnv::FnvHashMap;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Highest supported model order
///
/// A layer of order k has up to |alphabet|^k nodes, so orders in practice stay
/// far below this bound.
pub const MAX_ORDER: usize = 16;

/// Dense identifier of an interned entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Bidirectional mapping between entity labels and `NodeId`s
///
/// # Example
/// ```
/// use pathorder::node::Alphabet;
///
/// let mut alphabet = Alphabet::new();
/// let a = alphabet.intern("a");
/// let b = alphabet.intern("b");
///
/// assert_eq!(alphabet.intern("a"), a);
/// assert_ne!(a, b);
/// assert_eq!(alphabet.label(b), "b");
/// assert_eq!(alphabet.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Alphabet {
    labels: Vec<Arc<str>>,
    index: FnvHashMap<Arc<str>, NodeId>,
}

impl Alphabet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id of `label`, registering it if unseen
    pub fn intern(&mut self, label: &str) -> NodeId {
        if let Some(&id) = self.index.get(label) {
            return id;
        }

        let id = NodeId(self.labels.len() as u32);
        let label: Arc<str> = Arc::from(label);
        self.labels.push(label.clone());
        self.index.insert(label, id);
        id
    }

    pub fn get(&self, label: &str) -> Option<NodeId> {
        self.index.get(label).copied()
    }

    /// Label of an interned id
    ///
    /// Ids are only ever handed out by `intern`, so an id from this alphabet
    /// always resolves. Ids from a foreign alphabet resolve to `"?"`.
    pub fn label(&self, id: NodeId) -> &str {
        self.labels.get(id.index()).map(|l| l.as_ref()).unwrap_or("?")
    }

    pub fn labels_of(&self, ids: &[NodeId]) -> Vec<String> {
        ids.iter().map(|&id| self.label(id).to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &str)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, l)| (NodeId(i as u32), l.as_ref()))
    }

    /// True when both alphabets assign the same id to every label
    pub fn same_as(&self, other: &Alphabet) -> bool {
        self.labels == other.labels
    }
}

impl Serialize for Alphabet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.labels.iter().map(|l| l.as_ref()))
    }
}

/// A node of a k-th order layer: the last k entities of a walk
///
/// `(x_1, ..., x_k)` reads "arrived via x_1 .. x_{k-1}, currently at x_k".
/// Order 0 is the empty tuple and stands for "no history". Stored inline as a
/// fixed-size array so higher-order nodes are `Copy` and never allocate.
#[derive(Clone, Copy)]
pub struct HigherOrderNode {
    nodes: [NodeId; MAX_ORDER],
    order: u8,
}

impl HigherOrderNode {
    /// The order-0 node
    pub fn empty() -> Self {
        Self {
            nodes: [NodeId(0); MAX_ORDER],
            order: 0,
        }
    }

    /// Build a node from a history of at most `MAX_ORDER` entities
    pub fn new(history: &[NodeId]) -> Result<Self> {
        if history.len() > MAX_ORDER {
            return Err(PathError::degenerate(
                "order",
                format!("{} (supported up to {})", history.len(), MAX_ORDER),
            ));
        }
        Ok(Self::from_window(history))
    }

    /// Callers guarantee `history.len() <= MAX_ORDER`
    pub(crate) fn from_window(history: &[NodeId]) -> Self {
        let mut nodes = [NodeId(0); MAX_ORDER];
        nodes[..history.len()].copy_from_slice(history);
        Self {
            nodes,
            order: history.len() as u8,
        }
    }

    pub fn order(&self) -> usize {
        self.order as usize
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.nodes[..self.order()]
    }

    /// The entity the walk currently sits at
    pub fn current(&self) -> Option<NodeId> {
        self.as_slice().last().copied()
    }

    /// The node reached by moving on to `next`: drop the oldest entity and
    /// append `next`. Order 0 maps to itself.
    pub fn successor(&self, next: NodeId) -> Self {
        let k = self.order();
        if k == 0 {
            return *self;
        }

        let mut nodes = [NodeId(0); MAX_ORDER];
        nodes[..k - 1].copy_from_slice(&self.nodes[1..k]);
        nodes[k - 1] = next;
        Self {
            nodes,
            order: self.order,
        }
    }

    pub fn labels(&self, alphabet: &Alphabet) -> Vec<String> {
        alphabet.labels_of(self.as_slice())
    }

    /// Render as labels joined by `separator`; order 0 renders as `"∅"`
    pub fn display(&self, alphabet: &Alphabet, separator: &str) -> String {
        if self.order == 0 {
            return "∅".to_string();
        }
        self.labels(alphabet).join(separator)
    }
}

impl PartialEq for HigherOrderNode {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for HigherOrderNode {}

impl Hash for HigherOrderNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl PartialOrd for HigherOrderNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HigherOrderNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl fmt::Debug for HigherOrderNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HigherOrderNode")
            .field(&self.as_slice())
            .finish()
    }
}

impl Serialize for HigherOrderNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.as_slice())
    }
}
