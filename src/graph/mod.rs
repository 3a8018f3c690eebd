//! Workflow graph model.
//!
//! A workflow is the flat node map a generation host submits to its compute
//! backend: each entry is keyed by a string node id and carries a
//! `class_type` tag plus an input map. An input is either a literal value or
//! a link to another node's output, encoded on the wire as the two-element
//! array `["<producer id>", <output index>]`.
//!
//! Alongside the node map the host tracks one piece of build-time state: the
//! *final prompt* reference, the link downstream consumers treat as the
//! effective positive-prompt source. It is not part of the wire form.

use ahash::AHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::GraphError;

/// Identifier of a node within a single workflow.
pub type NodeId = String;

/// A reference to one output slot of a producer node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeLink {
    pub node: NodeId,
    pub output: u32,
}

impl NodeLink {
    pub fn new(node: impl Into<NodeId>, output: u32) -> Self {
        Self {
            node: node.into(),
            output,
        }
    }
}

impl Serialize for NodeLink {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.node, self.output).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NodeLink {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (node, output) = <(String, u32)>::deserialize(deserializer)?;
        Ok(Self { node, output })
    }
}

/// A single node input: a literal value or a link to another node's output.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeInput {
    Link(NodeLink),
    Value(Value),
}

impl NodeInput {
    pub fn value(value: impl Into<Value>) -> Self {
        NodeInput::Value(value.into())
    }

    pub fn link(node: impl Into<NodeId>, output: u32) -> Self {
        NodeInput::Link(NodeLink::new(node, output))
    }

    pub fn as_link(&self) -> Option<&NodeLink> {
        match self {
            NodeInput::Link(link) => Some(link),
            NodeInput::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            NodeInput::Link(_) => None,
            NodeInput::Value(value) => Some(value),
        }
    }

    /// Classifies a raw wire value. A two-element `[string, uint]` array is
    /// the backend's link convention; everything else is a literal.
    pub fn classify(value: Value) -> Self {
        if let Value::Array(items) = &value {
            if items.len() == 2 {
                if let (Some(node), Some(output)) = (items[0].as_str(), items[1].as_u64()) {
                    if let Ok(output) = u32::try_from(output) {
                        return NodeInput::Link(NodeLink::new(node, output));
                    }
                }
            }
        }
        NodeInput::Value(value)
    }
}

impl Serialize for NodeInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NodeInput::Link(link) => link.serialize(serializer),
            NodeInput::Value(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for NodeInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(NodeInput::classify(Value::deserialize(deserializer)?))
    }
}

/// A single node in a workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub class_type: String,
    pub inputs: AHashMap<String, NodeInput>,
}

impl WorkflowNode {
    pub fn new(class_type: impl Into<String>) -> Self {
        Self {
            class_type: class_type.into(),
            inputs: AHashMap::new(),
        }
    }

    pub fn with_input(mut self, name: impl Into<String>, input: NodeInput) -> Self {
        self.inputs.insert(name.into(), input);
        self
    }

    pub fn input(&self, name: &str) -> Option<&NodeInput> {
        self.inputs.get(name)
    }

    pub fn set_input(&mut self, name: impl Into<String>, input: NodeInput) {
        self.inputs.insert(name.into(), input);
    }
}

/// The workflow graph for one generation request.
///
/// Owned by the host for the duration of the request and mutated in place by
/// registered build steps before submission to the backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workflow {
    nodes: AHashMap<NodeId, WorkflowNode>,
    final_prompt: Option<NodeLink>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node under the given id, replacing any previous entry.
    pub fn add_node(&mut self, id: impl Into<NodeId>, node: WorkflowNode) -> NodeId {
        let id = id.into();
        self.nodes.insert(id.clone(), node);
        id
    }

    /// Creates a node from its class type and input map under the given id.
    pub fn create_node(
        &mut self,
        class_type: impl Into<String>,
        inputs: AHashMap<String, NodeInput>,
        id: NodeId,
    ) -> NodeId {
        self.add_node(
            id,
            WorkflowNode {
                class_type: class_type.into(),
                inputs,
            },
        )
    }

    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut WorkflowNode> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&NodeId, &WorkflowNode)> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The link downstream consumers treat as the positive-prompt source.
    pub fn final_prompt(&self) -> Option<&NodeLink> {
        self.final_prompt.as_ref()
    }

    pub fn set_final_prompt(&mut self, link: NodeLink) {
        self.final_prompt = Some(link);
    }

    /// Allocates a numeric node id that does not collide with any node in
    /// this graph, probing upward from `namespace + index`.
    pub fn stable_id(&self, namespace: u32, index: u32) -> NodeId {
        let mut candidate = u64::from(namespace) + u64::from(index);
        while self.nodes.contains_key(&candidate.to_string()) {
            candidate += 1;
        }
        candidate.to_string()
    }

    /// The wire form submitted to the backend: an object of node entries.
    /// The final-prompt reference is build-time state and is not included.
    pub fn to_wire(&self) -> Value {
        serde_json::to_value(&self.nodes).unwrap_or_else(|_| Value::Object(Default::default()))
    }

    /// Decodes a workflow from its wire form.
    ///
    /// Every entry must carry a string `class_type`; a missing `inputs`
    /// field is treated as an empty input map.
    pub fn from_wire(value: &Value) -> Result<Self, GraphError> {
        let entries = value.as_object().ok_or(GraphError::NotAnObject)?;

        let mut nodes = AHashMap::with_capacity(entries.len());
        for (id, entry) in entries {
            let class_type = entry
                .get("class_type")
                .and_then(Value::as_str)
                .ok_or_else(|| GraphError::MissingClassType(id.clone()))?
                .to_string();

            let mut inputs = AHashMap::new();
            match entry.get("inputs") {
                None => {}
                Some(Value::Object(raw)) => {
                    for (name, raw_input) in raw {
                        inputs.insert(name.clone(), NodeInput::classify(raw_input.clone()));
                    }
                }
                Some(_) => return Err(GraphError::MalformedInputs(id.clone())),
            }

            nodes.insert(id.clone(), WorkflowNode { class_type, inputs });
        }

        Ok(Self {
            nodes,
            final_prompt: None,
        })
    }
}
