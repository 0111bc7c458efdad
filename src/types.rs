//! Core data types for the flowsheet document.
//!
//! A [`Flowsheet`] is an ordered list of unit-operation [`Node`]s and the
//! [`Connection`]s (streams) between their ports. Everything here is plain
//! data plus the geometric queries the canvas needs: point-in-node tests,
//! nearest-port snapping and the connection rules.

use crate::constants::{MIN_PORT_SNAP_DISTANCE, NODE_SNAP_RADIUS};
use crate::error::{FlowsheetError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for flowsheet nodes.
pub type NodeId = Uuid;

/// Which side of a unit a port sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Inlet: receives a stream
    Input,
    /// Outlet: emits a stream
    Output,
}

impl PortDirection {
    /// The direction a matching port on the other end of a stream must have.
    pub fn opposite(self) -> Self {
        match self {
            PortDirection::Input => PortDirection::Output,
            PortDirection::Output => PortDirection::Input,
        }
    }
}

/// Restricts which ports a nearest-port search considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortFilter {
    /// Inlets and outlets
    Any,
    /// Only inlets
    InputsOnly,
    /// Only outlets
    OutputsOnly,
}

impl PortFilter {
    /// Filter accepting only ports of the given direction.
    pub fn only(direction: PortDirection) -> Self {
        match direction {
            PortDirection::Input => PortFilter::InputsOnly,
            PortDirection::Output => PortFilter::OutputsOnly,
        }
    }

    fn accepts(self, direction: PortDirection) -> bool {
        match self {
            PortFilter::Any => true,
            PortFilter::InputsOnly => direction == PortDirection::Input,
            PortFilter::OutputsOnly => direction == PortDirection::Output,
        }
    }
}

/// A named attachment site on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// Label drawn next to the port
    pub name: String,
    /// Inlet or outlet
    pub direction: PortDirection,
    /// Anchor position relative to the node's top-left corner
    pub offset: (f32, f32),
}

/// Identifies one port of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRef {
    /// Owning node
    pub node: NodeId,
    /// Which port list the index refers to
    pub direction: PortDirection,
    /// Index into the node's inputs or outputs
    pub index: usize,
}

impl PortRef {
    /// Creates a reference to an inlet.
    pub fn input(node: NodeId, index: usize) -> Self {
        Self {
            node,
            direction: PortDirection::Input,
            index,
        }
    }

    /// Creates a reference to an outlet.
    pub fn output(node: NodeId, index: usize) -> Self {
        Self {
            node,
            direction: PortDirection::Output,
            index,
        }
    }
}

/// A numeric property of a unit.
///
/// Specified parameters are inputs the user sets; the others are calculated
/// results and are shown read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Display name, e.g. "Pressure Drop"
    pub label: String,
    /// Engineering unit shown beside the value, e.g. "[bar]"
    pub unit: String,
    /// Current value
    pub value: f64,
    /// Whether the user specifies this value
    pub specified: bool,
}

/// Vector symbol drawn inside a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitIcon {
    /// Bow-tie valve symbol
    Valve,
    /// Feed arrow
    Inlet,
    /// Product arrow
    Outlet,
    /// Trapezoid compressor symbol
    Compressor,
    /// Vertical vessel
    Tank,
    /// Horizontal pipe run
    Pipe,
    /// One-to-many junction
    Splitter,
    /// Many-to-one junction
    Mixer,
    /// Plain box for user-registered types
    Generic,
}

/// A process unit placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node
    pub id: NodeId,
    /// User-editable name, drawn above the node
    pub name: String,
    /// Registered unit type, e.g. "Valve"
    pub unit_type: String,
    /// Symbol drawn for the unit
    pub icon: UnitIcon,
    /// Top-left corner in world coordinates
    pub position: (f32, f32),
    /// Width and height in world units
    pub size: (f32, f32),
    /// Inlet ports
    pub inputs: Vec<Port>,
    /// Outlet ports
    pub outputs: Vec<Port>,
    /// Numeric properties shown in the properties window
    pub parameters: Vec<Parameter>,
}

impl Node {
    /// Creates a node without ports or parameters.
    pub fn new(
        name: impl Into<String>,
        unit_type: impl Into<String>,
        icon: UnitIcon,
        position: (f32, f32),
        size: (f32, f32),
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            unit_type: unit_type.into(),
            icon,
            position,
            size,
            inputs: Vec::new(),
            outputs: Vec::new(),
            parameters: Vec::new(),
        }
    }

    /// Adds an inlet at `offset` from the top-left corner.
    pub fn add_input(&mut self, name: impl Into<String>, offset: (f32, f32)) -> &mut Self {
        self.inputs.push(Port {
            name: name.into(),
            direction: PortDirection::Input,
            offset,
        });
        self
    }

    /// Adds an outlet at `offset` from the top-left corner.
    pub fn add_output(&mut self, name: impl Into<String>, offset: (f32, f32)) -> &mut Self {
        self.outputs.push(Port {
            name: name.into(),
            direction: PortDirection::Output,
            offset,
        });
        self
    }

    /// Adds a numeric parameter.
    pub fn add_parameter(
        &mut self,
        label: impl Into<String>,
        unit: impl Into<String>,
        value: f64,
        specified: bool,
    ) -> &mut Self {
        self.parameters.push(Parameter {
            label: label.into(),
            unit: unit.into(),
            value,
            specified,
        });
        self
    }

    /// Port list for one side of the node.
    pub fn ports(&self, direction: PortDirection) -> &[Port] {
        match direction {
            PortDirection::Input => &self.inputs,
            PortDirection::Output => &self.outputs,
        }
    }

    /// Looks up a port by side and index.
    pub fn port(&self, direction: PortDirection, index: usize) -> Option<&Port> {
        self.ports(direction).get(index)
    }

    /// Absolute world position of a port anchor.
    pub fn port_position(&self, port: &Port) -> (f32, f32) {
        (
            self.position.0 + port.offset.0,
            self.position.1 + port.offset.1,
        )
    }

    /// Centre of the node rectangle.
    pub fn center(&self) -> (f32, f32) {
        (
            self.position.0 + self.size.0 * 0.5,
            self.position.1 + self.size.1 * 0.5,
        )
    }

    /// Whether `point` lies inside the node rectangle (edges included).
    pub fn contains(&self, point: (f32, f32)) -> bool {
        point.0 >= self.position.0
            && point.0 <= self.position.0 + self.size.0
            && point.1 >= self.position.1
            && point.1 <= self.position.1 + self.size.1
    }

    /// Finds the port closest to `point`.
    ///
    /// `max_dist` is raised to [`MIN_PORT_SNAP_DISTANCE`] so that small radii
    /// still leave a usable target. Outlets are scanned before inlets and a
    /// port must be strictly closer to replace the current best.
    pub fn nearest_port(
        &self,
        point: (f32, f32),
        max_dist: f32,
        filter: PortFilter,
    ) -> Option<(PortDirection, usize)> {
        let mut best = None;
        let mut best_dist = max_dist.max(MIN_PORT_SNAP_DISTANCE);

        for direction in [PortDirection::Output, PortDirection::Input] {
            if !filter.accepts(direction) {
                continue;
            }
            for (index, port) in self.ports(direction).iter().enumerate() {
                let dist = distance(self.port_position(port), point);
                if dist < best_dist {
                    best_dist = dist;
                    best = Some((direction, index));
                }
            }
        }
        best
    }

    /// Distance from `point` to the closest port anchor, if the node has ports.
    fn closest_port_distance(&self, point: (f32, f32)) -> Option<f32> {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .map(|port| distance(self.port_position(port), point))
            .min_by(|a, b| a.total_cmp(b))
    }
}

/// A stream from one node's outlet to another node's inlet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Outlet the stream leaves from
    pub from: PortRef,
    /// Inlet the stream enters
    pub to: PortRef,
}

impl Connection {
    /// Whether either end of the connection is on `node`.
    pub fn touches(&self, node: NodeId) -> bool {
        self.from.node == node || self.to.node == node
    }

    /// Whether either end of the connection is `port`.
    pub fn uses(&self, port: PortRef) -> bool {
        self.from == port || self.to == port
    }
}

/// Nodes and connections taken out of a flowsheet, with their former indices.
///
/// Entries are in ascending index order so [`Flowsheet::restore`] can put
/// them back exactly where they were.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemovedItems {
    /// Removed nodes and their indices in `Flowsheet::nodes`
    pub nodes: Vec<(usize, Node)>,
    /// Removed connections and their indices in `Flowsheet::connections`
    pub connections: Vec<(usize, Connection)>,
}

impl RemovedItems {
    /// True when nothing was removed.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.connections.is_empty()
    }
}

/// The flowsheet document: units in draw order plus the streams between them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Flowsheet {
    /// Nodes in draw order; the last node is drawn on top
    pub nodes: Vec<Node>,
    /// Streams between node ports
    pub connections: Vec<Connection>,
}

impl Flowsheet {
    /// Creates an empty flowsheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize the flowsheet to a pretty JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a flowsheet from JSON.
    ///
    /// Repeated node ids keep their first node. Stored connections are
    /// replayed through [`Flowsheet::connect`], so entries that dangle, loop
    /// back to their own node, join two ports of the same direction or reuse
    /// an occupied port are dropped. Reversed entries are stored outlet first.
    pub fn from_json(json: &str) -> Result<Self> {
        let stored: Flowsheet = serde_json::from_str(json)?;
        let mut flowsheet = Flowsheet::new();

        for node in stored.nodes {
            if flowsheet.node(node.id).is_some() {
                log::warn!("Dropped unit '{}' with duplicate id {}", node.name, node.id);
                continue;
            }
            flowsheet.nodes.push(node);
        }

        for connection in stored.connections {
            if let Err(err) = flowsheet.connect(connection.from, connection.to) {
                log::warn!("Dropped invalid connection while loading: {err}");
            }
        }
        Ok(flowsheet)
    }

    /// Appends a node on top of the others and returns its id.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.push(node);
        id
    }

    /// Index of a node in draw order.
    pub fn node_index(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    /// Looks up a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Looks up a node mutably.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Resolves a port reference.
    pub fn port(&self, port: PortRef) -> Result<&Port> {
        let node = self
            .node(port.node)
            .ok_or(FlowsheetError::NodeNotFound(port.node))?;
        node.port(port.direction, port.index)
            .ok_or(FlowsheetError::PortNotFound {
                node: port.node,
                direction: port.direction,
                index: port.index,
            })
    }

    /// Absolute world position of a port anchor.
    pub fn port_world_position(&self, port: PortRef) -> Option<(f32, f32)> {
        let node = self.node(port.node)?;
        let p = node.port(port.direction, port.index)?;
        Some(node.port_position(p))
    }

    /// Index of the connection attached to `port`, if any.
    pub fn port_connection(&self, port: PortRef) -> Option<usize> {
        self.connections.iter().position(|c| c.uses(port))
    }

    /// Connects two ports.
    ///
    /// The ports may be given in either order; the outlet always becomes
    /// `from`. Fails if the ports are on the same node, have the same
    /// direction, or if either already carries a stream.
    pub fn connect(&mut self, a: PortRef, b: PortRef) -> Result<usize> {
        let port_a = self.port(a)?;
        let port_b = self.port(b)?;
        if a.node == b.node {
            return Err(FlowsheetError::SelfConnection);
        }
        if a.direction == b.direction {
            return Err(FlowsheetError::PortDirectionMismatch);
        }
        if self.port_connection(a).is_some() {
            return Err(FlowsheetError::PortOccupied(port_a.name.clone()));
        }
        if self.port_connection(b).is_some() {
            return Err(FlowsheetError::PortOccupied(port_b.name.clone()));
        }

        let (from, to) = if a.direction == PortDirection::Output {
            (a, b)
        } else {
            (b, a)
        };
        self.connections.push(Connection { from, to });
        Ok(self.connections.len() - 1)
    }

    /// Removes a connection by index.
    pub fn remove_connection(&mut self, index: usize) -> Option<Connection> {
        (index < self.connections.len()).then(|| self.connections.remove(index))
    }

    /// Removes one node together with its connections.
    pub fn remove_node(&mut self, id: NodeId) -> Option<RemovedItems> {
        let removed = self.remove_nodes(&[id]);
        (!removed.nodes.is_empty()).then_some(removed)
    }

    /// Removes several nodes together with every connection touching them.
    ///
    /// Connections are detached before the nodes so no stream is ever left
    /// pointing at a missing node.
    pub fn remove_nodes(&mut self, ids: &[NodeId]) -> RemovedItems {
        let mut removed = RemovedItems::default();

        let mut index = 0;
        let mut original = 0;
        while index < self.connections.len() {
            if ids.iter().any(|id| self.connections[index].touches(*id)) {
                removed
                    .connections
                    .push((original, self.connections.remove(index)));
            } else {
                index += 1;
            }
            original += 1;
        }

        let mut index = 0;
        let mut original = 0;
        while index < self.nodes.len() {
            if ids.contains(&self.nodes[index].id) {
                removed.nodes.push((original, self.nodes.remove(index)));
            } else {
                index += 1;
            }
            original += 1;
        }

        removed
    }

    /// Puts back items previously returned by [`Flowsheet::remove_nodes`].
    pub fn restore(&mut self, removed: &RemovedItems) {
        for (index, node) in &removed.nodes {
            let at = (*index).min(self.nodes.len());
            self.nodes.insert(at, node.clone());
        }
        for (index, connection) in &removed.connections {
            let at = (*index).min(self.connections.len());
            self.connections.insert(at, *connection);
        }
    }

    /// Finds the node under `point`.
    ///
    /// Nodes are checked from the top of the draw order down. A point inside
    /// a node rectangle wins immediately; otherwise the node with a port
    /// anchor closest to the point, within [`NODE_SNAP_RADIUS`], is returned.
    pub fn node_at(&self, point: (f32, f32)) -> Option<NodeId> {
        let mut nearest: Option<(NodeId, f32)> = None;
        for node in self.nodes.iter().rev() {
            if node.contains(point) {
                return Some(node.id);
            }
            // Measured to port anchors rather than a single edge point, so
            // units with ports on several sides all snap
            if let Some(dist) = node.closest_port_distance(point) {
                let closer = nearest.is_none_or(|(_, best)| dist < best);
                if dist < NODE_SNAP_RADIUS && closer {
                    nearest = Some((node.id, dist));
                }
            }
        }
        nearest.map(|(id, _)| id)
    }

    /// Ids of nodes whose centre lies inside the rectangle spanned by two corners.
    pub fn nodes_in_rect(&self, a: (f32, f32), b: (f32, f32)) -> Vec<NodeId> {
        let (min_x, max_x) = (a.0.min(b.0), a.0.max(b.0));
        let (min_y, max_y) = (a.1.min(b.1), a.1.max(b.1));
        self.nodes
            .iter()
            .filter(|n| {
                let (cx, cy) = n.center();
                cx >= min_x && cx <= max_x && cy >= min_y && cy <= max_y
            })
            .map(|n| n.id)
            .collect()
    }

    /// Default name for a newly added unit, e.g. "Valve 3".
    pub fn next_default_name(&self, unit_type: &str) -> String {
        format!("{} {}", unit_type, self.nodes.len() + 1)
    }

    /// Human readable "node.port" label for one end of a stream.
    pub fn port_label(&self, port: PortRef) -> String {
        match (self.node(port.node), self.port(port)) {
            (Some(node), Ok(p)) => format!("{}.{}", node.name, p.name),
            _ => "(missing)".to_string(),
        }
    }
}

/// Euclidean distance between two points.
pub fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}
