//! Registry of unit-operation constructors.
//!
//! Every unit the user can add is built by a constructor registered under its
//! type name. The built-in catalogue covers the common flowsheet units; other
//! types can be registered at runtime.

use crate::error::{FlowsheetError, Result};
use crate::types::{Node, UnitIcon};
use std::collections::BTreeMap;

/// Builds a node of one unit type from a name and a top-left position.
pub type NodeConstructor = Box<dyn Fn(&str, (f32, f32)) -> Node>;

/// Creates nodes by unit type name.
pub struct NodeFactory {
    constructors: BTreeMap<String, NodeConstructor>,
}

impl Default for NodeFactory {
    /// A factory with the built-in unit catalogue registered.
    fn default() -> Self {
        let mut factory = Self::empty();
        factory.register("Valve", valve);
        factory.register("Inlet", inlet);
        factory.register("Outlet", outlet);
        factory.register("Compressor", compressor);
        factory.register("Tank", tank);
        factory.register("Pipe", pipe);
        factory.register("Splitter", splitter);
        factory.register("Mixer", mixer);
        factory
    }
}

impl std::fmt::Debug for NodeFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeFactory")
            .field("types", &self.types())
            .finish()
    }
}

impl NodeFactory {
    /// A factory with no unit types.
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Registers (or replaces) the constructor for `unit_type`.
    pub fn register<F>(&mut self, unit_type: impl Into<String>, constructor: F)
    where
        F: Fn(&str, (f32, f32)) -> Node + 'static,
    {
        let unit_type = unit_type.into();
        if self
            .constructors
            .insert(unit_type.clone(), Box::new(constructor))
            .is_some()
        {
            log::debug!("Replaced constructor for unit type '{unit_type}'");
        }
    }

    /// Creates a node of the given type.
    pub fn create(&self, unit_type: &str, name: &str, position: (f32, f32)) -> Result<Node> {
        let constructor = self
            .constructors
            .get(unit_type)
            .ok_or_else(|| FlowsheetError::UnknownNodeType(unit_type.to_string()))?;
        Ok(constructor(name, position))
    }

    /// Registered type names in alphabetical order.
    pub fn types(&self) -> Vec<String> {
        self.constructors.keys().cloned().collect()
    }

    /// Symbol used for a type; unknown types get the valve symbol.
    pub fn icon_for(&self, unit_type: &str) -> UnitIcon {
        self.create(unit_type, "", (0.0, 0.0))
            .map(|node| node.icon)
            .unwrap_or(UnitIcon::Valve)
    }
}

fn valve(name: &str, position: (f32, f32)) -> Node {
    let mut node = Node::new(name, "Valve", UnitIcon::Valve, position, (80.0, 50.0));
    node.add_input("In", (0.0, 25.0))
        .add_output("Out", (80.0, 25.0))
        .add_parameter("Percent Open", "[-]", 50.0, true)
        .add_parameter("Flow Coefficient (CV)", "[USGPM]", 100.0, true)
        .add_parameter("Pressure Drop", "[bar]", 0.1, false);
    node
}

fn inlet(name: &str, position: (f32, f32)) -> Node {
    let mut node = Node::new(name, "Inlet", UnitIcon::Inlet, position, (40.0, 50.0));
    node.add_input("In", (0.0, 25.0))
        .add_output("Out", (40.0, 25.0))
        .add_parameter("Pressure", "[bar]", 1.01325, true)
        .add_parameter("Mass Flow Rate", "[kg/s]", 1.0, false)
        .add_parameter("Temperature", "[K]", 298.0, true);
    node
}

fn outlet(name: &str, position: (f32, f32)) -> Node {
    let mut node = Node::new(name, "Outlet", UnitIcon::Outlet, position, (100.0, 60.0));
    node.add_input("In", (0.0, 30.0))
        .add_parameter("Pressure", "[bar]", 1.01325, true);
    node
}

fn compressor(name: &str, position: (f32, f32)) -> Node {
    let mut node = Node::new(
        name,
        "Compressor",
        UnitIcon::Compressor,
        position,
        (140.0, 100.0),
    );
    node.add_input("Suction", (0.0, 50.0))
        .add_output("Discharge", (140.0, 50.0))
        .add_parameter("Pressure Ratio", "[-]", 2.0, true)
        .add_parameter("Efficiency", "[-]", 0.75, true)
        .add_parameter("Power", "[kW]", 100.0, false);
    node
}

fn tank(name: &str, position: (f32, f32)) -> Node {
    let mut node = Node::new(name, "Tank", UnitIcon::Tank, position, (120.0, 160.0));
    node.add_input("In", (0.0, 60.0))
        .add_output("Out", (120.0, 100.0))
        .add_parameter("Volume", "[m3]", 10.0, true)
        .add_parameter("Initial Level", "[m]", 5.0, true)
        .add_parameter("Max Pressure", "[bar]", 100.0, true);
    node
}

fn pipe(name: &str, position: (f32, f32)) -> Node {
    let mut node = Node::new(name, "Pipe", UnitIcon::Pipe, position, (160.0, 70.0));
    node.add_input("In", (0.0, 35.0))
        .add_output("Out", (160.0, 35.0))
        .add_parameter("Length", "[m]", 10.0, true)
        .add_parameter("Diameter", "[m]", 0.1, true)
        .add_parameter("Roughness", "[m]", 0.001, true);
    node
}

fn splitter(name: &str, position: (f32, f32)) -> Node {
    let mut node = Node::new(name, "Splitter", UnitIcon::Splitter, position, (120.0, 120.0));
    node.add_input("In", (0.0, 60.0))
        .add_output("Out1", (120.0, 30.0))
        .add_output("Out2", (120.0, 60.0))
        .add_output("Out3", (120.0, 90.0))
        .add_parameter("Split Ratio 1", "[-]", 0.33, true)
        .add_parameter("Split Ratio 2", "[-]", 0.33, true)
        .add_parameter("Split Ratio 3", "[-]", 0.34, true);
    node
}

fn mixer(name: &str, position: (f32, f32)) -> Node {
    let mut node = Node::new(name, "Mixer", UnitIcon::Mixer, position, (120.0, 120.0));
    node.add_input("In1", (0.0, 30.0))
        .add_input("In2", (0.0, 60.0))
        .add_input("In3", (0.0, 90.0))
        .add_output("Out", (120.0, 60.0))
        .add_parameter("Pressure Drop", "[kPa]", 5.0, true)
        .add_parameter("Efficiency", "[-]", 0.95, true);
    node
}
