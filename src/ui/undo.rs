//! Undo/redo functionality for tracking and reversing user edits.
//!
//! Every edit to the flowsheet is recorded as an [`UndoAction`]. Applying an
//! action reverses it and yields the action that reverses it again, so the
//! same machinery serves both undo and redo.

use crate::constants::MAX_UNDO_HISTORY;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Represents different types of actions that can be undone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UndoAction {
    /// One or more nodes were dragged
    NodesMoved {
        /// (node, position before, position after)
        moves: Vec<(NodeId, (f32, f32), (f32, f32))>,
    },
    /// Nodes were added to the flowsheet
    NodesCreated {
        /// Ids of the added nodes
        node_ids: Vec<NodeId>,
    },
    /// Nodes were deleted together with their connections
    NodesDeleted {
        /// Everything that was removed, with original indices
        removed: RemovedItems,
    },
    /// A connection was created
    ConnectionCreated {
        /// The new connection
        connection: Connection,
    },
    /// A connection was deleted
    ConnectionDeleted {
        /// The removed connection
        connection: Connection,
        /// Its former index in the connection list
        index: usize,
    },
    /// A node's name was changed
    NodeRenamed {
        /// Renamed node
        node_id: NodeId,
        /// Name before the edit
        old_name: String,
        /// Name after the edit
        new_name: String,
    },
    /// A parameter value or its specified flag was changed
    ParameterChanged {
        /// Owning node
        node_id: NodeId,
        /// Index into the node's parameters
        index: usize,
        /// Parameter before the edit
        old: Parameter,
        /// Parameter after the edit
        new: Parameter,
    },
}

/// Manages undo/redo history for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UndoHistory {
    #[serde(skip)]
    undo_stack: Vec<UndoAction>,
    #[serde(skip)]
    redo_stack: Vec<UndoAction>,
}

impl UndoHistory {
    /// Creates a new empty undo history.
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// Adds an action to the undo history.
    ///
    /// This clears the redo stack since a new action invalidates any previously undone actions.
    pub fn push_action(&mut self, action: UndoAction) {
        self.undo_stack.push(action);
        self.redo_stack.clear();

        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    /// Adds an action, folding it into the previous one when both edit the
    /// same parameter of the same node.
    ///
    /// Dragging a value emits a change every frame; this keeps the whole drag
    /// as a single undo step.
    pub fn push_coalesced(&mut self, action: UndoAction) {
        if let (
            Some(UndoAction::ParameterChanged {
                node_id: last_node,
                index: last_index,
                new: last_new,
                ..
            }),
            UndoAction::ParameterChanged {
                node_id, index, new, ..
            },
        ) = (self.undo_stack.last_mut(), &action)
        {
            if last_node == node_id && last_index == index {
                *last_new = new.clone();
                self.redo_stack.clear();
                return;
            }
        }
        self.push_action(action);
    }

    /// Returns true if there are actions that can be undone.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if there are actions that can be redone.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Pops the most recent action from the undo stack.
    pub fn pop_undo(&mut self) -> Option<UndoAction> {
        self.undo_stack.pop()
    }

    /// Pops the most recent action from the redo stack.
    pub fn pop_redo(&mut self) -> Option<UndoAction> {
        self.redo_stack.pop()
    }

    /// Pushes an action onto the redo stack.
    pub fn push_redo(&mut self, action: UndoAction) {
        self.redo_stack.push(action);
    }

    /// Pushes an action back onto the undo stack without touching redo.
    pub fn push_undo(&mut self, action: UndoAction) {
        self.undo_stack.push(action);
    }

    /// Clears all undo and redo history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

/// Extension methods for applying undo/redo actions to a flowsheet.
pub trait UndoableFlowsheet {
    /// Reverses `action` and returns the action that would re-apply it.
    fn apply_undo(&mut self, action: &UndoAction) -> Option<UndoAction>;

    /// Re-applies an action previously returned by [`UndoableFlowsheet::apply_undo`].
    fn apply_redo(&mut self, action: &UndoAction) -> Option<UndoAction>;
}

impl UndoableFlowsheet for Flowsheet {
    fn apply_undo(&mut self, action: &UndoAction) -> Option<UndoAction> {
        match action {
            UndoAction::NodesMoved { moves } => {
                let mut inverse = Vec::with_capacity(moves.len());
                for (id, old, new) in moves {
                    if let Some(node) = self.node_mut(*id) {
                        node.position = *old;
                        inverse.push((*id, *new, *old));
                    }
                }
                (!inverse.is_empty()).then_some(UndoAction::NodesMoved { moves: inverse })
            }
            UndoAction::NodesCreated { node_ids } => {
                let removed = self.remove_nodes(node_ids);
                (!removed.is_empty()).then_some(UndoAction::NodesDeleted { removed })
            }
            UndoAction::NodesDeleted { removed } => {
                self.restore(removed);
                Some(UndoAction::NodesCreated {
                    node_ids: removed.nodes.iter().map(|(_, n)| n.id).collect(),
                })
            }
            UndoAction::ConnectionCreated { connection } => {
                let index = self.connections.iter().position(|c| c == connection)?;
                let connection = self.connections.remove(index);
                Some(UndoAction::ConnectionDeleted { connection, index })
            }
            UndoAction::ConnectionDeleted { connection, index } => {
                let at = (*index).min(self.connections.len());
                self.connections.insert(at, *connection);
                Some(UndoAction::ConnectionCreated {
                    connection: *connection,
                })
            }
            UndoAction::NodeRenamed {
                node_id,
                old_name,
                new_name,
            } => {
                let node = self.node_mut(*node_id)?;
                node.name = old_name.clone();
                Some(UndoAction::NodeRenamed {
                    node_id: *node_id,
                    old_name: new_name.clone(),
                    new_name: old_name.clone(),
                })
            }
            UndoAction::ParameterChanged {
                node_id,
                index,
                old,
                new,
            } => {
                let parameter = self.node_mut(*node_id)?.parameters.get_mut(*index)?;
                *parameter = old.clone();
                Some(UndoAction::ParameterChanged {
                    node_id: *node_id,
                    index: *index,
                    old: new.clone(),
                    new: old.clone(),
                })
            }
        }
    }

    fn apply_redo(&mut self, action: &UndoAction) -> Option<UndoAction> {
        // Redo is applying the inverse recorded by undo
        self.apply_undo(action)
    }
}
