use crate::core::{BodyHandle, ConstraintHandle, SpringHandle};
use crate::bodies::RigidBody;
use crate::constraints::Constraint;
use crate::forces::Spring;
use std::collections::VecDeque;

/// Types of world events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorldEventType {
    AddBody,
    RemoveBody,
    AddSpring,
    PostStep,
    Impact,
}

/// An event emitted by the physics world
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    /// A body has been added to the world
    AddBody { body: BodyHandle },

    /// A body has been removed from the world
    RemoveBody { body: BodyHandle },

    /// A spring has been added to the world
    AddSpring { spring: SpringHandle },

    /// A step has finished; `time` is the simulation time after it
    PostStep { time: f32 },

    /// Two shapes touched for the first time
    Impact {
        body_a: BodyHandle,
        body_b: BodyHandle,
        shape_a: u32,
        shape_b: u32,
    },
}

impl WorldEvent {
    /// Returns the type of the event
    pub fn event_type(&self) -> WorldEventType {
        match self {
            WorldEvent::AddBody { .. } => WorldEventType::AddBody,
            WorldEvent::RemoveBody { .. } => WorldEventType::RemoveBody,
            WorldEvent::AddSpring { .. } => WorldEventType::AddSpring,
            WorldEvent::PostStep { .. } => WorldEventType::PostStep,
            WorldEvent::Impact { .. } => WorldEventType::Impact,
        }
    }

    /// Checks if the event refers to a specific body
    pub fn involves_body(&self, body: BodyHandle) -> bool {
        match self {
            WorldEvent::AddBody { body: b } | WorldEvent::RemoveBody { body: b } => *b == body,
            WorldEvent::Impact { body_a, body_b, .. } => *body_a == body || *body_b == body,
            WorldEvent::AddSpring { .. } | WorldEvent::PostStep { .. } => false,
        }
    }
}

/// A queue of world events, drained by the caller
#[derive(Debug, Default, Clone)]
pub struct EventQueue {
    events: VecDeque<WorldEvent>,
}

impl EventQueue {
    /// Creates a new empty event queue
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
        }
    }

    /// Adds an event to the queue
    pub fn push(&mut self, event: WorldEvent) {
        self.events.push_back(event);
    }

    /// Gets the next event from the queue
    pub fn next_event(&mut self) -> Option<WorldEvent> {
        self.events.pop_front()
    }

    /// Removes and returns every queued event, oldest first
    pub fn drain(&mut self) -> Vec<WorldEvent> {
        self.events.drain(..).collect()
    }

    /// Returns the number of queued events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Clears all events from the queue
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Gets all events of a specific type
    pub fn get_events_of_type(&self, event_type: WorldEventType) -> Vec<&WorldEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Gets all events involving a specific body
    pub fn get_events_for_body(&self, body: BodyHandle) -> Vec<&WorldEvent> {
        self.events
            .iter()
            .filter(|e| e.involves_body(body))
            .collect()
    }
}

/// A change to the world requested while it was stepping
pub(crate) enum Command {
    AddBody(Box<RigidBody>),
    RemoveBody(BodyHandle),
    AddSpring(Spring),
    RemoveSpring(SpringHandle),
    AddConstraint(Box<dyn Constraint>),
    RemoveConstraint(ConstraintHandle),
}

/// Collects world changes requested by event listeners.
///
/// The world applies the commands in order once the current step has returned.
#[derive(Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    /// Creates an empty command buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a body to be added
    pub fn add_body(&mut self, body: RigidBody) {
        self.commands.push(Command::AddBody(Box::new(body)));
    }

    /// Queues a body to be removed
    pub fn remove_body(&mut self, body: BodyHandle) {
        self.commands.push(Command::RemoveBody(body));
    }

    /// Queues a spring to be added
    pub fn add_spring(&mut self, spring: Spring) {
        self.commands.push(Command::AddSpring(spring));
    }

    /// Queues a spring to be removed
    pub fn remove_spring(&mut self, spring: SpringHandle) {
        self.commands.push(Command::RemoveSpring(spring));
    }

    /// Queues a constraint to be added
    pub fn add_constraint(&mut self, constraint: Box<dyn Constraint>) {
        self.commands.push(Command::AddConstraint(constraint));
    }

    /// Queues a constraint to be removed
    pub fn remove_constraint(&mut self, constraint: ConstraintHandle) {
        self.commands.push(Command::RemoveConstraint(constraint));
    }

    /// Returns the number of queued commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns whether no command is queued
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub(crate) fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }
}

/// A callback invoked synchronously for every world event
pub type EventListener = Box<dyn FnMut(&WorldEvent, &mut CommandBuffer) + Send>;
