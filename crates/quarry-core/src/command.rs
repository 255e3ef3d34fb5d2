//! Command sink trait and recording implementation.
//!
//! The controller never talks to the engine directly. Each tick it pushes
//! the orders it wants issued into a [`CommandSink`]; the embedding layer
//! decides what that means concretely. In the simulator and in tests the
//! sink is a [`RecordingSink`] that just collects [`Command`] values.

use quarry_types::{Command, CommandTarget, Point2, WorkerId};

/// Receiver for the orders a controller emits during a tick.
///
/// `interact` is the engine's context-sensitive right-click: aimed at a node
/// it starts gathering, aimed at a base it delivers held cargo, aimed at a
/// point it walks there and stops. `move_to` is a plain movement order.
pub trait CommandSink {
    /// Issue a context-sensitive interact order.
    fn interact(&mut self, worker: WorkerId, target: CommandTarget);

    /// Issue a plain movement order toward a ground point.
    fn move_to(&mut self, worker: WorkerId, point: Point2);
}

/// A sink that records every command in emission order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    /// Commands received so far, oldest first.
    pub commands: Vec<Command>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub const fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Drain the recorded commands, leaving the sink empty.
    pub fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }
}

impl CommandSink for RecordingSink {
    fn interact(&mut self, worker: WorkerId, target: CommandTarget) {
        self.commands.push(Command::Interact { worker, target });
    }

    fn move_to(&mut self, worker: WorkerId, point: Point2) {
        self.commands.push(Command::Move { worker, point });
    }
}
