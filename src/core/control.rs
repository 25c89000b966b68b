//=========================================================================
// Loop Control
//=========================================================================
//
// Cooperative stop signalling for the main loop.
//
// Stop requests travel over a bounded channel and are drained once at
// the top of each frame, so a request never interrupts in-flight frame
// work: the frame that was running when the request arrived completes
// before the loop exits.
//
//=========================================================================

//=== External Dependencies ===============================================

use crossbeam_channel::{bounded, Receiver, Sender};
use log::debug;

//=== Constants ===========================================================

/// Capacity of the control channel. Stop is idempotent, so a full
/// channel can discard surplus requests without losing information.
const CONTROL_CHANNEL_CAPACITY: usize = 8;

//=== LoopCommand =========================================================

/// Commands delivered to the loop between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopCommand {
    /// End the run at the next loop-condition check.
    Stop,
}

//=== LoopControl =========================================================

/// Control flow decision for one frame of the main loop.
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

//=== StopHandle ==========================================================

/// Cloneable handle that requests a cooperative stop of the main loop.
///
/// Obtained from [`crate::Engine::stop_handle`] and handed to
/// collaborators that need to end the run from inside an update, or from
/// another thread such as a signal handler. The request takes effect at
/// the next top-of-loop check; the in-flight frame always completes.
#[derive(Debug, Clone)]
pub struct StopHandle {
    sender: Sender<LoopCommand>,
}

impl StopHandle {
    /// Requests that the main loop end after the current frame.
    ///
    /// Never blocks. A full channel already carries a pending stop and a
    /// disconnected one means the loop is gone; both are fine to ignore.
    pub fn request_stop(&self) {
        let _ = self.sender.try_send(LoopCommand::Stop);
    }
}

//=== CommandQueue ========================================================

/// Owning side of the control channel, held by the engine.
pub(crate) struct CommandQueue {
    sender: Sender<LoopCommand>,
    receiver: Receiver<LoopCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        let (sender, receiver) = bounded(CONTROL_CHANNEL_CAPACITY);
        Self { sender, receiver }
    }

    /// Creates a new stop handle connected to this queue.
    pub fn handle(&self) -> StopHandle {
        StopHandle {
            sender: self.sender.clone(),
        }
    }

    /// Drains every pending command and reports the resulting control
    /// flow. Called once at the top of each frame.
    pub fn drain(&self) -> LoopControl {
        let mut control = LoopControl::Continue;

        while let Ok(command) = self.receiver.try_recv() {
            match command {
                LoopCommand::Stop => {
                    debug!("Stop requested via control channel");
                    control = LoopControl::Exit;
                }
            }
        }

        control
    }
}

//=== Tests ===============================================================
