use std::sync::{ mpsc::Receiver, PoisonError };
use crate::state::{ StateMutex, StatePlayground };

pub struct Editor {
    pub rx: Receiver<StatePlayground>,
    pub state: StateMutex,
}

impl Editor {
    /// Copies every received state into the shared one. Returns once all
    /// senders are gone.
    pub fn listen_and_update(&self) {
        while let Ok(received_state) = self.rx.recv() {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            *state = received_state;
        }
        tracing::debug!("state channel closed, editor stopped");
    }
}
