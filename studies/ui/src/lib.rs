use std::sync::mpsc::{ Receiver, Sender };
use std::thread::{ self, JoinHandle };

use editor::Editor;
use state::{ Command, StateMutex, StatePlayground };
use ui::App;
use color_eyre::Result;

pub mod ui;
pub mod state;
pub mod editor;

/// Feeds states received on `rx` into `state` on a background thread.
pub fn spawn_editor(rx: Receiver<StatePlayground>, state: StateMutex) -> JoinHandle<()> {
    let editor = Editor { rx, state };
    thread::spawn(move || {
        editor.listen_and_update();
    })
}

/// Takes over the terminal until the user quits.
pub fn run(state: StateMutex, commands: Sender<Command>) -> Result<()> {
    let terminal = ratatui::init();
    let app = App::new(state, commands);

    let app_result = app.run(terminal);
    ratatui::restore();
    app_result
}
