//! WebSocket Actor
//!
//! Owns the connected live reload clients and broadcasts reload pulses.
//!
//! ```text
//! acceptor thread --AddClient--> WsActor --reload--> browsers
//! BuilderActor    --Reload----->
//! ```

mod client_io;

use std::net::TcpStream;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::messages::WsMsg;
use crate::reload::message::ReloadMessage;

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// WebSocket Actor - manages client connections and broadcasts
pub struct WsActor {
    rx: mpsc::Receiver<WsMsg>,
    /// Shared with the reader thread
    clients: Clients,
}

impl WsActor {
    pub fn new(rx: mpsc::Receiver<WsMsg>) -> Self {
        Self {
            rx,
            clients: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let reader_clients = Arc::clone(&self.clients);
        std::thread::spawn(move || client_io::reader_loop(reader_clients));

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::Reload { reason } => {
                    crate::debug!("reload"; "sending reload: {}", reason);
                    let json = ReloadMessage::reload(reason).to_json();
                    self.broadcast(Message::Text(json.into()));
                }
                WsMsg::AddClient(stream) => {
                    let clients = Arc::clone(&self.clients);
                    tokio::task::spawn_blocking(move || client_io::add_client(&clients, stream));
                }
                WsMsg::Shutdown => break,
            }
        }

        crate::debug!("reload"; "closing clients");
        for mut ws in self.clients.lock().drain(..) {
            let _ = ws.close(None);
        }
    }

    /// Send `msg` to every client, dropping the ones that went away.
    fn broadcast(&self, msg: Message) {
        let mut clients = self.clients.lock();
        if clients.is_empty() {
            crate::debug!("reload"; "no clients connected");
            return;
        }

        clients.retain_mut(|ws| match ws.send(msg.clone()) {
            Ok(()) => true,
            Err(e) => {
                crate::debug!("reload"; "client disconnected: {}", e);
                false
            }
        });
        crate::debug!("reload"; "broadcast to {} clients", clients.len());
    }

    #[cfg(test)]
    fn client_count(&self) -> usize {
        self.clients.lock().len()
    }
}
