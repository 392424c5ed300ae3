//! Byte-level client for the game server.
//!
//! Every tick the server sends one window frame (`width * height - 1` bytes,
//! row-major, centre omitted) and waits for a single action byte in reply. The
//! game is over when the server closes the connection.
//!
//! An agent with no action is not an error in itself, but the protocol has
//! no way to skip a tick: the server sends nothing until it reads a byte. The
//! client therefore asks the agent again on the same window, which helps when
//! the agent dropped a refused task, and abandons the session once
//! [`MAX_IDLE_TICKS`] attempts in a row come back empty. Replanning on an
//! unchanged model gives the same answer, so waiting longer cannot help.

use std::{
    io::{self, BufReader, Read, Write},
    net::TcpStream,
};

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};
use treasure_hunt_core::{Action, ViewConfig, agent::Agent, view::View};

/// Attempts per window before the session is abandoned.
const MAX_IDLE_TICKS: usize = 3;

pub struct Connection {
    config: ViewConfig,
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Connection {
    pub fn connect(port: u16, config: ViewConfig) -> Result<Self> {
        let stream = TcpStream::connect(("localhost", port))
            .with_context(|| format!("failed to connect to localhost:{port}"))?;
        stream.set_nodelay(true)?;
        let writer = stream.try_clone()?;
        info!(port, "connected to game server");
        Ok(Connection {
            config,
            reader: BufReader::new(stream),
            writer,
        })
    }

    /// Reads the next window. Returns `None` once the server hangs up.
    pub fn read_view(&mut self) -> Result<Option<View>> {
        let mut frame = vec![0u8; self.config.frame_len()];
        match self.reader.read_exact(&mut frame) {
            Ok(()) => Ok(Some(View::from_frame(self.config, &frame)?)),
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(err) => Err(err).context("failed to read window frame"),
        }
    }

    pub fn send(&mut self, action: Action) -> Result<()> {
        self.writer
            .write_all(&[action.to_byte()])
            .context("failed to send action")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Plays until the server closes the connection. Returns the number of actions sent.
pub fn play(connection: &mut Connection, agent: &mut dyn Agent) -> Result<usize> {
    let mut sent = 0usize;

    while let Some(view) = connection.read_view()? {
        let action = (0..MAX_IDLE_TICKS).find_map(|attempt| {
            let action = agent.next_action(&view);
            if action.is_none() {
                warn!(attempt, "agent produced no action");
            }
            action
        });
        let Some(action) = action else {
            bail!("agent stayed idle for {MAX_IDLE_TICKS} ticks");
        };

        debug!(?action, "sending");
        connection.send(action)?;
        sent += 1;
    }

    info!(sent, "server closed the connection");
    Ok(sent)
}

#[cfg(test)]
mod tests {
    use std::{net::TcpListener, thread};

    use treasure_hunt_core::{
        agent::PlanningAgent,
        environment::{ActionResult, load_environment_from_string},
    };

    use super::*;

    #[test]
    fn plays_a_game_served_over_tcp() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let map = "*****\n* $ *\n*   *\n* ^ *\n*****";
            let mut env = load_environment_from_string(map, ViewConfig::default()).unwrap();
            let (mut stream, _) = listener.accept().unwrap();
            loop {
                stream.write_all(&env.view().to_frame()).unwrap();
                let mut byte = [0u8];
                stream.read_exact(&mut byte).unwrap();
                let action = Action::from_char(byte[0] as char).unwrap();
                if env.process_action(action) == ActionResult::Win {
                    return env.steps();
                }
            }
        });

        let mut connection = Connection::connect(port, ViewConfig::default()).unwrap();
        let mut agent = PlanningAgent::default();
        let sent = play(&mut connection, &mut agent).unwrap();
        assert_eq!(sent, server.join().unwrap());
        assert_eq!(sent, 6);
    }

    #[test]
    fn walled_in_agent_abandons_the_session() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let map = "*****\n*****\n**^**\n*****\n*****";
            let env = load_environment_from_string(map, ViewConfig::default()).unwrap();
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(&env.view().to_frame()).unwrap();
            let mut replies = Vec::new();
            stream.read_to_end(&mut replies).unwrap();
            replies
        });

        let mut connection = Connection::connect(port, ViewConfig::default()).unwrap();
        let mut agent = PlanningAgent::default();
        let err = play(&mut connection, &mut agent).unwrap_err();
        assert!(err.to_string().contains("idle"));
        drop(connection);
        assert!(server.join().unwrap().is_empty());
    }
}
