//! WebSocket client session management.

use std::{sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use missionlink_shared::protocol::{ClientCommand, ServerCommand};

use crate::{
    domain::{HELP_TEXT, InputCommand, Roster, parse_input_line},
    error::ClientError,
    formatter::MessageFormatter,
    lighting::{SceneLighting, SimulatedBaker},
    mission::{MissionDownloader, MissionObserver},
    ui::redisplay_prompt,
};

const LIGHTING_STEPS: u32 = 20;

/// How to reach the server and who to join as.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// WebSocket endpoint, e.g. `ws://127.0.0.1:28000/ws`
    pub url: String,
    pub name: String,
    pub identity: String,
    pub invite: Option<String>,
    pub demo: bool,
    /// Duration of the simulated lighting bake
    pub lighting: Duration,
}

impl ConnectOptions {
    /// Endpoint URL with the connect parameters in its query string.
    pub fn connect_url(&self) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.url, e)))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ClientError::InvalidUrl(format!(
                "{}: expected a ws:// or wss:// url",
                self.url
            )));
        }

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("name", &self.name);
            if !self.identity.is_empty() {
                query.append_pair("identity", &self.identity);
            }
            if let Some(invite) = self.invite.as_deref().filter(|i| !i.is_empty()) {
                query.append_pair("invite", invite);
            }
            if self.demo {
                query.append_pair("demo", "true");
            }
        }
        Ok(url)
    }
}

/// Prints loading progress to the terminal.
struct ConsoleObserver {
    prompt: String,
}

impl ConsoleObserver {
    fn progress(&self, label: &str, progress: f32) {
        print!("{}", MessageFormatter::format_progress(label, progress));
        std::io::Write::flush(&mut std::io::stdout()).ok();
    }
}

impl MissionObserver for ConsoleObserver {
    fn on_mission_download_phase1(&self, mission: &str) {
        print!("{}", MessageFormatter::format_phase_started(1, mission));
    }

    fn on_phase1_progress(&self, progress: f32) {
        self.progress("Loading datablocks", progress);
    }

    fn on_phase1_complete(&self) {
        println!();
    }

    fn on_mission_download_phase2(&self, mission: &str) {
        print!("{}", MessageFormatter::format_phase_started(2, mission));
    }

    fn on_phase2_progress(&self, progress: f32) {
        self.progress("Loading objects", progress);
    }

    fn on_phase2_complete(&self) {
        println!();
    }

    fn on_mission_download_phase3(&self, mission: &str) {
        print!("{}", MessageFormatter::format_phase_started(3, mission));
    }

    fn on_phase3_progress(&self, progress: f32) {
        self.progress("Lighting", progress);
    }

    fn on_phase3_complete(&self) {
        println!();
    }

    fn on_mission_download_complete(&self) {
        println!("Mission download complete");
        redisplay_prompt(&self.prompt);
    }

    fn on_mission_end(&self) {
        println!("\nMission ended");
        redisplay_prompt(&self.prompt);
    }

    fn on_player_spawned(&self, position: [f32; 3]) {
        print!("{}", MessageFormatter::format_spawned(position));
        redisplay_prompt(&self.prompt);
    }
}

/// Per-connection state driven by server commands.
struct SessionState {
    prompt: String,
    roster: Roster,
    downloader: MissionDownloader,
}

impl SessionState {
    fn handle(&mut self, command: &ServerCommand) -> Result<(), ClientError> {
        match command {
            ServerCommand::ConnectAccepted {
                client_id,
                sequence,
            } => {
                tracing::info!("Joined as {} (mission seq {})", client_id, sequence);
            }
            ServerCommand::ConnectRejected { reason } => {
                return Err(ClientError::Rejected(*reason));
            }
            ServerCommand::ServerParams(params) => {
                print!("{}", MessageFormatter::format_server_params(params));
                redisplay_prompt(&self.prompt);
            }
            ServerCommand::ClientJoined { client, is_me } => {
                self.roster.join(client, *is_me);
                if *is_me {
                    self.prompt = client.name.clone();
                }
                print!("{}", MessageFormatter::format_client_joined(client, *is_me));
                redisplay_prompt(&self.prompt);
            }
            ServerCommand::ClientDropped { client_id, name } => {
                let name = self.roster.drop_client(client_id).unwrap_or_else(|| name.clone());
                tracing::debug!("{} players remain", self.roster.len());
                print!("{}", MessageFormatter::format_client_dropped(&name));
                redisplay_prompt(&self.prompt);
            }
            ServerCommand::ClientReadyStatusChanged { client_id, ready } => {
                if self.roster.is_me(client_id) {
                    tracing::debug!("Own ready status is now {}", ready);
                }
                print!(
                    "{}",
                    MessageFormatter::format_ready_status(self.roster.name_of(client_id), *ready)
                );
                redisplay_prompt(&self.prompt);
            }
            other => self.downloader.handle(other)?,
        }
        Ok(())
    }
}

/// Run one connection until it closes, is rejected or the user quits.
pub async fn run_client_session(options: &ConnectOptions) -> Result<(), ClientError> {
    let url = options.connect_url()?;

    let (ws_stream, _response) = connect_async(url.as_str())
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    tracing::info!("Connected to {}", options.url);
    println!(
        "\nJoined as '{}'. {}. Press Ctrl+C to exit.\n",
        options.name, HELP_TEXT
    );

    let (mut write, mut read) = ws_stream.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ClientCommand>();

    // Every outbound command goes through this task
    let mut write_task = tokio::spawn(async move {
        while let Some(command) = outbound_rx.recv().await {
            let json = match command.to_json() {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to encode {:?}: {}", command, e);
                    continue;
                }
            };
            tracing::debug!("-> {}", json);
            if let Err(e) = write.send(Message::Text(json.into())).await {
                return Err(ClientError::ConnectionError(e.to_string()));
            }
        }
        Ok(())
    });

    let observer = Arc::new(ConsoleObserver {
        prompt: options.name.clone(),
    });
    let lighting = SceneLighting::new(Arc::new(SimulatedBaker::new(
        options.lighting,
        LIGHTING_STEPS,
    )));
    let mut state = SessionState {
        prompt: options.name.clone(),
        roster: Roster::new(),
        downloader: MissionDownloader::new(outbound_tx.clone(), observer, lighting),
    };

    let mut read_task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => match ServerCommand::from_json(&text) {
                    Ok(command) => {
                        tracing::debug!("<- {:?}", command);
                        state.handle(&command)?;
                    }
                    Err(e) => {
                        tracing::warn!("Unrecognised frame: {}", e);
                        print!("{}", MessageFormatter::format_raw_message(&text));
                        redisplay_prompt(&state.prompt);
                    }
                },
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    break;
                }
                Err(e) => {
                    return Err(ClientError::ConnectionError(e.to_string()));
                }
                _ => {}
            }
        }
        Err::<(), _>(ClientError::ConnectionError("Connection lost".to_string()))
    });

    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    spawn_readline(options.name.clone(), input_tx);

    let identity = options.identity.clone();
    let mut input_task = tokio::spawn(async move {
        while let Some(line) = input_rx.recv().await {
            let command = match parse_input_line(&line) {
                Ok(InputCommand::Quit) => break,
                Ok(InputCommand::Help) => {
                    println!("{}", HELP_TEXT);
                    continue;
                }
                Ok(InputCommand::SetReady(ready)) => ClientCommand::SetReadyStatus { ready },
                Ok(InputCommand::Rename(name)) => ClientCommand::UpdateClientData {
                    name,
                    identity: identity.clone(),
                },
                Err(usage) => {
                    println!("{}", usage);
                    continue;
                }
            };
            if outbound_tx.send(command).is_err() {
                return Err(ClientError::ConnectionError("Connection lost".to_string()));
            }
        }
        Ok(())
    });

    // Whichever side finishes first ends the session
    let result = tokio::select! {
        read_result = &mut read_task => read_result,
        write_result = &mut write_task => write_result,
        input_result = &mut input_task => input_result,
    };
    read_task.abort();
    write_task.abort();
    input_task.abort();

    result.map_err(|e| ClientError::ConnectionError(e.to_string()))?
}

/// Read prompt lines on a blocking thread and forward them.
fn spawn_readline(prompt_name: String, input_tx: mpsc::UnboundedSender<String>) {
    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", prompt_name);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });
}
