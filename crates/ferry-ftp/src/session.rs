//! FTP session: one control channel plus the client-side state around it.
//!
//! A [`Session`] is owned by a single caller and is never shared; every
//! operation runs to completion before the next may start. Cancelling a
//! transfer future after `RETR`/`LIST`/`STOR` has been sent leaves the
//! control channel mid-command, so the session must then be discarded.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::info;

use crate::command::Command;
use crate::connection::{
    Config, ControlChannel, PassiveNegotiator, TransferEngine, TransferOutcome,
};
use crate::error::{Error, Result};
use crate::types::{DataMode, Reply, ReplyCode, TransferMode};

/// Command names accepted by [`Session::execute`].
pub const COMMANDS: &[&str] = &[
    "ascii", "binary", "cd", "cdup", "debug", "dir", "ls", "get", "passive", "active", "put",
    "pwd", "quit", "bye", "user", "noop",
];

/// An authenticated (or authenticating) FTP session.
pub struct Session<S = TcpStream> {
    control: ControlChannel<S>,
    engine: TransferEngine,
    authenticated: bool,
    transfer_mode: TransferMode,
    data_mode: DataMode,
    local_dir: PathBuf,
}

impl Session<TcpStream> {
    /// Connects to the configured server and reads its greeting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] if the server cannot be reached.
    pub async fn connect(config: &Config) -> Result<(Self, Reply)> {
        let (control, greeting) = ControlChannel::connect(config).await?;
        info!("Connected to {}", config.address());
        Ok((Self::new(control, config), greeting))
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a control channel whose greeting has been read.
    pub fn new(control: ControlChannel<S>, config: &Config) -> Self {
        Self {
            control,
            engine: TransferEngine::new(PassiveNegotiator::new(config.connect_timeout)),
            authenticated: false,
            transfer_mode: config.transfer_mode,
            data_mode: DataMode::Passive,
            local_dir: config.local_dir.clone(),
        }
    }

    /// Logs in with `USER`/`PASS`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] unless the final reply is 230. Retrying is
    /// left to the caller.
    pub async fn login(&mut self, user: &str, pass: &str) -> Result<Reply> {
        let reply = self.control.authenticate(user, pass).await?;
        self.accept_login(reply)
    }

    /// Sends `USER name` on its own.
    ///
    /// A 331 reply means [`Self::password`] should follow.
    ///
    /// # Errors
    ///
    /// Returns transport or protocol errors.
    pub async fn user(&mut self, name: &str) -> Result<Reply> {
        require("user", name)?;
        let command = Command::User {
            name: name.to_string(),
        };
        command.validate()?;
        self.authenticated = false;
        let reply = self.control.execute(&command).await?;
        if reply.code == ReplyCode::LOGGED_IN {
            self.authenticated = true;
        }
        Ok(reply)
    }

    /// Sends `PASS` after a 331 from [`Self::user`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] unless the reply is 230.
    pub async fn password(&mut self, pass: &str) -> Result<Reply> {
        let reply = self
            .control
            .execute(&Command::Pass {
                password: pass.to_string(),
            })
            .await?;
        self.accept_login(reply)
    }

    fn accept_login(&mut self, reply: Reply) -> Result<Reply> {
        if reply.code == ReplyCode::LOGGED_IN {
            self.authenticated = true;
            Ok(reply)
        } else {
            self.authenticated = false;
            Err(Error::Auth {
                code: reply.code.as_u16(),
                message: reply.message_text(),
            })
        }
    }

    /// Switches to ascii transfers and tells the server.
    ///
    /// # Errors
    ///
    /// Returns transport or protocol errors.
    pub async fn ascii(&mut self) -> Result<Reply> {
        self.set_mode(TransferMode::Ascii).await
    }

    /// Switches to binary transfers and tells the server.
    ///
    /// # Errors
    ///
    /// Returns transport or protocol errors.
    pub async fn binary(&mut self) -> Result<Reply> {
        self.set_mode(TransferMode::Binary).await
    }

    async fn set_mode(&mut self, mode: TransferMode) -> Result<Reply> {
        self.transfer_mode = mode;
        self.control.execute(&Command::Type(mode)).await
    }

    /// Selects passive data connections.
    pub const fn passive(&mut self) -> DataMode {
        self.data_mode = DataMode::Passive;
        self.data_mode
    }

    /// Rejects active (PORT) data connections.
    ///
    /// # Errors
    ///
    /// Always returns [`Error::UnsupportedMode`]; session state is unchanged.
    #[allow(clippy::unused_self, clippy::unnecessary_wraps)]
    pub fn active(&self) -> Result<DataMode> {
        Err(Error::UnsupportedMode(
            "active (PORT) data connections".into(),
        ))
    }

    /// Changes the remote working directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty path.
    pub async fn cd(&mut self, path: &str) -> Result<Reply> {
        require("cd", path)?;
        self.control
            .execute(&Command::Cwd {
                path: path.to_string(),
            })
            .await
    }

    /// Moves to the parent remote directory.
    ///
    /// # Errors
    ///
    /// Returns transport or protocol errors.
    pub async fn cdup(&mut self) -> Result<Reply> {
        self.control.execute(&Command::Cdup).await
    }

    /// Asks for the remote working directory.
    ///
    /// # Errors
    ///
    /// Returns transport or protocol errors.
    pub async fn pwd(&mut self) -> Result<Reply> {
        self.control.execute(&Command::Pwd).await
    }

    /// Sends `NOOP`.
    ///
    /// # Errors
    ///
    /// Returns transport or protocol errors.
    pub async fn noop(&mut self) -> Result<Reply> {
        self.control.execute(&Command::Noop).await
    }

    /// Downloads a remote file into the local directory.
    ///
    /// # Errors
    ///
    /// See [`TransferEngine::download`].
    pub async fn download(&mut self, remote_path: &str) -> Result<TransferOutcome> {
        self.engine
            .download(
                &mut self.control,
                self.transfer_mode,
                remote_path,
                &self.local_dir,
            )
            .await
    }

    /// Lists the remote working directory.
    ///
    /// # Errors
    ///
    /// See [`TransferEngine::list`].
    pub async fn list(&mut self) -> Result<Vec<String>> {
        self.engine.list(&mut self.control).await
    }

    /// Uploads a local file under its base name.
    ///
    /// # Errors
    ///
    /// See [`TransferEngine::upload`].
    pub async fn upload(&mut self, local_path: &Path) -> Result<TransferOutcome> {
        let remote_name = local_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                Error::InvalidArgument(format!("no file name in {}", local_path.display()))
            })?
            .to_string();
        self.engine
            .upload(
                &mut self.control,
                self.transfer_mode,
                local_path,
                &remote_name,
            )
            .await
    }

    /// Toggles wire tracing and returns the new state.
    pub const fn toggle_debug(&mut self) -> bool {
        let enabled = !self.control.wire_trace();
        self.control.set_wire_trace(enabled);
        enabled
    }

    /// Sends `QUIT` and closes the control connection.
    ///
    /// # Errors
    ///
    /// Returns an error if `QUIT` could not be sent or answered; the
    /// connection is closed regardless.
    pub async fn quit(&mut self) -> Result<Option<Reply>> {
        self.authenticated = false;
        self.control.close().await
    }

    /// Runs one user-facing command and renders its result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for unknown commands or missing
    /// arguments, plus whatever the command itself returns.
    pub async fn execute(&mut self, name: &str, args: &[&str]) -> Result<String> {
        let arg = args.first().copied().unwrap_or_default();
        match name.to_ascii_lowercase().as_str() {
            "ascii" => Ok(self.ascii().await?.to_string()),
            "binary" => Ok(self.binary().await?.to_string()),
            "cd" => Ok(self.cd(arg).await?.to_string()),
            "cdup" => Ok(self.cdup().await?.to_string()),
            "pwd" => Ok(self.pwd().await?.to_string()),
            "noop" => Ok(self.noop().await?.to_string()),
            "user" => Ok(self.user(arg).await?.to_string()),
            "debug" => {
                let state = if self.toggle_debug() { "on" } else { "off" };
                Ok(format!("Debug mode {state}"))
            }
            "passive" => {
                self.passive();
                Ok("Passive mode on".to_string())
            }
            "active" => self.active().map(|mode| format!("{mode:?} mode on")),
            "dir" | "ls" => Ok(self.list().await?.join("\n")),
            "get" => {
                require("get", arg)?;
                let outcome = self.download(arg).await?;
                Ok(format!("{} ({} bytes)", outcome.reply, outcome.bytes))
            }
            "put" => {
                require("put", arg)?;
                let outcome = self.upload(Path::new(arg)).await?;
                Ok(format!("{} ({} bytes)", outcome.reply, outcome.bytes))
            }
            "quit" | "bye" => Ok(self
                .quit()
                .await?
                .map(|reply| reply.to_string())
                .unwrap_or_default()),
            other => Err(Error::InvalidArgument(format!("unknown command: {other}"))),
        }
    }

    /// Returns true after a 230 login reply.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Returns the current transfer mode.
    #[must_use]
    pub const fn transfer_mode(&self) -> TransferMode {
        self.transfer_mode
    }

    /// Returns the current data connection mode.
    #[must_use]
    pub const fn data_mode(&self) -> DataMode {
        self.data_mode
    }

    /// Returns true once the control connection has been closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.control.is_closed()
    }

    /// Returns the code of the most recent reply.
    #[must_use]
    pub const fn last_code(&self) -> Option<ReplyCode> {
        self.control.last_code()
    }
}

fn require(command: &str, arg: &str) -> Result<()> {
    if arg.is_empty() {
        return Err(Error::InvalidArgument(format!("{command} needs an argument")));
    }
    Ok(())
}
