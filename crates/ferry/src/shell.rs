//! Interactive prompt: login loop and the `ftp>` command loop.

use anyhow::Result;
use ferry_ftp::{Error, ReplyCode, Session};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

const HELP: &str = "\
Commands:
  ascii          set ascii transfer mode
  binary         set binary transfer mode
  cd <path>      change remote directory
  cdup           change to parent remote directory
  debug          toggle protocol tracing
  dir, ls        list remote directory
  get <path>     download a file
  put <file>     upload a file
  passive        use passive data connections
  active         active mode (not supported)
  pwd            print remote directory
  noop           keep the connection alive
  user <name>    log in again as another user
  help, ?        show this text
  quit, bye      close the connection and exit";

/// Line-oriented terminal, generic so tests can script it.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prints `prompt` and reads one line. `None` means end of input.
    pub async fn prompt(&mut self, prompt: &str) -> Result<Option<String>> {
        self.output.write_all(prompt.as_bytes()).await?;
        self.output.flush().await?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    pub async fn say(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}

/// Prompts for credentials until the server answers 230.
///
/// Returns `false` if input ends first.
pub async fn login<S, R, W>(
    session: &mut Session<S>,
    console: &mut Console<R, W>,
    default_user: Option<&str>,
) -> Result<bool>
where
    S: AsyncRead + AsyncWrite + Unpin,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let hint = default_user.map(|u| format!(" ({u})")).unwrap_or_default();
    loop {
        let Some(entered) = console.prompt(&format!("Name{hint}: ")).await? else {
            return Ok(false);
        };
        let user = match (entered.trim(), default_user) {
            ("", Some(default)) => default.to_string(),
            ("", None) => continue,
            (name, _) => name.to_string(),
        };
        let Some(pass) = console.prompt("Password: ").await? else {
            return Ok(false);
        };

        match session.login(&user, &pass).await {
            Ok(reply) => {
                console.say(&reply.to_string()).await?;
                return Ok(true);
            }
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                warn!("Login as {user} failed");
                console.say(&format!("Login failed: {err}")).await?;
            }
        }
    }
}

/// Runs the `ftp>` loop until `quit` or end of input.
pub async fn run<S, R, W>(session: &mut Session<S>, console: &mut Console<R, W>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    while let Some(line) = console.prompt("ftp> ").await? {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            continue;
        };
        let args: Vec<&str> = words.collect();

        if matches!(name, "help" | "?") {
            console.say(HELP).await?;
            continue;
        }

        debug!("Running {name}");
        match session.execute(name, &args).await {
            Ok(text) if text.is_empty() => {}
            Ok(text) => console.say(&text).await?,
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => console.say(&err.to_string()).await?,
        }

        if session.is_closed() {
            return Ok(());
        }

        if name.eq_ignore_ascii_case("user") && session.last_code() == Some(ReplyCode::NEED_PASSWORD)
        {
            let Some(pass) = console.prompt("Password: ").await? else {
                break;
            };
            match session.password(&pass).await {
                Ok(reply) => console.say(&reply.to_string()).await?,
                Err(err @ Error::Auth { .. }) => console.say(&format!("Login failed: {err}")).await?,
                Err(err) if err.is_fatal() => return Err(err.into()),
                Err(err) => console.say(&err.to_string()).await?,
            }
        }
    }

    if !session.is_closed() {
        if let Some(reply) = session.quit().await? {
            console.say(&reply.to_string()).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use ferry_ftp::{Config, ControlChannel};
    use tokio_test::io::{Builder, Mock};

    use super::*;

    async fn session(mock: Mock) -> Session<Mock> {
        let config = Config::new("ftp.example.com");
        let mut control = ControlChannel::new(mock, Duration::from_secs(5));
        control.read_greeting().await.expect("greeting");
        Session::new(control, &config)
    }

    fn console(input: &str) -> Console<&[u8], Vec<u8>> {
        Console::new(input.as_bytes(), Vec::new())
    }

    fn printed(console: Console<&[u8], Vec<u8>>) -> String {
        String::from_utf8(console.into_output()).expect("utf8")
    }

    #[test]
    fn help_covers_every_command() {
        for name in ferry_ftp::session::COMMANDS {
            assert!(HELP.contains(name), "{name} missing from help");
        }
    }

    #[tokio::test]
    async fn login_retries_until_accepted() {
        let mock = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"USER bob\r\n")
            .read(b"331 Password required\r\n")
            .write(b"PASS wrong\r\n")
            .read(b"530 Login incorrect\r\n")
            .write(b"USER bob\r\n")
            .read(b"331 Password required\r\n")
            .write(b"PASS right\r\n")
            .read(b"230 Welcome\r\n")
            .build();
        let mut session = session(mock).await;
        let mut console = console("bob\nwrong\n\nright\n");

        let ok = login(&mut session, &mut console, Some("bob")).await.unwrap();
        assert!(ok);
        assert!(session.is_authenticated());
        let out = printed(console);
        assert!(out.contains("Login failed"));
        assert!(out.contains("230 Welcome"));
    }

    #[tokio::test]
    async fn login_stops_at_end_of_input() {
        let mock = Builder::new().read(b"220 ready\r\n").build();
        let mut session = session(mock).await;
        let mut console = console("alice\n");

        let ok = login(&mut session, &mut console, None).await.unwrap();
        assert!(!ok);
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn run_reports_errors_and_keeps_going() {
        let mock = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"PWD\r\n")
            .read(b"257 \"/pub\"\r\n")
            .write(b"QUIT\r\n")
            .read(b"221 Bye\r\n")
            .build();
        let mut session = session(mock).await;
        let mut console = console("bogus\n\nget\nhelp\npwd\nquit\n");

        run(&mut session, &mut console).await.unwrap();
        assert!(session.is_closed());
        let out = printed(console);
        assert!(out.contains("unknown command: bogus"));
        assert!(out.contains("get needs an argument"));
        assert!(out.contains("Commands:"));
        assert!(out.contains("257 \"/pub\""));
        assert!(out.contains("221 Bye"));
    }

    #[tokio::test]
    async fn run_prompts_for_password_after_user() {
        let mock = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"USER carol\r\n")
            .read(b"331 Password required\r\n")
            .write(b"PASS hunter2\r\n")
            .read(b"230 Logged in\r\n")
            .write(b"QUIT\r\n")
            .read(b"221 Bye\r\n")
            .build();
        let mut session = session(mock).await;
        let mut console = console("user carol\nhunter2\n");

        run(&mut session, &mut console).await.unwrap();
        assert!(session.is_closed());
        let out = printed(console);
        assert!(out.contains("331 Password required"));
        assert!(out.contains("230 Logged in"));
    }

    #[tokio::test]
    async fn run_rejects_active_mode() {
        let mock = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"QUIT\r\n")
            .read(b"221 Bye\r\n")
            .build();
        let mut session = session(mock).await;
        let mut console = console("active\npassive\n");

        run(&mut session, &mut console).await.unwrap();
        let out = printed(console);
        assert!(out.contains("Unsupported mode: active"));
        assert!(out.contains("Passive mode on"));
    }
}
