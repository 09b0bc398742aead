//! Publish seam — hands finished messages to the pub/sub transport.
//!
//! The library never owns a broker connection. Callers pass a [`Publisher`];
//! [`send`] reports the outcome as a plain success flag and logs the detail.
//! [`CommandPublisher`] delegates to an external client program such as
//! `mosquitto_pub`.

use std::fmt;
use std::io;
use std::process::ExitStatus;
use std::time::Duration;

/// Default timeout for a publish command (30 seconds).
pub const PUBLISH_TIMEOUT: Duration = Duration::from_secs(30);

/// Poll interval when waiting for a publish command to exit.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub enum PublishError {
    /// No transport is available.
    NotConnected,
    /// The transport rejected or failed to deliver the message.
    Failed(String),
    /// The transport did not finish in time.
    Timeout(Duration),
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::NotConnected => write!(f, "Not connected to a broker"),
            PublishError::Failed(e) => write!(f, "Publish failed: {e}"),
            PublishError::Timeout(d) => write!(f, "Publish timed out after {d:?}"),
        }
    }
}

impl std::error::Error for PublishError {}

pub type Result<T> = std::result::Result<T, PublishError>;

/// Delivery options passed through to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishOptions {
    pub qos: u8,
    pub retain: bool,
}

/// Which channel a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Short-form preset mode string.
    Preset,
    /// Full JSON envelope.
    Envelope,
}

/// A topic/payload pair ready to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub kind: MessageKind,
    pub topic: String,
    pub payload: String,
}

pub trait Publisher {
    fn publish(&self, topic: &str, payload: &str, options: &PublishOptions) -> Result<()>;
}

/// Publish a message and report success.
pub fn send(
    publisher: &impl Publisher,
    message: &OutgoingMessage,
    options: &PublishOptions,
) -> bool {
    match publisher.publish(&message.topic, &message.payload, options) {
        Ok(()) => {
            log::info!("published to {}: {}", message.topic, message.payload);
            true
        }
        Err(e) => {
            log::warn!("cannot publish to {}: {e}", message.topic);
            false
        }
    }
}

// ── External command publisher ──

/// Publishes by running an external program once per message.
///
/// The template is split into arguments on whitespace; single or double
/// quotes group words. Inside each argument, `{topic}`, `{payload}`,
/// `{qos}`, `{retain}`, `{host}`, `{port}`, `{username}` and `{password}`
/// are substituted; broker and credential placeholders are empty until set
/// with [`with_broker`](Self::with_broker) and
/// [`with_credentials`](Self::with_credentials). No shell is involved, so
/// the JSON payload needs no escaping.
#[derive(Debug, Clone)]
pub struct CommandPublisher {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    host: String,
    port: String,
    username: String,
    password: String,
}

impl CommandPublisher {
    pub fn from_template(template: &str) -> Result<Self> {
        let mut words = split_args(template)?.into_iter();
        let program = words
            .next()
            .ok_or_else(|| PublishError::Failed("publish command is empty".into()))?;
        Ok(Self {
            program,
            args: words.collect(),
            timeout: PUBLISH_TIMEOUT,
            host: String::new(),
            port: String::new(),
            username: String::new(),
            password: String::new(),
        })
    }

    pub fn with_broker(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port.to_string();
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Program and arguments for one message, placeholders substituted.
    pub fn render(&self, topic: &str, payload: &str, options: &PublishOptions) -> Vec<String> {
        let qos = options.qos.to_string();
        let retain = options.retain.to_string();
        let values = [
            ("{topic}", topic),
            ("{payload}", payload),
            ("{qos}", qos.as_str()),
            ("{retain}", retain.as_str()),
            ("{host}", self.host.as_str()),
            ("{port}", self.port.as_str()),
            ("{username}", self.username.as_str()),
            ("{password}", self.password.as_str()),
        ];
        std::iter::once(self.program.clone())
            .chain(self.args.iter().map(|a| substitute(a, &values)))
            .collect()
    }
}

impl Publisher for CommandPublisher {
    fn publish(&self, topic: &str, payload: &str, options: &PublishOptions) -> Result<()> {
        let argv = self.render(topic, payload, options);
        let status = run_with_timeout(&argv, self.timeout).map_err(|e| {
            PublishError::Failed(format!("cannot run {}: {e}", self.program))
        })?;
        match status {
            Some(s) if s.success() => Ok(()),
            Some(s) => Err(PublishError::Failed(format!("{} exited with {s}", self.program))),
            None => Err(PublishError::Timeout(self.timeout)),
        }
    }
}

/// Single-pass placeholder substitution so substituted text is never rescanned.
fn substitute(arg: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(arg.len());
    let mut rest = arg;
    'scan: while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        for (key, value) in values {
            if let Some(after) = tail.strip_prefix(*key) {
                out.push_str(value);
                rest = after;
                continue 'scan;
            }
        }
        out.push('{');
        rest = &tail[1..];
    }
    out.push_str(rest);
    out
}

fn split_args(template: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for ch in template.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_word = true;
            }
            None if ch.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(ch);
                in_word = true;
            }
        }
    }
    if let Some(q) = quote {
        return Err(PublishError::Failed(format!(
            "unterminated {q} quote in publish command"
        )));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Run a program with a timeout. Returns `None` if it had to be killed.
fn run_with_timeout(argv: &[String], timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let Some((program, args)) = argv.split_first() else {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty command"));
    };
    let mut child = std::process::Command::new(program).args(args).spawn()?;

    let max_polls = (timeout.as_millis() / POLL_INTERVAL.as_millis()).max(1) as u64;
    for _ in 0..max_polls {
        match child.try_wait()? {
            Some(status) => return Ok(Some(status)),
            None => std::thread::sleep(POLL_INTERVAL),
        }
    }

    log::warn!("publish command timed out after {timeout:?}, killing: {program}");
    let _ = child.kill();
    child.wait()?;
    Ok(None)
}

/// In-memory publisher for tests.
pub mod mock {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    pub struct MockPublisher {
        /// Recorded publishes: (topic, payload, options).
        pub published: RefCell<Vec<(String, String, PublishOptions)>>,
        /// If true, `publish` returns `NotConnected`.
        pub disconnected: Cell<bool>,
    }

    impl MockPublisher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn disconnected() -> Self {
            let p = Self::default();
            p.disconnected.set(true);
            p
        }
    }

    impl Publisher for MockPublisher {
        fn publish(&self, topic: &str, payload: &str, options: &PublishOptions) -> Result<()> {
            if self.disconnected.get() {
                return Err(PublishError::NotConnected);
            }
            self.published
                .borrow_mut()
                .push((topic.to_string(), payload.to_string(), *options));
            Ok(())
        }
    }
}
