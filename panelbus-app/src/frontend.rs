//! Line-oriented command front end
//!
//! Each input line is one message: an address followed by whitespace
//! separated arguments.
//!
//! | Message | Effect |
//! |---|---|
//! | `/target <n>` | latch target `n` (used in stateful mode) |
//! | `/targetMode single\|each\|stateful` | switch addressing mode |
//! | `/clear` | clear the frame and flush it |
//! | `/pixel <x> <y>` | set one pixel and flush |
//! | `/invert on\|off` | invert the panel |
//! | `/contrast <0-255>` | set contrast |
//! | `/power on\|off` | leave or enter power save |
//! | `/flush` | resend the frame |
//!
//! In `each` mode every drawing message starts with the target index,
//! e.g. `/pixel 1 10 20`.

use std::fmt;

use panelbus_core::TargetMode;

/// Drawing operation on one panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOp {
    Clear,
    Pixel { x: usize, y: usize },
    Invert(bool),
    Contrast(u8),
    Power(bool),
    Flush,
}

/// One parsed message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Latch the active target
    Target(usize),
    /// Change the addressing mode
    TargetMode(TargetMode),
    /// Draw on the resolved target
    Draw {
        /// Leading target field, present only in `each` mode
        target: Option<usize>,
        op: DrawOp,
    },
}

/// Front end parse errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Address not recognised
    UnknownAddress(String),
    /// Fewer arguments than the message needs
    MissingArgument(&'static str),
    /// Argument could not be parsed
    InvalidArgument(String),
    /// More arguments than the message takes
    TrailingArgument(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnknownAddress(a) => write!(f, "unknown message {a}"),
            ParseError::MissingArgument(name) => write!(f, "missing argument <{name}>"),
            ParseError::InvalidArgument(a) => write!(f, "invalid argument {a:?}"),
            ParseError::TrailingArgument(a) => write!(f, "unexpected argument {a:?}"),
        }
    }
}

impl std::error::Error for ParseError {}

struct Args<'a> {
    tokens: std::str::SplitWhitespace<'a>,
}

impl<'a> Args<'a> {
    fn next(&mut self, name: &'static str) -> Result<&'a str, ParseError> {
        self.tokens.next().ok_or(ParseError::MissingArgument(name))
    }

    fn number<T: std::str::FromStr>(&mut self, name: &'static str) -> Result<T, ParseError> {
        let token = self.next(name)?;
        token
            .parse()
            .map_err(|_| ParseError::InvalidArgument(token.to_string()))
    }

    fn switch(&mut self, name: &'static str) -> Result<bool, ParseError> {
        match self.next(name)? {
            "on" | "1" | "true" => Ok(true),
            "off" | "0" | "false" => Ok(false),
            other => Err(ParseError::InvalidArgument(other.to_string())),
        }
    }

    fn finish(mut self) -> Result<(), ParseError> {
        match self.tokens.next() {
            Some(extra) => Err(ParseError::TrailingArgument(extra.to_string())),
            None => Ok(()),
        }
    }
}

fn parse_mode(token: &str) -> Result<TargetMode, ParseError> {
    match token {
        "single" => Ok(TargetMode::Single),
        "each" | "per-message" => Ok(TargetMode::PerMessage),
        "stateful" => Ok(TargetMode::Stateful),
        other => Err(ParseError::InvalidArgument(other.to_string())),
    }
}

/// Parse one input line
///
/// `mode` decides whether drawing messages carry a leading target index.
/// Blank lines and `#` comments yield `Ok(None)`.
pub fn parse(line: &str, mode: TargetMode) -> Result<Option<Request>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut tokens = line.split_whitespace();
    let address = tokens.next().unwrap_or_default();
    let mut args = Args { tokens };

    let request = match address {
        "/target" => Request::Target(args.number("index")?),
        "/targetMode" => Request::TargetMode(parse_mode(args.next("mode")?)?),
        "/clear" | "/pixel" | "/invert" | "/contrast" | "/power" | "/flush" => {
            let target = match mode {
                TargetMode::PerMessage => Some(args.number("target")?),
                _ => None,
            };
            let op = match address {
                "/clear" => DrawOp::Clear,
                "/pixel" => DrawOp::Pixel {
                    x: args.number("x")?,
                    y: args.number("y")?,
                },
                "/invert" => DrawOp::Invert(args.switch("on|off")?),
                "/contrast" => DrawOp::Contrast(args.number("contrast")?),
                "/power" => DrawOp::Power(args.switch("on|off")?),
                _ => DrawOp::Flush,
            };
            Request::Draw { target, op }
        }
        other => return Err(ParseError::UnknownAddress(other.to_string())),
    };

    args.finish()?;
    Ok(Some(request))
}
