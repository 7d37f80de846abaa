//! SMTP command/reply protocol binding.
//!
//! One command per line, one three-digit reply per line, and a
//! server-first greeting on accept. Commands are matched
//! case-insensitively; unrecognized verbs are preserved verbatim so
//! match rules can still route them.

mod protocol;

pub use protocol::Smtp;

use std::fmt;

/// An SMTP command verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Helo,
    Ehlo,
    Mail,
    Rcpt,
    Data,
    Rset,
    Noop,
    Quit,
    Vrfy,
    /// A verb this crate does not know; kept verbatim.
    Other(String),
}

impl Command {
    /// Parses a verb, case-insensitively.
    pub fn parse(verb: &str) -> Self {
        match verb.to_ascii_uppercase().as_str() {
            "HELO" => Command::Helo,
            "EHLO" => Command::Ehlo,
            "MAIL" => Command::Mail,
            "RCPT" => Command::Rcpt,
            "DATA" => Command::Data,
            "RSET" => Command::Rset,
            "NOOP" => Command::Noop,
            "QUIT" => Command::Quit,
            "VRFY" => Command::Vrfy,
            _ => Command::Other(verb.to_string()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Command::Helo => "HELO",
            Command::Ehlo => "EHLO",
            Command::Mail => "MAIL",
            Command::Rcpt => "RCPT",
            Command::Data => "DATA",
            Command::Rset => "RSET",
            Command::Noop => "NOOP",
            Command::Quit => "QUIT",
            Command::Vrfy => "VRFY",
            Command::Other(verb) => verb,
        };
        f.write_str(verb)
    }
}

/// An SMTP reply status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    ServiceReady,
    ServiceClosing,
    Ok,
    StartMailInput,
    SyntaxError,
    CommandNotImplemented,
    BadSequence,
    Other(u16),
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::ServiceReady => 220,
            Status::ServiceClosing => 221,
            Status::Ok => 250,
            Status::StartMailInput => 354,
            Status::SyntaxError => 500,
            Status::CommandNotImplemented => 502,
            Status::BadSequence => 503,
            Status::Other(code) => code,
        }
    }

    pub fn from_code(code: u16) -> Self {
        match code {
            220 => Status::ServiceReady,
            221 => Status::ServiceClosing,
            250 => Status::Ok,
            354 => Status::StartMailInput,
            500 => Status::SyntaxError,
            502 => Status::CommandNotImplemented,
            503 => Status::BadSequence,
            other => Status::Other(other),
        }
    }

    /// Default reply text for this status.
    pub fn message(self) -> &'static str {
        match self {
            Status::ServiceReady => "Service ready",
            Status::ServiceClosing => "Service closing transmission channel",
            Status::Ok => "OK",
            Status::StartMailInput => "Start mail input; end with <CRLF>.<CRLF>",
            Status::SyntaxError => "Syntax error, command unrecognized",
            Status::CommandNotImplemented => "Command not implemented",
            Status::BadSequence => "Bad sequence of commands",
            Status::Other(_) => "",
        }
    }
}

/// One SMTP command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub command: Command,
    /// Everything after the verb, trimmed; empty when absent.
    pub argument: String,
}

impl Request {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            argument: String::new(),
        }
    }

    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.argument = argument.into();
        self
    }
}

/// One SMTP reply line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub message: String,
}

impl Response {
    /// A reply with the status's default text.
    pub fn new(status: Status) -> Self {
        Self {
            status,
            message: status.message().to_string(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}
