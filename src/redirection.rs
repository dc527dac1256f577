//! Redirection modes and their mapping to open(2) flags.

use crate::tokenizer::TokenType;
use crate::wchar::prelude::*;
use nix::fcntl::OFlag;
use std::os::fd::RawFd;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RedirectionMode {
    Overwrite, // normal redirection: > file.txt
    Append,    // appending redirection: >> file.txt
    Input,     // input redirection: < file.txt
    Fd,        // fd redirection: 2>&1
    Noclob,    // noclobber redirection: >? file.txt
}

impl RedirectionMode {
    /// The open flags for this redirection mode, or None if the mode does not
    /// open a file (fd duplication).
    pub fn oflags(self) -> Option<OFlag> {
        match self {
            RedirectionMode::Append => Some(OFlag::O_CREAT | OFlag::O_APPEND | OFlag::O_WRONLY),
            RedirectionMode::Overwrite => Some(OFlag::O_CREAT | OFlag::O_WRONLY | OFlag::O_TRUNC),
            RedirectionMode::Noclob => Some(OFlag::O_CREAT | OFlag::O_EXCL | OFlag::O_WRONLY),
            RedirectionMode::Input => Some(OFlag::O_RDONLY),
            RedirectionMode::Fd => None,
        }
    }
}

impl TryFrom<TokenType> for RedirectionMode {
    type Error = ();

    /// Map a redirection token type to its mode. Pipes and non-redirection
    /// token types do not map.
    fn try_from(typ: TokenType) -> Result<RedirectionMode, ()> {
        match typ {
            TokenType::RedirectOut => Ok(RedirectionMode::Overwrite),
            TokenType::RedirectAppend => Ok(RedirectionMode::Append),
            TokenType::RedirectIn => Ok(RedirectionMode::Input),
            TokenType::RedirectFd => Ok(RedirectionMode::Fd),
            TokenType::RedirectNoclob => Ok(RedirectionMode::Noclob),
            _ => Err(()),
        }
    }
}

/// A struct which represents a redirection specification from the user.
/// Here the file descriptors don't represent open files - it's purely textual.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RedirectionSpec {
    /// The redirected fd. For example, in the case of "3>&1" this will be 3.
    pub fd: RawFd,

    /// The redirection mode.
    pub mode: RedirectionMode,

    /// The target of the redirection.
    /// For example in "3>&1", this will be "1".
    /// In "< file.txt" this will be "file.txt".
    pub target: WString,
}

impl RedirectionSpec {
    pub fn new(fd: RawFd, mode: RedirectionMode, target: WString) -> Self {
        Self { fd, mode, target }
    }

    /// Attempt to parse the target as an fd, for fd-duplication redirections.
    pub fn get_target_as_fd(&self) -> Option<RawFd> {
        if self.target.is_empty() {
            return None;
        }
        let mut fd: i64 = 0;
        for c in self.target.as_char_slice() {
            let digit = c.to_digit(10)?;
            fd = fd * 10 + i64::from(digit);
            if fd > RawFd::MAX as i64 {
                return None;
            }
        }
        Some(fd as RawFd)
    }

    /// Return the open flags for this redirection.
    pub fn oflags(&self) -> Option<OFlag> {
        self.mode.oflags()
    }
}

pub type RedirectionSpecList = Vec<RedirectionSpec>;
