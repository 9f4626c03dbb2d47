//! Line protocol shared by the command server and the TCP dispatcher.
//!
//! A request is a single line holding the command name. A reply is a single
//! line starting with a tag:
//!
//! ```text
//! OK <payload>         command succeeded, payload is JSON (may be empty)
//! UNKNOWN <command>    command is not available on this endpoint
//! ERR <message>        command is available but failed
//! ```
//!
//! Both sides read with a byte limit; a request over [`MAX_COMMAND_LEN`] is
//! answered with `ERR` and the session closed.

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Readiness command for targets on the local host.
pub const LOCAL_LIST: &str = "local-list";
/// Readiness command for targets on a remote host.
pub const REMOTE_LIST: &str = "remote-list";
/// Outstanding captured contexts of recording pools.
pub const LEAK_REPORT: &str = "leak-report";

/// Longest request line the command server accepts, newline excluded.
pub const MAX_COMMAND_LEN: usize = 1024;
/// Longest reply line a dispatcher accepts by default, newline excluded.
pub const MAX_REPLY_LEN: usize = 8 * 1024 * 1024;

/// One line read under a byte limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRead {
    /// A line without its terminator. A final unterminated line counts.
    Line(String),
    Eof,
    /// More than `limit` bytes arrived without a newline.
    TooLong,
}

/// Read one `\n`-terminated line, never buffering more than `limit + 1` bytes.
pub async fn read_line_bounded<R>(reader: &mut R, limit: usize) -> std::io::Result<LineRead>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let n = (&mut *reader)
        .take(limit as u64 + 1)
        .read_until(b'\n', &mut buf)
        .await?;
    if n == 0 {
        return Ok(LineRead::Eof);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if buf.len() > limit {
        return Ok(LineRead::TooLong);
    }
    Ok(LineRead::Line(String::from_utf8_lossy(&buf).into_owned()))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed reply: {0:?}")]
pub struct MalformedReply(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ok(String),
    Unknown(String),
    Err(String),
}

impl Reply {
    /// Encode as one newline-terminated line.
    pub fn encode(&self) -> String {
        let (tag, body) = match self {
            Reply::Ok(payload) => ("OK", payload),
            Reply::Unknown(command) => ("UNKNOWN", command),
            Reply::Err(message) => ("ERR", message),
        };
        let body = body.replace(['\r', '\n'], " ");
        if body.is_empty() {
            format!("{tag}\n")
        } else {
            format!("{tag} {body}\n")
        }
    }

    pub fn parse(line: &str) -> Result<Self, MalformedReply> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (tag, body) = line.split_once(' ').unwrap_or((line, ""));
        let body = body.to_string();
        match tag {
            "OK" => Ok(Reply::Ok(body)),
            "UNKNOWN" => Ok(Reply::Unknown(body)),
            "ERR" => Ok(Reply::Err(body)),
            _ => Err(MalformedReply(line.to_string())),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_reply_keeps_json_payload() {
        let reply = Reply::Ok(r#"[{"name":"db"}]"#.into());
        let line = reply.encode();
        assert_eq!(line, "OK [{\"name\":\"db\"}]\n");
        assert_eq!(Reply::parse(&line).unwrap(), reply);
    }

    #[test]
    fn bare_tags_parse() {
        assert_eq!(Reply::parse("OK").unwrap(), Reply::Ok(String::new()));
        assert_eq!(Reply::Ok(String::new()).encode(), "OK\n");
    }

    #[test]
    fn multiline_messages_are_flattened() {
        let line = Reply::Err("first\nsecond".into()).encode();
        assert_eq!(line.matches('\n').count(), 1);
        assert_eq!(Reply::parse(&line).unwrap(), Reply::Err("first second".into()));
    }

    #[tokio::test]
    async fn bounded_read_splits_lines() {
        let mut input: &[u8] = b"local-list\r\nleak-report\nlast";
        assert_eq!(
            read_line_bounded(&mut input, 16).await.unwrap(),
            LineRead::Line("local-list".into())
        );
        assert_eq!(
            read_line_bounded(&mut input, 16).await.unwrap(),
            LineRead::Line("leak-report".into())
        );
        assert_eq!(read_line_bounded(&mut input, 16).await.unwrap(), LineRead::Line("last".into()));
        assert_eq!(read_line_bounded(&mut input, 16).await.unwrap(), LineRead::Eof);
    }

    #[tokio::test]
    async fn bounded_read_stops_at_limit() {
        let mut exact: &[u8] = b"abcd\n";
        assert_eq!(read_line_bounded(&mut exact, 4).await.unwrap(), LineRead::Line("abcd".into()));

        let long = vec![b'a'; 64];
        let mut input: &[u8] = &long;
        assert_eq!(read_line_bounded(&mut input, 8).await.unwrap(), LineRead::TooLong);
        // Only limit + 1 bytes were consumed.
        assert_eq!(input.len(), 64 - 9);
    }

    #[test]
    fn unknown_tag_is_malformed() {
        let err = Reply::parse("HTTP/1.1 400 Bad Request\r\n").unwrap_err();
        assert_eq!(err.0, "HTTP/1.1 400 Bad Request");
    }
}
