/// Forwarding node: event-driven on link input. Reads one
/// newline-terminated frame at a time, validates and decodes it, and
/// republishes it to the collector as JSON.
pub mod uplink;

use log::{info, warn};
use tokio::io::{AsyncBufRead, AsyncRead, BufReader};

use crate::config::MonitorConfig;
use crate::protocol::{decode_frame, uplink_payload, MAX_FRAME_LEN};
use uplink::{NoReconnect, ReconnectHook, Uplink};

enum LinkRead {
    Line(String),
    Dropped(&'static str),
    Eof,
}

/// Read one newline-terminated line with a hard length cap, so a
/// malformed or truncated frame cannot grow the buffer without bound.
/// An over-length line is consumed through its terminator and reported
/// as dropped; reading then resumes at the next line.
async fn read_bounded_line<R: AsyncBufRead + Unpin>(
    reader: &mut R,
) -> std::io::Result<LinkRead> {
    use tokio::io::AsyncBufReadExt;

    let mut buf: Vec<u8> = Vec::new();
    let mut overflowed = false;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            // EOF. A leftover partial line is a truncated frame.
            return Ok(if buf.is_empty() && !overflowed {
                LinkRead::Eof
            } else {
                LinkRead::Dropped("truncated frame at end of stream")
            });
        }

        match available.iter().position(|&b| b == b'\n') {
            Some(newline) => {
                if !overflowed && buf.len() + newline <= MAX_FRAME_LEN {
                    buf.extend_from_slice(&available[..newline]);
                } else {
                    overflowed = true;
                }
                reader.consume(newline + 1);
                return Ok(if overflowed {
                    LinkRead::Dropped("frame exceeds maximum length")
                } else {
                    match String::from_utf8(buf) {
                        Ok(line) => LinkRead::Line(line),
                        Err(_) => LinkRead::Dropped("frame is not valid UTF-8"),
                    }
                });
            }
            None => {
                let len = available.len();
                if !overflowed && buf.len() + len <= MAX_FRAME_LEN {
                    buf.extend_from_slice(available);
                } else {
                    overflowed = true;
                    buf.clear();
                }
                reader.consume(len);
            }
        }
    }
}

pub struct ForwardingNode<H: ReconnectHook> {
    config: MonitorConfig,
    uplink: Uplink<H>,
}

impl ForwardingNode<NoReconnect> {
    pub fn new(config: MonitorConfig) -> Result<Self, reqwest::Error> {
        let uplink = Uplink::new(&config)?;
        Ok(ForwardingNode { config, uplink })
    }
}

impl<H: ReconnectHook> ForwardingNode<H> {
    pub fn with_uplink(config: MonitorConfig, uplink: Uplink<H>) -> Self {
        ForwardingNode { config, uplink }
    }

    /// Decode one raw line and, if it validates, deliver it. Malformed
    /// input is dropped whole; a shifted field would silently corrupt
    /// every downstream value, so nothing partially parsed is forwarded.
    pub async fn handle_line(&mut self, line: &str) {
        match decode_frame(line, &self.config.frame_type_tag) {
            Ok(frame) => {
                let payload = uplink_payload(&frame);
                // Fire-and-forget: the outcome is observed for logging
                // only, inside deliver.
                let _ = self.uplink.deliver(&payload).await;
            }
            Err(e) => {
                warn!("Dropping malformed frame: {}", e);
            }
        }
    }

    /// Event loop over link input, until the link closes.
    pub async fn run<L>(mut self, link: L) -> Result<(), Box<dyn std::error::Error>>
    where
        L: AsyncRead + Unpin,
    {
        info!("Forwarding node started, waiting for frames");
        let mut reader = BufReader::new(link);
        loop {
            match read_bounded_line(&mut reader).await? {
                LinkRead::Line(line) => self.handle_line(&line).await,
                LinkRead::Dropped(reason) => warn!("Dropping link input: {}", reason),
                LinkRead::Eof => {
                    info!("Link closed, forwarding node stopping");
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn lines_from(input: &[u8]) -> Vec<String> {
        let mut reader = BufReader::new(input);
        let mut lines = Vec::new();
        loop {
            match read_bounded_line(&mut reader).await.unwrap() {
                LinkRead::Line(line) => lines.push(line),
                LinkRead::Dropped(_) => lines.push("<dropped>".to_string()),
                LinkRead::Eof => return lines,
            }
        }
    }

    #[tokio::test]
    async fn bounded_reader_splits_lines() {
        let lines = lines_from(b"first\nsecond\n").await;
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn oversize_line_is_dropped_and_reading_resumes() {
        let mut input = vec![b'x'; MAX_FRAME_LEN + 10];
        input.push(b'\n');
        input.extend_from_slice(b"after\n");
        let lines = lines_from(&input).await;
        assert_eq!(lines, vec!["<dropped>", "after"]);
    }

    #[tokio::test]
    async fn truncated_trailing_frame_is_dropped() {
        let lines = lines_from(b"complete\npartial-without-newline").await;
        assert_eq!(lines, vec!["complete", "<dropped>"]);
    }

    #[tokio::test]
    async fn forwards_only_valid_frames() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send-data"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let config = MonitorConfig::with_collector(&server.uri());
        let node = ForwardingNode::new(config).unwrap();

        let (mut tx, rx) = tokio::io::duplex(1024);
        let writer = tokio::spawn(async move {
            // Wrong tag, short frame, then one valid frame.
            tx.write_all(b"PLC_TEXT&1&2&3&4&5&6&7&8&OFF&OFF&OFF&NORMAL&RSV\n")
                .await
                .unwrap();
            tx.write_all(b"ADU_TEXT&10&200\n").await.unwrap();
            tx.write_all(b"ADU_TEXT&10&200&1500&25&60&77&26&79&OFF&ON&OFF&ALERT&RSV\n")
                .await
                .unwrap();
        });

        node.run(rx).await.unwrap();
        writer.await.unwrap();
        // The mock's expect(1) verifies exactly one POST on drop.
    }
}
