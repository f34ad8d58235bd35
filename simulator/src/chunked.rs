use crate::error::SimulatorError;
use hyper::StatusCode;
use std::io::Write;

pub const COMMON_HEADERS: [(&str, &str); 1] = [("Access-Control-Allow-Origin", "*")];
pub const MANIFEST_CONTENT_TYPE: &str = "application/dash+xml";
pub const MEDIA_CONTENT_TYPE: &str = "video/mp4";

/// Writes a raw HTTP/1.1 response using chunked transfer coding. Every chunk is
/// flushed as soon as it is written so a player sees fragments as they are made.
pub struct ChunkedResponder<W: Write> {
    out: W,
    chunks: usize,
}

impl<W: Write> ChunkedResponder<W> {
    /// Writes the status line and headers of a chunked `200 OK` response.
    pub fn start(mut out: W, content_type: &str) -> Result<Self, SimulatorError> {
        write_status_line(&mut out, StatusCode::OK)?;
        for (name, value) in COMMON_HEADERS {
            write_line(&mut out, &format!("{}: {}", name, value))?;
        }
        write_line(&mut out, &format!("Content-Type: {}", content_type))?;
        write_line(&mut out, "Transfer-Encoding: chunked")?;
        write_line(&mut out, "")?;
        flush(&mut out)?;

        Ok(Self { out, chunks: 0 })
    }

    /// Sends one non-empty payload as a chunk: hex length, CRLF, bytes, CRLF.
    pub fn send_chunk(&mut self, payload: &[u8]) -> Result<(), SimulatorError> {
        if payload.is_empty() {
            // an empty chunk would terminate the body
            return Ok(());
        }

        write_line(&mut self.out, &format!("{:X}", payload.len()))?;
        self.out.write_all(payload).map_err(output_error)?;
        write_line(&mut self.out, "")?;
        flush(&mut self.out)?;
        self.chunks += 1;
        Ok(())
    }

    /// Writes the terminating zero-length chunk and returns the number of data
    /// chunks sent.
    pub fn finish(mut self) -> Result<usize, SimulatorError> {
        write_line(&mut self.out, "0")?;
        write_line(&mut self.out, "")?;
        flush(&mut self.out)?;
        Ok(self.chunks)
    }
}

/// Writes a bodiless response, e.g. `404 Not Found`.
pub fn send_empty<W: Write>(out: &mut W, status: StatusCode) -> Result<(), SimulatorError> {
    write_status_line(out, status)?;
    for (name, value) in COMMON_HEADERS {
        write_line(out, &format!("{}: {}", name, value))?;
    }
    write_line(out, "Content-Length: 0")?;
    write_line(out, "")?;
    flush(out)
}

fn write_status_line<W: Write>(out: &mut W, status: StatusCode) -> Result<(), SimulatorError> {
    let line = format!(
        "HTTP/1.1 {} {}",
        status.as_str(),
        status.canonical_reason().unwrap_or("")
    );
    write_line(out, line.trim_end())
}

fn write_line<W: Write>(out: &mut W, line: &str) -> Result<(), SimulatorError> {
    out.write_all(line.as_bytes())
        .and_then(|_| out.write_all(b"\r\n"))
        .map_err(output_error)
}

fn flush<W: Write>(out: &mut W) -> Result<(), SimulatorError> {
    out.flush().map_err(output_error)
}

fn output_error(e: std::io::Error) -> SimulatorError {
    SimulatorError::OutputError(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_chunks() {
        let mut out = Vec::new();
        let mut responder = ChunkedResponder::start(&mut out, MEDIA_CONTENT_TYPE).unwrap();
        responder.send_chunk(&[0xaa; 26]).unwrap();
        responder.send_chunk(b"xyz").unwrap();
        assert_eq!(responder.finish().unwrap(), 2);

        let mut expected = b"HTTP/1.1 200 OK\r\n\
Access-Control-Allow-Origin: *\r\n\
Content-Type: video/mp4\r\n\
Transfer-Encoding: chunked\r\n\
\r\n\
1A\r\n"
            .to_vec();
        expected.extend_from_slice(&[0xaa; 26]);
        expected.extend_from_slice(b"\r\n3\r\nxyz\r\n0\r\n\r\n");
        assert_eq!(out, expected);
    }

    #[test]
    fn empty_payload_is_skipped() {
        let mut out = Vec::new();
        let mut responder = ChunkedResponder::start(&mut out, MANIFEST_CONTENT_TYPE).unwrap();
        responder.send_chunk(&[]).unwrap();
        assert_eq!(responder.finish().unwrap(), 0);
        assert!(out.ends_with(b"\r\n\r\n0\r\n\r\n"));
    }

    #[test]
    fn empty_responses_have_no_body() {
        let mut out = Vec::new();
        send_empty(&mut out, StatusCode::NOT_FOUND).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.ends_with("Content-Length: 0\r\n\r\n"));
    }

    #[test]
    fn write_errors_are_reported() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let err = ChunkedResponder::start(Broken, MEDIA_CONTENT_TYPE).err().unwrap();
        assert!(matches!(err, SimulatorError::OutputError(_)));
    }
}
