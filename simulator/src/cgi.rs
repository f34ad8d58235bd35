//! One request per process: the request is read from stdin and the raw HTTP
//! response is written to stdout, as a CGI host expects.

use crate::chunked::{send_empty, ChunkedResponder, MANIFEST_CONTENT_TYPE, MEDIA_CONTENT_TYPE};
use crate::error::SimulatorError;
use crate::router::{route_request_line, RequestLine};
use crate::simulator::{Reply, Simulator};
use hyper::StatusCode;
use std::io::{BufRead, Read, Write};
use tracing::{debug, info, warn};

/// Longest request or header line accepted; longer lines are truncated.
const MAX_LINE: usize = 2048;

/// Reads the request line and discards headers up to the blank line. `None` when
/// no request line could be read.
pub fn read_request<R: BufRead>(input: &mut R) -> Option<RequestLine> {
    let line = read_line(input)?;
    let request = RequestLine::parse(&line);

    while let Some(header) = read_line(input) {
        if header.is_empty() {
            break;
        }
    }

    request
}

fn read_line<R: BufRead>(input: &mut R) -> Option<String> {
    let mut buf = Vec::new();
    match input.by_ref().take(MAX_LINE as u64).read_until(b'\n', &mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => {
            while matches!(buf.last(), Some(b'\n' | b'\r')) {
                buf.pop();
            }
            Some(String::from_utf8_lossy(&buf).into_owned())
        }
    }
}

/// Serves a single request. Returns `UnsupportedMethod` without writing anything
/// for non-GET requests; the caller turns that into a non-zero exit status.
pub fn serve<R: BufRead, W: Write>(
    simulator: &Simulator,
    input: &mut R,
    output: W,
) -> Result<(), SimulatorError> {
    let request = read_request(input);
    debug!("request: {:?}", request);
    let route = route_request_line(request.as_ref())?;
    respond(simulator, simulator.reply(route), output)
}

fn respond<W: Write>(
    simulator: &Simulator,
    reply: Reply,
    mut output: W,
) -> Result<(), SimulatorError> {
    match reply {
        Reply::Manifest(mpd) => {
            let mut responder = ChunkedResponder::start(output, MANIFEST_CONTENT_TYPE)?;
            responder.send_chunk(&mpd)?;
            responder.finish()?;
        }
        Reply::Init(init) => {
            let mut responder = ChunkedResponder::start(output, MEDIA_CONTENT_TYPE)?;
            responder.send_chunk(&init)?;
            responder.finish()?;
        }
        Reply::Segment {
            segment,
            delay,
            fragments,
        } => {
            simulator.gate().wait_blocking(delay);
            info!("HTTP-GET segment number: {}", segment);

            let mut responder = ChunkedResponder::start(output, MEDIA_CONTENT_TYPE)?;
            for fragment in fragments {
                responder.send_chunk(&fragment)?;
            }
            let sent = responder.finish()?;
            info!("sent {} fragments", sent);
        }
        Reply::TooEarly { segment, delay } => {
            warn!(
                "segment {} is {}ms in the future, rejecting",
                segment,
                delay.as_millis()
            );
            send_empty(&mut output, StatusCode::SERVICE_UNAVAILABLE)?;
        }
        Reply::NotFound => send_empty(&mut output, StatusCode::NOT_FOUND)?,
    }

    Ok(())
}
