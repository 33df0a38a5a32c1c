//! PlusROM: wraps an ordinary bankswitched image and intercepts four fixed
//! addresses ($1FF0-$1FF3) with a send/receive back-channel to a host
//! embedded in the cartridge's own data. The network call never happens on
//! the emulation thread - `PlusRom` only ever queues a request and later
//! drains a response that arrived on a background tokio task, so a slow or
//! wedged host cannot stall playback.

use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use thiserror::Error;
use url::Url;

const AGENT: &str = "vcs-core";
const VERSION: &str = env!("CARGO_PKG_VERSION");
const NICK: &str = "vcs-core";

#[derive(Debug, Error)]
pub enum PlusRomError {
    #[error("cartridge is not a PlusROM image")]
    NotAPlusRom,
    #[error("PlusROM host/path record is malformed: {0}")]
    BadAddressInfo(String),
}

/// The host/path record a PlusROM image stores just past its reset vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressInfo {
    pub host: String,
    pub path: String,
}

impl AddressInfo {
    /// A PlusROM image stores this record as `path\0host\0` just past the
    /// reset vector - path first, host second.
    pub fn parse(bytes: &[u8]) -> Result<Self, PlusRomError> {
        let nul = bytes
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| PlusRomError::BadAddressInfo("missing path terminator".into()))?;
        let (path_bytes, rest) = bytes.split_at(nul);
        let host_bytes = &rest[1..];
        let host_end = host_bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(host_bytes.len());
        let path = String::from_utf8_lossy(path_bytes).into_owned();
        let host = String::from_utf8_lossy(&host_bytes[..host_end]).into_owned();
        let candidate = format!("http://{host}/{}", path.trim_start_matches('/'));
        Url::parse(&candidate)
            .map_err(|e| PlusRomError::BadAddressInfo(e.to_string()))?;
        Ok(Self { host, path })
    }

    pub fn url(&self) -> String {
        format!("http://{}/{}", self.host, self.path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reads_path_then_host() {
        let mut bytes = b"game.bin".to_vec();
        bytes.push(0);
        bytes.extend_from_slice(b"plusrom.firmaplus.de");
        bytes.push(0);

        let info = AddressInfo::parse(&bytes).unwrap();
        assert_eq!(info.path, "game.bin");
        assert_eq!(info.host, "plusrom.firmaplus.de");
        assert_eq!(info.url(), "http://plusrom.firmaplus.de/game.bin");
    }

    #[test]
    fn parse_rejects_missing_path_terminator() {
        let bytes = b"no-terminator-here".to_vec();
        assert!(AddressInfo::parse(&bytes).is_err());
    }
}

#[derive(Debug)]
struct PendingResponse {
    bytes: Vec<u8>,
}

pub struct PlusRom {
    pub address_info: AddressInfo,
    pub id: uuid::Uuid,

    send_buffer: Vec<u8>,
    receive_buffer: Vec<u8>,
    receive_read_pos: usize,

    response_rx: Option<Receiver<PendingResponse>>,
    runtime_handle: Option<tokio::runtime::Handle>,
    in_flight: Option<tokio::task::JoinHandle<()>>,
}

impl PlusRom {
    pub fn new(address_info: AddressInfo) -> Self {
        Self {
            address_info,
            id: uuid::Uuid::new_v4(),
            send_buffer: Vec::new(),
            receive_buffer: Vec::new(),
            receive_read_pos: 0,
            response_rx: None,
            runtime_handle: tokio::runtime::Handle::try_current().ok(),
            in_flight: None,
        }
    }

    /// $1FF0 write: append one byte to the pending request buffer.
    pub fn write_send(&mut self, data: u8) {
        self.send_buffer.push(data);
    }

    /// $1FF1 write: send the accumulated buffer and block the bus for this
    /// access only (the network call itself runs off-thread). Only one
    /// request is ever in flight: scheduling a new one cancels whatever
    /// the previous one was still waiting on.
    pub fn write_receive_trigger(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }

        let body = std::mem::take(&mut self.send_buffer);
        let url = self.address_info.url();
        let id = self.id;

        let (tx, rx) = channel::<PendingResponse>();
        self.response_rx = Some(rx);

        if let Some(handle) = &self.runtime_handle {
            self.in_flight = Some(handle.spawn(Self::post(url, id, body, tx)));
        }
    }

    async fn post(url: String, id: uuid::Uuid, body: Vec<u8>, tx: Sender<PendingResponse>) {
        let client = match reqwest::Client::builder().build() {
            Ok(c) => c,
            Err(e) => {
                log::error!("PlusROM client build failed: {e}");
                return;
            }
        };
        let result = client
            .post(&url)
            .header("Content-Type", "application/octet-stream")
            .header(
                "PlusROM-Info",
                format!("agent={AGENT}; ver={VERSION}; id={id}; nick={NICK}"),
            )
            .body(body)
            .send()
            .await;
        match result {
            Ok(resp) => match resp.bytes().await {
                Ok(bytes) => {
                    let _ = tx.send(PendingResponse { bytes: bytes.to_vec() });
                }
                Err(e) => log::warn!("PlusROM response body read failed: {e}"),
            },
            Err(e) => log::warn!("PlusROM request to {url} failed: {e}"),
        }
    }

    /// $1FF2 read: next byte of the last received response, or 0 if none is
    /// ready yet (request still in flight).
    pub fn read_receive(&mut self) -> u8 {
        self.drain_response();
        let b = self.receive_buffer.get(self.receive_read_pos).copied().unwrap_or(0);
        if self.receive_read_pos < self.receive_buffer.len() {
            self.receive_read_pos += 1;
        }
        b
    }

    /// $1FF3 read: number of bytes left unread in the response buffer.
    pub fn read_receive_len(&mut self) -> u8 {
        self.drain_response();
        (self.receive_buffer.len() - self.receive_read_pos).min(0xFF) as u8
    }

    fn drain_response(&mut self) {
        let Some(rx) = &self.response_rx else { return };
        match rx.try_recv() {
            Ok(resp) => {
                self.receive_buffer = resp.bytes;
                self.receive_read_pos = 0;
                self.response_rx = None;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => self.response_rx = None,
        }
    }
}
