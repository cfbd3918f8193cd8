//! Raw Ethernet connection
//!
//! Modules hand over bare EtherCAT sub-frames; this connection puts each one
//! behind an Ethernet II header (broadcast destination, EtherType 0x88A4)
//! before it goes out. Receives return whole link frames.
//!
//! The channel itself polls with a short read timeout; each `recv` keeps
//! polling until its own timeout has passed.

use kraken_core::{
    Connection, ConnectionInfo, ConnectionType, Error, Interface, MacAddr, Result,
};
use kraken_packet::EthernetFrame;
use pnet_datalink::{DataLinkReceiver, DataLinkSender};
use std::io;
use std::time::{Duration, Instant};
use tracing::{info, trace, warn};

/// Read timeout of the underlying channel
pub const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Wrap a sub-frame for transmission from `source`
pub fn encapsulate(source: MacAddr, sub_frame: &[u8]) -> Vec<u8> {
    EthernetFrame::ethercat(source, sub_frame.to_vec()).to_bytes()
}

/// Poll `rx` until a frame arrives or `timeout` has passed.
///
/// Returns `Ok(0)` on timeout. At least one poll is made, so a zero
/// timeout still picks up a frame that is already queued.
pub fn recv_within(
    rx: &mut dyn DataLinkReceiver,
    buf: &mut [u8],
    timeout: Duration,
) -> io::Result<usize> {
    let deadline = Instant::now() + timeout;
    loop {
        match rx.next() {
            Ok(frame) => {
                let n = frame.len().min(buf.len());
                buf[..n].copy_from_slice(&frame[..n]);
                return Ok(n);
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                if Instant::now() >= deadline {
                    return Ok(0);
                }
            }
            Err(e) => return Err(e),
        }
    }
}

/// Connection over a pnet datalink channel
pub struct EthernetConnection {
    interface: Interface,
    tx: Box<dyn DataLinkSender>,
    rx: Box<dyn DataLinkReceiver>,
}

impl EthernetConnection {
    /// Open a raw channel on `name`
    pub fn open(name: &str) -> Result<Self> {
        let interface = Interface::by_name(name)?;
        if !interface.is_up {
            warn!(interface = %interface.name, "Interface is down");
        }

        let (tx, rx) = interface.open_channel(POLL_INTERVAL)?;
        info!(interface = %interface, "Opened raw channel");

        Ok(Self { interface, tx, rx })
    }

    pub fn mac_address(&self) -> MacAddr {
        self.interface.mac_address
    }
}

impl Connection for EthernetConnection {
    /// pnet hands the frame to the socket without waiting, so `timeout` is not used.
    fn send(&mut self, data: &[u8], _timeout: Duration) -> Result<usize> {
        let frame = encapsulate(self.interface.mac_address, data);
        match self.tx.send_to(&frame, None) {
            Some(Ok(())) => {
                trace!(len = frame.len(), "Frame sent");
                Ok(frame.len())
            }
            Some(Err(e)) => Err(Error::transport(format!(
                "send on {} failed: {}",
                self.interface.name, e
            ))),
            None => Err(Error::transport(format!(
                "send on {}: no buffer available",
                self.interface.name
            ))),
        }
    }

    fn recv(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        recv_within(self.rx.as_mut(), buf, timeout).map_err(|e| {
            Error::transport(format!("receive on {} failed: {}", self.interface.name, e))
        })
    }

    fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            conn_type: ConnectionType::Frame,
            local_addr: self.interface.mac_address.to_string(),
            remote_addr: MacAddr::broadcast().to_string(),
            stack_layers: vec!["ethernet".to_string(), "ethercat".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kraken_packet::ethercat::{decode_header, EcatCommand, EcatDatagram};
    use kraken_packet::{split_header, EtherType};

    #[test]
    fn test_encapsulate_broadcast_ethercat() {
        let source = MacAddr::new([0x02, 0, 0, 0, 0, 0x0a]);
        let sub_frame = EcatDatagram::new(EcatCommand::Brd)
            .with_data(vec![0, 0])
            .to_bytes()
            .unwrap();

        let wire = encapsulate(source, &sub_frame);
        assert_eq!(wire.len(), EthernetFrame::MIN_FRAME_SIZE);

        let (header, payload) = split_header(&wire).unwrap();
        assert_eq!(header.destination, MacAddr::broadcast());
        assert_eq!(header.source, source);
        assert_eq!(header.ethertype, EtherType::EtherCat);
        assert_eq!(&payload[..sub_frame.len()], &sub_frame[..]);
        assert_eq!(decode_header(payload).unwrap().length, 18);
    }

    /// Plays back scripted poll results; each empty poll takes `POLL_INTERVAL`
    struct PolledReceiver {
        polls: std::collections::VecDeque<io::Result<Vec<u8>>>,
        current: Vec<u8>,
        calls: usize,
    }

    impl PolledReceiver {
        fn new(polls: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                polls: polls.into(),
                current: Vec::new(),
                calls: 0,
            }
        }
    }

    impl DataLinkReceiver for PolledReceiver {
        fn next(&mut self) -> io::Result<&[u8]> {
            self.calls += 1;
            match self.polls.pop_front() {
                Some(Ok(frame)) => {
                    self.current = frame;
                    Ok(&self.current)
                }
                Some(Err(e)) => Err(e),
                None => {
                    std::thread::sleep(POLL_INTERVAL);
                    Err(io::Error::new(io::ErrorKind::TimedOut, "idle"))
                }
            }
        }
    }

    #[test]
    fn test_recv_returns_at_its_own_timeout() {
        let mut rx = PolledReceiver::new(Vec::new());
        let mut buf = [0u8; 64];

        let started = Instant::now();
        let n = recv_within(&mut rx, &mut buf, Duration::from_millis(10)).unwrap();
        let elapsed = started.elapsed();

        assert_eq!(n, 0);
        assert!(elapsed >= Duration::from_millis(10));
        assert!(elapsed < Duration::from_millis(10) + 10 * POLL_INTERVAL, "took {:?}", elapsed);
        assert!(rx.calls > 1);
    }

    #[test]
    fn test_recv_zero_timeout_polls_once() {
        let mut rx = PolledReceiver::new(Vec::new());
        let mut buf = [0u8; 64];
        assert_eq!(recv_within(&mut rx, &mut buf, Duration::ZERO).unwrap(), 0);
        assert_eq!(rx.calls, 1);

        let mut rx = PolledReceiver::new(vec![Ok(vec![7; 20])]);
        assert_eq!(recv_within(&mut rx, &mut buf, Duration::ZERO).unwrap(), 20);
    }

    #[test]
    fn test_recv_keeps_polling_until_frame() {
        let timed_out = || -> io::Result<Vec<u8>> { Err(io::Error::new(io::ErrorKind::TimedOut, "idle")) };
        let mut rx = PolledReceiver::new(vec![timed_out(), timed_out(), Ok(vec![0xAB; 100])]);
        let mut buf = [0u8; 32];

        let n = recv_within(&mut rx, &mut buf, Duration::from_millis(50)).unwrap();
        assert_eq!(n, 32);
        assert_eq!(buf, [0xAB; 32]);
        assert_eq!(rx.calls, 3);
    }

    #[test]
    fn test_recv_passes_on_hard_errors() {
        let mut rx = PolledReceiver::new(vec![Err(io::Error::new(io::ErrorKind::Other, "link down"))]);
        let mut buf = [0u8; 8];
        assert!(recv_within(&mut rx, &mut buf, Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_encapsulate_large_sub_frame_unpadded() {
        let sub_frame = vec![0x5A; 1400];
        let wire = encapsulate(MacAddr::zero(), &sub_frame);
        assert_eq!(wire.len(), 14 + 1400);
    }
}
