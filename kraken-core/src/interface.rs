//! Network interface lookup and raw channel setup

use crate::{Error, MacAddr, Result};
use pnet_datalink::{self, Channel, DataLinkReceiver, DataLinkSender, NetworkInterface};
use std::fmt;
use std::time::Duration;

/// Network interface
#[derive(Debug, Clone)]
pub struct Interface {
    /// Interface name (e.g., "eth0", "en0")
    pub name: String,
    /// Interface index
    pub index: u32,
    /// MAC address
    pub mac_address: MacAddr,
    /// Is interface up?
    pub is_up: bool,
}

impl Interface {
    fn from_pnet(iface: &NetworkInterface) -> Self {
        let mac_bytes = match iface.mac {
            Some(mac) => [mac.0, mac.1, mac.2, mac.3, mac.4, mac.5],
            None => [0, 0, 0, 0, 0, 0],
        };

        Self {
            name: iface.name.clone(),
            index: iface.index,
            mac_address: MacAddr(mac_bytes),
            is_up: iface.is_up(),
        }
    }

    fn find_pnet(name: &str) -> Result<NetworkInterface> {
        pnet_datalink::interfaces()
            .into_iter()
            .find(|i| i.name == name)
            .ok_or_else(|| Error::InterfaceNotFound(name.to_string()))
    }

    /// Get interface by name
    pub fn by_name(name: &str) -> Result<Self> {
        Self::find_pnet(name).map(|iface| Self::from_pnet(&iface))
    }

    /// List all available interfaces
    pub fn list_all() -> Vec<Self> {
        pnet_datalink::interfaces()
            .iter()
            .map(Self::from_pnet)
            .collect()
    }

    /// Open a raw Ethernet channel on this interface
    ///
    /// `read_timeout` bounds every receive on the returned receiver.
    pub fn open_channel(
        &self,
        read_timeout: Duration,
    ) -> Result<(Box<dyn DataLinkSender>, Box<dyn DataLinkReceiver>)> {
        let interface = Self::find_pnet(&self.name)?;
        let config = pnet_datalink::Config {
            read_timeout: Some(read_timeout),
            ..Default::default()
        };

        match pnet_datalink::channel(&interface, config) {
            Ok(Channel::Ethernet(tx, rx)) => Ok((tx, rx)),
            Ok(_) => Err(Error::Interface("Unsupported channel type".to_string())),
            Err(e) => Err(Error::Interface(format!("Failed to create channel: {}", e))),
        }
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}){}",
            self.name,
            self.mac_address,
            if self.is_up { "" } else { " [down]" }
        )
    }
}
