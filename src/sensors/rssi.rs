//! Wireless link quality probe (telemetry only).
//!
//! Tries `iwconfig` first and falls back to `iw dev <iface> link`.  Any
//! failure (tool missing, not associated, unparsable output) yields `None`.

use std::process::Command;

use crate::app::ports::SignalProbe;

pub struct WirelessProbe {
    interface: String,
}

impl Default for WirelessProbe {
    fn default() -> Self {
        Self::new("wlan0")
    }
}

impl WirelessProbe {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }

    fn run(program: &str, args: &[&str]) -> Option<String> {
        let out = Command::new(program).args(args).output().ok()?;
        let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&out.stderr));
        Some(text)
    }
}

impl SignalProbe for WirelessProbe {
    fn signal_strength(&self) -> Option<i32> {
        Self::run("iwconfig", &[])
            .and_then(|out| parse_iwconfig(&out))
            .or_else(|| {
                Self::run("iw", &["dev", &self.interface, "link"]).and_then(|out| parse_iw_link(&out))
            })
    }
}

/// Extract `Signal level=-52 dBm` from `iwconfig` output.
pub fn parse_iwconfig(output: &str) -> Option<i32> {
    output
        .lines()
        .filter(|line| line.contains("Signal level"))
        .flat_map(str::split_whitespace)
        .find_map(|tok| {
            let value = tok.strip_prefix("level=")?;
            value.strip_suffix("dBm").unwrap_or(value).parse().ok()
        })
}

/// Extract `signal: -52 dBm` from `iw dev wlan0 link` output.
pub fn parse_iw_link(output: &str) -> Option<i32> {
    output.lines().find_map(|line| {
        let (_, rest) = line.split_once("signal:")?;
        rest.split_whitespace().next()?.parse().ok()
    })
}
