//! Round-trip time and lag detection
//!
//! Purely informational: nothing here feeds back into the simulation.

use super::protocol::NetMessage;

/// Pings the peer on a fixed interval and tracks how recently it was heard
#[derive(Debug, Clone)]
pub struct LatencyMonitor {
    ping_interval: f64,
    lag_threshold: f64,
    /// Session clock (seconds)
    now: f64,
    since_ping: f64,
    last_heard: f64,
    rtt: Option<f64>,
}

impl LatencyMonitor {
    pub fn new(ping_interval: f64, lag_threshold: f64) -> Self {
        Self {
            ping_interval,
            lag_threshold,
            now: 0.0,
            since_ping: 0.0,
            last_heard: 0.0,
            rtt: None,
        }
    }

    /// Advance the clock; returns a PING when one is due
    pub fn tick(&mut self, dt: f64) -> Option<NetMessage> {
        self.now += dt;
        self.since_ping += dt;
        if self.since_ping >= self.ping_interval {
            self.since_ping = 0.0;
            Some(NetMessage::Ping { sent_at: self.now })
        } else {
            None
        }
    }

    /// Any packet from the peer counts as a sign of life
    pub fn on_packet(&mut self) {
        self.last_heard = self.now;
    }

    pub fn on_pong(&mut self, sent_at: f64) {
        let rtt = (self.now - sent_at).max(0.0);
        self.rtt = Some(rtt);
        log::trace!("rtt {:.1} ms", rtt * 1000.0);
    }

    /// Most recent round-trip time in seconds
    pub fn rtt(&self) -> Option<f64> {
        self.rtt
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    /// True once nothing has arrived for longer than the lag threshold
    pub fn is_lagging(&self) -> bool {
        self.now - self.last_heard > self.lag_threshold
    }
}
