//! Re-resolving a dongle after it drops off the bus.
//!
//! Unplugging, a hub reset or a permission change all surface as failed
//! exchanges. The watcher then polls for the dongle again, backing off
//! exponentially between attempts.

use std::time::{Duration, Instant};

use crate::controller::DongleController;
use crate::dongle::UsbDongle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// Backoff state between reconnect attempts.
#[derive(Debug)]
pub struct ReconnectState {
    config: ReconnectConfig,
    delay: Duration,
    last_attempt: Option<Instant>,
    failures: u32,
}

impl Default for ReconnectState {
    fn default() -> Self {
        Self::new(ReconnectConfig::default())
    }
}

impl ReconnectState {
    pub fn new(config: ReconnectConfig) -> Self {
        ReconnectState {
            delay: config.initial_delay,
            config,
            last_attempt: None,
            failures: 0,
        }
    }

    /// True before the first attempt and once the current delay has passed.
    pub fn should_attempt(&self) -> bool {
        self.last_attempt
            .is_none_or(|last| last.elapsed() >= self.delay)
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
        self.last_attempt = Some(Instant::now());
        let next = self.delay.mul_f64(self.config.multiplier);
        self.delay = next.min(self.config.max_delay);
    }

    pub fn record_success(&mut self) {
        *self = Self::new(self.config);
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.failures
    }

    pub fn current_delay(&self) -> Duration {
        self.delay
    }
}

/// Resolve the first attached dongle and read its state, if the backoff
/// allows an attempt now.
///
/// Returns `None` when it is too early to try or the attempt failed; the
/// failure is logged with the next retry delay.
pub fn try_resolve(state: &mut ReconnectState, controller: &DongleController) -> Option<UsbDongle> {
    if !state.should_attempt() {
        return None;
    }
    let resolved = controller
        .first_attached()
        .and_then(|dongle| controller.current_state(&dongle));
    match resolved {
        Ok(dongle) => {
            if state.consecutive_failures() > 0 {
                log::info!("reconnected to {dongle}");
            }
            state.record_success();
            Some(dongle)
        }
        Err(e) => {
            state.record_failure();
            log::warn!(
                "reconnect failed: {e} (attempt {}, retry in {:.1}s)",
                state.consecutive_failures(),
                state.current_delay().as_secs_f64()
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::mock::MockHost;
    use crate::transfer::Timing;
    use std::sync::Arc;

    fn fast() -> ReconnectConfig {
        ReconnectConfig {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            multiplier: 2.0,
        }
    }

    #[test]
    fn defaults_are_one_to_thirty_seconds() {
        let c = ReconnectConfig::default();
        assert_eq!(c.initial_delay, Duration::from_secs(1));
        assert_eq!(c.max_delay, Duration::from_secs(30));
        assert_eq!(c.multiplier, 2.0);
        assert!(ReconnectState::default().should_attempt());
    }

    #[test]
    fn delay_doubles_up_to_cap() {
        let mut s = ReconnectState::new(fast());
        let mut delays = Vec::new();
        for _ in 0..4 {
            s.record_failure();
            delays.push(s.current_delay().as_millis());
        }
        assert_eq!(delays, vec![200, 400, 500, 500]);
        assert_eq!(s.consecutive_failures(), 4);
    }

    #[test]
    fn success_resets() {
        let mut s = ReconnectState::new(fast());
        s.record_failure();
        s.record_failure();
        s.record_success();
        assert_eq!(s.consecutive_failures(), 0);
        assert_eq!(s.current_delay(), Duration::from_millis(100));
        assert!(s.should_attempt());
    }

    #[test]
    fn waits_for_delay_after_failure() {
        let mut s = ReconnectState::new(ReconnectConfig {
            initial_delay: Duration::from_secs(60),
            ..fast()
        });
        s.record_failure();
        assert!(!s.should_attempt());

        let mut s = ReconnectState::new(ReconnectConfig {
            initial_delay: Duration::from_millis(1),
            ..fast()
        });
        s.record_failure();
        std::thread::sleep(Duration::from_millis(10));
        assert!(s.should_attempt());
    }

    #[test]
    fn try_resolve_backs_off_then_finds_dongle() {
        let host = MockHost::new();
        let controller = DongleController::new(Arc::new(host.clone()), Timing::immediate());
        let mut s = ReconnectState::new(ReconnectConfig {
            initial_delay: Duration::from_millis(1),
            ..fast()
        });

        assert!(try_resolve(&mut s, &controller).is_none());
        assert_eq!(s.consecutive_failures(), 1);

        host.attach(0x262A, 0x9038, true);
        std::thread::sleep(Duration::from_millis(5));
        let dongle = try_resolve(&mut s, &controller).unwrap();
        assert_eq!(dongle.product_id(), 0x9038);
        assert_eq!(s.consecutive_failures(), 0);
    }

    #[test]
    fn try_resolve_skips_while_backing_off() {
        let host = MockHost::with_dongle(0x262A, 0x9038);
        let controller = DongleController::new(Arc::new(host), Timing::immediate());
        let mut s = ReconnectState::new(ReconnectConfig {
            initial_delay: Duration::from_secs(60),
            ..fast()
        });
        s.record_failure();
        assert!(try_resolve(&mut s, &controller).is_none());
        assert_eq!(s.consecutive_failures(), 1);
    }
}
