//! Per-family communication repositories.
//!
//! A repository turns "get the current state" or "set feature X" into a
//! sequence of transfers built from its injected command table. Each
//! repository owns one [`ExchangeLock`], so all exchanges for one family are
//! serialized. Every operation opens its own link and closes it before
//! returning.
//!
//! Operations take a descriptor and return a new one. On failure the error is
//! returned and the caller's descriptor stays authoritative.

mod dawn;
mod e1da;
mod ka13;
mod ka5;

use std::sync::Arc;

pub use dawn::DawnRepository;
pub use e1da::E1daRepository;
pub use ka5::Ka5Repository;
pub use ka13::Ka13Repository;

use crate::device::{Result, UsbHost};
use crate::models::Model;
use crate::transfer::{ExchangeLock, LinkSession, Timing};

/// Host, timing and the family's lock.
struct Channel {
    host: Arc<dyn UsbHost>,
    timing: Timing,
    lock: ExchangeLock,
}

impl Channel {
    fn new(host: Arc<dyn UsbHost>, timing: Timing) -> Self {
        Channel {
            host,
            timing,
            lock: ExchangeLock::new(),
        }
    }

    /// Run `f` on a fresh link to `model` under the family lock.
    fn exchange<T>(
        &self,
        model: &Model,
        f: impl FnOnce(&mut LinkSession) -> Result<T>,
    ) -> Result<T> {
        self.lock.exchange(
            self.host.as_ref(),
            self.timing,
            model.vendor_id,
            model.product_id,
            f,
        )
    }
}
