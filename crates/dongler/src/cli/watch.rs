//! `watch` subcommand — poll the dongle and print changes until Ctrl+C.

use std::sync::atomic::Ordering;
use std::time::Duration;

use dongler_lib::monitor::StateMonitor;
use dongler_lib::reconnect::{ReconnectState, try_resolve};

use super::{Context, RUNNING, Result, UsbDongle, attached_state};

/// Sleep up to `total`, waking early once Ctrl+C clears [`RUNNING`].
fn sleep_while_running(total: Duration) {
    let slice = Duration::from_millis(50);
    let mut left = total;
    while !left.is_zero() && RUNNING.load(Ordering::SeqCst) {
        let step = left.min(slice);
        std::thread::sleep(step);
        left -= step;
    }
}

pub(super) fn cmd_watch(ctx: &Context) -> Result<()> {
    let config = ctx.load_config();
    let controller = ctx.controller(&config);
    let interval = Duration::from_millis(config.watch_interval_ms);

    let first = attached_state(&controller)?;
    let mut monitor = StateMonitor::new();
    let mut reconnect = ReconnectState::default();
    println!("[device] {first}");
    monitor.update(first);
    let mut current: Option<UsbDongle> = Some(first);
    println!("Watching every {} ms... (Ctrl+C to stop)", interval.as_millis());

    while RUNNING.load(Ordering::SeqCst) {
        sleep_while_running(interval);
        if !RUNNING.load(Ordering::SeqCst) {
            break;
        }

        let Some(dongle) = current else {
            if let Some(found) = try_resolve(&mut reconnect, &controller) {
                println!("[device] Reconnected to {found}");
                monitor.reset();
                monitor.update(found);
                current = Some(found);
            }
            continue;
        };

        match controller.current_state(&dongle) {
            Ok(state) => {
                for change in monitor.update(state) {
                    println!("  {}: {} -> {}", change.key, change.old, change.new);
                }
                current = Some(state);
            }
            Err(e) => {
                log::warn!("[device] communication error: {e}");
                log::warn!("[device] will attempt reconnection...");
                current = None;
            }
        }
    }

    println!();
    println!("Stopped.");
    Ok(())
}
