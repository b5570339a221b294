//! `devices` subcommand — list attached dongles.

use serde::Serialize;

use super::{AttachedDevice, Context, Result, print_json};

#[derive(Serialize)]
struct DeviceJson {
    model: &'static str,
    usb_id: String,
    #[serde(flatten)]
    device: AttachedDevice,
}

#[derive(Serialize)]
struct DevicesOutput {
    count: usize,
    devices: Vec<DeviceJson>,
}

pub(super) fn cmd_devices(ctx: &Context) -> Result<()> {
    let config = ctx.load_config();
    let found = ctx.controller(&config).attached_dongles()?;

    if ctx.json {
        let devices: Vec<DeviceJson> = found
            .into_iter()
            .map(|(device, dongle)| DeviceJson {
                model: dongle.model_name(),
                usb_id: dongle.model().usb_id(),
                device,
            })
            .collect();
        return print_json(&DevicesOutput {
            count: devices.len(),
            devices,
        });
    }

    if found.is_empty() {
        println!("No supported dongles found.");
        return Ok(());
    }

    println!(
        "Found {} dongle{}:",
        found.len(),
        if found.len() == 1 { "" } else { "s" }
    );
    println!();
    for (i, (dev, dongle)) in found.iter().enumerate() {
        println!("  [{}] {} [{}]", i + 1, dongle.model_name(), dongle.model().usb_id());
        println!("      Path:   {}", dev.path);
        if let Some(serial) = &dev.serial {
            println!("      Serial: {serial}");
        }
        if !dev.permission_granted {
            println!("      Access: denied (check udev rules)");
        }
    }
    Ok(())
}
