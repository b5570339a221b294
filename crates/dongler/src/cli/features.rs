//! `features` subcommand — list settable keys for a model.

use dongler_lib::models::parse_usb_id;
use dongler_lib::setting::{Setting, SettingInfo};
use serde::Serialize;

use super::{Context, DonglerError, Result, UsbDongle, kv, kv_width, print_json};

#[derive(Serialize)]
struct FeaturesOutput {
    model: &'static str,
    usb_id: String,
    keys: Vec<SettingInfo>,
}

/// The model named by `--model`, or the attached dongle.
fn resolve(ctx: &Context, model: Option<&str>) -> Result<UsbDongle> {
    match model {
        Some(id) => parse_usb_id(id)
            .and_then(|(vid, pid)| UsbDongle::detect(vid, pid))
            .ok_or_else(|| DonglerError::Setting(format!("unknown model \"{id}\""))),
        None => {
            let config = ctx.load_config();
            ctx.controller(&config).first_attached()
        }
    }
}

pub(super) fn cmd_features(ctx: &Context, model: Option<&str>) -> Result<()> {
    let dongle = resolve(ctx, model)?;
    let keys = Setting::keys_for(dongle.family());

    if ctx.json {
        return print_json(&FeaturesOutput {
            model: dongle.model_name(),
            usb_id: dongle.model().usb_id(),
            keys,
        });
    }

    println!("{dongle}");
    println!();
    let names: Vec<&str> = keys.iter().map(|k| k.key).collect();
    let w = kv_width(&names, &[]);
    for info in &keys {
        kv(info.key, &info.accepted, w);
    }
    Ok(())
}
