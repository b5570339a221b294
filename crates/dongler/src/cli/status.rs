//! `status` subcommand — read and show the attached dongle's state.

use super::{
    Context, DeviceError, DongleJson, DonglerError, Result, StatusOutput, attached_state,
    print_dongle, print_json,
};

pub(super) fn cmd_status(ctx: &Context) -> Result<()> {
    let config = ctx.load_config();
    let controller = ctx.controller(&config);

    let dongle = match attached_state(&controller) {
        Ok(dongle) => Some(dongle),
        Err(DonglerError::Device(DeviceError::UnsupportedDongle)) => None,
        Err(e) => return Err(e),
    };

    if ctx.json {
        return print_json(&StatusOutput {
            version: env!("CARGO_PKG_VERSION"),
            device: dongle.as_ref().map(DongleJson::from),
        });
    }

    match dongle {
        Some(dongle) => print_dongle(&dongle, false),
        None => {
            println!("No supported dongle attached.");
            Ok(())
        }
    }
}
