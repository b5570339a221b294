//! `volume` subcommand — one volume step up or down.

use super::{Context, DongleJson, Result, VolumeStep, attached_state, print_json};

pub(super) fn cmd_volume(ctx: &Context, step: VolumeStep) -> Result<()> {
    let config = ctx.load_config();
    let controller = ctx.controller(&config);
    let dongle = attached_state(&controller)?;

    let updated = match step {
        VolumeStep::Up => controller.volume_up(&dongle)?,
        VolumeStep::Down => controller.volume_down(&dongle)?,
    };

    if ctx.json {
        return print_json(&DongleJson::from(&updated));
    }
    println!(
        "{}: {} -> {}",
        updated.model_name(),
        dongle.display_volume_level(),
        updated.display_volume_level()
    );
    Ok(())
}
