//! `set` subcommand — change one setting on the attached dongle.

use dongler_lib::setting::Setting;

use super::{Context, Result, attached_state, print_dongle};

pub(super) fn cmd_set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let config = ctx.load_config();
    let controller = ctx.controller(&config);
    let dongle = attached_state(&controller)?;

    let setting = Setting::parse(&dongle, key, value)?;
    let updated = controller.apply(&dongle, setting)?;
    print_dongle(&updated, ctx.json)
}
