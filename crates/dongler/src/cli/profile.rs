//! `profile` subcommand — list, save, apply and delete stored profiles.

use serde::Serialize;

use super::{
    Context, DonglerError, Profile, ProfileAction, ProfileStore, Result, print_dongle, print_json,
};

#[derive(Serialize)]
struct ProfileJson {
    id: u32,
    name: String,
    usb_id: String,
    model: Option<&'static str>,
}

impl From<&Profile> for ProfileJson {
    fn from(p: &Profile) -> Self {
        ProfileJson {
            id: p.id,
            name: p.name.clone(),
            usb_id: format!("{:04x}:{:04x}", p.vendor_id, p.product_id),
            model: dongler_lib::models::detect_model(p.vendor_id, p.product_id).map(|m| m.name),
        }
    }
}

pub(super) fn cmd_profile(ctx: &Context, action: ProfileAction) -> Result<()> {
    let config = ctx.load_config();
    let mut store = ctx.profile_store(&config)?;

    match action {
        ProfileAction::List { attached } => {
            let profiles = if attached {
                let dongle = ctx.controller(&config).first_attached()?;
                store.list_for(dongle.vendor_id(), dongle.product_id())?
            } else {
                store.list()?
            };
            if ctx.json {
                let out: Vec<ProfileJson> = profiles.iter().map(ProfileJson::from).collect();
                return print_json(&out);
            }
            if profiles.is_empty() {
                println!("No profiles stored.");
            }
            for p in profiles.iter().map(ProfileJson::from) {
                println!(
                    "  [{}] {}  ({})",
                    p.id,
                    p.name,
                    p.model.unwrap_or(p.usb_id.as_str())
                );
            }
            Ok(())
        }
        ProfileAction::Save { name } => {
            let controller = ctx.controller(&config);
            let dongle = controller.first_attached()?;
            let id = store.insert(controller.snapshot_profile(&dongle, &name)?)?;
            if ctx.json {
                return print_json(&serde_json::json!({ "id": id, "name": name }));
            }
            println!("Saved profile [{id}] {name} for {dongle}");
            Ok(())
        }
        ProfileAction::Apply { id } => {
            let profile = store
                .get(id)?
                .ok_or_else(|| DonglerError::Profile(format!("no profile with id {id}")))?;
            let controller = ctx.controller(&config);
            let dongle = controller.first_attached()?;
            let updated = controller.apply_profile(&dongle, &profile)?;
            if !ctx.json {
                println!("Applied profile [{id}] {}", profile.name);
                println!();
            }
            print_dongle(&updated, ctx.json)
        }
        ProfileAction::Delete { id } => {
            if !store.delete(id)? {
                return Err(DonglerError::Profile(format!("no profile with id {id}")));
            }
            if ctx.json {
                return print_json(&serde_json::json!({ "deleted": id }));
            }
            println!("Deleted profile [{id}]");
            Ok(())
        }
    }
}
