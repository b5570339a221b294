//! `config` subcommand — show the effective configuration and file paths.

use serde::Serialize;

use super::{Config, Context, DonglerError, Result, kv, kv_indent, kv_width, print_json};

#[derive(Serialize)]
struct ConfigOutput {
    config_file: Option<String>,
    config_file_exists: bool,
    settings: Config,
    problems: Vec<String>,
    files: ConfigFilesJson,
}

#[derive(Serialize)]
struct ConfigFilesJson {
    profiles: Option<String>,
    profiles_exists: bool,
}

/// Write the default config unless a file is already there.
fn init_config(ctx: &Context) -> Result<()> {
    let path = ctx
        .config_file()
        .ok_or_else(|| DonglerError::Config("no config directory".into()))?;
    if path.exists() {
        log::warn!("{} exists, left unchanged", path.display());
        return Ok(());
    }
    Config::default().save_to(&path)?;
    log::info!("wrote default config to {}", path.display());
    Ok(())
}

pub(super) fn cmd_config(ctx: &Context, init: bool) -> Result<()> {
    if init {
        init_config(ctx)?;
    }
    let config = ctx.load_config();
    let config_path = ctx.config_file();
    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());
    let profiles = config.profiles_file();
    let profiles_exists = profiles.as_ref().is_some_and(|p| p.exists());
    let problems: Vec<String> = match config.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => errors.iter().map(ToString::to_string).collect(),
    };

    if ctx.json {
        return print_json(&ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            settings: config,
            problems,
            files: ConfigFilesJson {
                profiles: profiles.as_ref().map(|p| p.display().to_string()),
                profiles_exists,
            },
        });
    }

    let w = kv_width(
        &["Config file:"],
        &[
            "transfer_timeout_ms:",
            "settle_delay_ms:",
            "preferred_device:",
            "profiles_path:",
            "watch_interval_ms:",
            "Profiles:",
        ],
    );

    match &config_path {
        Some(p) if config_exists => kv("Config file:", format_args!("{} (loaded)", p.display()), w),
        Some(p) => kv(
            "Config file:",
            format_args!("{} (not found, using defaults)", p.display()),
            w,
        ),
        None => kv("Config file:", "(no config directory)", w),
    }
    println!();

    let or_default = |s: &str, default: &'static str| {
        if s.trim().is_empty() {
            default.to_string()
        } else {
            s.to_string()
        }
    };
    println!("Settings:");
    kv_indent("transfer_timeout_ms:", config.transfer_timeout_ms, w);
    kv_indent("settle_delay_ms:", config.settle_delay_ms, w);
    kv_indent(
        "preferred_device:",
        or_default(&config.preferred_device, "(first found)"),
        w,
    );
    kv_indent(
        "profiles_path:",
        or_default(&config.profiles_path, "(default)"),
        w,
    );
    kv_indent("watch_interval_ms:", config.watch_interval_ms, w);
    for problem in &problems {
        println!("  ! {problem}");
    }
    println!();

    println!("Files:");
    match &profiles {
        Some(p) => {
            let status = if profiles_exists { "present" } else { "not found" };
            kv_indent("Profiles:", format_args!("{} ({status})", p.display()), w);
        }
        None => kv_indent("Profiles:", "(no config directory)", w),
    }
    Ok(())
}
