use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use warcalc_core::Preferences;

use crate::state::ensure_warcalc_home;

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_warcalc_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Preferences> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Preferences::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s)
}

fn parse_config(s: &str) -> Result<Preferences> {
    let prefs: Preferences = toml::from_str(s).context("parse config.toml")?;
    // Fail early on a bad timezone rather than at display time.
    prefs.display_tz()?;
    Ok(prefs)
}

pub fn save_config(prefs: &Preferences) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(prefs).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Preferences::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}
