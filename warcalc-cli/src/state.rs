use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use warcalc_core::gathering::ResourceKind;
use warcalc_core::TrainingForm;

pub fn warcalc_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".warcalc"))
}

pub fn ensure_warcalc_home() -> Result<PathBuf> {
    let dir = warcalc_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// One squad row from the gathering form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSquad {
    pub time: String,
    pub level: u8,
    pub kind: ResourceKind,
}

/// Last-used inputs. Buffed and normal barracks are remembered separately.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedInputs {
    pub normal: TrainingForm,
    pub buffed: TrainingForm,
    pub squads: Vec<SavedSquad>,
}

fn is_blank(form: &TrainingForm) -> bool {
    form.capacity.trim().is_empty()
        && form.training_time.trim().is_empty()
        && form.barracks.iter().all(|b| b.trim().is_empty())
}

impl SavedInputs {
    /// First use of buffed mode starts from a copy of the normal values.
    pub fn seed_buffed(&mut self) {
        if is_blank(&self.buffed) && !is_blank(&self.normal) {
            self.buffed = self.normal.clone();
        }
    }

    pub fn form_mut(&mut self, buffed: bool) -> &mut TrainingForm {
        if buffed {
            &mut self.buffed
        } else {
            &mut self.normal
        }
    }
}

pub fn inputs_path() -> Result<PathBuf> {
    Ok(ensure_warcalc_home()?.join("inputs.json"))
}

pub fn read_inputs() -> Result<SavedInputs> {
    let p = inputs_path()?;
    if !p.exists() {
        return Ok(SavedInputs::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn write_inputs(inputs: &SavedInputs) -> Result<()> {
    let p = inputs_path()?;
    let json = serde_json::to_string_pretty(inputs)?;
    fs::write(&p, json).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffed_and_normal_kept_apart() {
        let mut inputs = SavedInputs::default();
        inputs.form_mut(true).capacity = "900".to_string();
        assert_eq!(inputs.buffed.capacity, "900");
        assert!(inputs.normal.capacity.is_empty());
    }

    #[test]
    fn test_seed_buffed_copies_normal_once() {
        let mut inputs = SavedInputs::default();
        inputs.normal.capacity = "729".to_string();
        inputs.normal.training_time = "25:12:51".to_string();
        inputs.seed_buffed();
        assert_eq!(inputs.buffed, inputs.normal);

        inputs.buffed.capacity = "900".to_string();
        inputs.seed_buffed();
        assert_eq!(inputs.buffed.capacity, "900");
    }

    #[test]
    fn test_seed_buffed_leaves_existing_values() {
        let mut inputs = SavedInputs::default();
        inputs.normal.capacity = "729".to_string();
        inputs.buffed.barracks[0] = "100".to_string();
        inputs.seed_buffed();
        assert!(inputs.buffed.capacity.is_empty());
        assert_eq!(inputs.buffed.barracks[0], "100");
    }

    #[test]
    fn test_inputs_json_round_trip() {
        let mut inputs = SavedInputs::default();
        inputs.normal.training_time = "25:12:51".to_string();
        inputs.squads.push(SavedSquad {
            time: "10:00:00".to_string(),
            level: 12,
            kind: ResourceKind::Gold,
        });
        let json = serde_json::to_string(&inputs).unwrap();
        let back: SavedInputs = serde_json::from_str(&json).unwrap();
        assert_eq!(back, inputs);
    }
}
