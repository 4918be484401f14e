//! Load weapon rules from TOML files
//!
//! Loading freezes every declaration into a [`WeaponConfig`], resolving
//! weapon references to ids. Any unresolved reference, malformed falloff
//! table, bad value or reference cycle fails the whole load; a rule set that
//! loads never fails later at simulation time.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use super::schema::{DefError, RulesFile, WeaponDef};
use super::weapon::{MotionModel, ProjectileConfig, WeaponConfig, WeaponId};
use crate::warheads::WarheadKind;

/// Errors that can occur when loading weapon rules
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Weapon '{0}' is declared more than once")]
    DuplicateWeapon(String),

    #[error("Weapon '{weapon}' references undeclared weapon '{reference}'")]
    UnknownWeapon { weapon: String, reference: String },

    #[error("Weapon '{weapon}' has a malformed falloff table: {reason}")]
    MalformedFalloff { weapon: String, reason: String },

    #[error("Weapon '{weapon}' has an invalid {field}: {reason}")]
    InvalidValue {
        weapon: String,
        field: &'static str,
        reason: String,
    },

    #[error("Weapon '{weapon}' is part of a weapon reference cycle")]
    ReferenceCycle { weapon: String },
}

impl RulesError {
    fn from_def(weapon: &str, err: DefError) -> Self {
        let weapon = weapon.to_string();
        match err {
            DefError::Falloff(reason) => RulesError::MalformedFalloff { weapon, reason },
            DefError::Invalid { field, reason } => RulesError::InvalidValue { weapon, field, reason },
            DefError::UnknownWeapon(reference) => RulesError::UnknownWeapon { weapon, reference },
        }
    }
}

/// The frozen weapon graph, indexed by [`WeaponId`]
#[derive(Debug, Default)]
pub struct WeaponRules {
    weapons: Vec<Arc<WeaponConfig>>,
    ids: BTreeMap<String, WeaponId>,
}

impl WeaponRules {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_toml_str(text: &str) -> Result<Self, RulesError> {
        let mut defs = BTreeMap::new();
        collect_defs(&mut defs, toml::from_str(text)?)?;
        Self::from_defs(defs)
    }

    pub fn load_file(path: &Path) -> Result<Self, RulesError> {
        let mut defs = BTreeMap::new();
        collect_defs(&mut defs, read_rules_file(path)?)?;
        Self::from_defs(defs)
    }

    /// Loads every `.toml` file in `dir`, in file name order
    pub fn load_dir(dir: &Path) -> Result<Self, RulesError> {
        let io_err = |source| RulesError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(io_err)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map_or(false, |ext| ext == "toml"))
            .collect();
        paths.sort();

        let mut defs = BTreeMap::new();
        for path in &paths {
            debug!(path = %path.display(), "Reading weapon rules");
            collect_defs(&mut defs, read_rules_file(path)?)?;
        }
        Self::from_defs(defs)
    }

    fn from_defs(defs: BTreeMap<String, WeaponDef>) -> Result<Self, RulesError> {
        let ids: BTreeMap<String, WeaponId> = defs
            .keys()
            .enumerate()
            .map(|(i, name)| (name.clone(), WeaponId(i as u32)))
            .collect();
        let resolve = |name: &str| ids.get(&name.to_lowercase()).copied();

        let mut weapons = Vec::with_capacity(defs.len());
        for (name, def) in defs {
            let id = ids[&name];
            weapons.push(Arc::new(freeze_weapon(id, &name, def, &resolve)?));
        }

        let rules = Self { weapons, ids };
        rules.check_cycles()?;
        info!(weapons = rules.len(), "Loaded weapon rules");
        Ok(rules)
    }

    /// Weapons a weapon can bring into play: its cluster weapon and any
    /// weapon fired by its warheads
    fn references(weapon: &WeaponConfig) -> Vec<WeaponId> {
        let mut refs = Vec::new();
        if let MotionModel::Cluster(cluster) = &weapon.projectile.model {
            refs.push(cluster.weapon);
        }
        for warhead in &weapon.warheads {
            if let WarheadKind::FireCluster(w) = &warhead.kind {
                refs.push(w.weapon);
            }
        }
        refs
    }

    fn check_cycles(&self) -> Result<(), RulesError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Visiting,
            Done,
        }

        fn visit(rules: &WeaponRules, id: WeaponId, marks: &mut [Mark]) -> Result<(), RulesError> {
            match marks[id.0 as usize] {
                Mark::Done => return Ok(()),
                Mark::Visiting => {
                    return Err(RulesError::ReferenceCycle {
                        weapon: rules.weapons[id.0 as usize].name.clone(),
                    })
                }
                Mark::New => {}
            }
            marks[id.0 as usize] = Mark::Visiting;
            for next in WeaponRules::references(&rules.weapons[id.0 as usize]) {
                visit(rules, next, marks)?;
            }
            marks[id.0 as usize] = Mark::Done;
            Ok(())
        }

        let mut marks = vec![Mark::New; self.weapons.len()];
        for weapon in &self.weapons {
            visit(self, weapon.id, &mut marks)?;
        }
        Ok(())
    }

    pub fn get(&self, id: WeaponId) -> Option<&Arc<WeaponConfig>> {
        self.weapons.get(id.0 as usize)
    }

    /// Case-insensitive lookup
    pub fn id_of(&self, name: &str) -> Option<WeaponId> {
        self.ids.get(&name.to_lowercase()).copied()
    }

    pub fn by_name(&self, name: &str) -> Option<&Arc<WeaponConfig>> {
        self.id_of(name).and_then(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<WeaponConfig>> {
        self.weapons.iter()
    }
}

fn read_rules_file(path: &Path) -> Result<RulesFile, RulesError> {
    let content = fs::read_to_string(path).map_err(|source| RulesError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Merges a parsed file into `defs`, lowercasing names
fn collect_defs(defs: &mut BTreeMap<String, WeaponDef>, file: RulesFile) -> Result<(), RulesError> {
    for (name, def) in file.weapons {
        let key = name.to_lowercase();
        if defs.insert(key, def).is_some() {
            return Err(RulesError::DuplicateWeapon(name));
        }
    }
    Ok(())
}

fn freeze_weapon(
    id: WeaponId,
    name: &str,
    def: WeaponDef,
    resolve: &impl Fn(&str) -> Option<WeaponId>,
) -> Result<WeaponConfig, RulesError> {
    let invalid = |field, reason: &str| RulesError::InvalidValue {
        weapon: name.to_string(),
        field,
        reason: reason.to_string(),
    };
    if def.range.0 < 0 {
        return Err(invalid("range", "must not be negative"));
    }
    if def.min_range.0 < 0 || def.min_range > def.range {
        return Err(invalid("min_range", "must lie between zero and range"));
    }
    if def.projectile.common.inaccuracy.0 < 0 {
        return Err(invalid("inaccuracy", "must not be negative"));
    }
    if def.projectile.common.width.0 < 0 {
        return Err(invalid("width", "must not be negative"));
    }

    let model = def
        .projectile
        .model
        .freeze(resolve)
        .map_err(|e| RulesError::from_def(name, e))?;
    let warheads = def
        .warheads
        .into_iter()
        .map(|w| w.freeze(resolve))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| RulesError::from_def(name, e))?;

    let common = def.projectile.common;
    Ok(WeaponConfig {
        id,
        name: name.to_string(),
        range: def.range,
        min_range: def.min_range,
        report: def.report,
        valid_targets: def.valid_targets,
        invalid_targets: def.invalid_targets,
        projectile: ProjectileConfig {
            inaccuracy: common.inaccuracy,
            inaccuracy_type: common.inaccuracy_type,
            arming_delay: common.arming_delay,
            blockable: common.blockable,
            width: common.width,
            model,
        },
        warheads,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = r#"
        [weapons.Cannon]
        range = 6144
        report = ["cannon1"]

        [weapons.Cannon.projectile]
        type = "Bullet"
        speed = [682]

        [[weapons.Cannon.warheads]]
        type = "SpreadDamage"
        damage = 4000
        spread = 128
        versus = { heavy = 50 }

        [weapons.zap]
        range = 4096

        [weapons.zap.projectile]
        type = "Beam"
        shape = "Arc"

        [[weapons.zap.warheads]]
        type = "TargetDamage"
        damage = 100
    "#;

    #[test]
    fn test_load_basic_rules() {
        let rules = WeaponRules::from_toml_str(BASIC).unwrap();
        assert_eq!(rules.len(), 2);
        let cannon = rules.by_name("CANNON").unwrap();
        assert_eq!(cannon.name, "cannon");
        assert_eq!(cannon.range.0, 6144);
        assert!(matches!(cannon.projectile.model, MotionModel::Bullet(_)));
        assert_eq!(cannon.warheads.len(), 1);
        match &cannon.warheads[0].kind {
            WarheadKind::SpreadDamage(w) => {
                assert_eq!(w.damage, 4000);
                assert_eq!(w.falloff.outer_range().0, 512);
                assert_eq!(w.versus.get("heavy"), Some(&50));
            }
            other => panic!("unexpected warhead {}", other.name()),
        }
    }

    #[test]
    fn test_ids_follow_name_order() {
        let rules = WeaponRules::from_toml_str(BASIC).unwrap();
        assert_eq!(rules.id_of("cannon"), Some(WeaponId(0)));
        assert_eq!(rules.id_of("Zap"), Some(WeaponId(1)));
        assert_eq!(rules.id_of("laser"), None);
    }

    #[test]
    fn test_unknown_cluster_weapon_is_fatal() {
        let text = r#"
            [weapons.bomblet_dispenser]
            range = 2048
            [weapons.bomblet_dispenser.projectile]
            type = "Bullet"
            [[weapons.bomblet_dispenser.warheads]]
            type = "FireCluster"
            weapon = "bomblet"
        "#;
        match WeaponRules::from_toml_str(text) {
            Err(RulesError::UnknownWeapon { weapon, reference }) => {
                assert_eq!(weapon, "bomblet_dispenser");
                assert_eq!(reference, "bomblet");
            }
            other => panic!("expected unknown weapon, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_falloff_names_weapon() {
        let text = r#"
            [weapons.mortar]
            range = 2048
            [weapons.mortar.projectile]
            type = "Bullet"
            [[weapons.mortar.warheads]]
            type = "SpreadDamage"
            damage = 10
            range = [0, 512, 256]
            falloff = [100, 50, 0]
        "#;
        let err = WeaponRules::from_toml_str(text).unwrap_err();
        assert!(matches!(err, RulesError::MalformedFalloff { ref weapon, .. } if weapon == "mortar"));
        assert!(err.to_string().contains("mortar"));
    }

    #[test]
    fn test_fire_cluster_cycle_is_rejected() {
        let text = r#"
            [weapons.a]
            range = 1024
            [weapons.a.projectile]
            type = "Bullet"
            [[weapons.a.warheads]]
            type = "FireCluster"
            weapon = "b"

            [weapons.b]
            range = 1024
            [weapons.b.projectile]
            type = "Bullet"
            [[weapons.b.warheads]]
            type = "FireCluster"
            weapon = "A"
        "#;
        assert!(matches!(
            WeaponRules::from_toml_str(text),
            Err(RulesError::ReferenceCycle { .. })
        ));
    }

    #[test]
    fn test_invalid_speed_is_rejected() {
        let text = r#"
            [weapons.slow]
            range = 1024
            [weapons.slow.projectile]
            type = "Bullet"
            speed = [0]
        "#;
        assert!(matches!(
            WeaponRules::from_toml_str(text),
            Err(RulesError::InvalidValue { field: "speed", .. })
        ));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            WeaponRules::from_toml_str("[weapons.x]\nrange = \"far\""),
            Err(RulesError::Parse(_))
        ));
    }
}
