use crate::models::{Bullet, BulletPointer, MaterialRegistry, Normal3D, PhysMatProperties, SurfaceType, Velocity3D};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// シナリオメタデータ
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// シミュレーション設定
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// ワーカースレッド数（未指定ならCPUコア数）
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Vector3Config {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3Config {
    pub fn to_velocity(&self) -> Velocity3D {
        Velocity3D::new(self.x, self.y, self.z)
    }

    pub fn to_normal(&self) -> Normal3D {
        Normal3D::new(self.x, self.y, self.z)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// 弾丸設定
#[derive(Debug, Deserialize, Serialize)]
pub struct BulletConfig {
    pub id: String,
    pub mass_kg: f64,
    pub radius_m: f64,
    pub length_m: f64,
    pub penetration_value: f64,
    pub muzzle_velocity_mps: f64,
    /// 弾体材質名
    pub material: String,
}

/// 標的層設定（`material` と `surface` のどちらか一方を指定）
#[derive(Debug, Deserialize, Serialize)]
pub struct LayerConfig {
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub surface: Option<SurfaceType>,
    pub thickness_cm: f64,
}

impl LayerConfig {
    /// 表示用の層名
    pub fn label(&self) -> String {
        match (&self.material, &self.surface) {
            (Some(name), _) => name.clone(),
            (None, Some(surface)) => format!("{:?}", surface),
            (None, None) => "<none>".to_string(),
        }
    }
}

/// 射撃設定
#[derive(Debug, Deserialize, Serialize)]
pub struct ShotConfig {
    pub id: String,
    pub bullet: String,
    /// 物理特性（値渡し）経路で計算する
    #[serde(default)]
    pub legacy: bool,
    /// 入射速度（未指定なら法線の逆向きに初速）
    #[serde(default)]
    pub velocity_mps: Option<Vector3Config>,
    #[serde(default = "default_normal")]
    pub normal: Vector3Config,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default)]
    pub debug: bool,
    pub layers: Vec<LayerConfig>,
}

fn default_normal() -> Vector3Config {
    Vector3Config { x: -1.0, y: 0.0, z: 0.0 }
}

fn default_multiplier() -> f64 {
    1.0
}

/// 完全なシナリオ設定
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    #[serde(default)]
    pub sim: SimulationConfig,
    /// 既定材質への追加・上書き
    #[serde(default)]
    pub materials: Vec<PhysMatProperties>,
    /// 既定弾丸への追加・上書き
    #[serde(default)]
    pub bullets: Vec<BulletConfig>,
    pub shots: Vec<ShotConfig>,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        // ファイル存在チェック
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScenarioError::IoError(path.to_path_buf(), e))?;

        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ScenarioError::ParseError(path.to_path_buf(), e))?;

        config.validate()?;

        Ok(config)
    }

    /// YAML文字列からシナリオ設定を読み込み
    pub fn from_yaml_str(contents: &str) -> Result<Self, ScenarioError> {
        let config: ScenarioConfig = serde_yaml::from_str(contents)
            .map_err(|e| ScenarioError::ParseError(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// 既定材質にシナリオの材質を重ねたレジストリ
    pub fn material_registry(&self) -> MaterialRegistry {
        let mut registry = MaterialRegistry::with_defaults();
        for material in &self.materials {
            registry.insert(material.clone());
        }
        registry
    }

    /// 既定弾丸にシナリオの弾丸を重ねた弾丸テーブル
    pub fn bullet_table(&self, registry: &MaterialRegistry) -> Result<HashMap<String, BulletPointer>, ScenarioError> {
        let mut table: HashMap<String, BulletPointer> = [Bullet::nato_556x45(), Bullet::nato_762x51(), Bullet::pistol_9x19()]
            .into_iter()
            .map(|b| (b.name.clone(), b.into_pointer()))
            .collect();

        for config in &self.bullets {
            let material = registry.by_name(&config.material).ok_or_else(|| {
                ScenarioError::ValidationError(format!(
                    "Bullet {} references unknown material {}",
                    config.id, config.material
                ))
            })?;
            let bullet = Bullet::new(
                config.id.clone(),
                config.mass_kg,
                config.radius_m,
                config.length_m,
                config.penetration_value,
                config.muzzle_velocity_mps,
                material.clone(),
            );
            table.insert(config.id.clone(), bullet.into_pointer());
        }

        Ok(table)
    }

    /// 設定の基本的な検証
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if let Some(0) = self.sim.worker_threads {
            return Err(ScenarioError::ValidationError("worker_threads must be positive".to_string()));
        }

        if self.shots.is_empty() {
            return Err(ScenarioError::ValidationError("Scenario has no shots".to_string()));
        }

        for material in &self.materials {
            if material.name.is_empty() {
                return Err(ScenarioError::ValidationError("Material name must not be empty".to_string()));
            }
        }

        let mut bullet_ids = HashSet::new();
        for bullet in &self.bullets {
            if !bullet_ids.insert(bullet.id.as_str()) {
                return Err(ScenarioError::ValidationError(format!("Duplicate bullet id {}", bullet.id)));
            }
            if !(bullet.mass_kg.is_finite() && bullet.mass_kg > 0.0) {
                return Err(ScenarioError::ValidationError(format!("Bullet {} mass must be positive", bullet.id)));
            }
            if !(bullet.radius_m.is_finite() && bullet.radius_m > 0.0) {
                return Err(ScenarioError::ValidationError(format!("Bullet {} radius must be positive", bullet.id)));
            }
        }

        let registry = self.material_registry();
        let bullets = self.bullet_table(&registry)?;

        let mut shot_ids = HashSet::new();
        for shot in &self.shots {
            if !shot_ids.insert(shot.id.as_str()) {
                return Err(ScenarioError::ValidationError(format!("Duplicate shot id {}", shot.id)));
            }
            if !bullets.contains_key(&shot.bullet) {
                return Err(ScenarioError::ValidationError(format!(
                    "Shot {} references unknown bullet {}",
                    shot.id, shot.bullet
                )));
            }
            if !(shot.multiplier.is_finite() && shot.multiplier > 0.0) {
                return Err(ScenarioError::ValidationError(format!("Shot {} multiplier must be positive", shot.id)));
            }
            if shot.velocity_mps.is_some_and(|v| !v.is_finite()) || !shot.normal.is_finite() {
                return Err(ScenarioError::ValidationError(format!("Shot {} has non-finite vectors", shot.id)));
            }
            if shot.layers.is_empty() {
                return Err(ScenarioError::ValidationError(format!("Shot {} has no layers", shot.id)));
            }

            for (index, layer) in shot.layers.iter().enumerate() {
                self.validate_layer(shot, index, layer, &registry)?;
            }
        }

        Ok(())
    }

    fn validate_layer(
        &self,
        shot: &ShotConfig,
        index: usize,
        layer: &LayerConfig,
        registry: &MaterialRegistry,
    ) -> Result<(), ScenarioError> {
        let fail = |reason: &str| {
            Err(ScenarioError::ValidationError(format!("Shot {} layer {}: {}", shot.id, index, reason)))
        };

        match (&layer.material, &layer.surface) {
            (Some(_), Some(_)) => return fail("specify either material or surface, not both"),
            (None, None) => return fail("material or surface is required"),
            (Some(_), None) if shot.legacy => return fail("legacy shots must use surface"),
            (Some(name), None) if registry.by_name(name).is_none() => {
                return fail(&format!("unknown material {}", name));
            }
            _ => {}
        }

        if !layer.thickness_cm.is_finite() || layer.thickness_cm < 0.0 {
            return fail("thickness_cm must be a non-negative finite value");
        }

        Ok(())
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== 材質・弾丸 ===");
        println!("追加材質: {}種", self.materials.len());
        for material in &self.materials {
            println!("  {} ({:?})", material.name, material.surface_type);
        }
        println!("追加弾丸: {}種", self.bullets.len());
        for bullet in &self.bullets {
            println!(
                "  {}: {:.1}g, 初速 {:.0}m/s, 貫通値 {:.2}",
                bullet.id,
                bullet.mass_kg * 1000.0,
                bullet.muzzle_velocity_mps,
                bullet.penetration_value
            );
        }
        println!();

        println!("=== 射撃 ===");
        println!("射撃数: {}", self.shots.len());
        for shot in &self.shots {
            let layers: Vec<String> = shot
                .layers
                .iter()
                .map(|l| format!("{} {:.1}cm", l.label(), l.thickness_cm))
                .collect();
            println!(
                "  {}: {}{} -> [{}]",
                shot.id,
                shot.bullet,
                if shot.legacy { " (legacy)" } else { "" },
                layers.join(", ")
            );
        }
    }
}

/// シナリオ読み込みエラー
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("シナリオファイルが見つかりません: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("ファイル読み込みエラー {}: {}", .0.display(), .1)]
    IoError(PathBuf, #[source] std::io::Error),
    #[error("YAML解析エラー {}: {}", .0.display(), .1)]
    ParseError(PathBuf, #[source] serde_yaml::Error),
    #[error("設定検証エラー: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = r#"
meta:
  version: "1.0"
  name: basic
  description: rifle against a wall
sim:
  worker_threads: 2
materials:
  - name: ArmorPlate
    surface_type: Steel
    density: 7.85
    youngs_modulus: 200.0
    poissons_ratio: 0.29
    ultimate_tensile_strength: 900.0
    simple:
      penetration_resistance: 4.0
      energy_loss_per_cm: 1200.0
      energy_required_to_penetrate: 800.0
bullets:
  - id: heavy
    mass_kg: 0.012
    radius_m: 0.004
    length_m: 0.03
    penetration_value: 2.5
    muzzle_velocity_mps: 800.0
    material: Copper
shots:
  - id: wall
    bullet: 5.56x45
    velocity_mps: { x: 940.0, y: 0.0, z: 0.0 }
    layers:
      - { material: Drywall, thickness_cm: 1.2 }
      - { material: Softwood, thickness_cm: 4.0 }
  - id: legacy-glass
    bullet: heavy
    legacy: true
    layers:
      - { surface: Glass, thickness_cm: 0.6 }
"#;

    fn replace(pattern: &str, with: &str) -> String {
        BASIC.replacen(pattern, with, 1)
    }

    fn validation_message(yaml: &str) -> String {
        match ScenarioConfig::from_yaml_str(yaml) {
            Err(ScenarioError::ValidationError(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other.map(|c| c.meta.name)),
        }
    }

    #[test]
    fn test_parse_basic_scenario() {
        let config = ScenarioConfig::from_yaml_str(BASIC).expect("parse");
        assert_eq!(config.sim.worker_threads, Some(2));
        assert_eq!(config.shots.len(), 2);
        assert!(config.shots[1].legacy);
        assert_eq!(config.shots[1].multiplier, 1.0);
        assert_eq!(config.shots[1].layers[0].surface, Some(SurfaceType::Glass));

        let registry = config.material_registry();
        assert_eq!(registry.by_surface(SurfaceType::Steel).map(|m| m.name.as_str()), Some("ArmorPlate"));

        let bullets = config.bullet_table(&registry).expect("bullets");
        assert_eq!(bullets["heavy"].physical_material.name, "Copper");
        assert!(bullets.contains_key("7.62x51"));
    }

    #[test]
    fn test_unknown_bullet_rejected() {
        let msg = validation_message(&replace("bullet: 5.56x45", "bullet: 50bmg"));
        assert!(msg.contains("unknown bullet"));
    }

    #[test]
    fn test_layer_needs_exactly_one_target() {
        let both = replace("{ material: Drywall, thickness_cm: 1.2 }", "{ material: Drywall, surface: Drywall, thickness_cm: 1.2 }");
        assert!(validation_message(&both).contains("not both"));

        let neither = replace("{ material: Drywall, thickness_cm: 1.2 }", "{ thickness_cm: 1.2 }");
        assert!(validation_message(&neither).contains("required"));
    }

    #[test]
    fn test_legacy_shot_requires_surface() {
        let msg = validation_message(&replace("{ surface: Glass, thickness_cm: 0.6 }", "{ material: Glass, thickness_cm: 0.6 }"));
        assert!(msg.contains("legacy"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(validation_message(&replace("thickness_cm: 4.0", "thickness_cm: -4.0")).contains("thickness"));
        assert!(validation_message(&replace("mass_kg: 0.012", "mass_kg: 0.0")).contains("mass"));
        assert!(validation_message(&replace("id: legacy-glass", "id: wall")).contains("Duplicate"));
        assert!(validation_message(&replace("material: Softwood", "material: Balsa")).contains("unknown material"));
        assert!(validation_message(&replace("worker_threads: 2", "worker_threads: 0")).contains("worker_threads"));
    }

    #[test]
    fn test_multiplier_must_be_positive() {
        let yaml = replace("    legacy: true\n", "    legacy: true\n    multiplier: -1.0\n");
        assert!(validation_message(&yaml).contains("multiplier"));
    }

    #[test]
    fn test_bundled_scenarios_are_valid() {
        for path in ["scenarios/rifle_walls.yaml", "scenarios/legacy_surfaces.yaml"] {
            let config = ScenarioConfig::from_file(path).unwrap_or_else(|e| panic!("{}: {}", path, e));
            assert!(!config.shots.is_empty());
        }
    }

    #[test]
    fn test_missing_file_and_bad_yaml() {
        assert!(matches!(
            ScenarioConfig::from_file("does/not/exist.yaml"),
            Err(ScenarioError::FileNotFound(_))
        ));
        assert!(matches!(
            ScenarioConfig::from_yaml_str("meta: [unterminated"),
            Err(ScenarioError::ParseError(_, _))
        ));
    }
}
