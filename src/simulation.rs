//! # Simulation モジュール
//!
//! シナリオに定義された射撃を貫通計算器で解決するシミュレーションエンジンを提供します。
//!
//! 各射撃は標的層を順に通過し、ある層の出射速度が次の層の入射速度になります。
//! 弾丸が停止した層で射撃は終了します。射撃同士は独立しているため、
//! tokio のマルチスレッドランタイム上で1射撃1タスクとして並列に解決し、
//! 結果はシナリオの定義順に並べます。
//!
//! ## 使用例
//!
//! ```rust,no_run
//! use tbsim::scenario::ScenarioConfig;
//! use tbsim::simulation::SimulationEngine;
//!
//! let config = ScenarioConfig::from_file("scenarios/rifle_walls.yaml")?;
//! let mut engine = SimulationEngine::new(config, 1);
//! engine.initialize()?;
//! let report = engine.run()?;
//! report.print_summary();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::models::*;
use crate::scenario::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// シミュレーション実行エラー
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error("射撃 {shot} の貫通計算に失敗: {source}")]
    Penetration {
        shot: String,
        #[source]
        source: PenetrationError,
    },
    #[error("未定義の弾丸: {0}")]
    UnknownBullet(String),
    #[error("未定義の材質: {0}")]
    UnknownMaterial(String),
    #[error("シミュレーションエンジンが初期化されていません")]
    NotInitialized,
    #[error("ランタイム構築エラー: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("タスク実行エラー: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("レポート変換エラー: {0}")]
    Report(#[from] serde_yaml::Error),
    #[error("レポート書き込みエラー {}: {}", .0.display(), .1)]
    ReportIo(PathBuf, #[source] std::io::Error),
}

/// 1層分の計算結果
#[derive(Debug, Clone, Serialize)]
pub struct LayerRecord {
    pub material: String,
    pub thickness_cm: f64,
    pub impact_speed_mps: f64,
    pub exit_speed_mps: f64,
    pub energy_delta_j: f64,
    pub depth_cm: f64,
    pub stopped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_yielded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_pressure_mpa: Option<f64>,
}

/// 1射撃分の結果
#[derive(Debug, Clone, Serialize)]
pub struct ShotReport {
    pub id: String,
    pub bullet: String,
    pub legacy: bool,
    pub impact_speed_mps: f64,
    pub layers: Vec<LayerRecord>,
    /// 停止した層の番号（貫通した場合は None）
    pub stopped_in: Option<usize>,
    pub residual_velocity: Velocity3D,
    pub total_energy_delta: f64,
}

/// シミュレーション全体の結果
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub scenario: String,
    pub shots: Vec<ShotReport>,
}

impl SimulationReport {
    pub fn to_yaml(&self) -> Result<String, SimulationError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// YAML形式でファイルに保存
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SimulationError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_yaml()?).map_err(|e| SimulationError::ReportIo(path.to_path_buf(), e))
    }

    pub fn print_summary(&self) {
        println!("=== シミュレーション結果: {} ===", self.scenario);
        for shot in &self.shots {
            let outcome = match shot.stopped_in {
                Some(index) => format!("層{}で停止", index),
                None => format!("貫通 (残速 {:.1}m/s)", shot.residual_velocity.magnitude()),
            };
            println!(
                "{} [{}{}] 入射 {:.1}m/s: {} / 損失 {:.1}J",
                shot.id,
                shot.bullet,
                if shot.legacy { ", legacy" } else { "" },
                shot.impact_speed_mps,
                outcome,
                shot.total_energy_delta
            );
            for (index, layer) in shot.layers.iter().enumerate() {
                println!(
                    "  {:>2}: {:<14} {:>6.2}cm  v0 {:>7.1} -> v1 {:>7.1} m/s  dE {:>8.2}J{}",
                    index,
                    layer.material,
                    layer.thickness_cm,
                    layer.impact_speed_mps,
                    layer.exit_speed_mps,
                    layer.energy_delta_j,
                    if layer.contact_yielded == Some(true) { "  (降伏)" } else { "" }
                );
            }
        }
    }
}

/// 層の標的
#[derive(Debug, Clone)]
enum LayerTarget {
    /// 材質を直接指定（現行経路）
    Material(PhysMatProperties),
    /// 被弾面種別で指定（レガシー経路）
    Surface(SurfaceType),
}

#[derive(Debug, Clone)]
struct LayerPlan {
    label: String,
    target: LayerTarget,
    thickness: f64,
}

/// 実行用に解決済みの射撃
#[derive(Debug, Clone)]
struct ShotPlan {
    id: String,
    bullet: BulletPointer,
    legacy: bool,
    velocity: Velocity3D,
    hit: HitResult,
    params: PenetrationParams,
    layers: Vec<LayerPlan>,
}

pub struct SimulationEngine {
    pub scenario_config: ScenarioConfig,
    pub verbose_level: u8,

    calculator: Option<Arc<PenetrationCalculator>>,
    bullets: HashMap<String, BulletPointer>,
}

impl SimulationEngine {
    pub fn new(scenario: ScenarioConfig, verbose_level: u8) -> Self {
        Self {
            scenario_config: scenario,
            verbose_level,
            calculator: None,
            bullets: HashMap::new(),
        }
    }

    /// 材質レジストリと弾丸テーブルを構築
    pub fn initialize(&mut self) -> Result<(), SimulationError> {
        if self.verbose_level > 0 {
            info!("シミュレーションエンジンを初期化中...");
        }

        let registry = self.scenario_config.material_registry();
        self.bullets = self.scenario_config.bullet_table(&registry)?;

        if self.verbose_level > 0 {
            info!("初期化完了:");
            info!("  材質: {}種", registry.len());
            info!("  弾丸: {}種", self.bullets.len());
            info!("  射撃: {}発", self.scenario_config.shots.len());
        }
        for material in registry.iter() {
            debug!(
                "材質登録: {} ({:?}, 密度 {:.2}g/cm3)",
                material.name, material.surface_type, material.density
            );
        }

        self.calculator = Some(Arc::new(PenetrationCalculator::new(registry)));
        Ok(())
    }

    /// 全射撃を解決
    pub fn run(&self) -> Result<SimulationReport, SimulationError> {
        let calculator = self.calculator.clone().ok_or(SimulationError::NotInitialized)?;
        let plans = self
            .scenario_config
            .shots
            .iter()
            .map(|shot| self.plan_shot(shot, calculator.registry()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = tokio::runtime::Builder::new_multi_thread();
        if let Some(threads) = self.scenario_config.sim.worker_threads {
            builder.worker_threads(threads);
        }
        let runtime = builder.build().map_err(SimulationError::Runtime)?;

        info!("=== シミュレーション実行開始 ===");

        let shots = runtime.block_on(async {
            let handles: Vec<_> = plans
                .into_iter()
                .map(|plan| {
                    let calculator = Arc::clone(&calculator);
                    tokio::task::spawn_blocking(move || resolve_shot(calculator.as_ref(), &plan))
                })
                .collect();

            let mut shots = Vec::with_capacity(handles.len());
            for handle in handles {
                shots.push(handle.await??);
            }
            Ok::<_, SimulationError>(shots)
        })?;

        info!("=== シミュレーション完了 ===");
        info!(
            "射撃数: {} (停止: {})",
            shots.len(),
            shots.iter().filter(|s| s.stopped_in.is_some()).count()
        );

        Ok(SimulationReport {
            scenario: self.scenario_config.meta.name.clone(),
            shots,
        })
    }

    fn plan_shot(&self, shot: &ShotConfig, registry: &MaterialRegistry) -> Result<ShotPlan, SimulationError> {
        let bullet = self
            .bullets
            .get(&shot.bullet)
            .cloned()
            .ok_or_else(|| SimulationError::UnknownBullet(shot.bullet.clone()))?;

        let normal = shot.normal.to_normal();
        let velocity = match &shot.velocity_mps {
            Some(v) => v.to_velocity(),
            None => Velocity3D::new(-normal.x(), -normal.y(), -normal.z()) * bullet.muzzle_velocity,
        };

        let mut layers = Vec::with_capacity(shot.layers.len());
        for layer in &shot.layers {
            let target = match (&layer.material, layer.surface) {
                (Some(name), _) => LayerTarget::Material(
                    registry
                        .by_name(name)
                        .cloned()
                        .ok_or_else(|| SimulationError::UnknownMaterial(name.clone()))?,
                ),
                (None, Some(surface)) if shot.legacy => LayerTarget::Surface(surface),
                (None, Some(surface)) => LayerTarget::Material(
                    registry
                        .by_surface(surface)
                        .cloned()
                        .ok_or_else(|| SimulationError::UnknownMaterial(format!("{:?}", surface)))?,
                ),
                (None, None) => return Err(SimulationError::UnknownMaterial(layer.label())),
            };
            layers.push(LayerPlan {
                label: layer.label(),
                target,
                thickness: layer.thickness_cm,
            });
        }

        Ok(ShotPlan {
            id: shot.id.clone(),
            bullet,
            legacy: shot.legacy,
            velocity,
            hit: HitResult::new(Position3D::default(), normal),
            params: PenetrationParams::with_multiplier(shot.multiplier).debug(shot.debug),
            layers,
        })
    }
}

/// 1射撃を標的層の順に解決
fn resolve_shot(calculator: &PenetrationCalculator, plan: &ShotPlan) -> Result<ShotReport, SimulationError> {
    let legacy_properties = ProjectilePhysicalProperties::from(plan.bullet.as_ref());
    let mut velocity = plan.velocity;
    let mut hit = plan.hit;
    let mut records = Vec::with_capacity(plan.layers.len());
    let mut stopped_in = None;
    let mut total_energy_delta = 0.0;

    for (index, layer) in plan.layers.iter().enumerate() {
        let result = match &layer.target {
            LayerTarget::Material(material) => {
                calculator.penetrate(&hit, &plan.bullet, velocity, layer.thickness, material, plan.params)
            }
            LayerTarget::Surface(surface) => calculator.penetrate_legacy(
                &hit,
                &legacy_properties,
                velocity,
                layer.thickness,
                *surface,
                &plan.bullet.physical_material,
                plan.params,
            ),
        }
        .map_err(|source| SimulationError::Penetration { shot: plan.id.clone(), source })?;

        let impact_speed = velocity.magnitude();
        let exit_speed = result.exit_velocity.magnitude();
        debug!(
            shot_id = %plan.id,
            layer = index,
            material = %layer.label,
            impact_speed = impact_speed,
            exit_speed = exit_speed,
            energy_delta = result.energy_delta,
            stopped = result.is_zero,
            "SHOT_LAYER_RESULT: 層の貫通計算が完了しました"
        );

        records.push(LayerRecord {
            material: layer.label.clone(),
            thickness_cm: layer.thickness,
            impact_speed_mps: impact_speed,
            exit_speed_mps: exit_speed,
            energy_delta_j: result.energy_delta,
            depth_cm: result.depth,
            stopped: result.is_zero,
            contact_yielded: result.contact.map(|c| c.yielded),
            peak_pressure_mpa: result.contact.map(|c| c.peak_pressure / 1.0e6),
        });
        total_energy_delta += result.energy_delta;

        if result.is_zero {
            stopped_in = Some(index);
            velocity = Velocity3D::ZERO;
            break;
        }
        hit = hit.advanced(&velocity, layer.thickness);
        velocity = result.exit_velocity;
    }

    if stopped_in.is_none() && !plan.layers.is_empty() && velocity.magnitude() >= plan.velocity.magnitude() {
        warn!(shot_id = %plan.id, "SHOT_NO_SLOWDOWN: 全層で減速がありませんでした");
    }

    Ok(ShotReport {
        id: plan.id.clone(),
        bullet: plan.bullet.name.clone(),
        legacy: plan.legacy,
        impact_speed_mps: plan.velocity.magnitude(),
        layers: records,
        stopped_in,
        residual_velocity: velocity,
        total_energy_delta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"
meta:
  version: "1.0"
  name: layered
sim:
  worker_threads: 2
shots:
  - id: drywall-then-steel
    bullet: 5.56x45
    layers:
      - { material: Drywall, thickness_cm: 1.2 }
      - { material: Steel, thickness_cm: 5.0 }
      - { material: Drywall, thickness_cm: 1.2 }
  - id: two-walls
    bullet: 7.62x51
    velocity_mps: { x: 850.0, y: 0.0, z: 0.0 }
    layers:
      - { material: Drywall, thickness_cm: 1.2 }
      - { surface: Softwood, thickness_cm: 4.0 }
  - id: legacy-glass
    bullet: 9x19
    legacy: true
    layers:
      - { surface: Glass, thickness_cm: 0.5 }
"#;

    fn run_scenario(yaml: &str) -> SimulationReport {
        let config = ScenarioConfig::from_yaml_str(yaml).expect("scenario");
        let mut engine = SimulationEngine::new(config, 0);
        engine.initialize().expect("initialize");
        engine.run().expect("run")
    }

    #[test]
    fn test_run_requires_initialize() {
        let config = ScenarioConfig::from_yaml_str(SCENARIO).expect("scenario");
        let engine = SimulationEngine::new(config, 0);
        assert!(matches!(engine.run(), Err(SimulationError::NotInitialized)));
    }

    #[test]
    fn test_shot_stops_in_first_zeroing_layer() {
        let report = run_scenario(SCENARIO);
        let shot = &report.shots[0];
        assert_eq!(shot.stopped_in, Some(1));
        assert_eq!(shot.layers.len(), 2);
        assert!(!shot.layers[0].stopped);
        assert!(shot.layers[1].stopped);
        assert_eq!(shot.residual_velocity, Velocity3D::ZERO);
        assert!((shot.total_energy_delta - shot.layers[0].energy_delta_j - shot.layers[1].energy_delta_j).abs() < 1e-9);
    }

    #[test]
    fn test_exit_velocity_feeds_next_layer() {
        let report = run_scenario(SCENARIO);
        let shot = &report.shots[1];
        assert_eq!(shot.stopped_in, None);
        assert_eq!(shot.layers[1].impact_speed_mps, shot.layers[0].exit_speed_mps);
        assert!(shot.residual_velocity.magnitude() < 850.0);
        assert_eq!(shot.layers[1].material, "Softwood");
    }

    #[test]
    fn test_default_velocity_uses_muzzle_velocity() {
        let report = run_scenario(SCENARIO);
        assert!((report.shots[0].impact_speed_mps - 940.0).abs() < 1e-9);
        assert!((report.shots[2].impact_speed_mps - 360.0).abs() < 1e-9);
    }

    #[test]
    fn test_results_keep_scenario_order() {
        let report = run_scenario(SCENARIO);
        let ids: Vec<&str> = report.shots.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["drywall-then-steel", "two-walls", "legacy-glass"]);
        assert!(report.shots[2].legacy);
    }

    #[test]
    fn test_material_without_resistance_data_stops_round() {
        let yaml = r#"
meta:
  version: "1.0"
  name: undefined-material
materials:
  - name: Foam
    surface_type: Plastic
    density: 0.05
shots:
  - id: foam-block
    bullet: 5.56x45
    layers:
      - { material: Foam, thickness_cm: 10.0 }
      - { material: Drywall, thickness_cm: 1.0 }
"#;
        let report = run_scenario(yaml);
        let shot = &report.shots[0];
        assert_eq!(shot.stopped_in, Some(0));
        assert_eq!(shot.layers.len(), 1);
        assert_eq!(shot.layers[0].depth_cm, 10.0);
        assert_eq!(shot.layers[0].exit_speed_mps, 0.0);
        assert!((shot.total_energy_delta - 1767.2).abs() < 1e-9);
    }

    #[test]
    fn test_report_serializes_to_yaml() {
        let report = run_scenario(SCENARIO);
        let yaml = report.to_yaml().expect("yaml");
        assert!(yaml.contains("scenario: layered"));
        assert!(yaml.contains("id: two-walls"));
        assert!(yaml.contains("stopped_in: 1"));
    }
}
