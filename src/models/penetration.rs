use crate::models::common::*;
use crate::models::contact::{analyze_contact, ContactAnalysis};
use crate::models::hit::HitResult;
use crate::models::material::{MaterialRegistry, PenetrationRequirement, PhysMatProperties, SurfaceType};
use crate::models::projectile::{BulletPointer, LegacyProjectile, ProjectilePhysicalProperties};
use crate::models::traits::{IPenetrationCalculator, IProjectile};
use thiserror::Error;
use tracing::{info, trace, warn};

/// 入射角0度での面平行成分の保持率
const DEFLECTION_RETENTION_HEAD_ON: f64 = 0.95;
/// 入射角90度での面平行成分の保持率
const DEFLECTION_RETENTION_GRAZING: f64 = 0.85;
/// 密度比補正の下限・上限
const DENSITY_FACTOR_MIN: f64 = 0.5;
const DENSITY_FACTOR_MAX: f64 = 1.5;

/// 貫通計算の入力エラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PenetrationError {
    #[error("不正な入力: {0}")]
    InvalidInput(String),
}

/// 貫通計算のパラメータ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenetrationParams {
    /// 貫通倍率（1.0で等倍）
    pub multiplier: f64,
    /// 計算結果を info レベルで出力する
    pub debug_print: bool,
}

impl Default for PenetrationParams {
    fn default() -> Self {
        Self { multiplier: 1.0, debug_print: false }
    }
}

impl PenetrationParams {
    pub fn with_multiplier(multiplier: f64) -> Self {
        Self { multiplier, ..Self::default() }
    }

    pub fn debug(mut self, debug_print: bool) -> Self {
        self.debug_print = debug_print;
        self
    }
}

/// 貫通計算の結果
#[derive(Debug, Clone, PartialEq)]
pub struct PenetrationResult {
    /// 出射速度（完全停止時はゼロベクトル）
    pub exit_velocity: Velocity3D,
    /// 完全停止したかどうか
    pub is_zero: bool,
    /// 失われた運動エネルギー（J）
    pub energy_delta: f64,
    /// 貫通深さ（cm）
    pub depth: f64,
    pub contact: Option<ContactAnalysis>,
}

impl PenetrationResult {
    fn full_stop(thickness: f64, energy_delta: f64, contact: Option<ContactAnalysis>) -> Self {
        Self {
            exit_velocity: Velocity3D::ZERO,
            is_zero: true,
            energy_delta,
            depth: thickness,
            contact,
        }
    }

    fn pass_through(impact_velocity: Velocity3D) -> Self {
        Self {
            exit_velocity: impact_velocity,
            is_zero: false,
            energy_delta: 0.0,
            depth: 0.0,
            contact: None,
        }
    }
}

/// 貫通計算器
///
/// 計算自体は純粋関数で、保持するのはレガシー経路で使う材質レジストリのみです。
#[derive(Debug, Clone, Default)]
pub struct PenetrationCalculator {
    registry: MaterialRegistry,
}

impl PenetrationCalculator {
    pub fn new(registry: MaterialRegistry) -> Self {
        Self { registry }
    }

    pub fn with_defaults() -> Self {
        Self::new(MaterialRegistry::with_defaults())
    }

    pub fn registry(&self) -> &MaterialRegistry {
        &self.registry
    }
}

impl IPenetrationCalculator for PenetrationCalculator {
    fn penetrate(
        &self,
        hit: &HitResult,
        bullet: &BulletPointer,
        impact_velocity: Velocity3D,
        thickness: f64,
        material: &PhysMatProperties,
        params: PenetrationParams,
    ) -> Result<PenetrationResult, PenetrationError> {
        calculate_exit_velocity(hit, bullet.as_ref(), impact_velocity, thickness, Some(material), params)
    }

    fn penetrate_legacy(
        &self,
        hit: &HitResult,
        projectile: &ProjectilePhysicalProperties,
        impact_velocity: Velocity3D,
        thickness: f64,
        surface_type: SurfaceType,
        projectile_material: &PhysMatProperties,
        params: PenetrationParams,
    ) -> Result<PenetrationResult, PenetrationError> {
        let legacy = LegacyProjectile::new(projectile, projectile_material);
        let target = self.registry.by_surface(surface_type);
        if target.is_none() {
            warn!(
                surface_type = ?surface_type,
                "PENETRATION_UNKNOWN_SURFACE: 被弾面に対応する材質が登録されていません"
            );
        }
        calculate_exit_velocity(hit, &legacy, impact_velocity, thickness, target, params)
    }
}

/// 貫通後の出射速度を計算
///
/// # 引数
///
/// * `hit` - 被弾判定結果（偏向計算に法線を使用）
/// * `projectile` - 弾体
/// * `impact_velocity` - 入射速度（m/s）
/// * `thickness` - 貫通厚さ（cm）
/// * `target` - 標的材質（未定義なら `None`）
/// * `params` - 倍率とデバッグ出力設定
///
/// # 戻り値
///
/// 出射速度・停止フラグ・エネルギー損失・貫通深さ
pub fn calculate_exit_velocity<P: IProjectile + ?Sized>(
    hit: &HitResult,
    projectile: &P,
    impact_velocity: Velocity3D,
    thickness: f64,
    target: Option<&PhysMatProperties>,
    params: PenetrationParams,
) -> Result<PenetrationResult, PenetrationError> {
    validate_inputs(projectile, impact_velocity, thickness, &params)?;

    let speed = impact_velocity.magnitude();
    if speed <= 0.0 {
        let result = PenetrationResult::full_stop(thickness, 0.0, None);
        report(&params, target, projectile, speed, thickness, &result);
        return Ok(result);
    }
    if thickness == 0.0 {
        let result = PenetrationResult::pass_through(impact_velocity);
        report(&params, target, projectile, speed, thickness, &result);
        return Ok(result);
    }

    let kinetic_energy = projectile.kinetic_energy(speed);

    let material = match target.filter(|m| m.has_penetration_data()) {
        Some(material) => material,
        None => {
            warn!(
                projectile = %projectile.get_name(),
                material = target.map(|m| m.name.as_str()).unwrap_or("<undefined>"),
                "PENETRATION_UNDEFINED_MATERIAL: 貫通データ未定義のため完全停止として扱います"
            );
            let result = PenetrationResult::full_stop(thickness, kinetic_energy, None);
            report(&params, target, projectile, speed, thickness, &result);
            return Ok(result);
        }
    };

    let contact = analyze_contact(projectile, speed, material);

    let result = match requirement_ratio(projectile, kinetic_energy, material, params.multiplier) {
        Some(ratio) => {
            let energy_loss = thickness * (material.simple.energy_loss_per_cm / ratio)
                / params.multiplier
                * material.penetration_resistance_multiplier
                * density_factor(projectile.physical_material(), material);

            if energy_loss >= kinetic_energy {
                PenetrationResult::full_stop(thickness, kinetic_energy, contact)
            } else {
                let new_speed =
                    math_utils::speed_from_kinetic_energy(kinetic_energy - energy_loss, projectile.mass());
                let exit_velocity = deflect(hit, impact_velocity, new_speed);
                let exit_speed = exit_velocity.magnitude();

                if exit_speed <= 0.0 || exit_speed >= speed {
                    PenetrationResult::full_stop(thickness, kinetic_energy, contact)
                } else {
                    PenetrationResult {
                        exit_velocity,
                        is_zero: false,
                        energy_delta: kinetic_energy - projectile.kinetic_energy(exit_speed),
                        depth: thickness,
                        contact,
                    }
                }
            }
        }
        None => PenetrationResult::full_stop(thickness, kinetic_energy, contact),
    };

    report(&params, Some(material), projectile, speed, thickness, &result);
    Ok(result)
}

fn validate_inputs<P: IProjectile + ?Sized>(
    projectile: &P,
    impact_velocity: Velocity3D,
    thickness: f64,
    params: &PenetrationParams,
) -> Result<(), PenetrationError> {
    if !impact_velocity.is_finite() {
        return Err(PenetrationError::InvalidInput(format!(
            "入射速度が有限値ではありません: ({}, {}, {})",
            impact_velocity.x, impact_velocity.y, impact_velocity.z
        )));
    }
    if !thickness.is_finite() || thickness < 0.0 {
        return Err(PenetrationError::InvalidInput(format!("貫通厚さが不正です: {}", thickness)));
    }
    if !params.multiplier.is_finite() || params.multiplier <= 0.0 {
        return Err(PenetrationError::InvalidInput(format!(
            "貫通倍率は正の有限値である必要があります: {}",
            params.multiplier
        )));
    }
    let mass = projectile.mass();
    if !mass.is_finite() || mass <= 0.0 {
        return Err(PenetrationError::InvalidInput(format!("弾体質量が不正です: {}", mass)));
    }
    Ok(())
}

/// 貫通要件を満たしていれば要件比率を返す
///
/// 比率は弾体が閾値をどれだけ上回っているかを表し、`Both` では両比率の平均です。
fn requirement_ratio<P: IProjectile + ?Sized>(
    projectile: &P,
    kinetic_energy: f64,
    material: &PhysMatProperties,
    multiplier: f64,
) -> Option<f64> {
    let simple = &material.simple;
    let resistance = simple.penetration_resistance?;
    let required = simple.energy_required_to_penetrate;

    let meets = |value: f64, threshold: f64| {
        math_utils::is_nearly_equal(value, threshold) || value > threshold
    };
    let penetration_met = meets(projectile.penetration_value() * multiplier, resistance);
    let energy_met = meets(kinetic_energy * multiplier, required);

    let penetration_ratio = projectile.penetration_value() / resistance;
    let energy_ratio = kinetic_energy / required;

    let ratio = match simple.requirement {
        PenetrationRequirement::PenetrationResistanceThreshold => {
            penetration_met.then_some(penetration_ratio)
        }
        PenetrationRequirement::EnergyThreshold => energy_met.then_some(energy_ratio),
        PenetrationRequirement::Both => {
            (penetration_met && energy_met).then_some((penetration_ratio + energy_ratio) / 2.0)
        }
    };
    ratio.filter(|r| r.is_finite() && *r > 0.0)
}

/// 標的と弾体の密度比による損失補正
fn density_factor(projectile: &PhysMatProperties, target: &PhysMatProperties) -> f64 {
    if projectile.density > 0.0 && target.density > 0.0 {
        (target.density / projectile.density)
            .sqrt()
            .clamp(DENSITY_FACTOR_MIN, DENSITY_FACTOR_MAX)
    } else {
        1.0
    }
}

/// 減速後の速度に面平行成分の偏向を適用
fn deflect(hit: &HitResult, impact_velocity: Velocity3D, new_speed: f64) -> Velocity3D {
    let new_velocity = impact_velocity.normalize() * new_speed;
    let perpendicular = new_velocity.project_onto(&hit.impact_normal);
    let parallel = new_velocity - perpendicular;

    let angle = math_utils::impact_angle(&hit.normal, &impact_velocity);
    let angle_deg = math_utils::rad_to_deg(math_utils::normalize_angle_to_plus_minus_90_rad(angle)).abs();
    let retention = math_utils::map_range_clamped(
        0.0,
        90.0,
        DEFLECTION_RETENTION_HEAD_ON,
        DEFLECTION_RETENTION_GRAZING,
        angle_deg,
    );

    parallel * retention + perpendicular
}

fn report<P: IProjectile + ?Sized>(
    params: &PenetrationParams,
    material: Option<&PhysMatProperties>,
    projectile: &P,
    speed: f64,
    thickness: f64,
    result: &PenetrationResult,
) {
    let material_name = material.map(|m| m.name.as_str()).unwrap_or("<undefined>");
    let exit_speed = result.exit_velocity.magnitude();
    if params.debug_print {
        info!(
            projectile = %projectile.get_name(),
            material = material_name,
            is_zero = result.is_zero,
            "PENETRATION_RESULT: v0: {:.3} | v1: {:.3} | dV: {:.3} | dE: {:.3} | l: {:.3} | pd: {:.3}",
            speed,
            exit_speed,
            speed - exit_speed,
            result.energy_delta,
            thickness,
            result.depth
        );
    } else {
        trace!(
            projectile = %projectile.get_name(),
            material = material_name,
            is_zero = result.is_zero,
            v0 = speed,
            v1 = exit_speed,
            energy_delta = result.energy_delta,
            thickness = thickness,
            depth = result.depth,
            "PENETRATION_RESULT"
        );
    }
}
