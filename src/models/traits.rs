use crate::models::common::*;
use crate::models::hit::HitResult;
use crate::models::material::{PhysMatProperties, SurfaceType};
use crate::models::penetration::{PenetrationError, PenetrationParams, PenetrationResult};
use crate::models::projectile::{BulletPointer, ProjectilePhysicalProperties};
use std::borrow::Cow;

/// 貫通計算で扱う弾体のインターフェース
pub trait IProjectile {
    /// 弾体名の取得（保持している名前はそのまま借用）
    fn get_name(&self) -> Cow<'_, str>;

    /// 質量（kg）
    fn mass(&self) -> f64;

    /// 半径（m）
    fn radius(&self) -> f64;

    /// 全長（m）
    fn length(&self) -> f64;

    /// 貫通値（材質の貫通抵抗と比較される無次元量）
    fn penetration_value(&self) -> f64;

    /// 弾体材質の取得
    fn physical_material(&self) -> &PhysMatProperties;

    /// 前面投影面積（m^2）
    fn frontal_area(&self) -> f64 {
        std::f64::consts::PI * self.radius().powi(2)
    }

    /// 断面密度（kg/m^2）
    fn sectional_density(&self) -> f64 {
        let area = self.frontal_area();
        if area > 0.0 { self.mass() / area } else { 0.0 }
    }

    /// 指定速さでの運動エネルギー（J）
    fn kinetic_energy(&self, speed: f64) -> f64 {
        math_utils::kinetic_energy(self.mass(), speed)
    }
}

/// 貫通計算器のインターフェース
///
/// 現行の共有ポインタ版とレガシーの値渡し版の2つの呼び出し形を提供します。
pub trait IPenetrationCalculator {
    /// 弾丸（共有所有）で貫通計算
    ///
    /// # 引数
    ///
    /// * `hit` - 被弾判定結果
    /// * `bullet` - 弾丸
    /// * `impact_velocity` - 入射速度（m/s）
    /// * `thickness` - 貫通厚さ（cm）
    /// * `material` - 標的材質
    /// * `params` - 倍率とデバッグ出力設定
    fn penetrate(
        &self,
        hit: &HitResult,
        bullet: &BulletPointer,
        impact_velocity: Velocity3D,
        thickness: f64,
        material: &PhysMatProperties,
        params: PenetrationParams,
    ) -> Result<PenetrationResult, PenetrationError>;

    /// 物理特性（値渡し）で貫通計算
    ///
    /// 標的材質は `surface_type` から材質レジストリで解決されます。
    #[allow(clippy::too_many_arguments)]
    fn penetrate_legacy(
        &self,
        hit: &HitResult,
        projectile: &ProjectilePhysicalProperties,
        impact_velocity: Velocity3D,
        thickness: f64,
        surface_type: SurfaceType,
        projectile_material: &PhysMatProperties,
        params: PenetrationParams,
    ) -> Result<PenetrationResult, PenetrationError>;
}
