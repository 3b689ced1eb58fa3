use crate::models::common::math_utils;
use crate::models::criteria::VonMises;
use crate::models::material::PhysMatProperties;
use crate::models::tensor::Tensor3x3;
use crate::models::traits::IProjectile;

/// Hertz接触による衝突点の応力評価結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactAnalysis {
    pub force: f64,              // N
    pub effective_modulus: f64,  // Pa
    pub indentation_depth: f64,  // m
    pub contact_radius: f64,     // m
    pub peak_pressure: f64,      // Pa
    /// 接触中心の応力（円柱座標 rr, tt, zz）
    pub stress: Tensor3x3,
    pub equivalent_stress: f64,  // Pa
    pub yielded: bool,
}

/// 弾頭を球とみなしたHertz接触で衝突点の応力を評価
///
/// 弾体材質の動圧を前面投影面積に掛けた力を接触荷重とし、
/// 接触中心の応力状態を von Mises 条件で標的の降伏強さと比較します。
///
/// # 戻り値
///
/// 速さ・半径・密度・弾性定数のいずれかが欠けている場合は `None`
pub fn analyze_contact<P: IProjectile + ?Sized>(
    projectile: &P,
    speed: f64,
    target: &PhysMatProperties,
) -> Option<ContactAnalysis> {
    let projectile_material = projectile.physical_material();
    let radius = projectile.radius();
    let e0 = projectile_material.youngs_modulus_pa();
    let e1 = target.youngs_modulus_pa();
    let nu0 = projectile_material.poissons_ratio;
    let nu1 = target.poissons_ratio;

    let positive = |v: f64| v.is_finite() && v > 0.0;
    if !(positive(speed) && positive(radius) && positive(e0) && positive(e1)) {
        return None;
    }

    let pressure = math_utils::dynamic_pressure(projectile_material.density_kg_m3(), speed);
    let force = pressure * projectile.frontal_area();
    if !positive(force) {
        return None;
    }

    let effective_modulus = e0 * e1 / (e0 * (1.0 - nu1.powi(2)) + e1 * (1.0 - nu0.powi(2)));
    let indentation_depth =
        (9.0 * force.powi(2) / (16.0 * effective_modulus.powi(2) * radius)).cbrt();
    let contact_radius = (radius * indentation_depth).sqrt();
    let peak_pressure = 3.0 * force / (2.0 * std::f64::consts::PI * contact_radius.powi(2));

    let radial = -peak_pressure * (1.0 + 2.0 * nu1) / 2.0;
    let stress = Tensor3x3::from_diagonal(radial, radial, -peak_pressure);
    let equivalent_stress = VonMises::equivalent_stress(&stress);

    Some(ContactAnalysis {
        force,
        effective_modulus,
        indentation_depth,
        contact_radius,
        peak_pressure,
        stress,
        equivalent_stress,
        yielded: VonMises::test_yield(&stress, target.yield_strength_pa()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::material::presets;
    use crate::models::projectile::Bullet;

    #[test]
    fn test_rifle_impact_yields_steel() {
        let bullet = Bullet::nato_556x45();
        let contact = analyze_contact(&bullet, 940.0, &presets::steel()).expect("contact");
        assert!(contact.force > 0.0);
        assert!(contact.contact_radius > 0.0 && contact.contact_radius < bullet.radius);
        assert!(contact.yielded);
    }

    #[test]
    fn test_contact_stress_uses_cylindrical_components() {
        let bullet = Bullet::nato_556x45();
        let target = presets::aluminum();
        let contact = analyze_contact(&bullet, 500.0, &target).expect("contact");
        let s = contact.stress;
        assert_eq!(s.zz(), -contact.peak_pressure);
        assert_eq!(s.rr(), s.tt());
        assert!((s.rr() + contact.peak_pressure * (1.0 + 2.0 * 0.33) / 2.0).abs() < 1e-3);
        assert_eq!(s.rt(), 0.0);
        assert_eq!(s.zr(), 0.0);
    }

    #[test]
    fn test_hertz_relations() {
        let bullet = Bullet::nato_762x51();
        let contact = analyze_contact(&bullet, 850.0, &presets::concrete()).expect("contact");
        // d = a^2 / R
        let depth = contact.contact_radius.powi(2) / bullet.radius;
        assert!((depth - contact.indentation_depth).abs() / depth < 1e-9);
        // a^3 = 3FR / 4E*
        let cubed = 3.0 * contact.force * bullet.radius / (4.0 * contact.effective_modulus);
        assert!((contact.contact_radius.powi(3) - cubed).abs() / cubed < 1e-9);
    }

    #[test]
    fn test_missing_data_gives_none() {
        let bullet = Bullet::nato_556x45();
        assert!(analyze_contact(&bullet, 0.0, &presets::steel()).is_none());

        let mut undefined = presets::steel();
        undefined.youngs_modulus = 0.0;
        assert!(analyze_contact(&bullet, 940.0, &undefined).is_none());
    }
}
