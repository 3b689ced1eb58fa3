use crate::models::material::{presets, PhysMatProperties};
use crate::models::traits::IProjectile;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;

/// レガシー経路で断面密度から貫通値を求める換算係数（kg/m^2）
pub const SECTIONAL_DENSITY_PER_PENETRATION_VALUE: f64 = 150.0;

/// 弾丸
#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    pub name: String,
    pub mass: f64,            // kg
    pub radius: f64,          // m
    pub length: f64,          // m
    pub penetration_value: f64,
    pub muzzle_velocity: f64, // m/s
    pub physical_material: PhysMatProperties,
}

/// 弾丸の共有ポインタ
pub type BulletPointer = Arc<Bullet>;

impl Bullet {
    pub fn new(
        name: String,
        mass: f64,
        radius: f64,
        length: f64,
        penetration_value: f64,
        muzzle_velocity: f64,
        physical_material: PhysMatProperties,
    ) -> Self {
        Self {
            name,
            mass,
            radius,
            length,
            penetration_value,
            muzzle_velocity,
            physical_material,
        }
    }

    pub fn into_pointer(self) -> BulletPointer {
        Arc::new(self)
    }

    /// 5.56x45mm 小銃弾
    pub fn nato_556x45() -> Self {
        Self::new("5.56x45".to_string(), 0.004, 0.00285, 0.023, 1.6, 940.0, presets::copper())
    }

    /// 7.62x51mm 小銃弾
    pub fn nato_762x51() -> Self {
        Self::new("7.62x51".to_string(), 0.0095, 0.00391, 0.0287, 2.2, 850.0, presets::copper())
    }

    /// 9x19mm 拳銃弾
    pub fn pistol_9x19() -> Self {
        Self::new("9x19".to_string(), 0.008, 0.0045, 0.0155, 0.9, 360.0, presets::lead())
    }
}

impl IProjectile for Bullet {
    fn get_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn mass(&self) -> f64 {
        self.mass
    }

    fn radius(&self) -> f64 {
        self.radius
    }

    fn length(&self) -> f64 {
        self.length
    }

    fn penetration_value(&self) -> f64 {
        self.penetration_value
    }

    fn physical_material(&self) -> &PhysMatProperties {
        &self.physical_material
    }
}

/// 弾体の物理特性（値渡し用）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectilePhysicalProperties {
    pub mass: f64,    // kg
    pub radius: f64,  // m
    pub length: f64,  // m
    pub density: f64, // g/cm^3
}

impl ProjectilePhysicalProperties {
    pub fn new(mass: f64, radius: f64, length: f64, density: f64) -> Self {
        Self { mass, radius, length, density }
    }
}

impl From<&Bullet> for ProjectilePhysicalProperties {
    fn from(bullet: &Bullet) -> Self {
        Self::new(bullet.mass, bullet.radius, bullet.length, bullet.physical_material.density)
    }
}

/// 物理特性と弾体材質を組にしたレガシー弾体
///
/// 貫通値は断面密度を [`SECTIONAL_DENSITY_PER_PENETRATION_VALUE`] で割って求めます。
#[derive(Debug, Clone, Copy)]
pub struct LegacyProjectile<'a> {
    properties: &'a ProjectilePhysicalProperties,
    material: &'a PhysMatProperties,
}

impl<'a> LegacyProjectile<'a> {
    pub fn new(properties: &'a ProjectilePhysicalProperties, material: &'a PhysMatProperties) -> Self {
        Self { properties, material }
    }
}

impl IProjectile for LegacyProjectile<'_> {
    fn get_name(&self) -> Cow<'_, str> {
        Cow::Owned(format!("legacy({})", self.material.name))
    }

    fn mass(&self) -> f64 {
        self.properties.mass
    }

    fn radius(&self) -> f64 {
        self.properties.radius
    }

    fn length(&self) -> f64 {
        self.properties.length
    }

    fn penetration_value(&self) -> f64 {
        self.sectional_density() / SECTIONAL_DENSITY_PER_PENETRATION_VALUE
    }

    fn physical_material(&self) -> &PhysMatProperties {
        self.material
    }
}
