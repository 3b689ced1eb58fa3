use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 被弾面の種類
///
/// レガシー計算経路では、この値から [`MaterialRegistry`] を引いて材質を決定します。
/// `Default` には材質データが割り当てられません。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SurfaceType {
    #[default]
    Default,
    Steel,
    HardenedSteel,
    Aluminum,
    Hardwood,
    Softwood,
    Drywall,
    Concrete,
    Glass,
    Flesh,
    Bone,
    Plastic,
    Kevlar,
}

/// 貫通可否の判定基準
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PenetrationRequirement {
    /// 貫通値が貫通抵抗以上
    PenetrationResistanceThreshold,
    /// 運動エネルギーが必要エネルギー以上
    EnergyThreshold,
    /// 両方を満たす
    #[default]
    Both,
}

/// 簡易貫通モデルの材質パラメータ
///
/// 既定値は未定義（抵抗なし・損失0）で、貫通計算では完全停止として扱われます。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplePenetrationProperties {
    /// 貫通抵抗（未定義の場合は無限大として扱う）
    pub penetration_resistance: Option<f64>,
    /// 1cmあたりのエネルギー損失（J/cm）
    pub energy_loss_per_cm: f64,
    /// 貫通に必要なエネルギー（J）
    pub energy_required_to_penetrate: f64,
    pub requirement: PenetrationRequirement,
}

impl Default for SimplePenetrationProperties {
    fn default() -> Self {
        Self {
            penetration_resistance: None,
            energy_loss_per_cm: 0.0,
            energy_required_to_penetrate: 0.0,
            requirement: PenetrationRequirement::Both,
        }
    }
}

/// 物理材質の特性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysMatProperties {
    pub name: String,
    pub surface_type: SurfaceType,
    /// g/cm^3
    pub density: f64,
    /// GPa
    pub youngs_modulus: f64,
    pub poissons_ratio: f64,
    /// MPa
    pub ultimate_tensile_strength: f64,
    /// MPa（未指定なら引張強さから推定）
    pub yield_strength: Option<f64>,
    /// MPa
    pub compressive_strength: f64,
    /// MPa·m^0.5
    pub fracture_toughness: f64,
    pub penetration_resistance_multiplier: f64,
    pub simple: SimplePenetrationProperties,
}

impl Default for PhysMatProperties {
    fn default() -> Self {
        Self {
            name: String::new(),
            surface_type: SurfaceType::Default,
            density: 0.0,
            youngs_modulus: 0.0,
            poissons_ratio: 0.0,
            ultimate_tensile_strength: 0.0,
            yield_strength: None,
            compressive_strength: 0.0,
            fracture_toughness: 0.0,
            penetration_resistance_multiplier: 1.0,
            simple: SimplePenetrationProperties::default(),
        }
    }
}

impl PhysMatProperties {
    /// 降伏強さ（MPa）
    ///
    /// 明示されていない場合は、降伏点までの線形弾性を仮定して
    /// `UTS / (1 + ν/3)` で推定します。
    pub fn yield_strength_mpa(&self) -> f64 {
        match self.yield_strength {
            Some(value) if value > 0.0 => value,
            _ => self.ultimate_tensile_strength / (1.0 + self.poissons_ratio / 3.0),
        }
    }

    pub fn yield_strength_pa(&self) -> f64 {
        self.yield_strength_mpa() * 1.0e6
    }

    pub fn youngs_modulus_pa(&self) -> f64 {
        self.youngs_modulus * 1.0e9
    }

    pub fn density_kg_m3(&self) -> f64 {
        self.density * 1000.0
    }

    /// 貫通計算に必要なデータが揃っているか
    ///
    /// 貫通抵抗・エネルギー損失率・必要エネルギー・抵抗倍率のいずれかが
    /// 未定義、非正、または非有限の場合は false を返します。
    pub fn has_penetration_data(&self) -> bool {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        matches!(self.simple.penetration_resistance, Some(r) if positive(r))
            && positive(self.simple.energy_loss_per_cm)
            && positive(self.simple.energy_required_to_penetrate)
            && positive(self.penetration_resistance_multiplier)
    }
}

/// 材質レジストリ
///
/// 名前と被弾面種別の両方から材質を引けるテーブルです。
#[derive(Debug, Clone, Default)]
pub struct MaterialRegistry {
    materials: BTreeMap<String, PhysMatProperties>,
    surfaces: HashMap<SurfaceType, String>,
}

impl MaterialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 既定の材質をすべて登録したレジストリ
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for material in presets::all() {
            registry.insert(material);
        }
        registry
    }

    /// 材質を登録（同名・同種別の既存エントリは上書き）
    pub fn insert(&mut self, material: PhysMatProperties) {
        // 同名材質の旧い被弾面割り当ては外す
        self.surfaces.retain(|_, name| *name != material.name);
        if material.surface_type != SurfaceType::Default {
            self.surfaces.insert(material.surface_type, material.name.clone());
        }
        self.materials.insert(material.name.clone(), material);
    }

    pub fn by_name(&self, name: &str) -> Option<&PhysMatProperties> {
        self.materials.get(name)
    }

    pub fn by_surface(&self, surface_type: SurfaceType) -> Option<&PhysMatProperties> {
        self.surfaces
            .get(&surface_type)
            .and_then(|name| self.materials.get(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhysMatProperties> {
        self.materials.values()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

/// 既定材質
pub mod presets {
    use super::*;

    /// (密度, ヤング率, ポアソン比, 引張強さ, 圧縮強さ, 破壊靭性)
    type Mechanical = (f64, f64, f64, f64, f64, f64);

    fn preset(
        name: &str,
        surface_type: SurfaceType,
        mechanical: Mechanical,
        resistance: f64,
        energy_loss_per_cm: f64,
        energy_required_to_penetrate: f64,
        requirement: PenetrationRequirement,
    ) -> PhysMatProperties {
        let (density, youngs_modulus, poissons_ratio, uts, compressive, toughness) = mechanical;
        PhysMatProperties {
            name: name.to_string(),
            surface_type,
            density,
            youngs_modulus,
            poissons_ratio,
            ultimate_tensile_strength: uts,
            yield_strength: None,
            compressive_strength: compressive,
            fracture_toughness: toughness,
            penetration_resistance_multiplier: 1.0,
            simple: SimplePenetrationProperties {
                penetration_resistance: Some(resistance),
                energy_loss_per_cm,
                energy_required_to_penetrate,
                requirement,
            },
        }
    }

    use super::PenetrationRequirement::{Both, EnergyThreshold, PenetrationResistanceThreshold};

    pub fn steel() -> PhysMatProperties {
        preset("Steel", SurfaceType::Steel, (7.85, 200.0, 0.29, 400.0, 250.0, 50.0), 3.0, 900.0, 600.0, Both)
    }

    pub fn hardened_steel() -> PhysMatProperties {
        preset("HardenedSteel", SurfaceType::HardenedSteel, (7.85, 210.0, 0.29, 1500.0, 1500.0, 30.0), 6.0, 2500.0, 2000.0, Both)
    }

    pub fn aluminum() -> PhysMatProperties {
        preset("Aluminum", SurfaceType::Aluminum, (2.70, 69.0, 0.33, 310.0, 280.0, 29.0), 1.5, 350.0, 200.0, Both)
    }

    pub fn hardwood() -> PhysMatProperties {
        preset("Hardwood", SurfaceType::Hardwood, (0.75, 12.0, 0.30, 100.0, 50.0, 5.0), 0.3, 60.0, 20.0, Both)
    }

    pub fn softwood() -> PhysMatProperties {
        preset("Softwood", SurfaceType::Softwood, (0.50, 9.0, 0.30, 40.0, 30.0, 3.0), 0.2, 40.0, 10.0, Both)
    }

    pub fn drywall() -> PhysMatProperties {
        preset("Drywall", SurfaceType::Drywall, (0.70, 2.0, 0.20, 3.0, 5.0, 0.3), 0.1, 15.0, 5.0, EnergyThreshold)
    }

    pub fn concrete() -> PhysMatProperties {
        preset("Concrete", SurfaceType::Concrete, (2.40, 30.0, 0.20, 3.0, 30.0, 1.0), 2.0, 400.0, 150.0, Both)
    }

    pub fn glass() -> PhysMatProperties {
        preset("Glass", SurfaceType::Glass, (2.50, 70.0, 0.22, 50.0, 1000.0, 0.75), 0.5, 80.0, 30.0, PenetrationResistanceThreshold)
    }

    pub fn flesh() -> PhysMatProperties {
        preset("Flesh", SurfaceType::Flesh, (1.06, 0.0001, 0.45, 1.0, 1.0, 0.01), 0.05, 20.0, 2.0, EnergyThreshold)
    }

    pub fn bone() -> PhysMatProperties {
        preset("Bone", SurfaceType::Bone, (1.90, 17.0, 0.30, 130.0, 170.0, 4.0), 0.4, 120.0, 25.0, Both)
    }

    pub fn plastic() -> PhysMatProperties {
        preset("Plastic", SurfaceType::Plastic, (1.20, 2.5, 0.37, 50.0, 70.0, 2.0), 0.2, 50.0, 10.0, Both)
    }

    pub fn kevlar() -> PhysMatProperties {
        preset("Kevlar", SurfaceType::Kevlar, (1.44, 70.0, 0.36, 3600.0, 500.0, 20.0), 1.0, 500.0, 150.0, EnergyThreshold)
    }

    // 弾体用（被弾面種別なし）

    pub fn lead() -> PhysMatProperties {
        preset("Lead", SurfaceType::Default, (11.34, 16.0, 0.44, 18.0, 12.0, 1.0), 0.5, 200.0, 50.0, Both)
    }

    pub fn copper() -> PhysMatProperties {
        preset("Copper", SurfaceType::Default, (8.96, 117.0, 0.34, 210.0, 200.0, 60.0), 1.5, 600.0, 300.0, Both)
    }

    pub fn all() -> Vec<PhysMatProperties> {
        vec![
            steel(),
            hardened_steel(),
            aluminum(),
            hardwood(),
            softwood(),
            drywall(),
            concrete(),
            glass(),
            flesh(),
            bone(),
            plastic(),
            kevlar(),
            lead(),
            copper(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        let registry = MaterialRegistry::with_defaults();
        assert_eq!(registry.len(), 14);
        assert_eq!(registry.by_name("Steel").map(|m| m.surface_type), Some(SurfaceType::Steel));
        assert_eq!(registry.by_surface(SurfaceType::Glass).map(|m| m.name.as_str()), Some("Glass"));
        assert!(registry.by_surface(SurfaceType::Default).is_none());
        assert!(registry.by_name("Unobtainium").is_none());
    }

    #[test]
    fn test_registry_override_replaces_surface_mapping() {
        let mut registry = MaterialRegistry::with_defaults();
        let mut armor = presets::steel();
        armor.name = "ArmorPlate".to_string();
        registry.insert(armor);
        assert_eq!(registry.by_surface(SurfaceType::Steel).map(|m| m.name.as_str()), Some("ArmorPlate"));
        assert!(registry.by_name("Steel").is_some());
    }

    #[test]
    fn test_yield_strength_estimate() {
        let steel = presets::steel();
        let expected = 400.0 / (1.0 + 0.29 / 3.0);
        assert!((steel.yield_strength_mpa() - expected).abs() < 1e-9);

        let explicit = PhysMatProperties { yield_strength: Some(250.0), ..presets::steel() };
        assert_eq!(explicit.yield_strength_mpa(), 250.0);
    }

    #[test]
    fn test_penetration_data_check() {
        assert!(presets::all().iter().all(|m| m.has_penetration_data()));

        let mut undefined = presets::glass();
        undefined.simple.penetration_resistance = None;
        assert!(!undefined.has_penetration_data());

        let mut zero_loss = presets::glass();
        zero_loss.simple.energy_loss_per_cm = 0.0;
        assert!(!zero_loss.has_penetration_data());

        let mut infinite = presets::glass();
        infinite.simple.penetration_resistance = Some(f64::INFINITY);
        assert!(!infinite.has_penetration_data());
    }

    #[test]
    fn test_material_from_yaml_without_simple_data_is_undefined() {
        let yaml = "name: Foam\nsurface_type: Plastic\ndensity: 0.05\n";
        let foam: PhysMatProperties = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(foam.surface_type, SurfaceType::Plastic);
        assert_eq!(foam.simple.penetration_resistance, None);
        assert_eq!(foam.simple.energy_loss_per_cm, 0.0);
        assert_eq!(foam.penetration_resistance_multiplier, 1.0);
        assert!(!foam.has_penetration_data());

        let partial = "name: Foam\nsimple:\n  energy_loss_per_cm: 2.0\n";
        let foam: PhysMatProperties = serde_yaml::from_str(partial).expect("parse");
        assert_eq!(foam.simple.energy_loss_per_cm, 2.0);
        assert!(!foam.has_penetration_data());
    }

    #[test]
    fn test_reinsert_moves_surface_mapping() {
        let mut registry = MaterialRegistry::new();
        let mut armor = presets::steel();
        armor.name = "Armor".to_string();
        registry.insert(armor.clone());
        assert_eq!(registry.by_surface(SurfaceType::Steel).map(|m| m.name.as_str()), Some("Armor"));

        armor.surface_type = SurfaceType::Glass;
        registry.insert(armor.clone());
        assert!(registry.by_surface(SurfaceType::Steel).is_none());
        assert_eq!(registry.by_surface(SurfaceType::Glass).map(|m| m.surface_type), Some(SurfaceType::Glass));

        armor.surface_type = SurfaceType::Default;
        registry.insert(armor);
        assert!(registry.by_surface(SurfaceType::Glass).is_none());
        assert!(registry.by_name("Armor").is_some());
    }
}
