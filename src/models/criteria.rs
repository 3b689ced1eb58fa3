use crate::models::tensor::Tensor3x3;

/// von Mises降伏条件
pub struct VonMises;

impl VonMises {
    /// 相当応力を計算
    ///
    /// 対角成分と zx, yz がすべて0の場合は純粋せん断として √3·|xy| を返します。
    pub fn equivalent_stress(stress: &Tensor3x3) -> f64 {
        if stress.diagonal() == [0.0, 0.0, 0.0] && stress.zx() == 0.0 && stress.yz() == 0.0 {
            return 3.0_f64.sqrt() * stress.xy().abs();
        }

        let normal = (stress.xx() - stress.yy()).powi(2)
            + (stress.yy() - stress.zz()).powi(2)
            + (stress.zz() - stress.xx()).powi(2);
        let shear = 6.0 * (stress.xy().powi(2) + stress.yz().powi(2) + stress.zx().powi(2));
        (0.5 * (normal + shear)).sqrt()
    }

    pub fn test_yield(stress: &Tensor3x3, yield_strength: f64) -> bool {
        Self::equivalent_stress(stress) >= yield_strength
    }
}

/// Tresca（最大せん断応力）降伏条件
pub struct Tresca;

impl Tresca {
    pub fn max_shear_stress(stress: &Tensor3x3) -> f64 {
        0.5 * (stress.max_diagonal() - stress.min_diagonal())
    }

    pub fn test_yield(stress: &Tensor3x3, yield_strength: f64) -> bool {
        Self::max_shear_stress(stress) >= 0.5 * yield_strength
    }
}

/// 破壊靭性によるき裂進展判定（モードI応力拡大係数）
pub struct FractureCriterion;

impl FractureCriterion {
    pub fn stress_intensity(stress: &Tensor3x3, crack_area: f64) -> f64 {
        stress.max_diagonal() * crack_area.sqrt()
    }

    pub fn test_yield(stress: &Tensor3x3, crack_area: f64, fracture_toughness: f64) -> bool {
        Self::stress_intensity(stress, crack_area) >= fracture_toughness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_von_mises_uniaxial() {
        let stress = Tensor3x3::from_diagonal(250.0, 0.0, 0.0);
        assert!((VonMises::equivalent_stress(&stress) - 250.0).abs() < 1e-9);
        assert!(VonMises::test_yield(&stress, 250.0));
        assert!(!VonMises::test_yield(&stress, 251.0));
    }

    #[test]
    fn test_von_mises_pure_shear() {
        let stress = Tensor3x3::new(0.0, 10.0, 0.0, 10.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        assert!((VonMises::equivalent_stress(&stress) - 10.0 * 3.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_von_mises_hydrostatic_does_not_yield() {
        let stress = Tensor3x3::from_diagonal(-100.0, -100.0, -100.0);
        assert_eq!(VonMises::equivalent_stress(&stress), 0.0);
        assert!(!VonMises::test_yield(&stress, 1.0));
    }

    #[test]
    fn test_tresca() {
        let stress = Tensor3x3::from_diagonal(-50.0, -50.0, -300.0);
        assert_eq!(Tresca::max_shear_stress(&stress), 125.0);
        assert!(Tresca::test_yield(&stress, 250.0));
        assert!(!Tresca::test_yield(&stress, 260.0));
    }

    #[test]
    fn test_fracture_criterion() {
        let stress = Tensor3x3::from_diagonal(40.0, 10.0, 0.0);
        assert_eq!(FractureCriterion::stress_intensity(&stress, 4.0), 80.0);
        assert!(FractureCriterion::test_yield(&stress, 4.0, 80.0));
        assert!(!FractureCriterion::test_yield(&stress, 1.0, 80.0));
    }
}
