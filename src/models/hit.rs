use crate::models::common::*;
use serde::{Deserialize, Serialize};

/// 被弾判定の結果
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HitResult {
    pub location: Position3D,
    pub impact_point: Position3D,
    /// 被弾面の法線
    pub normal: Normal3D,
    /// 衝突点での法線（偏向計算に使用）
    pub impact_normal: Normal3D,
    pub distance: f64, // m
}

impl HitResult {
    /// 位置と法線から作成（衝突点と衝突法線は同じ値）
    pub fn new(location: Position3D, normal: Normal3D) -> Self {
        Self {
            location,
            impact_point: location,
            normal,
            impact_normal: normal,
            distance: 0.0,
        }
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = distance;
        self
    }

    /// 層を抜けた後の被弾位置（進行方向へ厚さ分ずらす）
    pub fn advanced(&self, direction: &Velocity3D, thickness_cm: f64) -> Self {
        let offset = direction.normalize() * (thickness_cm / 100.0);
        Self {
            location: self.location + offset,
            impact_point: self.impact_point + offset,
            distance: self.distance + thickness_cm / 100.0,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advanced_moves_along_direction() {
        let hit = HitResult::new(Position3D::default(), Normal3D::new(-1.0, 0.0, 0.0));
        let next = hit.advanced(&Velocity3D::new(800.0, 0.0, 0.0), 5.0);
        assert!((next.location.x - 0.05).abs() < 1e-12);
        assert!((next.distance - 0.05).abs() < 1e-12);
        assert_eq!(next.normal, hit.normal);
    }
}
