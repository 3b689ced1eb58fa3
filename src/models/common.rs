use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// 3次元位置を表す構造体
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position3D {
    pub x: f64, // m
    pub y: f64, // m
    pub z: f64, // m
}

impl Position3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// 3次元距離を計算
    pub fn distance_3d(&self, other: &Position3D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2)).sqrt()
    }
}

impl Add<Velocity3D> for Position3D {
    type Output = Self;

    fn add(self, offset: Velocity3D) -> Self::Output {
        Self::new(self.x + offset.x, self.y + offset.y, self.z + offset.z)
    }
}

/// 3次元速度を表す構造体
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity3D {
    pub x: f64, // m/s
    pub y: f64, // m/s
    pub z: f64, // m/s
}

impl Velocity3D {
    pub const ZERO: Velocity3D = Velocity3D { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// 速度ベクトルの大きさ
    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }

    /// 速度ベクトルを正規化（ゼロベクトルはそのまま返す）
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            Self::new(self.x / mag, self.y / mag, self.z / mag)
        } else {
            *self
        }
    }

    /// 面法線との内積
    pub fn dot(&self, normal: &Normal3D) -> f64 {
        self.x * normal.x + self.y * normal.y + self.z * normal.z
    }

    /// 全成分が有限値かどうか
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    /// 面法線方向の成分
    pub fn project_onto(&self, normal: &Normal3D) -> Self {
        let along = self.dot(normal);
        Self::new(normal.x * along, normal.y * along, normal.z * along)
    }
}

impl Add for Velocity3D {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Velocity3D {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Velocity3D {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Neg for Velocity3D {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// 面法線（単位ベクトル）
///
/// 生成時に正規化されます。ゼロベクトルを与えた場合は+Z方向を既定値とします。
/// デシリアライズも [`Normal3D::new`] を経由します。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawNormal")]
pub struct Normal3D {
    x: f64,
    y: f64,
    z: f64,
}

/// 正規化前の法線成分（省略した成分は0）
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawNormal {
    x: f64,
    y: f64,
    z: f64,
}

impl From<RawNormal> for Normal3D {
    fn from(raw: RawNormal) -> Self {
        Self::new(raw.x, raw.y, raw.z)
    }
}

impl Normal3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        let mag = (x.powi(2) + y.powi(2) + z.powi(2)).sqrt();
        if mag > 0.0 && mag.is_finite() {
            Self { x: x / mag, y: y / mag, z: z / mag }
        } else {
            Self::up()
        }
    }

    pub fn up() -> Self {
        Self { x: 0.0, y: 0.0, z: 1.0 }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn z(&self) -> f64 {
        self.z
    }
}

impl Default for Normal3D {
    fn default() -> Self {
        Self::up()
    }
}

impl Neg for Normal3D {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self { x: -self.x, y: -self.y, z: -self.z }
    }
}

/// 数学ユーティリティ関数
pub mod math_utils {
    use super::{Normal3D, Velocity3D};

    /// 度をラジアンに変換
    pub fn deg_to_rad(degrees: f64) -> f64 {
        degrees * std::f64::consts::PI / 180.0
    }

    /// ラジアンを度に変換
    pub fn rad_to_deg(radians: f64) -> f64 {
        radians * 180.0 / std::f64::consts::PI
    }

    /// 入力範囲を出力範囲へ線形写像（範囲外はクランプ）
    pub fn map_range_clamped(in_min: f64, in_max: f64, out_min: f64, out_max: f64, value: f64) -> f64 {
        if in_max == in_min {
            return if value < in_min { out_min } else { out_max };
        }
        let alpha = ((value - in_min) / (in_max - in_min)).clamp(0.0, 1.0);
        out_min + (out_max - out_min) * alpha
    }

    /// 角度（ラジアン）を±90度の範囲に正規化
    pub fn normalize_angle_to_plus_minus_90_rad(angle_rad: f64) -> f64 {
        let normalized = angle_rad % std::f64::consts::PI;
        if normalized > std::f64::consts::FRAC_PI_2 {
            std::f64::consts::FRAC_PI_2 - normalized
        } else {
            normalized
        }
    }

    /// 面法線と進行方向から入射角（ラジアン）を計算
    ///
    /// 正面衝突で0、面に沿った入射でπ/2になります。
    pub fn impact_angle(surface_normal: &Normal3D, direction: &Velocity3D) -> f64 {
        let dir = direction.normalize();
        let cos = (-dir.dot(surface_normal)).clamp(-1.0, 1.0);
        cos.acos()
    }

    /// 運動エネルギー（J）
    pub fn kinetic_energy(mass_kg: f64, speed_mps: f64) -> f64 {
        0.5 * mass_kg * speed_mps.powi(2)
    }

    /// 運動エネルギーから速さを逆算（エネルギーが負なら0）
    pub fn speed_from_kinetic_energy(energy_j: f64, mass_kg: f64) -> f64 {
        if energy_j <= 0.0 || mass_kg <= 0.0 {
            0.0
        } else {
            (2.0 * energy_j / mass_kg).sqrt()
        }
    }

    /// 動圧（Pa）
    pub fn dynamic_pressure(density_kg_m3: f64, speed_mps: f64) -> f64 {
        0.5 * density_kg_m3 * speed_mps.powi(2)
    }

    /// ほぼ等しいかどうか
    pub fn is_nearly_equal(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-8
    }
}
