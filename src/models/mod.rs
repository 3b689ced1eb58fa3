// 基本的なデータ型と数学ユーティリティ
pub mod common;

// 弾体・貫通計算器の基本インターフェース（trait）定義
pub mod traits;

// 接触力学
pub mod tensor;
pub mod criteria;
pub mod contact;

// 材質・弾体・被弾データ
pub mod material;
pub mod projectile;
pub mod hit;

// 貫通計算
pub mod penetration;

// 便利な re-export
pub use common::*;
pub use traits::*;
pub use tensor::{Tensor3x3, TensorError};
pub use criteria::{FractureCriterion, Tresca, VonMises};
pub use contact::{analyze_contact, ContactAnalysis};
pub use material::{presets, MaterialRegistry, PenetrationRequirement, PhysMatProperties, SimplePenetrationProperties, SurfaceType};
pub use projectile::{Bullet, BulletPointer, LegacyProjectile, ProjectilePhysicalProperties};
pub use hit::HitResult;
pub use penetration::{calculate_exit_velocity, PenetrationCalculator, PenetrationError, PenetrationParams, PenetrationResult};
