//! # tbsim
//!
//! 終末弾道（Terminal Ballistics）シミュレーションのコアライブラリです。
//!
//! - [`models::Tensor3x3`]: 接触力学用の3x3テンソル（直交座標・円柱座標の別名アクセス）
//! - [`models::PenetrationCalculator`]: 材質層を貫通した弾丸の出射速度・エネルギー損失の計算
//! - [`scenario`] / [`simulation`]: YAMLシナリオの読み込みと多層射撃の並列解決

pub mod logging;
pub mod models;
pub mod scenario;
pub mod simulation;
