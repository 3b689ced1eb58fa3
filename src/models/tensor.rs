//! # Tensor モジュール
//!
//! 接触力学計算で使用する3x3テンソル（応力・ひずみ）を提供します。
//!
//! 9個の成分は行優先の単一配列に保持され、以下の3種類の名前と添字アクセスは
//! すべて同じ格納領域を参照します。
//!
//! | 位置 | 添字名 | 直交座標名 | 円柱座標名 |
//! |------|--------|------------|------------|
//! | (0,0) | `x00` | `xx` | `rr` |
//! | (0,1) | `x01` | `xy` | `rt` |
//! | (0,2) | `x02` | `xz` | `rz` |
//! | (1,0) | `x10` | `yx` | `tr` |
//! | (1,1) | `x11` | `yy` | `tt` |
//! | (1,2) | `x12` | `yz` | `tz` |
//! | (2,0) | `x20` | `zx` | `zr` |
//! | (2,1) | `x21` | `zy` | `zt` |
//! | (2,2) | `x22` | `zz` | `zz` |

use std::ops::{Add, Div, Index, Mul};
use thiserror::Error;

/// テンソルの次元数
pub const DIM: usize = 3;

/// テンソルアクセスのエラー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TensorError {
    /// 添字が {0,1,2}×{0,1,2} の範囲外
    #[error("テンソル添字が範囲外です: ({row}, {col})")]
    OutOfRange { row: usize, col: usize },
}

/// 3x3テンソル
///
/// 構築後は不変な値型です。成分は非公開で、名前付きアクセサ・[`Tensor3x3::get`]・
/// `tensor[row][col]` のいずれからも同じ値が読み出されます。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tensor3x3 {
    m: [[f64; DIM]; DIM],
}

/// 固定位置を読む名前付きアクセサを生成する
macro_rules! tensor_accessors {
    ($($name:ident => ($row:expr, $col:expr)),* $(,)?) => {
        $(
            #[inline]
            pub fn $name(&self) -> f64 {
                self.m[$row][$col]
            }
        )*
    };
}

impl Tensor3x3 {
    /// 行優先の9成分からテンソルを作成
    ///
    /// 値の検証は行いません（非有限値もそのまま保持します）。
    #[allow(clippy::too_many_arguments)]
    #[rustfmt::skip]
    pub fn new(
        m00: f64, m01: f64, m02: f64,
        m10: f64, m11: f64, m12: f64,
        m20: f64, m21: f64, m22: f64,
    ) -> Self {
        Self {
            m: [
                [m00, m01, m02],
                [m10, m11, m12],
                [m20, m21, m22],
            ],
        }
    }

    /// 行配列からテンソルを作成
    pub fn from_rows(rows: [[f64; DIM]; DIM]) -> Self {
        Self { m: rows }
    }

    /// 対角成分のみを持つテンソル
    #[rustfmt::skip]
    pub fn from_diagonal(d0: f64, d1: f64, d2: f64) -> Self {
        Self::new(
            d0, 0.0, 0.0,
            0.0, d1, 0.0,
            0.0, 0.0, d2,
        )
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// 範囲チェック付きの成分取得
    ///
    /// # 引数
    ///
    /// * `row` - 行番号（0〜2）
    /// * `col` - 列番号（0〜2）
    ///
    /// # 戻り値
    ///
    /// 指定位置の成分、範囲外の場合は [`TensorError::OutOfRange`]
    pub fn get(&self, row: usize, col: usize) -> Result<f64, TensorError> {
        self.m
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .ok_or(TensorError::OutOfRange { row, col })
    }

    /// 行優先の2次元配列ビュー（`M[row][column]`）
    pub fn m(&self) -> &[[f64; DIM]; DIM] {
        &self.m
    }

    tensor_accessors! {
        x00 => (0, 0), x01 => (0, 1), x02 => (0, 2),
        x10 => (1, 0), x11 => (1, 1), x12 => (1, 2),
        x20 => (2, 0), x21 => (2, 1), x22 => (2, 2),
    }

    tensor_accessors! {
        xx => (0, 0), xy => (0, 1), xz => (0, 2),
        yx => (1, 0), yy => (1, 1), yz => (1, 2),
        zx => (2, 0), zy => (2, 1), zz => (2, 2),
    }

    // zz は直交座標と共通
    tensor_accessors! {
        rr => (0, 0), rt => (0, 1), rz => (0, 2),
        tr => (1, 0), tt => (1, 1), tz => (1, 2),
        zr => (2, 0), zt => (2, 1),
    }

    /// 対角成分
    pub fn diagonal(&self) -> [f64; DIM] {
        [self.m[0][0], self.m[1][1], self.m[2][2]]
    }

    /// 対角成分の最大値
    pub fn max_diagonal(&self) -> f64 {
        self.m[0][0].max(self.m[1][1]).max(self.m[2][2])
    }

    /// 対角成分の最小値
    pub fn min_diagonal(&self) -> f64 {
        self.m[0][0].min(self.m[1][1]).min(self.m[2][2])
    }

    pub fn trace(&self) -> f64 {
        self.m[0][0] + self.m[1][1] + self.m[2][2]
    }

    pub fn transpose(&self) -> Self {
        let mut t = [[0.0; DIM]; DIM];
        for (row, values) in self.m.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                t[col][row] = *value;
            }
        }
        Self::from_rows(t)
    }

    /// 各成分に関数を適用した新しいテンソル
    fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self::from_rows(self.m.map(|row| row.map(&f)))
    }
}

impl Index<usize> for Tensor3x3 {
    type Output = [f64; DIM];

    /// 行を返す。範囲外は境界チェックによりパニックします。
    fn index(&self, row: usize) -> &Self::Output {
        &self.m[row]
    }
}

impl Mul<f64> for Tensor3x3 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        self.map(|v| v * scalar)
    }
}

impl Div<f64> for Tensor3x3 {
    type Output = Self;

    fn div(self, scalar: f64) -> Self::Output {
        self.map(|v| v / scalar)
    }
}

impl Add for Tensor3x3 {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        let mut sum = self.m;
        for (row, values) in sum.iter_mut().enumerate() {
            for (col, value) in values.iter_mut().enumerate() {
                *value += other.m[row][col];
            }
        }
        Self::from_rows(sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// (添字名, 直交座標名, 円柱座標名) を位置ごとに返す
    fn named(t: &Tensor3x3, row: usize, col: usize) -> [f64; 3] {
        match (row, col) {
            (0, 0) => [t.x00(), t.xx(), t.rr()],
            (0, 1) => [t.x01(), t.xy(), t.rt()],
            (0, 2) => [t.x02(), t.xz(), t.rz()],
            (1, 0) => [t.x10(), t.yx(), t.tr()],
            (1, 1) => [t.x11(), t.yy(), t.tt()],
            (1, 2) => [t.x12(), t.yz(), t.tz()],
            (2, 0) => [t.x20(), t.zx(), t.zr()],
            (2, 1) => [t.x21(), t.zy(), t.zt()],
            (2, 2) => [t.x22(), t.zz(), t.zz()],
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_construction_is_row_major() {
        let t = Tensor3x3::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0);
        let mut expected = 1.0;
        for row in 0..DIM {
            for col in 0..DIM {
                assert_eq!(t.get(row, col), Ok(expected));
                expected += 1.0;
            }
        }
    }

    #[test]
    fn test_named_accessors_alias_index_view() {
        let t = Tensor3x3::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0);
        assert_eq!(t.x01(), 2.0);
        assert_eq!(t.xy(), 2.0);
        assert_eq!(t.rt(), 2.0);
        assert_eq!(t[0][1], 2.0);
        assert_eq!(t.m()[2][0], t.zr());
        assert_eq!(t.tz(), t[1][2]);
    }

    #[test]
    fn test_random_aliasing_consistency() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let v: [f64; 9] = std::array::from_fn(|_| rng.gen_range(-1.0e6..1.0e6));
            let t = Tensor3x3::new(v[0], v[1], v[2], v[3], v[4], v[5], v[6], v[7], v[8]);
            for row in 0..DIM {
                for col in 0..DIM {
                    let value = v[row * DIM + col];
                    assert_eq!(t.get(row, col), Ok(value));
                    assert_eq!(t[row][col], value);
                    for alias in named(&t, row, col) {
                        assert_eq!(alias, value);
                    }
                }
            }
        }
    }

    #[test]
    fn test_non_finite_values_are_kept() {
        let t = Tensor3x3::new(f64::NAN, f64::INFINITY, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, f64::NEG_INFINITY);
        assert!(t.xx().is_nan());
        assert_eq!(t.rt(), f64::INFINITY);
        assert_eq!(t.zz(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_get_out_of_range() {
        let t = Tensor3x3::zero();
        assert_eq!(t.get(3, 0), Err(TensorError::OutOfRange { row: 3, col: 0 }));
        assert_eq!(t.get(0, 3), Err(TensorError::OutOfRange { row: 0, col: 3 }));
        assert_eq!(
            t.get(0, usize::MAX),
            Err(TensorError::OutOfRange { row: 0, col: usize::MAX })
        );
    }

    #[test]
    #[should_panic]
    fn test_index_out_of_range_panics() {
        let t = Tensor3x3::zero();
        let _ = t[3][0];
    }

    #[test]
    fn test_scalar_ops_and_diagonal() {
        let t = Tensor3x3::from_diagonal(-3.0, 5.0, 1.0) * 2.0;
        assert_eq!(t.diagonal(), [-6.0, 10.0, 2.0]);
        assert_eq!(t.max_diagonal(), 10.0);
        assert_eq!(t.min_diagonal(), -6.0);
        assert_eq!((t / 2.0).trace(), 3.0);

        let a = Tensor3x3::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0);
        assert_eq!(a.transpose().xy(), 4.0);
        assert_eq!((a + a.transpose()).xy(), 6.0);
    }
}
