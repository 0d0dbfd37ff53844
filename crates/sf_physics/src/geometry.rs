// crates/sf_physics/src/geometry.rs

//! 河道断面几何
//!
//! 幂律断面 `z = c·|x|^(o-1)` 的闭式积分，给出等效宽度、过水面积和湿周。
//! 水深先截断到非负。除矩形外，等效宽度按 `depth + RIVDPTHMIN` 计算，
//! 使空河道仍有非零宽度。

use crate::types::{ChannelShape, SectionQuantity};
use sf_foundation::constants::RIVDPTHMIN;
use sf_foundation::SfResult;

/// 断面水力要素
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CrossSection {
    /// 等效宽度 [m]
    pub width: f64,
    /// 过水面积 [m²]
    pub area: f64,
    /// 湿周 [m]
    pub perimeter: f64,
}

impl CrossSection {
    /// 水力半径 A/P，湿周为零时返回 0
    #[inline]
    pub fn hydraulic_radius(&self) -> f64 {
        if self.perimeter == 0.0 {
            0.0
        } else {
            self.area / self.perimeter
        }
    }

    /// 按选择器取单个要素
    #[inline]
    pub fn get(&self, quantity: SectionQuantity) -> f64 {
        match quantity {
            SectionQuantity::Width => self.width,
            SectionQuantity::Area => self.area,
            SectionQuantity::Perimeter => self.perimeter,
        }
    }
}

/// 计算断面要素
pub fn cross_section(shape: ChannelShape, depth: f64, coeff: f64) -> CrossSection {
    let d = depth.max(0.0);

    match shape {
        ChannelShape::Rectangle => CrossSection {
            width: coeff,
            area: d * coeff,
            perimeter: 2.0 * d + coeff,
        },
        ChannelShape::Triangle => CrossSection {
            width: equivalent_width(shape, d, coeff),
            area: d * d / coeff,
            perimeter: 2.0 * d * (1.0 + coeff * coeff).sqrt() / coeff,
        },
        ChannelShape::Quadratic => {
            let s = (1.0 + 4.0 * coeff * d).sqrt();
            CrossSection {
                width: equivalent_width(shape, d, coeff),
                area: 4.0 * d * d.sqrt() / (3.0 * coeff.sqrt()),
                perimeter: (d * (1.0 + 4.0 * coeff * d) / coeff).sqrt()
                    + (2.0 * (coeff * d).sqrt() + s).ln() / (2.0 * coeff),
            }
        }
        ChannelShape::Cubic => {
            let c13 = coeff.powf(1.0 / 3.0);
            let c23 = coeff.powf(2.0 / 3.0);
            let s = (1.0 + 9.0 * c23 * d).sqrt();
            CrossSection {
                width: equivalent_width(shape, d, coeff),
                area: 3.0 * d.powf(4.0 / 3.0) / (2.0 * c13),
                perimeter: 2.0
                    * ((d * (1.0 + 9.0 * c23 * d)).sqrt() / 3.0
                        + (3.0 * c13 * d.sqrt() + s).ln() / (9.0 * c13)),
            }
        }
    }
}

/// 按整数阶数代码计算断面要素，未知阶数返回配置错误
pub fn cross_section_for_order(order: i32, depth: f64, coeff: f64) -> SfResult<CrossSection> {
    let shape = ChannelShape::try_from(order)?;
    Ok(cross_section(shape, depth, coeff))
}

/// 按整数阶数与要素代码取单个断面要素，任一代码未知时返回配置错误
pub fn section_quantity(order: i32, quantity: i32, depth: f64, coeff: f64) -> SfResult<f64> {
    let quantity = SectionQuantity::try_from(quantity)?;
    Ok(cross_section_for_order(order, depth, coeff)?.get(quantity))
}

fn equivalent_width(shape: ChannelShape, depth: f64, coeff: f64) -> f64 {
    let exp = 1.0 / (shape.order() - 1) as f64;
    2.0 * (depth + RIVDPTHMIN).powf(exp) / coeff.powf(exp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_exact() {
        for &(d, w) in &[(0.0, 5.0), (0.5, 2.0), (1.25, 10.0), (3.0, 0.75)] {
            let cs = cross_section(ChannelShape::Rectangle, d, w);
            assert_eq!(cs.area, d * w);
            assert_eq!(cs.perimeter, 2.0 * d + w);
            assert_eq!(cs.width, w);
        }
    }

    #[test]
    fn test_negative_depth_floored() {
        let cs = cross_section(ChannelShape::Rectangle, -0.3, 4.0);
        assert_eq!(cs.area, 0.0);
        assert_eq!(cs.perimeter, 4.0);
    }

    #[test]
    fn test_triangle_closed_form() {
        let (d, c) = (2.0, 0.5);
        let cs = cross_section(ChannelShape::Triangle, d, c);
        assert!((cs.area - 8.0).abs() < 1e-12);
        assert!((cs.perimeter - 2.0 * 2.0 * 1.25_f64.sqrt() / 0.5).abs() < 1e-12);
        assert!((cs.width - 2.0 * (2.0 + RIVDPTHMIN) / 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_quadratic_area() {
        let (d, c) = (1.0, 4.0);
        let cs = cross_section(ChannelShape::Quadratic, d, c);
        assert!((cs.area - 4.0 / 6.0).abs() < 1e-12);
        assert!(cs.perimeter > 0.0);
    }

    #[test]
    fn test_empty_channel_zero_area() {
        for shape in [
            ChannelShape::Triangle,
            ChannelShape::Quadratic,
            ChannelShape::Cubic,
        ] {
            let cs = cross_section(shape, 0.0, 1.0);
            assert_eq!(cs.area, 0.0);
            assert!(cs.perimeter.abs() < 1e-12);
            assert!(cs.width > 0.0);
            assert_eq!(cs.hydraulic_radius(), 0.0);
        }
    }

    #[test]
    fn test_area_monotone_in_depth() {
        for shape in [
            ChannelShape::Rectangle,
            ChannelShape::Triangle,
            ChannelShape::Quadratic,
            ChannelShape::Cubic,
        ] {
            let mut prev = -1.0;
            for i in 0..20 {
                let a = cross_section(shape, i as f64 * 0.1, 1.5).area;
                assert!(a >= prev);
                prev = a;
            }
        }
    }

    #[test]
    fn test_section_quantity_selector() {
        assert_eq!(section_quantity(1, 1, 0.5, 4.0).unwrap(), 4.0);
        assert_eq!(section_quantity(1, 2, 0.5, 4.0).unwrap(), 2.0);
        assert_eq!(section_quantity(1, 3, 0.5, 4.0).unwrap(), 5.0);
        assert!(matches!(
            section_quantity(1, 0, 0.5, 4.0),
            Err(sf_foundation::SfError::UnknownFluxType { code: 0 })
        ));
        assert!(matches!(
            section_quantity(9, 1, 0.5, 4.0),
            Err(sf_foundation::SfError::UnknownChannelShape { code: 9 })
        ));
    }

    #[test]
    fn test_unknown_order() {
        assert!(cross_section_for_order(1, 1.0, 2.0).is_ok());
        assert!(cross_section_for_order(0, 1.0, 2.0).is_err());
    }
}
