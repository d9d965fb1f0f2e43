//! Conversion of quantized and calibrated Digital Numbers (DN) to
//! top-of-atmosphere radiance, reflectance or brightness temperature.
use ndarray::{Array, ArrayBase, Data, Dimension};

/// TOA spectral radiance, `gain * DN + bias`.
pub fn to_radiance<S, D>(dn: &ArrayBase<S, D>, gain: f64, bias: f64) -> Array<f64, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    dn.mapv(|v| gain * v + bias)
}

/// TOA planetary reflectance, optionally corrected for the sun elevation
/// angle (degrees).
pub fn to_reflectance<S, D>(
    dn: &ArrayBase<S, D>,
    gain: f64,
    bias: f64,
    sun_elevation: Option<f64>,
) -> Array<f64, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let reflectance = dn.mapv(|v| gain * v + bias);
    match sun_elevation {
        Some(angle) => {
            let sin = angle.to_radians().sin();
            reflectance.mapv_into(|r| r / sin)
        }
        None => reflectance,
    }
}

/// TOA brightness temperature in Kelvin, `K2 / ln(K1 / L + 1)`.
pub fn to_brightness_temperature<S, D>(radiance: &ArrayBase<S, D>, k1: f64, k2: f64) -> Array<f64, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    radiance.mapv(|l| k2 / (k1 / l + 1.0).ln())
}
