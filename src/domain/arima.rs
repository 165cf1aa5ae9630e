//! ARIMA (AutoRegressive Integrated Moving Average) estimation and forecasting
//!
//! Parameters are estimated with the Hannan-Rissanen procedure:
//!
//! 1. Difference the series `d` times.
//! 2. Fit a long autoregression (Yule-Walker, solved by Levinson-Durbin) and
//!    keep its residuals as estimates of the unobserved innovations.
//! 3. Regress the differenced series on its `p` lags and on `q` lags of those
//!    innovations by ordinary least squares.
//! 4. Recompute the residuals recursively with the fitted coefficients.
//!
//! Forecasts run the fitted recursion forward with future innovations set to
//! zero, then integrate back to the original scale. No intercept is fitted
//! once the series has been differenced. Everything here is deterministic.

use super::forecast::ModelOrder;

const MAX_AR_ORDER: usize = 10;
const MAX_DIFFERENCING: usize = 2;
const MAX_MA_ORDER: usize = 10;
const MAX_LONG_AR_ORDER: usize = 20;
const SINGULAR_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArimaError {
    #[error("invalid model order {order}: {reason}")]
    InvalidOrder { order: ModelOrder, reason: String },
    #[error("need at least {required} observations to fit, got {actual}")]
    InsufficientData { required: usize, actual: usize },
    #[error("series contains NaN or infinite values")]
    NonFinite,
    #[error("differenced series is constant")]
    ConstantSeries,
    #[error("estimation equations are singular")]
    Singular,
    #[error("estimation produced non-finite parameters")]
    Diverged,
    #[error("model has not been fitted")]
    NotFitted,
}

#[derive(Debug, Clone)]
pub struct Arima {
    order: ModelOrder,
    ar_coeffs: Vec<f64>,
    ma_coeffs: Vec<f64>,
    /// Mean removed before estimation (only when d = 0)
    mean: f64,
    /// `levels[k]` is the series differenced k times; the last entry is the working series
    levels: Vec<Vec<f64>>,
    /// In-sample residuals aligned with the working series
    innovations: Vec<f64>,
    residual_variance: f64,
    fitted: bool,
}

impl Arima {
    pub fn new(order: ModelOrder) -> Result<Self, ArimaError> {
        let invalid = |reason: &str| ArimaError::InvalidOrder {
            order,
            reason: reason.to_string(),
        };
        if order.p > MAX_AR_ORDER {
            return Err(invalid("AR order must be <= 10"));
        }
        if order.d > MAX_DIFFERENCING {
            return Err(invalid("differencing order must be <= 2"));
        }
        if order.q > MAX_MA_ORDER {
            return Err(invalid("MA order must be <= 10"));
        }
        if order.p + order.q == 0 {
            return Err(invalid("at least one of p or q must be positive"));
        }

        Ok(Self {
            order,
            ar_coeffs: vec![0.0; order.p],
            ma_coeffs: vec![0.0; order.q],
            mean: 0.0,
            levels: Vec::new(),
            innovations: Vec::new(),
            residual_variance: 0.0,
            fitted: false,
        })
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coeffs
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coeffs
    }

    /// Mean squared in-sample one-step residual of the final regression
    pub fn residual_variance(&self) -> f64 {
        self.residual_variance
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Smallest series length this order can be fitted on
    pub fn min_observations(&self) -> usize {
        // Solve for the smallest n where the final regression has more rows than parameters.
        (self.order.d + 1..)
            .find(|&n| self.regression_rows(n - self.order.d) > self.order.p + self.order.q)
            .unwrap_or(usize::MAX)
    }

    fn long_ar_order(&self, working_len: usize) -> usize {
        let ModelOrder { p, q, .. } = self.order;
        (working_len / 4).min(MAX_LONG_AR_ORDER).max(p + q + 1)
    }

    fn regression_start(&self, working_len: usize) -> usize {
        let ModelOrder { p, q, .. } = self.order;
        if q == 0 {
            p
        } else {
            p.max(self.long_ar_order(working_len) + q)
        }
    }

    fn regression_rows(&self, working_len: usize) -> usize {
        working_len.saturating_sub(self.regression_start(working_len))
    }

    pub fn fit(&mut self, data: &[f64]) -> Result<(), ArimaError> {
        self.fitted = false;

        let required = self.min_observations();
        if data.len() < required {
            return Err(ArimaError::InsufficientData {
                required,
                actual: data.len(),
            });
        }
        if data.iter().any(|x| !x.is_finite()) {
            return Err(ArimaError::NonFinite);
        }

        let mut levels = vec![data.to_vec()];
        for _ in 0..self.order.d {
            let next = difference(levels[levels.len() - 1].as_slice());
            levels.push(next);
        }
        let working = &levels[levels.len() - 1];

        if is_constant(working) {
            return Err(ArimaError::ConstantSeries);
        }

        let mean = if self.order.d == 0 {
            working.iter().sum::<f64>() / working.len() as f64
        } else {
            0.0
        };
        let z: Vec<f64> = working.iter().map(|x| x - mean).collect();
        let n = z.len();
        let ModelOrder { p, q, .. } = self.order;

        // Stage 1: innovations from a long autoregression
        let innovations = if q > 0 {
            let m = self.long_ar_order(n);
            let long_ar = levinson_durbin(&autocovariance(&z, m), m)?;
            let mut e = vec![0.0; n];
            for t in m..n {
                let predicted: f64 = (0..m).map(|j| long_ar[j] * z[t - j - 1]).sum();
                e[t] = z[t] - predicted;
            }
            e
        } else {
            vec![0.0; n]
        };

        // Stage 2: least squares on AR lags and lagged innovations
        let start = self.regression_start(n);
        let k = p + q;
        let regressors = |t: usize| -> Vec<f64> {
            (1..=p)
                .map(|i| z[t - i])
                .chain((1..=q).map(|j| innovations[t - j]))
                .collect()
        };

        let mut xtx = vec![vec![0.0; k]; k];
        let mut xty = vec![0.0; k];
        for t in start..n {
            let x = regressors(t);
            for i in 0..k {
                xty[i] += x[i] * z[t];
                for j in 0..k {
                    xtx[i][j] += x[i] * x[j];
                }
            }
        }
        let coeffs = solve_linear_system(xtx, xty)?;
        if coeffs.iter().any(|c| !c.is_finite()) {
            return Err(ArimaError::Diverged);
        }

        let mut sum_sq = 0.0;
        for t in start..n {
            let x = regressors(t);
            let fitted: f64 = x.iter().zip(&coeffs).map(|(a, b)| a * b).sum();
            sum_sq += (z[t] - fitted).powi(2);
        }
        let residual_variance = sum_sq / (n - start) as f64;
        if !residual_variance.is_finite() {
            return Err(ArimaError::Diverged);
        }

        // Stage 3: residuals of the fitted recursion become the innovation state
        let (ar, ma) = coeffs.split_at(p);
        let mut residuals = vec![0.0; n];
        for t in p..n {
            let ar_part: f64 = ar.iter().enumerate().map(|(i, phi)| phi * z[t - i - 1]).sum();
            let ma_part: f64 = ma
                .iter()
                .enumerate()
                .filter(|(j, _)| t > *j)
                .map(|(j, theta)| theta * residuals[t - j - 1])
                .sum();
            residuals[t] = z[t] - ar_part - ma_part;
        }
        if residuals.iter().any(|e| !e.is_finite()) {
            return Err(ArimaError::Diverged);
        }

        self.ar_coeffs = ar.to_vec();
        self.ma_coeffs = ma.to_vec();
        self.mean = mean;
        self.levels = levels;
        self.innovations = residuals;
        self.residual_variance = residual_variance;
        self.fitted = true;

        tracing::debug!(
            order = %self.order,
            ar = ?self.ar_coeffs,
            ma = ?self.ma_coeffs,
            sigma2 = self.residual_variance,
            "fitted model"
        );

        Ok(())
    }

    /// Point forecasts for the next `steps` observations on the original scale
    pub fn predict(&self, steps: usize) -> Result<Vec<f64>, ArimaError> {
        if !self.fitted {
            return Err(ArimaError::NotFitted);
        }
        if steps == 0 {
            return Ok(Vec::new());
        }

        let working = &self.levels[self.levels.len() - 1];
        let mut z: Vec<f64> = working.iter().map(|x| x - self.mean).collect();
        let mut e = self.innovations.clone();
        let n = z.len();

        for _ in 0..steps {
            let ar: f64 = self
                .ar_coeffs
                .iter()
                .enumerate()
                .map(|(i, phi)| phi * z[z.len() - i - 1])
                .sum();
            let ma: f64 = self
                .ma_coeffs
                .iter()
                .enumerate()
                .map(|(j, theta)| theta * e[e.len() - j - 1])
                .sum();
            z.push(ar + ma);
            // Future innovations have zero expectation
            e.push(0.0);
        }

        let mut forecasts: Vec<f64> = z[n..].iter().map(|x| x + self.mean).collect();
        for level in self.levels[..self.levels.len() - 1].iter().rev() {
            forecasts = integrate(&forecasts, level[level.len() - 1]);
        }

        if forecasts.iter().any(|x| !x.is_finite()) {
            return Err(ArimaError::Diverged);
        }
        Ok(forecasts)
    }
}

fn difference(data: &[f64]) -> Vec<f64> {
    data.windows(2).map(|w| w[1] - w[0]).collect()
}

fn integrate(differences: &[f64], last_value: f64) -> Vec<f64> {
    differences
        .iter()
        .scan(last_value, |current, diff| {
            *current += diff;
            Some(*current)
        })
        .collect()
}

fn is_constant(data: &[f64]) -> bool {
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    variance <= SINGULAR_TOLERANCE * mean.powi(2).max(1.0)
}

/// Biased sample autocovariance for lags 0..=max_lag
fn autocovariance(data: &[f64], max_lag: usize) -> Vec<f64> {
    let n = data.len();
    (0..=max_lag)
        .map(|k| (k..n).map(|i| data[i] * data[i - k]).sum::<f64>() / n as f64)
        .collect()
}

/// Solve the Yule-Walker equations for AR coefficients of the given order
fn levinson_durbin(autocov: &[f64], order: usize) -> Result<Vec<f64>, ArimaError> {
    let mut coeffs = vec![0.0; order];
    let mut error = autocov[0];
    if error <= 0.0 {
        return Err(ArimaError::ConstantSeries);
    }

    for k in 0..order {
        let mut acc = autocov[k + 1];
        for j in 0..k {
            acc -= coeffs[j] * autocov[k - j];
        }
        let reflection = acc / error;

        let previous = coeffs.clone();
        coeffs[k] = reflection;
        for j in 0..k {
            coeffs[j] = previous[j] - reflection * previous[k - 1 - j];
        }

        error *= 1.0 - reflection * reflection;
        if error <= SINGULAR_TOLERANCE * autocov[0] {
            return Err(ArimaError::Singular);
        }
    }

    Ok(coeffs)
}

/// Gaussian elimination with partial pivoting
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>, ArimaError> {
    let n = b.len();
    let scale = (0..n).map(|i| a[i][i].abs()).fold(0.0_f64, f64::max);
    if scale == 0.0 || !scale.is_finite() {
        return Err(ArimaError::Singular);
    }

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot_row][col].abs() <= SINGULAR_TOLERANCE * scale {
            return Err(ArimaError::Singular);
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}
